//! Shared application state for the tally gateway.
//!
//! Wires the request context and the view registry, and pre-registers one
//! stats bucket per view before serving starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tally_core::error::Result;

use crate::context::Context;
use crate::dispatch::ViewRegistry;
use crate::views::{ComputeView, RootView, StatusView};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    context: Arc<Context>,
    views: Arc<ViewRegistry>,
}

struct AppStateInner {
    draining: AtomicBool,
}

impl AppState {
    /// Build application state around an already opened context.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(context: Arc<Context>) -> Result<Self> {
        let views = ViewRegistry::new();
        views.register(Arc::new(RootView::new()));
        views.register(Arc::new(StatusView::new()));
        views.register(Arc::new(ComputeView::new()));

        // Buckets are reset even when the snapshot carried samples for them.
        for route in views.registered_routes() {
            context.stats().register(route)?;
        }
        tracing::debug!(routes = ?views.registered_routes(), "views registered");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                draining: AtomicBool::new(false),
            }),
            context,
            views: Arc::new(views),
        })
    }

    pub fn context(&self) -> Arc<Context> {
        Arc::clone(&self.context)
    }

    pub fn views(&self) -> Arc<ViewRegistry> {
        Arc::clone(&self.views)
    }

    /// Mark draining state (shutdown in progress).
    pub fn set_draining(&self) {
        self.inner.draining.store(true, Ordering::Relaxed);
    }

    pub fn is_draining(&self) -> bool {
        self.inner.draining.load(Ordering::Relaxed)
    }
}
