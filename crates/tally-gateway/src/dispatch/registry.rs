use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use tally_core::error::Result;

use crate::context::Context;

/// A handler bound to one route path. Returns the JSON response body.
#[async_trait]
pub trait View: Send + Sync {
    fn route(&self) -> &'static str;
    async fn handle(&self, ctx: &Context) -> Result<Value>;
}

/// Registry of views keyed by exact route path.
#[derive(Default)]
pub struct ViewRegistry {
    views: DashMap<&'static str, Arc<dyn View>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: DashMap::new(),
        }
    }

    pub fn register(&self, view: Arc<dyn View>) {
        self.views.insert(view.route(), view);
    }

    pub fn registered_routes(&self) -> Vec<&'static str> {
        self.views.iter().map(|e| *e.key()).collect()
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn View>> {
        self.views.get(path).map(|e| e.value().clone())
    }
}
