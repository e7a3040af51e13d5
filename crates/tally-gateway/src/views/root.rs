use async_trait::async_trait;
use serde_json::{json, Value};

use tally_core::error::Result;

use crate::context::Context;
use crate::dispatch::View;

/// `/`: current request rate.
#[derive(Default)]
pub struct RootView;

impl RootView {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl View for RootView {
    fn route(&self) -> &'static str {
        "/"
    }

    async fn handle(&self, ctx: &Context) -> Result<Value> {
        Ok(json!({ "rpm": ctx.rpm() }))
    }
}
