use async_trait::async_trait;
use serde_json::Value;

use tally_core::error::Result;

use crate::context::Context;
use crate::dispatch::View;

/// `/status`: average response time of this endpoint plus the request rate.
#[derive(Default)]
pub struct StatusView;

impl StatusView {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl View for StatusView {
    fn route(&self) -> &'static str {
        "/status"
    }

    async fn handle(&self, ctx: &Context) -> Result<Value> {
        super::stats_body(ctx, self.route())
    }
}
