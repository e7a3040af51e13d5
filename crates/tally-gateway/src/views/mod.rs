//! Built-in views.

mod compute;
mod root;
mod status;

pub use compute::{binomial_digits, ComputeView};
pub use root::RootView;
pub use status::StatusView;

use serde_json::{json, Value};

use tally_core::error::Result;

use crate::context::Context;

/// `{"stats": <bucket of route>, "rpm": n}`
fn stats_body(ctx: &Context, route: &str) -> Result<Value> {
    let bucket = ctx.stats().bucket(route)?;
    Ok(json!({
        "stats": bucket,
        "rpm": ctx.rpm(),
    }))
}
