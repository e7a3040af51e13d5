use async_trait::async_trait;
use serde_json::Value;

use tally_core::error::{Result, TallyError};

use crate::context::Context;
use crate::dispatch::View;

const N: u64 = 100_000;
const K: u64 = 1_000;

/// `/compute`: burns CPU on a binomial coefficient so its stats show a
/// measurable response time, then answers like `/status`.
#[derive(Default)]
pub struct ComputeView;

impl ComputeView {
    pub fn new() -> Self {
        Self
    }
}

const LIMB: u64 = 1_000_000_000;

/// Exact C(n, k) as little-endian base-1e9 limbs.
///
/// Built as the running product `c = c * (n - k + i) / i`, which stays an
/// integer at every step. Multipliers must stay below `u64::MAX / LIMB`.
fn binomial(n: u64, k: u64) -> Vec<u64> {
    if k > n {
        return vec![0];
    }
    let k = k.min(n - k);
    let mut limbs = vec![1u64];
    for i in 1..=k {
        mul_small(&mut limbs, n - k + i);
        div_small(&mut limbs, i);
    }
    limbs
}

fn mul_small(limbs: &mut Vec<u64>, m: u64) {
    let mut carry = 0;
    for limb in limbs.iter_mut() {
        let v = *limb * m + carry;
        *limb = v % LIMB;
        carry = v / LIMB;
    }
    while carry > 0 {
        limbs.push(carry % LIMB);
        carry /= LIMB;
    }
}

fn div_small(limbs: &mut Vec<u64>, d: u64) {
    let mut rem = 0;
    for limb in limbs.iter_mut().rev() {
        let v = rem * LIMB + *limb;
        *limb = v / d;
        rem = v % d;
    }
    while limbs.len() > 1 && limbs.last() == Some(&0) {
        limbs.pop();
    }
}

/// Exact decimal digit count of C(n, k); 0 when `k > n`.
pub fn binomial_digits(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let limbs = binomial(n, k);
    let top = limbs.last().copied().unwrap_or(0);
    (limbs.len() as u64 - 1) * 9 + top.to_string().len() as u64
}

#[async_trait]
impl View for ComputeView {
    fn route(&self) -> &'static str {
        "/compute"
    }

    async fn handle(&self, ctx: &Context) -> Result<Value> {
        let digits = tokio::task::spawn_blocking(|| binomial_digits(N, K))
            .await
            .map_err(|e| TallyError::Handler(format!("compute task failed: {e}")))?;
        tracing::trace!(digits, "binomial computed");

        let mut body = super::stats_body(ctx, self.route())?;
        body["binomial_digits"] = digits.into();
        Ok(body)
    }
}
