//! Display-only token and cost estimates.
//!
//! Rough approximation: one token per four characters. Good enough for the
//! per-message counters in the UI; never used for provider accounting.

use crate::config::Pricing;

pub fn estimate_tokens(text: &str) -> u32 {
    if text.is_empty() {
        return 0;
    }
    text.chars().count().div_ceil(4) as u32
}

pub fn estimate_cost(tokens: u32, pricing: &Pricing, output: bool) -> f64 {
    let rate = if output {
        pricing.output_per_1k
    } else {
        pricing.input_per_1k
    };
    f64::from(tokens) / 1000.0 * rate
}
