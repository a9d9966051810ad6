//! Shared test utilities for the climate measurement workspace.
//!
//! This crate provides common testing infrastructure including:
//! - An in-memory [`SearchEngine`](search_client::SearchEngine) that
//!   evaluates the request subset the services send
//! - Sample measurements and a captured engine response
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../../crates/test-utils" }
//! ```
//!
//! Then build the service under test around the engine:
//!
//! ```ignore
//! use test_utils::{fixtures, InMemoryEngine};
//!
//! let engine = Arc::new(InMemoryEngine::seeded("prefix", fixtures::hot_cities()));
//! ```

pub mod engine;
pub mod fixtures;

// Re-export commonly used items at the crate root
pub use engine::{InMemoryEngine, SearchCall, StoredDocument};
pub use fixtures::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f64, 1.0_f64, 0.001_f64);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}
