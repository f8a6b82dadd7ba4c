//! HTTP handlers for the example resource.

pub mod examples;
pub use examples::*;
