//! Utility functions for display formatting shared across components.

pub mod formatting;

pub use formatting::{format_amount, mask_phone};
