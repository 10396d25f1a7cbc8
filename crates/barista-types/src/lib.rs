//! Common types module for the barista ordering service.
//!
//! This module defines the data types shared by every barista component:
//! catalog products, the cart a conversation builds, the lead handed to the
//! CRM, and the configuration validation framework used by pluggable
//! implementations.

/// Cart model: ordered line items with totals computed on read.
pub mod cart;
/// Conversation identity types.
pub mod conversation;
/// Lead snapshot types sent to the CRM.
pub mod lead;
/// Catalog product types.
pub mod product;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Secret string wrapper for credentials embedded in configuration.
pub mod secret_string;
/// Utility functions for display formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use cart::{Cart, CartError, LineItem, MAX_QUANTITY};
pub use conversation::ConversationId;
pub use lead::{ContactDetails, Lead, LeadError};
pub use product::{Product, MAX_PRICE};
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{format_amount, mask_phone};
pub use validation::*;
