//! Core ordering engine for the barista service.
//!
//! This module drives one conversation at a time through the order flow:
//! browsing the menu, filling the cart, collecting contact details and
//! submitting the order to the CRM. Each turn takes an [`Input`] and produces a
//! [`Reply`] made of display instructions plus the resulting state kind.

pub mod builder;
pub mod checkout;
pub mod engine;
pub mod handlers;
pub mod input;
pub mod session;
pub mod view;

use barista_types::CartError;
use thiserror::Error;

pub use barista_storage::SessionBusy;
pub use builder::{BuilderError, CatalogFactories, EngineBuilder};
pub use engine::{OrderEngine, SessionSettings};
pub use input::{Choice, Input, UnknownChoice};
pub use session::{OrderSession, OrderState, SessionSnapshot, StateKind};
pub use view::{Button, Instruction, Menu, Reply, Storefront};

/// Reasons a turn was rejected. The session is left untouched and the user
/// gets an apology or a re-prompt instead.
#[derive(Debug, Error)]
pub enum TurnError {
	/// Input did not pass validation; the message is the re-prompt.
	#[error("{0}")]
	Validation(String),
	/// A quantity arrived while no product was pending.
	#[error("No product is waiting for a quantity")]
	NoPendingSelection,
	#[error("Product '{0}' was not found")]
	ProductNotFound(String),
	#[error(transparent)]
	Cart(#[from] CartError),
	#[error("The cart is empty")]
	EmptyCart,
	/// A choice that the current state does not accept.
	#[error("This action is not available right now")]
	NotAvailable,
	/// Free text in a state that only accepts choices.
	#[error("A menu choice was expected")]
	ExpectedChoice,
	/// No CRM endpoint is configured.
	#[error("Order submission is not configured")]
	SubmissionDisabled,
	#[error("Order submission failed: {0}")]
	Submission(String),
}
