//! Turn handlers.
//!
//! Each handler owns one part of the order flow. Handlers check that the
//! session is in a state that accepts the input and only mutate the session
//! once every fallible step has passed, so a rejected turn leaves it as it
//! was.

pub mod browse;
pub mod cart;
pub mod order;

pub use browse::BrowseHandler;
pub use cart::CartHandler;
pub use order::OrderHandler;

use crate::view::Instruction;
use crate::TurnError;
use barista_types::ConversationId;

/// Who is talking.
#[derive(Debug, Clone)]
pub struct TurnContext {
	pub conversation: ConversationId,
	pub username: Option<String>,
}

/// Result of a handled turn.
pub type TurnResult = Result<Vec<Instruction>, TurnError>;
