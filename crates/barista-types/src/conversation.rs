//! Conversation identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of one chat conversation.
///
/// Chat platforms hand out signed numeric chat ids (group chats are
/// negative), so the id is kept as an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub i64);

impl fmt::Display for ConversationId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ConversationId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse().map(ConversationId)
	}
}

impl From<i64> for ConversationId {
	fn from(id: i64) -> Self {
		Self(id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_and_display() {
		let id: ConversationId = " -100200 ".parse().unwrap();
		assert_eq!(id, ConversationId(-100200));
		assert_eq!(id.to_string(), "-100200");
		assert!("abc".parse::<ConversationId>().is_err());
	}
}
