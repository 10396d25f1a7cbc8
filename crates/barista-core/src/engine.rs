//! Order engine.
//!
//! The engine owns the session store and routes each turn to the handler for
//! the current state. A turn holds its session's lock from start to finish,
//! including any catalog or CRM call, so turns of one conversation never
//! interleave.
//!
//! Callers that may give up on a turn (a request timeout, a dropped
//! connection) use [`OrderEngine::handle_detached`]: a turn that has started
//! submitting an order always runs to the end, so a lead is never created
//! without the session being reset.

use crate::handlers::{BrowseHandler, CartHandler, OrderHandler, TurnContext, TurnResult};
use crate::input::{Choice, Input};
use crate::session::{OrderSession, OrderState, SessionSnapshot, StateKind};
use crate::view::{self, Reply, Storefront};
use barista_catalog::CatalogService;
use barista_crm::LeadPipeline;
use barista_storage::{SessionBusy, SessionStore};
use barista_types::ConversationId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tracing::instrument;

/// Session expiry settings.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
	/// Idle time after which a session is dropped.
	pub ttl: Duration,
	/// Interval between expiry sweeps.
	pub cleanup_interval: Duration,
}

impl Default for SessionSettings {
	fn default() -> Self {
		Self {
			ttl: Duration::from_secs(120 * 60),
			cleanup_interval: Duration::from_secs(300),
		}
	}
}

/// Drives conversations through the order flow.
pub struct OrderEngine {
	sessions: Arc<SessionStore<OrderSession>>,
	settings: SessionSettings,
	shop: Arc<Storefront>,
	browse: BrowseHandler,
	cart: CartHandler,
	order: OrderHandler,
}

impl OrderEngine {
	/// Creates an engine. Without a pipeline, confirmations are answered with
	/// an apology and the order is kept.
	pub fn new(
		catalog: Arc<CatalogService>,
		pipeline: Option<Arc<LeadPipeline>>,
		shop: Storefront,
		settings: SessionSettings,
	) -> Self {
		let shop = Arc::new(shop);
		Self {
			sessions: Arc::new(SessionStore::new()),
			settings,
			browse: BrowseHandler::new(catalog, shop.clone()),
			cart: CartHandler::new(shop.clone()),
			order: OrderHandler::new(pipeline, shop.clone()),
			shop,
		}
	}

	/// Applies one input to the conversation's session and returns what to show.
	#[instrument(skip_all, fields(conversation = %conversation))]
	pub async fn handle(
		&self,
		conversation: ConversationId,
		username: Option<String>,
		input: Input,
	) -> Reply {
		let mut session = self.sessions.lease(conversation).await;
		let before = session.kind();
		let ctx = TurnContext {
			conversation,
			username,
		};

		let messages = match self.dispatch(&mut session, &ctx, input).await {
			Ok(messages) => messages,
			Err(e) => {
				tracing::debug!(state = %before, error = %e, "Turn rejected");
				vec![view::apology(&e, &self.shop)]
			},
		};

		let state = session.kind();
		if state == StateKind::Submitted {
			session.reset();
		}
		if state != before {
			tracing::debug!(from = %before, to = %state, "State changed");
		}

		Reply { messages, state }
	}

	/// Runs [`handle`](Self::handle) on its own task.
	///
	/// Dropping the returned future does not cancel the turn.
	pub async fn handle_detached(
		self: &Arc<Self>,
		conversation: ConversationId,
		username: Option<String>,
		input: Input,
	) -> Result<Reply, JoinError> {
		let engine = Arc::clone(self);
		tokio::spawn(async move { engine.handle(conversation, username, input).await }).await
	}

	async fn dispatch(&self, session: &mut OrderSession, ctx: &TurnContext, input: Input) -> TurnResult {
		match input {
			Input::Start => Ok(self.browse.start()),
			Input::Choice(choice) => self.dispatch_choice(session, ctx, choice).await,
			Input::Text(text) => self.dispatch_text(session, &text),
		}
	}

	async fn dispatch_choice(
		&self,
		session: &mut OrderSession,
		ctx: &TurnContext,
		choice: Choice,
	) -> TurnResult {
		match choice {
			Choice::Menu | Choice::AddMore | Choice::ReturnCategories => {
				Ok(self.browse.open_menu(session).await)
			},
			Choice::About => Ok(self.browse.about()),
			Choice::ShowCart => Ok(self.cart.show(session)),
			Choice::ShowCartSummary => Ok(self.cart.summary(session)),
			Choice::Category(label) => self.browse.select_category(session, &label).await,
			Choice::Product(name) => self.browse.select_product(session, &name).await,
			Choice::Quantity(n) => self.browse.choose_quantity(session, n),
			Choice::CustomQuantity => self.browse.request_custom_quantity(session),
			Choice::Remove(index) => self.cart.remove(session, index),
			Choice::EditQuantity(index) => self.cart.start_edit(session, index),
			Choice::ClearCart => self.cart.clear(session),
			Choice::Checkout => self.order.begin(session),
			Choice::Confirm => self.order.confirm(session, ctx).await,
		}
	}

	fn dispatch_text(&self, session: &mut OrderSession, text: &str) -> TurnResult {
		match session.state.clone() {
			OrderState::SelectingQuantity {
				awaiting_custom: true,
				..
			} => self.browse.custom_quantity(session, text),
			OrderState::EditingQuantity { index } => self.cart.apply_edit(session, index, text),
			OrderState::EnteringName => self.order.enter_name(session, text),
			OrderState::EnteringPhone { name } => self.order.enter_phone(session, name, text),
			OrderState::EnteringAddress { name, phone } => {
				self.order.enter_address(session, name, phone, text)
			},
			_ => Err(crate::TurnError::ExpectedChoice),
		}
	}

	/// Current session state, if the conversation has one.
	pub async fn snapshot(&self, conversation: ConversationId) -> Option<SessionSnapshot> {
		self.sessions
			.snapshot(conversation)
			.await
			.map(|session| session.snapshot())
	}

	/// Current session state without waiting for an in-flight turn.
	pub fn try_snapshot(
		&self,
		conversation: ConversationId,
	) -> Result<Option<SessionSnapshot>, SessionBusy> {
		Ok(self
			.sessions
			.try_snapshot(conversation)?
			.map(|session| session.snapshot()))
	}

	/// Number of live sessions.
	pub fn active_sessions(&self) -> usize {
		self.sessions.len()
	}

	/// Spawns the background task that drops idle sessions.
	pub fn start_session_cleanup(&self) -> JoinHandle<()> {
		let sessions = self.sessions.clone();
		let SessionSettings {
			ttl,
			cleanup_interval,
		} = self.settings;

		tokio::spawn(async move {
			let mut interval = tokio::time::interval(cleanup_interval);
			loop {
				interval.tick().await;
				let removed = sessions.cleanup_expired(ttl);
				if removed > 0 {
					tracing::debug!("Session cleanup: removed {} idle sessions", removed);
				}
			}
		})
	}
}
