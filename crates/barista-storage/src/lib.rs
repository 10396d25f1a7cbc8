//! Session storage for the barista ordering service.
//!
//! Every conversation owns exactly one session. Sessions live in memory and are
//! keyed by [`ConversationId`]. Each session sits behind its own async mutex, so
//! inputs for the same conversation are applied one at a time while different
//! conversations proceed in parallel. A lease may be held across awaits, which
//! lets a handler keep the session locked while the CRM is being called.
//!
//! Abandoned sessions are dropped by [`SessionStore::cleanup_expired`]. A
//! session that is currently leased is never dropped.
//!
//! Readers that must not wait for a turn to finish use
//! [`SessionStore::try_snapshot`], which reports a leased session as busy.

use barista_types::ConversationId;
use dashmap::DashMap;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// The session is leased by an in-flight turn.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Conversation {0} is busy")]
pub struct SessionBusy(pub ConversationId);

/// A stored session together with its bookkeeping.
#[derive(Debug)]
struct SessionEntry<S> {
	state: S,
	last_active: Instant,
	/// Set once the entry has been removed from the map.
	evicted: bool,
}

type SharedEntry<S> = Arc<Mutex<SessionEntry<S>>>;

/// In-memory store of per-conversation sessions.
#[derive(Debug)]
pub struct SessionStore<S> {
	sessions: DashMap<ConversationId, SharedEntry<S>>,
}

impl<S> Default for SessionStore<S> {
	fn default() -> Self {
		Self {
			sessions: DashMap::new(),
		}
	}
}

impl<S: Default + Send + 'static> SessionStore<S> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Locks the session for `id`, creating a fresh one if none exists.
	///
	/// Waits while another input for the same conversation holds the lease.
	/// The session is marked active on every lease.
	pub async fn lease(&self, id: ConversationId) -> SessionLease<S> {
		loop {
			let entry = self
				.sessions
				.entry(id)
				.or_insert_with(|| {
					tracing::debug!(conversation = %id, "Created session");
					Arc::new(Mutex::new(SessionEntry {
						state: S::default(),
						last_active: Instant::now(),
						evicted: false,
					}))
				})
				.clone();

			let mut guard = entry.lock_owned().await;
			// Lost a race with cleanup or removal, the entry is gone from the map
			if guard.evicted {
				continue;
			}
			guard.last_active = Instant::now();
			return SessionLease { guard };
		}
	}

	/// Drops the session for `id`. Returns true if one existed.
	///
	/// Waits for an in-flight lease on that session to end first.
	pub async fn remove(&self, id: ConversationId) -> bool {
		let Some((_, entry)) = self.sessions.remove(&id) else {
			return false;
		};
		entry.lock().await.evicted = true;
		true
	}

	/// Drops every session idle for longer than `ttl` and returns how many
	/// were dropped. Leased sessions are skipped.
	pub fn cleanup_expired(&self, ttl: Duration) -> usize {
		let now = Instant::now();
		let mut removed = 0;

		self.sessions.retain(|id, entry| {
			let Ok(mut guard) = entry.try_lock() else {
				return true;
			};
			if now.duration_since(guard.last_active) <= ttl {
				return true;
			}
			guard.evicted = true;
			removed += 1;
			tracing::debug!(conversation = %id, "Expired idle session");
			false
		});

		removed
	}

	/// Number of live sessions.
	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}
}

impl<S: Clone + Default + Send + 'static> SessionStore<S> {
	/// Returns a copy of the session for `id` without creating one and
	/// without refreshing its activity time.
	pub async fn snapshot(&self, id: ConversationId) -> Option<S> {
		let entry = self.sessions.get(&id).map(|e| e.value().clone())?;
		let guard = entry.lock().await;
		if guard.evicted {
			return None;
		}
		Some(guard.state.clone())
	}

	/// Like [`snapshot`](Self::snapshot), but fails with [`SessionBusy`]
	/// instead of waiting for a lease to end.
	pub fn try_snapshot(&self, id: ConversationId) -> Result<Option<S>, SessionBusy> {
		let Some(entry) = self.sessions.get(&id).map(|e| e.value().clone()) else {
			return Ok(None);
		};
		let guard = entry.try_lock().map_err(|_| SessionBusy(id))?;
		if guard.evicted {
			return Ok(None);
		}
		Ok(Some(guard.state.clone()))
	}
}

/// Exclusive access to one session.
///
/// The session stays locked until the lease is dropped.
pub struct SessionLease<S> {
	guard: OwnedMutexGuard<SessionEntry<S>>,
}

impl<S: Default> SessionLease<S> {
	/// Replaces the session with a fresh one.
	pub fn reset(&mut self) {
		self.guard.state = S::default();
	}
}

impl<S> Deref for SessionLease<S> {
	type Target = S;

	fn deref(&self) -> &S {
		&self.guard.state
	}
}

impl<S> DerefMut for SessionLease<S> {
	fn deref_mut(&mut self) -> &mut S {
		&mut self.guard.state
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone, Default, PartialEq)]
	struct Counter {
		hits: u32,
	}

	#[tokio::test]
	async fn test_lease_creates_and_persists() {
		let store: SessionStore<Counter> = SessionStore::new();
		let id = ConversationId(42);

		assert!(store.snapshot(id).await.is_none());
		{
			let mut lease = store.lease(id).await;
			lease.hits += 1;
		}
		{
			let mut lease = store.lease(id).await;
			lease.hits += 1;
		}

		assert_eq!(store.snapshot(id).await, Some(Counter { hits: 2 }));
		assert_eq!(store.len(), 1);
	}

	#[tokio::test]
	async fn test_sessions_are_isolated() {
		let store: SessionStore<Counter> = SessionStore::new();
		store.lease(ConversationId(1)).await.hits = 5;
		store.lease(ConversationId(2)).await.hits = 7;

		assert_eq!(store.snapshot(ConversationId(1)).await.unwrap().hits, 5);
		assert_eq!(store.snapshot(ConversationId(2)).await.unwrap().hits, 7);
	}

	#[tokio::test]
	async fn test_reset_and_remove() {
		let store: SessionStore<Counter> = SessionStore::new();
		let id = ConversationId(3);
		{
			let mut lease = store.lease(id).await;
			lease.hits = 9;
			lease.reset();
		}
		assert_eq!(store.snapshot(id).await.unwrap().hits, 0);

		assert!(store.remove(id).await);
		assert!(!store.remove(id).await);
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn test_concurrent_inputs_are_serialized() {
		let store: Arc<SessionStore<Counter>> = Arc::new(SessionStore::new());
		let id = ConversationId(10);

		let mut handles = Vec::new();
		for _ in 0..50 {
			let store = store.clone();
			handles.push(tokio::spawn(async move {
				let mut lease = store.lease(id).await;
				let seen = lease.hits;
				tokio::task::yield_now().await;
				lease.hits = seen + 1;
			}));
		}
		for handle in handles {
			handle.await.unwrap();
		}

		assert_eq!(store.snapshot(id).await.unwrap().hits, 50);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cleanup_drops_idle_sessions_only() {
		let store: SessionStore<Counter> = SessionStore::new();
		store.lease(ConversationId(1)).await.hits = 1;

		tokio::time::advance(Duration::from_secs(90)).await;
		store.lease(ConversationId(2)).await.hits = 2;

		tokio::time::advance(Duration::from_secs(30)).await;
		let removed = store.cleanup_expired(Duration::from_secs(60));

		assert_eq!(removed, 1);
		assert!(store.snapshot(ConversationId(1)).await.is_none());
		assert_eq!(store.snapshot(ConversationId(2)).await.unwrap().hits, 2);
	}

	#[tokio::test(start_paused = true)]
	async fn test_cleanup_skips_leased_session() {
		let store: SessionStore<Counter> = SessionStore::new();
		let id = ConversationId(5);

		let mut lease = store.lease(id).await;
		lease.hits = 3;
		tokio::time::advance(Duration::from_secs(600)).await;

		assert_eq!(store.cleanup_expired(Duration::from_secs(60)), 0);
		drop(lease);

		assert_eq!(store.snapshot(id).await.unwrap().hits, 3);
	}

	#[tokio::test]
	async fn test_try_snapshot_reports_leased_session_as_busy() {
		let store: SessionStore<Counter> = SessionStore::new();
		let id = ConversationId(7);

		assert_eq!(store.try_snapshot(id), Ok(None));

		let mut lease = store.lease(id).await;
		lease.hits = 2;
		assert_eq!(store.try_snapshot(id), Err(SessionBusy(id)));

		drop(lease);
		assert_eq!(store.try_snapshot(id), Ok(Some(Counter { hits: 2 })));
	}

	#[tokio::test(start_paused = true)]
	async fn test_expired_session_starts_fresh() {
		let store: SessionStore<Counter> = SessionStore::new();
		let id = ConversationId(6);
		store.lease(id).await.hits = 4;

		tokio::time::advance(Duration::from_secs(120)).await;
		store.cleanup_expired(Duration::from_secs(60));

		assert_eq!(store.lease(id).await.hits, 0);
	}
}
