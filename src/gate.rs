//! Single-flight guards per scope.
//!
//! Pending scopes live in an arena of slots keyed by element identity, so no flags are attached to the
//! (externally owned) elements themselves. A slot also holds the rollback record of its in-flight action,
//! which therefore lives exactly as long as the guard.

use crate::{
	error::{Error, Result},
	predict::PredictionResult,
};
use core::cell::RefCell;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotKey(usize);

#[derive(Debug)]
struct Slot<N> {
	scope: N,
	record: Option<PredictionResult>,
}

#[derive(Debug)]
pub struct ScopeRegistry<N> {
	slots: Vec<Option<Slot<N>>>,
	free: Vec<usize>,
}

impl<N> Default for ScopeRegistry<N> {
	fn default() -> Self {
		Self { slots: Vec::new(), free: Vec::new() }
	}
}

impl<N: PartialEq> ScopeRegistry<N> {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	fn find(&self, scope: &N) -> Option<SlotKey> {
		self.slots.iter().position(|slot| slot.as_ref().map_or(false, |slot| slot.scope == *scope)).map(SlotKey)
	}

	#[must_use]
	pub fn is_pending(&self, scope: &N) -> bool {
		self.find(scope).is_some()
	}

	/// Number of scopes with an action in flight.
	#[must_use]
	pub fn pending(&self) -> usize {
		self.slots.len() - self.free.len()
	}

	/// Marks `scope` as pending.
	///
	/// # Errors
	///
	/// [`Error::ConcurrentActionRejected`] iff it already is.
	pub fn acquire(&mut self, scope: N) -> Result<SlotKey> {
		if self.is_pending(&scope) {
			return Err(Error::ConcurrentActionRejected);
		}
		let slot = Some(Slot { scope, record: None });
		let key = match self.free.pop() {
			Some(index) => {
				self.slots[index] = slot;
				SlotKey(index)
			}
			None => {
				self.slots.push(slot);
				SlotKey(self.slots.len() - 1)
			}
		};
		trace!("Acquired scope slot {}.", key.0);
		Ok(key)
	}

	/// Clears the guard, discarding any rollback record that wasn't taken.
	pub fn release(&mut self, key: SlotKey) -> Option<N> {
		let slot = self.slots.get_mut(key.0)?.take()?;
		self.free.push(key.0);
		trace!("Released scope slot {}.", key.0);
		Some(slot.scope)
	}

	pub fn set_record(&mut self, key: SlotKey, record: PredictionResult) {
		if let Some(Some(slot)) = self.slots.get_mut(key.0) {
			slot.record = Some(record);
		}
	}

	pub fn take_record(&mut self, key: SlotKey) -> Option<PredictionResult> {
		self.slots.get_mut(key.0)?.as_mut()?.record.take()
	}
}

/// Holds a scope's slot and releases it when dropped, whichever way the action ends.
#[derive(Debug)]
pub struct PendingGuard<'a, N: PartialEq> {
	registry: &'a RefCell<ScopeRegistry<N>>,
	key: SlotKey,
}

impl<'a, N: PartialEq> PendingGuard<'a, N> {
	/// # Errors
	///
	/// [`Error::ConcurrentActionRejected`] iff `scope` is already pending.
	pub fn acquire(registry: &'a RefCell<ScopeRegistry<N>>, scope: N) -> Result<Self> {
		let key = registry.borrow_mut().acquire(scope)?;
		Ok(Self { registry, key })
	}

	pub fn record(&self, record: PredictionResult) {
		self.registry.borrow_mut().set_record(self.key, record);
	}

	#[must_use]
	pub fn take_record(&self) -> Option<PredictionResult> {
		self.registry.borrow_mut().take_record(self.key)
	}
}

impl<N: PartialEq> Drop for PendingGuard<'_, N> {
	fn drop(&mut self) {
		self.registry.borrow_mut().release(self.key);
	}
}
