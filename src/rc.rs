use crate::observer::Observer;
use parking_lot::{Mutex, MutexGuard};
use std::sync::Arc;

/// A shared, mutable cell that can cross threads.
///
/// Operators that fan in from several upstreams (flat_map inners, timer
/// boundaries, subjects) keep the downstream subscriber in a `MutArc` so
/// every path serializes its emissions through one lock.
#[derive(Default)]
pub struct MutArc<T>(Arc<Mutex<T>>);

impl<T> MutArc<T> {
  pub fn own(t: T) -> Self { Self(Arc::new(Mutex::new(t))) }

  #[inline]
  pub fn lock(&self) -> MutexGuard<'_, T> { self.0.lock() }

  /// Returns true when both handles point at the same cell.
  pub fn ptr_eq(&self, other: &Self) -> bool { Arc::ptr_eq(&self.0, &other.0) }
}

impl<T> Clone for MutArc<T> {
  #[inline]
  fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<Item, Err, O> Observer<Item, Err> for MutArc<O>
where
  O: Observer<Item, Err>,
{
  fn next(&mut self, value: Item) { self.lock().next(value) }

  fn error(&mut self, err: Err) { self.lock().error(err) }

  fn complete(&mut self) { self.lock().complete() }

  fn is_finished(&self) -> bool { self.lock().is_finished() }
}
