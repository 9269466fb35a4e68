//! Re-entrancy guard for view actions that issue requests.

use std::sync::{
  Arc,
  atomic::{AtomicBool, Ordering},
};

/// Admits at most one outstanding submission at a time.
///
/// Clones share the same flag, so the gate can live in view state while the
/// [`SubmitPermit`] travels into a spawned request task.
#[derive(Debug, Clone, Default)]
pub struct SubmitGate {
  busy: Arc<AtomicBool>,
}

/// Held for the lifetime of one submission; dropping it re-opens the gate.
#[derive(Debug)]
pub struct SubmitPermit {
  busy: Arc<AtomicBool>,
}

impl SubmitGate {
  pub fn new() -> Self { Self::default() }

  /// Claim the gate, or `None` while another submission is pending.
  pub fn try_begin(&self) -> Option<SubmitPermit> {
    self
      .busy
      .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
      .ok()
      .map(|_| SubmitPermit { busy: Arc::clone(&self.busy) })
  }

  pub fn is_pending(&self) -> bool { self.busy.load(Ordering::Acquire) }
}

impl Drop for SubmitPermit {
  fn drop(&mut self) { self.busy.store(false, Ordering::Release); }
}
