use std::sync::{
  atomic::{AtomicBool, Ordering},
  Arc, Mutex,
};

use smallvec::SmallVec;

use crate::util::lock;

/// The release routine a producer returns from `on_subscribe`.
///
/// `None` is the "no teardown" sentinel. `Once` wraps a closure that runs
/// exactly once, on whichever of terminal signal, explicit unsubscribe, or
/// subscription drop happens first.
pub enum TeardownLogic {
  None,
  Once(Box<dyn FnOnce() + Send>),
}

impl TeardownLogic {
  pub fn new(f: impl FnOnce() + Send + 'static) -> Self { TeardownLogic::Once(Box::new(f)) }

  fn call(self) {
    if let TeardownLogic::Once(f) = self {
      f()
    }
  }
}

impl Default for TeardownLogic {
  fn default() -> Self { TeardownLogic::None }
}

impl From<Subscription> for TeardownLogic {
  /// An operator's teardown is usually "release my upstream legs".
  fn from(upstream: Subscription) -> Self { TeardownLogic::new(move || upstream.unsubscribe()) }
}

/// State shared between a `Subscriber` and its `Subscription`.
///
/// `stopped` is the inactive flag gating every emission. `running` gates the
/// teardown so it fires once no matter how the subscription ends. The
/// teardown slot is filled by `register` once `on_subscribe` has returned;
/// until then a terminal leaves `running` untouched so registration can still
/// run the logic it arrives with.
pub(crate) struct Execution {
  stopped: AtomicBool,
  running: AtomicBool,
  teardown: Mutex<TeardownLogic>,
}

impl Execution {
  pub(crate) fn new() -> Arc<Self> {
    Arc::new(Execution {
      stopped: AtomicBool::new(false),
      running: AtomicBool::new(true),
      teardown: Mutex::new(TeardownLogic::None),
    })
  }

  pub(crate) fn is_stopped(&self) -> bool { self.stopped.load(Ordering::Relaxed) }

  pub(crate) fn stop(&self) { self.stopped.store(true, Ordering::Relaxed) }

  /// Terminal transition; reports whether this call won the latch.
  pub(crate) fn try_stop(&self) -> bool {
    self
      .stopped
      .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
      .is_ok()
  }

  fn take_running(&self) -> bool {
    self
      .running
      .compare_exchange(true, false, Ordering::Relaxed, Ordering::Relaxed)
      .is_ok()
  }

  /// Install the teardown returned by `on_subscribe`. If the producer already
  /// terminated synchronously, run it on the spot.
  pub(crate) fn register(&self, logic: TeardownLogic) {
    let mut slot = lock(&self.teardown);
    if self.is_stopped() {
      drop(slot);
      if self.take_running() {
        logic.call();
      }
    } else {
      *slot = logic;
    }
  }

  /// Run the registered teardown after a terminal signal, if no one beat us
  /// to it. With an empty slot the `running` gate is left alone: the producer
  /// is still inside `on_subscribe` and `register` will see the stopped flag.
  pub(crate) fn finish(&self) {
    let mut slot = lock(&self.teardown);
    if matches!(*slot, TeardownLogic::None) {
      return;
    }
    if self.take_running() {
      let logic = std::mem::take(&mut *slot);
      drop(slot);
      logic.call();
    }
  }

  /// Unsubscribe path: set the inactive flag, then run the teardown.
  fn cancel(&self) {
    if self.take_running() {
      self.stop();
      let logic = std::mem::take(&mut *lock(&self.teardown));
      logic.call();
    } else {
      self.stop();
    }
  }
}

/// An owning handle over a live emission pipeline.
///
/// Dropping the last handle is equivalent to calling [`unsubscribe`]
/// (Subscription::unsubscribe). Child subscriptions added with [`add`]
/// (Subscription::add) are released after the handle's own teardown.
pub struct Subscription {
  inner: Arc<Inner>,
}

struct Inner {
  closed: AtomicBool,
  exec: Option<Arc<Execution>>,
  children: Mutex<SmallVec<[Subscription; 2]>>,
}

impl Subscription {
  /// A subscription with nothing to release; useful as a composite root.
  /// No-ops on `unsubscribe` and drop until children are added.
  pub fn empty() -> Self { Subscription::build(None) }

  pub(crate) fn from_execution(exec: Arc<Execution>) -> Self { Subscription::build(Some(exec)) }

  fn build(exec: Option<Arc<Execution>>) -> Self {
    Subscription {
      inner: Arc::new(Inner {
        closed: AtomicBool::new(false),
        exec,
        children: Mutex::new(SmallVec::new()),
      }),
    }
  }

  /// Append a child subscription, to be released together with this one.
  /// Adding to an already-released subscription releases the child at once.
  pub fn add(&self, child: Subscription) {
    let mut children = lock(&self.inner.children);
    if self.inner.closed.load(Ordering::Relaxed) {
      drop(children);
      child.unsubscribe();
    } else {
      children.push(child);
    }
  }

  /// Release the pipeline: set the subscriber's inactive flag, run the
  /// teardown, then release the children. Safe to call more than once and
  /// from inside a subscriber's own callback.
  pub fn unsubscribe(&self) {
    if self.inner.closed.swap(true, Ordering::Relaxed) {
      return;
    }
    if let Some(exec) = &self.inner.exec {
      exec.cancel();
    }
    let children = std::mem::take(&mut *lock(&self.inner.children));
    for child in children {
      child.unsubscribe();
    }
  }

  pub fn is_closed(&self) -> bool {
    self.inner.closed.load(Ordering::Relaxed)
      || self
        .inner
        .exec
        .as_ref()
        .is_some_and(|exec| exec.is_stopped())
  }
}

impl Clone for Subscription {
  fn clone(&self) -> Self { Subscription { inner: self.inner.clone() } }
}

impl Drop for Inner {
  fn drop(&mut self) {
    if !*self.closed.get_mut() {
      if let Some(exec) = &self.exec {
        exec.cancel();
      }
      // children release through their own drops
    }
  }
}
