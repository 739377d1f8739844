use std::sync::{Arc, Mutex};

use crate::{error::RxError, observer::Observer, subscription::Execution, util::lock};

pub(crate) type BoxObserver<T> = Box<dyn Observer<Item = T> + Send>;

/// The enforcement point of the emission protocol. Every observer gets
/// wrapped into a `Subscriber` on subscribe; producers push into it, from any
/// thread, through a shared reference.
///
/// The subscriber owns the terminal state machine: `Active` until the first
/// of `error`, `complete`, or `unsubscribe`, then absorbingly `Terminated`.
/// After that every call returns silently.
pub struct Subscriber<T> {
  observer: Mutex<BoxObserver<T>>,
  exec: Arc<Execution>,
}

impl<T> Subscriber<T> {
  pub(crate) fn new(observer: impl Observer<Item = T> + Send + 'static) -> Self {
    Subscriber {
      observer: Mutex::new(Box::new(observer)),
      exec: Execution::new(),
    }
  }

  /// Push a value downstream. Silently dropped once the subscriber is
  /// inactive.
  pub fn next(&self, value: T) {
    if self.exec.is_stopped() {
      return;
    }
    let mut observer = lock(&self.observer);
    // recheck under the observer lock so a racing terminal wins
    if self.exec.is_stopped() {
      return;
    }
    observer.next(value);
  }

  /// Signal an error downstream. Only the first terminal signal is
  /// delivered; the subscriber's teardown fires right after it.
  pub fn error(&self, err: RxError) {
    if self.exec.try_stop() {
      lock(&self.observer).error(err);
      self.exec.finish();
    }
  }

  /// Signal completion downstream; symmetric to [`error`](Subscriber::error).
  pub fn complete(&self) {
    if self.exec.try_stop() {
      lock(&self.observer).complete();
      self.exec.finish();
    }
  }

  /// Set the inactive flag without delivering anything.
  pub fn unsubscribe(&self) { self.exec.stop() }

  pub fn is_stopped(&self) -> bool { self.exec.is_stopped() }

  pub(crate) fn execution(&self) -> Arc<Execution> { self.exec.clone() }
}
