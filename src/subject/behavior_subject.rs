use std::sync::{Arc, RwLock};

use super::{BroadcastGuard, Multicast, Terminal};
use crate::{
  error::RxError,
  observable::Observable,
  observer::{subscribe_family, FnObserver, Observer},
  subscriber::Subscriber,
  subscription::{Subscription, TeardownLogic},
  util::{read_lock, write_lock},
};

/// A [`Subject`](crate::subject::Subject) that remembers the latest value and
/// replays it to every new subscriber, synchronously on subscribe.
///
/// The value slot lives under the same write lock as the subscriber list, so
/// the replay-then-register pair is atomic with respect to concurrent
/// `next` calls: a newcomer sees the current value exactly once, never a
/// duplicate and never a gap.
///
/// Calling back into the same subject from inside one of its callbacks — a
/// re-entrant `next`, `error`, `complete`, or subscribe — is not supported
/// and panics.
pub struct BehaviorSubject<T> {
  state: Arc<RwLock<BehaviorState<T>>>,
}

struct BehaviorState<T> {
  multicast: Multicast<T>,
  value: T,
}

impl<T> Clone for BehaviorSubject<T> {
  fn clone(&self) -> Self { BehaviorSubject { state: self.state.clone() } }
}

impl<T> BehaviorSubject<T> {
  pub fn new(initial: T) -> Self {
    BehaviorSubject {
      state: Arc::new(RwLock::new(BehaviorState {
        multicast: Multicast::default(),
        value: initial,
      })),
    }
  }

  pub fn subscriber_count(&self) -> usize { read_lock(&self.state).multicast.subscribers.len() }

  fn broadcast_guard(&self) -> BroadcastGuard {
    BroadcastGuard::enter(Arc::as_ptr(&self.state) as usize)
  }
}

impl<T: Clone> BehaviorSubject<T> {
  /// The value a newcomer would receive right now.
  pub fn value(&self) -> T { read_lock(&self.state).value.clone() }

  /// Store `value` as the new current value and broadcast it.
  pub fn next(&self, value: T) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    if !state.multicast.terminal.is_open() {
      return;
    }
    state.multicast.subscribers.prune();
    state.value = value.clone();
    state.multicast.subscribers.broadcast_value(value);
  }

  /// Latch errored and forward the error to every subscriber.
  pub fn error(&self, err: RxError) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    if !state.multicast.terminal.is_open() {
      return;
    }
    state.multicast.terminal = Terminal::Errored(err.clone());
    let subscribers = state.multicast.subscribers.take();
    drop(state);
    subscribers.notify_error(err);
  }

  /// Latch completed and complete every subscriber.
  pub fn complete(&self) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    if !state.multicast.terminal.is_open() {
      return;
    }
    state.multicast.terminal = Terminal::Completed;
    let subscribers = state.multicast.subscribers.take();
    drop(state);
    subscribers.notify_complete();
  }
}

impl<T> BehaviorSubject<T>
where
  T: Clone + Send + Sync + 'static,
{
  pub(crate) fn attach(&self, subscriber: Subscriber<T>) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    match &state.multicast.terminal {
      Terminal::Open => {}
      Terminal::Errored(err) => {
        let err = err.clone();
        drop(state);
        subscriber.error(err);
        return;
      }
      Terminal::Completed => {
        drop(state);
        subscriber.complete();
        return;
      }
    }
    // current value first, then register: the pair is atomic against
    // concurrent next because both run under the same write lock
    subscriber.next(state.value.clone());
    state.multicast.subscribers.add(subscriber);
  }

  /// Subscribe with a full [`Observer`] implementation.
  pub fn subscribe_with(&self, observer: impl Observer<Item = T> + Send + 'static) -> Subscription {
    let subscriber = Subscriber::new(observer);
    let exec = subscriber.execution();
    self.attach(subscriber);
    Subscription::from_execution(exec)
  }

  subscribe_family!(T);

  /// View this subject as an [`Observable`], for feeding operators.
  pub fn as_observable(&self) -> Observable<T> {
    let subject = self.clone();
    Observable::new(move |subscriber| {
      subject.attach(subscriber);
      TeardownLogic::None
    })
  }
}
