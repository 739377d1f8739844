use std::{
  cell::RefCell,
  sync::{Arc, RwLock},
};

use smallvec::SmallVec;

use crate::{
  error::RxError,
  observable::Observable,
  observer::{subscribe_family, FnObserver, Observer},
  subscriber::Subscriber,
  subscription::{Subscription, TeardownLogic},
  util::{read_lock, try_write_lock, write_lock},
};

mod behavior_subject;
mod replay_subject;

pub use behavior_subject::BehaviorSubject;
pub use replay_subject::ReplaySubject;

thread_local! {
  // subjects this thread is currently delivering for, innermost last
  static EMITTING: RefCell<Vec<usize>> = RefCell::new(Vec::new());
}

/// Detects same-thread re-entry into a subject that is mid-delivery.
///
/// The subject lock cannot tell re-entry apart from contention with another
/// producer, so every emission and subscription pushes the subject's key onto
/// a thread-local stack for its duration; finding the key already there means
/// a callback has called back into its own subject, which would otherwise
/// deadlock on the lock. That call panics instead.
pub(crate) struct BroadcastGuard {
  key: usize,
}

impl BroadcastGuard {
  pub(crate) fn enter(key: usize) -> Self {
    EMITTING.with(|stack| {
      if stack.borrow().contains(&key) {
        panic!(
          "re-entrant subject emissions are not supported \
           (next/error/complete/subscribe on a subject from inside one of its own callbacks)"
        );
      }
      stack.borrow_mut().push(key);
    });
    BroadcastGuard { key }
  }
}

impl Drop for BroadcastGuard {
  fn drop(&mut self) {
    EMITTING.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(position) = stack.iter().rposition(|k| *k == self.key) {
        stack.remove(position);
      }
    });
  }
}

/// Terminal latch of a multicast source: producer methods observe it and
/// early-return once it leaves `Open`.
pub(crate) enum Terminal {
  Open,
  Errored(RxError),
  Completed,
}

impl Terminal {
  pub(crate) fn is_open(&self) -> bool { matches!(self, Terminal::Open) }
}

/// The live subscriber list of a multicast source, in registration order.
pub(crate) struct Subscribers<T> {
  inner: SmallVec<[Subscriber<T>; 2]>,
}

impl<T> Default for Subscribers<T> {
  fn default() -> Self { Subscribers { inner: SmallVec::new() } }
}

impl<T> Subscribers<T> {
  pub(crate) fn add(&mut self, subscriber: Subscriber<T>) { self.inner.push(subscriber) }

  /// Drop subscribers whose inactive flag a downstream unsubscribe has set.
  pub(crate) fn prune(&mut self) { self.inner.retain(|s| !s.is_stopped()) }

  pub(crate) fn len(&self) -> usize { self.inner.len() }

  pub(crate) fn is_empty(&self) -> bool { self.inner.is_empty() }

  pub(crate) fn take(&mut self) -> Subscribers<T> { std::mem::take(self) }

  /// Broadcast a value in registration order. The last subscriber receives
  /// the moved value instead of a clone.
  pub(crate) fn broadcast_value(&self, value: T)
  where
    T: Clone,
  {
    let mut iter = self.inner.iter().peekable();
    while let Some(subscriber) = iter.next() {
      if iter.peek().is_some() {
        subscriber.next(value.clone());
      } else {
        subscriber.next(value);
        break;
      }
    }
  }

  /// Deliver the error to every subscriber, consuming the list.
  pub(crate) fn notify_error(self, err: RxError) {
    let mut iter = self.inner.into_iter().peekable();
    while let Some(subscriber) = iter.next() {
      if iter.peek().is_some() {
        subscriber.error(err.clone());
      } else {
        subscriber.error(err);
        break;
      }
    }
  }

  /// Deliver completion to every subscriber, consuming the list.
  pub(crate) fn notify_complete(self) {
    for subscriber in self.inner {
      subscriber.complete();
    }
  }
}

/// Subscriber list plus terminal latch, the state every subject variant
/// keeps under its reader/writer lock.
pub(crate) struct Multicast<T> {
  pub(crate) subscribers: Subscribers<T>,
  pub(crate) terminal: Terminal,
}

impl<T> Default for Multicast<T> {
  fn default() -> Self {
    Multicast {
      subscribers: Subscribers::default(),
      terminal: Terminal::Open,
    }
  }
}

/// A multicast hub: a producer sink that is also a source of observables.
///
/// Values pushed with [`next`](Subject::next) reach every then-active
/// subscriber, in registration order, before `next` returns. Late
/// subscribers only see values emitted after they subscribed; once the
/// subject has terminated they are driven straight to the terminal state.
///
/// `next` broadcasts under a shared read lock, so producers on several
/// threads never block each other; subscribers whose subscription was
/// dropped are pruned opportunistically under a try-write lock before each
/// broadcast.
///
/// Calling back into the same subject from inside one of its callbacks — a
/// re-entrant `next`, `error`, `complete`, or subscribe — is not supported
/// and panics.
pub struct Subject<T> {
  state: Arc<RwLock<Multicast<T>>>,
}

impl<T> Clone for Subject<T> {
  fn clone(&self) -> Self { Subject { state: self.state.clone() } }
}

impl<T> Default for Subject<T> {
  fn default() -> Self { Subject::new() }
}

impl<T> Subject<T> {
  pub fn new() -> Self { Subject { state: Arc::new(RwLock::new(Multicast::default())) } }

  /// Number of registered subscribers (stopped ones linger until the next
  /// pruning pass).
  pub fn subscriber_count(&self) -> usize { read_lock(&self.state).subscribers.len() }

  pub fn is_empty(&self) -> bool { read_lock(&self.state).subscribers.is_empty() }

  fn broadcast_guard(&self) -> BroadcastGuard {
    BroadcastGuard::enter(Arc::as_ptr(&self.state) as usize)
  }
}

impl<T: Clone> Subject<T> {
  /// Broadcast `value` to every active subscriber.
  pub fn next(&self, value: T) {
    let _guard = self.broadcast_guard();
    if let Some(mut state) = try_write_lock(&self.state) {
      state.subscribers.prune();
    }
    let state = read_lock(&self.state);
    if state.terminal.is_open() {
      state.subscribers.broadcast_value(value);
    }
  }
}

impl<T> Subject<T> {
  /// Latch the subject errored and forward the error to every subscriber.
  /// A no-op once terminated.
  pub fn error(&self, err: RxError) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    if !state.terminal.is_open() {
      return;
    }
    state.terminal = Terminal::Errored(err.clone());
    let subscribers = state.subscribers.take();
    drop(state);
    subscribers.notify_error(err);
  }

  /// Latch the subject completed and complete every subscriber. A no-op once
  /// terminated.
  pub fn complete(&self) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    if !state.terminal.is_open() {
      return;
    }
    state.terminal = Terminal::Completed;
    let subscribers = state.subscribers.take();
    drop(state);
    subscribers.notify_complete();
  }
}

impl<T: 'static> Subject<T> {
  pub(crate) fn attach(&self, subscriber: Subscriber<T>) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    match &state.terminal {
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
    state.subscribers.add(subscriber);
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
