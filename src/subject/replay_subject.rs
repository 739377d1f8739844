use std::{
  collections::VecDeque,
  sync::{Arc, RwLock},
};

use super::{BroadcastGuard, Multicast, Terminal};
use crate::{
  error::RxError,
  observable::Observable,
  observer::{subscribe_family, FnObserver, Observer},
  subscriber::Subscriber,
  subscription::{Subscription, TeardownLogic},
  util::{read_lock, write_lock},
};

/// A [`Subject`](crate::subject::Subject) that buffers past values and
/// replays them, in order, to every new subscriber.
///
/// The buffer keeps the last `capacity` values; capacity `0` keeps
/// everything. The history outlives termination: a subscriber arriving after
/// `complete`/`error` first receives the full replay, then the terminal.
///
/// Calling back into the same subject from inside one of its callbacks — a
/// re-entrant `next`, `error`, `complete`, or subscribe — is not supported
/// and panics.
pub struct ReplaySubject<T> {
  state: Arc<RwLock<ReplayState<T>>>,
}

struct ReplayState<T> {
  multicast: Multicast<T>,
  history: VecDeque<T>,
  capacity: usize,
}

impl<T> Clone for ReplaySubject<T> {
  fn clone(&self) -> Self { ReplaySubject { state: self.state.clone() } }
}

impl<T> ReplaySubject<T> {
  /// `capacity` bounds the replay buffer; `0` means unbounded.
  pub fn new(capacity: usize) -> Self {
    ReplaySubject {
      state: Arc::new(RwLock::new(ReplayState {
        multicast: Multicast::default(),
        history: VecDeque::new(),
        capacity,
      })),
    }
  }

  pub fn subscriber_count(&self) -> usize { read_lock(&self.state).multicast.subscribers.len() }

  fn broadcast_guard(&self) -> BroadcastGuard {
    BroadcastGuard::enter(Arc::as_ptr(&self.state) as usize)
  }
}

impl<T: Clone> ReplaySubject<T> {
  /// Record `value` in the history, evicting the oldest entry at capacity,
  /// then broadcast it.
  pub fn next(&self, value: T) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    if !state.multicast.terminal.is_open() {
      return;
    }
    state.multicast.subscribers.prune();
    if state.capacity > 0 && state.history.len() == state.capacity {
      state.history.pop_front();
    }
    state.history.push_back(value.clone());
    state.multicast.subscribers.broadcast_value(value);
  }

  /// Latch errored and forward the error to every subscriber. The history is
  /// kept for late subscribers.
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

  /// Latch completed and complete every subscriber. The history is kept for
  /// late subscribers.
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

impl<T> ReplaySubject<T>
where
  T: Clone + Send + Sync + 'static,
{
  pub(crate) fn attach(&self, subscriber: Subscriber<T>) {
    let _guard = self.broadcast_guard();
    let mut state = write_lock(&self.state);
    for value in &state.history {
      subscriber.next(value.clone());
    }
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

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
  };

  use super::*;
  use crate::error::message_error;

  fn collector() -> (Arc<Mutex<Vec<i32>>>, impl FnMut(i32) + Send + 'static) {
    let store = Arc::new(Mutex::new(vec![]));
    let sink = store.clone();
    (store, move |v| sink.lock().unwrap().push(v))
  }

  #[test]
  fn unbounded_replay_catches_up_late_subscribers() {
    let subject = ReplaySubject::new(0);

    let (first, push_first) = collector();
    let first_completed = Arc::new(AtomicUsize::new(0));
    let c1 = first_completed.clone();
    let _first_sub = subject.subscribe_complete(push_first, move || {
      c1.fetch_add(1, Ordering::Relaxed);
    });

    subject.next(1);
    subject.next(2);
    subject.next(3);

    let (second, push_second) = collector();
    let second_completed = Arc::new(AtomicUsize::new(0));
    let c2 = second_completed.clone();
    let _second_sub = subject.subscribe_complete(push_second, move || {
      c2.fetch_add(1, Ordering::Relaxed);
    });

    subject.next(4);
    subject.next(5);
    subject.complete();

    assert_eq!(*first.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(*second.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    assert_eq!(first_completed.load(Ordering::Relaxed), 1);
    assert_eq!(second_completed.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn bounded_buffer_evicts_oldest_first() {
    let subject = ReplaySubject::new(2);
    subject.next(1);
    subject.next(2);
    subject.next(3);

    let (store, push) = collector();
    subject.subscribe(push);

    assert_eq!(*store.lock().unwrap(), vec![2, 3]);
  }

  #[test]
  fn late_subscriber_after_terminal_gets_replay_then_terminal() {
    let subject = ReplaySubject::new(0);
    subject.next(1);
    subject.next(2);
    subject.complete();

    let (store, push) = collector();
    let completions = Arc::new(AtomicUsize::new(0));
    let c = completions.clone();
    subject.subscribe_complete(push, move || {
      c.fetch_add(1, Ordering::Relaxed);
    });

    assert_eq!(*store.lock().unwrap(), vec![1, 2]);
    assert_eq!(completions.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn late_subscriber_after_error_gets_replay_then_error() {
    let subject = ReplaySubject::new(0);
    subject.next(1);
    subject.error(message_error("boom"));

    let (store, push) = collector();
    let seen = Arc::new(Mutex::new(None));
    let s = seen.clone();
    subject.subscribe_err(push, move |e| *s.lock().unwrap() = Some(e.to_string()));

    assert_eq!(*store.lock().unwrap(), vec![1]);
    assert_eq!(seen.lock().unwrap().as_deref(), Some("boom"));
  }

  #[test]
  fn reentrant_next_panics() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let subject = ReplaySubject::new(0);
    let feedback = subject.clone();
    let _subscription = subject.subscribe(move |_: i32| {
      feedback.next(2);
    });

    assert!(catch_unwind(AssertUnwindSafe(|| subject.next(1))).is_err());
  }

  #[test]
  fn reentrant_subscribe_panics() {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    let subject = ReplaySubject::new(0);
    let feedback = subject.clone();
    let _subscription = subject.subscribe(move |_: i32| {
      feedback.subscribe(|_: i32| {});
    });

    assert!(catch_unwind(AssertUnwindSafe(|| subject.next(1))).is_err());
  }

  #[test]
  fn next_after_terminal_does_not_grow_the_history() {
    let subject = ReplaySubject::new(0);
    subject.next(1);
    subject.complete();
    subject.next(2);

    let (store, push) = collector();
    subject.subscribe(push);
    assert_eq!(*store.lock().unwrap(), vec![1]);
  }
}
