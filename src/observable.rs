use std::sync::Arc;

use crate::{
  error::RxError,
  observer::{subscribe_family, FnObserver, Observer},
  subscriber::Subscriber,
  subscription::{Subscription, TeardownLogic},
};

mod from_iter;
mod of;

type OnSubscribe<T> = dyn Fn(Subscriber<T>) -> TeardownLogic + Send + Sync;

/// A recipe for emission: how to start pushing values into a subscriber, and
/// the teardown that releases the producer afterwards.
///
/// An `Observable` holds no emission state itself; every `subscribe` runs the
/// recipe afresh, so independent subscriptions share nothing (unless the
/// recipe itself closes over a multicast source such as a
/// [`Subject`](crate::subject::Subject)).
pub struct Observable<T> {
  on_subscribe: Arc<OnSubscribe<T>>,
}

impl<T> Clone for Observable<T> {
  fn clone(&self) -> Self { Observable { on_subscribe: self.on_subscribe.clone() } }
}

impl<T: 'static> Observable<T> {
  /// Wrap an `on_subscribe` recipe.
  ///
  /// The recipe receives the live [`Subscriber`] and returns the
  /// [`TeardownLogic`] releasing whatever it started. A producer that keeps
  /// running after `on_subscribe` returns (say, on its own thread) must poll
  /// the subscriber's flag through `next`/`is_stopped` and should signal
  /// itself from the teardown.
  pub fn new(on_subscribe: impl Fn(Subscriber<T>) -> TeardownLogic + Send + Sync + 'static) -> Self {
    Observable { on_subscribe: Arc::new(on_subscribe) }
  }

  /// Subscribe with a full [`Observer`] implementation.
  pub fn subscribe_with(&self, observer: impl Observer<Item = T> + Send + 'static) -> Subscription {
    let subscriber = Subscriber::new(observer);
    let exec = subscriber.execution();
    let teardown = (*self.on_subscribe)(subscriber);
    exec.register(teardown);
    Subscription::from_execution(exec)
  }

  subscribe_family!(T);

  /// Feed this observable through one operator function. Chain calls, or use
  /// [`pipe!`](crate::pipe) for longer left-to-right compositions.
  pub fn pipe<R>(self, op: impl FnOnce(Observable<T>) -> R) -> R { op(self) }
}

/// Module-function flavor of [`Observable::new`].
pub fn create<T: 'static>(
  on_subscribe: impl Fn(Subscriber<T>) -> TeardownLogic + Send + Sync + 'static,
) -> Observable<T> {
  Observable::new(on_subscribe)
}

/// Left-fold operator composition: `pipe!(src, op1, op2)` is `op2(op1(src))`.
///
/// Operator functions come from [`crate::ops`] or any
/// `FnOnce(Observable<T>) -> Observable<U>` of your own.
#[macro_export]
macro_rules! pipe {
  ($source: expr) => { $source };
  ($source: expr, $op: expr $(, $rest: expr)* $(,)?) => {
    $crate::pipe!(($op)($source) $(, $rest)*)
  };
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
  };

  use super::*;
  use crate::error::message_error;

  #[test]
  fn create_next_complete() {
    let emitted = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));

    let e = emitted.clone();
    let c = completed.clone();
    create(|subscriber| {
      subscriber.next(1);
      subscriber.next(2);
      subscriber.complete();
      TeardownLogic::None
    })
    .subscribe_complete(
      move |v| e.lock().unwrap().push(v),
      move || c.store(true, Ordering::Relaxed),
    );

    assert_eq!(*emitted.lock().unwrap(), vec![1, 2]);
    assert!(completed.load(Ordering::Relaxed));
  }

  #[test]
  fn create_error() {
    let seen = Arc::new(Mutex::new(None));

    let s = seen.clone();
    create(|subscriber: Subscriber<i32>| {
      subscriber.error(message_error("oops"));
      TeardownLogic::None
    })
    .subscribe_err(|_| {}, move |e| *s.lock().unwrap() = Some(e.to_string()));

    assert_eq!(seen.lock().unwrap().as_deref(), Some("oops"));
  }

  #[test]
  fn teardown_runs_on_unsubscribe() {
    let released = Arc::new(AtomicBool::new(false));

    let r = released.clone();
    let subscription = create(move |subscriber: Subscriber<i32>| {
      subscriber.next(1);
      let r = r.clone();
      TeardownLogic::new(move || r.store(true, Ordering::Relaxed))
    })
    .subscribe(|_| {});

    assert!(!released.load(Ordering::Relaxed));
    subscription.unsubscribe();
    assert!(released.load(Ordering::Relaxed));
  }

  #[test]
  fn teardown_runs_when_producer_completes_synchronously() {
    let released = Arc::new(AtomicBool::new(false));

    let r = released.clone();
    create(move |subscriber: Subscriber<i32>| {
      subscriber.next(1);
      subscriber.complete();
      let r = r.clone();
      TeardownLogic::new(move || r.store(true, Ordering::Relaxed))
    })
    .subscribe(|_| {});

    assert!(released.load(Ordering::Relaxed));
  }

  #[test]
  fn each_subscription_reruns_the_recipe() {
    let runs = Arc::new(AtomicUsize::new(0));

    let r = runs.clone();
    let observable = create(move |subscriber| {
      r.fetch_add(1, Ordering::Relaxed);
      subscriber.next(1);
      subscriber.complete();
      TeardownLogic::None
    });

    observable.subscribe(|_| {});
    observable.subscribe(|_| {});
    assert_eq!(runs.load(Ordering::Relaxed), 2);
  }

  #[test]
  fn pipe_method_applies_an_operator_function() {
    let collected = Arc::new(Mutex::new(vec![]));

    let c = collected.clone();
    Observable::from_iter(1..=3)
      .pipe(crate::ops::map(|v: i32| v * 2))
      .pipe(crate::ops::distinct())
      .subscribe(move |v| c.lock().unwrap().push(v));

    assert_eq!(*collected.lock().unwrap(), vec![2, 4, 6]);
  }

  #[test]
  fn pipe_macro_folds_left_to_right() {
    let collected = Arc::new(Mutex::new(vec![]));

    let c = collected.clone();
    crate::pipe!(
      Observable::from_iter(1..=3),
      crate::ops::map(|v: i32| v * 10),
      crate::ops::map(|v: i32| v + 1)
    )
    .subscribe(move |v| c.lock().unwrap().push(v));

    assert_eq!(*collected.lock().unwrap(), vec![11, 21, 31]);
  }
}
