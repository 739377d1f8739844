use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};

use crate::{
  error::RxError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::{Subscription, TeardownLogic},
};

impl<T: 'static> Observable<T> {
  /// Merge this observable with another: values interleave as they arrive,
  /// completion waits for both inputs, the first error wins and cancels the
  /// other leg.
  pub fn merge(&self, other: &Observable<T>) -> Observable<T> {
    self.merge_with([other.clone()])
  }

  /// N-ary [`merge`](Observable::merge). Downstream completes only after
  /// all `1 + others.len()` inputs have completed.
  pub fn merge_with(&self, others: impl IntoIterator<Item = Observable<T>>) -> Observable<T> {
    let mut sources = vec![self.clone()];
    sources.extend(others);
    Observable::new(move |subscriber| {
      let downstream = Arc::new(subscriber);
      let pending = Arc::new(AtomicUsize::new(sources.len()));
      let legs = Subscription::empty();
      for source in &sources {
        let observer = MergeObserver {
          downstream: downstream.clone(),
          pending: pending.clone(),
          legs: legs.clone(),
        };
        legs.add(source.subscribe_with(observer));
      }
      TeardownLogic::from(legs)
    })
  }
}

/// Merge `other` into the source observable (pipe flavor).
pub fn merge<T: 'static>(other: Observable<T>) -> impl FnOnce(Observable<T>) -> Observable<T> {
  move |source| source.merge(&other)
}

struct MergeObserver<T> {
  downstream: Arc<Subscriber<T>>,
  pending: Arc<AtomicUsize>,
  legs: Subscription,
}

impl<T> Observer for MergeObserver<T> {
  type Item = T;

  fn next(&mut self, value: T) { self.downstream.next(value) }

  fn error(&mut self, err: RxError) {
    self.legs.unsubscribe();
    self.downstream.error(err);
  }

  fn complete(&mut self) {
    if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
      self.downstream.complete();
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
  };

  use super::*;
  use crate::{error::message_error, subject::Subject};

  #[test]
  fn values_interleave_in_arrival_order() {
    let even = Subject::new();
    let odd = Subject::new();
    let emitted = Arc::new(Mutex::new(vec![]));

    let e = emitted.clone();
    let _subscription = even
      .as_observable()
      .merge(&odd.as_observable())
      .subscribe(move |v| e.lock().unwrap().push(v));

    even.next(0);
    odd.next(1);
    even.next(2);
    odd.next(3);

    assert_eq!(*emitted.lock().unwrap(), vec![0, 1, 2, 3]);
  }

  #[test]
  fn completes_only_after_every_input() {
    let even = Subject::<i32>::new();
    let odd = Subject::<i32>::new();
    let completed = Arc::new(AtomicBool::new(false));

    let c = completed.clone();
    let _subscription = even
      .as_observable()
      .merge(&odd.as_observable())
      .subscribe_complete(|_| {}, move || c.store(true, Ordering::Relaxed));

    even.complete();
    assert!(!completed.load(Ordering::Relaxed));
    odd.complete();
    assert!(completed.load(Ordering::Relaxed));
  }

  #[test]
  fn error_wins_and_silences_the_rest() {
    let completed = Arc::new(AtomicUsize::new(0));
    let errors = Arc::new(AtomicUsize::new(0));
    let even = Subject::<i32>::new();
    let odd = Subject::<i32>::new();

    let e = errors.clone();
    let c = completed.clone();
    let _subscription = even.as_observable().merge(&odd.as_observable()).subscribe_all(
      |_| {},
      move |_| {
        e.fetch_add(1, Ordering::Relaxed);
      },
      move || {
        c.fetch_add(1, Ordering::Relaxed);
      },
    );

    odd.error(message_error("first"));
    even.error(message_error("second"));
    even.complete();

    // the stream terminated on the first error
    assert_eq!(completed.load(Ordering::Relaxed), 0);
    assert_eq!(errors.load(Ordering::Relaxed), 1);
  }

  #[test]
  fn error_cancels_the_other_legs() {
    let left = Subject::<i32>::new();
    let right = Subject::<i32>::new();

    let _subscription = left
      .as_observable()
      .merge(&right.as_observable())
      .subscribe(|_| {});
    assert_eq!(right.subscriber_count(), 1);

    left.error(message_error("boom"));
    // the surviving leg's subscriber went inactive; the next emission prunes
    right.next(1);
    assert_eq!(right.subscriber_count(), 0);
  }

  #[test]
  fn unsubscribe_detaches_every_leg() {
    let numbers = Subject::new();

    numbers
      .as_observable()
      .merge(&numbers.as_observable())
      .subscribe(|_: i32| unreachable!("emission after unsubscribe"))
      .unsubscribe();

    numbers.next(1);
  }

  #[test]
  fn three_way_merge_counts_completions() {
    let a = Subject::<i32>::new();
    let b = Subject::<i32>::new();
    let c = Subject::<i32>::new();
    let completed = Arc::new(AtomicBool::new(false));

    let done = completed.clone();
    let _subscription = a
      .as_observable()
      .merge_with([b.as_observable(), c.as_observable()])
      .subscribe_complete(|_| {}, move || done.store(true, Ordering::Relaxed));

    a.complete();
    b.complete();
    assert!(!completed.load(Ordering::Relaxed));
    c.complete();
    assert!(completed.load(Ordering::Relaxed));
  }

  #[test]
  fn merging_synchronous_sources_concatenates() {
    let emitted = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));

    let e = emitted.clone();
    let c = completed.clone();
    Observable::of(1)
      .merge(&Observable::of(2))
      .subscribe_complete(
        move |v| e.lock().unwrap().push(v),
        move || c.store(true, Ordering::Relaxed),
      );

    assert_eq!(*emitted.lock().unwrap(), vec![1, 2]);
    assert!(completed.load(Ordering::Relaxed));
  }
}
