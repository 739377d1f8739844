use std::sync::{Arc, Mutex};

use crate::{
  error::RxError,
  observable::Observable,
  observer::Observer,
  subscriber::Subscriber,
  subscription::{Subscription, TeardownLogic},
  util::lock,
};

impl<A> Observable<A>
where
  A: Send + 'static,
{
  /// Pair each source value with the latest value of `other`, emitting only
  /// on source emissions. Source values arriving before `other` has emitted
  /// are dropped.
  ///
  /// The source drives the lifecycle: its completion completes downstream,
  /// while completion of `other` is ignored. An error on either leg
  /// terminates downstream.
  pub fn with_latest_from<B>(&self, other: &Observable<B>) -> Observable<(A, B)>
  where
    B: Clone + Send + 'static,
  {
    let source = self.clone();
    let companion = other.clone();
    Observable::new(move |subscriber: Subscriber<(A, B)>| {
      let downstream = Arc::new(subscriber);
      let latest = Arc::new(Mutex::new(None::<B>));
      let legs = Subscription::empty();

      legs.add(companion.subscribe_with(CompanionObserver {
        downstream: downstream.clone(),
        latest: latest.clone(),
        legs: legs.clone(),
      }));
      legs.add(source.subscribe_with(SourceObserver {
        downstream,
        latest,
        legs: legs.clone(),
      }));
      TeardownLogic::from(legs)
    })
  }
}

/// Pair source values with the latest value of `other` (pipe flavor).
pub fn with_latest_from<A, B>(
  other: Observable<B>,
) -> impl FnOnce(Observable<A>) -> Observable<(A, B)>
where
  A: Send + 'static,
  B: Clone + Send + 'static,
{
  move |source| source.with_latest_from(&other)
}

struct SourceObserver<A, B> {
  downstream: Arc<Subscriber<(A, B)>>,
  latest: Arc<Mutex<Option<B>>>,
  legs: Subscription,
}

impl<A, B: Clone> Observer for SourceObserver<A, B> {
  type Item = A;

  fn next(&mut self, value: A) {
    let latest = lock(&self.latest).clone();
    if let Some(b) = latest {
      self.downstream.next((value, b));
    }
  }

  fn error(&mut self, err: RxError) {
    self.legs.unsubscribe();
    self.downstream.error(err);
  }

  fn complete(&mut self) { self.downstream.complete() }
}

struct CompanionObserver<A, B> {
  downstream: Arc<Subscriber<(A, B)>>,
  latest: Arc<Mutex<Option<B>>>,
  legs: Subscription,
}

impl<A, B> Observer for CompanionObserver<A, B> {
  type Item = B;

  fn next(&mut self, value: B) { *lock(&self.latest) = Some(value) }

  fn error(&mut self, err: RxError) {
    self.legs.unsubscribe();
    self.downstream.error(err);
  }

  // only the source ends the pairing
  fn complete(&mut self) {}
}

#[cfg(test)]
mod tests {
  use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
  };

  use super::*;
  use crate::{error::message_error, subject::Subject};

  #[test]
  fn source_drives_the_emissions() {
    let a = Subject::new();
    let b = Subject::new();
    let emitted = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(AtomicBool::new(false));

    let e = emitted.clone();
    let c = completed.clone();
    let _subscription = a
      .as_observable()
      .with_latest_from(&b.as_observable())
      .subscribe_complete(
        move |v| e.lock().unwrap().push(v),
        move || c.store(true, Ordering::Relaxed),
      );

    a.next(1); // dropped: b has not emitted yet
    b.next(10);
    a.next(2); // (2, 10)
    b.next(20);
    a.next(3); // (3, 20)

    assert_eq!(*emitted.lock().unwrap(), vec![(2, 10), (3, 20)]);

    b.complete();
    assert!(!completed.load(Ordering::Relaxed));
    a.complete();
    assert!(completed.load(Ordering::Relaxed));
  }

  #[test]
  fn repeated_source_emissions_reuse_the_latest_companion_value() {
    let s1 = Subject::new();
    let s2 = Subject::new();
    let emitted = Arc::new(Mutex::new(String::new()));

    let e = emitted.clone();
    let _subscription = s1
      .as_observable()
      .with_latest_from(&s2.as_observable())
      .subscribe(move |(a, b)| {
        let mut out = e.lock().unwrap();
        out.push(a);
        out.push(b);
      });

    s1.next('1');
    s2.next('A');
    s1.next('2'); // 2A
    s2.next('B');
    s2.next('C');
    s2.next('D');
    s1.next('3'); // 3D
    s1.next('4'); // 4D
    s1.next('5'); // 5D

    assert_eq!(*emitted.lock().unwrap(), "2A3D4D5D");
  }

  #[test]
  fn companion_error_terminates_downstream() {
    let a = Subject::<i32>::new();
    let b = Subject::<i32>::new();
    let seen = Arc::new(Mutex::new(vec![]));

    let s = seen.clone();
    let _subscription = a
      .as_observable()
      .with_latest_from(&b.as_observable())
      .subscribe_err(|_| {}, move |e| s.lock().unwrap().push(e.to_string()));

    b.error(message_error("boom"));
    assert_eq!(*seen.lock().unwrap(), vec!["boom".to_string()]);

    // the source leg was cancelled along with the pipeline
    a.next(1);
    assert_eq!(a.subscriber_count(), 0);
  }

  #[test]
  fn source_completion_releases_the_companion_leg() {
    let a = Subject::<i32>::new();
    let b = Subject::<i32>::new();
    let completed = Arc::new(AtomicBool::new(false));

    let c = completed.clone();
    let _subscription = a
      .as_observable()
      .with_latest_from(&b.as_observable())
      .subscribe_complete(|_| {}, move || c.store(true, Ordering::Relaxed));

    a.complete();
    assert!(completed.load(Ordering::Relaxed));

    // downstream terminal ran the teardown, detaching the companion
    b.next(1);
    assert_eq!(b.subscriber_count(), 0);
  }

  #[test]
  fn companion_feedback_from_the_callback_is_tolerated() {
    let a = Subject::new();
    let b = Subject::new();

    let b_feedback = b.clone();
    let _subscription = a
      .as_observable()
      .with_latest_from(&b.as_observable())
      .subscribe(move |_: ((), ())| {
        b_feedback.next(());
      });

    b.next(());
    a.next(());
    a.next(());
  }
}
