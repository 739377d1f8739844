use std::{
  cmp::Eq,
  collections::HashSet,
  hash::Hash,
};

use crate::{
  error::RxError, observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::TeardownLogic,
};

impl<T> Observable<T>
where
  T: Clone + Eq + Hash + Send + 'static,
{
  /// Suppress values already seen on this subscription, forwarding each
  /// distinct value on its first occurrence. The seen-set is
  /// per-subscription; a re-subscription starts fresh.
  pub fn distinct(&self) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |subscriber| {
      let upstream = source.subscribe_with(DistinctObserver {
        downstream: subscriber,
        seen: HashSet::new(),
      });
      TeardownLogic::from(upstream)
    })
  }
}

impl<T> Observable<T>
where
  T: Clone + Eq + Send + 'static,
{
  /// Suppress consecutive repeats, forwarding a value only when it differs
  /// from the previous one.
  pub fn distinct_until_changed(&self) -> Observable<T> {
    let source = self.clone();
    Observable::new(move |subscriber| {
      let upstream = source.subscribe_with(DistinctUntilChangedObserver {
        downstream: subscriber,
        last: None,
      });
      TeardownLogic::from(upstream)
    })
  }
}

/// Suppress already-seen values (pipe flavor).
pub fn distinct<T>() -> impl FnOnce(Observable<T>) -> Observable<T>
where
  T: Clone + Eq + Hash + Send + 'static,
{
  |source| source.distinct()
}

/// Suppress consecutive repeats (pipe flavor).
pub fn distinct_until_changed<T>() -> impl FnOnce(Observable<T>) -> Observable<T>
where
  T: Clone + Eq + Send + 'static,
{
  |source| source.distinct_until_changed()
}

struct DistinctObserver<T> {
  downstream: Subscriber<T>,
  seen: HashSet<T>,
}

impl<T: Clone + Eq + Hash> Observer for DistinctObserver<T> {
  type Item = T;

  fn next(&mut self, value: T) {
    if self.seen.insert(value.clone()) {
      self.downstream.next(value);
    }
  }

  fn error(&mut self, err: RxError) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }
}

struct DistinctUntilChangedObserver<T> {
  downstream: Subscriber<T>,
  last: Option<T>,
}

impl<T: Clone + Eq> Observer for DistinctUntilChangedObserver<T> {
  type Item = T;

  fn next(&mut self, value: T) {
    if self.last.as_ref() != Some(&value) {
      self.last = Some(value.clone());
      self.downstream.next(value);
    }
  }

  fn error(&mut self, err: RxError) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }
}
