use std::sync::Arc;

use crate::{
  error::RxError, observable::Observable, observer::Observer, subscriber::Subscriber,
  subscription::TeardownLogic,
};

impl<T: 'static> Observable<T> {
  /// Transform every value with `f`, forwarding errors and completion
  /// unchanged. No buffering, no per-subscription state.
  pub fn map<U, F>(&self, f: F) -> Observable<U>
  where
    U: 'static,
    F: Fn(T) -> U + Send + Sync + 'static,
  {
    let source = self.clone();
    let f: Arc<dyn Fn(T) -> U + Send + Sync> = Arc::new(f);
    Observable::new(move |subscriber: Subscriber<U>| {
      let upstream = source.subscribe_with(MapObserver { downstream: subscriber, f: f.clone() });
      TeardownLogic::from(upstream)
    })
  }
}

/// Map this observable's values with `f` (pipe flavor).
pub fn map<T, U, F>(f: F) -> impl FnOnce(Observable<T>) -> Observable<U>
where
  T: 'static,
  U: 'static,
  F: Fn(T) -> U + Send + Sync + 'static,
{
  move |source| source.map(f)
}

struct MapObserver<T, U> {
  downstream: Subscriber<U>,
  f: Arc<dyn Fn(T) -> U + Send + Sync>,
}

impl<T, U> Observer for MapObserver<T, U> {
  type Item = T;

  fn next(&mut self, value: T) { self.downstream.next((self.f)(value)) }

  fn error(&mut self, err: RxError) { self.downstream.error(err) }

  fn complete(&mut self) { self.downstream.complete() }
}
