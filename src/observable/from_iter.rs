use crate::{observable::Observable, subscription::TeardownLogic};

impl<T: 'static> Observable<T> {
  /// An observable that emits every element of `iter`, then completes, all
  /// synchronously on subscribe. Iteration stops as soon as the subscriber
  /// goes inactive. Teardown is a no-op.
  pub fn from_iter<I>(iter: I) -> Self
  where
    I: IntoIterator<Item = T> + Clone + Send + Sync + 'static,
  {
    Observable::new(move |subscriber| {
      iter
        .clone()
        .into_iter()
        .take_while(|_| !subscriber.is_stopped())
        .for_each(|v| subscriber.next(v));
      subscriber.complete();
      TeardownLogic::None
    })
  }
}
