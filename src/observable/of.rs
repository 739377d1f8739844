use crate::{observable::Observable, subscription::TeardownLogic};

impl<T> Observable<T>
where
  T: Clone + Send + Sync + 'static,
{
  /// An observable that emits `value` once and completes, synchronously on
  /// subscribe. Teardown is a no-op.
  pub fn of(value: T) -> Self {
    Observable::new(move |subscriber| {
      subscriber.next(value.clone());
      subscriber.complete();
      TeardownLogic::None
    })
  }
}
