use crate::error::RxError;

/// An Observer is a consumer of the values delivered by an Observable. One
/// callback for each kind of notification: `next`, `error`, and `complete`.
///
/// `Item` is the type of the elements being emitted. Errors arrive as the
/// type-erased [`RxError`] handle so observers compose across operator
/// boundaries without knowing the producer's concrete error type.
pub trait Observer {
  type Item;
  fn next(&mut self, value: Self::Item);
  fn error(&mut self, err: RxError);
  fn complete(&mut self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type ErrorFn = Box<dyn FnMut(RxError) + Send>;
type CompleteFn = Box<dyn FnMut() + Send>;

/// An [`Observer`] assembled from plain closures.
///
/// `error` and `complete` default to no-ops; attach them with
/// [`with_error`](FnObserver::with_error) and
/// [`with_complete`](FnObserver::with_complete).
pub struct FnObserver<T> {
  on_next: NextFn<T>,
  on_error: ErrorFn,
  on_complete: CompleteFn,
}

impl<T> FnObserver<T> {
  pub fn new(next: impl FnMut(T) + Send + 'static) -> Self {
    FnObserver {
      on_next: Box::new(next),
      on_error: Box::new(|_| {}),
      on_complete: Box::new(|| {}),
    }
  }

  pub fn with_error(mut self, error: impl FnMut(RxError) + Send + 'static) -> Self {
    self.on_error = Box::new(error);
    self
  }

  pub fn with_complete(mut self, complete: impl FnMut() + Send + 'static) -> Self {
    self.on_complete = Box::new(complete);
    self
  }
}

impl<T> Observer for FnObserver<T> {
  type Item = T;

  fn next(&mut self, value: T) { (self.on_next)(value) }

  fn error(&mut self, err: RxError) { (self.on_error)(err) }

  fn complete(&mut self) { (self.on_complete)() }
}

/// Generates the closure-flavored subscribe methods on a source type that
/// already provides `subscribe_with`.
macro_rules! subscribe_family {
  ($item: ident) => {
    /// Subscribe with a `next` callback; errors and completion are ignored.
    pub fn subscribe(&self, next: impl FnMut($item) + Send + 'static) -> Subscription {
      self.subscribe_with(FnObserver::new(next))
    }

    /// Subscribe with `next` and `error` callbacks.
    pub fn subscribe_err(
      &self,
      next: impl FnMut($item) + Send + 'static,
      error: impl FnMut(RxError) + Send + 'static,
    ) -> Subscription {
      self.subscribe_with(FnObserver::new(next).with_error(error))
    }

    /// Subscribe with `next` and `complete` callbacks.
    pub fn subscribe_complete(
      &self,
      next: impl FnMut($item) + Send + 'static,
      complete: impl FnMut() + Send + 'static,
    ) -> Subscription {
      self.subscribe_with(FnObserver::new(next).with_complete(complete))
    }

    /// Subscribe with all three callbacks.
    pub fn subscribe_all(
      &self,
      next: impl FnMut($item) + Send + 'static,
      error: impl FnMut(RxError) + Send + 'static,
      complete: impl FnMut() + Send + 'static,
    ) -> Subscription {
      self.subscribe_with(
        FnObserver::new(next)
          .with_error(error)
          .with_complete(complete),
      )
    }
  };
}
pub(crate) use subscribe_family;
