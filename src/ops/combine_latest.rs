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
  A: Clone + Send + 'static,
{
  /// Combine the latest values of this observable and `other` with
  /// `binary_op`, emitting whenever either input emits once both have
  /// emitted at least once.
  ///
  /// Neither input is privileged: completion waits for both, the first
  /// error wins and cancels the other leg.
  pub fn combine_latest<B, U, F>(&self, other: &Observable<B>, binary_op: F) -> Observable<U>
  where
    B: Clone + Send + 'static,
    U: 'static,
    F: Fn(A, B) -> U + Send + Sync + 'static,
  {
    let source_a = self.clone();
    let source_b = other.clone();
    let binary_op: Arc<dyn Fn(A, B) -> U + Send + Sync> = Arc::new(binary_op);
    Observable::new(move |subscriber: Subscriber<U>| {
      let downstream = Arc::new(subscriber);
      let state = Arc::new(Mutex::new(CombineLatestState {
        last_a: None,
        last_b: None,
        completed_a: false,
        completed_b: false,
      }));
      let legs = Subscription::empty();

      // the companion leg first, so a synchronous `other` has its latest
      // value in place before the source starts emitting
      legs.add(source_b.subscribe_with(BObserver {
        downstream: downstream.clone(),
        state: state.clone(),
        binary_op: binary_op.clone(),
        legs: legs.clone(),
      }));
      legs.add(source_a.subscribe_with(AObserver {
        downstream,
        state,
        binary_op: binary_op.clone(),
        legs: legs.clone(),
      }));
      TeardownLogic::from(legs)
    })
  }
}

/// Combine the source with `other` through `binary_op` (pipe flavor).
pub fn combine_latest<A, B, U, F>(
  other: Observable<B>,
  binary_op: F,
) -> impl FnOnce(Observable<A>) -> Observable<U>
where
  A: Clone + Send + 'static,
  B: Clone + Send + 'static,
  U: 'static,
  F: Fn(A, B) -> U + Send + Sync + 'static,
{
  move |source| source.combine_latest(&other, binary_op)
}

/// Latest value and completion flag per input, shared by both legs.
struct CombineLatestState<A, B> {
  last_a: Option<A>,
  last_b: Option<B>,
  completed_a: bool,
  completed_b: bool,
}

struct AObserver<A, B, U> {
  downstream: Arc<Subscriber<U>>,
  state: Arc<Mutex<CombineLatestState<A, B>>>,
  binary_op: Arc<dyn Fn(A, B) -> U + Send + Sync>,
  legs: Subscription,
}

impl<A: Clone, B: Clone, U> Observer for AObserver<A, B, U> {
  type Item = A;

  fn next(&mut self, value: A) {
    // combine under the lock, emit after releasing it: the slot update is
    // visible before downstream runs, and a callback touching the other
    // input's slot cannot contend with us
    let combined = {
      let mut state = lock(&self.state);
      state.last_a = Some(value.clone());
      state.last_b.clone().map(|b| (self.binary_op)(value, b))
    };
    if let Some(out) = combined {
      self.downstream.next(out);
    }
  }

  fn error(&mut self, err: RxError) {
    self.legs.unsubscribe();
    self.downstream.error(err);
  }

  fn complete(&mut self) {
    let all_done = {
      let mut state = lock(&self.state);
      state.completed_a = true;
      state.completed_b
    };
    if all_done {
      self.downstream.complete();
    }
  }
}

struct BObserver<A, B, U> {
  downstream: Arc<Subscriber<U>>,
  state: Arc<Mutex<CombineLatestState<A, B>>>,
  binary_op: Arc<dyn Fn(A, B) -> U + Send + Sync>,
  legs: Subscription,
}

impl<A: Clone, B: Clone, U> Observer for BObserver<A, B, U> {
  type Item = B;

  fn next(&mut self, value: B) {
    let combined = {
      let mut state = lock(&self.state);
      state.last_b = Some(value.clone());
      state.last_a.clone().map(|a| (self.binary_op)(a, value))
    };
    if let Some(out) = combined {
      self.downstream.next(out);
    }
  }

  fn error(&mut self, err: RxError) {
    self.legs.unsubscribe();
    self.downstream.error(err);
  }

  fn complete(&mut self) {
    let all_done = {
      let mut state = lock(&self.state);
      state.completed_b = true;
      state.completed_a
    };
    if all_done {
      self.downstream.complete();
    }
  }
}
