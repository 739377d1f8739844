//! `rill` is a lightweight push-based reactive stream library.
//!
//! An [`Observable`](observable::Observable) describes how to start pushing
//! typed values at a [`Subscriber`](subscriber::Subscriber); subscribing
//! returns a [`Subscription`](subscription::Subscription) that releases the
//! producer. [`Subject`](subject::Subject)s (and their behavior/replay
//! variants) multicast one stream to many subscribers, and operators such as
//! `map`, `distinct` and `combine_latest` compose observables into new ones.
//!
//! A stream delivers any number of values followed by at most one terminal
//! signal (an error or completion); after the terminal, or after an
//! unsubscribe, nothing else is delivered. Everything runs synchronously on
//! the caller's thread, but producers may push from any number of threads.
//!
//! A [`Subscription`](subscription::Subscription) is a guard: dropping it
//! releases the pipeline, so keep it alive for as long as emissions should
//! flow.
//!
//! ```
//! use rill::prelude::*;
//! use std::sync::{Arc, Mutex};
//!
//! let doubled = Arc::new(Mutex::new(vec![]));
//! let sink = doubled.clone();
//!
//! let numbers = Subject::new();
//! let subscription = numbers
//!   .as_observable()
//!   .map(|v: i32| v * 2)
//!   .subscribe(move |v| sink.lock().unwrap().push(v));
//!
//! numbers.next(1);
//! numbers.next(2);
//! assert_eq!(*doubled.lock().unwrap(), vec![2, 4]);
//!
//! subscription.unsubscribe();
//! numbers.next(3); // no longer delivered
//! assert_eq!(*doubled.lock().unwrap(), vec![2, 4]);
//! ```

pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod subject;
pub mod subscriber;
pub mod subscription;
mod util;

pub mod prelude {
  pub use crate::{
    error::{message_error, wrap_error, RxError},
    observable::{create, Observable},
    observer::{FnObserver, Observer},
    pipe,
    subject::{BehaviorSubject, ReplaySubject, Subject},
    subscriber::Subscriber,
    subscription::{Subscription, TeardownLogic},
  };
}
