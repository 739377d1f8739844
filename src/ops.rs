//! Operator factories for [`pipe`](crate::observable::Observable::pipe)-style
//! composition.
//!
//! Every operator exists twice: as a fluent method on
//! [`Observable`](crate::observable::Observable) and as a factory here
//! returning an `FnOnce(Observable<T>) -> Observable<U>`, the currency of the
//! [`pipe!`](crate::pipe) macro.

mod combine_latest;
mod distinct;
mod map;
mod merge;
mod with_latest_from;

pub use combine_latest::combine_latest;
pub use distinct::{distinct, distinct_until_changed};
pub use map::map;
pub use merge::merge;
pub use with_latest_from::with_latest_from;
