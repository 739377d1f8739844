use std::{error::Error, fmt, sync::Arc};

/// Type-erased error handle carried through the emission protocol.
///
/// Operators forward errors without knowing their concrete type, and a
/// subject hands the same error to every subscriber (and remembers it for
/// late ones), so the handle is a shared, clonable trait object.
pub type RxError = Arc<dyn Error + Send + Sync>;

/// Erase a concrete error into an [`RxError`].
pub fn wrap_error<E>(err: E) -> RxError
where
  E: Error + Send + Sync + 'static,
{
  Arc::new(err)
}

/// Build an [`RxError`] from a plain message.
pub fn message_error(msg: impl Into<String>) -> RxError {
  Arc::new(MessageError(msg.into()))
}

#[derive(Debug)]
struct MessageError(String);

impl fmt::Display for MessageError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { self.0.fmt(f) }
}

impl Error for MessageError {}
