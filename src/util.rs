use std::sync::{
  Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError,
};

// A panicking user callback must not wedge the pipeline for everyone else, so
// poisoned guards are recovered instead of propagated.

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
  lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
  lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// `None` when the lock is contended; pruning callers skip and retry on the
/// next emission.
pub(crate) fn try_write_lock<T>(lock: &RwLock<T>) -> Option<RwLockWriteGuard<'_, T>> {
  match lock.try_write() {
    Ok(guard) => Some(guard),
    Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
    Err(TryLockError::WouldBlock) => None,
  }
}
