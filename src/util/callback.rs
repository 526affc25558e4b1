use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::message::Message;
use crate::rtp_::RtpError;

/// Function receiving outgoing messages.
pub type SinkFn = dyn Fn(Message) -> Result<(), RtpError> + Send + Sync;

/// A replaceable callback slot that can be shared between threads.
///
/// Invoking takes the read lock, replacing takes the write lock. Installing a new
/// callback waits for in-flight invocations to finish.
#[derive(Clone, Default)]
pub struct SyncCallback {
    inner: Arc<RwLock<Option<Box<SinkFn>>>>,
}

impl SyncCallback {
    /// An empty slot.
    pub fn new() -> Self {
        SyncCallback::default()
    }

    /// Install `f`, replacing any previous callback.
    pub fn set<F>(&self, f: F)
    where
        F: Fn(Message) -> Result<(), RtpError> + Send + Sync + 'static,
    {
        let mut lock = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *lock = Some(Box::new(f));
    }

    /// Remove the callback.
    pub fn clear(&self) {
        let mut lock = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *lock = None;
    }

    /// Tells if a callback is installed.
    pub fn is_set(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Invoke the callback with `m`.
    ///
    /// Returns `None` if no callback is installed.
    pub fn call(&self, m: Message) -> Option<Result<(), RtpError>> {
        let lock = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        lock.as_ref().map(|f| f(m))
    }
}

impl fmt::Debug for SyncCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncCallback")
            .field("is_set", &self.is_set())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn replace_callback() {
        let cb = SyncCallback::new();
        assert!(cb.call(Message::control(vec![1])).is_none());

        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        let c = first.clone();
        cb.set(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        assert!(matches!(cb.call(Message::control(vec![1])), Some(Ok(()))));

        // Clones share the slot.
        let cb2 = cb.clone();
        let c = second.clone();
        cb2.set(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
            Err(RtpError::TrackClosed)
        });
        assert!(matches!(
            cb.call(Message::control(vec![1])),
            Some(Err(RtpError::TrackClosed))
        ));

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        cb.clear();
        assert!(!cb2.is_set());
    }

    #[test]
    fn replace_from_other_thread() {
        let cb = SyncCallback::new();
        let count = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cb = cb.clone();
                let count = count.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let c = count.clone();
                        cb.set(move |_| {
                            c.fetch_add(1, Ordering::SeqCst);
                            Ok(())
                        });
                        cb.call(Message::control(vec![]));
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(count.load(Ordering::SeqCst), 400);
    }
}
