//! Acquisition strategies for per-worker local builders.
//!
//! The thread-local provider hands every thread its own builder with an O(1),
//! contention-free acquire; the pooled provider bounds live builders to the
//! pool size and blocks (with a timeout) when all slots are claimed.

use crate::core::loading::error::{ImportError, LoadResult, ResourceError};
use parking_lot::{Condvar, Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Duration;

/// Default pooled-acquire timeout.
pub const DEFAULT_POOL_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// A worker-local builder that buffers inserts and can drain them on demand.
pub trait LocalBuilder: Send {
    /// Drains any pending batch into the shared importer.
    fn flush_local(&mut self) -> LoadResult<()>;
}

enum ProviderInner<T: LocalBuilder> {
    ThreadLocal {
        factory: Box<dyn Fn() -> T + Send + Sync>,
        slots: RwLock<HashMap<ThreadId, Arc<Mutex<T>>>>,
    },
    Pooled {
        slots: Vec<Arc<Mutex<T>>>,
        idle: Mutex<Vec<usize>>,
        available: Condvar,
        timeout: Duration,
    },
}

/// Governs how workers acquire their local builder.
pub struct LocalBuilderProvider<T: LocalBuilder> {
    inner: ProviderInner<T>,
    closed: AtomicBool,
}

impl<T: LocalBuilder> LocalBuilderProvider<T> {
    /// One builder per worker thread; `release` is a no-op.
    pub fn thread_local(factory: impl Fn() -> T + Send + Sync + 'static) -> Self {
        Self {
            inner: ProviderInner::ThreadLocal {
                factory: Box::new(factory),
                slots: RwLock::new(HashMap::new()),
            },
            closed: AtomicBool::new(false),
        }
    }

    /// Fixed pool of `size` builders claimed under a semaphore-like idle list.
    pub fn pooled(size: usize, timeout: Duration, factory: impl Fn() -> T) -> Self {
        let size = size.max(1);
        let slots: Vec<Arc<Mutex<T>>> =
            (0..size).map(|_| Arc::new(Mutex::new(factory()))).collect();
        Self {
            inner: ProviderInner::Pooled {
                slots,
                idle: Mutex::new((0..size).rev().collect()),
                available: Condvar::new(),
                timeout,
            },
            closed: AtomicBool::new(false),
        }
    }

    /// Claims a builder; the returned handle releases it on drop.
    pub fn acquire(&self) -> LoadResult<BuilderHandle<'_, T>> {
        match &self.inner {
            ProviderInner::ThreadLocal { factory, slots } => {
                let thread_id = std::thread::current().id();
                if let Some(slot) = slots.read().get(&thread_id) {
                    return Ok(BuilderHandle {
                        slot: Arc::clone(slot),
                        pool: None,
                    });
                }
                let mut slots = slots.write();
                let slot = slots
                    .entry(thread_id)
                    .or_insert_with(|| Arc::new(Mutex::new(factory())));
                Ok(BuilderHandle {
                    slot: Arc::clone(slot),
                    pool: None,
                })
            }
            ProviderInner::Pooled {
                slots,
                idle,
                available,
                timeout,
            } => {
                let mut idle_guard = idle.lock();
                let index = loop {
                    if let Some(index) = idle_guard.pop() {
                        break index;
                    }
                    if available.wait_for(&mut idle_guard, *timeout).timed_out() {
                        return Err(ImportError::Resource(ResourceError::PoolAcquireTimeout {
                            timeout: *timeout,
                        }));
                    }
                };
                Ok(BuilderHandle {
                    slot: Arc::clone(&slots[index]),
                    pool: Some(PoolRelease {
                        idle,
                        available,
                        index,
                    }),
                })
            }
        }
    }

    /// Drains every outstanding builder exactly once.
    ///
    /// All builders are flushed even when one of them fails; the first error
    /// is returned.
    pub fn close(&self) -> LoadResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        let mut first_error: Option<ImportError> = None;
        let mut flush = |slot: &Arc<Mutex<T>>| {
            if let Err(error) = slot.lock().flush_local() {
                first_error.get_or_insert(error);
            }
        };
        match &self.inner {
            ProviderInner::ThreadLocal { slots, .. } => {
                for slot in slots.read().values() {
                    flush(slot);
                }
            }
            ProviderInner::Pooled { slots, .. } => {
                for slot in slots {
                    flush(slot);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

struct PoolRelease<'p> {
    idle: &'p Mutex<Vec<usize>>,
    available: &'p Condvar,
    index: usize,
}

/// Guaranteed-release scope around a claimed builder.
pub struct BuilderHandle<'p, T: LocalBuilder> {
    slot: Arc<Mutex<T>>,
    pool: Option<PoolRelease<'p>>,
}

impl<T: LocalBuilder> BuilderHandle<'_, T> {
    pub fn with<R>(&self, body: impl FnOnce(&mut T) -> R) -> R {
        let mut builder = self.slot.lock();
        body(&mut builder)
    }
}

impl<T: LocalBuilder> Drop for BuilderHandle<'_, T> {
    fn drop(&mut self) {
        if let Some(release) = self.pool.take() {
            release.idle.lock().push(release.index);
            release.available.notify_one();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingBuilder {
        adds: usize,
        flushes: Arc<Mutex<usize>>,
    }

    impl LocalBuilder for CountingBuilder {
        fn flush_local(&mut self) -> LoadResult<()> {
            *self.flushes.lock() += 1;
            Ok(())
        }
    }

    fn counting_provider(
        pooled: bool,
        flushes: Arc<Mutex<usize>>,
    ) -> LocalBuilderProvider<CountingBuilder> {
        let factory = move || CountingBuilder {
            adds: 0,
            flushes: Arc::clone(&flushes),
        };
        if pooled {
            LocalBuilderProvider::pooled(2, Duration::from_millis(100), factory)
        } else {
            LocalBuilderProvider::thread_local(factory)
        }
    }

    #[test]
    fn thread_local_reuses_per_thread_slot() {
        let flushes = Arc::new(Mutex::new(0));
        let provider = counting_provider(false, Arc::clone(&flushes));

        provider.acquire().unwrap().with(|b| b.adds += 1);
        provider.acquire().unwrap().with(|b| b.adds += 1);
        provider.acquire().unwrap().with(|b| assert_eq!(b.adds, 2));

        provider.close().unwrap();
        assert_eq!(*flushes.lock(), 1);
    }

    #[test]
    fn pooled_times_out_when_exhausted() {
        let flushes = Arc::new(Mutex::new(0));
        let provider = counting_provider(true, flushes);

        let first = provider.acquire().unwrap();
        let second = provider.acquire().unwrap();
        let third = provider.acquire();
        assert!(matches!(
            third,
            Err(ImportError::Resource(ResourceError::PoolAcquireTimeout { .. }))
        ));
        drop(first);
        drop(second);
        assert!(provider.acquire().is_ok());
    }

    #[test]
    fn pooled_close_flushes_every_slot_once() {
        let flushes = Arc::new(Mutex::new(0));
        let provider = counting_provider(true, Arc::clone(&flushes));

        provider.close().unwrap();
        provider.close().unwrap();
        assert_eq!(*flushes.lock(), 2);
    }

    #[test]
    fn release_wakes_a_waiting_worker() {
        let flushes = Arc::new(Mutex::new(0));
        let provider = Arc::new(LocalBuilderProvider::pooled(
            1,
            Duration::from_secs(5),
            {
                let flushes = Arc::clone(&flushes);
                move || CountingBuilder {
                    adds: 0,
                    flushes: Arc::clone(&flushes),
                }
            },
        ));

        let handle = provider.acquire().unwrap();
        std::thread::scope(|s| {
            let provider = Arc::clone(&provider);
            let waiter = s.spawn(move || provider.acquire().map(|h| h.with(|b| b.adds)).is_ok());
            std::thread::sleep(Duration::from_millis(50));
            drop(handle);
            assert!(waiter.join().unwrap());
        });
    }
}
