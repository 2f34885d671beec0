//! Runtime abstraction layer for background tile work
//!
//! Tile decoding is blocking file I/O plus image decompression, so jobs are
//! plain closures handed to a [`TaskSpawner`]. The host picks the executor:
//! a thread per job, the tokio blocking pool, or a queue it drains itself.

use crate::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A unit of background work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run jobs off the caller's thread
pub trait TaskSpawner: Send + Sync + 'static {
    /// Start `job`. Must not block the caller until the job finishes.
    ///
    /// An error means the job was dropped without running.
    fn spawn(&self, job: Job) -> Result<()>;
}

/// Runs every job on its own OS thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl TaskSpawner for ThreadSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        std::thread::Builder::new()
            .name("slicemap-tile".to_string())
            .spawn(job)?;
        Ok(())
    }
}

#[cfg(feature = "tokio-runtime")]
pub mod tokio_impl {
    use super::*;

    /// Runs jobs on the blocking pool of a tokio runtime
    #[derive(Debug, Clone)]
    pub struct TokioSpawner {
        handle: ::tokio::runtime::Handle,
    }

    impl TokioSpawner {
        pub fn new(handle: ::tokio::runtime::Handle) -> Self {
            Self { handle }
        }

        /// Spawner bound to the runtime the caller is running in, if any
        pub fn try_current() -> Option<Self> {
            ::tokio::runtime::Handle::try_current().ok().map(Self::new)
        }
    }

    impl TaskSpawner for TokioSpawner {
        fn spawn(&self, job: Job) -> crate::Result<()> {
            // Detached: completion is reported through the tile event channel
            drop(self.handle.spawn_blocking(job));
            Ok(())
        }
    }
}

#[cfg(feature = "tokio-runtime")]
pub use tokio_impl::TokioSpawner;

/// Queues jobs until the host runs them.
///
/// Useful for single-threaded hosts that pump work between frames, and for
/// deterministic tests.
#[derive(Default, Clone)]
pub struct DeferredSpawner {
    queue: Arc<Mutex<VecDeque<Job>>>,
}

impl DeferredSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting to run
    pub fn pending(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Run queued jobs on the calling thread, including jobs they enqueue.
    /// Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the lock before running so jobs may spawn more jobs
            let next = self
                .queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front();
            match next {
                Some(job) => {
                    job();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

impl std::fmt::Debug for DeferredSpawner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredSpawner")
            .field("pending", &self.pending())
            .finish()
    }
}

impl TaskSpawner for DeferredSpawner {
    fn spawn(&self, job: Job) -> Result<()> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(job);
        Ok(())
    }
}

/// Global default spawner
static RUNTIME: OnceLock<Arc<dyn TaskSpawner>> = OnceLock::new();

/// Install the spawner returned by [`runtime`]. Only the first call wins.
pub fn init_runtime(spawner: Arc<dyn TaskSpawner>) {
    if RUNTIME.set(spawner).is_err() {
        log::warn!("tile runtime already initialised, ignoring replacement");
    }
}

/// Get the global runtime spawner.
///
/// Defaults to the tokio blocking pool when called inside a tokio runtime
/// (feature `tokio-runtime`) and to [`ThreadSpawner`] otherwise.
pub fn runtime() -> Arc<dyn TaskSpawner> {
    RUNTIME
        .get_or_init(|| {
            #[cfg(feature = "tokio-runtime")]
            {
                if let Some(spawner) = TokioSpawner::try_current() {
                    log::debug!("using tokio blocking pool for tile jobs");
                    return Arc::new(spawner);
                }
            }
            Arc::new(ThreadSpawner)
        })
        .clone()
}
