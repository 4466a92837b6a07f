use rayon::ThreadPoolBuilder;
use tracing::info;

use crate::error::Result;

// A wrapper around Rayon's ThreadPool sized for background terrain work.
// The consumer thread is not counted, so the default leaves one core free for it.
pub struct ThreadPool {
    pool: rayon::ThreadPool,
    num_threads: usize,
}

impl ThreadPool {
    // If size is 0, the pool uses all available CPUs minus one (at least one thread)
    pub fn new(size: usize) -> Result<ThreadPool> {
        let num_threads = if size > 0 {
            size
        } else {
            default_worker_count()
        };

        let pool = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("terrain-worker-{}", i))
            .build()?;

        info!("Created terrain worker pool with {} threads", num_threads);

        Ok(ThreadPool { pool, num_threads })
    }

    // Execute a job in the thread pool. Fire and forget.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.pool.spawn(f);
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }
}

pub fn default_worker_count() -> usize {
    std::cmp::max(1, num_cpus::get().saturating_sub(1))
}
