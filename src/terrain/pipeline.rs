use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec2;
use tracing::{error, trace};

use crate::terrain::map_generator::{MapData, MapGenerator};
use crate::terrain::mesh_generator::MeshPayload;
use crate::threading::{CompletionQueue, TaskHandle, ThreadPool};

/// Completion callback. Runs on the consumer thread with the consumer's state
/// and the pipeline, so it can chain a follow-up request.
pub type Callback<C, T> = Box<dyn FnOnce(&mut C, &AsyncPipeline<C>, T) + Send>;

/// A finished computation waiting for the consumer.
pub struct PendingResult<C, T> {
    callback: Callback<C, T>,
    payload: T,
    handle: TaskHandle,
}

/// Counts of callbacks run by one [`AsyncPipeline::drain`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub map_data: usize,
    pub mesh_data: usize,
}

/// Runs map and mesh generation on the worker pool and hands results back
/// through one FIFO per result type.
///
/// Workers never touch consumer state; they only push onto a queue. The
/// consumer calls [`drain`](Self::drain) once per tick to run the callbacks.
pub struct AsyncPipeline<C> {
    pool: Arc<ThreadPool>,
    generator: Arc<MapGenerator>,
    map_data_queue: CompletionQueue<PendingResult<C, MapData>>,
    mesh_data_queue: CompletionQueue<PendingResult<C, MeshPayload>>,
    in_flight: Arc<AtomicUsize>,
}

impl<C: 'static> AsyncPipeline<C> {
    pub fn new(pool: Arc<ThreadPool>, generator: Arc<MapGenerator>) -> Self {
        AsyncPipeline {
            pool,
            generator,
            map_data_queue: CompletionQueue::new(),
            mesh_data_queue: CompletionQueue::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn generator(&self) -> &Arc<MapGenerator> {
        &self.generator
    }

    /// Schedules map data generation for the chunk centred at `centre`.
    pub fn request_map_data<F>(&self, centre: Vec2, on_complete: F) -> TaskHandle
    where
        F: FnOnce(&mut C, &AsyncPipeline<C>, MapData) + Send + 'static,
    {
        let generator = Arc::clone(&self.generator);
        self.submit(
            &self.map_data_queue,
            move || generator.generate_map_data(centre),
            on_complete,
        )
    }

    /// Schedules mesh generation for already generated map data.
    pub fn request_mesh_data<F>(&self, map_data: MapData, on_complete: F) -> TaskHandle
    where
        F: FnOnce(&mut C, &AsyncPipeline<C>, MeshPayload) + Send + 'static,
    {
        let generator = Arc::clone(&self.generator);
        self.submit(
            &self.mesh_data_queue,
            move || generator.generate_mesh(&map_data),
            on_complete,
        )
    }

    /// Runs `computation` on the pool and queues `(on_complete, result)` on `queue`.
    ///
    /// A cancelled task is skipped if it has not started yet. A panicking
    /// computation is logged and delivers nothing.
    pub fn submit<T, F, G>(
        &self,
        queue: &CompletionQueue<PendingResult<C, T>>,
        computation: F,
        on_complete: G,
    ) -> TaskHandle
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
        G: FnOnce(&mut C, &AsyncPipeline<C>, T) + Send + 'static,
    {
        let handle = TaskHandle::new();
        let task_handle = handle.clone();
        let queue = queue.clone();
        let in_flight = Arc::clone(&self.in_flight);
        let callback: Callback<C, T> = Box::new(on_complete);

        in_flight.fetch_add(1, Ordering::AcqRel);
        self.pool.execute(move || {
            if task_handle.is_cancelled() {
                trace!("Skipping cancelled terrain task");
            } else {
                match catch_unwind(AssertUnwindSafe(computation)) {
                    Ok(payload) => queue.push(PendingResult {
                        callback,
                        payload,
                        handle: task_handle,
                    }),
                    Err(panic) => {
                        error!("Terrain task panicked, result dropped: {}", panic_message(&*panic));
                    }
                }
            }
            in_flight.fetch_sub(1, Ordering::AcqRel);
        });

        handle
    }

    /// Runs every queued callback, map data first, each queue in enqueue order.
    ///
    /// Results whose task was cancelled after it finished are dropped here.
    pub fn drain(&self, context: &mut C) -> DrainStats {
        let mut stats = DrainStats::default();

        for pending in self.map_data_queue.take_all() {
            if pending.handle.is_cancelled() {
                continue;
            }
            (pending.callback)(context, self, pending.payload);
            stats.map_data += 1;
        }

        for pending in self.mesh_data_queue.take_all() {
            if pending.handle.is_cancelled() {
                continue;
            }
            (pending.callback)(context, self, pending.payload);
            stats.mesh_data += 1;
        }

        if stats != DrainStats::default() {
            trace!("Drained {} map and {} mesh results", stats.map_data, stats.mesh_data);
        }
        stats
    }

    /// Tasks submitted but not yet finished on a worker.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Results finished but not yet drained.
    pub fn pending(&self) -> usize {
        self.map_data_queue.len() + self.mesh_data_queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.in_flight() == 0 && self.pending() == 0
    }

    pub fn map_data_queue(&self) -> &CompletionQueue<PendingResult<C, MapData>> {
        &self.map_data_queue
    }

    pub fn mesh_data_queue(&self) -> &CompletionQueue<PendingResult<C, MeshPayload>> {
        &self.mesh_data_queue
    }
}

impl<C> Clone for AsyncPipeline<C> {
    fn clone(&self) -> Self {
        AsyncPipeline {
            pool: Arc::clone(&self.pool),
            generator: Arc::clone(&self.generator),
            map_data_queue: self.map_data_queue.clone(),
            mesh_data_queue: self.mesh_data_queue.clone(),
            in_flight: Arc::clone(&self.in_flight),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
