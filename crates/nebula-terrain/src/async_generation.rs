//! Background heightmap generation on a dedicated worker thread.
//!
//! Scripted generators share one script context, so every heightmap call is
//! funnelled through a single worker that owns the generator. Chunk streaming
//! submits regions, may cancel them, and drains finished heightmaps via
//! bounded channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use glam::{IVec2, UVec2};

use crate::generator::GeneratorScript;
use crate::heightmap::Heightmap;

/// A request for the heightmap of one chunk region.
#[derive(Clone, Debug)]
pub struct HeightmapTask {
    /// Key of the region (usually chunk column coordinates).
    pub region: IVec2,
    /// World column of the region's first cell.
    pub offset: IVec2,
    /// Region size in columns.
    pub size: UVec2,
    pub seed: u64,
}

/// A finished heightmap.
#[derive(Debug)]
pub struct GeneratedHeightmap {
    pub region: IVec2,
    pub heightmap: Heightmap,
    /// Time spent in the generator, in microseconds.
    pub generation_time_us: u64,
}

/// A result paired with the cancel flag of the task that produced it.
type Finished = (GeneratedHeightmap, Arc<AtomicBool>);

struct QueuedTask {
    task: HeightmapTask,
    cancelled: Arc<AtomicBool>,
}

/// Serialises heightmap generation through a single worker thread.
pub struct HeightmapWorker {
    task_sender: Sender<QueuedTask>,
    result_receiver: Receiver<Finished>,
    active_tasks: Arc<DashMap<IVec2, Arc<AtomicBool>>>,
    in_flight: Arc<AtomicU64>,
}

impl HeightmapWorker {
    /// Spawns the worker thread.
    ///
    /// - `max_queued`: submissions beyond this many waiting tasks are rejected.
    /// - `result_capacity`: bounded capacity of the result channel.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(
        generator: Arc<dyn GeneratorScript>,
        max_queued: usize,
        result_capacity: usize,
    ) -> std::io::Result<Self> {
        let (task_sender, task_receiver) = bounded::<QueuedTask>(max_queued);
        let (result_sender, result_receiver) = bounded::<Finished>(result_capacity);
        let in_flight = Arc::new(AtomicU64::new(0));
        let worker_in_flight = Arc::clone(&in_flight);

        std::thread::Builder::new()
            .name("heightmap-worker".into())
            .spawn(move || {
                while let Ok(queued) = task_receiver.recv() {
                    if queued.cancelled.load(Ordering::Relaxed) {
                        worker_in_flight.fetch_sub(1, Ordering::Relaxed);
                        continue;
                    }

                    let task = &queued.task;
                    let start = std::time::Instant::now();
                    let heightmap = generator.generate_heightmap(task.offset, task.size, task.seed);
                    let elapsed = start.elapsed().as_micros() as u64;

                    if !queued.cancelled.load(Ordering::Relaxed) {
                        let done = GeneratedHeightmap {
                            region: task.region,
                            heightmap,
                            generation_time_us: elapsed,
                        };
                        let _ = result_sender.send((done, Arc::clone(&queued.cancelled)));
                    }
                    worker_in_flight.fetch_sub(1, Ordering::Relaxed);
                }
                tracing::debug!("heightmap worker shutting down");
            })?;

        Ok(Self {
            task_sender,
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight,
        })
    }

    /// Queues a region.
    ///
    /// Returns the task back if the queue is full or the region is already
    /// pending; cancel the pending task first to replace it.
    #[allow(clippy::result_large_err)]
    pub fn submit(&self, task: HeightmapTask) -> Result<(), HeightmapTask> {
        let cancelled = Arc::new(AtomicBool::new(false));
        match self.active_tasks.entry(task.region) {
            Entry::Occupied(_) => return Err(task),
            Entry::Vacant(slot) => {
                slot.insert(Arc::clone(&cancelled));
            }
        }
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        self.task_sender
            .try_send(QueuedTask {
                task,
                cancelled: Arc::clone(&cancelled),
            })
            .map_err(|e| {
                self.in_flight.fetch_sub(1, Ordering::Relaxed);
                let task = e.into_inner().task;
                self.forget(&task.region, &cancelled);
                task
            })
    }

    /// Drops the pending entry for `region` only if it still belongs to `token`.
    fn forget(&self, region: &IVec2, token: &Arc<AtomicBool>) {
        self.active_tasks.remove_if(region, |_, flag| Arc::ptr_eq(flag, token));
    }

    /// Cancels a pending or running region. No-op once it has completed.
    pub fn cancel(&self, region: &IVec2) {
        if let Some((_, cancelled)) = self.active_tasks.remove(region) {
            cancelled.store(true, Ordering::Relaxed);
        }
    }

    /// Drains every finished heightmap without blocking.
    ///
    /// A region stays pending until its result is drained. Results of tasks
    /// cancelled after they finished are discarded.
    pub fn drain_results(&self) -> Vec<GeneratedHeightmap> {
        let mut results = Vec::new();
        while let Ok((done, token)) = self.result_receiver.try_recv() {
            if token.load(Ordering::Relaxed) {
                continue;
            }
            self.forget(&done.region, &token);
            results.push(done);
        }
        results
    }

    /// Tasks queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub fn is_pending(&self, region: &IVec2) -> bool {
        self.active_tasks.contains_key(region)
    }
}
