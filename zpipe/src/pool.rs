//! Worker pool: one OS thread, one `compio` runtime and one PULL socket per
//! worker.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info};
use zpipe_core::error::{Result, ZpipeError};

use crate::config::{PoolConfig, WorkerConfig};
use crate::dump::FrameDump;
use crate::worker::Worker;

struct WorkerHandle {
    id: usize,
    received: Arc<AtomicU64>,
    thread: thread::JoinHandle<io::Result<()>>,
}

/// Running worker threads and a read-only view of their counters.
pub struct WorkerPool {
    workers: Vec<WorkerHandle>,
}

impl WorkerPool {
    /// Start `config.workers` workers, ids `0..workers`.
    pub fn spawn(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        if let Some(dir) = &config.worker.dump_dir {
            FrameDump::prepare(dir)?;
            info!("dumping received frames to {}", dir.display());
        }

        let mut workers = Vec::with_capacity(config.workers);
        for id in 0..config.workers {
            let received = Arc::new(AtomicU64::new(0));
            let mirror = Arc::clone(&received);
            let worker_config = config.worker.clone();

            let thread = thread::Builder::new()
                .name(format!("zpipe-worker-{id}"))
                .spawn(move || run_worker(id, worker_config, mirror))?;

            workers.push(WorkerHandle {
                id,
                received,
                thread,
            });
        }

        info!("started {} workers", workers.len());
        Ok(Self { workers })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Current count of each worker, indexed by worker id.
    pub fn totals(&self) -> Vec<u64> {
        self.workers
            .iter()
            .map(|w| w.received.load(Ordering::Relaxed))
            .collect()
    }

    /// Sum of all worker counts.
    pub fn total(&self) -> u64 {
        self.totals().iter().sum()
    }

    /// Block until every worker thread exits. Workers poll forever, so this
    /// only returns if a worker fails to start or panics.
    ///
    /// # Errors
    ///
    /// The first error a worker returned, otherwise an error naming the
    /// workers that panicked.
    pub fn join(self) -> Result<()> {
        let mut first_error = None;
        let mut panicked = Vec::new();
        for worker in self.workers {
            match worker.thread.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    error!(worker = worker.id, error = %e, "worker failed");
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    error!("worker {} panicked", worker.id);
                    panicked.push(worker.id);
                }
            }
        }

        if let Some(e) = first_error {
            return Err(ZpipeError::Io(e));
        }
        if panicked.is_empty() {
            Ok(())
        } else {
            Err(ZpipeError::Io(io::Error::other(format!(
                "workers {panicked:?} panicked"
            ))))
        }
    }
}

fn run_worker(id: usize, config: WorkerConfig, mirror: Arc<AtomicU64>) -> io::Result<()> {
    run_on_runtime(compio::runtime::Runtime::new, id, config, mirror)
}

/// Build a runtime with `new_runtime` and poll on it forever.
fn run_on_runtime<F>(
    new_runtime: F,
    id: usize,
    config: WorkerConfig,
    mirror: Arc<AtomicU64>,
) -> io::Result<()>
where
    F: FnOnce() -> io::Result<compio::runtime::Runtime>,
{
    let runtime = new_runtime()?;
    runtime.block_on(async move {
        info!("worker {} polling from {}", id, config.endpoint);
        let mut worker = Worker::connect(id, config).with_mirror(mirror);
        worker.run().await;
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failing_runtime() -> io::Result<compio::runtime::Runtime> {
        Err(io::Error::new(io::ErrorKind::OutOfMemory, "no io_uring"))
    }

    fn pool_of(results: Vec<io::Result<()>>) -> WorkerPool {
        let workers = results
            .into_iter()
            .enumerate()
            .map(|(id, result)| WorkerHandle {
                id,
                received: Arc::new(AtomicU64::new(0)),
                thread: thread::spawn(move || result),
            })
            .collect();
        WorkerPool { workers }
    }

    #[test]
    fn test_runtime_failure_is_returned() {
        let err = run_on_runtime(
            failing_runtime,
            0,
            WorkerConfig::default(),
            Arc::new(AtomicU64::new(0)),
        )
        .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::OutOfMemory);
    }

    #[test]
    fn test_join_propagates_first_worker_error() {
        let pool = pool_of(vec![
            Ok(()),
            Err(io::Error::new(io::ErrorKind::OutOfMemory, "worker 1")),
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "worker 2")),
        ]);
        match pool.join() {
            Err(ZpipeError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::OutOfMemory),
            other => panic!("expected the first worker error, got {other:?}"),
        }
    }

    #[test]
    fn test_join_reports_panics() {
        let mut pool = pool_of(vec![Ok(())]);
        pool.workers.push(WorkerHandle {
            id: 1,
            received: Arc::new(AtomicU64::new(0)),
            thread: thread::spawn(|| panic!("boom")),
        });
        let err = pool.join().unwrap_err();
        assert!(err.to_string().contains("[1]"), "{err}");
    }

    #[test]
    fn test_join_ok_when_all_workers_return() {
        assert!(pool_of(vec![Ok(()), Ok(())]).join().is_ok());
    }
}
