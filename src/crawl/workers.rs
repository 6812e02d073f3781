//! Parallel workers over contiguous target chunks
//!
//! Targets are split with [`chunk_contiguous`]; each chunk runs in its own
//! tokio task, one target after another. Results come back in target
//! order, whatever order the tasks finish in.

use crate::error::{Error, Result};
use crate::partition::{chunk_contiguous, Target};
use futures::future::join_all;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Outcome of one target
#[derive(Debug)]
pub struct TargetRun<O> {
    /// The target
    pub target: Target,
    /// What the work returned
    pub result: Result<O>,
}

/// Run `work` over `targets` with up to `workers` parallel tasks.
///
/// A failing target is kept in the results and the chunk moves on. A
/// data-loss error (see [`Error::is_data_loss`]) raises `cancelled`, stops
/// every chunk before its next target, and is returned once all tasks are
/// done. Targets never started because of cancellation are left out.
pub async fn run_partitioned<O, F, Fut>(
    targets: Vec<Target>,
    workers: usize,
    cancelled: Arc<AtomicBool>,
    work: F,
) -> Result<Vec<TargetRun<O>>>
where
    O: Send + 'static,
    F: Fn(Target) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<O>> + Send + 'static,
{
    let chunks = chunk_contiguous(&targets, workers);
    debug!(
        "{} targets over {} workers: {:?}",
        targets.len(),
        chunks.len(),
        chunks.iter().map(Vec::len).collect::<Vec<_>>()
    );

    let handles: Vec<_> = chunks
        .into_iter()
        .enumerate()
        .map(|(worker, chunk)| {
            let work = work.clone();
            let cancelled = Arc::clone(&cancelled);
            tokio::spawn(async move {
                let mut runs = Vec::with_capacity(chunk.len());
                for target in chunk {
                    if cancelled.load(Ordering::Relaxed) {
                        debug!("Worker {worker}: cancelled before {}", target.id);
                        break;
                    }
                    match work(target.clone()).await {
                        Err(e) if e.is_data_loss() => {
                            error!("Worker {worker}: {} lost data: {e}", target.id);
                            cancelled.store(true, Ordering::Relaxed);
                            return Err(e);
                        }
                        result => {
                            if let Err(e) = &result {
                                warn!("Worker {worker}: {} failed: {e}", target.id);
                            }
                            runs.push(TargetRun { target, result });
                        }
                    }
                }
                Ok(runs)
            })
        })
        .collect();

    let mut runs = Vec::with_capacity(targets.len());
    let mut first_error = None;
    for joined in join_all(handles).await {
        match joined {
            Ok(Ok(chunk_runs)) => runs.extend(chunk_runs),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(Error::Other(format!("worker task failed: {e}")));
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(runs),
    }
}
