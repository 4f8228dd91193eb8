use std::fmt;
use std::future::Future;

use tokio::task::JoinHandle;
use tracing::error;

use crate::error::{ErrorKind, PulseResult};
use crate::pulse_error;

/// Classification of pipeline workers, used in logs and error details.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WorkerType {
    /// Worker that produces synthetic events onto the queue.
    Generator,
    /// Worker that drains the queue into the store.
    Persister,
    /// Worker that claims stored events and marks them processed.
    Processor,
    /// Worker that renders the counters.
    Dashboard,
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerType::Generator => f.write_str("generator"),
            WorkerType::Persister => f.write_str("persister"),
            WorkerType::Processor => f.write_str("processor"),
            WorkerType::Dashboard => f.write_str("dashboard"),
        }
    }
}

/// Trait for the background workers of the pipeline.
///
/// A worker owns everything it needs, including its shutdown receiver, and runs until shutdown
/// is observed. Failures inside the loop are handled locally, so `run` has no error output.
pub trait Worker: Sized + Send + 'static {
    /// Type reported by the handle of this worker.
    const WORKER_TYPE: WorkerType;

    /// Runs the worker loop to completion.
    fn run(self) -> impl Future<Output = ()> + Send + 'static;

    /// Spawns the worker on the current runtime and returns a handle to it.
    fn start(self) -> WorkerHandle {
        let handle = tokio::spawn(self.run());
        WorkerHandle {
            worker_type: Self::WORKER_TYPE,
            handle,
        }
    }
}

/// Handle to a spawned worker.
#[derive(Debug)]
pub struct WorkerHandle {
    worker_type: WorkerType,
    handle: JoinHandle<()>,
}

impl WorkerHandle {
    pub fn worker_type(&self) -> WorkerType {
        self.worker_type
    }

    /// Returns whether the worker task has completed.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker to complete.
    ///
    /// A worker that panicked or was cancelled is reported as [`ErrorKind::WorkerPanic`].
    pub async fn wait(self) -> PulseResult<()> {
        let worker_type = self.worker_type;

        if let Err(err) = self.handle.await {
            error!(worker = %worker_type, error = %err, "worker task failed");

            return Err(pulse_error!(
                ErrorKind::WorkerPanic,
                "Worker task failed",
                format!("The {worker_type} worker did not complete: {err}"),
                source: err
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PanickingWorker;

    impl Worker for PanickingWorker {
        const WORKER_TYPE: WorkerType = WorkerType::Processor;

        async fn run(self) {
            panic!("processor exploded");
        }
    }

    struct IdleWorker;

    impl Worker for IdleWorker {
        const WORKER_TYPE: WorkerType = WorkerType::Dashboard;

        async fn run(self) {}
    }

    #[tokio::test]
    async fn panicking_worker_is_reported_as_worker_panic() {
        let handle = PanickingWorker.start();
        assert_eq!(handle.worker_type(), WorkerType::Processor);

        let err = handle.wait().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WorkerPanic);
        assert!(err.detail().unwrap().contains("processor"));
    }

    #[tokio::test]
    async fn completed_worker_waits_successfully() {
        let handle = IdleWorker.start();
        handle.wait().await.unwrap();
    }
}
