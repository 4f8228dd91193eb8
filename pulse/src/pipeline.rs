//! Driver starting the four workers and joining them on shutdown.

use std::mem;

use pulse_config::shared::{DashboardConfig, PipelineConfig};
use tracing::{error, info};

use crate::bail;
use crate::codec::EventCodec;
use crate::concurrency::queue::create_event_queue;
use crate::concurrency::shutdown::{ShutdownTx, create_shutdown_channel};
use crate::counters::SharedCounters;
use crate::dashboard::sink::DisplaySink;
use crate::error::{ErrorKind, PulseResult};
use crate::store::base::EventStore;
use crate::workers::base::{Worker, WorkerHandle};
use crate::workers::dashboard::DashboardWorker;
use crate::workers::generator::GeneratorWorker;
use crate::workers::persister::PersisterWorker;
use crate::workers::processor::ProcessorWorker;

#[derive(Debug)]
enum PipelineState<C, K> {
    NotStarted { codec: C, sink: K },
    Started { workers: Vec<WorkerHandle> },
}

/// The event pipeline: generator, persister, batch processor and dashboard.
///
/// The pipeline owns the shared counters and the shutdown signal. Workers are spawned by
/// [`Pipeline::start`] and run until shutdown is issued, [`Pipeline::wait`] then joins every one
/// of them.
#[derive(Debug)]
pub struct Pipeline<S, C, K> {
    pipeline_config: PipelineConfig,
    dashboard_config: DashboardConfig,
    store: S,
    counters: SharedCounters,
    shutdown_tx: ShutdownTx,
    state: PipelineState<C, K>,
}

impl<S, C, K> Pipeline<S, C, K>
where
    S: EventStore + Clone + Send + Sync + 'static,
    C: EventCodec + Send + Sync + 'static,
    K: DisplaySink + Send + 'static,
{
    pub fn new(
        pipeline_config: PipelineConfig,
        dashboard_config: DashboardConfig,
        store: S,
        codec: C,
        sink: K,
    ) -> Self {
        // Receivers are obtained through `subscribe`, one per worker.
        let (shutdown_tx, _) = create_shutdown_channel();

        Self {
            pipeline_config,
            dashboard_config,
            store,
            counters: SharedCounters::new(),
            shutdown_tx,
            state: PipelineState::NotStarted { codec, sink },
        }
    }

    pub fn shutdown_tx(&self) -> ShutdownTx {
        self.shutdown_tx.clone()
    }

    /// Returns the counters shared by the workers.
    pub fn counters(&self) -> SharedCounters {
        self.counters.clone()
    }

    /// Spawns the workers on the current runtime.
    ///
    /// The dashboard is only spawned when enabled. Starting an already started pipeline fails
    /// with [`ErrorKind::InvalidState`].
    pub fn start(&mut self) -> PulseResult<()> {
        let started = PipelineState::Started {
            workers: Vec::new(),
        };
        let (codec, sink) = match mem::replace(&mut self.state, started) {
            PipelineState::NotStarted { codec, sink } => (codec, sink),
            state @ PipelineState::Started { .. } => {
                self.state = state;
                bail!(ErrorKind::InvalidState, "Pipeline was already started");
            }
        };

        info!(
            store = S::name(),
            queue_capacity = self.pipeline_config.queue_capacity,
            claim_batch_size = self.pipeline_config.claim_batch_size,
            dashboard = self.dashboard_config.enabled,
            "starting pipeline"
        );

        let (queue_tx, queue_rx) = create_event_queue(self.pipeline_config.queue_capacity);
        let mut workers = Vec::with_capacity(4);

        workers.push(
            GeneratorWorker::new(
                &self.pipeline_config,
                queue_tx,
                self.counters.clone(),
                self.shutdown_tx.subscribe(),
            )
            .start(),
        );
        workers.push(
            PersisterWorker::new(
                self.store.clone(),
                codec,
                queue_rx,
                self.counters.clone(),
                self.shutdown_tx.subscribe(),
            )
            .start(),
        );
        workers.push(
            ProcessorWorker::new(
                self.store.clone(),
                &self.pipeline_config,
                self.counters.clone(),
                self.shutdown_tx.subscribe(),
            )
            .start(),
        );
        if self.dashboard_config.enabled {
            workers.push(
                DashboardWorker::new(
                    sink,
                    &self.pipeline_config,
                    &self.dashboard_config,
                    self.counters.clone(),
                    self.shutdown_tx.subscribe(),
                )
                .start(),
            );
        }

        self.state = PipelineState::Started { workers };

        Ok(())
    }

    /// Waits for every worker to complete.
    ///
    /// Failures of several workers are aggregated into one error. A pipeline that was never
    /// started has nothing to wait for.
    pub async fn wait(self) -> PulseResult<()> {
        let PipelineState::Started { workers } = self.state else {
            info!("pipeline was not started, nothing to wait for");

            return Ok(());
        };

        info!(workers = workers.len(), "waiting for workers to complete");

        let mut errors = vec![];
        for worker in workers {
            let worker_type = worker.worker_type();
            if let Err(err) = worker.wait().await {
                error!(worker = %worker_type, error = %err, "worker completed with an error");
                errors.push(err);
            }
        }

        if !errors.is_empty() {
            return Err(errors.into());
        }

        info!("all workers completed");

        Ok(())
    }

    /// Issues shutdown to every worker.
    ///
    /// Shutdown can only be issued once, a second call fails with [`ErrorKind::InvalidState`].
    pub fn shutdown(&self) -> PulseResult<()> {
        info!("shutting down the pipeline");

        self.shutdown_tx.shutdown()
    }

    /// Issues shutdown and waits for every worker to complete.
    pub async fn shutdown_and_wait(self) -> PulseResult<()> {
        self.shutdown()?;
        self.wait().await
    }
}
