use std::time::Duration;

use pulse_config::shared::{DashboardConfig, PipelineConfig};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::info;

use crate::concurrency::shutdown::ShutdownRx;
use crate::counters::SharedCounters;
use crate::dashboard::frame::{DashboardStats, FrameLayout, render_frame};
use crate::dashboard::sink::DisplaySink;
use crate::workers::base::{Worker, WorkerType};

/// Worker rendering a frame of the shared counters on every period.
#[derive(Debug)]
pub struct DashboardWorker<K> {
    sink: K,
    layout: FrameLayout,
    interval: Duration,
    counters: SharedCounters,
    shutdown_rx: ShutdownRx,
}

impl<K> DashboardWorker<K>
where
    K: DisplaySink,
{
    pub fn new(
        sink: K,
        pipeline_config: &PipelineConfig,
        dashboard_config: &DashboardConfig,
        counters: SharedCounters,
        shutdown_rx: ShutdownRx,
    ) -> Self {
        let layout = FrameLayout {
            bar_width: dashboard_config.bar_width,
            bar_scale: dashboard_config.bar_scale,
            generator_interval: pipeline_config.generator_interval(),
            processor_interval: pipeline_config.processor_interval(),
        };

        Self {
            sink,
            layout,
            interval: pipeline_config.dashboard_interval(),
            counters,
            shutdown_rx,
        }
    }

    /// Snapshots the counters and writes one frame to the sink.
    pub fn render(&mut self) {
        let stats = DashboardStats::from_snapshot(self.counters.snapshot());
        let frame = render_frame(&stats, &self.layout);
        self.sink.write_frame(&frame);
    }
}

impl<K> Worker for DashboardWorker<K>
where
    K: DisplaySink + Send + 'static,
{
    const WORKER_TYPE: WorkerType = WorkerType::Dashboard;

    async fn run(mut self) {
        info!(
            worker = %Self::WORKER_TYPE,
            interval_ms = self.interval.as_millis() as u64,
            "starting dashboard"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = self.shutdown_rx.wait_for_shutdown() => break,
                _ = ticker.tick() => self.render(),
            }
        }

        info!(worker = %Self::WORKER_TYPE, "dashboard stopped");
    }
}
