use std::fmt::Write;
use std::time::Duration;

use crate::counters::CountersSnapshot;

/// Character used for the filled part of a bar.
const BAR_FILL: char = '█';

/// Width of the separator line under the title.
const SEPARATOR_WIDTH: usize = 70;

/// Rates and averages derived from one [`CountersSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashboardStats {
    pub snapshot: CountersSnapshot,
    pub events_per_second: f64,
    pub writes_per_second: f64,
    pub reads_per_second: f64,
    pub updates_per_second: f64,
    /// Accumulated processing time divided by the total number of store operations.
    pub average_latency: Duration,
}

impl DashboardStats {
    /// Derives rates and the average latency.
    ///
    /// Every rate is zero while no time has elapsed and the average latency is zero while no
    /// store operation was recorded.
    pub fn from_snapshot(snapshot: CountersSnapshot) -> Self {
        let elapsed_secs = snapshot.elapsed.as_secs_f64();
        let rate = |count: u64| {
            if elapsed_secs <= 0.0 {
                0.0
            } else {
                count as f64 / elapsed_secs
            }
        };

        let total_operations = snapshot.total_operations();
        let average_latency = if total_operations == 0 {
            Duration::ZERO
        } else {
            let nanos = snapshot.processing_time.as_nanos() / u128::from(total_operations);
            Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
        };

        Self {
            snapshot,
            events_per_second: rate(snapshot.events_handled),
            writes_per_second: rate(snapshot.writes),
            reads_per_second: rate(snapshot.reads),
            updates_per_second: rate(snapshot.updates),
            average_latency,
        }
    }
}

/// Static layout parameters of a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameLayout {
    /// Number of cells of a full bar.
    pub bar_width: usize,
    /// Rate at which a bar is full.
    pub bar_scale: f64,
    /// Generator period, shown in the explanation footer.
    pub generator_interval: Duration,
    /// Batch processor period, shown in the explanation footer.
    pub processor_interval: Duration,
}

/// Number of filled cells for `value`: `clamp(value / scale, 0, 1) * width`, rounded down.
pub fn filled_cells(value: f64, scale: f64, width: usize) -> usize {
    if scale.is_nan() || scale <= 0.0 || !value.is_finite() {
        return 0;
    }

    let ratio = (value / scale).clamp(0.0, 1.0);
    (ratio * width as f64) as usize
}

fn write_bar(frame: &mut String, label: &str, value: f64, unit: &str, layout: &FrameLayout) {
    let filled = filled_cells(value, layout.bar_scale, layout.bar_width);
    let bar: String = std::iter::repeat_n(BAR_FILL, filled)
        .chain(std::iter::repeat_n(' ', layout.bar_width - filled))
        .collect();

    let _ = writeln!(frame, "{label:<14} [{bar}] {} {unit}/second", value as u64);
}

/// Renders one dashboard frame. Rendering never fails.
pub fn render_frame(stats: &DashboardStats, layout: &FrameLayout) -> String {
    let snapshot = &stats.snapshot;
    let mut frame = String::new();

    // Writing into a `String` cannot fail.
    let _ = writeln!(frame, "Pulse - Real-time Event Processing");
    let _ = writeln!(frame, "{}", "=".repeat(SEPARATOR_WIDTH));

    let _ = writeln!(frame, "\nSystem Status:");
    let _ = writeln!(
        frame,
        "- Event Generator    : Generating {} events/second",
        stats.events_per_second as u64
    );
    let _ = writeln!(
        frame,
        "- Database Writer    : Writing {} records/second",
        stats.writes_per_second as u64
    );
    let _ = writeln!(
        frame,
        "- Event Processor    : Processing {} batches/second",
        stats.updates_per_second as u64
    );

    let _ = writeln!(frame, "\nReal-time Performance:");
    write_bar(&mut frame, "Writes/sec", stats.writes_per_second, "records", layout);
    write_bar(&mut frame, "Reads/sec", stats.reads_per_second, "queries", layout);
    write_bar(&mut frame, "Updates/sec", stats.updates_per_second, "batches", layout);

    let _ = writeln!(frame, "\nOverall Statistics:");
    let _ = writeln!(frame, "Total Events      : {} events generated", snapshot.events_handled);
    let _ = writeln!(frame, "Database Writes   : {} records written", snapshot.writes);
    let _ = writeln!(frame, "Database Reads    : {} claim queries", snapshot.reads);
    let _ = writeln!(frame, "Batch Updates     : {} batches marked", snapshot.updates);
    let _ = writeln!(
        frame,
        "Average Latency   : {} milliseconds per operation",
        stats.average_latency.as_millis()
    );
    let _ = writeln!(frame, "Uptime            : {:.1} seconds", snapshot.elapsed.as_secs_f64());

    let _ = writeln!(frame, "\nHow It Works:");
    let _ = writeln!(
        frame,
        "1. Generator creates a new event every {} milliseconds",
        layout.generator_interval.as_millis()
    );
    let _ = writeln!(frame, "2. Writer saves each event to the store as it arrives");
    let _ = writeln!(
        frame,
        "3. Processor claims events in batches every {} milliseconds",
        layout.processor_interval.as_millis()
    );

    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(elapsed: Duration) -> CountersSnapshot {
        CountersSnapshot {
            events_handled: 20,
            writes: 18,
            reads: 10,
            updates: 2,
            processing_time: Duration::from_millis(300),
            elapsed,
        }
    }

    fn layout() -> FrameLayout {
        FrameLayout {
            bar_width: 40,
            bar_scale: 50.0,
            generator_interval: Duration::from_millis(100),
            processor_interval: Duration::from_millis(200),
        }
    }

    #[test]
    fn rates_are_zero_when_no_time_elapsed() {
        let stats = DashboardStats::from_snapshot(snapshot(Duration::ZERO));

        assert_eq!(stats.events_per_second, 0.0);
        assert_eq!(stats.writes_per_second, 0.0);
        assert_eq!(stats.reads_per_second, 0.0);
        assert_eq!(stats.updates_per_second, 0.0);
    }

    #[test]
    fn rates_divide_counters_by_elapsed_seconds() {
        let stats = DashboardStats::from_snapshot(snapshot(Duration::from_secs(2)));

        assert_eq!(stats.events_per_second, 10.0);
        assert_eq!(stats.writes_per_second, 9.0);
        assert_eq!(stats.reads_per_second, 5.0);
        assert_eq!(stats.updates_per_second, 1.0);
        assert_eq!(stats.average_latency, Duration::from_millis(10));
    }

    #[test]
    fn average_latency_is_zero_without_operations() {
        let stats = DashboardStats::from_snapshot(CountersSnapshot {
            events_handled: 5,
            writes: 0,
            reads: 0,
            updates: 0,
            processing_time: Duration::ZERO,
            elapsed: Duration::from_secs(1),
        });

        assert_eq!(stats.average_latency, Duration::ZERO);
    }

    #[test]
    fn bars_are_clamped_to_their_width() {
        assert_eq!(filled_cells(0.0, 50.0, 40), 0);
        assert_eq!(filled_cells(25.0, 50.0, 40), 20);
        assert_eq!(filled_cells(500.0, 50.0, 40), 40);
        assert_eq!(filled_cells(-3.0, 50.0, 40), 0);
        assert_eq!(filled_cells(f64::NAN, 50.0, 40), 0);
    }

    #[test]
    fn frame_shows_totals_and_bars() {
        let stats = DashboardStats::from_snapshot(snapshot(Duration::from_secs(2)));
        let frame = render_frame(&stats, &layout());

        assert!(frame.contains("Total Events      : 20 events generated"));
        assert!(frame.contains("Database Writes   : 18 records written"));
        assert!(frame.contains("Average Latency   : 10 milliseconds per operation"));
        assert!(frame.contains("Uptime            : 2.0 seconds"));
        assert!(frame.contains("every 100 milliseconds"));

        // 9 writes per second on a scale of 50 fills 7 of 40 cells.
        let writes_line = frame
            .lines()
            .find(|line| line.starts_with("Writes/sec"))
            .unwrap();
        assert_eq!(writes_line.matches(BAR_FILL).count(), 7);
        assert!(writes_line.ends_with("9 records/second"));
    }
}
