//! Metric names emitted by the pipeline workers.
//!
//! The names mirror the in-memory counters so a Prometheus scrape and the dashboard agree.

use metrics::{Unit, describe_counter, describe_histogram};

/// Label for the store operation that failed.
pub const OPERATION_LABEL: &str = "operation";

/// Counter of events pushed onto the queue by the generator.
pub const PULSE_EVENTS_GENERATED_TOTAL: &str = "pulse_events_generated_total";

/// Counter of events inserted into the store.
pub const PULSE_EVENTS_WRITTEN_TOTAL: &str = "pulse_events_written_total";

/// Counter of claim queries issued by the batch processor.
pub const PULSE_STORE_READS_TOTAL: &str = "pulse_store_reads_total";

/// Counter of batch updates issued by the batch processor.
pub const PULSE_STORE_UPDATES_TOTAL: &str = "pulse_store_updates_total";

/// Counter of rows transitioned to processed.
pub const PULSE_EVENTS_PROCESSED_TOTAL: &str = "pulse_events_processed_total";

/// Counter of failed store operations, labeled by operation.
pub const PULSE_STORE_ERRORS_TOTAL: &str = "pulse_store_errors_total";

/// Counter of events that could not be encoded.
pub const PULSE_SERIALIZATION_ERRORS_TOTAL: &str = "pulse_serialization_errors_total";

/// Histogram of the time from dequeuing an event to its insert completing.
pub const PULSE_WRITE_DURATION_SECONDS: &str = "pulse_write_duration_seconds";

/// Registers descriptions for every pipeline metric with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(
        PULSE_EVENTS_GENERATED_TOTAL,
        Unit::Count,
        "Events generated and queued"
    );
    describe_counter!(
        PULSE_EVENTS_WRITTEN_TOTAL,
        Unit::Count,
        "Events inserted into the store"
    );
    describe_counter!(
        PULSE_STORE_READS_TOTAL,
        Unit::Count,
        "Claim queries issued against the store"
    );
    describe_counter!(
        PULSE_STORE_UPDATES_TOTAL,
        Unit::Count,
        "Batch updates issued against the store"
    );
    describe_counter!(
        PULSE_EVENTS_PROCESSED_TOTAL,
        Unit::Count,
        "Stored events marked as processed"
    );
    describe_counter!(
        PULSE_STORE_ERRORS_TOTAL,
        Unit::Count,
        "Failed store operations"
    );
    describe_counter!(
        PULSE_SERIALIZATION_ERRORS_TOTAL,
        Unit::Count,
        "Events dropped because they could not be encoded"
    );
    describe_histogram!(
        PULSE_WRITE_DURATION_SECONDS,
        Unit::Seconds,
        "Time from dequeuing an event to its insert completing"
    );
}
