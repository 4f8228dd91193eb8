use fail::fail_point;

use crate::bail;
use crate::error::{ErrorKind, PulseResult};

pub const PERSISTER_BEFORE_INSERT: &str = "persister.before_insert";
pub const PROCESSOR_BEFORE_MARK: &str = "processor.before_mark";

/// Returns an [`ErrorKind::InjectedFailure`] when the named fail point is configured to
/// `return`.
pub fn pulse_fail_point(name: &str) -> PulseResult<()> {
    fail_point!(name, |_| {
        bail!(
            ErrorKind::InjectedFailure,
            "An error occurred in a fail point",
            format!("The failpoint '{name}' returned an error")
        );
    });

    Ok(())
}
