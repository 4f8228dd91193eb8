//! Macros for building and returning [`crate::error::PulseError`] values.

/// Creates a [`crate::error::PulseError`] from an error kind and a static description.
///
/// Accepts an optional dynamic detail and an optional source error.
#[macro_export]
macro_rules! pulse_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::PulseError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::PulseError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::PulseError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::PulseError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Returns early with a [`crate::error::PulseError`].
///
/// Supports the same arguments as [`pulse_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::pulse_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::pulse_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::pulse_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::pulse_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
