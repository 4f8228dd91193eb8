//! Error types and result definitions for pipeline operations.
//!
//! [`PulseError`] carries an [`ErrorKind`] classification, a static description, optional
//! dynamic detail, an optional source error and the call-site location. Several errors can be
//! aggregated into one, which is how the pipeline reports failures of more than one worker.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Result type for pipeline operations.
pub type PulseResult<T> = Result<T, PulseError>;

/// Payload of a single [`PulseError`].
#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Main error type of the pipeline.
#[derive(Debug, Clone)]
pub struct PulseError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    Single(ErrorPayload),
    /// Aggregated errors, mainly failures of several workers.
    Many {
        errors: Vec<PulseError>,
        location: &'static Location<'static>,
    },
}

/// Categories of errors that can occur in the pipeline.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Encoding errors
    SerializationError,
    DeserializationError,

    // Store errors
    StoreConnectionFailed,
    StoreQueryFailed,
    StoreIoError,

    // Configuration errors
    ConfigError,

    // Lifecycle errors
    InvalidState,
    WorkerPanic,

    // Errors injected through fail points.
    #[cfg(feature = "failpoints")]
    InjectedFailure,

    Unknown,
}

impl PulseError {
    /// Returns the [`ErrorKind`] of this error.
    ///
    /// For aggregated errors, returns the kind of the first error or [`ErrorKind::Unknown`]
    /// when empty.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.kind,
            ErrorRepr::Many { ref errors, .. } => errors
                .first()
                .map(|err| err.kind())
                .unwrap_or(ErrorKind::Unknown),
        }
    }

    /// Returns every [`ErrorKind`] contained in this error, flattened.
    pub fn kinds(&self) -> Vec<ErrorKind> {
        match self.repr {
            ErrorRepr::Single(ref payload) => vec![payload.kind],
            ErrorRepr::Many { ref errors, .. } => {
                errors.iter().flat_map(|err| err.kinds()).collect()
            }
        }
    }

    /// Returns the dynamic detail, or the first one found among aggregated errors.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.detail.as_deref(),
            ErrorRepr::Many { ref errors, .. } => errors.iter().find_map(|e| e.detail()),
        }
    }

    /// Returns the location at which this error was created.
    pub fn location(&self) -> &'static Location<'static> {
        match self.repr {
            ErrorRepr::Single(ref payload) => payload.location,
            ErrorRepr::Many { location, .. } => location,
        }
    }

    /// Attaches an originating error. Has no effect on aggregated errors.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        if let ErrorRepr::Single(ref mut payload) = self.repr {
            payload.source = Some(Arc::new(source));
        }
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        PulseError {
            repr: ErrorRepr::Single(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
            }),
        }
    }
}

impl PartialEq for PulseError {
    fn eq(&self, other: &PulseError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::Single(a), ErrorRepr::Single(b)) => a.kind == b.kind,
            (ErrorRepr::Many { errors: a, .. }, ErrorRepr::Many { errors: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PulseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            ErrorRepr::Single(payload) => {
                let location = payload.location;
                write!(
                    f,
                    "[{:?}] {} @ {}:{}",
                    payload.kind,
                    payload.description,
                    location.file(),
                    location.line()
                )?;

                if let Some(detail) = payload.detail.as_deref() {
                    for line in detail.lines() {
                        write!(f, "\n  {line}")?;
                    }
                }

                Ok(())
            }
            ErrorRepr::Many { errors, location } => {
                let count = errors.len();
                write!(
                    f,
                    "[Many] {} error{} aggregated @ {}:{}",
                    count,
                    if count == 1 { "" } else { "s" },
                    location.file(),
                    location.line()
                )?;

                for (index, error) in errors.iter().enumerate() {
                    let rendered = error.to_string();
                    let mut lines = rendered.lines();
                    if let Some(first_line) = lines.next() {
                        write!(f, "\n  {}. {}", index + 1, first_line)?;
                    }
                    for line in lines {
                        write!(f, "\n     {line}")?;
                    }
                }

                Ok(())
            }
        }
    }
}

impl error::Error for PulseError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.repr {
            ErrorRepr::Single(payload) => payload
                .source
                .as_ref()
                .map(|source| source.as_ref() as &(dyn error::Error + 'static)),
            ErrorRepr::Many { errors, .. } => errors
                .first()
                .map(|error| error as &(dyn error::Error + 'static)),
        }
    }
}

impl From<(ErrorKind, &'static str)> for PulseError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> PulseError {
        PulseError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl From<(ErrorKind, &'static str, String)> for PulseError {
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> PulseError {
        PulseError::from_components(kind, Cow::Borrowed(desc), Some(Cow::Owned(detail)), None)
    }
}

/// Aggregates several errors into one.
impl<E> From<Vec<E>> for PulseError
where
    E: Into<PulseError>,
{
    #[track_caller]
    fn from(errors: Vec<E>) -> PulseError {
        PulseError {
            repr: ErrorRepr::Many {
                errors: errors.into_iter().map(Into::into).collect(),
                location: Location::caller(),
            },
        }
    }
}

/// Maps [`serde_json::Error`] to a serialization or deserialization error.
///
/// Syntax, data and EOF failures can only come from decoding, the remaining categories from
/// encoding.
impl From<serde_json::Error> for PulseError {
    #[track_caller]
    fn from(err: serde_json::Error) -> PulseError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => {
                (ErrorKind::SerializationError, "JSON encoding failed")
            }
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => {
                (ErrorKind::DeserializationError, "JSON decoding failed")
            }
        };

        let detail = err.to_string();
        PulseError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

/// Maps [`sqlx::Error`] to a store error.
impl From<sqlx::Error> for PulseError {
    #[track_caller]
    fn from(err: sqlx::Error) -> PulseError {
        let kind = match &err {
            sqlx::Error::Io(_) => ErrorKind::StoreIoError,
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::Tls(_) => {
                ErrorKind::StoreConnectionFailed
            }
            _ => ErrorKind::StoreQueryFailed,
        };

        let detail = err.to_string();
        PulseError::from_components(
            kind,
            Cow::Borrowed("Store operation failed"),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}
