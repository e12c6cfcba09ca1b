use std::fmt;

/// Broad category of a fatal condition. Everything except `Io` on a progress
/// checkpoint ends the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing options, malformed candidate list, duplicate sample ids.
    Config,
    /// A continuation file that does not describe this run.
    Continuation,
    /// Truncated mate file or missing `@`/`+` markers.
    RecordFormat,
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Config => write!(f, "configuration error"),
            ErrorKind::Continuation => write!(f, "continuation error"),
            ErrorKind::RecordFormat => write!(f, "record format error"),
            ErrorKind::Io => write!(f, "I/O error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverlapError {
    pub kind: ErrorKind,
    pub message: String,
}

impl OverlapError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        OverlapError {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn continuation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Continuation, message)
    }

    pub fn record_format(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RecordFormat, message)
    }
}

impl fmt::Display for OverlapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for OverlapError {}

/// Returns the category of the first `OverlapError` found in the chain, if any.
pub fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.downcast_ref::<OverlapError>()
        .or_else(|| {
            err.chain()
                .find_map(|cause| cause.downcast_ref::<OverlapError>())
        })
        .map(|e| e.kind)
}
