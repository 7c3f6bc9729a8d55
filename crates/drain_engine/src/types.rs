use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::persist::PersistError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Decode,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Decode => write!(f, "undecodable response body"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// Result of a single write request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written(PathBuf),
    /// A regular file was already present and overwriting is off.
    Skipped(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Exists(PathBuf),
    /// The subject has no characters usable in a filename.
    EmptySlug,
    /// An earlier broadcast in the same run already claimed this path.
    DuplicateSlug(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Exists(path) => write!(f, "{} already exists", path.display()),
            SkipReason::EmptySlug => write!(f, "subject yields an empty filename"),
            SkipReason::DuplicateSlug(path) => {
                write!(f, "{} was already written in this run", path.display())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BroadcastOutcome {
    Written { subject: String, path: PathBuf },
    Skipped { subject: String, reason: SkipReason },
    Failed { subject: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    /// One entry per fetched broadcast, in fetch order.
    pub outcomes: Vec<BroadcastOutcome>,
}

impl ExportSummary {
    pub fn written(&self) -> usize {
        self.count(|o| matches!(o, BroadcastOutcome::Written { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, BroadcastOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, BroadcastOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&BroadcastOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(o)).count()
    }
}

/// Run-level failures. The display text of the first and third variants is
/// the fixed message shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Cannot find your _drain.yml configuration file")]
    MissingConfiguration(PathBuf),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[source] ConfigError),
    #[error("API failure!")]
    ApiFailure(#[source] FetchError),
    #[error("output directory unusable: {0}")]
    OutputDir(#[source] PersistError),
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Missing(path) => ExportError::MissingConfiguration(path),
            other => ExportError::InvalidConfiguration(other),
        }
    }
}
