use thiserror::Error;

/// One connection that failed to shut down during `close_all`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseFailure {
    pub database: String,
    pub message: String,
}

impl std::fmt::Display for CloseFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.database, self.message)
    }
}

// Clone is required: every waiter on a shared connect attempt receives the same outcome.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Connect error for database {database}: {message}")]
    Connect { database: String, message: String },

    #[error("Query error: {0}")]
    Query(String),

    #[error("Close error: {} of {attempted} connections failed to close ({})", .failures.len(), join_failures(.failures))]
    Close { attempted: usize, failures: Vec<CloseFailure> },

    #[error("Serde JSON: {0}")]
    Json(String),

    #[error("TOML: {0}")]
    Toml(String),
}

fn join_failures(failures: &[CloseFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

impl From<serde_json::Error> for DbError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e.to_string())
    }
}

impl From<toml::de::Error> for DbError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e.to_string())
    }
}

impl DbError {
    /// Convenience constructor used by driver adapters.
    pub fn connect(database: &str, message: impl std::fmt::Display) -> Self {
        Self::Connect { database: database.to_string(), message: message.to_string() }
    }
}
