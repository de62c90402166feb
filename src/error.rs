use sqlx::Error as SqlxError;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum PrefillerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("Could not parse {kind} {}: {reason}", .path.display())]
    StatementParse {
        kind: SourceKind,
        path: PathBuf,
        reason: String,
    },

    #[error("No schema found in '{}': {reason}", .directory.display())]
    SchemaNotFound { directory: PathBuf, reason: String },

    #[error("Could not find schema location")]
    SchemaLocationMissing,

    #[error("No classname configured for database {0}")]
    MissingClassname(String),

    #[error("No database named '{0}' is configured")]
    UnknownDatabase(String),

    #[error("Database file '{}' does not exist; the schema pass must run first", .0.display())]
    DatabaseNotFound(PathBuf),

    #[error(
        "{pass} pass on '{}' failed at statement {index} ({location}): {message}",
        .database.display()
    )]
    Population {
        pass: PopulationPass,
        database: PathBuf,
        index: usize,
        location: String,
        message: String,
    },

    #[error("Invalid locale '{locale}': {reason}")]
    InvalidLocale { locale: String, reason: String },
}

impl PrefillerError {
    pub fn parse(kind: SourceKind, path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::StatementParse {
            kind,
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema_not_found(directory: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::SchemaNotFound {
            directory: directory.into(),
            reason: reason.to_string(),
        }
    }
}

/// Which kind of input a statement sequence was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Schema,
    Script,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => f.write_str("schema"),
            Self::Script => f.write_str("script"),
        }
    }
}

/// The two population passes of one generation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopulationPass {
    /// Fresh file, schema statements.
    Overwrite,
    /// Existing file, script statements.
    Merge,
}

impl PopulationPass {
    pub fn from_overwrite(overwrite: bool) -> Self {
        if overwrite { Self::Overwrite } else { Self::Merge }
    }
}

impl fmt::Display for PopulationPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overwrite => f.write_str("Overwrite"),
            Self::Merge => f.write_str("Merge"),
        }
    }
}
