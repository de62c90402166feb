use crate::db::collation::{COLLATION_NAMES, OrdinalCollator, SharedCollator};
use crate::error::{PopulationPass, PrefillerError};
use crate::sql::Statement;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::{ConnectOptions, Connection};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, trace, warn};

/// Sidecar files SQLite may keep next to a database.
const SIDECAR_SUFFIXES: [&str; 3] = ["-journal", "-wal", "-shm"];

/// Applies statement sequences to a single SQLite file.
#[derive(Clone)]
pub struct DatabasePopulator {
    collator: SharedCollator,
}

impl Default for DatabasePopulator {
    fn default() -> Self {
        Self::new(Arc::new(OrdinalCollator))
    }
}

impl DatabasePopulator {
    pub fn new(collator: SharedCollator) -> Self {
        Self { collator }
    }

    /// Execute `statements` against `database_file` in one transaction.
    ///
    /// With `overwrite` the file and its sidecars are deleted first and a new
    /// database is created; a failed overwrite pass removes the new file
    /// again. Without it the file must already exist, and a failure leaves
    /// it exactly as it was.
    pub async fn populate(
        &self,
        database_file: &Path,
        statements: &[Statement],
        overwrite: bool,
    ) -> Result<(), PrefillerError> {
        let pass = PopulationPass::from_overwrite(overwrite);
        if overwrite {
            remove_database(database_file)?;
            if let Some(parent) = database_file.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
        } else if !database_file.is_file() {
            return Err(PrefillerError::DatabaseNotFound(database_file.to_path_buf()));
        }

        info!(
            database = %database_file.display(),
            pass = %pass,
            statements = statements.len(),
            "populating database"
        );

        let result = self.apply(database_file, statements, pass).await;
        if result.is_err() && overwrite {
            if let Err(e) = remove_database(database_file) {
                warn!(
                    database = %database_file.display(),
                    error = %e,
                    "failed to remove database after failed overwrite pass"
                );
            }
        }
        result
    }

    async fn apply(
        &self,
        database_file: &Path,
        statements: &[Statement],
        pass: PopulationPass,
    ) -> Result<(), PrefillerError> {
        let mut conn = self
            .connect_options(database_file, pass == PopulationPass::Overwrite)
            .connect()
            .await?;
        let outcome = execute_all(&mut conn, database_file, statements, pass).await;
        let closed = conn.close().await;
        outcome?;
        closed?;
        Ok(())
    }

    fn connect_options(&self, database_file: &Path, create: bool) -> SqliteConnectOptions {
        let mut options = SqliteConnectOptions::new()
            .filename(database_file)
            .create_if_missing(create)
            .journal_mode(SqliteJournalMode::Delete)
            .foreign_keys(false);
        for name in COLLATION_NAMES {
            let collator = Arc::clone(&self.collator);
            options = options.collation(name, move |left: &str, right: &str| {
                collator.compare(left, right)
            });
        }
        options
    }
}

async fn execute_all(
    conn: &mut SqliteConnection,
    database_file: &Path,
    statements: &[Statement],
    pass: PopulationPass,
) -> Result<(), PrefillerError> {
    let mut tx = conn.begin().await?;

    for (i, stmt) in statements.iter().enumerate() {
        trace!(index = i + 1, location = %stmt.location(), "executing statement");
        if let Err(e) = sqlx::query(stmt.sql()).execute(&mut *tx).await {
            if let Err(rollback) = tx.rollback().await {
                warn!(error = %rollback, "rollback after failed statement did not complete");
            }
            return Err(population_error(pass, database_file, i + 1, stmt.location(), &e));
        }
    }

    tx.commit().await.map_err(|e| {
        population_error(pass, database_file, statements.len(), "commit".to_string(), &e)
    })
}

fn population_error(
    pass: PopulationPass,
    database_file: &Path,
    index: usize,
    location: String,
    error: &sqlx::Error,
) -> PrefillerError {
    PrefillerError::Population {
        pass,
        database: database_file.to_path_buf(),
        index,
        location,
        message: engine_message(error),
    }
}

fn engine_message(error: &sqlx::Error) -> String {
    match error {
        sqlx::Error::Database(db) => db.message().to_string(),
        other => other.to_string(),
    }
}

/// Delete a database file and its sidecars; missing files are fine.
pub fn remove_database(database_file: &Path) -> io::Result<()> {
    let mut paths = vec![database_file.to_path_buf()];
    paths.extend(SIDECAR_SUFFIXES.iter().map(|suffix| {
        let mut name = database_file.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }));

    for path in paths {
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
