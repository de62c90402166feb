//! Per-source statement parsers.
//!
//! Both parsers run the same splitter; they differ in how their input is
//! decoded and which results they refuse.

use crate::error::{PrefillerError, SourceKind};
use crate::schema::SchemaExport;
use crate::sql::{SplitOptions, Statement, StatementKind, split_with};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::debug;

pub trait StatementParser {
    fn parse(&self) -> Result<Vec<Statement>, PrefillerError>;
}

/// Reads a Room schema export and yields the statements that create it.
pub struct SchemaStatementParser {
    path: PathBuf,
}

impl SchemaStatementParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn fail(&self, reason: impl std::fmt::Display) -> PrefillerError {
        PrefillerError::parse(SourceKind::Schema, &self.path, reason)
    }
}

impl StatementParser for SchemaStatementParser {
    fn parse(&self) -> Result<Vec<Statement>, PrefillerError> {
        let json = fs::read_to_string(&self.path).map_err(|e| self.fail(e))?;
        let export = SchemaExport::from_json(&json).map_err(|e| self.fail(e))?;
        if export.database.entities.is_empty() && export.database.views.is_empty() {
            return Err(self.fail("schema declares no tables or views"));
        }

        let source = source_name(&self.path);
        let mut statements = Vec::new();
        for fragment in export.to_sql() {
            let parsed = split_with(&fragment, SplitOptions::default())
                .map_err(|e| self.fail(format!("{e} in `{fragment}`")))?;
            statements.extend(parsed.into_iter().map(|s| s.from_source(source.clone())));
        }

        debug!(
            path = %self.path.display(),
            format_version = ?export.format_version,
            version = export.database.version,
            identity_hash = export.database.identity_hash.as_deref().unwrap_or("<none>"),
            count = statements.len(),
            "parsed schema statements"
        );
        Ok(statements)
    }
}

/// Reads a user SQL script.
pub struct ScriptStatementParser {
    path: PathBuf,
    options: SplitOptions,
}

impl ScriptStatementParser {
    pub fn new(path: impl Into<PathBuf>, options: SplitOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    fn fail(&self, reason: impl std::fmt::Display) -> PrefillerError {
        PrefillerError::parse(SourceKind::Script, &self.path, reason)
    }
}

impl StatementParser for ScriptStatementParser {
    fn parse(&self) -> Result<Vec<Statement>, PrefillerError> {
        let text = fs::read_to_string(&self.path).map_err(|e| self.fail(e))?;
        let statements = split_with(&text, self.options).map_err(|e| self.fail(e))?;
        if statements.is_empty() {
            return Err(self.fail("no statements found"));
        }

        for stmt in &statements {
            let kind = stmt.kind();
            if !kind.is_known() {
                return Err(self.fail(format_args!(
                    "line {}: not a SQL statement: `{}`",
                    stmt.line(),
                    excerpt(stmt.sql())
                )));
            }
            if kind == StatementKind::Transaction {
                return Err(self.fail(format_args!(
                    "line {}: transaction control is not allowed, scripts already run in one transaction",
                    stmt.line()
                )));
            }
        }

        let source = source_name(&self.path);
        debug!(
            path = %self.path.display(),
            count = statements.len(),
            "parsed script statements"
        );
        Ok(statements
            .into_iter()
            .map(|s| s.from_source(source.clone()))
            .collect())
    }
}

/// Builds the parser for each input file.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementParserFactory {
    script_options: SplitOptions,
}

impl StatementParserFactory {
    pub fn new(script_options: SplitOptions) -> Self {
        Self { script_options }
    }

    pub fn create_parser(&self, kind: SourceKind, file: &Path) -> Box<dyn StatementParser> {
        match kind {
            SourceKind::Schema => Box::new(SchemaStatementParser::new(file)),
            SourceKind::Script => Box::new(ScriptStatementParser::new(file, self.script_options)),
        }
    }
}

fn source_name(path: &Path) -> Arc<str> {
    Arc::from(path.display().to_string())
}

fn excerpt(sql: &str) -> &str {
    match sql.char_indices().nth(40) {
        Some((end, _)) => &sql[..end],
        None => sql,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    const SCHEMA: &str = r#"{
      "formatVersion": 1,
      "database": {
        "version": 1,
        "entities": [
          {
            "tableName": "people",
            "createSql": "CREATE TABLE IF NOT EXISTS `${TABLE_NAME}` (`id` INTEGER PRIMARY KEY, `name` TEXT, `age` INTEGER)"
          }
        ],
        "setupQueries": [
          "CREATE TABLE IF NOT EXISTS room_master_table (id INTEGER PRIMARY KEY,identity_hash TEXT)"
        ]
      }
    }"#;

    #[test]
    fn factory_dispatches_on_source_kind() {
        let dir = TempDir::new().unwrap();
        let schema = write(&dir, "1.json", SCHEMA);
        let script = write(&dir, "seed.sql", "INSERT INTO people(name) VALUES ('Ann');");
        let factory = StatementParserFactory::default();

        let schema_statements = factory.create_parser(SourceKind::Schema, &schema).parse().unwrap();
        assert_eq!(schema_statements.len(), 3);
        assert!(schema_statements[0].sql().contains("`people`"));

        let script_statements = factory.create_parser(SourceKind::Script, &script).parse().unwrap();
        assert_eq!(script_statements.len(), 1);
        assert_eq!(script_statements[0].location(), format!("{}:1", script.display()));
    }

    #[test]
    fn schema_failures_say_could_not_parse_schema() {
        let dir = TempDir::new().unwrap();
        let broken = write(&dir, "2.json", "{ not json");
        let err = SchemaStatementParser::new(&broken).parse().unwrap_err();
        assert!(err.to_string().starts_with("Could not parse schema"));

        let empty = write(&dir, "3.json", r#"{ "database": { "version": 3 } }"#);
        let err = SchemaStatementParser::new(&empty).parse().unwrap_err();
        assert!(err.to_string().contains("no tables or views"));
    }

    #[test]
    fn schema_fragment_with_bad_quoting_is_rejected() {
        let dir = TempDir::new().unwrap();
        let json = r#"{ "database": { "version": 1, "entities": [
            { "tableName": "t", "createSql": "CREATE TABLE `${TABLE_NAME} (a)" } ] } }"#;
        let path = write(&dir, "1.json", json);
        let err = SchemaStatementParser::new(&path).parse().unwrap_err();
        assert!(matches!(
            err,
            PrefillerError::StatementParse { kind: SourceKind::Schema, .. }
        ));
    }

    #[test]
    fn prose_in_script_is_rejected_with_path() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "people.sql",
            "INSERT INTO people(name) VALUES ('Ann');\nNormal text is not a valid SQL statement",
        );
        let err = ScriptStatementParser::new(&path, SplitOptions::default())
            .parse()
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(&format!("Could not parse script {}", path.display())));
        assert!(message.contains("line 2"));
    }

    #[test]
    fn transaction_control_in_script_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "tx.sql", "BEGIN;\nINSERT INTO t VALUES (1);\nCOMMIT;");
        let err = ScriptStatementParser::new(&path, SplitOptions::default())
            .parse()
            .unwrap_err();
        assert!(err.to_string().contains("transaction control"));
    }

    #[test]
    fn savepoints_in_script_are_accepted() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "s.sql",
            "SAVEPOINT seed;\nINSERT INTO t VALUES (1);\nROLLBACK TO seed;\nRELEASE seed;",
        );
        let statements = ScriptStatementParser::new(&path, SplitOptions::default())
            .parse()
            .unwrap();
        assert_eq!(statements.len(), 4);
        assert_eq!(statements[3].kind(), StatementKind::Savepoint);
    }

    #[test]
    fn empty_script_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "empty.sql", "-- nothing to see\n");
        let err = ScriptStatementParser::new(&path, SplitOptions::default())
            .parse()
            .unwrap_err();
        assert!(err.to_string().ends_with("no statements found"));
    }

    #[test]
    fn strict_scripts_need_final_terminator() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "s.sql", "INSERT INTO t VALUES (1)");
        assert!(ScriptStatementParser::new(&path, SplitOptions::default()).parse().is_ok());
        let err = ScriptStatementParser::new(&path, SplitOptions::strict())
            .parse()
            .unwrap_err();
        assert!(err.to_string().contains("not terminated"));
    }

    #[test]
    fn missing_script_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let err = ScriptStatementParser::new(dir.path().join("gone.sql"), SplitOptions::default())
            .parse()
            .unwrap_err();
        assert!(err.to_string().starts_with("Could not parse script"));
    }
}
