use std::fmt;
use std::sync::Arc;

/// One executable SQL statement, trimmed, with its terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    line: usize,
    source: Option<Arc<str>>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, line: usize) -> Self {
        Self {
            sql: sql.into(),
            line,
            source: None,
        }
    }

    /// Attach the name of the file this statement was read from.
    pub fn from_source(mut self, source: Arc<str>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// 1-based line of the statement's first token in its source text.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn kind(&self) -> StatementKind {
        StatementKind::classify(&self.sql)
    }

    /// Human readable origin, e.g. `people.sql:12` or `line 12`.
    pub fn location(&self) -> String {
        match self.source() {
            Some(source) => format!("{}:{}", source, self.line),
            None => format!("line {}", self.line),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Coarse statement category derived from the leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Query,
    Insert,
    Update,
    Delete,
    Create,
    Drop,
    Alter,
    Pragma,
    /// Opens or closes a transaction: `BEGIN`, `COMMIT`, `END`, `ROLLBACK`.
    Transaction,
    /// Nested savepoints, which run inside an open transaction.
    Savepoint,
    Other,
    Unknown,
}

impl StatementKind {
    pub fn classify(sql: &str) -> Self {
        let keyword = split_keyword(sql).0.to_ascii_uppercase();
        match keyword.as_str() {
            "SELECT" | "VALUES" | "WITH" | "EXPLAIN" => Self::Query,
            "INSERT" | "REPLACE" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            "CREATE" => Self::Create,
            "DROP" => Self::Drop,
            "ALTER" => Self::Alter,
            "PRAGMA" => Self::Pragma,
            "ROLLBACK" if rolls_back_to_savepoint(sql) => Self::Savepoint,
            "BEGIN" | "COMMIT" | "END" | "ROLLBACK" => Self::Transaction,
            "SAVEPOINT" | "RELEASE" => Self::Savepoint,
            "ANALYZE" | "ATTACH" | "DETACH" | "REINDEX" | "VACUUM" => Self::Other,
            _ => Self::Unknown,
        }
    }

    pub fn is_known(self) -> bool {
        self != Self::Unknown
    }
}

/// `ROLLBACK [TRANSACTION] TO ...` only unwinds to a savepoint.
fn rolls_back_to_savepoint(sql: &str) -> bool {
    let (_, rest) = split_keyword(sql);
    let mut words = rest.split_whitespace().map(str::to_ascii_uppercase);
    match words.next().as_deref() {
        Some("TO") => true,
        Some("TRANSACTION") => words.next().as_deref() == Some("TO"),
        _ => false,
    }
}

/// First identifier-like word of `sql` and the text after it, skipping
/// leading comments.
fn split_keyword(sql: &str) -> (&str, &str) {
    let mut rest = sql.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("--") {
            rest = after.split_once('\n').map_or("", |(_, tail)| tail).trim_start();
        } else if let Some(after) = rest.strip_prefix("/*") {
            rest = after.split_once("*/").map_or("", |(_, tail)| tail).trim_start();
        } else {
            break;
        }
    }
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    rest.split_at(end)
}
