//! Splits SQL source text into discrete statements.
//!
//! The scanner walks the input byte by byte. Every delimiter it cares about
//! is ASCII, so multi-byte UTF-8 sequences pass through untouched. A `;`
//! ends a statement only outside of string literals, quoted identifiers and
//! comments, and outside of a `CREATE TRIGGER ... BEGIN ... END` body.

use super::statement::Statement;
use thiserror::Error;

/// Malformed SQL text, located by 1-based line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct SyntaxError {
    pub line: usize,
    pub kind: SyntaxErrorKind,
}

impl SyntaxError {
    fn new(line: usize, kind: SyntaxErrorKind) -> Self {
        Self { line, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated quoted identifier")]
    UnterminatedIdentifier,
    #[error("unterminated block comment")]
    UnterminatedComment,
    #[error("trigger body is not closed by END")]
    UnterminatedTrigger,
    #[error("statement is not terminated by ';'")]
    MissingTerminator,
}

/// What to do with non-blank text after the last terminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TrailingStatement {
    /// Emit it as an implicit final statement.
    #[default]
    Accept,
    /// Fail with [`SyntaxErrorKind::MissingTerminator`].
    Reject,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitOptions {
    pub trailing: TrailingStatement,
}

impl SplitOptions {
    pub fn strict() -> Self {
        Self {
            trailing: TrailingStatement::Reject,
        }
    }
}

/// Split `source` with the default (lenient) trailing policy.
pub fn split(source: &str) -> Result<Vec<Statement>, SyntaxError> {
    split_with(source, SplitOptions::default())
}

pub fn split_with(source: &str, options: SplitOptions) -> Result<Vec<Statement>, SyntaxError> {
    Splitter::new(source, options).run()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
    Single,
    Double,
    Backtick,
    Bracket,
}

impl Quote {
    fn open(byte: u8) -> Option<Self> {
        match byte {
            b'\'' => Some(Self::Single),
            b'"' => Some(Self::Double),
            b'`' => Some(Self::Backtick),
            b'[' => Some(Self::Bracket),
            _ => None,
        }
    }

    fn close(self) -> u8 {
        match self {
            Self::Single => b'\'',
            Self::Double => b'"',
            Self::Backtick => b'`',
            Self::Bracket => b']',
        }
    }

    /// Doubling the closing quote escapes it, except for `[...]`.
    fn escapable(self) -> bool {
        self != Self::Bracket
    }

    fn unterminated(self) -> SyntaxErrorKind {
        match self {
            Self::Single => SyntaxErrorKind::UnterminatedString,
            _ => SyntaxErrorKind::UnterminatedIdentifier,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    Quoted(Quote),
    LineComment,
    BlockComment,
}

/// Tracks whether the current statement is a trigger definition, whose
/// body contains `;`-terminated statements of its own. Inside the body a
/// `;` only ends the statement once it follows `; END`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TriggerPhase {
    Pending,
    Create,
    Body,
    AfterSemi,
    AfterEnd,
    Plain,
}

impl TriggerPhase {
    fn next(self, word: Option<&str>) -> Self {
        let is = |keyword: &str| word.is_some_and(|w| w.eq_ignore_ascii_case(keyword));
        match self {
            Self::Pending if is("CREATE") => Self::Create,
            Self::Pending => Self::Plain,
            Self::Create if is("TEMP") || is("TEMPORARY") => Self::Create,
            Self::Create if is("TRIGGER") => Self::Body,
            Self::Create => Self::Plain,
            Self::AfterSemi if is("END") => Self::AfterEnd,
            Self::Body | Self::AfterSemi | Self::AfterEnd => Self::Body,
            Self::Plain => Self::Plain,
        }
    }

    fn inside_body(self) -> bool {
        matches!(self, Self::Body | Self::AfterSemi)
    }
}

struct Splitter<'a> {
    source: &'a str,
    bytes: &'a [u8],
    options: SplitOptions,
    pos: usize,
    line: usize,
    state: State,
    state_line: usize,
    start: Option<(usize, usize)>,
    trigger: TriggerPhase,
    statements: Vec<Statement>,
}

impl<'a> Splitter<'a> {
    fn new(source: &'a str, options: SplitOptions) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            source,
            bytes: source.as_bytes(),
            options,
            pos: 0,
            line: 1,
            state: State::Normal,
            state_line: 1,
            start: None,
            trigger: TriggerPhase::Pending,
            statements: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Statement>, SyntaxError> {
        while let Some(&byte) = self.bytes.get(self.pos) {
            match self.state {
                State::Normal => self.scan_normal(byte),
                State::Quoted(quote) => self.scan_quoted(quote, byte),
                State::LineComment => {
                    if byte == b'\n' {
                        self.state = State::Normal;
                    }
                    self.advance();
                }
                State::BlockComment => {
                    if byte == b'*' && self.peek(1) == Some(b'/') {
                        self.state = State::Normal;
                        self.pos += 2;
                    } else {
                        self.advance();
                    }
                }
            }
        }
        self.finish()
    }

    fn scan_normal(&mut self, byte: u8) {
        match byte {
            b'-' if self.peek(1) == Some(b'-') => {
                self.state = State::LineComment;
                self.pos += 2;
            }
            b'/' if self.peek(1) == Some(b'*') => {
                self.state = State::BlockComment;
                self.state_line = self.line;
                self.pos += 2;
            }
            b';' => {
                self.terminate();
                self.pos += 1;
            }
            _ if byte.is_ascii_whitespace() => self.advance(),
            _ => {
                self.mark_start();
                if let Some(quote) = Quote::open(byte) {
                    self.trigger = self.trigger.next(None);
                    self.state = State::Quoted(quote);
                    self.state_line = self.line;
                    self.pos += 1;
                } else if is_word_start(byte) {
                    let source = self.source;
                    let end = self.bytes[self.pos..]
                        .iter()
                        .position(|&b| !is_word_continue(b))
                        .map_or(self.bytes.len(), |offset| self.pos + offset);
                    self.trigger = self.trigger.next(Some(&source[self.pos..end]));
                    self.pos = end;
                } else {
                    self.trigger = self.trigger.next(None);
                    self.pos += 1;
                }
            }
        }
    }

    fn scan_quoted(&mut self, quote: Quote, byte: u8) {
        if byte != quote.close() {
            self.advance();
        } else if quote.escapable() && self.peek(1) == Some(quote.close()) {
            self.pos += 2;
        } else {
            self.state = State::Normal;
            self.pos += 1;
        }
    }

    /// Handle a `;` seen in the normal state.
    fn terminate(&mut self) {
        if self.trigger.inside_body() {
            self.trigger = TriggerPhase::AfterSemi;
            return;
        }
        if let Some((start, line)) = self.start.take() {
            let sql = self.source[start..self.pos].trim_end();
            self.statements.push(Statement::new(sql, line));
        }
        self.trigger = TriggerPhase::Pending;
    }

    fn finish(mut self) -> Result<Vec<Statement>, SyntaxError> {
        match self.state {
            State::Quoted(quote) => {
                return Err(SyntaxError::new(self.state_line, quote.unterminated()));
            }
            State::BlockComment => {
                return Err(SyntaxError::new(
                    self.state_line,
                    SyntaxErrorKind::UnterminatedComment,
                ));
            }
            State::Normal | State::LineComment => {}
        }

        if let Some((start, line)) = self.start.take() {
            if self.trigger.inside_body() {
                return Err(SyntaxError::new(line, SyntaxErrorKind::UnterminatedTrigger));
            }
            if self.options.trailing == TrailingStatement::Reject {
                return Err(SyntaxError::new(line, SyntaxErrorKind::MissingTerminator));
            }
            let sql = self.source[start..].trim_end();
            self.statements.push(Statement::new(sql, line));
        }
        Ok(self.statements)
    }

    fn mark_start(&mut self) {
        if self.start.is_none() {
            self.start = Some((self.pos, self.line));
        }
    }

    fn advance(&mut self) {
        if self.bytes[self.pos] == b'\n' {
            self.line += 1;
        }
        self.pos += 1;
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }
}

fn is_word_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_' || byte >= 0x80
}

fn is_word_continue(byte: u8) -> bool {
    is_word_start(byte) || byte.is_ascii_digit() || byte == b'$'
}
