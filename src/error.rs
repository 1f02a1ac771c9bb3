//! Shared error utilities used across the compilation pipeline.
//!
//! Grammar violations are reported in a style reminiscent of chibicc: the
//! offending source line is echoed and a caret points at the token that broke
//! the parse.

use std::path::PathBuf;

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  /// A grammar violation anchored at a token.
  #[snafu(display("{line_text}\n{marker} {message}"))]
  WithLocation {
    line: usize,
    line_text: String,
    marker: String,
    message: String,
  },

  /// The token stream ran out while the grammar still required input.
  #[snafu(display("unexpected end of input: expected {expected}"))]
  UnexpectedEof { expected: String },

  /// Raised only in strict mode, when a name resolves in neither scope.
  #[snafu(display("line {line}: unresolved identifier `{name}`"))]
  Unresolved { name: String, line: usize },

  #[snafu(display("failed to read {}: {}", path.display(), source))]
  ReadSource {
    path: PathBuf,
    source: std::io::Error,
  },
}

impl CompileError {
  /// Construct an error anchored at a 1-based line and column of `source`.
  pub fn at(source: &str, line: usize, column: usize, message: impl Into<String>) -> Self {
    let text = source
      .lines()
      .nth(line.saturating_sub(1))
      .unwrap_or_default()
      .trim_end();
    let gutter = format!("{line:>4} | ");
    let marker = format!("{}^", " ".repeat(gutter.len() + column.saturating_sub(1)));
    Self::WithLocation {
      line,
      line_text: format!("{gutter}{text}"),
      marker,
      message: message.into(),
    }
  }

  /// Source line the error points at, when there is one.
  pub fn line(&self) -> Option<usize> {
    match self {
      Self::WithLocation { line, .. } | Self::Unresolved { line, .. } => Some(*line),
      Self::UnexpectedEof { .. } | Self::ReadSource { .. } => None,
    }
  }
}
