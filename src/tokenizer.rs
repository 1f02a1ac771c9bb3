//! Lexical analysis: turns raw Jack source into a flat vector of tokens.
//!
//! The tokenizer knows nothing about the grammar. It strips comments, splits
//! on whitespace and the fixed symbol set, and classifies whatever is left.
//! Malformed input never fails here; an unterminated string simply becomes a
//! corrupted string token and the parser deals with the consequences.
//!
//! Block comments are closed character by character, so `/* ... */` may span
//! lines and code following `*/` on the same line is kept.

use std::iter::Peekable;
use std::str::Chars;

/// Every character that forms a token on its own.
pub const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Keyword,
  Symbol,
  Identifier,
  IntegerConstant,
  StringConstant,
}

impl TokenKind {
  /// Name used for the kind in the token XML listing.
  pub fn as_str(self) -> &'static str {
    match self {
      TokenKind::Keyword => "keyword",
      TokenKind::Symbol => "symbol",
      TokenKind::Identifier => "identifier",
      TokenKind::IntegerConstant => "integerConstant",
      TokenKind::StringConstant => "stringConstant",
    }
  }
}

/// The 21 reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
  Class,
  Constructor,
  Function,
  Method,
  Field,
  Static,
  Var,
  Int,
  Char,
  Boolean,
  Void,
  True,
  False,
  Null,
  This,
  Let,
  Do,
  If,
  Else,
  While,
  Return,
}

impl Keyword {
  pub const ALL: [Keyword; 21] = [
    Keyword::Class,
    Keyword::Constructor,
    Keyword::Function,
    Keyword::Method,
    Keyword::Field,
    Keyword::Static,
    Keyword::Var,
    Keyword::Int,
    Keyword::Char,
    Keyword::Boolean,
    Keyword::Void,
    Keyword::True,
    Keyword::False,
    Keyword::Null,
    Keyword::This,
    Keyword::Let,
    Keyword::Do,
    Keyword::If,
    Keyword::Else,
    Keyword::While,
    Keyword::Return,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Keyword::Class => "class",
      Keyword::Constructor => "constructor",
      Keyword::Function => "function",
      Keyword::Method => "method",
      Keyword::Field => "field",
      Keyword::Static => "static",
      Keyword::Var => "var",
      Keyword::Int => "int",
      Keyword::Char => "char",
      Keyword::Boolean => "boolean",
      Keyword::Void => "void",
      Keyword::True => "true",
      Keyword::False => "false",
      Keyword::Null => "null",
      Keyword::This => "this",
      Keyword::Let => "let",
      Keyword::Do => "do",
      Keyword::If => "if",
      Keyword::Else => "else",
      Keyword::While => "while",
      Keyword::Return => "return",
    }
  }

  pub fn from_lexeme(lexeme: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|keyword| keyword.as_str() == lexeme)
  }
}

/// A classified lexeme together with where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  /// Raw text; string constants keep their quotes here.
  pub lexeme: String,
  pub line: usize,
  pub column: usize,
}

impl Token {
  /// Classify a finished lexeme.
  pub fn classify(lexeme: String, line: usize, column: usize) -> Self {
    let kind = if lexeme.starts_with('"') {
      TokenKind::StringConstant
    } else if lexeme.chars().count() == 1 && SYMBOLS.contains(lexeme.as_str()) {
      TokenKind::Symbol
    } else if Keyword::from_lexeme(&lexeme).is_some() {
      TokenKind::Keyword
    } else if lexeme.parse::<usize>().is_ok() {
      TokenKind::IntegerConstant
    } else {
      TokenKind::Identifier
    };
    Self {
      kind,
      lexeme,
      line,
      column,
    }
  }

  pub fn keyword(&self) -> Option<Keyword> {
    match self.kind {
      TokenKind::Keyword => Keyword::from_lexeme(&self.lexeme),
      _ => None,
    }
  }

  pub fn symbol(&self) -> Option<char> {
    match self.kind {
      TokenKind::Symbol => self.lexeme.chars().next(),
      _ => None,
    }
  }

  pub fn int_value(&self) -> Option<usize> {
    match self.kind {
      TokenKind::IntegerConstant => self.lexeme.parse().ok(),
      _ => None,
    }
  }

  /// String constant contents with the surrounding quotes stripped.
  pub fn string_value(&self) -> &str {
    let inner = self.lexeme.strip_prefix('"').unwrap_or(&self.lexeme);
    inner.strip_suffix('"').unwrap_or(inner)
  }

  /// Textual value as reported in listings: markup characters escaped,
  /// string constants unquoted.
  pub fn text(&self) -> &str {
    match self.kind {
      TokenKind::StringConstant => self.string_value(),
      TokenKind::Symbol => match self.lexeme.as_str() {
        "<" => "&lt;",
        ">" => "&gt;",
        "&" => "&amp;",
        other => other,
      },
      _ => &self.lexeme,
    }
  }
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: Option<&Token>) -> String {
  match token {
    Some(token) => token.lexeme.clone(),
    None => "EOF".to_string(),
  }
}

/// Character source that remembers the 1-based position of the next char.
struct Source<'a> {
  chars: Peekable<Chars<'a>>,
  line: usize,
  column: usize,
}

impl<'a> Source<'a> {
  fn new(text: &'a str) -> Self {
    Self {
      chars: text.chars().peekable(),
      line: 1,
      column: 1,
    }
  }

  fn position(&self) -> (usize, usize) {
    (self.line, self.column)
  }

  fn peek(&mut self) -> Option<char> {
    self.chars.peek().copied()
  }

  fn bump(&mut self) -> Option<char> {
    let c = self.chars.next()?;
    if c == '\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }
    Some(c)
  }
}

/// Accumulates the lexeme under construction.
#[derive(Default)]
struct Pending {
  text: String,
  start: (usize, usize),
}

impl Pending {
  fn push(&mut self, c: char, at: (usize, usize)) {
    if self.text.is_empty() {
      self.start = at;
    }
    self.text.push(c);
  }

  fn flush(&mut self, tokens: &mut Vec<Token>) {
    if self.text.is_empty() {
      return;
    }
    let (line, column) = self.start;
    tokens.push(Token::classify(std::mem::take(&mut self.text), line, column));
  }
}

/// Lex the whole input into classified tokens.
pub fn tokenize(input: &str) -> Vec<Token> {
  let mut tokens = Vec::new();
  let mut source = Source::new(input);
  let mut pending = Pending::default();
  let mut in_string = false;

  loop {
    let at = source.position();
    let Some(c) = source.bump() else {
      break;
    };

    if in_string {
      if c == '\n' {
        // Strings never span lines; keep what we have as a broken token.
        in_string = false;
        pending.flush(&mut tokens);
        continue;
      }
      pending.push(c, at);
      if c == '"' {
        in_string = false;
        pending.flush(&mut tokens);
      }
      continue;
    }

    match c {
      '/' if source.peek() == Some('/') => {
        pending.flush(&mut tokens);
        while source.peek().is_some_and(|next| next != '\n') {
          source.bump();
        }
      }
      '/' if source.peek() == Some('*') => {
        pending.flush(&mut tokens);
        source.bump();
        let mut after_star = false;
        while let Some(next) = source.bump() {
          if after_star && next == '/' {
            break;
          }
          after_star = next == '*';
        }
      }
      '"' => {
        pending.flush(&mut tokens);
        pending.push(c, at);
        in_string = true;
      }
      c if SYMBOLS.contains(c) => {
        pending.flush(&mut tokens);
        tokens.push(Token::classify(c.to_string(), at.0, at.1));
      }
      c if c.is_whitespace() => pending.flush(&mut tokens),
      c => pending.push(c, at),
    }
  }

  pending.flush(&mut tokens);
  tokens
}

/// Forward-only cursor over the token vector.
///
/// The cursor starts before the first token; `advance` makes the next token
/// current. Advancing past the last token leaves no current token.
#[derive(Debug, Clone)]
pub struct Tokenizer {
  tokens: Vec<Token>,
  pos: usize,
}

impl Tokenizer {
  pub fn new(source: &str) -> Self {
    Self::from_tokens(tokenize(source))
  }

  pub fn from_tokens(tokens: Vec<Token>) -> Self {
    Self { tokens, pos: 0 }
  }

  pub fn has_more_tokens(&self) -> bool {
    self.pos < self.tokens.len()
  }

  pub fn advance(&mut self) -> Option<&Token> {
    if self.pos <= self.tokens.len() {
      self.pos += 1;
    }
    self.current()
  }

  pub fn current(&self) -> Option<&Token> {
    self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
  }
}

/// Render the token stream as a `<tokens>` XML listing, one element per line.
pub fn tokens_xml(source: &str) -> String {
  let mut tokenizer = Tokenizer::new(source);
  let mut xml = String::from("<tokens>\n");
  while let Some(token) = tokenizer.advance() {
    let kind = token.kind.as_str();
    xml.push_str(&format!("<{kind}>{}</{kind}>\n", token.text()));
  }
  xml.push_str("</tokens>\n");
  xml
}
