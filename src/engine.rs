//! Single-pass recursive-descent compiler for one Jack class.
//!
//! Every grammar rule has a `compile_*` method that consumes its tokens and
//! emits VM code on the spot; there is no syntax tree. The engine owns all
//! per-class state (symbol table, label counter, current subroutine), so a
//! fresh engine per class is all that is needed to compile classes in
//! parallel.
//!
//! Expressions have no operator precedence: `1 + 2 * 3` is `(1 + 2) * 3`.

use crate::error::{CompileError, CompileResult};
use crate::symbol_table::{Kind, Symbol, SymbolTable};
use crate::tokenizer::{Keyword, Token, TokenKind, Tokenizer, describe_token};
use crate::vm_writer::{Command, Segment, VmWriter};

/// Knobs for one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
  /// Emit a `// ...` comment line before the code of every statement.
  pub trace: bool,
  /// Fail on names that resolve in neither scope instead of addressing them
  /// as `static 0`.
  pub strict_symbols: bool,
}

/// A variable reference that resolved in neither scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedName {
  pub name: String,
  pub line: usize,
}

/// Output of a successful compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiled {
  pub code: String,
  /// Every fallback to `static 0`, in source order.
  pub unresolved: Vec<UnresolvedName>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
  Constructor,
  Function,
  Method,
}

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  And,
  Or,
  Lt,
  Gt,
  Eq,
}

impl BinaryOp {
  fn from_symbol(symbol: char) -> Option<Self> {
    let op = match symbol {
      '+' => BinaryOp::Add,
      '-' => BinaryOp::Sub,
      '*' => BinaryOp::Mul,
      '/' => BinaryOp::Div,
      '&' => BinaryOp::And,
      '|' => BinaryOp::Or,
      '<' => BinaryOp::Lt,
      '>' => BinaryOp::Gt,
      '=' => BinaryOp::Eq,
      _ => return None,
    };
    Some(op)
  }
}

pub struct CompilationEngine<'a> {
  stream: TokenStream<'a>,
  symbols: SymbolTable,
  writer: VmWriter,
  options: CompileOptions,
  class_name: String,
  /// Qualified `Class.subroutine` name of the subroutine being compiled.
  subroutine_name: String,
  subroutine_kind: SubroutineKind,
  label_count: usize,
  unresolved: Vec<UnresolvedName>,
}

impl<'a> CompilationEngine<'a> {
  pub fn new(source: &'a str, options: CompileOptions) -> Self {
    Self {
      stream: TokenStream::new(source),
      symbols: SymbolTable::new(),
      writer: VmWriter::new(),
      options,
      class_name: String::new(),
      subroutine_name: String::new(),
      subroutine_kind: SubroutineKind::Function,
      label_count: 0,
      unresolved: Vec::new(),
    }
  }

  pub fn symbols(&self) -> &SymbolTable {
    &self.symbols
  }

  pub fn class_name(&self) -> &str {
    &self.class_name
  }

  /// VM code emitted so far.
  pub fn code(&self) -> &str {
    self.writer.as_str()
  }

  pub fn finish(self) -> Compiled {
    Compiled {
      code: self.writer.finish(),
      unresolved: self.unresolved,
    }
  }

  /// `class <name> { <classVarDec>* <subroutineDec>* }` followed by nothing.
  pub fn compile_class(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Class)?;
    let (name, _) = self.stream.get_ident("a class name")?;
    self.class_name = name;
    self.stream.skip_symbol('{')?;

    while matches!(
      self.stream.peek_keyword(),
      Some(Keyword::Static | Keyword::Field)
    ) {
      self.compile_class_var_dec()?;
    }
    while matches!(
      self.stream.peek_keyword(),
      Some(Keyword::Constructor | Keyword::Function | Keyword::Method)
    ) {
      self.compile_subroutine_dec()?;
    }

    self.stream.skip_symbol('}')?;
    if !self.stream.is_eof() {
      return Err(self.stream.expected("end of input after the class body"));
    }
    Ok(())
  }

  fn compile_class_var_dec(&mut self) -> CompileResult<()> {
    let kind = match self.stream.peek_keyword() {
      Some(Keyword::Static) => Kind::Static,
      Some(Keyword::Field) => Kind::Field,
      _ => return Err(self.stream.expected("\"static\" or \"field\"")),
    };
    self.stream.advance();
    self.compile_var_names(kind)
  }

  fn compile_var_dec(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Var)?;
    self.compile_var_names(Kind::Local)
  }

  /// `<type> <name> (, <name>)* ;`, shared by class and local declarations.
  fn compile_var_names(&mut self, kind: Kind) -> CompileResult<()> {
    let ty = self.compile_type(false)?;
    loop {
      let (name, _) = self.stream.get_ident("a variable name")?;
      self.symbols.define(&name, &ty, kind);
      if !self.stream.equal_symbol(',') {
        break;
      }
    }
    self.stream.skip_symbol(';')
  }

  /// `int | char | boolean | <className>`, plus `void` for return types.
  fn compile_type(&mut self, allow_void: bool) -> CompileResult<String> {
    let ty = self
      .stream
      .peek()
      .filter(|token| match token.keyword() {
        Some(Keyword::Int | Keyword::Char | Keyword::Boolean) => true,
        Some(Keyword::Void) => allow_void,
        Some(_) => false,
        None => token.kind == TokenKind::Identifier,
      })
      .map(|token| token.lexeme.clone());

    match ty {
      Some(ty) => {
        self.stream.advance();
        Ok(ty)
      }
      None => Err(self.stream.expected("a type")),
    }
  }

  fn compile_subroutine_dec(&mut self) -> CompileResult<()> {
    self.symbols.start_subroutine();
    let kind = match self.stream.peek_keyword() {
      Some(Keyword::Constructor) => SubroutineKind::Constructor,
      Some(Keyword::Function) => SubroutineKind::Function,
      Some(Keyword::Method) => SubroutineKind::Method,
      _ => {
        return Err(
          self
            .stream
            .expected("\"constructor\", \"function\" or \"method\""),
        );
      }
    };
    self.stream.advance();

    // The return type does not influence code generation.
    self.compile_type(true)?;
    let (name, _) = self.stream.get_ident("a subroutine name")?;
    self.subroutine_kind = kind;
    self.subroutine_name = format!("{}.{name}", self.class_name);

    self.stream.skip_symbol('(')?;
    self.compile_parameter_list()?;
    self.stream.skip_symbol(')')?;
    self.compile_subroutine_body()
  }

  /// Defines each parameter as an argument and returns how many there were.
  /// A method's receiver is not defined here; see `address_of`.
  fn compile_parameter_list(&mut self) -> CompileResult<usize> {
    if self.stream.peek_symbol() == Some(')') {
      return Ok(0);
    }

    let mut count = 0;
    loop {
      let ty = self.compile_type(false)?;
      let (name, _) = self.stream.get_ident("a parameter name")?;
      self.symbols.define(&name, &ty, Kind::Argument);
      count += 1;
      if !self.stream.equal_symbol(',') {
        break;
      }
    }
    Ok(count)
  }

  fn compile_subroutine_body(&mut self) -> CompileResult<()> {
    self.stream.skip_symbol('{')?;
    while self.stream.peek_keyword() == Some(Keyword::Var) {
      self.compile_var_dec()?;
    }

    let n_locals = self.symbols.var_count(Kind::Local);
    self.writer.write_function(&self.subroutine_name, n_locals);
    match self.subroutine_kind {
      SubroutineKind::Constructor => {
        let n_fields = self.symbols.var_count(Kind::Field);
        self.writer.write_push(Segment::Constant, n_fields);
        self.writer.write_call("Memory.alloc", 1);
        self.writer.write_pop(Segment::Pointer, 0);
      }
      SubroutineKind::Method => {
        self.writer.write_push(Segment::Argument, 0);
        self.writer.write_pop(Segment::Pointer, 0);
      }
      SubroutineKind::Function => {}
    }

    self.compile_statements()?;
    self.stream.skip_symbol('}')
  }

  fn compile_statements(&mut self) -> CompileResult<()> {
    loop {
      match self.stream.peek_keyword() {
        Some(Keyword::Let) => self.compile_let()?,
        Some(Keyword::If) => self.compile_if()?,
        Some(Keyword::While) => self.compile_while()?,
        Some(Keyword::Do) => self.compile_do()?,
        Some(Keyword::Return) => self.compile_return()?,
        _ => return Ok(()),
      }
    }
  }

  fn compile_let(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Let)?;
    let (name, line) = self.stream.get_ident("a variable name")?;
    self.trace(&format!("let {name}"));

    if self.stream.equal_symbol('[') {
      let (segment, index) = self.resolve(&name, line)?;
      self.writer.write_push(segment, index);
      self.compile_expression()?;
      self.stream.skip_symbol(']')?;
      self.writer.write_arithmetic(Command::Add);

      self.stream.skip_symbol('=')?;
      self.compile_expression()?;
      self.stream.skip_symbol(';')?;

      // The right-hand side may itself have used `that`, so the target
      // address is only bound once its value is parked in temp 0.
      self.writer.write_pop(Segment::Temp, 0);
      self.writer.write_pop(Segment::Pointer, 1);
      self.writer.write_push(Segment::Temp, 0);
      self.writer.write_pop(Segment::That, 0);
      return Ok(());
    }

    self.stream.skip_symbol('=')?;
    self.compile_expression()?;
    self.stream.skip_symbol(';')?;
    let (segment, index) = self.resolve(&name, line)?;
    self.writer.write_pop(segment, index);
    Ok(())
  }

  /// `not` is bitwise on the target machine, so the condition is never
  /// inverted; a true/false/end label triple is used instead.
  fn compile_if(&mut self) -> CompileResult<()> {
    let id = self.next_label_id();
    let true_label = format!("IF_TRUE{id}");
    let false_label = format!("IF_FALSE{id}");
    let end_label = format!("IF_END{id}");

    self.stream.skip_keyword(Keyword::If)?;
    self.trace("if");
    self.stream.skip_symbol('(')?;
    self.compile_expression()?;
    self.stream.skip_symbol(')')?;

    self.writer.write_if(&true_label);
    self.writer.write_goto(&false_label);
    self.writer.write_label(&true_label);
    self.compile_block()?;
    self.writer.write_goto(&end_label);

    self.writer.write_label(&false_label);
    if self.stream.equal_keyword(Keyword::Else) {
      self.compile_block()?;
    }
    self.writer.write_label(&end_label);
    Ok(())
  }

  fn compile_while(&mut self) -> CompileResult<()> {
    let id = self.next_label_id();
    let start_label = format!("WHILE_EXP{id}");
    let end_label = format!("WHILE_END{id}");

    self.stream.skip_keyword(Keyword::While)?;
    self.trace("while");
    self.writer.write_label(&start_label);
    self.stream.skip_symbol('(')?;
    self.compile_expression()?;
    self.stream.skip_symbol(')')?;

    self.writer.write_arithmetic(Command::Not);
    self.writer.write_if(&end_label);
    self.compile_block()?;
    self.writer.write_goto(&start_label);
    self.writer.write_label(&end_label);
    Ok(())
  }

  /// `{ <statements> }`
  fn compile_block(&mut self) -> CompileResult<()> {
    self.stream.skip_symbol('{')?;
    self.compile_statements()?;
    self.stream.skip_symbol('}')
  }

  fn compile_do(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Do)?;
    let (name, _) = self.stream.get_ident("a subroutine name")?;
    self.trace(&format!("do {name}"));
    self.compile_subroutine_call(name)?;
    self.stream.skip_symbol(';')?;
    // Every call leaves exactly one value behind.
    self.writer.write_pop(Segment::Temp, 0);
    Ok(())
  }

  fn compile_return(&mut self) -> CompileResult<()> {
    self.stream.skip_keyword(Keyword::Return)?;
    self.trace("return");
    if self.stream.equal_symbol(';') {
      // Callers always pop one value, even from a void subroutine.
      self.writer.write_push(Segment::Constant, 0);
    } else {
      self.compile_expression()?;
      self.stream.skip_symbol(';')?;
    }
    self.writer.write_return();
    Ok(())
  }

  /// `<term> (<op> <term>)*`, folded strictly left to right.
  fn compile_expression(&mut self) -> CompileResult<()> {
    self.compile_term()?;
    while let Some(op) = self.stream.peek_symbol().and_then(BinaryOp::from_symbol) {
      self.stream.advance();
      self.compile_term()?;
      match op {
        BinaryOp::Add => self.writer.write_arithmetic(Command::Add),
        BinaryOp::Sub => self.writer.write_arithmetic(Command::Sub),
        BinaryOp::Mul => self.writer.write_call("Math.multiply", 2),
        BinaryOp::Div => self.writer.write_call("Math.divide", 2),
        BinaryOp::And => self.writer.write_arithmetic(Command::And),
        BinaryOp::Or => self.writer.write_arithmetic(Command::Or),
        BinaryOp::Lt => self.writer.write_arithmetic(Command::Lt),
        BinaryOp::Gt => self.writer.write_arithmetic(Command::Gt),
        BinaryOp::Eq => self.writer.write_arithmetic(Command::Eq),
      }
    }
    Ok(())
  }

  fn compile_term(&mut self) -> CompileResult<()> {
    let Some(token) = self.stream.peek().cloned() else {
      return Err(self.stream.expected("a term"));
    };

    match token.kind {
      TokenKind::IntegerConstant => {
        let value = token
          .int_value()
          .ok_or_else(|| self.stream.expected("an integer constant"))?;
        self.stream.advance();
        self.writer.write_push(Segment::Constant, value);
      }
      TokenKind::StringConstant => {
        self.stream.advance();
        let value = token.string_value();
        self.writer.write_push(Segment::Constant, value.chars().count());
        self.writer.write_call("String.new", 1);
        for c in value.chars() {
          self.writer.write_push(Segment::Constant, c as usize);
          self.writer.write_call("String.appendChar", 2);
        }
      }
      TokenKind::Keyword => {
        match token.keyword() {
          Some(Keyword::True) => {
            self.writer.write_push(Segment::Constant, 0);
            self.writer.write_arithmetic(Command::Not);
          }
          Some(Keyword::False | Keyword::Null) => {
            self.writer.write_push(Segment::Constant, 0);
          }
          Some(Keyword::This) => self.writer.write_push(Segment::Pointer, 0),
          _ => return Err(self.stream.expected("a term")),
        }
        self.stream.advance();
      }
      TokenKind::Symbol => match token.symbol() {
        Some('(') => {
          self.stream.advance();
          self.compile_expression()?;
          self.stream.skip_symbol(')')?;
        }
        Some(op @ ('-' | '~')) => {
          self.stream.advance();
          self.compile_term()?;
          let command = if op == '-' { Command::Neg } else { Command::Not };
          self.writer.write_arithmetic(command);
        }
        _ => return Err(self.stream.expected("a term")),
      },
      TokenKind::Identifier => {
        self.stream.advance();
        let name = token.lexeme;
        match self.stream.peek_symbol() {
          Some('[') => {
            self.stream.advance();
            let (segment, index) = self.resolve(&name, token.line)?;
            self.writer.write_push(segment, index);
            self.compile_expression()?;
            self.stream.skip_symbol(']')?;
            self.writer.write_arithmetic(Command::Add);
            self.writer.write_pop(Segment::Pointer, 1);
            self.writer.write_push(Segment::That, 0);
          }
          Some('(' | '.') => self.compile_subroutine_call(name)?,
          _ => {
            let (segment, index) = self.resolve(&name, token.line)?;
            self.writer.write_push(segment, index);
          }
        }
      }
    }
    Ok(())
  }

  /// Compile a call whose leading identifier `name` has been consumed.
  ///
  /// - `name(args)` calls a method of this class on the current object.
  /// - `name.sub(args)` with `name` bound to a variable calls
  ///   `<declared type>.sub` with that variable as receiver.
  /// - otherwise `name.sub(args)` calls `name.sub` with no receiver.
  fn compile_subroutine_call(&mut self, name: String) -> CompileResult<()> {
    let (target, receiver_args) = if self.stream.equal_symbol('.') {
      let (sub_name, _) = self.stream.get_ident("a subroutine name")?;
      match self.symbols.lookup(&name) {
        Some(symbol) => {
          let (segment, index) = self.address_of(symbol);
          let target = format!("{}.{sub_name}", symbol.ty);
          self.writer.write_push(segment, index);
          (target, 1)
        }
        None => (format!("{name}.{sub_name}"), 0),
      }
    } else {
      self.writer.write_push(Segment::Pointer, 0);
      (format!("{}.{name}", self.class_name), 1)
    };

    self.stream.skip_symbol('(')?;
    let n_args = receiver_args + self.compile_expression_list()?;
    self.stream.skip_symbol(')')?;
    self.writer.write_call(&target, n_args);
    Ok(())
  }

  /// Comma-separated expressions; returns how many were compiled.
  fn compile_expression_list(&mut self) -> CompileResult<usize> {
    if self.stream.peek_symbol() == Some(')') {
      return Ok(0);
    }

    let mut count = 0;
    loop {
      self.compile_expression()?;
      count += 1;
      if !self.stream.equal_symbol(',') {
        break;
      }
    }
    Ok(count)
  }

  /// Segment and index of a symbol as seen from the current subroutine.
  ///
  /// Inside a method the receiver occupies argument 0, so every declared
  /// argument sits one slot higher than its symbol-table index.
  fn address_of(&self, symbol: &Symbol) -> (Segment, usize) {
    let shifted =
      symbol.kind == Kind::Argument && self.subroutine_kind == SubroutineKind::Method;
    (symbol.kind.segment(), symbol.index + usize::from(shifted))
  }

  /// Resolve a variable reference. Names found in neither scope are recorded
  /// and addressed as `static 0`, unless strict mode turns them into errors.
  fn resolve(&mut self, name: &str, line: usize) -> CompileResult<(Segment, usize)> {
    if let Some(symbol) = self.symbols.lookup(name) {
      return Ok(self.address_of(symbol));
    }
    if self.options.strict_symbols {
      return Err(CompileError::Unresolved {
        name: name.to_string(),
        line,
      });
    }
    self.unresolved.push(UnresolvedName {
      name: name.to_string(),
      line,
    });
    Ok((Segment::Static, 0))
  }

  fn next_label_id(&mut self) -> usize {
    let id = self.label_count;
    self.label_count += 1;
    id
  }

  fn trace(&mut self, text: &str) {
    if self.options.trace {
      self.writer.write_comment(text);
    }
  }
}

/// Lightweight cursor over the tokenizer with grammar-level helpers.
struct TokenStream<'a> {
  tokenizer: Tokenizer,
  source: &'a str,
}

impl<'a> TokenStream<'a> {
  /// Position the cursor on the first token.
  fn new(source: &'a str) -> Self {
    let mut tokenizer = Tokenizer::new(source);
    tokenizer.advance();
    Self { tokenizer, source }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokenizer.current()
  }

  fn peek_symbol(&self) -> Option<char> {
    self.peek().and_then(Token::symbol)
  }

  fn peek_keyword(&self) -> Option<Keyword> {
    self.peek().and_then(Token::keyword)
  }

  fn advance(&mut self) {
    self.tokenizer.advance();
  }

  fn is_eof(&self) -> bool {
    self.peek().is_none()
  }

  /// Consume the current token if it is the given symbol.
  fn equal_symbol(&mut self, symbol: char) -> bool {
    if self.peek_symbol() == Some(symbol) {
      self.advance();
      return true;
    }
    false
  }

  /// Consume the current token if it is the given keyword.
  fn equal_keyword(&mut self, keyword: Keyword) -> bool {
    if self.peek_keyword() == Some(keyword) {
      self.advance();
      return true;
    }
    false
  }

  fn skip_symbol(&mut self, symbol: char) -> CompileResult<()> {
    if self.equal_symbol(symbol) {
      Ok(())
    } else {
      Err(self.expected(&format!("\"{symbol}\"")))
    }
  }

  fn skip_keyword(&mut self, keyword: Keyword) -> CompileResult<()> {
    if self.equal_keyword(keyword) {
      Ok(())
    } else {
      Err(self.expected(&format!("\"{}\"", keyword.as_str())))
    }
  }

  /// Consume an identifier, returning its text and line.
  fn get_ident(&mut self, what: &str) -> CompileResult<(String, usize)> {
    if let Some(token) = self.peek()
      && token.kind == TokenKind::Identifier
    {
      let ident = (token.lexeme.clone(), token.line);
      self.advance();
      return Ok(ident);
    }
    Err(self.expected(what))
  }

  /// Grammar violation at the current token: what was wanted vs. what is there.
  fn expected(&self, what: &str) -> CompileError {
    match self.peek() {
      Some(token) => CompileError::at(
        self.source,
        token.line,
        token.column,
        format!(
          "expected {what}, but got \"{}\"",
          describe_token(Some(token))
        ),
      ),
      None => CompileError::UnexpectedEof {
        expected: what.to_string(),
      },
    }
  }
}
