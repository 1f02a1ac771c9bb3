//! VM code emission.
//!
//! `VmWriter` is a formatter and nothing more: every method appends exactly
//! one newline-terminated instruction line to the output buffer. It keeps no
//! knowledge of what it has written.

use std::fmt;

/// Named address spaces addressed by `push`/`pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
  Constant,
  Local,
  Argument,
  This,
  That,
  Temp,
  Pointer,
  Static,
}

impl fmt::Display for Segment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Segment::Constant => "constant",
      Segment::Local => "local",
      Segment::Argument => "argument",
      Segment::This => "this",
      Segment::That => "that",
      Segment::Temp => "temp",
      Segment::Pointer => "pointer",
      Segment::Static => "static",
    };
    f.write_str(name)
  }
}

/// Stack arithmetic and logic commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
  Add,
  Sub,
  Neg,
  Eq,
  Gt,
  Lt,
  And,
  Or,
  Not,
}

impl fmt::Display for Command {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Command::Add => "add",
      Command::Sub => "sub",
      Command::Neg => "neg",
      Command::Eq => "eq",
      Command::Gt => "gt",
      Command::Lt => "lt",
      Command::And => "and",
      Command::Or => "or",
      Command::Not => "not",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Default)]
pub struct VmWriter {
  code: String,
}

impl VmWriter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn write_push(&mut self, segment: Segment, index: usize) {
    self.code.push_str(&format!("push {segment} {index}\n"));
  }

  pub fn write_pop(&mut self, segment: Segment, index: usize) {
    self.code.push_str(&format!("pop {segment} {index}\n"));
  }

  pub fn write_arithmetic(&mut self, command: Command) {
    self.code.push_str(&format!("{command}\n"));
  }

  pub fn write_label(&mut self, label: &str) {
    self.code.push_str(&format!("label {label}\n"));
  }

  pub fn write_goto(&mut self, label: &str) {
    self.code.push_str(&format!("goto {label}\n"));
  }

  pub fn write_if(&mut self, label: &str) {
    self.code.push_str(&format!("if-goto {label}\n"));
  }

  pub fn write_call(&mut self, name: &str, n_args: usize) {
    self.code.push_str(&format!("call {name} {n_args}\n"));
  }

  pub fn write_function(&mut self, name: &str, n_locals: usize) {
    self.code.push_str(&format!("function {name} {n_locals}\n"));
  }

  pub fn write_return(&mut self) {
    self.code.push_str("return\n");
  }

  /// Traceability only; the downstream translator skips these lines.
  pub fn write_comment(&mut self, text: &str) {
    self.code.push_str(&format!("// {text}\n"));
  }

  pub fn as_str(&self) -> &str {
    &self.code
  }

  pub fn finish(self) -> String {
    self.code
  }
}
