//! Two-scope symbol table.
//!
//! Class scope holds `static` and `field` variables for the whole class;
//! subroutine scope holds `argument` and `local` variables and is wiped at the
//! start of every subroutine. Lookups try the subroutine scope first, so a
//! local declaration shadows a class-level one of the same name.

use std::collections::HashMap;
use std::fmt;

use crate::vm_writer::Segment;

/// Symbol category; decides both the VM segment and the counter space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
  Static,
  Field,
  Argument,
  Local,
}

impl Kind {
  pub fn segment(self) -> Segment {
    match self {
      Kind::Static => Segment::Static,
      Kind::Field => Segment::This,
      Kind::Argument => Segment::Argument,
      Kind::Local => Segment::Local,
    }
  }

  fn is_class_scope(self) -> bool {
    matches!(self, Kind::Static | Kind::Field)
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Kind::Static => "static",
      Kind::Field => "field",
      Kind::Argument => "argument",
      Kind::Local => "local",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
  /// Declared type: a primitive keyword or a class name.
  pub ty: String,
  pub kind: Kind,
  pub index: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
  class_scope: HashMap<String, Symbol>,
  subroutine_scope: HashMap<String, Symbol>,
  counts: HashMap<Kind, usize>,
}

impl SymbolTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Drop every argument and local binding and restart their numbering.
  pub fn start_subroutine(&mut self) {
    self.subroutine_scope.clear();
    self.counts.remove(&Kind::Argument);
    self.counts.remove(&Kind::Local);
  }

  /// Bind `name` at the next free index of `kind`.
  ///
  /// Redefining a name in the same scope rebinds it but still consumes a new
  /// index, so indices stay dense in declaration order.
  pub fn define(&mut self, name: &str, ty: &str, kind: Kind) {
    let counter = self.counts.entry(kind).or_default();
    let symbol = Symbol {
      ty: ty.to_string(),
      kind,
      index: *counter,
    };
    *counter += 1;

    let scope = if kind.is_class_scope() {
      &mut self.class_scope
    } else {
      &mut self.subroutine_scope
    };
    scope.insert(name.to_string(), symbol);
  }

  pub fn var_count(&self, kind: Kind) -> usize {
    self.counts.get(&kind).copied().unwrap_or(0)
  }

  /// Resolve `name`, subroutine scope first. `None` means unresolved.
  pub fn lookup(&self, name: &str) -> Option<&Symbol> {
    self
      .subroutine_scope
      .get(name)
      .or_else(|| self.class_scope.get(name))
  }

  pub fn kind_of(&self, name: &str) -> Option<Kind> {
    self.lookup(name).map(|symbol| symbol.kind)
  }

  pub fn type_of(&self, name: &str) -> Option<&str> {
    self.lookup(name).map(|symbol| symbol.ty.as_str())
  }

  pub fn index_of(&self, name: &str) -> Option<usize> {
    self.lookup(name).map(|symbol| symbol.index)
  }
}
