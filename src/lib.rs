//! Crate root: wires together the Jack-to-VM compilation pipeline.
//!
//! The stages are small and composable:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `symbol_table` tracks class- and subroutine-scope variables.
//! - `engine` parses one class and emits VM code in the same pass.
//! - `vm_writer` formats individual VM instructions.
//! - `error` centralises reporting utilities shared by the other modules.
//!
//! One call compiles one class. Engines share no state, so separate classes
//! can be compiled on separate threads.

pub mod engine;
pub mod error;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

use std::fs;
use std::path::Path;

use snafu::ResultExt;

pub use engine::{CompilationEngine, CompileOptions, Compiled, UnresolvedName};
pub use error::{CompileError, CompileResult};
pub use tokenizer::tokens_xml;

/// Compile the source of one class into VM code with default options.
pub fn compile(source: &str) -> CompileResult<String> {
  compile_with(source, &CompileOptions::default()).map(|compiled| compiled.code)
}

/// Compile the source of one class, reporting unresolved-name fallbacks.
pub fn compile_with(source: &str, options: &CompileOptions) -> CompileResult<Compiled> {
  let mut engine = CompilationEngine::new(source, options.clone());
  engine.compile_class()?;
  Ok(engine.finish())
}

/// Read a source file from disk.
pub fn read_source(path: &Path) -> CompileResult<String> {
  fs::read_to_string(path).context(error::ReadSourceSnafu {
    path: path.to_path_buf(),
  })
}

/// Compile the class stored in `path`.
pub fn compile_file(path: impl AsRef<Path>, options: &CompileOptions) -> CompileResult<Compiled> {
  let source = read_source(path.as_ref())?;
  compile_with(&source, options)
}
