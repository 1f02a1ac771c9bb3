use std::path::{Path, PathBuf};
use std::process;

use jackc::{CompileError, CompileOptions};
use palc::{Parser, Subcommand};

#[derive(Parser)]
#[command(
  name = "jackc",
  after_long_help = "Compiles one Jack class to VM code; the VM translator is a separate tool."
)]
struct Cli {
  #[command(subcommand)]
  mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
  /// Compile a class and print its VM code
  Compile {
    path: PathBuf,
    /// Precede each statement's code with a comment line
    #[arg(long)]
    trace: bool,
    /// Reject names that resolve in neither scope
    #[arg(long)]
    strict: bool,
  },
  /// Print the token stream as XML
  Tokens { path: PathBuf },
}

fn main() {
  let (path, result) = match Cli::parse().mode {
    Mode::Compile {
      path,
      trace,
      strict,
    } => {
      let options = CompileOptions {
        trace,
        strict_symbols: strict,
      };
      let result = compile(&path, &options);
      (path, result)
    }
    Mode::Tokens { path } => {
      let result = jackc::read_source(&path).map(|source| print!("{}", jackc::tokens_xml(&source)));
      (path, result)
    }
  };

  if let Err(err) = result {
    eprintln!("{}: {err}", path.display());
    process::exit(1);
  }
}

fn compile(path: &Path, options: &CompileOptions) -> Result<(), CompileError> {
  let compiled = jackc::compile_file(path, options)?;
  for unresolved in &compiled.unresolved {
    eprintln!(
      "warning: {}:{}: `{}` resolves in neither scope; addressed as static 0",
      path.display(),
      unresolved.line,
      unresolved.name
    );
  }
  print!("{}", compiled.code);
  Ok(())
}
