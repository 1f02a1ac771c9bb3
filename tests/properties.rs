//! Property-based tests for the tokenizer and the compilation pipeline.
//!
//! - Tokenizing or compiling arbitrary text never panics.
//! - Compilation is deterministic.
//! - Every control-flow statement gets labels no other statement uses.

use jackc::tokenizer::{SYMBOLS, TokenKind, tokenize};
use jackc::{compile, tokens_xml};
use proptest::prelude::*;

/// Generate small integer expressions over the locals `a` and `b`.
fn arb_expression() -> impl Strategy<Value = String> {
  let leaf = prop_oneof![
    (0u16..32768).prop_map(|n| n.to_string()),
    Just("a".to_string()),
    Just("b".to_string()),
    Just("true".to_string()),
  ];
  leaf.prop_recursive(4, 24, 2, |inner| {
    prop_oneof![
      (inner.clone(), "[-+*/&|<>=]", inner.clone())
        .prop_map(|(lhs, op, rhs)| format!("{lhs} {op} {rhs}")),
      inner.clone().prop_map(|e| format!("({e})")),
      inner.prop_map(|e| format!("-({e})")),
    ]
  })
}

/// A sequence of `if`/`while`/`let` statements.
fn arb_statements() -> impl Strategy<Value = Vec<(u8, String)>> {
  prop::collection::vec((0u8..3, arb_expression()), 0..12)
}

fn render_class(statements: &[(u8, String)]) -> String {
  let mut body = String::new();
  for (kind, expr) in statements {
    let statement = match kind {
      0 => format!("if ({expr}) {{ let a = 1; }} else {{ let b = 2; }}\n"),
      1 => format!("while ({expr}) {{ let a = a - 1; }}\n"),
      _ => format!("let a = {expr};\n"),
    };
    body.push_str(&statement);
  }
  format!("class P {{ function void run() {{ var int a, b;\n{body} return; }} }}")
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(200))]

  #[test]
  fn tokenizer_never_panics(source in "\\PC*") {
    let tokens = tokenize(&source);
    let xml = tokens_xml(&source);
    prop_assert_eq!(xml.lines().count(), tokens.len() + 2);
  }

  #[test]
  fn symbols_are_single_characters(source in "[a-z0-9{}()\\[\\].,;+*&|<>=~ -]*") {
    for token in tokenize(&source) {
      if token.kind == TokenKind::Symbol {
        prop_assert_eq!(token.lexeme.chars().count(), 1);
        prop_assert!(SYMBOLS.contains(token.lexeme.as_str()));
      }
    }
  }

  #[test]
  fn compile_never_panics(source in "\\PC*") {
    let _ = compile(&source);
  }

  #[test]
  fn compile_is_deterministic(statements in arb_statements()) {
    let source = render_class(&statements);
    let first = compile(&source);
    let second = compile(&source);
    prop_assert!(first.is_ok(), "generated program failed: {:?}", first);
    prop_assert_eq!(first.ok(), second.ok());
  }

  #[test]
  fn labels_are_unique(statements in arb_statements()) {
    let source = render_class(&statements);
    let code = compile(&source).unwrap();
    let mut labels: Vec<&str> = code
      .lines()
      .filter_map(|line| line.strip_prefix("label "))
      .collect();
    let expected: usize = statements
      .iter()
      .map(|(kind, _)| match kind {
        0 => 3,
        1 => 2,
        _ => 0,
      })
      .sum();
    prop_assert_eq!(labels.len(), expected);
    labels.sort_unstable();
    labels.dedup();
    prop_assert_eq!(labels.len(), expected);
  }
}
