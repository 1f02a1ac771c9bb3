use std::path::PathBuf;
use std::thread;

use jackc::{CompileError, CompileOptions, compile, compile_file, compile_with, tokens_xml};

const AVERAGE: &str = include_str!("fixtures/Average.jack");
const COUNTER: &str = include_str!("fixtures/Counter.jack");

fn fixture(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// VM code that builds a string constant.
fn string_code(text: &str) -> String {
  let mut code = format!("push constant {}\ncall String.new 1\n", text.chars().count());
  for c in text.chars() {
    code.push_str(&format!("push constant {}\ncall String.appendChar 2\n", c as u32));
  }
  code
}

#[test]
fn average_program() {
  let expected = [
    "function Main.main 4\n".to_string(),
    string_code("How many numbers? "),
    "call Keyboard.readInt 1\n\
     pop local 1\n\
     push local 1\n\
     call Array.new 1\n\
     pop local 0\n\
     push constant 0\n\
     pop local 2\n\
     label WHILE_EXP0\n\
     push local 2\n\
     push local 1\n\
     lt\n\
     not\n\
     if-goto WHILE_END0\n\
     push local 0\n\
     push local 2\n\
     add\n"
      .to_string(),
    string_code("Enter a number: "),
    "call Keyboard.readInt 1\n\
     pop temp 0\n\
     pop pointer 1\n\
     push temp 0\n\
     pop that 0\n\
     push local 3\n\
     push local 0\n\
     push local 2\n\
     add\n\
     pop pointer 1\n\
     push that 0\n\
     add\n\
     pop local 3\n\
     push local 2\n\
     push constant 1\n\
     add\n\
     pop local 2\n\
     goto WHILE_EXP0\n\
     label WHILE_END0\n"
      .to_string(),
    string_code("The average is "),
    "call Output.printString 1\n\
     pop temp 0\n\
     push local 3\n\
     push local 1\n\
     call Math.divide 2\n\
     call Output.printInt 1\n\
     pop temp 0\n\
     push constant 0\n\
     return\n"
      .to_string(),
  ]
  .concat();

  assert_eq!(compile(AVERAGE).unwrap(), expected);
}

#[test]
fn counter_class() {
  let expected = "\
function Counter.new 0
push constant 3
call Memory.alloc 1
pop pointer 0
push argument 0
pop this 1
push constant 0
pop this 0
push static 0
push constant 1
add
pop static 0
push pointer 0
return
function Counter.step 0
push argument 0
pop pointer 0
push this 0
push argument 1
add
push this 1
gt
if-goto IF_TRUE0
goto IF_FALSE0
label IF_TRUE0
push this 1
pop this 0
push constant 0
return
goto IF_END0
label IF_FALSE0
push this 0
push argument 1
add
pop this 0
label IF_END0
push constant 0
not
return
function Counter.chain 0
push argument 0
pop pointer 0
push argument 1
pop this 2
push this 2
push constant 1
call Counter.step 2
pop temp 0
push pointer 0
call Counter.reset 1
pop temp 0
push constant 0
return
function Counter.reset 0
push argument 0
pop pointer 0
push constant 0
pop this 0
push constant 0
return
function Counter.count 0
push static 0
return
";
  let compiled = compile_with(COUNTER, &CompileOptions::default()).unwrap();
  assert_eq!(compiled.code, expected);
  assert!(compiled.unresolved.is_empty());
}

#[test]
fn compiling_twice_is_byte_identical() {
  for source in [AVERAGE, COUNTER] {
    assert_eq!(compile(source).unwrap(), compile(source).unwrap());
  }
}

#[test]
fn parallel_units_match_sequential_output() {
  let sequential = [compile(AVERAGE).unwrap(), compile(COUNTER).unwrap()];
  let parallel = thread::scope(|scope| {
    let average = scope.spawn(|| compile(AVERAGE));
    let counter = scope.spawn(|| compile(COUNTER));
    [average.join(), counter.join()]
  });
  for (expected, joined) in sequential.iter().zip(parallel) {
    let code = joined.expect("compiler thread panicked").unwrap();
    assert_eq!(&code, expected);
  }
}

#[test]
fn do_on_field_calls_declared_type() {
  let code = compile(
    "class Game {
       field Runner obj;
       method void tick() { do obj.run(3); return; }
     }",
  )
  .unwrap();
  assert!(code.contains("push this 0\npush constant 3\ncall Runner.run 2\npop temp 0\n"));
}

#[test]
fn two_ifs_never_share_labels() {
  let code = compile(
    "class M {
       function void f(int a) {
         if (a) { let a = 1; }
         if (a) { let a = 2; } else { let a = 3; }
         return;
       }
     }",
  )
  .unwrap();
  let labels: Vec<&str> = code
    .lines()
    .filter_map(|line| line.strip_prefix("label "))
    .collect();
  assert_eq!(
    labels,
    ["IF_TRUE0", "IF_FALSE0", "IF_END0", "IF_TRUE1", "IF_FALSE1", "IF_END1"]
  );
}

#[test]
fn return_in_void_subroutine() {
  let code = compile("class M { method void f() { return; } }").unwrap();
  assert!(code.ends_with("push constant 0\nreturn\n"));
}

#[test]
fn compile_file_reads_from_disk() {
  let compiled = compile_file(fixture("Counter.jack"), &CompileOptions::default()).unwrap();
  assert_eq!(compiled.code, compile(COUNTER).unwrap());
}

#[test]
fn missing_file_is_a_read_error() {
  let err = compile_file(fixture("Missing.jack"), &CompileOptions::default()).unwrap_err();
  assert!(matches!(err, CompileError::ReadSource { .. }));
  assert!(err.to_string().contains("Missing.jack"));
}

#[test]
fn grammar_errors_abort_the_unit() {
  let err = compile("class M { function void f() { let = 1; return; } }").unwrap_err();
  assert!(
    err
      .to_string()
      .ends_with("expected a variable name, but got \"=\"")
  );
}

#[test]
fn token_listing_of_fixture() {
  let xml = tokens_xml(AVERAGE);
  let mut lines = xml.lines();
  assert_eq!(lines.next(), Some("<tokens>"));
  assert_eq!(lines.next(), Some("<keyword>class</keyword>"));
  assert_eq!(lines.next(), Some("<identifier>Main</identifier>"));
  assert_eq!(lines.next(), Some("<symbol>{</symbol>"));
  assert!(xml.contains("<stringConstant>How many numbers? </stringConstant>\n"));
  assert!(xml.contains("<symbol>&lt;</symbol>\n"));
  assert!(xml.ends_with("</tokens>\n"));
}
