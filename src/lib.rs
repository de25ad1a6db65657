//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns a typed class tree.
//! - `symbols` maps declared names to VM storage locations at the class and
//!   subroutine scope levels.
//! - `codegen` lowers the tree into stack-machine instructions.
//! - `error` centralises reporting utilities shared by the other modules.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod parser;
pub mod symbols;
pub mod tokenizer;

pub use codegen::CodeWriter;
pub use error::{CompileError, CompileResult};

/// Compile the source text of one class into VM instruction lines.
pub fn compile(source: &str) -> CompileResult<Vec<String>> {
  let mut writer = CodeWriter::new();
  compile_with(&mut writer, source)?;
  Ok(writer.into_code())
}

/// Compile one class with an existing writer. Reusing a writer across
/// classes keeps its label counters running, so labels stay unique over the
/// whole run.
pub fn compile_with(writer: &mut CodeWriter, source: &str) -> CompileResult<()> {
  let tokens = tokenizer::tokenize(source)?;
  let class = parser::parse_class(tokens)?;
  writer.write_class(&class)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn compiles_a_class_end_to_end() {
    let code = compile(
      "class Main {\n\
       // entry point\n\
       function int main() {\n\
       var int x;\n\
       let x = 2 + 3;\n\
       return x;\n\
       } }",
    )
    .unwrap();
    assert_eq!(
      code,
      [
        "function Main.main 1",
        "push constant 2",
        "push constant 3",
        "add",
        "pop local 0",
        "push local 0",
        "return",
      ]
    );
  }

  #[test]
  fn compilation_is_deterministic() {
    let source = "class A { function void f() { if (true) { } return; } }";
    assert_eq!(compile(source).unwrap(), compile(source).unwrap());
  }

  #[test]
  fn a_failed_class_emits_nothing() {
    let mut writer = CodeWriter::new();
    let result = compile_with(
      &mut writer,
      "class A { function void f() { let missing = 1; return; } }",
    );
    assert!(result.is_err());
    assert!(writer.code().is_empty());
  }
}
