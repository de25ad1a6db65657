//! Shared error utilities used across the compilation pipeline.
//!
//! Every stage fails fast: a lexical fault aborts tokenizing, a grammar
//! fault aborts parsing, an unresolved name aborts code generation. None of
//! these are recovered locally and no partial VM code is emitted for a
//! class that failed to compile.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  /// A word the scanner could not classify: a numeral with trailing
  /// letters, or a string constant missing its closing quote.
  #[snafu(display("lexical error: {message}"))]
  Lex { message: String },

  /// An expected token was not found at the current position.
  #[snafu(display("syntax error: expected {expected}, but got {found}"))]
  Syntax { expected: String, found: String },

  /// A variable reference that resolves in neither the subroutine scope
  /// nor the class scope.
  #[snafu(display("undefined variable '{name}'"))]
  UndefinedVariable { name: String },

  /// A term or statement matching none of the known syntactic shapes.
  #[snafu(display("unrecognized construct: {found}"))]
  UnrecognizedConstruct { found: String },
}

impl CompileError {
  pub fn lex(message: impl Into<String>) -> Self {
    Self::Lex {
      message: message.into(),
    }
  }

  pub fn syntax(expected: impl Into<String>, found: impl Into<String>) -> Self {
    Self::Syntax {
      expected: expected.into(),
      found: found.into(),
    }
  }

  pub fn undefined_variable(name: impl Into<String>) -> Self {
    Self::UndefinedVariable { name: name.into() }
  }

  pub fn unrecognized(found: impl Into<String>) -> Self {
    Self::UnrecognizedConstruct {
      found: found.into(),
    }
  }
}
