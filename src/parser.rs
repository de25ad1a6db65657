//! Recursive-descent parser producing the typed class syntax tree.
//!
//! One function per grammar production. Lookahead is explicit and bounded:
//! the statement list dispatches on a single peeked token, and an
//! identifier at term position is decided to be a subroutine call or a
//! variable reference by peeking the token after it. Any mismatch aborts
//! the whole parse; there is no resynchronization.

use crate::ast::*;
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind};

/// Parse a token vector holding exactly one class definition.
pub fn parse_class(tokens: Vec<Token>) -> CompileResult<Class> {
  let mut stream = TokenStream::new(tokens);
  let class = read_class(&mut stream)?;
  if stream.peek().is_some() {
    return Err(CompileError::syntax("end of input", stream.found()));
  }
  Ok(class)
}

/// class = `class` Identifier `{` ClassVarDec* SubroutineDec* `}`
fn read_class(stream: &mut TokenStream) -> CompileResult<Class> {
  stream.expect("class")?;
  let name = stream.expect_identifier()?;
  stream.expect("{")?;
  let var_decs = read_class_var_decs(stream)?;
  let subroutines = read_subroutine_decs(stream)?;
  stream.expect("}")?;
  Ok(Class {
    name,
    var_decs,
    subroutines,
  })
}

/// ClassVarDec = (`static`|`field`) Type Identifier (`,` Identifier)* `;`
///
/// The list ends, without consuming, at the first token that is neither
/// `static` nor `field`.
fn read_class_var_decs(stream: &mut TokenStream) -> CompileResult<Vec<ClassVarDec>> {
  let mut decs = Vec::new();
  loop {
    let kind = match stream.peek() {
      Some(token) if token.is("static") => ClassVarKind::Static,
      Some(token) if token.is("field") => ClassVarKind::Field,
      _ => return Ok(decs),
    };
    stream.advance();
    let var_type = read_type(stream)?;
    let names = read_delimited_names(stream)?;
    stream.expect(";")?;
    decs.push(ClassVarDec {
      kind,
      var_type,
      names,
    });
  }
}

fn read_subroutine_decs(stream: &mut TokenStream) -> CompileResult<Vec<SubroutineDec>> {
  let mut decs = Vec::new();
  loop {
    let kind = match stream.peek() {
      Some(token) if token.is("constructor") => SubroutineKind::Constructor,
      Some(token) if token.is("function") => SubroutineKind::Function,
      Some(token) if token.is("method") => SubroutineKind::Method,
      _ => return Ok(decs),
    };
    stream.advance();
    let return_type = read_return_type(stream)?;
    let name = stream.expect_identifier()?;
    stream.expect("(")?;
    let parameters = read_parameter_list(stream)?;
    stream.expect(")")?;
    let body = read_subroutine_body(stream)?;
    decs.push(SubroutineDec {
      kind,
      return_type,
      name,
      parameters,
      body,
    });
  }
}

/// Type = `int` | `char` | `boolean` | class name. Types are kept as their
/// token text; resolution to storage happens during code generation.
fn read_type(stream: &mut TokenStream) -> CompileResult<String> {
  match stream.peek() {
    Some(token)
      if token.kind == TokenKind::Identifier
        || matches!(token.text.as_str(), "int" | "char" | "boolean") =>
    {
      Ok(stream.advance_text())
    }
    _ => Err(CompileError::syntax("a type name", stream.found())),
  }
}

fn read_return_type(stream: &mut TokenStream) -> CompileResult<String> {
  match stream.peek() {
    Some(token) if token.is("void") => Ok(stream.advance_text()),
    _ => read_type(stream),
  }
}

fn read_delimited_names(stream: &mut TokenStream) -> CompileResult<Vec<String>> {
  let mut names = vec![stream.expect_identifier()?];
  loop {
    match stream.peek() {
      Some(token) if token.is(",") => {
        stream.advance();
        names.push(stream.expect_identifier()?);
      }
      _ => return Ok(names),
    }
  }
}

/// ParameterList = ((Type Identifier) (`,` Type Identifier)*)?
///
/// Ends before the closing `)`, which the caller consumes.
fn read_parameter_list(stream: &mut TokenStream) -> CompileResult<Vec<Parameter>> {
  let mut parameters = Vec::new();
  if let Some(token) = stream.peek()
    && token.is(")")
  {
    return Ok(parameters);
  }
  loop {
    let var_type = read_type(stream)?;
    let name = stream.expect_identifier()?;
    parameters.push(Parameter { var_type, name });
    match stream.peek() {
      Some(token) if token.is(",") => {
        stream.advance();
      }
      _ => return Ok(parameters),
    }
  }
}

fn read_subroutine_body(stream: &mut TokenStream) -> CompileResult<SubroutineBody> {
  stream.expect("{")?;
  let var_decs = read_var_decs(stream)?;
  let statements = read_statements(stream)?;
  stream.expect("}")?;
  Ok(SubroutineBody {
    var_decs,
    statements,
  })
}

fn read_var_decs(stream: &mut TokenStream) -> CompileResult<Vec<VarDec>> {
  let mut decs = Vec::new();
  loop {
    match stream.peek() {
      Some(token) if token.is("var") => {
        stream.advance();
        let var_type = read_type(stream)?;
        let names = read_delimited_names(stream)?;
        stream.expect(";")?;
        decs.push(VarDec { var_type, names });
      }
      _ => return Ok(decs),
    }
  }
}

/// Statements are read by peeking the next token's text and branching; the
/// list ends, without consuming, at the first token outside the statement
/// keyword set.
fn read_statements(stream: &mut TokenStream) -> CompileResult<Vec<Statement>> {
  let mut statements = Vec::new();
  loop {
    let Some(token) = stream.peek() else {
      return Ok(statements);
    };
    let statement = match token.text.as_str() {
      "return" => read_return_statement(stream)?,
      "do" => read_do_statement(stream)?,
      "let" => read_let_statement(stream)?,
      "if" => read_if_statement(stream)?,
      "while" => read_while_statement(stream)?,
      _ => return Ok(statements),
    };
    statements.push(statement);
  }
}

fn read_let_statement(stream: &mut TokenStream) -> CompileResult<Statement> {
  stream.expect("let")?;
  let target = stream.expect_identifier()?;
  let index = read_indexing(stream)?;
  stream.expect("=")?;
  let value = read_expression(stream)?;
  stream.expect(";")?;
  Ok(Statement::Let {
    target,
    index,
    value,
  })
}

fn read_if_statement(stream: &mut TokenStream) -> CompileResult<Statement> {
  stream.expect("if")?;
  stream.expect("(")?;
  let condition = read_expression(stream)?;
  stream.expect(")")?;
  stream.expect("{")?;
  let then_branch = read_statements(stream)?;
  stream.expect("}")?;
  let else_branch = match stream.peek() {
    Some(token) if token.is("else") => {
      stream.advance();
      stream.expect("{")?;
      let statements = read_statements(stream)?;
      stream.expect("}")?;
      Some(statements)
    }
    _ => None,
  };
  Ok(Statement::If {
    condition,
    then_branch,
    else_branch,
  })
}

fn read_while_statement(stream: &mut TokenStream) -> CompileResult<Statement> {
  stream.expect("while")?;
  stream.expect("(")?;
  let condition = read_expression(stream)?;
  stream.expect(")")?;
  stream.expect("{")?;
  let body = read_statements(stream)?;
  stream.expect("}")?;
  Ok(Statement::While { condition, body })
}

fn read_do_statement(stream: &mut TokenStream) -> CompileResult<Statement> {
  stream.expect("do")?;
  let call = read_subroutine_call(stream)?;
  stream.expect(";")?;
  Ok(Statement::Do(call))
}

fn read_return_statement(stream: &mut TokenStream) -> CompileResult<Statement> {
  stream.expect("return")?;
  let value = match stream.peek() {
    Some(token) if token.is(";") => None,
    _ => Some(read_expression(stream)?),
  };
  stream.expect(";")?;
  Ok(Statement::Return(value))
}

/// Expression = Term ((op) Term)*
///
/// The tail ends, without consuming, at `;`, `)`, `]` or `,`. Anything else
/// in tail position must be a binary operator.
fn read_expression(stream: &mut TokenStream) -> CompileResult<Expression> {
  let term = read_term(stream)?;
  let mut tail = Vec::new();
  loop {
    match stream.peek() {
      None => return Ok(Expression { term, tail }),
      Some(token) if matches!(token.text.as_str(), ";" | ")" | "]" | ",") => {
        return Ok(Expression { term, tail });
      }
      _ => {}
    }
    let op = read_binary_op(stream)?;
    let rhs = read_term(stream)?;
    tail.push((op, rhs));
  }
}

fn read_binary_op(stream: &mut TokenStream) -> CompileResult<BinaryOp> {
  let op = match stream.peek().map(|token| token.text.as_str()) {
    Some("+") => BinaryOp::Add,
    Some("-") => BinaryOp::Sub,
    Some("*") => BinaryOp::Mul,
    Some("/") => BinaryOp::Div,
    Some(">") => BinaryOp::Gt,
    Some("<") => BinaryOp::Lt,
    Some("=") => BinaryOp::Eq,
    Some("&") => BinaryOp::And,
    Some("|") => BinaryOp::Or,
    _ => return Err(CompileError::syntax("a binary operator", stream.found())),
  };
  stream.advance();
  Ok(op)
}

/// Term = unary-op Term | `(` Expression `)` | literal | variable reference
/// with optional index | subroutine call.
///
/// An identifier is a call exactly when the token after it is `.` or `(`;
/// both lookahead tokens stay in place for the production that reads them.
fn read_term(stream: &mut TokenStream) -> CompileResult<Term> {
  let Some(token) = stream.peek().cloned() else {
    return Err(CompileError::syntax("a term", stream.found()));
  };
  match token.kind {
    TokenKind::IntegerConstant => {
      stream.advance();
      let value = token
        .text
        .parse::<i32>()
        .map_err(|_| CompileError::lex(format!("integer constant '{}' is out of range", token.text)))?;
      Ok(Term::IntegerConstant(value))
    }
    TokenKind::StringConstant => {
      stream.advance();
      Ok(Term::StringConstant(token.text))
    }
    TokenKind::Keyword => {
      let constant = match token.text.as_str() {
        "true" => KeywordConstant::True,
        "false" => KeywordConstant::False,
        "null" => KeywordConstant::Null,
        "this" => KeywordConstant::This,
        _ => return Err(CompileError::unrecognized(token.to_string())),
      };
      stream.advance();
      Ok(Term::KeywordConstant(constant))
    }
    TokenKind::Identifier => {
      let is_call = matches!(stream.peek_second(), Some(second) if second.is(".") || second.is("("));
      if is_call {
        Ok(Term::Call(read_subroutine_call(stream)?))
      } else {
        stream.advance();
        let index = read_indexing(stream)?;
        Ok(Term::Var {
          name: token.text,
          index: index.map(Box::new),
        })
      }
    }
    TokenKind::Symbol => match token.text.as_str() {
      "-" => {
        stream.advance();
        Ok(Term::Unary {
          op: UnaryOp::Neg,
          term: Box::new(read_term(stream)?),
        })
      }
      "~" => {
        stream.advance();
        Ok(Term::Unary {
          op: UnaryOp::Not,
          term: Box::new(read_term(stream)?),
        })
      }
      "(" => {
        stream.advance();
        let inner = read_expression(stream)?;
        stream.expect(")")?;
        Ok(Term::Parenthesized(Box::new(inner)))
      }
      _ => Err(CompileError::unrecognized(token.to_string())),
    },
  }
}

/// Optional `[` Expression `]` suffix on a variable reference.
fn read_indexing(stream: &mut TokenStream) -> CompileResult<Option<Expression>> {
  match stream.peek() {
    Some(token) if token.is("[") => {
      stream.advance();
      let index = read_expression(stream)?;
      stream.expect("]")?;
      Ok(Some(index))
    }
    _ => Ok(None),
  }
}

/// SubroutineCall = [Identifier `.`] Identifier `(` ExpressionList `)`
fn read_subroutine_call(stream: &mut TokenStream) -> CompileResult<SubroutineCall> {
  let first = stream.expect_identifier()?;
  let (qualifier, name) = match stream.peek() {
    Some(token) if token.is(".") => {
      stream.advance();
      (Some(first), stream.expect_identifier()?)
    }
    _ => (None, first),
  };
  stream.expect("(")?;
  let arguments = read_expression_list(stream)?;
  stream.expect(")")?;
  Ok(SubroutineCall {
    qualifier,
    name,
    arguments,
  })
}

fn read_expression_list(stream: &mut TokenStream) -> CompileResult<Vec<Expression>> {
  let mut expressions = Vec::new();
  if let Some(token) = stream.peek()
    && token.is(")")
  {
    return Ok(expressions);
  }
  loop {
    expressions.push(read_expression(stream)?);
    match stream.peek() {
      Some(token) if token.is(",") => {
        stream.advance();
      }
      _ => return Ok(expressions),
    }
  }
}

/// Lightweight cursor over the pre-tokenized input. Lookahead depth is
/// bounded at two tokens and explicit at every call site.
struct TokenStream {
  tokens: Vec<Token>,
  pos: usize,
}

impl TokenStream {
  fn new(tokens: Vec<Token>) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  fn peek_second(&self) -> Option<&Token> {
    self.tokens.get(self.pos + 1)
  }

  /// Consume and discard the current token.
  fn advance(&mut self) {
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
  }

  /// Consume the current token and take its text. Only called after a
  /// successful peek.
  fn advance_text(&mut self) -> String {
    let text = self
      .tokens
      .get(self.pos)
      .map(|token| token.text.clone())
      .unwrap_or_default();
    self.advance();
    text
  }

  /// Human-friendly description of the current position for diagnostics.
  fn found(&self) -> String {
    match self.peek() {
      Some(token) => token.to_string(),
      None => "end of input".to_string(),
    }
  }

  /// Consume the current token if it is exactly the given literal.
  fn expect(&mut self, literal: &str) -> CompileResult<()> {
    match self.peek() {
      Some(token) if token.is(literal) => {
        self.advance();
        Ok(())
      }
      _ => Err(CompileError::syntax(format!("'{literal}'"), self.found())),
    }
  }

  /// Consume the current token if it is an identifier, returning its text.
  fn expect_identifier(&mut self) -> CompileResult<String> {
    match self.peek() {
      Some(token) if token.kind == TokenKind::Identifier => Ok(self.advance_text()),
      _ => Err(CompileError::syntax("an identifier", self.found())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn stream(source: &str) -> TokenStream {
    TokenStream::new(tokenize(source).unwrap())
  }

  fn statements(source: &str) -> Vec<Statement> {
    read_statements(&mut stream(source)).unwrap()
  }

  fn term(source: &str) -> Term {
    read_term(&mut stream(source)).unwrap()
  }

  #[test]
  fn parses_return_with_value() {
    let parsed = statements("return 42;");
    assert_eq!(
      parsed,
      vec![Statement::Return(Some(Expression::single(
        Term::IntegerConstant(42)
      )))]
    );
  }

  #[test]
  fn statement_list_stops_without_consuming() {
    let mut s = stream("return; } let");
    let parsed = read_statements(&mut s).unwrap();
    assert_eq!(parsed, vec![Statement::Return(None)]);
    assert!(s.peek().unwrap().is("}"));
  }

  #[test]
  fn negative_literal_is_a_unary_term() {
    assert_eq!(
      term("-42"),
      Term::Unary {
        op: UnaryOp::Neg,
        term: Box::new(Term::IntegerConstant(42)),
      }
    );
  }

  #[test]
  fn not_of_parenthesized_call() {
    let parsed = term("~(C.m())");
    let Term::Unary {
      op: UnaryOp::Not,
      term: inner,
    } = parsed
    else {
      panic!("expected a unary term, got {parsed:?}");
    };
    let Term::Parenthesized(expression) = *inner else {
      panic!("expected a parenthesized term");
    };
    assert_eq!(
      expression.term,
      Term::Call(SubroutineCall {
        qualifier: Some("C".to_string()),
        name: "m".to_string(),
        arguments: vec![],
      })
    );
  }

  #[test]
  fn identifier_followed_by_paren_is_a_call() {
    assert_eq!(
      term("f(a)"),
      Term::Call(SubroutineCall {
        qualifier: None,
        name: "f".to_string(),
        arguments: vec![Expression::single(Term::Var {
          name: "a".to_string(),
          index: None,
        })],
      })
    );
  }

  #[test]
  fn bare_identifier_is_a_variable_reference() {
    assert_eq!(
      term("x;"),
      Term::Var {
        name: "x".to_string(),
        index: None,
      }
    );
  }

  #[test]
  fn indexed_identifier_is_a_variable_reference() {
    assert_eq!(
      term("x[1]"),
      Term::Var {
        name: "x".to_string(),
        index: Some(Box::new(Expression::single(Term::IntegerConstant(1)))),
      }
    );
  }

  #[test]
  fn expression_tail_is_flat_and_ordered() {
    let expression = read_expression(&mut stream("1+2*3;")).unwrap();
    assert_eq!(expression.term, Term::IntegerConstant(1));
    assert_eq!(
      expression.tail,
      vec![
        (BinaryOp::Add, Term::IntegerConstant(2)),
        (BinaryOp::Mul, Term::IntegerConstant(3)),
      ]
    );
  }

  #[test]
  fn parses_let_with_index() {
    let parsed = statements("let x[1] = 2;");
    assert_eq!(
      parsed,
      vec![Statement::Let {
        target: "x".to_string(),
        index: Some(Expression::single(Term::IntegerConstant(1))),
        value: Expression::single(Term::IntegerConstant(2)),
      }]
    );
  }

  #[test]
  fn parses_if_with_else() {
    let parsed = statements("if (true) { } else { return; }");
    assert_eq!(
      parsed,
      vec![Statement::If {
        condition: Expression::single(Term::KeywordConstant(KeywordConstant::True)),
        then_branch: vec![],
        else_branch: Some(vec![Statement::Return(None)]),
      }]
    );
  }

  #[test]
  fn parses_class_with_vars_and_subroutine() {
    let class = parse_class(
      tokenize("class X { field int a, b; static boolean c; method void m() { return; } }")
        .unwrap(),
    )
    .unwrap();
    assert_eq!(class.name, "X");
    assert_eq!(class.var_decs.len(), 2);
    assert_eq!(class.var_decs[0].names, ["a", "b"]);
    assert_eq!(class.var_decs[1].kind, ClassVarKind::Static);
    assert_eq!(class.subroutines.len(), 1);
    assert_eq!(class.subroutines[0].kind, SubroutineKind::Method);
  }

  #[test]
  fn parses_parameter_list() {
    let parameters = read_parameter_list(&mut stream("int x, MyClass y)")).unwrap();
    assert_eq!(
      parameters,
      vec![
        Parameter {
          var_type: "int".to_string(),
          name: "x".to_string(),
        },
        Parameter {
          var_type: "MyClass".to_string(),
          name: "y".to_string(),
        },
      ]
    );
  }

  #[test]
  fn rejects_missing_expected_token() {
    let err = read_statements(&mut stream("let x 2;")).unwrap_err();
    let CompileError::Syntax { expected, found } = err else {
      panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(expected, "'='");
    assert_eq!(found, "integer constant '2'");
  }

  #[test]
  fn rejects_non_operator_in_tail_position() {
    let err = read_expression(&mut stream("1 2;")).unwrap_err();
    let CompileError::Syntax { expected, found } = err else {
      panic!("expected a syntax error, got {err:?}");
    };
    assert_eq!(expected, "a binary operator");
    assert_eq!(found, "integer constant '2'");
  }

  #[test]
  fn rejects_statement_keyword_at_term_position() {
    let err = read_term(&mut stream("var")).unwrap_err();
    assert!(matches!(err, CompileError::UnrecognizedConstruct { .. }));
  }

  #[test]
  fn rejects_tokens_after_the_class() {
    let err = parse_class(tokenize("class X { } }").unwrap()).unwrap_err();
    assert!(matches!(err, CompileError::Syntax { .. }));
  }
}
