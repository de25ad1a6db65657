//! Code generation: walk the class syntax tree and emit VM instructions.
//!
//! Depth-first tree walk over the parsed class, emitting one instruction
//! per line, append-only. Control flow never backpatches: every branch
//! target is a named label emitted at its definition point and resolved by
//! the downstream translator. The two label counters are never reset, so
//! label names stay unique across every class compiled by one writer, and
//! reruns over identical input reproduce identical names.

use crate::ast::*;
use crate::error::CompileResult;
use crate::symbols::{ClassScope, Scopes, SubroutineScope};

pub struct CodeWriter {
  if_label_counter: usize,
  while_label_counter: usize,
  class_name: String,
  code: Vec<String>,
}

impl CodeWriter {
  pub fn new() -> Self {
    Self {
      if_label_counter: 0,
      while_label_counter: 0,
      class_name: String::new(),
      code: Vec::new(),
    }
  }

  /// Generated instructions so far, one per line.
  pub fn code(&self) -> &[String] {
    &self.code
  }

  pub fn into_code(self) -> Vec<String> {
    self.code
  }

  fn emit(&mut self, line: impl Into<String>) {
    self.code.push(line.into());
  }

  /// Compile one class. Field and static indices are assigned once, before
  /// any subroutine is compiled; subroutines follow in declaration order,
  /// each with a fresh subroutine scope.
  pub fn write_class(&mut self, class: &Class) -> CompileResult<()> {
    let checkpoint = self.code.len();
    self.class_name = class.name.clone();
    let class_scope = ClassScope::build(class);
    for subroutine in &class.subroutines {
      if let Err(err) = self.write_subroutine(&class_scope, subroutine) {
        // A failed class leaves no partial output behind.
        self.code.truncate(checkpoint);
        return Err(err);
      }
    }
    Ok(())
  }

  fn write_subroutine(
    &mut self,
    class_scope: &ClassScope,
    subroutine: &SubroutineDec,
  ) -> CompileResult<()> {
    let locals_count: usize = subroutine
      .body
      .var_decs
      .iter()
      .map(|dec| dec.names.len())
      .sum();
    self.emit(format!(
      "function {}.{} {}",
      self.class_name, subroutine.name, locals_count
    ));
    match subroutine.kind {
      SubroutineKind::Constructor => {
        // Allocate storage sized to the field count and bind it as the
        // receiver before the body runs.
        self.emit(format!("push constant {}", class_scope.field_count()));
        self.emit("call Memory.alloc 1");
        self.emit("pop pointer 0");
      }
      SubroutineKind::Method => {
        // The calling convention passes the receiver as argument 0.
        self.emit("push argument 0");
        self.emit("pop pointer 0");
      }
      SubroutineKind::Function => {}
    }
    let subroutine_scope = SubroutineScope::build(&self.class_name, subroutine);
    let scopes = Scopes::new(class_scope, &subroutine_scope);
    self.write_statements(&subroutine.body.statements, &scopes)
  }

  fn write_statements(&mut self, statements: &[Statement], scopes: &Scopes) -> CompileResult<()> {
    for statement in statements {
      self.write_statement(statement, scopes)?;
    }
    Ok(())
  }

  fn write_statement(&mut self, statement: &Statement, scopes: &Scopes) -> CompileResult<()> {
    match statement {
      Statement::Let {
        target,
        index: None,
        value,
      } => {
        self.write_expression(value, scopes)?;
        let info = scopes.lookup(target)?;
        self.emit(format!("pop {} {}", info.kind.segment(), info.index));
        Ok(())
      }
      Statement::Let {
        target,
        index: Some(index),
        value,
      } => self.write_indexed_let(target, index, value, scopes),
      Statement::If {
        condition,
        then_branch,
        else_branch,
      } => self.write_if(condition, then_branch, else_branch.as_deref(), scopes),
      Statement::While { condition, body } => self.write_while(condition, body, scopes),
      Statement::Do(call) => {
        self.write_subroutine_call(call, scopes)?;
        // Every call leaves exactly one value on the stack, even when the
        // declared return type is void.
        self.emit("pop temp 0");
        Ok(())
      }
      Statement::Return(value) => self.write_return(value.as_ref(), scopes),
    }
  }

  /// `let target[index] = value;`
  ///
  /// The element address is computed first, then the right-hand side. The
  /// right-hand side may itself address an array through `pointer 1`, so
  /// the value is stashed in `temp 0` and the address restored only after
  /// the expression is fully evaluated.
  fn write_indexed_let(
    &mut self,
    target: &str,
    index: &Expression,
    value: &Expression,
    scopes: &Scopes,
  ) -> CompileResult<()> {
    self.write_element_address(target, index, scopes)?;
    self.write_expression(value, scopes)?;
    self.emit("pop temp 0");
    self.emit("pop pointer 1");
    self.emit("push temp 0");
    self.emit("pop that 0");
    Ok(())
  }

  /// Push the address of `name[index]`: the array's own value plus the
  /// evaluated index.
  fn write_element_address(
    &mut self,
    name: &str,
    index: &Expression,
    scopes: &Scopes,
  ) -> CompileResult<()> {
    let info = scopes.lookup(name)?;
    self.emit(format!("push {} {}", info.kind.segment(), info.index));
    self.write_expression(index, scopes)?;
    self.emit("add");
    Ok(())
  }

  fn write_if(
    &mut self,
    condition: &Expression,
    then_branch: &[Statement],
    else_branch: Option<&[Statement]>,
    scopes: &Scopes,
  ) -> CompileResult<()> {
    let counter = self.if_label_counter;
    self.if_label_counter += 1;
    let else_label = format!("if1Label{counter}");
    let end_label = format!("if2Label{counter}");

    self.write_expression(condition, scopes)?;
    self.emit("not");
    self.emit(format!("if-goto {else_label}"));
    self.write_statements(then_branch, scopes)?;
    match else_branch {
      None => self.emit(format!("label {else_label}")),
      Some(statements) => {
        self.emit(format!("goto {end_label}"));
        self.emit(format!("label {else_label}"));
        self.write_statements(statements, scopes)?;
        self.emit(format!("label {end_label}"));
      }
    }
    Ok(())
  }

  fn write_while(
    &mut self,
    condition: &Expression,
    body: &[Statement],
    scopes: &Scopes,
  ) -> CompileResult<()> {
    let counter = self.while_label_counter;
    self.while_label_counter += 1;
    let top_label = format!("while1Label{counter}");
    let end_label = format!("while2Label{counter}");

    self.emit(format!("label {top_label}"));
    self.write_expression(condition, scopes)?;
    self.emit("not");
    self.emit(format!("if-goto {end_label}"));
    self.write_statements(body, scopes)?;
    self.emit(format!("goto {top_label}"));
    self.emit(format!("label {end_label}"));
    Ok(())
  }

  fn write_return(&mut self, value: Option<&Expression>, scopes: &Scopes) -> CompileResult<()> {
    match value {
      // Every routine leaves exactly one stack value per the calling
      // convention, so a bare return still pushes something.
      None => self.emit("push constant 0"),
      Some(expression) if is_lone_this(expression) => self.emit("push pointer 0"),
      Some(expression) => self.write_expression(expression, scopes)?,
    }
    self.emit("return");
    Ok(())
  }

  /// Emit the first term, then each (operator, term) pair in order. The
  /// operators bind strictly left to right, exactly as written.
  fn write_expression(&mut self, expression: &Expression, scopes: &Scopes) -> CompileResult<()> {
    self.write_term(&expression.term, scopes)?;
    for (op, term) in &expression.tail {
      self.write_term(term, scopes)?;
      self.write_binary_op(*op);
    }
    Ok(())
  }

  fn write_binary_op(&mut self, op: BinaryOp) {
    // The target machine has no native multiply or divide.
    let instruction = match op {
      BinaryOp::Add => "add",
      BinaryOp::Sub => "sub",
      BinaryOp::Gt => "gt",
      BinaryOp::Lt => "lt",
      BinaryOp::Eq => "eq",
      BinaryOp::And => "and",
      BinaryOp::Or => "or",
      BinaryOp::Mul => "call Math.multiply 2",
      BinaryOp::Div => "call Math.divide 2",
    };
    self.emit(instruction);
  }

  fn write_term(&mut self, term: &Term, scopes: &Scopes) -> CompileResult<()> {
    match term {
      Term::IntegerConstant(value) => {
        self.emit(format!("push constant {value}"));
        Ok(())
      }
      Term::KeywordConstant(KeywordConstant::True) => {
        self.emit("push constant -1");
        Ok(())
      }
      Term::KeywordConstant(KeywordConstant::False | KeywordConstant::Null) => {
        self.emit("push constant 0");
        Ok(())
      }
      Term::KeywordConstant(KeywordConstant::This) => {
        self.emit("push pointer 0");
        Ok(())
      }
      Term::Var { name, index: None } => {
        let info = scopes.lookup(name)?;
        self.emit(format!("push {} {}", info.kind.segment(), info.index));
        Ok(())
      }
      Term::Var {
        name,
        index: Some(index),
      } => {
        self.write_element_address(name, index, scopes)?;
        self.emit("pop pointer 1");
        self.emit("push that 0");
        Ok(())
      }
      Term::Unary { op, term } => {
        self.write_term(term, scopes)?;
        self.emit(match op {
          UnaryOp::Neg => "neg",
          UnaryOp::Not => "not",
        });
        Ok(())
      }
      Term::Parenthesized(expression) => self.write_expression(expression, scopes),
      Term::Call(call) => self.write_subroutine_call(call, scopes),
      Term::StringConstant(text) => {
        self.write_string_constant(text);
        Ok(())
      }
    }
  }

  /// A string literal allocates a fresh string sized to its length, then
  /// appends each character code left to right; each append returns the
  /// string, leaving the new object as the term's result.
  fn write_string_constant(&mut self, text: &str) {
    self.emit(format!("push constant {}", text.chars().count()));
    self.emit("call String.new 1");
    for c in text.chars() {
      self.emit(format!("push constant {}", c as u32));
      self.emit("call String.appendChar 2");
    }
  }

  /// Three mutually exclusive call shapes, decided by a scope lookup on the
  /// qualifier rather than by static type information. A failed lookup is
  /// the signal that the qualifier names a class, not an error.
  fn write_subroutine_call(&mut self, call: &SubroutineCall, scopes: &Scopes) -> CompileResult<()> {
    let (target, receiver_pushed) = match &call.qualifier {
      None => {
        // Implicit call on the current receiver.
        self.emit("push pointer 0");
        (self.class_name.clone(), true)
      }
      Some(qualifier) => match scopes.try_lookup(qualifier) {
        Some(info) => {
          let line = format!("push {} {}", info.kind.segment(), info.index);
          let target = info.var_type.clone();
          self.emit(line);
          (target, true)
        }
        None => (qualifier.clone(), false),
      },
    };
    for argument in &call.arguments {
      self.write_expression(argument, scopes)?;
    }
    let arg_count = call.arguments.len() + usize::from(receiver_pushed);
    self.emit(format!("call {}.{} {}", target, call.name, arg_count));
    Ok(())
  }
}

impl Default for CodeWriter {
  fn default() -> Self {
    Self::new()
  }
}

fn is_lone_this(expression: &Expression) -> bool {
  expression.tail.is_empty() && expression.term == Term::KeywordConstant(KeywordConstant::This)
}
