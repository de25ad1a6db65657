//! Syntax tree node definitions.
//!
//! One tagged union per syntactic category, so every dispatch in the parser
//! and the code generator is an exhaustive match. The tree is produced once
//! by the parser and never mutated afterwards.

/// `class Name { classVarDec* subroutineDec* }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Class {
  pub name: String,
  pub var_decs: Vec<ClassVarDec>,
  pub subroutines: Vec<SubroutineDec>,
}

/// `(static|field) type name (, name)* ;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassVarDec {
  pub kind: ClassVarKind,
  pub var_type: String,
  pub names: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassVarKind {
  Static,
  Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
  Constructor,
  Function,
  Method,
}

/// `(constructor|function|method) (type|void) name ( parameterList ) body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineDec {
  pub kind: SubroutineKind,
  pub return_type: String,
  pub name: String,
  pub parameters: Vec<Parameter>,
  pub body: SubroutineBody,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
  pub var_type: String,
  pub name: String,
}

/// `{ varDec* statements }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineBody {
  pub var_decs: Vec<VarDec>,
  pub statements: Vec<Statement>,
}

/// `var type name (, name)* ;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDec {
  pub var_type: String,
  pub names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
  /// `let name = expr ;` or `let name[index] = expr ;`
  Let {
    target: String,
    index: Option<Expression>,
    value: Expression,
  },
  /// `if ( cond ) { ... }` with an optional `else { ... }`
  If {
    condition: Expression,
    then_branch: Vec<Statement>,
    else_branch: Option<Vec<Statement>>,
  },
  /// `while ( cond ) { ... }`
  While {
    condition: Expression,
    body: Vec<Statement>,
  },
  /// `do call ;` – a call evaluated for its side effect only.
  Do(SubroutineCall),
  /// `return ;` or `return expr ;`
  Return(Option<Expression>),
}

/// One leading term plus an ordered tail of (operator, term) pairs,
/// evaluated strictly left to right with no precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
  pub term: Term,
  pub tail: Vec<(BinaryOp, Term)>,
}

impl Expression {
  pub fn single(term: Term) -> Self {
    Self {
      term,
      tail: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Sub,
  Mul,
  Div,
  Gt,
  Lt,
  Eq,
  And,
  Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
  Neg,
  Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordConstant {
  True,
  False,
  Null,
  This,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
  IntegerConstant(i32),
  StringConstant(String),
  KeywordConstant(KeywordConstant),
  /// A variable reference, optionally indexed: `x` or `x[expr]`.
  Var {
    name: String,
    index: Option<Box<Expression>>,
  },
  Unary {
    op: UnaryOp,
    term: Box<Term>,
  },
  Parenthesized(Box<Expression>),
  Call(SubroutineCall),
}

/// `[qualifier .] name ( arguments )` – the qualifier is an object variable
/// or a class name; which one is decided during code generation, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubroutineCall {
  pub qualifier: Option<String>,
  pub name: String,
  pub arguments: Vec<Expression>,
}
