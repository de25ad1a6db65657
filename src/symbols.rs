//! Symbol scopes: map declared names to virtual-machine storage locations.
//!
//! Two nested levels. The class scope is built once per class and lives for
//! the whole compilation of that class; the subroutine scope is rebuilt
//! fresh for every subroutine. Both are plain values handed to the code
//! generator by reference, so their lifetimes are visible at the call site.

use crate::ast::{Class, ClassVarKind, SubroutineDec, SubroutineKind};
use crate::error::{CompileError, CompileResult};
use std::collections::HashMap;

/// Storage segment a variable lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
  Static,
  Field,
  Argument,
  Local,
}

impl VarKind {
  /// VM segment name used in `push`/`pop` instructions. Fields live in the
  /// `this` segment, addressed through the receiver pointer.
  pub fn segment(self) -> &'static str {
    match self {
      VarKind::Static => "static",
      VarKind::Field => "this",
      VarKind::Argument => "argument",
      VarKind::Local => "local",
    }
  }
}

/// Resolved storage of one declared name: segment kind, dense zero-based
/// index within that segment and scope, and the declared type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarInfo {
  pub kind: VarKind,
  pub index: usize,
  pub var_type: String,
}

/// Class-level scope: `static` and `field` declarations, indexed densely
/// and independently in declaration order.
#[derive(Debug, Default)]
pub struct ClassScope {
  by_name: HashMap<String, VarInfo>,
  field_count: usize,
}

impl ClassScope {
  pub fn build(class: &Class) -> Self {
    let mut by_name = HashMap::new();
    let mut static_counter = 0;
    let mut field_counter = 0;
    for dec in &class.var_decs {
      for name in &dec.names {
        let (kind, counter) = match dec.kind {
          ClassVarKind::Static => (VarKind::Static, &mut static_counter),
          ClassVarKind::Field => (VarKind::Field, &mut field_counter),
        };
        by_name.insert(
          name.clone(),
          VarInfo {
            kind,
            index: *counter,
            var_type: dec.var_type.clone(),
          },
        );
        *counter += 1;
      }
    }
    Self {
      by_name,
      field_count: field_counter,
    }
  }

  /// Number of `field` variables; a constructor allocates this many words.
  pub fn field_count(&self) -> usize {
    self.field_count
  }

  pub fn get(&self, name: &str) -> Option<&VarInfo> {
    self.by_name.get(name)
  }
}

/// Subroutine-level scope: arguments and locals. For an instance method,
/// argument 0 is pre-bound to the receiver (`this`) before the declared
/// parameters are numbered.
#[derive(Debug, Default)]
pub struct SubroutineScope {
  by_name: HashMap<String, VarInfo>,
}

impl SubroutineScope {
  pub fn build(class_name: &str, subroutine: &SubroutineDec) -> Self {
    let mut by_name = HashMap::new();
    let mut argument_counter = 0;
    if subroutine.kind == SubroutineKind::Method {
      by_name.insert(
        "this".to_string(),
        VarInfo {
          kind: VarKind::Argument,
          index: argument_counter,
          var_type: class_name.to_string(),
        },
      );
      argument_counter += 1;
    }
    for parameter in &subroutine.parameters {
      by_name.insert(
        parameter.name.clone(),
        VarInfo {
          kind: VarKind::Argument,
          index: argument_counter,
          var_type: parameter.var_type.clone(),
        },
      );
      argument_counter += 1;
    }
    let mut local_counter = 0;
    for dec in &subroutine.body.var_decs {
      for name in &dec.names {
        by_name.insert(
          name.clone(),
          VarInfo {
            kind: VarKind::Local,
            index: local_counter,
            var_type: dec.var_type.clone(),
          },
        );
        local_counter += 1;
      }
    }
    Self { by_name }
  }

  pub fn get(&self, name: &str) -> Option<&VarInfo> {
    self.by_name.get(name)
  }
}

/// The pair of scopes visible while generating one subroutine's body.
pub struct Scopes<'a> {
  pub class: &'a ClassScope,
  pub subroutine: &'a SubroutineScope,
}

impl<'a> Scopes<'a> {
  pub fn new(class: &'a ClassScope, subroutine: &'a SubroutineScope) -> Self {
    Self { class, subroutine }
  }

  /// Benign lookup: subroutine scope first, then class scope. Used where a
  /// failed resolution is a signal rather than a fault, e.g. deciding
  /// whether a call qualifier names an object or a class.
  pub fn try_lookup(&self, name: &str) -> Option<&VarInfo> {
    self.subroutine.get(name).or_else(|| self.class.get(name))
  }

  /// Hard lookup: absence from both scopes is a compile error.
  pub fn lookup(&self, name: &str) -> CompileResult<&VarInfo> {
    self
      .try_lookup(name)
      .ok_or_else(|| CompileError::undefined_variable(name))
  }
}
