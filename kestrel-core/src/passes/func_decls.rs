//! Function-declaration normalization
//!
//! Converts every function declaration below module top level into a
//! variable declaration binding a named function expression:
//!
//! ```text
//! function foo() { }   =>   var foo = function foo() { }
//! ```
//!
//! Top-level declarations keep their declaration form (only their bodies
//! are processed), since downstream code generation relies on top-level
//! hoisting.

use crate::ast::{Declarator, Expr, Program, Stmt, VarDecl, VarKind};
use crate::passes::fold::{walk_stmt, Fold};
use crate::passes::PassError;

/// Rewrites nested function declarations to `var` bindings
#[derive(Debug, Default)]
pub struct FuncDeclsToVars;

impl FuncDeclsToVars {
    pub fn new() -> Self {
        Self
    }
}

impl Fold for FuncDeclsToVars {
    fn fold_program(&mut self, program: Program) -> Result<Program, PassError> {
        let body = program
            .body
            .into_iter()
            .map(|stmt| match stmt {
                // top-level declarations stay declarations
                Stmt::FunctionDecl(function) => {
                    Ok(Stmt::FunctionDecl(Box::new(self.fold_function(*function)?)))
                }
                other => self.fold_stmt(other),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Program { body })
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Result<Stmt, PassError> {
        match stmt {
            Stmt::FunctionDecl(function) => {
                let function = self.fold_function(*function)?;
                let name = function.id.clone().ok_or_else(|| {
                    PassError::unsupported("function declaration", "declaration without a name")
                })?;
                Ok(Stmt::VarDecl(VarDecl {
                    kind: VarKind::Var,
                    declarations: vec![Declarator {
                        id: name,
                        init: Some(Expr::Function(Box::new(function))),
                    }],
                }))
            }
            other => walk_stmt(self, other),
        }
    }
}
