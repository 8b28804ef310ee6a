//! Generator desugaring
//!
//! Rewrites every generator function
//!
//! ```text
//! function* foo() {
//!   yield 1;
//!   yield* rest();
//! }
//! ```
//!
//! into a plain function that builds a generator handle from a closure
//! over the original body and returns it:
//!
//! ```text
//! function foo() {
//!   let %_gen_0 = %makeGenerator(() => {
//!     %generatorYield(%_gen_0, 1);
//!     for (let %_yield_0 of rest()) { %generatorYield(%_gen_0, %_yield_0); }
//!   });
//!   return %_gen_0;
//! }
//! ```
//!
//! The body closure is an arrow so the receiver binding of the enclosing
//! function survives. Handle identifiers carry the `%` prefix, which the
//! parser cannot produce, so they cannot collide with user identifiers.

use crate::ast::builder::{arrow, ident, intrinsic, let_decl, return_stmt};
use crate::ast::{Declarator, Expr, Function, Intrinsic, Stmt, VarDecl, VarKind};
use crate::passes::fold::{walk_expr, walk_function, walk_stmt, Fold};
use crate::passes::PassError;

/// Desugars generator functions and their `yield` expressions
#[derive(Debug, Default)]
pub struct DesugarGenerators {
    /// Innermost-last stack of enclosing generator handle names
    handles: Vec<String>,
    gen_counter: u32,
    yield_counter: u32,
}

impl DesugarGenerators {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_handle(&mut self) -> String {
        let n = self.gen_counter;
        self.gen_counter += 1;
        format!("%_gen_{n}")
    }

    fn fresh_yield_temp(&mut self) -> String {
        let n = self.yield_counter;
        self.yield_counter += 1;
        format!("%_yield_{n}")
    }

    fn current_handle(&self) -> Result<String, PassError> {
        self.handles
            .last()
            .cloned()
            .ok_or_else(|| PassError::unsupported("yield", "yield outside a generator function"))
    }
}

impl Fold for DesugarGenerators {
    fn fold_function(&mut self, function: Function) -> Result<Function, PassError> {
        let is_generator = function.generator;
        if is_generator {
            let handle = self.fresh_handle();
            self.handles.push(handle);
        }

        let mut function = walk_function(self, function)?;

        if is_generator {
            if let Some(handle) = self.handles.pop() {
                let original_body = std::mem::take(&mut function.body);
                function.body = vec![
                    let_decl(
                        handle.clone(),
                        Some(intrinsic(
                            Intrinsic::MakeGenerator,
                            vec![arrow(Vec::new(), original_body)],
                        )),
                    ),
                    return_stmt(Some(ident(handle))),
                ];
                function.generator = false;
            }
        }
        Ok(function)
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Result<Stmt, PassError> {
        match stmt {
            // yield* in statement position becomes an iteration that yields
            // each produced value individually, in source order
            Stmt::Expr(Expr::Yield {
                argument,
                delegate: true,
            }) => {
                let argument = argument
                    .map(|e| self.fold_expr(*e))
                    .transpose()?
                    .ok_or_else(|| {
                        PassError::unsupported("yield", "delegating yield requires an argument")
                    })?;
                let handle = self.current_handle()?;
                let temp = self.fresh_yield_temp();

                Ok(Stmt::ForOf {
                    binding: VarDecl {
                        kind: VarKind::Let,
                        declarations: vec![Declarator {
                            id: temp.clone(),
                            init: None,
                        }],
                    },
                    iterable: argument,
                    body: Box::new(Stmt::Block(vec![Stmt::Expr(intrinsic(
                        Intrinsic::GeneratorYield,
                        vec![ident(handle), ident(temp)],
                    ))])),
                })
            }
            other => walk_stmt(self, other),
        }
    }

    fn fold_expr(&mut self, expr: Expr) -> Result<Expr, PassError> {
        match expr {
            Expr::Yield { delegate: true, .. } => Err(PassError::unsupported(
                "yield",
                "delegating yield is only supported in statement position",
            )),
            Expr::Yield {
                argument,
                delegate: false,
            } => {
                let argument = argument.map(|e| self.fold_expr(*e)).transpose()?;
                let handle = self.current_handle()?;
                let mut args = vec![ident(handle)];
                args.extend(argument);
                Ok(intrinsic(Intrinsic::GeneratorYield, args))
            }
            other => walk_expr(self, other),
        }
    }
}
