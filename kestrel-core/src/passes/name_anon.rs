//! Anonymous-function naming
//!
//! Attaches a diagnostic display name to every anonymous function
//! expression assigned to a target:
//!
//! ```text
//! handlers.onClose = function () { }
//! ```
//!
//! gets `display_name = "handlers.onClose"`. The name is rendered from the
//! assignment target and has no effect on program semantics; it only
//! surfaces in backtraces and debug output.

use crate::ast::print;
use crate::ast::Expr;
use crate::passes::fold::{walk_expr, Fold};
use crate::passes::PassError;

/// Names anonymous function expressions after their assignment targets
#[derive(Debug, Default)]
pub struct NameAnonymousFunctions;

impl NameAnonymousFunctions {
    pub fn new() -> Self {
        Self
    }
}

impl Fold for NameAnonymousFunctions {
    fn fold_expr(&mut self, expr: Expr) -> Result<Expr, PassError> {
        let expr = walk_expr(self, expr)?;
        Ok(match expr {
            Expr::Assign { target, mut value } => {
                if let Expr::Function(func) = value.as_mut() {
                    if func.id.is_none() && func.display_name.is_none() {
                        func.display_name = Some(print::render(&target));
                    }
                }
                Expr::Assign { target, value }
            }
            other => other,
        })
    }
}
