//! Spread desugaring
//!
//! Rewrites spread elements in array literals and call argument lists:
//!
//! ```text
//! [1, 2, ...foo, 3, 4]      =>  %arrayFromSpread([1, 2], foo, [3, 4])
//! o.f(1, 2, ...foo)         =>  o.f.apply(o, %arrayFromSpread([1, 2], foo))
//! g(...foo)                 =>  g.apply(null, %arrayFromSpread(foo))
//! ```
//!
//! Maximal runs of non-spread elements become array-literal segments; each
//! spread contributes its bare target. If every segment ends up a plain
//! array literal, the segments are spliced into one literal and the
//! intrinsic is dropped entirely. A call argument that is already an
//! `%arrayFromSpread` call (produced by array desugaring below it) has its
//! segments spliced into the outer intrinsic instead of nesting.

use crate::ast::builder::{intrinsic, member, null};
use crate::ast::{Element, Expr, Intrinsic};
use crate::passes::fold::{walk_expr, Fold};
use crate::passes::PassError;

/// Desugars spread elements in arrays and calls
#[derive(Debug, Default)]
pub struct DesugarSpread;

impl DesugarSpread {
    pub fn new() -> Self {
        Self
    }
}

fn has_spread(elements: &[Element]) -> bool {
    elements.iter().any(|e| matches!(e, Element::Spread(_)))
}

/// Split elements into segments: array literals for runs of plain
/// elements, bare targets for spreads. With `flatten_inner`, an element
/// that is already an `%arrayFromSpread` call contributes its segments
/// directly.
fn partition(elements: Vec<Element>, flatten_inner: bool) -> Vec<Expr> {
    fn flush(run: &mut Vec<Element>, segments: &mut Vec<Expr>) {
        if !run.is_empty() {
            segments.push(Expr::Array(std::mem::take(run)));
        }
    }

    let mut segments: Vec<Expr> = Vec::new();
    let mut run: Vec<Element> = Vec::new();

    for element in elements {
        match element {
            Element::Expr(Expr::Intrinsic {
                kind: Intrinsic::ArrayFromSpread,
                args,
            }) if flatten_inner => {
                flush(&mut run, &mut segments);
                segments.extend(args);
            }
            Element::Spread(target) => {
                flush(&mut run, &mut segments);
                segments.push(target);
            }
            plain => run.push(plain),
        }
    }
    flush(&mut run, &mut segments);
    segments
}

/// If every segment is a plain array literal, splice their elements into
/// one list; otherwise give the segments back for the intrinsic form.
fn splice_if_all_arrays(segments: Vec<Expr>) -> Result<Vec<Element>, Vec<Expr>> {
    if segments.iter().all(|s| matches!(s, Expr::Array(_))) {
        let mut spliced = Vec::new();
        for segment in segments {
            if let Expr::Array(elements) = segment {
                spliced.extend(elements);
            }
        }
        Ok(spliced)
    } else {
        Err(segments)
    }
}

impl Fold for DesugarSpread {
    fn fold_expr(&mut self, expr: Expr) -> Result<Expr, PassError> {
        let expr = walk_expr(self, expr)?;
        Ok(match expr {
            Expr::Array(elements) if has_spread(&elements) => {
                match splice_if_all_arrays(partition(elements, false)) {
                    Ok(spliced) => Expr::Array(spliced),
                    Err(segments) => intrinsic(Intrinsic::ArrayFromSpread, segments),
                }
            }
            Expr::Call { callee, args } if has_spread(&args) => {
                match splice_if_all_arrays(partition(args, true)) {
                    Ok(spliced) => Expr::Call {
                        callee,
                        args: spliced,
                    },
                    Err(segments) => {
                        // keep the receiver for member callees so the
                        // call-site binding is unchanged
                        let receiver = match callee.as_ref() {
                            Expr::Member { object, .. } => (**object).clone(),
                            _ => null(),
                        };
                        Expr::Call {
                            callee: Box::new(member(*callee, "apply")),
                            args: vec![
                                Element::Expr(receiver),
                                Element::Expr(intrinsic(Intrinsic::ArrayFromSpread, segments)),
                            ],
                        }
                    }
                }
            }
            other => other,
        })
    }
}
