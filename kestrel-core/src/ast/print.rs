//! Minimal expression rendering
//!
//! Produces a compact textual form of an expression, used to derive
//! diagnostic display names for anonymous functions from their assignment
//! targets. This is not a code generator; output is best-effort and only
//! needs to be recognizable to a human reading a backtrace.

use super::{Element, Expr, Literal, MemberProp};

/// Render an expression to a short display string
pub fn render(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Literal(lit) => lit.to_string(),
        Expr::Member { object, property } => match property.as_ref() {
            MemberProp::Ident(name) => format!("{}.{}", render(object), name),
            MemberProp::Computed(index) => format!("{}[{}]", render(object), render(index)),
        },
        Expr::Call { callee, args } => {
            let args: Vec<String> = args.iter().map(render_element).collect();
            format!("{}({})", render(callee), args.join(", "))
        }
        Expr::Assign { target, value } => format!("{} = {}", render(target), render(value)),
        Expr::Intrinsic { kind, args } => {
            let args: Vec<String> = args.iter().map(render).collect();
            format!("{}({})", kind.as_str(), args.join(", "))
        }
        Expr::Array(elements) => {
            let elements: Vec<String> = elements.iter().map(render_element).collect();
            format!("[{}]", elements.join(", "))
        }
        Expr::Function(f) | Expr::Arrow(f) => match &f.id {
            Some(id) => format!("function {id}"),
            None => "function".to_string(),
        },
        Expr::Yield { .. } => "yield".to_string(),
        Expr::Binary { .. } => "(expr)".to_string(),
    }
}

fn render_element(element: &Element) -> String {
    match element {
        Element::Expr(e) => render(e),
        Element::Spread(e) => format!("...{}", render(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builder::*;

    #[test]
    fn test_render_ident() {
        assert_eq!(render(&ident("foo")), "foo");
    }

    #[test]
    fn test_render_member_chain() {
        let e = member(member(ident("module"), "exports"), "handler");
        assert_eq!(render(&e), "module.exports.handler");
    }

    #[test]
    fn test_render_computed_member() {
        let e = member_computed(ident("handlers"), number(3.0));
        assert_eq!(render(&e), "handlers[3]");
    }

    #[test]
    fn test_render_string_literal() {
        assert_eq!(render(&string("hi")), "\"hi\"");
    }
}
