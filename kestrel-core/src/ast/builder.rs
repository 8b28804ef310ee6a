//! Node construction helpers
//!
//! Shorthand constructors used by the desugaring passes and by tests that
//! assemble trees directly instead of going through a parser.

use super::{
    Declarator, Element, ExportNamedDecl, ExportSpecifier, Expr, Function, ImportDecl,
    ImportSpecifier, Intrinsic, Literal, MemberProp, Program, Stmt, VarDecl, VarKind,
};

pub fn program(body: Vec<Stmt>) -> Program {
    Program::new(body)
}

pub fn ident(name: impl Into<String>) -> Expr {
    Expr::Ident(name.into())
}

pub fn null() -> Expr {
    Expr::Literal(Literal::Null)
}

pub fn number(value: f64) -> Expr {
    Expr::Literal(Literal::Number(value))
}

pub fn string(value: impl Into<String>) -> Expr {
    Expr::Literal(Literal::String(value.into()))
}

pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::Array(elements.into_iter().map(Element::Expr).collect())
}

pub fn array_elements(elements: Vec<Element>) -> Expr {
    Expr::Array(elements)
}

pub fn spread(argument: Expr) -> Element {
    Element::Spread(argument)
}

pub fn member(object: Expr, property: impl Into<String>) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: Box::new(MemberProp::Ident(property.into())),
    }
}

pub fn member_computed(object: Expr, property: Expr) -> Expr {
    Expr::Member {
        object: Box::new(object),
        property: Box::new(MemberProp::Computed(property)),
    }
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args: args.into_iter().map(Element::Expr).collect(),
    }
}

pub fn call_elements(callee: Expr, args: Vec<Element>) -> Expr {
    Expr::Call {
        callee: Box::new(callee),
        args,
    }
}

pub fn intrinsic(kind: Intrinsic, args: Vec<Expr>) -> Expr {
    Expr::Intrinsic { kind, args }
}

pub fn assign(target: Expr, value: Expr) -> Expr {
    Expr::Assign {
        target: Box::new(target),
        value: Box::new(value),
    }
}

pub fn function_expr(function: Function) -> Expr {
    Expr::Function(Box::new(function))
}

pub fn arrow(params: Vec<String>, body: Vec<Stmt>) -> Expr {
    Expr::Arrow(Box::new(Function::new(None, params, body)))
}

pub fn yield_expr(argument: Expr) -> Expr {
    Expr::Yield {
        argument: Some(Box::new(argument)),
        delegate: false,
    }
}

pub fn yield_delegate(argument: Expr) -> Expr {
    Expr::Yield {
        argument: Some(Box::new(argument)),
        delegate: true,
    }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(expr)
}

pub fn var_decl(kind: VarKind, id: impl Into<String>, init: Option<Expr>) -> Stmt {
    Stmt::VarDecl(VarDecl {
        kind,
        declarations: vec![Declarator {
            id: id.into(),
            init,
        }],
    })
}

pub fn let_decl(id: impl Into<String>, init: Option<Expr>) -> Stmt {
    var_decl(VarKind::Let, id, init)
}

pub fn function_decl(name: impl Into<String>, params: Vec<String>, body: Vec<Stmt>) -> Stmt {
    Stmt::FunctionDecl(Box::new(Function::new(Some(name.into()), params, body)))
}

pub fn generator_decl(name: impl Into<String>, params: Vec<String>, body: Vec<Stmt>) -> Stmt {
    let mut f = Function::new(Some(name.into()), params, body);
    f.generator = true;
    Stmt::FunctionDecl(Box::new(f))
}

pub fn return_stmt(argument: Option<Expr>) -> Stmt {
    Stmt::Return(argument)
}

pub fn block(body: Vec<Stmt>) -> Stmt {
    Stmt::Block(body)
}

pub fn for_of(binding: VarDecl, iterable: Expr, body: Stmt) -> Stmt {
    Stmt::ForOf {
        binding,
        iterable,
        body: Box::new(body),
    }
}

pub fn import(specifiers: Vec<(&str, Option<&str>)>, source: Expr) -> Stmt {
    Stmt::Import(ImportDecl {
        specifiers: specifiers
            .into_iter()
            .map(|(local, imported)| ImportSpecifier {
                local: local.to_string(),
                imported: imported.map(str::to_string),
            })
            .collect(),
        source,
        source_path: None,
    })
}

pub fn export_decl(declaration: Stmt) -> Stmt {
    Stmt::ExportNamed(ExportNamedDecl {
        declaration: Some(Box::new(declaration)),
        specifiers: Vec::new(),
        source: None,
        source_path: None,
    })
}

pub fn export_specifiers(specifiers: Vec<(&str, &str)>, source: Option<Expr>) -> Stmt {
    Stmt::ExportNamed(ExportNamedDecl {
        declaration: None,
        specifiers: specifiers
            .into_iter()
            .map(|(local, exported)| ExportSpecifier {
                local: local.to_string(),
                exported: exported.to_string(),
            })
            .collect(),
        source,
        source_path: None,
    })
}

pub fn export_default(expr: Expr) -> Stmt {
    Stmt::ExportDefault(expr)
}
