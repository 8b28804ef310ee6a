//! Tree-rewrite engine
//!
//! [`Fold`] has one method per node kind, each defaulting to the matching
//! `walk_*` function, which recurses structurally and rebuilds the node
//! unchanged. A pass overrides only the node kinds it rewrites; everything
//! else recurses through the defaults. Nodes are taken and returned by
//! value, so a pass owns the tree for the duration of its run.

use crate::ast::{
    Declarator, Element, ExportNamedDecl, Expr, Function, ImportDecl, MemberProp, Program, Stmt,
    VarDecl,
};
use crate::passes::PassError;

/// A tree-to-tree rewrite with default structural recursion
pub trait Fold: Sized {
    fn fold_program(&mut self, program: Program) -> Result<Program, PassError> {
        walk_program(self, program)
    }

    fn fold_stmt(&mut self, stmt: Stmt) -> Result<Stmt, PassError> {
        walk_stmt(self, stmt)
    }

    fn fold_expr(&mut self, expr: Expr) -> Result<Expr, PassError> {
        walk_expr(self, expr)
    }

    fn fold_element(&mut self, element: Element) -> Result<Element, PassError> {
        walk_element(self, element)
    }

    fn fold_function(&mut self, function: Function) -> Result<Function, PassError> {
        walk_function(self, function)
    }

    fn fold_var_decl(&mut self, decl: VarDecl) -> Result<VarDecl, PassError> {
        walk_var_decl(self, decl)
    }
}

pub fn walk_program<F: Fold>(f: &mut F, program: Program) -> Result<Program, PassError> {
    let body = fold_stmts(f, program.body)?;
    Ok(Program { body })
}

pub fn fold_stmts<F: Fold>(f: &mut F, stmts: Vec<Stmt>) -> Result<Vec<Stmt>, PassError> {
    stmts.into_iter().map(|s| f.fold_stmt(s)).collect()
}

pub fn walk_stmt<F: Fold>(f: &mut F, stmt: Stmt) -> Result<Stmt, PassError> {
    Ok(match stmt {
        Stmt::Expr(e) => Stmt::Expr(f.fold_expr(e)?),
        Stmt::VarDecl(d) => Stmt::VarDecl(f.fold_var_decl(d)?),
        Stmt::FunctionDecl(func) => Stmt::FunctionDecl(Box::new(f.fold_function(*func)?)),
        Stmt::Return(arg) => Stmt::Return(arg.map(|e| f.fold_expr(e)).transpose()?),
        Stmt::Block(body) => Stmt::Block(fold_stmts(f, body)?),
        Stmt::If {
            test,
            consequent,
            alternate,
        } => Stmt::If {
            test: f.fold_expr(test)?,
            consequent: Box::new(f.fold_stmt(*consequent)?),
            alternate: alternate
                .map(|s| f.fold_stmt(*s).map(Box::new))
                .transpose()?,
        },
        Stmt::While { test, body } => Stmt::While {
            test: f.fold_expr(test)?,
            body: Box::new(f.fold_stmt(*body)?),
        },
        Stmt::ForOf {
            binding,
            iterable,
            body,
        } => Stmt::ForOf {
            binding: f.fold_var_decl(binding)?,
            iterable: f.fold_expr(iterable)?,
            body: Box::new(f.fold_stmt(*body)?),
        },
        Stmt::Import(decl) => Stmt::Import(walk_import(f, decl)?),
        Stmt::ExportNamed(decl) => Stmt::ExportNamed(walk_export(f, decl)?),
        Stmt::ExportDefault(e) => Stmt::ExportDefault(f.fold_expr(e)?),
    })
}

pub fn walk_expr<F: Fold>(f: &mut F, expr: Expr) -> Result<Expr, PassError> {
    Ok(match expr {
        Expr::Ident(_) | Expr::Literal(_) => expr,
        Expr::Array(elements) => Expr::Array(fold_elements(f, elements)?),
        Expr::Member { object, property } => Expr::Member {
            object: Box::new(f.fold_expr(*object)?),
            property: Box::new(match *property {
                MemberProp::Ident(name) => MemberProp::Ident(name),
                MemberProp::Computed(e) => MemberProp::Computed(f.fold_expr(e)?),
            }),
        },
        Expr::Call { callee, args } => Expr::Call {
            callee: Box::new(f.fold_expr(*callee)?),
            args: fold_elements(f, args)?,
        },
        Expr::Intrinsic { kind, args } => Expr::Intrinsic {
            kind,
            args: args
                .into_iter()
                .map(|e| f.fold_expr(e))
                .collect::<Result<_, _>>()?,
        },
        Expr::Assign { target, value } => Expr::Assign {
            target: Box::new(f.fold_expr(*target)?),
            value: Box::new(f.fold_expr(*value)?),
        },
        Expr::Binary { op, left, right } => Expr::Binary {
            op,
            left: Box::new(f.fold_expr(*left)?),
            right: Box::new(f.fold_expr(*right)?),
        },
        Expr::Function(func) => Expr::Function(Box::new(f.fold_function(*func)?)),
        Expr::Arrow(func) => Expr::Arrow(Box::new(f.fold_function(*func)?)),
        Expr::Yield { argument, delegate } => Expr::Yield {
            argument: argument.map(|e| f.fold_expr(*e).map(Box::new)).transpose()?,
            delegate,
        },
    })
}

pub fn fold_elements<F: Fold>(f: &mut F, elements: Vec<Element>) -> Result<Vec<Element>, PassError> {
    elements.into_iter().map(|e| f.fold_element(e)).collect()
}

pub fn walk_element<F: Fold>(f: &mut F, element: Element) -> Result<Element, PassError> {
    Ok(match element {
        Element::Expr(e) => Element::Expr(f.fold_expr(e)?),
        Element::Spread(e) => Element::Spread(f.fold_expr(e)?),
    })
}

pub fn walk_function<F: Fold>(f: &mut F, function: Function) -> Result<Function, PassError> {
    Ok(Function {
        body: fold_stmts(f, function.body)?,
        ..function
    })
}

pub fn walk_var_decl<F: Fold>(f: &mut F, decl: VarDecl) -> Result<VarDecl, PassError> {
    Ok(VarDecl {
        kind: decl.kind,
        declarations: decl
            .declarations
            .into_iter()
            .map(|d| {
                Ok(Declarator {
                    id: d.id,
                    init: d.init.map(|e| f.fold_expr(e)).transpose()?,
                })
            })
            .collect::<Result<_, PassError>>()?,
    })
}

fn walk_import<F: Fold>(f: &mut F, decl: ImportDecl) -> Result<ImportDecl, PassError> {
    Ok(ImportDecl {
        source: f.fold_expr(decl.source)?,
        ..decl
    })
}

fn walk_export<F: Fold>(f: &mut F, decl: ExportNamedDecl) -> Result<ExportNamedDecl, PassError> {
    Ok(ExportNamedDecl {
        declaration: decl
            .declaration
            .map(|s| f.fold_stmt(*s).map(Box::new))
            .transpose()?,
        specifiers: decl.specifiers,
        source: decl.source.map(|e| f.fold_expr(e)).transpose()?,
        source_path: decl.source_path,
    })
}
