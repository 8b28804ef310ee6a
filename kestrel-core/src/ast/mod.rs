//! Syntax tree for the supported dialect subset
//!
//! The tree is produced by the parser collaborator and rewritten in place
//! by the desugaring passes. Ownership transfers whole-tree through each
//! pass; nothing retains references across pass boundaries.

pub mod builder;
pub mod print;

use std::fmt;

/// One module's parsed syntax tree
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

impl Program {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "\"{s}\""),
        }
    }
}

/// Runtime intrinsics introduced by desugaring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intrinsic {
    /// Construct a generator handle from a body closure
    MakeGenerator,
    /// Yield one value on a generator handle
    GeneratorYield,
    /// Concatenate array/iterable segments into one array
    ArrayFromSpread,
}

impl Intrinsic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intrinsic::MakeGenerator => "%makeGenerator",
            Intrinsic::GeneratorYield => "%generatorYield",
            Intrinsic::ArrayFromSpread => "%arrayFromSpread",
        }
    }
}

/// Binary operators (subset; passes recurse through these structurally)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

/// Member access property
#[derive(Debug, Clone, PartialEq)]
pub enum MemberProp {
    /// `obj.name`
    Ident(String),
    /// `obj[expr]`
    Computed(Expr),
}

/// An array element or call argument, possibly a spread
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Expr(Expr),
    Spread(Expr),
}

/// Function body shared by declarations, expressions and arrows
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    /// The function's own name; `None` for anonymous function expressions
    pub id: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub generator: bool,
    /// Diagnostic-only name attached by the anonymous-function-naming pass
    pub display_name: Option<String>,
}

impl Function {
    pub fn new(id: Option<String>, params: Vec<String>, body: Vec<Stmt>) -> Self {
        Self {
            id,
            params,
            body,
            generator: false,
            display_name: None,
        }
    }
}

/// Expressions
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(String),
    Literal(Literal),
    Array(Vec<Element>),
    Member {
        object: Box<Expr>,
        property: Box<MemberProp>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Element>,
    },
    /// A call to a runtime intrinsic; only produced by desugaring
    Intrinsic {
        kind: Intrinsic,
        args: Vec<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Function(Box<Function>),
    Arrow(Box<Function>),
    Yield {
        argument: Option<Box<Expr>>,
        delegate: bool,
    },
}

/// Variable declaration kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Var,
    Let,
    Const,
}

/// One `name = init` binding inside a variable declaration
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub id: String,
    pub init: Option<Expr>,
}

/// A `var`/`let`/`const` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: VarKind,
    pub declarations: Vec<Declarator>,
}

/// One imported binding
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpecifier {
    pub local: String,
    /// `None` for a default import
    pub imported: Option<String>,
}

/// An `import ... from "source"` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specifiers: Vec<ImportSpecifier>,
    /// The literal source written in the program text
    pub source: Expr,
    /// Canonical resolved path, written back by the resolver
    pub source_path: Option<String>,
}

/// One re-exported binding
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSpecifier {
    pub local: String,
    pub exported: String,
}

/// An `export { ... }` / `export <declaration>` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ExportNamedDecl {
    pub declaration: Option<Box<Stmt>>,
    pub specifiers: Vec<ExportSpecifier>,
    pub source: Option<Expr>,
    /// Canonical resolved path for re-exports, written back by the resolver
    pub source_path: Option<String>,
}

/// Statements
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(Expr),
    VarDecl(VarDecl),
    FunctionDecl(Box<Function>),
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    ForOf {
        binding: VarDecl,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Import(ImportDecl),
    ExportNamed(ExportNamedDecl),
    ExportDefault(Expr),
}

impl Expr {
    /// Whether this expression is a string literal, and its value
    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Expr::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether this expression is a call to the given intrinsic
    pub fn is_intrinsic(&self, kind: Intrinsic) -> bool {
        matches!(self, Expr::Intrinsic { kind: k, .. } if *k == kind)
    }
}
