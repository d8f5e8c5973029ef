// program ::= (ID-led stmt)*
// stmt ::= ID ':' type ['=' expr] ';'
//        | ID ':' struct '{' (ID ':' type ';')* '}'
//        | ID ':' fn [type] '(' [param (',' param)*] [',' '...'] ')' (block | ';')
//        | ID ':=' expr ';'
//        | expr '=' expr ';'
//        | expr ';'
//        | return [expr] ';'
//        | break ';'
//        | for expr block
//        | if expr block (elif expr block)* [else block]
//        | block
// block ::= '{' stmt* '}'
// param ::= ID ':' type
// type ::= '*' type | void | bool | i8 | i16 | i32 | i64 | f32 | f64 | string
//        | any | ID | fn [type]
// expr ::= expr binop expr
//        | ('!' | '~' | '-') expr
//        | expr as type
//        | ('@' | '*') expr
//        | expr '(' [expr (',' expr)*] ')'
//        | expr ('.' | '->') ID
//        | '(' expr ')'
//        | ID | number | string | true | false

// Precedence
//
// call . ->
// @ * (prefix)
// as
// ! ~ - (prefix)
// * / %
// + -
// << >>
// < <= > >=
// == !=
// &
// | ^
// &&
// ||

use crate::{
    token::Span,
    types::{Type, Value},
    util::intern::Interned,
};

#[derive(Debug, PartialEq, Default)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    VarDef(VarDef),
    Struct(StructDef),
    Fn(FnDef),
    /// Assignment to a variable.
    VarSet {
        target: Ident,
        value: Expr,
    },
    /// Assignment to a struct member. `target` is always a member access.
    StructSet {
        target: Expr,
        value: Expr,
    },
    Expr(Expr),
    Return(Option<Expr>),
    Break,
    For {
        cond: Expr,
        body: Vec<Stmt>,
    },
    If {
        cond: Expr,
        body: Vec<Stmt>,
        elifs: Vec<Elif>,
        else_body: Option<Vec<Stmt>>,
    },
    Block(Vec<Stmt>),
}

#[derive(Debug, PartialEq)]
pub struct VarDef {
    pub name: Ident,
    /// Declared, or inferred for quick assignments.
    pub ty: Type,
    pub init: Option<Expr>,
}

#[derive(Debug, PartialEq)]
pub struct StructDef {
    pub name: Ident,
    pub members: Vec<Param>,
}

#[derive(Debug, PartialEq)]
pub struct FnDef {
    pub name: Ident,
    pub ret: Type,
    pub params: Vec<Param>,
    pub variadic: bool,
    /// `None` for functions declared without a body.
    pub body: Option<Vec<Stmt>>,
}

impl FnDef {
    pub fn ty(&self) -> Type {
        Type::function(self.ret.clone())
    }
}

#[derive(Debug, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: Type,
}

#[derive(Debug, PartialEq)]
pub struct Elif {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(Ident),
    Paren(Box<Expr>),
    Unary {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Cast {
        expr: Box<Expr>,
        ty: Type,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        member: Ident,
        /// Accessed through a pointer (`->`).
        deref: bool,
    },
}

/// A literal carries its own type, which implicit casts may rewrite.
#[derive(Debug, PartialEq)]
pub struct Literal {
    pub value: Value,
    pub ty: Type,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
    Neg,
    Not,
    BitNot,
    AddressOf,
    Deref,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOperator {
    pub fn is_comparison(self) -> bool {
        use BinaryOperator::*;
        matches!(self, Eq | Ne | Lt | Le | Gt | Ge)
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    pub fn yields_bool(self) -> bool {
        self.is_comparison() || self.is_logical()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: Interned<str>,
    pub span: Span,
}

impl From<Ident> for Interned<str> {
    fn from(value: Ident) -> Self {
        value.name
    }
}

impl From<&Ident> for Interned<str> {
    fn from(value: &Ident) -> Self {
        value.name
    }
}
