use std::io::Write;

use crate::{
    ast::*,
    types::{Type, Value},
    util::{
        fmt::{Context, Show},
        intern::Interner,
    },
};

const INDENT_WIDTH: usize = 2;

pub fn print_program_string(idents: &Interner<str>, program: &Program) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_program(&mut buf, idents, program).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_expr_string(idents: &Interner<str>, expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    print_expr(&mut buf, idents, 0, expr).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_program(
    w: &mut impl Write,
    idents: &Interner<str>,
    program: &Program,
) -> std::io::Result<()> {
    print_stmts(w, idents, 0, &program.stmts)
}

fn print_stmts(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    stmts: &[Stmt],
) -> std::io::Result<()> {
    for stmt in stmts {
        print_stmt(w, idents, i, stmt)?;
    }
    Ok(())
}

pub fn print_stmt(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    stmt: &Stmt,
) -> std::io::Result<()> {
    let span = stmt.span;
    if let StmtKind::Expr(expr) = &stmt.kind {
        return print_expr(w, idents, i, expr);
    }

    sp(w, i)?;
    match &stmt.kind {
        StmtKind::VarDef(VarDef { name, ty, init }) => {
            let ty = show_ty(idents, ty);
            writeln!(w, "var {}: {ty} ({span})", idents.get(name))?;
            if let Some(init) = init {
                print_expr(w, idents, i + 1, init)?;
            }
        }
        StmtKind::Struct(StructDef { name, members }) => {
            writeln!(w, "struct {} ({span})", idents.get(name))?;
            print_params(w, idents, i + 1, "member", members)?;
        }
        StmtKind::Fn(FnDef {
            name,
            ret,
            params,
            variadic,
            body,
        }) => {
            write!(w, "fn {}: {}", idents.get(name), show_ty(idents, ret))?;
            if *variadic {
                write!(w, " variadic")?;
            }
            if body.is_none() {
                write!(w, " extern")?;
            }
            writeln!(w, " ({span})")?;
            print_params(w, idents, i + 1, "param", params)?;
            if let Some(body) = body {
                print_stmts(w, idents, i + 1, body)?;
            }
        }
        StmtKind::VarSet { target, value } => {
            writeln!(w, "set {} ({span})", idents.get(target))?;
            print_expr(w, idents, i + 1, value)?;
        }
        StmtKind::StructSet { target, value } => {
            writeln!(w, "set member ({span})")?;
            print_expr(w, idents, i + 1, target)?;
            print_expr(w, idents, i + 1, value)?;
        }
        StmtKind::Return(value) => {
            writeln!(w, "return ({span})")?;
            if let Some(value) = value {
                print_expr(w, idents, i + 1, value)?;
            }
        }
        StmtKind::Break => writeln!(w, "break ({span})")?,
        StmtKind::For { cond, body } => {
            writeln!(w, "for ({span})")?;
            print_arm(w, idents, i + 1, cond, body)?;
        }
        StmtKind::If {
            cond,
            body,
            elifs,
            else_body,
        } => {
            writeln!(w, "if ({span})")?;
            print_arm(w, idents, i + 1, cond, body)?;
            for elif in elifs {
                sp(w, i + 1)?;
                writeln!(w, "elif")?;
                print_arm(w, idents, i + 2, &elif.cond, &elif.body)?;
            }
            if let Some(else_body) = else_body {
                sp(w, i + 1)?;
                writeln!(w, "else")?;
                print_stmts(w, idents, i + 2, else_body)?;
            }
        }
        StmtKind::Block(stmts) => {
            writeln!(w, "block ({span})")?;
            print_stmts(w, idents, i + 1, stmts)?;
        }
        StmtKind::Expr(_) => unreachable!(),
    }
    Ok(())
}

fn print_arm(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    cond: &Expr,
    body: &[Stmt],
) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "cond")?;
    print_expr(w, idents, i + 1, cond)?;
    sp(w, i)?;
    writeln!(w, "body")?;
    print_stmts(w, idents, i + 1, body)
}

fn print_params(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    label: &str,
    params: &[Param],
) -> std::io::Result<()> {
    for Param { name, ty } in params {
        sp(w, i)?;
        writeln!(w, "{label} {}: {}", idents.get(name), show_ty(idents, ty))?;
    }
    Ok(())
}

pub fn print_expr(
    w: &mut impl Write,
    idents: &Interner<str>,
    i: usize,
    expr: &Expr,
) -> std::io::Result<()> {
    let span = expr.span;
    sp(w, i)?;
    match &expr.kind {
        ExprKind::Literal(Literal { value, ty }) => {
            let kind = match value {
                Value::Int(_) => "int",
                Value::Float(_) => "float",
                Value::Str(_) => "string",
                Value::Bool(_) => "bool",
            };
            writeln!(w, "{kind} {value} ({span} %: {})", show_ty(idents, ty))?;
        }
        ExprKind::Ident(ident) => {
            writeln!(w, "ident {} ({span})", idents.get(ident))?;
        }
        ExprKind::Paren(inner) => {
            writeln!(w, "paren ({span})")?;
            print_expr(w, idents, i + 1, inner)?;
        }
        ExprKind::Unary { op, expr: inner } => {
            writeln!(w, "unary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, inner)?;
        }
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, idents, i + 1, lhs)?;
            print_expr(w, idents, i + 1, rhs)?;
        }
        ExprKind::Cast { expr: inner, ty } => {
            writeln!(w, "cast {} ({span})", show_ty(idents, ty))?;
            print_expr(w, idents, i + 1, inner)?;
        }
        ExprKind::Call { callee, args } => {
            writeln!(w, "call ({span})")?;
            print_expr(w, idents, i + 1, callee)?;
            if !args.is_empty() {
                sp(w, i + 1)?;
                writeln!(w, "arguments")?;
                for arg in args {
                    print_expr(w, idents, i + 2, arg)?;
                }
            }
        }
        ExprKind::Member {
            object,
            member,
            deref,
        } => {
            let arrow = if *deref { "->" } else { "" };
            writeln!(w, "member {arrow}{} ({span})", idents.get(member))?;
            print_expr(w, idents, i + 1, object)?;
        }
    }
    Ok(())
}

fn show_ty(idents: &Interner<str>, ty: &Type) -> String {
    ty.display(&Context {
        ident_interner: idents,
    })
    .to_string()
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
