#![allow(clippy::items_after_statements)]

use std::fmt;

use crate::{
    checker, codegen, lexer, parser,
    token::Spanned,
    util::fmt::{Context, Show},
};

fn prefix<E>(f: &mut fmt::Formatter<'_>, spanned: &Spanned<E>) -> fmt::Result {
    if f.alternate() {
        write!(f, "{}: ", spanned.span.pos)?;
    }
    Ok(())
}

impl Show for Spanned<lexer::Error> {
    fn show(&self, f: &mut fmt::Formatter<'_>, _: &Context<'_>) -> fmt::Result {
        prefix(f, self)?;

        use lexer::Error::*;
        match &self.inner {
            UnexpectedChar(c) => write!(f, "unexpected character {c:?}"),
            UnterminatedString => write!(f, "unterminated string literal"),
            MalformedNumber => write!(f, "malformed number literal"),
            UnknownDirective(name) => write!(f, "unknown directive #{name}"),
        }
    }
}

impl Show for Spanned<parser::Error> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let i = ctx.ident_interner;
        prefix(f, self)?;

        use parser::Error::*;
        match &self.inner {
            InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            UnexpectedTokenInExpr { token } => {
                write!(f, "unexpected token {token:?} in expression")
            }
            Unexpected { actual, expected } => {
                write!(f, "expected token {expected:?}, but got {actual:?}")
            }
            UnexpectedAny { actual, expected } => {
                write!(f, "expected one of {expected:?}, but got {actual:?}")
            }
            ExpectedType { actual } => write!(f, "expected a type, but got {actual:?}"),
            ParseNumber => write!(f, "invalid number literal"),
            InvalidType { expected, actual } => {
                let (expected, actual) = (expected.display(ctx), actual.display(ctx));
                write!(f, "expected type {expected}, but got {actual}")
            }
            InvalidIdentifier(name) => write!(f, "{} is not defined", i.get(name)),
            NotCallable(ty) => write!(f, "type {} is not callable", ty.display(ctx)),
            NotAStruct(ty) => write!(f, "type {} is not a struct", ty.display(ctx)),
            Internal(error) => write!(f, "internal compiler error: {error}"),
        }
    }
}

impl Show for Spanned<checker::Error> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        let i = ctx.ident_interner;
        prefix(f, self)?;

        use checker::Error::*;
        match &self.inner {
            Redeclared(name) => write!(f, "{} is already declared in this scope", i.get(name)),
            NoVar(name) => write!(f, "{} is not defined", i.get(name)),
            InvalidType { expected, actual } => {
                let (expected, actual) = (expected.display(ctx), actual.display(ctx));
                write!(f, "expected type {expected}, but got {actual}")
            }
            InvalidReturnType { expected, actual } => {
                let (expected, actual) = (expected.display(ctx), actual.display(ctx));
                write!(f, "function returns {expected}, but got {actual}")
            }
            ReturnOutsideFunction => write!(f, "return outside of a function"),
            VoidInitializer(name) => {
                write!(f, "{} cannot be initialized with a void value", i.get(name))
            }
            UnknownType(name) => write!(f, "{} is not a struct type", i.get(name)),
            NotCallable(ty) => write!(f, "type {} is not callable", ty.display(ctx)),
            NotAStruct(ty) => write!(f, "type {} is not a struct", ty.display(ctx)),
            Internal(error) => write!(f, "internal compiler error: {error}"),
        }
    }
}

impl Show for Spanned<checker::Warning> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        prefix(f, self)?;

        match &self.inner {
            checker::Warning::TruncatedFloatLiteral { target } => {
                write!(f, "implicit cast truncates float literal to {}", target.display(ctx))
            }
        }
    }
}

impl Show for Spanned<codegen::Error> {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        prefix(f, self)?;

        match &self.inner {
            codegen::Error::Unsupported(what) => write!(f, "unsupported: {what}"),
            codegen::Error::Unresolved(name) => {
                write!(f, "{} is not defined", ctx.ident_interner.get(name))
            }
            codegen::Error::Internal(error) => write!(f, "internal compiler error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        token::{Position, Span},
        types::{BaseKind, Type},
        util::intern::Interner,
    };

    fn at(line: u32, column: u32) -> Span {
        Span::new_of_length(0, 1, Position::new(line, column))
    }

    #[test]
    fn alternate_form_prefixes_position() {
        let i = Interner::with_capacity(1);
        let ctx = Context { ident_interner: &i };
        let error = at(3, 7).wrap(lexer::Error::UnexpectedChar('$'));

        assert_eq!(format!("{}", error.display(&ctx)), "unexpected character '$'");
        assert_eq!(format!("{:#}", error.display(&ctx)), "3:7: unexpected character '$'");
    }

    #[test]
    fn types_show_interned_names() {
        let mut i = Interner::with_capacity(2);
        let point = i.intern("Point");
        let ctx = Context { ident_interner: &i };
        let error = at(1, 1).wrap(checker::Error::InvalidType {
            expected: Type::instance(point).with_indirection(1),
            actual: Type::primitive(BaseKind::F64),
        });
        assert_eq!(error.display(&ctx).to_string(), "expected type *Point, but got f64");
    }
}
