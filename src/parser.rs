use crate::{
    ast::{
        BinaryOperator, Elif, Expr, ExprKind, FnDef, Ident, Literal, Param, Program, Stmt,
        StmtKind, StructDef, UnaryOperator, VarDef,
    },
    lexer::extract,
    symbol::SymbolTable,
    token::{Span, Spanned, Token, TokenKind},
    types::{self, BaseKind, InferError, InternalError, Type, Value},
    util::intern::{Interned, Interner},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Parses a whole program, inferring the types of quick assignments as
/// declarations are seen.
pub fn parse_program(
    src: &str,
    tokens: &[Token],
    ident_interner: &mut Interner<str>,
) -> Result<Program> {
    let program = parse(src, tokens, ident_interner, |p| p.parse_program())?;
    log::debug!("parsed {} top-level statements", program.stmts.len());
    Ok(program)
}

/// Parses a single expression, with only the prelude in scope.
pub fn parse_expr(src: &str, tokens: &[Token], ident_interner: &mut Interner<str>) -> Result<Expr> {
    parse(src, tokens, ident_interner, |p| {
        let expr = p.parse_expr()?;
        p.consume(TokenKind::Eof)?;
        Ok(expr)
    })
}

fn parse<'src, 'tok, 'ident, T>(
    src: &'src str,
    tokens: &'tok [Token],
    ident_interner: &'ident mut Interner<str>,
    f: impl for<'a, 'b> FnOnce(&'a mut Parser<'src, 'b, 'ident>) -> Result<T>,
) -> Result<T> {
    let eof = Token::eof_for(src);
    let mut p = Parser::new(src, tokens, &eof, ident_interner);
    f(&mut p)
}

struct Parser<'src, 'tok, 'ident> {
    src: &'src str,
    tokens: &'tok [Token],
    eof: &'tok Token,
    ident_interner: &'ident mut Interner<str>,
    cursor: usize,
    symbols: SymbolTable<()>,
}

impl<'tok> Parser<'_, 'tok, '_> {
    fn parse_program(&mut self) -> Result<Program> {
        let mut stmts = Vec::with_capacity(16);
        while !self.is(TokenKind::Eof) {
            if !self.is(TokenKind::Identifier) {
                let c = self.peek();
                return Err(c.span().wrap(Error::Unexpected {
                    actual: c.kind,
                    expected: TokenKind::Identifier,
                }));
            }
            stmts.push(self.parse_stmt()?);
        }
        Ok(Program { stmts })
    }

    fn parse_stmt(&mut self) -> Result<Stmt> {
        let token = self.peek();
        match token.kind {
            TokenKind::Identifier => match self.peek_nth(1).kind {
                TokenKind::Colon => self.parse_definition(),
                TokenKind::QuickAssign => self.parse_quick_assign(),
                _ => self.parse_expr_stmt(),
            },
            TokenKind::Return => {
                self.advance();
                let value = if self.is(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                let end = self.consume(TokenKind::Semicolon)?;
                Ok(Self::stmt(StmtKind::Return(value), token.span().to(end.span())))
            }
            TokenKind::Break => {
                self.advance();
                let end = self.consume(TokenKind::Semicolon)?;
                Ok(Self::stmt(StmtKind::Break, token.span().to(end.span())))
            }
            TokenKind::For => {
                self.advance();
                let cond = self.parse_expr()?;
                let (body, end) = self.parse_block()?;
                Ok(Self::stmt(StmtKind::For { cond, body }, token.span().to(end)))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::LBrace => {
                let (body, end) = self.parse_block()?;
                Ok(Self::stmt(StmtKind::Block(body), token.span().to(end)))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    /// Parses `ID ':' ...`, dispatching on the declared type.
    fn parse_definition(&mut self) -> Result<Stmt> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::Colon)?;
        match self.peek().kind {
            TokenKind::Struct => return self.parse_struct(name),
            TokenKind::Fn => return self.parse_fn(name),
            _ => (),
        }

        let ty = self.parse_type()?;
        let init = if self.take(TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.consume(TokenKind::Semicolon)?;

        self.symbols.add(name.name, ty.clone(), ());
        let def = VarDef { name, ty, init };
        Ok(Self::stmt(StmtKind::VarDef(def), name.span.to(end.span())))
    }

    fn parse_quick_assign(&mut self) -> Result<Stmt> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::QuickAssign)?;
        let init = self.parse_expr()?;
        let ty = self.infer(&init)?;
        let end = self.consume(TokenKind::Semicolon)?;

        self.symbols.add(name.name, ty.clone(), ());
        let def = VarDef {
            name,
            ty,
            init: Some(init),
        };
        Ok(Self::stmt(StmtKind::VarDef(def), name.span.to(end.span())))
    }

    /// Parses the members of a struct into their own scope, and only then
    /// binds the struct name in the enclosing scope.
    fn parse_struct(&mut self, name: Ident) -> Result<Stmt> {
        self.consume(TokenKind::Struct)?;
        self.consume(TokenKind::LBrace)?;

        let marker = format!("{}_members", self.ident_interner.get(name));
        let marker = self.ident_interner.intern(&marker);
        let scope = self.symbols.new_scope(Some(marker));
        let mut members = Vec::new();
        while self.except([TokenKind::RBrace]) {
            let member = self.parse_param()?;
            self.consume(TokenKind::Semicolon)?;
            self.symbols.add(member.name.name, member.ty.clone(), ());
            members.push(member);
        }
        let end = self.consume(TokenKind::RBrace)?;
        self.symbols.pop_scope();

        self.symbols.add(name.name, Type::structure(name.name), ()).scope = Some(scope);
        let def = StructDef { name, members };
        Ok(Self::stmt(StmtKind::Struct(def), name.span.to(end.span())))
    }

    /// Parses `fn [type] ['(' params ')'] (block | ';')`. The function is
    /// bound before its parameters so that its body may call it.
    fn parse_fn(&mut self, name: Ident) -> Result<Stmt> {
        self.consume(TokenKind::Fn)?;
        let ret = self.parse_return_type()?;
        self.symbols.add(name.name, Type::function(ret.clone()), ());

        self.symbols.new_scope(None);
        let mut params = Vec::new();
        let mut variadic = false;
        if self.take(TokenKind::LParen) {
            while self.except([TokenKind::RParen]) {
                if self.take(TokenKind::Variadic) {
                    variadic = true;
                    break;
                }
                let param = self.parse_param()?;
                self.symbols.add(param.name.name, param.ty.clone(), ());
                params.push(param);
                if !self.take(TokenKind::Comma) {
                    break;
                }
            }
            self.consume(TokenKind::RParen)?;
        }

        let (body, end) = if self.is(TokenKind::Semicolon) {
            (None, self.advance().span())
        } else {
            self.consume(TokenKind::LBrace)?;
            let body = self.parse_stmts()?;
            (Some(body), self.consume(TokenKind::RBrace)?.span())
        };
        self.symbols.pop_scope();

        let def = FnDef {
            name,
            ret,
            params,
            variadic,
            body,
        };
        Ok(Self::stmt(StmtKind::Fn(def), name.span.to(end)))
    }

    fn parse_if(&mut self) -> Result<Stmt> {
        let start = self.consume(TokenKind::If)?.span();
        let cond = self.parse_expr()?;
        let (body, mut end) = self.parse_block()?;

        let mut elifs = Vec::new();
        while self.take(TokenKind::Elif) {
            let cond = self.parse_expr()?;
            let (body, elif_end) = self.parse_block()?;
            elifs.push(Elif { cond, body });
            end = elif_end;
        }

        let else_body = if self.take(TokenKind::Else) {
            let (body, else_end) = self.parse_block()?;
            end = else_end;
            Some(body)
        } else {
            None
        };

        let kind = StmtKind::If {
            cond,
            body,
            elifs,
            else_body,
        };
        Ok(Self::stmt(kind, start.to(end)))
    }

    /// Parses an expression statement, or an assignment if the expression is
    /// followed by `=`.
    fn parse_expr_stmt(&mut self) -> Result<Stmt> {
        let expr = self.parse_expr()?;
        let start = expr.span;

        let kind = if self.take(TokenKind::Assign) {
            let mut value = self.parse_expr()?;
            match expr.kind {
                ExprKind::Ident(target) => {
                    self.check_assignment(target, &mut value)?;
                    StmtKind::VarSet { target, value }
                }
                ExprKind::Member { .. } => StmtKind::StructSet {
                    target: expr,
                    value,
                },
                _ => return Err(start.wrap(Error::InvalidAssignmentTarget)),
            }
        } else {
            StmtKind::Expr(expr)
        };

        let end = self.consume(TokenKind::Semicolon)?;
        Ok(Self::stmt(kind, start.to(end.span())))
    }

    fn check_assignment(&mut self, target: Ident, value: &mut Expr) -> Result<()> {
        let Some(symbol) = self.symbols.get(target.name) else {
            return Err(target.span.wrap(Error::InvalidIdentifier(target.name)));
        };
        let expected = symbol.ty.clone();
        let actual = self.infer(value)?;
        let coerced = types::compatible(&expected, &actual) && types::cast(&expected, value);
        if actual == expected || coerced {
            Ok(())
        } else {
            Err(value.span.wrap(Error::InvalidType { expected, actual }))
        }
    }

    /// Parses `'{' stmt* '}'` in a new scope. Returns the statements and the
    /// span of the closing brace.
    fn parse_block(&mut self) -> Result<(Vec<Stmt>, Span)> {
        self.consume(TokenKind::LBrace)?;
        self.symbols.new_scope(None);
        let body = self.parse_stmts()?;
        self.symbols.pop_scope();
        let end = self.consume(TokenKind::RBrace)?;
        Ok((body, end.span()))
    }

    /// Parses statements up to (but not including) a closing brace.
    fn parse_stmts(&mut self) -> Result<Vec<Stmt>> {
        let mut stmts = Vec::new();
        while self.except([TokenKind::RBrace]) {
            stmts.push(self.parse_stmt()?);
        }
        Ok(stmts)
    }

    fn parse_param(&mut self) -> Result<Param> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        Ok(Param { name, ty })
    }

    fn parse_type(&mut self) -> Result<Type> {
        use TokenKind::*;
        let token = self.advance();
        let base = match token.kind {
            Star => return Ok(self.parse_type()?.with_indirection(1)),
            Identifier => {
                let name = self.intern_ident(token);
                return Ok(Type::instance(name));
            }
            Fn => return Ok(Type::function(self.parse_return_type()?)),
            Void => BaseKind::Void,
            Bool => BaseKind::Bool,
            I8 => BaseKind::I8,
            I16 => BaseKind::I16,
            I32 => BaseKind::I32,
            I64 => BaseKind::I64,
            F32 => BaseKind::F32,
            F64 => BaseKind::F64,
            Str => BaseKind::Str,
            Any => BaseKind::Any,
            actual => return Err(token.span().wrap(Error::ExpectedType { actual })),
        };
        Ok(Type::primitive(base))
    }

    /// A function's return type is optional and defaults to `void`.
    fn parse_return_type(&mut self) -> Result<Type> {
        let kind = self.peek().kind;
        if kind.is_type_keyword() || matches!(kind, TokenKind::Star | TokenKind::Identifier) {
            self.parse_type()
        } else {
            Ok(Type::void())
        }
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: self.intern_ident(token),
            span: token.span(),
        })
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let mut lhs = self.parse_unary()?;

        loop {
            let op_token = self.peek();
            let Some((lbp, rbp)) = Self::infix_binding_power(op_token.kind) else {
                break;
            };
            if lbp < min_bp {
                break;
            }
            self.advance();

            let rhs = self.parse_expr_bp(rbp)?;
            let span = lhs.span.to(rhs.span);
            let kind = ExprKind::Binary {
                op: Self::binary_operator(op_token.kind),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
            lhs = Expr { kind, span };
        }

        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::Bang => UnaryOperator::Not,
            TokenKind::Tilde => UnaryOperator::BitNot,
            TokenKind::Minus => UnaryOperator::Neg,
            _ => return self.parse_cast(),
        };
        let token = self.advance();
        let expr = self.parse_unary()?;
        Ok(Self::unary(op, token.span(), expr))
    }

    fn parse_cast(&mut self) -> Result<Expr> {
        let mut expr = self.parse_addressing()?;
        while self.take(TokenKind::As) {
            let ty = self.parse_type()?;
            let span = expr.span.to(self.last_span());
            let kind = ExprKind::Cast {
                expr: Box::new(expr),
                ty,
            };
            expr = Expr { kind, span };
        }
        Ok(expr)
    }

    fn parse_addressing(&mut self) -> Result<Expr> {
        let op = match self.peek().kind {
            TokenKind::At => UnaryOperator::AddressOf,
            TokenKind::Star => UnaryOperator::Deref,
            _ => return self.parse_postfix(),
        };
        let token = self.advance();
        let expr = self.parse_addressing()?;
        Ok(Self::unary(op, token.span(), expr))
    }

    /// Parses calls and member accesses. An expression of function type is a
    /// call even without an argument list.
    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_primary()?;
        loop {
            let kind = match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let args =
                        self.parse_list(TokenKind::RParen, TokenKind::Comma, Self::parse_expr)?;
                    self.consume(TokenKind::RParen)?;
                    ExprKind::Call {
                        callee: Box::new(expr),
                        args,
                    }
                }
                kind @ (TokenKind::Dot | TokenKind::Arrow) => {
                    self.advance();
                    let member = self.parse_ident()?;
                    ExprKind::Member {
                        object: Box::new(expr),
                        member,
                        deref: kind == TokenKind::Arrow,
                    }
                }
                _ if self.is_function(&expr) => {
                    let span = expr.span;
                    let kind = ExprKind::Call {
                        callee: Box::new(expr),
                        args: Vec::new(),
                    };
                    return Ok(Expr { kind, span });
                }
                _ => break,
            };
            let span = match &kind {
                ExprKind::Call { callee, .. } => callee.span,
                ExprKind::Member { object, .. } => object.span,
                _ => unreachable!(),
            };
            expr = Expr {
                kind,
                span: span.to(self.last_span()),
            };
        }
        Ok(expr)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Identifier => ExprKind::Ident(Ident {
                name: self.intern_ident(token),
                span: token.span(),
            }),
            TokenKind::Number => ExprKind::Literal(Self::number(token)?),
            TokenKind::String => {
                let raw = token.text().unwrap_or_default();
                ExprKind::Literal(Literal {
                    value: Value::Str(extract::escaped_string(raw)),
                    ty: Type::primitive(BaseKind::Str),
                })
            }
            kind @ (TokenKind::True | TokenKind::False) => ExprKind::Literal(Literal {
                value: Value::Bool(kind == TokenKind::True),
                ty: Type::bool(),
            }),
            TokenKind::LParen => {
                let expr = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                return Ok(Expr {
                    kind: ExprKind::Paren(Box::new(expr)),
                    span: token.span().to(end.span()),
                });
            }
            other => {
                let error = Error::UnexpectedTokenInExpr { token: other };
                return Err(token.span().wrap(error));
            }
        };
        Ok(Expr {
            kind,
            span: token.span(),
        })
    }

    /// Numbers with a decimal point are `f32`, all others `i32`.
    fn number(token: &Token) -> Result<Literal> {
        let text = token.text().unwrap_or_default();
        let literal = if text.contains('.') {
            let value = text.parse().map_err(|_| token.span().wrap(Error::ParseNumber))?;
            Literal {
                value: Value::Float(value),
                ty: Type::primitive(BaseKind::F32),
            }
        } else {
            let value = text.parse().map_err(|_| token.span().wrap(Error::ParseNumber))?;
            Literal {
                value: Value::Int(value),
                ty: Type::primitive(BaseKind::I32),
            }
        };
        Ok(literal)
    }

    /// Parses `item (delim item)*` until `end_delim` is found. Does **NOT**
    /// consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        parse_item: impl Fn(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while self.except([end_delim]) {
            items.push(parse_item(self)?);

            if !self.take(separator) {
                if self.is(end_delim) {
                    break;
                }
                let c = self.peek();
                return Err(c.span().wrap(Error::UnexpectedAny {
                    actual: c.kind,
                    expected: Box::from([separator, end_delim]),
                }));
            }
        }
        Ok(items)
    }

    fn infix_binding_power(kind: TokenKind) -> Option<(u8, u8)> {
        let bp = match kind {
            TokenKind::PipePipe => (1, 2),
            TokenKind::AmpAmp => (3, 4),
            TokenKind::Pipe | TokenKind::Caret => (5, 6),
            TokenKind::Amp => (7, 8),
            TokenKind::EqEq | TokenKind::BangEq => (9, 10),
            TokenKind::Less | TokenKind::LessEq | TokenKind::Greater | TokenKind::GreaterEq => {
                (11, 12)
            }
            TokenKind::Shl | TokenKind::Shr => (13, 14),
            TokenKind::Plus | TokenKind::Minus => (15, 16),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => (17, 18),
            _ => return None,
        };
        Some(bp)
    }

    fn binary_operator(kind: TokenKind) -> BinaryOperator {
        match kind {
            TokenKind::PipePipe => BinaryOperator::Or,
            TokenKind::AmpAmp => BinaryOperator::And,
            TokenKind::Pipe => BinaryOperator::BitOr,
            TokenKind::Caret => BinaryOperator::BitXor,
            TokenKind::Amp => BinaryOperator::BitAnd,
            TokenKind::EqEq => BinaryOperator::Eq,
            TokenKind::BangEq => BinaryOperator::Ne,
            TokenKind::Less => BinaryOperator::Lt,
            TokenKind::LessEq => BinaryOperator::Le,
            TokenKind::Greater => BinaryOperator::Gt,
            TokenKind::GreaterEq => BinaryOperator::Ge,
            TokenKind::Shl => BinaryOperator::Shl,
            TokenKind::Shr => BinaryOperator::Shr,
            TokenKind::Plus => BinaryOperator::Add,
            TokenKind::Minus => BinaryOperator::Sub,
            TokenKind::Star => BinaryOperator::Mul,
            TokenKind::Slash => BinaryOperator::Div,
            TokenKind::Percent => BinaryOperator::Rem,
            _ => unreachable!("not an infix operator: {kind:?}"),
        }
    }

    fn unary(op: UnaryOperator, op_span: Span, expr: Expr) -> Expr {
        let span = op_span.to(expr.span);
        let kind = ExprKind::Unary {
            op,
            expr: Box::new(expr),
        };
        Expr { kind, span }
    }

    fn stmt(kind: StmtKind, span: Span) -> Stmt {
        Stmt { kind, span }
    }
}

impl<'tok> Parser<'_, 'tok, '_> {
    fn new<'src, 'ident>(
        src: &'src str,
        tokens: &'tok [Token],
        eof: &'tok Token,
        ident_interner: &'ident mut Interner<str>,
    ) -> Parser<'src, 'tok, 'ident> {
        let mut symbols = SymbolTable::with_capacity(32);
        symbols.declare_prelude(ident_interner, |_| ());
        Parser {
            src,
            tokens,
            eof,
            ident_interner,
            cursor: 0,
            symbols,
        }
    }

    fn infer(&self, expr: &Expr) -> Result<Type> {
        types::infer_type(expr, &self.symbols).map_err(|error| match error {
            InferError::UnknownIdentifier(ident) | InferError::UnknownMember(ident) => {
                ident.span.wrap(Error::InvalidIdentifier(ident.name))
            }
            InferError::NotCallable(ty) => expr.span.wrap(Error::NotCallable(ty)),
            InferError::NotAStruct(ty) => expr.span.wrap(Error::NotAStruct(ty)),
            InferError::Internal(error) => expr.span.wrap(Error::Internal(error)),
        })
    }

    fn is_function(&self, expr: &Expr) -> bool {
        types::infer_type(expr, &self.symbols)
            .is_ok_and(|ty| ty.base() == BaseKind::Function && !ty.is_pointer())
    }

    fn intern_ident(&mut self, token: &Token) -> Interned<str> {
        let text = token.span().substr(self.src);
        self.ident_interner.intern(text)
    }

    /// Returns the current token.
    fn peek(&self) -> &'tok Token {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &'tok Token {
        self.tokens.get(self.cursor + n).unwrap_or(self.eof)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> &'tok Token {
        let tokens = self.tokens;
        let c = tokens.get(self.cursor).unwrap_or(self.eof);
        self.cursor = (self.cursor + 1).min(tokens.len());
        c
    }

    /// Returns the span of the last consumed token.
    fn last_span(&self) -> Span {
        match self.cursor.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span(),
            None => self.eof.span(),
        }
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not,
    /// returns an error.
    fn consume(&mut self, expect: TokenKind) -> Result<&'tok Token> {
        if self.is(expect) {
            Ok(self.advance())
        } else {
            let c = self.peek();
            Err(c.span().wrap(Error::Unexpected {
                actual: c.kind,
                expected: expect,
            }))
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek().kind;
        c != TokenKind::Eof && except.into_iter().all(|e| c != e)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    InvalidAssignmentTarget,
    UnexpectedTokenInExpr {
        token: TokenKind,
    },
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    ExpectedType {
        actual: TokenKind,
    },
    ParseNumber,
    InvalidType {
        expected: Type,
        actual: Type,
    },
    InvalidIdentifier(Interned<str>),
    NotCallable(Type),
    NotAStruct(Type),
    Internal(InternalError),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidAssignmentTarget
            | Error::UnexpectedTokenInExpr { .. }
            | Error::Unexpected { .. }
            | Error::UnexpectedAny { .. }
            | Error::ExpectedType { .. }
            | Error::ParseNumber => "ERR_UNEXPECTED_TOKEN",
            Error::InvalidType { .. } | Error::NotCallable(_) | Error::NotAStruct(_) => {
                "ERR_INVALID_TYPE"
            }
            Error::InvalidIdentifier(_) => "ERR_INVALID_IDENTIFIER",
            Error::Internal(_) => "ERR_INTERNAL",
        }
    }
}
