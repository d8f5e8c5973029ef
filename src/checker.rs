use crate::{
    ast::{Expr, ExprKind, FnDef, Param, Program, Stmt, StmtKind, StructDef, VarDef},
    symbol::{Attributes, SymbolTable},
    token::{Span, Spanned},
    types::{self, BaseKind, InferError, InternalError, Type},
    util::intern::{Interned, Interner},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Re-validates a parsed program against a fresh set of scopes.
///
/// Literals are cast in place where an implicit numeric conversion is needed,
/// so the returned program is the one later passes should see.
pub struct Checker<'ident> {
    ident_interner: &'ident mut Interner<str>,
    symbols: SymbolTable<()>,
    /// Declared return type of the function being checked.
    return_type: Option<Type>,
    warnings: Vec<Spanned<Warning>>,
}

impl Checker<'_> {
    pub fn with_capacity(ident_interner: &mut Interner<str>, capacity: usize) -> Checker<'_> {
        Checker {
            ident_interner,
            symbols: SymbolTable::with_capacity(capacity),
            return_type: None,
            warnings: Vec::new(),
        }
    }

    pub fn check(mut self, mut program: Program) -> Result<(Program, Vec<Spanned<Warning>>)> {
        self.symbols.declare_prelude(self.ident_interner, |_| ());

        self.check_stmts(&mut program.stmts)?;
        log::debug!(
            "checked {} top-level statements with {} warnings",
            program.stmts.len(),
            self.warnings.len()
        );
        Ok((program, self.warnings))
    }

    fn check_stmts(&mut self, stmts: &mut [Stmt]) -> Result<()> {
        stmts.iter_mut().try_for_each(|stmt| self.check_stmt(stmt))
    }

    fn check_stmt(&mut self, stmt: &mut Stmt) -> Result<()> {
        let span = stmt.span;
        match &mut stmt.kind {
            StmtKind::VarDef(def) => self.check_var_def(def),
            StmtKind::Struct(def) => self.check_struct(def),
            StmtKind::Fn(def) => self.check_fn(def),
            StmtKind::VarSet { target, value } => {
                let Some(symbol) = self.symbols.get(target.name) else {
                    return Err(target.span.wrap(Error::NoVar(target.name)));
                };
                let expected = symbol.ty.clone();
                self.check_expr(value)?;
                self.coerce(&expected, value, Error::invalid_type)
            }
            StmtKind::StructSet { target, value } => {
                self.check_expr(target)?;
                let expected = self.infer(target)?;
                self.check_expr(value)?;
                self.coerce(&expected, value, Error::invalid_type)
            }
            StmtKind::Expr(expr) => self.check_expr(expr),
            StmtKind::Return(value) => self.check_return(value.as_mut(), span),
            StmtKind::Break => Ok(()),
            StmtKind::For { cond, body } => {
                self.check_expr(cond)?;
                self.scoped(|c| c.check_stmts(body))
            }
            StmtKind::If {
                cond,
                body,
                elifs,
                else_body,
            } => {
                self.check_expr(cond)?;
                self.scoped(|c| c.check_stmts(body))?;
                for elif in elifs {
                    self.check_expr(&elif.cond)?;
                    self.scoped(|c| c.check_stmts(&mut elif.body))?;
                }
                match else_body {
                    Some(body) => self.scoped(|c| c.check_stmts(body)),
                    None => Ok(()),
                }
            }
            StmtKind::Block(body) => self.scoped(|c| c.check_stmts(body)),
        }
    }

    fn check_var_def(&mut self, def: &mut VarDef) -> Result<()> {
        self.check_undeclared(def.name.name, def.name.span)?;
        self.check_type(&def.ty, def.name.span)?;
        if let Some(init) = &mut def.init {
            self.check_expr(init)?;
            if self.infer(init)?.is_void() {
                return Err(init.span.wrap(Error::VoidInitializer(def.name.name)));
            }
            self.coerce(&def.ty, init, Error::invalid_type)?;
        }
        self.symbols.add(def.name.name, def.ty.clone(), ());
        Ok(())
    }

    fn check_struct(&mut self, def: &StructDef) -> Result<()> {
        self.check_undeclared(def.name.name, def.name.span)?;

        let marker = format!("{}_members", self.ident_interner.get(def.name));
        let marker = self.ident_interner.intern(&marker);
        let members = self.symbols.new_scope(Some(marker));
        let result = def.members.iter().try_for_each(|member| self.declare_param(member));
        self.symbols.pop_scope();
        result?;

        let ty = Type::structure(def.name.name);
        self.symbols.add(def.name.name, ty, ()).scope = Some(members);
        Ok(())
    }

    fn check_fn(&mut self, def: &mut FnDef) -> Result<()> {
        self.check_undeclared(def.name.name, def.name.span)?;
        self.check_type(&def.ret, def.name.span)?;

        let mut attributes = Attributes::empty();
        attributes.set(Attributes::EXTERNAL, def.body.is_none());
        attributes.set(Attributes::VARIADIC, def.variadic);
        self.symbols.add(def.name.name, def.ty(), ()).attributes = attributes;

        let outer_return_type = self.return_type.replace(def.ret.clone());
        let result = self.scoped(|c| {
            def.params.iter().try_for_each(|param| c.declare_param(param))?;
            match &mut def.body {
                Some(body) => c.check_stmts(body),
                None => Ok(()),
            }
        });
        self.return_type = outer_return_type;
        result
    }

    /// Returns are checked against the innermost enclosing function.
    fn check_return(&mut self, value: Option<&mut Expr>, span: Span) -> Result<()> {
        let Some(expected) = self.return_type.clone() else {
            return Err(span.wrap(Error::ReturnOutsideFunction));
        };
        match value {
            None if expected.is_void() => Ok(()),
            None => Err(span.wrap(Error::InvalidReturnType {
                expected,
                actual: Type::void(),
            })),
            Some(value) => {
                self.check_expr(value)?;
                if expected.is_void() {
                    let actual = self.infer(value)?;
                    return Err(value.span.wrap(Error::InvalidReturnType { expected, actual }));
                }
                self.coerce(&expected, value, |expected, actual| Error::InvalidReturnType {
                    expected,
                    actual,
                })
            }
        }
    }

    /// Checks that every identifier in the expression resolves and that every
    /// subexpression has a type.
    fn check_expr(&self, expr: &Expr) -> Result<()> {
        match &expr.kind {
            ExprKind::Literal(_) => (),
            ExprKind::Ident(ident) => {
                if self.symbols.get(ident.name).is_none() {
                    return Err(ident.span.wrap(Error::NoVar(ident.name)));
                }
            }
            ExprKind::Paren(inner) | ExprKind::Unary { expr: inner, .. } => self.check_expr(inner)?,
            ExprKind::Cast { expr: inner, ty } => {
                self.check_expr(inner)?;
                let actual = self.infer(inner)?;
                if actual != *ty && !types::compatible(ty, &actual) {
                    return Err(expr.span.wrap(Error::invalid_type(ty.clone(), actual)));
                }
            }
            ExprKind::Binary { op, lhs, rhs } => {
                self.check_expr(lhs)?;
                self.check_expr(rhs)?;
                if !op.is_logical() {
                    let (expected, actual) = (self.infer(lhs)?, self.infer(rhs)?);
                    if types::join(&expected, &actual).is_err() {
                        return Err(rhs.span.wrap(Error::invalid_type(expected, actual)));
                    }
                }
            }
            ExprKind::Call { callee, args } => {
                self.check_expr(callee)?;
                args.iter().try_for_each(|arg| self.check_expr(arg))?;
            }
            ExprKind::Member { object, .. } => self.check_expr(object)?,
        }
        self.infer(expr).map(drop)
    }

    /// Accepts `value` as a `expected` if the types match or a literal can be
    /// cast. A float literal truncated to an integer is accepted with a
    /// warning.
    fn coerce(
        &mut self,
        expected: &Type,
        value: &mut Expr,
        mismatch: impl FnOnce(Type, Type) -> Error,
    ) -> Result<()> {
        let actual = self.infer(value)?;
        if actual == *expected {
            return Ok(());
        }
        if types::compatible(expected, &actual) {
            let truncates = types::is_float(&actual) && types::is_integer(expected);
            if types::cast(expected, value) {
                if truncates {
                    let warning = Warning::TruncatedFloatLiteral {
                        target: expected.clone(),
                    };
                    self.warnings.push(value.span.wrap(warning));
                }
                return Ok(());
            }
        }
        Err(value.span.wrap(mismatch(expected.clone(), actual)))
    }

    fn declare_param(&mut self, param: &Param) -> Result<()> {
        self.check_undeclared(param.name.name, param.name.span)?;
        self.check_type(&param.ty, param.name.span)?;
        self.symbols.add(param.name.name, param.ty.clone(), ());
        Ok(())
    }

    fn check_undeclared(&self, name: Interned<str>, span: Span) -> Result<()> {
        match self.symbols.get_local(name) {
            Some(_) => Err(span.wrap(Error::Redeclared(name))),
            None => Ok(()),
        }
    }

    /// Named types must refer to a struct declared before the use.
    fn check_type(&self, ty: &Type, span: Span) -> Result<()> {
        let Some(name) = ty.instance_name() else {
            return Ok(());
        };
        match self.symbols.get(name) {
            Some(symbol) if symbol.ty.base() == BaseKind::Struct => Ok(()),
            _ => Err(span.wrap(Error::UnknownType(name))),
        }
    }

    fn infer(&self, expr: &Expr) -> Result<Type> {
        types::infer_type(expr, &self.symbols).map_err(|error| match error {
            InferError::UnknownIdentifier(ident) | InferError::UnknownMember(ident) => {
                ident.span.wrap(Error::NoVar(ident.name))
            }
            InferError::NotCallable(ty) => expr.span.wrap(Error::NotCallable(ty)),
            InferError::NotAStruct(ty) => expr.span.wrap(Error::NotAStruct(ty)),
            InferError::Internal(error) => expr.span.wrap(Error::Internal(error)),
        })
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.symbols.new_scope(None);
        let result = f(self);
        self.symbols.pop_scope();
        result
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Redeclared(Interned<str>),
    NoVar(Interned<str>),
    InvalidType { expected: Type, actual: Type },
    InvalidReturnType { expected: Type, actual: Type },
    ReturnOutsideFunction,
    VoidInitializer(Interned<str>),
    UnknownType(Interned<str>),
    NotCallable(Type),
    NotAStruct(Type),
    Internal(InternalError),
}

impl Error {
    fn invalid_type(expected: Type, actual: Type) -> Error {
        Error::InvalidType { expected, actual }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::Redeclared(_) => "ERR_REDECLARED",
            Error::NoVar(_) => "ERR_NO_VAR",
            Error::InvalidReturnType { .. } | Error::ReturnOutsideFunction => {
                "ERR_INVALID_RETURN_TYPE"
            }
            Error::InvalidType { .. }
            | Error::VoidInitializer(_)
            | Error::UnknownType(_)
            | Error::NotCallable(_)
            | Error::NotAStruct(_) => "ERR_INVALID_TYPE",
            Error::Internal(_) => "ERR_INTERNAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Warning {
    TruncatedFloatLiteral { target: Type },
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use checker;

        fn test_function_with_params_passes() {
            let program = "add : fn i32 (a: i32, b: i32) { return a + b; }";
            let tree_ok = "
                fn add: i32 (0..47)
                  param a: i32
                  param b: i32
                  return (32..45)
                    binary Add (39..44)
                      ident a (39..40)
                      ident b (43..44)
            ";
        }

        fn test_string_cannot_initialize_int() {
            let program = r#"x : i32 = "hi";"#;
            let expected_errors = &["1:11: expected type i32, but got string"];
        }

        fn test_literal_initializer_is_cast() {
            let program = "x : i64 = 7; y : f64 = -(2);";
            let tree_ok = "
                var x: i64 (0..12)
                  int 7 (10..11 %: i64)
                var y: f64 (13..28)
                  unary Neg (23..27)
                    paren (24..27)
                      float 2.0 (25..26 %: f64)
            ";
        }

        fn test_float_literal_truncation_warns() {
            let program = "x : i32 = 2.9;";
            let expected_errors = &["1:11: implicit cast truncates float literal to i32"];
            let tree_error = "
                var x: i32 (0..14)
                  int 2 (10..13 %: i32)
            ";
        }

        fn test_redeclared_function() {
            let program = "twice : fn i32 (n: i32) { return n * 2; } twice : fn i32 (n: i32) { return n + n; }";
            let expected_errors = &["1:43: twice is already declared in this scope"];
        }

        fn test_redeclared_variable_same_scope() {
            let program = "x := 1; x : f32;";
            let expected_errors = &["1:9: x is already declared in this scope"];
        }

        fn test_shadowing_in_nested_scope() {
            let program = "x := 1; f : fn f32 { x := 1.5; return x; }";
            let tree_ok = "
                var x: i32 (0..7)
                  int 1 (5..6 %: i32)
                fn f: f32 (8..42)
                  var x: f32 (21..30)
                    float 1.5 (26..29 %: f32)
                  return (31..40)
                    ident x (38..39)
            ";
        }

        fn test_param_redeclared_in_body() {
            let program = "f : fn (a: i32) { a := 2; }";
            let expected_errors = &["1:19: a is already declared in this scope"];
        }

        fn test_duplicate_struct_member() {
            let program = "P : struct { a: i32; a: f32; }";
            let expected_errors = &["1:22: a is already declared in this scope"];
        }

        fn test_unknown_variable_in_assignment_value() {
            let program = "x : i32; f : fn { x = y; }";
            let expected_errors = &["1:23: y is not defined"];
        }

        fn test_unknown_variable_in_call_argument() {
            let program = r#"f : fn { printf("%d", missing); }"#;
            let expected_errors = &["1:23: missing is not defined"];
        }

        fn test_unknown_struct_type() {
            let program = "p : Nope;";
            let expected_errors = &["1:1: Nope is not a struct type"];
        }

        fn test_return_literal_is_cast() {
            let program = "f : fn f64 { return 1; }";
            let tree_ok = "
                fn f: f64 (0..24)
                  return (13..22)
                    float 1.0 (20..21 %: f64)
            ";
        }

        fn test_nested_return_is_checked() {
            let program = r#"f : fn i32 (n: i32) { if n { return "s"; } return n; }"#;
            let expected_errors = &[r#"1:37: function returns i32, but got string"#];
        }

        fn test_bare_return_in_non_void_function() {
            let program = "f : fn i32 { return; }";
            let expected_errors = &["1:14: function returns i32, but got void"];
        }

        fn test_value_return_in_void_function() {
            let program = "f : fn { return 1; }";
            let expected_errors = &["1:17: function returns void, but got i32"];
        }

        fn test_non_literal_return_mismatch() {
            let program = "f : fn i64 (n: i32) { return n; }";
            let expected_errors = &["1:30: function returns i64, but got i32"];
        }

        fn test_member_assignment_is_validated() {
            let program = r#"P : struct { v: i8; } p : P; f : fn { p.v = "x"; }"#;
            let expected_errors = &[r#"1:45: expected type i8, but got string"#];
        }

        fn test_member_assignment_casts() {
            let program = "P : struct { v: f64; } p : P; f : fn { p.v = 3; }";
            let tree_ok = "
                struct P (0..22)
                  member v: f64
                var p: P (23..29)
                fn f: void (30..49)
                  set member (39..47)
                    member v (39..42)
                      ident p (39..40)
                    float 3.0 (45..46 %: f64)
            ";
        }

        fn test_comparison_operands_must_join() {
            let program = "f : fn (b: bool) { if b == 1 { } }";
            let expected_errors = &["1:28: expected type bool, but got i32"];
        }

        fn test_arithmetic_on_a_pointer_and_its_base() {
            let program = "f : fn (a: i32) { p := @a; q := p + 1; }";
            let tree_ok = "
                fn f: void (0..40)
                  param a: i32
                  var p: *i32 (18..26)
                    unary AddressOf (23..25)
                      ident a (24..25)
                  var q: *i32 (27..38)
                    binary Add (32..37)
                      ident p (32..33)
                      int 1 (36..37 %: i32)
            ";
        }

        fn test_void_initializer() {
            let program = "g : fn { } f : fn { v := g(); }";
            let expected_errors = &["1:26: v cannot be initialized with a void value"];
        }

        fn test_dot_on_struct_pointer() {
            let program = "P : struct { x: i32; } f : fn (p: *P) { v := p.x; }";
            let expected_errors = &["1:46: type *P is not a struct"];
        }

        fn test_invalid_cast() {
            let program = r#"s := "a" as i32;"#;
            let expected_errors = &["1:6: expected type i32, but got string"];
        }

        fn test_prelude_printf_is_visible() {
            let program = r#"main : fn { printf("%d\n", 1); }"#;
            let tree_ok = r#"
                fn main: void (0..32)
                  call (12..29)
                    ident printf (12..18)
                    arguments
                      string "%d\n" (19..25 %: string)
                      int 1 (27..28 %: i32)
            "#;
        }
    );

    #[test]
    fn records_function_attributes() {
        use crate::{checker::Checker, lexer, parser, symbol::Attributes, util::intern::Interner};

        let src = "ext : fn i32 (a: i32, ...); body : fn { }";
        let mut i = Interner::with_capacity(8);
        let tokens = lexer::tokenize(src).unwrap();
        let mut program = parser::parse_program(src, &tokens, &mut i).unwrap();
        let (ext, body) = (i.intern("ext"), i.intern("body"));

        let mut checker = Checker::with_capacity(&mut i, 8);
        checker.check_stmts(&mut program.stmts).unwrap();
        let attributes = |name| checker.symbols.get(name).unwrap().attributes;
        assert_eq!(attributes(ext), Attributes::EXTERNAL | Attributes::VARIADIC);
        assert_eq!(attributes(body), Attributes::empty());
    }
}
