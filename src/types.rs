use std::fmt;

use crate::{
    ast::{Expr, ExprKind, Ident, UnaryOperator},
    ir::IrType,
    symbol::SymbolTable,
    util::{
        fmt::{Context, Show},
        intern::Interned,
    },
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BaseKind {
    Void,
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
    Struct,
    Function,
    /// A value of a named struct type.
    Instance,
    Any,
    /// The type of the marker symbols linking a scope to its enclosing one.
    Scope,
}

impl BaseKind {
    pub fn is_integer(self) -> bool {
        matches!(self, BaseKind::I8 | BaseKind::I16 | BaseKind::I32 | BaseKind::I64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, BaseKind::F32 | BaseKind::F64)
    }

    pub fn name(self) -> &'static str {
        match self {
            BaseKind::Void => "void",
            BaseKind::Bool => "bool",
            BaseKind::I8 => "i8",
            BaseKind::I16 => "i16",
            BaseKind::I32 => "i32",
            BaseKind::I64 => "i64",
            BaseKind::F32 => "f32",
            BaseKind::F64 => "f64",
            BaseKind::Str => "string",
            BaseKind::Struct => "struct",
            BaseKind::Function => "fn",
            BaseKind::Instance => "instance",
            BaseKind::Any => "any",
            BaseKind::Scope => "scope",
        }
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A source level type.
///
/// The constructors keep the shape invariants: only functions have a return
/// type and only structs and instances have a name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Type {
    base: BaseKind,
    indirection: i8,
    instance_name: Option<Interned<str>>,
    return_type: Option<Box<Type>>,
}

impl Type {
    pub fn primitive(base: BaseKind) -> Type {
        debug_assert!(
            !matches!(base, BaseKind::Struct | BaseKind::Instance | BaseKind::Function),
            "{base} is not a primitive"
        );
        Type {
            base,
            indirection: 0,
            instance_name: None,
            return_type: None,
        }
    }

    pub fn instance(name: Interned<str>) -> Type {
        Type {
            base: BaseKind::Instance,
            indirection: 0,
            instance_name: Some(name),
            return_type: None,
        }
    }

    pub fn structure(name: Interned<str>) -> Type {
        Type {
            base: BaseKind::Struct,
            indirection: 0,
            instance_name: Some(name),
            return_type: None,
        }
    }

    pub fn function(return_type: Type) -> Type {
        Type {
            base: BaseKind::Function,
            indirection: 0,
            instance_name: None,
            return_type: Some(Box::new(return_type)),
        }
    }

    pub fn void() -> Type {
        Type::primitive(BaseKind::Void)
    }

    pub fn bool() -> Type {
        Type::primitive(BaseKind::Bool)
    }

    pub fn scope_marker() -> Type {
        Type::primitive(BaseKind::Scope)
    }

    /// Returns the same type with `delta` more (or fewer) pointer levels.
    pub fn with_indirection(&self, delta: i8) -> Type {
        Type {
            indirection: self.indirection.saturating_add(delta),
            ..self.clone()
        }
    }

    pub fn base(&self) -> BaseKind {
        self.base
    }

    pub fn indirection(&self) -> i8 {
        self.indirection
    }

    pub fn is_pointer(&self) -> bool {
        self.indirection > 0
    }

    pub fn is_void(&self) -> bool {
        self.base == BaseKind::Void && self.indirection == 0
    }

    pub fn instance_name(&self) -> Option<Interned<str>> {
        self.instance_name
    }

    pub fn return_type(&self) -> Option<&Type> {
        self.return_type.as_deref()
    }
}

impl Show for Type {
    fn show(&self, f: &mut fmt::Formatter<'_>, ctx: &Context<'_>) -> fmt::Result {
        for _ in 0..self.indirection.max(0) {
            write!(f, "*")?;
        }
        match (self.base, self.instance_name, &self.return_type) {
            (BaseKind::Instance, Some(name), _) => write!(f, "{}", ctx.ident_interner.get(name)),
            (BaseKind::Struct, Some(name), _) => {
                write!(f, "struct {}", ctx.ident_interner.get(name))
            }
            (BaseKind::Function, _, Some(ret)) => write!(f, "fn {}", ret.display(ctx)),
            (base, _, _) => write!(f, "{base}"),
        }
    }
}

/// A literal payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(Box<str>),
    Bool(bool),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Str(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// Violations of invariants the front end is supposed to uphold. These are
/// never reported as source diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InternalError {
    #[error("cannot join types {lhs} and {rhs}")]
    IncompatibleJoin { lhs: BaseKind, rhs: BaseKind },
    #[error("dereference below indirection level zero")]
    NegativeIndirection,
    #[error("no backend layout for type {0}")]
    MissingLayout(BaseKind),
}

pub fn is_integer(ty: &Type) -> bool {
    ty.indirection == 0 && ty.base.is_integer()
}

pub fn is_float(ty: &Type) -> bool {
    ty.indirection == 0 && ty.base.is_float()
}

fn is_numeric(ty: &Type) -> bool {
    is_integer(ty) || is_float(ty)
}

/// Reconciles the operand types of a binary expression.
///
/// Operands of the same base kind, and integer or float pairs, keep the left
/// operand, whatever their pointer levels. A mixed pair always yields the
/// float operand, whichever side it is on.
pub fn join(lhs: &Type, rhs: &Type) -> Result<Type, InternalError> {
    if lhs.base == rhs.base {
        return Ok(lhs.clone());
    }
    match (is_float(lhs), is_float(rhs)) {
        _ if is_integer(lhs) && is_integer(rhs) => Ok(lhs.clone()),
        (true, true) => Ok(lhs.clone()),
        (true, false) if is_integer(rhs) => Ok(lhs.clone()),
        (false, true) if is_integer(lhs) => Ok(rhs.clone()),
        _ => Err(InternalError::IncompatibleJoin {
            lhs: lhs.base,
            rhs: rhs.base,
        }),
    }
}

/// Whether an implicit numeric cast between the two types may be attempted.
pub fn compatible(lhs: &Type, rhs: &Type) -> bool {
    is_numeric(lhs) && is_numeric(rhs)
}

/// Coerces the type of a literal expression to `target`, in place.
///
/// Parentheses and negation around the literal are looked through. Float
/// literals cast to an integer type are truncated toward zero. Returns `false`
/// (and leaves the expression untouched) if the expression is not a literal or
/// the types are not compatible.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn cast(target: &Type, expr: &mut Expr) -> bool {
    match &mut expr.kind {
        ExprKind::Literal(literal) => {
            if literal.ty == *target {
                return true;
            }
            if !compatible(target, &literal.ty) {
                return false;
            }
            match (&literal.value, is_float(target)) {
                (Value::Int(v), true) => literal.value = Value::Float(*v as f64),
                (Value::Float(v), false) => literal.value = Value::Int(v.trunc() as i64),
                _ => (),
            }
            literal.ty = target.clone();
            true
        }
        ExprKind::Paren(inner)
        | ExprKind::Unary {
            op: UnaryOperator::Neg,
            expr: inner,
        } => cast(target, inner),
        _ => false,
    }
}

/// Reasons an expression's type can't be inferred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InferError {
    UnknownIdentifier(Ident),
    UnknownMember(Ident),
    NotCallable(Type),
    NotAStruct(Type),
    Internal(InternalError),
}

impl From<InternalError> for InferError {
    fn from(error: InternalError) -> Self {
        InferError::Internal(error)
    }
}

/// Infers the type of an expression against the bindings visible from the
/// table's current scope.
pub fn infer_type<V>(expr: &Expr, symbols: &SymbolTable<V>) -> Result<Type, InferError> {
    match &expr.kind {
        ExprKind::Literal(literal) => Ok(literal.ty.clone()),
        ExprKind::Ident(ident) => symbols
            .get(ident.name)
            .map(|symbol| symbol.ty.clone())
            .ok_or(InferError::UnknownIdentifier(*ident)),
        ExprKind::Paren(inner) => infer_type(inner, symbols),
        ExprKind::Unary { op, expr: inner } => {
            let ty = infer_type(inner, symbols)?;
            match op {
                UnaryOperator::Not => Ok(Type::bool()),
                UnaryOperator::Neg | UnaryOperator::BitNot => Ok(ty),
                UnaryOperator::AddressOf => Ok(ty.with_indirection(1)),
                UnaryOperator::Deref => {
                    let ty = ty.with_indirection(-1);
                    if ty.indirection < 0 {
                        return Err(InternalError::NegativeIndirection.into());
                    }
                    Ok(ty)
                }
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            let lhs = infer_type(lhs, symbols)?;
            let rhs = infer_type(rhs, symbols)?;
            if op.yields_bool() {
                Ok(Type::bool())
            } else {
                Ok(join(&lhs, &rhs)?)
            }
        }
        ExprKind::Cast { ty, .. } => Ok(ty.clone()),
        ExprKind::Call { callee, .. } => {
            let ty = infer_type(callee, symbols)?;
            match ty.return_type() {
                Some(ret) if ty.base == BaseKind::Function => Ok(ret.clone()),
                _ => Err(InferError::NotCallable(ty)),
            }
        }
        // `.` needs a struct value, `->` a pointer to one.
        ExprKind::Member {
            object,
            member,
            deref,
        } => {
            let ty = infer_type(object, symbols)?;
            let members = match (ty.base, ty.instance_name) {
                (BaseKind::Instance, Some(name)) if ty.indirection == i8::from(*deref) => symbols
                    .get(name)
                    .filter(|symbol| symbol.ty.base == BaseKind::Struct)
                    .and_then(|symbol| symbol.scope),
                _ => None,
            };
            let Some(members) = members else {
                return Err(InferError::NotAStruct(ty));
            };
            symbols
                .get_in(members, member.name)
                .map(|symbol| symbol.ty.clone())
                .ok_or(InferError::UnknownMember(*member))
        }
    }
}

/// Implemented by symbol values that know the backend layout of the struct
/// they are bound to.
pub trait BackendValue {
    fn aggregate_type(&self) -> Option<&IrType>;
}

/// Backend type of a base kind that needs no symbol lookup.
pub fn lower_primitive(base: BaseKind) -> Option<IrType> {
    let ty = match base {
        BaseKind::Void => IrType::Void,
        BaseKind::Bool => IrType::Bool,
        BaseKind::I8 => IrType::I8,
        BaseKind::I16 => IrType::I16,
        BaseKind::I32 => IrType::I32,
        BaseKind::I64 => IrType::I64,
        BaseKind::F32 => IrType::F32,
        BaseKind::F64 => IrType::F64,
        BaseKind::Str => IrType::ptr(IrType::I8),
        _ => return None,
    };
    Some(ty)
}

/// Maps a source type to its backend type, wrapping it in a pointer once per
/// indirection level.
pub fn lower_to_backend_type<V: BackendValue>(
    ty: &Type,
    symbols: &SymbolTable<V>,
) -> Result<IrType, InternalError> {
    let base = match ty.base {
        BaseKind::Function => {
            let ret = match ty.return_type() {
                Some(ret) => lower_to_backend_type(ret, symbols)?,
                None => IrType::Void,
            };
            IrType::Fn {
                params: Vec::new(),
                ret: Box::new(ret),
            }
        }
        BaseKind::Struct | BaseKind::Instance => ty
            .instance_name
            .and_then(|name| symbols.get(name))
            .and_then(|symbol| symbol.value.aggregate_type())
            .cloned()
            .ok_or(InternalError::MissingLayout(ty.base))?,
        base => lower_primitive(base).ok_or(InternalError::MissingLayout(base))?,
    };
    Ok((0..ty.indirection.max(0)).fold(base, |ty, _| IrType::ptr(ty)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ast::Literal,
        token::{Position, Span},
        util::intern::Interner,
    };

    fn prim(base: BaseKind) -> Type {
        Type::primitive(base)
    }

    fn literal(value: Value, ty: Type) -> Expr {
        Expr {
            kind: ExprKind::Literal(Literal { value, ty }),
            span: Span::new_of_length(0, 1, Position::START),
        }
    }

    #[test]
    fn join_equal_types() {
        assert_eq!(join(&prim(BaseKind::Bool), &prim(BaseKind::Bool)), Ok(prim(BaseKind::Bool)));
        let ptr = prim(BaseKind::I8).with_indirection(1);
        assert_eq!(join(&ptr, &ptr), Ok(ptr.clone()));
    }

    #[test]
    fn join_same_base_ignores_indirection() {
        let (ptr, int) = (prim(BaseKind::I32).with_indirection(1), prim(BaseKind::I32));
        assert_eq!(join(&ptr, &int), Ok(ptr.clone()));
        assert_eq!(join(&int, &ptr), Ok(int.clone()));
    }

    #[test]
    fn join_same_class_keeps_left() {
        let (i8, i64) = (prim(BaseKind::I8), prim(BaseKind::I64));
        assert_eq!(join(&i8, &i64), Ok(i8.clone()));
        assert_eq!(join(&i64, &i8), Ok(i64.clone()));

        let (f32, f64) = (prim(BaseKind::F32), prim(BaseKind::F64));
        assert_eq!(join(&f32, &f64), Ok(f32.clone()));
        assert_eq!(join(&f64, &f32), Ok(f64.clone()));
    }

    #[test]
    fn join_mixed_always_yields_float() {
        let (i64, f32) = (prim(BaseKind::I64), prim(BaseKind::F32));
        assert_eq!(join(&i64, &f32), Ok(f32.clone()));
        assert_eq!(join(&f32, &i64), Ok(f32.clone()));
    }

    #[test]
    fn join_incompatible_is_internal() {
        let mut i = Interner::with_capacity(1);
        let point = Type::instance(i.intern("Point"));
        assert_eq!(
            join(&point, &prim(BaseKind::I32)),
            Err(InternalError::IncompatibleJoin {
                lhs: BaseKind::Instance,
                rhs: BaseKind::I32
            })
        );
        assert!(join(&prim(BaseKind::Str), &prim(BaseKind::F32)).is_err());
    }

    #[test]
    fn compatibility() {
        assert!(compatible(&prim(BaseKind::I32), &prim(BaseKind::I8)));
        assert!(compatible(&prim(BaseKind::F64), &prim(BaseKind::F32)));
        assert!(compatible(&prim(BaseKind::I16), &prim(BaseKind::F64)));
        assert!(!compatible(&prim(BaseKind::Str), &prim(BaseKind::I32)));
        assert!(!compatible(&prim(BaseKind::Bool), &prim(BaseKind::I32)));
        assert!(!compatible(&prim(BaseKind::I32).with_indirection(1), &prim(BaseKind::I32)));
    }

    #[test]
    fn cast_int_literal_to_float() {
        let mut expr = literal(Value::Int(3), prim(BaseKind::I32));
        assert!(cast(&prim(BaseKind::F64), &mut expr));
        let ExprKind::Literal(lit) = &expr.kind else {
            unreachable!()
        };
        assert_eq!(lit.value, Value::Float(3.0));
        assert_eq!(lit.ty, prim(BaseKind::F64));
    }

    #[test]
    fn cast_float_literal_to_int_truncates() {
        let mut expr = literal(Value::Float(-2.75), prim(BaseKind::F32));
        assert!(cast(&prim(BaseKind::I8), &mut expr));
        let ExprKind::Literal(lit) = &expr.kind else {
            unreachable!()
        };
        assert_eq!(lit.value, Value::Int(-2));
    }

    #[test]
    fn cast_rejects_strings_and_non_literals() {
        let mut expr = literal(Value::Str("hi".into()), prim(BaseKind::Str));
        assert!(!cast(&prim(BaseKind::I32), &mut expr));

        let mut i = Interner::with_capacity(1);
        let span = Span::new_of_length(0, 1, Position::START);
        let name = i.intern("x");
        let mut expr = Expr {
            kind: ExprKind::Ident(Ident { name, span }),
            span,
        };
        assert!(!cast(&prim(BaseKind::I64), &mut expr));
    }

    #[test]
    fn cast_sees_through_parens_and_negation() {
        let span = Span::new_of_length(0, 1, Position::START);
        let inner = literal(Value::Int(1), prim(BaseKind::I32));
        let neg = Expr {
            kind: ExprKind::Unary {
                op: UnaryOperator::Neg,
                expr: Box::new(inner),
            },
            span,
        };
        let mut expr = Expr {
            kind: ExprKind::Paren(Box::new(neg)),
            span,
        };
        assert!(cast(&prim(BaseKind::I64), &mut expr));
        let symbols = SymbolTable::<()>::new();
        assert_eq!(infer_type(&expr, &symbols), Ok(prim(BaseKind::I64)));
    }

    #[test]
    fn show_types() {
        let mut i = Interner::with_capacity(2);
        let point = i.intern("Point");
        let ctx = Context { ident_interner: &i };
        let cases = [
            (prim(BaseKind::Str), "string"),
            (prim(BaseKind::I32).with_indirection(2), "**i32"),
            (Type::instance(point), "Point"),
            (Type::structure(point), "struct Point"),
            (Type::function(prim(BaseKind::F32)), "fn f32"),
        ];
        for (ty, expected) in cases {
            assert_eq!(ty.display(&ctx).to_string(), expected);
        }
    }
}
