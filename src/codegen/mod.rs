use crate::{
    ast::{
        BinaryOperator, Expr, ExprKind, FnDef, Ident, Program, Stmt, StmtKind, StructDef,
        UnaryOperator, VarDef,
    },
    ir::{CmpOp, Constant, Function, InstrKind, IrType, Module, StructLayout, Terminator, VReg},
    symbol::{Attributes, SymbolTable, PRELUDE},
    token::{Span, Spanned},
    types::{self, BackendValue, BaseKind, InferError, InternalError, Type, Value},
    util::intern::{Interned, Interner},
};

mod builder;
#[cfg(test)]
mod tests;

use builder::FunctionBuilder;

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Holds top-level statements other than definitions. Not nameable from
/// source.
pub const INIT_FN: &str = "tav.init";

/// Lowers a checked program.
pub fn generate(
    program: &Program,
    ident_interner: &mut Interner<str>,
    module_name: &str,
) -> Result<Module> {
    Generator::new(ident_interner, module_name).generate(program)
}

/// What a name is bound to during lowering.
#[derive(Clone, Debug, Default)]
pub enum Handle {
    #[default]
    Marker,
    /// A stack slot, only addressable from the function that allocated it.
    Slot { ptr: VReg, ty: IrType, owner: u32 },
    Param { reg: VReg, ty: IrType, owner: u32 },
    Function {
        name: String,
        params: Vec<IrType>,
        ret: IrType,
        variadic: bool,
    },
    Struct(IrType),
    Member,
}

impl BackendValue for Handle {
    fn aggregate_type(&self) -> Option<&IrType> {
        match self {
            Handle::Struct(ty) => Some(ty),
            _ => None,
        }
    }
}

/// A lowered value and its type.
#[derive(Clone, Debug)]
struct Operand {
    reg: VReg,
    ty: IrType,
}

enum Callee {
    Named(String),
    Ptr(VReg),
}

pub struct Generator<'ident> {
    ident_interner: &'ident mut Interner<str>,
    symbols: SymbolTable<Handle>,
    module: Module,
    /// Functions being lowered, innermost last.
    frames: Vec<FunctionBuilder>,
    init: Option<FunctionBuilder>,
    next_fn_id: u32,
}

impl Generator<'_> {
    pub fn new<'ident>(
        ident_interner: &'ident mut Interner<str>,
        module_name: &str,
    ) -> Generator<'ident> {
        Generator {
            ident_interner,
            symbols: SymbolTable::with_capacity(32),
            module: Module::new(module_name),
            frames: Vec::with_capacity(4),
            init: None,
            next_fn_id: 0,
        }
    }

    pub fn generate(mut self, program: &Program) -> Result<Module> {
        self.g_prelude();
        for stmt in &program.stmts {
            self.g_top_level(stmt)?;
        }
        if let Some(init) = self.init.take() {
            self.module.functions.push(init.finish());
        }
        log::debug!(
            "generated {} functions and {} structs",
            self.module.functions.len(),
            self.module.structs.len()
        );
        Ok(self.module)
    }

    fn g_prelude(&mut self) {
        let mut externals = Vec::with_capacity(PRELUDE.len());
        self.symbols.declare_prelude(self.ident_interner, |prelude| {
            let params: Vec<_> = prelude
                .params
                .iter()
                .filter_map(|(_, base)| types::lower_primitive(*base))
                .collect();
            let ret = types::lower_primitive(prelude.ret).unwrap_or(IrType::Void);
            let variadic = prelude.attributes.contains(Attributes::VARIADIC);
            let decl = external(prelude.name.to_owned(), params.clone(), ret.clone(), variadic);
            externals.push(decl);
            Handle::Function {
                name: prelude.name.to_owned(),
                params,
                ret,
                variadic,
            }
        });
        self.module.functions.extend(externals);
    }

    fn g_top_level(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Fn(def) => self.g_fn(def),
            StmtKind::Struct(def) => self.g_struct(def),
            _ => {
                let init = match self.init.take() {
                    Some(init) => init,
                    None => {
                        let id = self.fresh_fn_id();
                        FunctionBuilder::new(id, INIT_FN.to_owned(), Vec::new(), IrType::Void).0
                    }
                };
                self.frames.push(init);
                let result = self.g_stmt(stmt);
                self.init = self.frames.pop();
                result
            }
        }
    }

    fn g_stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            if self.builder().is_terminated() {
                let dead = self.builder().fresh_block();
                self.builder().start_block(dead, "dead");
            }
            self.g_stmt(stmt)?;
        }
        Ok(())
    }

    fn g_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::VarDef(def) => self.g_var_def(def),
            StmtKind::Struct(def) => self.g_struct(def),
            StmtKind::Fn(def) => self.g_fn(def),
            StmtKind::VarSet { target, value } => self.g_var_set(*target, value),
            StmtKind::StructSet { target, value } => {
                let (ptr, ty) = self.g_member_ptr(target)?;
                let value = self.g_converted(value, &ty)?;
                self.builder().emit_void(InstrKind::Store(ptr, value.reg));
                Ok(())
            }
            StmtKind::Expr(expr) => match &expr.kind {
                ExprKind::Call { callee, args } => self.g_call(callee, args).map(drop),
                _ => self.g_value(expr).map(drop),
            },
            StmtKind::Return(value) => self.g_return(value.as_ref()),
            StmtKind::Break | StmtKind::For { .. } => {
                Err(stmt.span.wrap(Error::Unsupported("loops")))
            }
            StmtKind::If {
                cond,
                body,
                elifs,
                else_body,
            } => {
                let arms: Vec<(&Expr, &[Stmt])> = std::iter::once((cond, body.as_slice()))
                    .chain(elifs.iter().map(|elif| (&elif.cond, elif.body.as_slice())))
                    .collect();
                self.g_if(&arms, else_body.as_deref())
            }
            StmtKind::Block(body) => self.scoped(|g| g.g_stmts(body)),
        }
    }

    fn g_var_def(&mut self, def: &VarDef) -> Result<()> {
        let ty = self.lower_type(&def.ty, def.name.span)?;
        let ptr = self.builder().emit(InstrKind::Alloca(ty.clone()));
        if let Some(init) = &def.init {
            let value = self.g_converted(init, &ty)?;
            self.builder().emit_void(InstrKind::Store(ptr, value.reg));
        }
        let owner = self.builder().id();
        let handle = Handle::Slot { ptr, ty, owner };
        self.symbols.add(def.name.name, def.ty.clone(), handle);
        Ok(())
    }

    fn g_var_set(&mut self, target: Ident, value: &Expr) -> Result<()> {
        match self.lookup(target)? {
            Handle::Slot { ptr, ty, owner } => {
                self.check_owner(owner, target.span)?;
                let value = self.g_converted(value, &ty)?;
                self.builder().emit_void(InstrKind::Store(ptr, value.reg));
                Ok(())
            }
            Handle::Param { .. } => {
                Err(target.span.wrap(Error::Unsupported("assignment to a parameter")))
            }
            _ => Err(target.span.wrap(Error::Unsupported("assignment to a non-variable"))),
        }
    }

    fn g_return(&mut self, value: Option<&Expr>) -> Result<()> {
        let reg = match value {
            Some(value) => {
                let ret = self.builder().ret_type().clone();
                Some(self.g_converted(value, &ret)?.reg)
            }
            None => None,
        };
        self.builder().terminate(Terminator::Ret(reg));
        Ok(())
    }

    /// Each arm branches from its condition block to its body, falling through
    /// to the next condition (or the else body) otherwise. All bodies join in a
    /// common block.
    fn g_if(&mut self, arms: &[(&Expr, &[Stmt])], else_body: Option<&[Stmt]>) -> Result<()> {
        let join = self.builder().fresh_block();
        let cond_block = self.builder().fresh_block();
        self.builder().terminate(Terminator::Br(cond_block));
        self.builder().start_block(cond_block, "if.cond");

        let last = arms.len() - 1;
        for (i, (cond, body)) in arms.iter().enumerate() {
            let span = cond.span;
            let cond = self.g_value(cond)?;
            let cond = self.truthy(cond, span)?;
            let then_block = self.builder().fresh_block();
            let else_block = if i == last && else_body.is_none() {
                join
            } else {
                self.builder().fresh_block()
            };
            self.builder().terminate(Terminator::CondBr {
                cond: cond.reg,
                then_block,
                else_block,
            });

            let label = if i == 0 { "if.then" } else { "elif.then" };
            self.builder().start_block(then_block, label);
            self.scoped(|g| g.g_stmts(body))?;
            self.builder().terminate(Terminator::Br(join));

            if else_block != join {
                let label = if i == last { "if.else" } else { "elif.cond" };
                self.builder().start_block(else_block, label);
            }
        }

        if let Some(body) = else_body {
            self.scoped(|g| g.g_stmts(body))?;
            self.builder().terminate(Terminator::Br(join));
        }
        self.builder().start_block(join, "if.end");
        Ok(())
    }

    /// Functions with a body get their own builder, which may nest inside the
    /// builder of an enclosing function.
    fn g_fn(&mut self, def: &FnDef) -> Result<()> {
        let ret = self.lower_type(&def.ret, def.name.span)?;
        let params = def
            .params
            .iter()
            .map(|param| self.lower_param_type(&param.ty, param.name.span))
            .collect::<Result<Vec<_>>>()?;
        let name = self.function_name(def.name.name);

        let handle = Handle::Function {
            name: name.clone(),
            params: params.clone(),
            ret: ret.clone(),
            variadic: def.variadic,
        };
        let symbol = self.symbols.add(def.name.name, def.ty(), handle);
        symbol.attributes.set(Attributes::EXTERNAL, def.body.is_none());
        symbol.attributes.set(Attributes::VARIADIC, def.variadic);

        let Some(body) = &def.body else {
            let func = external(name, params, ret, def.variadic);
            self.module.functions.push(func);
            return Ok(());
        };

        let id = self.fresh_fn_id();
        let (builder, regs) = FunctionBuilder::new(id, name, params.clone(), ret);
        self.frames.push(builder);
        let result = self.scoped(|g| {
            for ((param, reg), ty) in def.params.iter().zip(regs).zip(params) {
                let handle = Handle::Param { reg, ty, owner: id };
                g.symbols.add(param.name.name, param.ty.clone(), handle);
            }
            g.g_stmts(body)
        });
        let builder = self.frames.pop().expect("frame pushed above");
        self.module.functions.push(builder.finish());
        result
    }

    fn g_struct(&mut self, def: &StructDef) -> Result<()> {
        let fields = def
            .members
            .iter()
            .map(|member| {
                let ty = self.lower_type(&member.ty, member.name.span)?;
                Ok((self.ident(member.name).to_owned(), ty))
            })
            .collect::<Result<Vec<_>>>()?;
        let layout = StructLayout {
            name: self.ident(def.name).to_owned(),
            fields,
        };

        let marker = format!("{}_members", layout.name);
        let marker = self.ident_interner.intern(&marker);
        let scope = self.symbols.new_scope(Some(marker));
        for member in &def.members {
            self.symbols.add(member.name.name, member.ty.clone(), Handle::Member);
        }
        self.symbols.pop_scope();

        let ty = Type::structure(def.name.name);
        self.symbols.add(def.name.name, ty, Handle::Struct(layout.ty())).scope = Some(scope);
        self.module.structs.push(layout);
        Ok(())
    }

    fn g_value(&mut self, expr: &Expr) -> Result<Operand> {
        let span = expr.span;
        match &expr.kind {
            ExprKind::Literal(literal) => {
                let ty = self.lower_type(&literal.ty, span)?;
                let constant = match &literal.value {
                    Value::Int(v) => Constant::Int(*v),
                    Value::Float(v) => Constant::Float(*v),
                    Value::Str(v) => Constant::Str(v.clone()),
                    Value::Bool(v) => Constant::Bool(*v),
                };
                Ok(self.emit(InstrKind::Const(ty.clone(), constant), ty))
            }
            ExprKind::Ident(ident) => self.g_ident(*ident),
            ExprKind::Paren(inner) => self.g_value(inner),
            ExprKind::Unary { op, expr: inner } => self.g_unary(*op, inner),
            ExprKind::Binary { op, lhs, rhs } => self.g_binary(*op, lhs, rhs, span),
            ExprKind::Cast { expr: inner, ty } => {
                let ty = self.lower_type(ty, span)?;
                self.g_converted(inner, &ty)
            }
            ExprKind::Call { callee, args } => self
                .g_call(callee, args)?
                .ok_or_else(|| span.wrap(Error::Unsupported("void value used as an operand"))),
            ExprKind::Member { .. } => {
                let (ptr, ty) = self.g_member_ptr(expr)?;
                Ok(self.read(ptr, ty))
            }
        }
    }

    /// Slots are loaded, except for aggregates, which stay behind their slot
    /// pointer. Parameters are used directly.
    fn g_ident(&mut self, ident: Ident) -> Result<Operand> {
        match self.lookup(ident)? {
            Handle::Slot { ptr, ty, owner } => {
                self.check_owner(owner, ident.span)?;
                Ok(self.read(ptr, ty))
            }
            Handle::Param { reg, ty, owner } => {
                self.check_owner(owner, ident.span)?;
                Ok(Operand { reg, ty })
            }
            Handle::Function {
                name, params, ret, ..
            } => {
                let ty = IrType::Fn {
                    params,
                    ret: Box::new(ret),
                };
                Ok(self.emit(InstrKind::FuncRef(name), ty))
            }
            Handle::Struct(_) | Handle::Member | Handle::Marker => {
                Err(ident.span.wrap(Error::Unsupported("type name used as a value")))
            }
        }
    }

    /// Address-of and dereference reinterpret bits between integers and
    /// pointers. Only one level of indirection over integers is supported.
    fn g_unary(&mut self, op: UnaryOperator, inner: &Expr) -> Result<Operand> {
        let span = inner.span;
        let value = self.g_value(inner)?;
        let ty = value.ty.clone();
        let (kind, ty) = match op {
            UnaryOperator::Neg if ty.is_float() => (InstrKind::FNeg(value.reg), ty),
            UnaryOperator::Neg if ty.is_int() => (InstrKind::Neg(value.reg), ty),
            UnaryOperator::Not => {
                let value = self.truthy(value, span)?;
                (InstrKind::Not(value.reg), IrType::Bool)
            }
            UnaryOperator::BitNot if ty.is_int() || ty == IrType::Bool => {
                (InstrKind::Not(value.reg), ty)
            }
            UnaryOperator::AddressOf if ty.is_int() => {
                let ptr = IrType::ptr(ty);
                (InstrKind::IntToPtr(value.reg, ptr.clone()), ptr)
            }
            UnaryOperator::AddressOf => {
                return Err(span.wrap(Error::Unsupported("address of a non-integer value")));
            }
            UnaryOperator::Deref => match ty.pointee() {
                Some(pointee) if pointee.is_int() => {
                    let pointee = pointee.clone();
                    (InstrKind::PtrToInt(value.reg, pointee.clone()), pointee)
                }
                _ => {
                    let error = Error::Unsupported("dereference of a non-integer pointer");
                    return Err(span.wrap(error));
                }
            },
            _ => return Err(span.wrap(Error::Unsupported("unary operator on this type"))),
        };
        Ok(self.emit(kind, ty))
    }

    /// Operands are converted to their joined type first. Logical operators
    /// evaluate both sides.
    fn g_binary(
        &mut self,
        op: BinaryOperator,
        lhs: &Expr,
        rhs: &Expr,
        span: Span,
    ) -> Result<Operand> {
        if op.is_logical() {
            let l = self.g_value(lhs)?;
            let l = self.truthy(l, lhs.span)?;
            let r = self.g_value(rhs)?;
            let r = self.truthy(r, rhs.span)?;
            let kind = match op {
                BinaryOperator::And => InstrKind::And(l.reg, r.reg),
                _ => InstrKind::Or(l.reg, r.reg),
            };
            return Ok(self.emit(kind, IrType::Bool));
        }

        let joined = types::join(&self.infer(lhs)?, &self.infer(rhs)?)
            .map_err(|error| span.wrap(Error::Internal(error)))?;
        let ty = self.lower_type(&joined, span)?;
        let (l, r) = (self.g_converted(lhs, &ty)?.reg, self.g_converted(rhs, &ty)?.reg);

        let float = ty.is_float();
        let int = ty.is_int() || ty == IrType::Bool;
        if op.is_comparison() {
            let cmp = match op {
                BinaryOperator::Eq => CmpOp::Eq,
                BinaryOperator::Ne => CmpOp::Ne,
                BinaryOperator::Lt => CmpOp::Lt,
                BinaryOperator::Le => CmpOp::Le,
                BinaryOperator::Gt => CmpOp::Gt,
                _ => CmpOp::Ge,
            };
            let kind = if float {
                InstrKind::FCmp(cmp, l, r)
            } else if int || ty.is_ptr() {
                InstrKind::ICmp(cmp, l, r)
            } else {
                return Err(span.wrap(Error::Unsupported("comparison of aggregates")));
            };
            return Ok(self.emit(kind, IrType::Bool));
        }

        use BinaryOperator as B;
        let kind = match op {
            B::Add if float => InstrKind::FAdd(l, r),
            B::Sub if float => InstrKind::FSub(l, r),
            B::Mul if float => InstrKind::FMul(l, r),
            B::Div if float => InstrKind::FDiv(l, r),
            B::Add if int => InstrKind::Add(l, r),
            B::Sub if int => InstrKind::Sub(l, r),
            B::Mul if int => InstrKind::Mul(l, r),
            B::Div if int => return Err(span.wrap(Error::Unsupported("integer division"))),
            B::Rem => return Err(span.wrap(Error::Unsupported("remainder"))),
            B::Shl if int => InstrKind::Shl(l, r),
            B::Shr if int => InstrKind::AShr(l, r),
            B::BitAnd if int => InstrKind::And(l, r),
            B::BitOr if int => InstrKind::Or(l, r),
            B::BitXor if int => InstrKind::Xor(l, r),
            _ => return Err(span.wrap(Error::Unsupported("binary operator on this type"))),
        };
        Ok(self.emit(kind, ty))
    }

    /// Returns `None` for calls to void functions.
    fn g_call(&mut self, callee: &Expr, args: &[Expr]) -> Result<Option<Operand>> {
        let direct = match &callee.kind {
            ExprKind::Ident(ident) => match self.lookup(*ident)? {
                Handle::Function {
                    name,
                    params,
                    ret,
                    variadic,
                } => Some((Callee::Named(name), params, ret, variadic)),
                _ => None,
            },
            _ => None,
        };
        let (target, params, ret, variadic) = match direct {
            Some(direct) => direct,
            None => {
                let func = self.g_value(callee)?;
                match func.ty {
                    IrType::Fn { params, ret } => (Callee::Ptr(func.reg), params, *ret, false),
                    _ => {
                        let error = Error::Unsupported("call of a non-function value");
                        return Err(callee.span.wrap(error));
                    }
                }
            }
        };

        let mut regs = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let value = match params.get(i) {
                Some(ty) => self.g_converted(arg, ty)?,
                None => {
                    let value = self.g_value(arg)?;
                    // Variadic floats are passed as doubles.
                    if variadic && value.ty == IrType::F32 {
                        self.convert(value, &IrType::F64, arg.span)?
                    } else {
                        value
                    }
                }
            };
            regs.push(value.reg);
        }

        let kind = match target {
            Callee::Named(func) => InstrKind::Call { func, args: regs },
            Callee::Ptr(ptr) => InstrKind::CallPtr { ptr, args: regs },
        };
        if ret == IrType::Void {
            self.builder().emit_void(kind);
            Ok(None)
        } else {
            Ok(Some(self.emit(kind, ret)))
        }
    }

    /// Returns the address and type of the member accessed by `expr`. A `.`
    /// access addresses the struct in place, `->` loads a pointer to it first.
    fn g_member_ptr(&mut self, expr: &Expr) -> Result<(VReg, IrType)> {
        let ExprKind::Member { object, deref, .. } = &expr.kind else {
            return Err(expr.span.wrap(Error::Unsupported("assignment target")));
        };
        let ptr = if *deref {
            let object = self.g_value(object)?;
            match object.ty.pointee() {
                Some(pointee) if pointee.is_aggregate() => object.reg,
                _ => {
                    let error = Error::Unsupported("member of a non-struct value");
                    return Err(expr.span.wrap(error));
                }
            }
        } else {
            self.g_address(object)?
        };
        let ty = self.infer(expr)?;
        let ty = self.lower_type(&ty, expr.span)?;
        // TODO: address members by declaration order; every member currently
        // resolves to field 0.
        let field = self.builder().emit(InstrKind::GetFieldPtr(ptr, 0));
        Ok((field, ty))
    }

    /// Address of the struct named by `expr`, without loading it.
    fn g_address(&mut self, expr: &Expr) -> Result<VReg> {
        let what = match &expr.kind {
            ExprKind::Paren(inner) => return self.g_address(inner),
            ExprKind::Member { .. } => return self.g_member_ptr(expr).map(|(ptr, _)| ptr),
            ExprKind::Ident(ident) => match self.lookup(*ident)? {
                Handle::Slot { ptr, ty, owner } if ty.is_aggregate() => {
                    self.check_owner(owner, ident.span)?;
                    return Ok(ptr);
                }
                Handle::Param { reg, ty, owner }
                    if ty.pointee().is_some_and(IrType::is_aggregate) =>
                {
                    self.check_owner(owner, ident.span)?;
                    return Ok(reg);
                }
                _ => "member of a non-struct value",
            },
            _ => "member of a temporary value",
        };
        Err(expr.span.wrap(Error::Unsupported(what)))
    }

    fn g_converted(&mut self, expr: &Expr, target: &IrType) -> Result<Operand> {
        let value = self.g_value(expr)?;
        self.convert(value, target, expr.span)
    }

    /// Numeric conversions, plus loading an aggregate from behind its slot
    /// pointer.
    fn convert(&mut self, value: Operand, target: &IrType, span: Span) -> Result<Operand> {
        if value.ty == *target {
            return Ok(value);
        }
        let (from, reg) = (value.ty.clone(), value.reg);
        let to = target.clone();
        let kind = match (&from, target) {
            (IrType::Bool, t) if t.is_int() => InstrKind::ZExt(reg, to),
            (f, IrType::Bool) if f.is_int() || f.is_float() => return self.truthy(value, span),
            (f, t) if f.is_int() && t.is_int() => {
                if f.bits() < t.bits() {
                    InstrKind::SExt(reg, to)
                } else {
                    InstrKind::Trunc(reg, to)
                }
            }
            (f, t) if f.is_int() && t.is_float() => InstrKind::SIToFP(reg, to),
            (f, t) if f.is_float() && t.is_int() => InstrKind::FPToSI(reg, to),
            (f, t) if f.is_float() && t.is_float() => {
                if f.bits() < t.bits() {
                    InstrKind::FPExt(reg, to)
                } else {
                    InstrKind::FPTrunc(reg, to)
                }
            }
            (IrType::Ptr(pointee), t) if **pointee == *t => InstrKind::Load { ptr: reg, ty: to },
            _ => return Err(span.wrap(Error::Unsupported("conversion between these types"))),
        };
        Ok(self.emit(kind, target.clone()))
    }

    /// Turns a numeric value into an `i1` by comparing it against zero.
    fn truthy(&mut self, value: Operand, span: Span) -> Result<Operand> {
        let ty = value.ty.clone();
        if ty == IrType::Bool {
            return Ok(value);
        }
        let kind = if ty.is_int() {
            let zero = self.emit(InstrKind::Const(ty.clone(), Constant::Int(0)), ty);
            InstrKind::ICmp(CmpOp::Ne, value.reg, zero.reg)
        } else if ty.is_float() {
            let zero = self.emit(InstrKind::Const(ty.clone(), Constant::Float(0.0)), ty);
            InstrKind::FCmp(CmpOp::Ne, value.reg, zero.reg)
        } else {
            return Err(span.wrap(Error::Unsupported("condition of a non-numeric type")));
        };
        Ok(self.emit(kind, IrType::Bool))
    }
}

// Utility functions.
impl Generator<'_> {
    fn builder(&mut self) -> &mut FunctionBuilder {
        self.frames.last_mut().expect("statements are lowered inside a function")
    }

    fn emit(&mut self, kind: InstrKind, ty: IrType) -> Operand {
        let reg = self.builder().emit(kind);
        Operand { reg, ty }
    }

    /// Aggregates are used through their address, anything else is loaded.
    fn read(&mut self, ptr: VReg, ty: IrType) -> Operand {
        if ty.is_aggregate() {
            Operand {
                reg: ptr,
                ty: IrType::ptr(ty),
            }
        } else {
            self.emit(InstrKind::Load { ptr, ty: ty.clone() }, ty)
        }
    }

    fn lookup(&self, ident: Ident) -> Result<Handle> {
        self.symbols
            .get(ident.name)
            .map(|symbol| symbol.value.clone())
            .ok_or_else(|| ident.span.wrap(Error::Unresolved(ident.name)))
    }

    fn check_owner(&mut self, owner: u32, span: Span) -> Result<()> {
        if owner == self.builder().id() {
            Ok(())
        } else {
            Err(span.wrap(Error::Unsupported("reference to another function's local")))
        }
    }

    fn lower_type(&self, ty: &Type, span: Span) -> Result<IrType> {
        types::lower_to_backend_type(ty, &self.symbols).map_err(|error| match error {
            InternalError::MissingLayout(BaseKind::Any) => {
                span.wrap(Error::Unsupported("values of type any"))
            }
            error => span.wrap(Error::Internal(error)),
        })
    }

    /// Struct arguments are passed by address.
    fn lower_param_type(&self, ty: &Type, span: Span) -> Result<IrType> {
        let ty = self.lower_type(ty, span)?;
        Ok(if ty.is_aggregate() { IrType::ptr(ty) } else { ty })
    }

    fn infer(&self, expr: &Expr) -> Result<Type> {
        types::infer_type(expr, &self.symbols).map_err(|error| match error {
            InferError::UnknownIdentifier(ident) | InferError::UnknownMember(ident) => {
                ident.span.wrap(Error::Unresolved(ident.name))
            }
            InferError::NotCallable(_) | InferError::NotAStruct(_) => {
                expr.span.wrap(Error::Unsupported("ill-typed expression"))
            }
            InferError::Internal(error) => expr.span.wrap(Error::Internal(error)),
        })
    }

    /// Names shadowed in nested scopes still get distinct function names.
    fn function_name(&self, name: Interned<str>) -> String {
        let base = self.ident(name);
        let taken = |name: &str| {
            self.module.function(name).is_some() || self.frames.iter().any(|f| f.name() == name)
        };
        let mut unique = base.to_owned();
        let mut n = 1;
        while taken(&unique) {
            unique = format!("{base}.{n}");
            n += 1;
        }
        unique
    }

    fn fresh_fn_id(&mut self) -> u32 {
        let id = self.next_fn_id;
        self.next_fn_id += 1;
        id
    }

    fn ident(&self, name: impl Into<Interned<str>>) -> &str {
        self.ident_interner.get(name)
    }

    fn scoped<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.symbols.new_scope(None);
        let result = f(self);
        self.symbols.pop_scope();
        result
    }
}

fn external(name: String, params: Vec<IrType>, ret: IrType, variadic: bool) -> Function {
    let params = params.into_iter().zip(0..).map(|(ty, i)| (VReg(i), ty)).collect();
    let mut func = Function::new(name, params, ret);
    func.is_external = true;
    func.is_vararg = variadic;
    func
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    Unsupported(&'static str),
    Unresolved(Interned<str>),
    Internal(InternalError),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unsupported(_) => "ERR_UNSUPPORTED",
            Error::Unresolved(_) => "ERR_NO_VAR",
            Error::Internal(_) => "ERR_INTERNAL",
        }
    }
}
