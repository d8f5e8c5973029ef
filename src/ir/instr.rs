use std::fmt;

use super::types::{write_list, BlockId, Constant, IrType, VReg};

#[derive(Debug, Clone)]
pub struct Instruction {
    /// `None` for instructions that produce no value.
    pub result: Option<VReg>,
    pub kind: InstrKind,
}

impl Instruction {
    pub fn new(result: Option<VReg>, kind: InstrKind) -> Self {
        Instruction { result, kind }
    }
}

#[derive(Debug, Clone)]
pub enum InstrKind {
    Const(IrType, Constant),

    Add(VReg, VReg),
    Sub(VReg, VReg),
    Mul(VReg, VReg),
    Neg(VReg),
    FAdd(VReg, VReg),
    FSub(VReg, VReg),
    FMul(VReg, VReg),
    FDiv(VReg, VReg),
    FNeg(VReg),

    And(VReg, VReg),
    Or(VReg, VReg),
    Xor(VReg, VReg),
    Shl(VReg, VReg),
    /// Sign-extending shift.
    AShr(VReg, VReg),
    Not(VReg),

    ICmp(CmpOp, VReg, VReg),
    FCmp(CmpOp, VReg, VReg),

    SExt(VReg, IrType),
    ZExt(VReg, IrType),
    Trunc(VReg, IrType),
    FPToSI(VReg, IrType),
    SIToFP(VReg, IrType),
    FPExt(VReg, IrType),
    FPTrunc(VReg, IrType),
    PtrToInt(VReg, IrType),
    IntToPtr(VReg, IrType),

    /// Reserves a stack slot in the current function.
    Alloca(IrType),
    Load { ptr: VReg, ty: IrType },
    /// Stores the value (second) through the pointer (first).
    Store(VReg, VReg),
    /// Address of a struct field.
    GetFieldPtr(VReg, u32),

    Call { func: String, args: Vec<VReg> },
    CallPtr { ptr: VReg, args: Vec<VReg> },
    FuncRef(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Signed integer predicate.
    pub fn int_name(self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Lt => "slt",
            CmpOp::Le => "sle",
            CmpOp::Gt => "sgt",
            CmpOp::Ge => "sge",
        }
    }

    /// Ordered float predicate.
    pub fn float_name(self) -> &'static str {
        match self {
            CmpOp::Eq => "oeq",
            CmpOp::Ne => "one",
            CmpOp::Lt => "olt",
            CmpOp::Le => "ole",
            CmpOp::Gt => "ogt",
            CmpOp::Ge => "oge",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Terminator {
    Ret(Option<VReg>),
    Br(BlockId),
    CondBr {
        cond: VReg,
        then_block: BlockId,
        else_block: BlockId,
    },
    Unreachable,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(result) = self.result {
            write!(f, "{result} = ")?;
        }
        match &self.kind {
            InstrKind::Const(ty, c) => write!(f, "const {ty} {c}"),
            InstrKind::Add(a, b) => write!(f, "add {a}, {b}"),
            InstrKind::Sub(a, b) => write!(f, "sub {a}, {b}"),
            InstrKind::Mul(a, b) => write!(f, "mul {a}, {b}"),
            InstrKind::Neg(v) => write!(f, "neg {v}"),
            InstrKind::FAdd(a, b) => write!(f, "fadd {a}, {b}"),
            InstrKind::FSub(a, b) => write!(f, "fsub {a}, {b}"),
            InstrKind::FMul(a, b) => write!(f, "fmul {a}, {b}"),
            InstrKind::FDiv(a, b) => write!(f, "fdiv {a}, {b}"),
            InstrKind::FNeg(v) => write!(f, "fneg {v}"),
            InstrKind::And(a, b) => write!(f, "and {a}, {b}"),
            InstrKind::Or(a, b) => write!(f, "or {a}, {b}"),
            InstrKind::Xor(a, b) => write!(f, "xor {a}, {b}"),
            InstrKind::Shl(a, b) => write!(f, "shl {a}, {b}"),
            InstrKind::AShr(a, b) => write!(f, "ashr {a}, {b}"),
            InstrKind::Not(v) => write!(f, "not {v}"),
            InstrKind::ICmp(op, a, b) => write!(f, "icmp {} {a}, {b}", op.int_name()),
            InstrKind::FCmp(op, a, b) => write!(f, "fcmp {} {a}, {b}", op.float_name()),
            InstrKind::SExt(v, ty) => write!(f, "sext {v} to {ty}"),
            InstrKind::ZExt(v, ty) => write!(f, "zext {v} to {ty}"),
            InstrKind::Trunc(v, ty) => write!(f, "trunc {v} to {ty}"),
            InstrKind::FPToSI(v, ty) => write!(f, "fptosi {v} to {ty}"),
            InstrKind::SIToFP(v, ty) => write!(f, "sitofp {v} to {ty}"),
            InstrKind::FPExt(v, ty) => write!(f, "fpext {v} to {ty}"),
            InstrKind::FPTrunc(v, ty) => write!(f, "fptrunc {v} to {ty}"),
            InstrKind::PtrToInt(v, ty) => write!(f, "ptrtoint {v} to {ty}"),
            InstrKind::IntToPtr(v, ty) => write!(f, "inttoptr {v} to {ty}"),
            InstrKind::Alloca(ty) => write!(f, "alloca {ty}"),
            InstrKind::Load { ptr, ty } => write!(f, "load {ty}, {ptr}"),
            InstrKind::Store(ptr, val) => write!(f, "store {ptr}, {val}"),
            InstrKind::GetFieldPtr(ptr, idx) => write!(f, "getfieldptr {ptr}, 0, {idx}"),
            InstrKind::Call { func, args } => {
                write!(f, "call @{func}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            InstrKind::CallPtr { ptr, args } => {
                write!(f, "callptr {ptr}(")?;
                write_list(f, args)?;
                write!(f, ")")
            }
            InstrKind::FuncRef(name) => write!(f, "funcref @{name}"),
        }
    }
}

impl fmt::Display for Terminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminator::Ret(None) => write!(f, "ret void"),
            Terminator::Ret(Some(v)) => write!(f, "ret {v}"),
            Terminator::Br(block) => write!(f, "br {block}"),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => write!(f, "br {cond}, {then_block}, {else_block}"),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_display() {
        let cases = [
            (
                Instruction::new(Some(VReg(3)), InstrKind::Const(IrType::I32, Constant::Int(5))),
                "%3 = const i32 5",
            ),
            (
                Instruction::new(Some(VReg(2)), InstrKind::FCmp(CmpOp::Lt, VReg(0), VReg(1))),
                "%2 = fcmp olt %0, %1",
            ),
            (
                Instruction::new(Some(VReg(2)), InstrKind::ICmp(CmpOp::Ge, VReg(0), VReg(1))),
                "%2 = icmp sge %0, %1",
            ),
            (
                Instruction::new(None, InstrKind::Store(VReg(0), VReg(1))),
                "store %0, %1",
            ),
            (
                Instruction::new(
                    Some(VReg(4)),
                    InstrKind::Call {
                        func: "printf".into(),
                        args: vec![VReg(1), VReg(2)],
                    },
                ),
                "%4 = call @printf(%1, %2)",
            ),
            (
                Instruction::new(Some(VReg(1)), InstrKind::GetFieldPtr(VReg(0), 0)),
                "%1 = getfieldptr %0, 0, 0",
            ),
        ];
        for (instruction, expected) in cases {
            assert_eq!(instruction.to_string(), expected);
        }
    }

    #[test]
    fn terminator_display() {
        let cond_br = Terminator::CondBr {
            cond: VReg(0),
            then_block: BlockId(1),
            else_block: BlockId(2),
        };
        assert_eq!(cond_br.to_string(), "br %0, bb1, bb2");
        assert_eq!(Terminator::Ret(None).to_string(), "ret void");
    }
}
