use std::fmt;

use super::instr::{Instruction, Terminator};

/// A virtual register, assigned once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VReg(pub u32);

impl fmt::Display for VReg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrType {
    Void,
    /// One bit.
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Ptr(Box<IrType>),
    /// Fields in declaration order.
    Struct(Vec<IrType>),
    Fn {
        params: Vec<IrType>,
        ret: Box<IrType>,
    },
}

impl IrType {
    pub fn ptr(inner: IrType) -> Self {
        IrType::Ptr(Box::new(inner))
    }

    pub fn is_ptr(&self) -> bool {
        matches!(self, IrType::Ptr(_))
    }

    pub fn is_int(&self) -> bool {
        matches!(self, IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
    }

    pub fn is_float(&self) -> bool {
        matches!(self, IrType::F32 | IrType::F64)
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, IrType::Struct(_))
    }

    /// Width in bits of integer and float types, `None` for anything else.
    pub fn bits(&self) -> Option<u32> {
        match self {
            IrType::Bool => Some(1),
            IrType::I8 => Some(8),
            IrType::I16 => Some(16),
            IrType::I32 | IrType::F32 => Some(32),
            IrType::I64 | IrType::F64 => Some(64),
            _ => None,
        }
    }

    pub fn pointee(&self) -> Option<&IrType> {
        match self {
            IrType::Ptr(inner) => Some(inner),
            _ => None,
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Void => write!(f, "void"),
            IrType::Bool => write!(f, "i1"),
            IrType::I8 => write!(f, "i8"),
            IrType::I16 => write!(f, "i16"),
            IrType::I32 => write!(f, "i32"),
            IrType::I64 => write!(f, "i64"),
            IrType::F32 => write!(f, "f32"),
            IrType::F64 => write!(f, "f64"),
            IrType::Ptr(inner) => write!(f, "*{inner}"),
            IrType::Struct(fields) => {
                write!(f, "{{")?;
                write_list(f, fields)?;
                write!(f, "}}")
            }
            IrType::Fn { params, ret } => {
                write!(f, "fn(")?;
                write_list(f, params)?;
                write!(f, ") {ret}")
            }
        }
    }
}

/// A lowered program.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub name: String,
    pub structs: Vec<StructLayout>,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Module {
            name: name.into(),
            ..Module::default()
        }
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|func| func.name == name)
    }
}

#[derive(Debug, Clone)]
pub struct StructLayout {
    pub name: String,
    pub fields: Vec<(String, IrType)>,
}

impl StructLayout {
    pub fn ty(&self) -> IrType {
        IrType::Struct(self.fields.iter().map(|(_, ty)| ty.clone()).collect())
    }
}

#[derive(Debug, Clone)]
pub struct Function {
    pub name: String,
    pub params: Vec<(VReg, IrType)>,
    pub ret_type: IrType,
    /// Empty for external functions.
    pub blocks: Vec<BasicBlock>,
    pub is_external: bool,
    pub is_vararg: bool,
}

impl Function {
    pub fn new(name: impl Into<String>, params: Vec<(VReg, IrType)>, ret_type: IrType) -> Self {
        Function {
            name: name.into(),
            params,
            ret_type,
            blocks: Vec::new(),
            is_external: false,
            is_vararg: false,
        }
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.blocks.iter().flat_map(|block| &block.instructions)
    }
}

#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: Option<&'static str>,
    pub instructions: Vec<Instruction>,
    /// `None` while the block is still being filled.
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId, label: Option<&'static str>) -> Self {
        BasicBlock {
            id,
            label,
            instructions: Vec::new(),
            terminator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(Box<str>),
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Int(v) => write!(f, "{v}"),
            Constant::Float(v) => write!(f, "{v:?}"),
            Constant::Bool(v) => write!(f, "{v}"),
            Constant::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; module {}", self.name)?;
        for layout in &self.structs {
            writeln!(f, "struct {} = {}", layout.name, layout.ty())?;
        }
        for func in &self.functions {
            writeln!(f)?;
            write!(f, "{func}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = if self.is_external { "declare" } else { "define" };
        write!(f, "{keyword} {} @{}(", self.ret_type, self.name)?;
        for (i, (reg, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if self.is_external {
                write!(f, "{ty}")?;
            } else {
                write!(f, "{ty} {reg}")?;
            }
        }
        if self.is_vararg {
            let sep = if self.params.is_empty() { "" } else { ", " };
            write!(f, "{sep}...")?;
        }
        if self.is_external {
            return writeln!(f, ")");
        }

        writeln!(f, ") {{")?;
        for block in &self.blocks {
            write!(f, "{block}")?;
        }
        writeln!(f, "}}")
    }
}

impl fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => writeln!(f, "{}: ; {label}", self.id)?,
            None => writeln!(f, "{}:", self.id)?,
        }
        for instruction in &self.instructions {
            writeln!(f, "  {instruction}")?;
        }
        if let Some(terminator) = &self.terminator {
            writeln!(f, "  {terminator}")?;
        }
        Ok(())
    }
}

pub(super) fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::InstrKind;

    #[test]
    fn types_display() {
        assert_eq!(IrType::ptr(IrType::ptr(IrType::I8)).to_string(), "**i8");
        assert_eq!(IrType::Struct(vec![IrType::I32, IrType::F64]).to_string(), "{i32, f64}");
        let fn_ty = IrType::Fn {
            params: vec![IrType::Bool],
            ret: Box::new(IrType::Void),
        };
        assert_eq!(fn_ty.to_string(), "fn(i1) void");
    }

    #[test]
    fn function_display() {
        let mut printf = Function::new("printf", vec![(VReg(0), IrType::ptr(IrType::I8))], IrType::I32);
        printf.is_external = true;
        printf.is_vararg = true;

        let mut id = Function::new("id", vec![(VReg(0), IrType::I64)], IrType::I64);
        let mut entry = BasicBlock::new(BlockId(0), None);
        entry.instructions.push(Instruction::new(
            Some(VReg(1)),
            InstrKind::Add(VReg(0), VReg(0)),
        ));
        entry.terminator = Some(Terminator::Ret(Some(VReg(1))));
        id.blocks.push(entry);

        let module = Module {
            name: "test".into(),
            structs: vec![StructLayout {
                name: "P".into(),
                fields: vec![("x".into(), IrType::I32)],
            }],
            functions: vec![printf, id],
        };
        let expected = "\
; module test
struct P = {i32}

declare i32 @printf(*i8, ...)

define i64 @id(i64 %0) {
bb0:
  %1 = add %0, %0
  ret %1
}
";
        assert_eq!(module.to_string(), expected);
    }
}
