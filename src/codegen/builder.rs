use crate::ir::{BasicBlock, BlockId, Function, InstrKind, Instruction, IrType, Terminator, VReg};

/// Accumulates the blocks of one function.
///
/// Instructions always go to the most recently started block; lowering never
/// returns to a block once it has moved on.
pub(super) struct FunctionBuilder {
    id: u32,
    func: Function,
    next_vreg: u32,
    next_block: u32,
}

impl FunctionBuilder {
    /// Starts a function with its entry block open. Returns the registers
    /// holding the parameters.
    pub fn new(id: u32, name: String, params: Vec<IrType>, ret_type: IrType) -> (Self, Vec<VReg>) {
        let params: Vec<_> = params.into_iter().zip(0..).map(|(ty, i)| (VReg(i), ty)).collect();
        let regs = params.iter().map(|(reg, _)| *reg).collect();
        let next_vreg = u32::try_from(params.len()).expect("too many parameters");

        let mut builder = FunctionBuilder {
            id,
            func: Function::new(name, params, ret_type),
            next_vreg,
            next_block: 0,
        };
        let entry = builder.fresh_block();
        builder.start_block(entry, "entry");
        (builder, regs)
    }

    /// Identifies the function among all functions of a module.
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.func.name
    }

    pub fn ret_type(&self) -> &IrType {
        &self.func.ret_type
    }

    /// Reserves a block id. The block is only created by
    /// [`start_block`](Self::start_block).
    pub fn fresh_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        id
    }

    pub fn start_block(&mut self, id: BlockId, label: &'static str) {
        self.func.blocks.push(BasicBlock::new(id, Some(label)));
    }

    pub fn emit(&mut self, kind: InstrKind) -> VReg {
        let reg = VReg(self.next_vreg);
        self.next_vreg += 1;
        self.current().instructions.push(Instruction::new(Some(reg), kind));
        reg
    }

    pub fn emit_void(&mut self, kind: InstrKind) {
        self.current().instructions.push(Instruction::new(None, kind));
    }

    /// Closes the current block, unless it is already closed.
    pub fn terminate(&mut self, terminator: Terminator) {
        self.current().terminator.get_or_insert(terminator);
    }

    pub fn is_terminated(&self) -> bool {
        self.func
            .blocks
            .last()
            .is_some_and(|block| block.terminator.is_some())
    }

    /// Closes every open block. Falling off the end returns from void
    /// functions and is unreachable in any other.
    pub fn finish(mut self) -> Function {
        let fallback = if self.func.ret_type == IrType::Void {
            Terminator::Ret(None)
        } else {
            Terminator::Unreachable
        };
        for block in &mut self.func.blocks {
            block.terminator.get_or_insert_with(|| fallback.clone());
        }
        self.func
    }

    fn current(&mut self) -> &mut BasicBlock {
        self.func
            .blocks
            .last_mut()
            .expect("a function always has an entry block")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Constant;

    #[test]
    fn registers_follow_parameters() {
        let (mut b, regs) = FunctionBuilder::new(0, "f".into(), vec![IrType::I32, IrType::F64], IrType::I32);
        assert_eq!(regs, [VReg(0), VReg(1)]);
        assert_eq!(b.emit(InstrKind::Const(IrType::I32, Constant::Int(1))), VReg(2));
    }

    #[test]
    fn terminate_keeps_first_terminator() {
        let (mut b, _) = FunctionBuilder::new(0, "f".into(), Vec::new(), IrType::Void);
        assert!(!b.is_terminated());
        b.terminate(Terminator::Ret(None));
        b.terminate(Terminator::Unreachable);
        assert!(b.is_terminated());
        assert_eq!(b.finish().blocks[0].terminator, Some(Terminator::Ret(None)));
    }

    #[test]
    fn finish_seals_open_blocks() {
        let (mut b, _) = FunctionBuilder::new(0, "f".into(), Vec::new(), IrType::I32);
        let next = b.fresh_block();
        b.terminate(Terminator::Br(next));
        b.start_block(next, "next");

        let func = b.finish();
        let terminators: Vec<_> = func.blocks.iter().map(|b| b.terminator.clone()).collect();
        assert_eq!(
            terminators,
            [Some(Terminator::Br(BlockId(1))), Some(Terminator::Unreachable)]
        );
    }
}
