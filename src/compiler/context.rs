//! Context information threaded through compilation of one class:
//! both symbol-table scopes, the per-subroutine flow-label counters
//! and the VM output under construction.

use crate::common::vm;

use super::symbols::SymbolTable;

#[derive(Debug, Default)]
pub struct ClassContext {
    pub class_name: String,
    pub class_table: SymbolTable,
    pub subroutine_table: SymbolTable,
    pub flow: FlowLabels,
    pub output: vm::VmModule,
}

impl ClassContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-subroutine protocol: the subroutine scope and the flow-label
    /// counters restart with every subroutine declaration.
    pub fn enter_subroutine(&mut self) {
        self.subroutine_table.reset();
        self.flow.reset();
    }
}

/// Counters behind `IF_*`/`WHILE_*` label uniquing. Both reset at
/// subroutine start, so label numbers are per-subroutine.
#[derive(Debug, Default)]
pub struct FlowLabels {
    if_index: u16,
    while_index: u16,
}

impl FlowLabels {
    fn reset(&mut self) {
        self.if_index = 0;
        self.while_index = 0;
    }

    pub fn next_if(&mut self) -> u16 {
        let index = self.if_index;
        self.if_index += 1;
        index
    }

    pub fn next_while(&mut self) -> u16 {
        let index = self.while_index;
        self.while_index += 1;
        index
    }
}
