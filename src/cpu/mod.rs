/*!
cpu - 6502 core as found in the NES (2A03, no decimal mode).

Layout:

```text
    state.rs       - Registers, status flags, stack helpers.
    addressing.rs  - Addressing modes and effective address resolution.
    execute.rs     - One function per operation.
    table.rs       - Static opcode table (mnemonic, mode, cycles, penalty, fn).
    core           - `Cpu`: instruction stepping, interrupts, idle cycles, trace.
```

Usage:
```rust,ignore
use famicore::cpu::Cpu;

let mut cpu = Cpu::new();
cpu.reset(&mut bus);
let cycles = cpu.tick(&mut bus)?;
```
*/

pub mod addressing;
pub mod core;
pub mod execute;
pub mod state;
pub mod table;

pub use crate::cpu::addressing::{AddressMode, Operand};
pub use crate::cpu::core::{Cpu, Interrupt, TraceLine};
pub use crate::cpu::state::{
    BREAK, CARRY, CpuState, DECIMAL, IRQ_DISABLE, NEGATIVE, OVERFLOW, StatusFlags, UNUSED, ZERO,
};
pub use crate::cpu::table::{Instruction, decode};

/// Fatal CPU conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CpuError {
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
}
