use crate::alu::Alu;
use crate::decode::{decode, Decoded, Opcode};
use crate::memory::{Memory, BASE};
use crate::register::{Register, Registers};
use crate::snapshot::Snapshot;
use crate::stack;
use crate::trap::{TrapHandler, TrapVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Microstate {
    Fetch,
    Decode,
    EvalAddr,
    FetchOp,
    Execute,
    Store,
}

pub struct Engine {
    registers: Registers,
    memory: Memory,
    alu: Alu,
    pc: u16,
    ir: u16,
    mar: u16,
    mdr: u16,

    starting_address: u16,
    halted: bool,
    file_loaded: bool,

    microstate: Microstate,
    decoded: Option<Decoded>,
    /// Effective address computed at EVAL_ADDR; reused by FETCH_OP/STORE.
    effective_address: u16,
    /// BR's computed branch target, set only if the branch is taken.
    branch_target: Option<u16>,
    /// JMP/RET/JSR/JSRR's computed jump target.
    jump_target: u16,
}

impl Engine {
    pub fn new() -> Engine {
        let mut engine = Engine {
            registers: Registers::new(),
            memory: Memory::new(),
            alu: Alu::new(),
            pc: BASE,
            ir: 0,
            mar: 0,
            mdr: 0,
            starting_address: BASE,
            halted: false,
            file_loaded: false,
            microstate: Microstate::Fetch,
            decoded: None,
            effective_address: 0,
            branch_target: None,
            jump_target: 0,
        };
        engine.registers.set_raw(Register::R6, stack::STACK_BASE);
        engine
    }

    /// Reinitialises the engine without reallocating memory.
    pub fn reset(&mut self) {
        self.registers.reset();
        self.memory.reset();
        self.alu.reset();
        self.pc = BASE;
        self.ir = 0;
        self.mar = 0;
        self.mdr = 0;
        self.starting_address = BASE;
        self.halted = false;
        self.file_loaded = false;
        self.microstate = Microstate::Fetch;
        self.decoded = None;
        self.effective_address = 0;
        self.branch_target = None;
        self.jump_target = 0;
        self.registers.set_raw(Register::R6, stack::STACK_BASE);
    }

    // -- register file / condition codes ------------------------------

    pub fn get_register(&self, register: Register) -> u16 {
        self.registers.get(register)
    }

    pub fn set_register(&mut self, register: Register, value: u16) {
        self.registers.set(register, value);
    }

    pub fn get_cc_n(&self) -> bool {
        self.registers.cc_n()
    }

    pub fn get_cc_z(&self) -> bool {
        self.registers.cc_z()
    }

    pub fn get_cc_p(&self) -> bool {
        self.registers.cc_p()
    }

    // -- special registers ---------------------------------------------

    pub fn get_pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    pub fn increment_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    pub fn increment_pc_by(&mut self, offset: u16) {
        self.pc = self.pc.wrapping_add(offset);
    }

    pub fn get_ir(&self) -> u16 {
        self.ir
    }

    pub fn set_ir(&mut self, value: u16) {
        self.ir = value;
    }

    pub fn get_mar(&self) -> u16 {
        self.mar
    }

    pub fn set_mar(&mut self, value: u16) {
        self.mar = value;
    }

    pub fn get_mdr(&self) -> u16 {
        self.mdr
    }

    pub fn set_mdr(&mut self, value: u16) {
        self.mdr = value;
    }

    // -- memory ----------------------------------------------------------

    pub fn memory_read(&self, address: u16) -> u16 {
        self.memory.read(address)
    }

    pub fn memory_write(&mut self, address: u16, value: u16) {
        self.memory.write(address, value);
    }

    pub fn set_memory(&mut self, address: u16, value: u16) {
        self.memory_write(address, value);
    }

    // -- lifecycle flags ---------------------------------------------------

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn toggle_halted(&mut self) {
        self.halted = !self.halted;
    }

    pub fn is_file_loaded(&self) -> bool {
        self.file_loaded
    }

    pub fn toggle_file_loaded(&mut self) {
        self.file_loaded = !self.file_loaded;
    }

    pub fn get_starting_address(&self) -> u16 {
        self.starting_address
    }

    /// Sets the starting address for the loaded program and also the PC.
    pub fn set_starting_address(&mut self, address: u16) {
        self.starting_address = address;
        self.pc = address;
    }

    pub fn microstate(&self) -> Microstate {
        self.microstate
    }

    pub fn decoded_opcode(&self) -> Option<Opcode> {
        self.decoded.map(|d| d.opcode)
    }

    // -- snapshot ----------------------------------------------------------

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            registers: self.registers.snapshot(),
            pc: self.pc,
            ir: self.ir,
            mar: self.mar,
            mdr: self.mdr,
            condition: self.registers.condition(),
            alu_a: self.alu.a(),
            alu_b: self.alu.b(),
            alu_result: self.alu.fetch_result(),
            memory: self.memory.snapshot(),
            starting_address: self.starting_address,
            file_loaded: self.file_loaded,
            halted: self.halted,
        }
    }

    // -- microphases ---------------------------------------------------

    // MAR <- PC; PC <- PC+1; MDR <- mem[MAR]; IR <- MDR.
    pub fn fetch(&mut self) {
        self.mar = self.pc;
        self.increment_pc();
        self.mdr = self.memory.read(self.mar);
        self.ir = self.mdr;
        self.microstate = Microstate::Decode;
    }

    pub fn decode(&mut self) {
        self.decoded = Some(decode(self.ir));
        self.microstate = Microstate::EvalAddr;
    }

    // Computes effective addresses / branch-and-jump targets. A no-op
    // for opcodes that don't use this phase.
    pub fn eval_addr(&mut self) {
        let d = self.current_decoded();
        match d.opcode {
            Opcode::Br => {
                let taken = (d.nzp.n && self.registers.cc_n())
                    || (d.nzp.z && self.registers.cc_z())
                    || (d.nzp.p && self.registers.cc_p());
                self.branch_target = if taken {
                    Some(self.pc.wrapping_add(d.offset9))
                } else {
                    None
                };
            }
            Opcode::Ld | Opcode::Ldi | Opcode::St | Opcode::Sti => {
                self.effective_address = self.pc.wrapping_add(d.offset9);
                self.mar = self.effective_address;
            }
            Opcode::Ldr | Opcode::Str => {
                self.effective_address = self.registers.get(d.base_r).wrapping_add(d.offset6);
                self.mar = self.effective_address;
            }
            Opcode::Lea => {
                self.effective_address = self.pc.wrapping_add(d.offset9);
            }
            Opcode::Jmp => {
                self.jump_target = self.registers.get(d.base_r);
            }
            Opcode::Jsr => {
                self.jump_target = if d.jsr_mode {
                    self.pc.wrapping_add(d.offset11)
                } else {
                    self.registers.get(d.base_r)
                };
            }
            Opcode::Add | Opcode::And | Opcode::Not | Opcode::Stack | Opcode::Trap => {}
            Opcode::Unused => panic!("attempted to execute the unused opcode 1000"),
        }
        self.microstate = Microstate::FetchOp;
    }

    /// FETCH_OP: loads ALU inputs / MDR from memory or registers.
    pub fn fetch_operands(&mut self) {
        let d = self.current_decoded();
        match d.opcode {
            Opcode::Add | Opcode::And => {
                self.alu.load_a(self.registers.get(d.sr1));
                let b = if d.imm_mode {
                    d.imm5
                } else {
                    self.registers.get(d.sr2)
                };
                self.alu.load_b(b);
            }
            Opcode::Not => {
                self.alu.load_a(self.registers.get(d.sr1));
            }
            Opcode::Ld | Opcode::Ldr => {
                self.mdr = self.memory.read(self.mar);
            }
            Opcode::Ldi => {
                self.mdr = self.memory.read(self.mar);
                self.mar = self.mdr;
                self.mdr = self.memory.read(self.mar);
            }
            Opcode::St | Opcode::Str => {
                self.mdr = self.registers.get(d.dr);
            }
            Opcode::Sti => {
                self.mdr = self.memory.read(self.mar);
                self.mar = self.mdr;
                self.mdr = self.registers.get(d.dr);
            }
            Opcode::Trap => {
                self.mar = d.trapvect8;
            }
            Opcode::Br | Opcode::Jmp | Opcode::Jsr | Opcode::Lea | Opcode::Stack => {}
            Opcode::Unused => unreachable!("eval_addr already rejected Unused"),
        }
        self.microstate = Microstate::Execute;
    }

    // Runs the ALU, redirects PC, or calls out to the trap dispatcher.
    pub fn execute(&mut self, handler: &mut dyn TrapHandler) {
        let d = self.current_decoded();
        match d.opcode {
            Opcode::Add => self.alu.add(),
            Opcode::And => self.alu.and(),
            Opcode::Not => self.alu.not(),
            Opcode::Br => {
                if let Some(target) = self.branch_target {
                    self.pc = target;
                }
            }
            Opcode::Trap => {
                self.dispatch_trap(handler);
            }
            Opcode::Ld
            | Opcode::Ldi
            | Opcode::Ldr
            | Opcode::St
            | Opcode::Sti
            | Opcode::Str
            | Opcode::Jmp
            | Opcode::Jsr
            | Opcode::Lea
            | Opcode::Stack => {}
            Opcode::Unused => unreachable!("eval_addr already rejected Unused"),
        }
        self.microstate = Microstate::Store;
    }

    /// STORE: writes the ALU result, MDR, or jump target back.
    pub fn store(&mut self) {
        let d = self.current_decoded();
        match d.opcode {
            Opcode::Add | Opcode::And | Opcode::Not => {
                self.registers.set(d.dr, self.alu.fetch_result());
            }
            Opcode::Ld | Opcode::Ldi | Opcode::Ldr => {
                self.registers.set(d.dr, self.mdr);
            }
            Opcode::Lea => {
                self.registers.set(d.dr, self.effective_address);
            }
            Opcode::St | Opcode::Sti | Opcode::Str => {
                self.memory.write(self.mar, self.mdr);
            }
            Opcode::Jmp => {
                self.registers.set_raw(Register::R7, self.pc);
                self.pc = self.jump_target;
            }
            Opcode::Jsr => {
                self.registers.set_raw(Register::R7, self.pc);
                self.pc = self.jump_target;
            }
            Opcode::Stack => {
                if d.stack_push {
                    stack::push(
                        &mut self.registers,
                        &mut self.memory,
                        &mut self.mar,
                        &mut self.mdr,
                        d.dr,
                    );
                } else {
                    stack::pop(
                        &mut self.registers,
                        &mut self.memory,
                        &mut self.mar,
                        &mut self.mdr,
                        d.dr,
                    );
                }
            }
            Opcode::Br | Opcode::Trap => {}
            Opcode::Unused => unreachable!("eval_addr already rejected Unused"),
        }
        self.microstate = Microstate::Fetch;
    }

    fn current_decoded(&self) -> Decoded {
        self.decoded.expect("decode() must run before this microphase")
    }

    /// Drives exactly one full microphase walk, skipping phases the
    /// current opcode doesn't use. A no-op while halted.
    pub fn step(&mut self, handler: &mut dyn TrapHandler) {
        if self.halted {
            return;
        }

        self.fetch();
        self.decode();

        let opcode = self.current_decoded().opcode;
        let phases = PhasesUsed::for_opcode(opcode);

        if phases.eval_addr {
            self.eval_addr();
        } else {
            self.microstate = Microstate::FetchOp;
        }
        if phases.fetch_op {
            self.fetch_operands();
        } else {
            self.microstate = Microstate::Execute;
        }
        if phases.execute {
            self.execute(handler);
        } else {
            self.microstate = Microstate::Store;
        }
        if phases.store {
            self.store();
        } else {
            self.microstate = Microstate::Fetch;
        }
    }

    /// The engine's half of the trap protocol (saving R7, restoring PC)
    /// plus calling out to the injected handler for the outside-world
    /// half. Delegates to the single-call-out methods below so there is
    /// one copy of each trap's register bookkeeping.
    fn dispatch_trap(&mut self, handler: &mut dyn TrapHandler) {
        let vector = (self.mar & 0xFF) as u8;
        self.registers.set_raw(Register::R7, self.pc);
        match TrapVector::from_vector(vector) {
            TrapVector::Getc => {
                let byte = handler.getc();
                self.trap_getc(byte);
            }
            TrapVector::Out => {
                let byte = self.trap_out();
                handler.out(byte);
            }
            TrapVector::Puts => loop {
                let byte = self.trap_puts_next();
                if byte == 0 {
                    break;
                }
                handler.puts_byte(byte);
            },
            TrapVector::Halt => self.trap_halt(),
            TrapVector::Unmapped(vector) => handler.unmapped(vector),
        }
    }

    /// GETC's call-out: R0 gets the supplied byte without touching N/Z/P,
    /// then PC is restored from R7.
    pub fn trap_getc(&mut self, byte: u8) {
        self.registers.set_raw(Register::R0, u16::from(byte));
        self.pc = self.registers.get(Register::R7);
    }

    /// OUT's call-out: returns the low byte of R0, then restores PC from R7.
    pub fn trap_out(&mut self) -> u8 {
        let byte = (self.registers.get(Register::R0) & 0xFF) as u8;
        self.pc = self.registers.get(Register::R7);
        byte
    }

    /// PUTS's call-out: reads the byte at memory[R0], advances R0, and
    /// restores PC from R7. Called repeatedly until it returns 0.
    pub fn trap_puts_next(&mut self) -> u8 {
        let address = self.registers.get(Register::R0);
        let byte = (self.memory.read(address) & 0xFF) as u8;
        self.registers.set_raw(Register::R0, address.wrapping_add(1));
        self.pc = self.registers.get(Register::R7);
        byte
    }

    pub fn trap_halt(&mut self) {
        self.halted = true;
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

/// Which of the four non-universal microphases an opcode uses.
struct PhasesUsed {
    eval_addr: bool,
    fetch_op: bool,
    execute: bool,
    store: bool,
}

impl PhasesUsed {
    fn for_opcode(opcode: Opcode) -> PhasesUsed {
        match opcode {
            Opcode::Br => PhasesUsed { eval_addr: true, fetch_op: false, execute: true, store: false },
            Opcode::Add | Opcode::And | Opcode::Not => {
                PhasesUsed { eval_addr: false, fetch_op: true, execute: true, store: true }
            }
            Opcode::Ld | Opcode::St | Opcode::Ldr | Opcode::Str | Opcode::Ldi | Opcode::Sti => {
                PhasesUsed { eval_addr: true, fetch_op: true, execute: false, store: true }
            }
            Opcode::Jsr | Opcode::Jmp | Opcode::Lea => {
                PhasesUsed { eval_addr: true, fetch_op: false, execute: false, store: true }
            }
            Opcode::Stack => PhasesUsed { eval_addr: false, fetch_op: true, execute: false, store: true },
            Opcode::Trap => PhasesUsed { eval_addr: false, fetch_op: true, execute: true, store: false },
            Opcode::Unused => panic!("attempted to execute the unused opcode 1000"),
        }
    }
}
