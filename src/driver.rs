use crate::engine::Engine;
use crate::loader::{self, Format};
use crate::error::LcError;
use crate::snapshot::Snapshot;
use crate::trap::TrapHandler;
use std::collections::HashSet;

pub struct Driver {
    engine: Engine,
    breakpoints: HashSet<u16>,
}

impl Driver {
    pub fn new() -> Driver {
        Driver {
            engine: Engine::new(),
            breakpoints: HashSet::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Loads a program image and positions the engine at its starting address.
    pub fn load_program(&mut self, path: &str, format: Format) -> Result<(), LcError> {
        let image = loader::load(path, format)?;

        self.engine.reset();
        for (offset, word) in image.words.iter().enumerate() {
            let address = image.starting_address.wrapping_add(offset as u16);
            self.engine.set_memory(address, *word);
        }
        self.engine.set_starting_address(image.starting_address);
        if !self.engine.is_file_loaded() {
            self.engine.toggle_file_loaded();
        }

        Ok(())
    }

    pub fn set_memory(&mut self, address: u16, word: u16) {
        self.engine.set_memory(address, word);
    }

    pub fn set_starting_address(&mut self, address: u16) {
        self.engine.set_starting_address(address);
    }

    pub fn add_breakpoint(&mut self, address: u16) {
        self.breakpoints.insert(address);
    }

    pub fn remove_breakpoint(&mut self, address: u16) {
        self.breakpoints.remove(&address);
    }

    pub fn breakpoints(&self) -> &HashSet<u16> {
        &self.breakpoints
    }

    pub fn is_breakpoint(&self, address: u16) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Executes exactly one instruction unless the engine is halted.
    pub fn step(&mut self, handler: &mut dyn TrapHandler) {
        self.engine.step(handler);
    }

    /// Steps repeatedly while the engine is not halted and the current PC
    /// is not a breakpoint. Always takes at least one step, so setting a
    /// breakpoint at the current PC and calling `run_until` steps past it
    /// once before stopping.
    pub fn run_until_breakpoint(&mut self, handler: &mut dyn TrapHandler) {
        loop {
            self.engine.step(handler);
            if self.engine.is_halted() || self.breakpoints.contains(&self.engine.get_pc()) {
                break;
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.engine.snapshot()
    }
}

impl Default for Driver {
    fn default() -> Self {
        Driver::new()
    }
}
