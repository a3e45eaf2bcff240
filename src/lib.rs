mod alu;
mod config;
mod debugger;
mod decode;
mod driver;
mod engine;
mod error;
mod loader;
mod memory;
mod register;
mod sign_extend;
mod snapshot;
mod stack;
mod trap;
mod trap_io;

pub use crate::config::Config;
pub use crate::loader::Format;
use crate::driver::Driver;
use crate::trap_io::StdTrapIo;
use std::error::Error;

pub fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let mut driver = Driver::new();
    driver.load_program(&config.filename, config.format())?;
    let mut handler = StdTrapIo;

    if config.debug {
        debugger::run(driver, &mut handler);
    } else {
        run_to_completion(&mut driver, &mut handler);
    }

    Ok(())
}

fn run_to_completion(driver: &mut Driver, handler: &mut StdTrapIo) {
    while !driver.engine().is_halted() {
        driver.step(handler);
    }
}
