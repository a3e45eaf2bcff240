mod disassemble;

use crate::debugger::disassemble::disassemble;
use crate::driver::Driver;
use crate::trap::TrapHandler;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref READ_REGEX: Regex = Regex::new(r"^read 0x([a-f0-9]{1,4})$").unwrap();
    static ref WRITE_REGEX: Regex = Regex::new(r"^write 0x([a-f0-9]{1,4}) 0x([a-f0-9]{1,4})$").unwrap();
    static ref BREAK_REGEX: Regex = Regex::new(r"^break 0x([a-f0-9]{1,4})$").unwrap();
    static ref UNBREAK_REGEX: Regex = Regex::new(r"^unbreak 0x([a-f0-9]{1,4})$").unwrap();
    static ref JUMP_REGEX: Regex = Regex::new(r"^(?:j|jump) 0x([a-f0-9]{1,4})$").unwrap();
}

fn parse_hex(capture: &str) -> u16 {
    u16::from_str_radix(capture, 16).unwrap()
}

/// Runs the REPL until the user quits or stdin closes.
pub fn run(mut driver: Driver, handler: &mut dyn TrapHandler) {
    let mut rl = rustyline::Editor::<()>::new();
    let mut running = true;

    while running {
        let pc = driver.engine().get_pc();
        let readline = rl.readline(&format!("{:#06x}> ", pc));

        match readline {
            Ok(line) => {
                rl.add_history_entry(line.as_ref());
                running = handle_command(&mut driver, handler, line.trim());
            }
            Err(rustyline::error::ReadlineError::Interrupted) => running = false,
            Err(rustyline::error::ReadlineError::Eof) => running = false,
            Err(err) => {
                println!("Error: {:?}", err);
                running = false;
            }
        }
    }
}

fn handle_command(driver: &mut Driver, handler: &mut dyn TrapHandler, line: &str) -> bool {
    match line {
        "s" | "step" => {
            driver.step(handler);
        }

        "c" | "continue" | "r" | "run" => {
            driver.run_until_breakpoint(handler);
        }

        "i" | "inspect" => {
            let snapshot = driver.snapshot();
            println!(
                "pc: {:#06x} ir: {:#06x} mar: {:#06x} mdr: {:#06x} condition: {:?} halted: {}",
                snapshot.pc, snapshot.ir, snapshot.mar, snapshot.mdr, snapshot.condition, snapshot.halted
            );
            for (i, value) in snapshot.registers.iter().enumerate() {
                println!("R{}: {:#06x}", i, value);
            }
        }

        "d" | "disassemble" => {
            let pc = driver.engine().get_pc();
            let instruction = driver.engine().memory_read(pc);
            println!("{}", disassemble(instruction));
        }

        "h" | "help" => print_help(),

        "exit" | "q" | "quit" => return false,

        "" => {}

        line if READ_REGEX.is_match(line) => {
            let captures = READ_REGEX.captures(line).unwrap();
            let address = parse_hex(&captures[1]);
            let value = driver.engine().memory_read(address);
            println!("{:#06x}: {:#06x} ({:#018b})", address, value, value);
        }

        line if WRITE_REGEX.is_match(line) => {
            let captures = WRITE_REGEX.captures(line).unwrap();
            let address = parse_hex(&captures[1]);
            let value = parse_hex(&captures[2]);
            driver.set_memory(address, value);
            println!("{:#06x} <- {:#06x}", address, value);
        }

        line if BREAK_REGEX.is_match(line) => {
            let address = parse_hex(&BREAK_REGEX.captures(line).unwrap()[1]);
            driver.add_breakpoint(address);
            println!("Breakpoint set at {:#06x}", address);
        }

        line if UNBREAK_REGEX.is_match(line) => {
            let address = parse_hex(&UNBREAK_REGEX.captures(line).unwrap()[1]);
            driver.remove_breakpoint(address);
            println!("Breakpoint cleared at {:#06x}", address);
        }

        line if JUMP_REGEX.is_match(line) => {
            let address = parse_hex(&JUMP_REGEX.captures(line).unwrap()[1]);
            driver.engine_mut().set_pc(address);
            println!("pc <- {:#06x}", address);
        }

        other => println!("Unknown command {:?}", other),
    }

    true
}

fn print_help() {
    println!("s, step                      Execute one instruction.");
    println!("c, continue / r, run         Run until a breakpoint or halt.");
    println!("i, inspect                   Print the full machine snapshot.");
    println!("d, disassemble               Disassemble the instruction at PC.");
    println!("   read 0x<addr>             Read a memory address.");
    println!("   write 0x<addr> 0x<word>   Write a memory address.");
    println!("   break 0x<addr>            Set a breakpoint.");
    println!("   unbreak 0x<addr>          Clear a breakpoint.");
    println!("j, jump 0x<addr>             Set PC directly.");
    println!("h, help                      Print this message.");
    println!("exit, q                      Quit.");
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullHandler;
    impl TrapHandler for NullHandler {
        fn getc(&mut self) -> u8 {
            0
        }
        fn out(&mut self, _byte: u8) {}
        fn puts_byte(&mut self, _byte: u8) {}
    }

    fn new_driver() -> Driver {
        let mut driver = Driver::new();
        driver.set_starting_address(0x3000);
        driver.set_memory(0x3000, 0x1025); // ADD R0, R0, #5
        driver
    }

    #[test]
    fn step_executes_one_instruction() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "s"));
        assert_eq!(driver.engine().get_pc(), 0x3001);
    }

    #[test]
    fn continue_runs_to_halt() {
        let mut driver = Driver::new();
        driver.set_starting_address(0x3000);
        driver.set_memory(0x3000, 0xF025); // TRAP x25 HALT
        assert!(handle_command(&mut driver, &mut NullHandler, "continue"));
        assert!(driver.engine().is_halted());
    }

    #[test]
    fn inspect_does_not_panic() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "i"));
        assert!(handle_command(&mut driver, &mut NullHandler, "inspect"));
    }

    #[test]
    fn disassemble_does_not_panic() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "d"));
        assert!(handle_command(&mut driver, &mut NullHandler, "disassemble"));
    }

    #[test]
    fn read_and_write_round_trip() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "write 0x3100 0x1234"));
        assert!(handle_command(&mut driver, &mut NullHandler, "read 0x3100"));
        assert_eq!(driver.engine().memory_read(0x3100), 0x1234);
    }

    #[test]
    fn break_and_unbreak_round_trip() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "break 0x3001"));
        assert!(driver.is_breakpoint(0x3001));
        assert!(handle_command(&mut driver, &mut NullHandler, "unbreak 0x3001"));
        assert!(!driver.is_breakpoint(0x3001));
    }

    #[test]
    fn jump_sets_pc() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "j 0x4000"));
        assert_eq!(driver.engine().get_pc(), 0x4000);
        assert!(handle_command(&mut driver, &mut NullHandler, "jump 0x5000"));
        assert_eq!(driver.engine().get_pc(), 0x5000);
    }

    #[test]
    fn help_does_not_panic() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "h"));
        assert!(handle_command(&mut driver, &mut NullHandler, "help"));
    }

    #[test]
    fn empty_line_is_a_no_op() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, ""));
    }

    #[test]
    fn exit_variants_stop_the_loop() {
        let mut driver = new_driver();
        assert!(!handle_command(&mut driver, &mut NullHandler, "exit"));
        assert!(!handle_command(&mut driver, &mut NullHandler, "q"));
        assert!(!handle_command(&mut driver, &mut NullHandler, "quit"));
    }

    #[test]
    fn unrecognized_input_does_not_panic() {
        let mut driver = new_driver();
        assert!(handle_command(&mut driver, &mut NullHandler, "bogus"));
        assert!(handle_command(&mut driver, &mut NullHandler, "read 0xzzzz"));
        assert!(handle_command(&mut driver, &mut NullHandler, "write 0x3000"));
        assert!(handle_command(&mut driver, &mut NullHandler, "   "));
    }
}
