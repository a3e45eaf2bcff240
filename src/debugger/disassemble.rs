use crate::decode::{decode, Opcode};
use crate::trap::TrapVector;

pub fn disassemble(instruction: u16) -> String {
    let d = decode(instruction);

    match d.opcode {
        Opcode::Br => format!("BR n:{} z:{} p:{} offset9:{}", d.nzp.n, d.nzp.z, d.nzp.p, d.offset9 as i16),

        Opcode::Add if d.imm_mode => format!("ADD {}, {}, #{}", d.dr, d.sr1, d.imm5 as i16),
        Opcode::Add => format!("ADD {}, {}, {}", d.dr, d.sr1, d.sr2),

        Opcode::And if d.imm_mode => format!("AND {}, {}, #{}", d.dr, d.sr1, d.imm5 as i16),
        Opcode::And => format!("AND {}, {}, {}", d.dr, d.sr1, d.sr2),

        Opcode::Ld => format!("LD {}, #{}", d.dr, d.offset9 as i16),
        Opcode::Ldi => format!("LDI {}, #{}", d.dr, d.offset9 as i16),
        Opcode::Ldr => format!("LDR {}, {}, #{}", d.dr, d.base_r, d.offset6 as i16),

        Opcode::St => format!("ST {}, #{}", d.dr, d.offset9 as i16),
        Opcode::Sti => format!("STI {}, #{}", d.dr, d.offset9 as i16),
        Opcode::Str => format!("STR {}, {}, #{}", d.dr, d.base_r, d.offset6 as i16),

        Opcode::Not => format!("NOT {}, {}", d.dr, d.sr1),

        Opcode::Jmp if d.base_r.index() == 7 => "RET".to_string(),
        Opcode::Jmp => format!("JMP {}", d.base_r),

        Opcode::Jsr if d.jsr_mode => format!("JSR #{}", d.offset11 as i16),
        Opcode::Jsr => format!("JSRR {}", d.base_r),

        Opcode::Lea => format!("LEA {}, #{}", d.dr, d.offset9 as i16),

        Opcode::Stack if d.stack_push => format!("PUSH {}", d.dr),
        Opcode::Stack => format!("POP {}", d.dr),

        Opcode::Trap => match TrapVector::from_vector(d.trapvect8 as u8) {
            TrapVector::Getc => "TRAP GETC (x20)".to_string(),
            TrapVector::Out => "TRAP OUT (x21)".to_string(),
            TrapVector::Puts => "TRAP PUTS (x22)".to_string(),
            TrapVector::Halt => "TRAP HALT (x25)".to_string(),
            TrapVector::Unmapped(vector) => format!("TRAP x{:02x} (unmapped)", vector),
        },

        Opcode::Unused => "UNUSED (x8000)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disassembles_add_immediate() {
        assert_eq!(disassemble(0x1025), "ADD R0, R0, #5");
    }

    #[test]
    fn disassembles_ret_as_jmp_r7() {
        assert_eq!(disassemble(0b1100_000_111_000000), "RET");
    }

    #[test]
    fn disassembles_stack_push() {
        assert_eq!(disassemble(0b1101_001_1_00000), "PUSH R1");
    }

    #[test]
    fn disassembles_halt_trap() {
        assert_eq!(disassemble(0xF025), "TRAP HALT (x25)");
    }
}
