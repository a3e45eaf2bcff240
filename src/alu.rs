//! A stateful `(a, b, result)` triple the microsequencer loads before
//! invoking an operation. Callers must load `b` before `and`/`add`.

#[derive(Debug, Clone, Copy, Default)]
pub struct Alu {
    a: u16,
    b: u16,
    result: u16,
}

impl Alu {
    pub fn new() -> Alu {
        Alu::default()
    }

    pub fn reset(&mut self) {
        *self = Alu::default();
    }

    pub fn load_a(&mut self, value: u16) {
        self.a = value;
    }

    pub fn load_b(&mut self, value: u16) {
        self.b = value;
    }

    pub fn add(&mut self) {
        self.result = self.a.wrapping_add(self.b);
    }

    pub fn and(&mut self) {
        self.result = self.a & self.b;
    }

    pub fn not(&mut self) {
        self.result = !self.a;
    }

    pub fn fetch_result(&self) -> u16 {
        self.result
    }

    pub fn a(&self) -> u16 {
        self.a
    }

    pub fn b(&self) -> u16 {
        self.b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_wraps_modulo_2_16() {
        let mut alu = Alu::new();
        alu.load_a(0xFFFF);
        alu.load_b(2);
        alu.add();
        assert_eq!(alu.fetch_result(), 1);
    }

    #[test]
    fn and_masks_bits() {
        let mut alu = Alu::new();
        alu.load_a(0b1100);
        alu.load_b(0b1010);
        alu.and();
        assert_eq!(alu.fetch_result(), 0b1000);
    }

    #[test]
    fn not_complements_a_only() {
        let mut alu = Alu::new();
        alu.load_a(0x00FF);
        alu.not();
        assert_eq!(alu.fetch_result(), 0xFF00);
    }
}
