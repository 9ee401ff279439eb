use super::{M6502, Op};

impl M6502 {
    // ---- Increment/decrement ----

    pub(crate) fn inc_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_nz(result);
        result
    }

    pub(crate) fn dec_value(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_nz(result);
        result
    }

    /// INX/INY/DEX/DEY.
    pub(crate) fn step_register(&mut self, op: Op) {
        let result = match op {
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.x
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.y
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.x
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.y
            }
            _ => return,
        };
        self.set_nz(result);
    }

    // ---- Register transfers ----

    /// TAX/TAY/TXA/TYA/TSX set N and Z; TXS does not.
    pub(crate) fn transfer(&mut self, op: Op) {
        let result = match op {
            Op::Tax => {
                self.x = self.a;
                self.x
            }
            Op::Tay => {
                self.y = self.a;
                self.y
            }
            Op::Txa => {
                self.a = self.x;
                self.a
            }
            Op::Tya => {
                self.a = self.y;
                self.a
            }
            Op::Tsx => {
                self.x = self.sp;
                self.x
            }
            Op::Txs => {
                self.sp = self.x;
                return;
            }
            _ => return,
        };
        self.set_nz(result);
    }
}
