//! Instruction-specifier decoding: an 8-bit value maps onto one of the 40
//! mnemonic families, and disjoint bit fields select the addressing mode,
//! register, and `RETn` n-value where the family calls for them.

use crate::mnemonic::AddrMode;
use crate::trap::TrapTable;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Family {
    Stop,
    Rettr,
    Movspa,
    Movflga,
    Br,
    Brle,
    Brlt,
    Breq,
    Brne,
    Brge,
    Brgt,
    Brv,
    Brc,
    Call,
    Not,
    Neg,
    Asl,
    Asr,
    Rol,
    Ror,
    /// Trap slot 0-7.
    Unimp(u8),
    Chari,
    Charo,
    Ret,
    Addsp,
    Subsp,
    Add,
    Sub,
    And,
    Or,
    Cp,
    Ld,
    LdByte,
    St,
    StByte,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegSelect {
    A,
    X,
}

pub fn decode(spec: u8) -> Family {
    match spec {
        0 => Family::Stop,
        1 => Family::Rettr,
        2 => Family::Movspa,
        3 => Family::Movflga,
        4..=5 => Family::Br,
        6..=7 => Family::Brle,
        8..=9 => Family::Brlt,
        10..=11 => Family::Breq,
        12..=13 => Family::Brne,
        14..=15 => Family::Brge,
        16..=17 => Family::Brgt,
        18..=19 => Family::Brv,
        20..=21 => Family::Brc,
        22..=23 => Family::Call,
        24..=25 => Family::Not,
        26..=27 => Family::Neg,
        28..=29 => Family::Asl,
        30..=31 => Family::Asr,
        32..=33 => Family::Rol,
        34..=35 => Family::Ror,
        36 => Family::Unimp(0),
        37 => Family::Unimp(1),
        38 => Family::Unimp(2),
        39 => Family::Unimp(3),
        40..=47 => Family::Unimp(4),
        48..=55 => Family::Unimp(5),
        56..=63 => Family::Unimp(6),
        64..=71 => Family::Unimp(7),
        72..=79 => Family::Chari,
        80..=87 => Family::Charo,
        88..=95 => Family::Ret,
        96..=103 => Family::Addsp,
        104..=111 => Family::Subsp,
        112..=127 => Family::Add,
        128..=143 => Family::Sub,
        144..=159 => Family::And,
        160..=175 => Family::Or,
        176..=191 => Family::Cp,
        192..=207 => Family::Ld,
        208..=223 => Family::LdByte,
        224..=239 => Family::St,
        _ => Family::StByte,
    }
}

impl Family {
    /// Unary families leave the operand specifier unread; the fetch stage
    /// reads only the one specifier byte.
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            Family::Stop
                | Family::Rettr
                | Family::Movspa
                | Family::Movflga
                | Family::Not
                | Family::Neg
                | Family::Asl
                | Family::Asr
                | Family::Rol
                | Family::Ror
                | Family::Unimp(0..=3)
                | Family::Ret
        )
    }

    /// Branches carry the addressing mode in the low opcode bit.
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Family::Br
                | Family::Brle
                | Family::Brlt
                | Family::Breq
                | Family::Brne
                | Family::Brge
                | Family::Brgt
                | Family::Brv
                | Family::Brc
                | Family::Call
        )
    }

    /// Families whose register selector sits in bit 3 of the specifier.
    pub fn has_register_bit(self) -> bool {
        matches!(
            self,
            Family::Add
                | Family::Sub
                | Family::And
                | Family::Or
                | Family::Cp
                | Family::Ld
                | Family::LdByte
                | Family::St
                | Family::StByte
        )
    }

    /// Mnemonic text for trace output, register letter or n-value included.
    pub fn trace_name(self, spec: u8, traps: &TrapTable) -> String {
        let reg = |base: &str, sel: RegSelect| match sel {
            RegSelect::A => format!("{base}A"),
            RegSelect::X => format!("{base}X"),
        };
        match self {
            Family::Stop => "STOP".into(),
            Family::Rettr => "RETTR".into(),
            Family::Movspa => "MOVSPA".into(),
            Family::Movflga => "MOVFLGA".into(),
            Family::Br => "BR".into(),
            Family::Brle => "BRLE".into(),
            Family::Brlt => "BRLT".into(),
            Family::Breq => "BREQ".into(),
            Family::Brne => "BRNE".into(),
            Family::Brge => "BRGE".into(),
            Family::Brgt => "BRGT".into(),
            Family::Brv => "BRV".into(),
            Family::Brc => "BRC".into(),
            Family::Call => "CALL".into(),
            Family::Not => reg("NOT", reg_low_bit(spec)),
            Family::Neg => reg("NEG", reg_low_bit(spec)),
            Family::Asl => reg("ASL", reg_low_bit(spec)),
            Family::Asr => reg("ASR", reg_low_bit(spec)),
            Family::Rol => reg("ROL", reg_low_bit(spec)),
            Family::Ror => reg("ROR", reg_low_bit(spec)),
            Family::Unimp(slot) => traps.slot(slot as usize).name.clone(),
            Family::Chari => "CHARI".into(),
            Family::Charo => "CHARO".into(),
            Family::Ret => format!("RET{}", n_value(spec)),
            Family::Addsp => "ADDSP".into(),
            Family::Subsp => "SUBSP".into(),
            Family::Add => reg("ADD", reg_bit3(spec)),
            Family::Sub => reg("SUB", reg_bit3(spec)),
            Family::And => reg("AND", reg_bit3(spec)),
            Family::Or => reg("OR", reg_bit3(spec)),
            Family::Cp => reg("CP", reg_bit3(spec)),
            Family::Ld => reg("LD", reg_bit3(spec)),
            Family::LdByte => reg("LDBYTE", reg_bit3(spec)),
            Family::St => reg("ST", reg_bit3(spec)),
            Family::StByte => reg("STBYTE", reg_bit3(spec)),
        }
    }
}

/// Branch addressing mode: low bit 0 is immediate, 1 is indexed.
pub fn mode_one_bit(spec: u8) -> AddrMode {
    if spec & 1 == 0 {
        AddrMode::Immediate
    } else {
        AddrMode::Indexed
    }
}

/// Three-bit addressing-mode field in the low bits.
pub fn mode_three_bits(spec: u8) -> AddrMode {
    AddrMode::from_bits(spec & 0b111)
}

/// Register selector for the unary register ops (NOTr and friends).
pub fn reg_low_bit(spec: u8) -> RegSelect {
    if spec & 1 == 0 {
        RegSelect::A
    } else {
        RegSelect::X
    }
}

/// Register selector for the two-operand register ops.
pub fn reg_bit3(spec: u8) -> RegSelect {
    if (spec >> 3) & 1 == 0 {
        RegSelect::A
    } else {
        RegSelect::X
    }
}

/// `RETn` n-value.
pub fn n_value(spec: u8) -> u8 {
    spec & 0b111
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mnemonic::Mnemonic;

    #[test]
    fn family_boundaries() {
        assert_eq!(decode(0x00), Family::Stop);
        assert_eq!(decode(0x04), Family::Br);
        assert_eq!(decode(0x05), Family::Br);
        assert_eq!(decode(0x1C), Family::Asl);
        assert_eq!(decode(0x26), Family::Unimp(2));
        assert_eq!(decode(0x30), Family::Unimp(5));
        assert_eq!(decode(0x48), Family::Chari);
        assert_eq!(decode(0x58), Family::Ret);
        assert_eq!(decode(0xC1), Family::Ld);
        assert_eq!(decode(0xFF), Family::StByte);
    }

    #[test]
    fn field_extraction() {
        assert_eq!(mode_one_bit(0x05), AddrMode::Indexed);
        assert_eq!(mode_three_bits(0xC1), AddrMode::Direct);
        assert_eq!(mode_three_bits(0xCF), AddrMode::StackIndexedDef);
        assert_eq!(reg_low_bit(0x19), RegSelect::X);
        assert_eq!(reg_bit3(0xC9), RegSelect::X);
        assert_eq!(reg_bit3(0xC1), RegSelect::A);
        assert_eq!(n_value(0x5B), 3);
    }

    /// Re-encoding what the decoder extracted must reproduce every byte.
    #[test]
    fn decode_encode_round_trip() {
        use Family::*;
        for spec in 0u8..=255 {
            let family = decode(spec);
            let mode = if family.is_unary() {
                None
            } else if family.is_branch() {
                Some(mode_one_bit(spec))
            } else {
                Some(mode_three_bits(spec))
            };
            let pick = |a: Mnemonic, x: Mnemonic| match reg_bit3(spec) {
                RegSelect::A => a,
                RegSelect::X => x,
            };
            let pick_low = |a: Mnemonic, x: Mnemonic| match reg_low_bit(spec) {
                RegSelect::A => a,
                RegSelect::X => x,
            };
            let mnemonic = match family {
                Stop => Mnemonic::Stop,
                Rettr => Mnemonic::Rettr,
                Movspa => Mnemonic::Movspa,
                Movflga => Mnemonic::Movflga,
                Br => Mnemonic::Br,
                Brle => Mnemonic::Brle,
                Brlt => Mnemonic::Brlt,
                Breq => Mnemonic::Breq,
                Brne => Mnemonic::Brne,
                Brge => Mnemonic::Brge,
                Brgt => Mnemonic::Brgt,
                Brv => Mnemonic::Brv,
                Brc => Mnemonic::Brc,
                Call => Mnemonic::Call,
                Not => pick_low(Mnemonic::Nota, Mnemonic::Notx),
                Neg => pick_low(Mnemonic::Nega, Mnemonic::Negx),
                Asl => pick_low(Mnemonic::Asla, Mnemonic::Aslx),
                Asr => pick_low(Mnemonic::Asra, Mnemonic::Asrx),
                Rol => pick_low(Mnemonic::Rola, Mnemonic::Rolx),
                Ror => pick_low(Mnemonic::Rora, Mnemonic::Rorx),
                Unimp(slot) => Mnemonic::Unimp(slot),
                Chari => Mnemonic::Chari,
                Charo => Mnemonic::Charo,
                Ret => match n_value(spec) {
                    0 => Mnemonic::Ret0,
                    1 => Mnemonic::Ret1,
                    2 => Mnemonic::Ret2,
                    3 => Mnemonic::Ret3,
                    4 => Mnemonic::Ret4,
                    5 => Mnemonic::Ret5,
                    6 => Mnemonic::Ret6,
                    _ => Mnemonic::Ret7,
                },
                Addsp => Mnemonic::Addsp,
                Subsp => Mnemonic::Subsp,
                Add => pick(Mnemonic::Adda, Mnemonic::Addx),
                Sub => pick(Mnemonic::Suba, Mnemonic::Subx),
                And => pick(Mnemonic::Anda, Mnemonic::Andx),
                Or => pick(Mnemonic::Ora, Mnemonic::Orx),
                Cp => pick(Mnemonic::Cpa, Mnemonic::Cpx),
                Ld => pick(Mnemonic::Lda, Mnemonic::Ldx),
                LdByte => pick(Mnemonic::Ldbytea, Mnemonic::Ldbytex),
                St => pick(Mnemonic::Sta, Mnemonic::Stx),
                StByte => pick(Mnemonic::Stbytea, Mnemonic::Stbytex),
            };
            assert_eq!(mnemonic.encode(mode), spec, "specifier 0x{spec:02X}");
        }
    }
}
