use fxhash::FxHashMap;
use lazy_static::lazy_static;

use crate::trap::TrapTable;

/// One of the eight ways the operand specifier is interpreted.
///
/// The discriminants are the three-bit addressing-mode field values used by
/// non-branch instructions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AddrMode {
    Immediate = 0,
    Direct = 1,
    Indirect = 2,
    StackRel = 3,
    StackRelDef = 4,
    Indexed = 5,
    StackIndexed = 6,
    StackIndexedDef = 7,
}

impl AddrMode {
    /// Three-bit field value for the instruction specifier.
    pub fn bits(self) -> u8 {
        self as u8
    }

    pub fn from_bits(bits: u8) -> AddrMode {
        match bits & 0b111 {
            0 => AddrMode::Immediate,
            1 => AddrMode::Direct,
            2 => AddrMode::Indirect,
            3 => AddrMode::StackRel,
            4 => AddrMode::StackRelDef,
            5 => AddrMode::Indexed,
            6 => AddrMode::StackIndexed,
            _ => AddrMode::StackIndexedDef,
        }
    }

    /// Source suffix as written after the comma.
    pub fn suffix(self) -> &'static str {
        match self {
            AddrMode::Immediate => "i",
            AddrMode::Direct => "d",
            AddrMode::Indirect => "n",
            AddrMode::StackRel => "s",
            AddrMode::StackRelDef => "sf",
            AddrMode::Indexed => "x",
            AddrMode::StackIndexed => "sx",
            AddrMode::StackIndexedDef => "sxf",
        }
    }

    /// Long name used by runtime error messages.
    pub fn long_name(self) -> &'static str {
        match self {
            AddrMode::Immediate => "immediate",
            AddrMode::Direct => "direct",
            AddrMode::Indirect => "indirect",
            AddrMode::StackRel => "stack relative",
            AddrMode::StackRelDef => "stack relative deferred",
            AddrMode::Indexed => "indexed",
            AddrMode::StackIndexed => "stack indexed",
            AddrMode::StackIndexedDef => "stack indexed deferred",
        }
    }
}

/// Set of addressing modes a mnemonic accepts, one bit per mode in
/// `AddrMode::bits` order.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct ModeSet(pub u8);

impl ModeSet {
    pub const NONE: ModeSet = ModeSet(0);
    pub const ALL: ModeSet = ModeSet(0xFF);
    /// Branches: immediate or indexed only.
    pub const BRANCH: ModeSet = ModeSet(0b0010_0001);
    /// Everything except immediate (stores and CHARI).
    pub const NO_IMMEDIATE: ModeSet = ModeSet(0xFE);

    pub fn contains(self, mode: AddrMode) -> bool {
        self.0 & (1 << mode.bits()) != 0
    }

    pub fn insert(&mut self, mode: AddrMode) {
        self.0 |= 1 << mode.bits();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Every mnemonic the assembler accepts. Register-bearing instructions are
/// distinct entries per register, exactly as they are spelled in source.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mnemonic {
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
    Nota,
    Notx,
    Nega,
    Negx,
    Asla,
    Aslx,
    Asra,
    Asrx,
    Rola,
    Rolx,
    Rora,
    Rorx,
    Chari,
    Charo,
    Ret0,
    Ret1,
    Ret2,
    Ret3,
    Ret4,
    Ret5,
    Ret6,
    Ret7,
    Addsp,
    Subsp,
    Adda,
    Addx,
    Suba,
    Subx,
    Anda,
    Andx,
    Ora,
    Orx,
    Cpa,
    Cpx,
    Lda,
    Ldx,
    Ldbytea,
    Ldbytex,
    Sta,
    Stx,
    Stbytea,
    Stbytex,
    /// User-defined trap slot 0-7 from the `trap` file.
    Unimp(u8),
}

/// Syntactic class of a mnemonic, which fixes its addressing-mode rules.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OpClass {
    /// No operand at all.
    Unary,
    /// Immediate or indexed; the mode may be omitted (defaults to immediate).
    Branch,
    /// All eight modes, mode required.
    General,
    /// All modes except immediate (value is written to memory).
    Store,
    /// Capabilities come from the trap table slot.
    Trap(u8),
}

impl Mnemonic {
    /// Base opcode. The addressing-mode or register field is added on top.
    pub fn opcode(self) -> u8 {
        match self {
            Mnemonic::Stop => 0,
            Mnemonic::Rettr => 1,
            Mnemonic::Movspa => 2,
            Mnemonic::Movflga => 3,
            Mnemonic::Br => 4,
            Mnemonic::Brle => 6,
            Mnemonic::Brlt => 8,
            Mnemonic::Breq => 10,
            Mnemonic::Brne => 12,
            Mnemonic::Brge => 14,
            Mnemonic::Brgt => 16,
            Mnemonic::Brv => 18,
            Mnemonic::Brc => 20,
            Mnemonic::Call => 22,
            Mnemonic::Nota => 24,
            Mnemonic::Notx => 25,
            Mnemonic::Nega => 26,
            Mnemonic::Negx => 27,
            Mnemonic::Asla => 28,
            Mnemonic::Aslx => 29,
            Mnemonic::Asra => 30,
            Mnemonic::Asrx => 31,
            Mnemonic::Rola => 32,
            Mnemonic::Rolx => 33,
            Mnemonic::Rora => 34,
            Mnemonic::Rorx => 35,
            Mnemonic::Unimp(0) => 36,
            Mnemonic::Unimp(1) => 37,
            Mnemonic::Unimp(2) => 38,
            Mnemonic::Unimp(3) => 39,
            Mnemonic::Unimp(4) => 40,
            Mnemonic::Unimp(5) => 48,
            Mnemonic::Unimp(6) => 56,
            Mnemonic::Unimp(_) => 64,
            Mnemonic::Chari => 72,
            Mnemonic::Charo => 80,
            Mnemonic::Ret0 => 88,
            Mnemonic::Ret1 => 89,
            Mnemonic::Ret2 => 90,
            Mnemonic::Ret3 => 91,
            Mnemonic::Ret4 => 92,
            Mnemonic::Ret5 => 93,
            Mnemonic::Ret6 => 94,
            Mnemonic::Ret7 => 95,
            Mnemonic::Addsp => 96,
            Mnemonic::Subsp => 104,
            Mnemonic::Adda => 112,
            Mnemonic::Addx => 120,
            Mnemonic::Suba => 128,
            Mnemonic::Subx => 136,
            Mnemonic::Anda => 144,
            Mnemonic::Andx => 152,
            Mnemonic::Ora => 160,
            Mnemonic::Orx => 168,
            Mnemonic::Cpa => 176,
            Mnemonic::Cpx => 184,
            Mnemonic::Lda => 192,
            Mnemonic::Ldx => 200,
            Mnemonic::Ldbytea => 208,
            Mnemonic::Ldbytex => 216,
            Mnemonic::Sta => 224,
            Mnemonic::Stx => 232,
            Mnemonic::Stbytea => 240,
            Mnemonic::Stbytex => 248,
        }
    }

    fn class(self) -> OpClass {
        use Mnemonic::*;
        match self {
            Stop | Rettr | Movspa | Movflga | Nota | Notx | Nega | Negx | Asla | Aslx | Asra
            | Asrx | Rola | Rolx | Rora | Rorx | Ret0 | Ret1 | Ret2 | Ret3 | Ret4 | Ret5
            | Ret6 | Ret7 => OpClass::Unary,
            Br | Brle | Brlt | Breq | Brne | Brge | Brgt | Brv | Brc | Call => OpClass::Branch,
            Chari | Sta | Stx | Stbytea | Stbytex => OpClass::Store,
            Charo | Addsp | Subsp | Adda | Addx | Suba | Subx | Anda | Andx | Ora | Orx | Cpa
            | Cpx | Lda | Ldx | Ldbytea | Ldbytex => OpClass::General,
            Unimp(slot) => OpClass::Trap(slot),
        }
    }

    /// True when the instruction has no operand. Trap slots 0-3 are always
    /// unary; 4-7 are unary exactly when their trap-file mode set is empty.
    pub fn is_unary(self, traps: &TrapTable) -> bool {
        match self.class() {
            OpClass::Unary => true,
            OpClass::Trap(slot) if slot < 4 => true,
            OpClass::Trap(slot) => traps.slot(slot as usize).modes.is_empty(),
            _ => false,
        }
    }

    /// True when a non-unary instruction may omit its addressing mode.
    pub fn mode_optional(self) -> bool {
        matches!(self.class(), OpClass::Branch)
    }

    pub fn valid_mode(self, mode: AddrMode, traps: &TrapTable) -> bool {
        let set = match self.class() {
            OpClass::Unary => ModeSet::NONE,
            OpClass::Branch => ModeSet::BRANCH,
            OpClass::General => ModeSet::ALL,
            OpClass::Store => ModeSet::NO_IMMEDIATE,
            OpClass::Trap(slot) if slot < 4 => ModeSet::NONE,
            OpClass::Trap(slot) => traps.slot(slot as usize).modes,
        };
        set.contains(mode)
    }

    /// Assembled instruction specifier for the given addressing mode.
    /// Branches carry the mode in their low bit (indexed adds 1); every
    /// other non-unary mnemonic uses the three-bit field.
    pub fn encode(self, mode: Option<AddrMode>) -> u8 {
        let mode_value = match mode {
            None | Some(AddrMode::Immediate) => 0,
            Some(AddrMode::Indexed) if self.mode_optional() => 1,
            Some(m) => m.bits(),
        };
        self.opcode() + mode_value
    }

    /// Mnemonic as it appears in the listing. Trap slots take their names
    /// from the trap table.
    pub fn name(self, traps: &TrapTable) -> String {
        let fixed = match self {
            Mnemonic::Stop => "STOP",
            Mnemonic::Rettr => "RETTR",
            Mnemonic::Movspa => "MOVSPA",
            Mnemonic::Movflga => "MOVFLGA",
            Mnemonic::Br => "BR",
            Mnemonic::Brle => "BRLE",
            Mnemonic::Brlt => "BRLT",
            Mnemonic::Breq => "BREQ",
            Mnemonic::Brne => "BRNE",
            Mnemonic::Brge => "BRGE",
            Mnemonic::Brgt => "BRGT",
            Mnemonic::Brv => "BRV",
            Mnemonic::Brc => "BRC",
            Mnemonic::Call => "CALL",
            Mnemonic::Nota => "NOTA",
            Mnemonic::Notx => "NOTX",
            Mnemonic::Nega => "NEGA",
            Mnemonic::Negx => "NEGX",
            Mnemonic::Asla => "ASLA",
            Mnemonic::Aslx => "ASLX",
            Mnemonic::Asra => "ASRA",
            Mnemonic::Asrx => "ASRX",
            Mnemonic::Rola => "ROLA",
            Mnemonic::Rolx => "ROLX",
            Mnemonic::Rora => "RORA",
            Mnemonic::Rorx => "RORX",
            Mnemonic::Chari => "CHARI",
            Mnemonic::Charo => "CHARO",
            Mnemonic::Ret0 => "RET0",
            Mnemonic::Ret1 => "RET1",
            Mnemonic::Ret2 => "RET2",
            Mnemonic::Ret3 => "RET3",
            Mnemonic::Ret4 => "RET4",
            Mnemonic::Ret5 => "RET5",
            Mnemonic::Ret6 => "RET6",
            Mnemonic::Ret7 => "RET7",
            Mnemonic::Addsp => "ADDSP",
            Mnemonic::Subsp => "SUBSP",
            Mnemonic::Adda => "ADDA",
            Mnemonic::Addx => "ADDX",
            Mnemonic::Suba => "SUBA",
            Mnemonic::Subx => "SUBX",
            Mnemonic::Anda => "ANDA",
            Mnemonic::Andx => "ANDX",
            Mnemonic::Ora => "ORA",
            Mnemonic::Orx => "ORX",
            Mnemonic::Cpa => "CPA",
            Mnemonic::Cpx => "CPX",
            Mnemonic::Lda => "LDA",
            Mnemonic::Ldx => "LDX",
            Mnemonic::Ldbytea => "LDBYTEA",
            Mnemonic::Ldbytex => "LDBYTEX",
            Mnemonic::Sta => "STA",
            Mnemonic::Stx => "STX",
            Mnemonic::Stbytea => "STBYTEA",
            Mnemonic::Stbytex => "STBYTEX",
            Mnemonic::Unimp(slot) => return traps.slot(slot as usize).name.clone(),
        };
        fixed.to_string()
    }
}

/// Assembler dot commands.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DotCommand {
    Addrss,
    Ascii,
    Block,
    Burn,
    Byte,
    End,
    Equate,
    Word,
}

impl DotCommand {
    pub fn name(self) -> &'static str {
        match self {
            DotCommand::Addrss => "ADDRSS",
            DotCommand::Ascii => "ASCII",
            DotCommand::Block => "BLOCK",
            DotCommand::Burn => "BURN",
            DotCommand::Byte => "BYTE",
            DotCommand::End => "END",
            DotCommand::Equate => "EQUATE",
            DotCommand::Word => "WORD",
        }
    }
}

lazy_static! {
    static ref FIXED_MNEMONICS: FxHashMap<&'static str, Mnemonic> = {
        use Mnemonic::*;
        let mut m = FxHashMap::default();
        for (name, op) in [
            ("STOP", Stop),
            ("RETTR", Rettr),
            ("MOVSPA", Movspa),
            ("MOVFLGA", Movflga),
            ("BR", Br),
            ("BRLE", Brle),
            ("BRLT", Brlt),
            ("BREQ", Breq),
            ("BRNE", Brne),
            ("BRGE", Brge),
            ("BRGT", Brgt),
            ("BRV", Brv),
            ("BRC", Brc),
            ("CALL", Call),
            ("NOTA", Nota),
            ("NOTX", Notx),
            ("NEGA", Nega),
            ("NEGX", Negx),
            ("ASLA", Asla),
            ("ASLX", Aslx),
            ("ASRA", Asra),
            ("ASRX", Asrx),
            ("ROLA", Rola),
            ("ROLX", Rolx),
            ("RORA", Rora),
            ("RORX", Rorx),
            ("CHARI", Chari),
            ("CHARO", Charo),
            ("RET0", Ret0),
            ("RET1", Ret1),
            ("RET2", Ret2),
            ("RET3", Ret3),
            ("RET4", Ret4),
            ("RET5", Ret5),
            ("RET6", Ret6),
            ("RET7", Ret7),
            ("ADDSP", Addsp),
            ("SUBSP", Subsp),
            ("ADDA", Adda),
            ("ADDX", Addx),
            ("SUBA", Suba),
            ("SUBX", Subx),
            ("ANDA", Anda),
            ("ANDX", Andx),
            ("ORA", Ora),
            ("ORX", Orx),
            ("CPA", Cpa),
            ("CPX", Cpx),
            ("LDA", Lda),
            ("LDX", Ldx),
            ("LDBYTEA", Ldbytea),
            ("LDBYTEX", Ldbytex),
            ("STA", Sta),
            ("STX", Stx),
            ("STBYTEA", Stbytea),
            ("STBYTEX", Stbytex),
        ] {
            m.insert(name, op);
        }
        m
    };
    static ref DOT_COMMANDS: FxHashMap<&'static str, DotCommand> = {
        use DotCommand::*;
        let mut m = FxHashMap::default();
        for (name, dot) in [
            ("ADDRSS", Addrss),
            ("ASCII", Ascii),
            ("BLOCK", Block),
            ("BURN", Burn),
            ("BYTE", Byte),
            ("END", End),
            ("EQUATE", Equate),
            ("WORD", Word),
        ] {
            m.insert(name, dot);
        }
        m
    };
}

/// Case-insensitive mnemonic lookup. Fixed names shadow trap names.
pub fn lookup_mnemonic(name: &str, traps: &TrapTable) -> Option<Mnemonic> {
    let upper = name.to_ascii_uppercase();
    if let Some(op) = FIXED_MNEMONICS.get(upper.as_str()) {
        return Some(*op);
    }
    traps.lookup(&upper).map(|slot| Mnemonic::Unimp(slot as u8))
}

/// Case-insensitive dot-command lookup.
pub fn lookup_dot(name: &str) -> Option<DotCommand> {
    DOT_COMMANDS.get(name.to_ascii_uppercase().as_str()).copied()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::trap::TrapTable;

    fn traps() -> TrapTable {
        TrapTable::parse(
            "NOP0\nNOP1\nNOP2\nNOP3\nNOP I\nDECI D N S SF X SX SXF\nDECO I D N S SF X SX SXF\nSTRO D N SF X\n",
        )
    }

    #[test]
    fn branch_mode_field_is_one_bit() {
        assert_eq!(Mnemonic::Br.encode(None), 4);
        assert_eq!(Mnemonic::Br.encode(Some(AddrMode::Immediate)), 4);
        assert_eq!(Mnemonic::Br.encode(Some(AddrMode::Indexed)), 5);
        assert_eq!(Mnemonic::Call.encode(Some(AddrMode::Indexed)), 23);
    }

    #[test]
    fn general_mode_field_is_three_bits() {
        assert_eq!(Mnemonic::Lda.encode(Some(AddrMode::Direct)), 0xC1);
        assert_eq!(Mnemonic::Sta.encode(Some(AddrMode::Direct)), 0xE1);
        assert_eq!(Mnemonic::Ldx.encode(Some(AddrMode::StackIndexedDef)), 207);
        assert_eq!(Mnemonic::Asla.encode(None), 0x1C);
    }

    #[test]
    fn store_class_rejects_immediate() {
        let traps = traps();
        assert!(!Mnemonic::Sta.valid_mode(AddrMode::Immediate, &traps));
        assert!(Mnemonic::Sta.valid_mode(AddrMode::StackRel, &traps));
        assert!(Mnemonic::Chari.valid_mode(AddrMode::Indexed, &traps));
        assert!(!Mnemonic::Chari.valid_mode(AddrMode::Immediate, &traps));
        assert!(Mnemonic::Charo.valid_mode(AddrMode::Immediate, &traps));
    }

    #[test]
    fn trap_slots_obey_the_trap_file() {
        let traps = traps();
        assert!(Mnemonic::Unimp(0).is_unary(&traps));
        assert!(!Mnemonic::Unimp(5).is_unary(&traps));
        assert!(Mnemonic::Unimp(5).valid_mode(AddrMode::Direct, &traps));
        assert!(!Mnemonic::Unimp(5).valid_mode(AddrMode::Immediate, &traps));
        assert_eq!(lookup_mnemonic("deci", &traps), Some(Mnemonic::Unimp(5)));
    }

    #[test]
    fn lookup_is_case_insensitive() {
        let traps = traps();
        assert_eq!(lookup_mnemonic("lda", &traps), Some(Mnemonic::Lda));
        assert_eq!(lookup_mnemonic("Stop", &traps), Some(Mnemonic::Stop));
        assert_eq!(lookup_mnemonic("nosuch", &traps), None);
        assert_eq!(lookup_dot("word"), Some(DotCommand::Word));
        assert_eq!(lookup_dot("ORG"), None);
    }
}
