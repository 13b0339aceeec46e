//! The Pep/8 machine: 64 KiB of byte memory with a write-protected ROM at
//! the top, the register file, and the fetch-decode-execute loop with trap
//! handling.

pub mod alu;
pub mod decode;
pub mod dump;
pub mod io;

use std::fmt;

use crate::mnemonic::AddrMode;
use crate::trap::TrapTable;
use crate::tracer::Tracer;
use decode::{decode, mode_one_bit, mode_three_bits, n_value, reg_bit3, reg_low_bit, Family, RegSelect};
use io::Io;

pub const MEMORY_SIZE: usize = 0x10000;
/// Initial-value vectors near the top of memory, two big-endian bytes each.
pub const USER_SP_VECTOR: u16 = 0xFFF8;
pub const SYSTEM_SP_VECTOR: u16 = 0xFFFA;
pub const LOADER_PC_VECTOR: u16 = 0xFFFC;
pub const TRAP_PC_VECTOR: u16 = 0xFFFE;

/// Flat byte memory. Writes at or above the ROM boundary are silently
/// dropped; the boundary is established when the OS image is installed.
pub struct Memory {
    bytes: Box<[u8; MEMORY_SIZE]>,
    rom_start: u32,
}

#[derive(Debug)]
pub enum RomError {
    BadByte(String),
    TooBig(usize),
}

impl fmt::Display for RomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RomError::BadByte(word) => write!(f, "Invalid input in OS image: {word}"),
            RomError::TooBig(len) => write!(
                f,
                "OS is too big to fit into main memory. NumBytes = {len}, MemorySize = {MEMORY_SIZE}"
            ),
        }
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory {
            bytes: Box::new([0; MEMORY_SIZE]),
            rom_start: MEMORY_SIZE as u32,
        }
    }
}

impl Memory {
    pub fn new() -> Memory {
        Memory::default()
    }

    pub fn rom_start(&self) -> u32 {
        self.rom_start
    }

    pub fn read_byte(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Big-endian word read. The byte past the top of memory reads as zero.
    pub fn read_word(&self, addr: u16) -> u16 {
        let hi = self.bytes[addr as usize];
        let lo = if addr < u16::MAX { self.bytes[addr as usize + 1] } else { 0 };
        u16::from_be_bytes([hi, lo])
    }

    pub fn write_byte(&mut self, addr: u16, value: u8) {
        if u32::from(addr) < self.rom_start {
            self.bytes[addr as usize] = value;
        }
    }

    /// Big-endian word write. Each byte is checked against the ROM boundary
    /// separately; the low byte is dropped at the top of memory.
    pub fn write_word(&mut self, addr: u16, value: u16) {
        let [hi, lo] = value.to_be_bytes();
        self.write_byte(addr, hi);
        if addr < u16::MAX {
            self.write_byte(addr + 1, lo);
        }
    }

    /// Installs an object-format OS image at the top of memory and records
    /// the write-protection boundary. Returns the boundary address.
    pub fn install_rom(&mut self, text: &str) -> Result<u32, RomError> {
        let mut image = Vec::new();
        'scan: for line in text.lines() {
            for word in line.split_whitespace() {
                if word.eq_ignore_ascii_case("zz") {
                    break 'scan;
                }
                let byte = u8::from_str_radix(word, 16)
                    .map_err(|_| RomError::BadByte(word.to_string()))?;
                image.push(byte);
            }
        }
        if image.len() >= MEMORY_SIZE {
            return Err(RomError::TooBig(image.len()));
        }
        let start = MEMORY_SIZE - image.len();
        self.bytes[start..].copy_from_slice(&image);
        self.rom_start = start as u32;
        Ok(self.rom_start)
    }
}

/// The instruction register: the most recently fetched specifier and
/// operand specifier.
#[derive(Clone, Copy, Default, Debug)]
pub struct InstrReg {
    pub spec: u8,
    pub oprnd: u16,
}

/// A runtime error aborts the current execute command and returns control
/// to the prompt. Each carries the address of the offending instruction.
#[derive(Debug)]
pub enum RunError {
    IllegalAddrMode { at: u16, mode: AddrMode, mnemonic: String },
    ReadPastEof { at: u16 },
    Output { at: u16 },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::IllegalAddrMode { at, mode, mnemonic } => write!(
                f,
                "Runtime error at {at:04X}:  Illegal addressing mode {} with {mnemonic}",
                mode.long_name()
            ),
            RunError::ReadPastEof { at } => {
                write!(f, "Runtime error at {at:04X}:  File read error or read past end of file.")
            }
            RunError::Output { at } => {
                write!(f, "Runtime error at {at:04X}:  Could not write output.")
            }
        }
    }
}

pub struct Machine {
    pub mem: Memory,
    pub a: u16,
    pub x: u16,
    pub sp: u16,
    pub pc: u16,
    pub ir: InstrReg,
    pub n: bool,
    pub z: bool,
    pub v: bool,
    pub c: bool,
    pub traps: TrapTable,
    pub io: Io,
    /// Set while the ROM loader is consuming an object file through CHARI.
    pub loading: bool,
    /// Set once a load has initialized machine state.
    pub reset: bool,
    /// When tracing to the screen, CHARO appends an extra newline so trace
    /// rows stay intact.
    pub trace_echo: bool,
}

impl Machine {
    pub fn new(traps: TrapTable) -> Machine {
        Machine {
            mem: Memory::new(),
            a: 0,
            x: 0,
            sp: 0,
            pc: 0,
            ir: InstrReg::default(),
            n: false,
            z: false,
            v: false,
            c: false,
            traps,
            io: Io::default(),
            loading: false,
            reset: false,
            trace_echo: false,
        }
    }

    fn reg(&mut self, sel: RegSelect) -> &mut u16 {
        match sel {
            RegSelect::A => &mut self.a,
            RegSelect::X => &mut self.x,
        }
    }

    fn set_nz(&mut self, value: u16) {
        self.n = value & 0x8000 != 0;
        self.z = value == 0;
    }

    pub fn flag_byte(&self) -> u8 {
        (u8::from(self.n) << 3) | (u8::from(self.z) << 2) | (u8::from(self.v) << 1) | u8::from(self.c)
    }

    fn set_flag_byte(&mut self, flags: u8) {
        self.n = flags & 0b1000 != 0;
        self.z = flags & 0b0100 != 0;
        self.v = flags & 0b0010 != 0;
        self.c = flags & 0b0001 != 0;
    }

    /// Resolves the operand specifier under the given mode: the immediate
    /// value itself, or the effective address for every other mode. Address
    /// arithmetic wraps and never touches the flags.
    fn effective(&self, mode: AddrMode) -> u16 {
        let spec = self.ir.oprnd;
        match mode {
            AddrMode::Immediate | AddrMode::Direct => spec,
            AddrMode::Indirect => self.mem.read_word(spec),
            AddrMode::StackRel => self.sp.wrapping_add(spec),
            AddrMode::StackRelDef => self.mem.read_word(self.sp.wrapping_add(spec)),
            AddrMode::Indexed => self.x.wrapping_add(spec),
            AddrMode::StackIndexed => self.sp.wrapping_add(spec).wrapping_add(self.x),
            AddrMode::StackIndexedDef => {
                self.mem.read_word(self.sp.wrapping_add(spec)).wrapping_add(self.x)
            }
        }
    }

    fn load_word(&self, mode: AddrMode) -> u16 {
        let cell = self.effective(mode);
        if mode == AddrMode::Immediate {
            cell
        } else {
            self.mem.read_word(cell)
        }
    }

    fn load_byte(&self, mode: AddrMode) -> u8 {
        if mode == AddrMode::Immediate {
            self.ir.oprnd.to_be_bytes()[1]
        } else {
            self.mem.read_byte(self.effective(mode))
        }
    }

    /// The dereferenced operand as the tracer shows it; zero for unary
    /// instructions.
    pub fn trace_operand(&self) -> u16 {
        let family = decode(self.ir.spec);
        if family.is_unary() {
            0
        } else if family.is_branch() {
            self.load_word(mode_one_bit(self.ir.spec))
        } else {
            self.load_word(mode_three_bits(self.ir.spec))
        }
    }

    fn push_word(&mut self, value: u16) {
        self.sp = self.sp.wrapping_sub(2);
        self.mem.write_word(self.sp, value);
    }

    fn pop_word(&mut self) -> u16 {
        let value = self.mem.read_word(self.sp);
        self.sp = self.sp.wrapping_add(2);
        value
    }

    /// Fetches the specifier at PC, reads the operand specifier for
    /// non-unary families, and executes. Returns true on STOP.
    pub fn step(&mut self) -> Result<bool, RunError> {
        let at = self.pc;
        self.ir.spec = self.mem.read_byte(self.pc);
        self.pc = self.pc.wrapping_add(1);
        if !decode(self.ir.spec).is_unary() {
            self.ir.oprnd = self.mem.read_word(self.pc);
            self.pc = self.pc.wrapping_add(2);
        }
        self.execute(at)
    }

    fn branch(&mut self, taken: bool) {
        if taken {
            self.pc = self.load_word(mode_one_bit(self.ir.spec));
        }
    }

    fn execute(&mut self, at: u16) -> Result<bool, RunError> {
        let spec = self.ir.spec;
        let family = decode(spec);
        match family {
            Family::Stop => return Ok(true),
            Family::Rettr => {
                let flags = self.mem.read_byte(self.sp);
                self.sp = self.sp.wrapping_add(1);
                self.set_flag_byte(flags & 0x0F);
                self.a = self.pop_word();
                self.x = self.pop_word();
                self.pc = self.pop_word();
                self.sp = self.mem.read_word(self.sp);
            }
            Family::Movspa => self.a = self.sp,
            Family::Movflga => self.a = u16::from(self.flag_byte()),
            Family::Br => self.branch(true),
            Family::Brle => self.branch(self.n || self.z),
            Family::Brlt => self.branch(self.n),
            Family::Breq => self.branch(self.z),
            Family::Brne => self.branch(!self.z),
            Family::Brge => self.branch(!self.n),
            Family::Brgt => self.branch(!self.n && !self.z),
            Family::Brv => self.branch(self.v),
            Family::Brc => self.branch(self.c),
            Family::Call => {
                self.push_word(self.pc);
                self.pc = self.load_word(mode_one_bit(spec));
            }
            Family::Not => {
                let sel = reg_low_bit(spec);
                let value = !*self.reg(sel);
                *self.reg(sel) = value;
                self.set_nz(value);
            }
            Family::Neg => {
                let sel = reg_low_bit(spec);
                let (value, overflow) = alu::neg(*self.reg(sel));
                *self.reg(sel) = value;
                self.v = overflow;
                self.set_nz(value);
            }
            Family::Asl => {
                let sel = reg_low_bit(spec);
                let (value, carry, overflow) = alu::asl(*self.reg(sel));
                *self.reg(sel) = value;
                self.c = carry;
                self.v = overflow;
                self.set_nz(value);
            }
            Family::Asr => {
                let sel = reg_low_bit(spec);
                let (value, carry) = alu::asr(*self.reg(sel));
                *self.reg(sel) = value;
                self.c = carry;
                self.set_nz(value);
            }
            Family::Rol => {
                let sel = reg_low_bit(spec);
                let (value, carry) = alu::rol(*self.reg(sel), self.c);
                *self.reg(sel) = value;
                self.c = carry;
            }
            Family::Ror => {
                let sel = reg_low_bit(spec);
                let (value, carry) = alu::ror(*self.reg(sel), self.c);
                *self.reg(sel) = value;
                self.c = carry;
            }
            Family::Unimp(_) => self.trap(),
            Family::Chari => {
                let mode = mode_three_bits(spec);
                let ch = self.io.next_char().map_err(|_| RunError::ReadPastEof { at })?;
                if mode == AddrMode::Immediate {
                    return Err(self.illegal_mode(at, mode));
                }
                let addr = self.effective(mode);
                self.mem.write_byte(addr, ch);
            }
            Family::Charo => {
                let mode = mode_three_bits(spec);
                let data = self.load_byte(mode);
                self.io.put_char(data).map_err(|_| RunError::Output { at })?;
                if self.trace_echo && self.io.is_screen() {
                    let _ = self.io.put_char(0x0A);
                }
            }
            Family::Ret => {
                self.sp = self.sp.wrapping_add(u16::from(n_value(spec)));
                self.pc = self.mem.read_word(self.sp);
                self.sp = self.sp.wrapping_add(2);
            }
            Family::Addsp => {
                let value = self.load_word(mode_three_bits(spec));
                let (result, carry, overflow) = alu::add(self.sp, value);
                self.sp = result;
                self.c = carry;
                self.v = overflow;
                self.set_nz(result);
            }
            Family::Subsp => {
                let value = self.load_word(mode_three_bits(spec));
                let (result, carry, overflow) = alu::sub(self.sp, value);
                self.sp = result;
                self.c = carry;
                self.v = overflow;
                self.set_nz(result);
            }
            Family::Add => {
                let sel = reg_bit3(spec);
                let value = self.load_word(mode_three_bits(spec));
                let (result, carry, overflow) = alu::add(*self.reg(sel), value);
                *self.reg(sel) = result;
                self.c = carry;
                self.v = overflow;
                self.set_nz(result);
            }
            Family::Sub => {
                let sel = reg_bit3(spec);
                let value = self.load_word(mode_three_bits(spec));
                let (result, carry, overflow) = alu::sub(*self.reg(sel), value);
                *self.reg(sel) = result;
                self.c = carry;
                self.v = overflow;
                self.set_nz(result);
            }
            Family::And => {
                let sel = reg_bit3(spec);
                let value = self.load_word(mode_three_bits(spec));
                let result = *self.reg(sel) & value;
                *self.reg(sel) = result;
                self.set_nz(result);
            }
            Family::Or => {
                let sel = reg_bit3(spec);
                let value = self.load_word(mode_three_bits(spec));
                let result = *self.reg(sel) | value;
                *self.reg(sel) = result;
                self.set_nz(result);
            }
            Family::Cp => {
                let sel = reg_bit3(spec);
                let left = *self.reg(sel);
                let right = self.load_word(mode_three_bits(spec));
                let (result, carry, overflow) = alu::sub(left, right);
                self.c = carry;
                self.v = overflow;
                // The comparison must read correctly even when the
                // subtraction overflows, so mixed signs force N and Z.
                if left & 0x8000 == 0 && right & 0x8000 != 0 {
                    self.n = false;
                    self.z = false;
                } else if left & 0x8000 != 0 && right & 0x8000 == 0 {
                    self.n = true;
                    self.z = false;
                } else {
                    self.set_nz(result);
                }
            }
            Family::Ld => {
                let sel = reg_bit3(spec);
                let value = self.load_word(mode_three_bits(spec));
                *self.reg(sel) = value;
                self.set_nz(value);
            }
            Family::LdByte => {
                let sel = reg_bit3(spec);
                let byte = self.load_byte(mode_three_bits(spec));
                let value = (*self.reg(sel) & 0xFF00) | u16::from(byte);
                *self.reg(sel) = value;
                self.set_nz(value);
            }
            Family::St => {
                let mode = mode_three_bits(spec);
                if mode == AddrMode::Immediate {
                    return Err(self.illegal_mode(at, mode));
                }
                let addr = self.effective(mode);
                let value = *self.reg(reg_bit3(spec));
                self.mem.write_word(addr, value);
            }
            Family::StByte => {
                let mode = mode_three_bits(spec);
                if mode == AddrMode::Immediate {
                    return Err(self.illegal_mode(at, mode));
                }
                let addr = self.effective(mode);
                let value = *self.reg(reg_bit3(spec)) as u8;
                self.mem.write_byte(addr, value);
            }
        }
        Ok(false)
    }

    fn illegal_mode(&self, at: u16, mode: AddrMode) -> RunError {
        RunError::IllegalAddrMode {
            at,
            mode,
            mnemonic: decode(self.ir.spec).trace_name(self.ir.spec, &self.traps),
        }
    }

    /// Trap entry: save user state on the system stack and vector to the OS
    /// handler. The specifier byte ends up on top of the seven pushed bytes.
    fn trap(&mut self) {
        let old_sp = self.sp;
        self.sp = self.mem.read_word(SYSTEM_SP_VECTOR);
        self.sp = self.sp.wrapping_sub(1);
        self.mem.write_byte(self.sp, self.ir.spec);
        self.push_word(old_sp);
        self.push_word(self.pc);
        self.push_word(self.x);
        self.push_word(self.a);
        self.sp = self.sp.wrapping_sub(1);
        self.mem.write_byte(self.sp, self.flag_byte());
        self.pc = self.mem.read_word(TRAP_PC_VECTOR);
    }

    /// The fetch-execute loop, with the tracer wrapped around each step.
    pub fn run(&mut self, tracer: &mut Tracer) -> Result<(), RunError> {
        loop {
            let at = self.pc;
            let halt = self.step()?;
            let quit = tracer.after_step(self, at);
            if halt || quit {
                return Ok(());
            }
        }
    }

    /// The `x` command: SP from the user vector, PC to address zero.
    pub fn run_program(&mut self, tracer: &mut Tracer) -> Result<(), RunError> {
        self.io.reset_buffer();
        self.sp = self.mem.read_word(USER_SP_VECTOR);
        self.pc = 0;
        let result = self.run(tracer);
        self.io.rewind_input();
        result
    }

    /// The `l` command: the OS loader consumes the object stream through
    /// CHARI with SP and PC taken from the system vectors.
    pub fn run_loader(&mut self, object: io::InputSource, tracer: &mut Tracer) -> Result<(), RunError> {
        let saved = std::mem::replace(&mut self.io.source, object);
        self.io.reset_buffer();
        self.loading = true;
        self.reset = true;
        self.sp = self.mem.read_word(SYSTEM_SP_VECTOR);
        self.pc = self.mem.read_word(LOADER_PC_VECTOR);
        let result = self.run(tracer);
        self.loading = false;
        self.io.source = saved;
        self.io.reset_buffer();
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tracer::Tracer;
    use crate::trap::TrapTable;

    fn traps() -> TrapTable {
        TrapTable::parse(
            "NOP0\nNOP1\nNOP2\nNOP3\nNOP I\nDECI D N S SF X SX SXF\nDECO I D N S SF X SX SXF\nSTRO D N SF X\n",
        )
    }

    fn machine_with(program: &[u8]) -> Machine {
        let mut m = Machine::new(traps());
        for (i, byte) in program.iter().enumerate() {
            m.mem.write_byte(i as u16, *byte);
        }
        m
    }

    fn run_to_stop(m: &mut Machine) {
        let mut tracer = Tracer::off();
        m.run(&mut tracer).expect("program runs to STOP");
    }

    #[test]
    fn load_and_store_direct() {
        // LDA 0x0010,d / STA 0x0012,d / STOP with the word 0x1234 at 0x10.
        let mut m = machine_with(&[0xC1, 0x00, 0x10, 0xE1, 0x00, 0x12, 0x00]);
        m.mem.write_word(0x0010, 0x1234);
        run_to_stop(&mut m);
        assert_eq!(m.a, 0x1234);
        assert_eq!(m.mem.read_word(0x0012), 0x1234);
    }

    #[test]
    fn addressing_modes_resolve() {
        let mut m = machine_with(&[]);
        m.ir.oprnd = 0x0010;
        m.sp = 0x2000;
        m.x = 0x0004;
        m.mem.write_word(0x0010, 0x3000);
        m.mem.write_word(0x2010, 0x4000);
        assert_eq!(m.effective(AddrMode::Immediate), 0x0010);
        assert_eq!(m.effective(AddrMode::Direct), 0x0010);
        assert_eq!(m.effective(AddrMode::Indirect), 0x3000);
        assert_eq!(m.effective(AddrMode::StackRel), 0x2010);
        assert_eq!(m.effective(AddrMode::StackRelDef), 0x4000);
        assert_eq!(m.effective(AddrMode::Indexed), 0x0014);
        assert_eq!(m.effective(AddrMode::StackIndexed), 0x2014);
        assert_eq!(m.effective(AddrMode::StackIndexedDef), 0x4004);
    }

    #[test]
    fn subsp_and_stack_relative_load() {
        // SUBSP 4,i / LDA 0,s / STOP with a word planted at the new top.
        let mut m = machine_with(&[0x68, 0x00, 0x04, 0xC3, 0x00, 0x00, 0x00]);
        m.sp = 0xFBCF;
        m.mem.write_word(0xFBCB, 0xBEEF);
        run_to_stop(&mut m);
        assert_eq!(m.sp, 0xFBCB);
        assert_eq!(m.a, 0xBEEF);
    }

    #[test]
    fn rom_writes_are_dropped() {
        let mut m = machine_with(&[]);
        m.mem.install_rom("12 34 zz\n").expect("rom");
        assert_eq!(m.mem.rom_start(), 0xFFFE);
        assert_eq!(m.mem.read_byte(0xFFFE), 0x12);
        m.mem.write_byte(0xFFFE, 0x99);
        assert_eq!(m.mem.read_byte(0xFFFE), 0x12);
        m.mem.write_byte(0xFFFD, 0x77);
        assert_eq!(m.mem.read_byte(0xFFFD), 0x77);
        // A word write straddling the boundary keeps only the low half.
        m.mem.write_word(0xFFFD, 0xAABB);
        assert_eq!(m.mem.read_byte(0xFFFD), 0xAA);
        assert_eq!(m.mem.read_byte(0xFFFE), 0x12);
    }

    #[test]
    fn trap_saves_user_state_and_rettr_restores() {
        // Specifier 0x26 is trap slot 2; the handler at 0x0001 is RETTR.
        let mut m = machine_with(&[0x26, 0x01]);
        m.mem.write_word(SYSTEM_SP_VECTOR, 0xFB8F);
        m.mem.write_word(TRAP_PC_VECTOR, 0x0001);
        m.a = 0x1122;
        m.x = 0x3344;
        m.sp = 0x9000;
        m.n = true;
        m.c = true;
        let halted = m.step().expect("trap executes");
        assert!(!halted);
        assert_eq!(m.pc, 0x0001);
        // Frame: 1 flags + 2 A + 2 X + 2 PC + 2 old SP + 1 specifier.
        assert_eq!(m.sp, 0xFB8F - 10);
        assert_eq!(m.mem.read_byte(m.sp), 0b1001);
        assert_eq!(m.mem.read_word(m.sp.wrapping_add(1)), 0x1122);
        assert_eq!(m.mem.read_word(m.sp.wrapping_add(3)), 0x3344);
        assert_eq!(m.mem.read_word(m.sp.wrapping_add(5)), 0x0001);
        assert_eq!(m.mem.read_word(m.sp.wrapping_add(7)), 0x9000);
        assert_eq!(m.mem.read_byte(0xFB8F - 1), 0x26);

        // RETTR at the handler restores the caller byte-for-byte.
        m.a = 0;
        m.x = 0;
        m.n = false;
        m.c = false;
        let halted = m.step().expect("rettr executes");
        assert!(!halted);
        assert_eq!(m.a, 0x1122);
        assert_eq!(m.x, 0x3344);
        assert_eq!(m.sp, 0x9000);
        assert_eq!(m.pc, 0x0001);
        assert!(m.n && m.c && !m.z && !m.v);
    }

    #[test]
    fn compare_forces_flags_on_mixed_signs() {
        // CPA with A positive and operand negative: N and Z cleared even
        // though the subtraction overflows.
        let mut m = machine_with(&[0xB0, 0x80, 0x00, 0x00]);
        m.a = 0x7FFF;
        run_to_stop(&mut m);
        assert!(!m.n && !m.z && m.v);
        // Negative compared against positive reads as less-than.
        let mut m = machine_with(&[0xB0, 0x7F, 0xFF, 0x00]);
        m.a = 0x8000;
        run_to_stop(&mut m);
        assert!(m.n && !m.z);
    }

    #[test]
    fn branches_follow_their_predicates() {
        // BRLE taken on Z: PC moves to the immediate target.
        let mut m = machine_with(&[0x06, 0x12, 0x34]);
        m.z = true;
        m.step().expect("branch");
        assert_eq!(m.pc, 0x1234);
        // Not taken when N and Z clear.
        let mut m = machine_with(&[0x06, 0x12, 0x34]);
        m.step().expect("branch");
        assert_eq!(m.pc, 0x0003);
        // Indexed branch goes through memory at X + operand.
        let mut m = machine_with(&[0x05, 0x00, 0x10]);
        m.x = 0x0002;
        m.mem.write_word(0x0012, 0x4321);
        m.step().expect("branch");
        assert_eq!(m.pc, 0x4321);
    }

    #[test]
    fn call_pushes_return_address() {
        let mut m = machine_with(&[0x16, 0x20, 0x00]);
        m.sp = 0x9000;
        m.step().expect("call");
        assert_eq!(m.pc, 0x2000);
        assert_eq!(m.sp, 0x8FFE);
        assert_eq!(m.mem.read_word(0x8FFE), 0x0003);
        // RET0 undoes it.
        m.mem.write_byte(0x2000, 0x58);
        m.step().expect("ret");
        assert_eq!(m.pc, 0x0003);
        assert_eq!(m.sp, 0x9000);
    }

    #[test]
    fn store_immediate_is_a_runtime_error() {
        let mut m = machine_with(&[0xE0, 0x00, 0x05]);
        let err = m.step().expect_err("immediate store must fail");
        let text = err.to_string();
        assert!(text.contains("Runtime error at 0000"));
        assert!(text.contains("immediate"));
        assert!(text.contains("STA"));
    }

    #[test]
    fn byte_ops_touch_only_the_low_byte() {
        // LDBYTEA 0x0004,d / STBYTEA 0x0005,d / STOP ... data
        let mut m = machine_with(&[0xD1, 0x00, 0x06, 0x00, 0x00, 0x00, 0xAB]);
        m.a = 0x1200;
        m.step().expect("ldbyte");
        assert_eq!(m.a, 0x12AB);
        assert!(!m.z && !m.n);
        let mut m = machine_with(&[0xF1, 0x00, 0x06, 0x00, 0x00, 0x00, 0x00]);
        m.a = 0x34CD;
        m.step().expect("stbyte");
        assert_eq!(m.mem.read_byte(0x0006), 0xCD);
    }

    #[test]
    fn chari_charo_through_buffers() {
        use super::io::{InputSource, OutputSink};
        use std::io::Cursor;
        // CHARI 0x0010,d / CHARO 0x0010,d / STOP
        let mut m = machine_with(&[0x49, 0x00, 0x10, 0x51, 0x00, 0x10, 0x00]);
        m.io.source = InputSource::Bytes(Cursor::new(b"Q\n".to_vec()));
        m.io.sink = OutputSink::Bytes(Vec::new());
        run_to_stop(&mut m);
        assert_eq!(m.mem.read_byte(0x0010), b'Q');
        match &m.io.sink {
            OutputSink::Bytes(buf) => assert_eq!(buf.as_slice(), b"Q"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn chari_past_eof_reports_the_instruction_address() {
        use super::io::InputSource;
        use std::io::Cursor;
        let mut m = machine_with(&[0x49, 0x00, 0x10]);
        m.io.source = InputSource::Bytes(Cursor::new(Vec::new()));
        let err = m.step().expect_err("eof");
        assert!(err.to_string().contains("read past end of file"));
        assert!(err.to_string().contains("0000"));
    }

    #[test]
    fn movspa_and_movflga() {
        let mut m = machine_with(&[0x02, 0x03, 0x00]);
        m.sp = 0xFB8F;
        m.z = true;
        m.c = true;
        run_to_stop(&mut m);
        assert_eq!(m.a, 0b0101);
        let mut m = machine_with(&[0x02, 0x00]);
        m.sp = 0xFB8F;
        run_to_stop(&mut m);
        assert_eq!(m.a, 0xFB8F);
    }

    #[test]
    fn loader_runs_from_the_vectors() {
        use super::io::InputSource;
        use std::io::Cursor;
        let mut m = machine_with(&[]);
        // A one-instruction "OS": the loader entry is simply STOP.
        m.mem.write_word(LOADER_PC_VECTOR, 0x0100);
        m.mem.write_word(SYSTEM_SP_VECTOR, 0xFB8F);
        m.mem.write_byte(0x0100, 0x00);
        let mut tracer = Tracer::off();
        m.run_loader(InputSource::Bytes(Cursor::new(b"zz\n".to_vec())), &mut tracer)
            .expect("loader stops");
        assert!(m.reset);
        assert!(!m.loading);
        assert_eq!(m.sp, 0xFB8F);
    }
}
