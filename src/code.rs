//! Code items: the per-line output of the parser, one tagged value per
//! source line. Items know their byte width, how to shift themselves for a
//! `.BURN`, and which object bytes they contribute.

use crate::error::AsmError;
use crate::mnemonic::{AddrMode, DotCommand, Mnemonic};
use crate::symbol::SymbolTable;

/// Numeric interpretation of a lexed decimal constant.
pub fn dec_value(text: &str) -> i32 {
    let mut sign = 1i32;
    let mut value = 0i32;
    for ch in text.bytes() {
        match ch {
            b'-' => sign = -1,
            b'+' => {}
            d if d.is_ascii_digit() => value = value * 10 + i32::from(d - b'0'),
            _ => {}
        }
    }
    sign * value
}

/// Numeric interpretation of a lexed (4-digit) hex constant.
pub fn hex_value(text: &str) -> u16 {
    text.bytes().fold(0u16, |acc, ch| {
        let digit = match ch {
            b'0'..=b'9' => ch - b'0',
            b'a'..=b'f' => ch - b'a' + 10,
            b'A'..=b'F' => ch - b'A' + 10,
            _ => 0,
        };
        acc.wrapping_mul(16).wrapping_add(u16::from(digit))
    })
}

/// An instruction or dot-command argument. Numeric operands keep their
/// source text for the listing; char and string operands also carry their
/// decoded bytes.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    Dec(String),
    Hex(String),
    Char { text: String, byte: u8 },
    Str { text: String, bytes: Vec<u8> },
    Symbol(String),
}

impl Operand {
    /// The 16-bit value this operand denotes, with symbols resolved.
    pub fn word(&self, symbols: &SymbolTable) -> u16 {
        match self {
            Operand::Dec(text) => dec_value(text) as u16,
            Operand::Hex(text) => hex_value(text),
            Operand::Char { byte, .. } => u16::from(*byte),
            Operand::Str { bytes, .. } => match bytes.as_slice() {
                [single] => u16::from(*single),
                [hi, lo, ..] => u16::from_be_bytes([*hi, *lo]),
                [] => 0,
            },
            Operand::Symbol(name) => symbols.value(name).unwrap_or(0),
        }
    }

    /// The single byte this operand denotes (`.BYTE` arguments).
    pub fn byte(&self) -> u8 {
        match self {
            Operand::Dec(text) => dec_value(text) as u8,
            Operand::Hex(text) => hex_value(text) as u8,
            Operand::Char { byte, .. } => *byte,
            Operand::Str { bytes, .. } => bytes.first().copied().unwrap_or(0),
            Operand::Symbol(_) => 0,
        }
    }

    /// `.BLOCK` reservation size. Only decimal and hex operands reach here.
    pub fn block_len(&self) -> u32 {
        match self {
            Operand::Dec(text) => dec_value(text).max(0) as u32,
            Operand::Hex(text) => u32::from(hex_value(text)),
            _ => 0,
        }
    }
}

/// One assembled source line.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CodeItem {
    /// Blank line or full-line comment.
    Blank,
    /// The `.END` sentinel.
    End { addr: u16 },
    Unary {
        addr: u16,
        op: Mnemonic,
    },
    NonUnary {
        addr: u16,
        op: Mnemonic,
        operand: Operand,
        /// `None` only for branches written without a mode (immediate).
        mode: Option<AddrMode>,
    },
    /// `.ADDRSS`, `.BLOCK`, `.BURN`, `.BYTE`, `.EQUATE`, or `.WORD`.
    Dot {
        addr: u16,
        dot: DotCommand,
        operand: Operand,
    },
    Ascii {
        addr: u16,
        text: String,
        bytes: Vec<u8>,
    },
    /// The line failed to assemble; the error replaces the item.
    Error(AsmError),
}

impl CodeItem {
    /// How far this item advances the address counter.
    pub fn byte_width(&self) -> u32 {
        match self {
            CodeItem::Blank | CodeItem::End { .. } | CodeItem::Error(_) => 0,
            CodeItem::Unary { .. } => 1,
            CodeItem::NonUnary { .. } => 3,
            CodeItem::Ascii { bytes, .. } => bytes.len() as u32,
            CodeItem::Dot { dot, operand, .. } => match dot {
                DotCommand::Block => operand.block_len(),
                DotCommand::Byte => 1,
                DotCommand::Word | DotCommand::Addrss => 2,
                _ => 0,
            },
        }
    }

    /// Address stamped on the item, if it has one.
    pub fn addr(&self) -> Option<u16> {
        match self {
            CodeItem::Blank | CodeItem::Error(_) => None,
            CodeItem::End { addr }
            | CodeItem::Unary { addr, .. }
            | CodeItem::NonUnary { addr, .. }
            | CodeItem::Dot { addr, .. }
            | CodeItem::Ascii { addr, .. } => Some(*addr),
        }
    }

    /// Applies the burn delta to the stamped address.
    pub fn shift(&mut self, delta: u16) {
        match self {
            CodeItem::Blank | CodeItem::Error(_) => {}
            CodeItem::End { addr }
            | CodeItem::Unary { addr, .. }
            | CodeItem::NonUnary { addr, .. }
            | CodeItem::Dot { addr, .. }
            | CodeItem::Ascii { addr, .. } => *addr = addr.wrapping_add(delta),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CodeItem::Error(_))
    }

    /// Object bytes this item contributes, in address order. Items without
    /// object code (blank lines, `.EQUATE`, `.BURN`, `.END`, errors) yield
    /// an empty vector.
    pub fn object_bytes(&self, symbols: &SymbolTable) -> Vec<u8> {
        match self {
            CodeItem::Blank | CodeItem::End { .. } | CodeItem::Error(_) => Vec::new(),
            CodeItem::Unary { op, .. } => vec![op.encode(None)],
            CodeItem::NonUnary { op, operand, mode, .. } => {
                let word = operand.word(symbols);
                let [hi, lo] = word.to_be_bytes();
                vec![op.encode(*mode), hi, lo]
            }
            CodeItem::Ascii { bytes, .. } => bytes.clone(),
            CodeItem::Dot { dot, operand, .. } => match dot {
                DotCommand::Block => vec![0; operand.block_len() as usize],
                DotCommand::Byte => vec![operand.byte()],
                DotCommand::Word | DotCommand::Addrss => {
                    operand.word(symbols).to_be_bytes().to_vec()
                }
                _ => Vec::new(),
            },
        }
    }
}
