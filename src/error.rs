//! The assembler's error taxonomy. Each variant replaces the code item of
//! the offending source line and renders as a fixed diagnostic string.

use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AsmError {
    MissingEnd,
    LineTableOverflow,
    CodeTableOverflow,
    SymbolRedefined,
    InstrOrDotExpected,
    SymInstrOrDotExpected,
    InvalidMnemonic,
    InvalidSyntax,
    CommentExpected,
    OperandExpected,
    InvalidDecConst,
    InvalidHexConst,
    InvalidCharConst,
    InvalidString,
    InvalidAddrMode,
    InvalidDotCommand,
    AddrModeExpected,
    AddrModeOrCommentExpected,
    IllegalAddrMode,
    DecOverflow,
    DecOrHexExpected,
    ConstExpected,
    CharNeedsAddrMode,
    StringNeedsAddrMode,
    SymbolAfterAddrss,
    SymbolBeforeEquate,
    ConstOverflow,
    ByteOutOfRange,
    UndefinedSymbol,
    AddrOverflow,
    MultipleBurn,
    StringOperandTooLong,
    ByteStringTooLong,
    WordStringTooLong,
    EquateStringTooLong,
    UnexpectedOperand,
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            AsmError::MissingEnd => "Missing .END sentinel.",
            AsmError::LineTableOverflow => "Program too long. Listing table overflow.",
            AsmError::CodeTableOverflow => "Program too long. Code table overflow.",
            AsmError::SymbolRedefined => "Symbol previously defined.",
            AsmError::InstrOrDotExpected => "Instruction or dot command expected.",
            AsmError::SymInstrOrDotExpected => "Symbol, instruction, or dot command expected.",
            AsmError::InvalidMnemonic => "Invalid mnemonic.",
            AsmError::InvalidSyntax => "Invalid syntax.",
            AsmError::CommentExpected => "Comment expected.",
            AsmError::OperandExpected => "Operand specifier expected.",
            AsmError::InvalidDecConst => "Invalid decimal constant.",
            AsmError::InvalidHexConst => "Invalid hexadecimal constant.",
            AsmError::InvalidCharConst => "Invalid character constant.",
            AsmError::InvalidString => "Invalid string expression.",
            AsmError::InvalidAddrMode => "Invalid addressing mode.",
            AsmError::InvalidDotCommand => "Invalid dot command.",
            AsmError::AddrModeExpected => "Addressing mode expected.",
            AsmError::AddrModeOrCommentExpected => "Addressing mode or comment expected.",
            AsmError::IllegalAddrMode => "This instruction cannot have this addressing mode.",
            AsmError::DecOverflow => "Decimal overflow. Range is -32768 to 65535.",
            AsmError::DecOrHexExpected => "Decimal or hex constant expected.",
            AsmError::ConstExpected => "Constant expected.",
            AsmError::CharNeedsAddrMode => {
                "Addressing mode always required with char constant operands."
            }
            AsmError::StringNeedsAddrMode => {
                "Addressing mode always required with string operands."
            }
            AsmError::SymbolAfterAddrss => "Symbol required after .ADDRSS pseudo-op.",
            AsmError::SymbolBeforeEquate => "Symbol required before .EQUATE pseudo-op.",
            AsmError::ConstOverflow => "Constant overflow. Range is 0 to 255 (dec).",
            AsmError::ByteOutOfRange => "Byte value out of range.",
            AsmError::UndefinedSymbol => "Reference to undefined symbol.",
            AsmError::AddrOverflow => "Address overflow. Range is 0 to 65535 (dec).",
            AsmError::MultipleBurn => "More than one .BURN pseudo-op not allowed in program.",
            AsmError::StringOperandTooLong => "The string is too long to be a valid operand.",
            AsmError::ByteStringTooLong => {
                "The string is too long to be used with .BYTE pseudo-op."
            }
            AsmError::WordStringTooLong => {
                "The string is too long to be used with .WORD pseudo-op."
            }
            AsmError::EquateStringTooLong => {
                "The string is too long to be used with .EQUATE pseudo-op."
            }
            AsmError::UnexpectedOperand => "Unexpected operand specifier.",
        };
        f.write_str(msg)
    }
}
