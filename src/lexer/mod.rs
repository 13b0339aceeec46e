//! Tokenizer for one line of Pep/8 assembly. A deterministic state machine
//! dispatches on the leading character and backs the cursor up whenever a
//! transition consumes look-ahead it does not keep.

pub mod cursor;

use crate::mnemonic::AddrMode;
use cursor::Cursor;

const IDENT_LENGTH: usize = 8;
const DEC_LENGTH: usize = 6;
const HEX_LENGTH: usize = 4;
const STRING_LENGTH: usize = 96;
const COMMENT_LENGTH: usize = 65;

/// One token of a source line. Numeric tokens keep their textual value;
/// interpretation happens in the parser. Char and string tokens also carry
/// their decoded bytes since escape decoding is a lexing concern.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Token {
    AddrMode(AddrMode),
    CharConstant { text: String, byte: u8 },
    Comment(String),
    DecConstant(String),
    DotCommand(String),
    Empty,
    /// Exactly four uppercase hex digits, zero-padded on the left.
    HexConstant(String),
    Identifier(String),
    Str { text: String, bytes: Vec<u8> },
    SymbolDecl(String),
    Invalid,
    InvalidAddr,
    InvalidChar,
    InvalidDec,
    InvalidDot,
    InvalidHex,
    InvalidString,
}

enum State {
    Start,
    Addr,
    AddrS,
    AddrSx,
    Char1,
    Char2,
    CharBash,
    CharByte,
    Comment,
    Dec,
    Dot1,
    Dot2,
    Hex1,
    Hex2,
    Ident,
    Sign,
    Str,
    StrBash,
    StrByte,
}

fn hex_upper(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' | b'A'..=b'F' => Some(ch),
        b'a'..=b'f' => Some(ch.to_ascii_uppercase()),
        _ => None,
    }
}

fn hex_digit_value(ch: u8) -> u8 {
    match ch {
        b'0'..=b'9' => ch - b'0',
        _ => ch.to_ascii_uppercase() - b'A' + 10,
    }
}

fn escape_byte(ch: u8) -> u8 {
    match ch {
        b'b' => 0x08,
        b'f' => 0x0C,
        b'n' => 0x0A,
        b'r' => 0x0D,
        b't' => 0x09,
        b'v' => 0x0B,
        other => other,
    }
}

/// Decodes the source form of a char or string constant (quotes stripped,
/// escapes still textual) into the bytes it denotes.
fn decode_escaped(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 1 < bytes.len() {
            if bytes[i + 1] == b'x' && i + 3 < bytes.len() {
                out.push(hex_digit_value(bytes[i + 2]) * 16 + hex_digit_value(bytes[i + 3]));
                i += 4;
            } else {
                out.push(escape_byte(bytes[i + 1]));
                i += 2;
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    out
}

/// Produces the next token from the line. Always terminates: the cursor
/// yields line feeds past the end of the line and a line feed is a stopping
/// input for every state.
pub fn next_token(cur: &mut Cursor) -> Token {
    let mut state = State::Start;
    let mut text = String::new();
    // Zero-padded window for hex constants; new digits shift in from the right.
    let mut hex_window = *b"0000";
    let mut hex_count = 0usize;

    loop {
        let ch = cur.advance();
        match state {
            State::Start => match ch {
                b',' => state = State::Addr,
                b'\'' => state = State::Char1,
                b';' => state = State::Comment,
                b'.' => state = State::Dot1,
                b'\n' => return Token::Empty,
                b'"' => state = State::Str,
                b'+' => state = State::Sign,
                b'-' => {
                    text.push('-');
                    state = State::Sign;
                }
                b'0' => {
                    let next = cur.advance();
                    if next == b'x' || next == b'X' {
                        state = State::Hex1;
                    } else {
                        text.push('0');
                        cur.backup();
                        state = State::Dec;
                    }
                }
                c if c.is_ascii_digit() => {
                    text.push(c as char);
                    state = State::Dec;
                }
                c if c.is_ascii_alphabetic() || c == b'_' => {
                    text.push(c as char);
                    state = State::Ident;
                }
                b' ' | b'\t' => {}
                _ => return Token::Invalid,
            },
            State::Addr => match ch.to_ascii_lowercase() {
                b'i' => return Token::AddrMode(AddrMode::Immediate),
                b'd' => return Token::AddrMode(AddrMode::Direct),
                b'n' => return Token::AddrMode(AddrMode::Indirect),
                b'x' => return Token::AddrMode(AddrMode::Indexed),
                b's' => state = State::AddrS,
                b' ' | b'\t' => {}
                _ => {
                    cur.backup();
                    return Token::InvalidAddr;
                }
            },
            State::AddrS => match ch.to_ascii_lowercase() {
                b'f' => return Token::AddrMode(AddrMode::StackRelDef),
                b'x' => state = State::AddrSx,
                _ => {
                    cur.backup();
                    return Token::AddrMode(AddrMode::StackRel);
                }
            },
            State::AddrSx => match ch.to_ascii_lowercase() {
                b'f' => return Token::AddrMode(AddrMode::StackIndexedDef),
                _ => {
                    cur.backup();
                    return Token::AddrMode(AddrMode::StackIndexed);
                }
            },
            State::Char1 => match ch {
                b'\\' => {
                    text.push('\\');
                    state = State::CharBash;
                }
                b'\'' => {
                    cur.backup();
                    return Token::InvalidChar;
                }
                c => {
                    text.push(c as char);
                    state = State::Char2;
                }
            },
            State::Char2 => {
                if ch == b'\'' {
                    let byte = decode_escaped(&text)[0];
                    return Token::CharConstant { text, byte };
                }
                cur.backup();
                return Token::InvalidChar;
            }
            State::CharBash => match ch {
                b'x' | b'X' => {
                    text.push('x');
                    state = State::CharByte;
                }
                b'\\' | b'"' | b'\'' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' => {
                    text.push(ch as char);
                    state = State::Char2;
                }
                _ => {
                    cur.backup();
                    return Token::InvalidChar;
                }
            },
            State::CharByte => {
                if let Some(hi) = hex_upper(ch) {
                    text.push(hi as char);
                    let second = cur.advance();
                    if let Some(lo) = hex_upper(second) {
                        text.push(lo as char);
                        state = State::Char2;
                        continue;
                    }
                }
                cur.backup();
                return Token::InvalidChar;
            }
            State::Comment => {
                if ch == b'\n' {
                    cur.backup();
                    return Token::Comment(text);
                }
                // Over-long comments are silently truncated, not an error.
                if text.len() < COMMENT_LENGTH {
                    text.push(ch as char);
                }
            }
            State::Dec => {
                if ch.is_ascii_digit() && text.len() < DEC_LENGTH {
                    text.push(ch as char);
                } else {
                    cur.backup();
                    return Token::DecConstant(text);
                }
            }
            State::Dot1 => {
                if ch.is_ascii_alphabetic() {
                    text.push(ch as char);
                    state = State::Dot2;
                } else {
                    cur.backup();
                    return Token::InvalidDot;
                }
            }
            State::Dot2 => {
                if text.len() < IDENT_LENGTH && ch.is_ascii_alphanumeric() {
                    text.push(ch as char);
                } else {
                    cur.backup();
                    return Token::DotCommand(text);
                }
            }
            State::Hex1 => {
                if let Some(digit) = hex_upper(ch) {
                    hex_window[HEX_LENGTH - 1] = digit;
                    hex_count = 1;
                    state = State::Hex2;
                } else {
                    cur.backup();
                    return Token::InvalidHex;
                }
            }
            State::Hex2 => match hex_upper(ch) {
                Some(digit) if hex_count < HEX_LENGTH => {
                    hex_window.rotate_left(1);
                    hex_window[HEX_LENGTH - 1] = digit;
                    hex_count += 1;
                }
                _ => {
                    cur.backup();
                    return Token::HexConstant(String::from_utf8_lossy(&hex_window).into_owned());
                }
            },
            State::Ident => {
                if (ch.is_ascii_alphanumeric() || ch == b'_') && text.len() < IDENT_LENGTH {
                    text.push(ch as char);
                } else if ch == b':' {
                    return Token::SymbolDecl(text);
                } else {
                    cur.backup();
                    return Token::Identifier(text);
                }
            }
            State::Sign => {
                if ch == b'0' {
                    // A signed zero collapses to the constant 0.
                    return Token::DecConstant("0".to_string());
                }
                if ch.is_ascii_digit() {
                    text.push(ch as char);
                    state = State::Dec;
                } else {
                    cur.backup();
                    return Token::InvalidDec;
                }
            }
            State::Str => match ch {
                b'\\' => {
                    text.push('\\');
                    state = State::StrBash;
                }
                c if c != b'"' && c != b'\n' && text.len() < STRING_LENGTH => {
                    text.push(c as char);
                }
                b'"' if !text.is_empty() => {
                    let bytes = decode_escaped(&text);
                    return Token::Str { text, bytes };
                }
                _ => {
                    cur.backup();
                    return Token::InvalidString;
                }
            },
            State::StrBash => match ch {
                b'x' | b'X' => {
                    text.push('x');
                    state = State::StrByte;
                }
                b'\\' | b'"' | b'\'' | b'b' | b'f' | b'n' | b'r' | b't' | b'v' => {
                    text.push(ch as char);
                    state = State::Str;
                }
                _ => {
                    cur.backup();
                    return Token::InvalidString;
                }
            },
            State::StrByte => {
                if let Some(hi) = hex_upper(ch) {
                    text.push(hi as char);
                    let second = cur.advance();
                    if let Some(lo) = hex_upper(second) {
                        text.push(lo as char);
                        state = State::Str;
                        continue;
                    }
                }
                cur.backup();
                return Token::InvalidString;
            }
        }
    }
}

/// Whole-line tokenization, for tests and diagnostics.
#[cfg(test)]
fn tokenize_line(line: &str) -> Vec<Token> {
    let mut cur = Cursor::new(line);
    let mut toks = Vec::new();
    loop {
        let tok = next_token(&mut cur);
        let done = tok == Token::Empty;
        toks.push(tok);
        if done {
            return toks;
        }
    }
}
