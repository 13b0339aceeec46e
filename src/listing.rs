//! Pass two: the fixed-width assembler listing and the bare-hex object
//! stream. Both walk the code-item sequence in source order; a `.BURN`
//! never reorders emission, it only moves the addresses stamped on items
//! and suppresses bytes that land below the burn line.

use std::io::{self, Write};

use crate::code::{CodeItem, Operand};
use crate::mnemonic::{AddrMode, DotCommand};
use crate::parser::Assembly;

const RULE: &str =
    "-------------------------------------------------------------------------------";
const SYM_RULE: &str = "--------------------------------------";
/// Hex digits of object code on one listing row (3 bytes).
const OBJ_CODE_LENGTH: usize = 6;
const OPERAND_SPACES: usize = 14;
/// Trailing-comment width with and without a symbol column.
const COMMENT_NONEMPTY: usize = 34;
const COMMENT_NONEMPTY_NO_SYMBOLS: usize = 43;
const OBJ_FILE_LINE_LENGTH: usize = 16;

fn hex_str(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Bytes below the burn line never reach the listing's object column or the
/// object file.
fn suppressed(item: &CodeItem, burn_addr: Option<u16>) -> bool {
    match (burn_addr, item.addr()) {
        (Some(burn), Some(addr)) => addr < burn,
        _ => false,
    }
}

fn operand_text(operand: &Operand, mode: Option<AddrMode>) -> String {
    let mut text = match operand {
        Operand::Dec(text) => text.clone(),
        Operand::Hex(text) => format!("0x{text}"),
        Operand::Char { text, .. } => format!("'{text}'"),
        Operand::Str { text, .. } => format!("\"{text}\""),
        Operand::Symbol(name) => name.clone(),
    };
    if let Some(mode) = mode {
        text.push(',');
        text.push_str(mode.suffix());
    }
    text
}

pub fn write_listing<W: Write>(out: &mut W, asm: &Assembly) -> io::Result<()> {
    let have_symbols = !asm.symbols.is_empty();
    writeln!(out, "{RULE}")?;
    writeln!(out, "      Object")?;
    if have_symbols {
        writeln!(out, "Addr  code   Symbol   Mnemon  Operand       Comment")?;
    } else {
        writeln!(out, "Addr  code   Mnemon  Operand       Comment")?;
    }
    writeln!(out, "{RULE}")?;

    let mut comments = asm.comments.iter().peekable();
    for (line, item) in asm.items.iter().enumerate() {
        let mut row = String::new();
        let bytes = item.object_bytes(&asm.symbols);
        let hide_code = suppressed(item, asm.burn_addr);

        match item {
            CodeItem::Blank | CodeItem::Error(_) => {
                // Blank lines and full-line comments carry no address,
                // object code, or symbol column.
                row.push_str(&" ".repeat(13));
            }
            _ => {
                match item {
                    CodeItem::Dot { dot: DotCommand::Equate, .. } => row.push_str("      "),
                    _ => row.push_str(&format!("{:04X}  ", item.addr().unwrap_or(0))),
                }
                if hide_code {
                    row.push_str(&" ".repeat(7));
                } else {
                    let shown = &bytes[..bytes.len().min(OBJ_CODE_LENGTH / 2)];
                    row.push_str(&format!("{:<7}", hex_str(shown)));
                }
                if have_symbols {
                    match asm.sym_decls.iter().find(|(l, _)| *l == line) {
                        Some((_, name)) => row.push_str(&format!("{:<9}", format!("{name}:"))),
                        None => row.push_str(&" ".repeat(9)),
                    }
                }
                row.push_str(&mnemonic_column(item, asm));
                row.push_str(&operand_column(item));
            }
        }

        if let Some(entry) = comments.next_if(|entry| entry.line == line) {
            let text: String = if entry.trailing {
                let width = if have_symbols {
                    COMMENT_NONEMPTY
                } else {
                    COMMENT_NONEMPTY_NO_SYMBOLS
                };
                entry.text.chars().take(width).collect()
            } else {
                entry.text.clone()
            };
            row.push(';');
            row.push_str(&text);
        }
        writeln!(out, "{}", row.trim_end())?;

        // .BLOCK and .ASCII objects beyond 3 bytes continue under a blank
        // address column.
        if bytes.len() > OBJ_CODE_LENGTH / 2 && !hide_code {
            for chunk in bytes[OBJ_CODE_LENGTH / 2..].chunks(OBJ_CODE_LENGTH / 2) {
                writeln!(out, "      {}", hex_str(chunk))?;
            }
        }
    }
    writeln!(out, "{RULE}")?;

    if have_symbols {
        writeln!(out)?;
        writeln!(out)?;
        writeln!(out, "Symbol table")?;
        writeln!(out, "{SYM_RULE}")?;
        writeln!(out, "Symbol    Value        Symbol    Value")?;
        writeln!(out, "{SYM_RULE}")?;
        let mut row = String::new();
        let mut first_column = true;
        for (name, entry) in asm.symbols.iter() {
            row.push_str(&format!("{name:<9} {:04X}", entry.value));
            if first_column {
                row.push_str(&" ".repeat(9));
                first_column = false;
            } else {
                writeln!(out, "{}", row.trim_end())?;
                row.clear();
                first_column = true;
            }
        }
        if !first_column {
            writeln!(out, "{}", row.trim_end())?;
        }
        writeln!(out, "{SYM_RULE}")?;
    }
    Ok(())
}

fn mnemonic_column(item: &CodeItem, asm: &Assembly) -> String {
    match item {
        CodeItem::Unary { op, .. } | CodeItem::NonUnary { op, .. } => {
            format!("{:<8}", op.name(&asm.traps))
        }
        CodeItem::Dot { dot, .. } => format!(".{:<7}", dot.name()),
        CodeItem::End { .. } => format!(".{:<7}", DotCommand::End.name()),
        CodeItem::Ascii { .. } => format!(".{:<7}", DotCommand::Ascii.name()),
        CodeItem::Blank | CodeItem::Error(_) => String::new(),
    }
}

fn operand_column(item: &CodeItem) -> String {
    match item {
        CodeItem::NonUnary { operand, mode, .. } => {
            format!("{:<14}", operand_text(operand, *mode))
        }
        CodeItem::Dot { dot, operand, .. } => {
            // .BYTE shows only the low pair of its hex argument.
            let shown = match (dot, operand) {
                (DotCommand::Byte, Operand::Hex(text)) => {
                    format!("0x{}", &text[text.len().saturating_sub(2)..])
                }
                _ => operand_text(operand, None),
            };
            format!("{shown:<14}")
        }
        CodeItem::Ascii { text, .. } => {
            let quoted = format!("\"{text}\"");
            if text.chars().count() < OPERAND_SPACES - 2 {
                format!("{quoted:<14}")
            } else {
                format!("{quoted} ")
            }
        }
        _ => " ".repeat(OPERAND_SPACES),
    }
}

/// The bare-hex object stream: 16 bytes per line, single spaces between,
/// closed by the `zz` sentinel.
pub fn write_object<W: Write>(out: &mut W, asm: &Assembly) -> io::Result<()> {
    let mut on_line = 0usize;
    for item in &asm.items {
        if suppressed(item, asm.burn_addr) {
            continue;
        }
        for byte in item.object_bytes(&asm.symbols) {
            write!(out, "{byte:02X}")?;
            if on_line == OBJ_FILE_LINE_LENGTH - 1 {
                writeln!(out)?;
                on_line = 0;
            } else {
                write!(out, " ")?;
                on_line += 1;
            }
        }
    }
    writeln!(out, "zz")
}
