//! The line parser and pass-one driver. Each source line runs through a
//! token-driven state machine that either yields one valid code item or
//! replaces the line with an error item. After the whole source has been
//! seen, undeclared references are resolved and a `.BURN` relocation is
//! applied.

use crate::code::{dec_value, hex_value, CodeItem, Operand};
use crate::error::AsmError;
use crate::lexer::{cursor::Cursor, next_token, Token};
use crate::mnemonic::{lookup_dot, lookup_mnemonic, DotCommand, Mnemonic};
use crate::symbol::{CommentEntry, EquateList, SymbolTable, UndeclaredRef};
use crate::trap::TrapTable;

const MAX_LINES: usize = 4096;
const MAX_ADDR: u32 = 65535;
const MIN_DEC: i32 = -32768;
const MAX_DEC: i32 = 65535;
const MIN_BYTE: i32 = -256;
const MAX_BYTE: i32 = 255;

/// Everything pass one produces, ready for the listing and object writers.
pub struct Assembly {
    pub items: Vec<CodeItem>,
    pub symbols: SymbolTable,
    pub comments: Vec<CommentEntry>,
    /// Symbol declarations by (line, name), in source order.
    pub sym_decls: Vec<(usize, String)>,
    /// Error items by zero-based line index, in source order.
    pub errors: Vec<(usize, AsmError)>,
    /// Relocated address of the `.BURN` line; object emission starts here.
    pub burn_addr: Option<u16>,
    pub traps: TrapTable,
}

struct BurnState {
    operand: u16,
    line_addr: u16,
}

pub struct Assembler {
    traps: TrapTable,
    items: Vec<CodeItem>,
    symbols: SymbolTable,
    equates: EquateList,
    undeclared: Vec<UndeclaredRef>,
    comments: Vec<CommentEntry>,
    sym_decls: Vec<(usize, String)>,
    current_address: u32,
    burn: Option<BurnState>,
    terminated: bool,
}

/// Parser states. Items under construction ride along as payload.
enum PState {
    Start,
    AfterSymbol,
    Instruction(Mnemonic),
    Operand(Mnemonic, Operand),
    Dot(DotCommand),
    Equate,
    Ascii,
    Close(CodeItem),
    CommentTail(CodeItem),
}

pub fn assemble(source: &str, traps: TrapTable) -> Assembly {
    let mut asm = Assembler::new(traps);
    for line in source.lines() {
        if asm.terminated {
            break;
        }
        if asm.items.len() >= MAX_LINES {
            asm.items.push(CodeItem::Error(AsmError::LineTableOverflow));
            asm.terminated = true;
            break;
        }
        let mut item = asm.parse_line(line);
        if asm.current_address > MAX_ADDR && !item.is_error() {
            item = CodeItem::Error(AsmError::CodeTableOverflow);
            asm.terminated = true;
        }
        asm.items.push(item);
    }
    asm.finish()
}

impl Assembler {
    fn new(traps: TrapTable) -> Assembler {
        Assembler {
            traps,
            items: Vec::new(),
            symbols: SymbolTable::new(),
            equates: EquateList::default(),
            undeclared: Vec::new(),
            comments: Vec::new(),
            sym_decls: Vec::new(),
            current_address: 0,
            burn: None,
            terminated: false,
        }
    }

    fn addr(&self) -> u16 {
        self.current_address as u16
    }

    /// Stamps the item as this line's output and advances the address
    /// counter by its width.
    fn complete(&mut self, item: CodeItem) -> PState {
        self.current_address += item.byte_width();
        PState::Close(item)
    }

    fn parse_line(&mut self, line: &str) -> CodeItem {
        let line_index = self.items.len();
        let mut cur = Cursor::new(line);
        let mut state = PState::Start;
        // Symbol declared on this line, for `.EQUATE`.
        let mut line_symbol: Option<String> = None;

        loop {
            let tok = next_token(&mut cur);
            state = match state {
                PState::Start => match tok {
                    Token::Identifier(name) => match self.begin_instruction(&name) {
                        Ok(st) => st,
                        Err(e) => return CodeItem::Error(e),
                    },
                    Token::DotCommand(name) => match self.begin_dot(&name, false) {
                        Ok(st) => st,
                        Err(e) => return CodeItem::Error(e),
                    },
                    Token::SymbolDecl(name) => {
                        self.sym_decls.push((line_index, name.clone()));
                        if self.symbols.declare(&name, self.addr(), line_index).is_err() {
                            return CodeItem::Error(AsmError::SymbolRedefined);
                        }
                        line_symbol = Some(name);
                        PState::AfterSymbol
                    }
                    Token::Empty => return CodeItem::Blank,
                    Token::Comment(text) => {
                        self.comments.push(CommentEntry { line: line_index, trailing: false, text });
                        PState::CommentTail(CodeItem::Blank)
                    }
                    Token::Invalid => return CodeItem::Error(AsmError::InvalidSyntax),
                    _ => return CodeItem::Error(AsmError::SymInstrOrDotExpected),
                },

                PState::AfterSymbol => match tok {
                    Token::Identifier(name) => match self.begin_instruction(&name) {
                        Ok(st) => st,
                        Err(e) => return CodeItem::Error(e),
                    },
                    Token::DotCommand(name) => match self.begin_dot(&name, true) {
                        Ok(st) => st,
                        Err(e) => return CodeItem::Error(e),
                    },
                    Token::Invalid => return CodeItem::Error(AsmError::InvalidSyntax),
                    _ => return CodeItem::Error(AsmError::InstrOrDotExpected),
                },

                PState::Instruction(op) => match tok {
                    Token::Identifier(name) => {
                        self.undeclared.push(UndeclaredRef { name: name.clone(), line: line_index });
                        PState::Operand(op, Operand::Symbol(name))
                    }
                    Token::HexConstant(text) => PState::Operand(op, Operand::Hex(text)),
                    Token::DecConstant(text) => {
                        let value = dec_value(&text);
                        if (MIN_DEC..=MAX_DEC).contains(&value) {
                            PState::Operand(op, Operand::Dec(text))
                        } else {
                            return CodeItem::Error(AsmError::DecOverflow);
                        }
                    }
                    Token::CharConstant { text, byte } => {
                        PState::Operand(op, Operand::Char { text, byte })
                    }
                    Token::Str { text, bytes } => {
                        if bytes.len() <= 2 {
                            PState::Operand(op, Operand::Str { text, bytes })
                        } else {
                            return CodeItem::Error(AsmError::StringOperandTooLong);
                        }
                    }
                    other => return CodeItem::Error(Self::operand_error(other)),
                },

                PState::Operand(op, operand) => match tok {
                    Token::AddrMode(mode) => {
                        if op.valid_mode(mode, &self.traps) {
                            let item = CodeItem::NonUnary {
                                addr: self.addr(),
                                op,
                                operand,
                                mode: Some(mode),
                            };
                            self.complete(item)
                        } else {
                            return CodeItem::Error(AsmError::IllegalAddrMode);
                        }
                    }
                    Token::Invalid => return CodeItem::Error(AsmError::InvalidSyntax),
                    other => {
                        if !op.mode_optional() {
                            return CodeItem::Error(AsmError::AddrModeExpected);
                        }
                        // Branches default to immediate, but never for char
                        // or string operands.
                        match operand {
                            Operand::Char { .. } => {
                                return CodeItem::Error(AsmError::CharNeedsAddrMode)
                            }
                            Operand::Str { .. } => {
                                return CodeItem::Error(AsmError::StringNeedsAddrMode)
                            }
                            _ => {}
                        }
                        let item = CodeItem::NonUnary {
                            addr: self.addr(),
                            op,
                            operand,
                            mode: None,
                        };
                        match other {
                            Token::Empty => {
                                self.current_address += item.byte_width();
                                return item;
                            }
                            Token::Comment(text) => {
                                self.comments.push(CommentEntry {
                                    line: line_index,
                                    trailing: true,
                                    text,
                                });
                                self.current_address += item.byte_width();
                                PState::CommentTail(item)
                            }
                            _ => return CodeItem::Error(AsmError::AddrModeOrCommentExpected),
                        }
                    }
                },

                PState::Dot(dot) => match tok {
                    Token::Identifier(name) => {
                        self.undeclared.push(UndeclaredRef { name: name.clone(), line: line_index });
                        match dot {
                            DotCommand::Addrss => {
                                let item = CodeItem::Dot {
                                    addr: self.addr(),
                                    dot,
                                    operand: Operand::Symbol(name),
                                };
                                self.complete(item)
                            }
                            DotCommand::Equate => {
                                return CodeItem::Error(AsmError::SymbolBeforeEquate)
                            }
                            _ => return CodeItem::Error(AsmError::ConstExpected),
                        }
                    }
                    Token::HexConstant(text) => match dot {
                        DotCommand::Addrss => return CodeItem::Error(AsmError::SymbolAfterAddrss),
                        DotCommand::Block => {
                            if hex_value(&text) > MAX_BYTE as u16 {
                                return CodeItem::Error(AsmError::ConstOverflow);
                            }
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Hex(text),
                            };
                            self.complete(item)
                        }
                        DotCommand::Burn => {
                            if self.burn.is_some() {
                                return CodeItem::Error(AsmError::MultipleBurn);
                            }
                            self.burn = Some(BurnState {
                                operand: hex_value(&text),
                                line_addr: self.addr(),
                            });
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Hex(text),
                            };
                            self.complete(item)
                        }
                        DotCommand::Byte => {
                            if hex_value(&text) > MAX_BYTE as u16 {
                                return CodeItem::Error(AsmError::ByteOutOfRange);
                            }
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Hex(text),
                            };
                            self.complete(item)
                        }
                        DotCommand::Equate => return CodeItem::Error(AsmError::SymbolBeforeEquate),
                        DotCommand::Word => {
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Hex(text),
                            };
                            self.complete(item)
                        }
                        _ => return CodeItem::Error(AsmError::ConstExpected),
                    },
                    Token::DecConstant(text) => {
                        let value = dec_value(&text);
                        match dot {
                            DotCommand::Addrss => {
                                return CodeItem::Error(AsmError::SymbolAfterAddrss)
                            }
                            DotCommand::Block => {
                                if !(0..=MAX_BYTE).contains(&value) {
                                    return CodeItem::Error(AsmError::ConstOverflow);
                                }
                                let item = CodeItem::Dot {
                                    addr: self.addr(),
                                    dot,
                                    operand: Operand::Dec(text),
                                };
                                self.complete(item)
                            }
                            DotCommand::Burn => {
                                if self.burn.is_some() {
                                    return CodeItem::Error(AsmError::MultipleBurn);
                                }
                                if !(0..=MAX_DEC).contains(&value) {
                                    return CodeItem::Error(AsmError::AddrOverflow);
                                }
                                self.burn = Some(BurnState {
                                    operand: value as u16,
                                    line_addr: self.addr(),
                                });
                                let item = CodeItem::Dot {
                                    addr: self.addr(),
                                    dot,
                                    operand: Operand::Dec(text),
                                };
                                self.complete(item)
                            }
                            DotCommand::Byte => {
                                if !(MIN_BYTE..=MAX_BYTE).contains(&value) {
                                    return CodeItem::Error(AsmError::ByteOutOfRange);
                                }
                                let item = CodeItem::Dot {
                                    addr: self.addr(),
                                    dot,
                                    operand: Operand::Dec(text),
                                };
                                self.complete(item)
                            }
                            DotCommand::Equate => {
                                if (MIN_DEC..=MAX_DEC).contains(&value) {
                                    return CodeItem::Error(AsmError::SymbolBeforeEquate);
                                }
                                return CodeItem::Error(AsmError::DecOverflow);
                            }
                            DotCommand::Word => {
                                if !(MIN_DEC..=MAX_DEC).contains(&value) {
                                    return CodeItem::Error(AsmError::DecOverflow);
                                }
                                let item = CodeItem::Dot {
                                    addr: self.addr(),
                                    dot,
                                    operand: Operand::Dec(text),
                                };
                                self.complete(item)
                            }
                            _ => return CodeItem::Error(AsmError::ConstExpected),
                        }
                    }
                    Token::CharConstant { text, byte } => match dot {
                        DotCommand::Addrss => return CodeItem::Error(AsmError::SymbolAfterAddrss),
                        DotCommand::Block | DotCommand::Burn => {
                            return CodeItem::Error(AsmError::DecOrHexExpected)
                        }
                        DotCommand::Byte | DotCommand::Word => {
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Char { text, byte },
                            };
                            self.complete(item)
                        }
                        DotCommand::Equate => return CodeItem::Error(AsmError::SymbolBeforeEquate),
                        _ => return CodeItem::Error(AsmError::ConstExpected),
                    },
                    Token::Str { text, bytes } => match dot {
                        DotCommand::Addrss => return CodeItem::Error(AsmError::SymbolAfterAddrss),
                        DotCommand::Block | DotCommand::Burn => {
                            return CodeItem::Error(AsmError::DecOrHexExpected)
                        }
                        DotCommand::Byte => {
                            if bytes.len() != 1 {
                                return CodeItem::Error(AsmError::ByteStringTooLong);
                            }
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Str { text, bytes },
                            };
                            self.complete(item)
                        }
                        DotCommand::Word => {
                            if bytes.len() > 2 {
                                return CodeItem::Error(AsmError::WordStringTooLong);
                            }
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot,
                                operand: Operand::Str { text, bytes },
                            };
                            self.complete(item)
                        }
                        DotCommand::Equate => return CodeItem::Error(AsmError::SymbolBeforeEquate),
                        _ => return CodeItem::Error(AsmError::ConstExpected),
                    },
                    other => return CodeItem::Error(Self::const_error(other)),
                },

                PState::Equate => {
                    // Reached only right after a symbol declaration.
                    let name = line_symbol.clone().unwrap_or_default();
                    match tok {
                        Token::HexConstant(text) => {
                            let value = hex_value(&text);
                            self.bind_equate(&name, value);
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot: DotCommand::Equate,
                                operand: Operand::Hex(text),
                            };
                            self.complete(item)
                        }
                        Token::DecConstant(text) => {
                            let value = dec_value(&text);
                            if !(MIN_DEC..=MAX_DEC).contains(&value) {
                                return CodeItem::Error(AsmError::DecOverflow);
                            }
                            self.bind_equate(&name, value as u16);
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot: DotCommand::Equate,
                                operand: Operand::Dec(text),
                            };
                            self.complete(item)
                        }
                        Token::CharConstant { text, byte } => {
                            self.bind_equate(&name, u16::from(byte));
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot: DotCommand::Equate,
                                operand: Operand::Char { text, byte },
                            };
                            self.complete(item)
                        }
                        Token::Str { text, bytes } => {
                            let value = match bytes.as_slice() {
                                [single] => u16::from(*single),
                                [hi, lo] => u16::from_be_bytes([*hi, *lo]),
                                _ => return CodeItem::Error(AsmError::EquateStringTooLong),
                            };
                            self.bind_equate(&name, value);
                            let item = CodeItem::Dot {
                                addr: self.addr(),
                                dot: DotCommand::Equate,
                                operand: Operand::Str { text, bytes },
                            };
                            self.complete(item)
                        }
                        _ => return CodeItem::Error(AsmError::InvalidSyntax),
                    }
                }

                PState::Ascii => match tok {
                    Token::Str { text, bytes } => {
                        let item = CodeItem::Ascii { addr: self.addr(), text, bytes };
                        self.complete(item)
                    }
                    _ => return CodeItem::Error(AsmError::InvalidString),
                },

                PState::Close(item) => match tok {
                    Token::Empty => return item,
                    Token::Comment(text) => {
                        self.comments.push(CommentEntry { line: line_index, trailing: true, text });
                        PState::CommentTail(item)
                    }
                    Token::Invalid => return CodeItem::Error(AsmError::InvalidSyntax),
                    Token::CharConstant { .. }
                    | Token::DecConstant(_)
                    | Token::HexConstant(_)
                    | Token::Str { .. } => return CodeItem::Error(AsmError::UnexpectedOperand),
                    _ => return CodeItem::Error(AsmError::CommentExpected),
                },

                PState::CommentTail(item) => match tok {
                    Token::Empty => return item,
                    _ => PState::CommentTail(item),
                },
            };
        }
    }

    /// Looks up a mnemonic at the start of an instruction. Unary mnemonics
    /// immediately yield their item.
    fn begin_instruction(&mut self, name: &str) -> Result<PState, AsmError> {
        let op = lookup_mnemonic(name, &self.traps).ok_or(AsmError::InvalidMnemonic)?;
        if op.is_unary(&self.traps) {
            let item = CodeItem::Unary { addr: self.addr(), op };
            Ok(self.complete(item))
        } else {
            Ok(PState::Instruction(op))
        }
    }

    fn begin_dot(&mut self, name: &str, after_symbol: bool) -> Result<PState, AsmError> {
        let dot = lookup_dot(name).ok_or(AsmError::InvalidDotCommand)?;
        Ok(match dot {
            DotCommand::End => {
                self.terminated = true;
                self.complete(CodeItem::End { addr: self.addr() })
            }
            DotCommand::Ascii => PState::Ascii,
            DotCommand::Equate if after_symbol => PState::Equate,
            other => PState::Dot(other),
        })
    }

    /// Rebinds the freshly declared symbol to its equate value and records
    /// the binding so `.BURN` relocation can restore it.
    fn bind_equate(&mut self, name: &str, value: u16) {
        self.symbols.set_value(name, value);
        self.equates.push(name, value);
    }

    fn operand_error(tok: Token) -> AsmError {
        match tok {
            Token::InvalidDec => AsmError::InvalidDecConst,
            Token::InvalidHex => AsmError::InvalidHexConst,
            Token::InvalidChar => AsmError::InvalidCharConst,
            Token::InvalidString => AsmError::InvalidString,
            Token::InvalidAddr => AsmError::InvalidAddrMode,
            Token::InvalidDot => AsmError::InvalidDotCommand,
            Token::Invalid => AsmError::InvalidSyntax,
            _ => AsmError::OperandExpected,
        }
    }

    fn const_error(tok: Token) -> AsmError {
        match tok {
            Token::InvalidDec => AsmError::InvalidDecConst,
            Token::InvalidHex => AsmError::InvalidHexConst,
            Token::InvalidChar => AsmError::InvalidCharConst,
            Token::InvalidString => AsmError::InvalidString,
            Token::InvalidAddr => AsmError::InvalidAddrMode,
            Token::InvalidDot => AsmError::InvalidDotCommand,
            Token::Invalid => AsmError::InvalidSyntax,
            _ => AsmError::ConstExpected,
        }
    }

    fn finish(mut self) -> Assembly {
        // Any use of an identifier never declared converts its line into an
        // undefined-symbol error. Scanning the item list afterwards keeps
        // the error report in source order.
        for reference in &self.undeclared {
            if !self.symbols.contains(&reference.name) {
                self.items[reference.line] = CodeItem::Error(AsmError::UndefinedSymbol);
            }
        }
        if !self.terminated {
            self.items.push(CodeItem::Error(AsmError::MissingEnd));
        }
        let errors: Vec<(usize, AsmError)> = self
            .items
            .iter()
            .enumerate()
            .filter_map(|(line, item)| match item {
                CodeItem::Error(e) => Some((line, *e)),
                _ => None,
            })
            .collect();

        let mut burn_addr = None;
        if errors.is_empty() {
            if let Some(burn) = &self.burn {
                let delta = burn
                    .operand
                    .wrapping_sub(self.current_address as u16)
                    .wrapping_add(1);
                self.symbols.shift_all(delta);
                self.equates.restore(&mut self.symbols);
                for item in &mut self.items {
                    item.shift(delta);
                }
                burn_addr = Some(burn.line_addr.wrapping_add(delta));
            }
        }

        Assembly {
            items: self.items,
            symbols: self.symbols,
            comments: self.comments,
            sym_decls: self.sym_decls,
            errors,
            burn_addr,
            traps: self.traps,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::mnemonic::AddrMode;

    fn traps() -> TrapTable {
        TrapTable::parse(
            "NOP0\nNOP1\nNOP2\nNOP3\nNOP I\nDECI D N S SF X SX SXF\nDECO I D N S SF X SX SXF\nSTRO D N SF X\n",
        )
    }

    fn asm(source: &str) -> Assembly {
        assemble(source, traps())
    }

    #[test]
    fn unary_instruction() {
        let out = asm("ASLA\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[0], CodeItem::Unary { addr: 0, op: Mnemonic::Asla });
        assert_eq!(out.items[1], CodeItem::End { addr: 1 });
    }

    #[test]
    fn load_and_store_direct() {
        let out = asm("LDA 0x0005,d\nSTA 0x0007,d\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(
            out.items[0],
            CodeItem::NonUnary {
                addr: 0,
                op: Mnemonic::Lda,
                operand: Operand::Hex("0005".into()),
                mode: Some(AddrMode::Direct),
            }
        );
        assert_eq!(out.items[1].addr(), Some(3));
    }

    #[test]
    fn forward_reference_resolves() {
        let out = asm("BR main\n.BLOCK 0x01\nmain: STOP\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.symbols.value("main"), Some(0x0004));
        assert_eq!(
            out.items[0].object_bytes(&out.symbols),
            vec![0x04, 0x00, 0x04]
        );
    }

    #[test]
    fn zero_count_block_reserves_nothing() {
        let out = asm("BR main\n.BLOCK 0x00\nmain: STOP\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[1].byte_width(), 0);
        assert_eq!(out.symbols.value("main"), Some(0x0003));
    }

    #[test]
    fn undefined_reference_is_an_error() {
        let out = asm("BR nowhere\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::UndefinedSymbol)]);
        assert_eq!(out.items[0], CodeItem::Error(AsmError::UndefinedSymbol));
    }

    #[test]
    fn missing_end_is_synthesized() {
        let out = asm("STOP\n");
        assert_eq!(out.errors, vec![(1, AsmError::MissingEnd)]);
    }

    #[test]
    fn symbol_redefinition() {
        let out = asm("a: STOP\na: STOP\n.END\n");
        assert_eq!(out.errors, vec![(1, AsmError::SymbolRedefined)]);
        // The first declaration wins.
        assert_eq!(out.symbols.value("a"), Some(0));
    }

    #[test]
    fn equate_binds_value_not_address() {
        let out = asm("STOP\nlen: .EQUATE 9\nLDA len,i\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.symbols.value("len"), Some(9));
        assert_eq!(out.items[2].object_bytes(&out.symbols), vec![0xC0, 0x00, 0x09]);
    }

    #[test]
    fn equate_without_symbol_is_an_error() {
        let out = asm(".EQUATE 9\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::SymbolBeforeEquate)]);
    }

    #[test]
    fn burn_relocates_everything_but_equates() {
        let out = asm("LDA x,d\nx: .WORD 0x00FF\nn: .EQUATE 7\n.BURN 0xFFFF\n.END\n");
        assert!(out.errors.is_empty());
        // 5 bytes of code; delta = 0xFFFF - 5 + 1.
        assert_eq!(out.items[0].addr(), Some(0xFFFB));
        assert_eq!(out.symbols.value("x"), Some(0xFFFE));
        assert_eq!(out.symbols.value("n"), Some(7));
        assert_eq!(
            out.items[0].object_bytes(&out.symbols),
            vec![0xC1, 0xFF, 0xFE]
        );
    }

    #[test]
    fn second_burn_is_an_error() {
        let out = asm(".BURN 0xFFFF\n.BURN 0xFFFF\n.END\n");
        assert_eq!(out.errors, vec![(1, AsmError::MultipleBurn)]);
    }

    #[test]
    fn byte_range_boundaries() {
        assert!(asm(".BYTE 255\n.END\n").errors.is_empty());
        assert!(asm(".BYTE -256\n.END\n").errors.is_empty());
        assert_eq!(
            asm(".BYTE 256\n.END\n").errors,
            vec![(0, AsmError::ByteOutOfRange)]
        );
        assert_eq!(
            asm(".BYTE -257\n.END\n").errors,
            vec![(0, AsmError::ByteOutOfRange)]
        );
        assert_eq!(
            asm(".BYTE 0x1FF\n.END\n").errors,
            vec![(0, AsmError::ByteOutOfRange)]
        );
    }

    #[test]
    fn word_range_boundaries() {
        assert!(asm(".WORD 65535\n.END\n").errors.is_empty());
        assert!(asm(".WORD -32768\n.END\n").errors.is_empty());
        assert_eq!(
            asm(".WORD 65536\n.END\n").errors,
            vec![(0, AsmError::DecOverflow)]
        );
        assert_eq!(
            asm(".WORD -32769\n.END\n").errors,
            vec![(0, AsmError::DecOverflow)]
        );
    }

    #[test]
    fn block_arguments() {
        let out = asm("buf: .BLOCK 4\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[0].byte_width(), 4);
        assert_eq!(
            asm(".BLOCK 0x0100\n.END\n").errors,
            vec![(0, AsmError::ConstOverflow)]
        );
        assert_eq!(
            asm(".BLOCK 256\n.END\n").errors,
            vec![(0, AsmError::ConstOverflow)]
        );
    }

    #[test]
    fn store_rejects_immediate() {
        let out = asm("STA 5,i\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::IllegalAddrMode)]);
    }

    #[test]
    fn branch_defaults_to_immediate() {
        let out = asm("main: BR main\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[0].object_bytes(&out.symbols), vec![0x04, 0x00, 0x00]);
    }

    #[test]
    fn branch_rejects_direct() {
        let out = asm("main: BR main,d\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::IllegalAddrMode)]);
    }

    #[test]
    fn char_operand_requires_mode() {
        let out = asm("CHARO 'a'\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::AddrModeExpected)]);
        let out = asm("BR 'a'\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::CharNeedsAddrMode)]);
    }

    #[test]
    fn mode_required_for_general_instructions() {
        let out = asm("LDA 5\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::AddrModeExpected)]);
    }

    #[test]
    fn ascii_takes_only_strings() {
        let out = asm("s: .ASCII \"hi\\x00\"\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[0].byte_width(), 3);
        let out = asm("s: .ASCII 5\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::InvalidString)]);
    }

    #[test]
    fn addrss_requires_a_symbol() {
        let out = asm("v: STOP\n.ADDRSS v\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[1].byte_width(), 2);
        let out = asm(".ADDRSS 0x0005\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::SymbolAfterAddrss)]);
    }

    #[test]
    fn trailing_garbage_after_instruction() {
        let out = asm("STOP 5\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::UnexpectedOperand)]);
        let out = asm("STOP fie\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::CommentExpected)]);
    }

    #[test]
    fn trap_mnemonics_from_the_table() {
        let out = asm("NOP0\nDECO 0x0041,i\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.items[0], CodeItem::Unary { addr: 0, op: Mnemonic::Unimp(0) });
        let out = asm("DECI 5,i\n.END\n");
        assert_eq!(out.errors, vec![(0, AsmError::IllegalAddrMode)]);
    }

    #[test]
    fn comments_are_collected() {
        let out = asm(";header\nSTOP ;tail\n.END\n");
        assert!(out.errors.is_empty());
        assert_eq!(out.comments.len(), 2);
        assert!(!out.comments[0].trailing);
        assert!(out.comments[1].trailing);
        assert_eq!(out.items[0], CodeItem::Blank);
    }

    #[test]
    fn address_space_exhaustion() {
        let out = asm("a: .BLOCK 255\nBR a\n.BURN 0xFFFF\n");
        assert!(out.errors.iter().any(|(_, e)| *e == AsmError::MissingEnd));
        let mut long = String::new();
        for _ in 0..=257 {
            long.push_str(".BLOCK 255\n");
        }
        long.push_str(".END\n");
        let out = asm(&long);
        assert!(out
            .errors
            .iter()
            .any(|(_, e)| *e == AsmError::CodeTableOverflow));
    }
}
