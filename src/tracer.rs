//! Per-instruction tracing wrapped around the fetch-execute loop, with
//! paged output and single-step control.

use std::io::{self, Write};

use crate::runtime::decode::{decode, mode_one_bit, mode_three_bits};
use crate::runtime::Machine;
use crate::term::{self, Key};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TraceMode {
    Off,
    /// Trace only while PC is below the ROM boundary.
    Program,
    /// Trace everywhere, traps included.
    Traps,
    /// Trace the loader run.
    Loader,
}

pub struct Tracer {
    pub mode: TraceMode,
    single_step: bool,
    scrolling: bool,
    line_count: usize,
    pub lines_per_page: usize,
}

const PROMPT: &str = "(n)ext page  s(c)roll  (s)ingle step  (q)uit trace: ";

/// One formatted trace row: address, mnemonic, operand specifier with mode
/// suffix and raw instruction register for non-unary ops, then registers,
/// flags, and the dereferenced operand.
pub fn trace_row(m: &Machine, at: u16) -> String {
    let spec = m.ir.spec;
    let family = decode(spec);
    let mut row = format!("{at:04X}  ");
    row.push_str(&format!("{:<9}", family.trace_name(spec, &m.traps)));
    if family.is_unary() {
        row.push_str(&" ".repeat(19));
    } else {
        let mode = if family.is_branch() {
            mode_one_bit(spec)
        } else {
            mode_three_bits(spec)
        };
        row.push_str(&format!("{:04X},", m.ir.oprnd));
        row.push_str(&format!("{:<5}", mode.suffix()));
        row.push_str(&format!("{spec:02X}{:04X}   ", m.ir.oprnd));
    }
    row.push_str(&format!("{:04X}   ", m.a));
    row.push_str(&format!("{:04X}    ", m.x));
    row.push_str(&format!("{:04X}    ", m.sp));
    row.push_str(&format!(
        "{} {} {} {}   ",
        u8::from(m.n),
        u8::from(m.z),
        u8::from(m.v),
        u8::from(m.c)
    ));
    row.push_str(&format!("{:04X}", m.trace_operand()));
    row
}

impl Tracer {
    pub fn off() -> Tracer {
        Tracer::new(TraceMode::Off, 22)
    }

    pub fn new(mode: TraceMode, lines_per_page: usize) -> Tracer {
        Tracer {
            mode,
            single_step: false,
            scrolling: false,
            line_count: 0,
            lines_per_page,
        }
    }

    fn print_rule(&self) {
        println!("{}", "-".repeat(73));
    }

    fn print_heading(&self) {
        self.print_rule();
        println!("               Oprnd     Instr           Index   Stack   Status");
        println!("Addr  Mnemon   Spec       Reg     Accum   Reg   Pointer  N Z V C  Operand");
        self.print_rule();
    }

    /// Banner and heading before a traced run starts.
    pub fn begin(&mut self) {
        match self.mode {
            TraceMode::Off => return,
            TraceMode::Program => println!("User Program Trace:"),
            TraceMode::Traps => println!("User Program Trace with Traps:"),
            TraceMode::Loader => println!("Loader Trace of Operating System:"),
        }
        println!();
        self.print_heading();
        self.line_count = 6;
        self.single_step = false;
        self.scrolling = false;
    }

    /// Closing rule after a traced run.
    pub fn finish(&self) {
        if self.mode != TraceMode::Off {
            self.print_rule();
        }
    }

    /// Called after every executed instruction. Returns true when the user
    /// quits the trace, which halts the run.
    pub fn after_step(&mut self, m: &Machine, at: u16) -> bool {
        if self.mode == TraceMode::Off {
            return false;
        }
        let in_rom = u32::from(at) >= m.mem.rom_start();
        let traced = match self.mode {
            TraceMode::Program => !in_rom,
            TraceMode::Traps | TraceMode::Loader => true,
            TraceMode::Off => false,
        };
        if !traced {
            return false;
        }
        print!("{}", trace_row(m, at));
        io::stdout().flush().ok();

        if self.scrolling {
            println!();
            return false;
        }
        if self.single_step {
            print!(": ");
            match self.prompt_key() {
                'n' => {
                    self.single_step = false;
                    println!();
                    self.print_heading();
                    self.line_count = 4;
                }
                'c' => {
                    self.single_step = false;
                    self.scrolling = true;
                    println!();
                    self.print_heading();
                }
                'q' => {
                    self.single_step = false;
                    println!();
                    self.print_rule();
                    return true;
                }
                _ => println!(),
            }
            return false;
        }
        println!();
        self.line_count += 1;
        if self.line_count >= self.lines_per_page {
            print!("{PROMPT}");
            match self.prompt_key() {
                'n' => {
                    println!();
                    self.print_heading();
                    self.line_count = 4;
                }
                'c' => {
                    self.scrolling = true;
                    println!();
                    self.print_heading();
                }
                's' => {
                    self.single_step = true;
                    println!();
                }
                'q' => {
                    println!();
                    self.print_rule();
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// One of n, c, s, or q; anything else reprompts.
    fn prompt_key(&self) -> char {
        loop {
            if let Key::Char(c @ ('n' | 'c' | 's' | 'q')) = term::read_single_key() {
                return c;
            }
            println!();
            println!("Invalid response");
            print!("{PROMPT}");
            io::stdout().flush().ok();
        }
    }
}
