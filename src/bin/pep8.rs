use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use pep8::runtime::dump::dump;
use pep8::runtime::io::{InputSource, OutputSink};
use pep8::tracer::{TraceMode, Tracer};
use pep8::trap::TrapTable;
use pep8::Machine;

/// Interactive simulator for the Pep/8 computer.
#[derive(Parser)]
#[command(name = "pep8", disable_version_flag = true)]
struct Args {
    /// Print the version banner
    #[arg(short = 'v')]
    version: bool,
}

fn main() -> miette::Result<ExitCode> {
    let args = Args::parse();
    if args.version {
        println!("Pep/8 Simulator, version {}", env!("CARGO_PKG_VERSION"));
    }
    let traps = match TrapTable::load(Path::new("trap")) {
        Ok(traps) => traps,
        Err(_) => {
            eprintln!("{}", "Could not open trap file.".red());
            return Ok(ExitCode::from(1));
        }
    };
    let mut machine = Machine::new(traps);
    let rom = match fs::read_to_string("pep8os.pepo") {
        Ok(text) => text,
        Err(_) => {
            eprintln!("{}", "Could not open file pep8os.pepo".red());
            return Ok(ExitCode::from(3));
        }
    };
    match machine.mem.install_rom(&rom) {
        Ok(rom_start) => println!("{rom_start} bytes RAM free."),
        Err(error) => {
            eprintln!("{}", error.to_string().red());
            return Ok(ExitCode::from(3));
        }
    }
    let mut repl = Repl { machine, lines_per_page: 22 };
    repl.main_prompt();
    Ok(ExitCode::SUCCESS)
}

struct Repl {
    machine: Machine,
    lines_per_page: usize,
}

/// One line from the keyboard; `None` once stdin closes.
fn read_line() -> Option<String> {
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
    }
}

fn prompt(text: &str) -> Option<String> {
    print!("{text}");
    io::stdout().flush().ok();
    read_line()
}

fn first_char_upper(line: &str) -> char {
    line.chars().next().unwrap_or(' ').to_ascii_uppercase()
}

impl Repl {
    fn main_prompt(&mut self) {
        loop {
            println!();
            let Some(line) =
                prompt("(l)oad  e(x)ecute  (d)ump  (t)race  (i)nput  (o)utput  (q)uit: ")
            else {
                return;
            };
            match first_char_upper(&line) {
                'L' => self.load_command(&mut Tracer::off()),
                'X' => self.execute_command(&mut Tracer::off()),
                'D' => self.dump_command(),
                'T' => self.trace_command(),
                'I' => self.input_command(),
                'O' => self.output_command(),
                'Q' => return,
                ' ' => {}
                _ => println!("Invalid command."),
            }
        }
    }

    fn load_command(&mut self, tracer: &mut Tracer) {
        if !self.machine.io.is_keyboard() {
            println!("Data input switched back to keyboard.");
            self.machine.io.source = InputSource::Keyboard;
        }
        let Some(name) = prompt("Enter object file name (do not include .pepo): ") else {
            return;
        };
        let file_name = format!("{name}.pepo");
        match File::open(&file_name) {
            Ok(file) => {
                println!("Object file is {file_name}");
                let object = InputSource::File(BufReader::new(file));
                tracer.begin();
                self.machine.trace_echo = tracer.mode != TraceMode::Off;
                if let Err(error) = self.machine.run_loader(object, tracer) {
                    println!("{}", error.to_string().red());
                }
                tracer.finish();
                self.machine.trace_echo = false;
            }
            Err(_) => println!("Could not open object file {file_name}"),
        }
    }

    fn execute_command(&mut self, tracer: &mut Tracer) {
        if !self.machine.reset {
            println!("Execution error: Machine state not initialized.");
            println!("Use (l)oad command.");
            return;
        }
        tracer.begin();
        self.machine.trace_echo = tracer.mode != TraceMode::Off;
        if let Err(error) = self.machine.run_program(tracer) {
            println!("{}", error.to_string().red());
        }
        tracer.finish();
        self.machine.trace_echo = false;
    }

    fn dump_command(&mut self) {
        print!("Pep/8 memory dump:  ");
        let (start, end) = loop {
            println!();
            println!("Enter address range of dump (HEX)");
            let Some(line) = prompt("Example, 0020-0140: ") else {
                return;
            };
            let Some((start, end)) = parse_range(&line) else {
                println!("Error in hex specification. Enter Again.");
                continue;
            };
            let end = if end == 0 { start } else { end };
            if start > end {
                println!("Address range error. Start address must be less than end address.");
                continue;
            }
            break (start, end);
        };
        let mut out = io::stdout().lock();
        let _ = dump(&mut out, &self.machine.mem, start, end);
    }

    fn trace_command(&mut self) {
        loop {
            let Some(line) = prompt("Trace  (p)rogram  (t)rap  (l)oader, or (a)djust display: ")
            else {
                return;
            };
            match first_char_upper(&line) {
                'P' => {
                    let mut tracer = Tracer::new(TraceMode::Program, self.lines_per_page);
                    self.execute_command(&mut tracer);
                    return;
                }
                'T' => {
                    let mut tracer = Tracer::new(TraceMode::Traps, self.lines_per_page);
                    self.execute_command(&mut tracer);
                    return;
                }
                'L' => {
                    let mut tracer = Tracer::new(TraceMode::Loader, self.lines_per_page);
                    self.load_command(&mut tracer);
                    return;
                }
                'A' => {
                    let text = format!(
                        "Number of lines per screen dump ({}): ",
                        self.lines_per_page
                    );
                    let Some(reply) = prompt(&text) else {
                        return;
                    };
                    let lines = reply.trim().parse::<usize>().unwrap_or(0);
                    self.lines_per_page = lines.max(8);
                    println!();
                }
                ' ' => return,
                _ => println!("Invalid response."),
            }
        }
    }

    fn input_command(&mut self) {
        loop {
            let Some(line) = prompt("Input from  (k)eyboard  (f)ile: ") else {
                return;
            };
            match first_char_upper(&line) {
                'K' | ' ' => {
                    self.machine.io.source = InputSource::Keyboard;
                    println!("Input is from keyboard.");
                    return;
                }
                'F' => {
                    let Some(name) = prompt("Enter input data file name: ") else {
                        return;
                    };
                    match File::open(&name) {
                        Ok(file) => {
                            self.machine.io.source = InputSource::File(BufReader::new(file));
                            println!("Input data file is {name}");
                        }
                        Err(_) => {
                            self.machine.io.source = InputSource::Keyboard;
                            println!("Could not open input data file {name}");
                        }
                    }
                    return;
                }
                _ => println!("Invalid response."),
            }
        }
    }

    fn output_command(&mut self) {
        loop {
            let Some(line) = prompt("Output to  (s)creen  (f)ile:  ") else {
                return;
            };
            match first_char_upper(&line) {
                'S' | ' ' => {
                    self.machine.io.sink = OutputSink::Screen;
                    println!("Output is to screen.");
                    return;
                }
                'F' => {
                    let Some(name) = prompt("Enter output data file name: ") else {
                        return;
                    };
                    match File::create(&name) {
                        Ok(file) => {
                            self.machine.io.sink = OutputSink::File(file);
                            println!("Output data file is {name}");
                        }
                        Err(_) => {
                            self.machine.io.sink = OutputSink::Screen;
                            println!("Error opening file {name}");
                        }
                    }
                    return;
                }
                _ => println!("Invalid response."),
            }
        }
    }
}

/// `XXXX-XXXX`: two 4-digit hex addresses separated by one character.
fn parse_range(line: &str) -> Option<(u16, u16)> {
    let bytes = line.as_bytes();
    if bytes.len() < 9 {
        return None;
    }
    let start = u16::from_str_radix(line.get(0..4)?, 16).ok()?;
    let end = u16::from_str_radix(line.get(5..9)?, 16).ok()?;
    Some((start, end))
}
