use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use miette::{IntoDiagnostic, WrapErr};

use pep8::listing::{write_listing, write_object};
use pep8::trap::TrapTable;

/// Longest accepted source path, extension included.
const FILE_NAME_LENGTH: usize = 64;

/// Two-pass assembler for the Pep/8 computer.
#[derive(Parser)]
#[command(name = "asem8", disable_version_flag = true)]
struct Args {
    /// Print the version banner
    #[arg(short = 'v')]
    version: bool,
    /// Write an assembler listing next to the object file
    #[arg(short = 'l')]
    listing: bool,
    /// Source file, with a .pep extension
    source: Option<PathBuf>,
}

fn main() -> miette::Result<ExitCode> {
    // The trap table is required even to just print the banner.
    let traps = match TrapTable::load(Path::new("trap")) {
        Ok(traps) => traps,
        Err(_) => {
            eprintln!("{}", "Could not open trap file.".red());
            return Ok(ExitCode::from(1));
        }
    };
    let args = Args::parse();
    if args.version {
        eprintln!("Pep/8 Assembler, version {}", env!("CARGO_PKG_VERSION"));
    }
    let Some(source) = args.source else {
        return Ok(ExitCode::SUCCESS);
    };
    let name = source.to_string_lossy().into_owned();
    if name.len() > FILE_NAME_LENGTH - 3 {
        eprintln!("{}", "Source file name too long".red());
        return Ok(ExitCode::from(2));
    }
    if !name.ends_with(".pep") {
        eprintln!("{}", "Source file should have a \".pep\" extension".red());
        return Ok(ExitCode::from(2));
    }
    let text = match fs::read_to_string(&source) {
        Ok(text) => text,
        Err(_) => {
            eprintln!("{}", format!("Could not open {name}.").red());
            return Ok(ExitCode::from(3));
        }
    };

    let assembly = pep8::assemble(&text, traps);
    if !assembly.errors.is_empty() {
        let count = assembly.errors.len();
        if count == 1 {
            eprintln!("1 error was detected. No object code generated.");
        } else {
            eprintln!("{count} errors were detected. No object code generated.");
        }
        for (line, error) in &assembly.errors {
            eprintln!("Error on line {}: {}", line + 1, error.to_string().red());
        }
        return Ok(ExitCode::SUCCESS);
    }

    if args.listing {
        let listing_name = format!("{name}l");
        let mut file = File::create(&listing_name)
            .into_diagnostic()
            .wrap_err_with(|| format!("could not create listing file {listing_name}"))?;
        write_listing(&mut file, &assembly).into_diagnostic()?;
    }
    let object_name = format!("{name}o");
    let mut file = File::create(&object_name)
        .into_diagnostic()
        .wrap_err_with(|| format!("could not create object file {object_name}"))?;
    write_object(&mut file, &assembly).into_diagnostic()?;
    Ok(ExitCode::SUCCESS)
}
