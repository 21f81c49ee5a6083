//! Command-line front end: parse a source file, translate it, and run
//! it with stdin and stdout as the program's byte channels. Fatal
//! errors go to stderr and exit nonzero; output already written is
//! never retracted.

use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

use colored::Colorize;

use bfvm::{execute, parse_from_reader, translate, ExecutionState, OptimisationsFlags};

fn main() {
    let mut flags = OptimisationsFlags::all();
    let mut dump_bytecode = false;
    let mut path = None;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--no-optimize" => flags = OptimisationsFlags::empty(),
            "--dump-bytecode" => dump_bytecode = true,
            _ if path.is_none() => path = Some(arg),
            _ => {
                print_usage();
                process::exit(1);
            }
        }
    }

    let path = match path {
        Some(path) => path,
        None => {
            print_usage();
            process::exit(1);
        }
    };

    if let Err(message) = run(&path, flags, dump_bytecode) {
        eprintln!("{} {}", "error:".red().bold(), message);
        process::exit(1);
    }
}

fn print_usage() {
    eprintln!("usage: bfvm [--no-optimize] [--dump-bytecode] <source-file>");
}

fn run(path: &str, flags: OptimisationsFlags, dump_bytecode: bool) -> Result<(), String> {
    let file = File::open(path).map_err(|err| format!("{}: {}", path, err))?;
    let source = parse_from_reader(BufReader::new(file))
        .map_err(|err| format!("reading {} failed: {}", path, err))?;
    let ops = translate(&source, flags).map_err(|err| err.to_string())?;

    if dump_bytecode {
        for (index, op) in ops.iter().enumerate() {
            println!("{:4} {}", index, op);
        }
        return Ok(());
    }

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut state = ExecutionState::new();
    execute(
        &ops,
        &mut state,
        &mut stdin.lock(),
        &mut stdout.lock(),
        u64::MAX,
    )
    .map_err(|err| err.to_string())?;

    Ok(())
}
