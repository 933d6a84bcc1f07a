//! `wisp` — run a script file, or start an interactive REPL with no arguments.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use tracing::info;
use wisp_vm::{InterpretError, Vm};

const EX_USAGE: u8 = 64;
const EX_DATAERR: u8 = 65;
const EX_SOFTWARE: u8 = 70;
const EX_IOERR: u8 = 74;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "wisp=info"
                    .parse()
                    .expect("static directive always parses"),
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => {
            repl();
            ExitCode::SUCCESS
        }
        [path] => ExitCode::from(run_file(path)),
        _ => {
            eprintln!("Usage: wisp [path]");
            ExitCode::from(EX_USAGE)
        }
    }
}

fn repl() {
    info!("starting wisp REPL");
    let mut vm = Vm::new();
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        if stdout.flush().is_err() {
            return;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                println!();
                return;
            }
            Ok(_) => {
                if let Err(err) = vm.interpret(&line) {
                    report(&err);
                }
            }
            Err(err) => {
                eprintln!("wisp: {err}");
                return;
            }
        }
    }
}

fn run_file(path: &str) -> u8 {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("wisp: could not read file '{path}': {err}");
            return EX_IOERR;
        }
    };

    let mut vm = Vm::new();
    match vm.interpret(&source) {
        Ok(()) => 0,
        Err(err @ InterpretError::Compile(_)) => {
            report(&err);
            EX_DATAERR
        }
        Err(err @ InterpretError::Runtime(_)) => {
            report(&err);
            EX_SOFTWARE
        }
    }
}

fn report(err: &InterpretError) {
    eprintln!("{err}");
}
