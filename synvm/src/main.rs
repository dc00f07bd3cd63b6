//! `synvm [FLAGS] FILENAME` — runs a Synacor program image (§4.13, §6).

use clap::Parser;
use log::{error, info, warn};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use synacore::engine::RunState;
use synacore::observer::{DumpStateObserver, ObserverTag, TraceObserver};
use synacore::pause::MenuCommand;
use synacore::serialize;
use synacore::{Machine, LoadError};
use thiserror::Error;

/// Default path for a state dump with no explicit destination (§6).
const DEFAULT_DUMP_PATH: &str = "synacor_vm_dump.dmp";

#[derive(Parser, Debug)]
#[command(about = "Runs a Synacor program image")]
struct Cli {
    /// Program image to load and run
    filename: PathBuf,

    /// Attach the trace observer at startup
    #[arg(short, long)]
    debug: bool,

    /// Resume from a serialized state dump instead of loading FILENAME as
    /// a fresh program image
    #[arg(short = 'l', long = "load-state", value_name = "FILE")]
    load_state: Option<PathBuf>,

    /// Write a final state dump on exit
    #[arg(short = 'o', long = "dump-on-exit", value_name = "FILE")]
    dump_on_exit: Option<PathBuf>,
}

#[derive(Error, Debug)]
enum AppError {
    #[error("reading \"{path}\": {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("writing \"{path}\": {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("loading program image: {0}")]
    Load(#[from] LoadError),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let stdin = Box::new(io::stdin().lock());
    let stdout = Box::new(io::stdout());
    let mut machine = Machine::new(stdin, stdout);

    match &cli.load_state {
        Some(state_path) => {
            let mut reader = BufReader::new(File::open(state_path).map_err(|source| {
                AppError::ReadInput {
                    path: state_path.clone(),
                    source,
                }
            })?);
            serialize::load_state(&mut machine, &mut reader)?;
            info!("resumed from state dump {}", state_path.display());
        }
        None => {
            let bytes = fs::read(&cli.filename).map_err(|source| AppError::ReadInput {
                path: cli.filename.clone(),
                source,
            })?;
            machine.load_program(&bytes)?;
            info!("loaded program {} ({} bytes)", cli.filename.display(), bytes.len());
        }
    }

    if cli.debug {
        attach_trace_observer(&mut machine);
    }

    loop {
        match machine.run() {
            RunState::Terminated => break,
            RunState::Paused => {
                if run_pause_menu(&mut machine)? {
                    return Ok(());
                }
            }
            RunState::Running => unreachable!("run() only returns once it cannot progress"),
        }
    }

    if let Some(dump_path) = &cli.dump_on_exit {
        write_dump(&machine, dump_path)?;
    }

    Ok(())
}

fn attach_trace_observer(machine: &mut Machine) {
    let console_in = Box::new(io::stdin().lock());
    let console_out = Box::new(io::stderr());
    machine.attach_observer(Box::new(TraceObserver::new(console_in, console_out)));
}

/// Runs the pause menu (§4.10) until a command resumes or halts execution.
/// Returns `true` if the operator chose `exit`, asking the caller to stop
/// the process immediately without writing a final dump.
fn run_pause_menu(machine: &mut Machine) -> Result<bool, AppError> {
    loop {
        eprint!("(synvm) ");
        io::stderr().flush().ok();

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line).unwrap_or(0) == 0 {
            return Ok(true);
        }

        match MenuCommand::parse(&line) {
            Some(MenuCommand::Debug) => {
                if machine.has_observer(ObserverTag::Trace) {
                    machine.detach_observer(ObserverTag::Trace);
                } else {
                    attach_trace_observer(machine);
                }
            }
            Some(MenuCommand::Exit) => return Ok(true),
            Some(MenuCommand::Halt) => {
                machine.halt_by_interrupt();
                return Ok(false);
            }
            Some(MenuCommand::Help) => {
                eprintln!("commands: debug, exit, halt, help, resume, save, state");
            }
            Some(MenuCommand::Resume) => {
                if !machine.resume() {
                    warn!("resume requested but no pause was pending");
                }
                return Ok(false);
            }
            Some(MenuCommand::Save) => {
                let sink = File::create(DEFAULT_DUMP_PATH).map_err(|source| AppError::WriteOutput {
                    path: PathBuf::from(DEFAULT_DUMP_PATH),
                    source,
                })?;
                machine.attach_observer(Box::new(DumpStateObserver::new(Box::new(sink))));
            }
            Some(MenuCommand::State) => {
                eprintln!(
                    "ip={} flags={:?} registers={:?}",
                    machine.ip().word(),
                    machine.flags(),
                    machine.registers()
                );
            }
            None => {
                warn!("unrecognized pause menu command: {:?}", line.trim());
                eprintln!("unrecognized command; try \"help\"");
            }
        }
    }
}

fn write_dump(machine: &Machine, path: &std::path::Path) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|source| AppError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })?;
    serialize::write_state(machine, &mut file).map_err(|source| AppError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}
