//! `synasm INPUT [OUTPUT]` — assembles one source file (§4.13, §6).

use clap::Parser;
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use synasm::Diagnostic;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(about = "Assembles Synacor source into a binary program image")]
struct Cli {
    /// Source file to assemble
    input: PathBuf,

    /// Output file; derived from INPUT when omitted (§6)
    output: Option<PathBuf>,
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
    #[error("{} diagnostic(s) in \"{}\"", .diagnostics.len(), .file)]
    Diagnostics { file: String, diagnostics: Vec<Diagnostic> },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Diagnostics { diagnostics, .. }) => {
            for diagnostic in &diagnostics {
                eprintln!("{}", diagnostic.render());
            }
            ExitCode::from(1)
        }
        Err(err) => {
            error!("{}", err);
            eprintln!("{}", err);
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    let source = fs::read_to_string(&cli.input).map_err(|source| AppError::ReadInput {
        path: cli.input.clone(),
        source,
    })?;

    let file_label = cli.input.to_string_lossy().into_owned();
    let bytes = synasm::assemble(&source, &file_label).map_err(|diagnostics| AppError::Diagnostics {
        file: file_label.clone(),
        diagnostics,
    })?;
    info!("assembled {} ({} bytes)", file_label, bytes.len());

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| derive_output_path(&cli.input));
    write_atomically(&output_path, &bytes)
}

/// §6: replace the input's final extension with `bin`, or append `.bin`
/// if there is none, or append `_` before the extension if that would
/// produce the same path as the input itself.
fn derive_output_path(input: &Path) -> PathBuf {
    let mut candidate = if input.extension().is_some() {
        input.with_extension("bin")
    } else {
        let mut with_suffix = input.as_os_str().to_owned();
        with_suffix.push(".bin");
        PathBuf::from(with_suffix)
    };

    if candidate == input {
        let stem = candidate
            .file_stem()
            .map(|s| s.to_owned())
            .unwrap_or_default();
        let mut new_name = stem;
        new_name.push("_");
        candidate.set_file_name(new_name);
        candidate.set_extension("bin");
    }
    candidate
}

/// Writes `bytes` to `path` via a temporary file and rename, moving any
/// prior file at `path` aside to `path.bak` first (§4.9, §6).
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), AppError> {
    let tmp_path = append_suffix(path, ".tmp");
    fs::write(&tmp_path, bytes).map_err(|source| AppError::WriteOutput {
        path: tmp_path.clone(),
        source,
    })?;

    if path.exists() {
        let bak_path = append_suffix(path, ".bak");
        fs::rename(path, &bak_path).map_err(|source| AppError::WriteOutput {
            path: bak_path,
            source,
        })?;
    }

    fs::rename(&tmp_path, path).map_err(|source| AppError::WriteOutput {
        path: path.to_path_buf(),
        source,
    })
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut os_string = path.as_os_str().to_owned();
    os_string.push(suffix);
    PathBuf::from(os_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_known_extension() {
        assert_eq!(derive_output_path(Path::new("prog.asm")), PathBuf::from("prog.bin"));
    }

    #[test]
    fn appends_extension_when_absent() {
        assert_eq!(derive_output_path(Path::new("prog")), PathBuf::from("prog.bin"));
    }

    #[test]
    fn disambiguates_a_colliding_derivation() {
        assert_eq!(derive_output_path(Path::new("prog.bin")), PathBuf::from("prog_.bin"));
    }
}
