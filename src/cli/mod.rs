// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command-line interface code. More specific options for `eo-xtalk`
//! subcommands are contained in modules.
//!
//! All booleans must have `#[serde(default)]` annotated, and anything that
//! isn't a boolean must be optional. This allows all arguments to be optional
//! *and* usable in an arguments file.
//!
//! Only 3 things should be public in this module: `Xtalk`, `Xtalk::run`, and
//! `XtalkError`.

#[macro_use]
mod common;
mod error;
mod find_spots;
mod measure;
mod results_summary;

pub use error::XtalkError;

use std::{
    fs::File,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Mutex,
};

use clap::{AppSettings, Args, Parser, Subcommand};
use log::info;

use crate::PROGRESS_BARS;

// Add build-time information from the "built" crate.
include!(concat!(env!("OUT_DIR"), "/built.rs"));

lazy_static::lazy_static! {
    /// Everything logged is also written here, once a log file is started.
    static ref LOG_FILE: Mutex<Option<File>> = Mutex::new(None);
}

#[derive(Debug, Parser)]
#[clap(
    version,
    author,
    about = r#"Crosstalk measurement for CCD raft electro-optical test data.
Finds bright projector spots on "aggressor" amplifiers and fits how much of
each spot leaks into every other amplifier of the raft."#
)]
#[clap(global_setting(AppSettings::DeriveDisplayOrder))]
#[clap(disable_help_subcommand = true)]
#[clap(infer_subcommands = true)]
#[clap(propagate_version = true)]
#[clap(infer_long_args = true)]
pub struct Xtalk {
    #[clap(flatten)]
    global_opts: GlobalArgs,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Don't draw progress bars.
    #[clap(long)]
    #[clap(global = true)]
    no_progress_bars: bool,

    /// The verbosity of the program. Increase by specifying multiple times
    /// (e.g. -vv). The default is to print only high-level information.
    #[clap(short, long, parse(from_occurrences))]
    #[clap(global = true)]
    verbosity: u8,

    /// Only verify that arguments were correctly ingested and print out
    /// high-level information.
    #[clap(long)]
    #[clap(global = true)]
    dry_run: bool,

    /// Save the input arguments into a new TOML file that can be used to
    /// reproduce this run.
    #[clap(long)]
    #[clap(global = true)]
    save_toml: Option<PathBuf>,

    /// Also write the log to this file. Without this, `measure` writes its log
    /// next to its results.
    #[clap(long)]
    #[clap(global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
#[clap(arg_required_else_help = true)]
enum Command {
    #[clap(about = "Measure the crosstalk matrix of a raft from a sequence of projector positions.")]
    Measure(measure::MeasureArgs),

    #[clap(alias = "spots")]
    #[clap(
        about = "Report whether each amplifier of one projector position has an aggressor spot."
    )]
    FindSpots(find_spots::FindSpotsArgs),

    #[clap(alias = "summarise")]
    #[clap(about = "Summarise a crosstalk results file.")]
    ResultsSummary(results_summary::ResultsSummaryArgs),
}

impl Xtalk {
    pub fn run(self) -> Result<(), XtalkError> {
        // Set up logging.
        let GlobalArgs {
            verbosity,
            dry_run,
            no_progress_bars,
            save_toml,
            log_file,
        } = self.global_opts;
        setup_logging(verbosity).expect("Failed to initialise logging.");
        if let Some(log_file) = log_file {
            start_log_file(&log_file)?;
        }
        // Enable progress bars if the user didn't say "no progress bars".
        if !no_progress_bars {
            PROGRESS_BARS.store(true);
        }

        // Print the version of eo-xtalk and its build-time information.
        let sub_command = match &self.command {
            Command::Measure(_) => "measure",
            Command::FindSpots(_) => "find-spots",
            Command::ResultsSummary(_) => "results-summary",
        };
        info!("eo-xtalk {} {}", sub_command, env!("CARGO_PKG_VERSION"));
        display_build_info();

        macro_rules! merge_save_run {
            ($args:expr) => {{
                let args = $args.merge()?;
                if let Some(toml) = save_toml {
                    use std::io::BufWriter;

                    let mut f = BufWriter::new(File::create(toml)?);
                    let toml_str = toml::to_string(&args).expect("toml serialisation error");
                    f.write_all(toml_str.as_bytes())?;
                }
                args.run(dry_run)?;
            }};
        }

        match self.command {
            Command::Measure(args) => {
                merge_save_run!(args)
            }

            // Utilities.
            Command::FindSpots(args) => args.run(dry_run)?,
            Command::ResultsSummary(args) => args.run()?,
        }

        info!("eo-xtalk {} complete.", sub_command);
        Ok(())
    }
}

/// Log lines go to `stdout` and, if one has been started, the log file. The
/// log file never gets colour codes.
struct StdoutAndLogFile;

impl Write for StdoutAndLogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stdout().write_all(buf)?;
        if let Ok(mut log_file) = LOG_FILE.lock() {
            if let Some(f) = log_file.as_mut() {
                let s = String::from_utf8_lossy(buf);
                f.write_all(console::strip_ansi_codes(&s).as_bytes())?;
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()?;
        if let Ok(mut log_file) = LOG_FILE.lock() {
            if let Some(f) = log_file.as_mut() {
                f.flush()?;
            }
        }
        Ok(())
    }
}

/// Activate a logger. All log messages are put onto `stdout` (and the log file,
/// when there is one). Colours and fancy symbols are only used if `stdout` is a
/// tty (e.g. a terminal); piped output will be formatted sensibly. Source code
/// lines are displayed in log messages when verbosity >= 3.
fn setup_logging(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.target(env_logger::Target::Pipe(Box::new(StdoutAndLogFile)));
    builder.write_style(if console::colors_enabled() {
        env_logger::WriteStyle::Always
    } else {
        env_logger::WriteStyle::Never
    });
    builder.format_target(false);
    match verbosity {
        0 => builder.filter_level(log::LevelFilter::Info),
        1 => builder.filter_level(log::LevelFilter::Debug),
        2 => builder.filter_level(log::LevelFilter::Trace),
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
            builder.format(|buf, record| {
                let timestamp = buf.timestamp();
                let level = record.level();
                let target = record.target();
                let line = record.line().unwrap_or(0);
                let message = record.args();

                writeln!(buf, "[{timestamp} {level} {target}:{line}] {message}")
            })
        }
    };
    builder.try_init()
}

/// Start copying the log into `file`, replacing any log file already in use.
fn start_log_file(file: &Path) -> Result<(), io::Error> {
    let f = File::create(file)?;
    if let Ok(mut log_file) = LOG_FILE.lock() {
        *log_file = Some(f);
    }
    info!("Logging to {}", file.display());
    Ok(())
}

fn log_file_started() -> bool {
    LOG_FILE.lock().map(|f| f.is_some()).unwrap_or(false)
}

/// Write many info-level log lines of how this executable was compiled.
fn display_build_info() {
    let dirty = match GIT_DIRTY {
        Some(true) => " (dirty)",
        _ => "",
    };
    match GIT_COMMIT_HASH_SHORT {
        Some(hash) => {
            info!("Compiled on git commit hash: {hash}{dirty}");
        }
        None => info!("Compiled on git commit hash: <no git info>"),
    }
    if let Some(hr) = GIT_HEAD_REF {
        info!("            git head ref: {}", hr);
    }
    info!("            {}", BUILT_TIME_UTC);
    info!("         with compiler {}", RUSTC_VERSION);
    info!("");
}
