// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{
    display_warnings, InfoPrinter, RaftArgs, SpotArgs, Warn, ARG_FILE_HELP,
};
use crate::{
    constants::{
        DEFAULT_LOG_FILENAME, DEFAULT_LOOKUP_FILENAME, DEFAULT_NUM_AGGRESSORS,
        DEFAULT_NUM_ITERATIONS, DEFAULT_NUM_POSITIONS, DEFAULT_RESULTS_FILENAME,
        DEFAULT_STAMP_LENGTH,
    },
    fit::CrosstalkFitter,
    params::{MeasureParams, MeasureSettings},
    XtalkError,
};

lazy_static::lazy_static! {
    static ref LENGTH_HELP: String =
        format!("The side length of the square stamps cut around each aggressor spot [pixels]. Default: {DEFAULT_STAMP_LENGTH}");

    static ref POSITIONS_HELP: String =
        format!("The number of projector positions to process, starting at 000. Default: {DEFAULT_NUM_POSITIONS}");

    static ref AGGRESSORS_HELP: String =
        format!("The number of aggressor spots to find at each projector position. Default: {DEFAULT_NUM_AGGRESSORS}");

    static ref ITERATIONS_HELP: String =
        format!("The number of outlier-rejection iterations of each crosstalk fit. Default: {DEFAULT_NUM_ITERATIONS}");

    static ref RESULTS_FILENAME_HELP: String =
        format!("The name of the results FITS file, relative to the output directory. Default: {DEFAULT_RESULTS_FILENAME}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct MeasureArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "raft")]
    #[serde(default)]
    pub(super) raft_args: RaftArgs,

    #[clap(flatten)]
    #[serde(rename = "spots")]
    #[serde(default)]
    pub(super) spot_args: SpotArgs,

    #[clap(short = 'l', long, help = LENGTH_HELP.as_str(), help_heading = "FITTING")]
    pub(super) length: Option<usize>,

    #[clap(short = 'p', long, help = POSITIONS_HELP.as_str(), help_heading = "FITTING")]
    pub(super) positions: Option<usize>,

    #[clap(short = 'a', long, help = AGGRESSORS_HELP.as_str(), help_heading = "FITTING")]
    pub(super) aggressors: Option<usize>,

    #[clap(short = 'i', long, help = ITERATIONS_HELP.as_str(), help_heading = "FITTING")]
    pub(super) iterations: Option<usize>,

    /// The number of threads used for fitting. The default is one per CPU.
    #[clap(long, help_heading = "FITTING")]
    pub(super) num_threads: Option<usize>,

    /// The directory to write results, the lookup table and the log into. The
    /// default is the input directory.
    #[clap(short = 'o', long, help_heading = "OUTPUT FILES")]
    pub(super) output_dir: Option<PathBuf>,

    #[clap(long, help = RESULTS_FILENAME_HELP.as_str(), help_heading = "OUTPUT FILES")]
    pub(super) results_filename: Option<PathBuf>,
}

impl MeasureArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<MeasureArgs, XtalkError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            // Read in the file arguments. Ensure all of the file args are
            // accounted for by pattern matching.
            let MeasureArgs {
                args_file: _,
                raft_args,
                spot_args,
                length,
                positions,
                aggressors,
                iterations,
                num_threads,
                output_dir,
                results_filename,
            } = unpack_arg_file!(arg_file);

            // Merge all the arguments, preferring the CLI args when available.
            Ok(MeasureArgs {
                args_file: None,
                raft_args: cli_args.raft_args.merge(raft_args),
                spot_args: cli_args.spot_args.merge(spot_args),
                length: cli_args.length.or(length),
                positions: cli_args.positions.or(positions),
                aggressors: cli_args.aggressors.or(aggressors),
                iterations: cli_args.iterations.or(iterations),
                num_threads: cli_args.num_threads.or(num_threads),
                output_dir: cli_args.output_dir.or(output_dir),
                results_filename: cli_args.results_filename.or(results_filename),
            })
        } else {
            Ok(cli_args)
        }
    }

    pub(super) fn parse(self) -> Result<MeasureParams, XtalkError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            raft_args,
            spot_args,
            length,
            positions,
            aggressors,
            iterations,
            num_threads,
            output_dir,
            results_filename,
        } = self;

        let num_positions = match positions {
            Some(0) => return Err(MeasureArgsError::ZeroPositions.into()),
            p => p.unwrap_or(DEFAULT_NUM_POSITIONS),
        };
        let num_aggressors = match aggressors {
            Some(0) => return Err(MeasureArgsError::ZeroAggressors.into()),
            a => a.unwrap_or(DEFAULT_NUM_AGGRESSORS),
        };
        let num_iterations = match iterations {
            Some(0) => return Err(MeasureArgsError::ZeroIterations.into()),
            i => i.unwrap_or(DEFAULT_NUM_ITERATIONS),
        };
        let stamp_length = match length {
            Some(l) if l < 2 => return Err(MeasureArgsError::StampTooSmall(l).into()),
            l => l.unwrap_or(DEFAULT_STAMP_LENGTH),
        };
        if num_threads == Some(0) {
            return Err(MeasureArgsError::ZeroThreads.into());
        }

        let reader = raft_args.parse()?;
        let spot_finder = spot_args.parse()?;
        let layout = reader.layout().clone();
        let (height, width) = reader.frame_shape();

        if num_aggressors > layout.num_amps() {
            format!(
                "{num_aggressors} aggressors were requested per position, but the raft only has {} amplifiers",
                layout.num_amps()
            )
            .warn();
        }
        if stamp_length > height || stamp_length > width {
            format!("Stamps of length {stamp_length} are larger than the {height}x{width} data section; they will be clipped").warn();
        }

        let output_dir = output_dir.unwrap_or_else(|| reader.input_dir().to_path_buf());
        if !output_dir.exists() {
            format!(
                "Output directory {} doesn't exist; it will be created",
                output_dir.display()
            )
            .warn();
        }
        let results_file = output_dir.join(
            results_filename.unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_FILENAME)),
        );
        let lookup_file = output_dir.join(DEFAULT_LOOKUP_FILENAME);
        let log_file = output_dir.join(DEFAULT_LOG_FILENAME);
        for file in [&results_file, &lookup_file] {
            if file.exists() {
                format!("{} will be overwritten", file.display()).warn();
            }
        }

        let mut printer = InfoPrinter::new("Crosstalk measurement".into());
        printer.push_block(vec![
            format!("Input directory: {}", reader.input_dir().display()).into(),
            format!("Sensors: {}", layout.sensors().join(", ")).into(),
            format!(
                "{} amplifiers per sensor, {} in total",
                layout.amps_per_sensor(),
                layout.num_amps()
            )
            .into(),
            format!("Data section: {height}x{width} pixels").into(),
        ]);
        printer.push_block(vec![
            format!("Smoothing sigma: {} pixels", spot_finder.sigma).into(),
            format!("Spot radius: {} pixels", spot_finder.radius).into(),
            format!("Spot threshold: {} ADU", spot_finder.threshold).into(),
        ]);
        printer.push_block(vec![
            format!("{num_positions} projector positions, {num_aggressors} aggressors each").into(),
            format!("Stamp length: {stamp_length} pixels").into(),
            format!("Outlier-rejection iterations: {num_iterations}").into(),
        ]);
        if let Some(num_threads) = num_threads {
            printer.push_line(format!("Fitting threads: {num_threads}").into());
        }
        printer.push_block(vec![
            format!("Results: {}", results_file.display()).into(),
            format!("Lookup table: {}", lookup_file.display()).into(),
        ]);
        printer.display();
        display_warnings();

        Ok(MeasureParams {
            reader,
            settings: MeasureSettings {
                layout,
                spot_finder,
                fitter: CrosstalkFitter::new(num_iterations),
                stamp_length,
                num_aggressors,
            },
            num_positions,
            results_file,
            lookup_file,
            log_file,
            num_threads,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), XtalkError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        if !super::log_file_started() {
            if let Some(dir) = params.log_file.parent() {
                std::fs::create_dir_all(dir)?;
            }
            super::start_log_file(&params.log_file)?;
        }

        params.run()?;
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub(super) enum MeasureArgsError {
    #[error("The number of projector positions must be at least 1")]
    ZeroPositions,

    #[error("The number of aggressors per position must be at least 1")]
    ZeroAggressors,

    #[error("The number of outlier-rejection iterations must be at least 1")]
    ZeroIterations,

    #[error("A stamp length of {0} is too small; it must be at least 2 pixels")]
    StampTooSmall(usize),

    #[error("The number of threads must be at least 1")]
    ZeroThreads,
}
