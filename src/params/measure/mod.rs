// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Measuring the crosstalk matrix of a raft.
//!
//! Projector positions are handled one at a time. At each position the
//! amplifiers are searched in order for aggressor spots, and for every spot
//! found, a stamp around it is fitted against the same stamp on every other
//! amplifier. The victim fits of an aggressor run in parallel; their results
//! are collected and written into the grid by this thread alone.


use std::path::PathBuf;

use indicatif::{
    MultiProgress, ParallelProgressIterator, ProgressBar, ProgressDrawTarget, ProgressStyle,
};
use log::{debug, info, warn};
use rayon::prelude::*;
use thiserror::Error;

use crate::{
    constants::{DEFAULT_LIBRARY_STAMP_LENGTH, DEFAULT_NUM_AGGRESSORS},
    fit::{CrosstalkFit, CrosstalkFitter, FitError},
    io::read::{RaftReadError, RaftReader, RaftStack},
    raft::RaftLayout,
    results::{
        AggressorLocation, CrosstalkResultGrid, LookupTable, ResultsMetadata, ResultsWriteError,
    },
    spot::{SpotFinder, SpotSearch},
    stamp::stamp,
    PROGRESS_BARS,
};

/// An aggressor spot found at a projector position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Aggressor {
    pub(crate) amp_index: usize,
    pub(crate) y: usize,
    pub(crate) x: usize,
}

/// Everything needed to measure crosstalk at a single projector position.
#[derive(Debug, Clone)]
pub(crate) struct MeasureSettings {
    pub(crate) layout: RaftLayout,
    pub(crate) spot_finder: SpotFinder,
    pub(crate) fitter: CrosstalkFitter,
    pub(crate) stamp_length: usize,
    pub(crate) num_aggressors: usize,
}

impl Default for MeasureSettings {
    fn default() -> Self {
        Self {
            layout: RaftLayout::default(),
            spot_finder: SpotFinder::default(),
            fitter: CrosstalkFitter::default(),
            stamp_length: DEFAULT_LIBRARY_STAMP_LENGTH,
            num_aggressors: DEFAULT_NUM_AGGRESSORS,
        }
    }
}

impl MeasureSettings {
    /// Walk the amplifiers in order until `num_aggressors` spots have been
    /// found. Running out of amplifiers first is an error.
    pub(crate) fn find_aggressors(&self, stack: &RaftStack) -> Result<Vec<Aggressor>, MeasureError> {
        let mut aggressors = Vec::with_capacity(self.num_aggressors);
        for amp_index in 0..stack.num_amps() {
            if aggressors.len() == self.num_aggressors {
                break;
            }
            match self.spot_finder.find(stack.frame(amp_index)) {
                SpotSearch::Found { y, x } => aggressors.push(Aggressor { amp_index, y, x }),
                SpotSearch::NotFound => {
                    debug!("No spot on amplifier index {amp_index}");
                }
            }
        }

        if aggressors.len() < self.num_aggressors {
            return Err(MeasureError::TooFewAggressors {
                position: stack.position,
                found: aggressors.len(),
                wanted: self.num_aggressors,
            });
        }
        Ok(aggressors)
    }

    /// Fit `aggressor` against every other amplifier of `stack`. The results
    /// come back in victim order.
    pub(crate) fn fit_victims(
        &self,
        stack: &RaftStack,
        aggressor: Aggressor,
        progress: &ProgressBar,
    ) -> Vec<(usize, Result<CrosstalkFit, FitError>)> {
        let Aggressor { amp_index, y, x } = aggressor;
        let aggressor_stamp = stamp(stack.frame(amp_index), y, x, self.stamp_length);
        (0..stack.num_amps())
            .into_par_iter()
            .filter(|&victim| victim != amp_index)
            .map(|victim| {
                let victim_stamp = stamp(stack.frame(victim), y, x, self.stamp_length);
                let fit = self.fitter.fit(aggressor_stamp.view(), victim_stamp.view());
                (victim, fit)
            })
            .progress_with(progress.clone())
            .collect()
    }

    /// Find the aggressors of a position and fit them, updating `grid` and
    /// `lookup`.
    pub(crate) fn measure_position(
        &self,
        stack: &RaftStack,
        grid: &mut CrosstalkResultGrid,
        lookup: &mut LookupTable,
        progress: &ProgressBar,
    ) -> Result<(), MeasureError> {
        let layout_mismatch = || MeasureError::LayoutMismatch {
            stack_amps: stack.num_amps(),
            layout_amps: self.layout.num_amps(),
        };
        if stack.num_amps() != self.layout.num_amps() {
            return Err(layout_mismatch());
        }

        let aggressors = self.find_aggressors(stack)?;
        progress.reset();
        progress.set_length((aggressors.len() * (stack.num_amps() - 1)) as u64);

        for aggressor in aggressors {
            let Aggressor { amp_index, y, x } = aggressor;
            let amp_id = self.layout.amp_id(amp_index).ok_or_else(layout_mismatch)?;
            progress.suspend(|| info!("Aggressor found at {amp_id}"));

            let location = AggressorLocation {
                position: stack.position,
                sensor: amp_id.sensor.clone(),
                amp: amp_id.amp,
                y,
                x,
            };
            if let Some(previous) = lookup.insert(amp_index, location) {
                progress.suspend(|| {
                    warn!(
                        "{amp_id} was already an aggressor at position {:03}; replacing its results with those of position {:03}",
                        previous.position, stack.position
                    )
                });
            }

            grid.set_self(amp_index);
            for (victim, fit) in self.fit_victims(stack, aggressor, progress) {
                if let Err(e) = &fit {
                    let victim_id = self.layout.amp_id(victim);
                    progress.suspend(|| match victim_id {
                        Some(v) => warn!("Aggressor {amp_id}, victim {v}: {e}"),
                        None => warn!("Aggressor {amp_id}, victim index {victim}: {e}"),
                    });
                }
                grid.record(amp_index, victim, &fit);
            }
        }

        Ok(())
    }
}

pub(crate) struct MeasureParams {
    pub(crate) reader: RaftReader,
    pub(crate) settings: MeasureSettings,
    pub(crate) num_positions: usize,
    pub(crate) results_file: PathBuf,
    pub(crate) lookup_file: PathBuf,

    /// Where the run's log is kept, unless the user asked for somewhere else.
    pub(crate) log_file: PathBuf,

    /// If not set, rayon decides.
    pub(crate) num_threads: Option<usize>,
}

impl MeasureParams {
    /// Measure every projector position, returning the filled grid and lookup
    /// table. Nothing is written.
    pub(crate) fn measure(&self) -> Result<(CrosstalkResultGrid, LookupTable), MeasureError> {
        let num_amps = self.settings.layout.num_amps();
        let mut grid = CrosstalkResultGrid::new(num_amps);
        let mut lookup = LookupTable::new();

        let multi_progress = MultiProgress::with_draw_target(if PROGRESS_BARS.load() {
            ProgressDrawTarget::stdout()
        } else {
            ProgressDrawTarget::hidden()
        });
        let position_progress = multi_progress.add(
            ProgressBar::new(self.num_positions as _)
                .with_style(
                    ProgressStyle::default_bar()
                        .template("{msg:18}: [{wide_bar:.blue}] {pos:2}/{len:2} positions ({elapsed_precise}<{eta_precise})").unwrap()
                        .progress_chars("=> "),
                )
                .with_position(0)
                .with_message("Positions"),
        );
        let fit_progress = multi_progress.add(
            ProgressBar::new(0)
                .with_style(
                    ProgressStyle::default_bar()
                        .template("{msg:18}: [{wide_bar:.blue}] {pos:4}/{len:4} fits ({elapsed_precise}<{eta_precise})").unwrap()
                        .progress_chars("=> "),
                )
                .with_position(0)
                .with_message("Victim fits"),
        );

        for position in 0..self.num_positions {
            position_progress.suspend(|| info!("Starting position {position:03}"));
            let stack = self.reader.read_position(position)?;
            self.settings
                .measure_position(&stack, &mut grid, &mut lookup, &fit_progress)?;
            position_progress.inc(1);
        }
        fit_progress.abandon_with_message("Finished fitting");
        position_progress.abandon_with_message("Finished positions");

        Ok((grid, lookup))
    }

    /// Measure, then write the results and lookup table.
    pub(crate) fn run(&self) -> Result<(), MeasureError> {
        if let Some(num_threads) = self.num_threads {
            debug!("Using {num_threads} threads for fitting");
            rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()?;
        }
        for file in [&self.results_file, &self.lookup_file] {
            if let Some(dir) = file.parent() {
                std::fs::create_dir_all(dir)?;
            }
        }

        let (grid, lookup) = self.measure()?;

        let metadata = ResultsMetadata {
            stamp_length: self.settings.stamp_length,
            smoothing_sigma: self.settings.spot_finder.sigma,
            spot_radius: self.settings.spot_finder.radius,
            spot_threshold: self.settings.spot_finder.threshold,
            num_positions: self.num_positions,
            num_aggressors: self.settings.num_aggressors,
            num_iterations: self.settings.fitter.num_iterations,
        };
        grid.write_fits(&self.results_file, &metadata)?;
        info!("Crosstalk results written to {}", self.results_file.display());
        lookup.write_json(&self.lookup_file)?;
        info!("Aggressor lookup table written to {}", self.lookup_file.display());

        let num_failed: usize = lookup.iter().map(|(i, _)| grid.num_failed(i)).sum();
        if num_failed > 0 {
            warn!("{num_failed} crosstalk fits were singular; their cells are NaN");
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub(crate) enum MeasureError {
    #[error("Only found {found} of {wanted} aggressor spots at position {position:03}")]
    TooFewAggressors {
        position: usize,
        found: usize,
        wanted: usize,
    },

    #[error("The frame stack has {stack_amps} amplifiers, but the raft layout has {layout_amps}")]
    LayoutMismatch {
        stack_amps: usize,
        layout_amps: usize,
    },

    #[error(transparent)]
    Read(#[from] RaftReadError),

    #[error(transparent)]
    Write(#[from] ResultsWriteError),

    #[error("Couldn't set up the thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
