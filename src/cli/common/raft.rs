// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Arguments describing the input raft and how aggressor spots are found.

use std::{path::PathBuf, time::Duration};

use clap::Args;
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    constants::{
        DEFAULT_AMPS_PER_SENSOR, DEFAULT_RAFT_SENSORS, DEFAULT_READ_TIMEOUT_SECONDS,
        DEFAULT_SMOOTHING_SIGMA, DEFAULT_SPOT_RADIUS, DEFAULT_SPOT_THRESHOLD,
    },
    io::read::{RaftReadError, RaftReader},
    raft::{RaftLayout, RaftLayoutError},
    spot::SpotFinder,
};

lazy_static::lazy_static! {
    pub(in crate::cli) static ref SENSORS_HELP: String =
        format!("The sensors of the raft, in crosstalk-matrix order. Each needs a subdirectory of the input directory. Separate with spaces or commas. Default: {}", DEFAULT_RAFT_SENSORS.join(","));

    pub(in crate::cli) static ref AMPS_PER_SENSOR_HELP: String =
        format!("The number of amplifier HDUs in each sensor file. Default: {DEFAULT_AMPS_PER_SENSOR}");

    static ref READ_TIMEOUT_HELP: String =
        format!("Give up if a single sensor file takes longer than this to read [seconds]. Default: {DEFAULT_READ_TIMEOUT_SECONDS}");

    static ref SMOOTHING_HELP: String =
        format!("The standard deviation of the Gaussian used to smooth amplifier images before looking for the brightest spot [pixels]. Default: {DEFAULT_SMOOTHING_SIGMA}");

    static ref SPOT_RADIUS_HELP: String =
        format!("The radius of the circle whose mean verifies a candidate spot [pixels]. Default: {DEFAULT_SPOT_RADIUS}");

    static ref THRESHOLD_HELP: String =
        format!("A candidate is an aggressor spot only if the mean inside its circle exceeds this [ADU]. Default: {DEFAULT_SPOT_THRESHOLD}");
}

#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
pub(in crate::cli) struct RaftArgs {
    /// The directory containing one subdirectory of projector FITS files per
    /// sensor.
    #[clap(short = 'd', long, help_heading = "INPUT DATA")]
    pub(in crate::cli) input_dir: Option<PathBuf>,

    #[clap(long, multiple_values(true), help = SENSORS_HELP.as_str(), help_heading = "INPUT DATA")]
    pub(in crate::cli) sensors: Option<Vec<String>>,

    #[clap(long, help = AMPS_PER_SENSOR_HELP.as_str(), help_heading = "INPUT DATA")]
    pub(in crate::cli) amps_per_sensor: Option<usize>,

    #[clap(long, help = READ_TIMEOUT_HELP.as_str(), help_heading = "INPUT DATA")]
    pub(in crate::cli) read_timeout: Option<u64>,
}

impl RaftArgs {
    /// Prefer `self`'s values over `other`'s.
    pub(in crate::cli) fn merge(self, other: Self) -> Self {
        RaftArgs {
            input_dir: self.input_dir.or(other.input_dir),
            sensors: self.sensors.or(other.sensors),
            amps_per_sensor: self.amps_per_sensor.or(other.amps_per_sensor),
            read_timeout: self.read_timeout.or(other.read_timeout),
        }
    }

    /// Check the input directory and set up a reader for it. This opens the
    /// reference file of the first sensor to get the data section.
    pub(in crate::cli) fn parse(self) -> Result<RaftReader, RaftArgsError> {
        let RaftArgs {
            input_dir,
            sensors,
            amps_per_sensor,
            read_timeout,
        } = self;

        let input_dir = input_dir.ok_or(RaftArgsError::NoInputDir)?;
        if !input_dir.is_dir() {
            return Err(RaftArgsError::InputDirNotFound(input_dir));
        }
        let layout = parse_layout(sensors, amps_per_sensor)?;
        let read_timeout = match read_timeout {
            Some(0) => return Err(RaftArgsError::ZeroTimeout),
            Some(t) => t,
            None => DEFAULT_READ_TIMEOUT_SECONDS,
        };
        debug!("Reading raft with {} amplifiers from {}", layout.num_amps(), input_dir.display());

        let reader = RaftReader::new(&input_dir, layout, Duration::from_secs(read_timeout))?;
        Ok(reader)
    }
}

/// Sensors may be given as separate values, comma-separated, or both.
pub(in crate::cli) fn parse_layout(
    sensors: Option<Vec<String>>,
    amps_per_sensor: Option<usize>,
) -> Result<RaftLayout, RaftLayoutError> {
    let amps_per_sensor = amps_per_sensor.unwrap_or(DEFAULT_AMPS_PER_SENSOR);
    let sensors: Vec<String> = match sensors {
        Some(sensors) => sensors
            .iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        None => DEFAULT_RAFT_SENSORS.iter().map(|s| s.to_string()).collect(),
    };
    RaftLayout::new(sensors, amps_per_sensor)
}

#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
pub(in crate::cli) struct SpotArgs {
    #[clap(short = 's', long, help = SMOOTHING_HELP.as_str(), help_heading = "AGGRESSOR SPOTS")]
    pub(in crate::cli) smoothing: Option<f64>,

    #[clap(long, help = SPOT_RADIUS_HELP.as_str(), help_heading = "AGGRESSOR SPOTS")]
    pub(in crate::cli) spot_radius: Option<f64>,

    #[clap(long, help = THRESHOLD_HELP.as_str(), help_heading = "AGGRESSOR SPOTS")]
    pub(in crate::cli) threshold: Option<f64>,
}

impl SpotArgs {
    /// Prefer `self`'s values over `other`'s.
    pub(in crate::cli) fn merge(self, other: Self) -> Self {
        SpotArgs {
            smoothing: self.smoothing.or(other.smoothing),
            spot_radius: self.spot_radius.or(other.spot_radius),
            threshold: self.threshold.or(other.threshold),
        }
    }

    pub(in crate::cli) fn parse(self) -> Result<SpotFinder, RaftArgsError> {
        let sigma = self.smoothing.unwrap_or(DEFAULT_SMOOTHING_SIGMA);
        let radius = self.spot_radius.unwrap_or(DEFAULT_SPOT_RADIUS);
        let threshold = self.threshold.unwrap_or(DEFAULT_SPOT_THRESHOLD);
        for (name, value) in [("smoothing", sigma), ("spot radius", radius)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(RaftArgsError::BadSpotParameter { name, value });
            }
        }
        if !threshold.is_finite() {
            return Err(RaftArgsError::BadSpotParameter {
                name: "threshold",
                value: threshold,
            });
        }

        Ok(SpotFinder {
            sigma,
            radius,
            threshold,
        })
    }
}

#[derive(Error, Debug)]
pub(in crate::cli) enum RaftArgsError {
    #[error("No input directory was specified")]
    NoInputDir,

    #[error("The input directory {0} doesn't exist or isn't a directory")]
    InputDirNotFound(PathBuf),

    #[error("The read timeout must be at least 1 second")]
    ZeroTimeout,

    #[error("Invalid {name} for spot finding: {value}")]
    BadSpotParameter { name: &'static str, value: f64 },

    #[error(transparent)]
    Layout(#[from] RaftLayoutError),

    #[error(transparent)]
    Read(#[from] RaftReadError),
}
