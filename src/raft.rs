// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Raft geometry: which sensor and amplifier a crosstalk-matrix index refers
//! to.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_AMPS_PER_SENSOR, DEFAULT_RAFT_SENSORS};

/// The sensors of a raft and the number of amplifiers each has. Amplifier
/// indices run sensor-major: all amplifiers of the first sensor, then all of
/// the second, and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaftLayout {
    sensors: Vec<String>,
    amps_per_sensor: usize,
}

/// A sensor name and 1-based amplifier number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmpId {
    pub sensor: String,
    pub amp: usize,
}

impl Display for AmpId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, amplifier {}", self.sensor, self.amp)
    }
}

impl Default for RaftLayout {
    fn default() -> Self {
        Self {
            sensors: DEFAULT_RAFT_SENSORS.iter().map(|s| s.to_string()).collect(),
            amps_per_sensor: DEFAULT_AMPS_PER_SENSOR,
        }
    }
}

impl RaftLayout {
    pub fn new(sensors: Vec<String>, amps_per_sensor: usize) -> Result<RaftLayout, RaftLayoutError> {
        if sensors.is_empty() {
            return Err(RaftLayoutError::NoSensors);
        }
        if amps_per_sensor == 0 {
            return Err(RaftLayoutError::NoAmps);
        }
        for (i, s) in sensors.iter().enumerate() {
            if sensors[..i].contains(s) {
                return Err(RaftLayoutError::DuplicateSensor(s.clone()));
            }
        }

        Ok(Self {
            sensors,
            amps_per_sensor,
        })
    }

    pub fn sensors(&self) -> &[String] {
        &self.sensors
    }

    pub fn amps_per_sensor(&self) -> usize {
        self.amps_per_sensor
    }

    /// The total number of amplifiers, i.e. the side length of the crosstalk
    /// matrix.
    pub fn num_amps(&self) -> usize {
        self.sensors.len() * self.amps_per_sensor
    }

    /// Convert a crosstalk-matrix index into a sensor name and amplifier
    /// number. `None` if the index is beyond the raft.
    pub fn amp_id(&self, amp_index: usize) -> Option<AmpId> {
        let sensor = self.sensors.get(amp_index / self.amps_per_sensor)?;
        Some(AmpId {
            sensor: sensor.clone(),
            amp: amp_index % self.amps_per_sensor + 1,
        })
    }

    /// The inverse of [`RaftLayout::amp_id`].
    pub fn amp_index(&self, sensor: &str, amp: usize) -> Option<usize> {
        if amp == 0 || amp > self.amps_per_sensor {
            return None;
        }
        let i_sensor = self.sensors.iter().position(|s| s == sensor)?;
        Some(i_sensor * self.amps_per_sensor + amp - 1)
    }
}

#[derive(Error, Debug)]
pub enum RaftLayoutError {
    #[error("No sensors were specified for the raft")]
    NoSensors,

    #[error("Sensors must have at least one amplifier")]
    NoAmps,

    #[error("Sensor '{0}' was specified more than once")]
    DuplicateSensor(String),
}
