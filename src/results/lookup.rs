// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Which projector position and spot each aggressor amplifier's row of the
//! result grid came from.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};

use super::{ResultsReadError, ResultsWriteError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggressorLocation {
    /// The projector position the spot was found at.
    pub position: usize,

    pub sensor: String,

    /// 1-based amplifier number.
    pub amp: usize,

    /// Spot centre row [pixels, data section coordinates].
    pub y: usize,

    /// Spot centre column [pixels, data section coordinates].
    pub x: usize,
}

/// Aggressor amplifier index to where its spot was found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable(BTreeMap<usize, AggressorLocation>);

impl LookupTable {
    pub fn new() -> LookupTable {
        LookupTable::default()
    }

    /// Record where `amp_index` was found, returning the location it replaces,
    /// if any.
    pub fn insert(
        &mut self,
        amp_index: usize,
        location: AggressorLocation,
    ) -> Option<AggressorLocation> {
        self.0.insert(amp_index, location)
    }

    pub fn get(&self, amp_index: usize) -> Option<&AggressorLocation> {
        self.0.get(&amp_index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// In ascending amplifier index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &AggressorLocation)> {
        self.0.iter().map(|(&i, loc)| (i, loc))
    }

    pub fn write_json(&self, file: &Path) -> Result<(), ResultsWriteError> {
        let mut writer = BufWriter::new(File::create(file)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    pub fn read_json(file: &Path) -> Result<LookupTable, ResultsReadError> {
        let reader = BufReader::new(File::open(file)?);
        serde_json::from_reader(reader).map_err(|err| ResultsReadError::Json {
            file: file.to_path_buf(),
            err,
        })
    }
}
