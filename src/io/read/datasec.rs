// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The imaging area of an amplifier, as declared by its `DATASEC` header key.

use std::{fmt::Display, ops::Range, str::FromStr};

use lazy_static::lazy_static;
use ndarray::prelude::*;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref DATASEC_REGEX: Regex =
        Regex::new(r"^\s*\[\s*(\d+)\s*:\s*(\d+)\s*,\s*(\d+)\s*:\s*(\d+)\s*\]\s*$").unwrap();
}

/// A rectangular section of an amplifier image. The header form is the FITS
/// convention `[x1:x2,y1:y2]`: 1-based, inclusive at both ends, with x the
/// column (fast) axis. Internally we keep 0-based half-open ranges.
///
/// `[11:50,1:20]` is rows `0..20`, cols `10..50`. Code that slices the raw
/// numbers as 0-based half-open (`rows 1..20, cols 11..50`) gets a section one
/// pixel smaller on each axis and offset by one; spot positions and stamps from
/// this crate are one pixel away from such code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DataSection {
    pub(crate) rows: Range<usize>,
    pub(crate) cols: Range<usize>,
}

impl DataSection {
    /// (height, width)
    pub(crate) fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// View the section of a full amplifier image.
    pub(crate) fn slice<'a>(
        &self,
        image: ArrayView2<'a, f64>,
    ) -> Result<ArrayView2<'a, f64>, DataSectionError> {
        let (num_rows, num_cols) = image.dim();
        if self.rows.end > num_rows || self.cols.end > num_cols {
            return Err(DataSectionError::OutOfBounds {
                datasec: self.to_string(),
                shape: (num_rows, num_cols),
            });
        }
        Ok(image.slice_move(s![self.rows.clone(), self.cols.clone()]))
    }
}

impl FromStr for DataSection {
    type Err = DataSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || DataSectionError::Malformed(s.to_string());
        let caps = DATASEC_REGEX.captures(s).ok_or_else(malformed)?;
        // The regex only admits digits, so this fails only on overflow.
        let mut bounds = [0_usize; 4];
        for (bound, cap) in bounds.iter_mut().zip(caps.iter().skip(1)) {
            *bound = cap
                .ok_or_else(malformed)?
                .as_str()
                .parse()
                .map_err(|_| malformed())?;
        }
        let [x1, x2, y1, y2] = bounds;
        if x1 == 0 || y1 == 0 || x2 < x1 || y2 < y1 {
            return Err(DataSectionError::Empty(s.to_string()));
        }

        Ok(DataSection {
            rows: y1 - 1..y2,
            cols: x1 - 1..x2,
        })
    }
}

impl Display for DataSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}:{},{}:{}]",
            self.cols.start + 1,
            self.cols.end,
            self.rows.start + 1,
            self.rows.end
        )
    }
}

#[derive(Error, Debug)]
pub enum DataSectionError {
    #[error("Couldn't parse '{0}' as a data section; expected the form [x1:x2,y1:y2]")]
    Malformed(String),

    #[error("Data section '{0}' is empty or not 1-based")]
    Empty(String),

    #[error("Data section {datasec} doesn't fit in an image of shape {shape:?}")]
    OutOfBounds {
        datasec: String,
        shape: (usize, usize),
    },
}
