// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Crosstalk measurement for CCD raft electro-optical test data.

Bright "aggressor" spots projected onto one amplifier leak a small, linearly
scaled copy of themselves into every other ("victim") amplifier read out by the
same electronics. This crate locates the aggressor spots in a sequence of
projector exposures, cuts postage stamps around them and robustly fits the
crosstalk coefficient of every (aggressor, victim) amplifier pair.
 */

pub mod cli;
pub mod constants;
pub mod fit;
pub(crate) mod io;
pub(crate) mod math;
pub(crate) mod misc;
pub(crate) mod params;
pub mod raft;
pub mod results;
pub mod spot;
pub mod stamp;

#[cfg(test)]
mod tests;

use crossbeam_utils::atomic::AtomicCell;

// Re-exports.
pub use cli::{Xtalk, XtalkError};
pub use fit::{CrosstalkFit, CrosstalkFitter, FitError, FitIteration};
pub use raft::{AmpId, RaftLayout};
pub use results::{AggressorLocation, CrosstalkResultGrid, LookupTable};
pub use spot::{find_spot, SpotFinder, SpotSearch};
pub use stamp::stamp;

/// Should progress bars be drawn?
pub(crate) static PROGRESS_BARS: AtomicCell<bool> = AtomicCell::new(false);
