// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

/*!
Useful constants.

All values that end up in a calibration product are double precision; pixel
data are promoted to `f64` as soon as they are read.
 */

/// The sensors of an LSST-style raft, in the order their amplifiers appear in
/// the crosstalk matrix.
pub const DEFAULT_RAFT_SENSORS: [&str; 9] =
    ["S00", "S01", "S02", "S10", "S11", "S12", "S20", "S21", "S22"];

/// The number of readout amplifiers on each sensor.
pub const DEFAULT_AMPS_PER_SENSOR: usize = 16;

/// The side length of a postage stamp used by the command-line tool [pixels].
pub const DEFAULT_STAMP_LENGTH: usize = 200;

/// The side length of a postage stamp when the library is asked for a stamp
/// without specifying one [pixels].
pub const DEFAULT_LIBRARY_STAMP_LENGTH: usize = 300;

/// The standard deviation of the Gaussian used to smooth amplifier images
/// before looking for an aggressor spot [pixels].
pub const DEFAULT_SMOOTHING_SIGMA: f64 = 50.0;

/// Gaussian kernels extend out to this many standard deviations.
pub const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// The radius of the circle used to verify a candidate aggressor spot
/// [pixels].
pub const DEFAULT_SPOT_RADIUS: f64 = 50.0;

/// The mean pixel value inside the verification circle must exceed this for a
/// candidate to be accepted as an aggressor spot [ADU].
pub const DEFAULT_SPOT_THRESHOLD: f64 = 30000.0;

/// The number of crosstalk projector positions in a standard run.
pub const DEFAULT_NUM_POSITIONS: usize = 36;

/// The number of aggressor spots expected at each projector position.
pub const DEFAULT_NUM_AGGRESSORS: usize = 4;

/// The number of outlier-rejection iterations done for each crosstalk fit.
pub const DEFAULT_NUM_ITERATIONS: usize = 5;

/// Pixels with residuals further than this many standard deviations from the
/// mean residual are excluded from the next least-squares solve.
pub const DEFAULT_REJECTION_SIGMA: f64 = 2.0;

/// How long a single sensor file may take to be read before the run is
/// abandoned [seconds].
pub const DEFAULT_READ_TIMEOUT_SECONDS: u64 = 300;

/// The header keyword describing the data section of an amplifier image.
pub const DATASEC_KEY: &str = "DATASEC";

/// Default name of the results FITS file.
pub const DEFAULT_RESULTS_FILENAME: &str = "xtalk_results.fits";

/// Default name of the aggressor lookup table.
pub const DEFAULT_LOOKUP_FILENAME: &str = "xtalk_lookup_table.json";

/// Default name of the log file written alongside the results.
pub const DEFAULT_LOG_FILENAME: &str = "xtalk_analysis.log";
