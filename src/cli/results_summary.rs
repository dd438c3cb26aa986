// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Print what's in a crosstalk results file.

use std::path::PathBuf;

use clap::Parser;
use log::{debug, warn};

use super::common::{parse_layout, InfoPrinter, AMPS_PER_SENSOR_HELP, SENSORS_HELP};
use crate::{
    constants::DEFAULT_LOOKUP_FILENAME,
    raft::RaftLayout,
    results::{CrosstalkResultGrid, LookupTable},
    XtalkError,
};

#[derive(Parser, Debug)]
pub(super) struct ResultsSummaryArgs {
    /// The crosstalk results FITS file written by `measure`.
    #[clap(name = "RESULTS_FILE", parse(from_os_str))]
    results_file: PathBuf,

    /// The aggressor lookup table. By default, the lookup table next to the
    /// results file is used if it exists.
    #[clap(long, parse(from_os_str))]
    lookup: Option<PathBuf>,

    /// The number of strongest victims to show for each aggressor.
    #[clap(long, default_value = "3")]
    top: usize,

    #[clap(long, multiple_values(true), help = SENSORS_HELP.as_str())]
    sensors: Option<Vec<String>>,

    #[clap(long, help = AMPS_PER_SENSOR_HELP.as_str())]
    amps_per_sensor: Option<usize>,
}

impl ResultsSummaryArgs {
    pub(super) fn run(self) -> Result<(), XtalkError> {
        debug!("{:#?}", self);
        let ResultsSummaryArgs {
            results_file,
            lookup,
            top,
            sensors,
            amps_per_sensor,
        } = self;

        let (grid, metadata) = CrosstalkResultGrid::read_fits(&results_file)?;
        let layout = parse_layout(sensors, amps_per_sensor)?;
        let layout = if layout.num_amps() == grid.num_amps() {
            Some(layout)
        } else {
            warn!(
                "The raft layout has {} amplifiers but the results have {}; amplifiers are shown by index",
                layout.num_amps(),
                grid.num_amps()
            );
            None
        };
        let lookup = match lookup {
            Some(file) => Some(LookupTable::read_json(&file)?),
            None => {
                let file = results_file.with_file_name(DEFAULT_LOOKUP_FILENAME);
                if file.exists() {
                    debug!("Using lookup table {}", file.display());
                    Some(LookupTable::read_json(&file)?)
                } else {
                    None
                }
            }
        };

        let mut printer = InfoPrinter::new(format!("Crosstalk results {}", results_file.display()).into());
        match metadata {
            Some(m) => printer.push_block(vec![
                format!(
                    "{} amplifiers, {} positions, {} aggressors each",
                    grid.num_amps(),
                    m.num_positions,
                    m.num_aggressors
                )
                .into(),
                format!(
                    "Stamp length {}, {} fit iterations",
                    m.stamp_length, m.num_iterations
                )
                .into(),
                format!(
                    "Spots: smoothing {}, radius {}, threshold {}",
                    m.smoothing_sigma, m.spot_radius, m.spot_threshold
                )
                .into(),
            ]),
            None => printer.push_line(
                format!(
                    "{} amplifiers (no measurement settings recorded)",
                    grid.num_amps()
                )
                .into(),
            ),
        }

        let aggressors = grid.processed_aggressors();
        if aggressors.is_empty() {
            warn!("No aggressors were measured in {}", results_file.display());
        }
        for aggressor in aggressors {
            let mut heading = format!("Aggressor {}", amp_label(layout.as_ref(), aggressor));
            if let Some(location) = lookup.as_ref().and_then(|l| l.get(aggressor)) {
                heading.push_str(&format!(
                    " (position {:03}, y {}, x {})",
                    location.position, location.y, location.x
                ));
            }
            let num_failed = grid.num_failed(aggressor);
            if num_failed > 0 {
                heading.push_str(&format!(", {num_failed} failed fits"));
            }

            let mut block = vec![heading.into()];
            for (victim, xtalk) in grid.strongest_victims(aggressor, top) {
                let error = grid.xtalk_error[(aggressor, victim)];
                block.push(
                    format!(
                        "  {}: {xtalk:+.3e} ± {error:.1e}",
                        amp_label(layout.as_ref(), victim)
                    )
                    .into(),
                );
            }
            printer.push_block(block);
        }
        printer.display();

        Ok(())
    }
}

fn amp_label(layout: Option<&RaftLayout>, amp_index: usize) -> String {
    match layout.and_then(|l| l.amp_id(amp_index)) {
        Some(id) => id.to_string(),
        None => format!("index {amp_index}"),
    }
}
