// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Check the spot finder against a single projector position, without fitting
//! anything.

use clap::Parser;
use log::{debug, info};

use super::common::{display_warnings, InfoPrinter, RaftArgs, SpotArgs};
use crate::{spot::SpotSearch, XtalkError};

#[derive(Parser, Debug, Clone, Default)]
pub(super) struct FindSpotsArgs {
    #[clap(flatten)]
    raft_args: RaftArgs,

    #[clap(flatten)]
    spot_args: SpotArgs,

    /// The projector position to look at.
    #[clap(long, default_value = "0", help_heading = "INPUT DATA")]
    position: usize,
}

impl FindSpotsArgs {
    pub(super) fn run(self, dry_run: bool) -> Result<(), XtalkError> {
        debug!("{:#?}", self);
        let FindSpotsArgs {
            raft_args,
            spot_args,
            position,
        } = self;

        let reader = raft_args.parse()?;
        let spot_finder = spot_args.parse()?;
        let mut printer = InfoPrinter::new(format!("Looking for spots at position {position:03}").into());
        printer.push_block(vec![
            format!("Input directory: {}", reader.input_dir().display()).into(),
            format!("Sensors: {}", reader.layout().sensors().join(", ")).into(),
        ]);
        printer.push_block(vec![
            format!("Smoothing sigma: {} pixels", spot_finder.sigma).into(),
            format!("Spot radius: {} pixels", spot_finder.radius).into(),
            format!("Spot threshold: {} ADU", spot_finder.threshold).into(),
        ]);
        printer.display();
        display_warnings();

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        let stack = reader.read_position(position)?;
        let mut num_found = 0;
        for (amp_index, frame) in stack.frames.outer_iter().enumerate() {
            let (search, mean) = spot_finder.find_with_mean(frame);
            let amp = match reader.layout().amp_id(amp_index) {
                Some(id) => id.to_string(),
                None => format!("amplifier index {amp_index}"),
            };
            match search {
                SpotSearch::Found { y, x } => {
                    num_found += 1;
                    info!("{amp}: Found at (y {y}, x {x}), circle mean {mean:.1}");
                }
                SpotSearch::NotFound => info!("{amp}: NotFound (circle mean {mean:.1})"),
            }
        }
        info!(
            "{num_found} of {} amplifiers have a spot at position {position:03}",
            stack.num_amps()
        );

        Ok(())
    }
}
