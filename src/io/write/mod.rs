// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to handle writing out FITS files.

mod fits;

pub(crate) use fits::{fits_create_with_primary_image, fits_create_image, fits_write_image, fits_write_key};
