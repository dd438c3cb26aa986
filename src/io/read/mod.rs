// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Code to read raft frames out of FITS files.

mod datasec;
mod error;
pub(crate) mod fits;
mod raft;

pub(crate) use datasec::{DataSection, DataSectionError};
pub(crate) use error::RaftReadError;
pub(crate) use raft::{RaftReader, RaftStack};
