// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Functions to glob files.

use std::path::{Path, PathBuf};

use glob::glob;
use thiserror::Error;

/// Given a glob pattern, get all of the matches from the filesystem, sorted by
/// path.
pub(crate) fn get_all_matches_from_glob(g: &str) -> Result<Vec<PathBuf>, GlobError> {
    let mut entries = vec![];
    for entry in glob(g)? {
        match entry {
            Ok(e) => entries.push(e),
            Err(e) => return Err(GlobError::GlobCrate(e)),
        }
    }
    entries.sort_unstable();
    Ok(entries)
}

/// Get the lexically-first match of a glob pattern, along with how many files
/// matched in total. It is an error for there to be no match.
pub(crate) fn get_first_match_from_glob(g: &str) -> Result<(PathBuf, usize), GlobError> {
    let mut entries = get_all_matches_from_glob(g)?;
    if entries.is_empty() {
        return Err(GlobError::NoMatches {
            glob: g.to_string(),
        });
    }
    let num_matches = entries.len();
    Ok((entries.swap_remove(0), num_matches))
}

/// Build a glob pattern for `file_pattern` inside `dir`. Glob metacharacters in
/// the directory name are escaped.
pub(crate) fn glob_in_dir(dir: &Path, file_pattern: &str) -> String {
    let dir = glob::Pattern::escape(&dir.display().to_string());
    format!("{dir}/{file_pattern}")
}

#[derive(Error, Debug)]
/// Error type associated with glob helper functions.
pub enum GlobError {
    #[error("No glob matches were found for {glob}")]
    NoMatches { glob: String },

    #[error(transparent)]
    GlobCrate(#[from] glob::GlobError),

    #[error(transparent)]
    PatternError(#[from] glob::PatternError),
}
