// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pretty printers for reporting information.
//!
//! Both printers draw a small tree: a bold title, then blocks of lines. The
//! first line of each block gets a branch symbol.

use std::{borrow::Cow, sync::Mutex};

use log::Level;

const VERTICAL: char = '│';
const UP_AND_RIGHT: char = '└';
const VERTICAL_AND_RIGHT: char = '├';

lazy_static::lazy_static! {
    static ref WARNINGS: Mutex<Blocks> = Mutex::new(Blocks::default());
}

#[derive(Default)]
struct Blocks(Vec<Vec<Cow<'static, str>>>);

impl Blocks {
    fn log(&self, level: Level, title: &str) {
        log::log!(level, "{}", console::style(title).bold());
        let num_blocks = self.0.len();
        for (i_block, block) in self.0.iter().enumerate() {
            let last_block = i_block + 1 == num_blocks;
            for (i_line, line) in block.iter().enumerate() {
                let symbol = match (i_line, last_block && i_line + 1 == block.len()) {
                    (0, true) => UP_AND_RIGHT,
                    (0, false) => VERTICAL_AND_RIGHT,
                    _ => VERTICAL,
                };
                log::log!(level, "{symbol} {line}");
            }
        }
        log::log!(level, "");
    }
}

/// Collects lines describing what's about to happen, then logs them at info
/// level.
pub(in crate::cli) struct InfoPrinter {
    title: Cow<'static, str>,
    blocks: Blocks,
}

impl InfoPrinter {
    pub(in crate::cli) fn new(title: Cow<'static, str>) -> Self {
        Self {
            title,
            blocks: Blocks::default(),
        }
    }

    pub(in crate::cli) fn push_line(&mut self, line: Cow<'static, str>) {
        self.blocks.0.push(vec![line]);
    }

    pub(in crate::cli) fn push_block(&mut self, block: Vec<Cow<'static, str>>) {
        self.blocks.0.push(block);
    }

    pub(in crate::cli) fn display(self) {
        self.blocks.log(Level::Info, &self.title);
    }
}

/// Things that aren't worth stopping for, but the user should know about.
/// Warnings are held until [`display_warnings`] is called.
pub(in crate::cli) trait Warn {
    fn warn(self);
}

impl Warn for &'static str {
    fn warn(self) {
        Cow::from(self).warn();
    }
}

impl Warn for String {
    fn warn(self) {
        Cow::from(self).warn();
    }
}

impl Warn for Cow<'static, str> {
    fn warn(self) {
        vec![self].warn();
    }
}

impl Warn for Vec<Cow<'static, str>> {
    fn warn(self) {
        if let Ok(mut warnings) = WARNINGS.lock() {
            warnings.0.push(self);
        }
    }
}

/// Print out any warnings that have been collected as CLI arguments have been
/// parsed, then forget them.
pub(in crate::cli) fn display_warnings() {
    log::debug!("Displaying warnings");
    if let Ok(mut warnings) = WARNINGS.lock() {
        if !warnings.0.is_empty() {
            warnings.log(Level::Warn, "Warnings");
            warnings.0.clear();
        }
    }
}
