// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Miscellaneous things.

use std::{thread, time::Duration};

use crossbeam_channel::{bounded, RecvTimeoutError};

/// Run `func` on its own thread and wait at most `timeout` for its result.
///
/// If the deadline passes, the thread is abandoned (it keeps running until it
/// finishes on its own, but its result is discarded) and
/// [`RecvTimeoutError::Timeout`] is returned. If the thread panics,
/// [`RecvTimeoutError::Disconnected`] is returned.
pub(crate) fn run_with_timeout<F, R>(func: F, timeout: Duration) -> Result<R, RecvTimeoutError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let (tx, rx) = bounded(1);
    thread::spawn(move || {
        // The receiver is gone if we've already timed out; nobody wants the
        // result.
        let _ = tx.send(func());
    });
    rx.recv_timeout(timeout)
}
