// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Postage stamps around aggressor spots.

use std::ops::Range;

use ndarray::prelude::*;

/// The half-open pixel range of a window of `length` pixels centred on
/// `centre`, clipped to `0..extent`. The upper edge is exclusive of
/// `centre + length / 2` unless that would reach past the image.
fn window(centre: usize, length: usize, extent: usize) -> Range<usize> {
    let half = length / 2;
    let start = centre.saturating_sub(half).min(extent);
    let end = if centre + half >= extent {
        extent
    } else {
        centre + half
    };
    start..end
}

/// Cut a square postage stamp of side `length` centred on (`y`, `x`) out of
/// `image`. Near the image edges the stamp is truncated on the affected sides
/// only; it is never padded or wrapped. The returned stamp owns its data.
pub fn stamp(image: ArrayView2<f64>, y: usize, x: usize, length: usize) -> Array2<f64> {
    let (height, width) = image.dim();
    let rows = window(y, length, height);
    let cols = window(x, length, width);
    image.slice(s![rows, cols]).to_owned()
}
