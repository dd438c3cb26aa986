// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Some helper mathematics for image arrays.
//!
//! Masks follow the convention of the rest of the crate: `true` means the pixel
//! is *excluded*.


use ndarray::{prelude::*, Zip};

use crate::constants::GAUSSIAN_TRUNCATE;

/// A normalised, one-dimensional Gaussian kernel extending out to
/// `truncate` standard deviations on either side of its centre.
pub(crate) fn gaussian_kernel_1d(sigma: f64, truncate: f64) -> Vec<f64> {
    let radius = (truncate * sigma + 0.5) as isize;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|i| (-((i * i) as f64) / two_sigma_sq).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    kernel.iter_mut().for_each(|k| *k /= sum);
    kernel
}

/// Map an out-of-range index back into `0..n` by mirroring about the array
/// edges, including the edge pixel (`d c b a | a b c d | d c b a`).
#[inline]
pub(crate) fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

/// Correlate a single lane of pixels with a symmetric kernel, reflecting at
/// the ends of the lane.
fn correlate_lane(input: ArrayView1<f64>, mut output: ArrayViewMut1<f64>, kernel: &[f64]) {
    let n = input.len();
    let radius = kernel.len() / 2;
    let padded: Vec<f64> = (0..n + 2 * radius)
        .map(|i| input[reflect_index(i as isize - radius as isize, n)])
        .collect();
    for (j, out) in output.iter_mut().enumerate() {
        *out = padded[j..j + kernel.len()]
            .iter()
            .zip(kernel)
            .map(|(p, k)| p * k)
            .sum();
    }
}

/// Smooth an image with a Gaussian of standard deviation `sigma` [pixels]. The
/// filter is applied separably along rows and then columns; image edges are
/// handled by reflection. A non-positive `sigma` returns an unsmoothed copy.
pub(crate) fn gaussian_filter(image: ArrayView2<f64>, sigma: f64) -> Array2<f64> {
    if !(sigma > 0.0) || image.is_empty() {
        return image.to_owned();
    }
    let kernel = gaussian_kernel_1d(sigma, GAUSSIAN_TRUNCATE);

    let mut along_x = Array2::zeros(image.raw_dim());
    Zip::from(along_x.lanes_mut(Axis(1)))
        .and(image.lanes(Axis(1)))
        .par_for_each(|out, inp| correlate_lane(inp, out, &kernel));

    let mut smoothed = Array2::zeros(image.raw_dim());
    Zip::from(smoothed.lanes_mut(Axis(0)))
        .and(along_x.lanes(Axis(0)))
        .par_for_each(|out, inp| correlate_lane(inp, out, &kernel));

    smoothed
}

/// The (row, column) of the largest value in the image. NaNs are ignored; the
/// first occurrence wins ties. `None` if there are no non-NaN values.
pub(crate) fn nan_argmax(image: ArrayView2<f64>) -> Option<(usize, usize)> {
    let mut best: Option<((usize, usize), f64)> = None;
    for (pos, &v) in image.indexed_iter() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => (),
            _ => best = Some((pos, v)),
        }
    }
    best.map(|(pos, _)| pos)
}

/// The mean of the pixels strictly within `radius` of (`y`, `x`). NaN if there
/// are no such pixels; a NaN pixel inside the circle also propagates.
pub(crate) fn mean_in_circle(image: ArrayView2<f64>, y: usize, x: usize, radius: f64) -> f64 {
    let (height, width) = image.dim();
    let r_sq = radius * radius;
    // Only the bounding box of the circle needs to be visited.
    let reach = radius.max(0.0).ceil() as usize;
    let y0 = y.saturating_sub(reach);
    let x0 = x.saturating_sub(reach);
    let y1 = (y + reach + 1).min(height);
    let x1 = (x + reach + 1).min(width);
    if y0 >= y1 || x0 >= x1 {
        return f64::NAN;
    }
    let (sum, count) = image
        .slice(s![y0..y1, x0..x1])
        .indexed_iter()
        .filter(|((iy, ix), _)| {
            let dy = (y0 + *iy) as f64 - y as f64;
            let dx = (x0 + *ix) as f64 - x as f64;
            dy * dy + dx * dx < r_sq
        })
        .fold((0.0, 0usize), |(sum, count), (_, &v)| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// The mean and population standard deviation of the unmasked values. `None`
/// if every value is masked.
pub(crate) fn masked_mean_std(
    values: ArrayView2<f64>,
    mask: ArrayView2<bool>,
) -> Option<(f64, f64)> {
    let mut count = 0usize;
    let mut sum = 0.0;
    Zip::from(values).and(mask).for_each(|&v, &m| {
        if !m {
            count += 1;
            sum += v;
        }
    });
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;

    let mut sum_sq = 0.0;
    Zip::from(values).and(mask).for_each(|&v, &m| {
        if !m {
            sum_sq += (v - mean) * (v - mean);
        }
    });
    Some((mean, (sum_sq / count as f64).sqrt()))
}
