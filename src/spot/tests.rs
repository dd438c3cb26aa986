// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use ndarray::prelude::*;

use super::*;

/// A 300x300 zero image with a 101x101 block of 50000 centred on (150, 150).
fn block_image() -> Array2<f64> {
    let mut image = Array2::zeros((300, 300));
    image.slice_mut(s![100..201, 100..201]).fill(50000.0);
    image
}

#[test]
fn test_block_spot_is_found() {
    let result = find_spot(block_image().view(), 50.0, 30000.0);
    match result {
        SpotSearch::Found { y, x } => {
            assert!((y as isize - 150).abs() <= 3, "y = {y}");
            assert!((x as isize - 150).abs() <= 3, "x = {x}");
        }
        SpotSearch::NotFound => panic!("Expected to find the spot"),
    }
}

#[test]
fn test_sub_threshold_image_has_no_spot() {
    let image = Array2::from_elem((300, 300), 29999.0);
    assert_eq!(find_spot(image.view(), 50.0, 30000.0), SpotSearch::NotFound);

    let (result, mean) = SpotFinder::default().find_with_mean(image.view());
    assert_eq!(result, SpotSearch::NotFound);
    assert!((mean - 29999.0).abs() < 1e-6);
}

#[test]
fn test_hot_pixel_is_not_a_spot() {
    // A single very bright pixel is smoothed away and the circle around it is
    // mostly dark.
    let mut image = Array2::zeros((200, 200));
    image[(50, 60)] = 1e6;
    let finder = SpotFinder {
        sigma: 5.0,
        radius: 10.0,
        threshold: 30000.0,
    };
    assert!(!finder.find(image.view()).is_found());
}

#[test]
fn test_small_spot_with_small_settings() {
    let mut image = Array2::from_elem((60, 40), 10.0);
    image.slice_mut(s![20..31, 5..16]).fill(40000.0);
    let finder = SpotFinder {
        sigma: 3.0,
        radius: 4.0,
        threshold: 30000.0,
    };
    match finder.find(image.view()) {
        SpotSearch::Found { y, x } => {
            assert!((y as isize - 25).abs() <= 1, "y = {y}");
            assert!((x as isize - 10).abs() <= 1, "x = {x}");
        }
        SpotSearch::NotFound => panic!("Expected to find the spot"),
    }
}

#[test]
fn test_all_nan_image_has_no_spot() {
    let image = Array2::from_elem((30, 30), f64::NAN);
    let (result, mean) = SpotFinder::default().find_with_mean(image.view());
    assert_eq!(result, SpotSearch::NotFound);
    assert!(mean.is_nan());
}
