//! Kernel construction regression test
//!
//! Exercises the kernel definition grammar, the built-in generators, and
//! the scaling transforms against known values.
//!
//! Run with:
//! ```
//! cargo test -p magick-morph --test kernel_reg
//! ```

use magick_core::EPSILON;
use magick_morph::{KernelKind, KernelList, ScaleFlags};

#[test]
fn old_style_sobel_array() {
    // a bare list of nine numbers forms a 3x3 with a centred origin
    let list: KernelList = "1,0,-1,2,0,-2,1,0,-1".parse().unwrap();
    assert_eq!(list.len(), 1);
    let kernel = list.first().unwrap();
    assert_eq!((kernel.width(), kernel.height()), (3, 3));
    assert_eq!(kernel.origin(), (1, 1));
    let expected = [1.0, 0.0, -1.0, 2.0, 0.0, -2.0, 1.0, 0.0, -1.0];
    for (cell, want) in kernel.cells().iter().zip(expected) {
        assert_eq!(*cell, Some(want));
    }
    assert_eq!(kernel.positive_range(), 4.0);
    assert_eq!(kernel.negative_range(), -4.0);
    assert_eq!(kernel.minimum(), -2.0);
    assert_eq!(kernel.maximum(), 2.0);
}

#[test]
fn sized_array_with_masked_cells() {
    let list: KernelList = "3x3+1+1:1,nan,1, -,1,-, 1,nan,1".parse().unwrap();
    let kernel = list.first().unwrap();
    assert_eq!(kernel.origin(), (1, 1));
    assert_eq!(kernel.finite_count(), 5);
    let sum = kernel.positive_range() + kernel.negative_range();
    assert!((sum - 5.0).abs() < EPSILON);
    assert_eq!(kernel.minimum(), 1.0);
    assert_eq!(kernel.maximum(), 1.0);
}

#[test]
fn gaussian_unit_sigma() {
    let list: KernelList = "Gaussian:0x1".parse().unwrap();
    let kernel = list.first().unwrap();
    assert_eq!(kernel.kind(), KernelKind::Gaussian);
    // automatic sizing picks at least a 5-wide odd kernel
    assert!(kernel.width() >= 5);
    assert_eq!(kernel.width() % 2, 1);
    // correlate-normalization leaves a unit-sum kernel
    let sum = kernel.positive_range() + kernel.negative_range();
    assert!((sum - 1.0).abs() < EPSILON);
    let total: f64 = kernel.cells().iter().map(|c| c.unwrap()).sum();
    assert!((total - 1.0).abs() < 1.0e-9);
}

#[test]
fn parse_failure_destroys_whole_list() {
    // the third kernel is broken, so nothing is returned
    let result = "Unity;Square:1;3x3:1,2".parse::<KernelList>();
    let err = result.unwrap_err();
    assert!(err.to_string().contains("#2"));
}

#[test]
fn scale_then_unity_add() {
    // the convolve:scale form "50%,100%" halves the kernel and adds a
    // full-strength unity kernel
    let mut list: KernelList = "Unity".parse().unwrap();
    list.scale_geometry("50%,100%").unwrap();
    let kernel = list.first().unwrap();
    assert!((kernel.value(1, 1).unwrap() - 1.5).abs() < EPSILON);
}

#[test]
fn scale_doubles_ranges() {
    let mut list: KernelList = "Gaussian:0x1".parse().unwrap();
    let before = list.first().unwrap().positive_range();
    list.scale(2.0, ScaleFlags::NONE);
    let after = list.first().unwrap().positive_range();
    assert!((after - 2.0 * before).abs() < EPSILON);
}

#[test]
fn expanded_lists_carry_angles() {
    let list: KernelList = "LineEnds".parse().unwrap();
    assert_eq!(list.len(), 8);
    let angles: Vec<f64> = list.iter().take(4).map(|k| k.angle()).collect();
    assert_eq!(angles, [0.0, 90.0, 180.0, 270.0]);
}

#[test]
fn show_kernel_format() {
    let list: KernelList = "3x3:1,nan,1 0,1,0 1,-,1".parse().unwrap();
    let shown = list.to_string();
    assert!(shown.starts_with("Kernel \"User\" of size 3x3+1+1"));
    assert!(shown.contains("Forming a output range"));
    assert!(shown.contains("nan"));
    // a multi-kernel list numbers its members
    let list: KernelList = "Unity;Unity".parse().unwrap();
    let shown = list.to_string();
    assert!(shown.contains("Kernel #0"));
    assert!(shown.contains("Kernel #1"));
}

#[test]
fn zero_nans_unmasks_everything() {
    let mut list: KernelList = "Diamond".parse().unwrap();
    assert!(list.first().unwrap().finite_count() < 9);
    list.zero_nans();
    assert_eq!(list.first().unwrap().finite_count(), 9);
    assert_eq!(list.first().unwrap().value(0, 0), Some(0.0));
}

#[test]
fn reflected_list_restores_on_second_reflection() {
    let list: KernelList = "Comet:4x1".parse().unwrap();
    let back = list.reflected().reflected();
    let (a, b) = (list.first().unwrap(), back.first().unwrap());
    assert!(a.same_values(b));
    assert_eq!(a.origin(), b.origin());
}
