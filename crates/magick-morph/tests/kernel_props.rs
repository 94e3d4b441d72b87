//! Property tests for the kernel algebra
//!
//! Quantified counterparts of the unit tests: reflection is an
//! involution, full turns are the identity, normalization invariants
//! hold for arbitrary kernels, and parsing never produces an unusable
//! kernel.

use proptest::prelude::*;

use magick_core::EPSILON;
use magick_morph::{KernelList, ScaleFlags};

/// An arbitrary kernel definition string in the sized-array form, with
/// a sprinkling of masked cells.
fn kernel_definition() -> impl Strategy<Value = String> {
    (1usize..=5, 1usize..=5)
        .prop_flat_map(|(width, height)| {
            let cells = prop::collection::vec(
                prop_oneof![
                    8 => (-100i32..=100).prop_map(|v| v.to_string()),
                    1 => Just("nan".to_string()),
                ],
                width * height,
            );
            (Just(width), Just(height), cells)
        })
        .prop_filter_map("at least one unmasked cell", |(width, height, cells)| {
            if cells.iter().all(|c| c == "nan") {
                return None;
            }
            Some(format!("{}x{}:{}", width, height, cells.join(",")))
        })
}

proptest! {
    #[test]
    fn parsed_kernels_are_finite_or_masked(definition in kernel_definition()) {
        let list: KernelList = definition.parse().unwrap();
        let kernel = list.first().unwrap();
        prop_assert!(kernel.finite_count() >= 1);
        for cell in kernel.cells() {
            if let Some(value) = cell {
                prop_assert!(value.is_finite());
            }
        }
    }

    #[test]
    fn reflect_twice_is_identity(definition in kernel_definition()) {
        let list: KernelList = definition.parse().unwrap();
        let back = list.reflected().reflected();
        let (a, b) = (list.first().unwrap(), back.first().unwrap());
        prop_assert!(a.same_values(b));
        prop_assert_eq!(a.origin(), b.origin());
    }

    #[test]
    fn full_turn_is_identity(definition in kernel_definition()) {
        let list: KernelList = definition.parse().unwrap();
        let mut turned = list.clone();
        turned.rotate(360.0);
        prop_assert!(list.first().unwrap().same_values(turned.first().unwrap()));
    }

    #[test]
    fn rotate_180_equals_reflection(definition in kernel_definition()) {
        let list: KernelList = definition.parse().unwrap();
        let mut rotated = list.clone();
        rotated.rotate(180.0);
        let reflected = list.reflected();
        prop_assert!(rotated.first().unwrap().same_values(reflected.first().unwrap()));
    }

    #[test]
    fn normalize_yields_unit_sum(definition in kernel_definition()) {
        let mut list: KernelList = definition.parse().unwrap();
        let kernel = list.first().unwrap();
        let sum = kernel.positive_range() + kernel.negative_range();
        // zero-sum kernels normalize by their positive range instead
        prop_assume!(sum.abs() > EPSILON);
        list.scale(1.0, ScaleFlags::NORMALIZE);
        let kernel = list.first().unwrap();
        let sum = kernel.positive_range() + kernel.negative_range();
        prop_assert!((sum.abs() - 1.0).abs() < 1.0e-9, "sum {}", sum);
    }

    #[test]
    fn correlate_normalize_forces_zero_sum(definition in kernel_definition()) {
        let mut list: KernelList = definition.parse().unwrap();
        let kernel = list.first().unwrap();
        // needs both signs present to be meaningful
        prop_assume!(kernel.positive_range() > EPSILON);
        prop_assume!(kernel.negative_range() < -EPSILON);
        list.scale(1.0, ScaleFlags::CORRELATE_NORMALIZE);
        let kernel = list.first().unwrap();
        let sum = kernel.positive_range() + kernel.negative_range();
        prop_assert!(sum.abs() < 1.0e-9);
        prop_assert!((kernel.positive_range() - 1.0).abs() < 1.0e-9);
    }
}
