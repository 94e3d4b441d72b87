//! Built-in kernel construction
//!
//! Builds the named kernel families from a decoded geometry argument
//! struct: the sampled gaussian family, the well-known 3x3 convolution
//! tables, flat boolean shapes, hit-and-miss template sets, and the
//! distance-measuring kernels.

use std::f64::consts::PI;

use magick_core::{GeometryArgs, GeometryFlags, EPSILON, QUANTUM_RANGE};

use crate::kernel::{Kernel, KernelKind, KernelList, ScaleFlags};
use crate::parse::parse_array;
use crate::{MorphError, MorphResult};

const SQRT2: f64 = std::f64::consts::SQRT_2;
const TWO_PI: f64 = 2.0 * PI;
const SQRT_TWO_PI: f64 = 2.506_628_274_631_000_2;

/// The gaussian curves are generated at three times the final resolution
/// and binned down, which keeps very small sigmas closer to normalized.
const KERNEL_RANK: usize = 3;

/// Fill in the per-family argument defaults that a named kernel string
/// may leave out.
pub(crate) fn apply_named_defaults(kind: KernelKind, args: &mut GeometryArgs) {
    match kind {
        KernelKind::Rectangle => {
            if !args.flags.contains(GeometryFlags::WIDTH) {
                args.rho = args.sigma;
            }
            if args.rho < 1.0 {
                args.rho = 3.0;
            }
            if args.sigma < 1.0 {
                args.sigma = args.rho;
            }
            if !args.flags.contains(GeometryFlags::X) {
                args.xi = ((args.rho as usize).saturating_sub(1) / 2) as f64;
            }
            if !args.flags.contains(GeometryFlags::Y) {
                args.psi = ((args.sigma as usize).saturating_sub(1) / 2) as f64;
            }
        }
        KernelKind::Square
        | KernelKind::Diamond
        | KernelKind::Disk
        | KernelKind::Plus
        | KernelKind::Cross => {
            // a zero scale is valid, so only substitute when absent
            if !args.flags.contains(GeometryFlags::HEIGHT) {
                args.sigma = 1.0;
            }
        }
        KernelKind::Ring => {
            if !args.flags.contains(GeometryFlags::XI) {
                args.xi = 1.0;
            }
        }
        KernelKind::Chebyshev | KernelKind::Manhattan | KernelKind::Euclidean => {
            if !args.flags.contains(GeometryFlags::HEIGHT) {
                args.sigma = 100.0; // default distance scaling
            } else if args.flags.contains(GeometryFlags::ASPECT) {
                args.sigma = QUANTUM_RANGE / (args.sigma + 1.0); // maximum pixel distance
            } else if args.flags.contains(GeometryFlags::PERCENT) {
                args.sigma *= QUANTUM_RANGE / 100.0; // percentage of color range
            }
        }
        _ => {}
    }
}

/// Build a named kernel (or kernel list) from decoded arguments.
pub(crate) fn build(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    match kind {
        KernelKind::User => Err(MorphError::InvalidKernel(
            "user kernels are parsed, not built".to_string(),
        )),
        KernelKind::Unity => from_table(kind, "3:0,0,0,0,1,0,0,0,0"),
        KernelKind::Gaussian | KernelKind::Dog | KernelKind::Log => gaussian_family(kind, args),
        KernelKind::Blur | KernelKind::Dob => blur_family(kind, args),
        KernelKind::Comet => comet(args),
        KernelKind::Laplacian => laplacian(args),
        KernelKind::Sobel => rotated_table(kind, "3: -1,0,1  -2,0,2  -1,0,1", args.rho),
        KernelKind::Roberts => rotated_table(kind, "3: 0,0,0  -1,1,0  0,0,0", args.rho),
        KernelKind::Prewitt => rotated_table(kind, "3: -1,1,1  0,0,0  -1,1,1", args.rho),
        KernelKind::Compass => rotated_table(kind, "3: -1,1,1  -1,-2,1  -1,1,1", args.rho),
        KernelKind::Kirsch => rotated_table(kind, "3: -3,-3,5  -3,0,5  -3,-3,5", args.rho),
        KernelKind::FreiChen => frei_chen(args),
        KernelKind::Diamond => diamond(args),
        KernelKind::Square | KernelKind::Rectangle => square_or_rectangle(kind, args),
        KernelKind::Disk => disk(args),
        KernelKind::Plus | KernelKind::Cross => plus_or_cross(kind, args),
        KernelKind::Ring | KernelKind::Peaks => ring_or_peaks(kind, args),
        KernelKind::Edges => expanded_table(kind, "3: 0,0,0  -,1,-  1,1,1", 90.0),
        KernelKind::Corners => expanded_table(kind, "3: 0,0,-  0,1,1  -,1,-", 90.0),
        KernelKind::Ridges => expanded_table(kind, "3: -,-,-  0,1,0  -,-,-", 45.0),
        KernelKind::LineEnds => two_set_table(
            kind,
            ("3: 0,0,0  0,1,0  -,1,-", 90.0),
            ("3: 0,0,0  0,1,0  0,0,1", 90.0),
        ),
        KernelKind::LineJunctions => two_set_table(
            kind,
            ("3: -,1,-  -,1,-  1,-,1", 45.0),
            ("3: 1,-,-  -,1,-  1,-,1", 90.0),
        ),
        KernelKind::ConvexHull => two_set_table(
            kind,
            ("3: 1,1,-  1,0,-  1,-,0", 90.0),
            ("3: 1,1,1  1,0,0  -,-,0", 90.0),
        ),
        KernelKind::Skeleton => expanded_table(kind, "3: 0,0,-  0,1,1  -,1,1", 45.0),
        KernelKind::Chebyshev | KernelKind::Manhattan | KernelKind::Euclidean => {
            distance(kind, args)
        }
    }
}

/// Parse a literal kernel table and retag it with the built-in kind.
fn from_table(kind: KernelKind, table: &str) -> MorphResult<KernelList> {
    let mut list = parse_array(table)?;
    for kernel in list.kernels.iter_mut() {
        kernel.kind = kind;
    }
    Ok(list)
}

fn rotated_table(kind: KernelKind, table: &str, angle: f64) -> MorphResult<KernelList> {
    let mut list = from_table(kind, table)?;
    list.rotate(angle);
    Ok(list)
}

fn expanded_table(kind: KernelKind, table: &str, step: f64) -> MorphResult<KernelList> {
    let mut list = from_table(kind, table)?;
    list.expand(step);
    Ok(list)
}

/// Two templates, each expanded under rotation, concatenated into one list.
fn two_set_table(
    kind: KernelKind,
    first: (&str, f64),
    second: (&str, f64),
) -> MorphResult<KernelList> {
    let mut list = expanded_table(kind, first.0, first.1)?;
    list.append(expanded_table(kind, second.0, second.1)?);
    Ok(list)
}

/// Sampled 2-D gaussian, difference of gaussians, or laplacian of
/// gaussian. The result is correlate-normalized: zero-summing for the
/// derivative kernels, plain unit-sum for a pure gaussian.
fn gaussian_family(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    let sigma = args.sigma.abs();
    let sigma2 = args.xi.abs();

    let width = if args.rho >= 1.0 {
        (args.rho as usize) * 2 + 1
    } else if kind != KernelKind::Dog || sigma >= sigma2 {
        optimal_width_2d(args.rho, sigma)
    } else {
        optimal_width_2d(args.rho, sigma2)
    };
    let center = (width - 1) / 2;
    let mut kernel = Kernel::alloc(kind, width, width, center, center)?;
    let half = center as i64;

    if kind == KernelKind::Gaussian || kind == KernelKind::Dog {
        if sigma > EPSILON {
            let a = 1.0 / (2.0 * sigma * sigma);
            let b = 1.0 / (TWO_PI * sigma * sigma);
            let mut i = 0;
            for v in -half..=half {
                for u in -half..=half {
                    kernel.values[i] = Some((-((u * u + v * v) as f64) * a).exp() * b);
                    i += 1;
                }
            }
        } else {
            // limiting case: a normalized Dirac delta
            kernel.set_value(center, center, Some(1.0));
        }

        if kind == KernelKind::Dog {
            if sigma2 > EPSILON {
                let a = 1.0 / (2.0 * sigma2 * sigma2);
                let b = 1.0 / (TWO_PI * sigma2 * sigma2);
                let mut i = 0;
                for v in -half..=half {
                    for u in -half..=half {
                        let value = kernel.values[i].unwrap_or(0.0);
                        kernel.values[i] = Some(value - (-((u * u + v * v) as f64) * a).exp() * b);
                        i += 1;
                    }
                }
            } else {
                let origin = center * width + center;
                kernel.values[origin] = Some(kernel.values[origin].unwrap_or(0.0) - 1.0);
            }
        }
    }

    if kind == KernelKind::Log {
        if sigma > EPSILON {
            let a = 1.0 / (2.0 * sigma * sigma);
            let b = 1.0 / (PI * sigma.powi(4));
            let mut i = 0;
            for v in -half..=half {
                for u in -half..=half {
                    let r = ((u * u + v * v) as f64) * a;
                    kernel.values[i] = Some((1.0 - r) * (-r).exp() * b);
                    i += 1;
                }
            }
        } else {
            kernel.set_value(center, center, Some(1.0));
        }
    }

    // The sampled curve may be clipped by a user radius, and tiny sigmas
    // overshoot the centre sample, so normalization is always needed.
    kernel.recompute_meta();
    kernel.scale(1.0, ScaleFlags::CORRELATE_NORMALIZE);
    Ok(KernelList::from(kernel))
}

/// 1-D gaussian blur or difference of blurs, rotated to the given angle.
fn blur_family(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    let sigma = args.sigma.abs();
    let sigma2 = args.xi.abs();

    let width = if args.rho >= 1.0 {
        (args.rho as usize) * 2 + 1
    } else if kind == KernelKind::Blur || sigma >= sigma2 {
        optimal_width_1d(args.rho, sigma)
    } else {
        optimal_width_1d(args.rho, sigma2)
    };
    let center = (width - 1) / 2;
    let mut kernel = Kernel::alloc(kind, width, 1, center, 0)?;

    let v = ((width * KERNEL_RANK - 1) / 2) as i64;
    kernel.values.fill(Some(0.0));
    if sigma > EPSILON {
        let s = sigma * KERNEL_RANK as f64;
        let a = 1.0 / (2.0 * s * s);
        let b = 1.0 / (SQRT_TWO_PI * s);
        for u in -v..=v {
            let bin = ((u + v) as usize) / KERNEL_RANK;
            let value = kernel.values[bin].unwrap_or(0.0);
            kernel.values[bin] = Some(value + (-((u * u) as f64) * a).exp() * b);
        }
    } else {
        kernel.values[center] = Some(1.0);
    }

    if kind == KernelKind::Dob {
        if sigma2 > EPSILON {
            let s = sigma2 * KERNEL_RANK as f64;
            let a = 1.0 / (2.0 * s * s);
            let b = 1.0 / (SQRT_TWO_PI * s);
            for u in -v..=v {
                let bin = ((u + v) as usize) / KERNEL_RANK;
                let value = kernel.values[bin].unwrap_or(0.0);
                kernel.values[bin] = Some(value - (-((u * u) as f64) * a).exp() * b);
            }
        } else {
            let value = kernel.values[center].unwrap_or(0.0);
            kernel.values[center] = Some(value - 1.0);
        }
    }

    kernel.recompute_meta();
    kernel.scale(1.0, ScaleFlags::CORRELATE_NORMALIZE);

    let mut list = KernelList::from(kernel);
    let angle = if kind == KernelKind::Blur {
        args.xi
    } else {
        args.psi
    };
    list.rotate(angle);
    Ok(list)
}

/// Half a 1-D gaussian: blur in one direction only.
fn comet(args: &GeometryArgs) -> MorphResult<KernelList> {
    let sigma = args.sigma.abs();

    let width = if args.rho < 1.0 {
        (optimal_width_1d(args.rho, sigma) - 1) / 2 + 1
    } else {
        args.rho as usize
    };
    let mut kernel = Kernel::alloc(KernelKind::Comet, width, 1, 0, 0)?;

    if sigma > EPSILON {
        let v = width * KERNEL_RANK;
        let s = sigma * KERNEL_RANK as f64;
        let a = 1.0 / (2.0 * s * s);
        for u in 0..v {
            let bin = u / KERNEL_RANK;
            let value = kernel.values[bin].unwrap_or(0.0);
            kernel.values[bin] = Some(value + (-((u * u) as f64) * a).exp());
        }
    } else {
        kernel.values[0] = Some(1.0);
    }

    kernel.recompute_meta();
    kernel.scale(1.0, ScaleFlags::NORMALIZE);

    let mut list = KernelList::from(kernel);
    list.rotate(args.xi);
    Ok(list)
}

/// The discrete laplacian tables, selected by type number.
fn laplacian(args: &GeometryArgs) -> MorphResult<KernelList> {
    let table = match args.rho as i64 {
        1 => "3: 0,-1,0  -1,4,-1  0,-1,0",
        2 => "3: -2,1,-2  1,4,1  -2,1,-2",
        3 => "3: 1,-2,1  -2,4,-2  1,-2,1",
        5 => "5: -4,-1,0,-1,-4  -1,2,3,2,-1  0,3,4,3,0  -1,2,3,2,-1  -4,-1,0,-1,-4",
        7 => "7: -10,-5,-2,-1,-2,-5,-10  -5,0,3,4,3,0,-5  -2,3,6,7,6,3,-2  -1,4,7,8,7,4,-1  -2,3,6,7,6,3,-2  -5,0,3,4,3,0,-5  -10,-5,-2,-1,-2,-5,-10",
        // 5x5 LOG, sigma approximately 1.4
        15 => "5: 0,0,-1,0,0  0,-1,-2,-1,0  -1,-2,16,-2,-1  0,-1,-2,-1,0  0,0,-1,0,0",
        // 9x9 LOG, sigma approximately 1.4
        19 => "9: 0,-1,-1,-2,-2,-2,-1,-1,0  -1,-2,-4,-5,-5,-5,-4,-2,-1  -1,-4,-5,-3,0,-3,-5,-4,-1  -2,-5,-3,12,24,12,-3,-5,-2  -2,-5,0,24,40,24,0,-5,-2  -2,-5,-3,12,24,12,-3,-5,-2  -1,-4,-5,-3,0,-3,-5,-4,-1  -1,-2,-4,-5,-5,-5,-4,-2,-1  0,-1,-1,-2,-2,-2,-1,-1,0",
        _ => "3: -1,-1,-1  -1,8,-1  -1,-1,-1",
    };
    from_table(KernelKind::Laplacian, table)
}

/// The nine Frei-Chen basis kernels. Types 1-4 carry exact square roots
/// of two that the literal tables approximate with 2.
fn frei_chen(args: &GeometryArgs) -> MorphResult<KernelList> {
    let mut list = match args.rho as i64 {
        2 => {
            let mut list = from_table(KernelKind::FreiChen, "3: 1,0,1  2,0,2  1,0,1")?;
            inject_sqrt2(&mut list, &[(3, SQRT2), (5, SQRT2)]);
            list.scale(0.5 * SQRT2, ScaleFlags::NONE);
            list
        }
        3 => {
            let mut list = from_table(KernelKind::FreiChen, "3: 0,-1,2  1,0,-1  -2,1,0")?;
            inject_sqrt2(&mut list, &[(2, SQRT2), (6, -SQRT2)]);
            list.scale(0.5 * SQRT2, ScaleFlags::NONE);
            list
        }
        4 => {
            let mut list = from_table(KernelKind::FreiChen, "3: 2,-1,0  -1,0,1  0,1,-2")?;
            inject_sqrt2(&mut list, &[(0, SQRT2), (8, -SQRT2)]);
            list.scale(0.5 * SQRT2, ScaleFlags::NONE);
            list
        }
        5 => {
            let mut list = from_table(KernelKind::FreiChen, "3: 0,1,0  -1,0,-1  0,1,0")?;
            list.scale(0.5, ScaleFlags::NONE);
            list
        }
        6 => {
            let mut list = from_table(KernelKind::FreiChen, "3: -1,0,1  0,0,0  1,0,-1")?;
            list.scale(0.5, ScaleFlags::NONE);
            list
        }
        7 => {
            let mut list = from_table(KernelKind::FreiChen, "3: 1,-2,1  -2,4,-2  1,-2,1")?;
            list.scale(1.0 / 6.0, ScaleFlags::NONE);
            list
        }
        8 => {
            let mut list = from_table(KernelKind::FreiChen, "3: -2,1,-2  1,4,1  -2,1,-2")?;
            list.scale(1.0 / 6.0, ScaleFlags::NONE);
            list
        }
        9 => {
            let mut list = from_table(KernelKind::FreiChen, "3: 1,1,1  1,1,1  1,1,1")?;
            list.scale(1.0 / 3.0, ScaleFlags::NONE);
            list
        }
        _ => {
            let mut list = from_table(KernelKind::FreiChen, "3: 1,2,1  0,0,0  -1,2,-1")?;
            inject_sqrt2(&mut list, &[(1, SQRT2), (7, -SQRT2)]);
            list.scale(0.5 * SQRT2, ScaleFlags::NONE);
            list
        }
    };
    list.rotate(args.sigma);
    Ok(list)
}

fn inject_sqrt2(list: &mut KernelList, cells: &[(usize, f64)]) {
    for kernel in list.kernels.iter_mut() {
        for &(index, value) in cells {
            kernel.values[index] = Some(value);
        }
        kernel.recompute_meta();
    }
}

fn diamond(args: &GeometryArgs) -> MorphResult<KernelList> {
    let radius = if args.rho < 1.0 { 1 } else { args.rho as usize };
    let width = radius * 2 + 1;
    let mut kernel = Kernel::alloc(KernelKind::Diamond, width, width, radius, radius)?;
    shape_fill(&mut kernel, args.sigma, |u, v| {
        u.abs() + v.abs() <= radius as i64
    });
    Ok(KernelList::from(kernel))
}

fn square_or_rectangle(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    let (width, height, x, y, scale) = if kind == KernelKind::Square {
        let radius = if args.rho < 1.0 { 1 } else { args.rho as usize };
        (radius * 2 + 1, radius * 2 + 1, radius, radius, args.sigma)
    } else {
        if args.rho < 1.0 || args.sigma < 1.0 {
            return Err(MorphError::InvalidKernel(
                "rectangle kernel needs a width and height".to_string(),
            ));
        }
        if args.xi < 0.0 || args.psi < 0.0 {
            return Err(MorphError::InvalidKernel(
                "rectangle kernel origin must not be negative".to_string(),
            ));
        }
        (
            args.rho as usize,
            args.sigma as usize,
            args.xi as usize,
            args.psi as usize,
            1.0,
        )
    };
    let mut kernel = Kernel::alloc(kind, width, height, x, y)?;
    shape_fill(&mut kernel, scale, |_, _| true);
    Ok(KernelList::from(kernel))
}

fn disk(args: &GeometryArgs) -> MorphResult<KernelList> {
    let (width, limit) = if args.rho < 0.1 {
        (7, 10) // default radius, approximately 3.5
    } else {
        (
            (args.rho as usize) * 2 + 1,
            (args.rho * args.rho) as i64,
        )
    };
    let center = (width - 1) / 2;
    let mut kernel = Kernel::alloc(KernelKind::Disk, width, width, center, center)?;
    shape_fill(&mut kernel, args.sigma, |u, v| u * u + v * v <= limit);
    Ok(KernelList::from(kernel))
}

fn plus_or_cross(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    let radius = if args.rho < 1.0 { 2 } else { args.rho as usize };
    let width = radius * 2 + 1;
    let mut kernel = Kernel::alloc(kind, width, width, radius, radius)?;
    if kind == KernelKind::Plus {
        shape_fill(&mut kernel, args.sigma, |u, v| u == 0 || v == 0);
    } else {
        shape_fill(&mut kernel, args.sigma, |u, v| u == v || u == -v);
    }
    Ok(KernelList::from(kernel))
}

fn ring_or_peaks(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    let (mut width, mut limit1, mut limit2) = if args.rho < args.sigma {
        (
            (args.sigma as usize) * 2 + 1,
            (args.rho * args.rho) as i64,
            (args.sigma * args.sigma) as i64,
        )
    } else {
        (
            (args.rho as usize) * 2 + 1,
            (args.sigma * args.sigma) as i64,
            (args.rho * args.rho) as i64,
        )
    };
    if limit2 <= 0 {
        // default ring: the edge pixels of the default disk
        width = 7;
        limit1 = 7;
        limit2 = 11;
    }
    let center = (width - 1) / 2;
    let mut kernel = Kernel::alloc(kind, width, width, center, center)?;

    let scale = if kind == KernelKind::Peaks { 0.0 } else { args.xi };
    shape_fill(&mut kernel, scale, |u, v| {
        let r = u * u + v * v;
        limit1 < r && r <= limit2
    });
    if kind == KernelKind::Peaks {
        // a peak is a point standing above the surrounding ring
        kernel.set_value(center, center, Some(1.0));
        kernel.recompute_meta();
    }
    Ok(KernelList::from(kernel))
}

/// Flat-shape helper: cells inside the shape get `scale`, the rest are
/// masked; metadata is rebuilt afterwards.
fn shape_fill<F>(kernel: &mut Kernel, scale: f64, inside: F)
where
    F: Fn(i64, i64) -> bool,
{
    let (cx, cy) = (kernel.x as i64, kernel.y as i64);
    let width = kernel.width;
    for (i, cell) in kernel.values.iter_mut().enumerate() {
        let u = (i % width) as i64 - cx;
        let v = (i / width) as i64 - cy;
        *cell = if inside(u, v) { Some(scale) } else { None };
    }
    kernel.recompute_meta();
}

/// Distance kernels: each cell is the metric distance from the origin,
/// scaled. Only useful with the Distance morphology primitive.
fn distance(kind: KernelKind, args: &GeometryArgs) -> MorphResult<KernelList> {
    let radius = if args.rho < 1.0 { 1 } else { args.rho as usize };
    let width = radius * 2 + 1;
    let mut kernel = Kernel::alloc(kind, width, width, radius, radius)?;
    let scale = args.sigma;
    let (cx, cy) = (radius as i64, radius as i64);
    for (i, cell) in kernel.values.iter_mut().enumerate() {
        let u = (i % width) as i64 - cx;
        let v = (i / width) as i64 - cy;
        let d = match kind {
            KernelKind::Chebyshev => u.abs().max(v.abs()) as f64,
            KernelKind::Manhattan => (u.abs() + v.abs()) as f64,
            _ => ((u * u + v * v) as f64).sqrt(),
        };
        *cell = Some(scale * d);
    }
    kernel.recompute_meta();
    Ok(KernelList::from(kernel))
}

/// Smallest odd width for a sampled 1-D gaussian whose clipped tail
/// quantises to zero. An explicit radius short-circuits the search.
fn optimal_width_1d(radius: f64, sigma: f64) -> usize {
    if radius > EPSILON {
        return 2 * (radius.ceil() as usize) + 1;
    }
    let sigma = sigma.abs();
    if sigma == 0.0 {
        return 1;
    }
    let mut width = 5usize;
    loop {
        let half = (width / 2) as i64;
        let mut normalize = 0.0;
        for u in -half..=half {
            normalize += (-((u * u) as f64) / (2.0 * sigma * sigma)).exp() / (SQRT_TWO_PI * sigma);
        }
        let edge = (-((half * half) as f64) / (2.0 * sigma * sigma)).exp()
            / (SQRT_TWO_PI * sigma)
            / normalize;
        if (QUANTUM_RANGE * edge) as i64 <= 0 {
            break;
        }
        width += 2;
    }
    width - 2
}

/// 2-D counterpart of [`optimal_width_1d`].
fn optimal_width_2d(radius: f64, sigma: f64) -> usize {
    if radius > EPSILON {
        return 2 * (radius.ceil() as usize) + 1;
    }
    let sigma = sigma.abs();
    if sigma == 0.0 {
        return 1;
    }
    let mut width = 5usize;
    loop {
        let half = (width / 2) as i64;
        let mut normalize = 0.0;
        for v in -half..=half {
            for u in -half..=half {
                normalize += (-((u * u + v * v) as f64) / (2.0 * sigma * sigma)).exp()
                    / (TWO_PI * sigma * sigma);
            }
        }
        let edge = (-((half * half) as f64) / (2.0 * sigma * sigma)).exp()
            / (TWO_PI * sigma * sigma)
            / normalize;
        if (QUANTUM_RANGE * edge) as i64 <= 0 {
            break;
        }
        width += 2;
    }
    width - 2
}
