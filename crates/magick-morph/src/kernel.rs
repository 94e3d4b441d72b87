//! Kernel representation and transforms
//!
//! A [`Kernel`] is a rectangular grid of optional weights with an origin
//! and cached range metadata. A masked ("don't care") cell is `None`; its
//! textual form is `nan` or `-`. A [`KernelList`] is an ordered sequence
//! of kernels applied together by the morphology dispatcher; rotation
//! expansion appends to the list, reflection maps over it.
//!
//! Metadata (`minimum`, `maximum`, `positive_range`, `negative_range`)
//! must be correct before [`Kernel::scale`] is used for normalization;
//! every transform here maintains that.

use std::fmt;

use magick_core::{GeometryFlags, EPSILON};

use crate::{MorphError, MorphResult};

/// The conceptual family a kernel was built from.
///
/// The family governs which rotations are worth performing: radially
/// symmetric kernels ignore rotation entirely, flat square-symmetric
/// shapes ignore orthogonal rotation, and linear kernels reduce 180-degree
/// rotations to the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KernelKind {
    /// Parsed from an explicit user array
    #[default]
    User,
    Unity,
    Gaussian,
    Dog,
    Log,
    Blur,
    Dob,
    Comet,
    Laplacian,
    Sobel,
    Roberts,
    Prewitt,
    Compass,
    Kirsch,
    FreiChen,
    Diamond,
    Square,
    Rectangle,
    Disk,
    Plus,
    Cross,
    Ring,
    Peaks,
    Edges,
    Corners,
    Ridges,
    LineEnds,
    LineJunctions,
    ConvexHull,
    Skeleton,
    Chebyshev,
    Manhattan,
    Euclidean,
}

impl KernelKind {
    /// Resolve a built-in kernel name, case-insensitively. User-defined
    /// kernels have no name and cannot be resolved here.
    pub fn parse(name: &str) -> Option<KernelKind> {
        match name.to_ascii_lowercase().as_str() {
            "unity" => Some(KernelKind::Unity),
            "gaussian" => Some(KernelKind::Gaussian),
            "dog" => Some(KernelKind::Dog),
            "log" => Some(KernelKind::Log),
            "blur" => Some(KernelKind::Blur),
            "dob" => Some(KernelKind::Dob),
            "comet" => Some(KernelKind::Comet),
            "laplacian" => Some(KernelKind::Laplacian),
            "sobel" => Some(KernelKind::Sobel),
            "roberts" => Some(KernelKind::Roberts),
            "prewitt" => Some(KernelKind::Prewitt),
            "compass" => Some(KernelKind::Compass),
            "kirsch" => Some(KernelKind::Kirsch),
            "freichen" => Some(KernelKind::FreiChen),
            "diamond" => Some(KernelKind::Diamond),
            "square" => Some(KernelKind::Square),
            "rectangle" => Some(KernelKind::Rectangle),
            "disk" => Some(KernelKind::Disk),
            "plus" => Some(KernelKind::Plus),
            "cross" => Some(KernelKind::Cross),
            "ring" => Some(KernelKind::Ring),
            "peaks" => Some(KernelKind::Peaks),
            "edges" => Some(KernelKind::Edges),
            "corners" => Some(KernelKind::Corners),
            "ridges" => Some(KernelKind::Ridges),
            "lineends" => Some(KernelKind::LineEnds),
            "linejunctions" => Some(KernelKind::LineJunctions),
            "convexhull" => Some(KernelKind::ConvexHull),
            "skeleton" => Some(KernelKind::Skeleton),
            "chebyshev" => Some(KernelKind::Chebyshev),
            // the historical spelling is accepted
            "manhattan" | "manhatten" => Some(KernelKind::Manhattan),
            "euclidean" => Some(KernelKind::Euclidean),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            KernelKind::User => "User",
            KernelKind::Unity => "Unity",
            KernelKind::Gaussian => "Gaussian",
            KernelKind::Dog => "DOG",
            KernelKind::Log => "LOG",
            KernelKind::Blur => "Blur",
            KernelKind::Dob => "DOB",
            KernelKind::Comet => "Comet",
            KernelKind::Laplacian => "Laplacian",
            KernelKind::Sobel => "Sobel",
            KernelKind::Roberts => "Roberts",
            KernelKind::Prewitt => "Prewitt",
            KernelKind::Compass => "Compass",
            KernelKind::Kirsch => "Kirsch",
            KernelKind::FreiChen => "FreiChen",
            KernelKind::Diamond => "Diamond",
            KernelKind::Square => "Square",
            KernelKind::Rectangle => "Rectangle",
            KernelKind::Disk => "Disk",
            KernelKind::Plus => "Plus",
            KernelKind::Cross => "Cross",
            KernelKind::Ring => "Ring",
            KernelKind::Peaks => "Peaks",
            KernelKind::Edges => "Edges",
            KernelKind::Corners => "Corners",
            KernelKind::Ridges => "Ridges",
            KernelKind::LineEnds => "LineEnds",
            KernelKind::LineJunctions => "LineJunctions",
            KernelKind::ConvexHull => "ConvexHull",
            KernelKind::Skeleton => "Skeleton",
            KernelKind::Chebyshev => "Chebyshev",
            KernelKind::Manhattan => "Manhattan",
            KernelKind::Euclidean => "Euclidean",
        }
    }
}

/// Normalization selection for [`Kernel::scale`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScaleFlags(u8);

impl ScaleFlags {
    pub const NONE: ScaleFlags = ScaleFlags(0);
    /// Divide by the kernel sum (or by the positive range for zero-sum
    /// kernels) before scaling
    pub const NORMALIZE: ScaleFlags = ScaleFlags(0x1);
    /// Scale positive and negative cells independently, forcing a
    /// zero-sum kernel
    pub const CORRELATE_NORMALIZE: ScaleFlags = ScaleFlags(0x2);
    /// The scaling factor is a percentage
    pub const PERCENT: ScaleFlags = ScaleFlags(0x4);

    #[inline]
    pub fn contains(self, other: ScaleFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// The geometry modifier characters map directly onto normalization
    /// selections: `!` normalizes, `^` correlate-normalizes, `%` marks a
    /// percentage factor.
    pub fn from_geometry(flags: GeometryFlags) -> ScaleFlags {
        let mut out = ScaleFlags::NONE;
        if flags.contains(GeometryFlags::ASPECT) {
            out.0 |= ScaleFlags::NORMALIZE.0;
        }
        if flags.contains(GeometryFlags::MINIMUM) {
            out.0 |= ScaleFlags::CORRELATE_NORMALIZE.0;
        }
        if flags.contains(GeometryFlags::PERCENT) {
            out.0 |= ScaleFlags::PERCENT.0;
        }
        out
    }
}

/// A single convolution/morphology kernel
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    pub(crate) kind: KernelKind,
    pub(crate) width: usize,
    pub(crate) height: usize,
    /// Origin column within the grid; always < width
    pub(crate) x: usize,
    /// Origin row within the grid; always < height
    pub(crate) y: usize,
    /// Row-major weights; `None` is a masked cell
    pub(crate) values: Vec<Option<f64>>,
    pub(crate) minimum: f64,
    pub(crate) maximum: f64,
    pub(crate) positive_range: f64,
    pub(crate) negative_range: f64,
    /// Cumulative rotation applied since construction, degrees in [0, 360)
    pub(crate) angle: f64,
}

impl Kernel {
    /// Allocate a kernel of the given extent with all cells zero.
    pub(crate) fn alloc(
        kind: KernelKind,
        width: usize,
        height: usize,
        x: usize,
        y: usize,
    ) -> MorphResult<Kernel> {
        if width == 0 || height == 0 {
            return Err(MorphError::InvalidKernel(format!(
                "{}x{} kernel",
                width, height
            )));
        }
        if x >= width || y >= height {
            return Err(MorphError::InvalidKernel(format!(
                "origin +{}+{} outside {}x{} kernel",
                x, y, width, height
            )));
        }
        Ok(Kernel {
            kind,
            width,
            height,
            x,
            y,
            values: vec![Some(0.0); width * height],
            minimum: 0.0,
            maximum: 0.0,
            positive_range: 0.0,
            negative_range: 0.0,
            angle: 0.0,
        })
    }

    #[inline]
    pub fn kind(&self) -> KernelKind {
        self.kind
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Origin cell coordinates (column, row)
    #[inline]
    pub fn origin(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    #[inline]
    pub fn angle(&self) -> f64 {
        self.angle
    }

    #[inline]
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    #[inline]
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    /// Sum of the strictly positive cells
    #[inline]
    pub fn positive_range(&self) -> f64 {
        self.positive_range
    }

    /// Sum of the strictly negative cells (non-positive)
    #[inline]
    pub fn negative_range(&self) -> f64 {
        self.negative_range
    }

    /// Row-major cell weights; `None` is a masked cell
    #[inline]
    pub fn cells(&self) -> &[Option<f64>] {
        &self.values
    }

    /// The weight at (x, y), or `None` if the cell is masked or the
    /// coordinates fall outside the grid
    #[inline]
    pub fn value(&self, x: usize, y: usize) -> Option<f64> {
        if x < self.width && y < self.height {
            self.values[y * self.width + x]
        } else {
            None
        }
    }

    pub(crate) fn set_value(&mut self, x: usize, y: usize, value: Option<f64>) {
        if x < self.width && y < self.height {
            self.values[y * self.width + x] = value;
        }
    }

    /// Number of unmasked cells
    pub fn finite_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    /// Rescan the cell values and rebuild the range metadata.
    ///
    /// Near-zero weights are clamped to exact zero first. Zero cells count
    /// toward the sums; masked cells contribute nothing anywhere. The
    /// extrema are taken over the cells actually present.
    pub fn recompute_meta(&mut self) {
        self.minimum = f64::INFINITY;
        self.maximum = f64::NEG_INFINITY;
        self.positive_range = 0.0;
        self.negative_range = 0.0;
        for cell in self.values.iter_mut() {
            if let Some(v) = cell {
                if v.abs() < EPSILON {
                    *v = 0.0;
                }
                if *v < 0.0 {
                    self.negative_range += *v;
                } else {
                    self.positive_range += *v;
                }
                self.minimum = self.minimum.min(*v);
                self.maximum = self.maximum.max(*v);
            }
        }
        if !self.minimum.is_finite() {
            self.minimum = 0.0;
            self.maximum = 0.0;
        }
    }

    /// Normalize (per `flags`) and then multiply every unmasked cell by
    /// `factor`, keeping the metadata consistent. A negative factor swaps
    /// the positive/negative ranges and the extrema afterwards.
    pub fn scale(&mut self, factor: f64, flags: ScaleFlags) {
        let factor = if flags.contains(ScaleFlags::PERCENT) {
            factor * 0.01
        } else {
            factor
        };

        let mut pos_scale = 1.0;
        if flags.contains(ScaleFlags::NORMALIZE) {
            let sum = self.positive_range + self.negative_range;
            pos_scale = if sum.abs() > EPSILON {
                sum.abs()
            } else if self.positive_range > EPSILON {
                // zero-summing kernel
                self.positive_range
            } else {
                1.0
            };
        }
        let mut neg_scale = pos_scale;
        if flags.contains(ScaleFlags::CORRELATE_NORMALIZE) {
            pos_scale = if self.positive_range.abs() > EPSILON {
                self.positive_range
            } else {
                1.0
            };
            neg_scale = if self.negative_range.abs() > EPSILON {
                -self.negative_range
            } else {
                1.0
            };
        }

        let pos_scale = factor / pos_scale;
        let neg_scale = factor / neg_scale;

        for cell in self.values.iter_mut() {
            if let Some(v) = cell {
                *v *= if *v >= 0.0 { pos_scale } else { neg_scale };
            }
        }

        self.positive_range *= pos_scale;
        self.negative_range *= neg_scale;
        self.maximum *= if self.maximum >= 0.0 { pos_scale } else { neg_scale };
        self.minimum *= if self.minimum >= 0.0 { pos_scale } else { neg_scale };

        if factor < 0.0 {
            std::mem::swap(&mut self.positive_range, &mut self.negative_range);
            std::mem::swap(&mut self.minimum, &mut self.maximum);
        }
    }

    /// Add `scale` to the origin cell and rebuild the metadata. Applied to
    /// an already normalized kernel this blends that fraction of the
    /// original image into the convolution output.
    pub fn unity_add(&mut self, scale: f64) {
        let origin = self.y * self.width + self.x;
        self.values[origin] = Some(self.values[origin].unwrap_or(0.0) + scale);
        self.recompute_meta();
    }

    /// Replace every masked cell with an explicit zero weight.
    pub fn zero_nans(&mut self) {
        for cell in self.values.iter_mut() {
            if cell.is_none() {
                *cell = Some(0.0);
            }
        }
    }

    /// Rotate 180 degrees: reverse the cell array and flip the origin.
    pub fn reflect(&mut self) {
        self.values.reverse();
        self.x = self.width - self.x - 1;
        self.y = self.height - self.y - 1;
        self.angle = (self.angle + 180.0) % 360.0;
    }

    /// Rotate the kernel by the given angle.
    ///
    /// Only 90-degree steps (1-D and square kernels) and 45-degree steps
    /// (3x3 kernels) are supported; rotations that are no-ops for the
    /// kernel's family are skipped. An unsupported request leaves the
    /// kernel unchanged and logs a diagnostic.
    pub fn rotate(&mut self, angle: f64) {
        let mut angle = angle % 360.0;
        if angle < 0.0 {
            angle += 360.0;
        }
        if angle <= 22.5 || angle > 337.5 {
            return;
        }

        match self.kind {
            // radially symmetric: rotation is useless
            KernelKind::Gaussian
            | KernelKind::Dog
            | KernelKind::Disk
            | KernelKind::Peaks
            | KernelKind::Laplacian
            | KernelKind::Chebyshev
            | KernelKind::Manhattan
            | KernelKind::Euclidean => return,
            // square-symmetric flat shapes: orthogonal rotation is useless
            KernelKind::Square | KernelKind::Diamond | KernelKind::Plus | KernelKind::Cross => {
                return;
            }
            // linear kernels: 180 degrees is the identity
            KernelKind::Blur | KernelKind::Rectangle => {
                if angle > 135.0 && angle <= 225.0 {
                    return;
                }
                if angle > 225.0 && angle <= 315.0 {
                    angle -= 180.0;
                }
            }
            _ => {}
        }

        if angle % 90.0 > 22.5 && angle % 90.0 <= 67.5 {
            if self.width == 3 && self.height == 3 {
                self.rotate_3x3_45();
                angle = (angle + 315.0) % 360.0;
                self.angle = (self.angle + 45.0) % 360.0;
            } else {
                log::warn!(
                    "unable to rotate a {}x{} kernel by 45 degrees",
                    self.width,
                    self.height
                );
            }
        }

        if angle % 180.0 > 45.0 && angle % 180.0 <= 135.0 {
            if self.width == 1 || self.height == 1 {
                // a transpose rotates a 1-D kernel by 90 degrees
                std::mem::swap(&mut self.width, &mut self.height);
                std::mem::swap(&mut self.x, &mut self.y);
                if self.width == 1 {
                    angle = (angle + 270.0) % 360.0;
                    self.angle = (self.angle + 90.0) % 360.0;
                } else {
                    angle = (angle + 90.0) % 360.0;
                    self.angle = (self.angle + 270.0) % 360.0;
                }
            } else if self.width == self.height {
                self.rotate_square_90();
                angle = (angle + 270.0) % 360.0;
                self.angle = (self.angle + 90.0) % 360.0;
            } else {
                log::warn!(
                    "unable to rotate a non-square {}x{} kernel by 90 degrees",
                    self.width,
                    self.height
                );
            }
        }

        if angle > 135.0 && angle <= 225.0 {
            // reflect() also accounts the 180 degrees into self.angle
            self.reflect();
        }
    }

    /// Rotate the perimeter of a 3x3 kernel one 45-degree step.
    /// The origin is assumed centred and is not moved.
    fn rotate_3x3_45(&mut self) {
        let k = &mut self.values;
        let t = k[0];
        k[0] = k[3];
        k[3] = k[6];
        k[6] = k[7];
        k[7] = k[8];
        k[8] = k[5];
        k[5] = k[2];
        k[2] = k[1];
        k[1] = t;
    }

    /// Rotate a square kernel 90 degrees by cycling its concentric rings.
    /// The origin is assumed centred and is not moved.
    fn rotate_square_90(&mut self) {
        let w = self.width;
        let k = &mut self.values;
        let (mut i, mut x) = (0, w - 1);
        while i <= x {
            let (mut j, mut y) = (0, w - 1);
            while j < y {
                let t = k[i + j * w];
                k[i + j * w] = k[j + x * w];
                k[j + x * w] = k[x + y * w];
                k[x + y * w] = k[y + i * w];
                k[y + i * w] = t;
                j += 1;
                y -= 1;
            }
            i += 1;
            if x == 0 {
                break;
            }
            x -= 1;
        }
    }

    /// Cell-wise equality: same extent, masks aligned, weights within
    /// tolerance. The origin is not compared.
    pub fn same_values(&self, other: &Kernel) -> bool {
        if self.width != other.width || self.height != other.height {
            return false;
        }
        self.values
            .iter()
            .zip(other.values.iter())
            .all(|(a, b)| match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => (a - b).abs() <= EPSILON,
                _ => false,
            })
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_kernel(f, self, None)
    }
}

fn format_value(value: f64) -> String {
    format!("{:.6}", value)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn write_kernel(f: &mut fmt::Formatter<'_>, kernel: &Kernel, number: Option<usize>) -> fmt::Result {
    write!(f, "Kernel")?;
    if let Some(number) = number {
        write!(f, " #{}", number)?;
    }
    write!(f, " \"{}", kernel.kind.name())?;
    if kernel.angle.abs() > EPSILON {
        write!(f, "@{}", format_value(kernel.angle))?;
    }
    writeln!(
        f,
        "\" of size {}x{}+{}+{} with values from {} to {}",
        kernel.width,
        kernel.height,
        kernel.x,
        kernel.y,
        format_value(kernel.minimum),
        format_value(kernel.maximum)
    )?;
    let sum = kernel.positive_range + kernel.negative_range;
    write!(
        f,
        "Forming a output range from {} to {}",
        format_value(kernel.negative_range),
        format_value(kernel.positive_range)
    )?;
    if sum.abs() < EPSILON {
        writeln!(f, " (Zero-Summing)")?;
    } else if (sum - 1.0).abs() < EPSILON {
        writeln!(f, " (Normalized)")?;
    } else {
        writeln!(f, " (Sum {})", format_value(sum))?;
    }
    for v in 0..kernel.height {
        write!(f, "{:2}:", v)?;
        for u in 0..kernel.width {
            match kernel.values[v * kernel.width + u] {
                None => write!(f, " {:>9}", "nan")?,
                Some(value) => write!(f, " {:>9}", format_value(value))?,
            }
        }
        writeln!(f)?;
    }
    Ok(())
}

/// An ordered list of kernels applied together.
///
/// Order is semantically meaningful: methods traverse the list front to
/// back and may compose per-kernel results. The list owns its kernels;
/// cloning deep-clones every member.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KernelList {
    pub(crate) kernels: Vec<Kernel>,
}

impl From<Kernel> for KernelList {
    fn from(kernel: Kernel) -> Self {
        KernelList {
            kernels: vec![kernel],
        }
    }
}

impl KernelList {
    pub fn len(&self) -> usize {
        self.kernels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kernels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Kernel> {
        self.kernels.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Kernel> {
        self.kernels.get(index)
    }

    pub fn first(&self) -> Option<&Kernel> {
        self.kernels.first()
    }

    pub fn last(&self) -> Option<&Kernel> {
        self.kernels.last()
    }

    pub(crate) fn push(&mut self, kernel: Kernel) {
        self.kernels.push(kernel);
    }

    /// Move every kernel of `other` onto the end of this list.
    pub fn append(&mut self, other: KernelList) {
        self.kernels.extend(other.kernels);
    }

    /// Scale/normalize every kernel in the list.
    pub fn scale(&mut self, factor: f64, flags: ScaleFlags) {
        for kernel in self.kernels.iter_mut() {
            kernel.scale(factor, flags);
        }
    }

    /// Apply a `convolve:scale` style geometry string: the first value
    /// (with any `!`/`^`/`%` modifiers) scales or normalizes the list, the
    /// second blends in that much of a unity kernel.
    pub fn scale_geometry(&mut self, geometry: &str) -> MorphResult<()> {
        let mut args = magick_core::parse_geometry(geometry)?;
        if args.flags.contains(GeometryFlags::PERCENT) {
            args.rho *= 0.01;
            args.sigma *= 0.01;
        }
        if !args.flags.contains(GeometryFlags::RHO) {
            args.rho = 1.0;
        }
        // percent was folded in above
        let mut flags = ScaleFlags::from_geometry(args.flags);
        flags.0 &= !ScaleFlags::PERCENT.0;
        self.scale(args.rho, flags);
        if args.flags.contains(GeometryFlags::SIGMA) {
            self.unity_add(args.sigma);
        }
        Ok(())
    }

    /// Add a scaled unity kernel to every kernel in the list.
    pub fn unity_add(&mut self, scale: f64) {
        for kernel in self.kernels.iter_mut() {
            kernel.unity_add(scale);
        }
    }

    /// Replace masked cells with zeros throughout the list.
    pub fn zero_nans(&mut self) {
        for kernel in self.kernels.iter_mut() {
            kernel.zero_nans();
        }
    }

    /// Rotate every kernel in the list.
    pub fn rotate(&mut self, angle: f64) {
        for kernel in self.kernels.iter_mut() {
            kernel.rotate(angle);
        }
    }

    /// A 180-degree rotated copy of the whole list.
    pub fn reflected(&self) -> KernelList {
        let mut list = self.clone();
        list.rotate(180.0);
        list
    }

    /// Replicate the list under rotation: clone the last kernel, rotate
    /// the clone by `angle`, and append, until a rotation reproduces the
    /// head kernel. Used to turn one template into its full symmetry
    /// class (90 degrees for `^`, 45 degrees for `@`).
    pub fn expand(&mut self, angle: f64) {
        debug_assert!(!self.kernels.is_empty());
        // a full circle of 22.5-degree steps bounds any supported cycle
        for _ in 0..16 {
            let mut next = self.kernels[self.kernels.len() - 1].clone();
            next.rotate(angle);
            if self.kernels[0].same_values(&next) {
                return;
            }
            self.kernels.push(next);
        }
        log::warn!("kernel expansion by {} degrees did not cycle", angle);
    }
}

impl fmt::Display for KernelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let multi = self.kernels.len() > 1;
        for (i, kernel) in self.kernels.iter().enumerate() {
            write_kernel(f, kernel, multi.then_some(i))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kernel_from(values: &[f64], width: usize, height: usize) -> Kernel {
        let mut kernel = Kernel::alloc(
            KernelKind::User,
            width,
            height,
            (width - 1) / 2,
            (height - 1) / 2,
        )
        .unwrap();
        for (cell, &v) in kernel.values.iter_mut().zip(values) {
            *cell = if v.is_nan() { None } else { Some(v) };
        }
        kernel.recompute_meta();
        kernel
    }

    #[test]
    fn test_recompute_meta() {
        let kernel = kernel_from(&[1.0, 0.0, -1.0, 2.0, 0.0, -2.0, 1.0, 0.0, -1.0], 3, 3);
        assert_eq!(kernel.positive_range(), 4.0);
        assert_eq!(kernel.negative_range(), -4.0);
        assert_eq!(kernel.minimum(), -2.0);
        assert_eq!(kernel.maximum(), 2.0);
    }

    #[test]
    fn test_meta_ignores_masked_cells() {
        let kernel = kernel_from(&[f64::NAN, 3.0, f64::NAN, -1.0], 2, 2);
        assert_eq!(kernel.finite_count(), 2);
        assert_eq!(kernel.positive_range(), 3.0);
        assert_eq!(kernel.negative_range(), -1.0);
    }

    #[test]
    fn test_normalize() {
        let mut kernel = kernel_from(&[1.0, 2.0, 1.0], 3, 1);
        kernel.scale(1.0, ScaleFlags::NORMALIZE);
        let sum = kernel.positive_range() + kernel.negative_range();
        assert!((sum - 1.0).abs() < EPSILON);
        assert!((kernel.value(1, 0).unwrap() - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_normalize_zero_sum_uses_positive_range() {
        let mut kernel = kernel_from(&[-1.0, 2.0, -1.0], 3, 1);
        kernel.scale(1.0, ScaleFlags::NORMALIZE);
        assert!((kernel.positive_range() - 1.0).abs() < EPSILON);
        assert!((kernel.negative_range() + 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_correlate_normalize_forces_zero_sum() {
        let mut kernel = kernel_from(&[3.0, -1.0, 2.0, -4.0], 2, 2);
        kernel.scale(1.0, ScaleFlags::CORRELATE_NORMALIZE);
        let sum = kernel.positive_range() + kernel.negative_range();
        assert!(sum.abs() < EPSILON);
        assert!((kernel.positive_range() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_scale_percent() {
        let mut kernel = kernel_from(&[2.0], 1, 1);
        kernel.scale(50.0, ScaleFlags::PERCENT);
        assert!((kernel.value(0, 0).unwrap() - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_unity_add() {
        let mut kernel = kernel_from(&[0.25, 0.5, 0.25], 3, 1);
        kernel.unity_add(1.0);
        assert!((kernel.value(1, 0).unwrap() - 1.5).abs() < EPSILON);
        assert!((kernel.positive_range() - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_zero_nans() {
        let mut kernel = kernel_from(&[f64::NAN, 1.0], 2, 1);
        kernel.zero_nans();
        assert_eq!(kernel.value(0, 0), Some(0.0));
    }

    #[test]
    fn test_reflect_is_involution() {
        let original = kernel_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let mut kernel = original.clone();
        kernel.reflect();
        assert_eq!(kernel.value(0, 0), Some(6.0));
        assert_eq!(kernel.origin(), (1, 0));
        kernel.reflect();
        assert!(kernel.same_values(&original));
        assert_eq!(kernel.origin(), original.origin());
    }

    #[test]
    fn test_rotate_180_matches_reflect() {
        let original = kernel_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 3, 3);
        let mut rotated = original.clone();
        rotated.rotate(180.0);
        let mut reflected = original.clone();
        reflected.reflect();
        assert!(rotated.same_values(&reflected));
    }

    #[test]
    fn test_rotate_360_is_identity() {
        let original = kernel_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 3, 3);
        let mut kernel = original.clone();
        kernel.rotate(360.0);
        assert!(kernel.same_values(&original));
    }

    #[test]
    fn test_rotate_90_square() {
        let mut kernel = kernel_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 3, 3);
        kernel.rotate(90.0);
        // clockwise: the left column, bottom first, becomes the top row
        assert_eq!(kernel.value(0, 0), Some(7.0));
        assert_eq!(kernel.value(1, 0), Some(4.0));
        assert_eq!(kernel.value(2, 0), Some(1.0));
        assert_eq!(kernel.angle(), 90.0);
    }

    #[test]
    fn test_rotate_90_transposes_1d() {
        let mut kernel = kernel_from(&[1.0, 2.0, 3.0], 3, 1);
        kernel.rotate(90.0);
        assert_eq!(kernel.width(), 1);
        assert_eq!(kernel.height(), 3);
        assert_eq!(kernel.origin(), (0, 1));
    }

    #[test]
    fn test_rotate_45_3x3() {
        let mut kernel = kernel_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0], 3, 3);
        kernel.rotate(45.0);
        // perimeter shifts one step; centre stays put
        assert_eq!(kernel.value(1, 1), Some(5.0));
        assert_eq!(kernel.value(0, 0), Some(4.0));
        assert_eq!(kernel.value(1, 0), Some(1.0));
        assert_eq!(kernel.angle(), 45.0);
    }

    #[test]
    fn test_rotate_gaussian_noop() {
        let mut kernel = kernel_from(&[1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0], 3, 3);
        kernel.kind = KernelKind::Gaussian;
        let original = kernel.clone();
        kernel.rotate(90.0);
        assert!(kernel.same_values(&original));
        assert_eq!(kernel.angle(), 0.0);
    }

    #[test]
    fn test_expand_90_produces_four() {
        let base = kernel_from(&[0.0, 0.0, 0.0, 0.0, 1.0, 0.0, f64::NAN, 1.0, f64::NAN], 3, 3);
        let mut list = KernelList::from(base);
        list.expand(90.0);
        assert_eq!(list.len(), 4);
        assert_eq!(list.get(1).unwrap().angle(), 90.0);
        assert_eq!(list.get(3).unwrap().angle(), 270.0);
    }

    #[test]
    fn test_expand_symmetric_stops_early() {
        // fully symmetric kernel: one rotation reproduces the head
        let base = kernel_from(&[1.0; 9], 3, 3);
        let mut list = KernelList::from(base);
        list.expand(90.0);
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_reflected_list() {
        let base = kernel_from(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 3, 2);
        let list = KernelList::from(base);
        let reflected = list.reflected();
        assert_eq!(reflected.first().unwrap().value(0, 0), Some(6.0));
        assert_eq!(list.first().unwrap().value(0, 0), Some(1.0));
    }

    #[test]
    fn test_display_marks_masked_cells() {
        let kernel = kernel_from(&[f64::NAN, 1.0, f64::NAN, 1.0], 2, 2);
        let shown = kernel.to_string();
        assert!(shown.contains("nan"));
        assert!(shown.contains("\"User\""));
        assert!(shown.contains("2x2+0+0"));
    }

    #[test]
    fn test_display_tags_zero_summing() {
        let kernel = kernel_from(&[-1.0, 2.0, -1.0], 3, 1);
        assert!(kernel.to_string().contains("(Zero-Summing)"));
        let mut normalized = kernel_from(&[1.0, 2.0, 1.0], 3, 1);
        normalized.scale(1.0, ScaleFlags::NORMALIZE);
        assert!(normalized.to_string().contains("(Normalized)"));
    }
}
