//! Morphology primitives
//!
//! One call applies one kernel to one source image, writing one
//! destination image, and reports how many pixels changed. The
//! destination rows are computed in parallel: each row reads a disjoint
//! virtual window of the source and writes only its own row, so row
//! order is not observable.
//!
//! Dilate-side primitives (convolve, dilate, intensity dilate, distance)
//! traverse the kernel cells in reflected order and shift the effective
//! origin to the reflected position; erode-side primitives use the kernel
//! as given. Kernels are immutable during execution; any scaling or
//! rotation must happen before the kernel arrives here.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::prelude::*;

use magick_core::{
    clamp_to_quantum, Channels, Colorspace, CoreError, Image, Pixel, EPSILON, QUANTUM_RANGE,
    QUANTUM_SCALE,
};

use crate::kernel::Kernel;
use crate::{MorphError, MorphResult};

/// The atomic per-pixel operations the dispatcher composes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyPrimitive {
    /// Weighted sum under the reflected kernel
    Convolve,
    /// Channel-wise neighbourhood minimum over boolean cells
    Erode,
    /// Channel-wise neighbourhood maximum over boolean cells (reflected)
    Dilate,
    /// Minimum of foreground cells minus maximum of background cells
    HitAndMiss,
    /// Hit-and-miss subtracted from the original pixel
    Thinning,
    /// Hit-and-miss unioned with the original pixel
    Thicken,
    /// Whole-pixel copy of the least intense matching neighbour
    ErodeIntensity,
    /// Whole-pixel copy of the most intense matching neighbour (reflected)
    DilateIntensity,
    /// Channel-wise minimum of kernel value plus neighbour (reflected)
    Distance,
}

impl MorphologyPrimitive {
    pub fn name(self) -> &'static str {
        match self {
            MorphologyPrimitive::Convolve => "Convolve",
            MorphologyPrimitive::Erode => "Erode",
            MorphologyPrimitive::Dilate => "Dilate",
            MorphologyPrimitive::HitAndMiss => "HitAndMiss",
            MorphologyPrimitive::Thinning => "Thinning",
            MorphologyPrimitive::Thicken => "Thicken",
            MorphologyPrimitive::ErodeIntensity => "ErodeIntensity",
            MorphologyPrimitive::DilateIntensity => "DilateIntensity",
            MorphologyPrimitive::Distance => "Distance",
        }
    }

    /// Dilate-side primitives use the kernel with reflection about the
    /// origin; the effective origin and the traversal direction shift
    /// together.
    fn reflected(self) -> bool {
        matches!(
            self,
            MorphologyPrimitive::Convolve
                | MorphologyPrimitive::Dilate
                | MorphologyPrimitive::DilateIntensity
                | MorphologyPrimitive::Distance
        )
    }
}

/// Progress reporting and cancellation for row-parallel passes.
///
/// `progress` is called once per completed row, from whichever worker
/// finished it. Returning `false` cancels the pass: rows that have not
/// started yet are skipped and the primitive reports
/// [`MorphError::Cancelled`]. Rows already running finish normally.
pub trait Progress: Sync {
    fn progress(&self, completed: u64, total: u64) -> bool;
}

/// Floating point accumulator for one pixel. The opacity slot works in
/// inverted space (`QUANTUM_RANGE - stored opacity`) so that larger
/// means more opaque.
#[derive(Debug, Clone, Copy)]
struct ChannelAcc {
    red: f64,
    green: f64,
    blue: f64,
    opacity: f64,
    index: f64,
}

impl ChannelAcc {
    fn splat(value: f64) -> Self {
        ChannelAcc {
            red: value,
            green: value,
            blue: value,
            opacity: value,
            index: value,
        }
    }

    fn from_pixel(p: &Pixel) -> Self {
        ChannelAcc {
            red: p.red as f64,
            green: p.green as f64,
            blue: p.blue as f64,
            opacity: QUANTUM_RANGE - p.opacity as f64,
            index: p.index as f64,
        }
    }

    fn minimize(&mut self, p: &Pixel, cmyk: bool) {
        self.red = self.red.min(p.red as f64);
        self.green = self.green.min(p.green as f64);
        self.blue = self.blue.min(p.blue as f64);
        self.opacity = self.opacity.min(QUANTUM_RANGE - p.opacity as f64);
        if cmyk {
            self.index = self.index.min(p.index as f64);
        }
    }

    fn maximize(&mut self, p: &Pixel, cmyk: bool) {
        self.red = self.red.max(p.red as f64);
        self.green = self.green.max(p.green as f64);
        self.blue = self.blue.max(p.blue as f64);
        self.opacity = self.opacity.max(QUANTUM_RANGE - p.opacity as f64);
        if cmyk {
            self.index = self.index.max(p.index as f64);
        }
    }

    fn scale(&mut self, factor: f64) {
        self.red *= factor;
        self.green *= factor;
        self.blue *= factor;
        self.opacity *= factor;
        self.index *= factor;
    }
}

/// Per-row working state: the virtual source window and the geometry
/// needed to address it.
struct Row<'a> {
    window: &'a [Pixel],
    stride: usize,
    offx: usize,
    offy: usize,
    kw: usize,
    kh: usize,
    cells: &'a [Option<f64>],
    reflected: bool,
    channels: Channels,
    matte: bool,
    cmyk: bool,
}

impl Row<'_> {
    /// The source pixel the output at `x` corresponds to
    #[inline]
    fn seed(&self, x: usize) -> &Pixel {
        &self.window[self.offy * self.stride + self.offx + x]
    }

    #[inline]
    fn neighbor(&self, x: usize, u: usize, v: usize) -> &Pixel {
        &self.window[v * self.stride + x + u]
    }

    /// Kernel cell for grid position (u, v) honouring the traversal
    /// direction: reflected primitives read the cell array back to front.
    #[inline]
    fn cell(&self, u: usize, v: usize) -> Option<f64> {
        let i = v * self.kw + u;
        if self.reflected {
            self.cells[self.cells.len() - 1 - i]
        } else {
            self.cells[i]
        }
    }

    /// Write the accumulated result into the output pixel over the
    /// selected channels, clamped into the quantum range. Opacity is
    /// stored back in inverted form.
    fn write(&self, out: &mut Pixel, acc: &ChannelAcc) {
        if self.channels.contains(Channels::RED) {
            out.red = clamp_to_quantum(acc.red);
        }
        if self.channels.contains(Channels::GREEN) {
            out.green = clamp_to_quantum(acc.green);
        }
        if self.channels.contains(Channels::BLUE) {
            out.blue = clamp_to_quantum(acc.blue);
        }
        if self.channels.contains(Channels::OPACITY) && self.matte {
            out.opacity = clamp_to_quantum(QUANTUM_RANGE - acc.opacity);
        }
        if self.channels.contains(Channels::INDEX) && self.cmyk {
            out.index = clamp_to_quantum(acc.index);
        }
    }

    #[inline]
    fn pixel_changed(&self, seed: &Pixel, out: &Pixel) -> bool {
        seed.red != out.red
            || seed.green != out.green
            || seed.blue != out.blue
            || seed.opacity != out.opacity
            || (self.cmyk && seed.index != out.index)
    }
}

/// Apply one morphology primitive with one kernel, returning the number
/// of pixels whose output differs from the corresponding source pixel.
pub fn apply_primitive(
    source: &Image,
    dest: &mut Image,
    primitive: MorphologyPrimitive,
    channels: Channels,
    kernel: &Kernel,
    bias: f64,
    progress: Option<&dyn Progress>,
) -> MorphResult<u64> {
    if source.width() != dest.width() || source.height() != dest.height() {
        return Err(MorphError::Core(CoreError::InvalidDimensions(format!(
            "source {}x{} vs destination {}x{}",
            source.width(),
            source.height(),
            dest.width(),
            dest.height()
        ))));
    }

    let width = source.width();
    let height = source.height();
    let (kw, kh) = (kernel.width(), kernel.height());
    let (kx, ky) = kernel.origin();
    let (offx, offy) = if primitive.reflected() {
        (kw - kx - 1, kh - ky - 1)
    } else {
        (kx, ky)
    };
    let stride = width + kw;
    let matte = source.matte;
    let cmyk = source.colorspace == Colorspace::Cmyk;

    // set-once failure/cancellation flag shared by all rows
    let ok = AtomicBool::new(true);
    let rows_done = AtomicU64::new(0);

    let changed: u64 = dest
        .pixels_mut()
        .par_chunks_mut(width)
        .enumerate()
        .map(|(y, out_row)| {
            if !ok.load(Ordering::Relaxed) {
                return 0;
            }
            let window =
                source.virtual_window(-(offx as i64), y as i64 - offy as i64, stride, kh);
            let row = Row {
                window: &window,
                stride,
                offx,
                offy,
                kw,
                kh,
                cells: kernel.cells(),
                reflected: primitive.reflected(),
                channels,
                matte,
                cmyk,
            };
            let row_changed = match primitive {
                MorphologyPrimitive::Convolve => row_convolve(&row, out_row, bias),
                MorphologyPrimitive::Erode | MorphologyPrimitive::Dilate => {
                    row_min_max(&row, out_row, primitive)
                }
                MorphologyPrimitive::HitAndMiss
                | MorphologyPrimitive::Thinning
                | MorphologyPrimitive::Thicken => row_hit_miss(&row, out_row, primitive),
                MorphologyPrimitive::ErodeIntensity | MorphologyPrimitive::DilateIntensity => {
                    row_intensity(&row, out_row, primitive)
                }
                MorphologyPrimitive::Distance => row_distance(&row, out_row),
            };
            if let Some(progress) = progress {
                let done = rows_done.fetch_add(1, Ordering::SeqCst) + 1;
                if !progress.progress(done, height as u64) {
                    ok.store(false, Ordering::Relaxed);
                }
            }
            row_changed
        })
        .sum();

    if !ok.load(Ordering::Relaxed) {
        return Err(MorphError::Cancelled);
    }
    Ok(changed)
}

/// Weighted sum of the neighbourhood under the reflected kernel. With
/// synchronized channels on a matte image, color channels are weighted
/// by the neighbour's opacity so transparent pixels do not bleed into
/// the result; the accumulated weight is divided back out afterwards.
fn row_convolve(row: &Row<'_>, out_row: &mut [Pixel], bias: f64) -> u64 {
    let alpha_weighted = row.channels.contains(Channels::SYNC) && row.matte;
    let mut changed = 0;
    for (x, out) in out_row.iter_mut().enumerate() {
        let seed = *row.seed(x);
        *out = seed;
        let mut acc = ChannelAcc::splat(bias);

        if alpha_weighted {
            let mut gamma = 0.0;
            for v in 0..row.kh {
                for u in 0..row.kw {
                    let Some(k) = row.cell(u, v) else { continue };
                    let p = row.neighbor(x, u, v);
                    let alpha = k * (QUANTUM_SCALE * (QUANTUM_RANGE - p.opacity as f64));
                    gamma += alpha;
                    acc.red += alpha * p.red as f64;
                    acc.green += alpha * p.green as f64;
                    acc.blue += alpha * p.blue as f64;
                    acc.opacity += k * (QUANTUM_RANGE - p.opacity as f64);
                    if row.cmyk {
                        acc.index += alpha * p.index as f64;
                    }
                }
            }
            let gamma = 1.0 / (if gamma.abs() <= EPSILON { 1.0 } else { gamma });
            acc.scale(gamma);
        } else {
            for v in 0..row.kh {
                for u in 0..row.kw {
                    let Some(k) = row.cell(u, v) else { continue };
                    let p = row.neighbor(x, u, v);
                    acc.red += k * p.red as f64;
                    acc.green += k * p.green as f64;
                    acc.blue += k * p.blue as f64;
                    acc.opacity += k * (QUANTUM_RANGE - p.opacity as f64);
                    if row.cmyk {
                        acc.index += k * p.index as f64;
                    }
                }
            }
        }

        row.write(out, &acc);
        if row.pixel_changed(&seed, out) {
            changed += 1;
        }
    }
    changed
}

/// Channel-wise neighbourhood minimum (erode) or maximum (dilate) over
/// the cells the boolean kernel selects.
fn row_min_max(row: &Row<'_>, out_row: &mut [Pixel], primitive: MorphologyPrimitive) -> u64 {
    let dilate = primitive == MorphologyPrimitive::Dilate;
    let mut changed = 0;
    for (x, out) in out_row.iter_mut().enumerate() {
        let seed = *row.seed(x);
        *out = seed;
        let mut acc = if dilate {
            ChannelAcc::splat(0.0)
        } else {
            ChannelAcc::splat(QUANTUM_RANGE)
        };
        for v in 0..row.kh {
            for u in 0..row.kw {
                match row.cell(u, v) {
                    Some(k) if k >= 0.5 => {}
                    _ => continue,
                }
                let p = row.neighbor(x, u, v);
                if dilate {
                    acc.maximize(p, row.cmyk);
                } else {
                    acc.minimize(p, row.cmyk);
                }
            }
        }
        row.write(out, &acc);
        if row.pixel_changed(&seed, out) {
            changed += 1;
        }
    }
    changed
}

/// Hit-and-miss pattern match: the minimum over foreground cells minus
/// the maximum over background cells, floored at zero. Thinning
/// subtracts the match from the original pixel; thickening unions it in.
fn row_hit_miss(row: &Row<'_>, out_row: &mut [Pixel], primitive: MorphologyPrimitive) -> u64 {
    let mut changed = 0;
    for (x, out) in out_row.iter_mut().enumerate() {
        let seed = *row.seed(x);
        *out = seed;
        let mut min = ChannelAcc::splat(QUANTUM_RANGE);
        let mut max = ChannelAcc::splat(0.0);
        for v in 0..row.kh {
            for u in 0..row.kw {
                let Some(k) = row.cell(u, v) else { continue };
                let p = row.neighbor(x, u, v);
                if k > 0.7 {
                    min.minimize(p, row.cmyk);
                } else if k < 0.3 {
                    max.maximize(p, row.cmyk);
                }
            }
        }
        // pattern matches only where every foreground cell outshines
        // every background cell
        min.red = (min.red - max.red).max(0.0);
        min.green = (min.green - max.green).max(0.0);
        min.blue = (min.blue - max.blue).max(0.0);
        min.opacity = (min.opacity - max.opacity).max(0.0);
        min.index = (min.index - max.index).max(0.0);

        let acc = match primitive {
            MorphologyPrimitive::Thinning => {
                let mut acc = ChannelAcc::from_pixel(&seed);
                acc.red -= min.red;
                acc.green -= min.green;
                acc.blue -= min.blue;
                acc.opacity -= min.opacity;
                acc.index -= min.index;
                acc
            }
            MorphologyPrimitive::Thicken => {
                let mut acc = ChannelAcc::from_pixel(&seed);
                acc.red = acc.red.max(min.red);
                acc.green = acc.green.max(min.green);
                acc.blue = acc.blue.max(min.blue);
                acc.opacity = acc.opacity.max(min.opacity);
                acc.index = acc.index.max(min.index);
                acc
            }
            _ => min,
        };

        row.write(out, &acc);
        if row.pixel_changed(&seed, out) {
            changed += 1;
        }
    }
    changed
}

/// Copy the whole least/most intense pixel the boolean kernel reaches.
/// The channel mask does not apply: intensity selection moves entire
/// pixels.
fn row_intensity(row: &Row<'_>, out_row: &mut [Pixel], primitive: MorphologyPrimitive) -> u64 {
    let dilate = primitive == MorphologyPrimitive::DilateIntensity;
    let mut changed = 0;
    for (x, out) in out_row.iter_mut().enumerate() {
        let seed = *row.seed(x);
        *out = seed;
        let mut matched = false;
        for v in 0..row.kh {
            for u in 0..row.kw {
                match row.cell(u, v) {
                    Some(k) if k >= 0.5 => {}
                    _ => continue,
                }
                let p = row.neighbor(x, u, v);
                let better = if dilate {
                    p.intensity() > out.intensity()
                } else {
                    p.intensity() < out.intensity()
                };
                if !matched || better {
                    *out = *p;
                    matched = true;
                }
            }
        }
        if row.pixel_changed(&seed, out) {
            changed += 1;
        }
    }
    changed
}

/// Iterative distance: each channel takes the minimum of itself and
/// every kernel value plus the corresponding neighbour. Iterated to a
/// fixed point this grows a distance gradient out of the image shape.
fn row_distance(row: &Row<'_>, out_row: &mut [Pixel]) -> u64 {
    let mut changed = 0;
    for (x, out) in out_row.iter_mut().enumerate() {
        let seed = *row.seed(x);
        *out = seed;
        let mut acc = ChannelAcc::from_pixel(&seed);
        for v in 0..row.kh {
            for u in 0..row.kw {
                let Some(k) = row.cell(u, v) else { continue };
                let p = row.neighbor(x, u, v);
                acc.red = acc.red.min(k + p.red as f64);
                acc.green = acc.green.min(k + p.green as f64);
                acc.blue = acc.blue.min(k + p.blue as f64);
                acc.opacity = acc.opacity.min(k + QUANTUM_RANGE - p.opacity as f64);
                if row.cmyk {
                    acc.index = acc.index.min(k + p.index as f64);
                }
            }
        }
        row.write(out, &acc);
        if row.pixel_changed(&seed, out) {
            changed += 1;
        }
    }
    changed
}
