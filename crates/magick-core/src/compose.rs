//! Pixel composition operators
//!
//! The small set of mathematical blend operators the morphology dispatcher
//! needs: differencing a result against the original image, and merging
//! per-kernel results of a multi-kernel operation. Composition here is
//! purely per-channel arithmetic over the selected channels; no SVG-style
//! alpha blending is performed.

use crate::channel::Channels;
use crate::image::{Colorspace, Image};
use crate::pixel::Quantum;

/// A pixel blend operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompositeOp {
    /// Not specified; callers substitute a method default
    #[default]
    Undefined,
    /// Do not compose: the next stage re-uses the previous result
    NoComposite,
    /// Channel-wise absolute difference
    Difference,
    /// Channel-wise maximum
    Lighten,
    /// Channel-wise minimum
    Darken,
    /// Channel-wise saturating sum
    Plus,
}

impl CompositeOp {
    /// Resolve an operator from its option name, case-insensitively
    pub fn parse(name: &str) -> Option<CompositeOp> {
        match name.to_ascii_lowercase().as_str() {
            "none" | "no" => Some(CompositeOp::NoComposite),
            "difference" => Some(CompositeOp::Difference),
            "lighten" => Some(CompositeOp::Lighten),
            "darken" => Some(CompositeOp::Darken),
            "plus" => Some(CompositeOp::Plus),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompositeOp::Undefined => "Undefined",
            CompositeOp::NoComposite => "None",
            CompositeOp::Difference => "Difference",
            CompositeOp::Lighten => "Lighten",
            CompositeOp::Darken => "Darken",
            CompositeOp::Plus => "Plus",
        }
    }

    #[inline]
    fn apply(self, a: Quantum, b: Quantum) -> Quantum {
        match self {
            CompositeOp::Difference => a.abs_diff(b),
            CompositeOp::Lighten => a.max(b),
            CompositeOp::Darken => a.min(b),
            CompositeOp::Plus => a.saturating_add(b),
            CompositeOp::Undefined | CompositeOp::NoComposite => a,
        }
    }
}

/// Blend `src` into `dst` with the given operator over the selected
/// channels. Both images must have the same extent; mismatched areas are
/// left untouched.
pub fn composite_over(dst: &mut Image, src: &Image, op: CompositeOp, channels: Channels) {
    if op == CompositeOp::Undefined || op == CompositeOp::NoComposite {
        return;
    }
    let cmyk = dst.colorspace == Colorspace::Cmyk;
    let (w, h) = (dst.width().min(src.width()), dst.height().min(src.height()));
    for y in 0..h {
        for x in 0..w {
            let s = *src.get(x, y).expect("within checked extent");
            let d = *dst.get(x, y).expect("within checked extent");
            let mut out = d;
            if channels.contains(Channels::RED) {
                out.red = op.apply(d.red, s.red);
            }
            if channels.contains(Channels::GREEN) {
                out.green = op.apply(d.green, s.green);
            }
            if channels.contains(Channels::BLUE) {
                out.blue = op.apply(d.blue, s.blue);
            }
            if channels.contains(Channels::OPACITY) {
                out.opacity = op.apply(d.opacity, s.opacity);
            }
            if cmyk && channels.contains(Channels::INDEX) {
                out.index = op.apply(d.index, s.index);
            }
            dst.set(x, y, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;

    #[test]
    fn test_parse() {
        assert_eq!(CompositeOp::parse("Lighten"), Some(CompositeOp::Lighten));
        assert_eq!(CompositeOp::parse("none"), Some(CompositeOp::NoComposite));
        assert_eq!(CompositeOp::parse("bogus"), None);
    }

    #[test]
    fn test_difference() {
        let mut dst = Image::filled(2, 1, Pixel::gray(100)).unwrap();
        let src = Image::filled(2, 1, Pixel::gray(160)).unwrap();
        composite_over(&mut dst, &src, CompositeOp::Difference, Channels::default());
        assert_eq!(dst.get(0, 0).unwrap().red, 60);
        assert_eq!(dst.get(1, 0).unwrap().green, 60);
    }

    #[test]
    fn test_lighten_respects_channel_mask() {
        let mut dst = Image::filled(1, 1, Pixel::rgb(10, 10, 10)).unwrap();
        let src = Image::filled(1, 1, Pixel::rgb(90, 90, 90)).unwrap();
        composite_over(&mut dst, &src, CompositeOp::Lighten, Channels::RED);
        let out = dst.get(0, 0).unwrap();
        assert_eq!(out.red, 90);
        assert_eq!(out.green, 10);
        assert_eq!(out.blue, 10);
    }
}
