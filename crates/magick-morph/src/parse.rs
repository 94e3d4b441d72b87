//! Kernel definition string parsing
//!
//! A kernel string takes one of three surface forms:
//!
//! - `name[:geometry]` — a built-in kernel, e.g. `Gaussian:0x2`,
//!   `LineEnds`, `Disk:3.5,1.0`
//! - `WxH[+X+Y][^|@]:v,v,…` — an explicit array with extent, optional
//!   origin, and optional rotation-expansion modifier (`^` = 90 degrees,
//!   `@` = 45 degrees)
//! - `v,v,v,…` — an old-style square kernel; the value count must be a
//!   perfect square and the origin sits at the centre
//!
//! Values are comma or whitespace separated; `nan` or a bare `-` marks a
//! masked cell. Several kernels may be chained with `;`. Any failure
//! rejects the whole list.

use std::str::FromStr;

use magick_core::{parse_geometry, GeometryFlags};

use crate::builtin;
use crate::kernel::{Kernel, KernelKind, KernelList};
use crate::{MorphError, MorphResult};

impl FromStr for KernelList {
    type Err = MorphError;

    fn from_str(definition: &str) -> MorphResult<KernelList> {
        let mut list = KernelList::default();
        let mut index = 0;
        for segment in definition.split(';') {
            // single quotes may wrap convolve filter arguments
            let segment = segment.trim().trim_matches('\'').trim();
            if segment.is_empty() {
                continue;
            }
            let parsed = parse_segment(segment).map_err(|err| match err {
                MorphError::KernelParse { reason, .. } => MorphError::KernelParse { index, reason },
                other => MorphError::KernelParse {
                    index,
                    reason: other.to_string(),
                },
            })?;
            list.append(parsed);
            index += 1;
        }
        if list.is_empty() {
            return Err(MorphError::KernelParse {
                index: 0,
                reason: "no kernel definition found".to_string(),
            });
        }
        Ok(list)
    }
}

fn parse_segment(segment: &str) -> MorphResult<KernelList> {
    let first = segment.chars().next().unwrap_or(';');
    if first.is_ascii_alphabetic() {
        parse_named(segment)
    } else {
        parse_array(segment)
    }
}

/// `name[:geometry]` — resolve the built-in type, decode its arguments,
/// and hand both to the builder.
fn parse_named(segment: &str) -> MorphResult<KernelList> {
    let name_end = segment
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(segment.len());
    let name = &segment[..name_end];
    let kind = KernelKind::parse(name).ok_or_else(|| MorphError::UnknownKernel(name.to_string()))?;

    let geometry =
        segment[name_end..].trim_start_matches(|c: char| c == ':' || c == ',' || c.is_whitespace());
    let mut args = parse_geometry(geometry).map_err(MorphError::from)?;
    builtin::apply_named_defaults(kind, &mut args);
    builtin::build(kind, &args)
}

/// Explicit array, with or without a `WxH[+X+Y]` header.
pub(crate) fn parse_array(segment: &str) -> MorphResult<KernelList> {
    let (width, height, x, y, flags, body) = match segment.find(':') {
        Some(colon) => {
            let args = parse_geometry(segment[..colon].trim()).map_err(MorphError::from)?;
            let mut width = args.rho;
            let mut height = args.sigma;
            if !args.flags.contains(GeometryFlags::WIDTH) {
                width = height;
            }
            if width < 1.0 {
                width = 1.0;
            }
            if height < 1.0 {
                height = width;
            }
            if args.xi < 0.0 || args.psi < 0.0 {
                return Err(MorphError::InvalidKernel(format!(
                    "negative kernel origin +{}+{}",
                    args.xi, args.psi
                )));
            }
            let width = width as usize;
            let height = height as usize;
            let x = if args.flags.contains(GeometryFlags::X) {
                args.xi as usize
            } else {
                (width - 1) / 2
            };
            let y = if args.flags.contains(GeometryFlags::Y) {
                args.psi as usize
            } else {
                (height - 1) / 2
            };
            if x >= width || y >= height {
                return Err(MorphError::InvalidKernel(format!(
                    "origin +{}+{} outside {}x{} kernel",
                    x, y, width, height
                )));
            }
            (width, height, x, y, args.flags, &segment[colon + 1..])
        }
        None => {
            // old-style square: infer the side from the value count
            let count = tokenize(segment).count();
            let side = ((count as f64) + 1.0).sqrt() as usize;
            if side == 0 || side * side != count {
                return Err(MorphError::InvalidKernel(format!(
                    "{} values do not form a square kernel",
                    count
                )));
            }
            let c = (side - 1) / 2;
            (side, side, c, c, GeometryFlags::NONE, segment)
        }
    };

    let kernel = parse_values(width, height, x, y, body)?;
    let mut list = KernelList::from(kernel);
    if flags.contains(GeometryFlags::AREA) {
        list.expand(45.0);
    } else if flags.contains(GeometryFlags::MINIMUM) {
        list.expand(90.0);
    }
    Ok(list)
}

fn tokenize(body: &str) -> impl Iterator<Item = &str> {
    body.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

fn parse_values(
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    body: &str,
) -> MorphResult<Kernel> {
    let mut kernel = Kernel::alloc(KernelKind::User, width, height, x, y)?;
    let expected = width * height;
    let mut count = 0;
    for (i, token) in tokenize(body).enumerate() {
        if i >= expected {
            return Err(MorphError::InvalidKernel(format!(
                "more than {} values for a {}x{} kernel",
                expected, width, height
            )));
        }
        let value = if token == "nan" || token == "-" {
            None
        } else {
            Some(token.parse::<f64>().map_err(|_| {
                MorphError::InvalidKernel(format!("bad kernel value \"{}\"", token))
            })?)
        };
        kernel.values[i] = value;
        count = i + 1;
    }
    if count < expected {
        return Err(MorphError::InvalidKernel(format!(
            "{} values for a {}x{} kernel",
            count, width, height
        )));
    }
    if kernel.finite_count() == 0 {
        return Err(MorphError::InvalidKernel(
            "kernel has no unmasked value".to_string(),
        ));
    }
    kernel.recompute_meta();
    Ok(kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use magick_core::EPSILON;

    #[test]
    fn test_old_style_square() {
        let list: KernelList = "1,0,-1,2,0,-2,1,0,-1".parse().unwrap();
        assert_eq!(list.len(), 1);
        let kernel = list.first().unwrap();
        assert_eq!(kernel.width(), 3);
        assert_eq!(kernel.height(), 3);
        assert_eq!(kernel.origin(), (1, 1));
        assert_eq!(kernel.value(0, 0), Some(1.0));
        assert_eq!(kernel.value(1, 1), Some(0.0));
        assert_eq!(kernel.value(2, 1), Some(-2.0));
        assert_eq!(kernel.positive_range(), 4.0);
        assert_eq!(kernel.negative_range(), -4.0);
        assert_eq!(kernel.minimum(), -2.0);
        assert_eq!(kernel.maximum(), 2.0);
    }

    #[test]
    fn test_old_style_even_square_count() {
        // four values form a 2x2 kernel with the origin at top-left
        let list: KernelList = "1,2,3,4".parse().unwrap();
        let kernel = list.first().unwrap();
        assert_eq!((kernel.width(), kernel.height()), (2, 2));
        assert_eq!(kernel.origin(), (0, 0));
        assert_eq!(kernel.value(1, 1), Some(4.0));
    }

    #[test]
    fn test_old_style_rejects_non_square_count() {
        assert!("1,2,3".parse::<KernelList>().is_err());
        assert!("1,2,3,4,5,6,7,8".parse::<KernelList>().is_err());
    }

    #[test]
    fn test_sized_with_masked_cells() {
        let list: KernelList = "3x3+1+1:1,nan,1, -,1,-, 1,nan,1".parse().unwrap();
        let kernel = list.first().unwrap();
        assert_eq!(kernel.finite_count(), 5);
        let sum = kernel.positive_range() + kernel.negative_range();
        assert!((sum - 5.0).abs() < EPSILON);
        assert_eq!(kernel.minimum(), 1.0);
        assert_eq!(kernel.maximum(), 1.0);
        assert_eq!(kernel.value(1, 0), None);
        assert_eq!(kernel.value(0, 1), None);
    }

    #[test]
    fn test_sized_header_defaults() {
        // height defaults to width, origin defaults to centre
        let list: KernelList = "3:0,1,0 1,1,1 0,1,0".parse().unwrap();
        let kernel = list.first().unwrap();
        assert_eq!(kernel.width(), 3);
        assert_eq!(kernel.height(), 3);
        assert_eq!(kernel.origin(), (1, 1));
    }

    #[test]
    fn test_sized_rejects_origin_outside() {
        assert!("3x3+5+1:1,1,1,1,1,1,1,1,1".parse::<KernelList>().is_err());
    }

    #[test]
    fn test_rejects_wrong_value_count() {
        assert!("3x3:1,2,3".parse::<KernelList>().is_err());
        assert!("2x2:1,2,3,4,5".parse::<KernelList>().is_err());
    }

    #[test]
    fn test_rejects_all_masked() {
        assert!("2x2:nan,nan,-,-".parse::<KernelList>().is_err());
    }

    #[test]
    fn test_rejects_garbage_value() {
        let err = "3x1:1,two,3".parse::<KernelList>().unwrap_err();
        assert!(err.to_string().contains("kernel #0"));
    }

    #[test]
    fn test_error_reports_failing_index() {
        let err = "1;1;3x1:bad".parse::<KernelList>().unwrap_err();
        assert!(err.to_string().contains("kernel #2"));
    }

    #[test]
    fn test_semicolon_list() {
        let list: KernelList = ";1; 0,1,0 1,1,1 0,1,0 ;;".parse().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list.first().unwrap().width(), 1);
        assert_eq!(list.last().unwrap().width(), 3);
    }

    #[test]
    fn test_expand_modifier_90() {
        let list: KernelList = "3x3^:1,0,0 0,1,0 0,0,0".parse().unwrap();
        assert_eq!(list.len(), 4);
    }

    #[test]
    fn test_expand_modifier_45() {
        let list: KernelList = "3x3@:0,1,0 0,1,0 0,0,0".parse().unwrap();
        assert_eq!(list.len(), 8);
    }

    #[test]
    fn test_named_kernel() {
        let list: KernelList = "Square:1".parse().unwrap();
        let kernel = list.first().unwrap();
        assert_eq!(kernel.kind(), KernelKind::Square);
        assert_eq!(kernel.width(), 3);
    }

    #[test]
    fn test_unknown_name_fails() {
        assert!("Frobnicate:3".parse::<KernelList>().is_err());
    }

    #[test]
    fn test_1d_kernel() {
        let list: KernelList = "3x1:-1,0,1".parse().unwrap();
        let kernel = list.first().unwrap();
        assert_eq!(kernel.width(), 3);
        assert_eq!(kernel.height(), 1);
        assert_eq!(kernel.origin(), (1, 0));
    }
}
