//! Geometry argument parsing
//!
//! Kernel definitions and several option strings use the project-wide
//! geometry convention: up to four numbers (`rho`, `sigma`, `xi`, `psi`)
//! written as `{rho}[x{sigma}][{+-}{xi}{+-}{psi}]` with `,` accepted as a
//! separator, plus single-character modifier flags (`%`, `!`, `^`, `@`)
//! that may appear anywhere. The parse records which values and flags were
//! actually present so consumers can apply their own defaults.

use crate::error::{CoreError, CoreResult};

/// Which geometry values and modifier flags were present in the input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeometryFlags(u16);

impl GeometryFlags {
    pub const NONE: GeometryFlags = GeometryFlags(0);
    pub const RHO: GeometryFlags = GeometryFlags(0x01);
    pub const SIGMA: GeometryFlags = GeometryFlags(0x02);
    pub const XI: GeometryFlags = GeometryFlags(0x04);
    pub const PSI: GeometryFlags = GeometryFlags(0x08);
    /// `%` modifier
    pub const PERCENT: GeometryFlags = GeometryFlags(0x10);
    /// `!` modifier
    pub const ASPECT: GeometryFlags = GeometryFlags(0x20);
    /// `^` modifier
    pub const MINIMUM: GeometryFlags = GeometryFlags(0x40);
    /// `@` modifier
    pub const AREA: GeometryFlags = GeometryFlags(0x80);

    // Kernel headers read the same four slots as extent and origin.
    pub const WIDTH: GeometryFlags = Self::RHO;
    pub const HEIGHT: GeometryFlags = Self::SIGMA;
    pub const X: GeometryFlags = Self::XI;
    pub const Y: GeometryFlags = Self::PSI;

    #[inline]
    pub fn contains(self, other: GeometryFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn set(&mut self, other: GeometryFlags) {
        self.0 |= other.0;
    }
}

/// The decoded geometry argument struct handed to the kernel builder
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryArgs {
    /// First value: size, radius, or width
    pub rho: f64,
    /// Second value: scale, sigma, or height
    pub sigma: f64,
    /// Third value: secondary argument or x origin
    pub xi: f64,
    /// Fourth value: secondary argument or y origin
    pub psi: f64,
    pub flags: GeometryFlags,
}

/// Parse a geometry string. An empty string yields defaulted arguments
/// with no flags set.
pub fn parse_geometry(geometry: &str) -> CoreResult<GeometryArgs> {
    let mut args = GeometryArgs::default();
    let bytes = geometry.as_bytes();
    let mut i = 0;
    // next value slot: 0 = rho, 1 = sigma, 2 = xi, 3 = psi
    let mut slot = 0usize;

    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | ',' => i += 1,
            '%' => {
                args.flags.set(GeometryFlags::PERCENT);
                i += 1;
            }
            '!' => {
                args.flags.set(GeometryFlags::ASPECT);
                i += 1;
            }
            '^' => {
                args.flags.set(GeometryFlags::MINIMUM);
                i += 1;
            }
            '@' => {
                args.flags.set(GeometryFlags::AREA);
                i += 1;
            }
            'x' | 'X' => {
                if slot < 1 {
                    slot = 1;
                }
                i += 1;
            }
            '+' | '-' => {
                // A signed number introduces the offset pair.
                if slot < 2 {
                    slot = 2;
                }
                let (value, next) = scan_number(geometry, i)?;
                store(&mut args, slot, value)?;
                slot += 1;
                i = next;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let (value, next) = scan_number(geometry, i)?;
                store(&mut args, slot, value)?;
                slot += 1;
                i = next;
            }
            _ => {
                return Err(CoreError::InvalidGeometry(format!(
                    "unexpected character '{}' in \"{}\"",
                    c, geometry
                )));
            }
        }
    }
    Ok(args)
}

fn store(args: &mut GeometryArgs, slot: usize, value: f64) -> CoreResult<()> {
    match slot {
        0 => {
            args.rho = value;
            args.flags.set(GeometryFlags::RHO);
        }
        1 => {
            args.sigma = value;
            args.flags.set(GeometryFlags::SIGMA);
        }
        2 => {
            args.xi = value;
            args.flags.set(GeometryFlags::XI);
        }
        3 => {
            args.psi = value;
            args.flags.set(GeometryFlags::PSI);
        }
        _ => {
            return Err(CoreError::InvalidGeometry(
                "more than four geometry values".to_string(),
            ));
        }
    }
    Ok(())
}

/// Scan one (possibly signed) floating point number starting at `start`.
/// Returns the value and the byte offset just past it.
fn scan_number(geometry: &str, start: usize) -> CoreResult<(f64, usize)> {
    let bytes = geometry.as_bytes();
    let mut end = start;
    if end < bytes.len() && (bytes[end] == b'+' || bytes[end] == b'-') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }
    // optional exponent
    if end > digits_start && end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp = end + 1;
        if exp < bytes.len() && (bytes[exp] == b'+' || bytes[exp] == b'-') {
            exp += 1;
        }
        let exp_digits = exp;
        while exp < bytes.len() && bytes[exp].is_ascii_digit() {
            exp += 1;
        }
        if exp > exp_digits {
            end = exp;
        }
    }
    geometry[start..end]
        .parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| {
            CoreError::InvalidGeometry(format!("bad number at \"{}\"", &geometry[start..]))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_header() {
        let args = parse_geometry("3x3+1+1").unwrap();
        assert_eq!(args.rho, 3.0);
        assert_eq!(args.sigma, 3.0);
        assert_eq!(args.xi, 1.0);
        assert_eq!(args.psi, 1.0);
        assert!(args.flags.contains(GeometryFlags::WIDTH));
        assert!(args.flags.contains(GeometryFlags::X));
        assert!(args.flags.contains(GeometryFlags::Y));
    }

    #[test]
    fn test_comma_separated() {
        let args = parse_geometry("0,2,1.5").unwrap();
        assert_eq!(args.rho, 0.0);
        assert_eq!(args.sigma, 2.0);
        assert_eq!(args.xi, 1.5);
        assert!(args.flags.contains(GeometryFlags::XI));
        assert!(!args.flags.contains(GeometryFlags::PSI));
    }

    #[test]
    fn test_flags_and_expand_modifiers() {
        let args = parse_geometry("5x5^").unwrap();
        assert!(args.flags.contains(GeometryFlags::MINIMUM));
        let args = parse_geometry("3@").unwrap();
        assert!(args.flags.contains(GeometryFlags::AREA));
        let args = parse_geometry("4x100%!").unwrap();
        assert!(args.flags.contains(GeometryFlags::PERCENT));
        assert!(args.flags.contains(GeometryFlags::ASPECT));
    }

    #[test]
    fn test_sigma_only() {
        let args = parse_geometry("x2").unwrap();
        assert!(!args.flags.contains(GeometryFlags::RHO));
        assert!(args.flags.contains(GeometryFlags::SIGMA));
        assert_eq!(args.sigma, 2.0);
    }

    #[test]
    fn test_empty() {
        let args = parse_geometry("").unwrap();
        assert_eq!(args.flags, GeometryFlags::NONE);
    }

    #[test]
    fn test_negative_offset() {
        let args = parse_geometry("7x5-2+0").unwrap();
        assert_eq!(args.xi, -2.0);
        assert_eq!(args.psi, 0.0);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_geometry("3x3:oops").is_err());
        assert!(parse_geometry("1,2,3,4,5").is_err());
    }
}
