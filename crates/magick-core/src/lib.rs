//! magick-core - Pixel and image substrate for the magick-rs engine
//!
//! This crate provides the types the morphology engine is built on:
//!
//! - Quantum (16-bit) pixel samples with inverted opacity and an optional
//!   black channel for CMYK data
//! - An image container with edge-replicating virtual pixel windows
//! - Channel selection masks
//! - The mathematical pixel composition operators
//! - Geometry argument parsing and the free-form artifact option map

mod artifact;
mod channel;
mod compose;
mod error;
mod geometry;
mod image;
mod pixel;

pub use artifact::Artifacts;
pub use channel::Channels;
pub use compose::{composite_over, CompositeOp};
pub use error::{CoreError, CoreResult};
pub use geometry::{parse_geometry, GeometryArgs, GeometryFlags};
pub use image::{Colorspace, Image};
pub use pixel::{clamp_to_quantum, Pixel, Quantum, EPSILON, QUANTUM_RANGE, QUANTUM_SCALE};
