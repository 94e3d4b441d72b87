//! magick-morph - Morphology and convolution kernel engine
//!
//! This crate provides the kernel machinery and the morphological method
//! dispatcher:
//!
//! - Kernel model: rectangular weight grids with masked cells, range
//!   metadata, and ordered kernel lists
//! - Kernel parsing from definition strings (named, sized-array, and
//!   old-style square forms)
//! - Built-in kernel generation: gaussian family, the classic 3x3
//!   convolution tables, flat shapes, hit-and-miss template sets, and
//!   distance kernels
//! - Kernel transforms: rotation, reflection, rotation expansion,
//!   scaling and normalization
//! - The morphology primitives (erode, dilate, convolve, hit-and-miss,
//!   intensity variants, distance) applied row-parallel
//! - The method dispatcher decomposing compound methods (open, close,
//!   smooth, edge, top-hat, thinning) into primitive sequences
//!
//! # Example
//!
//! ```
//! use magick_core::{Channels, CompositeOp, Image, Pixel};
//! use magick_morph::{morphology_apply, KernelList, MorphologyMethod};
//!
//! let image = Image::filled(32, 32, Pixel::gray(0)).unwrap();
//! let kernels: KernelList = "Disk:2.5".parse().unwrap();
//! let opened = morphology_apply(
//!     &image,
//!     Channels::default(),
//!     MorphologyMethod::Open,
//!     1,
//!     &kernels,
//!     CompositeOp::Undefined,
//!     0.0,
//!     None,
//! )
//! .unwrap();
//! assert!(opened.is_some());
//! ```

mod builtin;
mod error;
mod kernel;
mod morphology;
mod parse;
mod primitive;

pub use error::{MorphError, MorphResult};
pub use kernel::{Kernel, KernelKind, KernelList, ScaleFlags};
pub use morphology::{morphology_apply, morphology_image, MorphologyMethod};
pub use primitive::{apply_primitive, MorphologyPrimitive, Progress};
