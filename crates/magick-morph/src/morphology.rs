//! Morphology method dispatcher
//!
//! A compound morphology method is decomposed up-front into a small data
//! value: the ordered primitive stages (each possibly on the reflected
//! kernel list), which loop carries the iteration count, and how results
//! of a multi-kernel list are combined. The application itself is a
//! four-deep loop: method iterations over kernels over stages over
//! per-kernel primitive iterations, swapping a pair of working images
//! between passes and stopping early whenever a pass changes no pixel.

use magick_core::{
    composite_over, Artifacts, Channels, CompositeOp, Image,
};

use crate::kernel::KernelList;
use crate::primitive::{apply_primitive, MorphologyPrimitive, Progress};
use crate::{MorphError, MorphResult};

/// The user-visible morphology methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyMethod {
    Convolve,
    /// Convolve with the kernel list rotated 180 degrees
    Correlate,
    Erode,
    Dilate,
    ErodeIntensity,
    DilateIntensity,
    Distance,
    /// Erode then dilate
    Open,
    /// Dilate then erode, on the reflected list
    Close,
    OpenIntensity,
    CloseIntensity,
    /// Open then close: erode, dilate, reflected dilate, reflected erode
    Smooth,
    /// Difference of dilation and erosion
    Edge,
    /// Identity minus erosion
    EdgeIn,
    /// Dilation minus identity
    EdgeOut,
    /// Difference of the image and its opening
    TopHat,
    /// Difference of the closing and the image
    BottomHat,
    HitAndMiss,
    Thinning,
    Thicken,
}

impl MorphologyMethod {
    pub fn parse(name: &str) -> Option<MorphologyMethod> {
        match name.to_ascii_lowercase().as_str() {
            "convolve" => Some(MorphologyMethod::Convolve),
            "correlate" => Some(MorphologyMethod::Correlate),
            "erode" => Some(MorphologyMethod::Erode),
            "dilate" => Some(MorphologyMethod::Dilate),
            "erodeintensity" => Some(MorphologyMethod::ErodeIntensity),
            "dilateintensity" => Some(MorphologyMethod::DilateIntensity),
            "distance" => Some(MorphologyMethod::Distance),
            "open" => Some(MorphologyMethod::Open),
            "close" => Some(MorphologyMethod::Close),
            "openintensity" => Some(MorphologyMethod::OpenIntensity),
            "closeintensity" => Some(MorphologyMethod::CloseIntensity),
            "smooth" => Some(MorphologyMethod::Smooth),
            "edge" => Some(MorphologyMethod::Edge),
            "edgein" => Some(MorphologyMethod::EdgeIn),
            "edgeout" => Some(MorphologyMethod::EdgeOut),
            "tophat" => Some(MorphologyMethod::TopHat),
            "bottomhat" => Some(MorphologyMethod::BottomHat),
            "hitandmiss" | "hitnmiss" => Some(MorphologyMethod::HitAndMiss),
            "thinning" => Some(MorphologyMethod::Thinning),
            "thicken" => Some(MorphologyMethod::Thicken),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MorphologyMethod::Convolve => "Convolve",
            MorphologyMethod::Correlate => "Correlate",
            MorphologyMethod::Erode => "Erode",
            MorphologyMethod::Dilate => "Dilate",
            MorphologyMethod::ErodeIntensity => "ErodeIntensity",
            MorphologyMethod::DilateIntensity => "DilateIntensity",
            MorphologyMethod::Distance => "Distance",
            MorphologyMethod::Open => "Open",
            MorphologyMethod::Close => "Close",
            MorphologyMethod::OpenIntensity => "OpenIntensity",
            MorphologyMethod::CloseIntensity => "CloseIntensity",
            MorphologyMethod::Smooth => "Smooth",
            MorphologyMethod::Edge => "Edge",
            MorphologyMethod::EdgeIn => "EdgeIn",
            MorphologyMethod::EdgeOut => "EdgeOut",
            MorphologyMethod::TopHat => "TopHat",
            MorphologyMethod::BottomHat => "BottomHat",
            MorphologyMethod::HitAndMiss => "HitAndMiss",
            MorphologyMethod::Thinning => "Thinning",
            MorphologyMethod::Thicken => "Thicken",
        }
    }
}

/// One primitive invocation within a compound method
#[derive(Debug, Clone, Copy)]
struct Stage {
    primitive: MorphologyPrimitive,
    /// Use the 180-degree rotated copy of the kernel list
    reflected: bool,
    /// Before this stage, set the current image aside and restart from
    /// the original input (the Edge method erodes the original while
    /// keeping its dilation for the final difference)
    restart_from_input: bool,
}

impl Stage {
    fn new(primitive: MorphologyPrimitive) -> Stage {
        Stage {
            primitive,
            reflected: false,
            restart_from_input: false,
        }
    }

    fn reflected(primitive: MorphologyPrimitive) -> Stage {
        Stage {
            primitive,
            reflected: true,
            restart_from_input: false,
        }
    }
}

/// What the accumulated result is differenced against after the stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DifferenceWith {
    /// The unmodified input image
    Original,
    /// The image set aside by a `restart_from_input` stage
    Saved,
}

/// A method decomposed into data
struct MethodSpec {
    stages: Vec<Stage>,
    /// Move the iteration count from the kernel loop to the method loop
    /// (thinning and thickening iterate whole passes over the list)
    iterate_method: bool,
    /// Apply each kernel exactly once per pass regardless of iterations
    single_kernel_pass: bool,
    /// Multi-kernel combiner when the caller does not override
    default_compose: CompositeOp,
    difference_with: Option<DifferenceWith>,
}

impl MethodSpec {
    fn plain(primitive: MorphologyPrimitive) -> MethodSpec {
        MethodSpec {
            stages: vec![Stage::new(primitive)],
            iterate_method: false,
            single_kernel_pass: false,
            default_compose: CompositeOp::Undefined,
            difference_with: None,
        }
    }
}

fn method_spec(method: MorphologyMethod) -> MethodSpec {
    use MorphologyPrimitive as P;
    match method {
        MorphologyMethod::Convolve => MethodSpec::plain(P::Convolve),
        MorphologyMethod::Erode => MethodSpec::plain(P::Erode),
        MorphologyMethod::Dilate => MethodSpec::plain(P::Dilate),
        MorphologyMethod::ErodeIntensity => MethodSpec::plain(P::ErodeIntensity),
        MorphologyMethod::DilateIntensity => MethodSpec::plain(P::DilateIntensity),
        MorphologyMethod::Distance => MethodSpec::plain(P::Distance),
        MorphologyMethod::Correlate => MethodSpec {
            stages: vec![Stage::reflected(P::Convolve)],
            ..MethodSpec::plain(P::Convolve)
        },
        MorphologyMethod::Open | MorphologyMethod::TopHat => MethodSpec {
            stages: vec![Stage::new(P::Erode), Stage::new(P::Dilate)],
            difference_with: (method == MorphologyMethod::TopHat)
                .then_some(DifferenceWith::Original),
            ..MethodSpec::plain(P::Erode)
        },
        MorphologyMethod::Close | MorphologyMethod::BottomHat => MethodSpec {
            stages: vec![Stage::reflected(P::Dilate), Stage::reflected(P::Erode)],
            difference_with: (method == MorphologyMethod::BottomHat)
                .then_some(DifferenceWith::Original),
            ..MethodSpec::plain(P::Dilate)
        },
        MorphologyMethod::OpenIntensity => MethodSpec {
            stages: vec![Stage::new(P::ErodeIntensity), Stage::new(P::DilateIntensity)],
            ..MethodSpec::plain(P::ErodeIntensity)
        },
        MorphologyMethod::CloseIntensity => MethodSpec {
            stages: vec![
                Stage::reflected(P::DilateIntensity),
                Stage::reflected(P::ErodeIntensity),
            ],
            ..MethodSpec::plain(P::DilateIntensity)
        },
        MorphologyMethod::Smooth => MethodSpec {
            stages: vec![
                Stage::new(P::Erode),
                Stage::new(P::Dilate),
                Stage::reflected(P::Dilate),
                Stage::reflected(P::Erode),
            ],
            ..MethodSpec::plain(P::Erode)
        },
        MorphologyMethod::Edge => MethodSpec {
            stages: vec![
                Stage::new(P::Dilate),
                Stage {
                    primitive: P::Erode,
                    reflected: false,
                    restart_from_input: true,
                },
            ],
            difference_with: Some(DifferenceWith::Saved),
            ..MethodSpec::plain(P::Dilate)
        },
        MorphologyMethod::EdgeIn => MethodSpec {
            difference_with: Some(DifferenceWith::Original),
            ..MethodSpec::plain(P::Erode)
        },
        MorphologyMethod::EdgeOut => MethodSpec {
            difference_with: Some(DifferenceWith::Original),
            ..MethodSpec::plain(P::Dilate)
        },
        MorphologyMethod::HitAndMiss => MethodSpec {
            single_kernel_pass: true,
            default_compose: CompositeOp::Lighten,
            ..MethodSpec::plain(P::HitAndMiss)
        },
        MorphologyMethod::Thinning => MethodSpec {
            iterate_method: true,
            single_kernel_pass: true,
            ..MethodSpec::plain(P::Thinning)
        },
        MorphologyMethod::Thicken => MethodSpec {
            iterate_method: true,
            single_kernel_pass: true,
            ..MethodSpec::plain(P::Thicken)
        },
    }
}

fn ensure_owned<'a>(current: &'a mut Option<Image>, input: &Image) -> &'a mut Image {
    if current.is_none() {
        *current = Some(input.clone());
    }
    current.as_mut().expect("just ensured")
}

/// Apply a morphology method, multiple times if requested, using every
/// kernel in the list.
///
/// `iterations == 0` is an empty request and returns `Ok(None)`; a
/// negative count iterates to a fixed point, bounded by the larger image
/// dimension. `compose` overrides the method's multi-kernel combiner
/// (`Undefined` keeps the default; `NoComposite` feeds each kernel the
/// previous kernel's result). `bias` offsets convolution output.
#[allow(clippy::too_many_arguments)]
pub fn morphology_apply(
    image: &Image,
    channels: Channels,
    method: MorphologyMethod,
    iterations: i64,
    kernels: &KernelList,
    compose: CompositeOp,
    bias: f64,
    progress: Option<&dyn Progress>,
) -> MorphResult<Option<Image>> {
    if iterations == 0 {
        return Ok(None);
    }
    if kernels.is_empty() {
        return Err(MorphError::InvalidKernel("empty kernel list".to_string()));
    }

    let mut kernel_limit = if iterations < 0 {
        image.max_dimension() as u64
    } else {
        iterations as u64
    };

    let spec = method_spec(method);
    let mut method_limit = 1;
    if spec.iterate_method {
        method_limit = kernel_limit;
        kernel_limit = 1;
    }
    if spec.single_kernel_pass {
        kernel_limit = 1;
    }

    let mut rslt_compose = if compose == CompositeOp::Undefined {
        spec.default_compose
    } else {
        compose
    };
    if rslt_compose == CompositeOp::Undefined {
        rslt_compose = CompositeOp::NoComposite;
    }

    // one reflected copy of the whole list serves every reflected stage
    let reflected = spec
        .stages
        .iter()
        .any(|stage| stage.reflected)
        .then(|| kernels.reflected());

    let compose_channels = channels & !Channels::SYNC;

    let mut curr: Option<Image> = None; // None stands for the input image
    let mut work: Option<Image> = None;
    let mut saved: Option<Image> = None;
    let mut rslt: Option<Image> = None;
    let mut count: u64 = 0;

    let mut method_loop = 0;
    let mut method_changed = 1;
    while method_loop < method_limit && method_changed > 0 {
        method_loop += 1;
        method_changed = 0;

        for kernel_number in 0..kernels.len() {
            let norm_kernel = kernels.get(kernel_number).expect("kernel index in range");

            for (stage_number, stage) in spec.stages.iter().enumerate() {
                if stage.restart_from_input {
                    saved = curr.take();
                }
                let this_kernel = if stage.reflected {
                    reflected
                        .as_ref()
                        .and_then(|list| list.get(kernel_number))
                        .expect("reflected list mirrors the kernel list")
                } else {
                    norm_kernel
                };

                let mut kernel_loop = 0;
                let mut kernel_changed = 0;
                let mut changed = 1;
                while kernel_loop < kernel_limit && changed > 0 {
                    kernel_loop += 1;
                    if work.is_none() {
                        work = Some(image.clone());
                    }
                    let source = curr.as_ref().unwrap_or(image);
                    let dest = work.as_mut().expect("work image allocated above");

                    count += 1;
                    changed =
                        apply_primitive(source, dest, stage.primitive, channels, this_kernel, bias, progress)?;
                    kernel_changed += changed;
                    method_changed += changed;

                    log::debug!(
                        "{}{}{}:{}.{} #{} => Changed {}",
                        verbose_prefix(&spec, method, stage.primitive, method_loop, stage_number),
                        stage.primitive.name(),
                        if stage.reflected { "*" } else { "" },
                        method_loop + kernel_loop - 1,
                        kernel_number,
                        count,
                        changed
                    );

                    // swap the work image into place; the displaced image
                    // becomes the next work buffer unless it is the input
                    let displaced = curr.take();
                    curr = work.take();
                    work = displaced;
                }
                if kernel_limit > 1 && kernel_changed != 0 {
                    log::debug!(
                        "{}: kernel {} total changed {}",
                        method.name(),
                        kernel_number,
                        kernel_changed
                    );
                }
            }

            // difference the staged result against the original (or the
            // saved dilation, for Edge), mathematically, selected
            // channels only
            match spec.difference_with {
                Some(DifferenceWith::Original) => {
                    let current = ensure_owned(&mut curr, image);
                    composite_over(current, image, CompositeOp::Difference, compose_channels);
                }
                Some(DifferenceWith::Saved) => {
                    let reference = saved.take().ok_or_else(|| {
                        MorphError::InvalidKernel("difference stage produced no image".to_string())
                    })?;
                    let current = ensure_owned(&mut curr, image);
                    composite_over(current, &reference, CompositeOp::Difference, compose_channels);
                }
                None => {}
            }

            // multi-kernel handling: either the next kernel re-iterates
            // this result, or results are composed and each kernel
            // restarts from the original image
            if kernels.len() > 1 && rslt_compose != CompositeOp::NoComposite {
                if rslt.is_none() {
                    // first kernel: keep its result aside, restart from
                    // the original image
                    rslt = Some(curr.take().unwrap_or_else(|| image.clone()));
                } else {
                    let current = ensure_owned(&mut curr, image);
                    composite_over(
                        rslt.as_mut().expect("checked above"),
                        current,
                        rslt_compose,
                        compose_channels,
                    );
                    curr = None;
                }
            }
        }
    }

    let result = if kernels.len() > 1 && rslt_compose != CompositeOp::NoComposite {
        rslt
    } else {
        curr
    };
    Ok(Some(result.unwrap_or_else(|| image.clone())))
}

fn verbose_prefix(
    spec: &MethodSpec,
    method: MorphologyMethod,
    primitive: MorphologyPrimitive,
    method_loop: u64,
    stage_number: usize,
) -> String {
    if spec.stages.len() > 1 {
        format!("{}:{}.{} -> ", method.name(), method_loop, stage_number + 1)
    } else if primitive.name() != method.name() {
        format!("{}:{} -> ", method.name(), method_loop)
    } else {
        String::new()
    }
}

/// The user-facing morphology entry point: applies the option artifacts
/// (`convolve:scale`, the `showkernel` family, `morphology:compose`,
/// `verbose`) and then runs [`morphology_apply`].
#[allow(clippy::too_many_arguments)]
pub fn morphology_image(
    image: &Image,
    channels: Channels,
    method: MorphologyMethod,
    iterations: i64,
    kernels: &KernelList,
    artifacts: &Artifacts,
    bias: f64,
    progress: Option<&dyn Progress>,
) -> MorphResult<Option<Image>> {
    // kernel scaling applies to the convolution methods only, and before
    // any kernel display so the user sees the scaled values
    let scaled = if matches!(
        method,
        MorphologyMethod::Convolve | MorphologyMethod::Correlate
    ) {
        match artifacts.get("convolve:scale") {
            Some(geometry) => {
                let mut scaled = kernels.clone();
                scaled.scale_geometry(geometry)?;
                Some(scaled)
            }
            None => None,
        }
    } else {
        None
    };
    let kernels = scaled.as_ref().unwrap_or(kernels);

    if artifacts.is_set("showkernel")
        || artifacts.is_set("convolve:showkernel")
        || artifacts.is_set("morphology:showkernel")
    {
        log::info!("{}", kernels);
    }

    let compose = artifacts
        .get("morphology:compose")
        .and_then(CompositeOp::parse)
        .unwrap_or(CompositeOp::Undefined);

    if artifacts.is_set("verbose") {
        log::info!(
            "morphology {}: {} kernel(s), iterations {}",
            method.name(),
            kernels.len(),
            iterations
        );
    }

    morphology_apply(image, channels, method, iterations, kernels, compose, bias, progress)
}
