// -- Lint policy ---------------------------------------------------------
// This is the single source of truth for crate-wide lints.

// Broad lint groups
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
// Documentation
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::bare_urls)]
// No panicking in library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
// No debug/print artifacts
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]
// Import hygiene
#![deny(clippy::wildcard_imports)]
// Function signature hygiene
#![deny(clippy::too_many_arguments)]
#![deny(clippy::fn_params_excessive_bools)]
// Clone / pass-by-value hygiene
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::implicit_clone)]
// String hygiene
#![deny(clippy::inefficient_to_string)]
#![deny(clippy::redundant_closure_for_method_calls)]
#![deny(clippy::manual_string_new)]
#![deny(clippy::str_to_string)]
// Cargo lints (warn, not deny since cargo lints can be noisy)
#![warn(clippy::cargo)]
// Unused / redundant code
#![deny(unused_results)]
#![deny(unused_qualifications)]
// Cast hygiene
#![deny(trivial_casts)]
#![deny(trivial_numeric_casts)]

//! Orbit-camera scene viewer with a multi-pass post-processing chain,
//! built on wgpu.
//!
//! A glTF scene is lit, viewed through an orbiting perspective camera, and
//! composited through a fixed chain of passes: the scene render, a gamma
//! correction pass, and a time-driven custom effect pass.
//!
//! # Key entry points
//!
//! - [`pipeline::Pipeline`] - the orchestrator owning the frame loop
//! - [`renderer::postprocess::PassChain`] - the ordered pass chain
//! - [`scheduler::FrameScheduler`] - tick state machine and effect clock
//! - [`options::Options`] - TOML-backed configuration
//!
//! # Architecture
//!
//! The orchestrator is generic over a [`renderer::postprocess::Backend`].
//! The wgpu backend lives in [`gpu`]; hosts (the native `viewer` and the
//! browser entry point in `web`) supply a [`viewport::ViewportSizer`] and a
//! [`scheduler::FramePacer`] and forward resize and pointer events. Every
//! tick runs on the host's vsync-aligned callback, so resize handling and
//! rendering never overlap.

pub mod camera;
pub mod error;
pub mod gpu;
pub mod input;
pub mod options;
pub mod pipeline;
pub mod renderer;
pub mod scene;
pub mod scheduler;
pub mod util;
#[cfg(feature = "viewer")]
pub mod viewer;
pub mod viewport;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub mod web;

pub use error::OrbitError;
pub use pipeline::Pipeline;
#[cfg(feature = "viewer")]
pub use viewer::Viewer;
