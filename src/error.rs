//! Crate-level error types.

use std::fmt;

use crate::gpu::render_context::RenderContextError;
use crate::renderer::postprocess::UniformError;
use crate::scene::loader::AssetError;

/// Errors produced by the orbitfx crate.
#[derive(Debug)]
pub enum OrbitError {
    /// GPU context initialization failure.
    Gpu(RenderContextError),
    /// Failed to load or decode a scene asset.
    AssetLoad(AssetError),
    /// A shader program failed to compose or validate.
    Shader(String),
    /// A pass uniform was written with the wrong value kind.
    Uniform(UniformError),
    /// The frame scheduler was asked to start twice.
    AlreadyStarted,
    /// Generic I/O failure.
    Io(std::io::Error),
    /// Failed to spawn a background thread.
    ThreadSpawn(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// Viewer event-loop failure.
    Viewer(String),
    /// Browser host failure (missing element, rejected JS call).
    Web(String),
}

impl fmt::Display for OrbitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpu(e) => write!(f, "GPU error: {e}"),
            Self::AssetLoad(e) => write!(f, "asset load error: {e}"),
            Self::Shader(msg) => write!(f, "shader error: {msg}"),
            Self::Uniform(e) => write!(f, "uniform error: {e}"),
            Self::AlreadyStarted => {
                write!(f, "frame scheduler has already been started")
            }
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::ThreadSpawn(e) => {
                write!(f, "failed to spawn thread: {e}")
            }
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Viewer(msg) => write!(f, "viewer error: {msg}"),
            Self::Web(msg) => write!(f, "web host error: {msg}"),
        }
    }
}

impl std::error::Error for OrbitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Gpu(e) => Some(e),
            Self::AssetLoad(e) => Some(e),
            Self::Uniform(e) => Some(e),
            Self::Io(e) | Self::ThreadSpawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RenderContextError> for OrbitError {
    fn from(e: RenderContextError) -> Self {
        Self::Gpu(e)
    }
}

impl From<AssetError> for OrbitError {
    fn from(e: AssetError) -> Self {
        Self::AssetLoad(e)
    }
}

impl From<UniformError> for OrbitError {
    fn from(e: UniformError) -> Self {
        Self::Uniform(e)
    }
}

impl From<std::io::Error> for OrbitError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

/// Per-frame failures reported by a backend when a frame cannot be
/// acquired. The frame loop logs these and keeps rescheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// The surface was lost or outdated and has been reconfigured; the frame
    /// is skipped.
    SurfaceReconfigured,
    /// Acquiring the next surface texture timed out.
    Timeout,
    /// The device ran out of memory.
    OutOfMemory,
    /// Any other backend-specific failure.
    Other(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceReconfigured => {
                write!(f, "surface lost or outdated, reconfigured")
            }
            Self::Timeout => write!(f, "timed out acquiring surface texture"),
            Self::OutOfMemory => write!(f, "out of GPU memory"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for FrameError {}
