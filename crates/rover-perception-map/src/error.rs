use serde::{Deserialize, Serialize};

/// Which perspective quad a configuration error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuadRole {
    Source,
    Destination,
}

impl std::fmt::Display for QuadRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuadRole::Source => f.write_str("source"),
            QuadRole::Destination => f.write_str("destination"),
        }
    }
}

/// Invalid configuration, detected once when the pipeline is built.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{quad} quad has collinear or coincident corners")]
    DegenerateQuad { quad: QuadRole },
    #[error("perspective homography is singular")]
    SingularHomography,
    #[error("scale must be finite and positive (got {0})")]
    InvalidScale(f64),
    #[error("world size must be positive and allocatable (got {0})")]
    InvalidWorldSize(usize),
    #[error("near-field ratio must lie in [0, 1) (got {0})")]
    InvalidNearFieldRatio(f64),
    #[error("invalid frame size (width={width}, height={height})")]
    InvalidFrameSize { width: usize, height: usize },
}

/// A frame, pose or map rejected by a perception step.
///
/// A rejected step never touches the world map.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("frame is {got:?} (width, height) but the pipeline expects {expected:?}")]
    FrameSizeMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    #[error("frame buffer has {got} bytes, expected {expected}")]
    BufferLength { expected: usize, got: usize },
    #[error("pose is not finite (x={x}, y={y}, heading={heading_deg})")]
    NonFinitePose { x: f64, y: f64, heading_deg: f64 },
    #[error("world map is {got}x{got}, pipeline expects {expected}x{expected}")]
    MapSizeMismatch { expected: usize, got: usize },
}
