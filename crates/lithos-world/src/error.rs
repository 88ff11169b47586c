use std::fmt;

/// Load-time configuration errors. Any of these aborts world-gen init.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldGenError {
    InvalidWorldDims(String),
    EmptyLandforms,
    OctaveLengthMismatch {
        landform: String,
        expected: usize,
        amplitudes: usize,
        thresholds: usize,
    },
    YKeyLengthMismatch {
        landform: String,
        positions: usize,
        thresholds: usize,
    },
    InvalidYKeys {
        landform: String,
        reason: &'static str,
    },
    InvalidDistortionBand {
        band: &'static str,
        threshold: f32,
        maximum: f32,
    },
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for WorldGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldGenError::InvalidWorldDims(msg) => write!(f, "invalid world dimensions: {}", msg),
            WorldGenError::EmptyLandforms => write!(f, "at least one landform variant is required"),
            WorldGenError::OctaveLengthMismatch {
                landform,
                expected,
                amplitudes,
                thresholds,
            } => write!(
                f,
                "landform '{}': expected {} octaves, got {} amplitudes and {} thresholds",
                landform, expected, amplitudes, thresholds
            ),
            WorldGenError::YKeyLengthMismatch {
                landform,
                positions,
                thresholds,
            } => write!(
                f,
                "landform '{}': {} y key positions but {} y key thresholds",
                landform, positions, thresholds
            ),
            WorldGenError::InvalidYKeys { landform, reason } => {
                write!(f, "landform '{}': invalid y keys: {}", landform, reason)
            }
            WorldGenError::InvalidDistortionBand {
                band,
                threshold,
                maximum,
            } => write!(
                f,
                "distortion band '{}': maximum {} must be finite and greater than threshold {} >= 0",
                band, maximum, threshold
            ),
            WorldGenError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter '{}': {}", name, reason)
            }
        }
    }
}

impl std::error::Error for WorldGenError {}
