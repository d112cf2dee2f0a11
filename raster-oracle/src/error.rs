use thiserror::Error;

use crate::compare::Mismatch;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Pixel ({x}, {y}) is outside of the {x_res}x{y_res} depth buffer")]
    PixelOutOfRange {
        x: usize,
        y: usize,
        x_res: usize,
        y_res: usize,
    },

    #[error("Address {address} is outside of the depth memory [{base}, {end})")]
    AddressOutOfRange {
        address: usize,
        base: usize,
        end: usize,
    },

    #[error("Stimulus range {start}..{end} exceeds the maximum value {max} of a {width}-bit word")]
    StimulusRange {
        start: u64,
        end: u64,
        width: u32,
        max: u64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Hardware output mismatch: {0}")]
    Mismatch(Box<Mismatch>),

    #[error("No hardware responses for the {stage} stage, expected {expected}")]
    NoResponses { stage: &'static str, expected: usize },

    #[error("{failed} of {checked} checks exceeded the tolerance")]
    ToleranceViolations { failed: usize, checked: usize },

    #[error("Serialization error: {0}")]
    SerializationError(Box<dyn std::error::Error + Send + Sync>),

    #[error("Deserialization error: {0}")]
    DeserializationError(Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
