mod buffer;
mod oracle;

pub use buffer::*;
pub use oracle::*;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The depth comparison functions with their 3-bit hardware encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum DepthFunc {
    Never = 0b000,
    Less = 0b001,
    LEqual = 0b010,
    Greater = 0b011,
    GEqual = 0b100,
    Equal = 0b101,
    NotEqual = 0b110,
    Always = 0b111,
}

impl DepthFunc {
    /// All functions ordered by their code.
    pub const ALL: [DepthFunc; 8] = [
        DepthFunc::Never,
        DepthFunc::Less,
        DepthFunc::LEqual,
        DepthFunc::Greater,
        DepthFunc::GEqual,
        DepthFunc::Equal,
        DepthFunc::NotEqual,
        DepthFunc::Always,
    ];

    /// Decodes the function from its hardware code. Unknown codes fall back to `Less`.
    ///
    /// # Arguments
    /// * `code` - The function code as driven onto the hardware port.
    pub fn from_code(code: u8) -> Self {
        match code {
            0b000 => DepthFunc::Never,
            0b001 => DepthFunc::Less,
            0b010 => DepthFunc::LEqual,
            0b011 => DepthFunc::Greater,
            0b100 => DepthFunc::GEqual,
            0b101 => DepthFunc::Equal,
            0b110 => DepthFunc::NotEqual,
            0b111 => DepthFunc::Always,
            _ => DepthFunc::Less,
        }
    }

    /// Returns the 3-bit hardware code of the function.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Evaluates the function for the incoming depth against the stored depth.
    ///
    /// # Arguments
    /// * `z` - The incoming depth value.
    /// * `stored` - The depth value currently in the buffer.
    #[inline]
    pub fn passes(self, z: u32, stored: u32) -> bool {
        match self {
            DepthFunc::Never => false,
            DepthFunc::Less => z < stored,
            DepthFunc::LEqual => z <= stored,
            DepthFunc::Greater => z > stored,
            DepthFunc::GEqual => z >= stored,
            DepthFunc::Equal => z == stored,
            DepthFunc::NotEqual => z != stored,
            DepthFunc::Always => true,
        }
    }
}

/// How raw memory accesses outside of the depth buffer are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundsPolicy {
    /// Fail with `Error::AddressOutOfRange`.
    #[default]
    Strict,

    /// Read zero and drop writes. Only meant for harnesses relying on that behavior.
    Lenient,
}

/// The geometry of the depth memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthBufferConfig {
    /// The horizontal resolution in pixels.
    pub x_res: usize,

    /// The vertical resolution in pixels.
    pub y_res: usize,

    /// The number of bits per depth value, at most 32.
    pub z_size: u32,

    /// The address of pixel (0, 0).
    #[serde(default)]
    pub base: usize,

    /// The treatment of out of range memory accesses.
    #[serde(default)]
    pub bounds: BoundsPolicy,
}

impl DepthBufferConfig {
    /// Creates a configuration with base address 0 and strict bounds.
    pub fn new(x_res: usize, y_res: usize, z_size: u32) -> Self {
        Self {
            x_res,
            y_res,
            z_size,
            base: 0,
            bounds: BoundsPolicy::Strict,
        }
    }

    /// Returns the farthest depth value, which is also the flush value.
    #[inline]
    pub fn far(&self) -> u32 {
        ((1u64 << self.z_size) - 1) as u32
    }

    /// Returns the number of pixels.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.x_res * self.y_res
    }

    /// Checks the word size, the resolution and that every address fits into `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.z_size == 0 || self.z_size > 32 {
            return Err(Error::InvalidConfig(format!(
                "Depth size must be between 1 and 32 bits, but is {}",
                self.z_size
            )));
        }

        let num_pixels = self.x_res.checked_mul(self.y_res).ok_or_else(|| {
            Error::InvalidConfig(format!(
                "Depth buffer resolution {}x{} is too large",
                self.x_res, self.y_res
            ))
        })?;

        if num_pixels == 0 {
            return Err(Error::InvalidConfig(format!(
                "Depth buffer resolution {}x{} is empty",
                self.x_res, self.y_res
            )));
        }

        if self.base.checked_add(num_pixels).is_none() {
            return Err(Error::InvalidConfig(format!(
                "Depth memory of {} words at base address {} exceeds the address space",
                num_pixels, self.base
            )));
        }

        Ok(())
    }
}
