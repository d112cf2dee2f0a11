use serde::{Deserialize, Serialize};

use crate::{math::Vertex, Error, Result};

/// A fixed-point format with `width` total bits of which `frac` bits are fractional.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QFormat {
    /// The total number of bits, including the sign bit.
    pub width: u32,

    /// The number of fractional bits.
    pub frac: u32,

    /// If true, the words are two's complement encoded.
    #[serde(default = "default_signed")]
    pub signed: bool,
}

fn default_signed() -> bool {
    true
}

impl QFormat {
    /// Creates a signed format, e.g., `QFormat::signed(24, 12)` for the 12.12 vertex format.
    pub const fn signed(width: u32, frac: u32) -> Self {
        Self {
            width,
            frac,
            signed: true,
        }
    }

    /// Creates an unsigned format.
    pub const fn unsigned(width: u32, frac: u32) -> Self {
        Self {
            width,
            frac,
            signed: false,
        }
    }

    /// Checks that the format can be represented by 64-bit words.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.width > 64 {
            return Err(Error::InvalidConfig(format!(
                "Fixed-point width must be between 1 and 64 bits, but is {}",
                self.width
            )));
        }

        if self.frac > 64 {
            return Err(Error::InvalidConfig(format!(
                "Fixed-point fraction must not exceed 64 bits, but is {}",
                self.frac
            )));
        }

        Ok(())
    }

    /// Returns the bit mask covering all bits of a word.
    #[inline]
    pub fn mask(&self) -> u64 {
        ((1u128 << self.width) - 1) as u64
    }

    /// Returns the smallest representable integer.
    #[inline]
    pub fn min_int(&self) -> i128 {
        if self.signed {
            -(1i128 << (self.width - 1))
        } else {
            0
        }
    }

    /// Returns the largest representable integer.
    #[inline]
    pub fn max_int(&self) -> i128 {
        if self.signed {
            (1i128 << (self.width - 1)) - 1
        } else {
            (1i128 << self.width) - 1
        }
    }

    /// Returns the value of the least significant bit, i.e., 2^-frac.
    #[inline]
    pub fn resolution(&self) -> f64 {
        2f64.powi(-(self.frac as i32))
    }
}

/// What happens with values outside of the representable range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Overflow {
    /// Clamp to the smallest or largest representable value.
    #[default]
    Saturate,

    /// Keep the lowest `width` bits and let the value wrap around.
    Wrap,
}

/// Converts between real numbers and fixed-point words of a given format. The codec never fails,
/// values outside of the range are saturated or wrapped according to the overflow policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPointCodec {
    format: QFormat,
    overflow: Overflow,
}

impl FixedPointCodec {
    /// Creates a new codec. Panics if the format is invalid, see `QFormat::validate`.
    ///
    /// # Arguments
    /// * `format` - The fixed-point format of the words.
    /// * `overflow` - The overflow policy matching the hardware variant under test.
    pub fn new(format: QFormat, overflow: Overflow) -> Self {
        assert!(format.validate().is_ok(), "Invalid format {:?}", format);

        Self { format, overflow }
    }

    /// Returns the fixed-point format of the codec.
    #[inline]
    pub fn format(&self) -> QFormat {
        self.format
    }

    /// Returns the overflow policy of the codec.
    #[inline]
    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    /// Scales and rounds the value to an integer without applying any range policy.
    /// Rounding is to the nearest integer with ties away from zero.
    #[inline]
    pub fn quantize(&self, value: f64) -> i128 {
        (value * 2f64.powi(self.format.frac as i32)).round() as i128
    }

    /// Encodes the given real value into a word of the codec's format.
    ///
    /// # Arguments
    /// * `value` - The value to encode.
    pub fn encode(&self, value: f64) -> u64 {
        let scaled = self.quantize(value);

        let int = match self.overflow {
            Overflow::Saturate => scaled.clamp(self.format.min_int(), self.format.max_int()),
            Overflow::Wrap => scaled,
        };

        (int as u64) & self.format.mask()
    }

    /// Decodes the given word into a real value. Bits above the width are ignored.
    ///
    /// # Arguments
    /// * `bits` - The word to decode.
    pub fn decode(&self, bits: u64) -> f64 {
        self.to_signed(bits) as f64 / 2f64.powi(self.format.frac as i32)
    }

    /// Returns the integer value of the word, sign-extended for signed formats.
    ///
    /// # Arguments
    /// * `bits` - The word to interpret.
    pub fn to_signed(&self, bits: u64) -> i128 {
        let width = self.format.width;
        let value = (bits & self.format.mask()) as i128;

        if self.format.signed && (value >> (width - 1)) & 1 == 1 {
            value - (1i128 << width)
        } else {
            value
        }
    }

    /// Encodes every value of the given sequence.
    pub fn encode_all<I>(&self, values: I) -> Vec<u64>
    where
        I: IntoIterator<Item = f64>,
    {
        values.into_iter().map(|v| self.encode(v)).collect()
    }

    /// Decodes every word of the given sequence.
    pub fn decode_all<I>(&self, words: I) -> Vec<f64>
    where
        I: IntoIterator<Item = u64>,
    {
        words.into_iter().map(|w| self.decode(w)).collect()
    }

    /// Encodes the four components of a homogeneous vertex.
    pub fn encode_vertex(&self, v: &Vertex) -> [u64; 4] {
        [
            self.encode(v[0]),
            self.encode(v[1]),
            self.encode(v[2]),
            self.encode(v[3]),
        ]
    }

    /// Decodes the four words of a homogeneous vertex.
    pub fn decode_vertex(&self, words: &[u64; 4]) -> Vertex {
        Vertex::new(
            self.decode(words[0]),
            self.decode(words[1]),
            self.decode(words[2]),
            self.decode(words[3]),
        )
    }
}
