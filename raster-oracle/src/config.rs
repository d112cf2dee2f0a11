use log::error;
use serde::{Deserialize, Serialize};

use crate::{
    clipper::QuadSplit,
    fixed::{FixedPointCodec, Overflow, QFormat},
    zbuffer::DepthBufferConfig,
    Error, Result,
};

/// The configuration for generating and checking golden vectors
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BenchConfig {
    /// The seed of the stimulus generator. The same seed always yields the same vectors.
    pub seed: u64,

    /// The number of random vectors per stage.
    pub iterations: usize,

    /// The setup of the clipping stage.
    pub clip: ClipSetup,

    /// The setup of the depth test stage.
    pub depth: DepthSetup,
}

/// The setup of the clipping stage
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ClipSetup {
    /// The fixed-point format of the vertex and plane ports.
    pub format: QFormat,

    /// The overflow behavior of the hardware variant under test.
    #[serde(default)]
    pub overflow: Overflow,

    /// The range of the random x, y and z coordinates.
    pub coordinate_range: [f64; 2],

    /// The largest allowed absolute difference per vertex component.
    pub tolerance: f64,

    /// The vertex order of the hardware when two triangles are emitted.
    #[serde(default)]
    pub quad_split: QuadSplit,
}

impl ClipSetup {
    /// Returns the codec for the vertex and plane ports.
    pub fn codec(&self) -> FixedPointCodec {
        FixedPointCodec::new(self.format, self.overflow)
    }
}

/// The setup of the depth test stage
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DepthSetup {
    /// The geometry of the depth memory.
    #[serde(flatten)]
    pub buffer: DepthBufferConfig,

    /// The probability of a flush after each pixel.
    #[serde(default)]
    pub flush_probability: f64,
}

impl BenchConfig {
    /// Reads the configuration from the provided reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the configuration from.
    pub fn read<R: std::io::Read>(reader: R) -> Result<Self> {
        // deserialize into the bench config
        let config: BenchConfig = serde_yaml::from_reader(reader).map_err(|e| {
            error!("Failed to parse the configuration: {:?}", e);

            Error::DeserializationError(Box::new(e))
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Writes the configuration to the provided writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the configuration to.
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<()> {
        // serialize the configuration into a string
        let yaml = serde_yaml::to_string(&self).map_err(|e| {
            error!("Failed to serialize the configuration: {:?}", e);

            Error::SerializationError(Box::new(e))
        })?;

        // write the string to the writer
        writer.write_all(yaml.as_bytes())?;

        Ok(())
    }

    /// Checks the configuration for values the oracles cannot work with.
    pub fn validate(&self) -> Result<()> {
        self.clip.format.validate()?;

        let [lo, hi] = self.clip.coordinate_range;
        if !(lo < hi) {
            return Err(Error::InvalidConfig(format!(
                "Coordinate range [{}, {}] is empty",
                lo, hi
            )));
        }

        if !(self.clip.tolerance >= 0f64) {
            return Err(Error::InvalidConfig(format!(
                "Tolerance must not be negative, but is {}",
                self.clip.tolerance
            )));
        }

        self.depth.buffer.validate()?;

        if !(0f64..=1f64).contains(&self.depth.flush_probability) {
            return Err(Error::InvalidConfig(format!(
                "Flush probability must be between 0 and 1, but is {}",
                self.depth.flush_probability
            )));
        }

        Ok(())
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            iterations: 1000,
            clip: ClipSetup {
                format: QFormat::signed(24, 12),
                overflow: Overflow::Wrap,
                coordinate_range: [-1280.0, 1279.0],
                tolerance: 10.0,
                quad_split: QuadSplit::Cyclic,
            },
            depth: DepthSetup {
                buffer: DepthBufferConfig::new(64, 48, 16),
                flush_probability: 0.01,
            },
        }
    }
}
