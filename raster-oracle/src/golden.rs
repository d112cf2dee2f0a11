use log::{debug, error, info};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    clipper::{clip_with, QuadSplit},
    fixed::FixedPointCodec,
    math::{Plane, Triangle, Vertex},
    stimulus::{classification_vectors, random_pixel, random_plane, random_triangle, PixelStimulus},
    zbuffer::DepthTestOracle,
    BenchConfig, Error, Result,
};

/// The encoding of vector and response files.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VectorFormat {
    #[default]
    Yaml,
    Bincode,
}

/// Writes the value in the given format.
pub(crate) fn write_as<T: Serialize, W: std::io::Write>(
    value: &T,
    writer: W,
    format: VectorFormat,
) -> Result<()> {
    match format {
        VectorFormat::Yaml => serde_yaml::to_writer(writer, value).map_err(|e| {
            error!("Failed to serialize as YAML: {:?}", e);
            Error::SerializationError(Box::new(e))
        }),
        VectorFormat::Bincode => bincode::serialize_into(writer, value)
            .map_err(|e| Error::SerializationError(Box::new(e))),
    }
}

/// Reads a value in the given format.
pub(crate) fn read_as<T: DeserializeOwned, R: std::io::Read>(
    reader: R,
    format: VectorFormat,
) -> Result<T> {
    match format {
        VectorFormat::Yaml => serde_yaml::from_reader(reader).map_err(|e| {
            error!("Failed to parse YAML: {:?}", e);
            Error::DeserializationError(Box::new(e))
        }),
        VectorFormat::Bincode => {
            bincode::deserialize_from(reader).map_err(|e| Error::DeserializationError(Box::new(e)))
        }
    }
}

/// The expected output of the clipper for one test vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipExpectation {
    pub valid: bool,
    pub num_triangles: usize,

    /// The emitted vertices, three per triangle.
    pub vertices: Vec<Vertex>,

    /// The emitted vertices encoded in the port format.
    pub vertex_words: Vec<[u64; 4]>,
}

/// A clipping test vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipCase {
    /// The triangle as seen by the hardware, i.e., after quantization.
    pub triangle: Triangle,

    /// The plane as seen by the hardware, i.e., after quantization.
    pub plane: Plane,

    /// The words to drive onto the vertex ports.
    pub triangle_words: [[u64; 4]; 3],

    /// The words to drive onto the plane ports (a, b, c, d).
    pub plane_words: [u64; 4],

    pub expected: ClipExpectation,
}

/// A depth test vector. The vectors must be applied in order since each one sees the buffer
/// state left behind by its predecessors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthCase {
    pub pixel: PixelStimulus,

    /// The memory address of the pixel.
    pub address: usize,

    /// The expected depth test result.
    pub expected_pass: bool,

    /// If true, the buffer is flushed after this vector.
    pub flush_after: bool,
}

/// A complete set of golden vectors for both stages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoldenSet {
    /// The seed the vectors have been generated with.
    pub seed: u64,

    pub clip: Vec<ClipCase>,
    pub depth: Vec<DepthCase>,
}

impl GoldenSet {
    /// Writes the golden set to the given writer.
    ///
    /// # Arguments
    /// * `writer` - The writer to write the vectors to.
    /// * `format` - The file encoding.
    pub fn write<W: std::io::Write>(&self, writer: W, format: VectorFormat) -> Result<()> {
        write_as(self, writer, format)
    }

    /// Reads the golden set from the given reader.
    ///
    /// # Arguments
    /// * `reader` - The reader to read the vectors from.
    /// * `format` - The file encoding.
    pub fn read<R: std::io::Read>(reader: R, format: VectorFormat) -> Result<Self> {
        read_as(reader, format)
    }
}

/// Generates the golden vectors described by a bench configuration.
pub struct GoldenGenerator {
    config: BenchConfig,
}

impl GoldenGenerator {
    /// Creates a new generator.
    ///
    /// # Arguments
    /// * `config` - The bench configuration.
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self { config })
    }

    /// Generates the golden vectors. The same configuration always yields the same vectors.
    pub fn run(&self) -> Result<GoldenSet> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        info!("Seed: {}", self.config.seed);
        info!("Iterations: {}", self.config.iterations);

        info!("Generating clipper vectors...");
        let clip = self.generate_clip_cases(&mut rng);

        info!("Generating depth test vectors...");
        let depth = self.generate_depth_cases(&mut rng)?;

        info!(
            "Generated {} clipper and {} depth test vectors",
            clip.len(),
            depth.len()
        );

        Ok(GoldenSet {
            seed: self.config.seed,
            clip,
            depth,
        })
    }

    /// Creates the clipping vectors, starting with the directed classification vectors.
    ///
    /// # Arguments
    /// * `rng` - The random number generator for the stimulus.
    fn generate_clip_cases(&self, rng: &mut ChaCha8Rng) -> Vec<ClipCase> {
        let setup = &self.config.clip;
        let codec = setup.codec();
        let [lo, hi] = setup.coordinate_range;

        let directed = classification_vectors()
            .into_iter()
            .map(|v| (v.triangle, v.plane));

        let random: Vec<(Triangle, Plane)> = (0..self.config.iterations)
            .map(|_| (random_triangle(rng, lo..hi), random_plane(rng)))
            .collect();

        directed
            .chain(random)
            .enumerate()
            .map(|(index, (triangle, plane))| {
                if index % (self.config.iterations / 10).max(1) == 0 {
                    debug!("Clipper vector {}/{}", index, self.config.iterations);
                }

                Self::make_clip_case(&codec, setup.quad_split, &triangle, &plane)
            })
            .collect()
    }

    /// Quantizes the stimulus and computes the expected clipper output for it.
    fn make_clip_case(
        codec: &FixedPointCodec,
        split: QuadSplit,
        triangle: &Triangle,
        plane: &Plane,
    ) -> ClipCase {
        let triangle_words = [
            codec.encode_vertex(&triangle[0]),
            codec.encode_vertex(&triangle[1]),
            codec.encode_vertex(&triangle[2]),
        ];
        let plane_words = codec.encode_vertex(&plane.equation());

        // the golden model sees the same values as the hardware
        let triangle = [
            codec.decode_vertex(&triangle_words[0]),
            codec.decode_vertex(&triangle_words[1]),
            codec.decode_vertex(&triangle_words[2]),
        ];
        let plane = Plane::from_equation(&codec.decode_vertex(&plane_words));

        let result = clip_with(&triangle, &plane, split);
        let vertices = result.vertices().to_vec();
        let vertex_words = vertices.iter().map(|v| codec.encode_vertex(v)).collect();

        ClipCase {
            triangle,
            plane,
            triangle_words,
            plane_words,
            expected: ClipExpectation {
                valid: result.is_valid(),
                num_triangles: result.num_triangles(),
                vertices,
                vertex_words,
            },
        }
    }

    /// Creates the depth test vectors by replaying random pixels through the depth test oracle.
    ///
    /// # Arguments
    /// * `rng` - The random number generator for the stimulus.
    fn generate_depth_cases(&self, rng: &mut ChaCha8Rng) -> Result<Vec<DepthCase>> {
        let setup = &self.config.depth;
        let mut oracle = DepthTestOracle::new(setup.buffer)?;
        let mut cases = Vec::with_capacity(self.config.iterations);
        let mut num_flushes = 0;

        for _ in 0..self.config.iterations {
            let pixel = random_pixel(rng, &setup.buffer);
            let address = oracle.buffer().address_of(pixel.x, pixel.y)?;
            let expected_pass = oracle.test_and_commit(pixel.x, pixel.y, pixel.z, pixel.func)?;

            let flush_after = rng.random::<f64>() < setup.flush_probability;
            if flush_after {
                oracle.flush();
                num_flushes += 1;
            }

            cases.push(DepthCase {
                pixel,
                address,
                expected_pass,
                flush_after,
            });
        }

        debug!("Depth test vectors contain {} flushes", num_flushes);

        Ok(cases)
    }
}

#[cfg(test)]
mod test {
    use crate::{fixed::Overflow, zbuffer::DepthFunc};

    use super::*;

    fn small_config() -> BenchConfig {
        let mut config = BenchConfig::default();
        config.seed = 17;
        config.iterations = 200;
        config.depth.flush_probability = 0.05;
        config
    }

    #[test]
    fn test_deterministic() {
        let a = GoldenGenerator::new(small_config()).unwrap().run().unwrap();
        let b = GoldenGenerator::new(small_config()).unwrap().run().unwrap();
        assert_eq!(a, b);

        let mut other = small_config();
        other.seed = 18;
        let c = GoldenGenerator::new(other).unwrap().run().unwrap();
        assert_ne!(a.clip, c.clip);
    }

    #[test]
    fn test_clip_cases() {
        let set = GoldenGenerator::new(small_config()).unwrap().run().unwrap();

        // directed vectors come first
        assert_eq!(set.clip.len(), 204);
        let counts: Vec<usize> = set.clip[..4]
            .iter()
            .map(|c| c.expected.num_triangles)
            .collect();
        assert_eq!(counts, vec![0, 1, 2, 1]);

        let codec = small_config().clip.codec();
        for case in set.clip.iter() {
            assert_eq!(case.expected.vertices.len(), 3 * case.expected.num_triangles);
            assert_eq!(case.expected.valid, case.expected.num_triangles > 0);
            assert_eq!(case.expected.vertex_words.len(), case.expected.vertices.len());

            // the stored stimulus decodes from its words
            for (v, words) in case.triangle.iter().zip(case.triangle_words.iter()) {
                assert_eq!(codec.decode_vertex(words), *v);
            }
        }
    }

    #[test]
    fn test_depth_cases_replay() {
        let config = small_config();
        let set = GoldenGenerator::new(config.clone()).unwrap().run().unwrap();
        assert_eq!(set.depth.len(), 200);

        let mut oracle = DepthTestOracle::new(config.depth.buffer).unwrap();
        for case in set.depth.iter() {
            let p = case.pixel;
            assert_eq!(
                oracle.test_and_commit(p.x, p.y, p.z, p.func).unwrap(),
                case.expected_pass
            );
            if case.flush_after {
                oracle.flush();
            }
        }

        assert!(set.depth.iter().any(|c| c.expected_pass));
        assert!(set
            .depth
            .iter()
            .any(|c| c.pixel.func == DepthFunc::Never || !c.expected_pass));
    }

    #[test]
    fn test_write_read() {
        let mut config = small_config();
        config.iterations = 20;
        config.clip.overflow = Overflow::Saturate;
        let set = GoldenGenerator::new(config).unwrap().run().unwrap();

        for format in [VectorFormat::Yaml, VectorFormat::Bincode] {
            let mut data = Vec::new();
            set.write(&mut data, format).unwrap();
            let loaded = GoldenSet::read(&data[..], format).unwrap();
            assert_eq!(loaded, set, "{:?}", format);
        }
    }

    #[test]
    fn test_invalid_config() {
        let mut config = small_config();
        config.depth.buffer.z_size = 0;
        assert!(GoldenGenerator::new(config).is_err());
    }
}
