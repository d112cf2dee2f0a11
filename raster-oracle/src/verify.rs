use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    golden::{read_as, write_as, ClipCase, DepthCase, GoldenSet, VectorFormat},
    math::Vertex,
    ClipSetup, Error, MismatchPolicy, MismatchTracker, Result,
};

/// The clipper outputs captured from the hardware for one test vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipResponse {
    pub valid: bool,
    pub num_triangles: usize,

    /// The raw vertex words, three vertices per triangle.
    pub vertex_words: Vec<[u64; 4]>,
}

/// The depth test output captured from the hardware for one test vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthResponse {
    pub pass: bool,
}

/// All outputs captured from the hardware, in the order of the golden vectors.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareResponses {
    #[serde(default)]
    pub clip: Vec<ClipResponse>,

    #[serde(default)]
    pub depth: Vec<DepthResponse>,
}

impl HardwareResponses {
    /// Returns the responses of a hardware which behaves exactly like the golden model.
    pub fn from_golden(golden: &GoldenSet) -> Self {
        Self {
            clip: golden
                .clip
                .iter()
                .map(|c| ClipResponse {
                    valid: c.expected.valid,
                    num_triangles: c.expected.num_triangles,
                    vertex_words: c.expected.vertex_words.clone(),
                })
                .collect(),
            depth: golden
                .depth
                .iter()
                .map(|c| DepthResponse {
                    pass: c.expected_pass,
                })
                .collect(),
        }
    }

    /// Writes the responses to the given writer.
    pub fn write<W: std::io::Write>(&self, writer: W, format: VectorFormat) -> Result<()> {
        write_as(self, writer, format)
    }

    /// Reads the responses from the given reader.
    pub fn read<R: std::io::Read>(reader: R, format: VectorFormat) -> Result<Self> {
        read_as(reader, format)
    }
}

/// The outcome of checking hardware responses against the golden vectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyReport {
    pub num_checked: usize,
    pub num_mismatches: usize,
}

/// Checks the clipper responses against the golden vectors.
///
/// The flag and the triangle count are compared exactly. Vertices are only compared if both agree
/// and the triangle is valid, in which case each component must be within the tolerance after
/// decoding with the codec of the setup.
///
/// # Arguments
/// * `cases` - The golden clipping vectors.
/// * `responses` - The captured hardware outputs in the same order.
/// * `setup` - The clipping setup providing the codec and the tolerance.
/// * `tracker` - The tracker recording the mismatches.
pub fn verify_clip(
    cases: &[ClipCase],
    responses: &[ClipResponse],
    setup: &ClipSetup,
    tracker: &mut MismatchTracker,
) -> Result<()> {
    let codec = setup.codec();

    tracker.check_exact(
        cases.len(),
        "number of clipper responses",
        &cases.len(),
        &responses.len(),
    )?;

    for (iteration, (case, response)) in cases.iter().zip(responses.iter()).enumerate() {
        let inputs = (&case.triangle_words, &case.plane_words);

        let expected = (case.expected.valid, case.expected.num_triangles);
        let actual = (response.valid, response.num_triangles);
        if !tracker.check_exact(iteration, &inputs, &expected, &actual)? || !case.expected.valid {
            continue;
        }

        let vertices: Vec<Vertex> = response
            .vertex_words
            .iter()
            .map(|words| codec.decode_vertex(words))
            .collect();

        tracker.check(
            iteration,
            &inputs,
            &case.expected.vertices,
            &vertices,
            setup.tolerance,
        )?;
    }

    Ok(())
}

/// Checks the depth test responses against the golden vectors.
///
/// # Arguments
/// * `cases` - The golden depth test vectors.
/// * `responses` - The captured hardware outputs in the same order.
/// * `tracker` - The tracker recording the mismatches.
pub fn verify_depth(
    cases: &[DepthCase],
    responses: &[DepthResponse],
    tracker: &mut MismatchTracker,
) -> Result<()> {
    tracker.check_exact(
        cases.len(),
        "number of depth test responses",
        &cases.len(),
        &responses.len(),
    )?;

    for (iteration, (case, response)) in cases.iter().zip(responses.iter()).enumerate() {
        tracker.check_exact(iteration, &case.pixel, &case.expected_pass, &response.pass)?;
    }

    Ok(())
}

/// The reaction on a stage without any hardware responses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MissingStage {
    /// Fail with `Error::NoResponses` if the stage has golden vectors.
    #[default]
    Fail,

    /// Skip the stage with a warning. At least one stage must still be checked.
    Skip,
}

/// Returns true if the stage has responses to check. A stage without responses is an error
/// unless skipping is allowed or there are no golden vectors for it either.
fn has_responses(
    stage: &'static str,
    expected: usize,
    received: usize,
    missing: MissingStage,
) -> Result<bool> {
    if received > 0 {
        return Ok(true);
    }

    if expected > 0 && missing == MissingStage::Fail {
        error!("No {} responses, but {} golden vectors", stage, expected);
        return Err(Error::NoResponses { stage, expected });
    }

    warn!("No {} responses, skipping the stage", stage);

    Ok(false)
}

/// Checks all hardware responses against the golden set. Fails with `Error::NoResponses` if
/// nothing could be checked at all.
///
/// # Arguments
/// * `golden` - The golden vectors.
/// * `responses` - The captured hardware outputs.
/// * `setup` - The clipping setup providing the codec and the tolerance.
/// * `policy` - Whether to stop at the first mismatch.
/// * `missing` - Whether a stage without any responses fails the check.
pub fn verify(
    golden: &GoldenSet,
    responses: &HardwareResponses,
    setup: &ClipSetup,
    policy: MismatchPolicy,
    missing: MissingStage,
) -> Result<VerifyReport> {
    let mut tracker = MismatchTracker::new(policy);

    if has_responses("clipper", golden.clip.len(), responses.clip.len(), missing)? {
        info!("Checking {} clipper responses...", responses.clip.len());
        verify_clip(&golden.clip, &responses.clip, setup, &mut tracker)?;
    }

    if has_responses("depth test", golden.depth.len(), responses.depth.len(), missing)? {
        info!("Checking {} depth test responses...", responses.depth.len());
        verify_depth(&golden.depth, &responses.depth, &mut tracker)?;
    }

    if tracker.num_checked() == 0 {
        error!("No hardware responses have been checked");
        return Err(Error::NoResponses {
            stage: "any",
            expected: golden.clip.len() + golden.depth.len(),
        });
    }

    let report = VerifyReport {
        num_checked: tracker.num_checked(),
        num_mismatches: tracker.mismatches().len(),
    };

    info!(
        "{} checks, {} mismatches",
        report.num_checked, report.num_mismatches
    );

    tracker.finish()?;

    Ok(report)
}

#[cfg(test)]
mod test {
    use crate::{BenchConfig, GoldenGenerator};

    use super::*;

    const FAIL_FAST: MismatchPolicy = MismatchPolicy::FailFast;

    fn golden() -> (BenchConfig, GoldenSet) {
        let mut config = BenchConfig::default();
        config.seed = 3;
        config.iterations = 100;
        let set = GoldenGenerator::new(config.clone()).unwrap().run().unwrap();
        (config, set)
    }

    #[test]
    fn test_matching_hardware() {
        let (config, set) = golden();
        let responses = HardwareResponses::from_golden(&set);

        let report = verify(
            &set,
            &responses,
            &config.clip,
            MismatchPolicy::FailFast,
            MissingStage::Fail,
        )
        .unwrap();
        assert_eq!(report.num_mismatches, 0);
        assert!(report.num_checked >= set.clip.len() + set.depth.len());
    }

    #[test]
    fn test_vertex_within_tolerance() {
        let (config, set) = golden();
        let mut responses = HardwareResponses::from_golden(&set);

        // one LSB of deviation is accepted
        let index = set.clip.iter().position(|c| c.expected.valid).unwrap();
        let word = &mut responses.clip[index].vertex_words[0][0];
        *word = (*word + 1) & config.clip.format.mask();

        let mut tracker = MismatchTracker::new(MismatchPolicy::Aggregate);
        verify_clip(&set.clip, &responses.clip, &config.clip, &mut tracker).unwrap();
        assert!(tracker.mismatches().is_empty());
    }

    #[test]
    fn test_vertex_mismatch() {
        let (config, set) = golden();
        let mut responses = HardwareResponses::from_golden(&set);

        // 100.0 is beyond the tolerance of 10.0
        let codec = config.clip.codec();
        let index = set.clip.iter().position(|c| c.expected.valid).unwrap();
        let mut v = set.clip[index].expected.vertices[0];
        v.x += 100.0;
        responses.clip[index].vertex_words[0] = codec.encode_vertex(&v);

        let mut tracker = MismatchTracker::new(MismatchPolicy::Aggregate);
        verify_clip(&set.clip, &responses.clip, &config.clip, &mut tracker).unwrap();
        assert_eq!(tracker.mismatches().len(), 1);
        assert_eq!(tracker.mismatches()[0].iteration, index);
    }

    #[test]
    fn test_flag_mismatch_skips_vertices() {
        let (config, set) = golden();
        let mut responses = HardwareResponses::from_golden(&set);

        let index = set.clip.iter().position(|c| c.expected.valid).unwrap();
        responses.clip[index].valid = false;
        responses.clip[index].vertex_words.clear();

        let mut tracker = MismatchTracker::new(MismatchPolicy::Aggregate);
        verify_clip(&set.clip, &responses.clip, &config.clip, &mut tracker).unwrap();
        assert_eq!(tracker.mismatches().len(), 1);
        assert!(tracker.mismatches()[0].difference.is_infinite());
    }

    #[test]
    fn test_depth_mismatch() {
        let (config, set) = golden();
        let mut responses = HardwareResponses::from_golden(&set);
        responses.depth[5].pass = !responses.depth[5].pass;
        responses.depth[9].pass = !responses.depth[9].pass;

        let policy = MismatchPolicy::Aggregate;
        match verify(&set, &responses, &config.clip, policy, MissingStage::Fail) {
            Err(Error::ToleranceViolations { failed, .. }) => assert_eq!(failed, 2),
            other => panic!("Expected violations, got {:?}", other),
        }

        assert!(matches!(
            verify(&set, &responses, &config.clip, FAIL_FAST, MissingStage::Fail),
            Err(Error::Mismatch(m)) if m.iteration == 5
        ));
    }

    #[test]
    fn test_missing_responses() {
        let (config, set) = golden();
        let mut responses = HardwareResponses::from_golden(&set);
        responses.depth.pop();

        let mut tracker = MismatchTracker::new(MismatchPolicy::Aggregate);
        verify_depth(&set.depth, &responses.depth, &mut tracker).unwrap();
        assert_eq!(tracker.mismatches().len(), 1);

        // a stage without responses fails unless skipping is allowed
        responses.depth.clear();
        assert!(matches!(
            verify(&set, &responses, &config.clip, FAIL_FAST, MissingStage::Fail),
            Err(Error::NoResponses {
                stage: "depth test",
                expected: 100
            })
        ));
        let report = verify(
            &set,
            &responses,
            &config.clip,
            MismatchPolicy::FailFast,
            MissingStage::Skip,
        )
        .unwrap();
        assert!(report.num_checked > 0);
    }

    #[test]
    fn test_no_responses() {
        let (config, set) = golden();
        let responses = HardwareResponses::default();

        assert!(matches!(
            verify(&set, &responses, &config.clip, FAIL_FAST, MissingStage::Fail),
            Err(Error::NoResponses {
                stage: "clipper",
                ..
            })
        ));

        // skipping every stage still leaves nothing checked
        assert!(matches!(
            verify(&set, &responses, &config.clip, FAIL_FAST, MissingStage::Skip),
            Err(Error::NoResponses { stage: "any", .. })
        ));
    }

    #[test]
    fn test_write_read() {
        let (_, set) = golden();
        let responses = HardwareResponses::from_golden(&set);

        for format in [VectorFormat::Yaml, VectorFormat::Bincode] {
            let mut data = Vec::new();
            responses.write(&mut data, format).unwrap();
            assert_eq!(
                HardwareResponses::read(&data[..], format).unwrap(),
                responses
            );
        }
    }
}
