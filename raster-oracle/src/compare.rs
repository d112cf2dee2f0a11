use std::fmt::{Debug, Display};

use log::error;
use serde::{Deserialize, Serialize};

use crate::{math::Vertex, Error, Result};

/// Values which can be compared against a hardware result with an absolute tolerance.
pub trait ToleranceCompare {
    /// Returns the largest absolute difference between corresponding components. Values with a
    /// different shape or containing NaN return infinity.
    fn max_abs_diff(&self, other: &Self) -> f64;
}

/// Absolute difference where NaN never compares as equal.
#[inline]
fn abs_diff(a: f64, b: f64) -> f64 {
    let d = (a - b).abs();
    if d.is_nan() {
        f64::INFINITY
    } else {
        d
    }
}

impl ToleranceCompare for f64 {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        abs_diff(*self, *other)
    }
}

impl ToleranceCompare for [f64] {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }

        self.iter()
            .zip(other.iter())
            .map(|(a, b)| abs_diff(*a, *b))
            .fold(0f64, f64::max)
    }
}

impl<const N: usize> ToleranceCompare for [f64; N] {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        self[..].max_abs_diff(&other[..])
    }
}

impl ToleranceCompare for Vertex {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        self.as_slice().max_abs_diff(other.as_slice())
    }
}

impl ToleranceCompare for [Vertex] {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }

        self.iter()
            .zip(other.iter())
            .map(|(a, b)| a.max_abs_diff(b))
            .fold(0f64, f64::max)
    }
}

impl ToleranceCompare for Vec<Vertex> {
    fn max_abs_diff(&self, other: &Self) -> f64 {
        self.as_slice().max_abs_diff(other.as_slice())
    }
}

/// Returns true if every component of the hardware value is within the absolute tolerance of the
/// golden value.
///
/// # Arguments
/// * `golden` - The value of the golden model.
/// * `hardware` - The decoded value reported by the hardware.
/// * `tolerance` - The largest allowed absolute difference per component.
pub fn within_tolerance<T>(golden: &T, hardware: &T, tolerance: f64) -> bool
where
    T: ToleranceCompare + ?Sized,
{
    golden.max_abs_diff(hardware) <= tolerance
}

/// Computes the relative error 2 * (a - b) / (a + b). Returns `Some(0.0)` if both values are zero
/// or both magnitudes are below the threshold and `None` if the error is undefined, i.e., a + b is
/// zero.
///
/// # Arguments
/// * `a` - The first value.
/// * `b` - The second value.
/// * `threshold` - Magnitudes below this value are not considered.
pub fn relative_error(a: f64, b: f64, threshold: f64) -> Option<f64> {
    if (a.abs() >= threshold || b.abs() >= threshold) && (a != 0f64 || b != 0f64) {
        if a + b != 0f64 {
            Some((a - b) / (a + b) * 2f64)
        } else {
            None
        }
    } else {
        Some(0f64)
    }
}

/// The diagnostic record of a hardware output that disagrees with the golden model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// The index of the test vector.
    pub iteration: usize,

    /// The stimulus which has been applied.
    pub inputs: String,

    /// The output of the golden model.
    pub golden: String,

    /// The output of the hardware.
    pub hardware: String,

    /// The largest absolute difference, infinite if the shapes differ.
    pub difference: f64,
}

impl Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Iteration {}", self.iteration)?;
        writeln!(f, "  Inputs:   {}", self.inputs)?;
        writeln!(f, "  Expected: {}", self.golden)?;
        writeln!(f, "  Hardware: {}", self.hardware)?;
        write!(f, "  Diff:     {}", self.difference)
    }
}

/// The reaction on a mismatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MismatchPolicy {
    /// Abort on the first mismatch.
    FailFast,

    /// Collect all mismatches and report them at the end.
    #[default]
    Aggregate,
}

/// Checks hardware outputs against golden values and keeps track of the mismatches.
#[derive(Debug)]
pub struct MismatchTracker {
    policy: MismatchPolicy,
    checked: usize,
    mismatches: Vec<Mismatch>,
}

impl MismatchTracker {
    /// Creates a new tracker.
    ///
    /// # Arguments
    /// * `policy` - Whether to fail on the first mismatch or to collect them.
    pub fn new(policy: MismatchPolicy) -> Self {
        Self {
            policy,
            checked: 0,
            mismatches: Vec::new(),
        }
    }

    /// Compares the hardware value against the golden one. Returns `Ok(true)` if they agree within
    /// the tolerance and `Ok(false)` for a recorded mismatch. With `MismatchPolicy::FailFast` a
    /// mismatch is returned as error instead.
    ///
    /// # Arguments
    /// * `iteration` - The index of the test vector.
    /// * `inputs` - The applied stimulus, only used for diagnostics.
    /// * `golden` - The value of the golden model.
    /// * `hardware` - The decoded value reported by the hardware.
    /// * `tolerance` - The largest allowed absolute difference per component.
    pub fn check<I, T>(
        &mut self,
        iteration: usize,
        inputs: &I,
        golden: &T,
        hardware: &T,
        tolerance: f64,
    ) -> Result<bool>
    where
        I: Debug + ?Sized,
        T: ToleranceCompare + Debug + ?Sized,
    {
        let difference = golden.max_abs_diff(hardware);
        self.checked += 1;

        if difference <= tolerance {
            return Ok(true);
        }

        self.record(Mismatch {
            iteration,
            inputs: format!("{:?}", inputs),
            golden: format!("{:?}", golden),
            hardware: format!("{:?}", hardware),
            difference,
        })?;

        Ok(false)
    }

    /// Compares two exact values, e.g., flags or counts.
    pub fn check_exact<I, T>(
        &mut self,
        iteration: usize,
        inputs: &I,
        golden: &T,
        hardware: &T,
    ) -> Result<bool>
    where
        I: Debug + ?Sized,
        T: PartialEq + Debug + ?Sized,
    {
        self.checked += 1;

        if golden == hardware {
            return Ok(true);
        }

        self.record(Mismatch {
            iteration,
            inputs: format!("{:?}", inputs),
            golden: format!("{:?}", golden),
            hardware: format!("{:?}", hardware),
            difference: f64::INFINITY,
        })?;

        Ok(false)
    }

    /// Records the given mismatch according to the policy.
    pub fn record(&mut self, mismatch: Mismatch) -> Result<()> {
        error!("Mismatch between hardware and golden model:\n{}", mismatch);

        match self.policy {
            MismatchPolicy::FailFast => Err(Error::Mismatch(Box::new(mismatch))),
            MismatchPolicy::Aggregate => {
                self.mismatches.push(mismatch);
                Ok(())
            }
        }
    }

    /// Returns the number of performed checks.
    #[inline]
    pub fn num_checked(&self) -> usize {
        self.checked
    }

    /// Returns the recorded mismatches.
    #[inline]
    pub fn mismatches(&self) -> &[Mismatch] {
        &self.mismatches
    }

    /// Finishes the checking. Returns the number of checks if all of them passed.
    pub fn finish(self) -> Result<usize> {
        if self.mismatches.is_empty() {
            Ok(self.checked)
        } else {
            Err(Error::ToleranceViolations {
                failed: self.mismatches.len(),
                checked: self.checked,
            })
        }
    }
}
