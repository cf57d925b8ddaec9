//! Conflict checking over a proposed wheel batch.
//!
//! The checker is a collaborator behind a trait: the workflow hands it the
//! materialized wheel references of a freshly written proposal and records
//! whatever it decides. Any error from a checker is the expected "conflict
//! found" outcome, never a request failure.

use std::collections::HashSet;
use std::fmt;

/// Signalled when a wheel batch cannot be accepted as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub reason: String,
}

impl Conflict {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conflict: {}", self.reason)
    }
}

/// Decides whether a batch of wheel references can coexist.
pub trait ConflictChecker: Send + Sync {
    fn check(&self, wheels: &[String]) -> Result<(), Conflict>;
}

/// Default checker: rejects batches that carry two wheels for the same
/// distribution, and wheels whose filename does not parse at all.
#[derive(Debug, Default)]
pub struct WheelSetChecker;

impl ConflictChecker for WheelSetChecker {
    fn check(&self, wheels: &[String]) -> Result<(), Conflict> {
        let mut seen = HashSet::new();
        for whl in wheels {
            let dist = distribution_name(whl)
                .ok_or_else(|| Conflict::new(format!("unparseable wheel filename '{whl}'")))?;
            if !seen.insert(dist.to_ascii_lowercase()) {
                return Err(Conflict::new(format!(
                    "multiple wheels for distribution '{dist}'"
                )));
            }
        }
        Ok(())
    }
}

/// Distribution stem of a wheel filename (`name-version-tags.whl`).
fn distribution_name(whl: &str) -> Option<&str> {
    let filename = whl.rsplit('/').next()?;
    let stem = filename.strip_suffix(".whl")?;
    let mut parts = stem.split('-');
    let name = parts.next()?;
    // a well-formed stem carries at least a version and a python tag after the name
    if name.is_empty() || parts.count() < 2 {
        return None;
    }
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn batch(wheels: &[&str]) -> Vec<String> {
        wheels.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn distinct_distributions_pass() {
        let wheels = batch(&[
            "alpha-1.0-py3-none-any.whl",
            "beta-2.0-py3-none-any.whl",
        ]);
        assert_eq!(WheelSetChecker.check(&wheels), Ok(()));
    }

    #[test]
    fn empty_batch_passes() {
        assert_eq!(WheelSetChecker.check(&[]), Ok(()));
    }

    #[test]
    fn duplicate_distribution_conflicts() {
        let wheels = batch(&[
            "alpha-1.0-py3-none-any.whl",
            "Alpha-1.1-py3-none-any.whl",
        ]);
        assert!(WheelSetChecker.check(&wheels).is_err());
    }

    #[test]
    fn unparseable_filename_conflicts() {
        assert!(WheelSetChecker.check(&batch(&["not-a.wheel"])).is_err());
        assert!(WheelSetChecker.check(&batch(&["bare.whl"])).is_err());
    }

    #[test]
    fn path_prefixes_are_ignored() {
        let wheels = batch(&["https://files.example.org/alpha-1.0-py3-none-any.whl"]);
        assert_eq!(WheelSetChecker.check(&wheels), Ok(()));
    }
}
