//! Two-step submission workflow
//!
//! A submission declares its package names first, then supplies one wheel
//! reference per package. Completing the second step creates a fresh
//! proposal, writes every entry, runs the conflict check over the stored
//! wheels and records the verdict. The state machine is transport-agnostic;
//! the HTTP layer parks the intermediate state in
//! [`crate::session::PendingSubmissions`] between requests.

use crate::check::ConflictChecker;
use crate::error::AppError;
use crate::proposal::ProposalCollection;
use std::collections::HashMap;
use tracing::info;

/// Field name of the submit marker in posted wheel forms. Never stored.
pub const RESERVED_FIELD: &str = "submit";

/// Outcome of a completed submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub proposal_id: String,
    pub conflict: bool,
}

/// One submission moving through the two-step protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Waiting for the comma-separated package list.
    AwaitingPackages,
    /// Packages declared; waiting for one wheel reference per package.
    AwaitingWheels { packages: Vec<String> },
    /// Terminal: entries written and verdict recorded.
    Checked(Verdict),
}

impl Submission {
    pub fn start() -> Self {
        Submission::AwaitingPackages
    }

    /// Declared package names, if the submission has reached that stage.
    pub fn packages(&self) -> Option<&[String]> {
        match self {
            Submission::AwaitingWheels { packages } => Some(packages),
            _ => None,
        }
    }

    /// Recorded verdict, if the submission has completed.
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Submission::Checked(verdict) => Some(verdict),
            _ => None,
        }
    }

    /// Declare the packages this submission will propose wheels for.
    pub fn declare_packages(self, raw: &str) -> Result<Self, AppError> {
        match self {
            Submission::AwaitingPackages => Ok(Submission::AwaitingWheels {
                packages: parse_package_list(raw)?,
            }),
            _ => Err(AppError::MalformedInput(
                "package list was already declared for this submission".to_string(),
            )),
        }
    }

    /// Supply the wheel references and run the conflict check.
    ///
    /// Entries are written before the check runs and are kept regardless of
    /// the verdict; a store failure can leave a proposal without a status
    /// row, which readers treat as "never checked".
    pub async fn submit_wheels(
        self,
        proposals: &ProposalCollection,
        checker: &dyn ConflictChecker,
        fields: &HashMap<String, String>,
    ) -> Result<Self, AppError> {
        let packages = match self {
            Submission::AwaitingWheels { packages } => packages,
            _ => {
                return Err(AppError::MalformedInput(
                    "no declared package list for this submission".to_string(),
                ))
            }
        };

        let entries = collect_entries(&packages, fields)?;
        let proposal = proposals.new_proposal();
        for (pkg, whl) in &entries {
            proposal.set(pkg, whl).await?;
        }

        let wheels = proposal.wheels().await?;
        let conflict = match checker.check(&wheels) {
            Ok(()) => false,
            Err(found) => {
                info!(proposal = proposal.id(), reason = %found.reason, "Conflict found");
                true
            }
        };
        proposal.set_status(conflict).await?;

        Ok(Submission::Checked(Verdict {
            proposal_id: proposal.id().to_string(),
            conflict,
        }))
    }
}

/// Split a comma-separated package list, trimming whitespace and dropping
/// empty segments.
pub fn parse_package_list(raw: &str) -> Result<Vec<String>, AppError> {
    let packages: Vec<String> = raw
        .split(',')
        .map(|pkg| pkg.trim().to_string())
        .filter(|pkg| !pkg.is_empty())
        .collect();
    if packages.is_empty() {
        return Err(AppError::MalformedInput(
            "no package names in submission".to_string(),
        ));
    }
    Ok(packages)
}

/// Pair posted fields into (package, wheel) entries.
///
/// The reserved submit marker is dropped. Every declared package must carry
/// a non-empty wheel reference; extra fields are kept as entries, matching
/// the form posts this protocol was built for.
pub fn collect_entries(
    packages: &[String],
    fields: &HashMap<String, String>,
) -> Result<Vec<(String, String)>, AppError> {
    for pkg in packages {
        match fields.get(pkg) {
            Some(whl) if !whl.trim().is_empty() => {}
            _ => {
                return Err(AppError::MalformedInput(format!(
                    "missing wheel reference for package '{pkg}'"
                )))
            }
        }
    }
    Ok(fields
        .iter()
        .filter(|(name, _)| name.as_str() != RESERVED_FIELD)
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check::{Conflict, WheelSetChecker};
    use pretty_assertions::assert_eq;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn package_list_is_split_and_trimmed() {
        let packages = parse_package_list("alpha, beta ,gamma").unwrap();
        assert_eq!(packages, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn empty_package_list_is_malformed() {
        assert!(matches!(
            parse_package_list(" , ,"),
            Err(AppError::MalformedInput(_))
        ));
    }

    #[test]
    fn declare_packages_only_from_initial_state() {
        let submission = Submission::start().declare_packages("alpha").unwrap();
        assert_eq!(
            submission,
            Submission::AwaitingWheels {
                packages: vec!["alpha".to_string()]
            }
        );
        assert!(submission.declare_packages("beta").is_err());
    }

    #[test]
    fn submit_marker_is_never_an_entry() {
        let packages = vec!["alpha".to_string()];
        let entries = collect_entries(
            &packages,
            &fields(&[("alpha", "alpha-1.0-py3-none-any.whl"), ("submit", "Submit")]),
        )
        .unwrap();
        assert_eq!(
            entries,
            vec![("alpha".to_string(), "alpha-1.0-py3-none-any.whl".to_string())]
        );
    }

    #[test]
    fn missing_wheel_reference_is_malformed() {
        let packages = vec!["alpha".to_string(), "beta".to_string()];
        let result = collect_entries(&packages, &fields(&[("alpha", "alpha-1.0-py3-none-any.whl")]));
        assert!(matches!(result, Err(AppError::MalformedInput(_))));

        let result = collect_entries(
            &packages,
            &fields(&[("alpha", "alpha-1.0-py3-none-any.whl"), ("beta", "  ")]),
        );
        assert!(matches!(result, Err(AppError::MalformedInput(_))));
    }

    /// Checker that always signals a conflict, for exercising the failure leg.
    struct AlwaysConflicts;

    impl crate::check::ConflictChecker for AlwaysConflicts {
        fn check(&self, _wheels: &[String]) -> Result<(), Conflict> {
            Err(Conflict::new("induced"))
        }
    }

    #[tokio::test]
    async fn clean_batch_records_no_conflict() {
        let Some(proposals) = crate::proposal::store::tests::test_collection().await else {
            return;
        };
        let submission = Submission::start().declare_packages("alpha,beta").unwrap();
        let submission = submission
            .submit_wheels(
                &proposals,
                &WheelSetChecker,
                &fields(&[
                    ("alpha", "alpha-1.0-py3-none-any.whl"),
                    ("beta", "beta-2.0-py3-none-any.whl"),
                    ("submit", "Submit"),
                ]),
            )
            .await
            .unwrap();

        let Submission::Checked(verdict) = submission else {
            panic!("submission did not reach the checked state");
        };
        assert!(!verdict.conflict);

        let proposal = proposals.get(verdict.proposal_id);
        assert_eq!(proposal.status().await.unwrap(), Some(false));
        let mut wheels = proposal.wheels().await.unwrap();
        wheels.sort();
        assert_eq!(
            wheels,
            vec!["alpha-1.0-py3-none-any.whl", "beta-2.0-py3-none-any.whl"]
        );
        assert!(proposal.get("submit").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn conflicting_batch_keeps_entries_and_records_conflict() {
        let Some(proposals) = crate::proposal::store::tests::test_collection().await else {
            return;
        };
        let submission = Submission::start().declare_packages("alpha,beta").unwrap();
        let submission = submission
            .submit_wheels(
                &proposals,
                &AlwaysConflicts,
                &fields(&[
                    ("alpha", "alpha-1.0-py3-none-any.whl"),
                    ("beta", "beta-2.0-py3-none-any.whl"),
                ]),
            )
            .await
            .unwrap();

        let Submission::Checked(verdict) = submission else {
            panic!("submission did not reach the checked state");
        };
        assert!(verdict.conflict);

        let proposal = proposals.get(verdict.proposal_id);
        assert_eq!(proposal.status().await.unwrap(), Some(true));
        assert_eq!(proposal.wheels().await.unwrap().len(), 2);
    }
}
