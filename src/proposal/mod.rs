//! Proposal module - the heart of the submission pipeline
//!
//! Stores proposed wheel batches and drives the two-step submission
//! workflow that checks them.

mod store;
mod workflow;

pub use store::{Proposal, ProposalCollection};
pub use workflow::{Submission, Verdict, RESERVED_FIELD};
