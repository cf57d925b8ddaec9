//! Application state management
//!
//! Contains shared state accessible across all handlers. Proposal entries,
//! verdicts and user accounts live in PostgreSQL; only the package lists of
//! in-flight submissions are held in memory.

use crate::check::{ConflictChecker, WheelSetChecker};
use crate::proposal::ProposalCollection;
use crate::session::PendingSubmissions;
use crate::users::UserService;
use deadpool_postgres::Pool;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Database connection pool (required)
    pub db_pool: Pool,

    /// Proposal store; owns the proposal and autocheck tables
    pub proposals: ProposalCollection,

    /// Package lists of submissions between their two steps
    pub submissions: PendingSubmissions,

    /// Conflict checker invoked when a submission completes
    pub checker: Arc<dyn ConflictChecker>,

    /// User accounts for authentication
    pub users: UserService,
}

impl AppState {
    /// Assemble the state around an initialized pool and proposal store.
    pub fn new(pool: Pool, proposals: ProposalCollection) -> Self {
        let users = UserService::new(pool.clone());
        Self {
            db_pool: pool,
            proposals,
            submissions: PendingSubmissions::new(),
            checker: Arc::new(WheelSetChecker),
            users,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
