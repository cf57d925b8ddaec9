//! Proposal storage
//!
//! PostgreSQL-backed store for wheel proposals. A proposal is a batch of
//! package -> wheel entries namespaced by an opaque identity, plus an
//! optional conflict verdict recorded once the batch has been checked.

use crate::error::AppError;
use deadpool_postgres::Pool;
use tracing::debug;
use uuid::Uuid;

/// Handle to one proposal's entries and verdict.
///
/// A handle is a view: it owns no data and never checks that its identity
/// has any entries. Every read and write goes straight to the backing
/// tables, so two handles for the same identity observe the same rows.
pub struct Proposal {
    pool: Pool,
    id: String,
}

impl Proposal {
    /// Opaque identity of this proposal.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// All wheel references stored for this proposal.
    ///
    /// Order is whatever the engine returns; callers must not depend on it.
    pub async fn wheels(&self) -> Result<Vec<String>, AppError> {
        let client = self.pool.get().await?;
        let rows = client
            .query("SELECT whl FROM proposal WHERE uuid = $1", &[&self.id])
            .await?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    /// Wheel references recorded for one package.
    ///
    /// The composite key keeps this to at most one element, but the result
    /// stays a sequence; an unknown package yields an empty one.
    pub async fn get(&self, pkg: &str) -> Result<Vec<String>, AppError> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT whl FROM proposal WHERE uuid = $1 AND pkg = $2",
                &[&self.id, &pkg],
            )
            .await?;
        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    /// Insert or overwrite the entry for a package. Last write wins.
    pub async fn set(&self, pkg: &str, whl: &str) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO proposal (uuid, pkg, whl) VALUES ($1, $2, $3) \
                 ON CONFLICT (uuid, pkg) DO UPDATE SET whl = EXCLUDED.whl",
                &[&self.id, &pkg, &whl],
            )
            .await?;
        Ok(())
    }

    /// Record the conflict verdict, overwriting any previous one.
    pub async fn set_status(&self, conflict: bool) -> Result<(), AppError> {
        let client = self.pool.get().await?;
        client
            .execute(
                "INSERT INTO autocheck (uuid, conflict) VALUES ($1, $2) \
                 ON CONFLICT (uuid) DO UPDATE SET conflict = EXCLUDED.conflict",
                &[&self.id, &conflict],
            )
            .await?;
        Ok(())
    }

    /// Verdict recorded for this proposal, or `None` if it was never checked.
    pub async fn status(&self) -> Result<Option<bool>, AppError> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt("SELECT conflict FROM autocheck WHERE uuid = $1", &[&self.id])
            .await?;
        Ok(row.map(|r| r.get(0)))
    }
}

/// Factory and namespace for [`Proposal`] handles.
///
/// Owns the schema of the two backing tables for the lifetime of the store.
pub struct ProposalCollection {
    pool: Pool,
}

impl ProposalCollection {
    /// Create the backing tables and return the collection.
    ///
    /// Construct exactly once per process, before requests are served.
    pub async fn create(pool: Pool) -> Result<Self, AppError> {
        let client = pool.get().await?;
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS proposal (\
                 uuid TEXT NOT NULL, \
                 pkg TEXT NOT NULL, \
                 whl TEXT NOT NULL, \
                 PRIMARY KEY (uuid, pkg))",
                &[],
            )
            .await?;
        client
            .execute(
                "CREATE TABLE IF NOT EXISTS autocheck (\
                 uuid TEXT PRIMARY KEY, \
                 conflict BOOL NOT NULL)",
                &[],
            )
            .await?;
        debug!("Proposal tables ready");
        Ok(Self { pool })
    }

    /// Handle bound to an existing identity.
    ///
    /// Always succeeds; handles are views, not existence checks.
    pub fn get(&self, id: impl Into<String>) -> Proposal {
        Proposal {
            pool: self.pool.clone(),
            id: id.into(),
        }
    }

    /// Handle with a fresh random identity. Writes nothing; the proposal
    /// exists once its first entry is set.
    pub fn new_proposal(&self) -> Proposal {
        self.get(Uuid::new_v4().simple().to_string())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    /// Pool against TEST_DATABASE_URL, or `None` to skip the test on
    /// machines without a database.
    pub(crate) async fn test_pool() -> Option<Pool> {
        let url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping store test");
                return None;
            }
        };
        let config = crate::config::Settings::parse_database_url(&url)
            .expect("TEST_DATABASE_URL must be a postgresql:// URL");
        let pool = db::init_pool(&config).await.expect("connect to test database");
        Some(pool)
    }

    pub(crate) async fn test_collection() -> Option<ProposalCollection> {
        let pool = test_pool().await?;
        Some(ProposalCollection::create(pool).await.expect("create tables"))
    }

    #[tokio::test]
    async fn entries_are_isolated_between_proposals() {
        let Some(proposals) = test_collection().await else { return };
        let first = proposals.new_proposal();
        let second = proposals.new_proposal();

        first.set("alpha", "alpha-1.0-py3-none-any.whl").await.unwrap();
        second.set("beta", "beta-2.0-py3-none-any.whl").await.unwrap();

        assert_eq!(first.wheels().await.unwrap(), vec!["alpha-1.0-py3-none-any.whl"]);
        assert_eq!(second.wheels().await.unwrap(), vec!["beta-2.0-py3-none-any.whl"]);
        assert!(first.get("beta").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_overwrites_without_duplicating() {
        let Some(proposals) = test_collection().await else { return };
        let proposal = proposals.new_proposal();

        proposal.set("alpha", "alpha-1.0-py3-none-any.whl").await.unwrap();
        proposal.set("alpha", "alpha-1.1-py3-none-any.whl").await.unwrap();

        assert_eq!(proposal.wheels().await.unwrap().len(), 1);
        assert_eq!(
            proposal.get("alpha").await.unwrap(),
            vec!["alpha-1.1-py3-none-any.whl"]
        );
    }

    #[tokio::test]
    async fn status_upsert_keeps_last_verdict() {
        let Some(proposals) = test_collection().await else { return };
        let proposal = proposals.new_proposal();

        assert_eq!(proposal.status().await.unwrap(), None);
        proposal.set_status(true).await.unwrap();
        proposal.set_status(false).await.unwrap();
        assert_eq!(proposal.status().await.unwrap(), Some(false));
    }

    #[tokio::test]
    async fn get_on_missing_package_is_empty() {
        let Some(proposals) = test_collection().await else { return };
        let proposal = proposals.new_proposal();
        assert!(proposal.get("alpha").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn fresh_identities_are_distinct() {
        let Some(proposals) = test_collection().await else { return };
        let ids: HashSet<String> = (0..64)
            .map(|_| proposals.new_proposal().id().to_string())
            .collect();
        assert_eq!(ids.len(), 64);
    }
}
