//! Maps `(official title, season)` onto a catalog entry, creating or
//! enriching it as needed.

use crate::constants::catalog::{UPSERT_ATTEMPTS, UPSERT_RETRY_DELAY};
use crate::db::{CatalogRequest, CatalogUpsert, Store};
use crate::domain::CatalogId;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to resolve catalog entry '{title}' season {season}: {message}")]
    Unresolved {
        title: String,
        season: i32,
        message: String,
    },
}

#[derive(Clone)]
pub struct CatalogResolver {
    store: Store,
}

impl CatalogResolver {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Finds or creates the entry for the request's title and season.
    ///
    /// A failed upsert (usually lock contention with another worker) is
    /// retried a few times; after that the entry is read again outside the
    /// transaction before giving up.
    pub async fn resolve(&self, request: &CatalogRequest) -> Result<CatalogId, ResolveError> {
        let mut request = request.clone();
        if request.season <= 0 {
            request.season = 1;
        }

        let id = match self.upsert_with_retry(&request).await {
            Ok(outcome) => {
                match outcome {
                    CatalogUpsert::Created(id) => info!(
                        event = "catalog_created",
                        catalog_id = %id,
                        title = %request.official_title,
                        season = request.season,
                        "Created catalog entry"
                    ),
                    CatalogUpsert::Updated(id) => info!(
                        event = "catalog_updated",
                        catalog_id = %id,
                        title = %request.official_title,
                        "Updated catalog entry"
                    ),
                    CatalogUpsert::Unchanged(id) => {
                        debug!(catalog_id = %id, title = %request.official_title, "Catalog entry unchanged");
                    }
                }
                outcome.id()
            }
            Err(e) => {
                warn!(
                    title = %request.official_title,
                    season = request.season,
                    error = %e,
                    "Catalog upsert failed, re-reading entry"
                );
                self.fallback(&request, &e).await?
            }
        };

        self.poster_hint(&request, id).await;

        Ok(id)
    }

    async fn upsert_with_retry(&self, request: &CatalogRequest) -> anyhow::Result<CatalogUpsert> {
        let mut attempt = 1;
        loop {
            match self.store.upsert_catalog_entry(request).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if attempt < UPSERT_ATTEMPTS => {
                    debug!(
                        title = %request.official_title,
                        attempt,
                        error = %e,
                        "Catalog upsert failed, retrying"
                    );
                    sleep(UPSERT_RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fallback(
        &self,
        request: &CatalogRequest,
        cause: &anyhow::Error,
    ) -> Result<CatalogId, ResolveError> {
        let unresolved = |message: String| ResolveError::Unresolved {
            title: request.official_title.clone(),
            season: request.season,
            message,
        };

        match self
            .store
            .find_catalog_entry(&request.official_title, request.season)
            .await
        {
            Ok(Some(entry)) => Ok(CatalogId::new(entry.id)),
            Ok(None) => Err(unresolved(cause.to_string())),
            Err(e) => Err(unresolved(format!("{cause}; re-read failed: {e}"))),
        }
    }

    /// Identity stays title+season; a matching poster on another entry is
    /// only reported.
    async fn poster_hint(&self, request: &CatalogRequest, id: CatalogId) {
        let Some(hash) = request.poster.as_ref().and_then(|p| p.hash.as_deref()) else {
            return;
        };

        match self.store.find_catalog_entry_by_poster_hash(hash, id).await {
            Ok(Some(other)) => info!(
                event = "catalog_poster_match",
                catalog_id = %id,
                other_id = other.id,
                other_title = %other.official_title,
                poster_hash = %hash,
                "Poster shared with another catalog entry"
            ),
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Poster hash lookup failed"),
        }
    }
}
