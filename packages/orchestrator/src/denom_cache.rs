//! ERC20 → denomination cache
//!
//! Token↔denom bindings are immutable for the life of the process, so a
//! successful lookup is stored forever and answered without I/O from then on.
//! A failed lookup is NOT stored: a binding added on-chain later must be
//! observable on retry.
//!
//! Concurrency: callers racing on the same token share one in-flight lookup
//! (per-key `OnceCell`), while lookups for different tokens proceed in
//! parallel. Once a cell is populated it is read-only.

use async_trait::async_trait;
use eyre::Result;
use gravity_rs::EthAddress;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, OnceCell};

use crate::cosmos::CosmosQueryClient;

/// Injected query interface for the denom lookup. `Ok(None)` means the chain
/// holds no binding for that token.
#[async_trait]
pub trait DenomQuery: Send + Sync {
    async fn erc20_to_denom(&self, erc20: &str) -> Result<Option<String>>;
}

#[async_trait]
impl DenomQuery for CosmosQueryClient {
    async fn erc20_to_denom(&self, erc20: &str) -> Result<Option<String>> {
        CosmosQueryClient::erc20_to_denom(self, erc20).await
    }
}

/// Why a resolve failed. `NotFound` and `Cancelled` are recoverable and never
/// cached; transport errors propagate for the caller's retry policy.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no denom found for token")]
    NotFound,

    #[error("denom lookup timed out")]
    Cancelled,

    #[error(transparent)]
    Query(#[from] eyre::Report),
}

/// Memoizing ERC20 → denom resolver over an injected query client
pub struct DenomCache<Q> {
    querier: Q,
    lookup_timeout: Duration,
    entries: Mutex<HashMap<String, Arc<OnceCell<String>>>>,
}

impl<Q: DenomQuery> DenomCache<Q> {
    pub fn new(querier: Q, lookup_timeout: Duration) -> Self {
        Self {
            querier,
            lookup_timeout,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a token contract to its denomination.
    ///
    /// The cache key is the canonical lowercase hex form of the address, so
    /// distinct spellings of one address share an entry. The underlying
    /// lookup is bounded by the configured timeout.
    pub async fn resolve(&self, token: &EthAddress) -> Result<String, ResolveError> {
        let key = token.to_hex();

        let cell = {
            let mut entries = self.entries.lock().await;
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let denom = cell
            .get_or_try_init(|| async {
                match tokio::time::timeout(
                    self.lookup_timeout,
                    self.querier.erc20_to_denom(&key),
                )
                .await
                {
                    Err(_) => Err(ResolveError::Cancelled),
                    Ok(Err(e)) => Err(ResolveError::Query(e)),
                    Ok(Ok(None)) => Err(ResolveError::NotFound),
                    Ok(Ok(Some(denom))) => Ok(denom),
                }
            })
            .await?;

        Ok(denom.clone())
    }

    /// Number of populated entries (empty cells from failed lookups are not
    /// counted)
    pub async fn len(&self) -> usize {
        let entries = self.entries.lock().await;
        entries.values().filter(|cell| cell.get().is_some()).count()
    }
}
