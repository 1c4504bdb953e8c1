//! Confirmation relayer
//!
//! Polls the Cosmos side for the oldest validator-set update and outgoing
//! batch this orchestrator has not yet confirmed, computes the commitment
//! hash for each, and hands it to the external signer/broadcaster. The
//! commitment computation is pure and is never retried: a failure there is a
//! defect in the data, and re-running it would produce the same result. Only
//! the relay hand-off (I/O) goes through the retry policy.

use async_trait::async_trait;
use eyre::Result;
use gravity_rs::{batch_confirm_hash, valset_confirm_hash, BridgeId, EthAddress, TransactionBatch, Valset};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::cosmos::CosmosQueryClient;
use crate::metrics;
use crate::retry::{with_retry, RetryConfig};

/// A commitment ready to sign and relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirm {
    Valset {
        nonce: u64,
        commitment: [u8; 32],
    },
    Batch {
        nonce: u64,
        token_contract: EthAddress,
        commitment: [u8; 32],
    },
}

impl Confirm {
    pub fn kind(&self) -> &'static str {
        match self {
            Confirm::Valset { .. } => "valset",
            Confirm::Batch { .. } => "batch",
        }
    }
}

/// The external signer/broadcaster boundary
#[async_trait]
pub trait ConfirmRelay: Send + Sync {
    async fn relay_confirm(&self, confirm: &Confirm) -> Result<()>;
}

/// Source of pending (unsigned) work, implemented by the LCD client. A seam
/// so the loop is testable without a running chain.
#[async_trait]
pub trait PendingSource: Send + Sync {
    async fn last_pending_valset(&self, orchestrator_address: &str) -> Result<Option<Valset>>;
    async fn last_pending_batch(
        &self,
        orchestrator_address: &str,
    ) -> Result<Option<TransactionBatch>>;
}

#[async_trait]
impl PendingSource for CosmosQueryClient {
    async fn last_pending_valset(&self, orchestrator_address: &str) -> Result<Option<Valset>> {
        CosmosQueryClient::last_pending_valset(self, orchestrator_address).await
    }

    async fn last_pending_batch(
        &self,
        orchestrator_address: &str,
    ) -> Result<Option<TransactionBatch>> {
        CosmosQueryClient::last_pending_batch(self, orchestrator_address).await
    }
}

pub struct Relayer<P, R> {
    source: P,
    relay: R,
    bridge_id: BridgeId,
    orchestrator_address: String,
    retry: RetryConfig,
    poll_interval: Duration,
    /// Nonces already handed to the relay this run, so a confirmation that
    /// has not yet landed on-chain is not re-submitted every poll
    relayed_valsets: HashSet<u64>,
    relayed_batches: HashSet<(u64, EthAddress)>,
}

impl<P: PendingSource, R: ConfirmRelay> Relayer<P, R> {
    pub fn new(
        source: P,
        relay: R,
        bridge_id: BridgeId,
        orchestrator_address: String,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            relay,
            bridge_id,
            orchestrator_address,
            retry: RetryConfig::default(),
            poll_interval,
            relayed_valsets: HashSet::new(),
            relayed_batches: HashSet::new(),
        }
    }

    /// Run the relayer loop
    pub async fn run(mut self) -> Result<()> {
        info!(bridge_id = %self.bridge_id, "Relayer started");
        loop {
            if let Err(e) = self.poll().await {
                warn!(error = %e, "Relayer poll failed");
                metrics::record_error("relayer", "poll");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn poll(&mut self) -> Result<()> {
        self.poll_valset().await?;
        self.poll_batch().await?;
        metrics::record_successful_poll("relayer");
        Ok(())
    }

    async fn poll_valset(&mut self) -> Result<()> {
        let Some(valset) = self
            .source
            .last_pending_valset(&self.orchestrator_address)
            .await?
        else {
            return Ok(());
        };

        if self.relayed_valsets.contains(&valset.nonce) {
            return Ok(());
        }

        let commitment = match valset_confirm_hash(&self.bridge_id, &valset) {
            Ok(commitment) => commitment,
            Err(e) => {
                // Data defect; retrying a pure function cannot help
                error!(nonce = valset.nonce, error = %e, "Cannot encode valset checkpoint");
                metrics::record_error("relayer", "encoding");
                return Ok(());
            }
        };

        let confirm = Confirm::Valset {
            nonce: valset.nonce,
            commitment,
        };
        self.submit(confirm).await?;
        self.relayed_valsets.insert(valset.nonce);
        Ok(())
    }

    async fn poll_batch(&mut self) -> Result<()> {
        let Some(batch) = self
            .source
            .last_pending_batch(&self.orchestrator_address)
            .await?
        else {
            return Ok(());
        };

        let key = (batch.nonce, batch.token_contract);
        if self.relayed_batches.contains(&key) {
            return Ok(());
        }

        let commitment = match batch_confirm_hash(&self.bridge_id, &batch) {
            Ok(commitment) => commitment,
            Err(e) => {
                error!(nonce = batch.nonce, error = %e, "Cannot encode batch commitment");
                metrics::record_error("relayer", "encoding");
                return Ok(());
            }
        };

        let confirm = Confirm::Batch {
            nonce: batch.nonce,
            token_contract: batch.token_contract,
            commitment,
        };
        self.submit(confirm).await?;
        self.relayed_batches.insert(key);
        Ok(())
    }

    async fn submit(&self, confirm: Confirm) -> Result<()> {
        let kind = confirm.kind();
        let result = with_retry(&self.retry, |attempt| {
            let confirm = confirm.clone();
            async move {
                if attempt > 0 {
                    warn!(kind, attempt, "Retrying confirm relay");
                }
                self.relay.relay_confirm(&confirm).await
            }
        })
        .await;

        metrics::record_confirm_relayed(kind, result.is_ok());
        match &result {
            Ok(()) => info!(kind, "Relayed confirmation"),
            Err(e) => warn!(kind, error = %e, "Confirm relay failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;
    use gravity_rs::ValsetMember;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct StubSource {
        valset: Mutex<Option<Valset>>,
        batch: Mutex<Option<TransactionBatch>>,
    }

    #[async_trait]
    impl PendingSource for Arc<StubSource> {
        async fn last_pending_valset(&self, _addr: &str) -> Result<Option<Valset>> {
            Ok(self.valset.lock().await.clone())
        }

        async fn last_pending_batch(&self, _addr: &str) -> Result<Option<TransactionBatch>> {
            Ok(self.batch.lock().await.clone())
        }
    }

    #[derive(Default)]
    struct CountingRelay {
        calls: AtomicUsize,
        confirms: Mutex<Vec<Confirm>>,
    }

    #[async_trait]
    impl ConfirmRelay for Arc<CountingRelay> {
        async fn relay_confirm(&self, confirm: &Confirm) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.confirms.lock().await.push(confirm.clone());
            Ok(())
        }
    }

    fn test_valset(nonce: u64) -> Valset {
        Valset {
            nonce,
            members: vec![ValsetMember {
                power: 100,
                eth_address: EthAddress::from_hex("0xc783df8a850f42e7f7e57013759c285caa701eb6")
                    .unwrap(),
            }],
            reward_amount: U256::ZERO,
            reward_token: EthAddress::zero(),
        }
    }

    fn test_relayer(
        source: Arc<StubSource>,
        relay: Arc<CountingRelay>,
    ) -> Relayer<Arc<StubSource>, Arc<CountingRelay>> {
        Relayer::new(
            source,
            relay,
            BridgeId::from_label("defaultgravityid").unwrap(),
            "cosmos1qypqxpq9qcrsszg2pvxq6rs0zqg3yyc5lzv7xu".to_string(),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_pending_valset_relayed_once() {
        let source = Arc::new(StubSource::default());
        *source.valset.lock().await = Some(test_valset(3));
        let relay = Arc::new(CountingRelay::default());
        let mut relayer = test_relayer(source.clone(), relay.clone());

        relayer.poll().await.unwrap();
        // Same valset still reported pending; must not be re-submitted
        relayer.poll().await.unwrap();

        assert_eq!(relay.calls.load(Ordering::SeqCst), 1);
        let confirms = relay.confirms.lock().await;
        assert!(matches!(confirms[0], Confirm::Valset { nonce: 3, .. }));
    }

    #[tokio::test]
    async fn test_new_valset_nonce_is_relayed() {
        let source = Arc::new(StubSource::default());
        *source.valset.lock().await = Some(test_valset(3));
        let relay = Arc::new(CountingRelay::default());
        let mut relayer = test_relayer(source.clone(), relay.clone());

        relayer.poll().await.unwrap();
        *source.valset.lock().await = Some(test_valset(4));
        relayer.poll().await.unwrap();

        assert_eq!(relay.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_nothing_pending_relays_nothing() {
        let source = Arc::new(StubSource::default());
        let relay = Arc::new(CountingRelay::default());
        let mut relayer = test_relayer(source, relay.clone());

        relayer.poll().await.unwrap();
        assert_eq!(relay.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_pending_batch_relayed_with_commitment() {
        let token = EthAddress::from_hex("0x7c2c195cd6d34b8f845992d380aadb2730bb9c6f").unwrap();
        let batch = TransactionBatch {
            nonce: 9,
            token_contract: token,
            timeout: 100,
            transactions: vec![],
        };
        let expected =
            batch_confirm_hash(&BridgeId::from_label("defaultgravityid").unwrap(), &batch).unwrap();

        let source = Arc::new(StubSource::default());
        *source.batch.lock().await = Some(batch);
        let relay = Arc::new(CountingRelay::default());
        let mut relayer = test_relayer(source, relay.clone());

        relayer.poll().await.unwrap();

        let confirms = relay.confirms.lock().await;
        assert_eq!(
            confirms[0],
            Confirm::Batch {
                nonce: 9,
                token_contract: token,
                commitment: expected,
            }
        );
    }
}
