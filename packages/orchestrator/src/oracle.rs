//! Ethereum event oracle
//!
//! Watches the Gravity contract for deposits and executed batches, waits out
//! the height-dependent confirmation delay, resolves deposit denominations,
//! and forwards finalized events to the claim submitter. The scan cursor only
//! advances after the sink accepts the events, so a failed hand-off is
//! re-scanned on the next poll instead of being lost.

use async_trait::async_trait;
use eyre::Result;
use gravity_rs::FinalityRule;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cosmos::CosmosQueryClient;
use crate::denom_cache::{DenomCache, ResolveError};
use crate::eth::EthClient;
use crate::events::{
    batch_executed_signature, parse_batch_executed_log, parse_send_to_cosmos_log,
    send_to_cosmos_signature, BridgeEvent,
};
use crate::metrics;

/// Where finalized events go: the external claim signer/broadcaster
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn submit_events(&self, events: &[BridgeEvent]) -> Result<()>;
}

pub struct Oracle<S> {
    eth: EthClient,
    denoms: Arc<DenomCache<CosmosQueryClient>>,
    finality: FinalityRule,
    sink: S,
    /// Highest block already scanned and handed off
    last_block: u64,
    /// Bound on cursor advancement per poll
    max_step: u64,
    poll_interval: Duration,
}

impl<S: EventSink> Oracle<S> {
    pub fn new(
        eth: EthClient,
        denoms: Arc<DenomCache<CosmosQueryClient>>,
        finality: FinalityRule,
        sink: S,
        start_block: u64,
        max_step: u64,
        poll_interval: Duration,
    ) -> Self {
        Self {
            eth,
            denoms,
            finality,
            sink,
            last_block: start_block,
            max_step,
            poll_interval,
        }
    }

    /// Run the oracle loop. Poll failures are logged and retried on the next
    /// tick; the cursor is untouched so nothing is skipped.
    pub async fn run(mut self) -> Result<()> {
        info!(start_block = self.last_block, "Oracle started");
        loop {
            if let Err(e) = self.poll().await {
                warn!(error = %e, "Oracle poll failed");
                metrics::record_error("oracle", "poll");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn poll(&mut self) -> Result<()> {
        let latest = self.eth.latest_block_number().await?;
        metrics::record_eth_height(latest);

        let scan_to = final_scan_target(self.last_block, latest, &self.finality, self.max_step);
        if scan_to <= self.last_block {
            return Ok(());
        }

        let from = self.last_block + 1;
        debug!(from, to = scan_to, latest, "Scanning gravity contract logs");

        let logs = self.eth.gravity_logs(from, scan_to).await?;

        let send_sig = send_to_cosmos_signature();
        let batch_sig = batch_executed_signature();
        let mut events = Vec::new();

        for log in &logs {
            let topics = log.topics();
            if topics.is_empty() {
                continue;
            }

            if topics[0] == send_sig {
                let Some(deposit) = parse_send_to_cosmos_log(log) else {
                    warn!(tx_hash = ?log.transaction_hash, "Malformed SendToCosmosEvent log");
                    continue;
                };
                let denom = self.resolve_denom(&deposit.token_contract).await?;
                info!(
                    event_nonce = deposit.event_nonce,
                    token = %deposit.token_contract,
                    amount = %deposit.amount,
                    %denom,
                    "Observed deposit"
                );
                metrics::record_event_observed("deposit");
                events.push(BridgeEvent::Deposit {
                    event: deposit,
                    denom,
                });
            } else if topics[0] == batch_sig {
                let Some(executed) = parse_batch_executed_log(log) else {
                    warn!(tx_hash = ?log.transaction_hash, "Malformed TransactionBatchExecutedEvent log");
                    continue;
                };
                info!(
                    event_nonce = executed.event_nonce,
                    batch_nonce = executed.batch_nonce,
                    token = %executed.token_contract,
                    "Observed executed batch"
                );
                metrics::record_event_observed("batch_executed");
                events.push(BridgeEvent::BatchExecuted(executed));
            }
        }

        if !events.is_empty() {
            debug!(
                count = events.len(),
                newest_block = events.last().map(|e| e.block_number()),
                "Handing events to signer"
            );
            self.sink.submit_events(&events).await?;
        }

        self.last_block = scan_to;
        metrics::record_oracle_block(scan_to);
        Ok(())
    }

    /// Denom for a deposited token. Tokens with no registered Cosmos binding
    /// originate on the Ethereum side and mint under the address-derived
    /// denomination instead.
    async fn resolve_denom(&self, token: &gravity_rs::EthAddress) -> Result<String> {
        match self.denoms.resolve(token).await {
            Ok(denom) => Ok(denom),
            Err(ResolveError::NotFound) => Ok(format!("gravity{}", token.to_hex())),
            Err(e) => Err(e.into()),
        }
    }
}

/// Highest block the oracle may scan to: every block in
/// `(last_block, target]` has waited out its confirmation delay relative to
/// `latest`, and the step is capped so one poll cannot scan unboundedly.
fn final_scan_target(last_block: u64, latest: u64, rule: &FinalityRule, cap: u64) -> u64 {
    let mut target = last_block;
    let mut height = last_block.saturating_add(1);
    while height <= latest && height - last_block <= cap && rule.is_final(height, latest) {
        target = height;
        height += 1;
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;
    use gravity_rs::DelayRange;

    #[test]
    fn test_final_scan_target_waits_out_delay() {
        let rule = FinalityRule::new(vec![], 6);
        // tip at 100, delay 6: blocks up to 94 are final
        assert_eq!(final_scan_target(0, 100, &rule, 5_000), 94);
        // nothing new once caught up
        assert_eq!(final_scan_target(94, 100, &rule, 5_000), 94);
    }

    #[test]
    fn test_final_scan_target_zero_delay() {
        let rule = FinalityRule::new(vec![], 0);
        assert_eq!(final_scan_target(10, 15, &rule, 5_000), 15);
    }

    #[test]
    fn test_final_scan_target_respects_cap() {
        let rule = FinalityRule::new(vec![], 0);
        assert_eq!(final_scan_target(0, 100_000, &rule, 500), 500);
    }

    #[test]
    fn test_final_scan_target_stops_at_first_unfinal_block() {
        // Heights >= 50 need 10 confirmations, below that none
        let rule = FinalityRule::new(vec![DelayRange { from: 0, to: 50, delay: 0 }], 10);
        // tip at 55: heights 50..=55 still need 10 more blocks, so the scan
        // stops at 49 even though later heights would also be non-final
        assert_eq!(final_scan_target(0, 55, &rule, 5_000), 49);
    }

    #[test]
    fn test_final_scan_target_empty_chain() {
        let rule = FinalityRule::default();
        assert_eq!(final_scan_target(0, 0, &rule, 5_000), 0);
    }
}
