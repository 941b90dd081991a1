use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use iko_crypto::VerifyingKey;
use iko_gate::TxGate;
use iko_ledger::{
    ChainLog, ChainValidator, ReplayEngine, ReplayResult, Subscription, Transaction,
    ValidationReport,
};
use iko_state::OwnershipState;
use iko_types::KittyId;

use crate::config::BlockChainConfig;
use crate::error::{BlockChainError, BlockChainResult};
use crate::hooks::{OwnershipHook, PostCommitHook};
use crate::shutdown::{Shutdown, ShutdownListener};

/// Validated, serialized write path into a chain log plus its ownership
/// projection.
///
/// `inject_tx` holds one commit lock from validation through the
/// post-commit hooks, so at most one transaction advances the chain and the
/// state at a time and ownership updates land in sequence order. Reads go
/// straight to the chain log and the state and never take the commit lock.
///
/// If projecting a committed transaction fails, the state is marked stale
/// and the next injection rebuilds it from the chain before validating.
pub struct BlockChain {
    chain: Arc<dyn ChainLog>,
    state: Arc<dyn OwnershipState>,
    creator: VerifyingKey,
    gate: TxGate,
    projection: OwnershipHook,
    tx_action: Option<Arc<dyn PostCommitHook>>,
    config: BlockChainConfig,
    commit: Mutex<()>,
    state_stale: AtomicBool,
    shutdown: Shutdown,
    closed: AtomicBool,
}

impl BlockChain {
    pub fn builder() -> BlockChainBuilder {
        BlockChainBuilder::default()
    }

    /// Validate `tx` against the current head and ownership, append it, and
    /// project it.
    ///
    /// On `Err(Chain(..))` nothing changed. On `Err(PostCommit { .. })` the
    /// transaction is in the chain. If the ownership projection was what
    /// failed, the state is rebuilt by the next injection or by
    /// [`Self::resync_state`], and injections are refused until that
    /// rebuild succeeds.
    pub fn inject_tx(&self, tx: Transaction) -> BlockChainResult<Transaction> {
        if self.is_closed() {
            return Err(BlockChainError::Closed);
        }
        let _commit = self.lock_commit();
        if self.is_closed() {
            return Err(BlockChainError::Closed);
        }
        if self.state_stale.load(Ordering::Acquire) {
            self.replay_state()?;
        }

        let kitty = tx.kitty();
        let stored = match self.chain.add_tx(tx, &self.gate) {
            Ok(stored) => stored,
            Err(e) => {
                debug!(%kitty, error = %e, "tx not injected");
                return Err(e.into());
            }
        };
        let seq = stored.seq().unwrap_or_default();

        if let Err(source) = self.projection.on_commit(&stored) {
            self.state_stale.store(true, Ordering::Release);
            warn!(seq, %kitty, error = %source, "ownership projection failed; state marked stale");
            return Err(BlockChainError::PostCommit { seq, source });
        }
        if let Some(action) = &self.tx_action {
            if let Err(source) = action.on_commit(&stored) {
                warn!(seq, %kitty, hook = action.name(), error = %source, "post-commit action failed");
                return Err(BlockChainError::PostCommit { seq, source });
            }
        }

        debug!(seq, %kitty, owner = %stored.new_owner().short_hex(), "tx injected");
        Ok(stored)
    }

    pub fn chain(&self) -> &Arc<dyn ChainLog> {
        &self.chain
    }

    pub fn state(&self) -> &Arc<dyn OwnershipState> {
        &self.state
    }

    /// The key trusted to issue kitties.
    pub fn creator(&self) -> &VerifyingKey {
        &self.creator
    }

    pub fn config(&self) -> &BlockChainConfig {
        &self.config
    }

    pub fn owner_of(&self, kitty: KittyId) -> BlockChainResult<Option<VerifyingKey>> {
        Ok(self.state.owner_of(kitty)?)
    }

    pub fn kitties_of(&self, owner: &VerifyingKey) -> BlockChainResult<Vec<KittyId>> {
        Ok(self.state.kitties_of(owner)?)
    }

    pub fn head(&self) -> BlockChainResult<Transaction> {
        Ok(self.chain.head()?)
    }

    /// A page of transactions from `start`. `page_size` defaults to the
    /// configured default and is clamped to the configured maximum.
    pub fn txs_page(
        &self,
        start: u64,
        page_size: Option<u64>,
    ) -> BlockChainResult<Vec<Transaction>> {
        let page_size = page_size
            .unwrap_or(self.config.default_page_size)
            .min(self.config.max_page_size);
        Ok(self.chain.get_txs_of_seq_range(start, page_size)?)
    }

    pub fn subscribe(&self) -> Subscription {
        self.chain.subscribe()
    }

    /// Integrity report over the whole chain.
    pub fn audit(&self) -> BlockChainResult<ValidationReport> {
        Ok(ChainValidator::validate(self.chain.as_ref())?)
    }

    /// Rebuild the ownership state from the chain.
    ///
    /// Blocks injections while it runs.
    pub fn resync_state(&self) -> BlockChainResult<ReplayResult> {
        let _commit = self.lock_commit();
        self.replay_state()
    }

    /// Whether a failed projection left the state behind the chain.
    pub fn is_state_stale(&self) -> bool {
        self.state_stale.load(Ordering::Acquire)
    }

    // Caller holds the commit lock.
    fn replay_state(&self) -> BlockChainResult<ReplayResult> {
        let result = ReplayEngine::replay_into(
            self.chain.as_ref(),
            self.state.as_ref(),
            self.config.max_page_size,
        )
        .inspect_err(|e| warn!(error = %e, "ownership state replay failed"))?;
        self.state_stale.store(false, Ordering::Release);
        info!(applied = result.applied, kitties = result.kitties, "ownership state resynced");
        Ok(result)
    }

    pub fn shutdown_signal(&self) -> ShutdownListener {
        self.shutdown.listener()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.shutdown.is_triggered()
    }

    /// Stop accepting transactions, trigger shutdown, and close the chain log.
    ///
    /// Waits for an in-flight injection to finish. Only the first call has an
    /// effect.
    pub fn close(&self) {
        let _commit = self.lock_commit();
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.trigger();
        self.chain.close();
        info!("blockchain closed");
    }

    // The guard protects no data, so a panic while it was held leaves
    // nothing to repair.
    fn lock_commit(&self) -> MutexGuard<'_, ()> {
        self.commit.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for BlockChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockChain")
            .field("creator", &self.creator)
            .field("len", &self.chain.len().ok())
            .field("closed", &self.is_closed())
            .field("state_stale", &self.is_state_stale())
            .finish()
    }
}

/// Builder for [`BlockChain`].
#[derive(Default)]
pub struct BlockChainBuilder {
    chain: Option<Arc<dyn ChainLog>>,
    state: Option<Arc<dyn OwnershipState>>,
    creator: Option<VerifyingKey>,
    tx_action: Option<Arc<dyn PostCommitHook>>,
    config: BlockChainConfig,
    shutdown: Option<Shutdown>,
}

impl BlockChainBuilder {
    pub fn chain(mut self, chain: Arc<dyn ChainLog>) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn state(mut self, state: Arc<dyn OwnershipState>) -> Self {
        self.state = Some(state);
        self
    }

    /// The only key allowed to sign genesis transactions.
    pub fn creator(mut self, creator: VerifyingKey) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Side effect run after each committed transaction, after the
    /// ownership projection.
    pub fn tx_action(mut self, action: Arc<dyn PostCommitHook>) -> Self {
        self.tx_action = Some(action);
        self
    }

    pub fn config(mut self, config: BlockChainConfig) -> Self {
        self.config = config;
        self
    }

    /// Share an externally owned shutdown signal, e.g. one tied to Ctrl-C.
    pub fn shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Build the blockchain. The state is always rebuilt from the chain, so
    /// entries it held beforehand are discarded.
    pub fn build(self) -> BlockChainResult<BlockChain> {
        self.config.validate()?;
        let chain = self
            .chain
            .ok_or_else(|| BlockChainError::InvalidConfig("a chain log is required".into()))?;
        let state = self.state.ok_or_else(|| {
            BlockChainError::InvalidConfig("an ownership state is required".into())
        })?;
        let creator = self
            .creator
            .ok_or_else(|| BlockChainError::InvalidConfig("a creator key is required".into()))?;

        ReplayEngine::replay_into(chain.as_ref(), state.as_ref(), self.config.max_page_size)?;

        let projection = OwnershipHook::new(state.clone());
        let gate = TxGate::with_default_stages(chain.clone(), state.clone(), creator.clone());

        info!(
            creator = %creator.short_hex(),
            len = chain.len()?,
            tx_action = self.tx_action.is_some(),
            "blockchain ready"
        );

        Ok(BlockChain {
            chain,
            state,
            creator,
            gate,
            projection,
            tx_action: self.tx_action,
            config: self.config,
            commit: Mutex::new(()),
            state_stale: AtomicBool::new(false),
            shutdown: self.shutdown.unwrap_or_default(),
            closed: AtomicBool::new(false),
        })
    }
}
