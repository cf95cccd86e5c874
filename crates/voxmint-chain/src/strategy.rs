//! Commit strategy: gasless relay vs. self-funded transaction.
//!
//! The strategy is chosen once per publish batch and never re-evaluated per
//! version, so a batch cannot interleave relay and wallet submissions.

use crate::client::{ChainClient, ChainResult};
use crate::record::{ChainRecord, ChainReference};
use crate::wallet::{Address, DelegatedSession};

/// How a batch commits its records on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStrategy {
    /// Gasless submission through a delegated sub-account.
    Relay(DelegatedSession),
    /// Self-funded transaction signed by the connected wallet.
    DirectWallet(Address),
}

impl CommitStrategy {
    /// Prefer the relay when a delegated session is available; otherwise
    /// fall back to the connected wallet.
    pub fn select(wallet: &Address, delegated: Option<&DelegatedSession>) -> Self {
        match delegated {
            Some(session) => CommitStrategy::Relay(session.clone()),
            None => CommitStrategy::DirectWallet(wallet.clone()),
        }
    }

    /// Submit `record` through the chosen path.
    pub async fn commit(
        &self,
        client: &dyn ChainClient,
        record: &ChainRecord,
    ) -> ChainResult<ChainReference> {
        match self {
            CommitStrategy::Relay(session) => client.submit_via_relay(session, record).await,
            CommitStrategy::DirectWallet(account) => {
                client.submit_via_wallet(account, record).await
            }
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CommitStrategy::Relay(_) => "relay",
            CommitStrategy::DirectWallet(_) => "wallet",
        }
    }
}
