//! On-chain submission client.
//!
//! One client, two submission paths: `submit_via_relay` uses a delegated
//! sub-account so the user pays no fee; `submit_via_wallet` signs a
//! self-funded transaction with the connected wallet and may be rejected
//! interactively. Idempotency and timeouts are the client's business, not
//! the pipeline's.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::{ChainRecord, ChainReference};
use crate::wallet::{Address, DelegatedSession};

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Rejected by user")]
    RejectedByUser,

    #[error("Relay unavailable: {0}")]
    RelayUnavailable(String),
}

pub type ChainResult<T> = Result<T, ChainError>;

/// Blockchain client abstraction consumed by the publish pipeline.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Submit through the gasless relay using a delegated session.
    async fn submit_via_relay(
        &self,
        delegated: &DelegatedSession,
        record: &ChainRecord,
    ) -> ChainResult<ChainReference>;

    /// Submit a self-funded transaction signed by the connected wallet.
    async fn submit_via_wallet(
        &self,
        account: &Address,
        record: &ChainRecord,
    ) -> ChainResult<ChainReference>;
}
