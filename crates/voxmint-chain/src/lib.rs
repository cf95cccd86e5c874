//! Voxmint on-chain recording
//!
//! Wallet connection state, the on-chain record types, the submission client
//! trait (gasless relay and self-funded variants), and the per-batch commit
//! strategy selection.

pub mod client;
pub mod record;
pub mod strategy;
pub mod wallet;

pub use client::{ChainClient, ChainError, ChainResult};
pub use record::{ChainRecord, ChainReference};
pub use strategy::CommitStrategy;
pub use wallet::{Address, DelegatedSession, WalletConnector, WalletStatus};
