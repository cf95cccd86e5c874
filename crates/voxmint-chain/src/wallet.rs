//! Wallet connection state.
//!
//! Connection and handshake protocols live outside the core; the pipeline
//! only needs to know whether a wallet is connected and at which address.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An on-chain account address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Connection state reported by the wallet layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletStatus {
    Disconnected,
    Connected(Address),
}

impl WalletStatus {
    pub fn address(&self) -> Option<&Address> {
        match self {
            WalletStatus::Connected(addr) => Some(addr),
            WalletStatus::Disconnected => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, WalletStatus::Connected(_))
    }
}

/// Seam to the external wallet layer.
pub trait WalletConnector: Send + Sync {
    fn status(&self) -> WalletStatus;
}

/// A pre-authorized delegated sub-account for gasless submission. When the
/// session holds one, the relay path is available and the user pays no fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedSession {
    pub account: Address,
}
