use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;

use crate::error::{ConnectorError, ConnectorResult};

/// Ordered set of local signing keys. The first key is the default account.
#[derive(Clone, Default)]
pub struct Keystore {
    signers: Vec<PrivateKeySigner>,
}

impl Keystore {
    pub fn new(signers: Vec<PrivateKeySigner>) -> Self {
        Self { signers }
    }

    /// Parses hex private keys (with or without `0x`), skipping duplicates.
    pub fn from_hex_keys<S: AsRef<str>>(keys: &[S]) -> ConnectorResult<Self> {
        let mut signers: Vec<PrivateKeySigner> = Vec::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            let signer: PrivateKeySigner = key
                .as_ref()
                .trim()
                .parse()
                .map_err(|e| ConnectorError::invalid(format!("private key #{} is not valid: {e}", i + 1)))?;
            if !signers.iter().any(|s| s.address() == signer.address()) {
                signers.push(signer);
            }
        }
        Ok(Self { signers })
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.signers.iter().map(PrivateKeySigner::address).collect()
    }

    pub fn contains(&self, account: Address) -> bool {
        self.signers.iter().any(|s| s.address() == account)
    }

    pub fn signer(&self, account: Address) -> ConnectorResult<PrivateKeySigner> {
        self.signers
            .iter()
            .find(|s| s.address() == account)
            .cloned()
            .ok_or_else(|| ConnectorError::UnknownAccount {
                account: account.to_string(),
            })
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }
}
