use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid private key format: {0}")]
    InvalidKeyFormat(String),
    #[error("Failed to sign transaction: {0}")]
    SigningError(String),
}

/// Custodial wallet: a keypair held server-side on behalf of one user.
///
/// Keys cross this boundary base58-encoded (the 64-byte secret form).
/// Nothing here logs key material.
pub struct WalletManager {
    keypair: Keypair,
}

impl WalletManager {
    /// Create a fresh random keypair.
    pub fn new_random() -> Self {
        Self {
            keypair: Keypair::new(),
        }
    }

    /// Load a keypair from a base58-encoded 64-byte secret key.
    pub fn from_base58(encoded: &str) -> Result<Self, WalletError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| WalletError::InvalidKeyFormat(e.to_string()))?;
        if bytes.len() != 64 {
            return Err(WalletError::InvalidKeyFormat(format!(
                "expected 64 key bytes, got {}",
                bytes.len()
            )));
        }
        let keypair = Keypair::try_from(&bytes[..])
            .map_err(|e| WalletError::InvalidKeyFormat(e.to_string()))?;
        Ok(Self { keypair })
    }

    /// Get the public key as a string
    pub fn public_key(&self) -> String {
        self.keypair.pubkey().to_string()
    }

    /// Get the public key as Pubkey
    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    /// Export the secret key base58-encoded, for storage in the ledger.
    pub fn export_base58(&self) -> String {
        bs58::encode(self.keypair.to_bytes()).into_string()
    }

    /// Sign an unsigned versioned transaction, replacing its signatures.
    pub fn sign_versioned(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<VersionedTransaction, WalletError> {
        VersionedTransaction::try_new(transaction.message, &[&self.keypair])
            .map_err(|e| WalletError::SigningError(e.to_string()))
    }

    /// Sign a message and return the signature
    pub fn sign_message(&self, message: &[u8]) -> Signature {
        self.keypair.sign_message(message)
    }
}

/// Whether a string parses as a Solana public key.
pub fn is_valid_pubkey(value: &str) -> bool {
    Pubkey::from_str(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_random_wallet() {
        let wallet = WalletManager::new_random();
        let pubkey = wallet.public_key();
        assert!(!pubkey.is_empty());
        assert_eq!(pubkey.len(), 44); // Base58 encoded pubkey length
    }

    #[test]
    fn test_base58_round_trip() {
        let wallet1 = WalletManager::new_random();
        let exported = wallet1.export_base58();

        let wallet2 = WalletManager::from_base58(&exported).unwrap();
        assert_eq!(wallet1.public_key(), wallet2.public_key());
    }

    #[test]
    fn test_rejects_garbage_key() {
        assert!(WalletManager::from_base58("not-base58-!!").is_err());
        assert!(WalletManager::from_base58("abc").is_err());
    }

    #[test]
    fn test_rejects_wrong_length_key() {
        // A valid base58 string that decodes to 32 bytes, not 64.
        let short = bs58::encode([7u8; 32]).into_string();
        match WalletManager::from_base58(&short) {
            Err(err) => assert!(err.to_string().contains("64 key bytes")),
            Ok(_) => panic!("short key must be rejected"),
        }
    }

    #[test]
    fn test_sign_message() {
        let wallet = WalletManager::new_random();
        let message = b"Hello, Solana!";
        let signature = wallet.sign_message(message);

        // Verify signature length (64 bytes)
        assert_eq!(signature.as_ref().len(), 64);
    }

    #[test]
    fn test_sign_versioned_transaction() {
        use solana_sdk::{
            hash::Hash, message::Message, message::VersionedMessage, system_instruction,
        };

        let wallet = WalletManager::new_random();
        let recipient = Pubkey::new_unique();
        let instruction = system_instruction::transfer(&wallet.pubkey(), &recipient, 1_000);
        let message = Message::new_with_blockhash(
            &[instruction],
            Some(&wallet.pubkey()),
            &Hash::new_unique(),
        );
        let unsigned = VersionedTransaction {
            signatures: vec![Signature::default()],
            message: VersionedMessage::Legacy(message),
        };

        let signed = wallet.sign_versioned(unsigned).unwrap();
        assert_ne!(signed.signatures[0], Signature::default());
        assert!(signed.verify_and_hash_message().is_ok());
    }

    #[test]
    fn test_pubkey_validation() {
        let wallet = WalletManager::new_random();
        assert!(is_valid_pubkey(&wallet.public_key()));
        assert!(is_valid_pubkey("So11111111111111111111111111111111111111112"));
        assert!(!is_valid_pubkey("not a pubkey"));
        assert!(!is_valid_pubkey(""));
    }

    #[test]
    fn test_pubkey_formats() {
        let wallet = WalletManager::new_random();
        let pubkey_string = wallet.public_key();
        let pubkey_struct = wallet.pubkey();

        assert_eq!(pubkey_string, pubkey_struct.to_string());
    }
}
