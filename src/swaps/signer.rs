/// Decode and sign aggregator transactions
///
/// A payload is decoded in exactly the format the ladder asks for; there is
/// no guessing. Decode failures are reported as `SigningFailed` so the
/// submitter can move on to the next format.
use super::types::{SignedTransaction, TransactionFormat};
use crate::errors::SwapError;
use base64::{engine::general_purpose, Engine as _};
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature},
    signer::Signer,
    transaction::{Transaction, VersionedTransaction},
};

pub trait TransactionSigner: Send + Sync {
    fn signer_pubkey(&self) -> Pubkey;

    /// Decode `payload` as `format`, sign it as fee payer, re-encode
    fn sign_payload(
        &self,
        payload: &[u8],
        format: TransactionFormat,
    ) -> Result<SignedTransaction, SwapError>;
}

pub struct KeypairTransactionSigner {
    keypair: Keypair,
}

impl KeypairTransactionSigner {
    pub fn new(keypair: Keypair) -> Self {
        Self { keypair }
    }

    /// Load a Solana CLI style JSON keypair file
    pub fn from_file(path: &str) -> Result<Self, SwapError> {
        let keypair = solana_sdk::signer::keypair::read_keypair_file(path)
            .map_err(|e| SwapError::Config(format!("Failed to read keypair '{}': {}", path, e)))?;
        Ok(Self::new(keypair))
    }

    fn fail(format: TransactionFormat, message: impl Into<String>) -> SwapError {
        SwapError::SigningFailed {
            format,
            message: message.into(),
        }
    }

    fn sign_message_bytes(
        &self,
        format: TransactionFormat,
        message: &[u8],
    ) -> Result<Signature, SwapError> {
        self.keypair
            .try_sign_message(message)
            .map_err(|e| Self::fail(format, format!("signer error: {}", e)))
    }

    fn check_fee_payer(&self, format: TransactionFormat, fee_payer: Option<&Pubkey>) -> Result<(), SwapError> {
        match fee_payer {
            Some(payer) if *payer == self.keypair.pubkey() => Ok(()),
            Some(payer) => Err(Self::fail(
                format,
                format!("fee payer {} is not the signer {}", payer, self.keypair.pubkey()),
            )),
            None => Err(Self::fail(format, "transaction has no account keys")),
        }
    }

    fn sign_versioned(&self, payload: &[u8]) -> Result<(Signature, Vec<u8>), SwapError> {
        let format = TransactionFormat::Versioned;
        let mut transaction: VersionedTransaction = bincode::deserialize(payload)
            .map_err(|e| Self::fail(format, format!("Failed to deserialize transaction: {}", e)))?;

        self.check_fee_payer(format, transaction.message.static_account_keys().first())?;

        let signature = self.sign_message_bytes(format, &transaction.message.serialize())?;
        let required = usize::from(transaction.message.header().num_required_signatures).max(1);
        if transaction.signatures.len() < required {
            transaction.signatures.resize(required, Signature::default());
        }
        transaction.signatures[0] = signature;

        let bytes = bincode::serialize(&transaction)
            .map_err(|e| Self::fail(format, format!("Failed to serialize transaction: {}", e)))?;
        Ok((signature, bytes))
    }

    fn sign_legacy(&self, payload: &[u8]) -> Result<(Signature, Vec<u8>), SwapError> {
        let format = TransactionFormat::Legacy;
        let mut transaction: Transaction = bincode::deserialize(payload)
            .map_err(|e| Self::fail(format, format!("Failed to deserialize transaction: {}", e)))?;

        self.check_fee_payer(format, transaction.message.account_keys.first())?;

        let signature = self.sign_message_bytes(format, &transaction.message_data())?;
        let required = usize::from(transaction.message.header.num_required_signatures).max(1);
        if transaction.signatures.len() < required {
            transaction.signatures.resize(required, Signature::default());
        }
        transaction.signatures[0] = signature;

        let bytes = bincode::serialize(&transaction)
            .map_err(|e| Self::fail(format, format!("Failed to serialize transaction: {}", e)))?;
        Ok((signature, bytes))
    }
}

impl TransactionSigner for KeypairTransactionSigner {
    fn signer_pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    fn sign_payload(
        &self,
        payload: &[u8],
        format: TransactionFormat,
    ) -> Result<SignedTransaction, SwapError> {
        let (signature, bytes) = match format {
            TransactionFormat::Versioned => self.sign_versioned(payload)?,
            TransactionFormat::Legacy => self.sign_legacy(payload)?,
        };

        Ok(SignedTransaction {
            format,
            signature: signature.to_string(),
            wire_base64: general_purpose::STANDARD.encode(bytes),
        })
    }
}
