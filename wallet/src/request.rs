use quill_types::{Address, TokenId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A transfer as submitted by a caller. Validated by the builder, never
/// repaired.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Store path or primary address. When absent the sender is looked up
    /// across stores.
    #[serde(default)]
    pub store: Option<String>,
    pub sender: Address,
    /// Checked in the validation stage, so kept in its raw form.
    pub recipient: String,
    pub token: TokenId,
    pub passphrase: String,
    /// Decimal, in the token's smallest unit.
    pub amount: String,
    #[serde(default, with = "hex_bytes")]
    pub data: Vec<u8>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl TransferRequest {
    /// A plain transfer with no payload, store selector or difficulty.
    pub fn new(
        sender: Address,
        recipient: impl Into<String>,
        token: TokenId,
        amount: impl Into<String>,
        passphrase: impl Into<String>,
    ) -> Self {
        Self {
            store: None,
            sender,
            recipient: recipient.into(),
            token,
            passphrase: passphrase.into(),
            amount: amount.into(),
            data: Vec::new(),
            difficulty: None,
        }
    }

    pub fn with_store(mut self, store: impl Into<String>) -> Self {
        self.store = Some(store.into());
        self
    }

    pub fn with_data(mut self, data: Vec<u8>) -> Self {
        self.data = data;
        self
    }

    pub fn with_difficulty(mut self, difficulty: impl Into<String>) -> Self {
        self.difficulty = Some(difficulty.into());
        self
    }
}

impl fmt::Debug for TransferRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferRequest")
            .field("store", &self.store)
            .field("sender", &self.sender)
            .field("recipient", &self.recipient)
            .field("token", &self.token)
            .field("passphrase", &"<redacted>")
            .field("amount", &self.amount)
            .field("data", &hex::encode(&self.data))
            .field("difficulty", &self.difficulty)
            .finish()
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(d)?;
        hex::decode(raw.strip_prefix("0x").unwrap_or(&raw)).map_err(serde::de::Error::custom)
    }
}
