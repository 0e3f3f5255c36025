//! Recipient checks applied before anything is generated.
//!
//! System contracts sit at addresses whose public key is 31 zero bytes
//! followed by the contract id. The exchange-fund contract takes orders and
//! checks their price encoding; the wallet applies the same check up front so
//! a malformed order never reaches the executor.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use quill_types::{Address, PublicKey};

/// Method whose arguments carry an order price.
pub const PLACE_ORDER_SIGNATURE: &str = "placeOrder(string)";

const SELECTOR_LEN: usize = 4;
const MAX_PRICE_DIGITS: usize = 12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SystemContract {
    Quota,
    Governance,
    Asset,
    ExchangeFund,
    ExchangeTrade,
}

impl SystemContract {
    pub const ALL: [SystemContract; 5] = [
        SystemContract::Quota,
        SystemContract::Governance,
        SystemContract::Asset,
        SystemContract::ExchangeFund,
        SystemContract::ExchangeTrade,
    ];

    pub fn id(self) -> u8 {
        match self {
            SystemContract::Quota => 1,
            SystemContract::Governance => 2,
            SystemContract::Asset => 3,
            SystemContract::ExchangeFund => 6,
            SystemContract::ExchangeTrade => 7,
        }
    }

    pub fn address(self) -> Address {
        system_address(self.id())
    }

    pub fn from_address(address: &Address) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.address() == *address)
    }
}

fn system_address(id: u8) -> Address {
    let mut key = [0u8; 32];
    key[31] = id;
    Address::from_public_key(&PublicKey(key))
}

/// The all-zero address. Never a valid recipient.
pub fn zero_address() -> Address {
    system_address(0)
}

/// Selector of a method: first four bytes of Blake2b-256 of its signature.
pub fn method_selector(signature: &str) -> [u8; SELECTOR_LEN] {
    let digest = Blake2b::<U32>::digest(signature.as_bytes());
    let mut selector = [0u8; SELECTOR_LEN];
    selector.copy_from_slice(&digest[..SELECTOR_LEN]);
    selector
}

/// Recipient-side checks the transfer pipeline runs in its validation stage.
pub trait RecipientPolicy: Send + Sync {
    /// Well-formed, checksummed and not reserved.
    fn is_valid_recipient(&self, address: &Address) -> bool;

    /// Whether payloads sent to `address` must pass
    /// [`RecipientPolicy::validate_order_price_payload`].
    fn requires_price_check(&self, address: &Address) -> bool;

    /// `Err` carries the reason the payload was refused.
    fn validate_order_price_payload(&self, data: &[u8]) -> Result<(), String>;
}

/// The built-in contract table.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemRecipientPolicy;

impl RecipientPolicy for SystemRecipientPolicy {
    fn is_valid_recipient(&self, address: &Address) -> bool {
        address.has_valid_checksum()
            && *address != zero_address()
            && SystemContract::from_address(address) != Some(SystemContract::ExchangeTrade)
    }

    fn requires_price_check(&self, address: &Address) -> bool {
        SystemContract::from_address(address) == Some(SystemContract::ExchangeFund)
    }

    fn validate_order_price_payload(&self, data: &[u8]) -> Result<(), String> {
        if data.len() < SELECTOR_LEN {
            return Err(format!("payload of {} bytes has no method selector", data.len()));
        }
        let (selector, args) = data.split_at(SELECTOR_LEN);
        if selector != method_selector(PLACE_ORDER_SIGNATURE) {
            return Ok(());
        }
        let price = std::str::from_utf8(args).map_err(|_| "price is not UTF-8".to_string())?;
        check_price(price)
    }
}

/// `\d{1,12}(\.\d{1,12})?`, not zero.
fn check_price(price: &str) -> Result<(), String> {
    let (int_part, frac_part) = match price.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (price, None),
    };
    let digits_ok = |s: &str| {
        !s.is_empty() && s.len() <= MAX_PRICE_DIGITS && s.bytes().all(|b| b.is_ascii_digit())
    };
    if !digits_ok(int_part) || !frac_part.map_or(true, digits_ok) {
        return Err(format!("malformed price {price:?}"));
    }
    let non_zero = price.bytes().any(|b| (b'1'..=b'9').contains(&b));
    if !non_zero {
        return Err("price must be positive".to_string());
    }
    Ok(())
}

/// Build a `placeOrder` payload for `price`.
pub fn place_order_payload(price: &str) -> Vec<u8> {
    let mut data = method_selector(PLACE_ORDER_SIGNATURE).to_vec();
    data.extend_from_slice(price.as_bytes());
    data
}
