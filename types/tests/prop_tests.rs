use num_bigint::BigUint;
use proptest::prelude::*;

use quill_types::{AccountBlock, Address, BlockHash, BlockType, TokenId};

const ALPHABET: &[u8] = b"13456789abcdefghijkmnopqrstuwxyz";

fn address_body() -> impl Strategy<Value = String> {
    prop::collection::vec(0usize..32, 60)
        .prop_map(|idx| idx.into_iter().map(|i| ALPHABET[i] as char).collect())
}

fn block(height: u64, amount: u64) -> AccountBlock {
    let a = Address::parse(format!("quil_{}", "1".repeat(60))).unwrap();
    let b = Address::parse(format!("quil_{}", "3".repeat(60))).unwrap();
    AccountBlock {
        block_type: BlockType::SendCall,
        account: a,
        previous: BlockHash::ZERO,
        height,
        snapshot: BlockHash::ZERO,
        to_address: b,
        token: TokenId::NATIVE,
        amount: BigUint::from(amount),
        fee: BigUint::from(0u32),
        data: vec![],
        difficulty: None,
        nonce: None,
        public_key: None,
        signature: None,
        hash: BlockHash::ZERO,
    }
}

proptest! {
    /// BlockHash::is_zero is true only for all-zero bytes.
    #[test]
    fn block_hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Display output of a BlockHash parses back to the same hash.
    #[test]
    fn block_hash_display_parses(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        prop_assert_eq!(hash.to_string().parse::<BlockHash>().unwrap(), hash);
    }

    /// BlockHash bincode serialization keeps every byte.
    #[test]
    fn block_hash_bincode(bytes in prop::array::uniform32(0u8..)) {
        let hash = BlockHash::new(bytes);
        let encoded = bincode::serialize(&hash).unwrap();
        let decoded: BlockHash = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, hash);
    }

    /// Any 60-char body over the alphabet forms a syntactically valid address.
    #[test]
    fn address_shape_accepted(body in address_body()) {
        let raw = format!("quil_{body}");
        let addr = Address::parse(raw.clone()).unwrap();
        prop_assert_eq!(addr.as_str(), raw.as_str());
    }

    /// Truncating a valid address always makes it invalid.
    #[test]
    fn truncated_address_rejected(body in address_body(), cut in 1usize..60) {
        let raw = format!("quil_{}", &body[..60 - cut]);
        prop_assert!(Address::parse(raw).is_err());
    }

    /// TokenId display output parses back.
    #[test]
    fn token_id_display_parses(bytes in prop::array::uniform10(0u8..)) {
        let id = TokenId::new(bytes);
        prop_assert_eq!(id.to_string().parse::<TokenId>().unwrap(), id);
    }

    /// Blocks that differ in height or amount never share a hash.
    #[test]
    fn block_hash_separates_heights(h1 in 1u64..10_000, h2 in 1u64..10_000, amount in 0u64..1_000) {
        prop_assume!(h1 != h2);
        prop_assert_ne!(block(h1, amount).compute_hash(), block(h2, amount).compute_hash());
    }
}
