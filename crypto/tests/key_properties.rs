use proptest::prelude::*;
use quill_crypto::{AccountKey, DerivationPath};

fn hardened() -> impl Strategy<Value = u32> {
    0u32..0x8000_0000
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn path_display_parses_back(components in prop::collection::vec(hardened(), 0..6)) {
        let path = DerivationPath::new(components.clone()).unwrap();
        let parsed: DerivationPath = path.to_string().parse().unwrap();
        prop_assert_eq!(parsed.components(), components.as_slice());
    }

    #[test]
    fn entropy_survives_the_phrase(entropy in any::<[u8; 32]>()) {
        let phrase = quill_crypto::mnemonic_from_entropy(&entropy).unwrap();
        prop_assert_eq!(phrase.split_whitespace().count(), 24);
        prop_assert!(quill_crypto::validate_mnemonic(&phrase));
        let back = quill_crypto::entropy_from_mnemonic(&phrase).unwrap();
        prop_assert_eq!(back.as_slice(), &entropy[..]);
    }

    #[test]
    fn account_signatures_check_against_the_address(
        secret in any::<[u8; 32]>(),
        message in prop::collection::vec(any::<u8>(), 0..128),
    ) {
        let key = AccountKey::from_secret(&secret);
        let sig = key.sign(&message);
        prop_assert!(quill_crypto::verify_for_address(key.address(), &message, &sig));

        let mut other = message.clone();
        other.push(0);
        prop_assert!(!quill_crypto::verify_for_address(key.address(), &other, &sig));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn index_paths_name_their_account(index in hardened()) {
        let path = quill_crypto::index_path(index).unwrap();
        prop_assert_eq!(path.account_index(), Some(index));
        let seed = [0x42u8; 64];
        let by_index = quill_crypto::key_at_index(&seed, index).unwrap();
        let by_path = quill_crypto::key_at_path(&seed, &path).unwrap();
        prop_assert_eq!(by_index.address(), by_path.address());
    }
}
