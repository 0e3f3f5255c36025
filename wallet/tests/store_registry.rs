use quill_keystore::{KdfParams, KeyStoreError};
use quill_nullables::{NullChain, NullGenerator, NullPool};
use quill_wallet::{ErrorKind, TransferError, WalletApi, WalletConfig, WalletError};
use std::path::Path;
use std::sync::Arc;

fn api(dir: &Path) -> WalletApi {
    let mut config = WalletConfig::with_data_dir(dir);
    config.search_window = 10;
    config.kdf = KdfParams {
        memory: 1024,
        iterations: 1,
        parallelism: 1,
    };
    WalletApi::new(
        config,
        Arc::new(NullChain::new()),
        Arc::new(NullGenerator::new()),
        Arc::new(NullPool::new()),
    )
    .unwrap()
}

#[test]
fn two_new_stores_recover_independently() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let a = wallet.new_store("pass-a").unwrap();
    let b = wallet.new_store("pass-b").unwrap();
    assert_ne!(a.filename, b.filename);
    assert_ne!(a.mnemonic, b.mnemonic);
    assert_eq!(wallet.list_all_stores().len(), 2);

    let elsewhere = tempfile::tempdir().unwrap();
    let other = api(elsewhere.path());
    let ra = other.recover_store(&a.mnemonic, "new-a").unwrap();
    let rb = other.recover_store(&b.mnemonic, "new-b").unwrap();
    assert_eq!(ra.primary_addr, a.primary_addr);
    assert_eq!(rb.primary_addr, b.primary_addr);
}

#[test]
fn recovery_round_trips_to_primary_address() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let created = wallet.new_store("pw").unwrap();

    let elsewhere = tempfile::tempdir().unwrap();
    let other = api(elsewhere.path());
    let recovered = other.recover_store(&created.mnemonic, "other-pw").unwrap();
    other.unlock(recovered.filename.as_str(), "other-pw").unwrap();
    let derived = other.derive_by_index(recovered.filename.as_str(), 0).unwrap();
    assert_eq!(derived.address, created.primary_addr);
}

#[test]
fn repeated_recovery_keeps_identity() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let created = wallet.new_store("pw").unwrap();

    let first = wallet.recover_store(&created.mnemonic, "pw2").unwrap();
    let second = wallet.recover_store(&created.mnemonic, "pw2").unwrap();
    assert_eq!(first.filename, created.filename);
    assert_eq!(second.filename, created.filename);
    assert_eq!(wallet.list_all_stores(), vec![created.filename.clone()]);

    // the rewritten file answers to the new passphrase only
    assert!(wallet.unlock(created.filename.as_str(), "pw").is_err());
    wallet.unlock(created.filename.as_str(), "pw2").unwrap();
}

#[test]
fn signing_follows_lock_state() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let created = wallet.new_store("pw").unwrap();
    let store = created.filename.as_str();
    let message = "00".repeat(32);

    let err = wallet.sign_data(&created.primary_addr, &message).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::KeyManagement);

    wallet.unlock(store, "pw").unwrap();
    assert!(wallet.is_addr_unlocked(store, &created.primary_addr).unwrap());
    assert!(wallet.sign_data(&created.primary_addr, &message).is_ok());

    wallet.lock(store).unwrap();
    assert!(!wallet.is_addr_unlocked(store, &created.primary_addr).unwrap());
    let err = wallet.sign_data(&created.primary_addr, &message).unwrap_err();
    assert!(matches!(err, TransferError::KeyNotFound(_)));
}

#[test]
fn stores_are_found_on_reopen_and_by_path() {
    let dir = tempfile::tempdir().unwrap();
    let created = {
        let wallet = api(dir.path());
        wallet.new_store("pw").unwrap()
    };

    let reopened = api(dir.path());
    assert_eq!(reopened.list_all_stores(), vec![created.filename.clone()]);
    assert_eq!(
        reopened.list_stores_in_data_dir().unwrap(),
        vec![created.filename.clone()]
    );

    let elsewhere = tempfile::tempdir().unwrap();
    let other = api(elsewhere.path());
    assert!(other.list_all_stores().is_empty());
    let id = other.add_store(created.filename.to_path_buf()).unwrap();
    assert_eq!(id, created.filename);
    assert_eq!(other.list_all_stores().len(), 1);
    assert!(other.list_stores_in_data_dir().unwrap().is_empty());
}

#[test]
fn address_lookup_across_stores() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let a = wallet.new_store("pass-a").unwrap();
    let b = wallet.new_store("pass-b").unwrap();

    wallet.unlock(b.filename.as_str(), "pass-b").unwrap();
    let target = wallet.derive_by_index(b.filename.as_str(), 6).unwrap().address.clone();

    let found = wallet.global_find_addr(&target).unwrap();
    assert_eq!(found.entropy_store_file, b.filename);
    assert_eq!(found.index, 6);
    assert_eq!(wallet.find_addr(b.filename.as_str(), &target).unwrap(), found);

    assert!(matches!(
        wallet.global_find_addr(&a.primary_addr),
        Err(WalletError::AddressNotFound(_))
    ));
    let found_a = wallet
        .find_addr_with_passphrase(a.filename.as_str(), "pass-a", &a.primary_addr)
        .unwrap();
    assert_eq!(found_a.index, 0);
    assert!(!wallet.global_check_addr_unlocked(&a.primary_addr));

    #[allow(deprecated)]
    let legacy = wallet
        .global_find_addr_with_passphrase(&a.primary_addr, "pass-a")
        .unwrap();
    assert_eq!(legacy.entropy_store_file, a.filename);
}

#[test]
fn refresh_keeps_unlock_state() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let created = wallet.new_store("pw").unwrap();
    wallet.unlock(created.filename.as_str(), "pw").unwrap();
    assert!(wallet.global_check_addr_unlocked(&created.primary_addr));
    wallet.refresh_cache();
    assert!(wallet.global_check_addr_unlocked(&created.primary_addr));
}

#[test]
fn mnemonic_extraction_checks_passphrase() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let created = wallet.new_store("pw").unwrap();
    let phrase = wallet
        .extract_mnemonic(created.primary_addr.as_str(), "pw")
        .unwrap();
    assert_eq!(*phrase, created.mnemonic);
    assert!(matches!(
        wallet.extract_mnemonic(created.primary_addr.as_str(), "nope"),
        Err(WalletError::KeyStore(KeyStoreError::InvalidPassphrase(_)))
    ));
}

#[test]
fn keystore_file_plausibility() {
    let dir = tempfile::tempdir().unwrap();
    let wallet = api(dir.path());
    let created = wallet.new_store("pw").unwrap();

    let checked = wallet.is_may_valid_keystore_file(created.filename.as_str());
    assert!(checked.maybe);
    assert_eq!(checked.may_address, Some(created.primary_addr.clone()));

    let checked = wallet.is_may_valid_keystore_file(dir.path().join("absent.json"));
    assert!(!checked.maybe);
    assert_eq!(wallet.get_data_dir(), dir.path());
}
