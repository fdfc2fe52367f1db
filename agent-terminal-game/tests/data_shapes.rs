use agent_terminal_game::{CipherCatalog, CipherMessageId, ProfileDirectory, TerminalConfig};
use std::collections::HashSet;
use std::hash::Hasher;
use twox_hash::XxHash64;

fn fingerprint(json: &str) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(json.as_bytes());
    hasher.finish()
}

#[test]
fn profile_table_has_every_agent() {
    let directory = ProfileDirectory::load_from_static();
    assert_eq!(directory.len(), 17);
    let names: HashSet<&str> = directory.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 17, "agent names must be unique");
    for code in ["53712", "84629", "19456", "67238", "42891"] {
        assert!(directory.is_valid(code), "{code}");
    }
}

#[test]
fn every_profile_cipher_resolves() {
    let directory = ProfileDirectory::shared();
    let catalog = CipherCatalog::shared();
    for profile in directory.iter() {
        let message = catalog.get(profile.cipher_message).unwrap();
        assert_eq!(message.cipher.len(), message.answer.len(), "{}", profile.name);
    }
}

#[test]
fn cipher_catalog_keeps_punctuation_aligned() {
    for message in CipherCatalog::shared().iter() {
        for (c, p) in message.cipher.chars().zip(message.answer.chars()) {
            assert_eq!(c.is_ascii_uppercase(), p.is_ascii_uppercase());
            if !c.is_ascii_uppercase() {
                assert_eq!(c, p);
            }
        }
    }
    assert!(CipherMessageId::new(7).is_none());
}

#[test]
fn reserialised_tables_are_stable() {
    let catalog = CipherCatalog::shared();
    let first = serde_json::to_string(catalog).unwrap();
    let reparsed = CipherCatalog::from_json(&first).unwrap();
    let second = serde_json::to_string(&reparsed).unwrap();
    assert_eq!(fingerprint(&first), fingerprint(&second));

    let config = TerminalConfig::load_from_static();
    let config_json = serde_json::to_string(&config).unwrap();
    let config_again = serde_json::to_string(&TerminalConfig::from_json(&config_json).unwrap()).unwrap();
    assert_eq!(fingerprint(&config_json), fingerprint(&config_again));
}
