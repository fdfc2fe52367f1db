//! Static passcode → agent profile table.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::{CIPHER_MESSAGE_COUNT, PASSCODE_LEN};

const DEFAULT_PROFILE_DATA: &str = include_str!("../data/profiles.json");

/// Index into the cipher message catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherMessageId(u8);

impl CipherMessageId {
    pub const FIRST: Self = Self(0);

    #[must_use]
    pub fn new(index: u8) -> Option<Self> {
        (usize::from(index) < CIPHER_MESSAGE_COUNT).then_some(Self(index))
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub passcode: String,
    pub name: String,
    pub cipher_message: CipherMessageId,
}

#[derive(Debug, Clone, Deserialize)]
struct ProfileNoPasscode {
    name: String,
    cipher_message: u8,
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("passcode {0:?} must be exactly {PASSCODE_LEN} ASCII digits")]
    MalformedPasscode(String),
    #[error("profile {passcode} references unknown cipher message {index}")]
    UnknownCipherMessage { passcode: String, index: u8 },
}

/// Returns `true` when `code` has the keypad shape: five ASCII digits.
#[must_use]
pub fn is_passcode_shaped(code: &str) -> bool {
    code.len() == PASSCODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

/// Read-only lookup from passcode to profile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfileDirectory {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileDirectory {
    /// Parse a `{ "<passcode>": { "name": .., "cipher_message": .. } }` document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed, a passcode is not five
    /// digits, or a profile points at a cipher message that does not exist.
    pub fn from_json(json: &str) -> Result<Self, DirectoryError> {
        let raw: BTreeMap<String, ProfileNoPasscode> = serde_json::from_str(json)?;
        let mut profiles = BTreeMap::new();
        for (passcode, entry) in raw {
            if !is_passcode_shaped(&passcode) {
                return Err(DirectoryError::MalformedPasscode(passcode));
            }
            let Some(cipher_message) = CipherMessageId::new(entry.cipher_message) else {
                return Err(DirectoryError::UnknownCipherMessage {
                    passcode,
                    index: entry.cipher_message,
                });
            };
            profiles.insert(
                passcode.clone(),
                Profile {
                    passcode,
                    name: entry.name,
                    cipher_message,
                },
            );
        }
        Ok(Self { profiles })
    }

    /// The table embedded in the crate. An unparsable asset yields an empty
    /// directory, which rejects every passcode.
    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_PROFILE_DATA).unwrap_or_else(|err| {
            log::warn!("embedded profile table rejected: {err}");
            Self::default()
        })
    }

    /// Process-wide instance of the embedded table.
    pub fn shared() -> &'static Self {
        static DIRECTORY: OnceLock<ProfileDirectory> = OnceLock::new();
        DIRECTORY.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn lookup(&self, passcode: &str) -> Option<&Profile> {
        self.profiles.get(passcode)
    }

    #[must_use]
    pub fn is_valid(&self, passcode: &str) -> bool {
        self.profiles.contains_key(passcode)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_loads_every_profile() {
        let directory = ProfileDirectory::load_from_static();
        assert_eq!(directory.len(), 17);
        let profile = directory.lookup("53712").expect("known passcode");
        assert_eq!(profile.name, "GUANSTAUNCHAMO");
        assert_eq!(profile.cipher_message.index(), 5);
        assert_eq!(profile.passcode, "53712");
    }

    #[test]
    fn unknown_passcodes_are_invalid() {
        let directory = ProfileDirectory::shared();
        assert!(!directory.is_valid("00000"));
        assert!(directory.lookup("5371").is_none());
        assert!(directory.is_valid("25649"));
    }

    #[test]
    fn rejects_malformed_passcode_keys() {
        let err = ProfileDirectory::from_json(r#"{ "12a45": { "name": "X", "cipher_message": 0 } }"#)
            .unwrap_err();
        assert!(matches!(err, DirectoryError::MalformedPasscode(code) if code == "12a45"));
    }

    #[test]
    fn rejects_out_of_range_cipher_index() {
        let err = ProfileDirectory::from_json(r#"{ "12345": { "name": "X", "cipher_message": 7 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::UnknownCipherMessage { index: 7, .. }
        ));
    }

    #[test]
    fn passcode_shape_requires_five_digits() {
        assert!(is_passcode_shaped("00000"));
        assert!(!is_passcode_shaped("0000"));
        assert!(!is_passcode_shaped("000000"));
        assert!(!is_passcode_shaped("1234x"));
    }
}
