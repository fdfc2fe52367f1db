//! Persisted player progress.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use crate::ProgressStorage;
use crate::profiles::{Profile, ProfileDirectory};
use crate::routes::ChallengeId;

/// Everything that survives a reload. Field names follow the record layout
/// the web build already writes, so existing saves keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressState {
    #[serde(rename = "isAuthenticated")]
    pub authenticated: bool,
    pub active_passcode: Option<String>,
    pub seen_intro: bool,
    pub challenge1_complete: bool,
    pub challenge2_complete: bool,
    pub challenge3_complete: bool,
}

impl ProgressState {
    #[must_use]
    pub const fn is_complete(&self, challenge: ChallengeId) -> bool {
        match challenge {
            ChallengeId::Cipher => self.challenge1_complete,
            ChallengeId::Lights => self.challenge2_complete,
            ChallengeId::Codebreaker => self.challenge3_complete,
        }
    }

    #[must_use]
    pub const fn all_challenges_complete(&self) -> bool {
        self.challenge1_complete && self.challenge2_complete && self.challenge3_complete
    }

    #[must_use]
    pub fn completed_count(&self) -> u8 {
        ChallengeId::all()
            .into_iter()
            .map(|challenge| u8::from(self.is_complete(challenge)))
            .sum()
    }

    fn flag_mut(&mut self, challenge: ChallengeId) -> &mut bool {
        match challenge {
            ChallengeId::Cipher => &mut self.challenge1_complete,
            ChallengeId::Lights => &mut self.challenge2_complete,
            ChallengeId::Codebreaker => &mut self.challenge3_complete,
        }
    }
}

/// In-memory persistence, shared between clones. Records are kept as JSON so
/// the serialized shape is exercised the same way a browser store would.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    record: Rc<RefCell<Option<String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the storage with a raw record, as if written by an earlier session.
    #[must_use]
    pub fn with_record(json: impl Into<String>) -> Self {
        Self {
            record: Rc::new(RefCell::new(Some(json.into()))),
        }
    }

    #[must_use]
    pub fn raw(&self) -> Option<String> {
        self.record.borrow().clone()
    }
}

impl ProgressStorage for MemoryStorage {
    type Error = serde_json::Error;

    fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
        self.record
            .borrow()
            .as_deref()
            .map(serde_json::from_str::<ProgressState>)
            .transpose()
    }

    fn save(&self, state: &ProgressState) -> Result<(), Self::Error> {
        let json = serde_json::to_string(state)?;
        *self.record.borrow_mut() = Some(json);
        Ok(())
    }

    fn clear(&self) -> Result<(), Self::Error> {
        self.record.borrow_mut().take();
        Ok(())
    }
}

/// Progress plus the storage it is mirrored to. Read once on open, written
/// after every mutation.
#[derive(Debug)]
pub struct ProgressStore<S: ProgressStorage> {
    storage: S,
    state: ProgressState,
}

impl<S: ProgressStorage> ProgressStore<S> {
    /// Load the persisted record, falling back to a fresh state when nothing
    /// was saved or the record cannot be read.
    pub fn open(storage: S) -> Self {
        let state = match storage.load() {
            Ok(Some(state)) => state,
            Ok(None) => ProgressState::default(),
            Err(err) => {
                log::warn!("discarding unreadable progress record: {err}");
                ProgressState::default()
            }
        };
        Self { storage, state }
    }

    /// Like [`ProgressStore::open`], but signs the player out when the saved
    /// passcode no longer names a profile.
    pub fn open_validated(storage: S, directory: &ProfileDirectory) -> Self {
        let mut store = Self::open(storage);
        let stale = store
            .state
            .active_passcode
            .as_deref()
            .is_some_and(|code| !directory.is_valid(code));
        let orphaned = store.state.authenticated && store.state.active_passcode.is_none();
        if stale || orphaned {
            log::warn!("persisted passcode no longer resolves; signing out");
            store.state.authenticated = false;
            store.state.active_passcode = None;
            store.persist();
        }
        store
    }

    #[must_use]
    pub const fn state(&self) -> &ProgressState {
        &self.state
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.state.authenticated
    }

    #[must_use]
    pub fn active_passcode(&self) -> Option<&str> {
        self.state.active_passcode.as_deref()
    }

    #[must_use]
    pub fn active_profile<'a>(&self, directory: &'a ProfileDirectory) -> Option<&'a Profile> {
        self.active_passcode()
            .and_then(|code| directory.lookup(code))
    }

    /// Sign in with an already validated passcode. The intro replays for
    /// every new session.
    pub(crate) fn login(&mut self, passcode: &str) {
        self.state.authenticated = true;
        self.state.active_passcode = Some(passcode.to_string());
        self.state.seen_intro = false;
        log::debug!("agent {passcode} signed in");
        self.persist();
    }

    pub fn logout(&mut self) {
        self.state.authenticated = false;
        self.state.active_passcode = None;
        self.persist();
    }

    pub fn mark_intro_seen(&mut self) {
        if !self.state.seen_intro {
            self.state.seen_intro = true;
            self.persist();
        }
    }

    /// Flag a challenge as solved. Returns `true` the first time.
    pub fn complete(&mut self, challenge: ChallengeId) -> bool {
        let flag = self.state.flag_mut(challenge);
        if *flag {
            return false;
        }
        *flag = true;
        log::debug!("challenge {} complete", challenge.number());
        self.persist();
        true
    }

    #[must_use]
    pub const fn is_complete(&self, challenge: ChallengeId) -> bool {
        self.state.is_complete(challenge)
    }

    #[must_use]
    pub const fn all_challenges_complete(&self) -> bool {
        self.state.all_challenges_complete()
    }

    #[must_use]
    pub fn completed_count(&self) -> u8 {
        self.state.completed_count()
    }

    /// Forget everything, including the sign-in.
    pub fn reset(&mut self) {
        self.state = ProgressState::default();
        if let Err(err) = self.storage.clear() {
            log::warn!("failed to clear progress record: {err}");
        }
        self.persist();
    }

    fn persist(&self) {
        if let Err(err) = self.storage.save(&self.state) {
            log::warn!("failed to persist progress: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Debug, Default)]
    struct ReadOnlyStorage;

    #[derive(Debug, thiserror::Error)]
    #[error("storage is read-only")]
    struct ReadOnly;

    impl ProgressStorage for ReadOnlyStorage {
        type Error = ReadOnly;

        fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
            Ok(None)
        }

        fn save(&self, _state: &ProgressState) -> Result<(), Self::Error> {
            Err(ReadOnly)
        }

        fn clear(&self) -> Result<(), Self::Error> {
            Err(ReadOnly)
        }
    }

    #[derive(Debug, Default)]
    struct NullStorage;

    impl ProgressStorage for NullStorage {
        type Error = Infallible;

        fn load(&self) -> Result<Option<ProgressState>, Self::Error> {
            Ok(None)
        }

        fn save(&self, _state: &ProgressState) -> Result<(), Self::Error> {
            Ok(())
        }

        fn clear(&self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    #[test]
    fn fresh_store_starts_signed_out() {
        let store = ProgressStore::open(NullStorage);
        assert_eq!(store.state(), &ProgressState::default());
        assert!(!store.is_authenticated());
        assert_eq!(store.completed_count(), 0);
    }

    #[test]
    fn mutations_are_written_through() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        store.login("53712");
        store.complete(ChallengeId::Lights);

        let reopened = ProgressStore::open(storage);
        assert!(reopened.is_authenticated());
        assert_eq!(reopened.active_passcode(), Some("53712"));
        assert!(reopened.is_complete(ChallengeId::Lights));
        assert!(!reopened.state().seen_intro);
    }

    #[test]
    fn login_replays_intro() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        store.login("53712");
        store.mark_intro_seen();
        assert!(store.state().seen_intro);
        store.login("84629");
        assert!(!store.state().seen_intro);
    }

    #[test]
    fn completing_twice_reports_once() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        assert!(store.complete(ChallengeId::Cipher));
        assert!(!store.complete(ChallengeId::Cipher));
        assert_eq!(store.completed_count(), 1);
    }

    #[test]
    fn all_three_unlock_the_locator() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        store.complete(ChallengeId::Cipher);
        store.complete(ChallengeId::Lights);
        assert!(!store.all_challenges_complete());
        store.complete(ChallengeId::Codebreaker);
        assert!(store.all_challenges_complete());
    }

    #[test]
    fn reset_clears_everything() {
        let storage = MemoryStorage::new();
        let mut store = ProgressStore::open(storage.clone());
        store.login("53712");
        store.complete(ChallengeId::Codebreaker);
        store.reset();
        assert_eq!(store.state(), &ProgressState::default());
        assert_eq!(
            ProgressStore::open(storage).state(),
            &ProgressState::default()
        );
    }

    #[test]
    fn write_failures_keep_memory_state() {
        let mut store = ProgressStore::open(ReadOnlyStorage);
        store.login("53712");
        store.complete(ChallengeId::Cipher);
        assert!(store.is_authenticated());
        assert!(store.is_complete(ChallengeId::Cipher));
        store.reset();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn unreadable_record_falls_back_to_default() {
        let store = ProgressStore::open(MemoryStorage::with_record("{not json"));
        assert_eq!(store.state(), &ProgressState::default());
    }

    #[test]
    fn reads_records_without_intro_flag() {
        let storage = MemoryStorage::with_record(
            r#"{"isAuthenticated":true,"activePasscode":"42891","challenge1Complete":true}"#,
        );
        let store = ProgressStore::open(storage);
        assert!(store.is_authenticated());
        assert_eq!(store.active_passcode(), Some("42891"));
        assert!(store.is_complete(ChallengeId::Cipher));
        assert!(!store.state().seen_intro);
    }

    #[test]
    fn validated_open_drops_unknown_passcode() {
        let storage = MemoryStorage::with_record(
            r#"{"isAuthenticated":true,"activePasscode":"67823","challenge2Complete":true}"#,
        );
        let store = ProgressStore::open_validated(storage.clone(), ProfileDirectory::shared());
        assert!(!store.is_authenticated());
        assert_eq!(store.active_passcode(), None);
        assert!(store.is_complete(ChallengeId::Lights));
        let persisted = ProgressStore::open(storage);
        assert_eq!(persisted.active_passcode(), None);
    }

    #[test]
    fn active_profile_resolves_through_directory() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        store.login("71043");
        let profile = store
            .active_profile(ProfileDirectory::shared())
            .expect("profile");
        assert_eq!(profile.name, "DJ DUNGEON MASTER");
    }
}
