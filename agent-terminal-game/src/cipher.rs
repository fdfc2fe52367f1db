//! Substitution cipher puzzle (challenge 1).
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;
use thiserror::Error;

use crate::ProgressStorage;
use crate::config::TerminalConfig;
use crate::constants::CIPHER_PLACEHOLDER;
use crate::profiles::{CipherMessageId, Profile};
use crate::progress::ProgressStore;
use crate::routes::{ChallengeId, Navigation};
use crate::schedule::Schedule;

const DEFAULT_CIPHER_DATA: &str = include_str!("../data/ciphers.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherMessage {
    pub cipher: String,
    pub answer: String,
}

/// Enumerated ciphertext/plaintext pairs, indexed by [`CipherMessageId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CipherCatalog(Vec<CipherMessage>);

fn fallback_message() -> &'static CipherMessage {
    static FALLBACK: OnceLock<CipherMessage> = OnceLock::new();
    FALLBACK.get_or_init(|| CipherMessage {
        cipher: "KHOOR DJHQW, BRX KDYH IRXQG WKH ILUVW FKDOOHQJH".to_string(),
        answer: "HELLO AGENT, YOU HAVE FOUND THE FIRST CHALLENGE".to_string(),
    })
}

impl CipherCatalog {
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into cipher messages or
    /// holds none at all.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let catalog: Self = serde_json::from_str(json)?;
        if catalog.0.is_empty() {
            return Err(serde::de::Error::custom("cipher catalog is empty"));
        }
        Ok(catalog)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_CIPHER_DATA).unwrap_or_else(|err| {
            log::warn!("embedded cipher catalog rejected: {err}");
            Self(vec![fallback_message().clone()])
        })
    }

    pub fn shared() -> &'static Self {
        static CATALOG: OnceLock<CipherCatalog> = OnceLock::new();
        CATALOG.get_or_init(Self::load_from_static)
    }

    #[must_use]
    pub fn get(&self, id: CipherMessageId) -> Option<&CipherMessage> {
        self.0.get(id.index())
    }

    /// The message assigned to a profile; no profile, or an index past the
    /// end of the catalog, falls back to the first message.
    #[must_use]
    pub fn for_profile(&self, profile: Option<&Profile>) -> &CipherMessage {
        let id = profile.map_or(CipherMessageId::FIRST, |p| p.cipher_message);
        self.get(id)
            .or_else(|| self.0.first())
            .unwrap_or_else(|| fallback_message())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CipherMessage> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CipherError {
    #[error("{0:?} does not appear in the ciphertext")]
    UnknownLetter(char),
    #[error("{0:?} is not an uppercase letter")]
    NotALetter(char),
    #[error("select a cipher letter first")]
    NoSelection,
    #[error("waiting for the submission banner to clear")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Banner {
    Idle,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Solved,
    Incorrect,
    /// A banner is showing; the submission was ignored.
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CipherEffect {
    DismissError,
    NavigateBack,
}

#[derive(Debug, Clone)]
pub struct CipherPuzzle {
    message: CipherMessage,
    letters: Vec<char>,
    bindings: BTreeMap<char, char>,
    cursor: Option<char>,
    banner: Banner,
    success_ms: u64,
    error_ms: u64,
    schedule: Schedule<CipherEffect>,
}

impl CipherPuzzle {
    #[must_use]
    pub fn new(message: CipherMessage, config: &TerminalConfig) -> Self {
        let letters: BTreeSet<char> = message
            .cipher
            .chars()
            .filter(char::is_ascii_uppercase)
            .collect();
        Self {
            message,
            letters: letters.into_iter().collect(),
            bindings: BTreeMap::new(),
            cursor: None,
            banner: Banner::Idle,
            success_ms: config.cipher_success_ms,
            error_ms: config.cipher_error_ms,
            schedule: Schedule::new(),
        }
    }

    #[must_use]
    pub fn ciphertext(&self) -> &str {
        &self.message.cipher
    }

    /// Distinct cipher letters in sorted order.
    #[must_use]
    pub fn letters(&self) -> &[char] {
        &self.letters
    }

    #[must_use]
    pub const fn cursor(&self) -> Option<char> {
        self.cursor
    }

    #[must_use]
    pub const fn banner(&self) -> Banner {
        self.banner
    }

    #[must_use]
    pub fn binding(&self, cipher_letter: char) -> Option<char> {
        self.bindings.get(&cipher_letter).copied()
    }

    /// Plain letters already handed out, for shading the keyboard.
    #[must_use]
    pub fn used_letters(&self) -> BTreeSet<char> {
        self.bindings.values().copied().collect()
    }

    /// Move the edit cursor to a cipher letter.
    ///
    /// # Errors
    ///
    /// Fails while a banner is showing or if the letter is not in the message.
    pub fn select(&mut self, cipher_letter: char) -> Result<(), CipherError> {
        self.ensure_editable()?;
        if self.letters.binary_search(&cipher_letter).is_err() {
            return Err(CipherError::UnknownLetter(cipher_letter));
        }
        self.cursor = Some(cipher_letter);
        Ok(())
    }

    /// Bind the selected cipher letter to `plain`, then jump to the first
    /// cipher letter that is still unbound.
    ///
    /// # Errors
    ///
    /// Fails without a selection, for non-letters, or while a banner is showing.
    pub fn assign(&mut self, plain: char) -> Result<(), CipherError> {
        self.ensure_editable()?;
        if !plain.is_ascii_uppercase() {
            return Err(CipherError::NotALetter(plain));
        }
        let selected = self.cursor.ok_or(CipherError::NoSelection)?;
        self.bindings.insert(selected, plain);
        self.cursor = self
            .letters
            .iter()
            .copied()
            .find(|letter| !self.bindings.contains_key(letter));
        Ok(())
    }

    /// Drop every binding and the cursor.
    ///
    /// # Errors
    ///
    /// Fails while a banner is showing.
    pub fn clear(&mut self) -> Result<(), CipherError> {
        self.ensure_editable()?;
        self.bindings.clear();
        self.cursor = None;
        Ok(())
    }

    /// The ciphertext under the current bindings. Non-letters pass through;
    /// unbound letters show as `_`.
    #[must_use]
    pub fn decode(&self) -> String {
        self.message
            .cipher
            .chars()
            .map(|ch| {
                if ch.is_ascii_uppercase() {
                    self.binding(ch).unwrap_or(CIPHER_PLACEHOLDER)
                } else {
                    ch
                }
            })
            .collect()
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        self.decode() == self.message.answer
    }

    /// Compare the decode with the answer, character for character.
    pub fn submit<S: ProgressStorage>(&mut self, store: &mut ProgressStore<S>) -> Verdict {
        if self.banner != Banner::Idle {
            return Verdict::Busy;
        }
        if self.is_solved() {
            store.complete(ChallengeId::Cipher);
            self.banner = Banner::Success;
            self.schedule
                .schedule(self.success_ms, CipherEffect::NavigateBack);
            Verdict::Solved
        } else {
            self.banner = Banner::Error;
            self.schedule
                .schedule(self.error_ms, CipherEffect::DismissError);
            Verdict::Incorrect
        }
    }

    /// Fire due banner effects. Returns the navigation signal once the
    /// success banner has been shown long enough.
    pub fn advance(&mut self, elapsed_ms: u64) -> Option<Navigation> {
        let mut navigation = None;
        for effect in self.schedule.advance(elapsed_ms) {
            match effect {
                CipherEffect::DismissError => self.banner = Banner::Idle,
                CipherEffect::NavigateBack => navigation = Some(Navigation::Back),
            }
        }
        navigation
    }

    pub fn teardown(&mut self) {
        self.schedule.cancel_all();
    }

    const fn ensure_editable(&self) -> Result<(), CipherError> {
        match self.banner {
            Banner::Idle => Ok(()),
            Banner::Success | Banner::Error => Err(CipherError::Busy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStorage;

    fn puzzle(cipher: &str, answer: &str) -> CipherPuzzle {
        CipherPuzzle::new(
            CipherMessage {
                cipher: cipher.to_string(),
                answer: answer.to_string(),
            },
            &TerminalConfig::default(),
        )
    }

    fn bind(puzzle: &mut CipherPuzzle, pairs: &[(char, char)]) {
        for &(cipher, plain) in pairs {
            puzzle.select(cipher).unwrap();
            puzzle.assign(plain).unwrap();
        }
    }

    #[test]
    fn decodes_hello() {
        let mut p = puzzle("KHOOR", "HELLO");
        bind(&mut p, &[('K', 'H'), ('H', 'E'), ('O', 'L'), ('R', 'O')]);
        assert_eq!(p.decode(), "HELLO");
    }

    #[test]
    fn unbound_letters_show_placeholder_and_punctuation_passes() {
        let mut p = puzzle("NY'X WJAJFSFY, NY'X KWJFHM", "IT'S REVENANT, IT'S FRENCH");
        bind(&mut p, &[('N', 'I')]);
        assert_eq!(p.decode(), "I_'_ ________, I_'_ ______");
    }

    #[test]
    fn letters_are_sorted_and_distinct() {
        let p = puzzle("KHOOR", "HELLO");
        assert_eq!(p.letters(), &['H', 'K', 'O', 'R']);
    }

    #[test]
    fn assign_advances_to_first_unbound_letter() {
        let mut p = puzzle("KHOOR", "HELLO");
        p.select('O').unwrap();
        p.assign('L').unwrap();
        assert_eq!(p.cursor(), Some('H'));
        p.assign('E').unwrap();
        assert_eq!(p.cursor(), Some('K'));
        p.assign('H').unwrap();
        assert_eq!(p.cursor(), Some('R'));
        p.assign('O').unwrap();
        assert_eq!(p.cursor(), None);
    }

    #[test]
    fn rebinding_overwrites() {
        let mut p = puzzle("KHOOR", "HELLO");
        bind(&mut p, &[('K', 'Z'), ('K', 'H')]);
        assert_eq!(p.binding('K'), Some('H'));
    }

    #[test]
    fn assign_requires_selection() {
        let mut p = puzzle("KHOOR", "HELLO");
        assert_eq!(p.assign('H'), Err(CipherError::NoSelection));
        assert_eq!(p.select('Q'), Err(CipherError::UnknownLetter('Q')));
        p.select('K').unwrap();
        assert_eq!(p.assign('h'), Err(CipherError::NotALetter('h')));
    }

    #[test]
    fn duplicate_plain_letters_are_allowed_but_never_solve() {
        let mut p = puzzle("KHOOR", "HELLO");
        bind(&mut p, &[('K', 'H'), ('H', 'H'), ('O', 'L'), ('R', 'O')]);
        assert_eq!(p.used_letters().len(), 3);
        assert!(!p.is_solved());
    }

    #[test]
    fn wrong_submission_keeps_bindings() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut p = puzzle("KHOOR", "HELLO");
        bind(&mut p, &[('K', 'H')]);
        assert_eq!(p.submit(&mut store), Verdict::Incorrect);
        assert_eq!(p.banner(), Banner::Error);
        assert_eq!(p.select('H'), Err(CipherError::Busy));
        assert_eq!(p.submit(&mut store), Verdict::Busy);
        assert_eq!(p.advance(2_000), None);
        assert_eq!(p.banner(), Banner::Idle);
        assert_eq!(p.binding('K'), Some('H'));
        assert!(!store.is_complete(ChallengeId::Cipher));
    }

    #[test]
    fn solving_marks_challenge_and_navigates_back() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut p = puzzle("KHOOR", "HELLO");
        bind(&mut p, &[('K', 'H'), ('H', 'E'), ('O', 'L'), ('R', 'O')]);
        assert_eq!(p.submit(&mut store), Verdict::Solved);
        assert!(store.is_complete(ChallengeId::Cipher));
        assert_eq!(p.advance(1_999), None);
        assert_eq!(p.advance(1), Some(Navigation::Back));
    }

    #[test]
    fn teardown_cancels_navigation() {
        let mut store = ProgressStore::open(MemoryStorage::new());
        let mut p = puzzle("KHOOR", "HELLO");
        bind(&mut p, &[('K', 'H'), ('H', 'E'), ('O', 'L'), ('R', 'O')]);
        p.submit(&mut store);
        p.teardown();
        assert_eq!(p.advance(10_000), None);
    }

    #[test]
    fn catalog_pairs_are_consistent_substitutions() {
        let catalog = CipherCatalog::load_from_static();
        assert_eq!(catalog.len(), crate::constants::CIPHER_MESSAGE_COUNT);
        for message in catalog.iter() {
            assert_eq!(message.cipher.len(), message.answer.len());
            let mut forward = BTreeMap::new();
            for (c, p) in message.cipher.chars().zip(message.answer.chars()) {
                if c.is_ascii_uppercase() {
                    assert_eq!(*forward.entry(c).or_insert(p), p, "{}", message.cipher);
                } else {
                    assert_eq!(c, p);
                }
            }
        }
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert!(CipherCatalog::from_json("[]").is_err());
    }

    #[test]
    fn empty_catalog_still_yields_a_message() {
        let empty: CipherCatalog = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
        let message = empty.for_profile(None);
        assert_eq!(message.answer, "HELLO AGENT, YOU HAVE FOUND THE FIRST CHALLENGE");
    }

    #[test]
    fn profile_selects_message() {
        let catalog = CipherCatalog::shared();
        let directory = crate::profiles::ProfileDirectory::shared();
        let message = catalog.for_profile(directory.lookup("42891"));
        assert_eq!(message.answer, "IT'S REVENANT, IT'S FRENCH");
        assert_eq!(
            catalog.for_profile(None).answer,
            "HELLO AGENT, YOU HAVE FOUND THE FIRST CHALLENGE"
        );
    }
}
