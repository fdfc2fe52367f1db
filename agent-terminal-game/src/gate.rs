//! Keypad passcode entry in front of the hub.
use thiserror::Error;

use crate::ProgressStorage;
use crate::config::TerminalConfig;
use crate::constants::PASSCODE_LEN;
use crate::profiles::ProfileDirectory;
use crate::progress::ProgressStore;
use crate::routes::Navigation;
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("keypad only accepts digits 0-9 (got {0:?})")]
    NotADigit(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// Fewer than five digits entered; nothing happened.
    Incomplete,
    /// The invalid-passcode banner is still up; input waits for the auto-clear.
    Cooldown,
    Granted {
        agent_name: String,
        navigation: Navigation,
    },
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateEffect {
    ClearRejected,
}

#[derive(Debug, Clone)]
pub struct AccessGate {
    entry: String,
    error: bool,
    error_ms: u64,
    schedule: Schedule<GateEffect>,
}

impl AccessGate {
    #[must_use]
    pub fn new(config: &TerminalConfig) -> Self {
        Self {
            entry: String::with_capacity(PASSCODE_LEN),
            error: false,
            error_ms: config.passcode_error_ms,
            schedule: Schedule::new(),
        }
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Keypad display: entered digits, then `_` for the remaining slots.
    #[must_use]
    pub fn display(&self) -> String {
        let mut shown = self.entry.clone();
        shown.extend(std::iter::repeat_n('_', PASSCODE_LEN - self.entry.len()));
        shown
    }

    #[must_use]
    pub const fn shows_error(&self) -> bool {
        self.error
    }

    /// Append one digit. Returns `Ok(false)` when the entry is already full.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::NotADigit`] for anything other than `0`-`9`.
    pub fn press_digit(&mut self, key: char) -> Result<bool, GateError> {
        if !key.is_ascii_digit() {
            return Err(GateError::NotADigit(key));
        }
        if self.entry.len() >= PASSCODE_LEN {
            return Ok(false);
        }
        self.entry.push(key);
        self.error = false;
        Ok(true)
    }

    pub fn clear(&mut self) {
        self.entry.clear();
        self.error = false;
        self.schedule.cancel_all();
    }

    /// Check the entry against the directory and sign in on a match.
    pub fn submit<S: ProgressStorage>(
        &mut self,
        directory: &ProfileDirectory,
        store: &mut ProgressStore<S>,
    ) -> GateOutcome {
        if self.error {
            return GateOutcome::Cooldown;
        }
        if self.entry.len() != PASSCODE_LEN {
            return GateOutcome::Incomplete;
        }
        if let Some(profile) = directory.lookup(&self.entry) {
            store.login(&profile.passcode);
            return GateOutcome::Granted {
                agent_name: profile.name.clone(),
                navigation: Navigation::Hub,
            };
        }
        log::debug!("rejected passcode entry");
        self.error = true;
        self.schedule
            .schedule(self.error_ms, GateEffect::ClearRejected);
        GateOutcome::Denied
    }

    /// Run the deferred auto-clear once its delay has elapsed.
    pub fn advance(&mut self, elapsed_ms: u64) {
        for effect in self.schedule.advance(elapsed_ms) {
            match effect {
                GateEffect::ClearRejected => {
                    self.entry.clear();
                    self.error = false;
                }
            }
        }
    }

    /// Drop pending effects; call when the screen goes away.
    pub fn teardown(&mut self) {
        self.schedule.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::MemoryStorage;

    fn type_code(gate: &mut AccessGate, code: &str) {
        for key in code.chars() {
            gate.press_digit(key).unwrap();
        }
    }

    #[test]
    fn valid_code_signs_in() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        let mut store = ProgressStore::open(MemoryStorage::new());
        type_code(&mut gate, "53712");
        let outcome = gate.submit(ProfileDirectory::shared(), &mut store);
        assert_eq!(
            outcome,
            GateOutcome::Granted {
                agent_name: "GUANSTAUNCHAMO".to_string(),
                navigation: Navigation::Hub,
            }
        );
        assert!(store.is_authenticated());
        assert_eq!(store.active_passcode(), Some("53712"));
    }

    #[test]
    fn invalid_code_flashes_error_then_clears() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        let mut store = ProgressStore::open(MemoryStorage::new());
        type_code(&mut gate, "00000");
        assert_eq!(
            gate.submit(ProfileDirectory::shared(), &mut store),
            GateOutcome::Denied
        );
        assert!(gate.shows_error());
        assert!(!store.is_authenticated());

        assert_eq!(
            gate.submit(ProfileDirectory::shared(), &mut store),
            GateOutcome::Cooldown
        );
        gate.advance(999);
        assert!(gate.shows_error());
        assert_eq!(gate.entry(), "00000");
        gate.advance(1);
        assert!(!gate.shows_error());
        assert_eq!(gate.entry(), "");
    }

    #[test]
    fn sixth_digit_is_ignored() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        type_code(&mut gate, "12345");
        assert_eq!(gate.press_digit('6'), Ok(false));
        assert_eq!(gate.entry(), "12345");
    }

    #[test]
    fn short_entry_does_nothing() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        let mut store = ProgressStore::open(MemoryStorage::new());
        type_code(&mut gate, "5371");
        assert_eq!(
            gate.submit(ProfileDirectory::shared(), &mut store),
            GateOutcome::Incomplete
        );
        assert!(!gate.shows_error());
        assert_eq!(gate.display(), "5371_");
    }

    #[test]
    fn rejects_non_digit_keys() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        assert_eq!(gate.press_digit('x'), Err(GateError::NotADigit('x')));
        assert_eq!(gate.entry(), "");
    }

    #[test]
    fn clear_cancels_pending_auto_clear() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        let mut store = ProgressStore::open(MemoryStorage::new());
        type_code(&mut gate, "99999");
        gate.submit(ProfileDirectory::shared(), &mut store);
        gate.clear();
        type_code(&mut gate, "53");
        gate.advance(5_000);
        assert_eq!(gate.entry(), "53");
    }

    #[test]
    fn teardown_drops_auto_clear() {
        let mut gate = AccessGate::new(&TerminalConfig::default());
        let mut store = ProgressStore::open(MemoryStorage::new());
        type_code(&mut gate, "99999");
        gate.submit(ProfileDirectory::shared(), &mut store);
        gate.teardown();
        gate.advance(5_000);
        assert!(gate.shows_error());
    }
}
