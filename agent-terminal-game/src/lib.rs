//! Agent Terminal Game Engine
//!
//! Platform-agnostic core for the Agent Terminal party game: the passcode
//! gate, the three puzzles, the locator and the progress they share. No
//! rendering and no platform I/O live here; persistence and device location
//! are ports the host implements.

pub mod cipher;
pub mod codebreaker;
pub mod config;
pub mod constants;
pub mod gate;
pub mod geo;
pub mod intro;
pub mod lights;
pub mod profiles;
pub mod progress;
pub mod routes;
pub mod schedule;

// Re-export commonly used types
pub use cipher::{Banner, CipherCatalog, CipherError, CipherMessage, CipherPuzzle, Verdict};
pub use codebreaker::{
    Code, Codebreaker, CodebreakerError, Feedback, GameStatus, GuessOutcome, GuessRecord, score,
    seeded_rng,
};
pub use config::{ConfigError, TerminalConfig};
pub use gate::{AccessGate, GateError, GateOutcome};
pub use geo::{
    CompassPoint, Coordinate, LocationError, LocationOptions, LocationProvider, Locator,
    LocatorReport, LocatorState, bearing_deg, distance_km, format_distance,
};
pub use intro::{ChallengeEntry, Hub, IntroSequence};
pub use lights::{LightsError, LightsGrid, LightsPuzzle, ToggleOutcome, solve_presses};
pub use profiles::{CipherMessageId, DirectoryError, Profile, ProfileDirectory};
pub use progress::{MemoryStorage, ProgressState, ProgressStore};
pub use routes::{ChallengeId, Navigation, Redirect, Route, guard};
pub use schedule::{Schedule, TaskHandle};

use rand::Rng;

/// Trait for abstracting progress persistence.
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the saved record, `None` when nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<ProgressState>, Self::Error>;

    /// Replace the saved record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, state: &ProgressState) -> Result<(), Self::Error>;

    /// Remove the saved record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be removed.
    fn clear(&self) -> Result<(), Self::Error>;
}

/// One running terminal: shared data tables plus the player's progress.
/// Screens are built from here so each one sees the same config and store.
#[derive(Debug)]
pub struct Terminal<S: ProgressStorage> {
    config: TerminalConfig,
    directory: ProfileDirectory,
    catalog: CipherCatalog,
    store: ProgressStore<S>,
}

impl<S: ProgressStorage> Terminal<S> {
    /// Open with the embedded tables and configuration.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, TerminalConfig::load_from_static())
    }

    pub fn with_config(storage: S, config: TerminalConfig) -> Self {
        Self::with_tables(
            storage,
            config,
            ProfileDirectory::shared().clone(),
            CipherCatalog::shared().clone(),
        )
    }

    /// Open against explicit tables. A saved sign-in whose passcode is not in
    /// `directory` is dropped.
    pub fn with_tables(
        storage: S,
        config: TerminalConfig,
        directory: ProfileDirectory,
        catalog: CipherCatalog,
    ) -> Self {
        let store = ProgressStore::open_validated(storage, &directory);
        Self {
            config,
            directory,
            catalog,
            store,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &TerminalConfig {
        &self.config
    }

    #[must_use]
    pub const fn directory(&self) -> &ProfileDirectory {
        &self.directory
    }

    #[must_use]
    pub const fn catalog(&self) -> &CipherCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn store(&self) -> &ProgressStore<S> {
        &self.store
    }

    pub const fn store_mut(&mut self) -> &mut ProgressStore<S> {
        &mut self.store
    }

    /// Where a cold start should land.
    #[must_use]
    pub const fn landing(&self) -> Route {
        if self.store.is_authenticated() {
            Route::Hub
        } else {
            Route::Login
        }
    }

    #[must_use]
    pub fn access_gate(&self) -> AccessGate {
        AccessGate::new(&self.config)
    }

    /// Submit the keypad entry against this terminal's directory.
    pub fn submit_passcode(&mut self, gate: &mut AccessGate) -> GateOutcome {
        gate.submit(&self.directory, &mut self.store)
    }

    /// # Errors
    ///
    /// Returns the redirect when nobody is signed in.
    pub fn hub<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Hub, Redirect> {
        Hub::open(&self.store, &self.directory, &self.config, rng)
    }

    /// The cipher assigned to the signed-in agent.
    ///
    /// # Errors
    ///
    /// Returns the redirect when nobody is signed in.
    pub fn cipher_puzzle(&self) -> Result<CipherPuzzle, Redirect> {
        guard(Route::Cipher, self.store.state())?;
        let profile = self.store.active_profile(&self.directory);
        let message = self.catalog.for_profile(profile).clone();
        Ok(CipherPuzzle::new(message, &self.config))
    }

    /// # Errors
    ///
    /// Returns the redirect when nobody is signed in.
    pub fn lights_puzzle(&self) -> Result<LightsPuzzle, Redirect> {
        guard(Route::Lights, self.store.state())?;
        Ok(LightsPuzzle::new(&self.config))
    }

    /// # Errors
    ///
    /// Returns the redirect when nobody is signed in.
    pub fn codebreaker<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Codebreaker, Redirect> {
        guard(Route::Codebreaker, self.store.state())?;
        Ok(Codebreaker::new(&self.config, rng))
    }

    /// # Errors
    ///
    /// Returns the redirect when signed out or with challenges left.
    pub fn locator(&self) -> Result<Locator, Redirect> {
        Locator::open(&self.store, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_lands_on_login() {
        let terminal = Terminal::new(MemoryStorage::new());
        assert_eq!(terminal.landing(), Route::Login);
        assert!(terminal.cipher_puzzle().is_err());
        assert_eq!(
            terminal.locator().unwrap_err(),
            Redirect::NotAuthenticated
        );
    }

    #[test]
    fn passcode_picks_the_profile_cipher() {
        let mut terminal = Terminal::new(MemoryStorage::new());
        let mut gate = terminal.access_gate();
        for key in "42891".chars() {
            gate.press_digit(key).unwrap();
        }
        assert!(matches!(
            terminal.submit_passcode(&mut gate),
            GateOutcome::Granted { .. }
        ));
        assert_eq!(terminal.landing(), Route::Hub);

        let profile = terminal.store().active_profile(terminal.directory()).unwrap();
        let expected = terminal.catalog().get(profile.cipher_message).unwrap();
        let puzzle = terminal.cipher_puzzle().unwrap();
        assert_eq!(puzzle.ciphertext(), expected.cipher);
    }

    #[test]
    fn stale_saved_passcode_is_signed_out() {
        let storage = MemoryStorage::with_record(
            r#"{"isAuthenticated":true,"activePasscode":"11111","seenIntro":true}"#,
        );
        let terminal = Terminal::new(storage);
        assert!(!terminal.store().is_authenticated());
        assert_eq!(terminal.store().active_passcode(), None);
    }

    #[test]
    fn custom_directory_is_honoured() {
        let directory = ProfileDirectory::from_json(
            r#"{"11111": {"name": "TEST AGENT", "cipher_message": 0}}"#,
        )
        .unwrap();
        let mut terminal = Terminal::with_tables(
            MemoryStorage::new(),
            TerminalConfig::default(),
            directory,
            CipherCatalog::shared().clone(),
        );
        let mut gate = terminal.access_gate();
        for key in "53712".chars() {
            gate.press_digit(key).unwrap();
        }
        assert_eq!(terminal.submit_passcode(&mut gate), GateOutcome::Denied);
    }
}
