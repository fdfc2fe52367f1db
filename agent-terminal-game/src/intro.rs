//! Hub screen: the loading intro and the challenge menu behind it.
use rand::Rng;

use crate::ProgressStorage;
use crate::config::TerminalConfig;
use crate::constants::{AGENT_ID_MAX, AGENT_ID_MIN, INTRO_COMPLETE_PCT};
use crate::profiles::ProfileDirectory;
use crate::progress::ProgressStore;
use crate::routes::{ChallengeId, Navigation, Redirect, Route, guard};
use crate::schedule::Schedule;

const UNKNOWN_AGENT: &str = "UNKNOWN AGENT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IntroEffect {
    Tick,
    Settle,
}

/// Progress bar shown on the first hub visit of a session.
#[derive(Debug, Clone)]
pub struct IntroSequence {
    percent: u8,
    finished: bool,
    step_ms: u64,
    increment: u8,
    settle_ms: u64,
    schedule: Schedule<IntroEffect>,
}

impl IntroSequence {
    #[must_use]
    pub fn new(config: &TerminalConfig) -> Self {
        let mut schedule = Schedule::new();
        schedule.schedule(config.intro_step_ms, IntroEffect::Tick);
        Self {
            percent: 0,
            finished: false,
            step_ms: config.intro_step_ms,
            increment: config.intro_increment_pct,
            settle_ms: config.intro_settle_ms,
            schedule,
        }
    }

    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.percent
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run the ticker forward. Returns `true` on the call that finishes the
    /// intro, which also records it as seen.
    pub fn advance<S: ProgressStorage>(
        &mut self,
        elapsed_ms: u64,
        store: &mut ProgressStore<S>,
    ) -> bool {
        let was_finished = self.finished;
        let mut budget = elapsed_ms;
        while let Some(effects) = self.schedule.step(&mut budget) {
            for effect in effects {
                match effect {
                    IntroEffect::Tick => {
                        self.percent = self
                            .percent
                            .saturating_add(self.increment)
                            .min(INTRO_COMPLETE_PCT);
                        if self.percent >= INTRO_COMPLETE_PCT {
                            self.schedule.schedule(self.settle_ms, IntroEffect::Settle);
                        } else {
                            self.schedule.schedule(self.step_ms, IntroEffect::Tick);
                        }
                    }
                    IntroEffect::Settle => {
                        self.finished = true;
                        store.mark_intro_seen();
                    }
                }
            }
        }
        !was_finished && self.finished
    }

    /// Stop the ticker without marking the intro as seen.
    pub fn teardown(&mut self) {
        self.schedule.cancel_all();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChallengeEntry {
    pub challenge: ChallengeId,
    pub complete: bool,
}

/// The main menu shown after sign-in.
#[derive(Debug, Clone)]
pub struct Hub {
    agent_name: String,
    agent_id: u16,
    intro: Option<IntroSequence>,
}

impl Hub {
    /// Open the hub for the signed-in agent. The intro only plays if it has
    /// not been seen this session.
    ///
    /// # Errors
    ///
    /// Returns [`Redirect::NotAuthenticated`] when nobody is signed in.
    pub fn open<S, R>(
        store: &ProgressStore<S>,
        directory: &ProfileDirectory,
        config: &TerminalConfig,
        rng: &mut R,
    ) -> Result<Self, Redirect>
    where
        S: ProgressStorage,
        R: Rng + ?Sized,
    {
        guard(Route::Hub, store.state())?;
        let agent_name = store
            .active_profile(directory)
            .map_or_else(|| UNKNOWN_AGENT.to_string(), |profile| profile.name.clone());
        let intro = (!store.state().seen_intro).then(|| IntroSequence::new(config));
        Ok(Self {
            agent_name,
            agent_id: rng.gen_range(AGENT_ID_MIN..=AGENT_ID_MAX),
            intro,
        })
    }

    #[must_use]
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Cosmetic id, fresh for every visit.
    #[must_use]
    pub fn agent_id(&self) -> String {
        format!("A-{}", self.agent_id)
    }

    #[must_use]
    pub fn intro(&self) -> Option<&IntroSequence> {
        self.intro.as_ref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.intro.as_ref().is_some_and(|intro| !intro.is_finished())
    }

    pub fn advance<S: ProgressStorage>(&mut self, elapsed_ms: u64, store: &mut ProgressStore<S>) {
        if let Some(intro) = self.intro.as_mut() {
            intro.advance(elapsed_ms, store);
        }
    }

    /// Every challenge is always listed; the flag drives the checkmark.
    #[must_use]
    pub fn challenges<S: ProgressStorage>(&self, store: &ProgressStore<S>) -> [ChallengeEntry; 3] {
        ChallengeId::all().map(|challenge| ChallengeEntry {
            challenge,
            complete: store.is_complete(challenge),
        })
    }

    #[must_use]
    pub fn locator_unlocked<S: ProgressStorage>(&self, store: &ProgressStore<S>) -> bool {
        store.all_challenges_complete()
    }

    /// Navigation for a menu pick. `None` while the intro is still playing or
    /// for a locked locator.
    #[must_use]
    pub fn choose<S: ProgressStorage>(
        &self,
        target: Navigation,
        store: &ProgressStore<S>,
    ) -> Option<Navigation> {
        if self.is_loading() {
            return None;
        }
        match target {
            Navigation::Locator if !self.locator_unlocked(store) => None,
            other => Some(other),
        }
    }

    /// Sign out and head back to the keypad.
    pub fn logout<S: ProgressStorage>(&mut self, store: &mut ProgressStore<S>) -> Navigation {
        if let Some(intro) = self.intro.as_mut() {
            intro.teardown();
        }
        store.logout();
        Navigation::Login
    }

    pub fn teardown(&mut self) {
        if let Some(intro) = self.intro.as_mut() {
            intro.teardown();
        }
    }
}
