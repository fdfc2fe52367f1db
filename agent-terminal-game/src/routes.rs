//! Screens, navigation signals and access guards.
//!
//! The core never drives a router itself. Widgets hand back [`Navigation`]
//! values and callers check [`guard`] before showing a screen.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::progress::ProgressState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeId {
    Cipher,
    Lights,
    Codebreaker,
}

impl ChallengeId {
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Cipher, Self::Lights, Self::Codebreaker]
    }

    /// One-based number shown on the hub.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Cipher => 1,
            Self::Lights => 2,
            Self::Codebreaker => 3,
        }
    }

    #[must_use]
    pub const fn route(self) -> Route {
        match self {
            Self::Cipher => Route::Cipher,
            Self::Lights => Route::Lights,
            Self::Codebreaker => Route::Codebreaker,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Cipher => "SEMANTIC DECONSTRUCTION",
            Self::Lights => "LIGHTS OUT",
            Self::Codebreaker => "SEQUENTIAL CIPHER ANALYSIS",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Hub,
    Cipher,
    Lights,
    Codebreaker,
    Locator,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Login => "/",
            Self::Hub => "/main",
            Self::Cipher => "/challenge1",
            Self::Lights => "/challenge2",
            Self::Codebreaker => "/challenge3",
            Self::Locator => "/locator",
        }
    }

    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        match path.trim_end_matches('/') {
            "" => Some(Self::Login),
            "/main" => Some(Self::Hub),
            "/challenge1" => Some(Self::Cipher),
            "/challenge2" => Some(Self::Lights),
            "/challenge3" => Some(Self::Codebreaker),
            "/locator" => Some(Self::Locator),
            _ => None,
        }
    }
}

/// Signals for the external router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Navigation {
    Login,
    Hub,
    /// Pop back to whichever screen opened the current one.
    Back,
    Challenge(ChallengeId),
    Locator,
}

/// Why a screen refused to open, and where the caller should go instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Redirect {
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("only {completed}/3 challenges complete")]
    ChallengesIncomplete { completed: u8 },
}

impl Redirect {
    #[must_use]
    pub const fn target(self) -> Route {
        Route::Login
    }
}

/// Decide whether `route` may be shown for the given progress.
///
/// # Errors
///
/// Returns the redirect reason when the route is locked.
pub fn guard(route: Route, progress: &ProgressState) -> Result<(), Redirect> {
    match route {
        Route::Login => Ok(()),
        Route::Hub | Route::Cipher | Route::Lights | Route::Codebreaker => {
            if progress.authenticated {
                Ok(())
            } else {
                Err(Redirect::NotAuthenticated)
            }
        }
        Route::Locator => {
            if !progress.authenticated {
                return Err(Redirect::NotAuthenticated);
            }
            if progress.all_challenges_complete() {
                Ok(())
            } else {
                Err(Redirect::ChallengesIncomplete {
                    completed: progress.completed_count(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticated() -> ProgressState {
        ProgressState {
            authenticated: true,
            active_passcode: Some("53712".to_string()),
            ..ProgressState::default()
        }
    }

    #[test]
    fn login_is_always_reachable() {
        assert_eq!(guard(Route::Login, &ProgressState::default()), Ok(()));
    }

    #[test]
    fn puzzles_require_authentication() {
        let anonymous = ProgressState::default();
        for challenge in ChallengeId::all() {
            assert_eq!(
                guard(challenge.route(), &anonymous),
                Err(Redirect::NotAuthenticated)
            );
            assert_eq!(guard(challenge.route(), &authenticated()), Ok(()));
        }
        assert_eq!(guard(Route::Hub, &anonymous), Err(Redirect::NotAuthenticated));
    }

    #[test]
    fn locator_waits_for_every_challenge() {
        let mut progress = authenticated();
        progress.challenge1_complete = true;
        progress.challenge2_complete = true;
        assert_eq!(
            guard(Route::Locator, &progress),
            Err(Redirect::ChallengesIncomplete { completed: 2 })
        );
        progress.challenge3_complete = true;
        assert_eq!(guard(Route::Locator, &progress), Ok(()));
    }

    #[test]
    fn redirect_propagates_as_a_boxed_error() {
        fn open_locator(
            progress: &ProgressState,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            guard(Route::Locator, progress)?;
            Ok(())
        }

        let mut progress = authenticated();
        progress.challenge1_complete = true;
        let err = open_locator(&progress).unwrap_err();
        assert_eq!(err.to_string(), "only 1/3 challenges complete");
        assert_eq!(
            err.downcast_ref::<Redirect>(),
            Some(&Redirect::ChallengesIncomplete { completed: 1 })
        );
        let err = open_locator(&ProgressState::default()).unwrap_err();
        assert_eq!(err.to_string(), "not authenticated");
    }

    #[test]
    fn paths_roundtrip() {
        for route in [
            Route::Login,
            Route::Hub,
            Route::Cipher,
            Route::Lights,
            Route::Codebreaker,
            Route::Locator,
        ] {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
        assert_eq!(Route::from_path("/nowhere"), None);
    }
}
