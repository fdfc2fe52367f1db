//! Fixed puzzle geometry and rule constants for the Agent Terminal core.
//!
//! Timings and the target coordinate are tunable through `TerminalConfig`;
//! the values here define the rules themselves and only change in code.

// Access gate ---------------------------------------------------------------
pub const PASSCODE_LEN: usize = 5;

// Cipher --------------------------------------------------------------------
pub const CIPHER_PLACEHOLDER: char = '_';
pub const CIPHER_MESSAGE_COUNT: usize = 7;

// Lights --------------------------------------------------------------------
pub const GRID_SIZE: usize = 3;
pub const GRID_CELLS: usize = GRID_SIZE * GRID_SIZE;
pub(crate) const GRID_ALL_ON: u16 = (1 << GRID_CELLS) - 1;

// Codebreaker ---------------------------------------------------------------
pub const CODE_LEN: usize = 4;
pub const CODE_DIGIT_MAX: u8 = 9;
pub const MAX_ATTEMPTS: usize = 10;

// Geolocation ---------------------------------------------------------------
pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const COMPASS_SECTOR_DEG: f64 = 22.5;
pub const TARGET_LATITUDE: f64 = 49.898_076_859_393_28;
pub const TARGET_LONGITUDE: f64 = -97.134_862_385_105_36;
pub const LOCATION_TIMEOUT_MS: u64 = 10_000;

// Hub -----------------------------------------------------------------------
pub const INTRO_COMPLETE_PCT: u8 = 100;
pub const AGENT_ID_MIN: u16 = 1000;
pub const AGENT_ID_MAX: u16 = 9999;

// Persistence ---------------------------------------------------------------
pub const PROGRESS_STORAGE_KEY: &str = "agent-terminal.progress";
