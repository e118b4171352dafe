//! Centralized tuning constants for Rogue Resident core logic.
//!
//! These values define the deterministic math behind seeds and map layout.
//! Keeping them together ensures that shared seeds only change meaning via
//! code changes reviewed in version control.

// Debug switches -----------------------------------------------------------
pub(crate) const DEBUG_REGISTRY_ENV_VAR: &str = "RESIDENT_DEBUG_REGISTRY";

// Linear congruential generator --------------------------------------------
pub(crate) const LCG_MULTIPLIER: u64 = 9301;
pub(crate) const LCG_INCREMENT: u64 = 49297;
pub(crate) const LCG_MODULUS: u64 = 233_280;

// Seeds --------------------------------------------------------------------
pub(crate) const RANDOM_SEED_CEILING: i64 = 1_000_000;
pub(crate) const SEED_QUERY_PARAM: &str = "seed";

/// Preset seed for a regular run.
pub const STANDARD_SEED: i64 = 12345;
/// Preset seed for the onboarding run.
pub const TUTORIAL_SEED: i64 = 23456;
/// Preset seed for the hard-mode run.
pub const CHALLENGE_SEED: i64 = 34567;

pub(crate) const SEED_ELEMENTS: [&str; 12] = [
    "Photon", "Electron", "Proton", "Neutron", "Isotope", "Gamma", "Beta", "Alpha", "Positron",
    "Quantum", "Ion", "Nucleus",
];

pub(crate) const SEED_PRINCIPLES: [&str; 12] = [
    "Compton",
    "Bragg",
    "Planck",
    "Curie",
    "Roentgen",
    "Rutherford",
    "Becquerel",
    "Fermi",
    "Bohr",
    "Geiger",
    "Dirac",
    "Attenuation",
];

// Run history --------------------------------------------------------------
/// Maximum number of runs kept in the persisted history blob.
pub const HISTORY_CAP: usize = 10;
/// Storage key the history blob is written under.
pub const SEED_HISTORY_KEY: &str = "rogue-resident-seed-history";

// Map layout ---------------------------------------------------------------
pub(crate) const MAP_DEFAULT_ROWS: u8 = 2;
pub(crate) const MAP_DEFAULT_ROW_WIDTH: u8 = 4;
pub(crate) const MAP_DEFAULT_ENTRANCE_FANOUT: u8 = 2;
pub(crate) const MAP_DEFAULT_WINDOW_RADIUS: u8 = 1;
pub(crate) const MAP_DEFAULT_STORAGE_COLUMN: u8 = 0;
pub(crate) const MAP_CENTER_BOSS_COLUMNS: [u8; 2] = [1, 2];
pub(crate) const MAP_RANDOM_ID_LEN: usize = 16;

// Dialogue -----------------------------------------------------------------
pub(crate) const LOADING_STATE_ID: &str = "loading";
pub(crate) const LOADING_STATE_TEXT: &str = "Loading dialogue...";
pub(crate) const BACKSTORY_STAGE_TYPE: &str = "backstory";
