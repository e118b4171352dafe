//! Rogue Resident Game Core
//!
//! Platform-agnostic logic for the Rogue Resident roguelike: seeded random
//! numbers and seed names, encounter map generation, dialogue flows, and the
//! persisted run history. Rendering and input live elsewhere.

pub mod constants;
pub mod dialogue;
pub mod engine;
pub mod history;
pub mod map;
pub mod seed;

// Re-export commonly used types
pub use dialogue::{
    DialogueFlow, DialogueLoadError, DialogueOption, DialogueRegistry, DialogueState,
    DialogueStateType, LoadStatus, LoadingState, StateView, convert_legacy_to_flow,
    create_state_view_transformer, validate_flow,
};
pub use engine::{DayPhase, EngineError, ResidentEngine, Run, RunClock};
pub use history::{
    HistoryError, MemoryStorage, RunHistory, RunRecord, RunStorage, load_history, save_history,
};
pub use map::{
    BossLinkPolicy, GameMap, GridPos, MapError, MapLayoutConfig, MapNode, NodeChallenge,
    NodeType, generate_map, generate_seeded_map,
};
pub use seed::{
    SeedPreset, SeededRandom, create_seed_url, create_seeded_random, daily_seed,
    generate_seed_name, random_seed, seed_from_url,
};
