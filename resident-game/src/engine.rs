//! Run lifecycle: seed selection, map generation, day/night clock, history.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialogue::{DialogueFlow, DialogueLoadError, DialogueRegistry};
use crate::history::{
    HistoryError, RunHistory, RunRecord, RunStorage, load_history, save_history,
};
use crate::map::{
    GameMap, MapConfigError, MapError, MapLayoutConfig, SeededSource, generate_map_with,
};
use crate::seed::{SeedPreset, daily_seed, generate_seed_name, random_seed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    #[default]
    Day,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunClock {
    pub day: u32,
    pub phase: DayPhase,
}

impl Default for RunClock {
    fn default() -> Self {
        Self {
            day: 1,
            phase: DayPhase::Day,
        }
    }
}

impl RunClock {
    /// Day moves to night; night moves to the next day.
    pub fn advance(&mut self) -> DayPhase {
        match self.phase {
            DayPhase::Day => self.phase = DayPhase::Night,
            DayPhase::Night => {
                self.day = self.day.saturating_add(1);
                self.phase = DayPhase::Day;
            }
        }
        self.phase
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub seed: i64,
    pub seed_name: String,
    pub started_at: DateTime<Utc>,
    pub map: GameMap,
    pub clock: RunClock,
}

impl Run {
    /// Complete a node on this run's map, returning the ids it unlocked.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown or still locked.
    pub fn complete_node(&mut self, node_id: &str) -> Result<Vec<String>, MapError> {
        self.map.complete_node(node_id)
    }
}

#[derive(Debug, Error)]
pub enum EngineError<E>
where
    E: std::error::Error + 'static,
{
    #[error("invalid map layout: {0}")]
    Layout(#[from] MapConfigError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("node `{0}` has no dialogue challenge")]
    NoChallenge(String),
    #[error(transparent)]
    Dialogue(#[from] DialogueLoadError),
    #[error("run history unavailable: {0}")]
    History(#[from] HistoryError<E>),
}

/// Owns the content, layout and storage a run needs.
pub struct ResidentEngine<S>
where
    S: RunStorage,
{
    registry: DialogueRegistry,
    layout: MapLayoutConfig,
    storage: S,
}

impl<S> ResidentEngine<S>
where
    S: RunStorage,
{
    /// # Errors
    ///
    /// Returns an error if `layout` is not a valid map layout.
    pub fn new(
        registry: DialogueRegistry,
        layout: MapLayoutConfig,
        storage: S,
    ) -> Result<Self, MapConfigError> {
        layout.validate()?;
        Ok(Self {
            registry,
            layout,
            storage,
        })
    }

    /// Builtin content, default layout.
    pub fn with_storage(storage: S) -> Self {
        Self {
            registry: DialogueRegistry::builtin(),
            layout: MapLayoutConfig::default(),
            storage,
        }
    }

    #[must_use]
    pub const fn registry(&self) -> &DialogueRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn layout(&self) -> &MapLayoutConfig {
        &self.layout
    }

    #[must_use]
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    /// Start a run for `seed` and record it in the history.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout is invalid or the history cannot be saved.
    pub fn start_run(&self, seed: i64) -> Result<Run, EngineError<S::Error>> {
        let map = generate_map_with(&self.layout, &mut SeededSource::new(seed))?;
        let run = Run {
            seed,
            seed_name: generate_seed_name(seed),
            started_at: Utc::now(),
            map,
            clock: RunClock::default(),
        };

        let mut history = load_history(&self.storage)?;
        history.record(RunRecord::started(
            run.seed,
            run.seed_name.clone(),
            run.started_at,
        ));
        save_history(&self.storage, &history)?;
        log::info!("started run {} ({})", run.seed_name, run.seed);
        Ok(run)
    }

    /// # Errors
    ///
    /// See [`Self::start_run`].
    pub fn start_daily_run(&self) -> Result<Run, EngineError<S::Error>> {
        self.start_run(daily_seed())
    }

    /// # Errors
    ///
    /// See [`Self::start_run`].
    pub fn start_random_run(&self) -> Result<Run, EngineError<S::Error>> {
        self.start_run(random_seed())
    }

    /// # Errors
    ///
    /// See [`Self::start_run`].
    pub fn start_preset_run(&self, preset: SeedPreset) -> Result<Run, EngineError<S::Error>> {
        self.start_run(preset.seed())
    }

    /// Replay a seed from history; the replay is recorded as a new entry.
    ///
    /// # Errors
    ///
    /// See [`Self::start_run`].
    pub fn replay_seed(&self, seed: i64) -> Result<Run, EngineError<S::Error>> {
        log::debug!("replaying seed {seed}");
        self.start_run(seed)
    }

    /// Mark `run` completed in the history. Returns `false` if the run was
    /// already rotated out of the history.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be read or written.
    pub fn finish_run(&self, run: &Run, score: Option<i64>) -> Result<bool, EngineError<S::Error>> {
        let mut history = load_history(&self.storage)?;
        let marked =
            history.mark_completed(run.seed, run.started_at, score, Some(run.clock.day));
        if marked {
            save_history(&self.storage, &history)?;
        } else {
            log::warn!("run {} not found in history", run.seed);
        }
        Ok(marked)
    }

    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn history(&self) -> Result<RunHistory, EngineError<S::Error>> {
        Ok(load_history(&self.storage)?)
    }

    /// Dialogue flow for the challenge on `node_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is unknown, has no challenge, or its
    /// dialogue cannot be loaded.
    pub fn dialogue_for_node(
        &self,
        run: &Run,
        node_id: &str,
    ) -> Result<DialogueFlow, EngineError<S::Error>> {
        let node = run
            .map
            .node(node_id)
            .ok_or_else(|| MapError::UnknownNode(node_id.to_string()))?;
        let challenge = node
            .challenge
            .as_ref()
            .ok_or_else(|| EngineError::NoChallenge(node_id.to_string()))?;
        Ok(self.registry.load_dialogue_as_flow(
            &challenge.character_id,
            &challenge.dialogue_type,
            Some(node_id),
        )?)
    }
}
