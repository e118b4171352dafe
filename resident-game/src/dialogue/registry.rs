//! Dialogue content registry and the loaders UI layers call into.
//!
//! The registry is an explicitly constructed value handed to whoever needs
//! dialogue content. Every loader reports misses as data (`Result`/`Option`)
//! so callers can render a fallback without unwinding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::authored::{AuthoredDialogue, AuthoredLibrary, convert_authored_to_flow};
use super::legacy::{LegacyStage, convert_legacy_to_flow};
use super::{DialogueFlow, FlowConversionError};
use crate::constants::DEBUG_REGISTRY_ENV_VAR;

const DEFAULT_DIALOGUE_DATA: &str = include_str!("../../data/dialogues.json");
const DEFAULT_AUTHORED_DATA: &str = include_str!("../../data/authored.json");

/// Release builds never consult the environment.
fn debug_env_enabled() -> bool {
    cfg!(debug_assertions)
        && env_value_enables_debug(std::env::var(DEBUG_REGISTRY_ENV_VAR).ok().as_deref())
}

fn env_value_enables_debug(value: Option<&str>) -> bool {
    value.is_some_and(|val| val != "0")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DialogueMetadata {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub last_updated: String,
    #[serde(default)]
    pub critical_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntry {
    pub id: String,
    pub character: String,
    #[serde(rename = "type")]
    pub dialogue_type: String,
    pub stages: Vec<LegacyStage>,
    #[serde(default)]
    pub metadata: DialogueMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct DialogueCatalog {
    #[serde(default)]
    dialogues: Vec<DialogueEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DialogueLoadError {
    #[error("no dialogue found for character `{character}` and type `{dialogue_type}`")]
    NotFound {
        character: String,
        dialogue_type: String,
    },
    #[error("dialogue for `{character}`/`{dialogue_type}` could not be converted: {source}")]
    Conversion {
        character: String,
        dialogue_type: String,
        #[source]
        source: FlowConversionError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    Loaded,
    Error,
}

impl LoadingState {
    #[must_use]
    pub fn of<T>(result: &Result<T, DialogueLoadError>) -> Self {
        match result {
            Ok(_) => Self::Loaded,
            Err(_) => Self::Error,
        }
    }
}

/// `{data, loadingState, error}` view of a loader result for UI consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadStatus<T> {
    pub data: Option<T>,
    pub loading_state: LoadingState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, DialogueLoadError>> for LoadStatus<T> {
    fn from(result: Result<T, DialogueLoadError>) -> Self {
        let loading_state = LoadingState::of(&result);
        match result {
            Ok(data) => Self {
                data: Some(data),
                loading_state,
                error: None,
            },
            Err(err) => Self {
                data: None,
                loading_state,
                error: Some(err.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DialogueRegistry {
    entries: BTreeMap<String, DialogueEntry>,
    authored: Vec<AuthoredDialogue>,
    debug: bool,
}

impl DialogueRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated from the bundled content assets.
    #[must_use]
    pub fn builtin() -> Self {
        match Self::from_json(DEFAULT_DIALOGUE_DATA, DEFAULT_AUTHORED_DATA) {
            Ok(registry) => registry,
            Err(err) => {
                log::warn!("bundled dialogue content failed to parse: {err}");
                Self::new()
            }
        }
    }

    /// Build a registry from a legacy catalog (`{"dialogues": [...]}`) and an
    /// authored library.
    ///
    /// # Errors
    ///
    /// Returns an error if either document cannot be parsed.
    pub fn from_json(catalog_json: &str, authored_json: &str) -> Result<Self, serde_json::Error> {
        let catalog: DialogueCatalog = serde_json::from_str(catalog_json)?;
        let library = AuthoredLibrary::from_json(authored_json)?;
        let mut registry = Self::new();
        for entry in catalog.dialogues {
            registry.register(entry);
        }
        for authored in library.dialogues {
            registry.register_authored(authored);
        }
        Ok(registry)
    }

    #[must_use]
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Insert or replace a legacy dialogue entry by id.
    pub fn register(&mut self, entry: DialogueEntry) {
        if self.entries.contains_key(&entry.id) {
            log::warn!("replacing dialogue entry {}", entry.id);
        }
        self.entries.insert(entry.id.clone(), entry);
    }

    /// Insert or replace an authored dialogue for its (character, type) pair.
    pub fn register_authored(&mut self, authored: AuthoredDialogue) {
        self.authored
            .retain(|existing| !existing.matches(&authored.character, &authored.dialogue_type));
        self.authored.push(authored);
    }

    /// Number of dialogues held, legacy and authored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len() + self.authored.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.authored.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &DialogueEntry> {
        self.entries.values()
    }

    pub fn authored(&self) -> impl Iterator<Item = &AuthoredDialogue> {
        self.authored.iter()
    }

    /// Full registry contents for debug tooling; `None` unless debug mode is on.
    #[must_use]
    pub fn debug_entries(&self) -> Option<&BTreeMap<String, DialogueEntry>> {
        (self.debug || debug_env_enabled()).then_some(&self.entries)
    }

    fn find_entry(&self, character_id: &str, dialogue_type: &str) -> Option<&DialogueEntry> {
        self.entries
            .values()
            .find(|entry| entry.character == character_id && entry.dialogue_type == dialogue_type)
    }

    fn find_authored(&self, character_id: &str, dialogue_type: &str) -> Option<&AuthoredDialogue> {
        self.authored
            .iter()
            .find(|authored| authored.matches(character_id, dialogue_type))
    }

    /// Legacy stage list for a (character, type) pair.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueLoadError::NotFound`] when nothing is registered.
    pub fn load_dialogue_content(
        &self,
        character_id: &str,
        dialogue_type: &str,
    ) -> Result<&[LegacyStage], DialogueLoadError> {
        if let Some(entry) = self.find_entry(character_id, dialogue_type) {
            return Ok(&entry.stages);
        }
        log::warn!("no dialogue content for {character_id}/{dialogue_type}");
        Err(DialogueLoadError::NotFound {
            character: character_id.to_string(),
            dialogue_type: dialogue_type.to_string(),
        })
    }

    /// Runtime flow for a (character, type) pair, preferring authored content
    /// and falling back to the legacy stage list.
    ///
    /// States listed in the legacy entry's critical-path metadata are flagged
    /// critical in the resulting flow.
    ///
    /// # Errors
    ///
    /// Returns an error when no source exists or conversion fails.
    pub fn load_dialogue_as_flow(
        &self,
        character_id: &str,
        dialogue_type: &str,
        node_id: Option<&str>,
    ) -> Result<DialogueFlow, DialogueLoadError> {
        let conversion_error = |source| DialogueLoadError::Conversion {
            character: character_id.to_string(),
            dialogue_type: dialogue_type.to_string(),
            source,
        };

        if let Some(authored) = self.find_authored(character_id, dialogue_type) {
            return convert_authored_to_flow(authored, node_id).map_err(conversion_error);
        }

        let stages = self.load_dialogue_content(character_id, dialogue_type)?;
        let mut flow = convert_legacy_to_flow(stages, character_id, dialogue_type, node_id)
            .map_err(conversion_error)?;
        if let Some(entry) = self.find_entry(character_id, dialogue_type) {
            for stage_id in &entry.metadata.critical_paths {
                if let Some(state) = flow.states.get_mut(stage_id) {
                    state.is_critical_path = true;
                }
            }
        }
        Ok(flow)
    }

    #[must_use]
    pub fn load_dialogue_by_id(&self, dialogue_id: &str) -> Option<&DialogueEntry> {
        self.entries.get(dialogue_id)
    }

    /// Stages named in a dialogue's critical-path metadata, in metadata order.
    #[must_use]
    pub fn load_critical_path_stages(&self, dialogue_id: &str) -> Vec<&LegacyStage> {
        let Some(entry) = self.entries.get(dialogue_id) else {
            return Vec::new();
        };
        entry
            .metadata
            .critical_paths
            .iter()
            .filter_map(|stage_id| entry.stages.iter().find(|stage| &stage.id == stage_id))
            .collect()
    }

    #[must_use]
    pub fn is_stage_on_critical_path(&self, dialogue_id: &str, stage_id: &str) -> bool {
        self.entries.get(dialogue_id).is_some_and(|entry| {
            entry
                .metadata
                .critical_paths
                .iter()
                .any(|id| id == stage_id)
        })
    }

    #[must_use]
    pub fn get_dialogue_stage(&self, dialogue_id: &str, stage_id: &str) -> Option<&LegacyStage> {
        self.entries
            .get(dialogue_id)?
            .stages
            .iter()
            .find(|stage| stage.id == stage_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::DialogueStateType;

    fn stage(id: &str) -> LegacyStage {
        LegacyStage {
            id: id.to_string(),
            text: format!("stage {id}"),
            context_note: None,
            equipment: None,
            options: Vec::new(),
            next_stage_id: None,
            is_conclusion: false,
            is_critical_path: false,
            stage_type: None,
        }
    }

    fn entry(
        id: &str,
        character: &str,
        dialogue_type: &str,
        stages: Vec<LegacyStage>,
    ) -> DialogueEntry {
        DialogueEntry {
            id: id.to_string(),
            character: character.to_string(),
            dialogue_type: dialogue_type.to_string(),
            stages,
            metadata: DialogueMetadata {
                title: id.to_string(),
                critical_paths: vec!["b".to_string()],
                ..DialogueMetadata::default()
            },
        }
    }

    fn registry() -> DialogueRegistry {
        let mut registry = DialogueRegistry::new();
        registry.register(entry(
            "kapoor-calibration",
            "kapoor",
            "calibration",
            vec![stage("a"), stage("b")],
        ));
        registry
    }

    #[test]
    fn missing_content_reports_error_shape() {
        let registry = registry();
        let result = registry.load_dialogue_content("kapoor", "nonexistent-type");
        assert_eq!(LoadingState::of(&result), LoadingState::Error);
        let status: LoadStatus<Vec<LegacyStage>> = result.map(<[LegacyStage]>::to_vec).into();
        assert!(status.data.is_none());
        assert_eq!(status.loading_state, LoadingState::Error);
        assert!(!status.error.unwrap().is_empty());
    }

    #[test]
    fn found_content_reports_loaded() {
        let registry = registry();
        let status: LoadStatus<usize> = registry
            .load_dialogue_content("kapoor", "calibration")
            .map(<[LegacyStage]>::len)
            .into();
        assert_eq!(status.data, Some(2));
        assert_eq!(status.loading_state, LoadingState::Loaded);
        assert!(status.error.is_none());
    }

    #[test]
    fn legacy_flow_marks_metadata_critical_paths() {
        let flow = registry()
            .load_dialogue_as_flow("kapoor", "calibration", Some("node-1"))
            .unwrap();
        assert!(flow.states["b"].is_critical_path);
        assert!(!flow.states["a"].is_critical_path);
        assert_eq!(flow.states["b"].state_type, DialogueStateType::Transition);
    }

    #[test]
    fn authored_content_wins_over_legacy() {
        let mut registry = registry();
        registry.register_authored(AuthoredDialogue {
            id: "kapoor-authored".to_string(),
            character: "kapoor".to_string(),
            dialogue_type: "calibration".to_string(),
            initial_state_id: None,
            states: vec![crate::dialogue::fixtures::state(
                "only",
                DialogueStateType::Intro,
                None,
                vec![],
            )],
        });
        let flow = registry
            .load_dialogue_as_flow("kapoor", "calibration", None)
            .unwrap();
        assert_eq!(flow.id, "kapoor-authored");
    }

    #[test]
    fn flow_errors_are_returned_not_thrown() {
        let mut registry = registry();
        registry.register(entry("empty", "jesse", "equipment", Vec::new()));
        let err = registry
            .load_dialogue_as_flow("jesse", "equipment", None)
            .unwrap_err();
        assert!(matches!(err, DialogueLoadError::Conversion { .. }));
        assert!(matches!(
            registry.load_dialogue_as_flow("nobody", "nothing", None),
            Err(DialogueLoadError::NotFound { .. })
        ));
    }

    #[test]
    fn id_lookups_return_none_or_empty_on_miss() {
        let registry = registry();
        assert!(registry.load_dialogue_by_id("kapoor-calibration").is_some());
        assert!(registry.load_dialogue_by_id("missing").is_none());
        assert_eq!(registry.load_critical_path_stages("kapoor-calibration").len(), 1);
        assert!(registry.load_critical_path_stages("missing").is_empty());
        assert!(registry.is_stage_on_critical_path("kapoor-calibration", "b"));
        assert!(!registry.is_stage_on_critical_path("kapoor-calibration", "a"));
        assert!(!registry.is_stage_on_critical_path("missing", "b"));
        assert_eq!(
            registry.get_dialogue_stage("kapoor-calibration", "a").unwrap().id,
            "a"
        );
        assert!(registry.get_dialogue_stage("kapoor-calibration", "z").is_none());
        assert!(registry.get_dialogue_stage("missing", "a").is_none());
    }

    #[test]
    fn debug_entries_require_debug_mode() {
        let registry = registry().with_debug(true);
        assert_eq!(registry.debug_entries().unwrap().len(), 1);
        assert!(registry.with_debug(false).debug_entries().is_none() || debug_env_enabled());
    }

    #[test]
    fn debug_entries_hidden_by_default() {
        if std::env::var_os(DEBUG_REGISTRY_ENV_VAR).is_none() {
            assert!(DialogueRegistry::new().debug_entries().is_none());
            assert!(registry().debug_entries().is_none());
        }
    }

    #[test]
    fn debug_env_value_zero_stays_off() {
        assert!(!env_value_enables_debug(None));
        assert!(!env_value_enables_debug(Some("0")));
        assert!(env_value_enables_debug(Some("1")));
        assert!(env_value_enables_debug(Some("")));
    }

    #[test]
    fn len_counts_authored_dialogues() {
        let mut registry = DialogueRegistry::new();
        registry.register_authored(
            DialogueRegistry::builtin()
                .authored()
                .next()
                .cloned()
                .unwrap(),
        );
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
        assert_eq!(DialogueRegistry::builtin().len(), 5);
    }

    #[test]
    fn builtin_registry_parses_bundled_assets() {
        let registry = DialogueRegistry::builtin();
        assert!(!registry.is_empty());
        assert!(registry.load_dialogue_by_id("kapoor-calibration").is_some());
    }
}
