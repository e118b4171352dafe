//! Dialogue state machine: runtime flow graph, content loaders, and view models.
//!
//! A [`DialogueFlow`] is a static graph of named states. Traversal (current
//! pointer, history, option selection side effects) belongs to the caller;
//! this module only produces uniformly shaped graphs from authored or legacy
//! content and answers lookups against them.

pub mod authored;
pub mod legacy;
pub mod registry;
pub mod validate;
pub mod view;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use authored::{AuthoredDialogue, AuthoredLibrary, convert_authored_to_flow};
pub use legacy::{LegacyOption, LegacyStage, convert_legacy_to_flow, infer_state_type};
pub use registry::{
    DialogueEntry, DialogueLoadError, DialogueMetadata, DialogueRegistry, LoadStatus,
    LoadingState,
};
pub use validate::{CriticalPathProgress, FlowIssue, critical_path_progress, validate_flow};
pub use view::{
    OptionView, StateView, StateViewTransformer, ViewContext, create_state_view_transformer,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogueStateType {
    Intro,
    Question,
    Response,
    Backstory,
    Conclusion,
    CriticalMoment,
    Transition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeGain {
    pub domain: String,
    pub amount: i32,
}

/// Equipment shown alongside a dialogue line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub item_id: String,
    pub alt: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub next_state_id: Option<String>,
    #[serde(default)]
    pub insight_gain: Option<i32>,
    #[serde(default)]
    pub relationship_change: Option<i32>,
    #[serde(default)]
    pub knowledge_gain: Option<KnowledgeGain>,
    #[serde(default)]
    pub is_critical_path: bool,
}

impl DialogueOption {
    #[must_use]
    pub const fn has_effects(&self) -> bool {
        self.insight_gain.is_some()
            || self.relationship_change.is_some()
            || self.knowledge_gain.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueState {
    pub id: String,
    #[serde(rename = "type")]
    pub state_type: DialogueStateType,
    pub text: String,
    #[serde(default)]
    pub context_note: Option<String>,
    #[serde(default)]
    pub equipment: Option<Equipment>,
    #[serde(default)]
    pub options: Vec<DialogueOption>,
    #[serde(default)]
    pub next_state_id: Option<String>,
    #[serde(default)]
    pub is_critical_path: bool,
    #[serde(default)]
    pub is_conclusion: bool,
}

impl DialogueState {
    /// Ids this state can move to, linear link first, then options in order.
    pub fn successors(&self) -> impl Iterator<Item = &str> {
        self.next_state_id
            .as_deref()
            .into_iter()
            .chain(self.options.iter().filter_map(|o| o.next_state_id.as_deref()))
    }

    #[must_use]
    pub fn is_critical(&self) -> bool {
        self.is_critical_path || self.state_type == DialogueStateType::CriticalMoment
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowContext {
    pub character_id: String,
    pub dialogue_type: String,
    #[serde(default)]
    pub node_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueFlow {
    pub id: String,
    pub states: BTreeMap<String, DialogueState>,
    pub initial_state_id: String,
    pub context: FlowContext,
}

impl DialogueFlow {
    #[must_use]
    pub fn state(&self, id: &str) -> Option<&DialogueState> {
        self.states.get(id)
    }

    #[must_use]
    pub fn initial_state(&self) -> Option<&DialogueState> {
        self.state(&self.initial_state_id)
    }

    /// State reached by leaving `state_id`, via `option_id` when given.
    ///
    /// `None` means the flow ends there (or an id did not resolve).
    #[must_use]
    pub fn follow(&self, state_id: &str, option_id: Option<&str>) -> Option<&DialogueState> {
        let state = self.state(state_id)?;
        let target = match option_id {
            Some(option_id) => state
                .options
                .iter()
                .find(|o| o.id == option_id)?
                .next_state_id
                .as_deref()
                .or(state.next_state_id.as_deref())?,
            None => state.next_state_id.as_deref()?,
        };
        self.state(target)
    }
}

/// Errors raised while turning authored or legacy content into a flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowConversionError {
    #[error("dialogue `{0}` has no states")]
    Empty(String),
    #[error("state id `{0}` appears more than once")]
    DuplicateStateId(String),
    #[error("initial state `{0}` does not exist")]
    MissingInitialState(String),
}

pub(crate) fn collect_states(
    flow_id: &str,
    states: impl IntoIterator<Item = DialogueState>,
) -> Result<BTreeMap<String, DialogueState>, FlowConversionError> {
    let mut map = BTreeMap::new();
    for state in states {
        if map.contains_key(&state.id) {
            return Err(FlowConversionError::DuplicateStateId(state.id));
        }
        map.insert(state.id.clone(), state);
    }
    if map.is_empty() {
        return Err(FlowConversionError::Empty(flow_id.to_string()));
    }
    Ok(map)
}
