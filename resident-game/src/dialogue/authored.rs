//! Structured authoring format: states carry explicit types and `nextStateId`
//! links, so conversion only reshapes the list into a keyed flow.
use serde::{Deserialize, Serialize};

use super::{DialogueFlow, DialogueState, FlowContext, FlowConversionError, collect_states};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthoredDialogue {
    pub id: String,
    pub character: String,
    pub dialogue_type: String,
    /// Defaults to the first listed state.
    #[serde(default)]
    pub initial_state_id: Option<String>,
    pub states: Vec<DialogueState>,
}

impl AuthoredDialogue {
    #[must_use]
    pub fn matches(&self, character_id: &str, dialogue_type: &str) -> bool {
        self.character == character_id && self.dialogue_type == dialogue_type
    }
}

/// Container for authored dialogue assets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthoredLibrary {
    #[serde(default)]
    pub dialogues: Vec<AuthoredDialogue>,
}

impl AuthoredLibrary {
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into authored dialogues.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// # Errors
///
/// Returns an error when the dialogue has no states, repeats a state id, or
/// names an initial state that does not exist.
pub fn convert_authored_to_flow(
    authored: &AuthoredDialogue,
    node_id: Option<&str>,
) -> Result<DialogueFlow, FlowConversionError> {
    let states = collect_states(&authored.id, authored.states.iter().cloned())?;
    let initial_state_id = match &authored.initial_state_id {
        Some(id) => id.clone(),
        None => authored.states[0].id.clone(),
    };
    if !states.contains_key(&initial_state_id) {
        return Err(FlowConversionError::MissingInitialState(initial_state_id));
    }
    log::debug!(
        "converted authored dialogue {} ({} states)",
        authored.id,
        states.len()
    );
    Ok(DialogueFlow {
        id: authored.id.clone(),
        states,
        initial_state_id,
        context: FlowContext {
            character_id: authored.character.clone(),
            dialogue_type: authored.dialogue_type.clone(),
            node_id: node_id.map(ToString::to_string),
        },
    })
}
