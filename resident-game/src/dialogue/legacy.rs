//! Legacy flat stage lists and their conversion into dialogue flows.
use serde::{Deserialize, Serialize};

use super::{
    DialogueFlow, DialogueOption, DialogueState, DialogueStateType, Equipment, FlowContext,
    FlowConversionError, KnowledgeGain, collect_states,
};
use crate::constants::BACKSTORY_STAGE_TYPE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyOption {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub response_text: Option<String>,
    #[serde(default)]
    pub next_stage_id: Option<String>,
    #[serde(default)]
    pub insight_gain: Option<i32>,
    #[serde(default)]
    pub relationship_change: Option<i32>,
    #[serde(default)]
    pub knowledge_gain: Option<KnowledgeGain>,
    #[serde(default)]
    pub is_critical_path: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyStage {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub context_note: Option<String>,
    #[serde(default)]
    pub equipment: Option<Equipment>,
    #[serde(default)]
    pub options: Vec<LegacyOption>,
    #[serde(default)]
    pub next_stage_id: Option<String>,
    #[serde(default)]
    pub is_conclusion: bool,
    #[serde(default)]
    pub is_critical_path: bool,
    #[serde(default, rename = "type")]
    pub stage_type: Option<String>,
}

impl LegacyStage {
    #[must_use]
    pub fn is_backstory(&self) -> bool {
        self.stage_type.as_deref() == Some(BACKSTORY_STAGE_TYPE)
    }
}

/// Runtime state type for a legacy stage.
///
/// Precedence, first match wins: backstory, conclusion, critical path,
/// has options, first stage, otherwise transition.
#[must_use]
pub fn infer_state_type(stage: &LegacyStage, is_first: bool) -> DialogueStateType {
    if stage.is_backstory() {
        DialogueStateType::Backstory
    } else if stage.is_conclusion {
        DialogueStateType::Conclusion
    } else if stage.is_critical_path {
        DialogueStateType::CriticalMoment
    } else if !stage.options.is_empty() {
        DialogueStateType::Question
    } else if is_first {
        DialogueStateType::Intro
    } else {
        DialogueStateType::Transition
    }
}

impl From<LegacyOption> for DialogueOption {
    fn from(option: LegacyOption) -> Self {
        Self {
            id: option.id,
            text: option.text,
            response_text: option.response_text,
            next_state_id: option.next_stage_id,
            insight_gain: option.insight_gain,
            relationship_change: option.relationship_change,
            knowledge_gain: option.knowledge_gain,
            is_critical_path: option.is_critical_path,
        }
    }
}

fn stage_to_state(stage: LegacyStage, is_first: bool) -> DialogueState {
    let state_type = infer_state_type(&stage, is_first);
    DialogueState {
        state_type,
        id: stage.id,
        text: stage.text,
        context_note: stage.context_note,
        equipment: stage.equipment,
        options: stage.options.into_iter().map(DialogueOption::from).collect(),
        next_state_id: stage.next_stage_id,
        is_critical_path: stage.is_critical_path,
        is_conclusion: stage.is_conclusion,
    }
}

/// Convert a legacy stage list into a flow; the first stage becomes the
/// initial state.
///
/// # Errors
///
/// Returns an error when `stages` is empty or two stages share an id.
pub fn convert_legacy_to_flow(
    stages: &[LegacyStage],
    character_id: &str,
    dialogue_type: &str,
    node_id: Option<&str>,
) -> Result<DialogueFlow, FlowConversionError> {
    let flow_id = format!("{character_id}-{dialogue_type}");
    let initial_state_id = stages
        .first()
        .map(|stage| stage.id.clone())
        .ok_or_else(|| FlowConversionError::Empty(flow_id.clone()))?;

    let states = stages
        .iter()
        .cloned()
        .enumerate()
        .map(|(idx, stage)| stage_to_state(stage, idx == 0));
    let states = collect_states(&flow_id, states)?;
    log::debug!("converted {} legacy stages into flow {flow_id}", states.len());

    Ok(DialogueFlow {
        id: flow_id,
        states,
        initial_state_id,
        context: FlowContext {
            character_id: character_id.to_string(),
            dialogue_type: dialogue_type.to_string(),
            node_id: node_id.map(ToString::to_string),
        },
    })
}
