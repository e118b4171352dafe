//! Minimal view models for rendering a single dialogue state.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{DialogueOption, DialogueState, Equipment};
use crate::constants::{LOADING_STATE_ID, LOADING_STATE_TEXT};

/// Per-render overrides supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewContext {
    pub context_note: Option<String>,
    pub equipment: Option<Equipment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: String,
    pub text: String,
    pub response_text: Option<String>,
    pub is_critical_path: bool,
}

impl From<&DialogueOption> for OptionView {
    fn from(option: &DialogueOption) -> Self {
        Self {
            id: option.id.clone(),
            text: option.text.clone(),
            response_text: option.response_text.clone(),
            is_critical_path: option.is_critical_path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StateView {
    pub id: String,
    pub character_id: String,
    pub text: String,
    pub context_note: Option<String>,
    pub equipment: Option<Equipment>,
    pub options: Vec<OptionView>,
    pub is_conclusion: bool,
    pub is_critical_path: bool,
    /// Set when memory is enabled and this state was rendered before.
    pub revisited: bool,
}

impl StateView {
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.id == LOADING_STATE_ID
    }
}

#[derive(Debug, Clone)]
pub struct StateViewTransformer {
    character_id: String,
    enable_memory: bool,
    seen: HashSet<String>,
}

#[must_use]
pub fn create_state_view_transformer(
    character_id: &str,
    enable_memory: bool,
) -> StateViewTransformer {
    StateViewTransformer {
        character_id: character_id.to_string(),
        enable_memory,
        seen: HashSet::new(),
    }
}

impl StateViewTransformer {
    /// Project `state` into a view; `None` yields the loading placeholder.
    pub fn view(
        &mut self,
        state: Option<&DialogueState>,
        context: Option<&ViewContext>,
    ) -> StateView {
        let Some(state) = state else {
            return StateView {
                id: LOADING_STATE_ID.to_string(),
                character_id: self.character_id.clone(),
                text: LOADING_STATE_TEXT.to_string(),
                ..StateView::default()
            };
        };

        let revisited = self.enable_memory && !self.seen.insert(state.id.clone());
        let context_note = context
            .and_then(|ctx| ctx.context_note.clone())
            .or_else(|| state.context_note.clone());
        let equipment = context
            .and_then(|ctx| ctx.equipment.clone())
            .or_else(|| state.equipment.clone());

        StateView {
            id: state.id.clone(),
            character_id: self.character_id.clone(),
            text: state.text.clone(),
            context_note,
            equipment,
            options: state.options.iter().map(OptionView::from).collect(),
            is_conclusion: state.is_conclusion,
            is_critical_path: state.is_critical(),
            revisited,
        }
    }

    /// Drop remembered states, e.g. when a new conversation starts.
    pub fn forget(&mut self) {
        self.seen.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::DialogueStateType;
    use crate::dialogue::fixtures::{option, state};

    #[test]
    fn missing_state_yields_loading_placeholder() {
        let mut transform = create_state_view_transformer("kapoor", false);
        let view = transform.view(None, None);
        assert_eq!(view.id, "loading");
        assert_eq!(view.text, "Loading dialogue...");
        assert!(view.is_placeholder());
        assert!(view.options.is_empty());
    }

    #[test]
    fn context_overrides_state_note() {
        let mut s = state(
            "q",
            DialogueStateType::Question,
            None,
            vec![option("a", Some("b"))],
        );
        s.context_note = Some("from state".to_string());
        let mut transform = create_state_view_transformer("kapoor", false);

        let plain = transform.view(Some(&s), None);
        assert_eq!(plain.context_note.as_deref(), Some("from state"));
        assert_eq!(plain.options.len(), 1);
        assert_eq!(plain.character_id, "kapoor");

        let ctx = ViewContext {
            context_note: Some("from caller".to_string()),
            equipment: None,
        };
        let overridden = transform.view(Some(&s), Some(&ctx));
        assert_eq!(overridden.context_note.as_deref(), Some("from caller"));
        assert!(!overridden.revisited);
    }

    #[test]
    fn memory_marks_revisits_until_forgotten() {
        let s = state("intro", DialogueStateType::Intro, None, vec![]);
        let mut transform = create_state_view_transformer("quinn", true);
        assert!(!transform.view(Some(&s), None).revisited);
        assert!(transform.view(Some(&s), None).revisited);
        transform.forget();
        assert!(!transform.view(Some(&s), None).revisited);
    }

    #[test]
    fn critical_moment_type_flags_view() {
        let s = state("crit", DialogueStateType::CriticalMoment, None, vec![]);
        let mut transform = create_state_view_transformer("jesse", false);
        assert!(transform.view(Some(&s), None).is_critical_path);
    }
}
