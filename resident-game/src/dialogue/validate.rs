//! Reference checks and critical-path progress over a finished flow.
//!
//! Loaders never call these; content tooling and tests do.
use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::DialogueFlow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlowIssue {
    MissingInitialState {
        state: String,
    },
    KeyMismatch {
        key: String,
        state: String,
    },
    DanglingNext {
        state: String,
        target: String,
    },
    DanglingOption {
        state: String,
        option: String,
        target: String,
    },
    Unreachable {
        state: String,
    },
}

impl std::fmt::Display for FlowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInitialState { state } => write!(f, "initial state `{state}` missing"),
            Self::KeyMismatch { key, state } => {
                write!(f, "state `{state}` stored under key `{key}`")
            }
            Self::DanglingNext { state, target } => {
                write!(f, "state `{state}` links to missing `{target}`")
            }
            Self::DanglingOption {
                state,
                option,
                target,
            } => write!(f, "option `{option}` of `{state}` links to missing `{target}`"),
            Self::Unreachable { state } => write!(f, "state `{state}` is unreachable"),
        }
    }
}

/// Every broken reference and unreachable state in `flow`, in key order.
#[must_use]
pub fn validate_flow(flow: &DialogueFlow) -> Vec<FlowIssue> {
    let mut issues = Vec::new();
    if !flow.states.contains_key(&flow.initial_state_id) {
        issues.push(FlowIssue::MissingInitialState {
            state: flow.initial_state_id.clone(),
        });
    }

    for (key, state) in &flow.states {
        if key != &state.id {
            issues.push(FlowIssue::KeyMismatch {
                key: key.clone(),
                state: state.id.clone(),
            });
        }
        if let Some(target) = &state.next_state_id
            && !flow.states.contains_key(target)
        {
            issues.push(FlowIssue::DanglingNext {
                state: key.clone(),
                target: target.clone(),
            });
        }
        for option in &state.options {
            if let Some(target) = &option.next_state_id
                && !flow.states.contains_key(target)
            {
                issues.push(FlowIssue::DanglingOption {
                    state: key.clone(),
                    option: option.id.clone(),
                    target: target.clone(),
                });
            }
        }
    }

    let reachable = reachable_states(flow);
    for key in flow.states.keys() {
        if !reachable.contains(key.as_str()) {
            issues.push(FlowIssue::Unreachable { state: key.clone() });
        }
    }

    if !issues.is_empty() {
        log::warn!("flow {} has {} issue(s)", flow.id, issues.len());
    }
    issues
}

fn reachable_states(flow: &DialogueFlow) -> HashSet<&str> {
    let mut seen = HashSet::new();
    let Some((initial, _)) = flow.states.get_key_value(&flow.initial_state_id) else {
        return seen;
    };
    let mut queue = VecDeque::from([initial.as_str()]);
    seen.insert(initial.as_str());
    while let Some(current) = queue.pop_front() {
        let Some(state) = flow.states.get(current) else {
            continue;
        };
        for next in state.successors() {
            if let Some((key, _)) = flow.states.get_key_value(next)
                && seen.insert(key.as_str())
            {
                queue.push_back(key.as_str());
            }
        }
    }
    seen
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalPathProgress {
    pub visited: usize,
    pub total: usize,
}

impl CriticalPathProgress {
    /// Completion percentage; a flow with no critical states counts as done.
    #[must_use]
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            return 100.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.visited as f32 / self.total as f32;
        ratio * 100.0
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.visited >= self.total
    }
}

/// How much of the critical path of `flow` was covered by `visited`.
///
/// Both critical states and critical options count. `visited` holds state
/// ids and, optionally, chosen option ids; a critical option also counts as
/// taken when its own state and its target state were both visited.
#[must_use]
pub fn critical_path_progress<S: AsRef<str>>(
    flow: &DialogueFlow,
    visited: &[S],
) -> CriticalPathProgress {
    let visited: HashSet<&str> = visited.iter().map(|id| id.as_ref()).collect();
    let mut progress = CriticalPathProgress {
        visited: 0,
        total: 0,
    };
    for state in flow.states.values() {
        let state_seen = visited.contains(state.id.as_str());
        if state.is_critical() {
            progress.total += 1;
            progress.visited += usize::from(state_seen);
        }
        for option in state.options.iter().filter(|o| o.is_critical_path) {
            let taken = visited.contains(option.id.as_str())
                || (state_seen
                    && option
                        .next_state_id
                        .as_deref()
                        .is_some_and(|next| visited.contains(next)));
            progress.total += 1;
            progress.visited += usize::from(taken);
        }
    }
    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::DialogueStateType;
    use crate::dialogue::fixtures::{flow, option, state};

    #[test]
    fn clean_flow_has_no_issues() {
        let flow = flow(vec![
            state(
                "a",
                DialogueStateType::Question,
                None,
                vec![option("go", Some("b"))],
            ),
            state("b", DialogueStateType::Conclusion, None, vec![]),
        ]);
        assert!(validate_flow(&flow).is_empty());
    }

    #[test]
    fn dangling_and_unreachable_states_are_reported() {
        let mut flow = flow(vec![
            state(
                "a",
                DialogueStateType::Question,
                Some("ghost"),
                vec![option("go", Some("phantom"))],
            ),
            state("island", DialogueStateType::Transition, None, vec![]),
        ]);
        flow.initial_state_id = "a".to_string();
        let issues = validate_flow(&flow);
        assert!(issues.contains(&FlowIssue::DanglingNext {
            state: "a".to_string(),
            target: "ghost".to_string()
        }));
        assert!(issues.contains(&FlowIssue::DanglingOption {
            state: "a".to_string(),
            option: "go".to_string(),
            target: "phantom".to_string()
        }));
        assert!(issues.contains(&FlowIssue::Unreachable {
            state: "island".to_string()
        }));
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn missing_initial_state_makes_everything_unreachable() {
        let mut flow = flow(vec![state("a", DialogueStateType::Intro, None, vec![])]);
        flow.initial_state_id = "nope".to_string();
        let issues = validate_flow(&flow);
        assert_eq!(issues.len(), 2);
        assert_eq!(
            issues[0].to_string(),
            "initial state `nope` missing".to_string()
        );
    }

    #[test]
    fn progress_counts_critical_states() {
        let mut crit = state("c", DialogueStateType::Transition, None, vec![]);
        crit.is_critical_path = true;
        let flow = flow(vec![
            state("a", DialogueStateType::Intro, Some("c"), vec![]),
            crit,
            state("m", DialogueStateType::CriticalMoment, None, vec![]),
        ]);
        let none: [&str; 0] = [];
        assert_eq!(critical_path_progress(&flow, &none).total, 2);
        let half = critical_path_progress(&flow, &["a", "c"]);
        assert_eq!(half.visited, 1);
        assert!((half.percent() - 50.0).abs() < f32::EPSILON);
        assert!(!half.is_complete());
        assert!(critical_path_progress(&flow, &["c", "m"]).is_complete());
    }

    #[test]
    fn progress_counts_critical_options() {
        let mut left = option("left", Some("b"));
        left.is_critical_path = true;
        let mut end = option("end", None);
        end.is_critical_path = true;
        let flow = flow(vec![
            state(
                "a",
                DialogueStateType::Question,
                None,
                vec![left, option("right", Some("c"))],
            ),
            state("b", DialogueStateType::Question, None, vec![end]),
            state("c", DialogueStateType::Conclusion, None, vec![]),
        ]);
        let none: [&str; 0] = [];
        assert_eq!(critical_path_progress(&flow, &none).total, 2);

        let off_path = critical_path_progress(&flow, &["a", "c"]);
        assert_eq!(off_path.visited, 0);

        let through_b = critical_path_progress(&flow, &["a", "b"]);
        assert_eq!(through_b.visited, 1);
        assert!(!through_b.is_complete());

        assert!(critical_path_progress(&flow, &["a", "b", "end"]).is_complete());
    }

    #[test]
    fn flows_without_critical_states_are_complete() {
        let flow = flow(vec![state("a", DialogueStateType::Intro, None, vec![])]);
        let progress = critical_path_progress(&flow, &["a"]);
        assert!((progress.percent() - 100.0).abs() < f32::EPSILON);
        assert!(progress.is_complete());
    }
}
