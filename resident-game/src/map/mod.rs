//! Encounter map model: nodes, adjacency, locks, and structural checks.

mod generator;

pub use generator::{
    BossLinkPolicy, LayoutSource, MapConfigError, MapLayoutConfig, NodeWeight, ReferenceSource,
    SeededSource, generate_map, generate_map_with, generate_seeded_map,
};

use std::collections::{HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Category of an encounter node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Entrance,
    Clinical,
    Qa,
    Educational,
    Storage,
    Vendor,
    Boss,
    Narrative,
}

impl NodeType {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Entrance => "entrance",
            Self::Clinical => "clinical",
            Self::Qa => "qa",
            Self::Educational => "educational",
            Self::Storage => "storage",
            Self::Vendor => "vendor",
            Self::Boss => "boss",
            Self::Narrative => "narrative",
        }
    }

    /// Character and dialogue a node of this type opens with, if any.
    #[must_use]
    pub fn default_challenge(self) -> Option<NodeChallenge> {
        let (character_id, dialogue_type) = match self {
            Self::Clinical => ("kapoor", "calibration"),
            Self::Qa => ("jesse", "equipment"),
            Self::Educational => ("quinn", "theory"),
            _ => return None,
        };
        Some(NodeChallenge {
            character_id: character_id.to_string(),
            dialogue_type: dialogue_type.to_string(),
        })
    }
}

/// Grid coordinates; `y` grows from the entrance toward the boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

/// Dialogue a node embeds as its challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeChallenge {
    pub character_id: String,
    pub dialogue_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub position: GridPos,
    #[serde(default)]
    pub connections: Vec<String>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub challenge: Option<NodeChallenge>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("unknown node `{0}`")]
    UnknownNode(String),
    #[error("node id `{0}` appears more than once")]
    DuplicateId(String),
    #[error("start node `{0}` has no connections")]
    StartWithoutConnections(String),
    #[error("boss node `{0}` has outgoing connections")]
    BossHasConnections(String),
    #[error("node `{from}` connects to missing node `{to}`")]
    DanglingConnection { from: String, to: String },
    #[error("node `{0}` is unreachable from the start node")]
    Unreachable(String),
    #[error("node `{0}` is still locked")]
    Locked(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMap {
    pub nodes: Vec<MapNode>,
    pub start_node_id: String,
    pub boss_node_id: String,
}

impl GameMap {
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&MapNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    fn node_mut(&mut self, id: &str) -> Option<&mut MapNode> {
        self.nodes.iter_mut().find(|node| node.id == id)
    }

    #[must_use]
    pub fn start_node(&self) -> Option<&MapNode> {
        self.node(&self.start_node_id)
    }

    #[must_use]
    pub fn boss_node(&self) -> Option<&MapNode> {
        self.node(&self.boss_node_id)
    }

    /// Every node id reachable from `id` by following connections, `id` included.
    #[must_use]
    pub fn reachable_from(&self, id: &str) -> HashSet<String> {
        let mut seen = HashSet::new();
        if self.node(id).is_none() {
            return seen;
        }
        let mut queue = VecDeque::from([id.to_string()]);
        seen.insert(id.to_string());
        while let Some(current) = queue.pop_front() {
            let Some(node) = self.node(&current) else {
                continue;
            };
            for next in &node.connections {
                if seen.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }
        seen
    }

    #[must_use]
    pub fn can_reach_boss(&self, id: &str) -> bool {
        self.reachable_from(id).contains(&self.boss_node_id)
    }

    /// Nodes with no path to the boss, in map order.
    #[must_use]
    pub fn dead_ends(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|node| !self.can_reach_boss(&node.id))
            .map(|node| node.id.as_str())
            .collect()
    }

    /// Check the structural invariants every generated map must hold.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant: duplicate ids, missing start or
    /// boss, a start with no exits, a boss with exits, dangling connections, or
    /// nodes unreachable from the start.
    pub fn validate(&self) -> Result<(), MapError> {
        let mut ids = HashSet::new();
        for node in &self.nodes {
            if !ids.insert(node.id.as_str()) {
                return Err(MapError::DuplicateId(node.id.clone()));
            }
        }

        let start = self
            .start_node()
            .ok_or_else(|| MapError::UnknownNode(self.start_node_id.clone()))?;
        if start.connections.is_empty() {
            return Err(MapError::StartWithoutConnections(start.id.clone()));
        }
        let boss = self
            .boss_node()
            .ok_or_else(|| MapError::UnknownNode(self.boss_node_id.clone()))?;
        if !boss.connections.is_empty() {
            return Err(MapError::BossHasConnections(boss.id.clone()));
        }

        for node in &self.nodes {
            if let Some(missing) = node.connections.iter().find(|to| !ids.contains(to.as_str())) {
                return Err(MapError::DanglingConnection {
                    from: node.id.clone(),
                    to: missing.clone(),
                });
            }
        }

        let reachable = self.reachable_from(&self.start_node_id);
        if let Some(orphan) = self.nodes.iter().find(|node| !reachable.contains(&node.id)) {
            return Err(MapError::Unreachable(orphan.id.clone()));
        }
        Ok(())
    }

    /// Mark `id` completed and unlock the nodes it connects to.
    ///
    /// Returns the ids that were locked before this call.
    ///
    /// # Errors
    ///
    /// Returns an error when `id` is unknown or still locked.
    pub fn complete_node(&mut self, id: &str) -> Result<Vec<String>, MapError> {
        let node = self
            .node(id)
            .ok_or_else(|| MapError::UnknownNode(id.to_string()))?;
        if node.locked {
            return Err(MapError::Locked(id.to_string()));
        }
        let targets = node.connections.clone();
        let mut unlocked = Vec::new();
        for target in targets {
            if let Some(next) = self.node_mut(&target)
                && next.locked
            {
                next.locked = false;
                unlocked.push(target);
            }
        }
        log::debug!("completed node {id}, unlocked {unlocked:?}");
        Ok(unlocked)
    }
}
