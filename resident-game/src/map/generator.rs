//! Fixed-topology map layout with pluggable id and node-type sources.
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{GameMap, GridPos, MapNode, NodeType};
use crate::constants::{
    MAP_CENTER_BOSS_COLUMNS, MAP_DEFAULT_ENTRANCE_FANOUT, MAP_DEFAULT_ROW_WIDTH,
    MAP_DEFAULT_ROWS, MAP_DEFAULT_STORAGE_COLUMN, MAP_DEFAULT_WINDOW_RADIUS, MAP_RANDOM_ID_LEN,
};
use crate::seed::SeededRandom;

/// Which final-row nodes get a direct edge to the boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BossLinkPolicy {
    /// Every final-row node links to the boss; no dead-end branches.
    #[default]
    Guaranteed,
    /// Only the two center columns link to the boss; outer columns dead-end.
    CenterColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeWeight {
    pub node_type: NodeType,
    pub weight: u32,
}

/// Errors raised when map layout invariants are violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapConfigError {
    #[error("map needs at least one row between entrance and boss")]
    ZeroRows,
    #[error("map rows need at least one column")]
    ZeroWidth,
    #[error("entrance fan-out {fanout} must be between 1 and row width {width}")]
    FanoutOutOfRange { fanout: u8, width: u8 },
    #[error("storage column {column} is outside row width {width}")]
    StorageColumnOutOfRange { column: u8, width: u8 },
    #[error("seeded node type weights must contain a positive weight")]
    EmptyTypeWeights,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapLayoutConfig {
    #[serde(default = "MapLayoutConfig::default_rows")]
    pub rows: u8,
    #[serde(default = "MapLayoutConfig::default_row_width")]
    pub row_width: u8,
    #[serde(default = "MapLayoutConfig::default_entrance_fanout")]
    pub entrance_fanout: u8,
    #[serde(default = "MapLayoutConfig::default_window_radius")]
    pub window_radius: u8,
    #[serde(default = "MapLayoutConfig::default_storage_column")]
    pub storage_column: Option<u8>,
    #[serde(default)]
    pub boss_links: BossLinkPolicy,
    #[serde(default = "MapLayoutConfig::default_type_weights")]
    pub type_weights: Vec<NodeWeight>,
}

impl MapLayoutConfig {
    const fn default_rows() -> u8 {
        MAP_DEFAULT_ROWS
    }

    const fn default_row_width() -> u8 {
        MAP_DEFAULT_ROW_WIDTH
    }

    const fn default_entrance_fanout() -> u8 {
        MAP_DEFAULT_ENTRANCE_FANOUT
    }

    const fn default_window_radius() -> u8 {
        MAP_DEFAULT_WINDOW_RADIUS
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_storage_column() -> Option<u8> {
        Some(MAP_DEFAULT_STORAGE_COLUMN)
    }

    fn default_type_weights() -> Vec<NodeWeight> {
        vec![
            NodeWeight {
                node_type: NodeType::Clinical,
                weight: 4,
            },
            NodeWeight {
                node_type: NodeType::Qa,
                weight: 2,
            },
            NodeWeight {
                node_type: NodeType::Educational,
                weight: 2,
            },
            NodeWeight {
                node_type: NodeType::Vendor,
                weight: 1,
            },
        ]
    }

    /// Layout that keeps the two-center-column boss rule with dead-end branches.
    #[must_use]
    pub fn center_columns() -> Self {
        Self {
            boss_links: BossLinkPolicy::CenterColumns,
            ..Self::default()
        }
    }

    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a layout config.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns the first violated layout invariant.
    pub fn validate(&self) -> Result<(), MapConfigError> {
        if self.rows == 0 {
            return Err(MapConfigError::ZeroRows);
        }
        if self.row_width == 0 {
            return Err(MapConfigError::ZeroWidth);
        }
        if self.entrance_fanout == 0 || self.entrance_fanout > self.row_width {
            return Err(MapConfigError::FanoutOutOfRange {
                fanout: self.entrance_fanout,
                width: self.row_width,
            });
        }
        if let Some(column) = self.storage_column
            && column >= self.row_width
        {
            return Err(MapConfigError::StorageColumnOutOfRange {
                column,
                width: self.row_width,
            });
        }
        if self.type_weights.iter().all(|w| w.weight == 0) {
            return Err(MapConfigError::EmptyTypeWeights);
        }
        Ok(())
    }

    fn links_to_boss(&self, column: u8) -> bool {
        match self.boss_links {
            BossLinkPolicy::Guaranteed => true,
            BossLinkPolicy::CenterColumns => {
                if self.row_width == MAP_DEFAULT_ROW_WIDTH {
                    MAP_CENTER_BOSS_COLUMNS.contains(&column)
                } else {
                    let width = self.row_width;
                    column == (width - 1) / 2 || column == width / 2
                }
            }
        }
    }
}

impl Default for MapLayoutConfig {
    fn default() -> Self {
        Self {
            rows: Self::default_rows(),
            row_width: Self::default_row_width(),
            entrance_fanout: Self::default_entrance_fanout(),
            window_radius: Self::default_window_radius(),
            storage_column: Self::default_storage_column(),
            boss_links: BossLinkPolicy::default(),
            type_weights: Self::default_type_weights(),
        }
    }
}

/// Supplies node ids and middle-row node types during generation.
pub trait LayoutSource {
    fn next_id(&mut self) -> String;

    fn middle_node_type(&mut self, config: &MapLayoutConfig, column: u8) -> NodeType;
}

/// Non-deterministic source: random alphanumeric ids, clinical nodes.
#[derive(Debug, Default)]
pub struct ReferenceSource;

impl LayoutSource for ReferenceSource {
    fn next_id(&mut self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(MAP_RANDOM_ID_LEN)
            .map(char::from)
            .collect()
    }

    fn middle_node_type(&mut self, config: &MapLayoutConfig, column: u8) -> NodeType {
        if config.storage_column == Some(column) {
            NodeType::Storage
        } else {
            NodeType::Clinical
        }
    }
}

/// Deterministic source: ids and weighted node types drawn from one LCG.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: SeededRandom,
    issued: usize,
}

impl SeededSource {
    #[must_use]
    pub fn new(seed: i64) -> Self {
        Self {
            rng: SeededRandom::new(seed),
            issued: 0,
        }
    }
}

impl LayoutSource for SeededSource {
    fn next_id(&mut self) -> String {
        let token = self.rng.next_index(0x10_0000);
        let id = format!("node-{}-{token:05x}", self.issued);
        self.issued += 1;
        id
    }

    fn middle_node_type(&mut self, config: &MapLayoutConfig, column: u8) -> NodeType {
        if config.storage_column == Some(column) {
            return NodeType::Storage;
        }
        let total: u64 = config
            .type_weights
            .iter()
            .map(|w| u64::from(w.weight))
            .sum();
        let Ok(span) = usize::try_from(total) else {
            return NodeType::Clinical;
        };
        let mut roll = u64::try_from(self.rng.next_index(span)).unwrap_or(0);
        for entry in &config.type_weights {
            let weight = u64::from(entry.weight);
            if roll < weight {
                return entry.node_type;
            }
            roll -= weight;
        }
        NodeType::Clinical
    }
}

/// Reference layout: random ids, storage first column, clinical elsewhere.
#[must_use]
pub fn generate_map() -> GameMap {
    build_layout(&MapLayoutConfig::default(), &mut ReferenceSource)
}

/// Seeded layout: identical seeds yield identical maps, ids included.
#[must_use]
pub fn generate_seeded_map(seed: i64) -> GameMap {
    build_layout(&MapLayoutConfig::default(), &mut SeededSource::new(seed))
}

/// Generate a map for a custom layout.
///
/// # Errors
///
/// Returns an error if `config` violates a layout invariant.
pub fn generate_map_with(
    config: &MapLayoutConfig,
    source: &mut dyn LayoutSource,
) -> Result<GameMap, MapConfigError> {
    config.validate()?;
    Ok(build_layout(config, source))
}

fn build_layout(config: &MapLayoutConfig, source: &mut dyn LayoutSource) -> GameMap {
    let width = usize::from(config.row_width);
    let radius = usize::from(config.window_radius);
    let center_x = i32::from(config.row_width.saturating_sub(1) / 2);

    let mut entrance = MapNode {
        id: source.next_id(),
        node_type: NodeType::Entrance,
        position: GridPos { x: center_x, y: 0 },
        connections: Vec::new(),
        locked: false,
        challenge: None,
    };

    let mut rows: Vec<Vec<MapNode>> = Vec::with_capacity(usize::from(config.rows));
    for row in 0..config.rows {
        let mut nodes = Vec::with_capacity(width);
        for column in 0..config.row_width {
            let node_type = source.middle_node_type(config, column);
            nodes.push(MapNode {
                id: source.next_id(),
                node_type,
                position: GridPos {
                    x: i32::from(column),
                    y: i32::from(row) + 1,
                },
                connections: Vec::new(),
                locked: true,
                challenge: node_type.default_challenge(),
            });
        }
        rows.push(nodes);
    }

    let boss = MapNode {
        id: source.next_id(),
        node_type: NodeType::Boss,
        position: GridPos {
            x: center_x,
            y: i32::from(config.rows) + 1,
        },
        connections: Vec::new(),
        locked: true,
        challenge: None,
    };

    let fanout = usize::from(config.entrance_fanout).min(width);
    if let Some(first_row) = rows.first_mut() {
        for node in first_row.iter_mut().take(fanout) {
            entrance.connections.push(node.id.clone());
            node.locked = false;
        }
        // First-row nodes past the fan-out are entered from their left neighbour.
        for column in fanout..width {
            let id = first_row[column].id.clone();
            first_row[column - 1].connections.push(id);
        }
    }

    for row in 0..rows.len().saturating_sub(1) {
        let next_ids: Vec<String> = rows[row + 1].iter().map(|n| n.id.clone()).collect();
        for (idx, node) in rows[row].iter_mut().enumerate() {
            let lo = idx.saturating_sub(radius);
            let hi = (idx + radius).min(width - 1);
            node.connections.extend(next_ids[lo..=hi].iter().cloned());
        }
    }

    if let Some(last_row) = rows.last_mut() {
        for (column, node) in (0..config.row_width).zip(last_row.iter_mut()) {
            if config.links_to_boss(column) {
                node.connections.push(boss.id.clone());
            }
        }
    }

    let start_node_id = entrance.id.clone();
    let boss_node_id = boss.id.clone();
    let mut nodes = Vec::with_capacity(width * rows.len() + 2);
    nodes.push(entrance);
    nodes.extend(rows.into_iter().flatten());
    nodes.push(boss);

    log::debug!(
        "generated map: {} nodes, start {start_node_id}, boss {boss_node_id}",
        nodes.len()
    );

    GameMap {
        nodes,
        start_node_id,
        boss_node_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row_nodes(map: &GameMap, y: i32) -> Vec<&MapNode> {
        map.nodes.iter().filter(|n| n.position.y == y).collect()
    }

    #[test]
    fn reference_map_has_fixed_shape() {
        let map = generate_map();
        assert_eq!(map.nodes.len(), 10);
        assert_eq!(map.validate(), Ok(()));

        let start = map.start_node().unwrap();
        assert_eq!(start.connections.len(), 2);
        assert!(map.boss_node().unwrap().connections.is_empty());

        for y in [1, 2] {
            let row = row_nodes(&map, y);
            assert_eq!(row.len(), 4);
            assert_eq!(row[0].node_type, NodeType::Storage);
            assert!(row[1..].iter().all(|n| n.node_type == NodeType::Clinical));
        }
    }

    #[test]
    fn reference_ids_are_random_and_unique() {
        let a = generate_map();
        let b = generate_map();
        assert_ne!(a.start_node_id, b.start_node_id);
        assert!(a.nodes.iter().all(|n| n.id.len() == MAP_RANDOM_ID_LEN));
    }

    #[test]
    fn sliding_window_links_adjacent_columns() {
        let map = generate_seeded_map(7);
        let first = row_nodes(&map, 1);
        let second = row_nodes(&map, 2);
        let second_ids: Vec<&str> = second.iter().map(|n| n.id.as_str()).collect();

        let window = |node: &MapNode| -> Vec<String> {
            node.connections
                .iter()
                .filter(|id| second_ids.contains(&id.as_str()))
                .cloned()
                .collect()
        };
        assert_eq!(window(first[0]), vec![second[0].id.clone(), second[1].id.clone()]);
        assert_eq!(window(first[1]).len(), 3);
        assert_eq!(window(first[3]), vec![second[2].id.clone(), second[3].id.clone()]);
    }

    #[test]
    fn guaranteed_policy_has_no_dead_ends() {
        let map = generate_seeded_map(12345);
        assert!(map.dead_ends().is_empty());
        assert!(row_nodes(&map, 2).iter().all(|n| n.connections.contains(&map.boss_node_id)));
    }

    #[test]
    fn center_columns_policy_leaves_outer_dead_ends() {
        let map =
            generate_map_with(&MapLayoutConfig::center_columns(), &mut SeededSource::new(3))
                .unwrap();
        assert_eq!(map.validate(), Ok(()));
        let final_row = row_nodes(&map, 2);
        let linked: Vec<bool> = final_row
            .iter()
            .map(|n| n.connections.contains(&map.boss_node_id))
            .collect();
        assert_eq!(linked, vec![false, true, true, false]);
        assert_eq!(map.dead_ends().len(), 2);
        assert!(map.can_reach_boss(&map.start_node_id));
    }

    #[test]
    fn seeded_maps_are_deterministic() {
        assert_eq!(generate_seeded_map(23456), generate_seeded_map(23456));
        assert_ne!(
            generate_seeded_map(23456).start_node_id,
            generate_seeded_map(12345).start_node_id
        );
    }

    #[test]
    fn only_entrance_neighbours_start_unlocked() {
        let map = generate_seeded_map(5);
        let start = map.start_node().unwrap();
        for node in &map.nodes {
            let expected_open = node.id == start.id || start.connections.contains(&node.id);
            assert_eq!(!node.locked, expected_open, "node {}", node.id);
        }
    }

    #[test]
    fn custom_layouts_stay_valid() {
        let config = MapLayoutConfig {
            rows: 4,
            row_width: 5,
            entrance_fanout: 1,
            window_radius: 0,
            storage_column: None,
            ..MapLayoutConfig::default()
        };
        let map = generate_map_with(&config, &mut SeededSource::new(11)).unwrap();
        assert_eq!(map.nodes.len(), 22);
        assert_eq!(map.validate(), Ok(()));
        assert!(map.dead_ends().is_empty());
    }

    #[test]
    fn invalid_layouts_are_rejected() {
        let mut config = MapLayoutConfig::default();
        config.entrance_fanout = 9;
        assert_eq!(
            generate_map_with(&config, &mut ReferenceSource),
            Err(MapConfigError::FanoutOutOfRange { fanout: 9, width: 4 })
        );
        config = MapLayoutConfig {
            rows: 0,
            ..MapLayoutConfig::default()
        };
        assert_eq!(config.validate(), Err(MapConfigError::ZeroRows));
        config = MapLayoutConfig {
            storage_column: Some(4),
            ..MapLayoutConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(MapConfigError::StorageColumnOutOfRange { column: 4, width: 4 })
        );
        config = MapLayoutConfig {
            type_weights: Vec::new(),
            ..MapLayoutConfig::default()
        };
        assert_eq!(config.validate(), Err(MapConfigError::EmptyTypeWeights));
    }

    #[test]
    fn layout_config_defaults_from_partial_json() {
        let config = MapLayoutConfig::from_json(r#"{ "rows": 3, "boss_links": "center_columns" }"#)
            .unwrap();
        assert_eq!(config.rows, 3);
        assert_eq!(config.row_width, 4);
        assert_eq!(config.boss_links, BossLinkPolicy::CenterColumns);
        assert_eq!(config.validate(), Ok(()));
    }
}
