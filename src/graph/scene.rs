use std::collections::{HashMap, HashSet};

use eframe::egui::{Color32, Pos2};
use tracing::debug;

use crate::api::{Entity, Relationship};
use crate::util::truncate_label;

pub const DISPLAY_NAME_BUDGET: usize = 12;

pub const NODE_RADIUS: f32 = 14.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Technology,
    Domain,
    Person,
    Company,
    Department,
    Concept,
    Location,
    Other,
}

const KIND_BY_LABEL: [(&str, NodeKind); 8] = [
    ("Document", NodeKind::Document),
    ("Technology", NodeKind::Technology),
    ("Domain", NodeKind::Domain),
    ("Person", NodeKind::Person),
    ("Company", NodeKind::Company),
    ("Department", NodeKind::Department),
    ("Concept", NodeKind::Concept),
    ("Location", NodeKind::Location),
];

impl NodeKind {
    pub const ALL: [NodeKind; 9] = [
        NodeKind::Document,
        NodeKind::Technology,
        NodeKind::Domain,
        NodeKind::Person,
        NodeKind::Company,
        NodeKind::Department,
        NodeKind::Concept,
        NodeKind::Location,
        NodeKind::Other,
    ];

    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        KIND_BY_LABEL
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(label))
            .map(|(_, kind)| *kind)
            .unwrap_or(Self::Other)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Document => "Document",
            Self::Technology => "Technology",
            Self::Domain => "Domain",
            Self::Person => "Person",
            Self::Company => "Company",
            Self::Department => "Department",
            Self::Concept => "Concept",
            Self::Location => "Location",
            Self::Other => "Other",
        }
    }

    pub fn fill(self) -> Color32 {
        match self {
            Self::Document => Color32::from_rgb(86, 156, 236),
            Self::Technology => Color32::from_rgb(92, 196, 142),
            Self::Domain => Color32::from_rgb(236, 167, 78),
            Self::Person => Color32::from_rgb(222, 110, 150),
            Self::Company => Color32::from_rgb(158, 120, 226),
            Self::Department => Color32::from_rgb(116, 204, 214),
            Self::Concept => Color32::from_rgb(226, 208, 96),
            Self::Location => Color32::from_rgb(230, 120, 92),
            Self::Other => Color32::from_rgb(148, 156, 168),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualNode {
    pub entity: Entity,
    pub position: Pos2,
    pub display_name: String,
    pub kind: NodeKind,
}

impl VisualNode {
    pub fn id(&self) -> &str {
        &self.entity.id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct VisualEdge {
    pub relationship: Relationship,
    pub source: usize,
    pub target: usize,
}

#[derive(Clone, Debug, Default)]
pub struct Scene {
    nodes: Vec<VisualNode>,
    edges: Vec<VisualEdge>,
    index_by_id: HashMap<String, usize>,
}

pub fn display_name(entity: &Entity) -> String {
    let name = entity
        .property("name")
        .or_else(|| entity.property("content_preview"))
        .unwrap_or(entity.id.as_str());
    truncate_label(name.trim(), DISPLAY_NAME_BUDGET)
}

impl Scene {
    pub fn build(
        entities: &[Entity],
        relationships: &[Relationship],
        positions: &HashMap<String, Pos2>,
    ) -> Self {
        let mut nodes = Vec::with_capacity(entities.len());
        let mut index_by_id = HashMap::with_capacity(entities.len());

        for entity in entities {
            if index_by_id.contains_key(&entity.id) {
                debug!(id = %entity.id, "duplicate entity id skipped");
                continue;
            }

            let position = positions.get(&entity.id).copied().unwrap_or_else(|| {
                debug!(id = %entity.id, "entity has no position; placing at origin");
                Pos2::ZERO
            });

            index_by_id.insert(entity.id.clone(), nodes.len());
            nodes.push(VisualNode {
                entity: entity.clone(),
                position,
                display_name: display_name(entity),
                kind: NodeKind::from_label(&entity.label),
            });
        }

        let mut edges = Vec::with_capacity(relationships.len());
        for relationship in relationships {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(&relationship.from_id),
                index_by_id.get(&relationship.to_id),
            ) else {
                debug!(
                    from = %relationship.from_id,
                    to = %relationship.to_id,
                    rel_type = %relationship.rel_type,
                    "dangling relationship dropped"
                );
                continue;
            };

            edges.push(VisualEdge {
                relationship: relationship.clone(),
                source,
                target,
            });
        }

        Self {
            nodes,
            edges,
            index_by_id,
        }
    }

    pub fn nodes(&self) -> &[VisualNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[VisualEdge] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&VisualNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn source(&self, edge: &VisualEdge) -> &VisualNode {
        &self.nodes[edge.source]
    }

    pub fn target(&self, edge: &VisualEdge) -> &VisualNode {
        &self.nodes[edge.target]
    }

    pub fn neighbors(&self, index: usize) -> HashSet<usize> {
        self.edges
            .iter()
            .filter_map(|edge| {
                if edge.source == index {
                    Some(edge.target)
                } else if edge.target == index {
                    Some(edge.source)
                } else {
                    None
                }
            })
            .filter(|&other| other != index)
            .collect()
    }

    /// Nearest node whose centre lies within `radius` of `point`. Later
    /// nodes are drawn on top, so they win ties.
    pub fn node_at(&self, point: Pos2, radius: f32) -> Option<&VisualNode> {
        let radius_sq = radius * radius;
        let mut best: Option<(usize, f32)> = None;
        for (index, node) in self.nodes.iter().enumerate() {
            let distance_sq = node.position.distance_sq(point);
            if distance_sq > radius_sq {
                continue;
            }
            if best.is_none_or(|(_, best_sq)| distance_sq <= best_sq) {
                best = Some((index, distance_sq));
            }
        }
        best.map(|(index, _)| &self.nodes[index])
    }
}
