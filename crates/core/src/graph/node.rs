//! Graph node model and the seeded knowledge-graph template.

use crate::raster::RasterHandle;
use eframe::egui::{Color32, Pos2, pos2};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Id of the focal node in the seeded template.
pub const FOCAL_NODE_ID: &str = "chart";

const CORAL: Color32 = Color32::from_rgb(0xFF, 0x7F, 0x50);
const PINK: Color32 = Color32::from_rgb(0xFF, 0xB6, 0xC1);
const TEAL: Color32 = Color32::from_rgb(0x4E, 0xCD, 0xC4);
const GREEN: Color32 = Color32::from_rgb(0x2E, 0xCC, 0x71);

/// What a node represents. Drives its colour, shape and edge label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// The captured chart every other node points at.
    Focal,
    Trend,
    Terminology,
    /// A personal annotation (signal, recommendation).
    Annotation,
    Relation,
    Note,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Focal,
        NodeKind::Trend,
        NodeKind::Terminology,
        NodeKind::Annotation,
        NodeKind::Relation,
        NodeKind::Note,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Focal => "focal",
            NodeKind::Trend => "trend",
            NodeKind::Terminology => "terminology",
            NodeKind::Annotation => "annotation",
            NodeKind::Relation => "relation",
            NodeKind::Note => "note",
        }
    }

    pub fn is_focal(&self) -> bool {
        matches!(self, NodeKind::Focal)
    }

    pub fn default_color(&self) -> Color32 {
        match self {
            NodeKind::Focal | NodeKind::Trend | NodeKind::Terminology => CORAL,
            NodeKind::Annotation => PINK,
            NodeKind::Relation => TEAL,
            NodeKind::Note => GREEN,
        }
    }

    /// Text drawn on the edge from a node of this kind to the focal node.
    pub fn edge_label(&self) -> Option<&'static str> {
        match self {
            NodeKind::Trend => Some("HAS_PATTERN"),
            _ => None,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positioned node on the graph canvas.
///
/// `position` is the node's centre in canvas-local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub position: Pos2,
    pub kind: NodeKind,
    pub label: String,
    pub color: Color32,
    /// Raster shown inside the node. Borrowed: the capture flow owns it.
    pub image: Option<RasterHandle>,
}

impl GraphNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>, position: Pos2) -> Self {
        Self {
            id: id.into(),
            position,
            kind,
            label: label.into(),
            color: kind.default_color(),
            image: None,
        }
    }

    pub fn with_color(mut self, color: Color32) -> Self {
        self.color = color;
        self
    }

    pub fn with_image(mut self, image: Option<RasterHandle>) -> Self {
        self.image = image;
        self
    }

    /// Read-only view handed to renderers and serializers.
    pub fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            id: self.id.clone(),
            x: self.position.x,
            y: self.position.y,
            kind: self.kind,
            label: self.label.clone(),
            color: format!(
                "#{:02X}{:02X}{:02X}",
                self.color.r(),
                self.color.g(),
                self.color.b()
            ),
            image_ref: self.image.map(|h| h.to_string()),
        }
    }
}

/// Flat, serializable node record consumed by the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeSnapshot {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub kind: NodeKind,
    pub label: String,
    pub color: String,
    #[serde(rename = "imageRef", skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
}

/// The node set a freshly opened canvas starts with: the captured chart in
/// the middle and six analysis nodes around it.
pub fn seed_template(focal_image: Option<RasterHandle>) -> Vec<GraphNode> {
    vec![
        GraphNode::new(FOCAL_NODE_ID, NodeKind::Focal, "Chart", pos2(200.0, 200.0))
            .with_image(focal_image),
        GraphNode::new("trend1", NodeKind::Trend, "Trend Analysis", pos2(100.0, 350.0)),
        GraphNode::new("terminology1", NodeKind::Terminology, "Terminology", pos2(300.0, 350.0)),
        GraphNode::new("personal1", NodeKind::Annotation, "Investment Signal", pos2(350.0, 100.0)),
        GraphNode::new(
            "personal2",
            NodeKind::Annotation,
            "Strategic Recommendations",
            pos2(350.0, 450.0),
        ),
        GraphNode::new("relation", NodeKind::Relation, "Relation", pos2(80.0, 150.0)),
        GraphNode::new("userNotes", NodeKind::Note, "User Notes", pos2(320.0, 50.0)),
    ]
}
