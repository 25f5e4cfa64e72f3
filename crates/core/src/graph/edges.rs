//! Connector geometry between nodes and the focal node.
//!
//! Edges are not stored: every non-focal node points at the focal node, so
//! the full edge set is derived from the node positions each frame.

use super::node::GraphNode;
use crate::config::DEFAULT_FOCAL_RADIUS;
use eframe::egui::{Pos2, Vec2, vec2};

/// Distance of an edge label from its segment.
pub const LABEL_OFFSET: f32 = 5.0;

/// Arrowhead length along the edge.
pub const ARROW_LENGTH: f32 = 10.0;

/// Arrowhead width across the edge.
pub const ARROW_WIDTH: f32 = 6.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub text: &'static str,
    pub pos: Pos2,
}

/// A directed segment from a node's centre to the focal node's boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub start: Pos2,
    pub end: Pos2,
    pub label: Option<EdgeLabel>,
}

impl Edge {
    /// Unit vector from `start` to `end`.
    pub fn direction(&self) -> Vec2 {
        (self.end - self.start).normalized()
    }

    /// Triangle `[tip, left, right]` with its tip on the edge's end.
    pub fn arrowhead(&self) -> [Pos2; 3] {
        let dir = self.direction();
        let normal = vec2(-dir.y, dir.x) * (ARROW_WIDTH / 2.0);
        let base = self.end - dir * ARROW_LENGTH;
        [self.end, base + normal, base - normal]
    }
}

/// Computes edge geometry for a node set.
#[derive(Debug, Clone, Copy)]
pub struct EdgeRenderer {
    focal_radius: f32,
    label_offset: f32,
}

impl Default for EdgeRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_FOCAL_RADIUS)
    }
}

impl EdgeRenderer {
    pub fn new(focal_radius: f32) -> Self {
        Self {
            focal_radius,
            label_offset: LABEL_OFFSET,
        }
    }

    pub fn focal_radius(&self) -> f32 {
        self.focal_radius
    }

    /// One edge per non-focal node, in node order. Empty without a focal node.
    pub fn edges(&self, nodes: &[GraphNode]) -> Vec<Edge> {
        let Some(focal) = nodes.iter().find(|n| n.kind.is_focal()) else {
            return Vec::new();
        };
        nodes
            .iter()
            .filter(|n| !n.kind.is_focal())
            .filter_map(|n| self.edge_to(n, focal))
            .collect()
    }

    /// Edge from `node` to `focal`, shortened by the focal radius.
    ///
    /// Returns `None` when both centres coincide: there is no direction to
    /// draw in.
    pub fn edge_to(&self, node: &GraphNode, focal: &GraphNode) -> Option<Edge> {
        let delta = focal.position - node.position;
        let distance = delta.length();
        if !(distance > 0.0 && distance.is_finite()) {
            return None;
        }

        let dir = delta / distance;
        let end = focal.position - dir * self.focal_radius;

        let label = node.kind.edge_label().map(|text| {
            let midpoint = node.position + delta * 0.5;
            EdgeLabel {
                text,
                pos: midpoint + upward_normal(dir) * self.label_offset,
            }
        });

        Some(Edge {
            from: node.id.clone(),
            to: focal.id.clone(),
            start: node.position,
            end,
            label,
        })
    }
}

/// The unit normal of `dir` that points up the screen (or right, for a
/// vertical segment).
fn upward_normal(dir: Vec2) -> Vec2 {
    let normal = vec2(dir.y, -dir.x);
    if normal.y > 0.0 { -normal } else { normal }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{NodeKind, seed_template};
    use eframe::egui::pos2;

    fn approx(a: Pos2, b: Pos2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn edge_stops_at_focal_boundary() {
        let focal = GraphNode::new("chart", NodeKind::Focal, "Chart", pos2(200.0, 200.0));
        let node = GraphNode::new("n", NodeKind::Relation, "Relation", pos2(200.0, 400.0));

        let edge = EdgeRenderer::new(48.0).edge_to(&node, &focal).unwrap();
        assert_eq!(edge.start, pos2(200.0, 400.0));
        assert!(approx(edge.end, pos2(200.0, 248.0)));
        assert_eq!(edge.label, None);
    }

    #[test]
    fn coincident_node_has_no_edge() {
        let focal = GraphNode::new("chart", NodeKind::Focal, "Chart", pos2(200.0, 200.0));
        let node = GraphNode::new("n", NodeKind::Trend, "Trend", pos2(200.0, 200.0));

        assert_eq!(EdgeRenderer::default().edge_to(&node, &focal), None);
        assert!(EdgeRenderer::default().edges(&[focal, node]).is_empty());
    }

    #[test]
    fn trend_label_sits_above_horizontal_edge() {
        let focal = GraphNode::new("chart", NodeKind::Focal, "Chart", pos2(300.0, 100.0));
        let node = GraphNode::new("t", NodeKind::Trend, "Trend", pos2(100.0, 100.0));

        let edge = EdgeRenderer::default().edge_to(&node, &focal).unwrap();
        let label = edge.label.unwrap();
        assert_eq!(label.text, "HAS_PATTERN");
        assert!(approx(label.pos, pos2(200.0, 95.0)));
    }

    #[test]
    fn arrowhead_tip_is_edge_end() {
        let focal = GraphNode::new("chart", NodeKind::Focal, "Chart", pos2(100.0, 0.0));
        let node = GraphNode::new("n", NodeKind::Note, "Note", pos2(0.0, 0.0));

        let edge = EdgeRenderer::new(0.0).edge_to(&node, &focal).unwrap();
        let [tip, left, right] = edge.arrowhead();
        assert_eq!(tip, edge.end);
        assert!(approx(left, pos2(90.0, 3.0)));
        assert!(approx(right, pos2(90.0, -3.0)));
    }

    #[test]
    fn seeded_template_yields_six_edges() {
        let edges = EdgeRenderer::default().edges(&seed_template(None));
        assert_eq!(edges.len(), 6);
        assert!(edges.iter().all(|e| e.to == "chart"));
        assert!(edges.iter().all(|e| e.end.x.is_finite() && e.end.y.is_finite()));
    }
}
