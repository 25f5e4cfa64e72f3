//! Freeform node canvas with single-node drag.
//!
//! Positions are canvas-local: pointer events arrive in screen coordinates
//! and are mapped through the canvas container's bounding box, never the
//! window, so the canvas can sit anywhere inside the host surface.

use super::node::{GraphNode, NodeSnapshot};
use crate::error::{AppError, Result};
use crate::geometry::CoordinateMapper;
use eframe::egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;

/// Whether dragged nodes are kept inside the visible canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragPolicy {
    /// Nodes may be dragged past the canvas edges.
    #[default]
    Unbounded,
    /// Node centres are clamped to the canvas rectangle.
    ClampToCanvas,
}

impl FromStr for DragPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "unbounded" | "free" => Ok(DragPolicy::Unbounded),
            "clamp" | "clamp_to_canvas" => Ok(DragPolicy::ClampToCanvas),
            other => Err(AppError::config(format!("unknown drag policy: {other}"))),
        }
    }
}

/// State of one grab-to-release interaction.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub node_id: String,
    /// Pointer minus node position at grab time, so the node keeps its
    /// place under the pointer instead of jumping to it.
    pub anchor_offset: Vec2,
}

/// Approximate advance of one label character at the pill font size.
const LABEL_CHAR_WIDTH: f32 = 7.0;
/// Horizontal padding a pill adds around its label.
const PILL_PADDING: f32 = 48.0;
const PILL_MIN_WIDTH: f32 = 80.0;
const PILL_HEIGHT: f32 = 40.0;

/// Owns the node set and the drag session.
#[derive(Debug, Default)]
pub struct GraphCanvas {
    nodes: Vec<GraphNode>,
    drag: Option<DragSession>,
    policy: DragPolicy,
    /// Size the view last drew each node at, centred on its position.
    drawn_sizes: HashMap<String, Vec2>,
}

impl GraphCanvas {
    pub fn new(policy: DragPolicy) -> Self {
        Self {
            nodes: Vec::new(),
            drag: None,
            policy,
            drawn_sizes: HashMap::new(),
        }
    }

    /// Replaces the node set, discarding any in-flight drag.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidGraph`] unless exactly one node is focal
    /// and all ids are unique. The canvas is unchanged on error.
    pub fn open(&mut self, seed: Vec<GraphNode>) -> Result<()> {
        validate(&seed)?;
        log::info!("graph canvas opened with {} nodes", seed.len());
        self.nodes = seed;
        self.drag = None;
        self.drawn_sizes.clear();
        Ok(())
    }

    /// Drops every node and the drag session, returning the nodes.
    pub fn close(&mut self) -> Vec<GraphNode> {
        self.drag = None;
        self.drawn_sizes.clear();
        std::mem::take(&mut self.nodes)
    }

    pub fn is_open(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn snapshot(&self) -> Vec<NodeSnapshot> {
        self.nodes.iter().map(GraphNode::snapshot).collect()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn focal(&self) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.kind.is_focal())
    }

    /// Topmost node covering a canvas-local point. Later nodes are drawn
    /// over earlier ones, so they win.
    ///
    /// The focal node is a disc of `focal_radius`; other nodes cover the
    /// size reported through [`Self::set_drawn_sizes`], or an estimate
    /// from their label until the view has drawn them.
    pub fn hit_test(&self, local: Pos2, focal_radius: f32) -> Option<&GraphNode> {
        self.nodes.iter().rev().find(|n| {
            if n.kind.is_focal() {
                n.position.distance(local) <= focal_radius
            } else {
                self.extent(n).contains(local)
            }
        })
    }

    /// Records the size the view drew each node at. Sizes for ids not on
    /// the canvas are dropped.
    pub fn set_drawn_sizes(&mut self, sizes: impl IntoIterator<Item = (String, Vec2)>) {
        self.drawn_sizes = sizes
            .into_iter()
            .filter(|(id, _)| self.node(id).is_some())
            .collect();
    }

    /// Canvas-local rectangle a non-focal node covers.
    pub fn extent(&self, node: &GraphNode) -> Rect {
        let size = self.drawn_sizes.get(&node.id).copied().unwrap_or_else(|| {
            let label = node.label.chars().count() as f32 * LABEL_CHAR_WIDTH;
            Vec2::new((label + PILL_PADDING).max(PILL_MIN_WIDTH), PILL_HEIGHT)
        });
        Rect::from_center_size(node.position, size)
    }

    pub fn drag_session(&self) -> Option<&DragSession> {
        self.drag.as_ref()
    }

    pub fn policy(&self) -> DragPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: DragPolicy) {
        self.policy = policy;
    }

    /// Starts dragging `node_id`.
    ///
    /// Ignored while another drag is active, and when the id is unknown
    /// (the node may have gone away between dispatch and handling).
    /// Returns whether a drag session started.
    pub fn on_grab(&mut self, node_id: &str, client: Pos2, container: Rect) -> bool {
        if self.drag.is_some() {
            return false;
        }
        let index = match self.index_of(node_id) {
            Ok(index) => index,
            Err(e) => {
                log::debug!("ignoring grab: {e}");
                return false;
            }
        };

        let pointer = CoordinateMapper::to_container(client, container);
        self.drag = Some(DragSession {
            node_id: node_id.to_owned(),
            anchor_offset: pointer - self.nodes[index].position,
        });
        true
    }

    /// Moves the dragged node under the pointer. Returns whether a node moved.
    pub fn on_drag(&mut self, client: Pos2, container: Rect) -> bool {
        let Some(session) = &self.drag else {
            return false;
        };
        let Ok(index) = self.index_of(&session.node_id) else {
            return false;
        };

        let pointer = CoordinateMapper::to_container(client, container);
        let mut position = pointer - session.anchor_offset;
        if self.policy == DragPolicy::ClampToCanvas {
            position = Rect::from_min_size(Pos2::ZERO, container.size()).clamp(position);
        }
        self.nodes[index].position = position;
        true
    }

    /// Ends the drag session. Safe to call without one.
    pub fn on_release(&mut self) {
        self.drag = None;
    }

    /// Adds a node at the end of the node set.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidGraph`] for a duplicate id or a second
    /// focal node.
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        if self.node(&node.id).is_some() {
            return Err(AppError::graph(format!("duplicate node id {:?}", node.id)));
        }
        if node.kind.is_focal() && self.focal().is_some() {
            return Err(AppError::graph("canvas already has a focal node"));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Removes a non-focal node, cancelling a drag on it.
    ///
    /// # Errors
    ///
    /// - [`AppError::UnknownNodeReference`] if no node has this id
    /// - [`AppError::InvalidGraph`] when asked to remove the focal node
    pub fn remove_node(&mut self, id: &str) -> Result<GraphNode> {
        let index = self.index_of(id)?;
        if self.nodes[index].kind.is_focal() {
            return Err(AppError::graph("the focal node cannot be removed"));
        }
        if self.drag.as_ref().is_some_and(|d| d.node_id == id) {
            self.drag = None;
        }
        self.drawn_sizes.remove(id);
        Ok(self.nodes.remove(index))
    }

    fn index_of(&self, id: &str) -> Result<usize> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| AppError::UnknownNodeReference(id.to_owned()))
    }
}

fn validate(nodes: &[GraphNode]) -> Result<()> {
    let focal = nodes.iter().filter(|n| n.kind.is_focal()).count();
    if focal != 1 {
        return Err(AppError::graph(format!(
            "expected exactly one focal node, found {focal}"
        )));
    }

    let mut seen = HashSet::new();
    for node in nodes {
        if !seen.insert(node.id.as_str()) {
            return Err(AppError::graph(format!("duplicate node id {:?}", node.id)));
        }
    }
    Ok(())
}
