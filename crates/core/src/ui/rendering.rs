//! Painting helpers for the crop overlay and the graph canvas.

use crate::graph::{Edge, GraphNode, NodeKind};
use eframe::egui;

const SELECTION_STROKE: egui::Color32 = egui::Color32::from_rgb(0xFF, 0xC4, 0x70);
const EDGE_COLOR: egui::Color32 = egui::Color32::from_rgb(0x3B, 0x82, 0xF6);

/// Dims `area` everywhere except `selection_rect`.
///
/// # Arguments
/// * `painter` - The egui painter to draw with
/// * `area` - The region to dim (the displayed chart)
/// * `selection_rect` - The selected area to keep clear
/// * `alpha` - Darkness level (0-255, higher = darker)
pub fn draw_selection_overlay(
    painter: &egui::Painter,
    area: egui::Rect,
    selection_rect: egui::Rect,
    alpha: u8,
) {
    let color = egui::Color32::from_black_alpha(alpha);
    let sel = selection_rect.intersect(area);

    // Above, below, then the two side strips between them.
    for rect in [
        egui::Rect::from_min_max(area.min, egui::pos2(area.max.x, sel.min.y)),
        egui::Rect::from_min_max(egui::pos2(area.min.x, sel.max.y), area.max),
        egui::Rect::from_min_max(egui::pos2(area.min.x, sel.min.y), egui::pos2(sel.min.x, sel.max.y)),
        egui::Rect::from_min_max(egui::pos2(sel.max.x, sel.min.y), egui::pos2(area.max.x, sel.max.y)),
    ] {
        if rect.is_positive() {
            painter.rect_filled(rect, 0.0, color);
        }
    }
}

/// Dashed outline with a faint fill, marking the selection.
pub fn draw_selection_border(painter: &egui::Painter, selection_rect: egui::Rect, stroke_width: f32) {
    painter.rect_filled(
        selection_rect,
        0.0,
        egui::Color32::from_rgba_unmultiplied(0xFF, 0xC4, 0x70, 26),
    );

    let r = selection_rect;
    let outline = [r.left_top(), r.right_top(), r.right_bottom(), r.left_bottom(), r.left_top()];
    painter.extend(egui::Shape::dashed_line(
        &outline,
        egui::Stroke::new(stroke_width, SELECTION_STROKE),
        5.0,
        5.0,
    ));
}

/// Calculates the optimal position for a popup window relative to a selection.
///
/// Tries to position the window below the selection, but moves it above
/// if there isn't enough space below.
///
/// # Returns
/// A tuple of (x position, y position, pivot alignment)
pub fn calculate_popup_position(
    anchor: egui::Rect,
    screen_rect: egui::Rect,
    window_width: f32,
    spacing: f32,
    min_space_needed: f32,
) -> (f32, f32, egui::Align2) {
    let max_x = (screen_rect.max.x - window_width - 10.0).max(screen_rect.min.x + 10.0);
    let window_x = (anchor.center().x - (window_width / 2.0)).clamp(screen_rect.min.x + 10.0, max_x);

    let mut window_y = anchor.max.y + spacing;
    let mut pivot = egui::Align2::LEFT_TOP;

    let space_below = screen_rect.max.y - window_y;
    if space_below < min_space_needed && anchor.min.y - screen_rect.min.y > space_below {
        pivot = egui::Align2::LEFT_BOTTOM;
        window_y = anchor.min.y - spacing;
    }

    (window_x, window_y, pivot)
}

/// Draws an edge with its arrowhead and label. `origin` maps canvas-local
/// coordinates to the screen.
pub fn draw_edge(painter: &egui::Painter, edge: &Edge, origin: egui::Vec2, show_label: bool) {
    let stroke = egui::Stroke::new(2.0, EDGE_COLOR.gamma_multiply(0.5));
    painter.line_segment([edge.start + origin, edge.end + origin], stroke);

    let arrow = edge.arrowhead().map(|p| p + origin).to_vec();
    painter.add(egui::Shape::convex_polygon(arrow, EDGE_COLOR, egui::Stroke::NONE));

    if show_label && let Some(label) = &edge.label {
        painter.text(
            label.pos + origin,
            egui::Align2::CENTER_BOTTOM,
            label.text,
            egui::FontId::proportional(10.0),
            EDGE_COLOR,
        );
    }
}

/// Draws a node centred on its position. Returns the screen rectangle it
/// covers.
pub fn draw_node(
    painter: &egui::Painter,
    node: &GraphNode,
    origin: egui::Vec2,
    focal_radius: f32,
    texture: Option<&egui::TextureHandle>,
) -> egui::Rect {
    let center = node.position + origin;

    let rect = match (node.kind, texture) {
        (NodeKind::Focal, Some(texture)) => {
            painter.circle(
                center,
                focal_radius,
                egui::Color32::WHITE,
                egui::Stroke::new(4.0, node.color),
            );
            // Largest square inside the ring.
            let side = (focal_radius - 6.0).max(0.0) * std::f32::consts::SQRT_2;
            let image_rect = egui::Rect::from_center_size(center, egui::vec2(side, side));
            painter.image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
            egui::Rect::from_center_size(center, egui::Vec2::splat(focal_radius * 2.0))
        }
        _ => {
            let galley = painter.layout_no_wrap(
                node.label.clone(),
                egui::FontId::proportional(14.0),
                egui::Color32::WHITE,
            );
            let size = egui::vec2((galley.size().x + 48.0).max(80.0), galley.size().y + 24.0);
            let pill = egui::Rect::from_center_size(center, size);
            painter.rect_filled(pill, size.y / 2.0, node.color);
            painter.galley(center - galley.size() / 2.0, galley, egui::Color32::WHITE);
            pill
        }
    };

    // Connection dot on the right edge.
    painter.circle_filled(egui::pos2(rect.max.x, center.y), 4.0, EDGE_COLOR);
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn popup_goes_above_when_no_room_below() {
        let screen = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(430.0, 932.0));
        let anchor = egui::Rect::from_min_size(egui::pos2(50.0, 700.0), egui::vec2(100.0, 150.0));

        let (_, y, pivot) = calculate_popup_position(anchor, screen, 300.0, 10.0, 400.0);
        assert_eq!(pivot, egui::Align2::LEFT_BOTTOM);
        assert_eq!(y, 690.0);
    }

    #[test]
    fn popup_is_clamped_to_screen() {
        let screen = egui::Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(430.0, 932.0));
        let anchor = egui::Rect::from_min_size(egui::pos2(380.0, 100.0), egui::vec2(40.0, 40.0));

        let (x, y, pivot) = calculate_popup_position(anchor, screen, 300.0, 10.0, 400.0);
        assert_eq!(x, 120.0);
        assert_eq!(y, 150.0);
        assert_eq!(pivot, egui::Align2::LEFT_TOP);
    }
}
