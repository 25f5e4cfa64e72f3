//! Main viewer application.
//!
//! `ChartGraphApp` implements `eframe::App`. It turns egui input into
//! [`PointerEvent`]s and [`ShellCommand`]s for the [`CanvasShell`] and
//! paints whatever the shell exposes; it never mutates shell state itself.

use super::rendering::{
    calculate_popup_position, draw_edge, draw_node, draw_selection_border, draw_selection_overlay,
};
use super::settings::Settings;
use crate::analysis::AnalysisState;
use crate::config::Config;
use crate::events::Subscription;
use crate::geometry::ContentFrame;
use crate::graph::{DragPolicy, GraphNode, NodeKind};
use crate::input::{HostLayout, PointerEvent};
use crate::raster::RasterHandle;
use crate::shell::{CanvasShell, ShellCommand, ShellEvent, ShellMode};
use crate::source::ChartSource;
use eframe::egui;
use egui_commonmark::{CommonMarkCache, CommonMarkViewer};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::mpsc::Sender;
use std::time::Duration;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(0xFF, 0xC4, 0x70);
const CAPTURE_ACTIONS_WIDTH: f32 = 160.0;

pub struct ChartGraphApp {
    shell: CanvasShell,
    commands: Sender<ShellCommand>,
    inbox: Rc<RefCell<VecDeque<ShellEvent>>>,
    _subscription: Subscription,

    // Textures
    chart_texture: Option<egui::TextureHandle>,
    raster_textures: HashMap<RasterHandle, egui::TextureHandle>,

    // Pointer tracking
    layout: Option<HostLayout>,
    pointer_inside: bool,

    markdown_cache: CommonMarkCache,
    status: Option<String>,
    added_notes: usize,

    settings: Settings,
    show_settings: bool,
}

impl ChartGraphApp {
    pub fn new(source: ChartSource, config: &Config) -> Self {
        let settings = Settings::load(config);
        let mut shell = CanvasShell::new(source, config);
        shell.graph_mut().set_policy(settings.drag_policy);

        let inbox = Rc::new(RefCell::new(VecDeque::new()));
        let sink = inbox.clone();
        let subscription = shell.subscribe(move |event| sink.borrow_mut().push_back(event.clone()));

        Self {
            commands: shell.commander(),
            shell,
            inbox,
            _subscription: subscription,
            chart_texture: None,
            raster_textures: HashMap::new(),
            layout: None,
            pointer_inside: false,
            markdown_cache: CommonMarkCache::default(),
            status: None,
            added_notes: 0,
            settings,
            show_settings: false,
        }
    }

    fn send(&self, command: ShellCommand) {
        // The shell owns the receiver for as long as the app lives.
        let _ = self.commands.send(command);
    }

    /// Applies shell events to view-only state.
    fn drain_events(&mut self) {
        let events: Vec<_> = self.inbox.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                ShellEvent::CaptureFailed(reason) => {
                    self.status = Some(format!("Capture failed, try again ({reason})"));
                }
                ShellEvent::CaptureCompleted { .. } => self.status = None,
                ShellEvent::RasterReleased(handle) => {
                    self.raster_textures.remove(&handle);
                }
                _ => {}
            }
        }
    }

    fn raster_texture(&mut self, ctx: &egui::Context, handle: RasterHandle) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.raster_textures.get(&handle) {
            return Some(texture.clone());
        }
        let image = self.shell.store().get(handle)?;
        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_raw(),
        );
        let texture = ctx.load_texture(handle.to_string(), color_image, egui::TextureOptions::LINEAR);
        self.raster_textures.insert(handle, texture.clone());
        Some(texture)
    }

    fn ensure_chart_texture(&mut self, ctx: &egui::Context) {
        if self.chart_texture.is_some() {
            return;
        }
        if let Ok(image) = self.shell.source().image() {
            let color_image = egui::ColorImage::from_rgba_unmultiplied(
                [image.width() as usize, image.height() as usize],
                image.as_raw(),
            );
            self.chart_texture =
                Some(ctx.load_texture("chart", color_image, egui::TextureOptions::LINEAR));
        }
    }

    /// Forwards this frame's pointer activity to the shell.
    fn route_pointer(&mut self, ctx: &egui::Context, layout: HostLayout) {
        let (pressed, released, moving, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.is_moving(),
                i.pointer.latest_pos(),
            )
        });
        let over_widget = ctx.is_pointer_over_area();

        let inside = pos.is_some_and(|p| layout.container.contains(p));
        if self.pointer_inside && !inside {
            let leave_pos = pos.unwrap_or(layout.container.center());
            self.shell.handle_pointer(&PointerEvent::leave(leave_pos), &layout);
        }
        self.pointer_inside = inside;

        let Some(pos) = pos else {
            return;
        };
        if pressed && inside && !over_widget {
            self.shell.handle_pointer(&PointerEvent::down(pos), &layout);
        }
        if moving && inside {
            self.shell.handle_pointer(&PointerEvent::moved(pos), &layout);
        }
        if released {
            self.shell.handle_pointer(&PointerEvent::up(pos), &layout);
        }
    }

    fn chart_layout(&self, container: egui::Rect) -> HostLayout {
        let natural = self.shell.source().natural_size().unwrap_or([0, 0]);
        let frame = ContentFrame::contain(container.size(), natural);
        HostLayout {
            container,
            content: Some(frame.bounds.translate(container.min.to_vec2())),
            natural_size: natural,
        }
    }

    fn paint_chart(&self, ui: &egui::Ui, layout: &HostLayout) {
        if let (Some(texture), Some(content)) = (&self.chart_texture, layout.content) {
            ui.painter().image(
                texture.id(),
                content,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
    }

    fn render_browsing(&mut self, ctx: &egui::Context) {
        egui::Area::new(egui::Id::new("browse_actions"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-30.0, -30.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    if ui.button("⚙").clicked() {
                        self.show_settings = !self.show_settings;
                    }
                    if ui.button("Graph").clicked() {
                        self.send(ShellCommand::OpenGraph);
                    }
                    if ui.button("✂ Capture").clicked() {
                        self.send(ShellCommand::OpenCapture);
                    }
                });
                if self.show_settings {
                    self.render_settings_ui(ui);
                }
            });
    }

    fn render_settings_ui(&mut self, ui: &mut egui::Ui) {
        egui::Frame::popup(ui.style()).inner_margin(10.0).show(ui, |ui| {
            ui.label("Settings");
            let before = self.settings.clone();

            let mut clamp = self.settings.drag_policy == DragPolicy::ClampToCanvas;
            ui.checkbox(&mut clamp, "Keep nodes inside the canvas");
            self.settings.drag_policy = if clamp {
                DragPolicy::ClampToCanvas
            } else {
                DragPolicy::Unbounded
            };
            ui.checkbox(&mut self.settings.show_edge_labels, "Show edge labels");
            ui.add(egui::Slider::new(&mut self.settings.overlay_alpha, 0..=255).text("Overlay darkness"));

            if self.settings != before {
                self.shell.graph_mut().set_policy(self.settings.drag_policy);
                if let Err(e) = self.settings.save() {
                    log::warn!("failed to save settings: {e}");
                }
            }
        });
    }

    fn render_capture(&mut self, ui: &egui::Ui, ctx: &egui::Context, layout: &HostLayout) {
        let Some(content) = layout.content else {
            return;
        };
        let selection = self
            .shell
            .selection()
            .selection()
            .map(|r| r.translate(layout.container.min.to_vec2()));

        match selection {
            Some(rect) => {
                draw_selection_overlay(ui.painter(), content, rect, self.settings.overlay_alpha);
                draw_selection_border(ui.painter(), rect, 2.0);
            }
            None => {
                ui.painter().rect_filled(
                    content,
                    0.0,
                    egui::Color32::from_black_alpha(self.settings.overlay_alpha / 3),
                );
            }
        }

        egui::Area::new(egui::Id::new("capture_hint"))
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 16.0))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            self.status
                                .as_deref()
                                .unwrap_or("Drag to select area for screenshot"),
                        );
                        if ui.button("×").clicked() {
                            self.send(ShellCommand::CancelCapture);
                        }
                    });
                });
            });

        if let Some(rect) = selection
            && !self.shell.selection().is_dragging()
        {
            // Below the selection, or above it when the screen runs out.
            let (x, y, pivot) = calculate_popup_position(rect, layout.container, CAPTURE_ACTIONS_WIDTH, 10.0, 50.0);
            egui::Area::new(egui::Id::new("capture_actions"))
                .fixed_pos(egui::pos2(x, y))
                .pivot(pivot)
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        if ui.button("Reselect").clicked() {
                            self.send(ShellCommand::Reselect);
                        }
                        let confirm = egui::Button::new(egui::RichText::new("Confirm").strong()).fill(ACCENT);
                        if ui.add(confirm).clicked() {
                            self.send(ShellCommand::ConfirmCapture(*layout));
                        }
                    });
                });
        }
    }

    fn render_analysis(&mut self, ctx: &egui::Context, screen_rect: egui::Rect) {
        let window_width = (screen_rect.width() * 0.8).clamp(280.0, 600.0);
        let handle = self.shell.capture().map(|r| r.handle());
        let texture = handle.and_then(|h| self.raster_texture(ctx, h));

        egui::Area::new(egui::Id::new("analysis_area"))
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style())
                    .fill(egui::Color32::from_rgb(30, 30, 30))
                    .stroke(egui::Stroke::new(1.0, egui::Color32::GRAY))
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.set_width(window_width);
                        ui.horizontal(|ui| {
                            ui.heading("Chart Analysis");
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.button("×").clicked() {
                                    self.send(ShellCommand::CloseAnalysis);
                                }
                            });
                        });

                        if let Some(texture) = &texture {
                            let size = texture.size_vec2();
                            let fit = (window_width / size.x).min(192.0 / size.y).min(1.0);
                            ui.add(egui::Image::from_texture(egui::load::SizedTexture::new(
                                texture.id(),
                                size * fit,
                            )));
                        }
                        ui.separator();

                        match self.shell.analysis().clone() {
                            AnalysisState::Idle | AnalysisState::Pending => {
                                ui.horizontal(|ui| {
                                    ui.spinner();
                                    ui.label("AI Analyzing...");
                                });
                            }
                            AnalysisState::Ready(report) => {
                                let text = report.to_markdown();
                                egui::ScrollArea::vertical().max_height(300.0).show(ui, |ui| {
                                    CommonMarkViewer::new().show(ui, &mut self.markdown_cache, &text);
                                });
                                ui.separator();
                                ui.horizontal(|ui| {
                                    if ui.button("Copy").clicked()
                                        && let Ok(mut clipboard) = arboard::Clipboard::new()
                                    {
                                        let _ = clipboard.set_text(text.clone());
                                    }
                                    if ui.button("Store in graph").clicked() {
                                        self.send(ShellCommand::StoreInGraph);
                                    }
                                });
                            }
                            AnalysisState::Error(err) => {
                                ui.label(
                                    egui::RichText::new(format!("Error: {}", err))
                                        .color(egui::Color32::RED),
                                );
                            }
                        }
                    });
            });
    }

    fn render_graph(&mut self, ui: &egui::Ui, ctx: &egui::Context, container: egui::Rect) {
        let painter = ui.painter_at(container);
        painter.rect_filled(container, 16.0, egui::Color32::from_white_alpha(242));

        let origin = container.min.to_vec2();
        for edge in self.shell.edges() {
            draw_edge(&painter, &edge, origin, self.settings.show_edge_labels);
        }

        let radius = self.shell.edge_renderer().focal_radius();
        let nodes: Vec<GraphNode> = self.shell.graph().nodes().to_vec();
        let mut drawn_sizes = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let texture = node.image.and_then(|h| self.raster_texture(ctx, h));
            let rect = draw_node(&painter, node, origin, radius, texture.as_ref());
            drawn_sizes.push((node.id.clone(), rect.size()));
        }
        // Next frame's presses hit what was drawn, not just the node centre.
        self.shell.graph_mut().set_drawn_sizes(drawn_sizes);

        egui::Area::new(egui::Id::new("graph_header"))
            .fixed_pos(container.min + egui::vec2(16.0, 12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        egui::RichText::new("Chart Analysis Database")
                            .strong()
                            .color(egui::Color32::BLACK),
                    );
                    if ui.button("×").clicked() {
                        self.send(ShellCommand::CloseGraph);
                    }
                });
            });

        egui::Area::new(egui::Id::new("graph_add"))
            .anchor(egui::Align2::RIGHT_BOTTOM, egui::vec2(-24.0, -24.0))
            .show(ctx, |ui| {
                if ui.add(egui::Button::new("+").fill(ACCENT)).clicked() {
                    self.added_notes += 1;
                    let node = GraphNode::new(
                        format!("note-{}", self.added_notes),
                        NodeKind::Note,
                        "New Note",
                        egui::pos2(container.width() / 2.0, container.height() - 80.0),
                    );
                    if let Err(e) = self.shell.add_node(node) {
                        log::warn!("{e}");
                    }
                }
            });
    }
}

impl eframe::App for ChartGraphApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());
        self.ensure_chart_texture(ctx);

        // Input from the previous frame's layout, then commands, then paint.
        if let Some(layout) = self.layout {
            self.route_pointer(ctx, layout);
        }
        self.shell.process_commands();
        if self.shell.poll_analysis() || matches!(self.shell.analysis(), AnalysisState::Pending) {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        self.drain_events();

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            match self.shell.mode() {
                ShellMode::Browsing => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
                ShellMode::Capturing => self.send(ShellCommand::CancelCapture),
                ShellMode::Analysis => self.send(ShellCommand::CloseAnalysis),
                ShellMode::Graph => self.send(ShellCommand::CloseGraph),
            }
        }

        let panel_frame = egui::Frame::default()
            .inner_margin(egui::Margin::same(0))
            .outer_margin(egui::Margin::same(0));

        egui::CentralPanel::default()
            .frame(panel_frame)
            .show(ctx, |ui| {
                let screen_rect = ui.max_rect();

                match self.shell.mode() {
                    ShellMode::Graph => {
                        let container = screen_rect.shrink(16.0);
                        self.layout = Some(HostLayout::canvas(container));
                        self.render_graph(ui, ctx, container);
                    }
                    mode => {
                        let layout = self.chart_layout(screen_rect);
                        self.layout = Some(layout);
                        self.paint_chart(ui, &layout);
                        match mode {
                            ShellMode::Browsing => self.render_browsing(ctx),
                            ShellMode::Capturing => self.render_capture(ui, ctx, &layout),
                            _ => {
                                ui.painter()
                                    .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(128));
                                self.render_analysis(ctx, screen_rect);
                            }
                        }
                    }
                }
            });

        if self.shell.selection().is_dragging() || self.shell.graph().drag_session().is_some() {
            ctx.request_repaint();
        }
    }
}
