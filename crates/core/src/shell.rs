//! The shell composing the capture flow and the graph flow.
//!
//! ```text
//! Browsing --OpenCapture--> Capturing --ConfirmCapture--> Analysis
//!     ^                        |                            |  |
//!     +------CancelCapture-----+        CloseAnalysis ------+  |
//!     +------CloseGraph------ Graph <------ StoreInGraph ------+
//! ```
//!
//! Views never reach into the shell's state: they send [`ShellCommand`]s
//! through the channel returned by [`CanvasShell::commander`], and observe
//! outcomes through [`ShellEvent`] subscriptions. The shell owns the
//! current capture and releases it when its consumer goes away.

use crate::analysis::{AnalysisEvent, AnalysisState, SimulatedAnalyst};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::events::{EventBus, Subscription};
use crate::geometry::CoordinateMapper;
use crate::graph::{Edge, EdgeRenderer, GraphCanvas, GraphNode, seed_template};
use crate::input::{HostLayout, PointerEvent, PointerKind};
use crate::raster::{ExtractedRaster, RasterExtractor, RasterHandle, RasterStore};
use crate::selection::{SelectionController, SelectionEvent};
use crate::source::ChartSource;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};

/// Which view is in front.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    /// The chart is shown; nothing is being captured.
    Browsing,
    /// The crop overlay is open over the chart.
    Capturing,
    /// The capture is shown with its (simulated) analysis.
    Analysis,
    /// The knowledge-graph canvas is open.
    Graph,
}

/// Requests views send to the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellCommand {
    OpenCapture,
    CancelCapture,
    Reselect,
    /// Extract the finalized selection, using the layout of this frame.
    ConfirmCapture(HostLayout),
    CloseAnalysis,
    /// Pin the current capture into a freshly opened graph canvas.
    StoreInGraph,
    OpenGraph,
    CloseGraph,
}

/// Things that happened, for anyone subscribed.
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    ModeChanged(ShellMode),
    CaptureCompleted {
        handle: RasterHandle,
        width: u32,
        height: u32,
    },
    /// Extraction failed; the user should select again.
    CaptureFailed(String),
    AnalysisReady,
    GraphOpened { nodes: usize },
    GraphClosed,
    RasterReleased(RasterHandle),
}

pub struct CanvasShell {
    source: ChartSource,
    mode: ShellMode,

    // Capture flow
    selection: SelectionController,
    store: RasterStore,
    capture: Option<ExtractedRaster>,

    // Analysis
    analyst: SimulatedAnalyst,
    analysis: AnalysisState,
    analysis_rx: Option<Receiver<AnalysisEvent>>,

    // Graph flow
    graph: GraphCanvas,
    renderer: EdgeRenderer,

    commands_tx: Sender<ShellCommand>,
    commands_rx: Receiver<ShellCommand>,
    events: EventBus<ShellEvent>,
}

impl CanvasShell {
    pub fn new(source: ChartSource, config: &Config) -> Self {
        let (commands_tx, commands_rx) = channel();
        Self {
            source,
            mode: ShellMode::Browsing,
            selection: SelectionController::new(config.min_selection_extent),
            store: RasterStore::new(),
            capture: None,
            analyst: SimulatedAnalyst::new(config.analysis_delay),
            analysis: AnalysisState::Idle,
            analysis_rx: None,
            graph: GraphCanvas::new(config.drag_policy),
            renderer: EdgeRenderer::new(config.focal_radius),
            commands_tx,
            commands_rx,
            events: EventBus::new(),
        }
    }

    /// A sender views use to request transitions.
    pub fn commander(&self) -> Sender<ShellCommand> {
        self.commands_tx.clone()
    }

    /// Registers a listener for shell events.
    #[must_use = "dropping the subscription unregisters the listener"]
    pub fn subscribe(&self, listener: impl FnMut(&ShellEvent) + 'static) -> Subscription {
        self.events.subscribe(listener)
    }

    pub fn mode(&self) -> ShellMode {
        self.mode
    }

    pub fn source(&self) -> &ChartSource {
        &self.source
    }

    pub fn selection(&self) -> &SelectionController {
        &self.selection
    }

    pub fn graph(&self) -> &GraphCanvas {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphCanvas {
        &mut self.graph
    }

    /// Connector geometry for the current node set.
    pub fn edges(&self) -> Vec<Edge> {
        self.renderer.edges(self.graph.nodes())
    }

    pub fn edge_renderer(&self) -> &EdgeRenderer {
        &self.renderer
    }

    pub fn analysis(&self) -> &AnalysisState {
        &self.analysis
    }

    pub fn capture(&self) -> Option<&ExtractedRaster> {
        self.capture.as_ref()
    }

    pub fn store(&self) -> &RasterStore {
        &self.store
    }

    /// Runs every queued command. Failures are logged and, for capture
    /// failures, reported as [`ShellEvent::CaptureFailed`].
    pub fn process_commands(&mut self) {
        while let Ok(command) = self.commands_rx.try_recv() {
            if let Err(e) = self.dispatch(command) {
                log::warn!("shell command failed: {e}");
            }
        }
    }

    /// Runs one command immediately.
    pub fn dispatch(&mut self, command: ShellCommand) -> Result<()> {
        match command {
            ShellCommand::OpenCapture => self.open_capture(),
            ShellCommand::CancelCapture => self.cancel_capture(),
            ShellCommand::Reselect => {
                self.selection.reset();
            }
            ShellCommand::ConfirmCapture(layout) => {
                self.confirm_capture(&layout)?;
            }
            ShellCommand::CloseAnalysis => self.close_analysis(),
            ShellCommand::StoreInGraph | ShellCommand::OpenGraph => self.open_graph()?,
            ShellCommand::CloseGraph => self.close_graph(),
        }
        Ok(())
    }

    /// Routes a pointer event to the controller of the current view.
    pub fn handle_pointer(&mut self, event: &PointerEvent, layout: &HostLayout) {
        match self.mode {
            ShellMode::Capturing => {
                let Some(frame) = layout.frame() else {
                    return;
                };
                let outcome = match event.kind {
                    PointerKind::Down => self.selection.pointer_down(event.pos, layout.container, &frame),
                    PointerKind::Move => self.selection.pointer_move(event.pos, layout.container, &frame),
                    PointerKind::Up | PointerKind::Leave => self.selection.pointer_up(),
                };
                if outcome == SelectionEvent::Completed {
                    log::debug!("selection finalized: {:?}", self.selection.selection());
                }
            }
            ShellMode::Graph => match event.kind {
                PointerKind::Down => {
                    let local = CoordinateMapper::to_container(event.pos, layout.container);
                    let target = event.target.clone().or_else(|| {
                        self.graph
                            .hit_test(local, self.renderer.focal_radius())
                            .map(|n| n.id.clone())
                    });
                    if let Some(id) = target {
                        self.graph.on_grab(&id, event.pos, layout.container);
                    }
                }
                PointerKind::Move => {
                    self.graph.on_drag(event.pos, layout.container);
                }
                PointerKind::Up | PointerKind::Leave => self.graph.on_release(),
            },
            ShellMode::Browsing | ShellMode::Analysis => {}
        }
    }

    /// Picks up a finished analysis, if any. Returns whether state changed.
    pub fn poll_analysis(&mut self) -> bool {
        let Some(rx) = &self.analysis_rx else {
            return false;
        };
        let event = match rx.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => {
                AnalysisEvent::Failed("analysis task ended without a result".to_string())
            }
        };

        self.analysis_rx = None;
        self.analysis = match event {
            AnalysisEvent::Ready(report) => {
                self.events.emit(&ShellEvent::AnalysisReady);
                AnalysisState::Ready(report)
            }
            AnalysisEvent::Failed(e) => AnalysisState::Error(e),
        };
        true
    }

    fn set_mode(&mut self, mode: ShellMode) {
        if self.mode != mode {
            self.mode = mode;
            self.events.emit(&ShellEvent::ModeChanged(mode));
        }
    }

    fn open_capture(&mut self) {
        if self.mode == ShellMode::Graph {
            self.close_graph();
        }
        self.selection.reset();
        self.set_mode(ShellMode::Capturing);
    }

    fn cancel_capture(&mut self) {
        self.selection.reset();
        if self.mode == ShellMode::Capturing {
            self.set_mode(ShellMode::Browsing);
        }
    }

    /// Extracts the finalized selection and moves on to the analysis view.
    ///
    /// On failure no raster is created, the selection is back to idle and
    /// the crop overlay stays open for another try.
    pub fn confirm_capture(&mut self, layout: &HostLayout) -> Result<RasterHandle> {
        if self.mode != ShellMode::Capturing {
            return Err(AppError::SelectionNotFinalized);
        }

        let extracted = self.selection.confirm().and_then(|rect| {
            let frame = layout.frame().ok_or(AppError::GeometryUndefined)?;
            RasterExtractor::extract(&mut self.store, &self.source, rect, &frame)
        });
        let raster = match extracted {
            Ok(raster) => raster,
            Err(e) => {
                self.selection.reset();
                self.events.emit(&ShellEvent::CaptureFailed(e.to_string()));
                return Err(e);
            }
        };

        let handle = raster.handle();
        log::info!("captured {handle} ({}x{})", raster.width(), raster.height());
        self.events.emit(&ShellEvent::CaptureCompleted {
            handle,
            width: raster.width(),
            height: raster.height(),
        });

        self.release_capture();
        self.capture = Some(raster);

        self.analysis = AnalysisState::Pending;
        self.analysis_rx = Some(self.analyst.spawn());
        self.set_mode(ShellMode::Analysis);
        Ok(handle)
    }

    fn close_analysis(&mut self) {
        self.analysis_rx = None;
        self.analysis = AnalysisState::Idle;
        self.release_capture();
        if self.mode == ShellMode::Analysis {
            self.set_mode(ShellMode::Browsing);
        }
    }

    /// Opens the graph canvas seeded with the current capture.
    pub fn open_graph(&mut self) -> Result<()> {
        self.analysis_rx = None;
        self.analysis = AnalysisState::Idle;

        let image = self.capture.as_ref().map(ExtractedRaster::handle);
        self.graph.open(seed_template(image))?;
        self.events.emit(&ShellEvent::GraphOpened {
            nodes: self.graph.nodes().len(),
        });
        self.set_mode(ShellMode::Graph);
        Ok(())
    }

    /// Adds a node to the open canvas.
    pub fn add_node(&mut self, node: GraphNode) -> Result<()> {
        self.graph.add_node(node)
    }

    fn close_graph(&mut self) {
        let nodes = self.graph.close();
        if nodes.is_empty() && self.mode != ShellMode::Graph {
            return;
        }
        self.events.emit(&ShellEvent::GraphClosed);
        self.release_capture();
        self.set_mode(ShellMode::Browsing);
    }

    fn release_capture(&mut self) {
        let Some(raster) = self.capture.take() else {
            return;
        };
        let handle = raster.handle();
        match self.store.release(raster) {
            Ok(()) => self.events.emit(&ShellEvent::RasterReleased(handle)),
            Err(e) => log::warn!("{e}"),
        }
    }
}
