//! Integration tests: the shell's capture and graph flows, headless.
//!
//! Views are simulated by sending commands and pointer events; outcomes are
//! observed through a subscription, the same way the eframe app does it.

use chartgraph_core::analysis::AnalysisState;
use chartgraph_core::geometry::{Rect, pos2, vec2};
use chartgraph_core::input::{HostLayout, PointerEvent};
use chartgraph_core::shell::{CanvasShell, ShellCommand, ShellEvent, ShellMode};
use chartgraph_core::{AppError, ChartSource, Config, GraphNode, NodeKind};
use image::{DynamicImage, RgbaImage};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

fn shell() -> CanvasShell {
    let config = Config::builder()
        .with_analysis_delay(Duration::from_millis(10))
        .build()
        .unwrap();
    let image = DynamicImage::ImageRgba8(RgbaImage::new(1000, 500));
    CanvasShell::new(ChartSource::from_image("chart.png", image), &config)
}

fn chart_layout() -> HostLayout {
    let container = Rect::from_min_size(pos2(0.0, 0.0), vec2(500.0, 250.0));
    HostLayout {
        container,
        content: Some(container),
        natural_size: [1000, 500],
    }
}

fn select(shell: &mut CanvasShell, from: (f32, f32), to: (f32, f32)) {
    let layout = chart_layout();
    for event in [
        PointerEvent::down(pos2(from.0, from.1)),
        PointerEvent::moved(pos2(to.0, to.1)),
        PointerEvent::up(pos2(to.0, to.1)),
    ] {
        shell.handle_pointer(&event, &layout);
    }
}

fn record(shell: &CanvasShell) -> (Rc<RefCell<Vec<ShellEvent>>>, chartgraph_core::events::Subscription) {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    let subscription = shell.subscribe(move |e| sink.borrow_mut().push(e.clone()));
    (log, subscription)
}

fn wait_for_analysis(shell: &mut CanvasShell) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !shell.poll_analysis() {
        assert!(Instant::now() < deadline, "analysis never arrived");
        std::thread::sleep(Duration::from_millis(5));
    }
}

// ─── Capture flow ───────────────────────────────────────────────────────

#[test]
fn confirmed_capture_opens_analysis() {
    let mut shell = shell();
    let (log, _sub) = record(&shell);
    let commands = shell.commander();

    commands.send(ShellCommand::OpenCapture).unwrap();
    shell.process_commands();
    assert_eq!(shell.mode(), ShellMode::Capturing);

    select(&mut shell, (10.0, 10.0), (110.0, 60.0));
    commands.send(ShellCommand::ConfirmCapture(chart_layout())).unwrap();
    shell.process_commands();

    assert_eq!(shell.mode(), ShellMode::Analysis);
    let capture = shell.capture().unwrap();
    assert_eq!((capture.width(), capture.height()), (200, 100));
    assert_eq!(shell.analysis(), &AnalysisState::Pending);
    assert!(log.borrow().contains(&ShellEvent::CaptureCompleted {
        handle: capture.handle(),
        width: 200,
        height: 100,
    }));

    wait_for_analysis(&mut shell);
    assert!(matches!(shell.analysis(), AnalysisState::Ready(r) if r.sections.len() == 3));
    assert_eq!(log.borrow().last(), Some(&ShellEvent::AnalysisReady));
}

#[test]
fn degenerate_capture_keeps_overlay_open() {
    let mut shell = shell();
    let (log, _sub) = record(&shell);
    shell.dispatch(ShellCommand::OpenCapture).unwrap();

    select(&mut shell, (100.0, 10.0), (100.0, 200.0));
    let result = shell.confirm_capture(&chart_layout());

    assert!(matches!(result, Err(AppError::SelectionTooSmall)));
    assert_eq!(shell.mode(), ShellMode::Capturing);
    assert!(shell.selection().selection().is_none());
    assert_eq!(shell.store().live_count(), 0);
    assert!(matches!(log.borrow().last(), Some(ShellEvent::CaptureFailed(_))));
}

#[test]
fn pointer_leaving_finalizes_the_drag() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenCapture).unwrap();
    let layout = chart_layout();

    shell.handle_pointer(&PointerEvent::down(pos2(10.0, 10.0)), &layout);
    shell.handle_pointer(&PointerEvent::moved(pos2(600.0, 100.0)), &layout);
    shell.handle_pointer(&PointerEvent::leave(pos2(600.0, 100.0)), &layout);

    assert!(!shell.selection().is_dragging());
    assert_eq!(
        shell.selection().selection(),
        Some(Rect::from_min_max(pos2(10.0, 10.0), pos2(500.0, 100.0)))
    );
}

#[test]
fn cancel_returns_to_browsing() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenCapture).unwrap();
    select(&mut shell, (10.0, 10.0), (50.0, 50.0));

    shell.dispatch(ShellCommand::CancelCapture).unwrap();
    assert_eq!(shell.mode(), ShellMode::Browsing);
    assert!(shell.selection().selection().is_none());
}

#[test]
fn closing_analysis_releases_the_capture() {
    let mut shell = shell();
    let (log, _sub) = record(&shell);
    shell.dispatch(ShellCommand::OpenCapture).unwrap();
    select(&mut shell, (10.0, 10.0), (110.0, 60.0));
    let handle = shell.confirm_capture(&chart_layout()).unwrap();

    shell.dispatch(ShellCommand::CloseAnalysis).unwrap();

    assert_eq!(shell.mode(), ShellMode::Browsing);
    assert_eq!(shell.store().live_count(), 0);
    assert!(log.borrow().contains(&ShellEvent::RasterReleased(handle)));
}

#[test]
fn recapture_replaces_the_previous_raster() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenCapture).unwrap();
    select(&mut shell, (10.0, 10.0), (110.0, 60.0));
    let first = shell.confirm_capture(&chart_layout()).unwrap();

    shell.dispatch(ShellCommand::OpenCapture).unwrap();
    select(&mut shell, (20.0, 20.0), (60.0, 60.0));
    let second = shell.confirm_capture(&chart_layout()).unwrap();

    assert_ne!(first, second);
    assert!(!shell.store().is_held(first));
    assert_eq!(shell.store().live_count(), 1);
}

// ─── Graph flow ─────────────────────────────────────────────────────────

#[test]
fn stored_capture_becomes_the_focal_image() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenCapture).unwrap();
    select(&mut shell, (10.0, 10.0), (110.0, 60.0));
    let handle = shell.confirm_capture(&chart_layout()).unwrap();

    shell.dispatch(ShellCommand::StoreInGraph).unwrap();

    assert_eq!(shell.mode(), ShellMode::Graph);
    assert_eq!(shell.graph().nodes().len(), 7);
    assert_eq!(shell.graph().focal().unwrap().image, Some(handle));
    assert_eq!(shell.edges().len(), 6);
    assert!(shell.store().is_held(handle));

    shell.dispatch(ShellCommand::CloseGraph).unwrap();
    assert_eq!(shell.mode(), ShellMode::Browsing);
    assert!(!shell.graph().is_open());
    assert_eq!(shell.store().live_count(), 0);
}

#[test]
fn graph_pointer_drags_hit_node() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenGraph).unwrap();
    let container = Rect::from_min_size(pos2(16.0, 16.0), vec2(398.0, 700.0));
    let layout = HostLayout::canvas(container);

    // "trend1" is at (100,350); press 5px right of its centre.
    shell.handle_pointer(&PointerEvent::down(pos2(121.0, 366.0)), &layout);
    shell.handle_pointer(&PointerEvent::moved(pos2(221.0, 466.0)), &layout);
    shell.handle_pointer(&PointerEvent::up(pos2(221.0, 466.0)), &layout);

    assert_eq!(shell.graph().node("trend1").unwrap().position, pos2(200.0, 450.0));
    assert!(shell.graph().drag_session().is_none());
}

#[test]
fn press_anywhere_on_a_pill_grabs_it() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenGraph).unwrap();
    let layout = HostLayout::canvas(Rect::from_min_size(pos2(0.0, 0.0), vec2(600.0, 700.0)));

    // 60px right of "personal2" at (350,450): outside the focal radius, inside its label pill.
    shell.handle_pointer(&PointerEvent::down(pos2(410.0, 450.0)), &layout);
    assert_eq!(shell.graph().drag_session().unwrap().node_id, "personal2");

    shell.handle_pointer(&PointerEvent::moved(pos2(420.0, 460.0)), &layout);
    assert_eq!(shell.graph().node("personal2").unwrap().position, pos2(360.0, 460.0));
}

#[test]
fn leaving_the_canvas_cancels_a_node_drag() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenGraph).unwrap();
    let layout = HostLayout::canvas(Rect::from_min_size(pos2(0.0, 0.0), vec2(600.0, 700.0)));

    shell.handle_pointer(&PointerEvent::down(pos2(100.0, 350.0)), &layout);
    assert_eq!(shell.graph().drag_session().unwrap().node_id, "trend1");

    shell.handle_pointer(&PointerEvent::leave(pos2(650.0, 350.0)), &layout);
    shell.handle_pointer(&PointerEvent::moved(pos2(300.0, 300.0)), &layout);

    assert!(shell.graph().drag_session().is_none());
    assert_eq!(shell.graph().node("trend1").unwrap().position, pos2(100.0, 350.0));
}

#[test]
fn explicit_target_wins_over_hit_test() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenGraph).unwrap();
    let layout = HostLayout::canvas(Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 600.0)));

    shell.handle_pointer(&PointerEvent::down_on("userNotes", pos2(100.0, 350.0)), &layout);
    assert_eq!(shell.graph().drag_session().unwrap().node_id, "userNotes");
}

#[test]
fn added_nodes_get_edges() {
    let mut shell = shell();
    shell.dispatch(ShellCommand::OpenGraph).unwrap();
    shell
        .add_node(GraphNode::new("note-1", NodeKind::Note, "New Note", pos2(200.0, 520.0)))
        .unwrap();

    let edges = shell.edges();
    assert_eq!(edges.len(), 7);
    assert_eq!(edges.last().unwrap().from, "note-1");
}

#[test]
fn dropped_subscription_stops_delivery() {
    let mut shell = shell();
    let (log, sub) = record(&shell);
    shell.dispatch(ShellCommand::OpenGraph).unwrap();
    let seen = log.borrow().len();
    assert!(seen > 0);

    drop(sub);
    shell.dispatch(ShellCommand::CloseGraph).unwrap();
    assert_eq!(log.borrow().len(), seen);
}
