//! Integration tests: selection to native-resolution extraction.
//!
//! Drives `SelectionController` with screen-space pointer positions and
//! checks the pixels `RasterExtractor` copies out of the source.

use chartgraph_core::geometry::{ContentFrame, Rect, pos2, vec2};
use chartgraph_core::raster::{RasterExtractor, RasterStore};
use chartgraph_core::selection::{SelectionController, SelectionEvent, SelectionState};
use chartgraph_core::{AppError, ChartSource};
use image::{DynamicImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;

/// 1000x500 chart whose pixels encode their own coordinates.
fn chart() -> ChartSource {
    let image = RgbaImage::from_fn(1000, 500, |x, y| Rgba([(x % 256) as u8, (y % 256) as u8, (x / 256) as u8, 255]));
    ChartSource::from_image("chart.png", DynamicImage::ImageRgba8(image))
}

/// Container at (100,50) showing the chart at half size.
fn container() -> Rect {
    Rect::from_min_size(pos2(100.0, 50.0), vec2(500.0, 250.0))
}

fn frame() -> ContentFrame {
    ContentFrame::from_layout(container(), container(), [1000, 500])
}

fn drag(controller: &mut SelectionController, from: (f32, f32), to: (f32, f32)) {
    let (c, f) = (container(), frame());
    controller.pointer_down(pos2(from.0, from.1), c, &f);
    controller.pointer_move(pos2(to.0, to.1), c, &f);
    controller.pointer_up();
}

// ─── Selection ──────────────────────────────────────────────────────────

#[test]
fn selection_is_container_relative() {
    let mut controller = SelectionController::default();
    drag(&mut controller, (110.0, 60.0), (210.0, 110.0));

    assert_eq!(
        controller.selection(),
        Some(Rect::from_min_max(pos2(10.0, 10.0), pos2(110.0, 60.0)))
    );
    assert!(matches!(controller.state(), SelectionState::Finalized(_)));
}

#[test]
fn reverse_drag_normalizes() {
    let mut controller = SelectionController::default();
    drag(&mut controller, (210.0, 110.0), (110.0, 60.0));

    let rect = controller.selection().unwrap();
    assert!(rect.width() >= 0.0 && rect.height() >= 0.0);
    assert_eq!(rect, Rect::from_min_max(pos2(10.0, 10.0), pos2(110.0, 60.0)));
}

#[test]
fn drag_is_clamped_to_displayed_content() {
    let mut controller = SelectionController::default();
    drag(&mut controller, (400.0, 200.0), (900.0, -40.0));

    let rect = controller.selection().unwrap();
    assert_eq!(rect.max.x, 500.0);
    assert_eq!(rect.min.y, 0.0);
}

#[test]
fn pointer_down_outside_content_is_ignored() {
    // 800x400 chart letterboxed into a 400x400 container: bars above and below.
    let c = Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 400.0));
    let f = ContentFrame::contain(c.size(), [800, 400]);
    assert_eq!(f.bounds, Rect::from_min_max(pos2(0.0, 100.0), pos2(400.0, 300.0)));

    let mut controller = SelectionController::default();
    assert_eq!(controller.pointer_down(pos2(10.0, 50.0), c, &f), SelectionEvent::None);
    assert_eq!(controller.pointer_down(pos2(10.0, 150.0), c, &f), SelectionEvent::Started);
}

// ─── Extraction ─────────────────────────────────────────────────────────

#[test]
fn extraction_happens_at_native_resolution() {
    let source = chart();
    let mut store = RasterStore::new();
    let mut controller = SelectionController::default();
    drag(&mut controller, (110.0, 60.0), (210.0, 110.0));

    let rect = controller.confirm().unwrap();
    let raster = RasterExtractor::extract(&mut store, &source, rect, &frame()).unwrap();

    assert_eq!((raster.width(), raster.height()), (200, 100));
    let pixels = store.get(raster.handle()).unwrap();
    // Top-left of the region is source pixel (20,20); bottom-right is (219,119).
    assert_eq!(*pixels.get_pixel(0, 0), Rgba([20, 20, 0, 255]));
    assert_eq!(*pixels.get_pixel(199, 99), Rgba([219, 119, 0, 255]));
    assert!(matches!(controller.state(), SelectionState::Idle));
}

#[test]
fn zero_width_selection_creates_nothing() {
    let source = chart();
    let mut store = RasterStore::new();
    let mut controller = SelectionController::default();
    drag(&mut controller, (150.0, 60.0), (150.0, 160.0));

    let result = controller
        .confirm()
        .and_then(|rect| RasterExtractor::extract(&mut store, &source, rect, &frame()));

    assert!(matches!(result, Err(AppError::SelectionTooSmall)));
    assert_eq!(store.live_count(), 0);
    assert!(matches!(controller.state(), SelectionState::Idle));
}

#[test]
fn confirm_without_selection_fails() {
    let mut controller = SelectionController::default();
    assert!(matches!(controller.confirm(), Err(AppError::SelectionNotFinalized)));
}

#[test]
fn region_partly_outside_source_is_clamped() {
    // Overhangs the bottom-right corner of the displayed chart.
    let f = frame();
    let selection = Rect::from_min_max(pos2(450.0, 200.0), pos2(520.0, 260.0));

    let region = RasterExtractor::content_region(selection, &f, [1000, 500]).unwrap();
    assert_eq!((region.x, region.y), (900, 400));
    assert_eq!((region.width, region.height), (100, 100));
}

#[test]
fn region_disjoint_from_source_fails() {
    let selection = Rect::from_min_max(pos2(600.0, 0.0), pos2(700.0, 50.0));
    let result = RasterExtractor::content_region(selection, &frame(), [1000, 500]);
    assert!(matches!(result, Err(AppError::RegionOutOfBounds { x: 1200, .. })));
}

#[test]
fn pending_source_cannot_be_extracted() {
    let mut store = RasterStore::new();
    let selection = Rect::from_min_max(pos2(0.0, 0.0), pos2(10.0, 10.0));
    let result = RasterExtractor::extract(&mut store, &ChartSource::pending("chart.png"), selection, &frame());
    assert!(matches!(result, Err(AppError::SourceNotReady)));
}

// ─── Ownership ──────────────────────────────────────────────────────────

#[test]
fn release_is_tracked_per_handle() {
    let mut store = RasterStore::new();
    let a = store.insert(RgbaImage::new(4, 4));
    let b = store.insert(RgbaImage::new(2, 2));
    let a_handle = a.handle();
    assert_ne!(a_handle, b.handle());
    assert_eq!(store.live_count(), 2);

    store.release(a).unwrap();
    assert!(!store.is_held(a_handle));
    assert_eq!(store.live_count(), 1);
    assert!(matches!(
        store.release_handle(a_handle),
        Err(AppError::DoubleRelease(h)) if h == a_handle
    ));
    assert_eq!(store.live_count(), 1);
}

#[test]
fn raster_exports_as_png_data_uri() {
    let mut store = RasterStore::new();
    let raster = store.insert(RgbaImage::from_pixel(3, 2, Rgba([255, 0, 0, 255])));
    let uri = store.to_data_uri(raster.handle()).unwrap();
    assert!(uri.starts_with("data:image/png;base64,iVBORw0KGgo"));
}
