use eframe::egui::{Pos2, Vec2};
use image::{GrayImage, Luma};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

/// Marker written into the temporary selection mask for covered pixels.
pub const SELECTED: u8 = 255;

// ── In-progress polygon ─────────────────────────────────────────────────────

/// Collects canvas-space clicks until the polygon is closed or cancelled.
#[derive(Clone, Debug)]
pub struct PolygonAnnotator {
    points: Vec<Pos2>,
    close_threshold: f32,
}

impl PolygonAnnotator {
    pub fn new(close_threshold: f32) -> Self {
        Self {
            points: Vec::new(),
            close_threshold,
        }
    }

    pub fn points(&self) -> &[Pos2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append a vertex. Returns true when the new vertex lands within the
    /// close threshold of the first one, i.e. the polygon should be closed.
    pub fn push(&mut self, pos: Pos2) -> bool {
        self.points.push(pos);
        self.points.len() > 1 && self.is_close_to_start(pos)
    }

    fn is_close_to_start(&self, pos: Pos2) -> bool {
        self.points
            .first()
            .is_some_and(|start| start.distance(pos) < self.close_threshold)
    }

    /// Hand over the vertices if they form a closable polygon (three or
    /// more points) and reset to idle. Fewer points are left in place.
    pub fn take_closed(&mut self) -> Option<Vec<Pos2>> {
        if self.points.len() < 3 {
            return None;
        }
        Some(std::mem::take(&mut self.points))
    }

    pub fn cancel(&mut self) {
        self.points.clear();
    }
}

// ── Canvas → image mapping ──────────────────────────────────────────────────

/// Map canvas points to pixel coordinates, scaling each axis independently
/// and truncating toward zero.
pub fn canvas_to_image(points: &[Pos2], canvas: Vec2, image_size: (u32, u32)) -> Vec<Point<i32>> {
    let sx = image_size.0 as f32 / canvas.x;
    let sy = image_size.1 as f32 / canvas.y;
    points
        .iter()
        .map(|p| Point::new((p.x * sx) as i32, (p.y * sy) as i32))
        .collect()
}

/// Rasterize a polygon (edges included) into a fresh selection mask where
/// covered pixels hold [`SELECTED`].
///
/// Rings with fewer than three distinct vertices cover only their outline:
/// a single pixel or the segment between two pixels.
pub fn rasterize(points: &[Point<i32>], width: u32, height: u32) -> GrayImage {
    let mut selection = GrayImage::new(width, height);
    let mut poly = points.to_vec();
    poly.dedup();
    // imageproc wants an open ring; an auto-closing click often maps back
    // onto the first vertex
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    let mut distinct = poly.clone();
    distinct.sort_by_key(|p| (p.x, p.y));
    distinct.dedup();

    match distinct.len() {
        0 => {}
        1 => select_pixel(&mut selection, distinct[0]),
        2 => {
            let (a, b) = (distinct[0], distinct[1]);
            draw_line_segment_mut(
                &mut selection,
                (a.x as f32, a.y as f32),
                (b.x as f32, b.y as f32),
                Luma([SELECTED]),
            );
            select_pixel(&mut selection, a);
            select_pixel(&mut selection, b);
        }
        _ => draw_polygon_mut(&mut selection, &poly, Luma([SELECTED])),
    }
    selection
}

fn select_pixel(selection: &mut GrayImage, p: Point<i32>) {
    let (w, h) = selection.dimensions();
    if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
        selection.put_pixel(p.x as u32, p.y as u32, Luma([SELECTED]));
    }
}

/// Write `label` into every pixel of `mask` that is selected. Returns the
/// number of pixels covered.
pub fn apply_selection(mask: &mut GrayImage, selection: &GrayImage, label: u8) -> usize {
    let mut covered = 0;
    for (m, s) in mask.pixels_mut().zip(selection.pixels()) {
        if s.0[0] == SELECTED {
            m.0[0] = label;
            covered += 1;
        }
    }
    covered
}
