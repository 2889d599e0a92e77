//! The annotation session: everything one window edits, owned in one place.

use std::path::Path;

use eframe::egui::{Pos2, Vec2};
use image::RgbImage;

use crate::config::{AnnotatorConfig, BlendWeights};
use crate::error::{AnnotateError, Result};
use crate::history::History;
use crate::labels::LabelMap;
use crate::overlay;
use crate::polygon::{self, PolygonAnnotator};
use crate::store::{ImageStore, SaveOutcome};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// No image loaded, or not enough points to close
    Ignored,
    Added,
    /// Polygon was closed and written into the mask
    Committed { pixels: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoOutcome {
    Restored,
    Empty,
}

pub struct Session {
    labels: LabelMap,
    store: ImageStore,
    history: History,
    polygon: PolygonAnnotator,
    active_label: u8,
    grayscale: bool,
    blend: BlendWeights,
    /// Bumped whenever the rendered frame would change
    revision: u64,
}

impl Session {
    pub fn new(config: &AnnotatorConfig) -> Result<Self> {
        let labels = config.validate()?;
        let [w, h] = config.working_size;
        Ok(Self {
            labels,
            store: ImageStore::new((w, h)),
            history: History::new(config.history_depth),
            polygon: PolygonAnnotator::new(config.close_threshold),
            active_label: config.default_label,
            grayscale: false,
            blend: config.blend,
            revision: 0,
        })
    }

    pub fn labels(&self) -> &LabelMap {
        &self.labels
    }

    pub fn polygon_points(&self) -> &[Pos2] {
        self.polygon.points()
    }

    pub fn active_label(&self) -> u8 {
        self.active_label
    }

    pub fn grayscale(&self) -> bool {
        self.grayscale
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ── Image store ─────────────────────────────────────────────────────

    pub fn load_image(&mut self, path: &Path) -> Result<()> {
        self.store.load_image(path)?;
        self.polygon.cancel();
        self.touch();
        Ok(())
    }

    pub fn load_label_mask(&mut self, path: &Path) -> Result<()> {
        self.store.load_label_mask(path, &self.labels)?;
        self.touch();
        Ok(())
    }

    pub fn save_mask(&self, destination: Option<&Path>) -> Result<SaveOutcome> {
        self.store.save_mask(destination)
    }

    // ── Display state ───────────────────────────────────────────────────

    pub fn set_active_label(&mut self, id: u8) -> Result<()> {
        if !self.labels.contains(id) {
            return Err(AnnotateError::UnknownLabel { id });
        }
        self.active_label = id;
        Ok(())
    }

    pub fn toggle_grayscale(&mut self) -> bool {
        self.grayscale = !self.grayscale;
        self.touch();
        self.grayscale
    }

    /// Composite of source and overlay at working resolution.
    pub fn render(&self) -> Option<RgbImage> {
        let source = self.store.source()?;
        let mask = self.store.mask()?;
        Some(overlay::compose(
            source,
            mask,
            &self.labels,
            self.grayscale,
            self.blend,
        ))
    }

    // ── Polygon annotator ───────────────────────────────────────────────

    /// Left click at `pos` (canvas coordinates) on a canvas of size `canvas`.
    pub fn click(&mut self, pos: Pos2, canvas: Vec2) -> ClickOutcome {
        if !self.is_loaded() {
            return ClickOutcome::Ignored;
        }
        if self.polygon.push(pos) {
            if let ClickOutcome::Committed { pixels } = self.close_polygon(canvas) {
                return ClickOutcome::Committed { pixels };
            }
        }
        ClickOutcome::Added
    }

    /// Close the polygon in progress and commit it at the active label.
    /// Fewer than three points is a silent no-op.
    pub fn close_polygon(&mut self, canvas: Vec2) -> ClickOutcome {
        if !self.is_loaded() {
            return ClickOutcome::Ignored;
        }
        let Some(points) = self.polygon.take_closed() else {
            log::debug!(
                "Ignoring close with {} point(s)",
                self.polygon.len()
            );
            return ClickOutcome::Ignored;
        };
        let (w, h) = self.store.working_size();
        let label = self.active_label;
        let image_points = polygon::canvas_to_image(&points, canvas, (w, h));
        let selection = polygon::rasterize(&image_points, w, h);

        let Some(mask) = self.store.mask_mut() else {
            return ClickOutcome::Ignored;
        };
        self.history.push(mask.clone());
        let pixels = polygon::apply_selection(mask, &selection, label);
        self.touch();
        log::info!(
            "Label {} ({}) assigned to polygon with points {:?}",
            label,
            self.labels.name(label),
            points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>()
        );
        ClickOutcome::Committed { pixels }
    }

    pub fn cancel_polygon(&mut self) {
        self.polygon.cancel();
    }

    pub fn undo(&mut self) -> UndoOutcome {
        match self.history.pop() {
            Some(previous) => {
                self.store.restore_mask(previous);
                self.touch();
                UndoOutcome::Restored
            }
            None => UndoOutcome::Empty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::{pos2, vec2};
    use image::{GrayImage, Rgb};

    const SIZE: u32 = 20;

    /// Session with a uniform 20x20 image shown on a 40x40 canvas, so a
    /// canvas coordinate is twice the image coordinate.
    fn session() -> Session {
        let config = AnnotatorConfig {
            working_size: [SIZE, SIZE],
            canvas_size: [2.0 * SIZE as f32, 2.0 * SIZE as f32],
            ..AnnotatorConfig::default()
        };
        let mut session = Session::new(&config).unwrap();
        session
            .store
            .set_source(RgbImage::from_pixel(SIZE, SIZE, Rgb([120, 80, 40])));
        session
    }

    fn canvas() -> Vec2 {
        vec2(2.0 * SIZE as f32, 2.0 * SIZE as f32)
    }

    fn mask(session: &Session) -> GrayImage {
        session.store.mask().unwrap().clone()
    }

    /// Square with corners given in image coordinates. Sides must be more
    /// than 5px so no corner lands inside the auto-close radius.
    fn draw_square(session: &mut Session, min: f32, max: f32) -> ClickOutcome {
        let (min, max) = (2.0 * min, 2.0 * max);
        session.click(pos2(min, min), canvas());
        session.click(pos2(max, min), canvas());
        session.click(pos2(max, max), canvas());
        session.click(pos2(min, max), canvas());
        session.close_polygon(canvas())
    }

    #[test]
    fn test_click_ignored_without_image() {
        let mut session = Session::new(&AnnotatorConfig::default()).unwrap();
        assert_eq!(
            session.click(pos2(1.0, 1.0), vec2(800.0, 600.0)),
            ClickOutcome::Ignored
        );
        assert!(session.polygon_points().is_empty());
        assert!(session.render().is_none());
    }

    #[test]
    fn test_commit_fills_polygon_only() {
        let mut session = session();
        session.set_active_label(2).unwrap();
        let outcome = draw_square(&mut session, 4.0, 12.0);
        assert!(matches!(outcome, ClickOutcome::Committed { pixels } if pixels > 0));

        let mask = mask(&session);
        for y in 0..SIZE {
            for x in 0..SIZE {
                let v = mask.get_pixel(x, y).0[0];
                if (5..=11).contains(&x) && (5..=11).contains(&y) {
                    assert_eq!(v, 2);
                }
                if !(4..=12).contains(&x) || !(4..=12).contains(&y) {
                    assert_eq!(v, 0);
                }
            }
        }
        assert!(session.polygon_points().is_empty());
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn test_auto_close_near_start() {
        let mut session = session();
        session.click(pos2(4.0, 4.0), canvas());
        session.click(pos2(30.0, 4.0), canvas());
        session.click(pos2(30.0, 30.0), canvas());
        let outcome = session.click(pos2(6.0, 6.0), canvas());
        assert!(matches!(outcome, ClickOutcome::Committed { .. }));
        assert!(session.polygon_points().is_empty());
        assert_eq!(mask(&session).get_pixel(12, 5).0[0], 1);
    }

    #[test]
    fn test_short_polygon_is_noop() {
        let mut session = session();
        let before = mask(&session);
        session.click(pos2(4.0, 4.0), canvas());
        session.click(pos2(30.0, 4.0), canvas());
        assert_eq!(session.close_polygon(canvas()), ClickOutcome::Ignored);
        assert_eq!(mask(&session), before);
        assert_eq!(session.history_len(), 0);
        assert_eq!(session.polygon_points().len(), 2);
    }

    #[test]
    fn test_triple_click_same_spot_commits_one_pixel() {
        let mut session = Session::new(&AnnotatorConfig::default()).unwrap();
        session.store.set_source(RgbImage::new(687, 687));
        let canvas = vec2(800.0, 600.0);
        assert_eq!(session.click(pos2(100.0, 100.0), canvas), ClickOutcome::Added);
        assert_eq!(session.click(pos2(100.0, 100.0), canvas), ClickOutcome::Added);
        assert_eq!(
            session.click(pos2(100.0, 100.0), canvas),
            ClickOutcome::Committed { pixels: 1 }
        );
        let mask = mask(&session);
        assert_eq!(mask.get_pixel(85, 114).0[0], 1);
        assert_eq!(session.history_len(), 1);
        assert!(session.polygon_points().is_empty());
    }

    #[test]
    fn test_two_points_near_start_keep_collecting() {
        let mut session = session();
        session.click(pos2(10.0, 10.0), canvas());
        assert_eq!(session.click(pos2(12.0, 12.0), canvas()), ClickOutcome::Added);
        assert_eq!(session.polygon_points().len(), 2);
        assert_eq!(session.history_len(), 0);
    }

    #[test]
    fn test_undo_restores_exact_bytes() {
        let mut session = session();
        draw_square(&mut session, 2.0, 8.0);
        let before = mask(&session);
        session.set_active_label(3).unwrap();
        draw_square(&mut session, 5.0, 15.0);
        assert_ne!(mask(&session), before);

        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert_eq!(mask(&session).as_raw(), before.as_raw());
        assert_eq!(session.undo(), UndoOutcome::Restored);
        assert!(mask(&session).pixels().all(|p| p.0[0] == 0));
        assert_eq!(session.undo(), UndoOutcome::Empty);
    }

    #[test]
    fn test_background_label_only_clears_region() {
        let mut session = session();
        draw_square(&mut session, 1.0, 18.0);
        session.set_active_label(0).unwrap();
        draw_square(&mut session, 5.0, 11.0);
        let mask = mask(&session);
        assert_eq!(mask.get_pixel(8, 8).0[0], 0);
        assert_eq!(mask.get_pixel(3, 3).0[0], 1);
        assert_eq!(mask.get_pixel(15, 15).0[0], 1);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let mut session = session();
        assert!(matches!(
            session.set_active_label(7),
            Err(AnnotateError::UnknownLabel { id: 7 })
        ));
        assert_eq!(session.active_label(), 1);
    }

    #[test]
    fn test_grayscale_toggle_twice_restores_render() {
        let mut session = session();
        draw_square(&mut session, 2.0, 9.0);
        let original = session.render().unwrap();
        assert!(session.toggle_grayscale());
        assert_ne!(session.render().unwrap(), original);
        assert!(!session.toggle_grayscale());
        assert_eq!(session.render().unwrap(), original);
    }

    #[test]
    fn test_cancel_discards_points() {
        let mut session = session();
        session.click(pos2(4.0, 4.0), canvas());
        session.click(pos2(30.0, 4.0), canvas());
        session.cancel_polygon();
        assert!(session.polygon_points().is_empty());
        assert_eq!(session.close_polygon(canvas()), ClickOutcome::Ignored);
    }

    #[test]
    fn test_history_cap_respected() {
        let config = AnnotatorConfig {
            working_size: [SIZE, SIZE],
            history_depth: Some(1),
            ..AnnotatorConfig::default()
        };
        let mut session = Session::new(&config).unwrap();
        session.store.set_source(RgbImage::new(SIZE, SIZE));
        draw_square(&mut session, 1.0, 7.0);
        draw_square(&mut session, 8.0, 14.0);
        assert_eq!(session.history_len(), 1);
    }

    #[test]
    fn test_revision_bumps_on_commit() {
        let mut session = session();
        let rev = session.revision();
        draw_square(&mut session, 2.0, 9.0);
        assert!(session.revision() > rev);
    }
}
