use eframe::egui;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use crate::error::AnnotateError;
use crate::overlay;
use crate::session::{ClickOutcome, Session, UndoOutcome};
use crate::store::SaveOutcome;

const MARKER_COLOR: egui::Color32 = egui::Color32::RED;
const DIGIT_KEYS: [egui::Key; 10] = [
    egui::Key::Num0,
    egui::Key::Num1,
    egui::Key::Num2,
    egui::Key::Num3,
    egui::Key::Num4,
    egui::Key::Num5,
    egui::Key::Num6,
    egui::Key::Num7,
    egui::Key::Num8,
    egui::Key::Num9,
];

// ── Message boxes ───────────────────────────────────────────────────────────

fn show_message(level: MessageLevel, title: &str, text: &str) {
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(text)
        .set_buttons(MessageButtons::Ok)
        .show();
}

fn report_error(action: &str, err: &AnnotateError) {
    log::error!("Error while {action}: {err}");
    show_message(
        MessageLevel::Error,
        "Error",
        &format!("An error occurred while {action}: {err}"),
    );
}

fn report_warning(text: &str) {
    log::warn!("{text}");
    show_message(MessageLevel::Warning, "Warning", text);
}

// ── App ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Shortcuts {
    undo: bool,
    save: bool,
    cancel: bool,
    label: Option<u8>,
}

pub struct LabelingApp {
    session: Session,
    canvas_size: egui::Vec2,
    texture: Option<egui::TextureHandle>,
    /// Session revision the texture was built from
    texture_revision: Option<u64>,
}

impl LabelingApp {
    pub fn new(session: Session, canvas_size: [f32; 2]) -> Self {
        Self {
            session,
            canvas_size: egui::vec2(canvas_size[0], canvas_size[1]),
            texture: None,
            texture_revision: None,
        }
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture_revision == Some(self.session.revision()) {
            return;
        }
        self.texture_revision = Some(self.session.revision());
        let Some(frame) = self.session.render() else {
            self.texture = None;
            return;
        };
        let display = overlay::fit_to_canvas(
            &frame,
            [self.canvas_size.x as u32, self.canvas_size.y as u32],
        );
        let size = [display.width() as usize, display.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, display.as_raw());
        match &mut self.texture {
            Some(tex) => tex.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("annotation", color_image, egui::TextureOptions::LINEAR));
            }
        }
        log::debug!("Canvas texture rebuilt (revision {})", self.session.revision());
    }

    // ── Button actions ──────────────────────────────────────────────────

    fn load_image(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Image Files", &["jpg", "jpeg", "png", "bmp"])
            .pick_file()
        else {
            return;
        };
        log::info!("Selected image path: {}", path.display());
        match self.session.load_image(&path) {
            Ok(()) => log::info!("Image loaded successfully."),
            Err(e) => report_error("loading the image", &e),
        }
    }

    fn load_label_image(&mut self) {
        let Some(path) = FileDialog::new().add_filter("Image Files", &["png"]).pick_file() else {
            return;
        };
        log::info!("Selected label image path: {}", path.display());
        match self.session.load_label_mask(&path) {
            Ok(()) => log::info!("Label image loaded successfully."),
            Err(e) => report_error("loading the label image", &e),
        }
    }

    fn toggle_grayscale(&mut self) {
        let on = self.session.toggle_grayscale();
        log::info!("Grayscale mode {}.", if on { "enabled" } else { "disabled" });
    }

    fn select_label(&mut self, id: u8) {
        if id == self.session.active_label() {
            return;
        }
        match self.session.set_active_label(id) {
            Ok(()) => log::info!(
                "Switched to label {}: {}",
                id,
                self.session.labels().name(id)
            ),
            Err(e) => report_error("updating the label", &e),
        }
    }

    fn back(&mut self) {
        match self.session.undo() {
            UndoOutcome::Restored => log::info!("Reverted to previous label state."),
            UndoOutcome::Empty => report_warning("No history to revert to."),
        }
    }

    fn save_annotation(&mut self) {
        if !self.session.is_loaded() {
            report_warning("Nothing to save: no image loaded.");
            return;
        }
        let destination = FileDialog::new()
            .add_filter("PNG files", &["png"])
            .set_file_name("mask.png")
            .save_file();
        match self.session.save_mask(destination.as_deref()) {
            Ok(SaveOutcome::Saved(path)) => {
                let text = format!("Annotation saved successfully at {}.", path.display());
                log::info!("{text}");
                show_message(MessageLevel::Info, "Success", &text);
            }
            Ok(SaveOutcome::Cancelled) => report_warning("Annotation save canceled."),
            Err(e) => report_error("saving the annotation", &e),
        }
    }

    fn quit(&self, ctx: &egui::Context) {
        log::info!("Quitting the application.");
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    // ── Canvas ──────────────────────────────────────────────────────────

    fn draw_polygon_in_progress(
        &self,
        painter: &egui::Painter,
        origin: egui::Pos2,
        hover: Option<egui::Pos2>,
    ) {
        let points: Vec<egui::Pos2> = self
            .session
            .polygon_points()
            .iter()
            .map(|p| origin + p.to_vec2())
            .collect();
        let stroke = egui::Stroke::new(1.0, MARKER_COLOR);
        for pair in points.windows(2) {
            painter.line_segment([pair[0], pair[1]], stroke);
        }
        for p in &points {
            painter.circle_filled(*p, 2.0, MARKER_COLOR);
        }
        if let (Some(last), Some(cursor)) = (points.last(), hover) {
            painter.line_segment(
                [*last, cursor],
                egui::Stroke::new(1.0, MARKER_COLOR.gamma_multiply(0.5)),
            );
        }
    }

    fn handle_canvas_clicks(&mut self, ctx: &egui::Context, response: &egui::Response) {
        let canvas = response.rect.size();
        let outcome = if response.clicked_by(egui::PointerButton::Primary) {
            response
                .interact_pointer_pos()
                .map(|pos| self.session.click((pos - response.rect.min).to_pos2(), canvas))
        } else if response.secondary_clicked() {
            Some(self.session.close_polygon(canvas))
        } else {
            None
        };
        if let Some(ClickOutcome::Committed { pixels }) = outcome {
            log::debug!("Commit covered {pixels} pixels");
            ctx.request_repaint();
        }
    }

    fn read_shortcuts(&self, ctx: &egui::Context) -> Shortcuts {
        ctx.input(|i| {
            let mut shortcuts = Shortcuts::default();
            if i.modifiers.ctrl && i.key_pressed(egui::Key::Z) {
                shortcuts.undo = true;
            }
            if i.modifiers.ctrl && i.key_pressed(egui::Key::S) {
                shortcuts.save = true;
            }
            if i.key_pressed(egui::Key::Escape) {
                shortcuts.cancel = true;
            }
            if !i.modifiers.ctrl {
                shortcuts.label = DIGIT_KEYS
                    .iter()
                    .position(|k| i.key_pressed(*k))
                    .map(|d| d as u8);
            }
            shortcuts
        })
    }
}

// ── eframe App impl ────────────────────────────────────────────────────────

impl eframe::App for LabelingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Keyboard shortcuts
        let shortcuts = self.read_shortcuts(ctx);
        if shortcuts.undo {
            self.back();
        }
        if shortcuts.save {
            self.save_annotation();
        }
        if shortcuts.cancel {
            self.session.cancel_polygon();
        }
        if let Some(id) = shortcuts.label {
            if self.session.labels().contains(id) {
                self.select_label(id);
            }
        }

        // Top toolbar
        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Load Image").clicked() {
                    self.load_image();
                }
                if ui.button("Load Label Image").clicked() {
                    self.load_label_image();
                }
                if ui.button("Toggle Grayscale").clicked() {
                    self.toggle_grayscale();
                }
                ui.separator();

                let active = self.session.active_label();
                let mut selected = active;
                let entries: Vec<(u8, String, egui::Color32)> = self
                    .session
                    .labels()
                    .iter()
                    .map(|(id, class)| (id, class.name.clone(), class.to_egui()))
                    .collect();
                egui::ComboBox::from_label("Label")
                    .selected_text(format!("{}: {}", active, self.session.labels().name(active)))
                    .show_ui(ui, |ui| {
                        for (id, name, color) in &entries {
                            ui.horizontal(|ui| {
                                ui.colored_label(*color, "■");
                                ui.selectable_value(&mut selected, *id, format!("{id}: {name}"));
                            });
                        }
                    });
                if selected != active {
                    self.select_label(selected);
                }
                ui.separator();

                if ui.button("Back").clicked() {
                    self.back();
                }
                if ui.button("Save Annotation").clicked() {
                    self.save_annotation();
                }
                if ui.button("Quit").clicked() {
                    self.quit(ctx);
                }
            });
        });

        // Status line
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let active = self.session.active_label();
                ui.label(format!(
                    "Label {}: {}",
                    active,
                    self.session.labels().name(active)
                ));
                ui.separator();
                ui.label(format!("Points: {}", self.session.polygon_points().len()));
                ui.separator();
                ui.label(format!("History: {}", self.session.history_len()));
                if self.session.grayscale() {
                    ui.separator();
                    ui.label("Grayscale");
                }
            });
        });

        self.ensure_texture(ctx);

        // Canvas
        egui::CentralPanel::default().show(ctx, |ui| {
            let (response, painter) = ui.allocate_painter(self.canvas_size, egui::Sense::click());
            let canvas_rect = response.rect;

            painter.rect_filled(canvas_rect, 0.0, egui::Color32::WHITE);

            if let Some(ref tex) = self.texture {
                painter.image(
                    tex.id(),
                    canvas_rect,
                    egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    egui::Color32::WHITE,
                );
            }

            self.draw_polygon_in_progress(&painter, canvas_rect.min, response.hover_pos());

            if self.session.is_loaded() {
                self.handle_canvas_clicks(ctx, &response);
            }
        });
    }
}
