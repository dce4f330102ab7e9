//! Framecut GUI Application
//!
//! Shows a scan with its detected frame boxes and lets the operator correct
//! them before the crops are written. Enter (or closing the window) saves,
//! Escape discards the edits.

use eframe::egui;
use flexi_logger::{Logger, LoggerHandle};
use framecut_core::config::{load_config, log_config_usage};
use framecut_core::session::{fit_scale, Corner, EditState};
use framecut_core::{
    detect_frames, extract_boxes, load_image, CalibrationSource, DecodedImage, DetectionConfig,
    DirectorySink, EditSession, FrameError, InputEvent, Profile, Rect, SessionOutcome,
};
use image::imageops::FilterType;
use std::path::PathBuf;

mod input;

use input::{translate, EventQueue, FrameInput};

/// Larger scans are downsampled for display only.
const MAX_TEXTURE_SIDE: u32 = 4096;
const DEFAULT_OUTPUT_DIR: &str = "processed_frames";

const BOX_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 220, 0);
const SELECTED_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 200, 0);
const SAVED_COLOR: egui::Color32 = egui::Color32::from_rgb(120, 120, 120);

fn init_logging() -> Result<LoggerHandle, String> {
    Logger::try_with_env_or_str("info")
        .map_err(|e| format!("Invalid log specification: {}", e))?
        .log_to_stderr()
        .start()
        .map_err(|e| format!("Logger initialization failed: {}", e))
}

fn main() -> Result<(), eframe::Error> {
    let _logger = match init_logging() {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Warning: {}", e);
            None
        }
    };

    let handle = load_config(None);
    log_config_usage(&handle);
    let initial_path = std::env::args_os().nth(1).map(PathBuf::from);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_title("Framecut - Film Frame Extractor"),
        ..Default::default()
    };

    eframe::run_native(
        "Framecut",
        options,
        Box::new(move |_cc| {
            let mut app = FramecutApp::new(handle.config);
            if let Some(path) = initial_path {
                app.load_image(path);
            }
            Ok(Box::new(app))
        }),
    )
}

struct FramecutApp {
    config: DetectionConfig,
    output_dir: PathBuf,

    // Image data
    scan: Option<DecodedImage>,
    texture: Option<egui::TextureHandle>,

    // Editing
    session: Option<EditSession>,
    events: EventQueue,
    saved_boxes: Vec<Rect>,

    // UI state
    status: String,
    error_message: Option<String>,
}

impl FramecutApp {
    fn new(config: DetectionConfig) -> Self {
        Self {
            config,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            scan: None,
            texture: None,
            session: None,
            events: EventQueue::default(),
            saved_boxes: Vec::new(),
            status: "Use File > Open Image to load a scanned strip.".to_string(),
            error_message: None,
        }
    }

    fn load_image(&mut self, path: PathBuf) {
        if self.session.as_ref().is_some_and(|s| !s.is_finished()) {
            log::warn!("Discarding unsaved edits of the previous image");
        }

        match load_image(&path) {
            Ok(decoded) => {
                log::info!(
                    "Loaded {} ({}x{})",
                    path.display(),
                    decoded.width(),
                    decoded.height()
                );
                self.scan = Some(decoded);
                self.texture = None;
                self.detect();
            }
            Err(e) => {
                self.error_message = Some(format!("Failed to load image: {}", e));
            }
        }
    }

    /// Run detection on the loaded scan and start a fresh editing pass.
    fn detect(&mut self) {
        let Some(decoded) = &self.scan else {
            return;
        };

        let boxes = match detect_frames(decoded, &self.config, &CalibrationSource::Detect) {
            Ok(detection) => {
                let mut status = format!(
                    "{}: {} frame(s) detected, {} perforation(s) measured.",
                    detection.name,
                    detection.boxes.len(),
                    detection.stats.valid_count
                );
                for warning in &detection.warnings {
                    status.push_str(&format!(" Warning: {}.", warning));
                }
                self.status = status;
                detection.boxes
            }
            Err(e @ FrameError::NoRegionsDetected { .. }) => {
                self.status = format!("{}. Right-click to add boxes by hand.", e);
                Vec::new()
            }
            Err(e) => {
                self.error_message = Some(format!("Detection failed: {}", e));
                Vec::new()
            }
        };

        self.session = Some(EditSession::new(boxes, self.config.session.clone()));
        self.events.clear();
        self.saved_boxes.clear();
    }

    fn apply_event(&mut self, event: InputEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.handle(&event) {
            SessionOutcome::Continue => {}
            SessionOutcome::Committed(boxes) => self.save(boxes),
            SessionOutcome::Cancelled => {
                self.events.clear();
                self.status = "Edits discarded; nothing was saved.".to_string();
            }
        }
    }

    fn save(&mut self, boxes: Vec<Rect>) {
        self.events.clear();
        let Some(decoded) = &self.scan else {
            return;
        };

        let mut sink = DirectorySink::new(&self.output_dir, self.config.extract.format);
        let report = extract_boxes(decoded, &boxes, &self.config, &mut sink);
        self.status = format!(
            "Saved {} of {} frame(s) to {}.",
            report.saved.len(),
            boxes.len(),
            self.output_dir.display()
        );
        if !report.is_complete() {
            let failures: Vec<String> = report.failures.iter().map(|f| f.to_string()).collect();
            self.error_message = Some(failures.join("\n"));
        }
        self.saved_boxes = boxes;
    }

    fn set_profile(&mut self, profile: Profile) {
        let extract = self.config.extract.clone();
        self.config = DetectionConfig::for_profile(profile);
        self.config.extract = extract;
        log::info!("Switched to the {} profile", profile);
        self.detect();
    }

    fn show_menu(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open Image...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", framecut_core::decoders::SUPPORTED_EXTENSIONS)
                        .pick_file()
                    {
                        self.load_image(path);
                    }
                    ui.close_menu();
                }
                if ui.button("Output Folder...").clicked() {
                    if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                        self.output_dir = dir;
                    }
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });

            ui.menu_button("Profile", |ui| {
                for profile in Profile::ALL {
                    if ui.button(profile.name()).clicked() {
                        self.set_profile(profile);
                        ui.close_menu();
                    }
                }
            });

            let editing = self.session.as_ref().is_some_and(|s| !s.is_finished());
            ui.add_enabled_ui(editing, |ui| {
                if ui.button("Save Frames (Enter)").clicked() {
                    self.events.push(InputEvent::commit());
                }
                if ui.button("Discard (Esc)").clicked() {
                    self.events.push(InputEvent::cancel());
                }
            });
        });
    }

    fn show_status(&self, ui: &mut egui::Ui) {
        ui.label(&self.status);
        if let Some(session) = self.session.as_ref().filter(|s| !s.is_finished()) {
            ui.label(format!(
                "{} box(es){}. Drag a corner to resize, drag inside to move, \
                 right-click to add, double-click to remove.",
                session.boxes().len(),
                if session.is_modified() { " (edited)" } else { "" }
            ));
        }
        ui.label(format!("Output: {}", self.output_dir.display()));
    }

    fn show_scan(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let Some(decoded) = &self.scan else {
            ui.label("No image loaded.");
            return;
        };
        let image_size = (decoded.width(), decoded.height());

        if self.texture.is_none() {
            self.texture = Some(scan_texture(ctx, decoded));
        }
        let Some(texture_id) = self.texture.as_ref().map(|t| t.id()) else {
            return;
        };

        let available = ui.available_size();
        let scale = fit_scale(image_size, (available.x, available.y));
        let display_size = egui::vec2(image_size.0 as f32 * scale, image_size.1 as f32 * scale);
        let (response, painter) = ui.allocate_painter(display_size, egui::Sense::click_and_drag());
        let origin = response.rect.min;

        painter.image(
            texture_id,
            response.rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        if let Some(session) = self.session.as_mut() {
            session.set_scale(scale);
            if !session.is_finished() {
                let frame_input = ctx.input(|i| FrameInput {
                    pointer: i.pointer.latest_pos().map(|p| {
                        let offset = p - origin;
                        (offset.x, offset.y)
                    }),
                    over_image: response.hovered(),
                    moved: i.pointer.is_moving(),
                    primary_held: i.pointer.primary_down(),
                    primary_pressed: i.pointer.primary_pressed(),
                    primary_released: i.pointer.primary_released(),
                    secondary_pressed: i.pointer.button_pressed(egui::PointerButton::Secondary),
                    double_clicked: i
                        .pointer
                        .button_double_clicked(egui::PointerButton::Primary),
                    commit: i.key_pressed(egui::Key::Enter),
                    cancel: i.key_pressed(egui::Key::Escape),
                });
                let dragging = session.state() != EditState::Idle;
                self.events.extend(translate(&frame_input, dragging));
            }
        }

        // One event per frame
        if let Some(event) = self.events.pop() {
            self.apply_event(event);
        }
        if !self.events.is_empty() {
            ctx.request_repaint();
        }

        let to_screen = |x: f32, y: f32| origin + egui::vec2(x * scale, y * scale);
        match self.session.as_ref().filter(|s| !s.is_finished()) {
            Some(session) => {
                let anchor_radius = self.config.session.anchor_radius;
                for (index, rect) in session.boxes().iter().enumerate() {
                    let color = if session.selected() == Some(index) {
                        SELECTED_COLOR
                    } else {
                        BOX_COLOR
                    };
                    draw_box(&painter, rect, index, color, &to_screen);
                    for corner in Corner::ALL {
                        let p = corner.of(rect);
                        let center = to_screen(p.x, p.y);
                        painter.circle_filled(center, 4.0, color);
                        if session.selected() == Some(index) {
                            painter.circle_stroke(
                                center,
                                anchor_radius,
                                egui::Stroke::new(1.0, color),
                            );
                        }
                    }
                }
            }
            None => {
                for (index, rect) in self.saved_boxes.iter().enumerate() {
                    draw_box(&painter, rect, index, SAVED_COLOR, &to_screen);
                }
            }
        }
    }

    fn show_error(&mut self, ctx: &egui::Context) {
        let Some(error) = self.error_message.clone() else {
            return;
        };
        let mut should_close = false;
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&error);
                if ui.button("OK").clicked() {
                    should_close = true;
                }
            });
        if should_close {
            self.error_message = None;
        }
    }
}

impl eframe::App for FramecutApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Closing the window keeps the current boxes
        let editing = self.session.as_ref().is_some_and(|s| !s.is_finished());
        if editing && ctx.input(|i| i.viewport().close_requested()) {
            self.apply_event(InputEvent::commit());
        }

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            self.show_menu(ui, ctx);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.show_status(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_scan(ui, ctx);
        });

        self.show_error(ctx);
    }
}

fn scan_texture(ctx: &egui::Context, decoded: &DecodedImage) -> egui::TextureHandle {
    let preview = if decoded.width().max(decoded.height()) > MAX_TEXTURE_SIDE {
        decoded
            .image
            .resize(MAX_TEXTURE_SIDE, MAX_TEXTURE_SIDE, FilterType::Triangle)
    } else {
        decoded.image.clone()
    };
    let rgba = preview.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    ctx.load_texture("scan", color_image, egui::TextureOptions::LINEAR)
}

fn draw_box(
    painter: &egui::Painter,
    rect: &Rect,
    index: usize,
    color: egui::Color32,
    to_screen: &impl Fn(f32, f32) -> egui::Pos2,
) {
    let min = to_screen(rect.x() as f32, rect.y() as f32);
    let max = to_screen(rect.right() as f32, rect.bottom() as f32);
    painter.rect_stroke(
        egui::Rect::from_min_max(min, max),
        0.0,
        egui::Stroke::new(2.0, color),
    );
    painter.text(
        min + egui::vec2(4.0, 4.0),
        egui::Align2::LEFT_TOP,
        format!("{}", index + 1),
        egui::FontId::proportional(14.0),
        color,
    );
}
