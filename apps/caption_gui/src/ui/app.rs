use std::time::Duration;

use arboard::Clipboard;
use client_core::{MessageSlot, SubmitOutcome, UploadController};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::RequestState;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::preview::{is_image_filename, EguiPreviewHost, PickedImage, IMAGE_EXTENSIONS};

pub const APP_TITLE: &str = "Image Caption Generator";
const PREVIEW_BOX: f32 = 224.0;
const CAPTION_GREEN: egui::Color32 = egui::Color32::from_rgb(22, 101, 52);
const CAPTION_GREEN_BG: egui::Color32 = egui::Color32::from_rgb(240, 253, 244);
const ERROR_RED: egui::Color32 = egui::Color32::from_rgb(153, 27, 27);
const ERROR_RED_BG: egui::Color32 = egui::Color32::from_rgb(254, 242, 242);

pub fn trigger_label(state: RequestState) -> &'static str {
    if state.is_submitting() {
        "Generating..."
    } else {
        "Generate Caption"
    }
}

pub struct CaptionApp {
    controller: UploadController<EguiPreviewHost>,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    status: String,
}

impl CaptionApp {
    pub fn new(ctx: &egui::Context, cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            controller: UploadController::new(EguiPreviewHost::new(ctx.clone())),
            cmd_tx,
            ui_rx,
            status: String::new(),
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => {
                    self.status = message;
                }
                UiEvent::Error(err) => {
                    tracing::warn!(category = ?err.category(), context = ?err.context(), "{}", err.status_line());
                    self.status = err.status_line();
                }
                UiEvent::CaptionFinished { seq, result } => {
                    self.controller.complete(seq, result);
                }
            }
        }
    }

    fn select_image(&mut self, picked: PickedImage) {
        if let Err(err) = self.controller.select_file(Some(&picked)) {
            let err = UiError::from_message(UiErrorContext::Selection, format!("{err:#}"));
            tracing::warn!("{}", err.status_line());
            self.status = err.status_line();
        }
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.first() else {
            return;
        };
        let Some(picked) = PickedImage::from_dropped(file) else {
            return;
        };

        let name = picked.display_name();
        if !is_image_filename(&name) {
            let err =
                UiError::from_message(UiErrorContext::Selection, format!("{name} is not an image"));
            self.status = err.status_line();
            return;
        }
        self.select_image(picked);
    }

    fn submit(&mut self) {
        let SubmitOutcome::Dispatched(job) = self.controller.submit() else {
            return;
        };
        let seq = job.seq;
        if let Err(err) = dispatch_backend_command(&self.cmd_tx, job.into(), &mut self.status) {
            self.controller.complete(seq, Err(err));
        }
    }

    fn copy_caption_to_clipboard(&mut self) {
        let Some(caption) = self.controller.caption() else {
            return;
        };
        match Clipboard::new().and_then(|mut clipboard| clipboard.set_text(caption.to_string())) {
            Ok(()) => self.status = "Copied caption to clipboard".to_string(),
            Err(err) => self.status = format!("Failed to copy caption: {err}"),
        }
    }

    fn show_upload_area(&self, ui: &mut egui::Ui, dragging: bool) -> Option<PickedImage> {
        let stroke_color = if dragging {
            ui.visuals().selection.stroke.color
        } else {
            ui.visuals().widgets.noninteractive.bg_stroke.color
        };
        let mut picked = None;

        egui::Frame::NONE
            .fill(ui.visuals().faint_bg_color)
            .stroke(egui::Stroke::new(2.0, stroke_color))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(16, 16))
            .show(ui, |ui| {
                ui.set_min_height(PREVIEW_BOX + 40.0);
                ui.vertical_centered(|ui| {
                    match (self.controller.preview(), self.controller.selected_file()) {
                        (Some(preview), _) => {
                            ui.add(egui::Image::new((
                                preview.texture.id(),
                                preview.fitted_size(PREVIEW_BOX),
                            )));
                        }
                        (None, Some(file)) => {
                            ui.add_space(PREVIEW_BOX / 2.0 - 10.0);
                            ui.weak(format!("{} (preview unavailable)", file.name));
                            ui.add_space(PREVIEW_BOX / 2.0 - 10.0);
                        }
                        (None, None) => {
                            ui.add_space(PREVIEW_BOX / 2.0 - 20.0);
                            ui.label(egui::RichText::new("🖼").size(40.0).weak());
                            ui.weak("Click or drag to upload an image");
                            ui.add_space(PREVIEW_BOX / 2.0 - 20.0);
                        }
                    }
                    ui.add_space(8.0);
                    if ui.button("Choose image…").clicked() {
                        picked = rfd::FileDialog::new()
                            .add_filter("Images", IMAGE_EXTENSIONS)
                            .pick_file()
                            .map(PickedImage::Path);
                    }
                });
            });

        picked
    }

    fn show_trigger(&mut self, ui: &mut egui::Ui) {
        let state = self.controller.state();
        let spinner_room = if state.is_submitting() { 28.0 } else { 0.0 };
        let button = egui::Button::new(egui::RichText::new(trigger_label(state)).strong())
            .min_size(egui::vec2(ui.available_width() - spinner_room, 34.0));

        ui.horizontal(|ui| {
            let clicked = ui.add_enabled(self.controller.can_submit(), button).clicked();
            if state.is_submitting() {
                ui.add(egui::Spinner::new());
            }
            if clicked {
                self.submit();
            }
        });
    }

    fn show_message(&mut self, ui: &mut egui::Ui) {
        let mut copy_requested = false;
        let (fill, color, heading, text) = match self.controller.message() {
            MessageSlot::Empty => return,
            MessageSlot::Caption(caption) => {
                (CAPTION_GREEN_BG, CAPTION_GREEN, "Generated Caption:", caption.to_string())
            }
            MessageSlot::Error(message) => (ERROR_RED_BG, ERROR_RED, "Error:", message.to_string()),
        };
        let is_caption = self.controller.caption().is_some();

        egui::Frame::NONE
            .fill(fill)
            .corner_radius(6.0)
            .inner_margin(egui::Margin::symmetric(14, 12))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal_wrapped(|ui| {
                    ui.label(egui::RichText::new(heading).strong().color(color));
                    ui.label(egui::RichText::new(text).color(color));
                });
                if is_caption && ui.small_button("Copy caption").clicked() {
                    copy_requested = true;
                }
            });

        if copy_requested {
            self.copy_caption_to_clipboard();
        }
    }
}

impl eframe::App for CaptionApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_dropped_files(ctx);
        let dragging = ctx.input(|i| !i.raw.hovered_files.is_empty());

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(egui::RichText::new(&self.status).weak());
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.set_max_width(480.0);
                ui.add_space(12.0);
                ui.heading(APP_TITLE);
                ui.add_space(16.0);

                if let Some(picked) = self.show_upload_area(ui, dragging) {
                    self.select_image(picked);
                }
                ui.add_space(12.0);
                self.show_trigger(ui);
                ui.add_space(12.0);
                self.show_message(ui);
            });
        });

        ctx.request_repaint_after(Duration::from_millis(100));
    }
}
