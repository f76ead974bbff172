use std::time::Instant;

use egui::{Color32, Context, RichText, ScrollArea, TextEdit, Ui};

use crate::analysis::{AnalysisPhase, ScanPipeline};
use crate::anatomy::markers::MARKERS;
use crate::report::STARTER_QUESTIONS;
use crate::ui::state::{ChatMessage, Notice, NoticeKind, UiState, ViewMode, ViewState};
use crate::ui::theme::*;

pub struct UiActions {
    pub browse_for_scan: bool,
    pub upload_path: Option<String>,
    pub remove_scan: bool,
    pub toggle_fullscreen: bool,
}

impl Default for UiActions {
    fn default() -> Self {
        Self {
            browse_for_scan: false,
            upload_path: None,
            remove_scan: false,
            toggle_fullscreen: false,
        }
    }
}

pub fn draw_side_panel(
    ctx: &Context,
    state: &mut UiState,
    pipeline: &ScanPipeline,
    last_error: &Option<String>,
) -> UiActions {
    let mut actions = UiActions::default();

    egui::SidePanel::right("control_panel")
        .min_width(340.0)
        .max_width(420.0)
        .default_width(360.0)
        .frame(egui::Frame::default().fill(BG_PANEL).inner_margin(16.0))
        .show(ctx, |ui| {
            ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("NeuroInsight").strong());
                ui.add_space(4.0);
                ui.label(
                    RichText::new("AI-Powered Brain MRI Analysis")
                        .color(TEXT_MUTED)
                        .size(11.0),
                );
                ui.add_space(16.0);

                section_header(ui, "MRI SCAN UPLOAD");
                if let Some(scan) = pipeline.scan() {
                    egui::Frame::default()
                        .fill(BG_WIDGET)
                        .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
                        .rounding(6.0)
                        .inner_margin(10.0)
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.vertical(|ui| {
                                    ui.label(RichText::new(&scan.name).color(TEXT_BRIGHT).strong());
                                    ui.label(RichText::new(&scan.kind).color(TEXT_MUTED).size(10.0));
                                });
                                ui.with_layout(
                                    egui::Layout::right_to_left(egui::Align::Center),
                                    |ui| {
                                        if ui.button("Remove").clicked() {
                                            actions.remove_scan = true;
                                        }
                                    },
                                );
                            });
                        });
                } else {
                    ui.add(
                        TextEdit::singleline(&mut state.path_input)
                            .hint_text("Path to a scan image...")
                            .desired_width(f32::INFINITY),
                    );
                    ui.add_space(4.0);
                    ui.horizontal(|ui| {
                        if ui
                            .add(
                                egui::Button::new(RichText::new("Load").color(BG_DEEP))
                                    .fill(ACCENT_BLUE)
                                    .min_size(egui::vec2(80.0, 28.0)),
                            )
                            .clicked()
                            && !state.path_input.trim().is_empty()
                        {
                            actions.upload_path = Some(state.path_input.trim().to_string());
                        }
                        if ui.button("Browse...").clicked() {
                            actions.browse_for_scan = true;
                        }
                    });
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new("Supports: JPEG, PNG, DICOM formats")
                            .color(TEXT_MUTED)
                            .size(10.0),
                    );
                    ui.label(
                        RichText::new("For best results, upload high-quality MRI scans")
                            .color(TEXT_MUTED)
                            .size(10.0)
                            .italics(),
                    );
                }
                if let Some(notice) = &state.upload_notice {
                    ui.add_space(6.0);
                    notice_frame(ui, notice);
                }
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "HEAD MODEL");
                let mut changed = false;
                ui.horizontal(|ui| {
                    ui.label("Radius:");
                    changed |= ui
                        .add(egui::Slider::new(&mut state.radius, 0.5..=4.0))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Resolution:");
                    changed |= ui
                        .add(egui::Slider::new(&mut state.resolution, 32..=256))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Fold freq:");
                    changed |= ui
                        .add(egui::Slider::new(&mut state.fold_frequency, 0.0..=8.0))
                        .changed();
                });
                ui.horizontal(|ui| {
                    ui.label("Fold amp:");
                    changed |= ui
                        .add(egui::Slider::new(&mut state.fold_amplitude, 0.0..=0.5))
                        .changed();
                });
                if changed {
                    state.needs_rebuild = true;
                }
                if !state.synthesis_summary.is_empty() {
                    ui.add_space(4.0);
                    ui.label(
                        RichText::new(&state.synthesis_summary)
                            .color(TEXT_MUTED)
                            .size(11.0),
                    );
                }
                if let Some(err) = &state.synthesis_error {
                    ui.add_space(6.0);
                    error_frame(ui, err);
                }
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "ANALYSIS");
                match pipeline.phase() {
                    AnalysisPhase::Idle => {
                        ui.label(RichText::new("No scan loaded").color(TEXT_MUTED));
                    }
                    AnalysisPhase::Processing => {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(
                                RichText::new("Processing MRI scan...").color(ACCENT_BLUE),
                            );
                        });
                    }
                    AnalysisPhase::Resolved => match pipeline.abnormality_detected() {
                        Some(true) => {
                            ui.label(
                                RichText::new("Abnormality Detected")
                                    .color(ACCENT_RED)
                                    .strong(),
                            );
                            ui.label(
                                RichText::new("Potential anomaly identified in brain scan")
                                    .color(TEXT_MUTED)
                                    .size(11.0),
                            );
                        }
                        _ => {
                            ui.label(
                                RichText::new("Analysis Complete").color(ACCENT_GREEN).strong(),
                            );
                            ui.label(
                                RichText::new("No abnormalities detected in scan")
                                    .color(TEXT_MUTED)
                                    .size(11.0),
                            );
                        }
                    },
                }
                if let Some(notice) = &state.analysis_notice {
                    ui.add_space(6.0);
                    notice_frame(ui, notice);
                }
                if let Some(err) = last_error {
                    ui.add_space(6.0);
                    error_frame(ui, err);
                }
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "AI-GENERATED REPORT");
                ui.add(
                    TextEdit::multiline(&mut state.report_text)
                        .font(egui::FontId::new(12.0, egui::FontFamily::Monospace))
                        .desired_width(f32::INFINITY)
                        .desired_rows(10)
                        .hint_text("Generated report will appear here...")
                        .text_color(TEXT_PRIMARY),
                );
                ui.add_space(8.0);
                let generating = state.report_pending.is_some();
                let (btn_text, btn_fill, btn_color) = if generating {
                    ("Generating...", BG_WIDGET, ACCENT_BLUE)
                } else {
                    ("Generate Report", ACCENT_BLUE, BG_DEEP)
                };
                if ui
                    .add_enabled(
                        pipeline.has_scan() && !generating,
                        egui::Button::new(RichText::new(btn_text).color(btn_color))
                            .fill(btn_fill)
                            .min_size(egui::vec2(ui.available_width(), 32.0)),
                    )
                    .clicked()
                {
                    let verdict = pipeline.abnormality_detected().unwrap_or(false);
                    state.report_pending = Some((Instant::now(), verdict));
                }
                ui.add_space(4.0);
                let has_report = !state.report_text.is_empty();
                if ui.add_enabled(has_report, egui::Button::new("Copy")).clicked() {
                    ui.ctx().copy_text(state.report_text.clone());
                    state.analysis_notice = Some(Notice::new(
                        "Report copied to your clipboard",
                        NoticeKind::Success,
                    ));
                }
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "VISUAL Q&A");
                egui::Frame::default()
                    .fill(BG_DEEP)
                    .stroke(egui::Stroke::new(1.0, BORDER_SUBTLE))
                    .rounding(6.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        ScrollArea::vertical()
                            .id_salt("qa_log")
                            .max_height(180.0)
                            .stick_to_bottom(true)
                            .show(ui, |ui| {
                                ui.set_min_width(ui.available_width());
                                if state.qa_log.is_empty() {
                                    ui.add_space(8.0);
                                    ui.vertical_centered(|ui| {
                                        ui.label(
                                            RichText::new("Ask questions about the MRI scan")
                                                .color(TEXT_MUTED),
                                        );
                                    });
                                    ui.add_space(8.0);
                                    for question in STARTER_QUESTIONS {
                                        if ui
                                            .add(
                                                egui::Button::new(
                                                    RichText::new(*question).size(11.0),
                                                )
                                                .min_size(egui::vec2(ui.available_width(), 24.0)),
                                            )
                                            .clicked()
                                        {
                                            state.qa_input = (*question).to_string();
                                        }
                                    }
                                } else {
                                    for message in &state.qa_log {
                                        chat_bubble(ui, message);
                                        ui.add_space(4.0);
                                    }
                                }
                                if state.qa_pending.is_some() {
                                    ui.horizontal(|ui| {
                                        ui.spinner();
                                        ui.label(
                                            RichText::new("AI thinking...")
                                                .color(TEXT_MUTED)
                                                .size(11.0),
                                        );
                                    });
                                }
                            });
                    });
                ui.add_space(6.0);
                let can_ask = pipeline.has_scan() && state.qa_pending.is_none();
                let mut submit = false;
                ui.horizontal(|ui| {
                    let response = ui.add_enabled(
                        can_ask,
                        TextEdit::singleline(&mut state.qa_input)
                            .hint_text("Ask about the MRI scan...")
                            .desired_width(ui.available_width() - 60.0),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        submit = true;
                    }
                    if ui
                        .add_enabled(
                            can_ask && !state.qa_input.trim().is_empty(),
                            egui::Button::new("Send"),
                        )
                        .clicked()
                    {
                        submit = true;
                    }
                });
                if submit && can_ask {
                    let question = state.qa_input.trim().to_string();
                    if !question.is_empty() {
                        state.qa_log.push(ChatMessage {
                            from_user: true,
                            text: question.clone(),
                        });
                        state.qa_pending = Some((Instant::now(), question));
                        state.qa_input.clear();
                    }
                }
                ui.add_space(16.0);
                ui.separator();
                ui.add_space(12.0);

                section_header(ui, "DISPLAY");
                ui.checkbox(&mut state.vsync_enabled, "VSync");
                ui.label(
                    RichText::new("F11 toggles fullscreen")
                        .color(TEXT_MUTED)
                        .size(10.0),
                );
            });
        });

    actions
}

pub fn draw_viewer_chrome(
    ctx: &Context,
    view: &mut ViewState,
    pipeline: &ScanPipeline,
    slice_texture: Option<&egui::TextureHandle>,
    actions: &mut UiActions,
) {
    egui::Area::new(egui::Id::new("viewer_tabs"))
        .anchor(egui::Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
        .show(ctx, |ui| {
            egui::Frame::default()
                .fill(Color32::from_black_alpha(180))
                .rounding(6.0)
                .inner_margin(8.0)
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        for mode in ViewMode::ALL {
                            if ui
                                .selectable_label(view.mode == mode, mode.label())
                                .clicked()
                            {
                                view.select_mode(mode);
                            }
                        }
                        ui.separator();
                        let label = if view.fullscreen {
                            "Exit Fullscreen"
                        } else {
                            "Fullscreen"
                        };
                        if ui.button(label).clicked() {
                            actions.toggle_fullscreen = true;
                        }
                    });
                });
        });

    if pipeline.is_processing() {
        egui::Area::new(egui::Id::new("processing_banner"))
            .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(-180.0, -24.0))
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(Color32::from_black_alpha(200))
                    .stroke(egui::Stroke::new(1.0, BORDER_ACCENT))
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.vertical(|ui| {
                                ui.label(
                                    RichText::new("Processing MRI scan...")
                                        .color(TEXT_BRIGHT)
                                        .strong(),
                                );
                                ui.label(
                                    RichText::new(
                                        "Converting to 3D model and analyzing results",
                                    )
                                    .color(TEXT_MUTED)
                                    .size(11.0),
                                );
                            });
                        });
                    });
            });
    }

    if view.mode == ViewMode::ThreeD && pipeline.abnormality_detected() == Some(true) {
        egui::Area::new(egui::Id::new("abnormality_legend"))
            .anchor(egui::Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
            .show(ctx, |ui| {
                egui::Frame::default()
                    .fill(Color32::from_rgba_premultiplied(60, 12, 16, 210))
                    .stroke(egui::Stroke::new(1.0, ACCENT_RED))
                    .rounding(6.0)
                    .inner_margin(10.0)
                    .show(ui, |ui| {
                        ui.label(
                            RichText::new("Abnormalities Detected")
                                .color(TEXT_BRIGHT)
                                .strong(),
                        );
                        ui.add_space(4.0);
                        for marker in MARKERS {
                            ui.horizontal(|ui| {
                                let color = Color32::from_rgb(
                                    (marker.color[0] * 255.0) as u8,
                                    (marker.color[1] * 255.0) as u8,
                                    (marker.color[2] * 255.0) as u8,
                                );
                                let (rect, _) = ui.allocate_exact_size(
                                    egui::vec2(10.0, 10.0),
                                    egui::Sense::hover(),
                                );
                                ui.painter().circle_filled(rect.center(), 4.0, color);
                                ui.label(
                                    RichText::new(marker.kind.label())
                                        .color(TEXT_PRIMARY)
                                        .size(11.0),
                                );
                            });
                        }
                    });
            });
    }

    if view.mode != ViewMode::ThreeD {
        egui::Area::new(egui::Id::new("slice_view"))
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(-180.0, 0.0))
            .show(ctx, |ui| match view.mode {
                ViewMode::Axial => {
                    ui.vertical_centered(|ui| {
                        ui.label(RichText::new("Axial View").color(TEXT_MUTED));
                        ui.add_space(8.0);
                        if let Some(texture) = slice_texture {
                            ui.add(
                                egui::Image::new(texture)
                                    .max_size(egui::vec2(384.0, 384.0))
                                    .rounding(6.0),
                            );
                        } else if pipeline.has_scan() {
                            ui.label(
                                RichText::new("Decoding slice preview...")
                                    .color(TEXT_MUTED)
                                    .italics(),
                            );
                        } else {
                            ui.label(
                                RichText::new("Upload an MRI scan to see this view")
                                    .color(TEXT_MUTED)
                                    .italics(),
                            );
                        }
                    });
                }
                ViewMode::Coronal => {
                    ui.label(
                        RichText::new("Coronal view would be displayed here").color(TEXT_MUTED),
                    );
                }
                ViewMode::Sagittal => {
                    ui.label(
                        RichText::new("Sagittal view would be displayed here").color(TEXT_MUTED),
                    );
                }
                ViewMode::ThreeD => {}
            });
    }
}

fn section_header(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).color(TEXT_MUTED).size(11.0).strong());
    ui.add_space(4.0);
}

fn notice_frame(ui: &mut Ui, notice: &Notice) {
    let (fill, stroke) = match notice.kind {
        NoticeKind::Info => (Color32::from_rgb(14, 24, 44), ACCENT_BLUE),
        NoticeKind::Success => (Color32::from_rgb(12, 35, 24), ACCENT_GREEN),
        NoticeKind::Error => (Color32::from_rgb(40, 15, 18), ACCENT_RED),
    };
    egui::Frame::default()
        .fill(fill)
        .stroke(egui::Stroke::new(1.0, stroke))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(&notice.text).color(stroke).size(11.0));
        });
}

fn error_frame(ui: &mut Ui, text: &str) {
    egui::Frame::default()
        .fill(Color32::from_rgb(40, 15, 18))
        .stroke(egui::Stroke::new(1.0, ACCENT_RED))
        .rounding(4.0)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(text).color(ACCENT_RED).size(11.0));
        });
}

fn chat_bubble(ui: &mut Ui, message: &ChatMessage) {
    let (align, fill) = if message.from_user {
        (egui::Align::Max, ACCENT_BLUE.gamma_multiply(0.35))
    } else {
        (egui::Align::Min, BG_WIDGET)
    };
    ui.with_layout(egui::Layout::top_down(align), |ui| {
        let width = ui.available_width() * 0.8;
        egui::Frame::default()
            .fill(fill)
            .rounding(8.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.set_max_width(width);
                ui.label(RichText::new(&message.text).color(TEXT_BRIGHT).size(12.0));
            });
    });
}
