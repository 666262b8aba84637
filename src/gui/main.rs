#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;

use exif_scramble::config::{Config, DisplayConfig};
use exif_scramble::exif::{MetadataReport, describe_file};
use exif_scramble::pipeline::{BatchSummary, CollectOptions, ProcessResult, collect_images, run_batch};
use exif_scramble::randomize::{RandomizeOptions, Randomizer};

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([1000.0, 680.0])
        .with_min_inner_size([760.0, 480.0])
        .with_drag_and_drop(true);

    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };

    eframe::run_native(
        "exif-scramble",
        options,
        Box::new(|cc| Ok(Box::new(App::new(cc)))),
    )
}

// ── Messages sent from the worker thread to the UI ──────────────────

enum BgMessage {
    /// One file finished.
    Result(ProcessResult),
    /// All files in the batch are done.
    BatchDone(BatchSummary),
}

// ── Per-image state shown in the UI ─────────────────────────────────

struct ImageEntry {
    path: PathBuf,
    /// Metadata of the input as it was when added.
    before: MetadataReport,
    result: Option<ProcessResult>,
    /// Texture handle for the preview thumbnail.
    texture: Option<egui::TextureHandle>,
    /// Set once a preview load was attempted, successful or not.
    texture_tried: bool,
}

// ── Tabs ────────────────────────────────────────────────────────────

#[derive(PartialEq, Clone, Copy)]
enum Tab {
    Randomize,
    Settings,
}

// ── Main application state ──────────────────────────────────────────

struct App {
    config: Config,
    config_path: Option<PathBuf>,
    images: Vec<ImageEntry>,
    selected: Option<usize>,
    tab: Tab,
    processing: bool,
    status: String,
    rx: mpsc::Receiver<BgMessage>,
    tx: mpsc::Sender<BgMessage>,
}

const READY: &str = "Ready — drop JPEG files or folders, or click Open";

impl App {
    fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let (tx, rx) = mpsc::channel();
        let config = Config::load(None).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {e:#}");
            Config::default()
        });

        Self {
            config,
            config_path: None,
            images: Vec::new(),
            selected: None,
            tab: Tab::Randomize,
            processing: false,
            status: READY.into(),
            rx,
            tx,
        }
    }

    fn add_paths(&mut self, paths: Vec<PathBuf>) {
        let collected = collect_images(&paths, CollectOptions::GUI);
        for path in collected {
            if self.images.iter().any(|e| e.path == path) {
                continue;
            }
            let before = describe_file(&path);
            self.images.push(ImageEntry {
                path,
                before,
                result: None,
                texture: None,
                texture_tried: false,
            });
        }
        if !self.images.is_empty() && self.selected.is_none() {
            self.selected = Some(0);
        }
        self.status = format!("{} image(s) selected", self.images.len());
    }

    fn open_files(&mut self) {
        if let Some(paths) = rfd::FileDialog::new()
            .add_filter("JPEG images", &["jpg", "jpeg", "JPG", "JPEG"])
            .pick_files()
        {
            self.add_paths(paths);
        }
    }

    fn open_folder(&mut self) {
        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
            self.add_paths(vec![dir]);
        }
    }

    fn start_processing(&mut self) {
        if self.images.is_empty() || self.processing {
            return;
        }
        if let Err(e) = self.config.validate() {
            self.status = format!("Invalid settings: {e}");
            return;
        }
        self.processing = true;
        self.status = "Randomizing...".into();

        // Clear previous results
        for entry in &mut self.images {
            entry.result = None;
        }

        let paths: Vec<PathBuf> = self.images.iter().map(|e| e.path.clone()).collect();
        let options = RandomizeOptions::from(&self.config);
        let tx = self.tx.clone();

        std::thread::spawn(move || {
            let randomizer = Randomizer::new(options);
            // The before report is already on screen.
            let display = DisplayConfig {
                before: false,
                after: true,
            };
            let summary = run_batch(&paths, &randomizer, &display, |_, result| {
                let _ = tx.send(BgMessage::Result(result.clone()));
            });
            let _ = tx.send(BgMessage::BatchDone(summary));
        });
    }

    fn poll_messages(&mut self) {
        while let Ok(msg) = self.rx.try_recv() {
            match msg {
                BgMessage::Result(result) => {
                    if let Some(entry) = self.images.iter_mut().find(|e| e.path == result.path) {
                        entry.result = Some(result);
                    }
                }
                BgMessage::BatchDone(summary) => {
                    self.processing = false;
                    let mut status = format!(
                        "Done — {} of {} succeeded",
                        summary.succeeded, summary.processed
                    );
                    if summary.failed > 0 {
                        let kinds: Vec<String> = summary
                            .by_kind
                            .iter()
                            .map(|(kind, n)| format!("{n} {kind}"))
                            .collect();
                        status.push_str(&format!(", {} failed ({})", summary.failed, kinds.join(", ")));
                    }
                    self.status = status;
                }
            }
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_messages();

        // Request repaint while processing so we pick up messages
        if self.processing {
            ctx.request_repaint();
        }

        // Handle dropped files
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw.dropped_files.iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if !dropped.is_empty() && !self.processing {
            self.add_paths(dropped);
        }

        // ── Top bar ─────────────────────────────────────────────────
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("exif-scramble");
                ui.separator();

                let main_tab = ui.selectable_label(self.tab == Tab::Randomize, "🎲 Randomize");
                let settings_tab = ui.selectable_label(self.tab == Tab::Settings, "⚙ Settings");
                if main_tab.clicked() {
                    self.tab = Tab::Randomize;
                }
                if settings_tab.clicked() {
                    self.tab = Tab::Settings;
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.processing {
                        ui.spinner();
                    }
                    ui.label(&self.status);
                });
            });
        });

        match self.tab {
            Tab::Randomize => self.show_randomize_tab(ctx),
            Tab::Settings => self.show_settings_tab(ctx),
        }
    }
}

// ── Randomize tab ───────────────────────────────────────────────────

impl App {
    fn show_randomize_tab(&mut self, ctx: &egui::Context) {
        // ── Bottom toolbar ──────────────────────────────────────────
        egui::TopBottomPanel::bottom("toolbar").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui.add_enabled(!self.processing, egui::Button::new("📂 Open Files")).clicked() {
                    self.open_files();
                }
                if ui.add_enabled(!self.processing, egui::Button::new("📁 Open Folder")).clicked() {
                    self.open_folder();
                }
                ui.separator();

                if ui.add_enabled(
                    !self.processing && !self.images.is_empty(),
                    egui::Button::new("🎲 Randomize"),
                ).clicked() {
                    self.start_processing();
                }

                ui.separator();
                ui.checkbox(&mut self.config.randomize.full, "Full randomization");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.add_enabled(
                        !self.processing && !self.images.is_empty(),
                        egui::Button::new("🗑 Clear All"),
                    ).clicked() {
                        self.images.clear();
                        self.selected = None;
                        self.status = READY.into();
                    }
                });
            });
            ui.add_space(4.0);
        });

        // ── Left panel: image list ──────────────────────────────────
        egui::SidePanel::left("image_list")
            .default_width(260.0)
            .min_width(180.0)
            .show(ctx, |ui| {
                ui.heading("Images");
                ui.separator();

                if self.images.is_empty() {
                    ui.centered_and_justified(|ui| {
                        ui.label(egui::RichText::new("Drop images here\nor click Open")
                            .size(16.0)
                            .color(egui::Color32::GRAY));
                    });
                    return;
                }

                egui::ScrollArea::vertical().show(ui, |ui| {
                    let mut new_selected = self.selected;
                    for (i, entry) in self.images.iter().enumerate() {
                        let is_selected = self.selected == Some(i);
                        let filename = entry.path.file_name()
                            .map(|f| f.to_string_lossy().to_string())
                            .unwrap_or_else(|| entry.path.display().to_string());

                        let status_icon = match &entry.result {
                            Some(r) if r.is_success() => "✅ ",
                            Some(_) => "❌ ",
                            None => "  ",
                        };

                        let label = format!("{status_icon}{filename}");
                        if ui.selectable_label(is_selected, &label).clicked() {
                            new_selected = Some(i);
                        }
                    }
                    self.selected = new_selected;
                });
            });

        // ── Central panel: preview + metadata ───────────────────────
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(entry) = self.selected.and_then(|idx| self.images.get_mut(idx)) else {
                ui.centered_and_justified(|ui| {
                    ui.label(egui::RichText::new("Select an image from the list")
                        .size(18.0)
                        .color(egui::Color32::GRAY));
                });
                return;
            };

            load_texture(ctx, entry);
            let entry = &*entry;
            let processing = self.processing;

            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        if let Some(ref tex) = entry.texture {
                            let size = tex.size_vec2();
                            let scale = (240.0 / size.y).min(1.0);
                            ui.image(egui::load::SizedTexture::new(tex.id(), size * scale));
                        }
                        ui.vertical(|ui| {
                            ui.heading(entry.path.file_name()
                                .map(|f| f.to_string_lossy().to_string())
                                .unwrap_or_default());
                            ui.label(format!("Path: {}", entry.path.display()));
                        });
                    });

                    ui.add_space(12.0);
                    ui.separator();

                    ui.columns(2, |cols| {
                        show_report(&mut cols[0], "before", "Before", Some(&entry.before));

                        match &entry.result {
                            Some(result) => match &result.outcome {
                                Ok(out) => {
                                    cols[1].label(format!("Saved as {}", out.display()));
                                    show_report(&mut cols[1], "after", "After", result.after.as_ref());
                                }
                                Err(e) => {
                                    cols[1].colored_label(
                                        egui::Color32::from_rgb(220, 50, 50),
                                        format!("{}: {e}", e.kind()),
                                    );
                                }
                            },
                            None if processing => {
                                cols[1].horizontal(|ui| {
                                    ui.spinner();
                                    ui.label("Randomizing...");
                                });
                            }
                            None => {
                                cols[1].label(egui::RichText::new("Not randomized yet").color(egui::Color32::GRAY));
                            }
                        }
                    });
                });
        });
    }
}

fn load_texture(ctx: &egui::Context, entry: &mut ImageEntry) {
    if entry.texture_tried {
        return;
    }
    entry.texture_tried = true;

    let decoded = std::fs::read(&entry.path)
        .ok()
        .and_then(|bytes| image::load_from_memory(&bytes).ok());

    if let Some(img) = decoded {
        let img = img.thumbnail(400, 400);
        let size = [img.width() as usize, img.height() as usize];
        let rgba = img.to_rgba8();
        let pixels = rgba.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        entry.texture = Some(ctx.load_texture(
            entry.path.to_string_lossy(),
            color_image,
            egui::TextureOptions::LINEAR,
        ));
    }
}

fn show_report(ui: &mut egui::Ui, id: &str, heading: &str, report: Option<&MetadataReport>) {
    egui::CollapsingHeader::new(egui::RichText::new(heading).strong())
        .id_salt(id)
        .default_open(true)
        .show(ui, |ui| {
            let Some(report) = report else {
                ui.label(egui::RichText::new("(not available)").color(egui::Color32::GRAY));
                return;
            };
            egui::Grid::new(format!("{id}_grid"))
                .num_columns(2)
                .spacing([12.0, 4.0])
                .show(ui, |ui| {
                    for section in &report.sections {
                        ui.label(
                            egui::RichText::new(section.title.to_uppercase())
                                .small()
                                .color(egui::Color32::GRAY),
                        );
                        ui.end_row();
                        for line in &section.lines {
                            ui.label(egui::RichText::new(&line.label).strong());
                            ui.label(&line.value);
                            ui.end_row();
                        }
                    }
                });
        });
}

// ── Settings tab ────────────────────────────────────────────────────

impl App {
    fn show_settings_tab(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Configuration");
                ui.add_space(8.0);

                // Config file path
                ui.horizontal(|ui| {
                    ui.label("Config file:");
                    if let Some(ref path) = self.config_path {
                        ui.label(path.display().to_string());
                    } else {
                        ui.label("(default)");
                    }
                    if ui.button("Load...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .pick_file()
                        {
                            match Config::load(Some(&path)) {
                                Ok(c) => {
                                    self.config = c;
                                    self.config_path = Some(path);
                                    self.status = "Config loaded".into();
                                }
                                Err(e) => {
                                    self.status = format!("Failed to load config: {e}");
                                }
                            }
                        }
                    }
                    if ui.button("Save").clicked() {
                        let path = self.config_path.as_deref();
                        match self.config.save(path) {
                            Ok(()) => self.status = "Config saved".into(),
                            Err(e) => self.status = format!("Failed to save config: {e}"),
                        }
                    }
                });

                ui.add_space(16.0);
                ui.separator();

                // ── Randomization ───────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Randomization");
                ui.add_space(4.0);

                ui.checkbox(
                    &mut self.config.randomize.full,
                    "Full (timestamps, exposure, descriptive text, GPS)",
                );
                ui.add_enabled(
                    self.config.randomize.full,
                    egui::Checkbox::new(
                        &mut self.config.randomize.windows_props,
                        "Windows properties (XPTitle, XPSubject, XPKeywords, XPComment, XPAuthor)",
                    ),
                );
                ui.horizontal(|ui| {
                    ui.label("Capture dates within the last");
                    ui.add(egui::DragValue::new(&mut self.config.randomize.max_age_days).range(0..=36500));
                    ui.label("days");
                });

                ui.add_space(16.0);
                ui.separator();

                // ── Output ──────────────────────────────────────────
                ui.add_space(8.0);
                ui.heading("Output");
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    ui.label("File name prefix:");
                    ui.text_edit_singleline(&mut self.config.output.prefix);
                });
                if let Err(e) = self.config.validate() {
                    ui.colored_label(egui::Color32::RED, e.to_string());
                }
                ui.checkbox(&mut self.config.output.reencode, "Re-encode pixels");
                ui.add_enabled(
                    self.config.output.reencode,
                    egui::Slider::new(&mut self.config.output.jpeg_quality, 1..=100).text("JPEG quality"),
                );
                ui.checkbox(&mut self.config.output.rewrite_after_save, "Rewrite output after saving");
            });
        });
    }
}
