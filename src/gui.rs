#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use crossbeam_channel::{Receiver, Sender, TryRecvError};
use eframe::egui;
use std::path::{Path, PathBuf};
use std::thread;

use imgshrink::{
    render_log_entry, utils::parse_width_field, utils::SUPPORTED_EXTENSIONS, CompressionOptions,
    FileResult, ProgressReporter, Quality, ShrinkCore,
};

/// Messages from the worker thread to the UI
enum WorkerEvent {
    Log(String),
    Finished,
    Failed(String),
}

/// Streams each file's log block to the UI as soon as it is ready
struct ChannelProgressReporter {
    sender: Sender<WorkerEvent>,
    ctx: egui::Context,
}

impl ProgressReporter for ChannelProgressReporter {
    fn set_total_files(&self, _total: usize) {}

    fn update_progress(&self, _done: usize, _failed: usize) {}

    fn report_result(&self, input_path: &Path, result: &FileResult) {
        // The UI may already be gone; nothing left to show then.
        let _ = self
            .sender
            .send(WorkerEvent::Log(render_log_entry(input_path, result)));
        self.ctx.request_repaint();
    }
}

/// Main GUI application structure
pub struct ImgShrinkGuiApp {
    quality: String,
    width: String,
    log: String,
    is_running: bool,
    events: Option<Receiver<WorkerEvent>>,
}

impl Default for ImgShrinkGuiApp {
    fn default() -> Self {
        Self {
            quality: String::new(),
            width: String::new(),
            log: String::new(),
            is_running: false,
            events: None,
        }
    }
}

impl eframe::App for ImgShrinkGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.label("Select images to compress:");
            ui.add_space(6.0);

            ui.label("Quality (1-100):");
            ui.add_enabled(!self.is_running, egui::TextEdit::singleline(&mut self.quality));

            ui.label("Image Resize (Change the width of the image):");
            ui.add_enabled(!self.is_running, egui::TextEdit::singleline(&mut self.width));

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(!self.is_running, egui::Button::new("Browse Images"))
                    .clicked()
                {
                    self.browse_and_compress(ctx);
                }
                if ui.button("Clear Log").clicked() {
                    self.log.clear();
                }
                if self.is_running {
                    ui.spinner();
                    ui.label("Compressing...");
                }
            });

            ui.separator();

            egui::ScrollArea::vertical()
                .stick_to_bottom(true)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    ui.add(
                        egui::TextEdit::multiline(&mut self.log.as_str())
                            .font(egui::TextStyle::Monospace)
                            .desired_width(f32::INFINITY)
                            .desired_rows(25),
                    );
                });
        });
    }
}

impl ImgShrinkGuiApp {
    fn drain_events(&mut self) {
        let Some(events) = &self.events else {
            return;
        };

        loop {
            match events.try_recv() {
                Ok(WorkerEvent::Log(entry)) => self.log.push_str(&entry),
                Ok(WorkerEvent::Finished) => self.is_running = false,
                Ok(WorkerEvent::Failed(message)) => {
                    self.log.push_str(&format!("Error: {message}\n"));
                    self.is_running = false;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.is_running = false;
                    self.events = None;
                    break;
                }
            }
        }
    }

    fn browse_and_compress(&mut self, ctx: &egui::Context) {
        let quality: Quality = match self.quality.parse() {
            Ok(quality) => quality,
            Err(_) => {
                self.log
                    .push_str("Error: Please enter a valid quality percentage between 1-100.\n");
                return;
            }
        };
        let target_width = parse_width_field(&self.width);

        let Some(files) = rfd::FileDialog::new()
            .set_title("Select image files")
            .add_filter("Image files", SUPPORTED_EXTENSIONS)
            .pick_files()
        else {
            return;
        };

        self.start_batch(ctx, files, quality, target_width);
    }

    fn start_batch(
        &mut self,
        ctx: &egui::Context,
        files: Vec<PathBuf>,
        quality: Quality,
        target_width: Option<u32>,
    ) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.events = Some(receiver);
        self.is_running = true;

        let options = CompressionOptions::new()
            .with_quality(quality.value() as u32)
            .with_target_width(target_width);
        let ctx = ctx.clone();

        thread::spawn(move || {
            let mut core = ShrinkCore::new(options);
            let reporter = Box::new(ChannelProgressReporter {
                sender: sender.clone(),
                ctx: ctx.clone(),
            });

            let event = match core.run_with_progress(&files, Some(reporter)) {
                Ok(_) => WorkerEvent::Finished,
                Err(e) => WorkerEvent::Failed(e.to_string()),
            };
            let _ = sender.send(event);
            ctx.request_repaint();
        });
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init(); // Log to stderr (if you want to see logs)

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 560.0])
            .with_min_inner_size([480.0, 360.0]),
        ..Default::default()
    };

    eframe::run_native(
        "File Compression App",
        options,
        Box::new(|_cc| Ok(Box::new(ImgShrinkGuiApp::default()))),
    )
}
