use crate::app::{CONTROLS_HELP, RenderSession};
use crate::error::{RenderError, Result};
use crate::io::config::Config;
use crate::pipeline::passes::post_process_to_rgba;
use crate::pipeline::software::SoftwareBackend;
use crate::ui::input::{Key, KeySnapshot};
use egui::{ColorImage, RichText, TextureOptions, Vec2};
use log::info;
use std::time::Instant;

fn egui_key(key: Key) -> egui::Key {
    match key {
        Key::Num1 => egui::Key::Num1,
        Key::Num2 => egui::Key::Num2,
        Key::Num3 => egui::Key::Num3,
        Key::D => egui::Key::D,
        Key::N => egui::Key::N,
        Key::Left => egui::Key::ArrowLeft,
        Key::Right => egui::Key::ArrowRight,
        Key::G => egui::Key::G,
        Key::P => egui::Key::P,
        Key::Comma => egui::Key::Comma,
        Key::Period => egui::Key::Period,
        Key::Escape => egui::Key::Escape,
    }
}

/// Shows the software framebuffer in a window and feeds it egui key state.
pub struct SceneViewer {
    session: RenderSession<SoftwareBackend>,
    size: [usize; 2],
    texture: Option<egui::TextureHandle>,
    rgba: Vec<u8>,
    start: Instant,
    last_frame: Instant,
    fps: f32,
}

impl SceneViewer {
    pub fn new(session: RenderSession<SoftwareBackend>) -> Self {
        let fb = session.backend.framebuffer();
        let size = [fb.width, fb.height];
        Self {
            session,
            size,
            texture: None,
            rgba: Vec::new(),
            start: Instant::now(),
            last_frame: Instant::now(),
            fps: 0.0,
        }
    }

    fn poll(&self, ctx: &egui::Context) -> KeySnapshot {
        ctx.input(|i| KeySnapshot {
            down: Key::ALL
                .into_iter()
                .filter(|k| i.key_down(egui_key(*k)))
                .collect(),
            elapsed: self.start.elapsed().as_secs_f32(),
            close: i.viewport().close_requested(),
        })
    }

    fn upload_frame(&mut self, ctx: &egui::Context) {
        post_process_to_rgba(self.session.backend.framebuffer(), &mut self.rgba);
        let image = ColorImage::from_rgba_unmultiplied(self.size, &self.rgba);
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::NEAREST),
            None => {
                self.texture = Some(ctx.load_texture("frame", image, TextureOptions::NEAREST));
            }
        }
    }

    fn status_line(&self) -> String {
        let state = &self.session.state;
        format!(
            "{:?} camera | {:?} | {:?} | {:?} | aim {:+.2} | {:.1} FPS",
            state.cameras.active_kind(),
            state.shading(),
            state.day_night(),
            state.surface(),
            state.aim.value(),
            self.fps
        )
    }
}

impl eframe::App for SceneViewer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let input = self.poll(ctx);
        let tick = self.session.step(&input);
        if tick.close {
            info!("Closing viewer");
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
        self.upload_frame(ctx);

        let dt = self.last_frame.elapsed().as_secs_f32();
        self.last_frame = Instant::now();
        if dt > 0.0 {
            self.fps = 0.9 * self.fps + 0.1 / dt;
        }

        egui::TopBottomPanel::top("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(self.status_line()).monospace());
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(texture) = &self.texture {
                let size = Vec2::new(self.size[0] as f32, self.size[1] as f32);
                ui.add(egui::Image::new(texture).fit_to_exact_size(size));
            }
            ui.small(CONTROLS_HELP);
        });

        ctx.request_repaint();
    }
}

/// Builds the session and runs the window until it closes.
pub fn start_viewer(config: Config) -> Result<()> {
    let window = &config.window;
    let backend = SoftwareBackend::new(window.width as usize, window.height as usize, window.samples);
    let session = RenderSession::new(&config, backend)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([window.width as f32 + 16.0, window.height as f32 + 64.0])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        &window.title,
        options,
        Box::new(move |_cc| Ok(Box::new(SceneViewer::new(session)))),
    )
    .map_err(|e| RenderError::Window(e.to_string()))
}
