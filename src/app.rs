use crate::error::{RenderError, Result};
use crate::io::config::Config;
use crate::io::image::save_buffer_to_image;
use crate::pipeline::backend::GraphicsBackend;
use crate::pipeline::compositor::{FrameCompositor, FrameReport};
use crate::pipeline::passes::post_process_to_buffer;
use crate::pipeline::software::SoftwareBackend;
use crate::scene::assets::SceneAssets;
use crate::scene::camera_rig::CameraRig;
use crate::scene::state::SceneState;
use crate::ui::input::{InputSource, ScriptedInput, apply_controls};
use crate::ui::viewer;
use log::{debug, error, info};
use std::fs;
use std::time::Instant;

pub const CONTROLS_HELP: &str = "Controls: 1/2/3=Camera, D/N=Day/Night, Left/Right=Aim spotlight, \
G/P=Gouraud/Phong, Comma/Period=Normal map/Plain, Esc=Quit";

/// Result of one tick of the frame loop.
#[derive(Debug, Clone)]
pub struct Tick {
    pub report: FrameReport,
    /// Input asked the loop to stop after this frame.
    pub close: bool,
}

/// Everything a running scene owns: the backend and its resident assets,
/// the mutable scene state and the compositor.
pub struct RenderSession<B: GraphicsBackend> {
    pub backend: B,
    pub state: SceneState,
    pub assets: SceneAssets,
    pub compositor: FrameCompositor,
    frames: u64,
}

impl<B: GraphicsBackend> RenderSession<B> {
    pub fn new(config: &Config, mut backend: B) -> Result<Self> {
        let assets = SceneAssets::load(&mut backend, config)?;
        let cameras = CameraRig::new(&config.camera.rig_layout())?;
        Ok(Self {
            backend,
            state: SceneState::new(cameras, config.lights.aim()),
            assets,
            compositor: FrameCompositor::from_config(config),
            frames: 0,
        })
    }

    /// Applies input, then renders one frame at the input's clock.
    pub fn step(&mut self, input: &dyn InputSource) -> Tick {
        let close = apply_controls(input, &mut self.state);
        let report = self.compositor.render(
            &mut self.backend,
            &mut self.state,
            &self.assets,
            input.elapsed(),
        );
        self.frames += 1;
        Tick { report, close }
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

/// Renders `config.headless.frames` frames with scripted input and writes
/// PNGs into the output directory.
pub fn run_headless(config: &Config) -> Result<()> {
    let window = &config.window;
    let headless = &config.headless;
    let (width, height) = (window.width as usize, window.height as usize);
    info!(
        "Starting headless run: {} frames at {}x{} (x{} samples)",
        headless.frames, width, height, window.samples
    );

    fs::create_dir_all(&headless.output_dir).map_err(|source| RenderError::Io {
        path: headless.output_dir.clone(),
        source,
    })?;

    let backend = SoftwareBackend::new(width, height, window.samples);
    let mut session = RenderSession::new(config, backend)?;
    let mut input = ScriptedInput::new(headless.keys.clone(), headless.timestep, headless.frames);
    let mut buffer = vec![0u32; width * height];

    let start = Instant::now();
    let mut last_fps_update = Instant::now();
    let mut fps_frames = 0u32;

    while !input.close_requested() {
        let tick = session.step(&input);
        let index = input.frame();
        let last = tick.close || index + 1 >= headless.frames;
        debug!(
            "Frame {}: {} draws, {:?} camera",
            index, tick.report.draw_calls, tick.report.camera
        );

        if should_save(index, headless.save_every, last) {
            post_process_to_buffer(session.backend.framebuffer(), &mut buffer);
            let path = headless.output_dir.join(format!("frame_{index:04}.png"));
            if let Err(err) = save_buffer_to_image(&buffer, width, height, &path) {
                error!("{}", err);
            }
        }

        fps_frames += 1;
        if last_fps_update.elapsed().as_secs_f32() >= 2.0 {
            info!(
                "Average FPS: {:.1}",
                fps_frames as f32 / last_fps_update.elapsed().as_secs_f32()
            );
            fps_frames = 0;
            last_fps_update = Instant::now();
        }

        input.advance();
        if tick.close {
            info!("Close requested at frame {}", index);
            break;
        }
    }

    info!(
        "Rendered {} frames in {:.2?}",
        session.frames_rendered(),
        start.elapsed()
    );
    Ok(())
}

/// Opens the interactive viewer.
pub fn run_gui(config: Config) -> Result<()> {
    info!(
        "Starting GUI mode ({}x{})...",
        config.window.width, config.window.height
    );
    info!("{}", CONTROLS_HELP);
    viewer::start_viewer(config)
}

fn should_save(index: u64, every: u64, last: bool) -> bool {
    last || (every > 0 && index % every == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_stride_always_includes_last_frame() {
        let saved: Vec<u64> = (0..10).filter(|&i| should_save(i, 4, i == 9)).collect();
        assert_eq!(saved, vec![0, 4, 8, 9]);
        let only_last: Vec<u64> = (0..5).filter(|&i| should_save(i, 0, i == 4)).collect();
        assert_eq!(only_last, vec![4]);
    }
}
