use nalgebra::Vector3;
use skylit::app::RenderSession;
use skylit::core::math::transform::TransformFactory;
use skylit::core::framebuffer::DepthFunc;
use skylit::io::config::Config;
use skylit::pipeline::backend::{GraphicsBackend, Program};
use skylit::pipeline::recording::{Command, RecordingBackend};
use skylit::pipeline::uniforms::{UniformValue, names};
use skylit::scene::camera_rig::CameraKind;
use skylit::ui::input::{Key, KeySnapshot};

fn session() -> RenderSession<RecordingBackend> {
    let mut config = Config::default();
    config.assets.root = std::env::temp_dir().join("skylit-frame-order");
    let mut session = RenderSession::new(&config, RecordingBackend::new()).unwrap();
    session.backend.take_commands();
    session
}

fn at(elapsed: f32, keys: &[Key]) -> KeySnapshot {
    KeySnapshot {
        down: keys.iter().copied().collect(),
        elapsed,
        close: false,
    }
}

fn draw_program(command: &Command) -> Option<Program> {
    match command {
        Command::Draw { program, .. } => Some(*program),
        _ => None,
    }
}

#[test]
fn moving_light_is_written_between_opaque_and_sky_draws() {
    let mut session = session();
    session.step(&at(0.5, &[]));
    let backend = &session.backend;

    let last_opaque = backend
        .commands
        .iter()
        .rposition(|c| draw_program(c) == Some(Program::Phong))
        .unwrap();
    let sky = backend
        .commands
        .iter()
        .position(|c| draw_program(c) == Some(Program::Sky))
        .unwrap();
    let moving = backend
        .last_uniform_write(Program::Phong, &names::field(names::MOVING_SPOT, "direction"))
        .unwrap();

    assert!(last_opaque < moving, "moving light written before the last opaque draw");
    assert!(moving < sky, "moving light written after the sky draw");
}

#[test]
fn first_frame_opaque_draws_precede_any_moving_light() {
    let mut session = session();
    session.step(&at(0.0, &[]));
    let commands = &session.backend.commands;
    let first_draw = commands.iter().position(|c| draw_program(c).is_some()).unwrap();
    let moving_prefix = format!("{}.", names::MOVING_SPOT);
    let first_moving = commands
        .iter()
        .position(|c| matches!(c, Command::SetUniform { name, .. } if name.starts_with(&moving_prefix)))
        .unwrap();
    assert!(first_draw < first_moving);
}

#[test]
fn sky_is_drawn_under_less_equal_and_depth_is_restored() {
    let mut session = session();
    session.step(&at(0.0, &[]));
    let backend = &session.backend;

    for command in &backend.commands {
        if let Command::Draw {
            program,
            depth_func,
            ..
        } = command
        {
            let expected = if *program == Program::Sky {
                DepthFunc::LessEqual
            } else {
                DepthFunc::Less
            };
            assert_eq!(*depth_func, expected, "{program:?}");
        }
    }
    assert_eq!(backend.depth_func(), DepthFunc::Less);
    assert_eq!(backend.commands.last(), Some(&Command::SetDepthFunc(DepthFunc::Less)));
}

#[test]
fn sky_view_has_no_translation() {
    let mut session = session();
    let tick = session.step(&at(0.0, &[]));
    match session.backend.uniform(Program::Sky, names::VIEW) {
        Some(UniformValue::Mat4(view)) => {
            assert_eq!(TransformFactory::translation_of(&view), Vector3::zeros());
            assert_eq!(
                TransformFactory::linear_part(&view),
                TransformFactory::linear_part(&tick.report.view)
            );
        }
        other => panic!("sky view not set: {other:?}"),
    }
}

#[test]
fn camera_switch_is_a_cut_on_the_next_frame() {
    let mut session = session();
    let first = session.step(&at(1.0, &[])).report;
    let second = session.step(&at(1.0, &[Key::Num2])).report;
    let third = session.step(&at(1.0, &[])).report;

    assert_eq!(first.camera, CameraKind::Static);
    assert_eq!(second.camera, CameraKind::Tracking);
    assert_ne!(first.view, second.view);
    // Same time, same target: no blending between frames.
    assert_eq!(second.view, third.view);
}

#[test]
fn gouraud_key_switches_the_opaque_program() {
    let mut session = session();
    session.step(&at(0.0, &[Key::G]));
    let programs: Vec<Program> = session
        .backend
        .commands
        .iter()
        .filter_map(draw_program)
        .collect();
    assert_eq!(programs.len(), 12);
    assert!(programs[..11].iter().all(|p| *p == Program::Gouraud));
    assert_eq!(programs[11], Program::Sky);
}

#[test]
fn night_selects_the_night_cubemap() {
    let mut session = session();
    session.step(&at(0.0, &[Key::N]));
    let night = session.assets.textures.sky_night;
    assert!(session.backend.commands.contains(&Command::BindTexture {
        unit: 0,
        texture: night,
    }));
    assert_eq!(
        session
            .backend
            .uniform(Program::Phong, &names::field(names::DIR_LIGHT, "ambient")),
        Some(UniformValue::Vec3(Vector3::repeat(0.1)))
    );
}

#[test]
fn escape_closes_after_rendering_the_frame() {
    let mut session = session();
    let tick = session.step(&at(0.0, &[Key::Escape]));
    assert!(tick.close);
    assert_eq!(session.frames_rendered(), 1);
}
