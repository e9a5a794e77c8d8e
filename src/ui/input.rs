use crate::scene::camera_rig::CameraKind;
use crate::scene::light_rig::DayNight;
use crate::scene::state::{SceneState, ShadingModel, SurfaceMode};
use serde::Deserialize;
use std::collections::HashSet;

/// Keys the scene reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Key {
    #[serde(rename = "1")]
    Num1,
    #[serde(rename = "2")]
    Num2,
    #[serde(rename = "3")]
    Num3,
    D,
    N,
    Left,
    Right,
    G,
    P,
    Comma,
    Period,
    Escape,
}

impl Key {
    pub const ALL: [Key; 12] = [
        Key::Num1,
        Key::Num2,
        Key::Num3,
        Key::D,
        Key::N,
        Key::Left,
        Key::Right,
        Key::G,
        Key::P,
        Key::Comma,
        Key::Period,
        Key::Escape,
    ];
}

/// Time and key state, polled once per frame.
pub trait InputSource {
    /// Monotonic simulation time in seconds.
    fn elapsed(&self) -> f32;
    fn is_key_down(&self, key: Key) -> bool;
    fn close_requested(&self) -> bool;
}

/// Applies held keys to the scene state. Returns `true` when the loop
/// should stop.
pub fn apply_controls(input: &dyn InputSource, state: &mut SceneState) -> bool {
    let cameras = [
        (Key::Num1, CameraKind::Static),
        (Key::Num2, CameraKind::Tracking),
        (Key::Num3, CameraKind::Chase),
    ];
    for (key, kind) in cameras {
        if input.is_key_down(key) {
            state.cameras.select(kind);
        }
    }

    if input.is_key_down(Key::D) {
        state.set_day_night(DayNight::Day);
    }
    if input.is_key_down(Key::N) {
        state.set_day_night(DayNight::Night);
    }

    if input.is_key_down(Key::Left) {
        state.aim.increase();
    }
    if input.is_key_down(Key::Right) {
        state.aim.decrease();
    }

    if input.is_key_down(Key::G) {
        state.set_shading(ShadingModel::Gouraud);
    }
    if input.is_key_down(Key::P) {
        state.set_shading(ShadingModel::Phong);
    }

    if input.is_key_down(Key::Comma) {
        state.set_surface(SurfaceMode::NormalMapped);
    }
    if input.is_key_down(Key::Period) {
        state.set_surface(SurfaceMode::Plain);
    }

    input.is_key_down(Key::Escape) || input.close_requested()
}

/// A key held from `start_frame` for `frames` frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptedKey {
    pub key: Key,
    pub start_frame: u64,
    #[serde(default = "default_hold")]
    pub frames: u64,
}

fn default_hold() -> u64 {
    1
}

impl ScriptedKey {
    pub fn is_down_at(&self, frame: u64) -> bool {
        frame >= self.start_frame && frame - self.start_frame < self.frames
    }
}

/// Deterministic input for headless runs: fixed timestep, scripted keys
/// and a frame budget.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    keys: Vec<ScriptedKey>,
    timestep: f32,
    frame_budget: u64,
    frame: u64,
}

impl ScriptedInput {
    pub fn new(keys: Vec<ScriptedKey>, timestep: f32, frame_budget: u64) -> Self {
        Self {
            keys,
            timestep,
            frame_budget,
            frame: 0,
        }
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn advance(&mut self) {
        self.frame += 1;
    }
}

impl InputSource for ScriptedInput {
    fn elapsed(&self) -> f32 {
        self.frame as f32 * self.timestep
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.keys
            .iter()
            .any(|k| k.key == key && k.is_down_at(self.frame))
    }

    fn close_requested(&self) -> bool {
        self.frame >= self.frame_budget
    }
}

/// Keys down in one polled frame, plus the clock and close flag that came
/// with them.
#[derive(Debug, Clone, Default)]
pub struct KeySnapshot {
    pub down: HashSet<Key>,
    pub elapsed: f32,
    pub close: bool,
}

impl InputSource for KeySnapshot {
    fn elapsed(&self) -> f32 {
        self.elapsed
    }

    fn is_key_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    fn close_requested(&self) -> bool {
        self.close
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::camera_rig::{CameraRig, CameraRigLayout};
    use crate::scene::light_rig::SpotAim;

    fn state() -> SceneState {
        SceneState::new(
            CameraRig::new(&CameraRigLayout::default()).unwrap(),
            SpotAim::default(),
        )
    }

    fn pressed(keys: &[Key]) -> KeySnapshot {
        KeySnapshot {
            down: keys.iter().copied().collect(),
            ..Default::default()
        }
    }

    #[test]
    fn keys_map_to_scene_state() {
        let mut state = state();
        let close = apply_controls(
            &pressed(&[Key::Num3, Key::N, Key::G, Key::Comma, Key::Left]),
            &mut state,
        );
        assert!(!close);
        assert_eq!(state.cameras.active_kind(), CameraKind::Chase);
        assert_eq!(state.day_night(), DayNight::Night);
        assert_eq!(state.shading(), ShadingModel::Gouraud);
        assert_eq!(state.surface(), SurfaceMode::NormalMapped);
        assert_eq!(state.aim.value(), 0.01);

        apply_controls(&pressed(&[Key::P, Key::Period, Key::D, Key::Right]), &mut state);
        assert_eq!(state.shading(), ShadingModel::Phong);
        assert_eq!(state.surface(), SurfaceMode::Plain);
        assert_eq!(state.day_night(), DayNight::Day);
        assert_eq!(state.aim.value(), 0.0);
    }

    #[test]
    fn escape_requests_close() {
        assert!(apply_controls(&pressed(&[Key::Escape]), &mut state()));
    }

    #[test]
    fn scripted_keys_hold_for_their_window() {
        let mut input = ScriptedInput::new(
            vec![ScriptedKey {
                key: Key::Num2,
                start_frame: 2,
                frames: 3,
            }],
            0.5,
            10,
        );
        let mut down = Vec::new();
        while !input.close_requested() {
            down.push(input.is_key_down(Key::Num2));
            input.advance();
        }
        assert_eq!(down.len(), 10);
        assert_eq!(down.iter().filter(|d| **d).count(), 3);
        assert!(down[2] && down[4] && !down[5]);
        assert_eq!(input.elapsed(), 5.0);
    }
}
