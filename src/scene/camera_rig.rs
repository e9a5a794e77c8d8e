use crate::error::Result;
use crate::scene::camera::Camera;
use log::{info, warn};
use nalgebra::{Point3, Vector3};

/// Which of the three rig cameras is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CameraKind {
    /// Fixed position and orientation.
    #[default]
    Static,
    /// Fixed position, re-aimed at the moving object every frame.
    Tracking,
    /// Fixed orientation, placed `forward` behind the moving object.
    Chase,
}

/// Start poses of the three cameras.
#[derive(Debug, Clone, Copy)]
pub struct CameraRigLayout {
    pub static_position: Point3<f32>,
    pub static_forward: Vector3<f32>,
    pub tracking_position: Point3<f32>,
    /// Point the tracking camera faces before the first update.
    pub tracking_initial_target: Point3<f32>,
    /// Chase camera position relative to the world origin at start.
    pub chase_offset: Point3<f32>,
    /// Point the chase camera faces at start; `target - offset` is its stand-off.
    pub chase_focus: Point3<f32>,
}

impl Default for CameraRigLayout {
    fn default() -> Self {
        Self {
            static_position: Point3::new(0.0, 2.0, 8.0),
            static_forward: Vector3::new(0.0, 0.0, -1.0),
            tracking_position: Point3::new(10.0, 2.0, -3.0),
            tracking_initial_target: Point3::new(0.0, 3.0, 8.0),
            chase_offset: Point3::new(0.0, 2.0, 11.0),
            chase_focus: Point3::new(0.0, 0.0, 3.0),
        }
    }
}

/// The closed set of cameras plus the active choice. Switching is a cut.
#[derive(Debug, Clone)]
pub struct CameraRig {
    static_camera: Camera,
    tracking: Camera,
    chase: Camera,
    active: CameraKind,
}

impl CameraRig {
    pub fn new(layout: &CameraRigLayout) -> Result<Self> {
        Ok(Self {
            static_camera: Camera::looking(layout.static_position, layout.static_forward)?,
            tracking: Camera::looking(
                layout.tracking_position,
                layout.tracking_initial_target - layout.tracking_position,
            )?,
            chase: Camera::looking(layout.chase_offset, layout.chase_focus - layout.chase_offset)?,
            active: CameraKind::Static,
        })
    }

    pub fn active_kind(&self) -> CameraKind {
        self.active
    }

    pub fn select(&mut self, kind: CameraKind) {
        if self.active != kind {
            info!("Switching camera: {:?} -> {:?}", self.active, kind);
            self.active = kind;
        }
    }

    pub fn camera(&self, kind: CameraKind) -> &Camera {
        match kind {
            CameraKind::Static => &self.static_camera,
            CameraKind::Tracking => &self.tracking,
            CameraKind::Chase => &self.chase,
        }
    }

    pub fn active(&self) -> &Camera {
        self.camera(self.active)
    }

    /// Applies the follow policies for a target at `target`. Both following
    /// cameras update every frame, active or not.
    pub fn follow(&mut self, target: &Point3<f32>) {
        if let Err(err) = self.tracking.look_at(target) {
            warn!("Tracking camera kept its previous aim: {}", err);
        }
        if let Err(err) = self.chase.set_position(target - self.chase.forward()) {
            warn!("Chase camera kept its previous position: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn non_finite_target_leaves_followers_in_place() {
        let mut rig = CameraRig::new(&CameraRigLayout::default()).unwrap();
        rig.follow(&Point3::new(1.0, 0.0, -4.0));
        let before = (*rig.camera(CameraKind::Tracking), *rig.camera(CameraKind::Chase));

        rig.follow(&Point3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(*rig.camera(CameraKind::Tracking), before.0);
        assert_eq!(*rig.camera(CameraKind::Chase), before.1);
    }

    #[test]
    fn chase_camera_keeps_its_stand_off() {
        let mut rig = CameraRig::new(&CameraRigLayout::default()).unwrap();
        let target = Point3::new(0.0, 0.0, -5.0);
        rig.follow(&target);

        let chase = rig.camera(CameraKind::Chase);
        assert_relative_eq!(chase.position(), Point3::new(0.0, 2.0, 3.0), epsilon = 1e-6);
        assert_relative_eq!(chase.position() + chase.forward(), target, epsilon = 1e-6);
    }

    #[test]
    fn tracking_camera_faces_the_target() {
        let mut rig = CameraRig::new(&CameraRigLayout::default()).unwrap();
        let target = Point3::new(0.0, 0.0, -10.0);
        rig.follow(&target);

        let tracking = rig.camera(CameraKind::Tracking);
        let expected = (target - tracking.position()).normalize();
        assert_relative_eq!(tracking.forward(), expected, epsilon = 1e-6);
    }

    #[test]
    fn coincident_target_keeps_tracking_forward() {
        let layout = CameraRigLayout::default();
        let mut rig = CameraRig::new(&layout).unwrap();
        let before = rig.camera(CameraKind::Tracking).forward();
        rig.follow(&layout.tracking_position);
        assert_eq!(rig.camera(CameraKind::Tracking).forward(), before);
    }

    #[test]
    fn select_is_an_abrupt_cut() {
        let mut rig = CameraRig::new(&CameraRigLayout::default()).unwrap();
        assert_eq!(rig.active_kind(), CameraKind::Static);
        rig.select(CameraKind::Chase);
        assert_eq!(rig.active(), rig.camera(CameraKind::Chase));
    }
}
