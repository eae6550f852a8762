//! Time-boxed transform interpolation
//!
//! A tween moves a unit from whatever pose it has when the tween starts toward
//! a keyframe. Fields the keyframe leaves unset keep their current value.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Easing curves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    EaseInQuad,
    EaseOutCubic,
    EaseInOutQuad,
    /// Slight overshoot, for cards landing
    EaseOutBack,
}

impl Easing {
    /// Map linear progress in [0, 1] to eased progress
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInQuad => t * t,
            Easing::EaseOutCubic => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseOutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                1.0 + C3 * (t - 1.0).powi(3) + C1 * (t - 1.0).powi(2)
            }
        }
    }
}

/// Position, euler rotation (radians) and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    pub fn with_rotation_z(mut self, radians: f32) -> Self {
        self.rotation.z = radians;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Full visual state of a unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub transform: Transform,
    /// 0 = invisible, 1 = opaque
    pub opacity: f32,
    /// 0 = face-down, 1 = face-up
    pub flip: f32,
}

impl Pose {
    /// Hidden, face-down pose at a transform
    pub fn hidden(transform: Transform) -> Self {
        Self {
            transform,
            opacity: 0.0,
            flip: 0.0,
        }
    }

    /// Blend toward a keyframe. At `t == 1` the target is reached exactly;
    /// eased values above 1 overshoot.
    pub fn blend(&self, target: &Keyframe, t: f32) -> Pose {
        let done = t == 1.0;
        let vec = |from: Vec3, to: Option<Vec3>| match to {
            Some(to) if done => to,
            Some(to) => from.lerp(to, t),
            None => from,
        };
        let scalar = |from: f32, to: Option<f32>| match to {
            Some(to) if done => to,
            Some(to) => from + (to - from) * t,
            None => from,
        };
        let tr = &self.transform;
        Pose {
            transform: Transform {
                position: vec(tr.position, target.position),
                rotation: vec(tr.rotation, target.rotation),
                scale: vec(tr.scale, target.scale),
            },
            opacity: scalar(self.opacity, target.opacity),
            flip: scalar(self.flip, target.flip),
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::hidden(Transform::IDENTITY)
    }
}

/// Partial pose a tween moves toward
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keyframe {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub opacity: Option<f32>,
    pub flip: Option<f32>,
}

impl Keyframe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyframe that reaches every field of a transform
    pub fn to(transform: Transform) -> Self {
        Self {
            position: Some(transform.position),
            rotation: Some(transform.rotation),
            scale: Some(transform.scale),
            ..Self::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = Some(Vec3::splat(scale));
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.opacity = Some(opacity);
        self
    }

    pub fn flip(mut self, flip: f32) -> Self {
        self.flip = Some(flip);
        self
    }
}

/// One queued animation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub target: Keyframe,
    /// Timeline milliseconds
    pub duration_ms: f64,
    pub easing: Easing,
}

impl Tween {
    pub fn new(target: Keyframe, duration_ms: f64, easing: Easing) -> Self {
        Self {
            target,
            duration_ms: duration_ms.max(0.0),
            easing,
        }
    }

    /// Hold the current pose (stagger/delay)
    pub fn wait(duration_ms: f64) -> Self {
        Self::new(Keyframe::new(), duration_ms, Easing::Linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_easing_endpoints() {
        for easing in [
            Easing::Linear,
            Easing::EaseInQuad,
            Easing::EaseOutCubic,
            Easing::EaseInOutQuad,
            Easing::EaseOutBack,
        ] {
            assert!(easing.apply(0.0).abs() < 1e-5, "{:?} at 0", easing);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-5, "{:?} at 1", easing);
        }
    }

    #[test]
    fn test_ease_out_back_overshoots() {
        let peak = (1..100)
            .map(|i| Easing::EaseOutBack.apply(i as f32 / 100.0))
            .fold(0.0_f32, f32::max);
        assert!(peak > 1.0);
    }

    #[test]
    fn test_blend_keeps_unset_fields() {
        let from = Pose {
            transform: Transform::at(Vec3::new(1.0, 2.0, 0.0)),
            opacity: 0.5,
            flip: 0.0,
        };
        let target = Keyframe::new().flip(1.0);
        let mid = from.blend(&target, 0.5);
        assert_eq!(mid.transform.position, Vec3::new(1.0, 2.0, 0.0));
        assert_eq!(mid.opacity, 0.5);
        assert!((mid.flip - 0.5).abs() < 1e-6);
    }
}
