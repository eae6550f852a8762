//! Card unit: the smallest controllable visual entity
//!
//! One per hand slot and one per environment card. A unit owns its pose and
//! a FIFO of tweens; `update` consumes timeline time across as many tweens as
//! it covers, so playback is independent of frame size.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use super::tween::{Pose, Transform, Tween};
use crate::duel::CardFace;

/// Overlay drawn on top of the card face
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Highlight {
    #[default]
    None,
    /// Blade or duel won
    Victory,
    /// Blade or duel lost
    Defeat,
}

#[derive(Debug, Clone)]
struct Running {
    tween: Tween,
    from: Pose,
    elapsed: f64,
}

/// A card with pose, face and an animation queue
#[derive(Debug, Clone)]
pub struct CardUnit {
    pub id: u32,
    /// `None` while the card's identity is unknown (drawn face-down)
    pub face: Option<CardFace>,
    pub pose: Pose,
    /// Higher draws above lower
    pub render_order: i32,
    pub highlight: Highlight,
    queue: VecDeque<Tween>,
    current: Option<Running>,
}

impl CardUnit {
    pub fn new(id: u32, rest: Transform) -> Self {
        Self {
            id,
            face: None,
            pose: Pose::hidden(rest),
            render_order: 0,
            highlight: Highlight::None,
            queue: VecDeque::new(),
            current: None,
        }
    }

    /// Jump to a pose, dropping any queued animation
    pub fn snap(&mut self, pose: Pose) {
        self.stop();
        self.pose = pose;
    }

    /// Append a tween after whatever is queued
    pub fn animate(&mut self, tween: Tween) {
        self.queue.push_back(tween);
    }

    /// Append several tweens in order
    pub fn animate_all(&mut self, tweens: impl IntoIterator<Item = Tween>) {
        self.queue.extend(tweens);
    }

    /// Abandon queued tweens and start this one from the current pose
    pub fn retarget(&mut self, tween: Tween) {
        self.stop();
        self.animate(tween);
    }

    /// Drop queued tweens, keeping the pose reached so far
    pub fn stop(&mut self) {
        self.queue.clear();
        self.current = None;
    }

    pub fn is_animating(&self) -> bool {
        self.current.is_some() || !self.queue.is_empty()
    }

    pub fn is_face_up(&self) -> bool {
        self.pose.flip >= 0.5
    }

    /// Timeline milliseconds until the queue drains
    pub fn remaining_ms(&self) -> f64 {
        let current = self
            .current
            .as_ref()
            .map_or(0.0, |r| (r.tween.duration_ms - r.elapsed).max(0.0));
        current + self.queue.iter().map(|t| t.duration_ms).sum::<f64>()
    }

    /// Advance by timeline milliseconds
    pub fn update(&mut self, dt_ms: f64) {
        let mut remaining = dt_ms.max(0.0);
        loop {
            if self.current.is_none() {
                match self.queue.pop_front() {
                    Some(tween) => {
                        self.current = Some(Running {
                            tween,
                            from: self.pose,
                            elapsed: 0.0,
                        })
                    }
                    None => break,
                }
            }
            let Some(running) = self.current.as_mut() else {
                break;
            };

            let left = running.tween.duration_ms - running.elapsed;
            if remaining >= left {
                self.pose = running.from.blend(&running.tween.target, 1.0);
                remaining -= left;
                self.current = None;
            } else {
                running.elapsed += remaining;
                let t = (running.elapsed / running.tween.duration_ms) as f32;
                self.pose = running
                    .from
                    .blend(&running.tween.target, running.tween.easing.apply(t));
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::tween::{Easing, Keyframe};
    use glam::Vec3;

    fn unit() -> CardUnit {
        CardUnit::new(1, Transform::IDENTITY)
    }

    #[test]
    fn test_update_spans_multiple_tweens() {
        let mut u = unit();
        u.animate(Tween::new(
            Keyframe::new().position(Vec3::X * 10.0),
            100.0,
            Easing::Linear,
        ));
        u.animate(Tween::new(Keyframe::new().opacity(1.0), 100.0, Easing::Linear));
        assert!((u.remaining_ms() - 200.0).abs() < 1e-9);

        u.update(150.0);
        assert_eq!(u.pose.transform.position, Vec3::X * 10.0);
        assert!((u.pose.opacity - 0.5).abs() < 1e-5);
        assert!(u.is_animating());

        u.update(50.0);
        assert!(!u.is_animating());
        assert_eq!(u.pose.opacity, 1.0);
    }

    #[test]
    fn test_frame_size_does_not_change_result() {
        let tweens = [
            Tween::new(Keyframe::new().flip(1.0), 250.0, Easing::EaseOutCubic),
            Tween::wait(80.0),
            Tween::new(Keyframe::new().scale(2.0), 120.0, Easing::EaseInOutQuad),
        ];
        let mut coarse = unit();
        let mut fine = unit();
        coarse.animate_all(tweens);
        fine.animate_all(tweens);

        coarse.update(1000.0);
        for _ in 0..300 {
            fine.update(16.0);
        }
        assert_eq!(coarse.pose, fine.pose);
    }

    #[test]
    fn test_snap_clears_queue() {
        let mut u = unit();
        u.animate(Tween::wait(500.0));
        u.snap(Pose::hidden(Transform::at(Vec3::Y)));
        assert!(!u.is_animating());
        assert_eq!(u.pose.transform.position, Vec3::Y);
        assert!(!u.is_face_up());
    }

    #[test]
    fn test_zero_duration_tween_applies_immediately() {
        let mut u = unit();
        u.animate(Tween::new(Keyframe::new().flip(1.0), 0.0, Easing::Linear));
        u.update(0.0);
        assert!(u.is_face_up());
        assert!(!u.is_animating());
    }
}
