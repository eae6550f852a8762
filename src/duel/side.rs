//! Data sides (A/B) versus viewer sides (left/right)
//!
//! The log speaks in A/B. Everything on screen speaks in left/right so the
//! viewer always sits on the same side. The mapping is fixed per duel.

use serde::{Deserialize, Serialize};

/// Side as encoded in the duel log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataSide {
    A,
    B,
}

/// Side as the viewer sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewSide {
    Left,
    Right,
}

impl ViewSide {
    pub const BOTH: [ViewSide; 2] = [ViewSide::Left, ViewSide::Right];

    /// -1 for left, +1 for right (layout mirroring)
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            ViewSide::Left => -1.0,
            ViewSide::Right => 1.0,
        }
    }
}

/// Fixed translation between viewer sides and data sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SideMapping {
    /// Viewer is duelist B, so B is drawn on the left
    pub viewer_is_b: bool,
}

impl SideMapping {
    /// Derive from viewer identity. Spectators and self-duels keep A on the left.
    pub fn derive(viewer_is_a: bool, viewer_is_b: bool) -> Self {
        Self {
            viewer_is_b: viewer_is_b && !viewer_is_a,
        }
    }

    pub fn to_data(&self, side: ViewSide) -> DataSide {
        match (side, self.viewer_is_b) {
            (ViewSide::Left, false) | (ViewSide::Right, true) => DataSide::A,
            (ViewSide::Left, true) | (ViewSide::Right, false) => DataSide::B,
        }
    }

    pub fn to_view(&self, side: DataSide) -> ViewSide {
        match (side, self.viewer_is_b) {
            (DataSide::A, false) | (DataSide::B, true) => ViewSide::Left,
            (DataSide::A, true) | (DataSide::B, false) => ViewSide::Right,
        }
    }
}

/// One value per viewer side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ViewPair<T> {
    pub left: T,
    pub right: T,
}

impl<T> ViewPair<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    /// Build from A/B values through a mapping
    pub fn from_data(mapping: SideMapping, a: T, b: T) -> Self {
        if mapping.viewer_is_b {
            Self { left: b, right: a }
        } else {
            Self { left: a, right: b }
        }
    }

    pub fn get(&self, side: ViewSide) -> &T {
        match side {
            ViewSide::Left => &self.left,
            ViewSide::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, side: ViewSide) -> &mut T {
        match side {
            ViewSide::Left => &mut self.left,
            ViewSide::Right => &mut self.right,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ViewSide, &T)> {
        [(ViewSide::Left, &self.left), (ViewSide::Right, &self.right)].into_iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ViewSide, &mut T)> {
        [
            (ViewSide::Left, &mut self.left),
            (ViewSide::Right, &mut self.right),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_b_sits_left() {
        let mapping = SideMapping::derive(false, true);
        assert_eq!(mapping.to_data(ViewSide::Left), DataSide::B);
        assert_eq!(mapping.to_view(DataSide::A), ViewSide::Right);
    }

    #[test]
    fn test_spectator_and_self_duel_keep_a_left() {
        for mapping in [SideMapping::derive(false, false), SideMapping::derive(true, true)] {
            assert_eq!(mapping.to_data(ViewSide::Left), DataSide::A);
            assert_eq!(mapping.to_view(DataSide::B), ViewSide::Right);
        }
    }

    #[test]
    fn test_mapping_round_trips_every_side() {
        for viewer_is_b in [false, true] {
            let mapping = SideMapping { viewer_is_b };
            for side in ViewSide::BOTH {
                assert_eq!(mapping.to_view(mapping.to_data(side)), side);
            }
        }
    }

    #[test]
    fn test_view_pair_from_data() {
        let pair = ViewPair::from_data(SideMapping { viewer_is_b: true }, "a", "b");
        assert_eq!(*pair.get(ViewSide::Left), "b");
        assert_eq!(*pair.get(ViewSide::Right), "a");
    }
}
