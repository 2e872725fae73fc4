use nalgebra::Isometry3;

use crate::geometry::{FloatType, WorldPoint, WorldVector};

/// Rigid placement of a primitive in the world.
///
/// Holds the forward transform and its inverse as one value; the pair is only
/// ever computed together, so no code path can observe a stale inverse.
/// Rigid only - the inverse-transform intersection shortcut does not survive
/// non-uniform scale.
#[derive(Copy, Clone, Debug)]
pub struct Placement {
    to_world: Isometry3<FloatType>,
    to_local: Isometry3<FloatType>,
}

impl Placement {
    pub fn new(to_world: Isometry3<FloatType>) -> Placement {
        Placement {
            to_world,
            to_local: to_world.inverse(),
        }
    }

    pub fn identity() -> Placement {
        Placement::new(Isometry3::identity())
    }

    pub fn to_world_point(&self, point: &WorldPoint) -> WorldPoint {
        self.to_world * point
    }

    /// Rotates a direction into world space (no translation).
    pub fn to_world_vector(&self, vector: &WorldVector) -> WorldVector {
        self.to_world * vector
    }

    pub fn to_local_point(&self, point: &WorldPoint) -> WorldPoint {
        self.to_local * point
    }

    pub fn to_local_vector(&self, vector: &WorldVector) -> WorldVector {
        self.to_local * vector
    }
}
