// Planar joint-angle computation from three landmarks

use crate::models::pose::Keypoint2D;

/// Angle in degrees at vertex `b` formed by the rays `b->a` and `b->c`.
///
/// Computed from the difference of the two rays' polar angles and folded into
/// [0, 180]: a raw difference beyond 180 degrees is a reflex angle and maps to
/// its explementary value. Pure and total for finite inputs; callers are
/// responsible for resolving landmarks before invoking.
pub fn angle_at(a: Keypoint2D, b: Keypoint2D, c: Keypoint2D) -> f32 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let mut angle = radians.to_degrees().abs();
    if angle > 180.0 {
        angle = 360.0 - angle;
    }
    angle
}
