//! Line-of-sight path thinning

use crate::core::types::Vec3;
use crate::scene::ClearanceTester;

/// Greedy simplification of a raw node path.
///
/// Walks forward from the last emitted waypoint and emits the previous raw
/// point whenever the straight segment to the next one is obstructed.
/// Segments are tested lifted by half the agent height. The final point is
/// always emitted.
pub fn simplify(raw: &[Vec3], tester: &dyn ClearanceTester, width: f32, height: f32) -> Vec<Vec3> {
    let Some((&first, _)) = raw.split_first() else {
        return Vec::new();
    };

    let lift = Vec3::Y * (height * 0.5);
    let mut waypoints = vec![first];
    let mut origin = 0;

    for i in 1..raw.len() {
        if tester.is_clear(raw[origin] + lift, raw[i] + lift, width, height) {
            continue;
        }
        if i - 1 != origin {
            origin = i - 1;
            waypoints.push(raw[origin]);
        }
    }

    if origin != raw.len() - 1 {
        waypoints.push(raw[raw.len() - 1]);
    }
    waypoints
}
