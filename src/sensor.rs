//! Fixed-order observation vector fed to policies.

use crate::arena::{GoalRegion, TrackMask, VehicleShape, on_track};
use crate::model::VehicleState;

/// What a policy sees each tick. Field order is part of the policy contract
/// and mirrors [`Observation::as_array`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub x: f64,
    pub y: f64,
    pub goal_dist: f64,
    pub on_track: bool,
    pub tilt: f64,
    pub goal_x: f64,
    pub goal_y: f64,
}

impl Observation {
    /// [x, y, distance to goal, on-track flag (0/1), tilt, goal.x, goal.y].
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.x,
            self.y,
            self.goal_dist,
            if self.on_track { 1.0 } else { 0.0 },
            self.tilt,
            self.goal_x,
            self.goal_y,
        ]
    }
}

/// Encode the observation for one vehicle. Pure and deterministic; the
/// on-track flag is recomputed from the collision field, never cached.
pub fn encode(
    state: &VehicleState,
    shape: &VehicleShape,
    goal: &GoalRegion,
    track: &TrackMask,
) -> Observation {
    let (silhouette, offset) = shape.silhouette_at(state);
    Observation {
        x: state.x(),
        y: state.y(),
        goal_dist: goal_distance(state, goal),
        on_track: on_track(&silhouette, offset, track),
        tilt: state.tilt(),
        goal_x: goal.x(),
        goal_y: goal.y(),
    }
}

/// Straight-line distance from the vehicle position to the goal position, in
/// pixels.
pub fn goal_distance(state: &VehicleState, goal: &GoalRegion) -> f64 {
    let dx = state.x() - goal.x();
    let dy = state.y() - goal.y();
    dx.hypot(dy)
}
