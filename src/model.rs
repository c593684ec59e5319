//! Vehicle state and per-tick dynamics.

use serde::{Deserialize, Serialize};

/// Discrete control impulses applied at most once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlIntent {
    pub longitudinal: Longitudinal,
    pub lateral: Lateral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Longitudinal {
    #[default]
    Coast,
    Accelerate,
    Decelerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lateral {
    #[default]
    Straight,
    Left,
    Right,
}

/// Physical state of one vehicle.
///
/// Velocities dissipate through a decaying-impulse model: each tick the
/// velocity is divided by the number of ticks since the last impulse, so an
/// impulse's contribution shrinks toward zero without ever reaching it. This
/// is the behavioral target, not a physical friction law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    x: f64,
    y: f64,
    /// Heading in degrees, screen coordinates (y grows downward).
    tilt: f64,
    vel_x: f64,
    vel_y: f64,
    rot: f64,
    accel_tick: u32,
    rot_tick: u32,
    max_speed: f64,
}

impl VehicleState {
    pub fn new(x: f64, y: f64, tilt: f64, max_speed: f64) -> Self {
        Self {
            x,
            y,
            tilt,
            vel_x: 0.0,
            vel_y: 0.0,
            rot: 0.0,
            accel_tick: 0,
            rot_tick: 0,
            max_speed,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn tilt(&self) -> f64 {
        self.tilt
    }

    pub fn vel(&self) -> (f64, f64) {
        (self.vel_x, self.vel_y)
    }

    pub fn rot(&self) -> f64 {
        self.rot
    }

    pub fn max_speed(&self) -> f64 {
        self.max_speed
    }

    /// Record the impulses for the next integration step.
    ///
    /// An accelerate impulse adds a unit vector along the current heading to
    /// the velocity, a decelerate impulse subtracts it; turn impulses set the
    /// angular rate to the full turn rate rather than accumulating. Each
    /// impulse resets its dissipation counter.
    pub fn apply_intent(&mut self, intent: ControlIntent, turn_rate: f64) {
        let (sin, cos) = self.tilt.to_radians().sin_cos();
        match intent.longitudinal {
            Longitudinal::Accelerate => {
                self.vel_x += cos;
                self.vel_y -= sin;
                self.accel_tick = 0;
            }
            Longitudinal::Decelerate => {
                self.vel_x -= cos;
                self.vel_y += sin;
                self.accel_tick = 0;
            }
            Longitudinal::Coast => {}
        }
        match intent.lateral {
            Lateral::Left => {
                self.rot = turn_rate;
                self.rot_tick = 0;
            }
            Lateral::Right => {
                self.rot = -turn_rate;
                self.rot_tick = 0;
            }
            Lateral::Straight => {}
        }
    }

    /// Advance the state by one tick.
    pub fn integrate(&mut self) {
        self.accel_tick += 1;
        self.rot_tick += 1;

        // Decaying-impulse friction.
        self.vel_x /= self.accel_tick as f64;
        self.vel_y /= self.accel_tick as f64;
        self.rot /= self.rot_tick as f64;

        self.tilt = (self.tilt + self.rot).rem_euclid(360.0);
        self.x += self.vel_x;
        self.y += self.vel_y;

        // Clamp after the position update, per axis.
        self.vel_x = self.vel_x.clamp(-self.max_speed, self.max_speed);
        self.vel_y = self.vel_y.clamp(-self.max_speed, self.max_speed);
    }

    /// Change the speed limit in place; takes effect at the next clamp.
    pub fn set_max_speed(&mut self, max_speed: f64) {
        self.max_speed = max_speed;
    }
}
