//! Generation evaluator: advances all live agents in lockstep, applies
//! collision, goal and timeout rules, and reports fitness back to each
//! agent's policy record when it is retired.

use crate::arena::{GoalRegion, TrackMask, VehicleShape, reached_goal};
use crate::config::{ArenaConfig, EvaluationConfig, VehicleConfig};
use crate::model::VehicleState;
use crate::policy::Policy;
use crate::sensor::{encode, goal_distance};
use serde::{Deserialize, Serialize};

/// Terminal state of one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Succeeded,
    OutOfBounds,
    Timeout,
}

/// One (identifier, policy) entry of the population under evaluation.
///
/// The evaluator communicates entirely by mutating these records: `fitness`
/// is always set before [`evaluate_generation`] returns, together with the
/// terminal outcome and a few bookkeeping fields the search layer reads.
pub struct PolicyRecord {
    pub id: usize,
    pub policy: Box<dyn Policy>,
    pub fitness: f64,
    pub outcome: Option<Outcome>,
    /// Closest approach to the goal over the agent's lifetime, in pixels.
    pub closest_goal_dist: f64,
    /// Ticks the agent stayed active.
    pub ticks_survived: u32,
}

impl PolicyRecord {
    pub fn new(id: usize, policy: Box<dyn Policy>) -> Self {
        Self {
            id,
            policy,
            fitness: 0.0,
            outcome: None,
            closest_goal_dist: f64::INFINITY,
            ticks_survived: 0,
        }
    }
}

/// One live agent: a vehicle bound to the policy record at `record_idx`.
struct Agent {
    record_idx: usize,
    state: VehicleState,
    fitness: f64,
    closest_goal_dist: f64,
    pending: Option<Outcome>,
}

/// Run one generation to completion.
///
/// Every still-active agent observes, decides and moves within the same tick
/// before any global check fires, so all agents see a consistent tick count.
/// Agents are classified first and removed in a separate partition step each
/// tick; removal order among simultaneously-terminal agents carries no
/// meaning. The `stop` hook is polled once per tick; when it reports true,
/// every remaining agent is drained to a terminal state before returning, so
/// fitness is always well-defined. An empty population returns immediately.
pub fn evaluate_generation<F>(
    records: &mut [PolicyRecord],
    track: &TrackMask,
    goal: &GoalRegion,
    arena: &ArenaConfig,
    vehicle: &VehicleConfig,
    eval: &EvaluationConfig,
    stop: &mut F,
) where
    F: FnMut() -> bool,
{
    if records.is_empty() {
        return;
    }

    let shape = VehicleShape::new(vehicle.width, vehicle.height);

    let mut active: Vec<Agent> = (0..records.len())
        .map(|record_idx| {
            let state = VehicleState::new(
                vehicle.spawn_x,
                vehicle.spawn_y,
                vehicle.spawn_tilt,
                vehicle.speed_off_track,
            );
            let closest_goal_dist = goal_distance(&state, goal);
            Agent {
                record_idx,
                state,
                fitness: 0.0,
                closest_goal_dist,
                pending: None,
            }
        })
        .collect();

    for tick in 1..=eval.max_ticks {
        if stop() {
            retire_all(&mut active, records, tick - 1, Outcome::Timeout);
            return;
        }

        for agent in &mut active {
            let obs = encode(&agent.state, &shape, goal, track);
            let steering = records[agent.record_idx].policy.decide(&obs);

            agent.state.apply_intent(steering.to_intent(), vehicle.turn_rate);
            agent.state.set_max_speed(if obs.on_track {
                vehicle.speed_on_track
            } else {
                vehicle.speed_off_track
            });
            agent.state.integrate();

            agent.closest_goal_dist = agent
                .closest_goal_dist
                .min(goal_distance(&agent.state, goal));

            let (silhouette, offset) = shape.silhouette_at(&agent.state);
            agent.pending = if reached_goal(&silhouette, offset, goal) {
                agent.fitness += eval.goal_bonus + f64::from(eval.max_ticks - tick);
                Some(Outcome::Succeeded)
            } else if out_of_bounds(&agent.state, arena) {
                Some(Outcome::OutOfBounds)
            } else {
                None
            };
        }

        // Apply removals only after every agent has been classified.
        for agent in &active {
            if let Some(outcome) = agent.pending {
                retire(agent, records, tick, outcome);
            }
        }
        active.retain(|agent| agent.pending.is_none());

        if active.is_empty() {
            return;
        }
    }

    // Budget exhausted: the remaining agents time out together.
    retire_all(&mut active, records, eval.max_ticks, Outcome::Timeout);
}

fn out_of_bounds(state: &VehicleState, arena: &ArenaConfig) -> bool {
    state.x() < 0.0
        || state.x() > arena.width as f64
        || state.y() < 0.0
        || state.y() > arena.height as f64
}

fn retire(agent: &Agent, records: &mut [PolicyRecord], tick: u32, outcome: Outcome) {
    let record = &mut records[agent.record_idx];
    record.fitness = agent.fitness;
    record.outcome = Some(outcome);
    record.closest_goal_dist = agent.closest_goal_dist;
    record.ticks_survived = tick;
}

fn retire_all(active: &mut Vec<Agent>, records: &mut [PolicyRecord], tick: u32, outcome: Outcome) {
    for agent in active.iter() {
        retire(agent, records, tick, outcome);
    }
    active.clear();
}
