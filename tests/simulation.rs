use vectare::arena::{GoalRegion, Silhouette, TrackMask, VehicleShape, on_track, reached_goal};
use vectare::config::{ArenaConfig, EvaluationConfig, VehicleConfig};
use vectare::evaluator::{Outcome, PolicyRecord, evaluate_generation};
use vectare::model::{ControlIntent, Lateral, Longitudinal, VehicleState};
use vectare::policy::{Policy, Steering};
use vectare::sensor::{Observation, encode};

struct ConstPolicy {
    throttle: f64,
    turn: f64,
}

impl Policy for ConstPolicy {
    fn decide(&self, _obs: &Observation) -> Steering {
        Steering {
            throttle: self.throttle,
            turn: self.turn,
        }
    }
}

fn arena_cfg() -> ArenaConfig {
    ArenaConfig {
        width: 800,
        height: 800,
        track_path: vec![(550.0, 700.0), (200.0, 25.0)],
        track_half_width: 60.0,
        goal_x: 200.0,
        goal_y: 25.0,
        goal_width: 32,
        goal_height: 32,
    }
}

fn vehicle_cfg() -> VehicleConfig {
    VehicleConfig {
        width: 32,
        height: 64,
        spawn_x: 550.0,
        spawn_y: 700.0,
        spawn_tilt: 90.0,
        turn_rate: 5.0,
        speed_on_track: 12.0,
        speed_off_track: 2.0,
    }
}

fn eval_cfg(max_ticks: u32) -> EvaluationConfig {
    EvaluationConfig {
        max_ticks,
        goal_bonus: 50.0,
    }
}

fn full_track(arena: &ArenaConfig) -> TrackMask {
    TrackMask::new(Silhouette::filled(arena.width, arena.height))
}

fn accelerate() -> ControlIntent {
    ControlIntent {
        longitudinal: Longitudinal::Accelerate,
        lateral: Lateral::Straight,
    }
}

#[test]
fn velocity_never_exceeds_max_speed() {
    for max_speed in [0.0, 0.5, 2.0, 12.0] {
        let mut state = VehicleState::new(100.0, 100.0, 30.0, max_speed);
        for _ in 0..50 {
            state.apply_intent(accelerate(), 5.0);
            state.integrate();
            let (vel_x, vel_y) = state.vel();
            assert!(vel_x.abs() <= max_speed, "vel_x {vel_x} exceeds {max_speed}");
            assert!(vel_y.abs() <= max_speed, "vel_y {vel_y} exceeds {max_speed}");
        }
    }
}

#[test]
fn idle_velocity_decays_toward_zero() {
    let mut state = VehicleState::new(0.0, 0.0, 30.0, 100.0);
    state.apply_intent(
        ControlIntent {
            longitudinal: Longitudinal::Accelerate,
            lateral: Lateral::Left,
        },
        5.0,
    );

    let mut speeds = Vec::new();
    let mut rots = Vec::new();
    for _ in 0..6 {
        state.integrate();
        let (vel_x, vel_y) = state.vel();
        speeds.push(vel_x.hypot(vel_y));
        rots.push(state.rot().abs());
    }

    // The first tick divides by one, so strict decrease starts at the second.
    for k in 1..speeds.len() {
        assert!(speeds[k] < speeds[k - 1]);
        assert!(rots[k] < rots[k - 1]);
    }
    // Decay only reaches zero in the limit.
    assert!(speeds.last().unwrap() > &0.0);
    assert!(rots.last().unwrap() > &0.0);
}

#[test]
fn overlap_is_reflexive_under_zero_offset() {
    let goal = GoalRegion::new(200.0, 25.0, 32, 32);
    let shape = VehicleShape::new(32, 32);
    let state = VehicleState::new(200.0, 25.0, 90.0, 2.0);

    let (silhouette, offset) = shape.silhouette_at(&state);
    assert!(reached_goal(&silhouette, offset, &goal));

    let track = full_track(&arena_cfg());
    assert!(on_track(&silhouette, offset, &track));
}

#[test]
fn rotated_silhouette_swaps_dimensions_at_right_angles() {
    let base = Silhouette::filled(32, 64);
    let quarter = base.rotated(90.0);
    assert_eq!((quarter.width(), quarter.height()), (64, 32));
    let identity = base.rotated(0.0);
    assert_eq!((identity.width(), identity.height()), (32, 64));
}

#[test]
fn observation_order_is_fixed() {
    let arena = arena_cfg();
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);
    let track = full_track(&arena);
    let shape = VehicleShape::new(32, 64);
    let state = VehicleState::new(550.0, 700.0, 90.0, 2.0);

    let obs = encode(&state, &shape, &goal, &track);
    let expected_dist = (550.0f64 - 200.0).hypot(700.0 - 25.0);
    assert_eq!(
        obs.as_array(),
        [550.0, 700.0, expected_dist, 1.0, 90.0, 200.0, 25.0]
    );
}

#[test]
fn steering_thresholds_leave_a_dead_zone() {
    let intent = |throttle, turn| Steering { throttle, turn }.to_intent();

    assert_eq!(intent(0.5, 0.5), ControlIntent::default());
    assert_eq!(intent(-0.5, -0.5), ControlIntent::default());
    assert_eq!(intent(0.51, 0.0).longitudinal, Longitudinal::Accelerate);
    assert_eq!(intent(-0.51, 0.0).longitudinal, Longitudinal::Decelerate);
    assert_eq!(intent(0.0, 0.51).lateral, Lateral::Left);
    assert_eq!(intent(0.0, -0.51).lateral, Lateral::Right);
}

#[test]
fn idle_policy_times_out_with_zero_fitness() {
    let arena = arena_cfg();
    let vehicle = vehicle_cfg();
    let eval = eval_cfg(50);
    let track = full_track(&arena);
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let mut records = vec![PolicyRecord::new(
        0,
        Box::new(ConstPolicy {
            throttle: 0.0,
            turn: 0.0,
        }),
    )];
    evaluate_generation(
        &mut records,
        &track,
        &goal,
        &arena,
        &vehicle,
        &eval,
        &mut || false,
    );

    // The agent never vanishes: it stays active for the full budget.
    assert_eq!(records[0].outcome, Some(Outcome::Timeout));
    assert_eq!(records[0].ticks_survived, 50);
    assert_eq!(records[0].fitness, 0.0);
}

#[test]
fn goal_reach_awards_exactly_the_bonus_formula() {
    let arena = ArenaConfig {
        goal_x: 400.0,
        goal_y: 300.0,
        ..arena_cfg()
    };
    let vehicle = VehicleConfig {
        spawn_x: 400.0,
        spawn_y: 400.0,
        spawn_tilt: 90.0,
        ..vehicle_cfg()
    };
    let eval = eval_cfg(300);
    let track = full_track(&arena);
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let mut records = vec![PolicyRecord::new(
        0,
        Box::new(ConstPolicy {
            throttle: 1.0,
            turn: 0.0,
        }),
    )];
    evaluate_generation(
        &mut records,
        &track,
        &goal,
        &arena,
        &vehicle,
        &eval,
        &mut || false,
    );

    let record = &records[0];
    assert_eq!(record.outcome, Some(Outcome::Succeeded));
    assert!(record.ticks_survived < 300);
    let expected = 50.0 + f64::from(300 - record.ticks_survived);
    assert_eq!(record.fitness, expected);
}

#[test]
fn up_left_runner_terminates_reproducibly() {
    let arena = arena_cfg();
    let vehicle = VehicleConfig {
        spawn_tilt: 135.0,
        ..vehicle_cfg()
    };
    let eval = eval_cfg(300);
    let track = TrackMask::rasterize(
        arena.width,
        arena.height,
        &arena.track_path,
        arena.track_half_width,
    );
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let run = || {
        let mut records = vec![PolicyRecord::new(
            0,
            Box::new(ConstPolicy {
                throttle: 1.0,
                turn: 0.0,
            }),
        )];
        evaluate_generation(
            &mut records,
            &track,
            &goal,
            &arena,
            &vehicle,
            &eval,
            &mut || false,
        );
        let record = records.remove(0);
        (record.outcome, record.fitness, record.ticks_survived)
    };

    let first = run();
    assert!(matches!(
        first.0,
        Some(Outcome::OutOfBounds) | Some(Outcome::Timeout)
    ));
    assert!(first.2 <= 300);

    // No randomness in the core: repeat runs are bit-for-bit identical.
    assert_eq!(run(), first);
}

#[test]
fn identical_agents_do_not_interfere() {
    let arena = arena_cfg();
    let vehicle = vehicle_cfg();
    let eval = eval_cfg(200);
    let track = TrackMask::rasterize(
        arena.width,
        arena.height,
        &arena.track_path,
        arena.track_half_width,
    );
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let mut records: Vec<PolicyRecord> = (0..2)
        .map(|id| {
            PolicyRecord::new(
                id,
                Box::new(ConstPolicy {
                    throttle: 1.0,
                    turn: 0.6,
                }),
            )
        })
        .collect();
    evaluate_generation(
        &mut records,
        &track,
        &goal,
        &arena,
        &vehicle,
        &eval,
        &mut || false,
    );

    assert_eq!(records[0].fitness, records[1].fitness);
    assert_eq!(records[0].outcome, records[1].outcome);
    assert_eq!(records[0].ticks_survived, records[1].ticks_survived);
}

#[test]
fn malformed_policy_output_is_a_no_op() {
    let arena = arena_cfg();
    let vehicle = vehicle_cfg();
    let eval = eval_cfg(40);
    let track = full_track(&arena);
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let mut records = vec![
        PolicyRecord::new(
            0,
            Box::new(ConstPolicy {
                throttle: f64::NAN,
                turn: f64::INFINITY,
            }),
        ),
        PolicyRecord::new(
            1,
            Box::new(ConstPolicy {
                throttle: 0.0,
                turn: 0.0,
            }),
        ),
    ];
    evaluate_generation(
        &mut records,
        &track,
        &goal,
        &arena,
        &vehicle,
        &eval,
        &mut || false,
    );

    // A misbehaving policy coasts instead of aborting the generation.
    assert_eq!(records[0].outcome, records[1].outcome);
    assert_eq!(records[0].fitness, records[1].fitness);
    assert_eq!(records[0].ticks_survived, records[1].ticks_survived);
}

#[test]
fn empty_population_returns_immediately() {
    let arena = arena_cfg();
    let track = full_track(&arena);
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let mut records: Vec<PolicyRecord> = Vec::new();
    evaluate_generation(
        &mut records,
        &track,
        &goal,
        &arena,
        &vehicle_cfg(),
        &eval_cfg(100),
        &mut || panic!("no tick should be processed"),
    );
}

#[test]
fn early_stop_drains_every_agent_to_a_terminal_state() {
    let arena = arena_cfg();
    let vehicle = vehicle_cfg();
    let eval = eval_cfg(1000);
    let track = full_track(&arena);
    let goal = GoalRegion::new(arena.goal_x, arena.goal_y, 32, 32);

    let mut records: Vec<PolicyRecord> = (0..3)
        .map(|id| {
            PolicyRecord::new(
                id,
                Box::new(ConstPolicy {
                    throttle: 1.0,
                    turn: 0.0,
                }),
            )
        })
        .collect();

    let mut ticks = 0;
    evaluate_generation(
        &mut records,
        &track,
        &goal,
        &arena,
        &vehicle,
        &eval,
        &mut || {
            ticks += 1;
            ticks > 5
        },
    );

    for record in &records {
        assert!(record.outcome.is_some());
        assert_eq!(record.ticks_survived, 5);
    }
}
