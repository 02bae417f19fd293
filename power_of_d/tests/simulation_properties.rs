// End-to-end properties of full simulation runs

use power_of_d::{
    GenerationMode, QueueSnapshot, RoutingPolicy, SimError, Simulation, SimulationConfig,
    SnapshotKind, TimeDistribution,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn config(generation: GenerationMode, horizon: f64) -> SimulationConfig {
    SimulationConfig {
        generation,
        horizon,
        arrival: TimeDistribution::Exponential { mean: 1.0 },
        service: TimeDistribution::Exponential { mean: 3.5 },
        seed: 204_204,
        parallelism: 4,
        d: 2,
        capacity: 1,
        verbose: false,
    }
}

fn snapshot(time: f64, job_id: usize, kind: SnapshotKind, lengths: Vec<usize>) -> QueueSnapshot {
    QueueSnapshot {
        time,
        job_id,
        kind,
        lengths,
    }
}

// ============================================================================
// Worked scenario: two queues, d = 2, service 5, arrivals at t = 0, 1, 2
// ============================================================================

#[test]
fn given_three_jobs_on_two_queues_then_log_follows_the_sampled_decisions() {
    let seed = 77;
    let scenario = SimulationConfig {
        generation: GenerationMode::Bounded { count: 3 },
        horizon: 100.0,
        arrival: TimeDistribution::Deterministic { value: 1.0 },
        service: TimeDistribution::Deterministic { value: 5.0 },
        seed,
        parallelism: 2,
        d: 2,
        capacity: 1,
        verbose: false,
    };

    // Replay the bank's routing draws (deterministic service consumes none)
    let policy = RoutingPolicy::new(2, 2).unwrap();
    let mut replay = StdRng::seed_from_u64(seed + 1);
    let first_draw = policy.sample(&mut replay);
    let _second_draw = policy.sample(&mut replay);
    let third_draw = policy.sample(&mut replay);

    // job0: both empty, tie goes to the first sampled queue
    let q0 = first_draw[0];
    // job1: one busy queue, one empty, must take the empty one
    let q1 = 1 - q0;
    // job2: both at length 1, first sampled wins again
    let q2 = third_draw[0];

    let with = |pairs: [(usize, usize); 2]| {
        let mut lengths = vec![0; 2];
        for (q, len) in pairs {
            lengths[q] = len;
        }
        lengths
    };

    let mut expected = vec![
        snapshot(0.0, 0, SnapshotKind::Decision, vec![0, 0]),
        snapshot(1.0, 1, SnapshotKind::Decision, with([(q0, 1), (q1, 0)])),
        snapshot(2.0, 2, SnapshotKind::Decision, vec![1, 1]),
    ];
    if q2 == q0 {
        // job2 queues behind job0 and starts at t=5
        expected.extend([
            snapshot(5.0, 0, SnapshotKind::Completion, vec![1, 1]),
            snapshot(6.0, 1, SnapshotKind::Completion, with([(q0, 1), (q1, 0)])),
            snapshot(10.0, 2, SnapshotKind::Completion, vec![0, 0]),
        ]);
    } else {
        // job2 queues behind job1 and starts at t=6
        expected.extend([
            snapshot(5.0, 0, SnapshotKind::Completion, with([(q0, 0), (q1, 2)])),
            snapshot(6.0, 1, SnapshotKind::Completion, with([(q0, 0), (q1, 1)])),
            snapshot(11.0, 2, SnapshotKind::Completion, vec![0, 0]),
        ]);
    }

    let report = Simulation::new(scenario).unwrap().run().unwrap();
    assert_eq!(report.snapshots, expected);
    assert_eq!(report.completed, 3);
    assert_eq!(report.max_wait, if q2 == q0 { 3.0 } else { 4.0 });
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn given_same_seed_then_identical_event_sequence_and_log() {
    let simulation = Simulation::new(config(GenerationMode::Unbounded, 500.0)).unwrap();

    let run = || {
        let mut event_loop = simulation.event_loop(11).unwrap();
        event_loop.record_history();
        event_loop.run(500.0).unwrap();
        (event_loop.history().unwrap().to_vec(), event_loop.stats())
    };

    let (history_a, stats_a) = run();
    let (history_b, stats_b) = run();
    assert!(!history_a.is_empty());
    assert_eq!(history_a, history_b);
    assert_eq!(stats_a, stats_b);
}

#[test]
fn given_different_seeds_then_logs_differ() {
    let simulation = Simulation::new(config(GenerationMode::Bounded { count: 200 }, 1e6)).unwrap();
    let a = simulation.run_seed(1).unwrap();
    let b = simulation.run_seed(2).unwrap();
    assert_ne!(a.snapshots, b.snapshots);
}

// ============================================================================
// Accounting
// ============================================================================

#[test]
fn given_any_run_then_jobs_are_conserved() {
    let report = Simulation::new(config(GenerationMode::Unbounded, 2_000.0))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.generated, report.completed + report.in_system);
    let queued: usize = report.resources.iter().map(|r| r.length()).sum();
    assert_eq!(queued, report.in_system);

    // Every decision snapshot sees the arriving job's predecessors only, and
    // every completion snapshot has already dropped the finished job.
    let mut in_system: i64 = 0;
    for snap in &report.snapshots {
        match snap.kind {
            SnapshotKind::Decision => {
                assert_eq!(snap.total() as i64, in_system);
                in_system += 1;
            }
            SnapshotKind::Completion => {
                in_system -= 1;
                assert_eq!(snap.total() as i64, in_system);
            }
        }
        assert!(in_system >= 0);
    }
}

#[test]
fn given_single_queue_then_jobs_finish_in_arrival_order() {
    let mut fifo = config(GenerationMode::Bounded { count: 300 }, 1e9);
    fifo.parallelism = 1;
    fifo.d = 1;

    let report = Simulation::new(fifo).unwrap().run().unwrap();
    let finished: Vec<usize> = report
        .snapshots
        .iter()
        .filter(|s| s.kind == SnapshotKind::Completion)
        .map(|s| s.job_id)
        .collect();
    assert_eq!(finished, (0..300).collect::<Vec<_>>());
}

// ============================================================================
// Stop conditions
// ============================================================================

#[test]
fn given_horizon_then_nothing_recorded_beyond_it() {
    let horizon = 250.0;
    let simulation = Simulation::new(config(GenerationMode::Unbounded, horizon)).unwrap();
    let mut event_loop = simulation.event_loop(3).unwrap();
    event_loop.run(horizon).unwrap();

    assert!(event_loop.current_t() <= horizon);
    assert!(event_loop.pending() > 0, "the next arrival is left unexecuted");

    let report = simulation.run_seed(3).unwrap();
    assert!(!report.snapshots.is_empty());
    assert!(report.snapshots.iter().all(|s| s.time <= horizon));
    assert!(report.end_time <= horizon);
}

#[test]
fn given_bounded_mode_then_exactly_count_jobs_spawned() {
    let report = Simulation::new(config(GenerationMode::Bounded { count: 123 }, 1e9))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(report.generated, 123);
    let decisions = report
        .snapshots
        .iter()
        .filter(|s| s.kind == SnapshotKind::Decision)
        .count();
    assert_eq!(decisions, 123);
    assert_eq!(report.completed, 123);
    assert_eq!(report.in_system, 0);
}

#[test]
fn given_bounded_mode_and_short_horizon_then_in_flight_jobs_are_abandoned() {
    let report = Simulation::new(config(GenerationMode::Bounded { count: 1000 }, 50.0))
        .unwrap()
        .run()
        .unwrap();
    assert!(report.generated < 1000);
    assert_eq!(report.generated, report.completed + report.in_system);
}

// ============================================================================
// Configuration and replications
// ============================================================================

#[test]
fn given_bad_config_then_rejected_before_running() {
    let mut bad = config(GenerationMode::Unbounded, 100.0);
    bad.service = TimeDistribution::Exponential { mean: -1.0 };
    match Simulation::new(bad) {
        Err(SimError::Config(e)) => assert_eq!(e.field, "service"),
        other => panic!("Expected config error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn given_replications_then_results_are_reproducible() {
    let simulation = Simulation::new(config(GenerationMode::Bounded { count: 100 }, 1e6)).unwrap();
    let first: Vec<_> = simulation
        .run_replications(6, None)
        .into_iter()
        .map(Result::unwrap)
        .collect();
    let second: Vec<_> = simulation
        .run_replications(6, Some(3))
        .into_iter()
        .map(Result::unwrap)
        .collect();
    assert_eq!(first, second);
    assert!(first.iter().all(|r| r.completed == 100));
}

#[test]
fn given_more_choices_then_queues_are_more_balanced() {
    // Heavily loaded: 8 queues at 90% utilisation
    let mut base = config(GenerationMode::Bounded { count: 20_000 }, 1e9);
    base.parallelism = 8;
    base.arrival = TimeDistribution::Exponential { mean: 1.0 };
    base.service = TimeDistribution::Exponential { mean: 7.2 };

    let mut random = base.clone();
    random.d = 1;
    let mut two = base.clone();
    two.d = 2;

    let random = Simulation::new(random).unwrap().run().unwrap();
    let two = Simulation::new(two).unwrap().run().unwrap();

    assert!(
        two.mean_wait < random.mean_wait,
        "d=2 wait {} not below d=1 wait {}",
        two.mean_wait,
        random.mean_wait
    );
}
