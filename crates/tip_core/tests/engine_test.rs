use rand::rngs::mock::StepRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tip_core::catalog::{Catalog, ElementRole, Interaction, InteractionKind, Scenario, TippingElement};
use tip_core::frame::make_frame;
use tip_core::run::{SimulationRun, BASELINE_TEMP_C, START_YEAR};
use tip_core::stress::STRESS_MAX;
use tip_core::{collect_chronicle, tick_once};

/// `gen::<f64>()` from an all-zero stream is 0.0, so any positive hazard
/// probability tips; thresholds sample at their range minimum.
fn always_tip_rng() -> StepRng {
    StepRng::new(0, 0)
}

/// `gen::<f64>()` from this constant stream is exactly 0.5, above every
/// hazard probability the model can produce (0.4 at most), while staying
/// mid-range so float `gen_range` threshold sampling terminates.
fn never_tip_rng() -> StepRng {
    StepRng::new(1 << 63, 0)
}

fn cascade_pair_catalog() -> Catalog {
    let element = |id: &str, min: f64, max: f64| TippingElement {
        id: id.to_string(),
        name: id.to_uppercase(),
        short_name: id.to_uppercase(),
        description: String::new(),
        role: ElementRole::IceSheet,
        threshold_min_c: min,
        threshold_max_c: max,
        position: (0.0, 0.0),
    };
    Catalog {
        elements: vec![element("a", 1.0, 1.2), element("b", 5.0, 5.2)],
        interactions: vec![Interaction {
            from: "a".to_string(),
            to: "b".to_string(),
            kind: InteractionKind::Destabilizing,
            strength: 10.0,
            label: "a drags b over".to_string(),
        }],
        scenarios: vec![Scenario {
            id: "ramp".to_string(),
            name: "Ramp".to_string(),
            description: String::new(),
            target_temp_c: 6.0,
            years_to_target: 50,
        }],
    }
}

#[test]
fn temperature_ramp_hits_the_target_exactly() {
    let catalog = Catalog::builtin();
    let mut sample_rng = never_tip_rng();
    let mut run =
        SimulationRun::start(&catalog, "high", &mut sample_rng).expect("scenario exists");

    for _ in 0..75 {
        let diff = tick_once(&mut run, &catalog, &mut sample_rng).expect("tick succeeds");
        assert!(
            diff.temperature_c >= BASELINE_TEMP_C,
            "temperature regressed below the baseline"
        );
    }
    assert_eq!(run.year, 2100);
    assert_eq!(run.temperature_c, 4.0);

    // The plateau holds once the ramp is finished.
    for _ in 0..10 {
        tick_once(&mut run, &catalog, &mut sample_rng).expect("tick succeeds");
        assert_eq!(run.temperature_c, 4.0);
    }
    assert_eq!(run.year, 2110);
}

#[test]
fn cooling_scenario_never_drops_below_the_baseline() {
    // A catalog is free to carry a target under the run baseline; published
    // temperatures still floor at the baseline for the whole run.
    let mut catalog = cascade_pair_catalog();
    catalog.scenarios[0].target_temp_c = 0.5;
    catalog.scenarios[0].years_to_target = 10;
    catalog.validate().expect("catalog is well-formed");

    let mut rng = never_tip_rng();
    let mut run = SimulationRun::start(&catalog, "ramp", &mut rng).expect("scenario exists");

    for _ in 0..20 {
        let diff = tick_once(&mut run, &catalog, &mut rng).expect("tick succeeds");
        assert_eq!(diff.temperature_c, BASELINE_TEMP_C);
        assert_eq!(run.temperature_c, BASELINE_TEMP_C);
    }
}

#[test]
fn all_tipped_makes_the_run_terminal_and_halts_it() {
    let catalog = Catalog::builtin();
    let mut rng = always_tip_rng();
    let mut run = SimulationRun::start(&catalog, "surge", &mut rng).expect("scenario exists");

    let mut tipped_so_far = vec![false; run.elements.len()];
    let mut reached_terminal = false;
    for _ in 0..500 {
        let diff = tick_once(&mut run, &catalog, &mut rng).expect("tick succeeds");
        for (index, state) in run.elements.iter().enumerate() {
            assert!(
                !tipped_so_far[index] || state.tipped,
                "element {index} untipped without a reset"
            );
            tipped_so_far[index] = state.tipped;
        }
        if diff.terminal {
            reached_terminal = true;
            break;
        }
    }

    assert!(reached_terminal, "run never reached terminal");
    assert!(run.all_tipped());
    assert!(run.terminal);
    assert!(!run.running);
    for state in &run.elements {
        assert_eq!(state.stress, STRESS_MAX);
    }
}

#[test]
fn cascade_flag_marks_everything_after_the_first_event() {
    let catalog = cascade_pair_catalog();
    let mut rng = always_tip_rng();
    let mut run = SimulationRun::start(&catalog, "ramp", &mut rng).expect("scenario exists");

    while !run.terminal {
        tick_once(&mut run, &catalog, &mut rng).expect("tick succeeds");
        assert!(run.year < START_YEAR + 200, "cascade never completed");
    }

    assert_eq!(run.events.len(), 2);
    assert_eq!(run.events[0].element_id, "a");
    assert!(!run.events[0].is_cascade, "first event is not a cascade");
    assert_eq!(run.events[1].element_id, "b");
    assert!(run.events[1].is_cascade, "second event rides the cascade");
    assert!(run.events[0].year < run.events[1].year);
}

#[test]
fn cascade_victim_only_tips_because_of_its_influencer() {
    // Without the a -> b interaction, b's baseline alone cannot reach the
    // hazard band before the ramp tops out at 6.0 degrees.
    let mut catalog = cascade_pair_catalog();
    catalog.interactions.clear();
    let mut rng = always_tip_rng();
    let mut run = SimulationRun::start(&catalog, "ramp", &mut rng).expect("scenario exists");

    for _ in 0..120 {
        if run.terminal {
            break;
        }
        tick_once(&mut run, &catalog, &mut rng).expect("tick succeeds");
    }

    assert!(run.elements[0].tipped);
    assert!(!run.elements[1].tipped);
    assert_eq!(run.events.len(), 1);
}

#[test]
fn paired_runs_with_one_seed_are_identical() {
    let run_once = || {
        let catalog = Catalog::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1_234_567);
        let mut run =
            SimulationRun::start(&catalog, "pledges", &mut rng).expect("scenario exists");
        let mut lines = Vec::new();
        for t in 1..=400u64 {
            if run.terminal {
                break;
            }
            let diff = tick_once(&mut run, &catalog, &mut rng).expect("tick succeeds");
            let chronicle = collect_chronicle(&catalog, &diff);
            let frame = make_frame(t, Some(&run), &catalog, chronicle);
            lines.push(frame.to_ndjson().expect("frame serializes"));
        }
        lines
    };

    let first = run_once();
    let second = run_once();
    assert_eq!(first, second);
}
