use super::*;
use crate::budget::{ActivityKind, ActivityPoints};
use crate::hex::{TerrainDifficulty, TerrainType};
use crate::individual::IndividualActivity;

fn roster() -> Vec<RosterEntry> {
    vec![
        RosterEntry::new("Kyra", 30, 1),
        RosterEntry::new("Valeros", 30, 3),
    ]
}

fn engine() -> DayCycleEngine {
    DayCycleEngine::start(
        &roster(),
        &HexSetup::new(TerrainType::Plains, TerrainDifficulty::Open),
        Ruleset::Standard,
    )
    .unwrap()
}

fn to_activity_selection(engine: &mut DayCycleEngine, forced_march: bool) {
    engine.advance(PhaseInput::Continue).unwrap();
    engine.advance(PhaseInput::Continue).unwrap();
    engine.advance(PhaseInput::Continue).unwrap();
    engine.advance(PhaseInput::ForcedMarch(forced_march)).unwrap();
    engine.advance(PhaseInput::Roll(3)).unwrap();
    assert_eq!(engine.phase(), Phase::ActivitySelection);
}

fn open_hex() -> HexSetup {
    HexSetup::new(TerrainType::Plains, TerrainDifficulty::Open)
}

#[test]
fn morning_runs_in_order() {
    let mut engine = engine();
    let transition = engine.advance(PhaseInput::Continue).unwrap();
    assert_eq!(transition.from, Phase::StartOfDay);
    assert_eq!(transition.phase, Phase::FatigueCheck);
    assert_eq!(transition.emitted[0].text, "--- Starting Day 1 ---");

    engine.advance(PhaseInput::Continue).unwrap();
    let transition = engine.advance(PhaseInput::Continue).unwrap();
    assert_eq!(transition.phase, Phase::ForcedMarchOption);
    assert_eq!(
        transition.emitted[0].text,
        "Party has 2 hexploration activities today (Slowest: Kyra, 30 ft)."
    );
    assert_eq!(engine.session().budget.total, ActivityPoints::whole(2));
}

#[test]
fn rejected_input_leaves_session_untouched() {
    let mut engine = engine();
    for _ in 0..4 {
        engine.advance(PhaseInput::Continue).unwrap();
    }
    assert_eq!(engine.phase(), Phase::RandomEncounter);
    let before = engine.session().clone();

    let err = engine.advance(PhaseInput::Roll(21)).unwrap_err();
    assert_eq!(
        err,
        EngineError::InvalidRoll {
            value: 21,
            min: 1,
            max: 20
        }
    );
    let err = engine
        .advance(PhaseInput::Encounter {
            roll: 12,
            type_rolls: vec![11],
        })
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidRoll { max: 10, .. }));
    let err = engine.advance(PhaseInput::ForcedMarch(true)).unwrap_err();
    assert!(matches!(
        err,
        EngineError::UnexpectedInput {
            phase: Phase::RandomEncounter,
            expected: InputKind::EncounterRoll
        }
    ));
    assert_eq!(engine.session(), &before);
}

#[test]
fn step_is_pure_for_identical_inputs() {
    let engine = engine();
    let (first, a) = step(engine.session(), PhaseInput::Continue).unwrap();
    let (second, b) = step(engine.session(), PhaseInput::Continue).unwrap();
    assert_eq!(first, second);
    assert_eq!(a, b);
    assert_eq!(engine.phase(), Phase::StartOfDay);
}

#[test]
fn encounter_types_are_logged() {
    let mut engine = engine();
    for _ in 0..4 {
        engine.advance(PhaseInput::Continue).unwrap();
    }
    let transition = engine
        .advance(PhaseInput::Encounter {
            roll: 20,
            type_rolls: vec![9],
        })
        .unwrap();
    let texts: Vec<&str> = transition.emitted.iter().map(|e| e.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Random Encounter Check (DC 12): rolled 20 - Success. 1 encounter.",
            "Encounter 1: creature.",
        ]
    );
    assert_eq!(engine.session().today.encounters_today(), 1);
}

#[test]
fn critical_encounter_without_type_rolls_is_undetermined() {
    let mut engine = DayCycleEngine::start(
        &roster(),
        &HexSetup::new(TerrainType::Plains, TerrainDifficulty::Open).with_road(true),
        Ruleset::Standard,
    )
    .unwrap();
    for _ in 0..4 {
        engine.advance(PhaseInput::Continue).unwrap();
    }
    let transition = engine.advance(PhaseInput::Roll(20)).unwrap();
    assert_eq!(engine.session().today.encounters_today(), 2);
    assert_eq!(transition.emitted[2].text, "Encounter 2: type undetermined.");
}

#[test]
fn forced_march_rejects_costly_destination_and_other_activities() {
    let mut engine = engine();
    to_activity_selection(&mut engine, true);
    assert_eq!(engine.session().budget.total, ActivityPoints::ONE);

    let err = engine
        .advance(PhaseInput::Activity(ActivityChoice::GroupActivity))
        .unwrap_err();
    assert_eq!(err, EngineError::ForcedMarchTravelOnly);

    engine
        .advance(PhaseInput::Activity(ActivityChoice::Travel))
        .unwrap();
    let err = engine
        .advance(PhaseInput::Travel(HexSetup::new(
            TerrainType::Forest,
            TerrainDifficulty::Difficult,
        )))
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::InsufficientActivityPoints {
            required: ActivityPoints::whole(2),
            remaining: ActivityPoints::ONE
        }
    );

    let transition = engine
        .advance(PhaseInput::Travel(
            HexSetup::new(TerrainType::Forest, TerrainDifficulty::Difficult).with_road(true),
        ))
        .unwrap();
    assert_eq!(transition.phase, Phase::EndOfDay);
    assert_eq!(engine.session().hex.terrain_type, TerrainType::Forest);

    let keys: Vec<&str> = transition.emitted.iter().map(|e| e.key.as_str()).collect();
    let traveled = keys
        .iter()
        .position(|k| *k == crate::constants::LOG_TRAVELED)
        .unwrap();
    assert_eq!(keys[traveled + 1], crate::constants::LOG_FORCED_MARCH_COMPLETED);
    assert_eq!(
        transition.emitted[traveled + 1].text,
        "Forced March travel completed. Proceeding to End of Day."
    );
}

#[test]
fn ordinary_travel_does_not_log_forced_march_completion() {
    let mut engine = engine();
    to_activity_selection(&mut engine, false);
    engine
        .advance(PhaseInput::Activity(ActivityChoice::GroupActivity))
        .unwrap();
    engine.advance(PhaseInput::Group(GroupChoice::Travel)).unwrap();
    let transition = engine.advance(PhaseInput::Travel(open_hex())).unwrap();
    assert_eq!(transition.phase, Phase::ActivitySelection);
    assert!(
        engine
            .log()
            .iter()
            .all(|e| e.key != crate::constants::LOG_FORCED_MARCH_COMPLETED)
    );
}

#[test]
fn forced_march_unavailable_while_fatigued() {
    let mut engine = engine();
    let mut session = engine.session().clone();
    session.party.iter_mut().for_each(|c| {
        c.forced_march_days = 2;
    });
    let first = session.party.members()[0].id;
    session.party.get_mut(first).unwrap().is_fatigued = true;
    engine = DayCycleEngine::from_session(session);

    engine.advance(PhaseInput::Continue).unwrap();
    let valeros = engine.session().party.members()[1].id;
    let err = engine
        .advance(PhaseInput::Rest(vec![RestDecision {
            character: valeros,
            rest: true,
        }]))
        .unwrap_err();
    assert_eq!(err, EngineError::NotFatigued(valeros));

    let kyra = engine.session().party.members()[0].id;
    engine
        .advance(PhaseInput::Rest(vec![RestDecision {
            character: kyra,
            rest: false,
        }]))
        .unwrap();
    engine.advance(PhaseInput::Continue).unwrap();
    assert!(matches!(
        engine.advance(PhaseInput::ForcedMarch(true)),
        Err(EngineError::ForcedMarchUnavailable)
    ));
    engine.advance(PhaseInput::Continue).unwrap();
    assert!(engine.session().party.iter().all(|c| c.forced_march_days == 0));
}

#[test]
fn reconnoiter_twice_is_rejected() {
    let mut engine = engine();
    to_activity_selection(&mut engine, false);
    engine
        .advance(PhaseInput::Activity(ActivityChoice::GroupActivity))
        .unwrap();
    engine.advance(PhaseInput::Group(GroupChoice::Reconnoiter)).unwrap();
    let transition = engine
        .advance(PhaseInput::Reconnoiter {
            hidden_features_found: true,
        })
        .unwrap();
    assert_eq!(transition.phase, Phase::ActivitySelection);
    assert_eq!(transition.emitted[1].text, "Hidden features were discovered!");

    engine
        .advance(PhaseInput::Activity(ActivityChoice::GroupActivity))
        .unwrap();
    assert_eq!(
        engine.advance(PhaseInput::Group(GroupChoice::Reconnoiter)),
        Err(EngineError::AlreadyReconnoitered)
    );
    assert!(!engine.view().offers(AvailableAction::Reconnoiter));
}

#[test]
fn back_navigation_never_refunds() {
    let mut engine = engine();
    to_activity_selection(&mut engine, false);
    engine
        .advance(PhaseInput::Activity(ActivityChoice::GroupActivity))
        .unwrap();
    engine.advance(PhaseInput::Group(GroupChoice::Travel)).unwrap();
    engine.advance(PhaseInput::Travel(open_hex())).unwrap();
    assert_eq!(engine.session().budget.remaining, ActivityPoints::ONE);

    engine
        .advance(PhaseInput::Activity(ActivityChoice::GroupActivity))
        .unwrap();
    engine.advance(PhaseInput::Group(GroupChoice::Travel)).unwrap();
    assert_eq!(engine.advance(PhaseInput::Back).unwrap().phase, Phase::GroupActivity);
    assert_eq!(engine.advance(PhaseInput::Back).unwrap().phase, Phase::ActivitySelection);
    assert_eq!(engine.session().budget.remaining, ActivityPoints::ONE);
    assert_eq!(engine.session().budget.used.as_slice(), &[ActivityKind::Travel]);
}

#[test]
fn individual_round_validates_selections() {
    let mut engine = engine();
    to_activity_selection(&mut engine, false);
    engine
        .advance(PhaseInput::Activity(ActivityChoice::IndividualActivities))
        .unwrap();
    let kyra = engine.session().party.members()[0].id;
    let valeros = engine.session().party.members()[1].id;

    assert_eq!(
        engine.advance(PhaseInput::Individual(vec![IndividualSelection::new(
            kyra,
            IndividualActivity::None
        )])),
        Err(EngineError::NoIndividualActivitySelected)
    );
    assert!(matches!(
        engine.advance(PhaseInput::Individual(vec![IndividualSelection::new(
            kyra,
            IndividualActivity::MapArea
        )])),
        Err(EngineError::ActivityUnavailable { .. })
    ));
    assert_eq!(
        engine.advance(PhaseInput::Individual(vec![
            IndividualSelection::new(kyra, IndividualActivity::Seek),
            IndividualSelection::new(kyra, IndividualActivity::Aid),
        ])),
        Err(EngineError::DuplicateSelection(kyra))
    );

    let transition = engine
        .advance(PhaseInput::Individual(vec![
            IndividualSelection::new(kyra, IndividualActivity::FortifyCamp).with_check(19, 16),
            IndividualSelection::new(valeros, IndividualActivity::Subsist),
        ]))
        .unwrap();
    assert_eq!(transition.phase, Phase::ActivitySelection);
    assert!(engine.session().camp_fortified);
    assert_eq!(engine.session().budget.remaining, ActivityPoints::ONE);
    assert_eq!(
        transition.emitted[0].text,
        "Kyra: fortify-camp (total 19 vs DC 16) - Success."
    );
    assert_eq!(transition.emitted[2].text, "Valeros: subsist (resolved manually).");
}

#[test]
fn ending_early_logs_unused_points() {
    let mut engine = engine();
    to_activity_selection(&mut engine, false);
    let transition = engine
        .advance(PhaseInput::Activity(ActivityChoice::EndDay))
        .unwrap();
    assert_eq!(transition.phase, Phase::EndOfDay);
    assert_eq!(
        transition.emitted[0].text,
        "Party chose to end the day early with 2 activity points remaining."
    );
    assert_eq!(
        transition.emitted.last().unwrap().text,
        "--- End of Day 1 ---"
    );
}

#[test]
fn terminated_session_rejects_everything() {
    let mut engine = engine();
    to_activity_selection(&mut engine, false);
    engine
        .advance(PhaseInput::Activity(ActivityChoice::EndDay))
        .unwrap();
    let transition = engine
        .advance(PhaseInput::EndOfDay(DayEndChoice::EndExploration))
        .unwrap();
    assert_eq!(transition.phase, Phase::Terminated);
    assert_eq!(
        transition.emitted[0].text,
        "=== Exploration Ended After Day 1 ==="
    );
    assert!(engine.session().is_terminated());
    assert_eq!(
        engine.advance(PhaseInput::Continue),
        Err(EngineError::SessionTerminated)
    );
}

#[test]
fn phase_tags_round_trip_through_strings() {
    for phase in Phase::ALL {
        assert_eq!(phase.as_str().parse::<Phase>(), Ok(phase));
    }
    assert_eq!(
        "lunch".parse::<Phase>(),
        Err(EngineError::UnknownPhase("lunch".to_string()))
    );
}
