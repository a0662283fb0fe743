use hexploration_core::{
    ActivityChoice, DayCycleEngine, ExplorationSession, GroupChoice, HexSetup, Phase, PhaseInput,
    RosterEntry, Ruleset, TerrainDifficulty, TerrainType, step,
};

fn mid_day_engine() -> DayCycleEngine {
    let mut engine = DayCycleEngine::start(
        &[
            RosterEntry::new("Valeros", 30, 3),
            RosterEntry::new("Seelah", 20, 2),
        ],
        &HexSetup::new(TerrainType::Forest, TerrainDifficulty::Difficult).with_road(true),
        Ruleset::Standard,
    )
    .unwrap();
    for input in [
        PhaseInput::Continue,
        PhaseInput::Continue,
        PhaseInput::Continue,
        PhaseInput::ForcedMarch(false),
        PhaseInput::Roll(9),
        PhaseInput::Activity(ActivityChoice::GroupActivity),
        PhaseInput::Group(GroupChoice::Travel),
    ] {
        engine.advance(input).unwrap();
    }
    engine
}

#[test]
fn snapshot_round_trips_and_resumes_identically() {
    let engine = mid_day_engine();
    let json = serde_json::to_string(engine.session()).unwrap();
    let restored: ExplorationSession = serde_json::from_str(&json).unwrap();
    assert_eq!(&restored, engine.session());

    let destination = HexSetup::new(TerrainType::Plains, TerrainDifficulty::Open);
    let (original, a) = step(engine.session(), PhaseInput::Travel(destination.clone())).unwrap();
    let (resumed, b) = step(&restored, PhaseInput::Travel(destination)).unwrap();
    assert_eq!(original, resumed);
    assert_eq!(a, b);
    assert_eq!(a.phase, Phase::EndOfDay);
}

#[test]
fn snapshot_uses_plain_numbers_and_stable_tags() {
    let engine = mid_day_engine();
    let value = serde_json::to_value(engine.session()).unwrap();
    assert_eq!(value["phase"], "travel");
    assert_eq!(value["budget"]["total"].as_f64(), Some(1.0));
    assert_eq!(value["hex"]["terrain_difficulty"], "difficult");
    assert_eq!(value["log"][0]["key"], "log.exploration.start");
    assert_eq!(value["log"][0]["stamp"]["seq"], 0);
}

#[test]
fn inputs_deserialize_from_caller_payloads() {
    let roll: PhaseInput = serde_json::from_str(r#"{"input":"roll","value":14}"#).unwrap();
    assert_eq!(roll, PhaseInput::Roll(14));

    let travel: PhaseInput = serde_json::from_str(
        r#"{"input":"travel","value":{"terrain_type":"mountain","terrain_difficulty":"greater-difficult","has_road":true}}"#,
    )
    .unwrap();
    let PhaseInput::Travel(setup) = travel else {
        panic!("expected travel input");
    };
    assert_eq!(setup.terrain_type, TerrainType::Mountain);
    assert!(setup.has_road);
    assert!(!setup.has_river);

    let bad_points = r#"{"total":0.3,"remaining":0.3,"used":[]}"#;
    assert!(serde_json::from_str::<hexploration_core::ActivityBudget>(bad_points).is_err());
}

#[test]
fn snapshot_with_unknown_phase_tag_is_rejected() {
    let engine = mid_day_engine();
    let mut value = serde_json::to_value(engine.session()).unwrap();
    value["phase"] = "lunch".into();
    let err = serde_json::from_value::<ExplorationSession>(value).unwrap_err();
    assert!(err.to_string().contains(r#"unknown phase tag "lunch""#), "{err}");

    let phase: Phase = serde_json::from_str(r#""prepare-campsite""#).unwrap();
    assert_eq!(phase, Phase::PrepareCampsite);
}

#[test]
fn snapshot_with_overdrawn_budget_is_rejected() {
    let engine = mid_day_engine();
    let mut value = serde_json::to_value(engine.session()).unwrap();
    value["budget"] = serde_json::json!({"total": 1.0, "remaining": 4.0, "used": []});
    let err = serde_json::from_value::<ExplorationSession>(value.clone()).unwrap_err();
    assert!(err.to_string().contains("remaining 4 exceeds total 1"), "{err}");

    value["budget"] = serde_json::json!({"total": 2.0, "remaining": 2.0, "used": [{"kind": "travel"}]});
    assert!(serde_json::from_value::<ExplorationSession>(value).is_err());
}
