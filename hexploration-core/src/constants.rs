//! Centralized rules tables and tuning constants for the hexploration day cycle.
//!
//! These values define the deterministic math for the engine. Keeping them
//! together means the rules can only be adjusted via reviewed code changes,
//! never through shared mutable state.

// Log keys -------------------------------------------------------------------
pub(crate) const LOG_EXPLORATION_START: &str = "log.exploration.start";
pub(crate) const LOG_STARTING_HEX: &str = "log.exploration.starting-hex";
pub(crate) const LOG_EXPLORATION_END: &str = "log.exploration.end";
pub(crate) const LOG_DAY_START: &str = "log.day.start";
pub(crate) const LOG_DAY_END: &str = "log.day.end";
pub(crate) const LOG_DAY_SUMMARY: &str = "log.day.summary";
pub(crate) const LOG_REST_DECISION: &str = "log.fatigue.rest-decision";
pub(crate) const LOG_PUSH_THROUGH: &str = "log.fatigue.push-through";
pub(crate) const LOG_NO_FATIGUE: &str = "log.fatigue.none";
pub(crate) const LOG_ALL_RESTING: &str = "log.activities.all-resting";
pub(crate) const LOG_ACTIVITY_BUDGET: &str = "log.activities.budget";
pub(crate) const LOG_FORCED_MARCH_UNAVAILABLE: &str = "log.forced-march.unavailable";
pub(crate) const LOG_FORCED_MARCH_ACCEPTED: &str = "log.forced-march.accepted";
pub(crate) const LOG_FORCED_MARCH_DECLINED: &str = "log.forced-march.declined";
pub(crate) const LOG_FORCED_MARCH_COMPLETED: &str = "log.forced-march.completed";
pub(crate) const LOG_WEATHER_CHECK: &str = "log.weather.check";
pub(crate) const LOG_ENCOUNTER_CHECK: &str = "log.encounter.check";
pub(crate) const LOG_ENCOUNTER_TYPE: &str = "log.encounter.type";
pub(crate) const LOG_HALF_STARTED: &str = "log.activities.half-started";
pub(crate) const LOG_HALF_SKIPPED: &str = "log.activities.half-skipped";
pub(crate) const LOG_ENDED_EARLY: &str = "log.activities.ended-early";
pub(crate) const LOG_TRAVELED: &str = "log.travel.completed";
pub(crate) const LOG_RECONNOITERED: &str = "log.reconnoiter.completed";
pub(crate) const LOG_HIDDEN_FEATURES: &str = "log.reconnoiter.hidden-features";
pub(crate) const LOG_INDIVIDUAL_RESULT: &str = "log.individual.result";
pub(crate) const LOG_CAMP_FORTIFIED: &str = "log.individual.camp-fortified";
pub(crate) const LOG_HEX_MAPPED: &str = "log.individual.hex-mapped";
pub(crate) const LOG_PREPARE_CAMPSITE: &str = "log.camp.prepare";
pub(crate) const LOG_FATIGUE_RECOVERED: &str = "log.fatigue.recovered";
pub(crate) const LOG_FATIGUE_GAINED: &str = "log.fatigue.gained";
pub(crate) const LOG_CAMP_STATUS: &str = "log.camp.status";

// Encounter tuning ------------------------------------------------------------
pub(crate) const DEFAULT_ENCOUNTER_DC: i32 = 14;
pub(crate) const MIN_ENCOUNTER_DC: i32 = 5;
pub(crate) const ROAD_DC_MODIFIER: i32 = -2;
pub(crate) const RIVER_DC_MODIFIER: i32 = -2;
pub(crate) const CRITICAL_MARGIN: i32 = 10;
pub(crate) const KINGMAKER_WEATHER_EVENT_DC: i32 = 17;

// Dice -------------------------------------------------------------------------
pub(crate) const D20_MIN: i32 = 1;
pub(crate) const D20_MAX: i32 = 20;
pub(crate) const D10_MIN: i32 = 1;
pub(crate) const D10_MAX: i32 = 10;
pub(crate) const HARMLESS_ENCOUNTER_MAX: i32 = 5;
pub(crate) const HAZARD_ENCOUNTER_MAX: i32 = 7;

// Activity budget ------------------------------------------------------------
/// Upper speed bound (inclusive, feet) paired with the daily budget in half points.
pub(crate) const SPEED_ACTIVITY_TABLE: [(u32, u8); 4] = [(10, 1), (25, 2), (40, 4), (55, 6)];
/// Budget in half points for parties faster than every bound above.
pub(crate) const FASTEST_ACTIVITY_HALVES: u8 = 8;
pub(crate) const FORCED_MARCH_HALVES: u8 = 2;
pub(crate) const INDIVIDUAL_ACTIVITY_HALVES: u8 = 2;

// Fatigue ----------------------------------------------------------------------
pub(crate) const MIN_FORCED_MARCH_TOLERANCE: i32 = 1;

// Extended ruleset defaults --------------------------------------------------
pub(crate) const DEFAULT_ZONE_DC: i32 = 18;
pub(crate) const DEFAULT_ZONE_ENCOUNTER_DC: i32 = 16;
