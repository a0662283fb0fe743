use std::fmt;

use hexploration_core::day_cycle::CharacterStatus;
use hexploration_core::{
    ActivityChoice, AvailableAction, CharacterId, GroupChoice, HalfActivityKind,
    IndividualActivity, SessionView,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

/// Player-side decision interface for automated expeditions.
pub trait DecisionPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Whether a fatigued character rests today.
    fn rest(&mut self, character: &CharacterStatus) -> bool;

    /// Whether to accept an offered forced march.
    fn forced_march(&mut self, view: &SessionView) -> bool;

    /// Pick from the activity hub.
    fn activity(&mut self, view: &SessionView) -> ActivityChoice;

    /// Pick a group activity.
    fn group(&mut self, view: &SessionView) -> GroupChoice;

    /// Assign individual tasks for one round.
    fn individual(&mut self, view: &SessionView) -> Vec<(CharacterId, IndividualActivity)>;
}

/// Built-in strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameplayStrategy {
    #[default]
    Cautious,
    Trailblazer,
    Surveyor,
    Wanderer,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [
        Self::Cautious,
        Self::Trailblazer,
        Self::Surveyor,
        Self::Wanderer,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Cautious => "Cautious",
            Self::Trailblazer => "Trailblazer",
            Self::Surveyor => "Surveyor",
            Self::Wanderer => "Wanderer",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn DecisionPolicy + Send> {
        match self {
            Self::Cautious => Box::new(CautiousPolicy),
            Self::Trailblazer => Box::new(TrailblazerPolicy),
            Self::Surveyor => Box::new(SurveyorPolicy),
            Self::Wanderer => Box::new(WandererPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn active_members(view: &SessionView) -> impl Iterator<Item = &CharacterStatus> {
    view.characters.iter().filter(|c| !c.is_resting)
}

/// Rests when tired, never marches, travels whenever points allow.
struct CautiousPolicy;

impl DecisionPolicy for CautiousPolicy {
    fn name(&self) -> &'static str {
        "cautious"
    }

    fn rest(&mut self, _character: &CharacterStatus) -> bool {
        true
    }

    fn forced_march(&mut self, _view: &SessionView) -> bool {
        false
    }

    fn activity(&mut self, view: &SessionView) -> ActivityChoice {
        if view.offers(AvailableAction::GroupActivity) {
            ActivityChoice::GroupActivity
        } else if view.offers(AvailableAction::SkipHalf) {
            ActivityChoice::SkipHalf
        } else {
            ActivityChoice::EndDay
        }
    }

    fn group(&mut self, _view: &SessionView) -> GroupChoice {
        GroupChoice::Travel
    }

    fn individual(&mut self, view: &SessionView) -> Vec<(CharacterId, IndividualActivity)> {
        active_members(view)
            .map(|c| (c.id, IndividualActivity::RestShort))
            .collect()
    }
}

/// Forced marches whenever offered and pushes through fatigue.
struct TrailblazerPolicy;

impl DecisionPolicy for TrailblazerPolicy {
    fn name(&self) -> &'static str {
        "trailblazer"
    }

    fn rest(&mut self, character: &CharacterStatus) -> bool {
        character.forced_march_days > character.forced_march_tolerance
    }

    fn forced_march(&mut self, view: &SessionView) -> bool {
        view.offers(AvailableAction::ForcedMarch)
    }

    fn activity(&mut self, view: &SessionView) -> ActivityChoice {
        if view.forced_march_active {
            ActivityChoice::Travel
        } else if view.offers(AvailableAction::GroupActivity) {
            ActivityChoice::GroupActivity
        } else if view.offers(AvailableAction::BeginHalf(HalfActivityKind::Group)) {
            ActivityChoice::BeginHalf(HalfActivityKind::Group)
        } else {
            ActivityChoice::EndDay
        }
    }

    fn group(&mut self, _view: &SessionView) -> GroupChoice {
        GroupChoice::Travel
    }

    fn individual(&mut self, view: &SessionView) -> Vec<(CharacterId, IndividualActivity)> {
        active_members(view)
            .take(1)
            .map(|c| (c.id, IndividualActivity::Subsist))
            .collect()
    }
}

/// Reconnoiters and maps every hex before moving on.
struct SurveyorPolicy;

impl DecisionPolicy for SurveyorPolicy {
    fn name(&self) -> &'static str {
        "surveyor"
    }

    fn rest(&mut self, _character: &CharacterStatus) -> bool {
        true
    }

    fn forced_march(&mut self, _view: &SessionView) -> bool {
        false
    }

    fn activity(&mut self, view: &SessionView) -> ActivityChoice {
        let wants_mapping = view.hex.is_reconnoitered && !view.hex.is_mapped;
        if view.offers(AvailableAction::GroupActivity) && !view.hex.is_reconnoitered {
            ActivityChoice::GroupActivity
        } else if view.offers(AvailableAction::IndividualActivities)
            && (wants_mapping || !view.camp_fortified)
        {
            ActivityChoice::IndividualActivities
        } else if view.offers(AvailableAction::GroupActivity) {
            ActivityChoice::GroupActivity
        } else if view.offers(AvailableAction::BeginHalf(HalfActivityKind::Individual)) {
            ActivityChoice::BeginHalf(HalfActivityKind::Individual)
        } else {
            ActivityChoice::EndDay
        }
    }

    fn group(&mut self, view: &SessionView) -> GroupChoice {
        if view.offers(AvailableAction::Reconnoiter) {
            GroupChoice::Reconnoiter
        } else {
            GroupChoice::Travel
        }
    }

    fn individual(&mut self, view: &SessionView) -> Vec<(CharacterId, IndividualActivity)> {
        let can_map = view.individual_options.contains(&IndividualActivity::MapArea)
            && !view.hex.is_mapped;
        let mut tasks = Vec::new();
        if can_map {
            tasks.push(IndividualActivity::MapArea);
        }
        if !view.camp_fortified {
            tasks.push(IndividualActivity::FortifyCamp);
        }
        let mut tasks = tasks.into_iter();
        active_members(view)
            .map(|c| (c.id, tasks.next().unwrap_or(IndividualActivity::Seek)))
            .collect()
    }
}

/// Picks uniformly among whatever the view offers.
struct WandererPolicy {
    rng: ChaCha20Rng,
}

impl WandererPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl DecisionPolicy for WandererPolicy {
    fn name(&self) -> &'static str {
        "wanderer"
    }

    fn rest(&mut self, _character: &CharacterStatus) -> bool {
        self.rng.gen_bool(0.5)
    }

    fn forced_march(&mut self, view: &SessionView) -> bool {
        view.offers(AvailableAction::ForcedMarch) && self.rng.gen_bool(0.3)
    }

    fn activity(&mut self, view: &SessionView) -> ActivityChoice {
        let choices: Vec<ActivityChoice> = view
            .available_actions
            .iter()
            .filter_map(|action| match action {
                AvailableAction::GroupActivity => Some(ActivityChoice::GroupActivity),
                AvailableAction::IndividualActivities => Some(ActivityChoice::IndividualActivities),
                AvailableAction::Travel => Some(ActivityChoice::Travel),
                AvailableAction::BeginHalf(kind) => Some(ActivityChoice::BeginHalf(*kind)),
                AvailableAction::SkipHalf => Some(ActivityChoice::SkipHalf),
                AvailableAction::EndDay => Some(ActivityChoice::EndDay),
                _ => None,
            })
            .collect();
        choices
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(ActivityChoice::EndDay)
    }

    fn group(&mut self, view: &SessionView) -> GroupChoice {
        if view.offers(AvailableAction::Reconnoiter) && self.rng.gen_bool(0.5) {
            GroupChoice::Reconnoiter
        } else {
            GroupChoice::Travel
        }
    }

    fn individual(&mut self, view: &SessionView) -> Vec<(CharacterId, IndividualActivity)> {
        let options = view.individual_options.clone();
        let mut picks = Vec::new();
        for character in active_members(view) {
            let Some(activity) = options.choose(&mut self.rng) else {
                break;
            };
            let activity = match activity {
                IndividualActivity::Other(_) => IndividualActivity::Other("Gather rumors".into()),
                other => other.clone(),
            };
            picks.push((character.id, activity));
        }
        picks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexploration_core::{
        ActivityBudget, ActivityPoints, ExplorationSession, HexSetup, Phase, RosterEntry, Ruleset,
    };

    fn view(phase: Phase, points: ActivityPoints) -> SessionView {
        let mut session = ExplorationSession::new(
            &[RosterEntry::new("Lini", 25, 1), RosterEntry::new("Harsk", 20, 3)],
            &HexSetup::default(),
            Ruleset::Standard,
        )
        .unwrap();
        session.phase = phase;
        session.budget = ActivityBudget::new(points);
        SessionView::project(&session)
    }

    #[test]
    fn cautious_skips_half_days() {
        let mut policy = GameplayStrategy::Cautious.create_policy(1);
        let half = view(Phase::ActivitySelection, ActivityPoints::HALF);
        assert_eq!(policy.activity(&half), ActivityChoice::SkipHalf);
        let full = view(Phase::ActivitySelection, ActivityPoints::whole(2));
        assert_eq!(policy.activity(&full), ActivityChoice::GroupActivity);
    }

    #[test]
    fn surveyor_reconnoiters_then_maps() {
        let mut policy = GameplayStrategy::Surveyor.create_policy(1);
        let group = view(Phase::GroupActivity, ActivityPoints::whole(2));
        assert_eq!(policy.group(&group), GroupChoice::Reconnoiter);

        let mut session_view = view(Phase::IndividualActivities, ActivityPoints::whole(2));
        session_view.hex.is_reconnoitered = true;
        session_view
            .individual_options
            .push(IndividualActivity::MapArea);
        let picks = policy.individual(&session_view);
        assert_eq!(picks[0].1, IndividualActivity::MapArea);
        assert_eq!(picks[1].1, IndividualActivity::FortifyCamp);
    }

    #[test]
    fn wanderer_is_deterministic_per_seed() {
        let sample = view(Phase::ActivitySelection, ActivityPoints::whole(2));
        let mut a = GameplayStrategy::Wanderer.create_policy(42);
        let mut b = GameplayStrategy::Wanderer.create_policy(42);
        for _ in 0..8 {
            assert_eq!(a.activity(&sample), b.activity(&sample));
        }
    }
}
