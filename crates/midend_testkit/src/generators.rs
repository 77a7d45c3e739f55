//! Property-based test generators using proptest.
//!
//! Provides strategies for lifecycle schedules and entity trees that
//! maintain the invariants the properties rely on.

use midend_core::{MergePolicy, Phase};
use midend_value::Value;
use proptest::prelude::*;

/// A lifecycle schedule for one fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    /// Phases in arrival order.
    pub phases: Vec<Phase>,
}

impl Schedule {
    /// Number of BEGIN phases.
    pub fn begins(&self) -> usize {
        self.phases.iter().filter(|p| **p == Phase::Begin).count()
    }

    /// Number of SUCCESS and FAIL phases.
    pub fn completions(&self) -> usize {
        self.phases.iter().filter(|p| p.is_completion()).count()
    }

    /// The outstanding count after each step, clamped at zero.
    pub fn expected_in_flight(&self) -> Vec<u32> {
        let mut outstanding = 0_u32;
        self.phases
            .iter()
            .map(|phase| {
                outstanding = match phase {
                    Phase::Begin => outstanding + 1,
                    Phase::Success | Phase::Fail => outstanding.saturating_sub(1),
                };
                outstanding
            })
            .collect()
    }
}

/// Strategy for any single phase.
pub fn phase_strategy() -> impl Strategy<Value = Phase> {
    prop_oneof![Just(Phase::Begin), Just(Phase::Success), Just(Phase::Fail)]
}

/// Strategy for schedules where every completion follows an unmatched begin.
pub fn well_formed_schedule_strategy() -> impl Strategy<Value = Schedule> {
    prop::collection::vec(phase_strategy(), 0..64).prop_map(|raw| {
        let mut outstanding = 0_usize;
        let phases = raw
            .into_iter()
            .map(|phase| {
                if phase == Phase::Begin || outstanding == 0 {
                    outstanding += 1;
                    Phase::Begin
                } else {
                    outstanding -= 1;
                    phase
                }
            })
            .collect();
        Schedule { phases }
    })
}

/// Strategy for arbitrary schedules, including stray completions.
pub fn any_schedule_strategy() -> impl Strategy<Value = Schedule> {
    prop::collection::vec(phase_strategy(), 0..64).prop_map(|phases| Schedule { phases })
}

/// Strategy for constant merge policies.
pub fn constant_merge_policy_strategy() -> impl Strategy<Value = MergePolicy> {
    prop_oneof![Just(MergePolicy::Always), Just(MergePolicy::Never)]
}

/// Strategy for entity names.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Z][a-z]{1,8}").expect("Invalid regex")
}

/// Strategy for people owning dogs, with unique ids throughout.
///
/// People get ids `1..=n`; dogs get ids starting at 1000 so the two never
/// collide. Dogs carry no `owner` field, so the trees are acyclic.
pub fn people_strategy() -> impl Strategy<Value = Vec<Value>> {
    prop::collection::vec(
        (
            name_strategy(),
            prop::collection::vec((name_strategy(), 0_i64..20), 0..4),
        ),
        1..6,
    )
    .prop_map(|people| {
        let mut next_dog = 1000_i64;
        people
            .into_iter()
            .enumerate()
            .map(|(i, (name, pets))| {
                let pets = pets
                    .into_iter()
                    .map(|(dog_name, age)| {
                        next_dog += 1;
                        Value::map([
                            ("id", Value::Integer(next_dog)),
                            ("name", Value::from(dog_name)),
                            ("age", Value::Integer(age)),
                        ])
                    })
                    .collect::<Vec<_>>();
                Value::map([
                    ("id", Value::Integer(i as i64 + 1)),
                    ("name", Value::from(name)),
                    ("pets", Value::Array(pets)),
                ])
            })
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;

    #[test]
    fn well_formed_schedules_never_underflow() {
        let mut runner = TestRunner::default();
        runner
            .run(&well_formed_schedule_strategy(), |schedule| {
                prop_assert!(schedule.completions() <= schedule.begins());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn expected_in_flight_clamps() {
        let schedule = Schedule {
            phases: vec![Phase::Fail, Phase::Begin, Phase::Success, Phase::Success],
        };
        assert_eq!(schedule.expected_in_flight(), vec![0, 1, 0, 0]);
    }
}
