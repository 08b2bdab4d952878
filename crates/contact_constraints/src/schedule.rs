//! Mode schedule: piecewise-constant contact flags over time.

use serde::{Deserialize, Serialize};

use crate::error::ConstraintError;
use crate::traits::ContactSchedule;

/// Contact flags for consecutive modes separated by event times.
///
/// With event times `t_0 < ... < t_{k-1}` there are `k + 1` modes; mode `i`
/// holds on `[t_{i-1}, t_i)`, the first mode extends to `-inf` and the last to
/// `+inf`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSchedule {
    event_times: Vec<f64>,
    contact_flags: Vec<Vec<bool>>,
}

impl ModeSchedule {
    pub fn new(
        event_times: Vec<f64>,
        contact_flags: Vec<Vec<bool>>,
    ) -> Result<Self, ConstraintError> {
        if contact_flags.len() != event_times.len() + 1 {
            return Err(ConstraintError::schedule(format!(
                "{} event times require {} modes, got {}",
                event_times.len(),
                event_times.len() + 1,
                contact_flags.len()
            )));
        }
        if event_times.iter().any(|t| !t.is_finite()) {
            return Err(ConstraintError::schedule("event times must be finite"));
        }
        if event_times.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(ConstraintError::schedule(
                "event times must be strictly increasing",
            ));
        }
        let width = contact_flags[0].len();
        if contact_flags.iter().any(|flags| flags.len() != width) {
            return Err(ConstraintError::schedule(
                "every mode must list the same number of contacts",
            ));
        }
        Ok(Self {
            event_times,
            contact_flags,
        })
    }

    /// A single mode with fixed contact flags.
    pub fn constant(contact_flags: Vec<bool>) -> Self {
        Self {
            event_times: Vec::new(),
            contact_flags: vec![contact_flags],
        }
    }

    pub fn num_contacts(&self) -> usize {
        self.contact_flags[0].len()
    }

    pub fn event_times(&self) -> &[f64] {
        &self.event_times
    }

    /// Index of the mode active at `time`.
    pub fn mode_at(&self, time: f64) -> usize {
        self.event_times.partition_point(|&event| event <= time)
    }

    pub fn contact_flags_at(&self, time: f64) -> &[bool] {
        &self.contact_flags[self.mode_at(time)]
    }
}

impl ContactSchedule for ModeSchedule {
    /// Contacts the schedule does not know about are never planted.
    fn is_planted(&self, contact_point: usize, time: f64) -> bool {
        self.contact_flags_at(time)
            .get(contact_point)
            .copied()
            .unwrap_or(false)
    }
}

/// Serialized form of a [`ModeSchedule`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModeScheduleSettings {
    #[serde(default)]
    pub event_times: Vec<f64>,
    pub contact_flags: Vec<Vec<bool>>,
}

impl TryFrom<ModeScheduleSettings> for ModeSchedule {
    type Error = ConstraintError;

    fn try_from(settings: ModeScheduleSettings) -> Result<Self, Self::Error> {
        ModeSchedule::new(settings.event_times, settings.contact_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::{ModeSchedule, ModeScheduleSettings};
    use crate::error::ConstraintError;
    use crate::traits::ContactSchedule;

    fn trot() -> ModeSchedule {
        ModeSchedule::new(
            vec![1.0, 2.0],
            vec![
                vec![true, true, true, true],
                vec![true, false, false, true],
                vec![false, true, true, false],
            ],
        )
        .unwrap()
    }

    #[test]
    fn modes_are_half_open_on_the_right() {
        let schedule = trot();
        assert_eq!(schedule.mode_at(-5.0), 0);
        assert_eq!(schedule.mode_at(0.999), 0);
        assert_eq!(schedule.mode_at(1.0), 1);
        assert_eq!(schedule.mode_at(1.999), 1);
        assert_eq!(schedule.mode_at(2.0), 2);
        assert_eq!(schedule.mode_at(50.0), 2);
    }

    #[test]
    fn planted_query_reads_the_active_mode() {
        let schedule = trot();
        assert!(schedule.is_planted(2, 0.5));
        assert!(!schedule.is_planted(2, 1.5));
        assert!(schedule.is_planted(2, 2.5));
        assert!(!schedule.is_planted(0, 2.5));
        assert!(!schedule.is_planted(9, 0.5));
        assert_eq!(schedule.num_contacts(), 4);
    }

    #[test]
    fn constant_schedule_never_switches() {
        let schedule = ModeSchedule::constant(vec![true, false]);
        assert!(schedule.event_times().is_empty());
        for t in [-1.0, 0.0, 1e6] {
            assert!(schedule.is_planted(0, t));
            assert!(!schedule.is_planted(1, t));
        }
    }

    #[test]
    fn rejects_inconsistent_schedules() {
        assert!(matches!(
            ModeSchedule::new(vec![1.0], vec![vec![true]]),
            Err(ConstraintError::Schedule(_))
        ));
        assert!(matches!(
            ModeSchedule::new(vec![1.0, 1.0], vec![vec![true]; 3]),
            Err(ConstraintError::Schedule(_))
        ));
        assert!(matches!(
            ModeSchedule::new(vec![f64::NAN], vec![vec![true]; 2]),
            Err(ConstraintError::Schedule(_))
        ));
        assert!(matches!(
            ModeSchedule::new(vec![1.0], vec![vec![true], vec![true, false]]),
            Err(ConstraintError::Schedule(_))
        ));
    }

    #[test]
    fn settings_deserialize_into_schedule() {
        let settings: ModeScheduleSettings = serde_json::from_str(
            r#"{
                "event_times": [1.0],
                "contact_flags": [[true, true, true], [true, true, false]]
            }"#,
        )
        .unwrap();
        let schedule = ModeSchedule::try_from(settings).unwrap();
        assert!(schedule.is_planted(2, 0.5));
        assert!(!schedule.is_planted(2, 1.5));
    }
}
