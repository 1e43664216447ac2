use std::collections::BTreeSet;

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;
use tras_models::ScheduleConfig;

use crate::error::TrasError;

/// Result of checking the clock against the configured slots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotCheck {
    /// Slots whose window contains `now`. Now marked served.
    pub due: Vec<NaiveTime>,
    /// Slots whose window closed before the loop got to them.
    pub missed: Vec<NaiveTime>,
}

impl SlotCheck {
    pub fn is_due(&self) -> bool {
        !self.due.is_empty()
    }
}

/// Wall-clock analysis times in one timezone, each served at most once per
/// local day.
#[derive(Debug, Clone)]
pub struct Schedule {
    slots: Vec<NaiveTime>,
    tz: Tz,
    window: Duration,
    served: BTreeSet<(NaiveDate, NaiveTime)>,
    /// Slots that closed before this instant are not reported as missed.
    since: Option<DateTime<Utc>>,
}

impl Schedule {
    pub fn new(slots: Vec<NaiveTime>, tz: Tz, window: Duration) -> Self {
        let mut slots = slots;
        slots.sort_unstable();
        slots.dedup();
        Self {
            slots,
            tz,
            window,
            served: BTreeSet::new(),
            since: None,
        }
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, TrasError> {
        let tz: Tz = config
            .timezone
            .parse()
            .map_err(|e| TrasError::Config(format!("timezone {:?}: {e}", config.timezone)))?;
        let slots = config
            .analysis_times
            .iter()
            .map(|t| {
                NaiveTime::parse_from_str(t.trim(), "%H:%M")
                    .map_err(|e| TrasError::Config(format!("analysis time {t:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(
            slots,
            tz,
            Duration::minutes(i64::from(config.match_window_minutes)),
        ))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    /// Mark and return the slots due at `now`.
    ///
    /// A slot is due while local time is within `[slot, slot + window]`.
    /// Slots already served that day are skipped. A slot whose window has
    /// passed unserved is reported once as missed and never run late.
    pub fn check(&mut self, now: DateTime<Utc>) -> SlotCheck {
        let since = *self.since.get_or_insert(now);
        let today = now.with_timezone(&self.tz).date_naive();
        let mut result = SlotCheck::default();

        // Yesterday too, for windows that straddle midnight.
        let days = [today.checked_sub_days(Days::new(1)), Some(today)];
        for date in days.into_iter().flatten() {
            for &slot in &self.slots {
                if self.served.contains(&(date, slot)) {
                    continue;
                }
                let Some(start) = self.localize(date, slot) else {
                    // Skipped by a DST gap.
                    self.served.insert((date, slot));
                    continue;
                };
                let end = start + self.window;
                if now < start {
                    continue;
                }
                self.served.insert((date, slot));
                if now <= end {
                    result.due.push(slot);
                } else if end >= since {
                    warn!(slot = %slot.format("%H:%M"), date = %date, "Analysis slot missed");
                    result.missed.push(slot);
                }
            }
        }

        if let Some(cutoff) = today.checked_sub_days(Days::new(2)) {
            self.served.retain(|(d, _)| *d >= cutoff);
        }
        result
    }

    /// The next slot start strictly after `now`, in the schedule's timezone.
    pub fn next_after(&self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let today = now.with_timezone(&self.tz).date_naive();
        (0..=2u64)
            .filter_map(|d| today.checked_add_days(Days::new(d)))
            .flat_map(|date| self.slots.iter().map(move |&slot| (date, slot)))
            .filter_map(|(date, slot)| self.localize(date, slot))
            .find(|start| *start > now)
            .map(|start| start.with_timezone(&self.tz))
    }

    fn localize(&self, date: NaiveDate, slot: NaiveTime) -> Option<DateTime<Utc>> {
        self.tz
            .from_local_datetime(&date.and_time(slot))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ny(schedule_times: &[&str]) -> Schedule {
        Schedule::from_config(&ScheduleConfig {
            analysis_times: schedule_times.iter().map(|s| s.to_string()).collect(),
            ..ScheduleConfig::default()
        })
        .unwrap()
    }

    /// Local New York time on 2024-03-05 (EST, UTC-5).
    fn at(h: u32, m: u32) -> DateTime<Utc> {
        chrono_tz::America::New_York
            .with_ymd_and_hms(2024, 3, 5, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn slot_fires_once_within_window() {
        let mut s = ny(&["09:00"]);
        assert!(!s.check(at(8, 59)).is_due());
        assert_eq!(s.check(at(9, 2)).due, vec![t(9, 0)]);
        assert!(!s.check(at(9, 3)).is_due());
        assert!(!s.check(at(9, 5)).is_due());
    }

    #[test]
    fn delayed_loop_marks_slot_missed() {
        let mut s = ny(&["09:00", "12:00"]);
        s.check(at(8, 0));
        let check = s.check(at(9, 30));
        assert!(check.due.is_empty());
        assert_eq!(check.missed, vec![t(9, 0)]);
        // Reported once only.
        assert!(s.check(at(9, 31)).missed.is_empty());
        assert_eq!(s.check(at(12, 0)).due, vec![t(12, 0)]);
    }

    #[test]
    fn slots_before_startup_are_not_missed() {
        let mut s = ny(&["07:00", "09:00"]);
        let check = s.check(at(10, 0));
        assert_eq!(check, SlotCheck::default());
    }

    #[test]
    fn served_again_next_day() {
        let mut s = ny(&["09:00"]);
        assert!(s.check(at(9, 0)).is_due());
        let tomorrow = at(9, 1) + Duration::days(1);
        assert!(s.check(tomorrow).is_due());
    }

    #[test]
    fn overlapping_slots_due_together() {
        let mut s = ny(&["09:00", "09:03"]);
        assert_eq!(s.check(at(9, 4)).due, vec![t(9, 0), t(9, 3)]);
    }

    #[test]
    fn window_across_midnight() {
        let mut s = ny(&["23:58"]);
        s.check(at(23, 0));
        let just_after = at(23, 58) + Duration::minutes(3);
        assert_eq!(s.check(just_after).due, vec![t(23, 58)]);
    }

    #[test]
    fn next_after_rolls_to_tomorrow() {
        let s = ny(&["07:00", "16:00"]);
        let next = s.next_after(at(10, 0)).unwrap();
        assert_eq!(next.time(), t(16, 0));

        let next = s.next_after(at(17, 0)).unwrap();
        assert_eq!(next.time(), t(7, 0));
        assert_eq!(next.date_naive(), NaiveDate::from_ymd_opt(2024, 3, 6).unwrap());
    }

    #[test]
    fn timezone_is_respected() {
        let mut s = Schedule::from_config(&ScheduleConfig {
            analysis_times: vec!["09:00".into()],
            timezone: "Europe/London".into(),
            ..ScheduleConfig::default()
        })
        .unwrap();
        // 09:00 London is 04:00 New York in March before US DST.
        assert!(s.check(at(4, 1)).is_due());
    }

    #[test]
    fn bad_config_is_rejected() {
        let err = Schedule::from_config(&ScheduleConfig {
            analysis_times: vec!["9am".into()],
            ..ScheduleConfig::default()
        })
        .unwrap_err();
        assert!(err.to_string().contains("9am"));

        assert!(Schedule::from_config(&ScheduleConfig {
            timezone: "Mars/Olympus".into(),
            ..ScheduleConfig::default()
        })
        .is_err());
    }
}
