#[cfg(test)]
#[path = "quota_test.rs"]
mod tests;

use chrono::DateTime;
use chrono::Local;
use chrono::NaiveDate;
use chrono::TimeZone;
use chrono::Utc;

use crate::domain::models::QuotaState;

/// Start of `day` and of the following day in the local timezone, as UTC
/// instants.
pub fn local_day_bounds(day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let to_utc = |date: NaiveDate| -> DateTime<Utc> {
        let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
        return match Local.from_local_datetime(&midnight).earliest() {
            Some(local) => local.with_timezone(&Utc),
            None => Utc.from_utc_datetime(&midnight),
        };
    };

    let next = day.succ_opt().unwrap_or(day);
    return (to_utc(day), to_utc(next));
}

/// Daily message ceiling. The count rolls over on the first check or record
/// seen on a new local calendar date.
pub struct QuotaTracker {
    ceiling: u32,
    state: QuotaState,
}

impl QuotaTracker {
    pub fn new(ceiling: u32, state: QuotaState) -> QuotaTracker {
        return QuotaTracker { ceiling, state };
    }

    pub fn today() -> NaiveDate {
        return Local::now().date_naive();
    }

    pub fn ceiling(&self) -> u32 {
        return self.ceiling;
    }

    pub fn state(&self) -> &QuotaState {
        return &self.state;
    }

    pub fn check_daily_limit(&mut self) -> bool {
        return self.check_daily_limit_on(QuotaTracker::today());
    }

    pub fn check_daily_limit_on(&mut self, today: NaiveDate) -> bool {
        self.roll_over(today);
        return self.state.daily_count < self.ceiling;
    }

    pub fn record_user_message_on(&mut self, today: NaiveDate) {
        self.roll_over(today);
        self.state.daily_count += 1;
    }

    /// Checks and records in one step. False, with nothing recorded, once the
    /// ceiling is reached.
    pub fn try_record_user_message(&mut self) -> bool {
        return self.try_record_user_message_on(QuotaTracker::today());
    }

    pub fn try_record_user_message_on(&mut self, today: NaiveDate) -> bool {
        if !self.check_daily_limit_on(today) {
            return false;
        }

        self.record_user_message_on(today);
        return true;
    }

    /// Raises today's count to what the message store already holds, so a
    /// wiped preferences file can't hand out a fresh allowance.
    pub fn seed_on(&mut self, count: u32, today: NaiveDate) {
        self.roll_over(today);
        if count > self.state.daily_count {
            tracing::debug!(
                local = self.state.daily_count,
                persisted = count,
                "Seeding daily count from message store"
            );
            self.state.daily_count = count;
        }
    }

    pub fn reset(&mut self) {
        self.state = QuotaState::default();
    }

    fn roll_over(&mut self, today: NaiveDate) {
        if self.state.last_count_date == Some(today) {
            return;
        }

        if self.state.daily_count > 0 {
            tracing::debug!(
                previous = ?self.state.last_count_date,
                count = self.state.daily_count,
                "Daily count rolled over"
            );
        }
        self.state.daily_count = 0;
        self.state.last_count_date = Some(today);
    }
}
