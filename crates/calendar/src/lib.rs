//! Clock & business-day calendar (spec §4.1). All date comparisons in the
//! compliance manager go through this crate — ad-hoc date arithmetic
//! elsewhere is the forbidden alternative the spec calls out explicitly.

mod clock;
mod us_equity;

pub use clock::{Clock, FixedClock, SystemClock};

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use core_types::MarketSession;

/// Pluggable business-day/session calendar. `UsEquityCalendar` is the only
/// shipped variant (spec §9 Open Question: keep it pluggable but ship one).
pub trait Calendar: Send + Sync {
    fn is_business_day(&self, date: NaiveDate) -> bool;
    fn market_session(&self, now: chrono::DateTime<chrono::Utc>) -> MarketSession;

    /// Walks forward `n` business days from `date` (not counting `date`
    /// itself unless `n == 0`).
    fn add_business_days(&self, date: NaiveDate, n: u32) -> NaiveDate {
        let mut d = date;
        let mut remaining = n;
        while remaining > 0 {
            d = d.succ_opt().expect("NaiveDate overflow");
            if self.is_business_day(d) {
                remaining -= 1;
            }
        }
        d
    }

    /// The last `n` business days up to and including `from`, oldest first.
    fn last_n_business_days(&self, from: NaiveDate, n: u32) -> Vec<NaiveDate> {
        let mut days = Vec::with_capacity(n as usize);
        let mut d = from;
        loop {
            if self.is_business_day(d) {
                days.push(d);
                if days.len() as u32 == n {
                    break;
                }
            }
            match d.pred_opt() {
                Some(prev) => d = prev,
                None => break,
            }
        }
        days.reverse();
        days
    }

    /// Settlement date: the next business day strictly after `trade_date`.
    fn settlement_date(&self, trade_date: NaiveDate) -> NaiveDate {
        self.add_business_days(trade_date, 1)
    }
}

/// Default holiday-aware weekday calendar for US equities. The holiday
/// table is a pluggable `BTreeSet<NaiveDate>` so callers can load the
/// current year's NYSE holiday list without touching this crate.
pub struct UsEquityCalendar {
    holidays: BTreeSet<NaiveDate>,
    clock: Box<dyn Clock>,
}

impl UsEquityCalendar {
    pub fn new(holidays: BTreeSet<NaiveDate>) -> Self {
        Self {
            holidays,
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_clock(holidays: BTreeSet<NaiveDate>, clock: Box<dyn Clock>) -> Self {
        Self { holidays, clock }
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }
}

impl Calendar for UsEquityCalendar {
    fn is_business_day(&self, date: NaiveDate) -> bool {
        !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !self.holidays.contains(&date)
    }

    fn market_session(&self, now: chrono::DateTime<chrono::Utc>) -> MarketSession {
        us_equity::market_session(now, |d| self.is_business_day(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> UsEquityCalendar {
        UsEquityCalendar::new(BTreeSet::new())
    }

    #[test]
    fn skips_weekends_for_business_day_arithmetic() {
        let cal = calendar();
        // Friday 2026-07-31 (today per the session context) + 1 business day -> Monday.
        let friday = NaiveDate::from_ymd_opt(2026, 7, 31).unwrap();
        assert_eq!(cal.add_business_days(friday, 1), NaiveDate::from_ymd_opt(2026, 8, 3).unwrap());
    }

    #[test]
    fn settlement_date_is_next_business_day() {
        let cal = calendar();
        let thursday = NaiveDate::from_ymd_opt(2026, 7, 30).unwrap();
        assert_eq!(cal.settlement_date(thursday), NaiveDate::from_ymd_opt(2026, 7, 31).unwrap());
    }

    #[test]
    fn last_n_business_days_excludes_weekends() {
        let cal = calendar();
        let saturday = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let days = cal.last_n_business_days(saturday, 3);
        assert_eq!(days.len(), 3);
        assert!(days.iter().all(|d| cal.is_business_day(*d)));
        assert!(days.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn honors_custom_holidays() {
        let mut holidays = BTreeSet::new();
        let holiday = NaiveDate::from_ymd_opt(2026, 8, 3).unwrap();
        holidays.insert(holiday);
        let cal = UsEquityCalendar::new(holidays);
        assert!(!cal.is_business_day(holiday));
    }
}
