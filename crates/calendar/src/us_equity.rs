use chrono::{DateTime, NaiveDate, Timelike, Utc};
use core_types::MarketSession;

/// Hard-coded UTC hour windows for US equities (accepted per spec §9 Open
/// Question — pluggable via the `Calendar` trait, but this is the single
/// shipped variant). Regular session is 13:30-20:00 UTC (9:30-16:00 ET,
/// ignoring DST shifts), pre-market from 08:00 UTC, after-hours to 24:00 UTC.
pub fn market_session(now: DateTime<Utc>, is_business_day: impl Fn(NaiveDate) -> bool) -> MarketSession {
    if !is_business_day(now.date_naive()) {
        return MarketSession::Closed;
    }
    let minutes_since_midnight = now.hour() * 60 + now.minute();
    match minutes_since_midnight {
        m if (8 * 60..13 * 60 + 30).contains(&m) => MarketSession::PreMarket,
        m if (13 * 60 + 30..20 * 60).contains(&m) => MarketSession::Open,
        m if (20 * 60..24 * 60).contains(&m) => MarketSession::AfterHours,
        _ => MarketSession::Closed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 31, hour, minute, 0).unwrap()
    }

    #[test]
    fn classifies_sessions() {
        assert_eq!(market_session(at(9, 0), |_| true), MarketSession::PreMarket);
        assert_eq!(market_session(at(15, 0), |_| true), MarketSession::Open);
        assert_eq!(market_session(at(21, 0), |_| true), MarketSession::AfterHours);
        assert_eq!(market_session(at(2, 0), |_| true), MarketSession::Closed);
    }

    #[test]
    fn closed_on_non_business_days() {
        assert_eq!(market_session(at(15, 0), |_| false), MarketSession::Closed);
    }
}
