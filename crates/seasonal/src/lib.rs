//! Seasonal Calendar (spec §4.11): a static table of recurring calendar
//! effects (earnings season, holiday retail window, summer doldrums, ...)
//! and pure functions of a date that strategies and bots can use to bias
//! sizing or direction. No state, no I/O — every function is a pure
//! function of its inputs, in the style of the `calendar` crate's
//! `market_session`.

use chrono::{Datelike, NaiveDate};
use core_types::Trend;
use rust_decimal::Decimal;
use serde::Serialize;

/// One recurring calendar effect, identified by a month/day range that
/// repeats every year (year is ignored when matching).
#[derive(Debug, Clone, Serialize)]
pub struct SeasonalEvent {
    pub name: &'static str,
    pub start_month: u32,
    pub start_day: u32,
    pub end_month: u32,
    pub end_day: u32,
    pub trend_bias: Trend,
    pub sizing_multiplier: Decimal,
    /// `None` means the event applies to every symbol.
    pub symbols: Option<&'static [&'static str]>,
}

impl SeasonalEvent {
    fn contains(&self, date: NaiveDate) -> bool {
        let md = (date.month(), date.day());
        let start = (self.start_month, self.start_day);
        let end = (self.end_month, self.end_day);
        if start <= end {
            md >= start && md <= end
        } else {
            // Wraps across the new year (e.g. Dec 15 - Jan 5).
            md >= start || md <= end
        }
    }

    fn applies_to(&self, symbol: &str) -> bool {
        match self.symbols {
            None => true,
            Some(symbols) => symbols.contains(&symbol),
        }
    }
}

fn table() -> Vec<SeasonalEvent> {
    vec![
        SeasonalEvent {
            name: "q4_earnings_season",
            start_month: 1,
            start_day: 10,
            end_month: 2,
            end_day: 15,
            trend_bias: Trend::Improving,
            sizing_multiplier: Decimal::new(90, 2), // 0.90
            symbols: None,
        },
        SeasonalEvent {
            name: "summer_doldrums",
            start_month: 7,
            start_day: 1,
            end_month: 8,
            end_day: 31,
            trend_bias: Trend::Neutral,
            sizing_multiplier: Decimal::new(75, 2), // 0.75
            symbols: None,
        },
        SeasonalEvent {
            name: "holiday_retail_window",
            start_month: 11,
            start_day: 15,
            end_month: 12,
            end_day: 26,
            trend_bias: Trend::Improving,
            sizing_multiplier: Decimal::new(110, 2), // 1.10
            symbols: Some(&["AMZN", "WMT", "TGT", "COST"]),
        },
        SeasonalEvent {
            name: "santa_claus_rally",
            start_month: 12,
            start_day: 24,
            end_month: 1,
            end_day: 2,
            trend_bias: Trend::Improving,
            sizing_multiplier: Decimal::new(105, 2), // 1.05
            symbols: None,
        },
    ]
}

/// Events covering `date` for `symbol`.
pub fn active_events(date: NaiveDate, symbol: &str) -> Vec<SeasonalEvent> {
    table()
        .into_iter()
        .filter(|e| e.contains(date) && e.applies_to(symbol))
        .collect()
}

/// Events that will start within `within_days` of `date` but are not yet
/// active, for `symbol`.
pub fn upcoming_events(date: NaiveDate, symbol: &str, within_days: i64) -> Vec<SeasonalEvent> {
    table()
        .into_iter()
        .filter(|e| !e.contains(date) && e.applies_to(symbol))
        .filter(|e| {
            for offset in 1..=within_days {
                if let Some(d) = date.checked_add_signed(chrono::Duration::days(offset)) {
                    if e.contains(d) {
                        return true;
                    }
                }
            }
            false
        })
        .collect()
}

/// Combined adjustment from every active event for `symbol` on `date`:
/// sizing multipliers multiply together, the bias is the last active
/// event's (events are checked in table order, so the most recently
/// defined overlapping event wins ties).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonalAdjustment {
    pub sizing_multiplier: Decimal,
    pub trend_bias: Option<Trend>,
}

impl Default for SeasonalAdjustment {
    fn default() -> Self {
        Self { sizing_multiplier: Decimal::ONE, trend_bias: None }
    }
}

pub fn adjustment(date: NaiveDate, symbol: &str) -> SeasonalAdjustment {
    let events = active_events(date, symbol);
    if events.is_empty() {
        return SeasonalAdjustment::default();
    }
    let mut multiplier = Decimal::ONE;
    let mut bias = None;
    for event in &events {
        multiplier *= event.sizing_multiplier;
        bias = Some(event.trend_bias);
    }
    SeasonalAdjustment { sizing_multiplier: multiplier, trend_bias: bias }
}

/// Full context handed to a strategy: what's active now and what's coming
/// next, plus the combined adjustment. Strategies are free to ignore it.
#[derive(Debug, Clone)]
pub struct SeasonalContext {
    pub date: NaiveDate,
    pub active: Vec<SeasonalEvent>,
    pub upcoming: Vec<SeasonalEvent>,
    pub adjustment: SeasonalAdjustment,
}

pub fn context(date: NaiveDate, symbol: &str, lookahead_days: i64) -> SeasonalContext {
    SeasonalContext {
        date,
        active: active_events(date, symbol),
        upcoming: upcoming_events(date, symbol, lookahead_days),
        adjustment: adjustment(date, symbol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holiday_window_applies_only_to_listed_symbols() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 1).unwrap();
        assert!(!active_events(date, "AMZN").is_empty());
        assert!(active_events(date, "AAPL").iter().all(|e| e.name != "holiday_retail_window"));
    }

    #[test]
    fn santa_rally_wraps_the_new_year() {
        let dec31 = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let jan1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(active_events(dec31, "SPY").iter().any(|e| e.name == "santa_claus_rally"));
        assert!(active_events(jan1, "SPY").iter().any(|e| e.name == "santa_claus_rally"));
    }

    #[test]
    fn no_active_events_gives_identity_adjustment() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let adj = adjustment(date, "SPY");
        assert_eq!(adj.sizing_multiplier, Decimal::ONE);
        assert_eq!(adj.trend_bias, None);
    }

    #[test]
    fn upcoming_events_detects_events_starting_soon() {
        let date = NaiveDate::from_ymd_opt(2026, 11, 10).unwrap();
        let upcoming = upcoming_events(date, "AMZN", 10);
        assert!(upcoming.iter().any(|e| e.name == "holiday_retail_window"));
    }
}
