use core_types::{Bar, Signal, SignalKind};
use rust_decimal::Decimal;
use seasonal::SeasonalContext;
use std::collections::HashMap;

use crate::{Strategy, StrategyError};

/// Never signals. Useful as a filler strategy in bot configs under test, or
/// as a baseline weight in the combiner's weighted vote.
pub struct AlwaysHoldStrategy {
    name: String,
}

impl AlwaysHoldStrategy {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Strategy for AlwaysHoldStrategy {
    fn analyze(
        &mut self,
        _symbol: &str,
        _bars: &[Bar],
        _seasonal_context: &SeasonalContext,
    ) -> Result<Option<Signal>, StrategyError> {
        Ok(None)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Always emits the same configured signal, regardless of bar history.
/// Used by engine/optimizer tests that need a deterministic, controllable
/// strategy rather than real indicator math.
pub struct FixedSignalStrategy {
    name: String,
    kind: SignalKind,
    strength: Decimal,
    confidence: Decimal,
}

impl FixedSignalStrategy {
    pub fn new(name: impl Into<String>, kind: SignalKind, strength: Decimal, confidence: Decimal) -> Self {
        Self { name: name.into(), kind, strength, confidence }
    }
}

impl Strategy for FixedSignalStrategy {
    fn analyze(
        &mut self,
        symbol: &str,
        bars: &[Bar],
        _seasonal_context: &SeasonalContext,
    ) -> Result<Option<Signal>, StrategyError> {
        if bars.is_empty() {
            return Err(StrategyError::InvalidParameters(
                "no bars available to analyze".to_string(),
            ));
        }
        if self.kind == SignalKind::Hold {
            return Ok(None);
        }
        Ok(Some(Signal {
            symbol: symbol.to_string(),
            kind: self.kind,
            strategy_name: self.name.clone(),
            strength: self.strength,
            confidence: self.confidence,
            entry_price: Some(bars.last().unwrap().close),
            stop_loss: None,
            take_profit: None,
            metadata: HashMap::new(),
        }))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn bar() -> Bar {
        Bar {
            timestamp: Utc::now(),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100.5),
            volume: dec!(1000),
        }
    }

    #[test]
    fn always_hold_never_signals() {
        let mut strategy = AlwaysHoldStrategy::new("hold");
        let ctx = seasonal::context(Utc::now().date_naive(), "AAPL", 0);
        assert!(strategy.analyze("AAPL", &[bar()], &ctx).unwrap().is_none());
    }

    #[test]
    fn fixed_signal_emits_configured_signal() {
        let mut strategy = FixedSignalStrategy::new("fixed", SignalKind::Buy, dec!(0.8), dec!(0.9));
        let ctx = seasonal::context(Utc::now().date_naive(), "AAPL", 0);
        let signal = strategy.analyze("AAPL", &[bar()], &ctx).unwrap().unwrap();
        assert_eq!(signal.kind, SignalKind::Buy);
        assert!(signal.is_actionable());
    }

    #[test]
    fn fixed_signal_errors_on_empty_bars() {
        let mut strategy = FixedSignalStrategy::new("fixed", SignalKind::Buy, dec!(0.8), dec!(0.9));
        let ctx = seasonal::context(Utc::now().date_naive(), "AAPL", 0);
        assert!(strategy.analyze("AAPL", &[], &ctx).is_err());
    }
}
