use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl serde::Serialize for OrderSide {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            OrderSide::Buy => serializer.serialize_str("BUY"),
            OrderSide::Sell => serializer.serialize_str("SELL"),
        }
    }
}

impl<'de> serde::Deserialize<'de> for OrderSide {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            _ => Err(serde::de::Error::custom(format!(
                "unknown variant `{}`, expected `Buy` or `Sell`",
                s
            ))),
        }
    }
}

impl OrderSide {
    pub fn opposite(&self) -> Self {
        match self {
            OrderSide::Buy => OrderSide::Sell,
            OrderSide::Sell => OrderSide::Buy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopLimit,
}

/// Monotone lifecycle of an `Order`. Once a terminal variant is reached
/// (`Filled`, `Cancelled`, `Rejected`, `Expired`) no further transition is valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Submitted,
    PartiallyFilled,
    Filled,
    Cancelled,
    Rejected,
    Expired,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired
        )
    }

    /// Rank used to enforce monotonicity: a transition is only valid if the
    /// new status's rank is greater than the current one, or both are equal.
    fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Submitted => 1,
            OrderStatus::PartiallyFilled => 2,
            OrderStatus::Filled | OrderStatus::Cancelled | OrderStatus::Rejected | OrderStatus::Expired => 3,
        }
    }

    /// Whether moving from `self` to `next` is a legal monotone transition.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.rank() >= self.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionSide {
    Long,
    Short,
}

impl PositionSide {
    pub fn from_order_side(order_side: OrderSide) -> Self {
        match order_side {
            OrderSide::Buy => PositionSide::Long,
            OrderSide::Sell => PositionSide::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl SignalKind {
    pub fn is_bullish(&self) -> bool {
        matches!(self, SignalKind::Buy | SignalKind::StrongBuy)
    }

    pub fn is_bearish(&self) -> bool {
        matches!(self, SignalKind::Sell | SignalKind::StrongSell)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstrumentType {
    Stock,
    Options,
    Futures,
    Crypto,
    Commodity,
}

/// Bot lifecycle finite state machine (spec §3 BotStatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotStatus {
    Created,
    Starting,
    Running,
    Paused,
    Stopping,
    Stopped,
    Error,
}

impl BotStatus {
    pub fn can_start(&self) -> bool {
        matches!(self, BotStatus::Created | BotStatus::Stopped)
    }

    pub fn can_pause(&self) -> bool {
        matches!(self, BotStatus::Running)
    }

    pub fn can_resume(&self) -> bool {
        matches!(self, BotStatus::Paused)
    }

    pub fn can_stop(&self) -> bool {
        matches!(self, BotStatus::Running | BotStatus::Paused | BotStatus::Starting)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Cash,
    Margin,
    Ira,
    Paper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ComplianceAction {
    Allow,
    Warn,
    Confirm,
    Block,
    StopDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationSeverity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    PdtWarning,
    PdtViolation,
    GoodFaith,
    Freeriding,
    MarginCall,
    WashSale,
    SettlementRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdjustmentType {
    Increase,
    Decrease,
    Reset,
    NoChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Improving,
    Declining,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketSession {
    PreMarket,
    Open,
    AfterHours,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamDirection {
    MinimizeLoss,
    MaximizeProfit,
    Optimize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfirmPolicy {
    Reject,
    Surface,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_is_monotone() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Submitted));
        assert!(OrderStatus::Submitted.can_transition_to(OrderStatus::Filled));
        assert!(!OrderStatus::Filled.can_transition_to(OrderStatus::Submitted));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn order_side_serde_round_trip() {
        let json = serde_json::to_string(&OrderSide::Buy).unwrap();
        assert_eq!(json, "\"BUY\"");
        let back: OrderSide = serde_json::from_str("\"sell\"").unwrap();
        assert_eq!(back, OrderSide::Sell);
    }
}
