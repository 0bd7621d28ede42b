pub mod enums;
pub mod error;
pub mod structs;

pub use enums::{
    AccountType, AdjustmentType, BotStatus, ComplianceAction, ConfirmPolicy, InstrumentType,
    MarketSession, OrderSide, OrderStatus, OrderType, ParamDirection, PositionSide, SignalKind,
    Trend, ViolationKind, ViolationSeverity,
};
pub use error::{CoreError, ErrorExt, ErrorKind};
pub use structs::{
    AccountId, Bar, BotConfig, BotId, BotStats, BrokerName, ComplianceScope, ComplianceViolation,
    CommodityParams, CryptoParams, DataSourceName, DayTrade, Execution, FuturesParams, Order,
    OptionsParams, ParameterAdjustment, PerformanceMetrics, Position, Quote, Signal,
    TradeHistoryEntry, UnsettledPosition,
};
