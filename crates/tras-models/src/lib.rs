pub mod alert_schema;
pub mod analysis;
pub mod config;
pub mod instrument;
pub mod signal;

pub use alert_schema::{AlertRecord, ALERT_TABLE_DDL};
pub use analysis::{
    AnalysisRequest, ModelResponse, ResponseStatus, SourceDocument, SynthesizedRecommendation,
};
pub use config::{AgentsConfig, MonitorConfig, ProviderConfig, ProviderKind, ScheduleConfig};
pub use instrument::{Instrument, InvalidInstrument};
pub use signal::{Direction, PriceTick, SignalError, SignalStatus, TradeSignal};
