// ==========================================
// 周度供应计划系统 - 引擎层
// ==========================================
// 职责: 起始库存解析、需求预测、补货规则、库存投影
// 红线: Engine 不拼 SQL, 不做 IO; 输入为事实数据, 输出为投影行与计划订单
// ==========================================

pub mod error;
pub mod forecast;
pub mod ledger;
pub mod orchestrator;
pub mod projection;
pub mod replenishment;
pub mod snapshot_resolver;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use forecast::{DemandForecast, DemandForecaster, FORECAST_METHOD};
pub use ledger::{DemandLedger, ReceiptLedger, WeeklySeries};
pub use orchestrator::{ExecutionOptions, PlanRunOrchestrator, PlanRunOutput, SkipReason};
pub use projection::{KeyPlanInput, KeyProjection, ProjectionSimulator, HORIZON_WEEKS};
pub use replenishment::{weeks_of_cover, ReplenishmentParams};
pub use snapshot_resolver::{SnapshotResolver, StartingPosition};
