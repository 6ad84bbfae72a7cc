// ==========================================
// 周度供应计划系统 - API 层
// ==========================================
// 职责: 进程内服务门面, 组合仓储与引擎
// ==========================================

pub mod error;
pub mod planning_api;

pub use error::{ApiError, ApiResult};
pub use planning_api::{PlanRunSummary, PlanningApi, SkuWeekExplanation};
