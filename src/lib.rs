// ==========================================
// 周度供应计划系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 库存投影与补货建议 (计划员最终决策)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计划规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建库）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 服务门面
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DemandClass, PlanningMode, SafetyStockMethod};

// 领域实体
pub use domain::{
    DemandActual, FactKey, FactSet, InventorySnapshot, LeadTimeComponents, PlanRun,
    PlannedOrderRow, ProjectedInventoryRow, Receipt, ReplenishmentPolicy,
};

// 引擎
pub use engine::{EngineError, ExecutionOptions, PlanRunOrchestrator, PlanRunOutput};

// API
pub use api::{ApiError, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "周度供应计划系统";
