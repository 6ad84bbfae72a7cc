// ==========================================
// 周度供应计划系统 - 领域模型层
// ==========================================
// 职责: 定义事实数据、补货策略、计划运行结果等领域实体
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod facts;
pub mod plan;
pub mod policy;
pub mod types;
pub mod week;

// 重导出核心类型
pub use facts::{DemandActual, FactKey, FactSet, InventorySnapshot, Receipt};
pub use plan::{PlanRun, PlannedOrderRow, ProjectedInventoryRow};
pub use policy::{LeadTimeComponents, ReplenishmentPolicy};
pub use types::{DemandClass, PlanningMode, SafetyStockMethod};
