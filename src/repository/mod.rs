// ==========================================
// 周度供应计划系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 约束: 所有查询使用参数化, 防止 SQL 注入
// ==========================================

pub mod error;
pub mod fact_repo;
pub mod plan_run_repo;
pub mod policy_repo;
pub mod row_codec;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use fact_repo::FactRepository;
pub use plan_run_repo::PlanRunRepository;
pub use policy_repo::PolicyRepository;
