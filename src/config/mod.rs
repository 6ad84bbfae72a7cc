// ==========================================
// 周度供应计划系统 - 配置层
// ==========================================
// 职责: 计划运行配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod planning_config;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use planning_config::{default_db_path, PlanningConfig, DB_PATH_ENV, DEFAULT_SCENARIO_NAME};
