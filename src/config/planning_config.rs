// ==========================================
// 周度供应计划系统 - 计划配置
// ==========================================
// 类型化的计划运行配置 + 默认数据库路径
// ==========================================

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::engine::orchestrator::ExecutionOptions;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "WEEKLY_SUPPLY_PLANNING_DB";

/// 默认场景名
pub const DEFAULT_SCENARIO_NAME: &str = "baseline";

// ==========================================
// PlanningConfig - 计划运行配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanningConfig {
    pub parallel_enabled: bool,        // 多键并行投影
    pub parallel_min_keys: usize,      // 并行阈值
    pub default_scenario_name: String, // CLI 未指定场景时使用
}

impl Default for PlanningConfig {
    fn default() -> Self {
        let options = ExecutionOptions::default();
        Self {
            parallel_enabled: options.parallel_enabled,
            parallel_min_keys: options.parallel_min_keys,
            default_scenario_name: DEFAULT_SCENARIO_NAME.to_string(),
        }
    }
}

impl PlanningConfig {
    pub fn execution_options(&self) -> ExecutionOptions {
        ExecutionOptions {
            parallel_enabled: self.parallel_enabled,
            parallel_min_keys: self.parallel_min_keys,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先级:
/// 1. 环境变量 WEEKLY_SUPPLY_PLANNING_DB
/// 2. 用户数据目录/weekly-supply-planning/weekly_supply_planning.db
/// 3. ./weekly_supply_planning.db
pub fn default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./weekly_supply_planning.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("weekly-supply-planning");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("weekly_supply_planning.db");
        }
    }

    path.to_string_lossy().to_string()
}
