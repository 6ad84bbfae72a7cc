// ==========================================
// 周度供应计划系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 补货触发模式 (Planning Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanningMode {
    TargetCover,  // 目标覆盖周数
    ReorderPoint, // 再订货点
}

impl PlanningMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanningMode::TargetCover => "TARGET_COVER",
            PlanningMode::ReorderPoint => "REORDER_POINT",
        }
    }
}

impl Default for PlanningMode {
    fn default() -> Self {
        PlanningMode::TargetCover
    }
}

impl fmt::Display for PlanningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlanningMode {
    type Err = String;

    /// 兼容旧库中的 WOS_TARGET / ROP 写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TARGET_COVER" | "WOS_TARGET" => Ok(PlanningMode::TargetCover),
            "REORDER_POINT" | "ROP" => Ok(PlanningMode::ReorderPoint),
            other => Err(format!("未知补货模式: {}", other)),
        }
    }
}

// ==========================================
// 安全库存方法 (Safety Stock Method)
// ==========================================
// SERVICE_LEVEL 仅保留在配置中, 计算时安全库存为 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SafetyStockMethod {
    Weeks,        // 按覆盖周数
    ServiceLevel, // 按服务水平 (未实现)
}

impl SafetyStockMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyStockMethod::Weeks => "WEEKS",
            SafetyStockMethod::ServiceLevel => "SERVICE_LEVEL",
        }
    }
}

impl Default for SafetyStockMethod {
    fn default() -> Self {
        SafetyStockMethod::Weeks
    }
}

impl fmt::Display for SafetyStockMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SafetyStockMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "WEEKS" => Ok(SafetyStockMethod::Weeks),
            "SERVICE_LEVEL" => Ok(SafetyStockMethod::ServiceLevel),
            other => Err(format!("未知安全库存方法: {}", other)),
        }
    }
}

// ==========================================
// 需求类别 (Demand Class)
// ==========================================
// ADJUSTMENT 只以实际值参与投影, 不参与预测
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandClass {
    Customer,   // 客户需求
    Samples,    // 样品
    Adjustment, // 调整
}

impl DemandClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemandClass::Customer => "CUSTOMER",
            DemandClass::Samples => "SAMPLES",
            DemandClass::Adjustment => "ADJUSTMENT",
        }
    }
}

impl fmt::Display for DemandClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DemandClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CUSTOMER" => Ok(DemandClass::Customer),
            "SAMPLES" => Ok(DemandClass::Samples),
            "ADJUSTMENT" => Ok(DemandClass::Adjustment),
            other => Err(format!("未知需求类别: {}", other)),
        }
    }
}
