// ==========================================
// 周度供应计划系统 - 补货策略领域模型
// ==========================================
// 一个 (sku, location) 对应一条策略
// 运行期间只读
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::facts::FactKey;
use crate::domain::types::{PlanningMode, SafetyStockMethod};

/// 默认目标覆盖周数
pub const DEFAULT_TARGET_WEEKS: i64 = 4;
/// 默认安全库存周数
pub const DEFAULT_SAFETY_WEEKS: i64 = 1;
/// 默认预测窗口 (周)
pub const DEFAULT_FORECAST_WINDOW_WEEKS: u32 = 8;

// ==========================================
// LeadTimeComponents - 提前期构成 (单位: 周)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadTimeComponents {
    pub production_weeks: Decimal, // 生产
    pub slot_wait_weeks: Decimal,  // 等待排产窗口
    pub haulage_weeks: Decimal,    // 运输
    pub putaway_weeks: Decimal,    // 入库上架
    pub padding_weeks: Decimal,    // 缓冲
}

impl LeadTimeComponents {
    pub fn zero() -> Self {
        Self {
            production_weeks: Decimal::ZERO,
            slot_wait_weeks: Decimal::ZERO,
            haulage_weeks: Decimal::ZERO,
            putaway_weeks: Decimal::ZERO,
            padding_weeks: Decimal::ZERO,
        }
    }

    /// 各分量 (名称, 值), 用于校验与展示
    pub fn components(&self) -> [(&'static str, Decimal); 5] {
        [
            ("production", self.production_weeks),
            ("slot_wait", self.slot_wait_weeks),
            ("haulage", self.haulage_weeks),
            ("putaway", self.putaway_weeks),
            ("padding", self.padding_weeks),
        ]
    }

    /// 提前期合计 (未取整)
    pub fn total(&self) -> Decimal {
        self.components().iter().map(|(_, v)| *v).sum()
    }
}

impl Default for LeadTimeComponents {
    /// 生产 2 周 + 运输 1 周
    fn default() -> Self {
        Self {
            production_weeks: Decimal::from(2),
            haulage_weeks: Decimal::ONE,
            ..Self::zero()
        }
    }
}

// ==========================================
// ReplenishmentPolicy - 补货策略
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplenishmentPolicy {
    pub sku: String,
    pub location_code: String,
    pub mode: PlanningMode,
    pub target_weeks: Decimal,                // 目标覆盖周数 (TARGET_COVER)
    pub safety_method: SafetyStockMethod,
    pub safety_weeks: Decimal,                // 安全库存周数 (WEEKS)
    pub service_level: Option<Decimal>,       // 服务水平, 仅存档
    pub forecast_window_weeks: u32,           // 预测窗口 >= 1
    pub lead_time: LeadTimeComponents,
    pub include_samples: bool,                // 样品需求是否计入基线
}

impl ReplenishmentPolicy {
    /// 按默认值创建策略
    pub fn with_defaults(sku: impl Into<String>, location_code: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            location_code: location_code.into(),
            mode: PlanningMode::default(),
            target_weeks: Decimal::from(DEFAULT_TARGET_WEEKS),
            safety_method: SafetyStockMethod::default(),
            safety_weeks: Decimal::from(DEFAULT_SAFETY_WEEKS),
            service_level: Some(Decimal::new(95, 2)),
            forecast_window_weeks: DEFAULT_FORECAST_WINDOW_WEEKS,
            lead_time: LeadTimeComponents::default(),
            include_samples: true,
        }
    }

    pub fn key(&self) -> FactKey {
        FactKey::new(self.sku.as_str(), self.location_code.as_str())
    }
}
