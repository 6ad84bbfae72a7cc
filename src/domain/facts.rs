// ==========================================
// 周度供应计划系统 - 事实数据领域模型
// ==========================================
// 来源: 外部导入 (库存快照/到货/需求实绩)
// 红线: 事实数据只读, 引擎不回写
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::policy::ReplenishmentPolicy;
use crate::domain::types::DemandClass;

// ==========================================
// FactKey - 计划行键 (sku, location)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FactKey {
    pub sku: String,
    pub location_code: String,
}

impl FactKey {
    pub fn new(sku: impl Into<String>, location_code: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            location_code: location_code.into(),
        }
    }
}

impl fmt::Display for FactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.sku, self.location_code)
    }
}

// ==========================================
// InventorySnapshot - 周库存快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub week: NaiveDate,        // 周一
    pub sku: String,            // 物料
    pub location_code: String,  // 仓库
    pub on_hand_qty: Decimal,   // 在库数量
}

impl InventorySnapshot {
    pub fn key(&self) -> FactKey {
        FactKey::new(self.sku.as_str(), self.location_code.as_str())
    }
}

// ==========================================
// Receipt - 计划到货
// ==========================================
// 同周同键不同来源标签的到货累加
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub week: NaiveDate,
    pub sku: String,
    pub location_code: String,
    pub qty: Decimal,
    pub source_tag: Option<String>, // PO / TRANSFER 等
}

impl Receipt {
    pub fn key(&self) -> FactKey {
        FactKey::new(self.sku.as_str(), self.location_code.as_str())
    }
}

// ==========================================
// DemandActual - 需求实绩
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandActual {
    pub week: NaiveDate,
    pub sku: String,
    pub location_code: String,
    pub demand_class: DemandClass,
    pub qty: Decimal,
}

impl DemandActual {
    pub fn key(&self) -> FactKey {
        FactKey::new(self.sku.as_str(), self.location_code.as_str())
    }
}

// ==========================================
// FactSet - 一次计划运行的全部输入
// ==========================================
// 由存储层一次性全量加载, 引擎不再做任何查询
#[derive(Debug, Clone, Default)]
pub struct FactSet {
    pub snapshots: Vec<InventorySnapshot>,
    pub receipts: Vec<Receipt>,
    pub demand: Vec<DemandActual>,
    pub policies: Vec<ReplenishmentPolicy>,
}

impl FactSet {
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
            && self.receipts.is_empty()
            && self.demand.is_empty()
            && self.policies.is_empty()
    }
}
