// ==========================================
// 周度供应计划系统 - 事实数据台账
// ==========================================
// 职责: 把全量事实记录聚合成按 (key, week) 查询的只读台账
// 约定: 同键同周的到货按来源累加; 同键同周同类别的需求按和聚合
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::domain::facts::{DemandActual, FactKey, Receipt};
use crate::domain::types::DemandClass;

/// 单键时间序列 (周 → 数量), 按周升序
pub type WeeklySeries = BTreeMap<NaiveDate, Decimal>;

// ==========================================
// ReceiptLedger - 到货台账
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ReceiptLedger {
    by_key: HashMap<FactKey, WeeklySeries>,
}

impl ReceiptLedger {
    /// 从到货记录构建 (不同来源标签累加)
    pub fn from_receipts(receipts: &[Receipt]) -> Self {
        let mut by_key: HashMap<FactKey, WeeklySeries> = HashMap::new();
        for r in receipts {
            *by_key
                .entry(r.key())
                .or_default()
                .entry(r.week)
                .or_insert(Decimal::ZERO) += r.qty;
        }
        Self { by_key }
    }

    /// 指定周的到货合计
    pub fn total(&self, key: &FactKey, week: NaiveDate) -> Decimal {
        self.by_key
            .get(key)
            .and_then(|series| series.get(&week))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }

    /// 为单键投影复制一份独立的到货序列
    ///
    /// 投影过程中计划订单的到货写入这份副本, 不影响其他键
    pub fn seed_for(&self, key: &FactKey) -> WeeklySeries {
        self.by_key.get(key).cloned().unwrap_or_default()
    }

    pub fn key_count(&self) -> usize {
        self.by_key.len()
    }
}

// ==========================================
// DemandLedger - 需求实绩台账
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct DemandLedger {
    by_key: HashMap<FactKey, HashMap<DemandClass, WeeklySeries>>,
}

impl DemandLedger {
    /// 从需求实绩构建
    ///
    /// 上游保证 (week, key, class) 唯一; 若出现重复则求和并告警
    pub fn from_actuals(actuals: &[DemandActual]) -> Self {
        let mut by_key: HashMap<FactKey, HashMap<DemandClass, WeeklySeries>> = HashMap::new();
        let mut duplicates = 0usize;

        for d in actuals {
            let series = by_key
                .entry(d.key())
                .or_default()
                .entry(d.demand_class)
                .or_default();
            match series.get_mut(&d.week) {
                Some(existing) => {
                    duplicates += 1;
                    *existing += d.qty;
                }
                None => {
                    series.insert(d.week, d.qty);
                }
            }
        }

        if duplicates > 0 {
            warn!(duplicates, "需求实绩存在重复记录, 已按和聚合");
        }

        Self { by_key }
    }

    /// 指定 (key, week, class) 的实绩, 不存在返回 None
    pub fn actual(&self, key: &FactKey, week: NaiveDate, class: DemandClass) -> Option<Decimal> {
        self.series(key, class)
            .and_then(|series| series.get(&week))
            .copied()
    }

    /// 指定 (key, class) 的完整周序列
    pub fn series(&self, key: &FactKey, class: DemandClass) -> Option<&WeeklySeries> {
        self.by_key.get(key).and_then(|classes| classes.get(&class))
    }
}
