// ==========================================
// 周度供应计划系统 - 计划运行领域模型
// ==========================================
// PlanRun 创建后不可变, 投影行与计划订单为其子记录
// 红线: 新的运行只追加, 不修改/删除历史运行
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::facts::FactKey;
use crate::domain::week::week_start;

// ==========================================
// PlanRun - 计划运行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRun {
    pub plan_run_id: String,                  // 运行ID
    pub scenario_name: String,                // 场景名称
    pub run_date: NaiveDate,                  // 运行日期
    pub run_week: NaiveDate,                  // 运行日期所在周一
    pub created_date: NaiveDate,              // 创建日期
    pub config_snapshot_json: Option<String>, // 配置快照 (JSON)
}

impl PlanRun {
    pub fn new(
        plan_run_id: impl Into<String>,
        scenario_name: impl Into<String>,
        run_date: NaiveDate,
        created_date: NaiveDate,
    ) -> Self {
        Self {
            plan_run_id: plan_run_id.into(),
            scenario_name: scenario_name.into(),
            run_date,
            run_week: week_start(run_date),
            created_date,
            config_snapshot_json: None,
        }
    }

    pub fn with_config_snapshot(mut self, snapshot_json: String) -> Self {
        self.config_snapshot_json = Some(snapshot_json);
        self
    }
}

// ==========================================
// ProjectedInventoryRow - 周库存投影
// ==========================================
// end_qty = start_qty + receipts_qty - demand_qty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedInventoryRow {
    pub plan_run_id: String,
    pub week: NaiveDate,
    pub sku: String,
    pub location_code: String,
    pub start_qty: Decimal,
    pub receipts_qty: Decimal,
    pub demand_qty: Decimal,
    pub end_qty: Decimal,
    pub weeks_of_cover: Decimal, // 2 位小数
    pub stockout_flag: bool,     // end_qty < 0
}

impl ProjectedInventoryRow {
    pub fn key(&self) -> FactKey {
        FactKey::new(self.sku.as_str(), self.location_code.as_str())
    }
}

// ==========================================
// PlannedOrderRow - 计划订单
// ==========================================
// week_placed 为下单周, 不是到货周
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedOrderRow {
    pub plan_run_id: String,
    pub week_placed: NaiveDate,
    pub sku: String,
    pub location_code: String,
    pub order_qty: Decimal, // 4 位小数, > 0
}

impl PlannedOrderRow {
    pub fn key(&self) -> FactKey {
        FactKey::new(self.sku.as_str(), self.location_code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_run_derives_run_week() {
        let run_date = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        let run = PlanRun::new("R1", "baseline", run_date, run_date);
        assert_eq!(run.run_week, NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(run.config_snapshot_json.is_none());

        let run = run.with_config_snapshot("{}".to_string());
        assert_eq!(run.config_snapshot_json.as_deref(), Some("{}"));
    }
}
