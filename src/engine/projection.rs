// ==========================================
// 周度供应计划系统 - 库存投影模拟器
// ==========================================
// 职责: 单键从快照周起逐周滚动库存, 输出投影行与计划订单
// 红线:
// - 周必须升序处理: 当周到货可能包含前面周次下的计划订单
// - 到货+订单台账为每个键独立持有, 不跨键共享
// - 零提前期订单当周到货: 先按修正前覆盖周数判定, 再修正当周结果
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::domain::facts::FactKey;
use crate::domain::plan::{PlannedOrderRow, ProjectedInventoryRow};
use crate::domain::types::DemandClass;
use crate::domain::week::week_range;
use crate::engine::error::EngineResult;
use crate::engine::forecast::DemandForecast;
use crate::engine::ledger::{DemandLedger, ReceiptLedger};
use crate::engine::replenishment::{weeks_of_cover, ReplenishmentParams};
use crate::engine::snapshot_resolver::StartingPosition;

/// 投影周数: 一年 + 1 周缓冲, 保证累计一年提前期的订单仍落在窗口内
pub const HORIZON_WEEKS: usize = 53;

/// 单键投影输入
#[derive(Debug, Clone)]
pub struct KeyPlanInput {
    pub key: FactKey,
    pub start: StartingPosition,
    pub forecast: DemandForecast,
    pub params: ReplenishmentParams,
}

/// 单键投影输出
#[derive(Debug, Clone, Default)]
pub struct KeyProjection {
    pub projected_rows: Vec<ProjectedInventoryRow>,
    pub planned_orders: Vec<PlannedOrderRow>,
}

/// 当周临时结果, 补货判定与零提前期修正完成后才定稿
#[derive(Debug, Clone, Copy)]
struct ProvisionalWeek {
    start_qty: Decimal,
    receipts_qty: Decimal,
    demand_qty: Decimal,
    end_qty: Decimal,
    weeks_of_cover: Decimal,
}

impl ProvisionalWeek {
    fn finalize(self, plan_run_id: &str, key: &FactKey, week: NaiveDate) -> ProjectedInventoryRow {
        ProjectedInventoryRow {
            plan_run_id: plan_run_id.to_string(),
            week,
            sku: key.sku.clone(),
            location_code: key.location_code.clone(),
            start_qty: self.start_qty,
            receipts_qty: self.receipts_qty,
            demand_qty: self.demand_qty,
            end_qty: self.end_qty,
            weeks_of_cover: self.weeks_of_cover,
            stockout_flag: self.end_qty < Decimal::ZERO,
        }
    }
}

// ==========================================
// ProjectionSimulator - 投影模拟器
// ==========================================
#[derive(Debug, Clone)]
pub struct ProjectionSimulator {
    horizon_weeks: usize,
}

impl Default for ProjectionSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl ProjectionSimulator {
    pub fn new() -> Self {
        Self {
            horizon_weeks: HORIZON_WEEKS,
        }
    }

    pub fn horizon_weeks(&self) -> usize {
        self.horizon_weeks
    }

    /// 单键投影
    ///
    /// # 参数
    /// - plan_run_id: 所属计划运行
    /// - input: 起始库存 + 预测 + 补货参数
    /// - demand: 需求实绩台账 (只读)
    /// - receipts: 到货台账 (只读, 本键复制一份作为反馈台账)
    ///
    /// # 返回
    /// - Err(LeadTimeOutOfRange): 到货周超出日期范围
    pub fn simulate_key(
        &self,
        plan_run_id: &str,
        input: &KeyPlanInput,
        demand: &DemandLedger,
        receipts: &ReceiptLedger,
    ) -> EngineResult<KeyProjection> {
        let key = &input.key;
        let params = &input.params;
        let rate = params.effective_forecast_per_week;

        let mut receipts_plus_orders = receipts.seed_for(key);
        let mut projected_rows = Vec::with_capacity(self.horizon_weeks);
        let mut planned_orders = Vec::new();
        let mut running = input.start.on_hand_qty;

        for week in week_range(input.start.snapshot_week, self.horizon_weeks) {
            let receipts_qty = receipts_plus_orders
                .get(&week)
                .copied()
                .unwrap_or(Decimal::ZERO);
            let demand_qty = self.weekly_demand(demand, key, week, &input.forecast, params);
            let end_qty = running + receipts_qty - demand_qty;

            let mut current = ProvisionalWeek {
                start_qty: running,
                receipts_qty,
                demand_qty,
                end_qty,
                weeks_of_cover: weeks_of_cover(end_qty, rate),
            };

            if let Some(order_qty) = params.evaluate(current.end_qty) {
                let arrival_week = params.arrival_week(key, week)?;
                *receipts_plus_orders
                    .entry(arrival_week)
                    .or_insert(Decimal::ZERO) += order_qty;

                planned_orders.push(PlannedOrderRow {
                    plan_run_id: plan_run_id.to_string(),
                    week_placed: week,
                    sku: key.sku.clone(),
                    location_code: key.location_code.clone(),
                    order_qty,
                });

                // 零提前期: 订单当周到货, 只修正结果字段
                if params.lead_time_weeks == 0 {
                    current.end_qty += order_qty;
                    current.weeks_of_cover = weeks_of_cover(current.end_qty, rate);
                }
            }

            running = current.end_qty;
            projected_rows.push(current.finalize(plan_run_id, key, week));
        }

        debug!(
            key = %key,
            snapshot_week = %input.start.snapshot_week,
            lead_time_weeks = params.lead_time_weeks,
            forecast_per_week = %rate,
            order_count = planned_orders.len(),
            "单键投影完成"
        );

        Ok(KeyProjection {
            projected_rows,
            planned_orders,
        })
    }

    /// 当周需求 = CUSTOMER + SAMPLES + ADJUSTMENT
    ///
    /// 有实绩用实绩, 否则用预测; SAMPLES 在 include_samples=false 且无实绩时为 0;
    /// ADJUSTMENT 无实绩时为 0
    fn weekly_demand(
        &self,
        demand: &DemandLedger,
        key: &FactKey,
        week: NaiveDate,
        forecast: &DemandForecast,
        params: &ReplenishmentParams,
    ) -> Decimal {
        let customer = demand
            .actual(key, week, DemandClass::Customer)
            .unwrap_or(forecast.customer);

        let samples = match demand.actual(key, week, DemandClass::Samples) {
            Some(actual) => actual,
            None if params.include_samples => forecast.samples,
            None => Decimal::ZERO,
        };

        let adjustment = demand
            .actual(key, week, DemandClass::Adjustment)
            .unwrap_or(Decimal::ZERO);

        customer + samples + adjustment
    }
}
