// ==========================================
// 周度供应计划系统 - 补货策略求值
// ==========================================
// 职责: 把策略 + 预测折算成单键补货参数, 并逐周判定是否下单
// 规则:
// - 提前期 = ceil(五个分量之和), 小数周一律向上取整
// - 基线需求 = CUSTOMER 预测 + (include_samples ? SAMPLES 预测 : 0)
// - 安全库存: WEEKS 方法且基线 > 0 时 = 基线 * safety_weeks, 否则为 0
// - 所有覆盖率/再订货点计算先判断基线 > 0, 不做除零
// ==========================================

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::domain::facts::FactKey;
use crate::domain::policy::ReplenishmentPolicy;
use crate::domain::types::{PlanningMode, SafetyStockMethod};
use crate::domain::week::checked_add_weeks;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::forecast::DemandForecast;

/// 覆盖周数保留小数位
pub const COVER_DECIMAL_PLACES: u32 = 2;
/// 订单数量保留小数位
pub const ORDER_DECIMAL_PLACES: u32 = 4;

/// 基线为 0 且库存为正时的覆盖周数哨兵值 (999.00)
pub fn cover_sentinel() -> Decimal {
    Decimal::new(99900, 2)
}

/// 未取整的覆盖周数; 基线 <= 0 时无定义
///
/// 补货判定与订单数量都基于该值, 取整只用于落库
pub fn exact_weeks_of_cover(end_qty: Decimal, forecast_per_week: Decimal) -> Option<Decimal> {
    if forecast_per_week > Decimal::ZERO {
        Some(end_qty / forecast_per_week)
    } else {
        None
    }
}

/// 覆盖周数
///
/// - 基线 > 0: end_qty / 基线, 保留 2 位
/// - 基线 = 0: end_qty > 0 取 999.00, 否则 0.00
pub fn weeks_of_cover(end_qty: Decimal, forecast_per_week: Decimal) -> Decimal {
    match exact_weeks_of_cover(end_qty, forecast_per_week) {
        Some(cover) => {
            cover.round_dp_with_strategy(COVER_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
        }
        None if end_qty > Decimal::ZERO => cover_sentinel(),
        None => Decimal::new(0, COVER_DECIMAL_PLACES),
    }
}

/// 订单数量固定 4 位小数
fn round_order_qty(qty: Decimal) -> Decimal {
    let mut rounded =
        qty.round_dp_with_strategy(ORDER_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(ORDER_DECIMAL_PLACES);
    rounded
}

/// 校验策略是否满足输入契约
pub fn validate_policy(policy: &ReplenishmentPolicy) -> EngineResult<()> {
    if policy.forecast_window_weeks < 1 {
        return Err(EngineError::InvalidForecastWindow {
            sku: policy.sku.clone(),
            location_code: policy.location_code.clone(),
            value: policy.forecast_window_weeks,
        });
    }

    let scalar_fields = [
        ("target_weeks", policy.target_weeks),
        ("safety_weeks", policy.safety_weeks),
    ];
    let lead_time_fields = policy.lead_time.components();

    for &(field, value) in scalar_fields.iter().chain(lead_time_fields.iter()) {
        if value < Decimal::ZERO {
            return Err(EngineError::NegativePolicyValue {
                sku: policy.sku.clone(),
                location_code: policy.location_code.clone(),
                field,
                value,
            });
        }
    }

    Ok(())
}

/// 总提前期 (整周), 向上取整
pub fn total_lead_time_weeks(policy: &ReplenishmentPolicy) -> EngineResult<u32> {
    let total = policy.lead_time.total();
    total
        .ceil()
        .to_u32()
        .ok_or_else(|| EngineError::LeadTimeOutOfRange {
            sku: policy.sku.clone(),
            location_code: policy.location_code.clone(),
            total,
        })
}

// ==========================================
// ReplenishmentParams - 单键补货参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReplenishmentParams {
    pub mode: PlanningMode,
    pub target_weeks: Decimal,
    pub lead_time_weeks: u32,
    pub effective_forecast_per_week: Decimal,
    pub safety_stock_qty: Decimal,
    pub include_samples: bool,
}

impl ReplenishmentParams {
    /// 由策略和预测折算补货参数
    pub fn derive(policy: &ReplenishmentPolicy, forecast: &DemandForecast) -> EngineResult<Self> {
        validate_policy(policy)?;
        let lead_time_weeks = total_lead_time_weeks(policy)?;

        let effective_forecast_per_week = if policy.include_samples {
            forecast.customer + forecast.samples
        } else {
            forecast.customer
        };

        let safety_stock_qty = match policy.safety_method {
            SafetyStockMethod::Weeks if effective_forecast_per_week > Decimal::ZERO => {
                effective_forecast_per_week * policy.safety_weeks
            }
            SafetyStockMethod::Weeks => Decimal::ZERO,
            SafetyStockMethod::ServiceLevel => {
                debug!(
                    sku = %policy.sku,
                    location_code = %policy.location_code,
                    "SERVICE_LEVEL 安全库存未实现, 按 0 处理"
                );
                Decimal::ZERO
            }
        };

        Ok(Self {
            mode: policy.mode,
            target_weeks: policy.target_weeks,
            lead_time_weeks,
            effective_forecast_per_week,
            safety_stock_qty,
            include_samples: policy.include_samples,
        })
    }

    pub fn has_demand(&self) -> bool {
        self.effective_forecast_per_week > Decimal::ZERO
    }

    /// 再订货点 = 基线 * 提前期 + 安全库存
    pub fn reorder_point(&self) -> Decimal {
        self.effective_forecast_per_week * Decimal::from(self.lead_time_weeks)
            + self.safety_stock_qty
    }

    /// 下单周对应的到货周; 超出日期范围视为提前期越界
    pub fn arrival_week(&self, key: &FactKey, week_placed: NaiveDate) -> EngineResult<NaiveDate> {
        checked_add_weeks(week_placed, self.lead_time_weeks).ok_or_else(|| {
            EngineError::LeadTimeOutOfRange {
                sku: key.sku.clone(),
                location_code: key.location_code.clone(),
                total: Decimal::from(self.lead_time_weeks),
            }
        })
    }

    /// 当周是否触发补货
    ///
    /// 使用当周修正前的 end_qty; 返回 Some 时数量必为正
    pub fn evaluate(&self, end_qty: Decimal) -> Option<Decimal> {
        let rate = self.effective_forecast_per_week;
        let cover = exact_weeks_of_cover(end_qty, rate)?;

        let order_qty = match self.mode {
            PlanningMode::TargetCover => {
                if cover >= self.target_weeks {
                    return None;
                }
                round_order_qty((self.target_weeks - cover) * rate)
            }
            PlanningMode::ReorderPoint => {
                let rop = self.reorder_point();
                if end_qty >= rop {
                    return None;
                }
                round_order_qty((rop - end_qty).max(Decimal::ZERO))
            }
        };

        if order_qty > Decimal::ZERO {
            Some(order_qty)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::LeadTimeComponents;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn policy(mode: PlanningMode) -> ReplenishmentPolicy {
        ReplenishmentPolicy {
            mode,
            lead_time: LeadTimeComponents::zero(),
            ..ReplenishmentPolicy::with_defaults("SKU001", "WH1")
        }
    }

    fn forecast(customer: &str, samples: &str) -> DemandForecast {
        DemandForecast {
            customer: dec(customer),
            samples: dec(samples),
        }
    }

    #[test]
    fn test_fractional_lead_time_rounds_up() {
        let mut p = policy(PlanningMode::ReorderPoint);
        p.lead_time.production_weeks = dec("1.6");
        p.lead_time.haulage_weeks = dec("0.5");
        assert_eq!(total_lead_time_weeks(&p).unwrap(), 3);

        p.lead_time.haulage_weeks = dec("0.4");
        assert_eq!(total_lead_time_weeks(&p).unwrap(), 2);

        assert_eq!(total_lead_time_weeks(&policy(PlanningMode::TargetCover)).unwrap(), 0);
    }

    #[test]
    fn test_cover_sentinels() {
        assert_eq!(weeks_of_cover(dec("10"), Decimal::ZERO), dec("999.00"));
        assert_eq!(weeks_of_cover(Decimal::ZERO, Decimal::ZERO), dec("0.00"));
        assert_eq!(weeks_of_cover(dec("-5"), Decimal::ZERO), dec("0.00"));
        assert_eq!(weeks_of_cover(dec("100"), dec("30")), dec("3.33"));
        assert_eq!(weeks_of_cover(dec("-25"), dec("10")), dec("-2.50"));
    }

    #[test]
    fn test_samples_excluded_from_baseline_when_disabled() {
        let mut p = policy(PlanningMode::TargetCover);
        p.include_samples = false;
        let params = ReplenishmentParams::derive(&p, &forecast("20", "5")).unwrap();
        assert_eq!(params.effective_forecast_per_week, dec("20"));

        p.include_samples = true;
        let params = ReplenishmentParams::derive(&p, &forecast("20", "5")).unwrap();
        assert_eq!(params.effective_forecast_per_week, dec("25"));
    }

    #[test]
    fn test_safety_stock_methods() {
        let mut p = policy(PlanningMode::ReorderPoint);
        p.safety_weeks = dec("1.5");
        p.lead_time.production_weeks = dec("2");

        let params = ReplenishmentParams::derive(&p, &forecast("10", "0")).unwrap();
        assert_eq!(params.safety_stock_qty, dec("15"));
        assert_eq!(params.reorder_point(), dec("35"));

        p.safety_method = SafetyStockMethod::ServiceLevel;
        let params = ReplenishmentParams::derive(&p, &forecast("10", "0")).unwrap();
        assert_eq!(params.safety_stock_qty, Decimal::ZERO);
        assert_eq!(params.reorder_point(), dec("20"));
    }

    #[test]
    fn test_target_cover_orders_shortfall() {
        let mut p = policy(PlanningMode::TargetCover);
        p.target_weeks = dec("4");
        let params = ReplenishmentParams::derive(&p, &forecast("25", "0")).unwrap();

        assert_eq!(params.evaluate(dec("100")), None);
        assert_eq!(params.evaluate(dec("75")), Some(dec("25")));
        assert_eq!(params.evaluate(dec("-50")), Some(dec("150")));
    }

    #[test]
    fn test_target_cover_uses_unrounded_cover() {
        let p = policy(PlanningMode::TargetCover);

        // 99.9 / 25 = 3.996, 取整后为 4.00 但仍低于目标
        let params = ReplenishmentParams::derive(&p, &forecast("25", "0")).unwrap();
        assert_eq!(weeks_of_cover(dec("99.9"), dec("25")), dec("4.00"));
        assert_eq!(params.evaluate(dec("99.9")), Some(dec("0.1")));

        // 74 / 30 = 2.4667, 补足后恰好 4 周
        let params = ReplenishmentParams::derive(&p, &forecast("30", "0")).unwrap();
        let order = params.evaluate(dec("74")).unwrap();
        assert_eq!(order, dec("46"));
        assert_eq!(weeks_of_cover(dec("74") + order, dec("30")), dec("4.00"));
    }

    #[test]
    fn test_order_qty_has_fixed_scale() {
        let params =
            ReplenishmentParams::derive(&policy(PlanningMode::TargetCover), &forecast("25", "0"))
                .unwrap();
        assert_eq!(params.evaluate(dec("75.00")).unwrap().to_string(), "25.0000");

        let mut p = policy(PlanningMode::ReorderPoint);
        p.lead_time.haulage_weeks = dec("1");
        p.safety_weeks = Decimal::ZERO;
        let params = ReplenishmentParams::derive(&p, &forecast("10", "0")).unwrap();
        assert_eq!(params.evaluate(dec("5")).unwrap().to_string(), "5.0000");
    }

    #[test]
    fn test_reorder_point_orders_up_to_rop() {
        let mut p = policy(PlanningMode::ReorderPoint);
        p.lead_time.haulage_weeks = dec("1");
        p.safety_weeks = Decimal::ZERO;
        let params = ReplenishmentParams::derive(&p, &forecast("10", "0")).unwrap();

        assert_eq!(params.reorder_point(), dec("10"));
        assert_eq!(params.evaluate(dec("10")), None);
        assert_eq!(params.evaluate(dec("3.12345")), Some(dec("6.8766")));
    }

    #[test]
    fn test_zero_baseline_never_orders() {
        let params =
            ReplenishmentParams::derive(&policy(PlanningMode::ReorderPoint), &forecast("0", "0"))
                .unwrap();
        assert_eq!(params.evaluate(dec("-100")), None);

        let params =
            ReplenishmentParams::derive(&policy(PlanningMode::TargetCover), &forecast("0", "0"))
                .unwrap();
        assert_eq!(params.evaluate(dec("-100")), None);
    }

    #[test]
    fn test_contract_violations() {
        let mut p = policy(PlanningMode::TargetCover);
        p.forecast_window_weeks = 0;
        assert!(matches!(
            validate_policy(&p),
            Err(EngineError::InvalidForecastWindow { value: 0, .. })
        ));

        let mut p = policy(PlanningMode::TargetCover);
        p.lead_time.putaway_weeks = dec("-0.5");
        assert!(matches!(
            ReplenishmentParams::derive(&p, &forecast("1", "0")),
            Err(EngineError::NegativePolicyValue { field: "putaway", .. })
        ));
    }

    #[test]
    fn test_arrival_week_offsets_by_lead_time() {
        let mut p = policy(PlanningMode::ReorderPoint);
        p.lead_time.production_weeks = dec("2.1");
        let params = ReplenishmentParams::derive(&p, &forecast("1", "0")).unwrap();
        let placed = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let key = p.key();

        assert_eq!(params.lead_time_weeks, 3);
        assert_eq!(
            params.arrival_week(&key, placed).unwrap(),
            NaiveDate::from_ymd_opt(2026, 11, 9).unwrap()
        );
    }

    #[test]
    fn test_arrival_week_out_of_date_range() {
        let mut p = policy(PlanningMode::ReorderPoint);
        p.lead_time.production_weeks = dec("20000000");
        let params = ReplenishmentParams::derive(&p, &forecast("1", "0")).unwrap();
        let placed = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        assert!(matches!(
            params.arrival_week(&p.key(), placed),
            Err(EngineError::LeadTimeOutOfRange { .. })
        ));
    }
}
