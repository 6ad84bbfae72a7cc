// ==========================================
// 周度供应计划系统 - 需求预测
// ==========================================
// 方法: 滑动均值 (trailing mean)
// 规则:
// - 只使用 week <= run_week 的历史
// - 取最近 forecast_window_weeks 个有记录的周, 不足则有多少取多少, 没有则为 0
// - CUSTOMER / SAMPLES 分别计算; ADJUSTMENT 不预测
// - 结果在构造时保留 4 位小数, 之后各周直接复用
// ==========================================

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::domain::facts::FactKey;
use crate::domain::policy::ReplenishmentPolicy;
use crate::domain::types::DemandClass;
use crate::engine::ledger::DemandLedger;

/// 预测值保留小数位
pub const FORECAST_DECIMAL_PLACES: u32 = 4;

/// 预测方法标签 (用于结果解释)
pub const FORECAST_METHOD: &str = "trailing_mean";

/// 单键预测结果 (每周速率)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DemandForecast {
    pub customer: Decimal,
    pub samples: Decimal,
}

impl DemandForecast {
    /// 按类别取预测值; ADJUSTMENT 没有预测替代值
    pub fn rate_for(&self, class: DemandClass) -> Option<Decimal> {
        match class {
            DemandClass::Customer => Some(self.customer),
            DemandClass::Samples => Some(self.samples),
            DemandClass::Adjustment => None,
        }
    }
}

// ==========================================
// DemandForecaster - 滑动均值预测器
// ==========================================
#[derive(Debug, Default)]
pub struct DemandForecaster;

impl DemandForecaster {
    pub fn new() -> Self {
        Self
    }

    /// 为所有有策略的键计算预测
    #[instrument(skip(self, policies, ledger), fields(policy_count = policies.len()))]
    pub fn forecast_all(
        &self,
        policies: &HashMap<FactKey, ReplenishmentPolicy>,
        ledger: &DemandLedger,
        run_week: NaiveDate,
    ) -> HashMap<FactKey, DemandForecast> {
        let forecasts: HashMap<FactKey, DemandForecast> = policies
            .iter()
            .map(|(key, policy)| {
                let forecast =
                    self.forecast_key(ledger, key, policy.forecast_window_weeks, run_week);
                (key.clone(), forecast)
            })
            .collect();

        debug!(forecast_keys = forecasts.len(), "需求预测完成");
        forecasts
    }

    /// 单键预测
    pub fn forecast_key(
        &self,
        ledger: &DemandLedger,
        key: &FactKey,
        window_weeks: u32,
        run_week: NaiveDate,
    ) -> DemandForecast {
        DemandForecast {
            customer: self.trailing_mean(ledger, key, DemandClass::Customer, window_weeks, run_week),
            samples: self.trailing_mean(ledger, key, DemandClass::Samples, window_weeks, run_week),
        }
    }

    fn trailing_mean(
        &self,
        ledger: &DemandLedger,
        key: &FactKey,
        class: DemandClass,
        window_weeks: u32,
        run_week: NaiveDate,
    ) -> Decimal {
        let series = match ledger.series(key, class) {
            Some(s) => s,
            None => return Decimal::ZERO,
        };

        let tail: Vec<Decimal> = series
            .range(..=run_week)
            .rev()
            .take(window_weeks as usize)
            .map(|(_, qty)| *qty)
            .collect();

        if tail.is_empty() {
            return Decimal::ZERO;
        }

        let sum: Decimal = tail.iter().copied().sum();
        (sum / Decimal::from(tail.len()))
            .round_dp_with_strategy(FORECAST_DECIMAL_PLACES, RoundingStrategy::MidpointNearestEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::facts::DemandActual;
    use chrono::Duration;
    use std::str::FromStr;

    fn base_week() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 9, 7).unwrap()
    }

    fn actual(offset_weeks: i64, class: DemandClass, qty: &str) -> DemandActual {
        DemandActual {
            week: base_week() + Duration::days(7 * offset_weeks),
            sku: "SKU001".to_string(),
            location_code: "WH1".to_string(),
            demand_class: class,
            qty: Decimal::from_str(qty).unwrap(),
        }
    }

    fn key() -> FactKey {
        FactKey::new("SKU001", "WH1")
    }

    #[test]
    fn test_short_history_is_not_padded() {
        let ledger = DemandLedger::from_actuals(&[
            actual(0, DemandClass::Customer, "10"),
            actual(1, DemandClass::Customer, "20"),
            actual(2, DemandClass::Customer, "30"),
        ]);
        let run_week = base_week() + Duration::days(7 * 6);

        let f = DemandForecaster::new().forecast_key(&ledger, &key(), 8, run_week);

        assert_eq!(f.customer, Decimal::from_str("20.0000").unwrap());
        assert_eq!(f.samples, Decimal::ZERO);
    }

    #[test]
    fn test_window_keeps_most_recent_weeks() {
        let ledger = DemandLedger::from_actuals(&[
            actual(0, DemandClass::Customer, "100"),
            actual(1, DemandClass::Customer, "1"),
            actual(2, DemandClass::Customer, "2"),
        ]);
        let run_week = base_week() + Duration::days(14);

        let f = DemandForecaster::new().forecast_key(&ledger, &key(), 2, run_week);

        assert_eq!(f.customer, Decimal::from_str("1.5").unwrap());
    }

    #[test]
    fn test_history_after_run_week_is_ignored() {
        let ledger = DemandLedger::from_actuals(&[
            actual(0, DemandClass::Samples, "6"),
            actual(1, DemandClass::Samples, "500"),
        ]);

        let f = DemandForecaster::new().forecast_key(&ledger, &key(), 8, base_week());

        assert_eq!(f.samples, Decimal::from(6));
    }

    #[test]
    fn test_rate_rounded_to_four_places() {
        let ledger = DemandLedger::from_actuals(&[
            actual(0, DemandClass::Customer, "1"),
            actual(1, DemandClass::Customer, "1"),
            actual(2, DemandClass::Customer, "2"),
        ]);
        let run_week = base_week() + Duration::days(14);

        let f = DemandForecaster::new().forecast_key(&ledger, &key(), 8, run_week);

        assert_eq!(f.customer, Decimal::from_str("1.3333").unwrap());
    }

    #[test]
    fn test_adjustment_has_no_forecast() {
        let ledger = DemandLedger::from_actuals(&[actual(0, DemandClass::Adjustment, "40")]);

        let f = DemandForecaster::new().forecast_key(&ledger, &key(), 8, base_week());

        assert_eq!(f, DemandForecast::default());
        assert_eq!(f.rate_for(DemandClass::Adjustment), None);
    }
}
