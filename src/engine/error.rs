// ==========================================
// 周度供应计划系统 - 引擎层错误类型
// ==========================================
// 引擎是纯计算: 输入契约被破坏时直接失败, 不做重试
// 工具: thiserror 派生宏
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// 引擎层错误类型 (输入契约违反)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("周日期不是周一: fact={fact}, key={sku}@{location_code}, week={week}")]
    NonMondayWeek {
        fact: &'static str,
        sku: String,
        location_code: String,
        week: NaiveDate,
    },

    #[error("预测窗口必须 >= 1: key={sku}@{location_code}, value={value}")]
    InvalidForecastWindow {
        sku: String,
        location_code: String,
        value: u32,
    },

    #[error("策略字段不能为负 (key={sku}@{location_code}, field={field}): {value}")]
    NegativePolicyValue {
        sku: String,
        location_code: String,
        field: &'static str,
        value: Decimal,
    },

    #[error("提前期超出范围: key={sku}@{location_code}, total={total}")]
    LeadTimeOutOfRange {
        sku: String,
        location_code: String,
        total: Decimal,
    },
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
