// ==========================================
// 周度供应计划系统 - 周桶工具
// ==========================================
// 约定: 所有时间序列按 ISO 周分桶, 以周一日期标识
// ==========================================

use chrono::{Datelike, Days, Duration, NaiveDate, Weekday};

/// 返回 d 所在 ISO 周的周一
pub fn week_start(d: NaiveDate) -> NaiveDate {
    d - Duration::days(i64::from(d.weekday().num_days_from_monday()))
}

/// 是否为周一
pub fn is_week_start(d: NaiveDate) -> bool {
    d.weekday() == Weekday::Mon
}

/// 下一周的周一
pub fn next_week(d: NaiveDate) -> NaiveDate {
    week_start(d) + Duration::days(7)
}

/// 向后偏移 n 周
pub fn add_weeks(week: NaiveDate, n: u32) -> NaiveDate {
    week + Duration::days(7 * i64::from(n))
}

/// 向后偏移 n 周, 超出日期范围返回 None
pub fn checked_add_weeks(week: NaiveDate, n: u32) -> Option<NaiveDate> {
    week.checked_add_days(Days::new(7 * u64::from(n)))
}

/// 从 start 起连续 count 周 (升序)
pub fn week_range(start: NaiveDate, count: usize) -> Vec<NaiveDate> {
    let mut weeks = Vec::with_capacity(count);
    let mut w = start;
    for _ in 0..count {
        weeks.push(w);
        w = next_week(w);
    }
    weeks
}
