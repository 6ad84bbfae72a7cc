// ==========================================
// 周度供应计划系统 - 行编解码
// ==========================================
// 数量一律以十进制字符串落库 (TEXT), 读出时精确还原
// 解析失败转为 rusqlite 的 FromSqlConversionFailure, 由 row 映射闭包直接 `?`
// ==========================================

use rusqlite::types::Type;
use rust_decimal::Decimal;
use std::str::FromStr;

fn conversion_error<E>(idx: usize, cause: E) -> rusqlite::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, cause.into())
}

/// 十进制 → TEXT (保留小数位, 4.00 不会变成 4)
pub fn decimal_to_text(value: Decimal) -> String {
    value.to_string()
}

/// 读取必填十进制列
pub fn get_decimal(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim()).map_err(|e| conversion_error(idx, e))
}

/// 读取可空十进制列
pub fn get_opt_decimal(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) if !raw.trim().is_empty() => Decimal::from_str(raw.trim())
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        _ => Ok(None),
    }
}

/// 读取可空枚举列 (FromStr<Err = String>)
pub fn get_opt_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<Option<T>>
where
    T: FromStr<Err = String>,
{
    match row.get::<_, Option<String>>(idx)? {
        Some(raw) => T::from_str(raw.trim())
            .map(Some)
            .map_err(|e| conversion_error(idx, e)),
        None => Ok(None),
    }
}

/// 读取必填枚举列
pub fn get_enum<T>(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    T::from_str(raw.trim()).map_err(|e| conversion_error(idx, e))
}
