// ==========================================
// 周度供应计划系统 - 补货策略仓储
// ==========================================
// 表: planning_policies, 主键 (sku, location_code)
// 读取时 NULL 列回落到默认策略值
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::facts::FactKey;
use crate::domain::policy::{LeadTimeComponents, ReplenishmentPolicy};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{decimal_to_text, get_opt_decimal, get_opt_enum};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const POLICY_COLUMNS: &str = r#"
    sku, location_code, mode, target_weeks, safety_method, safety_weeks,
    service_level, forecast_window_weeks,
    lt_production_weeks, lt_slot_wait_weeks, lt_haulage_weeks,
    lt_putaway_weeks, lt_padding_weeks, include_samples
"#;

// ==========================================
// PolicyRepository - 补货策略仓储
// ==========================================
pub struct PolicyRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PolicyRepository {
    /// 创建新的 PolicyRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增或覆盖策略 (INSERT OR REPLACE)
    pub fn upsert(&self, policy: &ReplenishmentPolicy) -> RepositoryResult<()> {
        self.upsert_batch(std::slice::from_ref(policy)).map(|_| ())
    }

    /// 批量新增或覆盖策略
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    pub fn upsert_batch(&self, policies: &[ReplenishmentPolicy]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT OR REPLACE INTO planning_policies ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
                POLICY_COLUMNS
            ))?;
            for p in policies {
                let lt = &p.lead_time;
                stmt.execute(params![
                    p.sku,
                    p.location_code,
                    p.mode.as_str(),
                    decimal_to_text(p.target_weeks),
                    p.safety_method.as_str(),
                    decimal_to_text(p.safety_weeks),
                    p.service_level.map(decimal_to_text),
                    p.forecast_window_weeks,
                    decimal_to_text(lt.production_weeks),
                    decimal_to_text(lt.slot_wait_weeks),
                    decimal_to_text(lt.haulage_weeks),
                    decimal_to_text(lt.putaway_weeks),
                    decimal_to_text(lt.padding_weeks),
                    p.include_samples,
                ])?;
            }
        }
        tx.commit()?;
        Ok(policies.len())
    }

    /// 读取全部策略, 按 (sku, location_code) 排序
    pub fn load_all(&self) -> RepositoryResult<Vec<ReplenishmentPolicy>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM planning_policies ORDER BY sku, location_code",
            POLICY_COLUMNS
        ))?;
        let policies = stmt
            .query_map([], map_policy_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(policies)
    }

    /// 按键查询策略
    ///
    /// # 返回
    /// - Ok(Some(policy)): 找到
    /// - Ok(None): 未配置
    pub fn find_by_key(&self, key: &FactKey) -> RepositoryResult<Option<ReplenishmentPolicy>> {
        let conn = self.get_conn()?;
        let policy = conn
            .query_row(
                &format!(
                    "SELECT {} FROM planning_policies WHERE sku = ?1 AND location_code = ?2",
                    POLICY_COLUMNS
                ),
                params![key.sku, key.location_code],
                map_policy_row,
            )
            .optional()?;
        Ok(policy)
    }

    /// 删除策略
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 原本不存在
    pub fn delete(&self, key: &FactKey) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            "DELETE FROM planning_policies WHERE sku = ?1 AND location_code = ?2",
            params![key.sku, key.location_code],
        )?;
        Ok(changed > 0)
    }
}

/// 行 → 策略; NULL 列取默认值
fn map_policy_row(row: &Row<'_>) -> rusqlite::Result<ReplenishmentPolicy> {
    let sku: String = row.get(0)?;
    let location_code: String = row.get(1)?;
    let defaults = ReplenishmentPolicy::with_defaults(sku.as_str(), location_code.as_str());
    let default_lt = defaults.lead_time.clone();

    Ok(ReplenishmentPolicy {
        mode: get_opt_enum(row, 2)?.unwrap_or(defaults.mode),
        target_weeks: get_opt_decimal(row, 3)?.unwrap_or(defaults.target_weeks),
        safety_method: get_opt_enum(row, 4)?.unwrap_or(defaults.safety_method),
        safety_weeks: get_opt_decimal(row, 5)?.unwrap_or(defaults.safety_weeks),
        service_level: get_opt_decimal(row, 6)?.or(defaults.service_level),
        forecast_window_weeks: row
            .get::<_, Option<u32>>(7)?
            .unwrap_or(defaults.forecast_window_weeks),
        lead_time: LeadTimeComponents {
            production_weeks: get_opt_decimal(row, 8)?.unwrap_or(default_lt.production_weeks),
            slot_wait_weeks: get_opt_decimal(row, 9)?.unwrap_or(default_lt.slot_wait_weeks),
            haulage_weeks: get_opt_decimal(row, 10)?.unwrap_or(default_lt.haulage_weeks),
            putaway_weeks: get_opt_decimal(row, 11)?.unwrap_or(default_lt.putaway_weeks),
            padding_weeks: get_opt_decimal(row, 12)?.unwrap_or(default_lt.padding_weeks),
        },
        include_samples: row
            .get::<_, Option<bool>>(13)?
            .unwrap_or(defaults.include_samples),
        sku,
        location_code,
    })
}
