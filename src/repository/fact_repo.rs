// ==========================================
// 周度供应计划系统 - 事实数据仓储
// ==========================================
// 表: inventory_snapshots_weekly / receipts / demand_actuals
// 红线: Repository 不含业务逻辑 (不聚合、不去重, 原样读出)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::facts::{DemandActual, InventorySnapshot, Receipt};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{decimal_to_text, get_decimal, get_enum, get_opt_decimal};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

// ==========================================
// FactRepository - 事实数据仓储
// ==========================================
/// 事实数据仓储
/// 职责: 库存快照、到货、需求实绩的批量写入与全量读取
pub struct FactRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FactRepository {
    /// 创建新的 FactRepository 实例
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

    // ==========================================
    // 写入
    // ==========================================

    /// 批量插入库存快照
    ///
    /// # 返回
    /// - Ok(usize): 插入条数
    pub fn insert_snapshots(&self, snapshots: &[InventorySnapshot]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO inventory_snapshots_weekly (week, sku, location_code, on_hand_qty)
                   VALUES (?1, ?2, ?3, ?4)"#,
            )?;
            for s in snapshots {
                stmt.execute(params![
                    s.week,
                    s.sku,
                    s.location_code,
                    decimal_to_text(s.on_hand_qty),
                ])?;
            }
        }
        tx.commit()?;
        Ok(snapshots.len())
    }

    /// 批量插入到货
    pub fn insert_receipts(&self, receipts: &[Receipt]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO receipts (week, sku, location_code, qty, source_tag)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for r in receipts {
                stmt.execute(params![
                    r.week,
                    r.sku,
                    r.location_code,
                    decimal_to_text(r.qty),
                    r.source_tag,
                ])?;
            }
        }
        tx.commit()?;
        Ok(receipts.len())
    }

    /// 批量插入需求实绩
    pub fn insert_demand(&self, actuals: &[DemandActual]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO demand_actuals (week, sku, location_code, demand_class, qty)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for d in actuals {
                stmt.execute(params![
                    d.week,
                    d.sku,
                    d.location_code,
                    d.demand_class.as_str(),
                    decimal_to_text(d.qty),
                ])?;
            }
        }
        tx.commit()?;
        Ok(actuals.len())
    }

    /// 清空全部事实数据 (演示库重建用)
    pub fn clear_all(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"DELETE FROM inventory_snapshots_weekly;
               DELETE FROM receipts;
               DELETE FROM demand_actuals;"#,
        )?;
        Ok(())
    }

    // ==========================================
    // 读取 (按插入顺序, 同周重复记录的“最后一条”由此确定)
    // ==========================================

    /// 读取全部库存快照; on_hand_qty 为 NULL 时按 0
    pub fn load_snapshots(&self) -> RepositoryResult<Vec<InventorySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT week, sku, location_code, on_hand_qty
               FROM inventory_snapshots_weekly
               ORDER BY id"#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(InventorySnapshot {
                    week: row.get(0)?,
                    sku: row.get(1)?,
                    location_code: row.get(2)?,
                    on_hand_qty: get_opt_decimal(row, 3)?.unwrap_or(Decimal::ZERO),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 读取全部到货
    pub fn load_receipts(&self) -> RepositoryResult<Vec<Receipt>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT week, sku, location_code, qty, source_tag
               FROM receipts
               ORDER BY id"#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Receipt {
                    week: row.get(0)?,
                    sku: row.get(1)?,
                    location_code: row.get(2)?,
                    qty: get_decimal(row, 3)?,
                    source_tag: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 读取全部需求实绩
    pub fn load_demand(&self) -> RepositoryResult<Vec<DemandActual>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT week, sku, location_code, demand_class, qty
               FROM demand_actuals
               ORDER BY id"#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DemandActual {
                    week: row.get(0)?,
                    sku: row.get(1)?,
                    location_code: row.get(2)?,
                    demand_class: get_enum(row, 3)?,
                    qty: get_decimal(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
