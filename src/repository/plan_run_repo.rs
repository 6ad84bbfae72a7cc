// ==========================================
// 周度供应计划系统 - 计划运行仓储
// ==========================================
// 表: plan_runs / projected_inventory / planned_orders
// 红线: 只追加; 历史运行及其子记录不修改、不删除
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::facts::FactKey;
use crate::domain::plan::{PlanRun, PlannedOrderRow, ProjectedInventoryRow};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_codec::{decimal_to_text, get_decimal};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::debug;

const RUN_COLUMNS: &str =
    "plan_run_id, scenario_name, run_date, run_week, created_date, config_snapshot_json";

const PROJECTION_COLUMNS: &str = "plan_run_id, week, sku, location_code, start_qty, \
     receipts_qty, demand_qty, end_qty, weeks_of_cover, stockout_flag";

// ==========================================
// PlanRunRepository - 计划运行仓储
// ==========================================
pub struct PlanRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanRunRepository {
    /// 创建新的 PlanRunRepository 实例
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

    /// 写入一次计划运行及其全部子记录
    ///
    /// # 说明
    /// - 单事务: 要么全部可见, 要么全部不可见
    /// - plan_run_id 重复时违反主键约束, 返回 UniqueConstraintViolation
    pub fn insert_run(
        &self,
        run: &PlanRun,
        projected_rows: &[ProjectedInventoryRow],
        planned_orders: &[PlannedOrderRow],
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            &format!("INSERT INTO plan_runs ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)", RUN_COLUMNS),
            params![
                run.plan_run_id,
                run.scenario_name,
                run.run_date,
                run.run_week,
                run.created_date,
                run.config_snapshot_json,
            ],
        )?;

        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO projected_inventory ({}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                PROJECTION_COLUMNS
            ))?;
            for r in projected_rows {
                stmt.execute(params![
                    r.plan_run_id,
                    r.week,
                    r.sku,
                    r.location_code,
                    decimal_to_text(r.start_qty),
                    decimal_to_text(r.receipts_qty),
                    decimal_to_text(r.demand_qty),
                    decimal_to_text(r.end_qty),
                    decimal_to_text(r.weeks_of_cover),
                    r.stockout_flag,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO planned_orders (plan_run_id, week_placed, sku, location_code, order_qty)
                   VALUES (?1, ?2, ?3, ?4, ?5)"#,
            )?;
            for o in planned_orders {
                stmt.execute(params![
                    o.plan_run_id,
                    o.week_placed,
                    o.sku,
                    o.location_code,
                    decimal_to_text(o.order_qty),
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            plan_run_id = %run.plan_run_id,
            projected_rows = projected_rows.len(),
            planned_orders = planned_orders.len(),
            "计划运行已落库"
        );
        Ok(())
    }

    /// 按ID查询计划运行
    pub fn find_by_id(&self, plan_run_id: &str) -> RepositoryResult<Option<PlanRun>> {
        let conn = self.get_conn()?;
        let run = conn
            .query_row(
                &format!("SELECT {} FROM plan_runs WHERE plan_run_id = ?1", RUN_COLUMNS),
                params![plan_run_id],
                map_run_row,
            )
            .optional()?;
        Ok(run)
    }

    /// 查询所有计划运行, 最新在前
    pub fn list_all(&self) -> RepositoryResult<Vec<PlanRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM plan_runs ORDER BY rowid DESC",
            RUN_COLUMNS
        ))?;
        let runs = stmt
            .query_map([], map_run_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    /// 查询投影行 (sku / location 可选过滤), 按 week, sku, location 排序
    pub fn list_projected(
        &self,
        plan_run_id: &str,
        sku: Option<&str>,
        location_code: Option<&str>,
    ) -> RepositoryResult<Vec<ProjectedInventoryRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM projected_inventory \
             WHERE plan_run_id = ?1 \
               AND (?2 IS NULL OR sku = ?2) \
               AND (?3 IS NULL OR location_code = ?3) \
             ORDER BY week, sku, location_code",
            PROJECTION_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![plan_run_id, sku, location_code], map_projection_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 查询单键单周投影行
    pub fn find_projection_row(
        &self,
        plan_run_id: &str,
        key: &FactKey,
        week: NaiveDate,
    ) -> RepositoryResult<Option<ProjectedInventoryRow>> {
        let conn = self.get_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM projected_inventory \
                     WHERE plan_run_id = ?1 AND sku = ?2 AND location_code = ?3 AND week = ?4",
                    PROJECTION_COLUMNS
                ),
                params![plan_run_id, key.sku, key.location_code, week],
                map_projection_row,
            )
            .optional()?;
        Ok(row)
    }

    /// 查询计划订单 (sku / location 可选过滤), 按 week_placed, sku, location 排序
    pub fn list_orders(
        &self,
        plan_run_id: &str,
        sku: Option<&str>,
        location_code: Option<&str>,
    ) -> RepositoryResult<Vec<PlannedOrderRow>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT plan_run_id, week_placed, sku, location_code, order_qty
               FROM planned_orders
               WHERE plan_run_id = ?1
                 AND (?2 IS NULL OR sku = ?2)
                 AND (?3 IS NULL OR location_code = ?3)
               ORDER BY week_placed, sku, location_code, id"#,
        )?;
        let rows = stmt
            .query_map(params![plan_run_id, sku, location_code], |row| {
                Ok(PlannedOrderRow {
                    plan_run_id: row.get(0)?,
                    week_placed: row.get(1)?,
                    sku: row.get(2)?,
                    location_code: row.get(3)?,
                    order_qty: get_decimal(row, 4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 统计某次运行的子记录数 (投影行, 计划订单)
    pub fn count_rows(&self, plan_run_id: &str) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let projected: i64 = conn.query_row(
            "SELECT COUNT(*) FROM projected_inventory WHERE plan_run_id = ?1",
            params![plan_run_id],
            |row| row.get(0),
        )?;
        let orders: i64 = conn.query_row(
            "SELECT COUNT(*) FROM planned_orders WHERE plan_run_id = ?1",
            params![plan_run_id],
            |row| row.get(0),
        )?;
        Ok((projected as usize, orders as usize))
    }
}

fn map_run_row(row: &Row<'_>) -> rusqlite::Result<PlanRun> {
    Ok(PlanRun {
        plan_run_id: row.get(0)?,
        scenario_name: row.get(1)?,
        run_date: row.get(2)?,
        run_week: row.get(3)?,
        created_date: row.get(4)?,
        config_snapshot_json: row.get(5)?,
    })
}

fn map_projection_row(row: &Row<'_>) -> rusqlite::Result<ProjectedInventoryRow> {
    Ok(ProjectedInventoryRow {
        plan_run_id: row.get(0)?,
        week: row.get(1)?,
        sku: row.get(2)?,
        location_code: row.get(3)?,
        start_qty: get_decimal(row, 4)?,
        receipts_qty: get_decimal(row, 5)?,
        demand_qty: get_decimal(row, 6)?,
        end_qty: get_decimal(row, 7)?,
        weeks_of_cover: get_decimal(row, 8)?,
        stockout_flag: row.get(9)?,
    })
}
