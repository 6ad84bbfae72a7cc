// ==========================================
// 周度供应计划系统 - SQLite 连接与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
// - 提供幂等建库 (CREATE TABLE IF NOT EXISTS)
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;
use tracing::{info, warn};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建库脚本
///
/// 数量字段一律以 TEXT 存储十进制字符串, 避免浮点误差
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL DEFAULT 'global',
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS inventory_snapshots_weekly (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    week          TEXT NOT NULL,
    sku           TEXT NOT NULL,
    location_code TEXT NOT NULL,
    on_hand_qty   TEXT
);
CREATE INDEX IF NOT EXISTS idx_snapshots_key_week
    ON inventory_snapshots_weekly (sku, location_code, week);

CREATE TABLE IF NOT EXISTS receipts (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    week          TEXT NOT NULL,
    sku           TEXT NOT NULL,
    location_code TEXT NOT NULL,
    qty           TEXT NOT NULL,
    source_tag    TEXT
);
CREATE INDEX IF NOT EXISTS idx_receipts_key_week
    ON receipts (sku, location_code, week);

CREATE TABLE IF NOT EXISTS demand_actuals (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    week          TEXT NOT NULL,
    sku           TEXT NOT NULL,
    location_code TEXT NOT NULL,
    demand_class  TEXT NOT NULL,
    qty           TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_demand_key_week
    ON demand_actuals (sku, location_code, week);

CREATE TABLE IF NOT EXISTS planning_policies (
    sku                      TEXT NOT NULL,
    location_code            TEXT NOT NULL,
    mode                     TEXT,
    target_weeks             TEXT,
    safety_method            TEXT,
    safety_weeks             TEXT,
    service_level            TEXT,
    forecast_window_weeks    INTEGER,
    lt_production_weeks      TEXT,
    lt_slot_wait_weeks       TEXT,
    lt_haulage_weeks         TEXT,
    lt_putaway_weeks         TEXT,
    lt_padding_weeks         TEXT,
    include_samples          INTEGER,
    PRIMARY KEY (sku, location_code)
);

CREATE TABLE IF NOT EXISTS plan_runs (
    plan_run_id          TEXT PRIMARY KEY,
    scenario_name        TEXT NOT NULL,
    run_date             TEXT NOT NULL,
    run_week             TEXT NOT NULL,
    created_date         TEXT NOT NULL,
    config_snapshot_json TEXT
);
CREATE INDEX IF NOT EXISTS idx_plan_runs_scenario ON plan_runs (scenario_name);

CREATE TABLE IF NOT EXISTS projected_inventory (
    plan_run_id    TEXT NOT NULL REFERENCES plan_runs(plan_run_id),
    week           TEXT NOT NULL,
    sku            TEXT NOT NULL,
    location_code  TEXT NOT NULL,
    start_qty      TEXT NOT NULL,
    receipts_qty   TEXT NOT NULL,
    demand_qty     TEXT NOT NULL,
    end_qty        TEXT NOT NULL,
    weeks_of_cover TEXT NOT NULL,
    stockout_flag  INTEGER NOT NULL,
    PRIMARY KEY (plan_run_id, sku, location_code, week)
);

CREATE TABLE IF NOT EXISTS planned_orders (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    plan_run_id   TEXT NOT NULL REFERENCES plan_runs(plan_run_id),
    week_placed   TEXT NOT NULL,
    sku           TEXT NOT NULL,
    location_code TEXT NOT NULL,
    order_qty     TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_planned_orders_run ON planned_orders (plan_run_id, week_placed);
"#;

/// 初始化数据库结构 (幂等)
///
/// 已存在且版本更新的库只告警, 不做降级
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    match read_schema_version(conn)? {
        None => {
            conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [CURRENT_SCHEMA_VERSION],
            )?;
            info!(version = CURRENT_SCHEMA_VERSION, "数据库结构初始化完成");
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 与当前代码不一致"
            );
        }
        Some(_) => {}
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
