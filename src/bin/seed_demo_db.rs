// ==========================================
// 周度供应计划系统 - 演示库生成
// ==========================================
// 用法: seed_demo_db [db_path] [anchor_date YYYY-MM-DD]
// 内容: 3 个物料 × 2 个仓库, 上周快照 100, 未来两周 WH1 到货,
//       过去 8 周客户需求 20 / 样品需求 2
// ==========================================

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use weekly_supply_planning::config::default_db_path;
use weekly_supply_planning::db::{init_schema, open_sqlite_connection};
use weekly_supply_planning::domain::facts::{DemandActual, InventorySnapshot, Receipt};
use weekly_supply_planning::domain::policy::ReplenishmentPolicy;
use weekly_supply_planning::domain::types::DemandClass;
use weekly_supply_planning::domain::week::{add_weeks, week_start};
use weekly_supply_planning::logging;
use weekly_supply_planning::repository::{FactRepository, PolicyRepository};

const SKUS: [&str; 3] = ["SKU001", "SKU002", "SKU003"];
const LOCATIONS: [&str; 2] = ["WH1", "WH2"];
const HISTORY_WEEKS: u32 = 8;

fn main() -> Result<()> {
    logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(default_db_path);
    let anchor = match std::env::args().nth(2) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .with_context(|| format!("无法解析日期: {}", raw))?,
        None => Local::now().date_naive(),
    };

    backup_and_reset_db(&db_path)?;

    let conn = open_sqlite_connection(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let fact_repo = FactRepository::from_connection(conn.clone());
    let policy_repo = PolicyRepository::from_connection(conn);

    // 快照周 = 上周一
    let base = week_start(anchor) - chrono::Duration::weeks(1);

    let policies: Vec<ReplenishmentPolicy> = keys()
        .map(|(sku, loc)| ReplenishmentPolicy::with_defaults(sku, loc))
        .collect();

    let snapshots: Vec<InventorySnapshot> = keys()
        .map(|(sku, loc)| InventorySnapshot {
            week: base,
            sku: sku.to_string(),
            location_code: loc.to_string(),
            on_hand_qty: Decimal::from(100),
        })
        .collect();

    let receipts: Vec<Receipt> = (1..=2)
        .flat_map(|i| {
            ["SKU001", "SKU002"].into_iter().map(move |sku| Receipt {
                week: add_weeks(base, i),
                sku: sku.to_string(),
                location_code: "WH1".to_string(),
                qty: Decimal::from(50),
                source_tag: Some("PO".to_string()),
            })
        })
        .collect();

    let mut demand = Vec::new();
    for i in (1..=HISTORY_WEEKS).rev() {
        let week = base - chrono::Duration::weeks(i64::from(i));
        for (sku, loc) in keys() {
            for (class, qty) in [(DemandClass::Customer, 20), (DemandClass::Samples, 2)] {
                demand.push(DemandActual {
                    week,
                    sku: sku.to_string(),
                    location_code: loc.to_string(),
                    demand_class: class,
                    qty: Decimal::from(qty),
                });
            }
        }
    }

    let policy_count = policy_repo.upsert_batch(&policies)?;
    let snapshot_count = fact_repo.insert_snapshots(&snapshots)?;
    let receipt_count = fact_repo.insert_receipts(&receipts)?;
    let demand_count = fact_repo.insert_demand(&demand)?;

    println!("Seeded {}", db_path);
    println!("  snapshot week : {}", base);
    println!("  policies      : {}", policy_count);
    println!("  snapshots     : {}", snapshot_count);
    println!("  receipts      : {}", receipt_count);
    println!("  demand actuals: {}", demand_count);

    Ok(())
}

fn keys() -> impl Iterator<Item = (&'static str, &'static str)> {
    SKUS.into_iter()
        .flat_map(|sku| LOCATIONS.into_iter().map(move |loc| (sku, loc)))
}

fn backup_and_reset_db(db_path: &str) -> Result<()> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}
