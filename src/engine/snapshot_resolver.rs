// ==========================================
// 周度供应计划系统 - 起始库存解析
// ==========================================
// 规则: 每个键取 week <= run_week 的最大周快照
// 同键同周多条记录: 取最后一条 (确定性规则, 非错误)
// 没有可用快照的键不参与投影, 不补零
// ==========================================

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::domain::facts::{FactKey, InventorySnapshot};

/// 投影起点
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartingPosition {
    pub snapshot_week: NaiveDate,
    pub on_hand_qty: Decimal,
}

// ==========================================
// SnapshotResolver - 起始库存解析器
// ==========================================
#[derive(Debug, Default)]
pub struct SnapshotResolver;

impl SnapshotResolver {
    pub fn new() -> Self {
        Self
    }

    /// 解析每个键的起始库存
    pub fn resolve(
        &self,
        snapshots: &[InventorySnapshot],
        run_week: NaiveDate,
    ) -> HashMap<FactKey, StartingPosition> {
        let mut resolved: HashMap<FactKey, StartingPosition> = HashMap::new();
        let mut same_week_duplicates = 0usize;

        for snap in snapshots.iter().filter(|s| s.week <= run_week) {
            let candidate = StartingPosition {
                snapshot_week: snap.week,
                on_hand_qty: snap.on_hand_qty,
            };
            match resolved.get_mut(&snap.key()) {
                None => {
                    resolved.insert(snap.key(), candidate);
                }
                Some(current) if snap.week > current.snapshot_week => *current = candidate,
                Some(current) if snap.week == current.snapshot_week => {
                    same_week_duplicates += 1;
                    *current = candidate;
                }
                Some(_) => {}
            }
        }

        if same_week_duplicates > 0 {
            warn!(
                duplicates = same_week_duplicates,
                "库存快照存在同周重复记录, 已取最后一条"
            );
        }

        debug!(
            snapshot_count = snapshots.len(),
            resolved_keys = resolved.len(),
            run_week = %run_week,
            "起始库存解析完成"
        );

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(sku: &str, week: NaiveDate, qty: i64) -> InventorySnapshot {
        InventorySnapshot {
            week,
            sku: sku.to_string(),
            location_code: "WH1".to_string(),
            on_hand_qty: Decimal::from(qty),
        }
    }

    fn monday(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    #[test]
    fn test_picks_latest_week_not_after_run_week() {
        let run_week = monday(10, 19);
        let snapshots = vec![
            snap("SKU001", monday(10, 5), 50),
            snap("SKU001", monday(10, 12), 80),
            snap("SKU001", monday(10, 26), 999), // 晚于运行周, 忽略
        ];

        let resolved = SnapshotResolver::new().resolve(&snapshots, run_week);
        let pos = resolved[&FactKey::new("SKU001", "WH1")];

        assert_eq!(pos.snapshot_week, monday(10, 12));
        assert_eq!(pos.on_hand_qty, Decimal::from(80));
    }

    #[test]
    fn test_same_week_last_record_wins() {
        let snapshots = vec![
            snap("SKU001", monday(10, 12), 10),
            snap("SKU001", monday(10, 12), 20),
            snap("SKU001", monday(10, 5), 30),
        ];

        let resolved = SnapshotResolver::new().resolve(&snapshots, monday(10, 19));
        let pos = resolved[&FactKey::new("SKU001", "WH1")];

        assert_eq!(pos.snapshot_week, monday(10, 12));
        assert_eq!(pos.on_hand_qty, Decimal::from(20));
    }

    #[test]
    fn test_key_without_eligible_snapshot_is_excluded() {
        let snapshots = vec![snap("SKU002", monday(11, 2), 40)];
        let resolved = SnapshotResolver::new().resolve(&snapshots, monday(10, 19));
        assert!(resolved.is_empty());
    }
}
