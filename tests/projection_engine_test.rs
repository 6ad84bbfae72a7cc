// ==========================================
// 库存投影引擎测试
// ==========================================
// 测试目标: 通过编排器验证投影不变量、补货触发、提前期取整
// 纯内存, 不涉及数据库
// ==========================================


use rust_decimal::Decimal;
use test_helpers::{dec, demand, receipt, snapshot, w0, week};
use weekly_supply_planning::domain::facts::FactSet;
use weekly_supply_planning::domain::plan::PlanRun;
use weekly_supply_planning::domain::policy::{LeadTimeComponents, ReplenishmentPolicy};
use weekly_supply_planning::domain::types::{DemandClass, PlanningMode};
use weekly_supply_planning::engine::{EngineError, PlanRunOrchestrator, PlanRunOutput, HORIZON_WEEKS};
use weekly_supply_planning::logging;

// ==========================================
// 测试数据构造
// ==========================================

fn lead_time(production: &str) -> LeadTimeComponents {
    LeadTimeComponents {
        production_weeks: dec(production),
        ..LeadTimeComponents::zero()
    }
}

fn target_cover_policy(production_lead_time: &str) -> ReplenishmentPolicy {
    ReplenishmentPolicy {
        mode: PlanningMode::TargetCover,
        target_weeks: dec("4"),
        lead_time: lead_time(production_lead_time),
        ..ReplenishmentPolicy::with_defaults("SKU001", "WH1")
    }
}

/// run_week 之前 4 周, 每周客户需求 qty
fn customer_history(qty: &str) -> Vec<weekly_supply_planning::DemandActual> {
    (1..=4)
        .map(|i| demand("SKU001", "WH1", week(-i), DemandClass::Customer, qty))
        .collect()
}

fn run(facts: &FactSet) -> PlanRunOutput {
    logging::init_test();
    let plan_run = PlanRun::new("RUN-TEST", "baseline", w0(), w0());
    PlanRunOrchestrator::new()
        .execute(plan_run, facts)
        .expect("engine run failed")
}

// ==========================================
// 不变量
// ==========================================

#[test]
fn test_balance_invariant_over_full_horizon() {
    let mut demand_facts = customer_history("12");
    demand_facts.push(demand("SKU001", "WH1", week(3), DemandClass::Customer, "40"));
    demand_facts.push(demand("SKU001", "WH1", week(5), DemandClass::Adjustment, "-3"));

    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "60")],
        receipts: vec![
            receipt("SKU001", "WH1", week(2), "30"),
            receipt("SKU001", "WH1", week(2), "5"),
        ],
        demand: demand_facts,
        policies: vec![target_cover_policy("2")],
    };

    let out = run(&facts);
    let rows = &out.projected_rows;

    assert_eq!(rows.len(), HORIZON_WEEKS);
    assert_eq!(rows[0].week, w0());
    assert_eq!(rows[0].start_qty, dec("60"));

    for (i, r) in rows.iter().enumerate() {
        assert_eq!(r.end_qty, r.start_qty + r.receipts_qty - r.demand_qty, "week #{}", i);
        assert_eq!(r.stockout_flag, r.end_qty < Decimal::ZERO, "week #{}", i);
        if i > 0 {
            assert_eq!(r.start_qty, rows[i - 1].end_qty, "week #{}", i);
        }
        assert_eq!(r.week, week(i as i64));
    }

    // 实绩覆盖预测
    assert_eq!(rows[3].demand_qty, dec("40"));
    // ADJUSTMENT 叠加在预测之上
    assert_eq!(rows[5].demand_qty, dec("9"));
}

#[test]
fn test_zero_forecast_uses_cover_sentinel_and_never_orders() {
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "10")],
        demand: vec![demand("SKU001", "WH1", week(1), DemandClass::Adjustment, "25")],
        policies: vec![target_cover_policy("1")],
        ..FactSet::default()
    };

    let out = run(&facts);
    let rows = &out.projected_rows;

    assert!(out.planned_orders.is_empty());
    assert_eq!(rows[0].weeks_of_cover, dec("999.00"));
    assert!(!rows[0].stockout_flag);

    // 调整需求把库存打成负数: 覆盖周数 0.00, 缺货
    assert_eq!(rows[1].end_qty, dec("-15"));
    assert_eq!(rows[1].weeks_of_cover, dec("0.00"));
    assert!(rows[1].stockout_flag);
    assert!(rows[52].stockout_flag);
}

// ==========================================
// 预测
// ==========================================

#[test]
fn test_forecast_window_uses_available_history_only() {
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "1000")],
        demand: vec![
            demand("SKU001", "WH1", week(-3), DemandClass::Customer, "10"),
            demand("SKU001", "WH1", week(-2), DemandClass::Customer, "20"),
            demand("SKU001", "WH1", week(-1), DemandClass::Customer, "30"),
        ],
        policies: vec![target_cover_policy("1")],
        ..FactSet::default()
    };

    let out = run(&facts);

    // 窗口 8, 只有 3 周历史: (10+20+30)/3
    assert_eq!(out.projected_rows[0].demand_qty, dec("20.0000"));
    assert_eq!(out.projected_rows[10].demand_qty, dec("20.0000"));
}

#[test]
fn test_samples_excluded_from_baseline_unless_actual() {
    let mut demand_facts = customer_history("20");
    demand_facts.extend(
        (1..=4).map(|i| demand("SKU001", "WH1", week(-i), DemandClass::Samples, "4")),
    );
    demand_facts.push(demand("SKU001", "WH1", week(2), DemandClass::Samples, "7"));

    let policy = ReplenishmentPolicy {
        include_samples: false,
        ..target_cover_policy("1")
    };
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "500")],
        demand: demand_facts,
        policies: vec![policy],
        ..FactSet::default()
    };

    let out = run(&facts);
    let rows = &out.projected_rows;

    assert_eq!(rows[0].demand_qty, dec("20"));
    assert_eq!(rows[2].demand_qty, dec("27"));
    // 覆盖周数只按客户基线计算
    assert_eq!(rows[0].weeks_of_cover, dec("24.00"));
}

// ==========================================
// 补货触发
// ==========================================

#[test]
fn test_target_cover_end_to_end() {
    let mut demand_facts = customer_history("25");
    // 运行周之后没有任何实绩
    demand_facts.retain(|d| d.week < w0());

    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "125")],
        demand: demand_facts,
        policies: vec![target_cover_policy("1")],
        ..FactSet::default()
    };

    let out = run(&facts);
    let rows = &out.projected_rows;

    // W0: 125 - 25 = 100, 覆盖恰好 4.00, 不下单
    assert_eq!(rows[0].end_qty, dec("100"));
    assert_eq!(rows[0].weeks_of_cover, dec("4.00"));
    assert!(out.planned_orders.iter().all(|o| o.week_placed != w0()));

    // W1: 覆盖跌到 3.00, 补回 1 周 = 25
    assert_eq!(rows[1].weeks_of_cover, dec("3.00"));
    let first = &out.planned_orders[0];
    assert_eq!(first.week_placed, week(1));
    assert_eq!(first.order_qty, dec("25"));

    // 提前期 1 周: W2 到货
    assert_eq!(rows[2].receipts_qty, dec("25"));
    assert_eq!(rows[2].end_qty, dec("75"));
    assert!(rows.iter().all(|r| !r.stockout_flag));
}

#[test]
fn test_fractional_lead_time_rounds_up() {
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "125")],
        demand: customer_history("25"),
        policies: vec![target_cover_policy("2.1")],
        ..FactSet::default()
    };

    let out = run(&facts);
    let rows = &out.projected_rows;

    let first = &out.planned_orders[0];
    assert_eq!(first.week_placed, week(1));
    assert_eq!(first.order_qty, dec("25"));

    // 2.1 周 → 3 周
    assert_eq!(rows[2].receipts_qty, Decimal::ZERO);
    assert_eq!(rows[3].receipts_qty, Decimal::ZERO);
    assert_eq!(rows[4].receipts_qty, dec("25"));
}

#[test]
fn test_zero_lead_time_order_arrives_same_week() {
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "5")],
        demand: customer_history("10"),
        policies: vec![target_cover_policy("0")],
        ..FactSet::default()
    };

    let out = run(&facts);
    let w0_row = &out.projected_rows[0];

    // 修正前: 5 - 10 = -5, 覆盖 -0.50 → 订单 (4 + 0.5) * 10
    let first = &out.planned_orders[0];
    assert_eq!(first.week_placed, w0());
    assert_eq!(first.order_qty, dec("45"));

    // 修正后只改结果字段
    assert_eq!(w0_row.receipts_qty, Decimal::ZERO);
    assert_eq!(w0_row.demand_qty, dec("10"));
    assert_eq!(w0_row.end_qty, dec("40"));
    assert_eq!(w0_row.weeks_of_cover, dec("4.00"));
    assert!(!w0_row.stockout_flag);

    // 下一周从修正后的库存起算
    assert_eq!(out.projected_rows[1].start_qty, dec("40"));
}

#[test]
fn test_target_cover_compares_unrounded_cover() {
    // W0: 124.9 - 25 = 99.9, 覆盖 3.996 显示为 4.00, 但仍需补 0.1
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "124.9")],
        demand: customer_history("25"),
        policies: vec![target_cover_policy("1")],
        ..FactSet::default()
    };

    let out = run(&facts);

    assert_eq!(out.projected_rows[0].weeks_of_cover, dec("4.00"));
    let first = &out.planned_orders[0];
    assert_eq!(first.week_placed, w0());
    assert_eq!(first.order_qty, dec("0.1"));
    assert_eq!(out.projected_rows[1].receipts_qty, dec("0.1"));
}

#[test]
fn test_target_cover_order_restores_exact_cover() {
    // W0: 104 - 30 = 74, 覆盖 2.4667 → 补 46 后恰好 120 = 4 周
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "104")],
        demand: customer_history("30"),
        policies: vec![target_cover_policy("0")],
        ..FactSet::default()
    };

    let out = run(&facts);
    let w0_row = &out.projected_rows[0];

    assert_eq!(out.planned_orders[0].order_qty, dec("46"));
    assert_eq!(out.planned_orders[0].order_qty.to_string(), "46.0000");
    assert_eq!(w0_row.end_qty, dec("120"));
    assert_eq!(w0_row.weeks_of_cover, dec("4.00"));
}

#[test]
fn test_lead_time_beyond_calendar_is_rejected() {
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "0")],
        demand: customer_history("10"),
        policies: vec![target_cover_policy("20000000")],
        ..FactSet::default()
    };

    let err = PlanRunOrchestrator::new()
        .execute(PlanRun::new("R", "baseline", w0(), w0()), &facts)
        .unwrap_err();

    assert!(matches!(err, EngineError::LeadTimeOutOfRange { .. }));
}

#[test]
fn test_reorder_point_restores_rop() {
    // 基线 10, 提前期 2, 安全 1 周 → ROP = 30
    let policy = ReplenishmentPolicy {
        mode: PlanningMode::ReorderPoint,
        safety_weeks: dec("1"),
        ..target_cover_policy("2")
    };
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "45")],
        demand: customer_history("10"),
        policies: vec![policy],
        ..FactSet::default()
    };

    let out = run(&facts);

    // W0 end 35 >= 30; W1 end 25 < 30 → 补 5
    let first = &out.planned_orders[0];
    assert_eq!(first.week_placed, week(1));
    assert_eq!(first.order_qty, dec("5"));
    assert_eq!(out.projected_rows[3].receipts_qty, dec("5"));
}

// ==========================================
// 键集合与契约
// ==========================================

#[test]
fn test_snapshot_after_run_week_is_not_used() {
    let facts = FactSet {
        snapshots: vec![
            snapshot("SKU001", "WH1", week(-2), "80"),
            snapshot("SKU001", "WH1", week(1), "999"),
        ],
        policies: vec![target_cover_policy("1")],
        ..FactSet::default()
    };

    let out = run(&facts);

    assert_eq!(out.projected_rows[0].week, week(-2));
    assert_eq!(out.projected_rows[0].start_qty, dec("80"));
}

#[test]
fn test_negative_lead_time_component_is_rejected() {
    let policy = ReplenishmentPolicy {
        lead_time: LeadTimeComponents {
            haulage_weeks: dec("-1"),
            ..LeadTimeComponents::default()
        },
        ..ReplenishmentPolicy::with_defaults("SKU001", "WH1")
    };
    let facts = FactSet {
        snapshots: vec![snapshot("SKU001", "WH1", w0(), "10")],
        policies: vec![policy],
        ..FactSet::default()
    };

    let err = PlanRunOrchestrator::new()
        .execute(PlanRun::new("R", "baseline", w0(), w0()), &facts)
        .unwrap_err();

    assert!(matches!(err, EngineError::NegativePolicyValue { .. }));
}

#[test]
fn test_rerun_is_deterministic() {
    let facts = FactSet {
        snapshots: vec![
            snapshot("SKU002", "WH2", w0(), "70"),
            snapshot("SKU001", "WH1", w0(), "30"),
        ],
        receipts: vec![receipt("SKU002", "WH2", week(4), "15")],
        demand: customer_history("9"),
        policies: vec![
            ReplenishmentPolicy::with_defaults("SKU002", "WH2"),
            target_cover_policy("1"),
        ],
    };

    let a = run(&facts);
    let b = run(&facts);

    assert_eq!(a.projected_rows, b.projected_rows);
    assert_eq!(a.planned_orders, b.planned_orders);
    assert_eq!(a.projected_rows[0].sku, "SKU001");
    assert_eq!(a.projected_rows[HORIZON_WEEKS].sku, "SKU002");
}
