// ==========================================
// 周度供应计划系统 - 计划运行编排器
// ==========================================
// 用途: 协调起始库存解析、需求预测、补货参数、库存投影的执行顺序
// 流程: 事实数据 → 台账 → 起始库存 + 预测 + 策略 → 逐键投影 → 汇总
// 约束:
// - 纯内存计算, 相同输入必得相同输出
// - 键之间无共享可变状态, 可并行; 输出按 (sku, location, week) 确定性排序
// ==========================================

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::domain::facts::{FactKey, FactSet};
use crate::domain::plan::{PlanRun, PlannedOrderRow, ProjectedInventoryRow};
use crate::domain::policy::ReplenishmentPolicy;
use crate::domain::week::is_week_start;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::forecast::DemandForecaster;
use crate::engine::ledger::{DemandLedger, ReceiptLedger};
use crate::engine::projection::{KeyPlanInput, KeyProjection, ProjectionSimulator};
use crate::engine::replenishment::ReplenishmentParams;
use crate::engine::snapshot_resolver::SnapshotResolver;

// ==========================================
// ExecutionOptions - 执行选项
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    pub parallel_enabled: bool,  // 是否启用多线程投影
    pub parallel_min_keys: usize, // 键数达到该值才并行
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            parallel_enabled: true,
            parallel_min_keys: 64,
        }
    }
}

/// 键被跳过的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    MissingPolicy,   // 有快照无策略: 尚未配置计划
    MissingSnapshot, // 有策略无快照: 不虚构起始库存
}

// ==========================================
// PlanRunOutput - 计划运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct PlanRunOutput {
    pub plan_run: PlanRun,
    pub projected_rows: Vec<ProjectedInventoryRow>,
    pub planned_orders: Vec<PlannedOrderRow>,
    pub skipped_keys: Vec<(FactKey, SkipReason)>,
    pub planned_key_count: usize,
}

// ==========================================
// PlanRunOrchestrator - 计划运行编排器
// ==========================================
#[derive(Debug, Default)]
pub struct PlanRunOrchestrator {
    resolver: SnapshotResolver,
    forecaster: DemandForecaster,
    simulator: ProjectionSimulator,
    options: ExecutionOptions,
}

impl PlanRunOrchestrator {
    pub fn new() -> Self {
        Self::with_options(ExecutionOptions::default())
    }

    pub fn with_options(options: ExecutionOptions) -> Self {
        Self {
            resolver: SnapshotResolver::new(),
            forecaster: DemandForecaster::new(),
            simulator: ProjectionSimulator::new(),
            options,
        }
    }

    pub fn options(&self) -> ExecutionOptions {
        self.options
    }

    /// 执行一次计划运行
    ///
    /// # 参数
    /// - plan_run: 已确定身份的计划运行 (投影行/订单以其ID为外键)
    /// - facts: 全量事实数据
    ///
    /// # 返回
    /// - Ok(PlanRunOutput): 投影行与计划订单
    /// - Err(EngineError): 输入契约违反, 不可恢复
    #[instrument(skip(self, plan_run, facts), fields(
        plan_run_id = %plan_run.plan_run_id,
        scenario = %plan_run.scenario_name,
        run_week = %plan_run.run_week
    ))]
    pub fn execute(&self, plan_run: PlanRun, facts: &FactSet) -> EngineResult<PlanRunOutput> {
        let started = Instant::now();
        let run_week = plan_run.run_week;

        info!(
            snapshots = facts.snapshots.len(),
            receipts = facts.receipts.len(),
            demand = facts.demand.len(),
            policies = facts.policies.len(),
            "开始执行计划运行"
        );

        validate_fact_weeks(facts)?;

        // ==========================================
        // 步骤1: 构建只读台账
        // ==========================================
        let receipts = ReceiptLedger::from_receipts(&facts.receipts);
        let demand = DemandLedger::from_actuals(&facts.demand);
        let policies = index_policies(&facts.policies);

        // ==========================================
        // 步骤2: 起始库存 + 需求预测
        // ==========================================
        let starts = self.resolver.resolve(&facts.snapshots, run_week);
        let forecasts = self.forecaster.forecast_all(&policies, &demand, run_week);

        // ==========================================
        // 步骤3: 键集合 = 策略键 ∪ 快照键
        // ==========================================
        let all_keys: BTreeSet<FactKey> = policies.keys().chain(starts.keys()).cloned().collect();

        let mut inputs = Vec::with_capacity(all_keys.len());
        let mut skipped_keys = Vec::new();

        for key in all_keys {
            let policy = match policies.get(&key) {
                Some(p) => p,
                None => {
                    debug!(key = %key, "无补货策略, 跳过");
                    skipped_keys.push((key, SkipReason::MissingPolicy));
                    continue;
                }
            };
            let start = match starts.get(&key) {
                Some(s) => *s,
                None => {
                    debug!(key = %key, "无可用库存快照, 跳过");
                    skipped_keys.push((key, SkipReason::MissingSnapshot));
                    continue;
                }
            };

            let forecast = forecasts.get(&key).copied().unwrap_or_default();
            let params = ReplenishmentParams::derive(policy, &forecast)?;
            inputs.push(KeyPlanInput {
                key,
                start,
                forecast,
                params,
            });
        }

        // ==========================================
        // 步骤4: 逐键投影
        // ==========================================
        let plan_run_id = plan_run.plan_run_id.as_str();
        let parallel = self.use_parallel(inputs.len());
        debug!(keys = inputs.len(), parallel, "开始逐键投影");

        let projections: Vec<KeyProjection> = if parallel {
            inputs
                .par_iter()
                .map(|input| self.simulator.simulate_key(plan_run_id, input, &demand, &receipts))
                .collect::<EngineResult<_>>()?
        } else {
            inputs
                .iter()
                .map(|input| self.simulator.simulate_key(plan_run_id, input, &demand, &receipts))
                .collect::<EngineResult<_>>()?
        };

        // ==========================================
        // 步骤5: 汇总
        // ==========================================
        let mut projected_rows = Vec::with_capacity(projections.len() * self.simulator.horizon_weeks());
        let mut planned_orders = Vec::new();
        for p in projections {
            projected_rows.extend(p.projected_rows);
            planned_orders.extend(p.planned_orders);
        }

        info!(
            planned_keys = inputs.len(),
            skipped_keys = skipped_keys.len(),
            projected_rows = projected_rows.len(),
            planned_orders = planned_orders.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "计划运行完成"
        );

        Ok(PlanRunOutput {
            plan_run,
            projected_rows,
            planned_orders,
            skipped_keys,
            planned_key_count: inputs.len(),
        })
    }

    fn use_parallel(&self, key_count: usize) -> bool {
        self.options.parallel_enabled && key_count >= self.options.parallel_min_keys.max(2)
    }
}

/// 策略按键索引; 同键多条时后者覆盖前者
fn index_policies(policies: &[ReplenishmentPolicy]) -> HashMap<FactKey, ReplenishmentPolicy> {
    let mut indexed = HashMap::with_capacity(policies.len());
    for p in policies {
        if indexed.insert(p.key(), p.clone()).is_some() {
            warn!(key = %p.key(), "补货策略重复, 取最后一条");
        }
    }
    indexed
}

/// 所有带周维度的事实必须以周一标识
fn validate_fact_weeks(facts: &FactSet) -> EngineResult<()> {
    let weeks = facts
        .snapshots
        .iter()
        .map(|s| ("inventory_snapshot", s.week, &s.sku, &s.location_code))
        .chain(
            facts
                .receipts
                .iter()
                .map(|r| ("receipt", r.week, &r.sku, &r.location_code)),
        )
        .chain(
            facts
                .demand
                .iter()
                .map(|d| ("demand_actual", d.week, &d.sku, &d.location_code)),
        );

    for (fact, week, sku, location_code) in weeks {
        if !is_week_start(week) {
            return Err(EngineError::NonMondayWeek {
                fact,
                sku: sku.clone(),
                location_code: location_code.clone(),
                week,
            });
        }
    }
    Ok(())
}
