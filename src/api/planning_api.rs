// ==========================================
// 周度供应计划系统 - 计划运行 API
// ==========================================
// 职责: 计划运行 (加载事实 → 引擎计算 → 落库) 与结果查询
// 红线: 只追加; 每次运行生成新的 PlanRun, 不修改历史运行
// ==========================================

use chrono::{Local, NaiveDate};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::facts::{FactKey, FactSet};
use crate::domain::plan::{PlanRun, PlannedOrderRow, ProjectedInventoryRow};
use crate::domain::policy::ReplenishmentPolicy;
use crate::engine::forecast::FORECAST_METHOD;
use crate::engine::orchestrator::{PlanRunOrchestrator, PlanRunOutput};
use crate::engine::replenishment::total_lead_time_weeks;
use crate::repository::{FactRepository, PlanRunRepository, PolicyRepository};

// ==========================================
// DTO
// ==========================================

/// 计划运行摘要
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRunSummary {
    pub plan_run: PlanRun,
    pub planned_key_count: usize,
    pub skipped_key_count: usize,
    pub projected_row_count: usize,
    pub planned_order_count: usize,
}

impl PlanRunSummary {
    fn from_output(output: &PlanRunOutput) -> Self {
        Self {
            plan_run: output.plan_run.clone(),
            planned_key_count: output.planned_key_count,
            skipped_key_count: output.skipped_keys.len(),
            projected_row_count: output.projected_rows.len(),
            planned_order_count: output.planned_orders.len(),
        }
    }
}

/// 单键单周解释 (策略 + 当周投影)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuWeekExplanation {
    pub plan_run_id: String,
    pub sku: String,
    pub location_code: String,
    pub week: NaiveDate,
    pub policy: Option<ReplenishmentPolicy>,
    pub total_lead_time_weeks: Option<u32>, // 策略缺失或不合法时为空
    pub projection: Option<ProjectedInventoryRow>,
    pub forecast_method: String,
}

// ==========================================
// PlanningApi - 计划运行 API
// ==========================================
pub struct PlanningApi {
    fact_repo: Arc<FactRepository>,
    policy_repo: Arc<PolicyRepository>,
    plan_run_repo: Arc<PlanRunRepository>,
    config_manager: Arc<ConfigManager>,
}

impl PlanningApi {
    /// 创建新的 PlanningApi 实例
    pub fn new(
        fact_repo: Arc<FactRepository>,
        policy_repo: Arc<PolicyRepository>,
        plan_run_repo: Arc<PlanRunRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            fact_repo,
            policy_repo,
            plan_run_repo,
            config_manager,
        }
    }

    /// 打开数据库 (不存在则建库) 并装配全部仓储, 共享同一连接
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接装配
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        Ok(Self::new(
            Arc::new(FactRepository::from_connection(conn.clone())),
            Arc::new(PolicyRepository::from_connection(conn.clone())),
            Arc::new(PlanRunRepository::from_connection(conn.clone())),
            Arc::new(ConfigManager::from_connection(conn)?),
        ))
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    // ==========================================
    // 计划运行
    // ==========================================

    /// 执行一次计划运行, 创建日期取本地当天
    pub fn run_plan(&self, scenario_name: &str, run_date: NaiveDate) -> ApiResult<PlanRunSummary> {
        self.run_plan_at(scenario_name, run_date, Local::now().date_naive())
    }

    /// 执行一次计划运行
    ///
    /// # 参数
    /// - scenario_name: 场景名称 (非空)
    /// - run_date: 运行日期, 所在周一为投影起点上限
    /// - created_date: 记录在 PlanRun 上的创建日期
    ///
    /// # 返回
    /// - Ok(PlanRunSummary): 已落库的运行摘要
    /// - Err(ApiError::PlanningFailed): 事实数据违反输入契约, 不落库
    #[instrument(skip(self, scenario_name, run_date), fields(scenario = %scenario_name, run_date = %run_date))]
    pub fn run_plan_at(
        &self,
        scenario_name: &str,
        run_date: NaiveDate,
        created_date: NaiveDate,
    ) -> ApiResult<PlanRunSummary> {
        let scenario_name = scenario_name.trim();
        if scenario_name.is_empty() {
            return Err(ApiError::InvalidInput("场景名称不能为空".to_string()));
        }

        // 1. 配置 + 快照
        let planning_config = self.config_manager.get_planning_config()?;
        let config_snapshot = self.config_manager.get_config_snapshot()?;

        // 2. 事实数据
        let facts = FactSet {
            snapshots: self.fact_repo.load_snapshots()?,
            receipts: self.fact_repo.load_receipts()?,
            demand: self.fact_repo.load_demand()?,
            policies: self.policy_repo.load_all()?,
        };

        // 3. 引擎计算
        let plan_run = PlanRun::new(
            Uuid::new_v4().to_string(),
            scenario_name,
            run_date,
            created_date,
        )
        .with_config_snapshot(config_snapshot);

        let orchestrator = PlanRunOrchestrator::with_options(planning_config.execution_options());
        let output = orchestrator.execute(plan_run, &facts)?;

        // 4. 落库 (单事务)
        self.plan_run_repo
            .insert_run(&output.plan_run, &output.projected_rows, &output.planned_orders)?;

        let summary = PlanRunSummary::from_output(&output);
        info!(
            plan_run_id = %summary.plan_run.plan_run_id,
            projected_rows = summary.projected_row_count,
            planned_orders = summary.planned_order_count,
            "计划运行已保存"
        );
        Ok(summary)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 全部计划运行, 最新在前
    pub fn list_plan_runs(&self) -> ApiResult<Vec<PlanRun>> {
        Ok(self.plan_run_repo.list_all()?)
    }

    /// 按ID查询计划运行
    pub fn get_plan_run(&self, plan_run_id: &str) -> ApiResult<PlanRun> {
        self.plan_run_repo
            .find_by_id(plan_run_id)?
            .ok_or_else(|| ApiError::NotFound(format!("PlanRun(id={})不存在", plan_run_id)))
    }

    /// 投影行, 可按 sku / location 过滤
    pub fn list_projected_inventory(
        &self,
        plan_run_id: &str,
        sku: Option<&str>,
        location_code: Option<&str>,
    ) -> ApiResult<Vec<ProjectedInventoryRow>> {
        Ok(self
            .plan_run_repo
            .list_projected(plan_run_id, non_blank(sku), non_blank(location_code))?)
    }

    /// 计划订单, 可按 sku / location 过滤
    pub fn list_planned_orders(
        &self,
        plan_run_id: &str,
        sku: Option<&str>,
        location_code: Option<&str>,
    ) -> ApiResult<Vec<PlannedOrderRow>> {
        Ok(self
            .plan_run_repo
            .list_orders(plan_run_id, non_blank(sku), non_blank(location_code))?)
    }

    /// 解释某键某周的计划结果
    ///
    /// 策略取当前库中的策略; 投影取该运行的结果, 两者都可能不存在
    pub fn explain_sku_week(
        &self,
        plan_run_id: &str,
        sku: &str,
        location_code: &str,
        week: NaiveDate,
    ) -> ApiResult<SkuWeekExplanation> {
        let run = self.get_plan_run(plan_run_id)?;
        let key = FactKey::new(sku, location_code);

        let policy = self.policy_repo.find_by_key(&key)?;
        let projection = self.plan_run_repo.find_projection_row(&run.plan_run_id, &key, week)?;
        let total_lead_time_weeks = policy
            .as_ref()
            .and_then(|p| total_lead_time_weeks(p).ok());

        Ok(SkuWeekExplanation {
            plan_run_id: run.plan_run_id,
            sku: key.sku,
            location_code: key.location_code,
            week,
            policy,
            total_lead_time_weeks,
            projection,
            forecast_method: FORECAST_METHOD.to_string(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
