// ==========================================
// 周度供应计划系统 - 命令行入口
// ==========================================
// 用法: weekly-supply-planning [db_path] [scenario] [run_date YYYY-MM-DD]
// 缺省: db_path 取 WEEKLY_SUPPLY_PLANNING_DB 或用户数据目录,
//       scenario 取配置 planning.default_scenario_name, run_date 取今天
// ==========================================

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use weekly_supply_planning::config::default_db_path;
use weekly_supply_planning::{logging, PlanningApi, APP_NAME, VERSION};

fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(default_db_path);
    let scenario_arg = args.next();
    let run_date = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .with_context(|| format!("无法解析运行日期: {}", raw))?,
        None => Local::now().date_naive(),
    };

    tracing::info!("==================================================");
    tracing::info!("{} v{}", APP_NAME, VERSION);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let api = PlanningApi::open(&db_path)?;
    let scenario = match scenario_arg {
        Some(s) => s,
        None => api.config_manager().get_planning_config()?.default_scenario_name,
    };

    let summary = api.run_plan(&scenario, run_date)?;

    println!("plan_run_id      : {}", summary.plan_run.plan_run_id);
    println!("scenario         : {}", summary.plan_run.scenario_name);
    println!("run_week         : {}", summary.plan_run.run_week);
    println!("planned keys     : {}", summary.planned_key_count);
    println!("skipped keys     : {}", summary.skipped_key_count);
    println!("projected rows   : {}", summary.projected_row_count);
    println!("planned orders   : {}", summary.planned_order_count);

    Ok(())
}
