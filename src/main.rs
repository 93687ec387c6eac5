// ==========================================
// 矿山设备车队决策支持系统 - 命令行入口
// ==========================================
// 用法: mining-fleet-tep <report> <request.json> [db_path]
// 输出: 报表 JSON 写入 stdout，日志写入 stderr
// 日志: MINING_FLEET_TEP_LOG_FORMAT=json 输出 JSON 行
// ==========================================

use std::error::Error;

use mining_fleet_tep::api::AnalyticsRequest;
use mining_fleet_tep::app::{get_default_db_path, AppState, Report};
use mining_fleet_tep::logging;

fn usage() -> String {
    let names: Vec<&str> = Report::ALL.iter().map(|r| r.name()).collect();
    format!(
        "用法: mining-fleet-tep <report> <request.json> [db_path]\n可用报表: {}",
        names.join(", ")
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    match std::env::var("MINING_FLEET_TEP_LOG_FORMAT") {
        Ok(format) if format.eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    let mut args = std::env::args().skip(1);
    let report_name = args.next().ok_or_else(usage)?;
    let request_path = args.next().ok_or_else(usage)?;
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    let report = Report::from_name(&report_name)
        .ok_or_else(|| format!("未知报表: {}\n{}", report_name, usage()))?;

    tracing::info!("{} v{}", mining_fleet_tep::APP_NAME, mining_fleet_tep::VERSION);
    tracing::info!(report = report.name(), db_path = %db_path, "执行报表");

    let raw = std::fs::read_to_string(&request_path)?;
    let request: AnalyticsRequest = serde_json::from_str(&raw)?;

    let state = AppState::new(db_path)?;
    let output = state.run_report(report, &request).await?;

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
