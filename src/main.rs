// ==========================================
// 车队维修管理系统 - 命令行入口
// ==========================================
// 用法:
//   fleet-maint [--db PATH] [--json-log] <command> [args]
//
// 命令:
//   migrate                    建库/升级 schema
//   refresh-status             按报废阈值刷新全部车辆状态
//   mark-overdue [YYYY-MM-DD]  逾期保养扫描（默认今天）
//   summary <plate>            车辆状态、费用与报废评估
//   inbox <recipient>          未读通知
// ==========================================

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use fleet_maintenance::app::{get_default_db_path, AppState};
use fleet_maintenance::{logging, APP_NAME, VERSION};

const USAGE: &str = "usage: fleet-maint [--db PATH] [--json-log] \
<migrate | refresh-status | mark-overdue [YYYY-MM-DD] | summary <plate> | inbox <recipient>>";

struct CliArgs {
    db_path: String,
    json_log: bool,
    command: Vec<String>,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut db_path = None;
    let mut json_log = false;
    let mut command = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let path = args.next().context("--db 需要一个路径参数")?;
                db_path = Some(path);
            }
            "--json-log" => json_log = true,
            "-h" | "--help" => {
                println!("{} {}", APP_NAME, VERSION);
                println!("{}", USAGE);
                std::process::exit(0);
            }
            _ => command.push(arg),
        }
    }

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(get_default_db_path),
        json_log,
        command,
    })
}

fn main() -> anyhow::Result<()> {
    let cli = parse_args()?;
    if cli.json_log {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!("{} v{}，数据库: {}", APP_NAME, VERSION, cli.db_path);
    let state = AppState::new(cli.db_path.clone())?;

    let command: Vec<&str> = cli.command.iter().map(String::as_str).collect();
    match command.as_slice() {
        ["migrate"] => {
            // AppState::new 已完成迁移
            println!("schema ready: {}", cli.db_path);
        }
        ["refresh-status"] => {
            let changed = state.engine.refresh_all_statuses()?;
            println!("vehicles changed: {}", changed);
        }
        ["mark-overdue"] => {
            let today = Utc::now().date_naive();
            let count = state.engine.mark_overdue_pms(today)?;
            println!("pms marked overdue: {}", count);
        }
        ["mark-overdue", date] => {
            let today = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .with_context(|| format!("日期格式错误: {}（应为 YYYY-MM-DD）", date))?;
            let count = state.engine.mark_overdue_pms(today)?;
            println!("pms marked overdue: {}", count);
        }
        ["summary", plate] => print_summary(&state, plate)?,
        ["inbox", recipient] => {
            for stored in state.notifications.find_by_recipient(recipient, true)? {
                println!(
                    "[{}] {} {}: {}",
                    stored.created_at,
                    stored.notification.priority.as_str(),
                    stored.notification.title,
                    stored.notification.message
                );
            }
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

fn print_summary(state: &AppState, plate: &str) -> anyhow::Result<()> {
    let engine = &state.engine;
    let vehicle = match engine.find_vehicle_by_plate(plate)? {
        Some(v) => v,
        None => bail!("未找到车辆: {}", plate),
    };

    println!("{} ({})", vehicle.plate_number, vehicle.vehicle_type);
    println!("  status:  {}", vehicle.status);
    println!("  mileage: {} km", vehicle.mileage_km);
    if let Some(audit) = &vehicle.status_audit {
        println!(
            "  last change: {} by {} ({})",
            audit.changed_at,
            audit.changed_by.as_deref().unwrap_or("system"),
            audit.reason
        );
    }

    let assessment = engine.disposal_assessment(&vehicle.vehicle_id)?;
    println!("  completed repair costs: {}", assessment.total_repair_costs);
    match assessment.disposal_threshold {
        Some(threshold) => println!(
            "  disposal threshold: {} (for disposal: {})",
            threshold, assessment.is_for_disposal
        ),
        None => println!("  disposal threshold: n/a (market value not set)"),
    }

    let repairs = engine.repairs_for_vehicle(&vehicle.vehicle_id)?;
    println!("  repairs: {}", repairs.len());
    for repair in &repairs {
        println!("    {} {} {}", repair.repair_id, repair.status, repair.total_cost());
    }

    let pms = engine.pms_for_vehicle(&vehicle.vehicle_id)?;
    println!("  pms: {}", pms.len());
    for record in &pms {
        println!(
            "    {} {} {} scheduled {}",
            record.pms_id, record.service_type, record.status, record.scheduled_date
        );
    }

    for change in engine.status_history(&vehicle.vehicle_id)?.iter().take(5) {
        println!(
            "  history: {} {} -> {} ({})",
            change.changed_at, change.from_status, change.to_status, change.reason
        );
    }
    Ok(())
}
