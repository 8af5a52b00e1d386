// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、引擎装配、测试数据生成等功能
// ==========================================
#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use fleet_maintenance::db::{open_sqlite_connection, run_migrations};
use fleet_maintenance::domain::{
    Actor, ConditionRatings, NewPostInspection, NewPreInspection, NewVehicle, Notification,
    PmsDraft, PostInspectionReport, PreInspectionReport, Repair, RepairDraft, RepairUpdate,
    ReportType, SatisfactionRatings, Vehicle,
};
use fleet_maintenance::engine::{
    EngineError, EngineSettings, MaintenanceEngine, NotificationError, NotificationSink,
    ViolationKind,
};
use fleet_maintenance::{PmsStatus, RepairStatus};
use rust_decimal::Decimal;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("非 UTF-8 路径")?.to_string();

    let conn = open_sqlite_connection(&db_path)?;
    run_migrations(&conn)?;

    Ok((temp_file, db_path))
}

// ==========================================
// RecordingNotificationSink - 记录通知的测试替身
// ==========================================
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<Notification>>,
    fail: bool,
}

impl RecordingNotificationSink {
    /// 每次发送都失败的实现（验证通知失败不影响业务）
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, notification: &Notification) -> Result<String, NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery("mail server unreachable".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(notification.clone());
        Ok(format!("N{}", sent.len()))
    }
}

/// 测试环境: 临时库 + 引擎 + 可观察的通知
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub engine: MaintenanceEngine,
    pub sink: Arc<RecordingNotificationSink>,
}

pub fn setup_test_env() -> TestEnv {
    setup_test_env_with(EngineSettings::default(), RecordingNotificationSink::default())
}

pub fn setup_test_env_with(settings: EngineSettings, sink: RecordingNotificationSink) -> TestEnv {
    fleet_maintenance::logging::init_test();
    let (temp_file, db_path) = create_test_db().unwrap();
    let sink = Arc::new(sink);
    let engine = build_engine(&db_path, sink.clone(), settings);
    TestEnv {
        _temp_file: temp_file,
        db_path,
        engine,
        sink,
    }
}

/// 在同一数据库文件上装配一个独立连接的引擎
pub fn build_engine(
    db_path: &str,
    sink: Arc<dyn NotificationSink>,
    settings: EngineSettings,
) -> MaintenanceEngine {
    let conn = Arc::new(Mutex::new(open_sqlite_connection(db_path).unwrap()));
    MaintenanceEngine::new(conn, sink, settings)
}

// ==========================================
// 测试数据
// ==========================================

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn supervisor() -> Actor {
    Actor::new("maint.supervisor")
}

pub fn register_vehicle(engine: &MaintenanceEngine, plate: &str, market_value: Option<i64>) -> Vehicle {
    engine
        .register_vehicle(NewVehicle {
            plate_number: plate.to_string(),
            vehicle_type: "Truck".to_string(),
            make_model: Some("Isuzu NQR".to_string()),
            acquisition_cost: Some(dec(1_500_000)),
            current_market_value: market_value.map(dec),
            mileage_km: 12_000,
        })
        .unwrap()
}

pub fn new_pre_inspection(vehicle_id: &str, report_type: ReportType) -> NewPreInspection {
    NewPreInspection {
        vehicle_id: vehicle_id.to_string(),
        report_type,
        inspected_by: "inspector.lee".to_string(),
        inspection_date: None,
        odometer_km: Some(12_100),
        ratings: ConditionRatings::default(),
        findings: Some("Brake pads worn".to_string()),
        photo_paths: vec!["inspections/front.jpg".to_string()],
    }
}

/// 创建维修前检验（未审批）
pub fn pending_pre_inspection(
    engine: &MaintenanceEngine,
    vehicle_id: &str,
    report_type: ReportType,
) -> PreInspectionReport {
    engine
        .create_pre_inspection(new_pre_inspection(vehicle_id, report_type))
        .unwrap()
}

/// 创建并审批维修前检验
pub fn approved_pre_inspection(
    engine: &MaintenanceEngine,
    vehicle_id: &str,
    report_type: ReportType,
) -> PreInspectionReport {
    let report = pending_pre_inspection(engine, vehicle_id, report_type);
    engine
        .approve_pre_inspection(&report.report_id, &supervisor(), None)
        .unwrap()
}

pub fn new_post_inspection(vehicle_id: &str, pre_inspection_id: &str) -> NewPostInspection {
    NewPostInspection {
        vehicle_id: vehicle_id.to_string(),
        pre_inspection_id: pre_inspection_id.to_string(),
        inspected_by: "inspector.lee".to_string(),
        inspection_date: None,
        odometer_km: Some(12_180),
        ratings: ConditionRatings::default(),
        satisfaction: SatisfactionRatings::default(),
        test_drive: None,
        findings: None,
        photo_paths: Vec::new(),
    }
}

/// 创建维修后检验（未审批）
pub fn pending_post_inspection(
    engine: &MaintenanceEngine,
    vehicle_id: &str,
    pre_inspection_id: &str,
) -> PostInspectionReport {
    engine
        .create_post_inspection(new_post_inspection(vehicle_id, pre_inspection_id))
        .unwrap()
}

/// 创建并审批维修后检验
pub fn approved_post_inspection(
    engine: &MaintenanceEngine,
    vehicle_id: &str,
    pre_inspection_id: &str,
) -> PostInspectionReport {
    let report = pending_post_inspection(engine, vehicle_id, pre_inspection_id);
    engine
        .approve_post_inspection(&report.report_id, &supervisor(), Some("OK".to_string()))
        .unwrap()
}

pub fn repair_draft(vehicle_id: &str, pre_inspection_id: &str) -> RepairDraft {
    RepairDraft {
        vehicle_id: vehicle_id.to_string(),
        pre_inspection_id: Some(pre_inspection_id.to_string()),
        description: "Replace brake pads".to_string(),
        status: RepairStatus::Ongoing,
        ..Default::default()
    }
}

/// 创建一张进行中的维修单（自带已审批的维修前检验）
pub fn ongoing_repair(engine: &MaintenanceEngine, vehicle_id: &str, labor_cost: i64) -> Repair {
    let pre = approved_pre_inspection(engine, vehicle_id, ReportType::Repair);
    let mut draft = repair_draft(vehicle_id, &pre.report_id);
    draft.labor_cost = dec(labor_cost);
    engine.create_repair(draft, Some(&supervisor())).unwrap()
}

/// 创建并完成一张维修单（费用计入工时费）
pub fn completed_repair(engine: &MaintenanceEngine, vehicle_id: &str, labor_cost: i64) -> Repair {
    let repair = ongoing_repair(engine, vehicle_id, labor_cost);
    complete_repair(engine, &repair)
}

/// 附上已审批的维修后检验并标记维修单完成
pub fn complete_repair(engine: &MaintenanceEngine, repair: &Repair) -> Repair {
    let pre_id = repair.pre_inspection_id.clone().unwrap();
    let post = approved_post_inspection(engine, &repair.vehicle_id, &pre_id);
    engine
        .update_repair(
            &repair.repair_id,
            RepairUpdate {
                status: Some(RepairStatus::Completed),
                post_inspection_id: Some(post.report_id),
                ..Default::default()
            },
            Some(&supervisor()),
        )
        .unwrap()
}

pub fn pms_draft(vehicle_id: &str, pre_inspection_id: Option<&str>, status: PmsStatus) -> PmsDraft {
    PmsDraft {
        vehicle_id: vehicle_id.to_string(),
        pre_inspection_id: pre_inspection_id.map(str::to_string),
        service_type: "10,000 km service".to_string(),
        description: Some("Oil and filter change".to_string()),
        status,
        scheduled_date: date(2026, 5, 1),
        odometer_km: Some(15_000),
        next_due_date: Some(date(2026, 11, 1)),
    }
}

/// 断言为校验错误并返回违反的规则
pub fn violation_kinds(err: &EngineError) -> Vec<ViolationKind> {
    match err.as_validation() {
        Some(validation) => validation.kinds(),
        None => panic!("期望校验错误，实际: {:?}", err),
    }
}
