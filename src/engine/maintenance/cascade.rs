// ==========================================
// 车辆状态联动
// ==========================================
// 单据写入之后、事务提交之前调用:
// 收集状态机输入 → 计算下一状态 → 写审计列 + 状态历史
// ==========================================

use crate::domain::types::{Actor, VehicleStatus};
use crate::domain::vehicle::{DisposalAssessment, StatusAudit, Vehicle, VehicleStatusChange};
use crate::domain::work_order::RecordRef;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::vehicle_status::{StatusInputs, StatusTransition, VehicleStatusMachine, WorkActivity};
use crate::repository::row_mapping::new_id;
use crate::repository::{PmsRepository, RepairRepository, StatusHistoryRepository, VehicleRepository};
use chrono::NaiveDateTime;
use rusqlite::Connection;

/// 联动请求
pub(super) struct CascadeRequest<'a> {
    pub vehicle_id: &'a str,
    pub activity: WorkActivity,
    /// 触发联动的单据（统计“其他作业”时排除）
    pub trigger: Option<&'a RecordRef>,
    pub recompute_disposal: bool,
}

pub(super) fn require_vehicle(conn: &Connection, vehicle_id: &str) -> EngineResult<Vehicle> {
    VehicleRepository::new(conn)
        .find_by_id(vehicle_id)?
        .ok_or_else(|| EngineError::not_found("vehicle", vehicle_id))
}

/// 报废评估（已完成维修费用合计 vs 市值 / 2）
pub(super) fn assess_disposal(conn: &Connection, vehicle: &Vehicle) -> EngineResult<DisposalAssessment> {
    let total = RepairRepository::new(conn).completed_cost_total(&vehicle.vehicle_id)?;
    Ok(DisposalAssessment::evaluate(vehicle.current_market_value, total))
}

/// 执行车辆状态联动
///
/// # 返回
/// - Some(transition): 状态已变更并留痕
/// - None: 状态不变
pub(super) fn cascade_vehicle_status(
    conn: &Connection,
    request: &CascadeRequest<'_>,
    now: NaiveDateTime,
) -> EngineResult<Option<StatusTransition>> {
    let vehicle = require_vehicle(conn, request.vehicle_id)?;
    let repairs = RepairRepository::new(conn);
    let pms = PmsRepository::new(conn);

    let exclude_repair = match request.trigger {
        Some(RecordRef::Repair(id)) => Some(id.as_str()),
        _ => None,
    };
    let exclude_pms = match request.trigger {
        Some(RecordRef::Pms(id)) => Some(id.as_str()),
        _ => None,
    };

    let other_active_work = repairs.count_ongoing(request.vehicle_id, exclude_repair)? > 0
        || pms.count_in_progress(request.vehicle_id, exclude_pms)? > 0;
    let ongoing_repair_exists = repairs.count_ongoing(request.vehicle_id, None)? > 0;

    let disposal = if request.recompute_disposal {
        let assessment = assess_disposal(conn, &vehicle)?;
        if assessment.is_applicable() {
            tracing::debug!(
                "报废重算: plate={}, total={}, threshold={:?}, for_disposal={}",
                vehicle.plate_number,
                assessment.total_repair_costs,
                assessment.disposal_threshold,
                assessment.is_for_disposal
            );
            Some(assessment.is_for_disposal)
        } else {
            tracing::debug!("车辆 {} 未设置市值，跳过报废判定", vehicle.plate_number);
            None
        }
    } else {
        None
    };

    let inputs = StatusInputs {
        current: vehicle.status,
        activity: request.activity,
        other_active_work,
        ongoing_repair_exists,
        disposal,
    };

    match VehicleStatusMachine::next(&inputs) {
        Some(transition) => {
            record_transition(
                conn,
                &vehicle,
                transition.to,
                None,
                transition.reason.describe(),
                now,
            )?;
            Ok(Some(transition))
        }
        None => Ok(None),
    }
}

/// 写入状态变更（审计列 + 历史）
///
/// `actor` 为 None 表示系统自动变更
pub(super) fn record_transition(
    conn: &Connection,
    vehicle: &Vehicle,
    to: VehicleStatus,
    actor: Option<&Actor>,
    reason: String,
    now: NaiveDateTime,
) -> EngineResult<VehicleStatusChange> {
    let changed_by = actor.map(|a| a.username.clone());
    let audit = StatusAudit {
        changed_at: now,
        changed_by: changed_by.clone(),
        reason: reason.clone(),
    };
    VehicleRepository::new(conn).update_status(&vehicle.vehicle_id, to, &audit)?;

    let change = VehicleStatusChange {
        history_id: new_id(),
        vehicle_id: vehicle.vehicle_id.clone(),
        from_status: vehicle.status,
        to_status: to,
        changed_by,
        reason,
        changed_at: now,
    };
    StatusHistoryRepository::new(conn).insert(&change)?;

    tracing::info!(
        "车辆状态变更: plate={}, {} -> {}, by={}, reason={}",
        vehicle.plate_number,
        change.from_status,
        change.to_status,
        change.changed_by.as_deref().unwrap_or("auto"),
        change.reason
    );
    Ok(change)
}

/// 完工里程回写（只增不减）
pub(super) fn raise_mileage(
    conn: &Connection,
    vehicle_id: &str,
    odometer_km: Option<i64>,
    now: NaiveDateTime,
) -> EngineResult<()> {
    if let Some(km) = odometer_km {
        if VehicleRepository::new(conn).raise_mileage(vehicle_id, km, now)? > 0 {
            tracing::debug!("车辆里程更新: vehicle_id={}, mileage_km={}", vehicle_id, km);
        }
    }
    Ok(())
}
