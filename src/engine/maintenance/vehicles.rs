// ==========================================
// 车辆操作: 登记 / 查询 / 手工状态变更 / 市值 / 报废评估
// ==========================================

use super::cascade::{assess_disposal, cascade_vehicle_status, record_transition, require_vehicle, CascadeRequest};
use super::MaintenanceEngine;
use crate::domain::notification::{EntityRef, Notification, NotificationPriority, NotificationType};
use crate::domain::types::{Actor, VehicleStatus};
use crate::domain::vehicle::{DisposalAssessment, NewVehicle, Vehicle, VehicleStatusChange};
use crate::engine::error::{EngineError, EngineResult, ValidationError, ViolationKind};
use crate::engine::validation::check_amount;
use crate::engine::vehicle_status::WorkActivity;
use crate::i18n::{t, t_with_args};
use crate::repository::row_mapping::new_id;
use crate::repository::{DriverRepository, StatusHistoryRepository, VehicleRepository};
use chrono::Utc;
use rusqlite::Connection;
use rust_decimal::Decimal;

impl MaintenanceEngine {
    // ==========================================
    // 登记与查询
    // ==========================================

    /// 登记车辆（初始状态: 可用）
    pub fn register_vehicle(&self, new_vehicle: NewVehicle) -> EngineResult<Vehicle> {
        self.with_transaction(|tx, _| {
            let repo = VehicleRepository::new(tx);
            let plate = new_vehicle.plate_number.trim().to_string();

            let mut errors = ValidationError::new();
            if plate.is_empty() {
                errors.push(ViolationKind::PlateRequired, t("validation.plate_required"));
            } else if repo.find_by_plate(&plate)?.is_some() {
                errors.push(
                    ViolationKind::DuplicatePlate,
                    t_with_args("validation.plate_already_registered", &[("plate", plate.as_str())]),
                );
            }
            if let Some(cost) = new_vehicle.acquisition_cost {
                check_amount(&mut errors, "field.acquisition_cost", cost);
            }
            if let Some(value) = new_vehicle.current_market_value {
                check_amount(&mut errors, "field.market_value", value);
            }
            errors.into_result()?;

            let now = Utc::now().naive_utc();
            let vehicle = Vehicle {
                vehicle_id: new_id(),
                plate_number: plate,
                vehicle_type: new_vehicle.vehicle_type,
                make_model: new_vehicle.make_model,
                mileage_km: new_vehicle.mileage_km.max(0),
                assigned_driver_id: None,
                status: VehicleStatus::Serviceable,
                status_audit: None,
                acquisition_cost: new_vehicle.acquisition_cost,
                current_market_value: new_vehicle.current_market_value,
                created_at: now,
                updated_at: now,
            };
            repo.insert(&vehicle)?;

            tracing::info!("车辆已登记: plate={}, id={}", vehicle.plate_number, vehicle.vehicle_id);
            Ok(vehicle)
        })
    }

    pub fn get_vehicle(&self, vehicle_id: &str) -> EngineResult<Vehicle> {
        self.with_connection(|conn| require_vehicle(conn, vehicle_id))
    }

    pub fn find_vehicle_by_plate(&self, plate_number: &str) -> EngineResult<Option<Vehicle>> {
        self.with_connection(|conn| Ok(VehicleRepository::new(conn).find_by_plate(plate_number.trim())?))
    }

    /// 车辆列表
    ///
    /// 返回前对所有已设置市值的车辆重新执行报废判定，
    /// 保证列表中的状态与权威重算结果一致
    pub fn list_vehicles(&self) -> EngineResult<Vec<Vehicle>> {
        self.with_transaction(|tx, _| {
            refresh_disposal_statuses(tx)?;
            Ok(VehicleRepository::new(tx).list_all()?)
        })
    }

    /// 全量回填报废状态（命令行 refresh-status）
    ///
    /// # 返回
    /// - 发生状态变更的车辆数
    pub fn refresh_all_statuses(&self) -> EngineResult<usize> {
        let changed = self.with_transaction(|tx, _| refresh_disposal_statuses(tx))?;
        tracing::info!("报废状态回填完成: {} 辆车状态变更", changed);
        Ok(changed)
    }

    // ==========================================
    // 手工状态变更
    // ==========================================

    /// 用户发起的状态变更
    ///
    /// 记录操作人；提交后向操作人发送通知（尽力而为）。
    /// 目标状态与当前相同时不做任何写入
    pub fn change_vehicle_status(
        &self,
        vehicle_id: &str,
        status: VehicleStatus,
        actor: &Actor,
        reason: &str,
    ) -> EngineResult<Vehicle> {
        self.with_transaction(|tx, pending| {
            let vehicle = require_vehicle(tx, vehicle_id)?;
            if vehicle.status == status {
                tracing::debug!("车辆 {} 已处于 {}，跳过", vehicle.plate_number, status);
                return Ok(vehicle);
            }

            let now = Utc::now().naive_utc();
            let change = record_transition(tx, &vehicle, status, Some(actor), reason.to_string(), now)?;
            pending.push(status_changed_notification(&vehicle, &change, actor));

            require_vehicle(tx, vehicle_id)
        })
    }

    /// 状态变更历史（最新在前）
    pub fn status_history(&self, vehicle_id: &str) -> EngineResult<Vec<VehicleStatusChange>> {
        self.with_connection(|conn| {
            require_vehicle(conn, vehicle_id)?;
            Ok(StatusHistoryRepository::new(conn).find_by_vehicle(vehicle_id)?)
        })
    }

    // ==========================================
    // 市值 / 驾驶员 / 报废评估
    // ==========================================

    /// 更新当前市值（None = 清除），随后重新执行报废判定
    pub fn update_market_value(
        &self,
        vehicle_id: &str,
        market_value: Option<Decimal>,
    ) -> EngineResult<Vehicle> {
        self.with_transaction(|tx, _| {
            require_vehicle(tx, vehicle_id)?;
            if let Some(value) = market_value {
                let mut errors = ValidationError::new();
                check_amount(&mut errors, "field.market_value", value);
                errors.into_result()?;
            }

            let now = Utc::now().naive_utc();
            VehicleRepository::new(tx).update_market_value(vehicle_id, market_value, now)?;
            cascade_vehicle_status(
                tx,
                &CascadeRequest {
                    vehicle_id,
                    activity: WorkActivity::Unchanged,
                    trigger: None,
                    recompute_disposal: true,
                },
                now,
            )?;
            require_vehicle(tx, vehicle_id)
        })
    }

    /// 指派驾驶员（None = 取消指派）
    pub fn assign_driver(&self, vehicle_id: &str, driver_id: Option<&str>) -> EngineResult<Vehicle> {
        self.with_transaction(|tx, _| {
            require_vehicle(tx, vehicle_id)?;
            if let Some(driver_id) = driver_id {
                DriverRepository::new(tx)
                    .find_by_id(driver_id)?
                    .ok_or_else(|| EngineError::not_found("driver", driver_id))?;
            }
            VehicleRepository::new(tx).assign_driver(vehicle_id, driver_id, Utc::now().naive_utc())?;
            require_vehicle(tx, vehicle_id)
        })
    }

    /// 报废评估（只读，不修改车辆状态）
    pub fn disposal_assessment(&self, vehicle_id: &str) -> EngineResult<DisposalAssessment> {
        self.with_connection(|conn| {
            let vehicle = require_vehicle(conn, vehicle_id)?;
            assess_disposal(conn, &vehicle)
        })
    }
}

/// 对全部已设置市值的车辆重算报废状态
fn refresh_disposal_statuses(conn: &Connection) -> EngineResult<usize> {
    let now = Utc::now().naive_utc();
    let mut changed = 0;
    for vehicle in VehicleRepository::new(conn).list_all()? {
        if vehicle.disposal_threshold().is_none() {
            continue;
        }
        let transition = cascade_vehicle_status(
            conn,
            &CascadeRequest {
                vehicle_id: &vehicle.vehicle_id,
                activity: WorkActivity::Unchanged,
                trigger: None,
                recompute_disposal: true,
            },
            now,
        )?;
        if transition.is_some() {
            changed += 1;
        }
    }
    Ok(changed)
}

fn status_changed_notification(
    vehicle: &Vehicle,
    change: &VehicleStatusChange,
    actor: &Actor,
) -> Notification {
    let from = change.from_status.to_string();
    let to = change.to_status.to_string();
    Notification {
        recipient: actor.username.clone(),
        notification_type: NotificationType::VehicleStatusChanged,
        title: t("notification.status_changed_title"),
        message: t_with_args(
            "notification.status_changed_message",
            &[
                ("plate", vehicle.plate_number.as_str()),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("reason", change.reason.as_str()),
            ],
        ),
        priority: if change.to_status == VehicleStatus::ForDisposal {
            NotificationPriority::High
        } else {
            NotificationPriority::Medium
        },
        related_entity: Some(EntityRef::vehicle(&vehicle.vehicle_id)),
    }
}
