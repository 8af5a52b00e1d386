// ==========================================
// 维修单操作: 新建 / 由保养单派生 / 更新 / 删除 / 配件明细
// ==========================================
// 保存顺序: 业务前置检查 → 保存校验 → 写库 → 里程回写 → 车辆状态联动
// 报废重算条件:
//   - 新建即完成
//   - 完成标记变化，或已完成单据的总费用变化
//   - 删除已完成单据
// ==========================================

use super::cascade::{cascade_vehicle_status, raise_mileage, require_vehicle, CascadeRequest};
use super::MaintenanceEngine;
use crate::domain::types::{Actor, PmsStatus, RepairStatus};
use crate::domain::work_order::{
    MaintenanceRecord, NewPartItem, PmsRepairDraft, Repair, RepairDraft, RepairOrigin,
    RepairPartItem, RepairUpdate,
};
use crate::engine::error::{EngineError, EngineResult, ValidationError, ViolationKind};
use crate::engine::validation::{check_amount, SaveContext, WorkOrderValidator};
use crate::engine::vehicle_status::WorkActivity;
use crate::i18n::{t, t_with_args};
use crate::repository::row_mapping::new_id;
use crate::repository::{PartItemRepository, PmsRepository, RepairRepository, ShopRepository};
use chrono::{NaiveDateTime, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;

impl MaintenanceEngine {
    /// 新建维修单
    pub fn create_repair(&self, draft: RepairDraft, actor: Option<&Actor>) -> EngineResult<Repair> {
        self.with_transaction(|tx, _| {
            require_vehicle(tx, &draft.vehicle_id)?;
            check_shop(tx, draft.shop_id.as_deref())?;
            check_costs(Some(draft.parts_cost), Some(draft.labor_cost))?;

            let now = Utc::now().naive_utc();
            let repair = Repair {
                repair_id: new_id(),
                vehicle_id: draft.vehicle_id,
                pre_inspection_id: draft.pre_inspection_id,
                post_inspection_id: draft.post_inspection_id,
                origin: RepairOrigin::Standalone,
                shop_id: draft.shop_id,
                description: draft.description,
                status: draft.status,
                parts_cost: draft.parts_cost,
                labor_cost: draft.labor_cost,
                odometer_km: draft.odometer_km,
                started_at: now,
                completed_at: (draft.status == RepairStatus::Completed).then_some(now),
                created_by: actor.map(|a| a.username.clone()),
                created_at: now,
                updated_at: now,
            };

            insert_repair(tx, &repair, now)
        })
    }

    /// 由保养单派生维修单（保养过程中更换了配件）
    ///
    /// 维修单沿用保养单的车辆与检验报告，两者视为同一次维修事件，
    /// 因此共用检验报告不违反单次使用约束
    pub fn create_repair_from_pms(
        &self,
        pms_id: &str,
        draft: PmsRepairDraft,
        actor: Option<&Actor>,
    ) -> EngineResult<Repair> {
        self.with_transaction(|tx, _| {
            let pms = PmsRepository::new(tx)
                .find_by_id(pms_id)?
                .ok_or_else(|| EngineError::not_found("PMS", pms_id))?;

            let mut errors = ValidationError::new();
            if pms.status == PmsStatus::Cancelled {
                errors.push(ViolationKind::PmsCancelled, t("validation.pms_cancelled"));
            }
            if pms.generated_repair_id.is_some() {
                errors.push(
                    ViolationKind::PmsAlreadyHasRepair,
                    t("validation.pms_already_has_repair"),
                );
            }
            errors.into_result()?;

            check_shop(tx, draft.shop_id.as_deref())?;
            check_costs(Some(draft.parts_cost), Some(draft.labor_cost))?;

            let now = Utc::now().naive_utc();
            let repair = Repair {
                repair_id: new_id(),
                vehicle_id: pms.vehicle_id.clone(),
                pre_inspection_id: pms.pre_inspection_id.clone(),
                post_inspection_id: pms.post_inspection_id.clone(),
                origin: RepairOrigin::FromPms {
                    pms_id: pms.pms_id.clone(),
                },
                shop_id: draft.shop_id,
                description: draft.description,
                status: draft.status,
                parts_cost: draft.parts_cost,
                labor_cost: draft.labor_cost,
                odometer_km: pms.odometer_km,
                started_at: now,
                completed_at: (draft.status == RepairStatus::Completed).then_some(now),
                created_by: actor.map(|a| a.username.clone()),
                created_at: now,
                updated_at: now,
            };

            insert_repair(tx, &repair, now)
        })
    }

    /// 更新维修单
    pub fn update_repair(
        &self,
        repair_id: &str,
        update: RepairUpdate,
        actor: Option<&Actor>,
    ) -> EngineResult<Repair> {
        self.with_transaction(|tx, _| {
            let repo = RepairRepository::new(tx);
            let existing = repo
                .find_by_id(repair_id)?
                .ok_or_else(|| EngineError::not_found("repair", repair_id))?;

            let label = t(existing.record_ref().label_key());
            let mut errors = ValidationError::new();
            if existing.is_completed() && update.status == Some(RepairStatus::Ongoing) {
                errors.push(
                    ViolationKind::CompletedIsFinal,
                    t_with_args("validation.completed_is_final", &[("record", label.as_str())]),
                );
            }
            if update.parts_cost.is_some()
                && PartItemRepository::new(tx).count_by_repair(repair_id)? > 0
            {
                errors.push(
                    ViolationKind::PartsCostManagedByItems,
                    t("validation.parts_cost_managed_by_items"),
                );
            }
            if let Some(parts) = update.parts_cost {
                check_amount(&mut errors, "field.parts_cost", parts);
            }
            if let Some(labor) = update.labor_cost {
                check_amount(&mut errors, "field.labor_cost", labor);
            }
            errors.into_result()?;
            check_shop(tx, update.shop_id.as_deref())?;

            let now = Utc::now().naive_utc();
            let mut repair = existing.clone();
            update.apply_to(&mut repair);
            let newly_completed = !existing.is_completed() && repair.is_completed();
            if newly_completed {
                repair.completed_at = Some(now);
            }
            repair.updated_at = now;

            WorkOrderValidator::new(tx).validate(&repair, SaveContext::update())?;
            repo.update(&repair)?;

            let cost_changed = repair.total_cost() != existing.total_cost();
            tracing::info!(
                "维修单已更新: id={}, status={}, total_cost={}, by={}",
                repair.repair_id,
                repair.status,
                repair.total_cost(),
                actor.map(|a| a.username.as_str()).unwrap_or("system")
            );

            if newly_completed {
                raise_mileage(tx, &repair.vehicle_id, repair.odometer_km, now)?;
            }
            let record_ref = repair.record_ref();
            cascade_vehicle_status(
                tx,
                &CascadeRequest {
                    vehicle_id: &repair.vehicle_id,
                    activity: if newly_completed {
                        WorkActivity::Completed
                    } else {
                        WorkActivity::Unchanged
                    },
                    trigger: Some(&record_ref),
                    recompute_disposal: newly_completed || (repair.is_completed() && cost_changed),
                },
                now,
            )?;
            Ok(repair)
        })
    }

    /// 删除维修单
    ///
    /// 删除已完成单据会重算报废状态；删除进行中单据视为该作业结束
    pub fn delete_repair(&self, repair_id: &str, actor: Option<&Actor>) -> EngineResult<()> {
        self.with_transaction(|tx, _| {
            let repo = RepairRepository::new(tx);
            let repair = repo
                .find_by_id(repair_id)?
                .ok_or_else(|| EngineError::not_found("repair", repair_id))?;

            repo.delete(repair_id)?;
            tracing::info!(
                "维修单已删除: id={}, vehicle_id={}, by={}",
                repair_id,
                repair.vehicle_id,
                actor.map(|a| a.username.as_str()).unwrap_or("system")
            );

            let record_ref = repair.record_ref();
            cascade_vehicle_status(
                tx,
                &CascadeRequest {
                    vehicle_id: &repair.vehicle_id,
                    activity: if repair.is_active() {
                        WorkActivity::Completed
                    } else {
                        WorkActivity::Unchanged
                    },
                    trigger: Some(&record_ref),
                    recompute_disposal: repair.is_completed(),
                },
                Utc::now().naive_utc(),
            )?;
            Ok(())
        })
    }

    pub fn get_repair(&self, repair_id: &str) -> EngineResult<Repair> {
        self.with_connection(|conn| {
            RepairRepository::new(conn)
                .find_by_id(repair_id)?
                .ok_or_else(|| EngineError::not_found("repair", repair_id))
        })
    }

    pub fn repairs_for_vehicle(&self, vehicle_id: &str) -> EngineResult<Vec<Repair>> {
        self.with_connection(|conn| Ok(RepairRepository::new(conn).find_by_vehicle(vehicle_id)?))
    }

    // ==========================================
    // 配件明细
    // ==========================================
    // 配件费 = Σ 明细费用，在同一事务内回写维修单

    pub fn add_part_item(&self, repair_id: &str, item: NewPartItem) -> EngineResult<RepairPartItem> {
        self.with_transaction(|tx, _| {
            let repair = RepairRepository::new(tx)
                .find_by_id(repair_id)?
                .ok_or_else(|| EngineError::not_found("repair", repair_id))?;

            let mut errors = ValidationError::new();
            if item.quantity <= Decimal::ZERO {
                errors.push(ViolationKind::QuantityNotPositive, t("validation.quantity_not_positive"));
            }
            check_amount(&mut errors, "field.part_cost", item.cost);
            errors.into_result()?;

            let now = Utc::now().naive_utc();
            let part_item = RepairPartItem {
                item_id: new_id(),
                repair_id: repair_id.to_string(),
                part_name: item.part_name,
                part_number: item.part_number,
                quantity: item.quantity,
                unit: item.unit,
                cost: item.cost,
                created_at: now,
            };
            PartItemRepository::new(tx).insert(&part_item)?;
            sync_parts_cost(tx, &repair, now)?;

            tracing::info!(
                "配件明细已添加: repair_id={}, part={}, cost={}",
                repair_id,
                part_item.part_name,
                part_item.cost
            );
            Ok(part_item)
        })
    }

    pub fn remove_part_item(&self, item_id: &str) -> EngineResult<()> {
        self.with_transaction(|tx, _| {
            let items = PartItemRepository::new(tx);
            let item = items
                .find_by_id(item_id)?
                .ok_or_else(|| EngineError::not_found("part item", item_id))?;
            let repair = RepairRepository::new(tx)
                .find_by_id(&item.repair_id)?
                .ok_or_else(|| EngineError::not_found("repair", item.repair_id.as_str()))?;

            items.delete(item_id)?;
            sync_parts_cost(tx, &repair, Utc::now().naive_utc())?;

            tracing::info!("配件明细已删除: repair_id={}, item_id={}", repair.repair_id, item_id);
            Ok(())
        })
    }

    pub fn part_items(&self, repair_id: &str) -> EngineResult<Vec<RepairPartItem>> {
        self.with_connection(|conn| Ok(PartItemRepository::new(conn).find_by_repair(repair_id)?))
    }
}

/// 校验并写入新维修单，随后回写里程并联动车辆状态
fn insert_repair(conn: &Connection, repair: &Repair, now: NaiveDateTime) -> EngineResult<Repair> {
    WorkOrderValidator::new(conn).validate(repair, SaveContext::create())?;
    RepairRepository::new(conn).insert(repair)?;

    tracing::info!(
        "维修单已创建: id={}, vehicle_id={}, origin={:?}, status={}, total_cost={}",
        repair.repair_id,
        repair.vehicle_id,
        repair.origin,
        repair.status,
        repair.total_cost()
    );

    let completed = repair.is_completed();
    if completed {
        raise_mileage(conn, &repair.vehicle_id, repair.odometer_km, now)?;
    }
    let record_ref = repair.record_ref();
    cascade_vehicle_status(
        conn,
        &CascadeRequest {
            vehicle_id: &repair.vehicle_id,
            activity: if completed {
                WorkActivity::Completed
            } else {
                WorkActivity::Started
            },
            trigger: Some(&record_ref),
            recompute_disposal: completed,
        },
        now,
    )?;
    Ok(repair.clone())
}

/// 配件费回写；已完成维修单的费用变化触发报废重算
fn sync_parts_cost(conn: &Connection, repair: &Repair, now: NaiveDateTime) -> EngineResult<()> {
    let parts_cost = PartItemRepository::new(conn).sum_cost(&repair.repair_id)?;
    RepairRepository::new(conn).update_parts_cost(&repair.repair_id, parts_cost, now)?;

    if repair.is_completed() && parts_cost != repair.parts_cost {
        let record_ref = repair.record_ref();
        cascade_vehicle_status(
            conn,
            &CascadeRequest {
                vehicle_id: &repair.vehicle_id,
                activity: WorkActivity::Unchanged,
                trigger: Some(&record_ref),
                recompute_disposal: true,
            },
            now,
        )?;
    } else {
        tracing::debug!("维修单 {} 未完成或费用未变，跳过报废重算", repair.repair_id);
    }
    Ok(())
}

fn check_shop(conn: &Connection, shop_id: Option<&str>) -> EngineResult<()> {
    if let Some(shop_id) = shop_id {
        ShopRepository::new(conn)
            .find_by_id(shop_id)?
            .ok_or_else(|| EngineError::not_found("repair shop", shop_id))?;
    }
    Ok(())
}

fn check_costs(parts_cost: Option<Decimal>, labor_cost: Option<Decimal>) -> EngineResult<()> {
    let mut errors = ValidationError::new();
    if let Some(parts) = parts_cost {
        check_amount(&mut errors, "field.parts_cost", parts);
    }
    if let Some(labor) = labor_cost {
        check_amount(&mut errors, "field.labor_cost", labor);
    }
    Ok(errors.into_result()?)
}
