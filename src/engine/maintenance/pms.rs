// ==========================================
// 保养单操作: 新建 / 更新 / 逾期扫描
// ==========================================
// Completed / Cancelled 为终态
// 进入 In Progress → 作业开始；离开 In Progress → 作业结束
// ==========================================

use super::cascade::{cascade_vehicle_status, raise_mileage, require_vehicle, CascadeRequest};
use super::MaintenanceEngine;
use crate::domain::types::{Actor, PmsStatus};
use crate::domain::work_order::{MaintenanceRecord, Pms, PmsDraft, PmsUpdate};
use crate::engine::error::{EngineError, EngineResult, ValidationError, ViolationKind};
use crate::engine::validation::{SaveContext, WorkOrderValidator};
use crate::engine::vehicle_status::WorkActivity;
use crate::i18n::t_with_args;
use crate::repository::row_mapping::new_id;
use crate::repository::PmsRepository;
use chrono::{Days, NaiveDate, Utc};

/// 状态变化对应的作业活动
fn pms_activity(before: Option<PmsStatus>, after: PmsStatus) -> WorkActivity {
    let was_active = before == Some(PmsStatus::InProgress);
    match after {
        PmsStatus::InProgress if !was_active => WorkActivity::Started,
        PmsStatus::Completed if before != Some(PmsStatus::Completed) => WorkActivity::Completed,
        PmsStatus::InProgress | PmsStatus::Completed => WorkActivity::Unchanged,
        _ if was_active => WorkActivity::Completed,
        _ => WorkActivity::Unchanged,
    }
}

impl MaintenanceEngine {
    /// 新建保养单
    pub fn create_pms(&self, draft: PmsDraft, actor: Option<&Actor>) -> EngineResult<Pms> {
        self.with_transaction(|tx, _| {
            require_vehicle(tx, &draft.vehicle_id)?;

            let now = Utc::now().naive_utc();
            let pms = Pms {
                pms_id: new_id(),
                vehicle_id: draft.vehicle_id,
                pre_inspection_id: draft.pre_inspection_id,
                post_inspection_id: None,
                service_type: draft.service_type,
                description: draft.description,
                status: draft.status,
                scheduled_date: draft.scheduled_date,
                started_at: (draft.status == PmsStatus::InProgress).then_some(now),
                completed_at: (draft.status == PmsStatus::Completed).then_some(now),
                odometer_km: draft.odometer_km,
                next_due_date: draft.next_due_date,
                generated_repair_id: None,
                created_by: actor.map(|a| a.username.clone()),
                created_at: now,
                updated_at: now,
            };

            WorkOrderValidator::new(tx).validate(&pms, SaveContext::create())?;
            PmsRepository::new(tx).insert(&pms)?;
            tracing::info!(
                "保养单已创建: id={}, vehicle_id={}, service={}, status={}",
                pms.pms_id,
                pms.vehicle_id,
                pms.service_type,
                pms.status
            );

            let activity = pms_activity(None, pms.status);
            let record_ref = pms.record_ref();
            cascade_vehicle_status(
                tx,
                &CascadeRequest {
                    vehicle_id: &pms.vehicle_id,
                    activity,
                    trigger: Some(&record_ref),
                    recompute_disposal: pms.is_completed(),
                },
                now,
            )?;
            Ok(pms)
        })
    }

    /// 更新保养单
    pub fn update_pms(&self, pms_id: &str, update: PmsUpdate, actor: Option<&Actor>) -> EngineResult<Pms> {
        self.with_transaction(|tx, _| {
            let repo = PmsRepository::new(tx);
            let existing = repo
                .find_by_id(pms_id)?
                .ok_or_else(|| EngineError::not_found("PMS", pms_id))?;

            if let Some(status) = update.status {
                if existing.status.is_final() && status != existing.status {
                    let current = existing.status.to_string();
                    return Err(ValidationError::single(
                        ViolationKind::PmsStatusFinal,
                        t_with_args("validation.pms_status_final", &[("status", current.as_str())]),
                    )
                    .into());
                }
            }

            let now = Utc::now().naive_utc();
            let mut pms = existing.clone();
            update.apply_to(&mut pms);
            if pms.status == PmsStatus::InProgress && pms.started_at.is_none() {
                pms.started_at = Some(now);
            }
            let newly_completed = !existing.is_completed() && pms.is_completed();
            if newly_completed {
                pms.completed_at = Some(now);
            }
            pms.updated_at = now;

            WorkOrderValidator::new(tx).validate(&pms, SaveContext::update())?;
            repo.update(&pms)?;
            tracing::info!(
                "保养单已更新: id={}, {} -> {}, by={}",
                pms.pms_id,
                existing.status,
                pms.status,
                actor.map(|a| a.username.as_str()).unwrap_or("system")
            );

            if newly_completed {
                raise_mileage(tx, &pms.vehicle_id, pms.odometer_km, now)?;
            }
            let record_ref = pms.record_ref();
            cascade_vehicle_status(
                tx,
                &CascadeRequest {
                    vehicle_id: &pms.vehicle_id,
                    activity: pms_activity(Some(existing.status), pms.status),
                    trigger: Some(&record_ref),
                    recompute_disposal: existing.is_completed() != pms.is_completed(),
                },
                now,
            )?;
            Ok(pms)
        })
    }

    pub fn get_pms(&self, pms_id: &str) -> EngineResult<Pms> {
        self.with_connection(|conn| {
            PmsRepository::new(conn)
                .find_by_id(pms_id)?
                .ok_or_else(|| EngineError::not_found("PMS", pms_id))
        })
    }

    pub fn pms_for_vehicle(&self, vehicle_id: &str) -> EngineResult<Vec<Pms>> {
        self.with_connection(|conn| Ok(PmsRepository::new(conn).find_by_vehicle(vehicle_id)?))
    }

    /// 逾期扫描: 计划日期早于 (today - 宽限天数) 的已排期保养单置为逾期
    ///
    /// # 返回
    /// - 置为逾期的保养单数量
    pub fn mark_overdue_pms(&self, today: NaiveDate) -> EngineResult<usize> {
        let grace_days = self.settings.pms_overdue_grace_days.max(0) as u64;
        let Some(cutoff) = today.checked_sub_days(Days::new(grace_days)) else {
            tracing::warn!("逾期宽限天数超出日期范围: {}，本次不标记逾期", grace_days);
            return Ok(0);
        };
        let count = self.with_transaction(|tx, _| {
            let repo = PmsRepository::new(tx);
            let now = Utc::now().naive_utc();
            let overdue = repo.find_scheduled_before(cutoff)?;
            for pms in &overdue {
                repo.set_status(&pms.pms_id, PmsStatus::Overdue, now)?;
                tracing::debug!(
                    "保养单逾期: id={}, vehicle_id={}, scheduled={}",
                    pms.pms_id,
                    pms.vehicle_id,
                    pms.scheduled_date
                );
            }
            Ok(overdue.len())
        })?;

        tracing::info!("逾期扫描完成: today={}, cutoff={}, overdue={}", today, cutoff, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pms_activity() {
        assert_eq!(pms_activity(None, PmsStatus::Scheduled), WorkActivity::Unchanged);
        assert_eq!(pms_activity(None, PmsStatus::InProgress), WorkActivity::Started);
        assert_eq!(
            pms_activity(Some(PmsStatus::Overdue), PmsStatus::InProgress),
            WorkActivity::Started
        );
        assert_eq!(
            pms_activity(Some(PmsStatus::InProgress), PmsStatus::InProgress),
            WorkActivity::Unchanged
        );
        assert_eq!(
            pms_activity(Some(PmsStatus::InProgress), PmsStatus::Completed),
            WorkActivity::Completed
        );
        assert_eq!(
            pms_activity(Some(PmsStatus::InProgress), PmsStatus::Cancelled),
            WorkActivity::Completed
        );
        assert_eq!(
            pms_activity(Some(PmsStatus::Scheduled), PmsStatus::Cancelled),
            WorkActivity::Unchanged
        );
    }
}
