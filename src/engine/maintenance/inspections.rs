// ==========================================
// 检验报告操作: 建档 / 审批 / 可选报告
// ==========================================
// 审批为单向操作: 同时写入审批人与审批时间，可重复审批（覆盖），
// 不提供驳回 / 撤销
// ==========================================

use super::cascade::require_vehicle;
use super::MaintenanceEngine;
use crate::domain::inspection::{
    ApprovalState, NewPostInspection, NewPreInspection, PostInspectionReport, PreInspectionReport,
};
use crate::domain::types::{Actor, ReportType};
use crate::engine::error::{EngineError, EngineResult, ValidationError, ViolationKind};
use crate::i18n::{t, t_with_args};
use crate::repository::row_mapping::new_id;
use crate::repository::{PostInspectionRepository, PreInspectionRepository};
use chrono::Utc;

impl MaintenanceEngine {
    // ==========================================
    // 维修前检验
    // ==========================================

    pub fn create_pre_inspection(&self, new_report: NewPreInspection) -> EngineResult<PreInspectionReport> {
        self.with_transaction(|tx, _| {
            require_vehicle(tx, &new_report.vehicle_id)?;

            let now = Utc::now().naive_utc();
            let report = PreInspectionReport {
                report_id: new_id(),
                vehicle_id: new_report.vehicle_id,
                report_type: new_report.report_type,
                inspected_by: new_report.inspected_by,
                inspection_date: new_report.inspection_date.unwrap_or(now),
                odometer_km: new_report.odometer_km,
                ratings: new_report.ratings,
                findings: new_report.findings,
                photo_paths: new_report.photo_paths,
                approval: ApprovalState::Unapproved,
                created_at: now,
            };
            PreInspectionRepository::new(tx).insert(&report)?;

            tracing::info!(
                "维修前检验已建档: id={}, vehicle_id={}, type={}, worst={:?}",
                report.report_id,
                report.vehicle_id,
                report.report_type,
                report.ratings.worst()
            );
            Ok(report)
        })
    }

    pub fn get_pre_inspection(&self, report_id: &str) -> EngineResult<PreInspectionReport> {
        self.with_connection(|conn| {
            PreInspectionRepository::new(conn)
                .find_by_id(report_id)?
                .ok_or_else(|| EngineError::not_found("pre-inspection report", report_id))
        })
    }

    /// 审批维修前检验（重复审批会覆盖审批人 / 时间 / 备注）
    pub fn approve_pre_inspection(
        &self,
        report_id: &str,
        actor: &Actor,
        notes: Option<String>,
    ) -> EngineResult<PreInspectionReport> {
        self.with_transaction(|tx, _| {
            let repo = PreInspectionRepository::new(tx);
            let mut report = repo
                .find_by_id(report_id)?
                .ok_or_else(|| EngineError::not_found("pre-inspection report", report_id))?;

            if report.approval.is_approved() {
                tracing::debug!("维修前检验 {} 已审批，重新写入审批信息", report_id);
            }
            report.approval = ApprovalState::Approved {
                by: actor.username.clone(),
                at: Utc::now().naive_utc(),
                notes,
            };
            repo.set_approval(report_id, &report.approval)?;

            tracing::info!("维修前检验已审批: id={}, by={}", report_id, actor);
            Ok(report)
        })
    }

    /// 可选用的维修前检验（已审批、未被使用）
    pub fn available_pre_inspections(
        &self,
        vehicle_id: &str,
        report_type: ReportType,
    ) -> EngineResult<Vec<PreInspectionReport>> {
        self.with_connection(|conn| {
            require_vehicle(conn, vehicle_id)?;
            Ok(PreInspectionRepository::new(conn).list_available(vehicle_id, report_type)?)
        })
    }

    pub fn pre_inspections_for_vehicle(&self, vehicle_id: &str) -> EngineResult<Vec<PreInspectionReport>> {
        self.with_connection(|conn| Ok(PreInspectionRepository::new(conn).list_by_vehicle(vehicle_id)?))
    }

    // ==========================================
    // 维修后检验
    // ==========================================

    /// 建档维修后检验
    ///
    /// 对应的维修前检验必须存在且属于同一车辆；满意度评分为 1-5
    pub fn create_post_inspection(&self, new_report: NewPostInspection) -> EngineResult<PostInspectionReport> {
        self.with_transaction(|tx, _| {
            require_vehicle(tx, &new_report.vehicle_id)?;
            let pre = PreInspectionRepository::new(tx)
                .find_by_id(&new_report.pre_inspection_id)?
                .ok_or_else(|| {
                    EngineError::not_found("pre-inspection report", new_report.pre_inspection_id.as_str())
                })?;

            let mut errors = ValidationError::new();
            if pre.vehicle_id != new_report.vehicle_id {
                errors.push(
                    ViolationKind::PostInspectionPreMismatch,
                    t("validation.post_inspection_pre_mismatch"),
                );
            }
            for field in new_report.satisfaction.out_of_range_fields() {
                errors.push(
                    ViolationKind::RatingOutOfRange,
                    t_with_args("validation.rating_out_of_range", &[("field", field)]),
                );
            }
            errors.into_result()?;

            let now = Utc::now().naive_utc();
            let report = PostInspectionReport {
                report_id: new_id(),
                vehicle_id: new_report.vehicle_id,
                pre_inspection_id: new_report.pre_inspection_id,
                inspected_by: new_report.inspected_by,
                inspection_date: new_report.inspection_date.unwrap_or(now),
                odometer_km: new_report.odometer_km,
                ratings: new_report.ratings,
                satisfaction: new_report.satisfaction,
                test_drive: new_report.test_drive,
                findings: new_report.findings,
                photo_paths: new_report.photo_paths,
                approval: ApprovalState::Unapproved,
                created_at: now,
            };
            PostInspectionRepository::new(tx).insert(&report)?;

            tracing::info!(
                "维修后检验已建档: id={}, vehicle_id={}, pre={}",
                report.report_id,
                report.vehicle_id,
                report.pre_inspection_id
            );
            Ok(report)
        })
    }

    pub fn get_post_inspection(&self, report_id: &str) -> EngineResult<PostInspectionReport> {
        self.with_connection(|conn| {
            PostInspectionRepository::new(conn)
                .find_by_id(report_id)?
                .ok_or_else(|| EngineError::not_found("post-inspection report", report_id))
        })
    }

    pub fn approve_post_inspection(
        &self,
        report_id: &str,
        actor: &Actor,
        notes: Option<String>,
    ) -> EngineResult<PostInspectionReport> {
        self.with_transaction(|tx, _| {
            let repo = PostInspectionRepository::new(tx);
            let mut report = repo
                .find_by_id(report_id)?
                .ok_or_else(|| EngineError::not_found("post-inspection report", report_id))?;

            report.approval = ApprovalState::Approved {
                by: actor.username.clone(),
                at: Utc::now().naive_utc(),
                notes,
            };
            repo.set_approval(report_id, &report.approval)?;

            tracing::info!("维修后检验已审批: id={}, by={}", report_id, actor);
            Ok(report)
        })
    }

    pub fn available_post_inspections(&self, vehicle_id: &str) -> EngineResult<Vec<PostInspectionReport>> {
        self.with_connection(|conn| {
            require_vehicle(conn, vehicle_id)?;
            Ok(PostInspectionRepository::new(conn).list_available(vehicle_id)?)
        })
    }
}
