// ==========================================
// 车队维修管理系统 - 维修单 / 保养单保存校验
// ==========================================
// 保存流水线（写库之前，在同一事务内执行）:
//   1. 新建单据必须附带维修前检验
//   2. 置为完成必须附带维修后检验
//   3. 维修前检验必须已审批
//   4. 置为完成时维修后检验必须已审批
//   5. 检验报告的车辆必须与单据车辆一致
//   6. 检验报告只能被一张单据（及其配对单据）使用
// 全部规则都会执行，违规项一次性返回
// ==========================================

use crate::domain::inspection::{PostInspectionReport, PreInspectionReport};
use crate::domain::work_order::{MaintenanceRecord, RecordRef};
use crate::engine::error::{EngineError, EngineResult, ValidationError, ViolationKind};
use crate::i18n::{t, t_with_args};
use crate::repository::{
    InspectionUsageRepository, PostInspectionRepository, PreInspectionRepository,
};
use rusqlite::Connection;
use rust_decimal::Decimal;

/// 保存上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveContext {
    pub is_new: bool,
}

impl SaveContext {
    pub fn create() -> Self {
        Self { is_new: true }
    }

    pub fn update() -> Self {
        Self { is_new: false }
    }
}

// ==========================================
// WorkOrderValidator
// ==========================================
pub struct WorkOrderValidator<'c> {
    conn: &'c Connection,
}

impl<'c> WorkOrderValidator<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 校验待保存的单据
    ///
    /// # 返回
    /// - Ok(()): 全部规则通过
    /// - Err(EngineError::Validation): 至少一条规则违反
    /// - Err(EngineError::NotFound): 引用的检验报告不存在
    pub fn validate<R: MaintenanceRecord>(&self, record: &R, ctx: SaveContext) -> EngineResult<()> {
        let record_ref = record.record_ref();
        let label = t(record_ref.label_key());
        let args = [("record", label.as_str())];

        let pre = self.load_pre(record.pre_inspection_id())?;
        let post = self.load_post(record.post_inspection_id())?;

        let mut errors = ValidationError::new();

        // === 规则 1 / 2: 必须附带检验报告 ===
        if ctx.is_new && pre.is_none() {
            errors.push(
                ViolationKind::PreInspectionRequired,
                t_with_args("validation.pre_inspection_required", &args),
            );
        }
        if record.is_completed() && post.is_none() {
            errors.push(
                ViolationKind::PostInspectionRequired,
                t_with_args("validation.post_inspection_required", &args),
            );
        }

        // === 规则 3 / 4: 必须已审批 ===
        if let Some(pre) = &pre {
            if !pre.approval.is_approved() {
                errors.push(
                    ViolationKind::PreInspectionNotApproved,
                    t_with_args("validation.pre_inspection_not_approved", &args),
                );
            }
        }
        if let Some(post) = &post {
            if record.is_completed() && !post.approval.is_approved() {
                errors.push(
                    ViolationKind::PostInspectionNotApproved,
                    t_with_args("validation.post_inspection_not_approved", &args),
                );
            }
        }

        // === 规则 5: 车辆一致 ===
        if let Some(pre) = &pre {
            if pre.vehicle_id != record.vehicle_id() {
                errors.push(
                    ViolationKind::PreInspectionVehicleMismatch,
                    t_with_args("validation.pre_inspection_vehicle_mismatch", &args),
                );
            }
        }
        if let Some(post) = &post {
            if post.vehicle_id != record.vehicle_id() {
                errors.push(
                    ViolationKind::PostInspectionVehicleMismatch,
                    t_with_args("validation.post_inspection_vehicle_mismatch", &args),
                );
            }
        }

        // 维修后检验须接续本单的维修前检验
        if let (Some(post), Some(pre_id)) = (&post, record.pre_inspection_id()) {
            if post.pre_inspection_id != pre_id {
                errors.push(
                    ViolationKind::PostInspectionPreMismatch,
                    t_with_args("validation.post_inspection_follows_other_pre", &args),
                );
            }
        }

        // === 规则 6: 单次使用（排除自身与配对单据） ===
        let usage = InspectionUsageRepository::new(self.conn);
        let permitted = permitted_consumers(record);
        if let Some(pre) = &pre {
            let consumers = usage.consumers_of_pre(&pre.report_id)?;
            if let Some(other) = first_foreign(&consumers, &permitted) {
                let other_label = t(other.label_key());
                errors.push(
                    ViolationKind::PreInspectionAlreadyUsed,
                    t_with_args(
                        "validation.pre_inspection_already_used",
                        &[("other", other_label.as_str())],
                    ),
                );
            }
        }
        if let Some(post) = &post {
            let consumers = usage.consumers_of_post(&post.report_id)?;
            if let Some(other) = first_foreign(&consumers, &permitted) {
                let other_label = t(other.label_key());
                errors.push(
                    ViolationKind::PostInspectionAlreadyUsed,
                    t_with_args(
                        "validation.post_inspection_already_used",
                        &[("other", other_label.as_str())],
                    ),
                );
            }
        }

        if !errors.is_empty() {
            tracing::warn!(
                "保存校验未通过: record={}, violations={:?}",
                record_ref,
                errors.kinds()
            );
        }
        errors.into_result().map_err(EngineError::from)
    }

    fn load_pre(&self, report_id: Option<&str>) -> EngineResult<Option<PreInspectionReport>> {
        match report_id {
            Some(id) => PreInspectionRepository::new(self.conn)
                .find_by_id(id)?
                .map(Some)
                .ok_or_else(|| EngineError::not_found("pre-inspection report", id)),
            None => Ok(None),
        }
    }

    fn load_post(&self, report_id: Option<&str>) -> EngineResult<Option<PostInspectionReport>> {
        match report_id {
            Some(id) => PostInspectionRepository::new(self.conn)
                .find_by_id(id)?
                .map(Some)
                .ok_or_else(|| EngineError::not_found("post-inspection report", id)),
            None => Ok(None),
        }
    }
}

/// 允许共用报告的单据: 自身 + 配对单据
fn permitted_consumers<R: MaintenanceRecord>(record: &R) -> Vec<RecordRef> {
    let mut permitted = vec![record.record_ref()];
    permitted.extend(record.counterpart());
    permitted
}

fn first_foreign<'a>(consumers: &'a [RecordRef], permitted: &[RecordRef]) -> Option<&'a RecordRef> {
    consumers.iter().find(|c| !permitted.contains(c))
}

/// 单项金额上限（10^15），保证费用合计不会溢出 Decimal
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// 金额须在 [0, MAX_AMOUNT] 内
pub fn check_amount(errors: &mut ValidationError, field_key: &str, amount: Decimal) {
    if amount < Decimal::ZERO {
        let field = t(field_key);
        errors.push(
            ViolationKind::NegativeAmount,
            t_with_args("validation.negative_amount", &[("field", field.as_str())]),
        );
    } else if amount > MAX_AMOUNT {
        let field = t(field_key);
        let max = MAX_AMOUNT.to_string();
        errors.push(
            ViolationKind::AmountTooLarge,
            t_with_args(
                "validation.amount_too_large",
                &[("field", field.as_str()), ("max", max.as_str())],
            ),
        );
    }
}
