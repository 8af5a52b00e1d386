// ==========================================
// 车队维修管理系统 - 检验报告数据仓储
// ==========================================
// 维修前检验: pre_inspection_reports
// 维修后检验: post_inspection_reports
// 报告占用查询: 跨 repairs / pms_records 两张表
// ==========================================

use crate::domain::inspection::{ApprovalState, PostInspectionReport, PreInspectionReport};
use crate::domain::types::ReportType;
use crate::domain::work_order::RecordRef;
use crate::repository::error::RepositoryResult;
use crate::repository::row_mapping::{get_enum, get_json, get_opt_json, to_json};
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRE_COLUMNS: &str = r#"
    report_id, vehicle_id, report_type, inspected_by, inspection_date, odometer_km,
    ratings_json, findings, photo_paths_json, approved_by, approval_date, approval_notes,
    created_at
"#;

const POST_COLUMNS: &str = r#"
    report_id, vehicle_id, pre_inspection_id, inspected_by, inspection_date, odometer_km,
    ratings_json, satisfaction_json, test_drive_json, findings, photo_paths_json,
    approved_by, approval_date, approval_notes, created_at
"#;

fn approval_columns(approval: &ApprovalState) -> (Option<&str>, Option<NaiveDateTime>, Option<&str>) {
    match approval {
        ApprovalState::Approved { by, at, notes } => (Some(by.as_str()), Some(*at), notes.as_deref()),
        ApprovalState::Unapproved => (None, None, None),
    }
}

fn read_approval(row: &Row<'_>, first: usize) -> rusqlite::Result<ApprovalState> {
    let by: Option<String> = row.get(first)?;
    let at: Option<NaiveDateTime> = row.get(first + 1)?;
    let notes: Option<String> = row.get(first + 2)?;
    ApprovalState::from_columns(by, at, notes).map_err(|msg| {
        rusqlite::Error::FromSqlConversionFailure(first, Type::Text, msg.into())
    })
}

// ==========================================
// PreInspectionRepository - 维修前检验仓储
// ==========================================
pub struct PreInspectionRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PreInspectionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, report: &PreInspectionReport) -> RepositoryResult<()> {
        let (approved_by, approval_date, approval_notes) = approval_columns(&report.approval);
        self.conn.execute(
            r#"
            INSERT INTO pre_inspection_reports (
                report_id, vehicle_id, report_type, inspected_by, inspection_date, odometer_km,
                ratings_json, findings, photo_paths_json, approved_by, approval_date, approval_notes,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                report.report_id,
                report.vehicle_id,
                report.report_type.to_db_str(),
                report.inspected_by,
                report.inspection_date,
                report.odometer_km,
                to_json(&report.ratings)?,
                report.findings,
                to_json(&report.photo_paths)?,
                approved_by,
                approval_date,
                approval_notes,
                report.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<PreInspectionReport>> {
        let sql = format!(
            "SELECT {} FROM pre_inspection_reports WHERE report_id = ?1",
            PRE_COLUMNS
        );
        let report = self
            .conn
            .query_row(&sql, params![report_id], map_pre)
            .optional()?;
        Ok(report)
    }

    /// 写入审批信息（三列同时写入）
    pub fn set_approval(&self, report_id: &str, approval: &ApprovalState) -> RepositoryResult<usize> {
        let (approved_by, approval_date, approval_notes) = approval_columns(approval);
        let rows = self.conn.execute(
            r#"
            UPDATE pre_inspection_reports
            SET approved_by = ?2, approval_date = ?3, approval_notes = ?4
            WHERE report_id = ?1
            "#,
            params![report_id, approved_by, approval_date, approval_notes],
        )?;
        Ok(rows)
    }

    /// 查询车辆的全部维修前检验（按检验时间倒序）
    pub fn list_by_vehicle(&self, vehicle_id: &str) -> RepositoryResult<Vec<PreInspectionReport>> {
        let sql = format!(
            "SELECT {} FROM pre_inspection_reports WHERE vehicle_id = ?1 ORDER BY inspection_date DESC",
            PRE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![vehicle_id], map_pre)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reports)
    }

    /// 可选用的维修前检验: 同车辆、同类型、已审批、未被任何维修/保养单引用
    pub fn list_available(
        &self,
        vehicle_id: &str,
        report_type: ReportType,
    ) -> RepositoryResult<Vec<PreInspectionReport>> {
        let sql = format!(
            r#"
            SELECT {} FROM pre_inspection_reports p
            WHERE p.vehicle_id = ?1
              AND p.report_type = ?2
              AND p.approved_by IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM repairs r WHERE r.pre_inspection_id = p.report_id)
              AND NOT EXISTS (SELECT 1 FROM pms_records m WHERE m.pre_inspection_id = p.report_id)
            ORDER BY p.inspection_date DESC
            "#,
            PRE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![vehicle_id, report_type.to_db_str()], map_pre)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reports)
    }
}

fn map_pre(row: &Row<'_>) -> rusqlite::Result<PreInspectionReport> {
    Ok(PreInspectionReport {
        report_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        report_type: get_enum(row, 2, ReportType::from_db_str)?,
        inspected_by: row.get(3)?,
        inspection_date: row.get(4)?,
        odometer_km: row.get(5)?,
        ratings: get_json(row, 6)?,
        findings: row.get(7)?,
        photo_paths: get_json(row, 8)?,
        approval: read_approval(row, 9)?,
        created_at: row.get(12)?,
    })
}

// ==========================================
// PostInspectionRepository - 维修后检验仓储
// ==========================================
pub struct PostInspectionRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PostInspectionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, report: &PostInspectionReport) -> RepositoryResult<()> {
        let (approved_by, approval_date, approval_notes) = approval_columns(&report.approval);
        let test_drive = report.test_drive.as_ref().map(to_json).transpose()?;
        self.conn.execute(
            r#"
            INSERT INTO post_inspection_reports (
                report_id, vehicle_id, pre_inspection_id, inspected_by, inspection_date, odometer_km,
                ratings_json, satisfaction_json, test_drive_json, findings, photo_paths_json,
                approved_by, approval_date, approval_notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                report.report_id,
                report.vehicle_id,
                report.pre_inspection_id,
                report.inspected_by,
                report.inspection_date,
                report.odometer_km,
                to_json(&report.ratings)?,
                to_json(&report.satisfaction)?,
                test_drive,
                report.findings,
                to_json(&report.photo_paths)?,
                approved_by,
                approval_date,
                approval_notes,
                report.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, report_id: &str) -> RepositoryResult<Option<PostInspectionReport>> {
        let sql = format!(
            "SELECT {} FROM post_inspection_reports WHERE report_id = ?1",
            POST_COLUMNS
        );
        let report = self
            .conn
            .query_row(&sql, params![report_id], map_post)
            .optional()?;
        Ok(report)
    }

    pub fn set_approval(&self, report_id: &str, approval: &ApprovalState) -> RepositoryResult<usize> {
        let (approved_by, approval_date, approval_notes) = approval_columns(approval);
        let rows = self.conn.execute(
            r#"
            UPDATE post_inspection_reports
            SET approved_by = ?2, approval_date = ?3, approval_notes = ?4
            WHERE report_id = ?1
            "#,
            params![report_id, approved_by, approval_date, approval_notes],
        )?;
        Ok(rows)
    }

    pub fn list_by_vehicle(&self, vehicle_id: &str) -> RepositoryResult<Vec<PostInspectionReport>> {
        let sql = format!(
            "SELECT {} FROM post_inspection_reports WHERE vehicle_id = ?1 ORDER BY inspection_date DESC",
            POST_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![vehicle_id], map_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reports)
    }

    /// 可选用的维修后检验: 同车辆、已审批、未被引用
    pub fn list_available(&self, vehicle_id: &str) -> RepositoryResult<Vec<PostInspectionReport>> {
        let sql = format!(
            r#"
            SELECT {} FROM post_inspection_reports p
            WHERE p.vehicle_id = ?1
              AND p.approved_by IS NOT NULL
              AND NOT EXISTS (SELECT 1 FROM repairs r WHERE r.post_inspection_id = p.report_id)
              AND NOT EXISTS (SELECT 1 FROM pms_records m WHERE m.post_inspection_id = p.report_id)
            ORDER BY p.inspection_date DESC
            "#,
            POST_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let reports = stmt
            .query_map(params![vehicle_id], map_post)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(reports)
    }
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostInspectionReport> {
    Ok(PostInspectionReport {
        report_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        pre_inspection_id: row.get(2)?,
        inspected_by: row.get(3)?,
        inspection_date: row.get(4)?,
        odometer_km: row.get(5)?,
        ratings: get_json(row, 6)?,
        satisfaction: get_json(row, 7)?,
        test_drive: get_opt_json(row, 8)?,
        findings: row.get(9)?,
        photo_paths: get_json(row, 10)?,
        approval: read_approval(row, 11)?,
        created_at: row.get(14)?,
    })
}

// ==========================================
// InspectionUsageRepository - 报告占用查询
// ==========================================
// 单次使用约束的数据来源: 哪些维修/保养单引用了某份报告
pub struct InspectionUsageRepository<'c> {
    conn: &'c Connection,
}

impl<'c> InspectionUsageRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 引用了该维修前检验的单据
    pub fn consumers_of_pre(&self, report_id: &str) -> RepositoryResult<Vec<RecordRef>> {
        self.consumers(
            r#"
            SELECT 'REPAIR', repair_id FROM repairs WHERE pre_inspection_id = ?1
            UNION ALL
            SELECT 'PMS', pms_id FROM pms_records WHERE pre_inspection_id = ?1
            "#,
            report_id,
        )
    }

    /// 引用了该维修后检验的单据
    pub fn consumers_of_post(&self, report_id: &str) -> RepositoryResult<Vec<RecordRef>> {
        self.consumers(
            r#"
            SELECT 'REPAIR', repair_id FROM repairs WHERE post_inspection_id = ?1
            UNION ALL
            SELECT 'PMS', pms_id FROM pms_records WHERE post_inspection_id = ?1
            "#,
            report_id,
        )
    }

    fn consumers(&self, sql: &str, report_id: &str) -> RepositoryResult<Vec<RecordRef>> {
        let mut stmt = self.conn.prepare(sql)?;
        let refs = stmt
            .query_map(params![report_id], |row| {
                let kind: String = row.get(0)?;
                let id: String = row.get(1)?;
                Ok(if kind == "PMS" {
                    RecordRef::Pms(id)
                } else {
                    RecordRef::Repair(id)
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(refs)
    }
}
