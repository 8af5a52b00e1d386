// ==========================================
// 车队维修管理系统 - 保养单数据仓储
// ==========================================
// 对齐: pms_records 表
// generated_repair_id 不落库，查询时由 repairs.source_pms_id 反查
// ==========================================

use crate::domain::types::PmsStatus;
use crate::domain::work_order::Pms;
use crate::repository::error::RepositoryResult;
use crate::repository::row_mapping::get_enum;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension, Row};

const PMS_SELECT: &str = r#"
    SELECT m.pms_id, m.vehicle_id, m.pre_inspection_id, m.post_inspection_id,
           m.service_type, m.description, m.status, m.scheduled_date,
           m.started_at, m.completed_at, m.odometer_km, m.next_due_date,
           r.repair_id, m.created_by, m.created_at, m.updated_at
    FROM pms_records m
    LEFT JOIN repairs r ON r.source_pms_id = m.pms_id
"#;

// ==========================================
// PmsRepository - 保养单仓储
// ==========================================
pub struct PmsRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PmsRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, pms: &Pms) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pms_records (
                pms_id, vehicle_id, pre_inspection_id, post_inspection_id, service_type,
                description, status, scheduled_date, started_at, completed_at, odometer_km,
                next_due_date, created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                pms.pms_id,
                pms.vehicle_id,
                pms.pre_inspection_id,
                pms.post_inspection_id,
                pms.service_type,
                pms.description,
                pms.status.to_db_str(),
                pms.scheduled_date,
                pms.started_at,
                pms.completed_at,
                pms.odometer_km,
                pms.next_due_date,
                pms.created_by,
                pms.created_at,
                pms.updated_at,
            ],
        )?;
        Ok(())
    }

    pub fn update(&self, pms: &Pms) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            r#"
            UPDATE pms_records
            SET pre_inspection_id = ?2,
                post_inspection_id = ?3,
                description = ?4,
                status = ?5,
                scheduled_date = ?6,
                started_at = ?7,
                completed_at = ?8,
                odometer_km = ?9,
                next_due_date = ?10,
                updated_at = ?11
            WHERE pms_id = ?1
            "#,
            params![
                pms.pms_id,
                pms.pre_inspection_id,
                pms.post_inspection_id,
                pms.description,
                pms.status.to_db_str(),
                pms.scheduled_date,
                pms.started_at,
                pms.completed_at,
                pms.odometer_km,
                pms.next_due_date,
                pms.updated_at,
            ],
        )?;
        Ok(rows)
    }

    /// 仅更新状态
    pub fn set_status(
        &self,
        pms_id: &str,
        status: PmsStatus,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE pms_records SET status = ?2, updated_at = ?3 WHERE pms_id = ?1",
            params![pms_id, status.to_db_str(), updated_at],
        )?;
        Ok(rows)
    }

    pub fn find_by_id(&self, pms_id: &str) -> RepositoryResult<Option<Pms>> {
        let sql = format!("{} WHERE m.pms_id = ?1", PMS_SELECT);
        let pms = self
            .conn
            .query_row(&sql, params![pms_id], map_pms)
            .optional()?;
        Ok(pms)
    }

    /// 车辆的全部保养单（按计划日期倒序）
    pub fn find_by_vehicle(&self, vehicle_id: &str) -> RepositoryResult<Vec<Pms>> {
        let sql = format!(
            "{} WHERE m.vehicle_id = ?1 ORDER BY m.scheduled_date DESC",
            PMS_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![vehicle_id], map_pms)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    /// 车辆进行中的保养单数量（可排除某一单）
    pub fn count_in_progress(&self, vehicle_id: &str, exclude_pms_id: Option<&str>) -> RepositoryResult<i64> {
        let count = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM pms_records
            WHERE vehicle_id = ?1 AND status = 'IN_PROGRESS'
              AND (?2 IS NULL OR pms_id <> ?2)
            "#,
            params![vehicle_id, exclude_pms_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 计划日期早于 cutoff 且仍为 Scheduled 的保养单
    pub fn find_scheduled_before(&self, cutoff: NaiveDate) -> RepositoryResult<Vec<Pms>> {
        let sql = format!(
            "{} WHERE m.status = 'SCHEDULED' AND m.scheduled_date < ?1 ORDER BY m.scheduled_date ASC",
            PMS_SELECT
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![cutoff], map_pms)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }
}

fn map_pms(row: &Row<'_>) -> rusqlite::Result<Pms> {
    Ok(Pms {
        pms_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        pre_inspection_id: row.get(2)?,
        post_inspection_id: row.get(3)?,
        service_type: row.get(4)?,
        description: row.get(5)?,
        status: get_enum(row, 6, PmsStatus::from_db_str)?,
        scheduled_date: row.get(7)?,
        started_at: row.get(8)?,
        completed_at: row.get(9)?,
        odometer_km: row.get(10)?,
        next_due_date: row.get(11)?,
        generated_repair_id: row.get(12)?,
        created_by: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}
