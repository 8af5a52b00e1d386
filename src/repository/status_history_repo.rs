// ==========================================
// 车队维修管理系统 - 车辆状态历史仓储
// ==========================================
// 红线: 每一次状态变更都必须留痕（自动 / 手工）
// ==========================================

use crate::domain::types::VehicleStatus;
use crate::domain::vehicle::VehicleStatusChange;
use crate::repository::error::RepositoryResult;
use crate::repository::row_mapping::get_enum;
use rusqlite::{params, Connection, Row};

pub struct StatusHistoryRepository<'c> {
    conn: &'c Connection,
}

impl<'c> StatusHistoryRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 插入状态变更记录
    ///
    /// # 返回
    /// - `Ok(history_id)`
    pub fn insert(&self, change: &VehicleStatusChange) -> RepositoryResult<String> {
        self.conn.execute(
            r#"
            INSERT INTO vehicle_status_history (
                history_id, vehicle_id, from_status, to_status, changed_by, reason, changed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                change.history_id,
                change.vehicle_id,
                change.from_status.to_db_str(),
                change.to_status.to_db_str(),
                change.changed_by,
                change.reason,
                change.changed_at,
            ],
        )?;
        Ok(change.history_id.clone())
    }

    /// 车辆的状态历史（最新在前）
    pub fn find_by_vehicle(&self, vehicle_id: &str) -> RepositoryResult<Vec<VehicleStatusChange>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT history_id, vehicle_id, from_status, to_status, changed_by, reason, changed_at
            FROM vehicle_status_history
            WHERE vehicle_id = ?1
            ORDER BY changed_at DESC, rowid DESC
            "#,
        )?;
        let changes = stmt
            .query_map(params![vehicle_id], map_change)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(changes)
    }
}

fn map_change(row: &Row<'_>) -> rusqlite::Result<VehicleStatusChange> {
    Ok(VehicleStatusChange {
        history_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        from_status: get_enum(row, 2, VehicleStatus::from_db_str)?,
        to_status: get_enum(row, 3, VehicleStatus::from_db_str)?,
        changed_by: row.get(4)?,
        reason: row.get(5)?,
        changed_at: row.get(6)?,
    })
}
