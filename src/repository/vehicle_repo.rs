// ==========================================
// 车队维修管理系统 - 车辆数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑，只负责数据访问
// 仓储借用调用方的连接（通常是引擎开启的事务），
// 保证“读取-校验-写入”处于同一事务内
// ==========================================

use crate::domain::types::VehicleStatus;
use crate::domain::vehicle::{StatusAudit, Vehicle};
use crate::repository::error::RepositoryResult;
use crate::repository::row_mapping::{get_enum, get_opt_decimal};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

const VEHICLE_COLUMNS: &str = r#"
    vehicle_id, plate_number, vehicle_type, make_model, status,
    status_changed_at, status_changed_by, status_change_reason,
    acquisition_cost, current_market_value, mileage_km, assigned_driver_id,
    created_at, updated_at
"#;

// ==========================================
// VehicleRepository - 车辆仓储
// ==========================================
pub struct VehicleRepository<'c> {
    conn: &'c Connection,
}

impl<'c> VehicleRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 登记车辆
    pub fn insert(&self, vehicle: &Vehicle) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO vehicles (
                vehicle_id, plate_number, vehicle_type, make_model, status,
                status_changed_at, status_changed_by, status_change_reason,
                acquisition_cost, current_market_value, mileage_km, assigned_driver_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                vehicle.vehicle_id,
                vehicle.plate_number,
                vehicle.vehicle_type,
                vehicle.make_model,
                vehicle.status.to_db_str(),
                vehicle.status_audit.as_ref().map(|a| a.changed_at),
                vehicle.status_audit.as_ref().and_then(|a| a.changed_by.clone()),
                vehicle.status_audit.as_ref().map(|a| a.reason.clone()),
                vehicle.acquisition_cost.map(|d| d.to_string()),
                vehicle.current_market_value.map(|d| d.to_string()),
                vehicle.mileage_km,
                vehicle.assigned_driver_id,
                vehicle.created_at,
                vehicle.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 按主键查询
    pub fn find_by_id(&self, vehicle_id: &str) -> RepositoryResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles WHERE vehicle_id = ?1", VEHICLE_COLUMNS);
        let vehicle = self
            .conn
            .query_row(&sql, params![vehicle_id], map_vehicle)
            .optional()?;
        Ok(vehicle)
    }

    /// 按车牌号查询
    pub fn find_by_plate(&self, plate_number: &str) -> RepositoryResult<Option<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles WHERE plate_number = ?1", VEHICLE_COLUMNS);
        let vehicle = self
            .conn
            .query_row(&sql, params![plate_number], map_vehicle)
            .optional()?;
        Ok(vehicle)
    }

    /// 查询全部车辆（按车牌排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Vehicle>> {
        let sql = format!("SELECT {} FROM vehicles ORDER BY plate_number ASC", VEHICLE_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let vehicles = stmt
            .query_map([], map_vehicle)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    /// 按状态查询
    pub fn list_by_status(&self, status: VehicleStatus) -> RepositoryResult<Vec<Vehicle>> {
        let sql = format!(
            "SELECT {} FROM vehicles WHERE status = ?1 ORDER BY plate_number ASC",
            VEHICLE_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let vehicles = stmt
            .query_map(params![status.to_db_str()], map_vehicle)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(vehicles)
    }

    /// 更新状态及审计列
    pub fn update_status(
        &self,
        vehicle_id: &str,
        status: VehicleStatus,
        audit: &StatusAudit,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            r#"
            UPDATE vehicles
            SET status = ?2,
                status_changed_at = ?3,
                status_changed_by = ?4,
                status_change_reason = ?5,
                updated_at = ?3
            WHERE vehicle_id = ?1
            "#,
            params![
                vehicle_id,
                status.to_db_str(),
                audit.changed_at,
                audit.changed_by,
                audit.reason,
            ],
        )?;
        Ok(rows)
    }

    /// 更新当前市值
    pub fn update_market_value(
        &self,
        vehicle_id: &str,
        market_value: Option<Decimal>,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE vehicles SET current_market_value = ?2, updated_at = ?3 WHERE vehicle_id = ?1",
            params![vehicle_id, market_value.map(|d| d.to_string()), updated_at],
        )?;
        Ok(rows)
    }

    /// 里程只增不减
    pub fn raise_mileage(
        &self,
        vehicle_id: &str,
        odometer_km: i64,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            r#"
            UPDATE vehicles SET mileage_km = ?2, updated_at = ?3
            WHERE vehicle_id = ?1 AND mileage_km < ?2
            "#,
            params![vehicle_id, odometer_km, updated_at],
        )?;
        Ok(rows)
    }

    /// 指派驾驶员（None = 取消指派）
    pub fn assign_driver(
        &self,
        vehicle_id: &str,
        driver_id: Option<&str>,
        updated_at: NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE vehicles SET assigned_driver_id = ?2, updated_at = ?3 WHERE vehicle_id = ?1",
            params![vehicle_id, driver_id, updated_at],
        )?;
        Ok(rows)
    }
}

fn map_vehicle(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    let status_changed_at: Option<NaiveDateTime> = row.get(5)?;
    let status_audit = match status_changed_at {
        Some(changed_at) => Some(StatusAudit {
            changed_at,
            changed_by: row.get(6)?,
            reason: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
        }),
        None => None,
    };

    Ok(Vehicle {
        vehicle_id: row.get(0)?,
        plate_number: row.get(1)?,
        vehicle_type: row.get(2)?,
        make_model: row.get(3)?,
        status: get_enum(row, 4, VehicleStatus::from_db_str)?,
        status_audit,
        acquisition_cost: get_opt_decimal(row, 8)?,
        current_market_value: get_opt_decimal(row, 9)?,
        mileage_km: row.get(10)?,
        assigned_driver_id: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use chrono::Utc;

    fn make_vehicle(id: &str, plate: &str) -> Vehicle {
        let now = Utc::now().naive_utc();
        Vehicle {
            vehicle_id: id.to_string(),
            plate_number: plate.to_string(),
            vehicle_type: "Truck".to_string(),
            make_model: Some("Isuzu NPR".to_string()),
            mileage_km: 12_000,
            assigned_driver_id: None,
            status: VehicleStatus::Serviceable,
            status_audit: None,
            acquisition_cost: Some(Decimal::from(1_500_000)),
            current_market_value: Some(Decimal::new(99_999_950, 2)),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let conn = open_in_memory().unwrap();
        let repo = VehicleRepository::new(&conn);

        repo.insert(&make_vehicle("v1", "ABC-1234")).unwrap();

        let found = repo.find_by_plate("ABC-1234").unwrap().unwrap();
        assert_eq!(found.vehicle_id, "v1");
        assert_eq!(found.current_market_value, Some(Decimal::new(99_999_950, 2)));
        assert_eq!(found.status, VehicleStatus::Serviceable);
        assert!(repo.find_by_id("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_plate_is_rejected() {
        let conn = open_in_memory().unwrap();
        let repo = VehicleRepository::new(&conn);

        repo.insert(&make_vehicle("v1", "ABC-1234")).unwrap();
        let err = repo.insert(&make_vehicle("v2", "ABC-1234")).unwrap_err();
        assert!(matches!(
            err,
            crate::repository::RepositoryError::UniqueConstraintViolation(_)
        ));
    }

    #[test]
    fn test_update_status_writes_audit() {
        let conn = open_in_memory().unwrap();
        let repo = VehicleRepository::new(&conn);
        repo.insert(&make_vehicle("v1", "ABC-1234")).unwrap();

        let audit = StatusAudit {
            changed_at: Utc::now().naive_utc(),
            changed_by: None,
            reason: "auto".to_string(),
        };
        repo.update_status("v1", VehicleStatus::UnderRepair, &audit).unwrap();

        let found = repo.find_by_id("v1").unwrap().unwrap();
        assert_eq!(found.status, VehicleStatus::UnderRepair);
        let saved = found.status_audit.unwrap();
        assert_eq!(saved.changed_by, None);
        assert_eq!(saved.reason, "auto");
    }

    #[test]
    fn test_mileage_never_decreases() {
        let conn = open_in_memory().unwrap();
        let repo = VehicleRepository::new(&conn);
        repo.insert(&make_vehicle("v1", "ABC-1234")).unwrap();
        let now = Utc::now().naive_utc();

        assert_eq!(repo.raise_mileage("v1", 10_000, now).unwrap(), 0);
        assert_eq!(repo.raise_mileage("v1", 15_000, now).unwrap(), 1);
        assert_eq!(repo.find_by_id("v1").unwrap().unwrap().mileage_km, 15_000);
    }
}
