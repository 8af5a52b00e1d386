// ==========================================
// 车队维修管理系统 - 维修单数据仓储
// ==========================================
// 对齐: repairs 表 / repair_part_items 表
// 配对关系: repairs.source_pms_id（唯一）
// ==========================================

use crate::domain::types::RepairStatus;
use crate::domain::work_order::{Repair, RepairOrigin, RepairPartItem};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::row_mapping::{get_decimal, get_enum};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

/// 金额累加，溢出时返回 FieldValueError
fn checked_sum(field: &str, amounts: impl IntoIterator<Item = Decimal>) -> RepositoryResult<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, |total, amount| {
        total
            .checked_add(amount)
            .ok_or_else(|| RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("金额合计溢出: {} + {}", total, amount),
            })
    })
}

const REPAIR_COLUMNS: &str = r#"
    repair_id, vehicle_id, pre_inspection_id, post_inspection_id, source_pms_id, shop_id,
    description, status, parts_cost, labor_cost, odometer_km, started_at, completed_at,
    created_by, created_at, updated_at
"#;

// ==========================================
// RepairRepository - 维修单仓储
// ==========================================
pub struct RepairRepository<'c> {
    conn: &'c Connection,
}

impl<'c> RepairRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, repair: &Repair) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO repairs (
                repair_id, vehicle_id, pre_inspection_id, post_inspection_id, source_pms_id, shop_id,
                description, status, parts_cost, labor_cost, odometer_km, started_at, completed_at,
                created_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
            params![
                repair.repair_id,
                repair.vehicle_id,
                repair.pre_inspection_id,
                repair.post_inspection_id,
                repair.origin.source_pms_id(),
                repair.shop_id,
                repair.description,
                repair.status.to_db_str(),
                repair.parts_cost.to_string(),
                repair.labor_cost.to_string(),
                repair.odometer_km,
                repair.started_at,
                repair.completed_at,
                repair.created_by,
                repair.created_at,
                repair.updated_at,
            ],
        )?;
        Ok(())
    }

    /// 整行更新（来源 / 创建信息不变）
    pub fn update(&self, repair: &Repair) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            r#"
            UPDATE repairs
            SET pre_inspection_id = ?2,
                post_inspection_id = ?3,
                shop_id = ?4,
                description = ?5,
                status = ?6,
                parts_cost = ?7,
                labor_cost = ?8,
                odometer_km = ?9,
                completed_at = ?10,
                updated_at = ?11
            WHERE repair_id = ?1
            "#,
            params![
                repair.repair_id,
                repair.pre_inspection_id,
                repair.post_inspection_id,
                repair.shop_id,
                repair.description,
                repair.status.to_db_str(),
                repair.parts_cost.to_string(),
                repair.labor_cost.to_string(),
                repair.odometer_km,
                repair.completed_at,
                repair.updated_at,
            ],
        )?;
        Ok(rows)
    }

    /// 仅更新配件费（由配件明细汇总）
    pub fn update_parts_cost(
        &self,
        repair_id: &str,
        parts_cost: Decimal,
        updated_at: chrono::NaiveDateTime,
    ) -> RepositoryResult<usize> {
        let rows = self.conn.execute(
            "UPDATE repairs SET parts_cost = ?2, updated_at = ?3 WHERE repair_id = ?1",
            params![repair_id, parts_cost.to_string(), updated_at],
        )?;
        Ok(rows)
    }

    pub fn delete(&self, repair_id: &str) -> RepositoryResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM repairs WHERE repair_id = ?1", params![repair_id])?;
        Ok(rows)
    }

    pub fn find_by_id(&self, repair_id: &str) -> RepositoryResult<Option<Repair>> {
        let sql = format!("SELECT {} FROM repairs WHERE repair_id = ?1", REPAIR_COLUMNS);
        let repair = self
            .conn
            .query_row(&sql, params![repair_id], map_repair)
            .optional()?;
        Ok(repair)
    }

    /// 车辆的全部维修单（按开始时间倒序）
    pub fn find_by_vehicle(&self, vehicle_id: &str) -> RepositoryResult<Vec<Repair>> {
        let sql = format!(
            "SELECT {} FROM repairs WHERE vehicle_id = ?1 ORDER BY started_at DESC",
            REPAIR_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let repairs = stmt
            .query_map(params![vehicle_id], map_repair)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(repairs)
    }

    /// 由保养单派生的维修单
    pub fn find_by_source_pms(&self, pms_id: &str) -> RepositoryResult<Option<Repair>> {
        let sql = format!("SELECT {} FROM repairs WHERE source_pms_id = ?1", REPAIR_COLUMNS);
        let repair = self
            .conn
            .query_row(&sql, params![pms_id], map_repair)
            .optional()?;
        Ok(repair)
    }

    /// 车辆进行中的维修单数量（可排除某一单）
    pub fn count_ongoing(&self, vehicle_id: &str, exclude_repair_id: Option<&str>) -> RepositoryResult<i64> {
        let count = self.conn.query_row(
            r#"
            SELECT COUNT(*) FROM repairs
            WHERE vehicle_id = ?1 AND status = 'ONGOING'
              AND (?2 IS NULL OR repair_id <> ?2)
            "#,
            params![vehicle_id, exclude_repair_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// 车辆已完成维修的费用合计（配件费 + 工时费）
    ///
    /// 金额以文本存储，在 Rust 侧用 Decimal 精确求和
    pub fn completed_cost_total(&self, vehicle_id: &str) -> RepositoryResult<Decimal> {
        let mut stmt = self.conn.prepare(
            "SELECT parts_cost, labor_cost FROM repairs WHERE vehicle_id = ?1 AND status = 'COMPLETED'",
        )?;
        let costs = stmt
            .query_map(params![vehicle_id], |row| Ok((get_decimal(row, 0)?, get_decimal(row, 1)?)))?
            .collect::<rusqlite::Result<Vec<(Decimal, Decimal)>>>()?;
        checked_sum(
            "repairs.total_cost",
            costs.into_iter().flat_map(|(parts, labor)| [parts, labor]),
        )
    }
}

fn map_repair(row: &Row<'_>) -> rusqlite::Result<Repair> {
    let source_pms_id: Option<String> = row.get(4)?;
    let origin = match source_pms_id {
        Some(pms_id) => RepairOrigin::FromPms { pms_id },
        None => RepairOrigin::Standalone,
    };

    Ok(Repair {
        repair_id: row.get(0)?,
        vehicle_id: row.get(1)?,
        pre_inspection_id: row.get(2)?,
        post_inspection_id: row.get(3)?,
        origin,
        shop_id: row.get(5)?,
        description: row.get(6)?,
        status: get_enum(row, 7, RepairStatus::from_db_str)?,
        parts_cost: get_decimal(row, 8)?,
        labor_cost: get_decimal(row, 9)?,
        odometer_km: row.get(10)?,
        started_at: row.get(11)?,
        completed_at: row.get(12)?,
        created_by: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

// ==========================================
// PartItemRepository - 配件明细仓储
// ==========================================
pub struct PartItemRepository<'c> {
    conn: &'c Connection,
}

impl<'c> PartItemRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, item: &RepairPartItem) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO repair_part_items (
                item_id, repair_id, part_name, part_number, quantity, unit, cost, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                item.item_id,
                item.repair_id,
                item.part_name,
                item.part_number,
                item.quantity.to_string(),
                item.unit,
                item.cost.to_string(),
                item.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, item_id: &str) -> RepositoryResult<usize> {
        let rows = self
            .conn
            .execute("DELETE FROM repair_part_items WHERE item_id = ?1", params![item_id])?;
        Ok(rows)
    }

    pub fn find_by_id(&self, item_id: &str) -> RepositoryResult<Option<RepairPartItem>> {
        let item = self
            .conn
            .query_row(
                r#"
                SELECT item_id, repair_id, part_name, part_number, quantity, unit, cost, created_at
                FROM repair_part_items WHERE item_id = ?1
                "#,
                params![item_id],
                map_part_item,
            )
            .optional()?;
        Ok(item)
    }

    pub fn find_by_repair(&self, repair_id: &str) -> RepositoryResult<Vec<RepairPartItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT item_id, repair_id, part_name, part_number, quantity, unit, cost, created_at
            FROM repair_part_items WHERE repair_id = ?1
            ORDER BY created_at ASC, item_id ASC
            "#,
        )?;
        let items = stmt
            .query_map(params![repair_id], map_part_item)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(items)
    }

    /// 明细费用合计（无明细时为 0）
    pub fn sum_cost(&self, repair_id: &str) -> RepositoryResult<Decimal> {
        checked_sum(
            "repair_part_items.cost",
            self.find_by_repair(repair_id)?.into_iter().map(|item| item.cost),
        )
    }

    pub fn count_by_repair(&self, repair_id: &str) -> RepositoryResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM repair_part_items WHERE repair_id = ?1",
            params![repair_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn map_part_item(row: &Row<'_>) -> rusqlite::Result<RepairPartItem> {
    Ok(RepairPartItem {
        item_id: row.get(0)?,
        repair_id: row.get(1)?,
        part_name: row.get(2)?,
        part_number: row.get(3)?,
        quantity: get_decimal(row, 4)?,
        unit: row.get(5)?,
        cost: get_decimal(row, 6)?,
        created_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_sum_reports_overflow_instead_of_panicking() {
        assert_eq!(
            checked_sum("cost", [Decimal::new(150, 2), Decimal::new(250, 2)]).unwrap(),
            Decimal::new(4, 0)
        );
        assert_eq!(checked_sum("cost", Vec::new()).unwrap(), Decimal::ZERO);

        let err = checked_sum("repairs.total_cost", [Decimal::MAX, Decimal::ONE]).unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::FieldValueError { ref field, .. } if field == "repairs.total_cost"
        ));
    }
}
