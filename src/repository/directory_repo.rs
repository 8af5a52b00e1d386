// ==========================================
// 车队维修管理系统 - 基础资料仓储
// ==========================================
// 维修厂 (repair_shops) / 驾驶员 (drivers)
// ==========================================

use crate::domain::driver::Driver;
use crate::domain::shop::RepairShop;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension, Row};

// ==========================================
// ShopRepository - 维修厂仓储
// ==========================================
pub struct ShopRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ShopRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, shop: &RepairShop) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO repair_shops (shop_id, name, address, contact_no, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                shop.shop_id,
                shop.name,
                shop.address,
                shop.contact_no,
                shop.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, shop_id: &str) -> RepositoryResult<Option<RepairShop>> {
        let shop = self
            .conn
            .query_row(
                "SELECT shop_id, name, address, contact_no, created_at FROM repair_shops WHERE shop_id = ?1",
                params![shop_id],
                map_shop,
            )
            .optional()?;
        Ok(shop)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<RepairShop>> {
        let mut stmt = self.conn.prepare(
            "SELECT shop_id, name, address, contact_no, created_at FROM repair_shops ORDER BY name ASC",
        )?;
        let shops = stmt
            .query_map([], map_shop)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(shops)
    }
}

fn map_shop(row: &Row<'_>) -> rusqlite::Result<RepairShop> {
    Ok(RepairShop {
        shop_id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        contact_no: row.get(3)?,
        created_at: row.get(4)?,
    })
}

// ==========================================
// DriverRepository - 驾驶员仓储
// ==========================================
pub struct DriverRepository<'c> {
    conn: &'c Connection,
}

impl<'c> DriverRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, driver: &Driver) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO drivers (driver_id, full_name, license_no, contact_no, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                driver.driver_id,
                driver.full_name,
                driver.license_no,
                driver.contact_no,
                driver.created_at,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, driver_id: &str) -> RepositoryResult<Option<Driver>> {
        let driver = self
            .conn
            .query_row(
                "SELECT driver_id, full_name, license_no, contact_no, created_at FROM drivers WHERE driver_id = ?1",
                params![driver_id],
                map_driver,
            )
            .optional()?;
        Ok(driver)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Driver>> {
        let mut stmt = self.conn.prepare(
            "SELECT driver_id, full_name, license_no, contact_no, created_at FROM drivers ORDER BY full_name ASC",
        )?;
        let drivers = stmt
            .query_map([], map_driver)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(drivers)
    }
}

fn map_driver(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        driver_id: row.get(0)?,
        full_name: row.get(1)?,
        license_no: row.get(2)?,
        contact_no: row.get(3)?,
        created_at: row.get(4)?,
    })
}
