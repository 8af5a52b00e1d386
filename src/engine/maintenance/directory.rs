// ==========================================
// 基础资料操作: 维修厂 / 驾驶员
// ==========================================

use super::MaintenanceEngine;
use crate::domain::driver::{Driver, NewDriver};
use crate::domain::shop::{NewRepairShop, RepairShop};
use crate::engine::error::EngineResult;
use crate::repository::row_mapping::new_id;
use crate::repository::{DriverRepository, ShopRepository};
use chrono::Utc;

impl MaintenanceEngine {
    pub fn create_shop(&self, shop: NewRepairShop) -> EngineResult<RepairShop> {
        self.with_transaction(|tx, _| {
            let shop = RepairShop {
                shop_id: new_id(),
                name: shop.name.trim().to_string(),
                address: shop.address,
                contact_no: shop.contact_no,
                created_at: Utc::now().naive_utc(),
            };
            ShopRepository::new(tx).insert(&shop)?;
            tracing::info!("维修厂已登记: name={}, id={}", shop.name, shop.shop_id);
            Ok(shop)
        })
    }

    pub fn list_shops(&self) -> EngineResult<Vec<RepairShop>> {
        self.with_connection(|conn| Ok(ShopRepository::new(conn).list_all()?))
    }

    pub fn create_driver(&self, driver: NewDriver) -> EngineResult<Driver> {
        self.with_transaction(|tx, _| {
            let driver = Driver {
                driver_id: new_id(),
                full_name: driver.full_name.trim().to_string(),
                license_no: driver.license_no.trim().to_string(),
                contact_no: driver.contact_no,
                created_at: Utc::now().naive_utc(),
            };
            DriverRepository::new(tx).insert(&driver)?;
            tracing::info!("驾驶员已登记: name={}, id={}", driver.full_name, driver.driver_id);
            Ok(driver)
        })
    }

    pub fn list_drivers(&self) -> EngineResult<Vec<Driver>> {
        self.with_connection(|conn| Ok(DriverRepository::new(conn).list_all()?))
    }
}
