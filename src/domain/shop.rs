// ==========================================
// 车队维修管理系统 - 维修厂领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// RepairShop - 维修厂
// ==========================================
// 对齐: repair_shops 表（name 唯一）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairShop {
    pub shop_id: String,
    pub name: String,
    pub address: Option<String>,
    pub contact_no: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRepairShop {
    pub name: String,
    pub address: Option<String>,
    pub contact_no: Option<String>,
}
