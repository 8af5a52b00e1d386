// ==========================================
// 车队维修管理系统 - 驾驶员领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// Driver - 驾驶员
// ==========================================
// 对齐: drivers 表（license_no 唯一）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: String,
    pub full_name: String,
    pub license_no: String,
    pub contact_no: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDriver {
    pub full_name: String,
    pub license_no: String,
    pub contact_no: Option<String>,
}
