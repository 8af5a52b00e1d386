// ==========================================
// 车队维修管理系统 - 维修单 / 保养单领域模型
// ==========================================
// Repair: 维修单（费用 = 配件费 + 工时费）
// Pms:    预防性保养单
// PMS 过程中更换配件时会派生一张维修单，两者构成同一次维修事件，
// 配对关系由 RepairOrigin::FromPms 显式表达
// ==========================================

use crate::domain::types::{PmsStatus, RepairStatus};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RecordRef - 维修/保养单引用
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecordRef {
    Repair(String),
    Pms(String),
}

impl RecordRef {
    pub fn id(&self) -> &str {
        match self {
            RecordRef::Repair(id) | RecordRef::Pms(id) => id,
        }
    }

    /// i18n 名称键
    pub fn label_key(&self) -> &'static str {
        match self {
            RecordRef::Repair(_) => "record.repair",
            RecordRef::Pms(_) => "record.pms",
        }
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Repair(id) => write!(f, "repair:{}", id),
            RecordRef::Pms(id) => write!(f, "pms:{}", id),
        }
    }
}

// ==========================================
// Trait: MaintenanceRecord
// ==========================================
// 用途: 保存流水线对维修单与保养单的统一视图
pub trait MaintenanceRecord {
    fn record_ref(&self) -> RecordRef;
    fn vehicle_id(&self) -> &str;
    fn pre_inspection_id(&self) -> Option<&str>;
    fn post_inspection_id(&self) -> Option<&str>;

    /// 是否处于已完成状态
    fn is_completed(&self) -> bool;

    /// 是否处于作业中（维修进行中 / 保养进行中）
    fn is_active(&self) -> bool;

    /// 配对的另一方（保养单 ↔ 派生维修单）
    fn counterpart(&self) -> Option<RecordRef>;
}

// ==========================================
// RepairOrigin - 维修单来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum RepairOrigin {
    #[default]
    Standalone,
    FromPms { pms_id: String },
}

impl RepairOrigin {
    pub fn source_pms_id(&self) -> Option<&str> {
        match self {
            RepairOrigin::FromPms { pms_id } => Some(pms_id),
            RepairOrigin::Standalone => None,
        }
    }
}

// ==========================================
// Repair - 维修单
// ==========================================
// 对齐: repairs 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repair {
    pub repair_id: String,
    pub vehicle_id: String,
    pub pre_inspection_id: Option<String>,
    pub post_inspection_id: Option<String>,
    pub origin: RepairOrigin,
    pub shop_id: Option<String>,
    pub description: String,
    pub status: RepairStatus,

    // ===== 费用 =====
    pub parts_cost: Decimal, // 有配件明细时 = Σ 明细费用
    pub labor_cost: Decimal,

    pub odometer_km: Option<i64>,
    pub started_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Repair {
    /// 维修总费用
    ///
    /// 单项金额受上限约束，合计正常情况下不会溢出；超界时封顶而非 panic
    pub fn total_cost(&self) -> Decimal {
        self.parts_cost.saturating_add(self.labor_cost)
    }
}

impl MaintenanceRecord for Repair {
    fn record_ref(&self) -> RecordRef {
        RecordRef::Repair(self.repair_id.clone())
    }

    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    fn pre_inspection_id(&self) -> Option<&str> {
        self.pre_inspection_id.as_deref()
    }

    fn post_inspection_id(&self) -> Option<&str> {
        self.post_inspection_id.as_deref()
    }

    fn is_completed(&self) -> bool {
        self.status == RepairStatus::Completed
    }

    fn is_active(&self) -> bool {
        self.status == RepairStatus::Ongoing
    }

    fn counterpart(&self) -> Option<RecordRef> {
        self.origin
            .source_pms_id()
            .map(|id| RecordRef::Pms(id.to_string()))
    }
}

/// 新建维修单参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairDraft {
    pub vehicle_id: String,
    pub pre_inspection_id: Option<String>,
    pub post_inspection_id: Option<String>,
    pub shop_id: Option<String>,
    pub description: String,
    pub status: RepairStatus,
    pub parts_cost: Decimal,
    pub labor_cost: Decimal,
    pub odometer_km: Option<i64>,
}

/// 由保养单派生维修单的参数（车辆与检验报告沿用保养单）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PmsRepairDraft {
    pub shop_id: Option<String>,
    pub description: String,
    pub status: RepairStatus,
    pub parts_cost: Decimal,
    pub labor_cost: Decimal,
}

/// 维修单更新参数（None = 不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairUpdate {
    pub description: Option<String>,
    pub status: Option<RepairStatus>,
    pub pre_inspection_id: Option<String>,
    pub post_inspection_id: Option<String>,
    pub shop_id: Option<String>,
    pub parts_cost: Option<Decimal>,
    pub labor_cost: Option<Decimal>,
    pub odometer_km: Option<i64>,
}

impl RepairUpdate {
    /// 将更新应用到维修单（不处理时间戳与状态合法性）
    pub fn apply_to(&self, repair: &mut Repair) {
        if let Some(description) = &self.description {
            repair.description = description.clone();
        }
        if let Some(status) = self.status {
            repair.status = status;
        }
        if let Some(pre) = &self.pre_inspection_id {
            repair.pre_inspection_id = Some(pre.clone());
        }
        if let Some(post) = &self.post_inspection_id {
            repair.post_inspection_id = Some(post.clone());
        }
        if let Some(shop) = &self.shop_id {
            repair.shop_id = Some(shop.clone());
        }
        if let Some(parts) = self.parts_cost {
            repair.parts_cost = parts;
        }
        if let Some(labor) = self.labor_cost {
            repair.labor_cost = labor;
        }
        if let Some(km) = self.odometer_km {
            repair.odometer_km = Some(km);
        }
    }
}

// ==========================================
// RepairPartItem - 维修配件明细
// ==========================================
// 对齐: repair_part_items 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairPartItem {
    pub item_id: String,
    pub repair_id: String,
    pub part_name: String,
    pub part_number: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub cost: Decimal, // 行费用
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartItem {
    pub part_name: String,
    pub part_number: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub cost: Decimal,
}

// ==========================================
// Pms - 预防性保养单
// ==========================================
// 对齐: pms_records 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pms {
    pub pms_id: String,
    pub vehicle_id: String,
    pub pre_inspection_id: Option<String>,
    pub post_inspection_id: Option<String>,
    pub service_type: String,
    pub description: Option<String>,
    pub status: PmsStatus,
    pub scheduled_date: NaiveDate,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub odometer_km: Option<i64>,
    pub next_due_date: Option<NaiveDate>,
    /// 派生维修单（只读，来自 repairs.source_pms_id）
    pub generated_repair_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl MaintenanceRecord for Pms {
    fn record_ref(&self) -> RecordRef {
        RecordRef::Pms(self.pms_id.clone())
    }

    fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    fn pre_inspection_id(&self) -> Option<&str> {
        self.pre_inspection_id.as_deref()
    }

    fn post_inspection_id(&self) -> Option<&str> {
        self.post_inspection_id.as_deref()
    }

    fn is_completed(&self) -> bool {
        self.status == PmsStatus::Completed
    }

    fn is_active(&self) -> bool {
        self.status == PmsStatus::InProgress
    }

    fn counterpart(&self) -> Option<RecordRef> {
        self.generated_repair_id
            .as_ref()
            .map(|id| RecordRef::Repair(id.clone()))
    }
}

/// 新建保养单参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PmsDraft {
    pub vehicle_id: String,
    pub pre_inspection_id: Option<String>,
    pub service_type: String,
    pub description: Option<String>,
    pub status: PmsStatus,
    pub scheduled_date: NaiveDate,
    pub odometer_km: Option<i64>,
    pub next_due_date: Option<NaiveDate>,
}

/// 保养单更新参数（None = 不修改）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PmsUpdate {
    pub status: Option<PmsStatus>,
    pub pre_inspection_id: Option<String>,
    pub post_inspection_id: Option<String>,
    pub description: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub odometer_km: Option<i64>,
    pub next_due_date: Option<NaiveDate>,
}

impl PmsUpdate {
    pub fn apply_to(&self, pms: &mut Pms) {
        if let Some(status) = self.status {
            pms.status = status;
        }
        if let Some(pre) = &self.pre_inspection_id {
            pms.pre_inspection_id = Some(pre.clone());
        }
        if let Some(post) = &self.post_inspection_id {
            pms.post_inspection_id = Some(post.clone());
        }
        if let Some(description) = &self.description {
            pms.description = Some(description.clone());
        }
        if let Some(date) = self.scheduled_date {
            pms.scheduled_date = date;
        }
        if let Some(km) = self.odometer_km {
            pms.odometer_km = Some(km);
        }
        if let Some(date) = self.next_due_date {
            pms.next_due_date = Some(date);
        }
    }
}
