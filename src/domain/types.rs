// ==========================================
// 车队维修管理系统 - 领域类型定义
// ==========================================
// 状态枚举统一提供:
// - Display: 面向用户的名称
// - to_db_str / from_db_str: 数据库存储格式 (SCREAMING_SNAKE_CASE)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 车辆状态 (Vehicle Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    Serviceable,   // 可用
    UnderRepair,   // 维修中
    Unserviceable, // 不可用
    ForDisposal,   // 待报废
}

impl VehicleStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            VehicleStatus::Serviceable => "SERVICEABLE",
            VehicleStatus::UnderRepair => "UNDER_REPAIR",
            VehicleStatus::Unserviceable => "UNSERVICEABLE",
            VehicleStatus::ForDisposal => "FOR_DISPOSAL",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "SERVICEABLE" => Some(VehicleStatus::Serviceable),
            "UNDER_REPAIR" => Some(VehicleStatus::UnderRepair),
            "UNSERVICEABLE" => Some(VehicleStatus::Unserviceable),
            "FOR_DISPOSAL" => Some(VehicleStatus::ForDisposal),
            _ => None,
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleStatus::Serviceable => write!(f, "Serviceable"),
            VehicleStatus::UnderRepair => write!(f, "Under Repair"),
            VehicleStatus::Unserviceable => write!(f, "Unserviceable"),
            VehicleStatus::ForDisposal => write!(f, "For Disposal"),
        }
    }
}

// ==========================================
// 维修单状态 (Repair Status)
// ==========================================
// Completed 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepairStatus {
    #[default]
    Ongoing,   // 进行中
    Completed, // 已完成
}

impl RepairStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RepairStatus::Ongoing => "ONGOING",
            RepairStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "ONGOING" => Some(RepairStatus::Ongoing),
            "COMPLETED" => Some(RepairStatus::Completed),
            _ => None,
        }
    }
}

impl fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairStatus::Ongoing => write!(f, "Ongoing"),
            RepairStatus::Completed => write!(f, "Completed"),
        }
    }
}

// ==========================================
// 保养单状态 (PMS Status)
// ==========================================
// Completed / Cancelled 为终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PmsStatus {
    #[default]
    Scheduled,  // 已排期
    InProgress, // 进行中
    Completed,  // 已完成
    Overdue,    // 已逾期
    Cancelled,  // 已取消
}

impl PmsStatus {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PmsStatus::Scheduled => "SCHEDULED",
            PmsStatus::InProgress => "IN_PROGRESS",
            PmsStatus::Completed => "COMPLETED",
            PmsStatus::Overdue => "OVERDUE",
            PmsStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(PmsStatus::Scheduled),
            "IN_PROGRESS" => Some(PmsStatus::InProgress),
            "COMPLETED" => Some(PmsStatus::Completed),
            "OVERDUE" => Some(PmsStatus::Overdue),
            "CANCELLED" => Some(PmsStatus::Cancelled),
            _ => None,
        }
    }

    /// 是否终态
    pub fn is_final(&self) -> bool {
        matches!(self, PmsStatus::Completed | PmsStatus::Cancelled)
    }
}

impl fmt::Display for PmsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PmsStatus::Scheduled => write!(f, "Scheduled"),
            PmsStatus::InProgress => write!(f, "In Progress"),
            PmsStatus::Completed => write!(f, "Completed"),
            PmsStatus::Overdue => write!(f, "Overdue"),
            PmsStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// ==========================================
// 检验报告类型 (Report Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportType {
    Repair,
    Pms,
}

impl ReportType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReportType::Repair => "REPAIR",
            ReportType::Pms => "PMS",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "REPAIR" => Some(ReportType::Repair),
            "PMS" => Some(ReportType::Pms),
            _ => None,
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportType::Repair => write!(f, "repair"),
            ReportType::Pms => write!(f, "pms"),
        }
    }
}

// ==========================================
// 操作人 (Actor)
// ==========================================
// 仅用于审计留痕（status_changed_by / approved_by），不做权限判断
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub username: String,
}

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.username)
    }
}
