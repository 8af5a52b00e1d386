// ==========================================
// 车队维修管理系统 - 车辆领域模型
// ==========================================
// 报废规则: 报废阈值 = 当前市值 / 2
//           已完成维修费用合计 > 阈值 → 待报废
// ==========================================

use crate::domain::types::VehicleStatus;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Vehicle - 车辆
// ==========================================
// 对齐: vehicles 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    // ===== 主键 =====
    pub vehicle_id: String,
    pub plate_number: String, // 车牌号 (唯一)

    // ===== 基本信息 =====
    pub vehicle_type: String,
    pub make_model: Option<String>,
    pub mileage_km: i64,
    pub assigned_driver_id: Option<String>,

    // ===== 状态 =====
    pub status: VehicleStatus,
    pub status_audit: Option<StatusAudit>, // 最近一次状态变更

    // ===== 价值 =====
    pub acquisition_cost: Option<Decimal>,
    pub current_market_value: Option<Decimal>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Vehicle {
    /// 报废阈值（市值未设置或 ≤ 0 时为 None，不做报废判定）
    pub fn disposal_threshold(&self) -> Option<Decimal> {
        disposal_threshold(self.current_market_value)
    }
}

/// 最近一次状态变更的审计信息
///
/// `changed_by` 为 None 表示系统自动变更
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAudit {
    pub changed_at: NaiveDateTime,
    pub changed_by: Option<String>,
    pub reason: String,
}

// ==========================================
// NewVehicle - 车辆登记参数
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewVehicle {
    pub plate_number: String,
    pub vehicle_type: String,
    pub make_model: Option<String>,
    pub acquisition_cost: Option<Decimal>,
    pub current_market_value: Option<Decimal>,
    pub mileage_km: i64,
}

// ==========================================
// VehicleStatusChange - 状态变更历史
// ==========================================
// 对齐: vehicle_status_history 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleStatusChange {
    pub history_id: String,
    pub vehicle_id: String,
    pub from_status: VehicleStatus,
    pub to_status: VehicleStatus,
    pub changed_by: Option<String>, // None = 系统自动
    pub reason: String,
    pub changed_at: NaiveDateTime,
}

impl VehicleStatusChange {
    /// 是否为系统自动触发的变更
    pub fn is_automatic(&self) -> bool {
        self.changed_by.is_none()
    }
}

// ==========================================
// DisposalAssessment - 报废评估结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisposalAssessment {
    pub total_repair_costs: Decimal,
    pub disposal_threshold: Option<Decimal>,
    pub is_for_disposal: bool,
}

impl DisposalAssessment {
    /// 根据市值与已完成维修费用合计计算评估结果
    pub fn evaluate(market_value: Option<Decimal>, total_repair_costs: Decimal) -> Self {
        let disposal_threshold = disposal_threshold(market_value);
        let is_for_disposal = disposal_threshold
            .map(|threshold| total_repair_costs > threshold)
            .unwrap_or(false);

        Self {
            total_repair_costs,
            disposal_threshold,
            is_for_disposal,
        }
    }

    /// 是否进行了报废判定（市值已设置）
    pub fn is_applicable(&self) -> bool {
        self.disposal_threshold.is_some()
    }
}

fn disposal_threshold(market_value: Option<Decimal>) -> Option<Decimal> {
    market_value
        .filter(|v| *v > Decimal::ZERO)
        .map(|v| v / Decimal::from(2))
}
