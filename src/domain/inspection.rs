// ==========================================
// 车队维修管理系统 - 检验报告领域模型
// ==========================================
// 维修前检验 (Pre) / 维修后检验 (Post)
// 审批状态用显式枚举表达，不存在“只设置了一半”的中间态
// 审批不可撤销（无 reject / revoke 操作）
// ==========================================

use crate::domain::types::ReportType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// ConditionRating - 车况评级（五级）
// ==========================================
// 顺序: Excellent < Good < Fair < Poor < Critical（越大越差）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionRating {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Critical,
}

// ==========================================
// ConditionRatings - 八大系统车况
// ==========================================
// 存储: ratings_json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConditionRatings {
    pub engine: ConditionRating,
    pub transmission: ConditionRating,
    pub brakes: ConditionRating,
    pub steering: ConditionRating,
    pub suspension: ConditionRating,
    pub electrical: ConditionRating,
    pub body: ConditionRating,
    pub tires: ConditionRating,
}

impl ConditionRatings {
    fn all(&self) -> [ConditionRating; 8] {
        [
            self.engine,
            self.transmission,
            self.brakes,
            self.steering,
            self.suspension,
            self.electrical,
            self.body,
            self.tires,
        ]
    }

    /// 最差的系统评级
    pub fn worst(&self) -> ConditionRating {
        self.all().into_iter().max().unwrap_or_default()
    }

    /// 评级为 Poor 及以下的系统数量
    pub fn systems_needing_attention(&self) -> usize {
        self.all()
            .into_iter()
            .filter(|r| *r >= ConditionRating::Poor)
            .count()
    }
}

// ==========================================
// ApprovalState - 审批状态
// ==========================================
// 对齐: approved_by / approval_date / approval_notes 三列
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ApprovalState {
    #[default]
    Unapproved,
    Approved {
        by: String,
        at: NaiveDateTime,
        notes: Option<String>,
    },
}

impl ApprovalState {
    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalState::Approved { .. })
    }

    pub fn approved_by(&self) -> Option<&str> {
        match self {
            ApprovalState::Approved { by, .. } => Some(by),
            ApprovalState::Unapproved => None,
        }
    }

    /// 从数据库列还原
    ///
    /// 只设置了 approved_by / approval_date 其中之一时返回 Err
    pub fn from_columns(
        by: Option<String>,
        at: Option<NaiveDateTime>,
        notes: Option<String>,
    ) -> Result<Self, String> {
        match (by, at) {
            (Some(by), Some(at)) => Ok(ApprovalState::Approved { by, at, notes }),
            (None, None) => Ok(ApprovalState::Unapproved),
            (by, at) => Err(format!(
                "approval columns half-set: approved_by={:?}, approval_date={:?}",
                by, at
            )),
        }
    }
}

// ==========================================
// PreInspectionReport - 维修前检验报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreInspectionReport {
    pub report_id: String,
    pub vehicle_id: String,
    pub report_type: ReportType,
    pub inspected_by: String,
    pub inspection_date: NaiveDateTime,
    pub odometer_km: Option<i64>,
    pub ratings: ConditionRatings,
    pub findings: Option<String>,
    pub photo_paths: Vec<String>, // 附件路径，核心不读取文件内容
    pub approval: ApprovalState,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPreInspection {
    pub vehicle_id: String,
    pub report_type: ReportType,
    pub inspected_by: String,
    pub inspection_date: Option<NaiveDateTime>, // None = 当前时间
    pub odometer_km: Option<i64>,
    pub ratings: ConditionRatings,
    pub findings: Option<String>,
    pub photo_paths: Vec<String>,
}

// ==========================================
// PostInspectionReport - 维修后检验报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostInspectionReport {
    pub report_id: String,
    pub vehicle_id: String,
    pub pre_inspection_id: String, // 对应的维修前检验
    pub inspected_by: String,
    pub inspection_date: NaiveDateTime,
    pub odometer_km: Option<i64>,
    pub ratings: ConditionRatings,
    pub satisfaction: SatisfactionRatings,
    pub test_drive: Option<TestDriveResult>,
    pub findings: Option<String>,
    pub photo_paths: Vec<String>,
    pub approval: ApprovalState,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPostInspection {
    pub vehicle_id: String,
    pub pre_inspection_id: String,
    pub inspected_by: String,
    pub inspection_date: Option<NaiveDateTime>,
    pub odometer_km: Option<i64>,
    pub ratings: ConditionRatings,
    pub satisfaction: SatisfactionRatings,
    pub test_drive: Option<TestDriveResult>,
    pub findings: Option<String>,
    pub photo_paths: Vec<String>,
}

/// 满意度评分（1-5）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatisfactionRatings {
    pub work_quality: u8,
    pub timeliness: u8,
    pub communication: u8,
    pub overall: u8,
}

impl SatisfactionRatings {
    /// 返回超出 1-5 范围的字段名
    pub fn out_of_range_fields(&self) -> Vec<&'static str> {
        [
            ("work quality", self.work_quality),
            ("timeliness", self.timeliness),
            ("communication", self.communication),
            ("overall", self.overall),
        ]
        .into_iter()
        .filter(|(_, v)| !(1..=5).contains(v))
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for SatisfactionRatings {
    fn default() -> Self {
        Self {
            work_quality: 5,
            timeliness: 5,
            communication: 5,
            overall: 5,
        }
    }
}

/// 试车结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDriveResult {
    pub passed: bool,
    pub distance_km: Option<f64>,
    pub notes: Option<String>,
}
