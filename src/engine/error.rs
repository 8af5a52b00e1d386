// ==========================================
// 车队维修管理系统 - 引擎层错误类型
// ==========================================
// ValidationError: 业务规则违反（一次收集全部违规项）
// NotFound:        引用的车辆/维修单/保养单/检验报告不存在
// Repository:      数据访问失败
// NotificationError 只在通知旁路内部产生，引擎记录日志后吞掉
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ==========================================
// ViolationKind - 违规类别
// ==========================================
// 调用方（及测试）按类别判断，message 面向终端用户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    // ===== 检验报告门禁 =====
    PreInspectionRequired,
    PostInspectionRequired,
    PreInspectionNotApproved,
    PostInspectionNotApproved,
    PreInspectionVehicleMismatch,
    PostInspectionVehicleMismatch,
    PreInspectionAlreadyUsed,
    PostInspectionAlreadyUsed,
    PostInspectionPreMismatch,

    // ===== 状态流转 =====
    CompletedIsFinal,
    PmsStatusFinal,
    PmsAlreadyHasRepair,
    PmsCancelled,

    // ===== 输入校验 =====
    DuplicatePlate,
    PlateRequired,
    NegativeAmount,
    AmountTooLarge,
    PartsCostManagedByItems,
    RatingOutOfRange,
    QuantityNotPositive,
}

/// 单条违规
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub kind: ViolationKind,
    pub message: String, // 完整句子，可直接展示
}

impl ValidationViolation {
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

// ==========================================
// ValidationError - 校验错误
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub violations: Vec<ValidationViolation>,
}

impl ValidationError {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只有一条违规的错误
    pub fn single(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            violations: vec![ValidationViolation::new(kind, message)],
        }
    }

    pub fn push(&mut self, kind: ViolationKind, message: impl Into<String>) {
        self.violations.push(ValidationViolation::new(kind, message));
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// 是否包含某类违规
    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }

    pub fn kinds(&self) -> Vec<ViolationKind> {
        self.violations.iter().map(|v| v.kind).collect()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.message.as_str()).collect()
    }

    /// 无违规返回 Ok(())
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join(" "))
    }
}

impl std::error::Error for ValidationError {}

// ==========================================
// EngineError - 引擎错误
// ==========================================
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// 校验错误（非校验错误返回 None）
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            EngineError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::Repository(RepositoryError::from(err))
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;

// ==========================================
// NotificationError - 通知发送错误
// ==========================================
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("通知写入失败: {0}")]
    Storage(#[from] RepositoryError),

    #[error("通知发送失败: {0}")]
    Delivery(String),
}
