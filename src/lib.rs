// ==========================================
// 车队维修管理系统 - 核心库
// ==========================================
// 系统定位: 维修一致性引擎
// - 车辆状态随维修/保养单自动流转
// - 维修单/保养单保存前校验检验报告约束
// - 已完成维修费用超过市场价值一半时转入待报废
// 技术栈: Rust + SQLite
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/迁移）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 应用层 - 资源组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{Actor, PmsStatus, RepairStatus, ReportType, VehicleStatus};

// 领域实体
pub use domain::{
    DisposalAssessment, Notification, Pms, PostInspectionReport, PreInspectionReport, Repair,
    RepairPartItem, Vehicle, VehicleStatusChange,
};

// 引擎
pub use engine::{
    EngineError, EngineResult, EngineSettings, MaintenanceEngine, NotificationSink,
    ValidationError, VehicleStatusMachine, ViolationKind,
};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Fleet Maintenance";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
