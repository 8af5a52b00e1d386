// ==========================================
// 车队维修管理系统 - 应用层
// ==========================================
// 职责: 组装数据库、配置、通知与引擎
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
