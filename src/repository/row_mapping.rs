// ==========================================
// 车队维修管理系统 - 行映射辅助函数
// ==========================================
// 金额: 十进制文本 <-> rust_decimal::Decimal
// 枚举: SCREAMING_SNAKE_CASE 文本 <-> 领域枚举
// JSON: 文本列 <-> serde 结构
// ==========================================

use rusqlite::types::Type;
use rusqlite::Row;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::str::FromStr;

fn conversion_error(
    idx: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

#[derive(Debug, thiserror::Error)]
#[error("无法识别的枚举值: {0}")]
struct UnknownVariant(String);

pub(crate) fn get_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    Decimal::from_str(raw.trim()).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn get_opt_decimal(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Decimal>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| Decimal::from_str(raw.trim()).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn get_enum<T>(
    row: &Row<'_>,
    idx: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).ok_or_else(|| conversion_error(idx, UnknownVariant(raw)))
}

pub(crate) fn get_json<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e))
}

pub(crate) fn get_opt_json<T: DeserializeOwned>(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<T>> {
    row.get::<_, Option<String>>(idx)?
        .map(|raw| serde_json::from_str(&raw).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> rusqlite::Result<String> {
    serde_json::to_string(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

/// 维修单 / 保养单主键生成
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
