// ==========================================
// 国际化 (i18n) 模块
// ==========================================
// 使用 rust-i18n 库
// 支持英文（默认）和中文
// 校验失败信息直接展示给终端用户，必须是完整句子
// ==========================================
// 注意: rust_i18n::i18n! 宏已在 lib.rs 中初始化
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: &[&str] = &["en", "zh-CN"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言（不支持的语言回退为 en）
///
/// # 参数
/// - locale: 语言代码（"en" 或 "zh-CN"）
pub fn set_locale(locale: &str) {
    if SUPPORTED_LOCALES.contains(&locale) {
        rust_i18n::set_locale(locale);
    } else {
        tracing::warn!("不支持的语言: {}，回退为 en", locale);
        rust_i18n::set_locale("en");
    }
}

/// 翻译消息（无参数）
///
/// # 示例
/// ```no_run
/// use fleet_maintenance::i18n::t;
/// let msg = t("record.repair");
/// ```
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 翻译消息（带参数）
///
/// # 示例
/// ```no_run
/// use fleet_maintenance::i18n::t_with_args;
/// let msg = t_with_args("validation.pre_inspection_required", &[("record", "repair")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    let mut result = rust_i18n::t!(key).to_string();
    for (k, v) in args {
        let placeholder = format!("%{{{}}}", k);
        result = result.replace(&placeholder, v);
    }
    result
}

// rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
// 修改 locale 的单元测试（含 AppState 启动）都需持有此锁。
#[cfg(test)]
pub(crate) static LOCALE_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
