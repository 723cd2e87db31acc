//! 日志初始化

use tracing::Level;

/// 解析日志级别，无法识别时回退到 INFO
pub fn parse_level(level: &str) -> Level {
    level.parse().unwrap_or(Level::INFO)
}

/// 安装全局 fmt 订阅者
///
/// 重复调用时保留第一次安装的订阅者。
pub fn init(level: &str) {
    let level = parse_level(level);
    let result = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    if result.is_err() {
        tracing::debug!("日志订阅者已安装，跳过");
    }
}
