//! # Error 模块
//!
//! 定义 arona-runtime 中使用的错误类型。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 解析错误
///
/// 标记行格式错误不会让整个脚本解析失败，这里的错误只用于描述
/// 单个控制标签的参数问题，最终以诊断的形式报告给作者。
/// 会随 [`Directive::Invalid`](crate::script::Directive::Invalid) 一起序列化。
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParseError {
    /// 控制标签参数无效
    #[error("第 {line} 行：'{tag}' 的参数无效 - {message}")]
    InvalidDirective {
        line: usize,
        tag: String,
        message: String,
    },

    /// 第一个标记之前出现了对白文本
    #[error("第 {line} 行：对白出现在任何标记之前，已忽略")]
    OrphanText { line: usize },
}

/// 元数据错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetadataError {
    /// JSON 解析失败
    #[error("元数据 JSON 解析失败: {0}")]
    Json(String),

    /// 旧格式迁移时发现重复条目
    #[error("元数据存在重复条目: {}", .entries.join(", "))]
    Duplicates { entries: Vec<String> },

    /// 迁移后的文件写入失败
    #[error("迁移后的元数据写入失败: {path} - {message}")]
    Persist { path: String, message: String },
}

/// 角色错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActorError {
    /// 纹理未加载
    #[error("角色 '{actor}' 的纹理 '{key}' 不存在")]
    TextureNotFound { actor: String, key: String },
}

/// 运行时错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// 表情未在元数据或资源中注册（内容作者错误，不可恢复）
    #[error("表情 '{name}' 未注册")]
    UnknownEmote { name: String },

    /// 无效的回复索引
    #[error("无效的回复索引 {index}，有效范围是 0..{max}")]
    InvalidReplyIndex { index: usize, max: usize },

    /// 状态不匹配
    #[error("当前状态不允许此操作：期望 {expected}，实际 {actual}")]
    StateMismatch { expected: String, actual: String },
}
