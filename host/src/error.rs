//! # Error 模块
//!
//! Host 层的错误类型。
//!
//! 只有启动必需的 IO（脚本、字体）与运行时的不变量破坏会变成 [`HostError`]；
//! 内容错误（缺失的背景、音效）只进入调试叠加层，不会中断运行。

use thiserror::Error;

use arona_runtime::{MetadataError, RuntimeError};

use crate::config::ConfigError;
use crate::resources::AssetError;

#[derive(Error, Debug)]
pub enum HostError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 脚本文件读取失败
    #[error("无法读取脚本 {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 必需的字体加载失败
    #[error("无法加载字体: {0}")]
    Font(AssetError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

pub type HostResult<T> = Result<T, HostError>;
