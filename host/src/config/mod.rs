//! # Config 模块
//!
//! 运行时配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 配置文件 (config.json)
//! 2. 默认值（缺失的字段逐项回退）

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use arona_runtime::{EngineConfig, ReplyLayout, SessionDefaults};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// 资源根目录
    #[serde(default = "default_assets_root")]
    pub assets_root: PathBuf,

    /// 场景脚本（相对于 assets_root）
    #[serde(default = "default_script")]
    pub script: String,

    /// 元数据文件（相对于 assets_root）
    #[serde(default = "default_metadata")]
    pub metadata: String,

    /// 迁移后的元数据写入位置（与 metadata 同目录）
    #[serde(default = "default_migrated_metadata")]
    pub migrated_metadata: String,

    /// 默认字体路径（相对于 assets_root），必须存在
    #[serde(default = "default_font_path")]
    pub default_font: String,

    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 动画配置
    #[serde(default)]
    pub animation: AnimationConfig,

    /// 音频配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 调试配置
    #[serde(default)]
    pub debug: DebugConfig,
}

/// 窗口配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,

    #[serde(default = "default_window_title")]
    pub title: String,
}

/// 动画配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// 动画计时器间隔（毫秒）
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// 打字机间隔（毫秒）
    #[serde(default = "default_typewriter_ms")]
    pub typewriter_ms: u64,

    /// 透明度每 tick 的步长
    #[serde(default = "default_alpha_step")]
    pub alpha_step: f32,

    /// 角色颜色每 tick 的步长
    #[serde(default = "default_color_step")]
    pub color_step: f32,

    /// 对白显示完毕后自动推进的等待（毫秒）
    #[serde(default = "default_auto_advance_ms")]
    pub auto_advance_ms: u64,

    /// 单选项回复自动确认的等待（毫秒）
    #[serde(default = "default_reply_confirm_ms")]
    pub reply_confirm_ms: u64,
}

/// 音频配置
///
/// 音量使用对数刻度：0 为原始音量，每降低 1 音量减半。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub bgm_volume: f32,

    #[serde(default)]
    pub sfx_volume: f32,

    /// 淡出与调低音量的下限
    #[serde(default = "default_volume_floor")]
    pub volume_floor: f32,

    /// 音量按键与渐变每次的变化量
    #[serde(default = "default_volume_step")]
    pub volume_step: f32,
}

/// 调试配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    /// 启动时显示调试叠加层
    #[serde(default)]
    pub overlay: bool,

    /// 启动时运行脚本检查
    ///
    /// debug build 默认开启，检查结果只输出诊断，不阻塞启动。
    #[serde(default = "default_script_check")]
    pub script_check: bool,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// 默认值函数
fn default_assets_root() -> PathBuf {
    PathBuf::from("assets")
}

fn default_script() -> String {
    "script.txt".to_string()
}

fn default_metadata() -> String {
    "settings.json".to_string()
}

fn default_migrated_metadata() -> String {
    "settings-new.json".to_string()
}

fn default_font_path() -> String {
    "fonts/NotoSans-Medium.ttf".to_string()
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    720
}

fn default_window_title() -> String {
    "Arona".to_string()
}

fn default_tick_ms() -> u64 {
    16
}

fn default_typewriter_ms() -> u64 {
    32
}

fn default_alpha_step() -> f32 {
    arona_runtime::motion::ALPHA_STEP
}

fn default_color_step() -> f32 {
    0.05
}

fn default_auto_advance_ms() -> u64 {
    1000
}

fn default_reply_confirm_ms() -> u64 {
    2000
}

fn default_volume_floor() -> f32 {
    -5.0
}

fn default_volume_step() -> f32 {
    arona_runtime::motion::VOLUME_STEP
}

fn default_script_check() -> bool {
    cfg!(debug_assertions)
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            assets_root: default_assets_root(),
            script: default_script(),
            metadata: default_metadata(),
            migrated_metadata: default_migrated_metadata(),
            default_font: default_font_path(),
            window: WindowConfig::default(),
            animation: AnimationConfig::default(),
            audio: AudioConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
            title: default_window_title(),
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            typewriter_ms: default_typewriter_ms(),
            alpha_step: default_alpha_step(),
            color_step: default_color_step(),
            auto_advance_ms: default_auto_advance_ms(),
            reply_confirm_ms: default_reply_confirm_ms(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            bgm_volume: 0.0,
            sfx_volume: 0.0,
            volume_floor: default_volume_floor(),
            volume_step: default_volume_step(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            overlay: false,
            script_check: default_script_check(),
            log_level: default_log_level(),
        }
    }
}

impl AnimationConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn typewriter(&self) -> Duration {
        Duration::from_millis(self.typewriter_ms)
    }
}

impl AppConfig {
    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(path = %path.display(), "配置文件不存在，使用默认配置");
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "配置文件加载成功");
                    config
                }
                Err(e) => {
                    tracing::warn!(error = %e, "配置文件解析失败，使用默认配置");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "配置文件读取失败，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.script.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "必须配置 script（场景脚本路径）".to_string(),
            ));
        }

        if self.animation.tick_ms == 0 || self.animation.typewriter_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "计时器间隔必须大于 0".to_string(),
            ));
        }

        for (name, step) in [
            ("alpha_step", self.animation.alpha_step),
            ("color_step", self.animation.color_step),
        ] {
            if !(step > 0.0 && step <= 1.0) {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} 必须在 (0, 1] 之间，实际 {}",
                    name, step
                )));
            }
        }

        if self.audio.volume_step <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "volume_step 必须大于 0".to_string(),
            ));
        }

        if self.audio.volume_floor > self.audio.bgm_volume {
            return Err(ConfigError::ValidationFailed(format!(
                "音量下限 {} 高于 BGM 音量 {}",
                self.audio.volume_floor, self.audio.bgm_volume
            )));
        }

        Ok(())
    }

    pub fn script_path(&self) -> PathBuf {
        self.assets_root.join(&self.script)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.assets_root.join(&self.metadata)
    }

    /// 迁移后元数据的写入路径（与原文件同目录）
    pub fn migrated_metadata_path(&self) -> PathBuf {
        let metadata = self.metadata_path();
        match metadata.parent() {
            Some(dir) => dir.join(&self.migrated_metadata),
            None => PathBuf::from(&self.migrated_metadata),
        }
    }

    /// 转换为引擎配置
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            auto_advance_delay: Duration::from_millis(self.animation.auto_advance_ms),
            reply_confirm_delay: Duration::from_millis(self.animation.reply_confirm_ms),
            reply_layout: ReplyLayout {
                screen_width: self.window.width as f32,
                ..ReplyLayout::default()
            },
            session: SessionDefaults {
                bgm_volume: self.audio.bgm_volume,
                sfx_volume: self.audio.sfx_volume,
                debug_overlay: self.debug.overlay,
                ..SessionDefaults::default()
            },
        }
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}
