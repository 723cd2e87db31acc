//! # Host 层
//!
//! Arona 场景引擎的宿主层实现。
//!
//! ## 架构说明
//!
//! Host 层负责：
//! - 配置与日志
//! - 资源加载（加载队列 + 加载动画）
//! - 计时任务：淡入淡出、位移、表情、音量渐变、打字机
//! - 音频播放状态
//! - 绘制流程
//! - 输入映射
//! - 将 Runtime 的 Command 转换为实际效果，把任务完成状态回传给 Runtime
//!
//! Host 层不包含脚本逻辑，像素输出与音频解码通过 [`render::Renderer`]
//! 与 [`audio::AudioDevice`] 交给具体后端。

pub mod animator;
pub mod audio;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod logging;
pub mod render;
pub mod resources;
pub mod script_loader;
pub mod stage;
pub mod status;

pub use animator::{Animator, SpinnerHandle};
pub use audio::{AudioController, AudioDevice, SilentDevice, SoundBank, StreamId, VolumeRamp};
pub use clock::AnimationClock;
pub use config::{AnimationConfig, AppConfig, AudioConfig, ConfigError, DebugConfig, WindowConfig};
pub use error::{HostError, HostResult};
pub use input::{InputEvent, InputMapper, Key, RawInput, parse_command};
pub use render::{FrameLayout, HeadlessRenderer, Quad, Renderer, TextBox, TextStyle};
pub use resources::{
    AssetError, AssetSource, FontFace, FsAssets, LoadEvent, LoadProgress, LoadQueue, SoundClip,
    plan_loads,
};
pub use stage::Stage;
pub use status::{StatusCode, StatusMessage, StatusReceiver, StatusSender};
