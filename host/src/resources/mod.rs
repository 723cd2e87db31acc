//! # Resources 模块
//!
//! 资源加载：目录布局、资源来源抽象与场景加载队列。
//!
//! ## 模块结构
//!
//! - [`path`]：资源目录布局与逻辑路径
//! - [`source`]：[`AssetSource`] trait 与文件系统实现
//! - [`loader`]：按脚本生成加载事件，每帧消费一个

mod error;
pub mod loader;
pub mod path;
mod source;

pub use error::AssetError;
pub use loader::{LoadEvent, LoadProgress, LoadQueue, plan_loads};
pub use source::{AssetSource, FontFace, FsAssets, SoundClip};
