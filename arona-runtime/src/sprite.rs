//! # Sprite 模块
//!
//! 纹理描述与多帧动画精灵（GIF）。像素数据由宿主层持有，
//! 这里只记录绘制与计时所需的信息。

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// GIF 帧延迟为 0 时使用的默认值
pub const DEFAULT_FRAME_DELAY: Duration = Duration::from_millis(100);

/// 已加载纹理的描述
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Texture {
    /// 逻辑路径，宿主层用它找回 GPU 资源
    pub path: String,
    pub width: u32,
    pub height: u32,
}

impl Texture {
    pub fn new(path: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            path: path.into(),
            width,
            height,
        }
    }
}

/// 帧处置方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameDisposal {
    /// 保留：绘制后续帧时，先绘制此帧
    Keep,
    /// 替换：帧已经是完整画面
    #[default]
    Replace,
}

/// 动画精灵的一帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrame {
    pub texture: Texture,
    pub delay: Duration,
    pub disposal: FrameDisposal,
}

/// 多帧动画精灵
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimatedSprite {
    pub name: String,
    pub frames: Vec<SpriteFrame>,
    /// 绘制缩放
    pub scale: f32,
    /// 一次有限播放的循环次数
    pub loop_count: u32,
}

impl AnimatedSprite {
    pub fn new(name: impl Into<String>, frames: Vec<SpriteFrame>) -> Self {
        Self {
            name: name.into(),
            frames,
            scale: 1.0,
            loop_count: 1,
        }
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 指定帧的延迟（0 延迟使用默认值）
    pub fn delay_of(&self, index: usize) -> Duration {
        match self.frames.get(index) {
            Some(frame) if !frame.delay.is_zero() => frame.delay,
            _ => DEFAULT_FRAME_DELAY,
        }
    }

    /// 一次有限播放的总时长
    pub fn total_duration(&self) -> Duration {
        let one_pass: Duration = (0..self.frames.len()).map(|i| self.delay_of(i)).sum();
        one_pass * self.loop_count.max(1)
    }

    /// 绘制第 `index` 帧时需要依次绘制的帧
    ///
    /// 处置方式为 Keep 的前序帧会垫在当前帧下面。
    pub fn layers(&self, index: usize) -> Vec<&Texture> {
        let mut layers: Vec<&Texture> = self.frames[..index.min(self.frames.len())]
            .iter()
            .filter(|f| f.disposal == FrameDisposal::Keep)
            .map(|f| &f.texture)
            .collect();
        if let Some(current) = self.frames.get(index) {
            layers.push(&current.texture);
        }
        layers
    }
}

#[cfg(test)]
pub(crate) fn test_sprite(name: &str, delays_ms: &[u64]) -> AnimatedSprite {
    let frames = delays_ms
        .iter()
        .enumerate()
        .map(|(i, ms)| SpriteFrame {
            texture: Texture::new(format!("emote/{}#{}", name, i), 64, 64),
            delay: Duration::from_millis(*ms),
            disposal: FrameDisposal::Replace,
        })
        .collect();
    AnimatedSprite::new(name, frames)
}
