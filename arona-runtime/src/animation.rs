//! # Animation 模块
//!
//! 多帧动画的播放状态。表情叠加层和加载画面转圈都使用它。
//!
//! - 正在播放时再次 `begin` 不产生任何效果
//! - 有限播放结束时 `tick` 恰好返回一次 [`Tick::Finish`]
//! - 无限播放永远不会返回 `Finish`，只能由外部停止

use std::sync::Arc;
use std::time::Duration;

use crate::motion::Tick;
use crate::sprite::{AnimatedSprite, SpriteFrame};

/// 动画播放状态
#[derive(Debug, Clone)]
pub struct Animation {
    sprite: Arc<AnimatedSprite>,
    current_frame: usize,
    remaining_loops: u32,
    forever: bool,
    animating: bool,
}

impl Animation {
    pub fn new(sprite: Arc<AnimatedSprite>) -> Self {
        Self {
            sprite,
            current_frame: 0,
            remaining_loops: 0,
            forever: false,
            animating: false,
        }
    }

    /// 开始播放
    ///
    /// 返回第一帧的延迟，计时器应以它作为初始间隔。
    /// 已在播放或没有帧时返回 `None`。
    pub fn begin(&mut self, forever: bool) -> Option<Duration> {
        if self.animating || self.sprite.frames.is_empty() {
            return None;
        }
        self.animating = true;
        self.forever = forever;
        self.current_frame = 0;
        self.remaining_loops = self.sprite.loop_count.max(1);
        Some(self.sprite.delay_of(0))
    }

    /// 前进一帧
    pub fn tick(&mut self) -> Tick {
        let count = self.sprite.frame_count();
        if !self.animating || count == 0 {
            self.animating = false;
            return Tick::Finish;
        }

        let next = (self.current_frame + 1) % count;
        self.current_frame = next;
        if next == 0 && !self.forever {
            self.remaining_loops = self.remaining_loops.saturating_sub(1);
            if self.remaining_loops == 0 {
                self.animating = false;
                return Tick::Finish;
            }
        }
        Tick::Reschedule(self.sprite.delay_of(next))
    }

    /// 停止播放（不触发完成）
    pub fn halt(&mut self) {
        self.animating = false;
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn name(&self) -> &str {
        &self.sprite.name
    }

    pub fn sprite(&self) -> &Arc<AnimatedSprite> {
        &self.sprite
    }

    pub fn current_frame_index(&self) -> usize {
        self.current_frame
    }

    pub fn current_frame(&self) -> Option<&SpriteFrame> {
        self.sprite.frames.get(self.current_frame)
    }
}
