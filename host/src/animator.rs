//! # Animator 模块
//!
//! 把 Runtime 的时间类命令变成计时任务。
//!
//! 每个效果由一个 [`Motion`] 描述、一个 [`AnimationClock`] 驱动；
//! 带凭据的效果在结束时通过 [`StatusSender`] 回传状态。
//! 所有任务都登记在这里，场景重载时统一中止。

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use arona_runtime::script::FadeDirection;
use arona_runtime::{
    Actor, AnimatedSprite, Animation, AnimationMetadata, ColorFade, Motion, PropertyRamp, Reply,
    ScriptedMotion, SharedValue, TextReveal, Tick, Ticket,
};

use crate::audio::VolumeRamp;
use crate::clock::AnimationClock;
use crate::config::AnimationConfig;
use crate::status::{StatusMessage, StatusSender};

/// 一次性计时：第一次 tick 即结束
struct Timer;

impl Motion for Timer {
    fn tick(&mut self) -> Tick {
        Tick::Finish
    }
}

/// 角色表情：逐帧推进，结束时移除叠加层
struct EmoteMotion {
    actor: Actor,
}

impl Motion for EmoteMotion {
    fn tick(&mut self) -> Tick {
        let tick = self.actor.tick_emote();
        if tick == Tick::Finish {
            self.actor.end_emote();
        }
        tick
    }
}

/// 共享的循环动画（加载画面转圈）
#[derive(Debug, Clone)]
pub struct SpinnerHandle {
    animation: Arc<Mutex<Animation>>,
}

impl SpinnerHandle {
    pub fn animation(&self) -> MutexGuard<'_, Animation> {
        self.animation
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

struct SpinnerMotion {
    handle: SpinnerHandle,
}

impl Motion for SpinnerMotion {
    fn tick(&mut self) -> Tick {
        self.handle.animation().tick()
    }
}

pub struct Animator {
    config: AnimationConfig,
    status: StatusSender,
    tasks: Vec<AnimationClock>,
}

impl Animator {
    pub fn new(config: AnimationConfig, status: StatusSender) -> Self {
        Self {
            config,
            status,
            tasks: Vec::new(),
        }
    }

    /// 运行一个步进器；`done` 存在时结束后回传
    pub fn run<M: Motion>(&mut self, motion: M, interval: Duration, done: Option<StatusMessage>) {
        let status = self.status.clone();
        let clock = AnimationClock::start(interval, motion, move || {
            if let Some(message) = done {
                status.send(message);
            }
        });
        self.tasks.retain(AnimationClock::is_running);
        self.tasks.push(clock);
    }

    /// 全屏遮罩淡入淡出
    ///
    /// Out：遮罩从透明变为不透明；In：遮罩从不透明变为透明。
    pub fn fade_scene(&mut self, opacity: &SharedValue, direction: FadeDirection, ticket: Ticket) {
        let (from, to) = match direction {
            FadeDirection::Out => (0.0, 1.0),
            FadeDirection::In => (1.0, 0.0),
        };
        let ramp = PropertyRamp::new(opacity.clone(), "alpha", to, self.config.alpha_step)
            .starting_at(from);
        self.run(
            ramp,
            self.config.tick(),
            Some(StatusMessage::completed(ticket)),
        );
    }

    /// 角色变暗 / 恢复
    pub fn fade_actor(&mut self, actor: &Actor, direction: FadeDirection) {
        let fade = ColorFade::new(actor.clone(), direction, self.config.color_step);
        self.run(fade, self.config.tick(), None);
    }

    /// 角色位移动画
    pub fn animate_actor(
        &mut self,
        actor: &Actor,
        animation: &AnimationMetadata,
        ticket: Option<Ticket>,
    ) {
        let motion = ScriptedMotion::new(actor.clone(), animation, self.config.tick());
        self.run(
            motion,
            self.config.tick(),
            ticket.map(StatusMessage::completed),
        );
    }

    /// 播放角色表情
    ///
    /// 表情已在播放时返回 `false`。
    pub fn animate_emote(&mut self, actor: &Actor, sprite: Arc<AnimatedSprite>) -> bool {
        let Some(first_delay) = actor.begin_emote(sprite) else {
            return false;
        };
        let motion = EmoteMotion {
            actor: actor.clone(),
        };
        self.run(motion, first_delay, None);
        true
    }

    /// 对白逐字显示
    pub fn reveal(&mut self, text: &TextReveal, ticket: Ticket) {
        self.run(
            text.clone(),
            self.config.typewriter(),
            Some(StatusMessage::reveal_finished(ticket)),
        );
    }

    /// 一段时间后回传凭据
    pub fn schedule(&mut self, after: Duration, ticket: Ticket) {
        self.run(Timer, after, Some(StatusMessage::completed(ticket)));
    }

    /// 回复选项淡入 / 淡出
    pub fn fade_replies(&mut self, replies: &[Reply], direction: FadeDirection) {
        for reply in replies {
            let ramp =
                PropertyRamp::alpha(reply.opacity.clone(), direction, self.config.alpha_step * 4.0);
            self.run(ramp, self.config.tick(), None);
        }
    }

    /// BGM 音量渐变
    pub fn ramp_volume(&mut self, ramp: VolumeRamp) {
        let motion = PropertyRamp::new(ramp.level, "value", ramp.to, ramp.step)
            .starting_at(ramp.from);
        self.run(motion, self.config.tick(), None);
    }

    /// 无限循环播放加载动画
    pub fn spinner(&mut self, sprite: Arc<AnimatedSprite>) -> Option<SpinnerHandle> {
        let mut animation = Animation::new(sprite);
        let first_delay = animation.begin(true)?;
        let handle = SpinnerHandle {
            animation: Arc::new(Mutex::new(animation)),
        };
        self.run(
            SpinnerMotion {
                handle: handle.clone(),
            },
            first_delay,
            None,
        );
        Some(handle)
    }

    /// 正在运行的任务数
    pub fn running(&self) -> usize {
        self.tasks.iter().filter(|t| t.is_running()).count()
    }

    /// 替换状态发送端（场景重载后使用新通道）
    pub fn set_status(&mut self, status: StatusSender) {
        self.status = status;
    }

    /// 中止所有任务
    pub fn abort_all(&mut self) {
        tracing::debug!(tasks = self.tasks.len(), "中止所有动画任务");
        for task in self.tasks.drain(..) {
            task.stop();
        }
    }
}

impl Drop for Animator {
    fn drop(&mut self) {
        self.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::channels;
    use arona_runtime::{FrameDisposal, Signal, SpriteFrame, Texture};

    fn sprite(name: &str, frames: usize, delay_ms: u64) -> Arc<AnimatedSprite> {
        let frames = (0..frames)
            .map(|i| SpriteFrame {
                texture: Texture::new(format!("emote/{name}#{i}"), 64, 64),
                delay: Duration::from_millis(delay_ms),
                disposal: FrameDisposal::Replace,
            })
            .collect();
        Arc::new(AnimatedSprite::new(name, frames))
    }

    fn config() -> AnimationConfig {
        AnimationConfig::default()
    }

    #[tokio::test(start_paused = true)]
    async fn test_scene_fade_reports_completion() {
        let (tx, mut rx) = channels();
        let mut animator = Animator::new(config(), tx);
        let opacity = SharedValue::new(0.0);

        animator.fade_scene(&opacity, FadeDirection::Out, Ticket(7));
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(opacity.get(), 1.0);
        let message = rx.status.try_recv().unwrap();
        assert_eq!(Signal::from(message), Signal::Completed(Ticket(7)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_reports_reveal_finished() {
        let (tx, mut rx) = channels();
        let mut animator = Animator::new(config(), tx);
        let text = TextReveal::new("Hi!");

        animator.reveal(&text, Ticket(2));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(text.is_complete());
        let message = rx.status.try_recv().unwrap();
        assert_eq!(Signal::from(message), Signal::RevealFinished(Ticket(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_all_drops_pending_signals() {
        let (tx, mut rx) = channels();
        let mut animator = Animator::new(config(), tx);

        animator.schedule(Duration::from_millis(500), Ticket(1));
        assert_eq!(animator.running(), 1);
        animator.abort_all();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(rx.status.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_emote_clears_overlay_when_finished() {
        let (tx, _rx) = channels();
        let mut animator = Animator::new(config(), tx);
        let actor = Actor::new("mika");
        let sprite = sprite("heart", 3, 100);

        assert!(animator.animate_emote(&actor, sprite.clone()));
        assert!(!animator.animate_emote(&actor, sprite));
        assert!(actor.is_emoting());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!actor.is_emoting());
        assert_eq!(actor.emote_name(), None);
    }
}
