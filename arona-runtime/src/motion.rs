//! # Motion 模块
//!
//! 由计时器驱动的逐 tick 步进器。每个步进器持有它要修改的共享句柄，
//! 计时器每个 tick 调用一次 [`Motion::tick`]，根据返回的 [`Tick`] 决定继续、
//! 改变间隔或结束。
//!
//! - [`PropertyRamp`]：线性逼近某个属性（透明度、音量），终值精确，不会越界
//! - [`ColorFade`]：角色整体变暗/恢复，期间设置 `faded` 标记
//! - [`ScriptedMotion`]：按元数据帧序列移动角色

use std::time::Duration;

use crate::actor::{Actor, FADED_COLOR};
use crate::animatable::Animatable;
use crate::geometry::Vec2;
use crate::metadata::{AnimationMetadata, FrameMetadata};
use crate::script::FadeDirection;

/// 透明度每 tick 的步长
pub const ALPHA_STEP: f32 = 0.025;
/// 音量每 tick 的步长
pub const VOLUME_STEP: f32 = 0.5;
/// 位移动画判定到达的距离
pub const ARRIVE_EPSILON: f32 = 0.01;

/// 一次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// 保持当前间隔继续
    Continue,
    /// 之后的 tick 使用新的间隔
    Reschedule(Duration),
    /// 结束，计时器随后调用一次完成回调
    Finish,
}

/// 逐 tick 步进的动画
pub trait Motion: Send + 'static {
    fn tick(&mut self) -> Tick;
}

/// 属性线性渐变
#[derive(Debug)]
pub struct PropertyRamp<T> {
    target: T,
    property: &'static str,
    goal: f32,
    step: f32,
}

impl<T: Animatable> PropertyRamp<T> {
    pub fn new(target: T, property: &'static str, goal: f32, step: f32) -> Self {
        Self {
            target,
            property,
            goal,
            step: step.abs(),
        }
    }

    /// 透明度渐变：In 到 1，Out 到 0
    pub fn alpha(target: T, direction: FadeDirection, step: f32) -> Self {
        let goal = match direction {
            FadeDirection::In => 1.0,
            FadeDirection::Out => 0.0,
        };
        Self::new(target, "alpha", goal, step)
    }

    /// 设置起始值
    pub fn starting_at(self, value: f32) -> Self {
        self.target.set_property(self.property, value);
        self
    }

    pub fn goal(&self) -> f32 {
        self.goal
    }
}

impl<T: Animatable> Motion for PropertyRamp<T> {
    fn tick(&mut self) -> Tick {
        let Some(current) = self.target.get_property(self.property) else {
            tracing::warn!(property = self.property, "渐变目标没有该属性");
            return Tick::Finish;
        };

        let remaining = self.goal - current;
        if remaining.abs() <= self.step {
            self.target.set_property(self.property, self.goal);
            return Tick::Finish;
        }
        self.target
            .set_property(self.property, current + self.step.copysign(remaining));
        Tick::Continue
    }
}

/// 角色颜色渐变
///
/// Out：设置 `faded` 后逐步变暗到 [`FADED_COLOR`]，结束后保持暗化。
/// In：逐步恢复到 1，结束时清除 `faded`。
#[derive(Debug)]
pub struct ColorFade {
    actor: Actor,
    direction: FadeDirection,
    ramp: PropertyRamp<Actor>,
}

impl ColorFade {
    pub fn new(actor: Actor, direction: FadeDirection, step: f32) -> Self {
        actor.set_faded(true);
        let goal = match direction {
            FadeDirection::In => 1.0,
            FadeDirection::Out => FADED_COLOR,
        };
        Self {
            ramp: PropertyRamp::new(actor.clone(), "color", goal, step),
            actor,
            direction,
        }
    }
}

impl Motion for ColorFade {
    fn tick(&mut self) -> Tick {
        let tick = self.ramp.tick();
        if tick == Tick::Finish && self.direction == FadeDirection::In {
            self.actor.set_faded(false);
        }
        tick
    }
}

/// 计算帧的目标位置
///
/// 优先级：`reset`（回到动画开始时的位置）> `center`（角色中心点）>
/// 显式字段（先用 x/y 覆盖当前位置，再叠加 add_x/add_y）。
pub fn frame_to_target_position(
    frame: &FrameMetadata,
    running: Vec2,
    center: Vec2,
    origin: Vec2,
) -> Vec2 {
    if frame.reset {
        return origin;
    }
    if frame.center {
        return center;
    }
    let mut target = Vec2::new(frame.x.unwrap_or(running.x), frame.y.unwrap_or(running.y));
    target.x += frame.add_x.unwrap_or(0.0);
    target.y += frame.add_y.unwrap_or(0.0);
    target
}

/// 计算帧的目标缩放：显式值 > `center` 时用中心缩放 > 保持不变
pub fn frame_to_target_scale(frame: &FrameMetadata, running: f32, center_scale: f32) -> f32 {
    match frame.scale {
        Some(scale) => scale,
        None if frame.center => center_scale,
        None => running,
    }
}

#[derive(Debug, Clone, Copy)]
struct FramePlan {
    target: Vec2,
    step: Vec2,
    target_scale: f32,
    scale_step: f32,
}

/// 按元数据帧序列移动角色
///
/// 每帧以 `(目标 - 帧起点) * speed` 为步长匀速移动，剩余距离小于
/// [`ARRIVE_EPSILON`] 或不足一步时吸附到目标。帧带有 `delay` 时停顿整秒数。
/// `speed` 恰好为 1 时在第一次 tick 直接吸附到第一帧目标并结束。
#[derive(Debug)]
pub struct ScriptedMotion {
    actor: Actor,
    speed: f32,
    frames: Vec<FrameMetadata>,
    frame_index: usize,
    origin: Vec2,
    plan: Option<FramePlan>,
    base_interval: Duration,
    restore_interval: bool,
}

impl ScriptedMotion {
    pub fn new(actor: Actor, animation: &AnimationMetadata, base_interval: Duration) -> Self {
        let origin = actor.position();
        Self {
            actor,
            speed: animation.speed,
            frames: animation.frames.clone(),
            frame_index: 0,
            origin,
            plan: None,
            base_interval,
            restore_interval: false,
        }
    }

    /// 是否是瞬移动画
    pub fn is_snap(&self) -> bool {
        self.speed == 1.0
    }

    fn plan_frame(&self, index: usize) -> FramePlan {
        let frame = &self.frames[index];
        let start = self.actor.position();
        let start_scale = self.actor.scale();
        let (center, center_scale) = self.actor.center();

        let target = frame_to_target_position(frame, start, center, self.origin);
        let target_scale = frame_to_target_scale(frame, start_scale, center_scale);
        FramePlan {
            target,
            step: (target - start) * self.speed,
            target_scale,
            scale_step: (target_scale - start_scale) * self.speed,
        }
    }

    fn snap_to(&self, plan: &FramePlan) {
        self.actor.set_position(plan.target);
        self.actor.set_scale(plan.target_scale);
    }

    fn continue_tick(&self, restore: bool) -> Tick {
        if restore {
            Tick::Reschedule(self.base_interval)
        } else {
            Tick::Continue
        }
    }
}

impl Motion for ScriptedMotion {
    fn tick(&mut self) -> Tick {
        if self.frames.is_empty() {
            return Tick::Finish;
        }
        if self.is_snap() {
            let plan = self.plan_frame(0);
            self.snap_to(&plan);
            return Tick::Finish;
        }

        let restore = std::mem::take(&mut self.restore_interval);
        if self.frame_index >= self.frames.len() {
            return Tick::Finish;
        }

        let plan = match self.plan {
            Some(plan) => plan,
            None => {
                let plan = self.plan_frame(self.frame_index);
                self.plan = Some(plan);
                plan
            }
        };

        let position = self.actor.position();
        let remaining = (plan.target - position).length();
        let arrived =
            self.speed <= 0.0 || remaining <= ARRIVE_EPSILON || remaining <= plan.step.length();

        if !arrived {
            self.actor.set_position(position + plan.step);
            let scale = self.actor.scale();
            let next_scale = scale + plan.scale_step;
            let overshoot = (plan.target_scale - next_scale) * plan.scale_step < 0.0;
            self.actor
                .set_scale(if overshoot { plan.target_scale } else { next_scale });
            return self.continue_tick(restore);
        }

        self.snap_to(&plan);
        let delay = self.frames[self.frame_index].delay.unwrap_or(0.0);
        self.frame_index += 1;
        self.plan = None;

        let whole_secs = delay.max(0.0).trunc() as u64;
        if whole_secs > 0 {
            self.restore_interval = true;
            return Tick::Reschedule(Duration::from_secs(whole_secs));
        }
        if self.frame_index >= self.frames.len() {
            return Tick::Finish;
        }
        self.continue_tick(restore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animatable::SharedValue;

    const TICK: Duration = Duration::from_millis(16);

    fn run<M: Motion>(motion: &mut M, max: usize) -> Vec<Tick> {
        let mut ticks = Vec::new();
        for _ in 0..max {
            let tick = motion.tick();
            ticks.push(tick);
            if tick == Tick::Finish {
                break;
            }
        }
        ticks
    }

    fn frame() -> FrameMetadata {
        FrameMetadata::default()
    }

    #[test]
    fn test_alpha_ramp_converges_without_overshoot() {
        let value = SharedValue::new(0.0);
        let mut ramp = PropertyRamp::alpha(value.clone(), FadeDirection::In, ALPHA_STEP);
        let mut finishes = 0;
        for _ in 0..100 {
            let tick = ramp.tick();
            assert!(value.get() <= 1.0 && value.get() >= 0.0);
            if tick == Tick::Finish {
                finishes += 1;
                break;
            }
        }
        assert_eq!(finishes, 1);
        assert_eq!(value.get(), 1.0);

        let mut ramp = PropertyRamp::alpha(value.clone(), FadeDirection::Out, ALPHA_STEP);
        let ticks = run(&mut ramp, 100);
        assert_eq!(ticks.last(), Some(&Tick::Finish));
        assert_eq!(value.get(), 0.0);
    }

    #[test]
    fn test_ramp_starting_at() {
        let value = SharedValue::new(0.3);
        let mut ramp = PropertyRamp::alpha(value.clone(), FadeDirection::Out, 0.25).starting_at(1.0);
        assert_eq!(value.get(), 1.0);
        assert_eq!(run(&mut ramp, 10).len(), 4);
        assert_eq!(value.get(), 0.0);
    }

    #[test]
    fn test_volume_ramp_snaps_to_floor() {
        let volume = SharedValue::new(0.0);
        let mut ramp = PropertyRamp::new(volume.clone(), "value", -1.75, VOLUME_STEP);
        let ticks = run(&mut ramp, 10);
        assert_eq!(ticks.len(), 4);
        assert_eq!(volume.get(), -1.75);
    }

    #[test]
    fn test_color_fade_sets_and_clears_faded() {
        let actor = Actor::new("mika");
        let mut fade = ColorFade::new(actor.clone(), FadeDirection::Out, 0.1);
        assert!(actor.is_faded());
        run(&mut fade, 100);
        assert_eq!(actor.color(), [FADED_COLOR; 3]);
        assert!(actor.is_faded());

        let mut fade = ColorFade::new(actor.clone(), FadeDirection::In, 0.1);
        run(&mut fade, 100);
        assert_eq!(actor.color(), [1.0; 3]);
        assert!(!actor.is_faded());
    }

    #[test]
    fn test_frame_target_precedence() {
        let running = Vec2::new(1.0, 1.0);
        let center = Vec2::new(0.0, -0.5);
        let origin = Vec2::new(2.0, 2.0);

        let mut f = frame();
        f.x = Some(5.0);
        f.add_y = Some(0.5);
        assert_eq!(
            frame_to_target_position(&f, running, center, origin),
            Vec2::new(5.0, 1.5)
        );

        f.center = true;
        assert_eq!(frame_to_target_position(&f, running, center, origin), center);

        f.reset = true;
        assert_eq!(frame_to_target_position(&f, running, center, origin), origin);
    }

    #[test]
    fn test_absolute_then_relative() {
        let mut f = frame();
        f.x = Some(1.0);
        f.add_x = Some(0.25);
        let target = frame_to_target_position(&f, Vec2::ZERO, Vec2::ZERO, Vec2::ZERO);
        assert_eq!(target, Vec2::new(1.25, 0.0));
    }

    #[test]
    fn test_target_scale() {
        let mut f = frame();
        assert_eq!(frame_to_target_scale(&f, 0.7, 1.2), 0.7);
        f.center = true;
        assert_eq!(frame_to_target_scale(&f, 0.7, 1.2), 1.2);
        f.scale = Some(2.0);
        assert_eq!(frame_to_target_scale(&f, 0.7, 1.2), 2.0);
    }

    #[test]
    fn test_speed_one_snaps_immediately() {
        let actor = Actor::new("mika");
        let mut f = frame();
        f.x = Some(-2.0);
        f.y = Some(-0.65);
        let animation = AnimationMetadata {
            name: String::new(),
            speed: 1.0,
            frames: vec![f],
        };
        let mut motion = ScriptedMotion::new(actor.clone(), &animation, TICK);
        assert_eq!(motion.tick(), Tick::Finish);
        assert_eq!(actor.position(), Vec2::new(-2.0, -0.65));
    }

    #[test]
    fn test_interpolated_move_reaches_target() {
        let actor = Actor::new("mika");
        let mut f = frame();
        f.x = Some(1.0);
        let animation = AnimationMetadata {
            name: String::new(),
            speed: 0.1,
            frames: vec![f],
        };
        let mut motion = ScriptedMotion::new(actor.clone(), &animation, TICK);
        let ticks = run(&mut motion, 100);
        assert_eq!(ticks.last(), Some(&Tick::Finish));
        assert!(ticks.len() >= 10 && ticks.len() <= 11);
        assert_eq!(actor.position(), Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_frame_delay_reschedules_in_whole_seconds() {
        let actor = Actor::new("mika");
        let mut first = frame();
        first.add_x = Some(0.5);
        first.delay = Some(1.9);
        let mut second = frame();
        second.reset = true;
        let animation = AnimationMetadata {
            name: String::new(),
            speed: 0.5,
            frames: vec![first, second],
        };
        let mut motion = ScriptedMotion::new(actor.clone(), &animation, TICK);

        assert_eq!(motion.tick(), Tick::Continue);
        assert_eq!(motion.tick(), Tick::Reschedule(Duration::from_secs(1)));
        assert_eq!(actor.position(), Vec2::new(0.5, 0.0));

        // 停顿后恢复原间隔
        assert_eq!(motion.tick(), Tick::Reschedule(TICK));
        let rest = run(&mut motion, 10);
        assert_eq!(rest.last(), Some(&Tick::Finish));
        assert_eq!(actor.position(), Vec2::ZERO);
    }

    #[test]
    fn test_center_frame_restores_center_scale() {
        let actor = Actor::new("seia");
        actor.set_center(0.5, -0.65, 0.8);
        let mut f = frame();
        f.center = true;
        let animation = AnimationMetadata {
            name: String::new(),
            speed: 0.25,
            frames: vec![f],
        };
        let mut motion = ScriptedMotion::new(actor.clone(), &animation, TICK);
        run(&mut motion, 100);
        assert_eq!(actor.position(), Vec2::new(0.5, -0.65));
        assert_eq!(actor.scale(), 0.8);
    }
}
