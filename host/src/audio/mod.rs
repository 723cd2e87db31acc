//! # Audio 模块
//!
//! BGM 与音效的播放状态。实际的解码与输出由 [`AudioDevice`] 实现，
//! 这里只管理“当前播放哪一首、音量多少”。
//!
//! ## 音量刻度
//!
//! 会话中的音量是对数刻度（以 2 为底），`0` 为原始音量，
//! 每降低 1 音量减半。设备收到的是线性增益 `2^level`。
//!
//! ## 淡入淡出
//!
//! BGM 的当前音量保存在一个 [`SharedValue`] 中，淡入淡出由动画任务
//! 渐变这个值，主循环每帧调用 [`AudioController::sync`] 把它应用到设备。

use std::collections::HashMap;

use arona_runtime::SharedValue;
use arona_runtime::script::BgmAction;

use crate::resources::SoundClip;

/// 设备上一条播放流的标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

/// 音频输出设备
pub trait AudioDevice: Send {
    /// 播放一次（音效）
    fn play(&mut self, clip: &SoundClip, gain: f32);

    /// 循环播放（BGM）
    fn play_looping(&mut self, clip: &SoundClip, gain: f32) -> StreamId;

    fn set_volume(&mut self, stream: StreamId, gain: f32);

    fn pause(&mut self, stream: StreamId);

    fn resume(&mut self, stream: StreamId);

    fn stop(&mut self, stream: StreamId);
}

/// 不输出任何声音的设备
#[derive(Debug, Default)]
pub struct SilentDevice {
    next_id: u64,
}

impl AudioDevice for SilentDevice {
    fn play(&mut self, clip: &SoundClip, gain: f32) {
        tracing::trace!(path = %clip.path, gain, "播放音效");
    }

    fn play_looping(&mut self, clip: &SoundClip, gain: f32) -> StreamId {
        self.next_id += 1;
        tracing::trace!(path = %clip.path, gain, stream = self.next_id, "循环播放");
        StreamId(self.next_id)
    }

    fn set_volume(&mut self, _stream: StreamId, _gain: f32) {}

    fn pause(&mut self, _stream: StreamId) {}

    fn resume(&mut self, _stream: StreamId) {}

    fn stop(&mut self, _stream: StreamId) {}
}

/// 已加载的音频
#[derive(Debug, Clone, Default)]
pub struct SoundBank {
    bgm: HashMap<String, SoundClip>,
    sfx: HashMap<String, SoundClip>,
}

impl SoundBank {
    pub fn insert_bgm(&mut self, key: &str, clip: SoundClip) {
        self.bgm.insert(key.to_string(), clip);
    }

    pub fn insert_sfx(&mut self, key: &str, clip: SoundClip) {
        self.sfx.insert(key.to_string(), clip);
    }

    pub fn bgm(&self, key: &str) -> Option<&SoundClip> {
        self.bgm.get(key)
    }

    pub fn sfx(&self, key: &str) -> Option<&SoundClip> {
        self.sfx.get(key)
    }

    pub fn clear(&mut self) {
        self.bgm.clear();
        self.sfx.clear();
    }
}

/// 对数音量转线性增益
pub fn gain(level: f32) -> f32 {
    2f32.powf(level)
}

/// 音量渐变请求，由调用方交给动画任务执行
#[derive(Debug, Clone)]
pub struct VolumeRamp {
    pub level: SharedValue,
    pub from: f32,
    pub to: f32,
    /// 每 tick 的变化量
    pub step: f32,
}

/// 正在播放的 BGM
#[derive(Debug)]
struct CurrentBgm {
    key: String,
    stream: StreamId,
    /// 当前音量（对数刻度），淡入淡出任务写入
    level: SharedValue,
    /// 上一次应用到设备的值
    applied: f32,
    /// 淡出结束后停止
    fading_out: bool,
}

/// 音频控制器
pub struct AudioController {
    device: Box<dyn AudioDevice>,
    bank: SoundBank,
    current: Option<CurrentBgm>,
    /// 最低音量，淡出到此即视为静音
    floor: f32,
    /// 按键调节音量的步长
    step: f32,
}

impl AudioController {
    pub fn new(device: Box<dyn AudioDevice>, floor: f32, step: f32) -> Self {
        Self {
            device,
            bank: SoundBank::default(),
            current: None,
            floor,
            step,
        }
    }

    pub fn bank(&self) -> &SoundBank {
        &self.bank
    }

    pub fn bank_mut(&mut self) -> &mut SoundBank {
        &mut self.bank
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// 当前 BGM 的 key
    pub fn current_bgm(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.key.as_str())
    }

    /// 播放一次音效
    pub fn play_sfx(&mut self, key: &str, level: f32) {
        match self.bank.sfx(key) {
            Some(clip) => self.device.play(clip, gain(level)),
            None => tracing::debug!(key, "音效未加载，跳过"),
        }
    }

    /// 执行 BGM 动作
    ///
    /// 淡入淡出返回需要启动的音量渐变。
    pub fn bgm(&mut self, key: &str, action: BgmAction, level: f32) -> Option<VolumeRamp> {
        match action {
            BgmAction::Play => {
                self.play_bgm(key, level);
                None
            }
            BgmAction::Pause => {
                if let Some(current) = &self.current {
                    self.device.pause(current.stream);
                }
                None
            }
            BgmAction::Resume => {
                if let Some(current) = &self.current {
                    self.device.resume(current.stream);
                }
                None
            }
            BgmAction::Stop => {
                self.stop_bgm();
                None
            }
            BgmAction::FadeIn => {
                let current = self.current.as_mut()?;
                current.fading_out = false;
                Some(VolumeRamp {
                    level: current.level.clone(),
                    from: self.floor,
                    to: level,
                    step: self.step,
                })
            }
            BgmAction::FadeOut => {
                let current = self.current.as_mut()?;
                current.fading_out = true;
                Some(VolumeRamp {
                    level: current.level.clone(),
                    from: current.level.get(),
                    to: self.floor,
                    step: self.step,
                })
            }
        }
    }

    fn play_bgm(&mut self, key: &str, level: f32) {
        let Some(clip) = self.bank.bgm(key) else {
            tracing::debug!(key, "BGM 未加载，跳过");
            return;
        };
        let stream = self.device.play_looping(clip, gain(level));
        if let Some(previous) = self.current.take() {
            self.device.stop(previous.stream);
        }
        tracing::info!(key, "播放 BGM");
        self.current = Some(CurrentBgm {
            key: key.to_string(),
            stream,
            level: SharedValue::new(level),
            applied: level,
            fading_out: false,
        });
    }

    pub fn stop_bgm(&mut self) {
        if let Some(current) = self.current.take() {
            tracing::debug!(key = %current.key, "停止 BGM");
            self.device.stop(current.stream);
        }
    }

    /// 每帧同步：把淡入淡出任务写入的音量应用到设备
    pub fn sync(&mut self) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        let level = current.level.get();
        if current.fading_out && level <= self.floor {
            self.stop_bgm();
            return;
        }
        if level != current.applied {
            current.applied = level;
            self.device.set_volume(current.stream, gain(level));
        }
    }

    /// 调整会话音量后立即应用到正在播放的 BGM
    pub fn set_bgm_level(&mut self, level: f32) {
        if let Some(current) = &self.current {
            current.level.set(level);
        }
        self.sync();
    }

    /// 按步长升降音量，结果限制在 `[floor, 1]`
    pub fn step_level(&self, level: f32, up: bool) -> f32 {
        let next = if up {
            level + self.step
        } else {
            level - self.step
        };
        next.clamp(self.floor, 1.0)
    }

    /// 停止并清空已加载的音频
    pub fn reset(&mut self) {
        self.stop_bgm();
        self.bank.clear();
    }
}
