//! # Session 模块
//!
//! 场景会话：一次场景运行期间的全部可变状态，以及加载阶段填充的资源注册表。
//! 重新加载时整体重建，不保留任何上一轮的状态。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::actor::{Actor, to_title};
use crate::animatable::SharedValue;
use crate::reply::Reply;
use crate::script::FadeColor;
use crate::sprite::{AnimatedSprite, Texture};
use crate::typewriter::TextReveal;

/// 默认字号缩放
pub const DEFAULT_FONT_SCALE: f32 = 0.85;

/// 会话初始值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDefaults {
    pub font_scale: f32,
    /// BGM 音量（对数刻度）
    pub bgm_volume: f32,
    /// 音效音量（对数刻度）
    pub sfx_volume: f32,
    pub auto_advance: bool,
    pub debug_overlay: bool,
}

impl Default for SessionDefaults {
    fn default() -> Self {
        Self {
            font_scale: DEFAULT_FONT_SCALE,
            bgm_volume: 0.0,
            sfx_volume: 0.0,
            auto_advance: false,
            debug_overlay: false,
        }
    }
}

/// 加载阶段注册的资源
///
/// 只在加载期间写入，之后只读。
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    pub backgrounds: BTreeMap<String, Texture>,
    /// 音效 key（包括与表情同名的音效）
    pub sounds: BTreeSet<String>,
    /// BGM key
    pub music: BTreeSet<String>,
    pub emotes: BTreeMap<String, Arc<AnimatedSprite>>,
    /// 界面素材：对白框、选项底图等
    pub ui: BTreeMap<String, Texture>,
    /// 加载动画
    pub spinner: Option<Arc<AnimatedSprite>>,
}

impl ResourceRegistry {
    pub fn emote(&self, name: &str) -> Option<&Arc<AnimatedSprite>> {
        self.emotes.get(name)
    }
}

/// 全屏淡入淡出遮罩
#[derive(Debug, Clone, Default)]
pub struct FadeOverlay {
    pub color: FadeColor,
    /// 0 为透明
    pub opacity: SharedValue,
}

/// 场景会话
#[derive(Debug, Clone)]
pub struct SceneSession {
    defaults: SessionDefaults,

    pub background: Option<String>,
    pub speaker: Option<String>,
    pub font_scale: f32,
    pub bgm_volume: f32,
    pub sfx_volume: f32,
    pub auto_advance: bool,
    pub debug_overlay: bool,
    /// 调试叠加层显示的消息
    pub debug_messages: Vec<String>,

    /// 当前元素下标；`None` 表示还没有推进过
    pub cursor: Option<usize>,
    /// 已注册的角色
    pub actors: BTreeMap<String, Actor>,
    /// 画面上的角色，按登场顺序
    pub stage: Vec<String>,

    pub dialogue: Option<TextReveal>,
    pub name_label: Option<String>,
    pub faction_label: Option<String>,

    pub replies: Vec<Reply>,
    /// 正在消失的回复选项
    pub dismissed_replies: Vec<Reply>,
    /// 最近一次确认的回复下标
    pub chosen_reply: Option<usize>,

    pub fade: FadeOverlay,
    pub resources: ResourceRegistry,
}

impl SceneSession {
    pub fn new(defaults: SessionDefaults) -> Self {
        Self {
            background: None,
            speaker: None,
            font_scale: defaults.font_scale,
            bgm_volume: defaults.bgm_volume,
            sfx_volume: defaults.sfx_volume,
            auto_advance: defaults.auto_advance,
            debug_overlay: defaults.debug_overlay,
            debug_messages: Vec::new(),
            cursor: None,
            actors: BTreeMap::new(),
            stage: Vec::new(),
            dialogue: None,
            name_label: None,
            faction_label: None,
            replies: Vec::new(),
            dismissed_replies: Vec::new(),
            chosen_reply: None,
            fade: FadeOverlay::default(),
            resources: ResourceRegistry::default(),
            defaults,
        }
    }

    /// 按初始值重建会话，不保留任何字段
    pub fn reset(&mut self) {
        *self = Self::new(self.defaults.clone());
    }

    pub fn defaults(&self) -> &SessionDefaults {
        &self.defaults
    }

    /// 注册角色；同名角色会被替换
    pub fn register_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.name(), actor);
    }

    pub fn actor(&self, name: &str) -> Option<&Actor> {
        self.actors.get(name)
    }

    /// 让角色登场；已在画面上时不做任何事
    pub fn put_on_stage(&mut self, name: &str) {
        if !self.is_on_stage(name) {
            self.stage.push(name.to_string());
        }
    }

    pub fn is_on_stage(&self, name: &str) -> bool {
        self.stage.iter().any(|n| n == name)
    }

    /// 画面上的角色句柄，按登场顺序
    pub fn stage_actors(&self) -> Vec<Actor> {
        self.stage
            .iter()
            .filter_map(|name| self.actors.get(name).cloned())
            .collect()
    }

    /// 清空画面：登场角色、说话人、对白、回复
    pub fn clear_stage(&mut self) {
        self.stage.clear();
        self.speaker = None;
        self.dialogue = None;
        self.name_label = None;
        self.faction_label = None;
        self.replies.clear();
        self.dismissed_replies.clear();
    }

    /// 按当前说话人刷新名字与阵营文字
    pub fn refresh_labels(&mut self) {
        let Some(speaker) = self.speaker.as_deref() else {
            self.name_label = None;
            self.faction_label = None;
            return;
        };
        match self.actors.get(speaker) {
            Some(actor) => {
                self.name_label = Some(actor.label());
                self.faction_label = actor.faction();
            }
            None => {
                self.name_label = Some(to_title(speaker));
                self.faction_label = None;
            }
        }
    }

    /// 追加一条调试消息
    pub fn push_debug(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::debug!(message = %message, "调试消息");
        self.debug_messages.push(message);
    }

    /// 用一批消息替换调试叠加层内容
    pub fn replace_debug(&mut self, messages: Vec<String>) {
        self.debug_messages = messages;
    }
}

impl Default for SceneSession {
    fn default() -> Self {
        Self::new(SessionDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_on_stage_keeps_order_without_duplicates() {
        let mut session = SceneSession::default();
        session.put_on_stage("mika");
        session.put_on_stage("seia");
        session.put_on_stage("mika");
        assert_eq!(session.stage, vec!["mika", "seia"]);
    }

    #[test]
    fn test_clear_stage_keeps_actors_registered() {
        let mut session = SceneSession::default();
        session.register_actor(Actor::new("mika"));
        session.put_on_stage("mika");
        session.speaker = Some("mika".to_string());
        session.dialogue = Some(TextReveal::new("hi"));

        session.clear_stage();
        assert!(session.stage.is_empty());
        assert!(session.speaker.is_none());
        assert!(session.dialogue.is_none());
        assert!(session.actor("mika").is_some());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut session = SceneSession::new(SessionDefaults {
            bgm_volume: -1.0,
            ..SessionDefaults::default()
        });
        session.bgm_volume = -2.0;
        session.sfx_volume = -3.0;
        session.debug_overlay = true;
        session.font_scale = 1.5;
        session.cursor = Some(4);
        session.register_actor(Actor::new("mika"));

        session.reset();
        assert_eq!(session.bgm_volume, -1.0);
        assert_eq!(session.sfx_volume, 0.0);
        assert!(!session.debug_overlay);
        assert_eq!(session.font_scale, DEFAULT_FONT_SCALE);
        assert_eq!(session.cursor, None);
        assert!(session.actors.is_empty());
    }

    #[test]
    fn test_refresh_labels_for_unregistered_speaker() {
        let mut session = SceneSession::default();
        session.speaker = Some("tea_party".to_string());
        session.refresh_labels();
        assert_eq!(session.name_label.as_deref(), Some("Tea Party"));
        assert_eq!(session.faction_label, None);
    }
}
