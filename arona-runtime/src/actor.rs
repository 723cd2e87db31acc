//! # Actor 模块
//!
//! 角色的运行时状态：立绘纹理、变换、颜色、透明度、表情叠加层。
//!
//! ## 设计说明
//!
//! `Actor` 是 `Arc<Mutex<ActorData>>` 的句柄，可以在主循环与计时任务之间共享。
//! 计时任务只写入位置、缩放、颜色、透明度与表情帧，主循环每帧读取一次快照用于绘制。

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::animatable::{Animatable, lock};
use crate::animation::Animation;
use crate::error::ActorError;
use crate::geometry::Vec2;
use crate::metadata::ActorMetadata;
use crate::motion::Tick;
use crate::sprite::{AnimatedSprite, Texture};

/// 暗化后的颜色
pub const FADED_COLOR: f32 = 0.3;
/// 剪影颜色
pub const SILHOUETTE_COLOR: f32 = 0.0;

/// 角色内部数据
#[derive(Debug, Clone)]
pub struct ActorData {
    pub name: String,
    /// 显示名
    pub label: String,
    /// 阵营文字
    pub faction: Option<String>,
    textures: BTreeMap<String, Texture>,
    active_texture: Option<String>,
    pub position: Vec2,
    pub scale: f32,
    /// 叠加颜色（RGB）
    pub color: [f32; 3],
    pub alpha: f32,
    pub faded: bool,
    pub silhouette: bool,
    emote_offsets: HashMap<String, Vec2>,
    emote: Option<Animation>,
    center: Vec2,
    center_scale: f32,
}

impl ActorData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: to_title(name),
            faction: None,
            textures: BTreeMap::new(),
            active_texture: None,
            position: Vec2::ZERO,
            scale: 1.0,
            color: [1.0; 3],
            alpha: 1.0,
            faded: false,
            silhouette: false,
            emote_offsets: HashMap::new(),
            emote: None,
            center: Vec2::ZERO,
            center_scale: 1.0,
        }
    }
}

/// 一帧绘制所需的角色信息
#[derive(Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub name: String,
    pub texture: Option<Texture>,
    pub position: Vec2,
    pub scale: f32,
    pub color: [f32; 3],
    pub alpha: f32,
    pub faded: bool,
    pub silhouette: bool,
    /// 当前表情：名字、要绘制的纹理层、缩放、偏移
    pub emote: Option<EmoteSnapshot>,
}

/// 表情叠加层的绘制信息
#[derive(Debug, Clone, PartialEq)]
pub struct EmoteSnapshot {
    pub name: String,
    pub layers: Vec<Texture>,
    pub scale: f32,
    /// 未注册偏移时为零
    pub offset: Vec2,
}

/// 可共享的角色句柄
#[derive(Debug, Clone)]
pub struct Actor {
    inner: Arc<Mutex<ActorData>>,
}

impl Actor {
    pub fn new(name: &str) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ActorData::new(name))),
        }
    }

    /// 按元数据创建角色：中心点、初始位置、阵营文字
    pub fn from_metadata(name: &str, meta: &ActorMetadata) -> Self {
        let actor = Self::new(name);
        {
            let mut data = lock(&actor.inner);
            data.center = Vec2::new(meta.center_x, meta.center_y);
            data.center_scale = meta.center_scale;
            data.position = data.center;
            data.scale = meta.center_scale;
            data.faction = meta.faction_name.clone();
        }
        actor
    }

    /// 复制为新名字的角色（不复制正在播放的表情）
    pub fn clone_as(&self, name: &str) -> Self {
        let mut data = lock(&self.inner).clone();
        data.name = name.to_string();
        data.label = to_title(name);
        data.emote = None;
        Self {
            inner: Arc::new(Mutex::new(data)),
        }
    }

    pub fn name(&self) -> String {
        lock(&self.inner).name.clone()
    }

    /// 两个句柄是否指向同一个角色
    pub fn ptr_eq(&self, other: &Actor) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── 纹理 ──

    /// 加载纹理；key 已存在时不做任何事
    pub fn load_texture(&self, key: &str, texture: Texture) {
        lock(&self.inner)
            .textures
            .entry(key.to_string())
            .or_insert(texture);
    }

    pub fn texture_count(&self) -> usize {
        lock(&self.inner).textures.len()
    }

    pub fn has_texture(&self, key: &str) -> bool {
        lock(&self.inner).textures.contains_key(key)
    }

    /// 切换当前纹理
    pub fn set_active_texture(&self, key: &str) -> Result<(), ActorError> {
        let mut data = lock(&self.inner);
        if !data.textures.contains_key(key) {
            return Err(ActorError::TextureNotFound {
                actor: data.name.clone(),
                key: key.to_string(),
            });
        }
        data.active_texture = Some(key.to_string());
        Ok(())
    }

    pub fn active_texture(&self) -> Option<String> {
        lock(&self.inner).active_texture.clone()
    }

    // ── 变换 ──

    pub fn position(&self) -> Vec2 {
        lock(&self.inner).position
    }

    pub fn set_position(&self, position: Vec2) {
        lock(&self.inner).position = position;
    }

    pub fn translate(&self, delta: Vec2) {
        let mut data = lock(&self.inner);
        data.position = data.position + delta;
    }

    pub fn scale(&self) -> f32 {
        lock(&self.inner).scale
    }

    pub fn set_scale(&self, scale: f32) {
        lock(&self.inner).scale = scale;
    }

    pub fn set_color(&self, color: [f32; 3]) {
        lock(&self.inner).color = color;
    }

    pub fn color(&self) -> [f32; 3] {
        lock(&self.inner).color
    }

    pub fn set_alpha(&self, alpha: f32) {
        lock(&self.inner).alpha = alpha.clamp(0.0, 1.0);
    }

    pub fn alpha(&self) -> f32 {
        lock(&self.inner).alpha
    }

    pub fn center(&self) -> (Vec2, f32) {
        let data = lock(&self.inner);
        (data.center, data.center_scale)
    }

    pub fn set_center(&self, x: f32, y: f32, scale: f32) {
        let mut data = lock(&self.inner);
        data.center = Vec2::new(x, y);
        data.center_scale = scale;
    }

    // ── 外观 ──

    pub fn is_faded(&self) -> bool {
        lock(&self.inner).faded
    }

    pub fn set_faded(&self, faded: bool) {
        lock(&self.inner).faded = faded;
    }

    /// 取消暗化，颜色恢复为白色
    pub fn unfade(&self) {
        let mut data = lock(&self.inner);
        data.faded = false;
        data.color = [1.0; 3];
    }

    pub fn is_silhouette(&self) -> bool {
        lock(&self.inner).silhouette
    }

    pub fn set_silhouette(&self, silhouette: bool) {
        lock(&self.inner).silhouette = silhouette;
    }

    /// 说话人高亮：未暗化、非剪影时，说话人全亮，其他人略暗
    pub fn highlight(&self, speaking: bool) {
        let mut data = lock(&self.inner);
        if data.faded || data.silhouette {
            return;
        }
        let c = if speaking { 1.0 } else { 0.9 };
        data.color = [c; 3];
    }

    // ── 名字 ──

    pub fn label(&self) -> String {
        lock(&self.inner).label.clone()
    }

    pub fn rename(&self, label: &str) {
        lock(&self.inner).label = to_title(label);
    }

    pub fn faction(&self) -> Option<String> {
        lock(&self.inner).faction.clone()
    }

    pub fn set_faction(&self, faction: Option<String>) {
        lock(&self.inner).faction = faction;
    }

    // ── 表情 ──

    pub fn add_emote_offset(&self, emote: &str, offset: Vec2) {
        lock(&self.inner)
            .emote_offsets
            .insert(emote.to_string(), offset);
    }

    /// 查找表情偏移，未注册时为零
    pub fn emote_offset(&self, emote: &str) -> Vec2 {
        lock(&self.inner)
            .emote_offsets
            .get(emote)
            .copied()
            .unwrap_or(Vec2::ZERO)
    }

    /// 开始播放表情
    ///
    /// 已有表情在播放时忽略本次调用并返回 `None`；
    /// 否则返回第一帧延迟，调用方据此启动计时器。
    pub fn begin_emote(&self, sprite: Arc<AnimatedSprite>) -> Option<std::time::Duration> {
        let mut data = lock(&self.inner);
        if data.emote.as_ref().is_some_and(Animation::is_animating) {
            return None;
        }
        let mut animation = Animation::new(sprite);
        let first_delay = animation.begin(false)?;
        data.emote = Some(animation);
        Some(first_delay)
    }

    /// 表情前进一帧
    pub fn tick_emote(&self) -> Tick {
        match lock(&self.inner).emote.as_mut() {
            Some(animation) => animation.tick(),
            None => Tick::Finish,
        }
    }

    /// 表情结束，移除叠加层
    pub fn end_emote(&self) {
        lock(&self.inner).emote = None;
    }

    pub fn is_emoting(&self) -> bool {
        lock(&self.inner)
            .emote
            .as_ref()
            .is_some_and(Animation::is_animating)
    }

    pub fn emote_name(&self) -> Option<String> {
        lock(&self.inner)
            .emote
            .as_ref()
            .map(|a| a.name().to_string())
    }

    /// 读取绘制快照
    pub fn snapshot(&self) -> ActorSnapshot {
        let data = lock(&self.inner);
        let texture = data
            .active_texture
            .as_ref()
            .and_then(|key| data.textures.get(key))
            .cloned();
        let emote = data
            .emote
            .as_ref()
            .filter(|a| a.is_animating())
            .map(|a| EmoteSnapshot {
                name: a.name().to_string(),
                layers: a
                    .sprite()
                    .layers(a.current_frame_index())
                    .into_iter()
                    .cloned()
                    .collect(),
                scale: a.sprite().scale,
                offset: data
                    .emote_offsets
                    .get(a.name())
                    .copied()
                    .unwrap_or(Vec2::ZERO),
            });

        ActorSnapshot {
            name: data.name.clone(),
            texture,
            position: data.position,
            scale: data.scale,
            color: data.color,
            alpha: data.alpha,
            faded: data.faded,
            silhouette: data.silhouette,
            emote,
        }
    }
}

impl Animatable for Actor {
    fn get_property(&self, property_id: &str) -> Option<f32> {
        let data = lock(&self.inner);
        match property_id {
            "x" => Some(data.position.x),
            "y" => Some(data.position.y),
            "scale" => Some(data.scale),
            "alpha" => Some(data.alpha),
            "color" => Some(data.color[0]),
            _ => None,
        }
    }

    fn set_property(&self, property_id: &str, value: f32) -> bool {
        let mut data = lock(&self.inner);
        match property_id {
            "x" => data.position.x = value,
            "y" => data.position.y = value,
            "scale" => data.scale = value,
            "alpha" => data.alpha = value.clamp(0.0, 1.0),
            "color" => data.color = [value.clamp(0.0, 1.0); 3],
            _ => return false,
        }
        true
    }

    fn property_list(&self) -> &'static [&'static str] {
        &["x", "y", "scale", "alpha", "color"]
    }
}

/// 把标识符转换为显示名：`_` 变空格，每个单词首字母大写
pub fn to_title(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize = true;
    for c in s.replace('_', " ").chars() {
        if capitalize {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        capitalize = c == ' ';
    }
    out
}
