//! # Metadata 模块
//!
//! 场景元数据：角色中心点、表情偏移、具名位移动画、表情配置。
//!
//! ## 格式
//!
//! ```json
//! {
//!   "actors": { "mika": { "center_x": -0.5, "center_y": -0.65, "center_scale": 1.0 } },
//!   "animations": { "enter_left": { "speed": 0.05, "frames": [{ "x": -2.0 }, { "center": true }] } },
//!   "emotes": { "heart": { "scale": 1.0, "type": "head" } }
//! }
//! ```
//!
//! 旧格式使用 `actor` / `animation` / `emote` 数组，每个条目带 `name` 字段。
//! [`Metadata::migrate`] 把它们合并到映射中：先出现者优先，重复的条目留在旧数组里，
//! 并汇总为一个 [`MetadataError::Duplicates`]。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diagnostic::{DiagnosticResult, analyze_script};
use crate::error::MetadataError;
use crate::script::Script;

/// 二维偏移
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Offset {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
}

impl Offset {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 角色元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActorMetadata {
    /// 仅旧格式使用
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// 阵营文字（显示在名字旁边）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_name: Option<String>,
    #[serde(default)]
    pub center_x: f32,
    #[serde(default)]
    pub center_y: f32,
    #[serde(default = "default_scale")]
    pub center_scale: f32,
    /// head 类表情的偏移
    #[serde(default)]
    pub emote_offset_head: Offset,
    /// bubble 类表情的偏移
    #[serde(default)]
    pub emote_offset_bubble: Offset,
}

impl Default for ActorMetadata {
    fn default() -> Self {
        Self {
            name: String::new(),
            faction_name: None,
            center_x: 0.0,
            center_y: 0.0,
            center_scale: default_scale(),
            emote_offset_head: Offset::default(),
            emote_offset_bubble: Offset::default(),
        }
    }
}

impl ActorMetadata {
    /// 按表情类型选择偏移
    pub fn emote_offset(&self, kind: EmoteKind) -> Offset {
        match kind {
            EmoteKind::Head => self.emote_offset_head,
            EmoteKind::Bubble => self.emote_offset_bubble,
        }
    }
}

/// 位移动画元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimationMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// 每个 tick 移动 `(目标 - 起点) * speed`；恰好为 1 时直接跳到第一帧目标
    pub speed: f32,
    #[serde(default)]
    pub frames: Vec<FrameMetadata>,
}

/// 动画帧：稀疏补丁
///
/// 目标位置的优先级：`reset` > `center` > 显式字段（先 x/y 覆盖，再叠加 add_x/add_y）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_y: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f32>,
    /// 帧结束后的停顿（整秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<f32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub reset: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub center: bool,
}

/// 表情类型，决定使用角色的哪一个偏移
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmoteKind {
    Head,
    #[default]
    Bubble,
}

/// 表情元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmoteMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(rename = "type", default)]
    pub kind: EmoteKind,
}

/// 场景元数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub actors: BTreeMap<String, ActorMetadata>,
    #[serde(default)]
    pub animations: BTreeMap<String, AnimationMetadata>,
    #[serde(default)]
    pub emotes: BTreeMap<String, EmoteMetadata>,

    #[serde(rename = "actor", default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_actors: Vec<ActorMetadata>,
    #[serde(rename = "animation", default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_animations: Vec<AnimationMetadata>,
    #[serde(rename = "emote", default, skip_serializing_if = "Vec::is_empty")]
    pub legacy_emotes: Vec<EmoteMetadata>,
}

/// 一次迁移的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    /// 是否检测到旧格式并完成了迁移
    pub migrated: bool,
    /// 重复的条目，形如 `actor "mika"`
    pub duplicates: Vec<String>,
}

impl MigrationReport {
    /// 将重复条目汇总成一个错误
    pub fn duplicates_error(&self) -> Option<MetadataError> {
        if self.duplicates.is_empty() {
            None
        } else {
            Some(MetadataError::Duplicates {
                entries: self.duplicates.clone(),
            })
        }
    }
}

impl Metadata {
    /// 从 JSON 文本解析
    pub fn from_json(text: &str) -> Result<Self, MetadataError> {
        serde_json::from_str(text).map_err(|e| MetadataError::Json(e.to_string()))
    }

    /// 序列化为以制表符缩进的 JSON
    pub fn to_json_pretty(&self) -> Result<String, MetadataError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)
            .map_err(|e| MetadataError::Json(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| MetadataError::Json(e.to_string()))
    }

    /// 是否含有旧格式数组
    pub fn is_legacy(&self) -> bool {
        !self.legacy_actors.is_empty()
            || !self.legacy_animations.is_empty()
            || !self.legacy_emotes.is_empty()
    }

    /// 将旧格式数组迁移到映射
    ///
    /// 迁移后旧数组只保留重复的条目，调用方负责持久化。
    pub fn migrate(&mut self) -> MigrationReport {
        let mut report = MigrationReport {
            migrated: self.is_legacy(),
            duplicates: Vec::new(),
        };

        let actors = std::mem::take(&mut self.legacy_actors);
        self.legacy_actors = merge_legacy(&mut self.actors, actors, "actor", &mut report, |a| {
            &mut a.name
        });

        let emotes = std::mem::take(&mut self.legacy_emotes);
        self.legacy_emotes = merge_legacy(&mut self.emotes, emotes, "emote", &mut report, |e| {
            &mut e.name
        });

        let animations = std::mem::take(&mut self.legacy_animations);
        self.legacy_animations = merge_legacy(
            &mut self.animations,
            animations,
            "animation",
            &mut report,
            |a| &mut a.name,
        );

        if report.migrated {
            tracing::info!(
                actors = self.actors.len(),
                animations = self.animations.len(),
                emotes = self.emotes.len(),
                duplicates = report.duplicates.len(),
                "检测到旧格式元数据，已完成迁移"
            );
        }
        report
    }

    pub fn actor(&self, name: &str) -> Option<&ActorMetadata> {
        self.actors.get(name)
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationMetadata> {
        self.animations.get(name)
    }

    pub fn emote(&self, name: &str) -> Option<&EmoteMetadata> {
        self.emotes.get(name)
    }

    /// 检查脚本引用的表情与动画是否都已声明
    pub fn validate(&self, script: &Script) -> DiagnosticResult {
        analyze_script(script, self)
    }
}

/// 合并一种旧条目，返回重复的条目
fn merge_legacy<T>(
    map: &mut BTreeMap<String, T>,
    legacy: Vec<T>,
    kind: &str,
    report: &mut MigrationReport,
    name_of: impl Fn(&mut T) -> &mut String,
) -> Vec<T> {
    let mut leftovers = Vec::new();
    for mut entry in legacy {
        let name = name_of(&mut entry).clone();
        if map.contains_key(&name) {
            report.duplicates.push(format!("{} \"{}\"", kind, name));
            leftovers.push(entry);
        } else {
            name_of(&mut entry).clear();
            map.insert(name, entry);
        }
    }
    leftovers
}

fn default_scale() -> f32 {
    1.0
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_metadata() {
        let json = r#"{
            "actors": { "mika": { "faction_name": "Tea Party", "center_x": -0.5, "center_y": -0.65,
                "emote_offset_head": { "x": 0.1, "y": 0.4 } } },
            "animations": { "enter_left": { "speed": 0.05, "frames": [{ "x": -2.0 }, { "center": true, "delay": 1 }] } },
            "emotes": { "heart": { "scale": 0.5, "type": "head" } }
        }"#;
        let meta = Metadata::from_json(json).unwrap();

        let mika = meta.actor("mika").unwrap();
        assert_eq!(mika.faction_name.as_deref(), Some("Tea Party"));
        assert_eq!(mika.center_scale, 1.0);
        assert_eq!(mika.emote_offset(EmoteKind::Head), Offset::new(0.1, 0.4));
        assert_eq!(mika.emote_offset(EmoteKind::Bubble), Offset::default());

        let anim = meta.animation("enter_left").unwrap();
        assert_eq!(anim.frames.len(), 2);
        assert_eq!(anim.frames[0].x, Some(-2.0));
        assert_eq!(anim.frames[0].y, None);
        assert!(anim.frames[1].center);
        assert_eq!(anim.frames[1].delay, Some(1.0));

        assert_eq!(meta.emote("heart").unwrap().kind, EmoteKind::Head);
        assert!(!meta.is_legacy());
    }

    #[test]
    fn test_migrate_legacy_arrays() {
        let json = r#"{
            "actor": [ { "name": "mika", "center_x": 1.0 }, { "name": "seia" } ],
            "emote": [ { "name": "heart", "scale": 1.0, "type": "bubble" } ]
        }"#;
        let mut meta = Metadata::from_json(json).unwrap();
        assert!(meta.is_legacy());

        let report = meta.migrate();
        assert!(report.migrated);
        assert!(report.duplicates.is_empty());
        assert!(report.duplicates_error().is_none());
        assert_eq!(meta.actors.len(), 2);
        assert_eq!(meta.actors["mika"].center_x, 1.0);
        assert_eq!(meta.actors["mika"].name, "");
        assert!(meta.emotes.contains_key("heart"));
        assert!(!meta.is_legacy());
    }

    #[test]
    fn test_migrate_first_occurrence_wins() {
        let json = r#"{
            "actors": { "mika": { "center_x": 5.0 } },
            "actor": [ { "name": "mika", "center_x": 1.0 }, { "name": "seia", "center_x": 2.0 },
                       { "name": "seia", "center_x": 3.0 } ]
        }"#;
        let mut meta = Metadata::from_json(json).unwrap();
        let report = meta.migrate();

        assert_eq!(meta.actors["mika"].center_x, 5.0);
        assert_eq!(meta.actors["seia"].center_x, 2.0);
        assert_eq!(
            report.duplicates,
            vec!["actor \"mika\"".to_string(), "actor \"seia\"".to_string()]
        );
        // 重复的条目留在旧数组里
        assert_eq!(meta.legacy_actors.len(), 2);
        assert_eq!(meta.legacy_actors[0].name, "mika");

        let err = report.duplicates_error().unwrap();
        assert_eq!(
            err.to_string(),
            "元数据存在重复条目: actor \"mika\", actor \"seia\""
        );
    }

    #[test]
    fn test_migrate_is_noop_for_canonical() {
        let mut meta = Metadata::from_json(r#"{ "actors": {} }"#).unwrap();
        let report = meta.migrate();
        assert_eq!(report, MigrationReport::default());
    }

    #[test]
    fn test_pretty_json_uses_tabs_and_roundtrips() {
        let mut meta = Metadata::default();
        meta.emotes.insert(
            "sweat".to_string(),
            EmoteMetadata {
                name: String::new(),
                scale: 1.0,
                kind: EmoteKind::Bubble,
            },
        );
        let text = meta.to_json_pretty().unwrap();
        assert!(text.contains("\n\t\"emotes\""));
        assert!(!text.contains("\"emote\""));
        assert_eq!(Metadata::from_json(&text).unwrap(), meta);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Metadata::from_json("{ not json"),
            Err(MetadataError::Json(_))
        ));
    }
}
