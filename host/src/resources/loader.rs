//! # Loader 模块
//!
//! 场景资源加载队列。
//!
//! ## 执行模型
//!
//! ```text
//! producer task ──LoadEvent──► channel ──► LoadQueue::step()（每帧最多一个）
//! ```
//!
//! 生产者根据脚本与元数据生成加载事件并发送到通道；主循环每帧消费至多一个事件，
//! 通过 [`AssetSource`] 加载并写入会话的资源注册表。失败的事件不会中断加载，
//! 错误累积成一批，在队列耗尽后一次性交给调试叠加层。

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use arona_runtime::metadata::EmoteMetadata;
use arona_runtime::reply::REPLY_SPRITE;
use arona_runtime::script::PLACEHOLDER;
use arona_runtime::{
    Actor, Directive, Metadata, ResourceKind, SceneSession, Script, extract_resource_references,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::path;
use super::{AssetError, AssetSource};
use crate::audio::SoundBank;

/// 单个加载请求
#[derive(Debug, Clone, PartialEq)]
pub enum LoadEvent {
    /// 界面纹理
    Ui { key: String },
    Background { key: String },
    Music { key: String },
    Sound { key: String },
    /// 表情动画，以及与它同名的可选音效
    Emote { name: String, meta: EmoteMetadata },
    /// 创建角色
    Actor { name: String },
    /// 角色立绘
    ActorTexture { actor: String, mood: String },
}

/// 根据脚本与元数据生成加载计划
///
/// clone 的目标角色不单独加载，它引用的立绘加载到源角色上，
/// clone 时随源角色一起复制。
pub fn plan_loads(script: &Script, metadata: &Metadata) -> Vec<LoadEvent> {
    let clone_sources: BTreeMap<&str, &str> = script
        .elements
        .iter()
        .filter_map(|e| match &e.directive {
            Directive::Clone { source, target } => Some((target.as_str(), source.as_str())),
            _ => None,
        })
        .collect();
    let owner_of = |name: &str| -> String {
        clone_sources.get(name).copied().unwrap_or(name).to_string()
    };

    let mut events = vec![
        LoadEvent::Ui {
            key: path::TEXT_OVERLAY.to_string(),
        },
        LoadEvent::Ui {
            key: REPLY_SPRITE.to_string(),
        },
    ];

    let references = extract_resource_references(script);
    let mut actors = BTreeSet::new();
    let mut textures = BTreeSet::new();
    for source in clone_sources.values() {
        actors.insert(source.to_string());
    }

    for reference in references {
        let key = reference.key.clone();
        if key == PLACEHOLDER {
            continue;
        }
        match reference.kind {
            ResourceKind::Background => events.push(LoadEvent::Background { key }),
            ResourceKind::Bgm => events.push(LoadEvent::Music { key }),
            ResourceKind::Sfx => events.push(LoadEvent::Sound { key }),
            ResourceKind::Emote => match metadata.emote(&key) {
                Some(meta) => events.push(LoadEvent::Emote {
                    name: key,
                    meta: meta.clone(),
                }),
                None => tracing::debug!(emote = %key, "表情未声明，不加载"),
            },
            ResourceKind::Actor => {
                actors.insert(owner_of(&key));
            }
            ResourceKind::ActorTexture => {
                if let Some(mood) = reference.variant {
                    textures.insert((owner_of(&key), mood));
                }
            }
        }
    }

    events.extend(actors.into_iter().map(|name| LoadEvent::Actor { name }));
    events.extend(
        textures
            .into_iter()
            .map(|(actor, mood)| LoadEvent::ActorTexture { actor, mood }),
    );
    events
}

/// 一帧加载的结果
#[derive(Debug, Clone, PartialEq)]
pub enum LoadProgress {
    /// 本帧没有事件或事件已处理，队列还没结束
    Pending,
    /// 队列耗尽，附带累积的错误
    Finished { errors: Vec<AssetError> },
}

/// 加载队列（消费端）
#[derive(Debug)]
pub struct LoadQueue {
    rx: mpsc::UnboundedReceiver<LoadEvent>,
    producer: JoinHandle<()>,
    errors: Vec<AssetError>,
    loaded: usize,
    finished: bool,
}

impl LoadQueue {
    /// 启动生产者任务
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn start(script: &Script, metadata: &Metadata) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let events = plan_loads(script, metadata);
        tracing::info!(events = events.len(), "开始加载场景资源");

        let producer = tokio::spawn(async move {
            for event in events {
                if tx.send(event).is_err() {
                    tracing::debug!("加载队列已关闭，停止发送");
                    break;
                }
            }
        });

        Self {
            rx,
            producer,
            errors: Vec::new(),
            loaded: 0,
            finished: false,
        }
    }

    /// 已处理的事件数
    pub fn loaded(&self) -> usize {
        self.loaded
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// 中止生产者
    pub fn abort(&self) {
        self.producer.abort();
    }

    /// 消费至多一个事件
    pub fn step(
        &mut self,
        source: &dyn AssetSource,
        metadata: &Metadata,
        session: &mut SceneSession,
        sounds: &mut SoundBank,
    ) -> LoadProgress {
        if self.finished {
            return LoadProgress::Finished { errors: Vec::new() };
        }

        match self.rx.try_recv() {
            Ok(event) => {
                self.loaded += 1;
                if let Err(err) = apply(&event, source, metadata, session, sounds) {
                    tracing::warn!(error = %err, "资源加载失败");
                    self.errors.push(err);
                }
                LoadProgress::Pending
            }
            Err(mpsc::error::TryRecvError::Empty) => LoadProgress::Pending,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                self.finished = true;
                tracing::info!(
                    loaded = self.loaded,
                    errors = self.errors.len(),
                    "场景资源加载完成"
                );
                LoadProgress::Finished {
                    errors: std::mem::take(&mut self.errors),
                }
            }
        }
    }
}

impl Drop for LoadQueue {
    fn drop(&mut self) {
        self.producer.abort();
    }
}

/// 处理单个加载事件
fn apply(
    event: &LoadEvent,
    source: &dyn AssetSource,
    metadata: &Metadata,
    session: &mut SceneSession,
    sounds: &mut SoundBank,
) -> Result<(), AssetError> {
    let resources = &mut session.resources;
    match event {
        LoadEvent::Ui { key } => {
            let texture = source.load_texture(&path::ui_texture(key))?;
            resources.ui.insert(key.clone(), texture);
        }

        LoadEvent::Background { key } => {
            let texture = source.load_texture(&path::background(key))?;
            resources.backgrounds.insert(key.clone(), texture);
        }

        LoadEvent::Music { key } => {
            let clip = source.load_sound(&path::bgm(key))?;
            sounds.insert_bgm(key, clip);
            resources.music.insert(key.clone());
        }

        LoadEvent::Sound { key } => {
            let clip = source.load_sound(&path::sfx(key))?;
            sounds.insert_sfx(key, clip);
            resources.sounds.insert(key.clone());
        }

        LoadEvent::Emote { name, meta } => {
            let sprite = source
                .load_animated(name, &path::emote(name))?
                .with_scale(meta.scale);
            resources.emotes.insert(name.clone(), Arc::new(sprite));

            let sound_path = path::sfx(name);
            if source.exists(&sound_path) {
                let clip = source.load_sound(&sound_path)?;
                sounds.insert_sfx(name, clip);
                resources.sounds.insert(name.clone());
            }
        }

        LoadEvent::Actor { name } => {
            let actor = match metadata.actor(name) {
                Some(meta) => {
                    let actor = Actor::from_metadata(name, meta);
                    for (emote, emote_meta) in &metadata.emotes {
                        actor.add_emote_offset(emote, meta.emote_offset(emote_meta.kind).into());
                    }
                    actor
                }
                None => {
                    tracing::debug!(actor = %name, "角色没有元数据，使用默认位置");
                    Actor::new(name)
                }
            };
            session.register_actor(actor);
        }

        LoadEvent::ActorTexture { actor, mood } => {
            let texture = source.load_texture(&path::actor_texture(actor, mood))?;
            match session.actor(actor) {
                Some(a) => a.load_texture(mood, texture),
                None => tracing::warn!(actor = %actor, "立绘的角色尚未创建"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arona_runtime::Parser;

    const METADATA: &str = r#"{
        "actors": { "mika": { "center_x": -0.5, "emote_offset_head": { "x": 0.1, "y": 0.3 } } },
        "emotes": { "heart": { "type": "head", "scale": 0.5 } }
    }"#;

    #[test]
    fn test_plan_loads() {
        let script = Parser::new().parse(
            "test",
            "[bg - sunset - _]\n[bgm - aoharu - _]\n[bgm - _ - pause]\n[sfx - bell - _]\n\
             [mika - 01 - _]\nHi.\n[mika - emote - heart]\n[clone - mika - mika_past]\n\
             [mika_past - 03 - _]\n[all - emote - blush]",
        );
        let metadata = Metadata::from_json(METADATA).unwrap();
        let events = plan_loads(&script, &metadata);

        assert_eq!(
            events,
            vec![
                LoadEvent::Ui {
                    key: "text_overlay".to_string()
                },
                LoadEvent::Ui {
                    key: "text_option_single".to_string()
                },
                LoadEvent::Background {
                    key: "sunset".to_string()
                },
                LoadEvent::Music {
                    key: "aoharu".to_string()
                },
                LoadEvent::Sound {
                    key: "bell".to_string()
                },
                LoadEvent::Emote {
                    name: "heart".to_string(),
                    meta: metadata.emote("heart").cloned().unwrap(),
                },
                LoadEvent::Actor {
                    name: "mika".to_string()
                },
                LoadEvent::ActorTexture {
                    actor: "mika".to_string(),
                    mood: "01".to_string()
                },
                LoadEvent::ActorTexture {
                    actor: "mika".to_string(),
                    mood: "03".to_string()
                },
            ]
        );
    }
}
