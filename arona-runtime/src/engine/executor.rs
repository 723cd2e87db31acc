//! # Executor 模块
//!
//! 把单个脚本元素转换为会话修改与 Command。
//!
//! ## 职责
//!
//! - 按指令修改 [`SceneSession`]
//! - 产生需要 Host 执行的 Command
//! - 决定回合是继续链式推进、停下等待点击，还是等待某个信号

use crate::actor::{Actor, FADED_COLOR, SILHOUETTE_COLOR};
use crate::command::Command;
use crate::error::RuntimeError;
use crate::input::Ticket;
use crate::metadata::Metadata;
use crate::reply::Reply;
use crate::script::{BgmAction, Directive, FontSize, ScriptElement, StageAction};
use crate::session::SceneSession;
use crate::typewriter::TextReveal;

use super::EngineConfig;

/// 元素执行完之后的去向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// 立即处理下一个元素
    Chain,
    /// 停下，等待点击或自动推进
    Yield,
    /// 停下，收到 `Completed(ticket)` 后推进
    Wait(Ticket),
    /// 进入回复确认；单选项时由计时器信号确认
    Confirm(Option<Ticket>),
}

/// 执行结果
#[derive(Debug)]
pub struct ExecuteResult {
    /// 产生的命令
    pub commands: Vec<Command>,
    pub flow: Flow,
    /// 新对白的逐字显示凭据
    pub reveal: Option<Ticket>,
}

impl ExecuteResult {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
            flow: Flow::Chain,
            reveal: None,
        }
    }

    fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    fn flow(mut self, flow: Flow) -> Self {
        self.flow = flow;
        self
    }
}

/// 元素执行器
///
/// 持有凭据计数器，凭据在整个引擎生命周期内单调递增。
#[derive(Debug, Default)]
pub struct Executor {
    next_ticket: u64,
}

impl Executor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配新的等待凭据
    pub fn issue_ticket(&mut self) -> Ticket {
        self.next_ticket += 1;
        Ticket(self.next_ticket)
    }

    /// 执行单个元素
    pub fn execute(
        &mut self,
        element: &ScriptElement,
        session: &mut SceneSession,
        metadata: &Metadata,
        config: &EngineConfig,
    ) -> Result<ExecuteResult, RuntimeError> {
        let mut result = ExecuteResult::new();

        match &element.directive {
            Directive::Delay(after) => {
                let ticket = self.issue_ticket();
                result.push(Command::ScheduleSignal {
                    after: *after,
                    ticket,
                });
                return Ok(result.flow(Flow::Wait(ticket)));
            }

            Directive::Defect { actor, text } => {
                match session.actor(actor) {
                    Some(a) if a.faction().is_some() => {
                        a.set_faction(Some(text.clone()));
                        session.refresh_labels();
                    }
                    _ => tracing::debug!(actor = %actor, "角色没有阵营文字，忽略 defect"),
                }
            }

            Directive::Clear => {
                session.clear_stage();
                result.push(Command::ClearStage);
            }

            Directive::Background(key) => {
                if !session.resources.backgrounds.contains_key(key) {
                    result.push(Command::Debug {
                        message: format!("背景 '{}' 未加载", key),
                    });
                }
                session.background = Some(key.clone());
                result.push(Command::ShowBackground { key: key.clone() });
            }

            Directive::Sfx(key) => {
                if session.resources.sounds.contains(key) {
                    result.push(Command::PlaySfx { key: key.clone() });
                } else {
                    tracing::debug!(key = %key, "音效未注册，跳过");
                }
            }

            Directive::Bgm { key, action } => {
                if *action == BgmAction::Play && !session.resources.music.contains(key) {
                    tracing::debug!(key = %key, "BGM 未注册，跳过");
                } else {
                    result.push(Command::Bgm {
                        key: key.clone(),
                        action: *action,
                    });
                }
            }

            Directive::SceneFade { direction, color } => {
                session.fade.color = *color;
                let ticket = self.issue_ticket();
                result.push(Command::SceneFade {
                    direction: *direction,
                    color: *color,
                    ticket,
                });
                return Ok(result.flow(Flow::Wait(ticket)));
            }

            Directive::FontSize(size) => {
                session.font_scale = match size {
                    FontSize::Scale(scale) => *scale,
                    FontSize::Reset => session.defaults().font_scale,
                };
            }

            Directive::Branch => return Ok(self.present_replies(element, session, config)),

            Directive::None => {
                session.dialogue = None;
            }

            Directive::Clone { source, target } => match session.actor(source) {
                Some(actor) => {
                    let copy = actor.clone_as(target);
                    session.register_actor(copy);
                }
                None => tracing::warn!(source = %source, target = %target, "clone 的来源角色未注册"),
            },

            Directive::All { emote } => {
                return self.all_turn(element, emote.as_deref(), session, metadata);
            }

            Directive::Speaker(action) => {
                return self.actor_turn(element, action, session, metadata);
            }

            Directive::Invalid(err) => {
                tracing::warn!(line = element.line_number, error = %err, "跳过无效指令");
            }
        }

        Ok(result)
    }

    /// 分支回复
    fn present_replies(
        &mut self,
        element: &ScriptElement,
        session: &mut SceneSession,
        config: &EngineConfig,
    ) -> ExecuteResult {
        let mut result = ExecuteResult::new();
        if element.lines.is_empty() {
            tracing::warn!(line = element.line_number, "回复没有任何选项，跳过");
            return result;
        }
        if element.lines.len() > 2 {
            tracing::warn!(
                line = element.line_number,
                count = element.lines.len(),
                "回复最多两个选项，多余的被忽略"
            );
        }

        session.replies = Reply::layout(&element.lines, &config.reply_layout);
        session.chosen_reply = None;
        result.push(Command::PresentReplies);

        if session.replies.len() == 1 {
            let ticket = self.issue_ticket();
            result.push(Command::ScheduleSignal {
                after: config.reply_confirm_delay,
                ticket,
            });
            result.flow(Flow::Confirm(Some(ticket)))
        } else {
            result.flow(Flow::Confirm(None))
        }
    }

    /// 设置说话人、名字与对白
    fn begin_turn(
        &mut self,
        element: &ScriptElement,
        session: &mut SceneSession,
        result: &mut ExecuteResult,
    ) {
        session.speaker = Some(element.name.clone());
        session.refresh_labels();

        if element.has_dialogue() {
            session.dialogue = Some(TextReveal::new(&element.display_text()));
            let ticket = self.issue_ticket();
            result.reveal = Some(ticket);
            result.push(Command::RevealDialogue { ticket });
        }
    }

    /// 普通角色回合
    fn actor_turn(
        &mut self,
        element: &ScriptElement,
        action: &StageAction,
        session: &mut SceneSession,
        metadata: &Metadata,
    ) -> Result<ExecuteResult, RuntimeError> {
        let mut result = ExecuteResult::new();
        self.begin_turn(element, session, &mut result);

        let idle = if element.has_dialogue() {
            Flow::Yield
        } else {
            Flow::Chain
        };

        let Some(actor) = session.actor(&element.name).cloned() else {
            tracing::trace!(name = %element.name, "角色未注册，无画面效果");
            return Ok(result.flow(idle));
        };
        if *action != StageAction::OffScreen {
            session.put_on_stage(&element.name);
        }

        match action {
            StageAction::OffScreen => {}

            StageAction::Emote(name) => {
                if metadata.emote(name).is_none() {
                    return Err(RuntimeError::UnknownEmote { name: name.clone() });
                }
                let Some(sprite) = session.resources.emote(name) else {
                    result.push(Command::Debug {
                        message: format!("表情 '{}' 未加载", name),
                    });
                    return Ok(result.flow(idle));
                };
                let duration = sprite.total_duration();
                result.push(Command::StartEmote {
                    actor: element.name.clone(),
                    emote: name.clone(),
                    with_sound: session.resources.sounds.contains(name),
                });
                if element.has_dialogue() {
                    return Ok(result.flow(Flow::Yield));
                }
                let ticket = self.issue_ticket();
                result.push(Command::ScheduleSignal {
                    after: duration,
                    ticket,
                });
                return Ok(result.flow(Flow::Wait(ticket)));
            }

            StageAction::Full => actor.unfade(),

            StageAction::Fade(direction) => result.push(Command::FadeActor {
                actor: element.name.clone(),
                direction: *direction,
            }),

            StageAction::Silhouette(on) => apply_silhouette(&actor, *on),

            StageAction::Defect(text) => {
                actor.set_faction(text.clone());
                session.refresh_labels();
            }

            StageAction::Rename(label) => {
                actor.rename(label);
                session.refresh_labels();
            }

            StageAction::Pose {
                texture,
                animation,
                asynchronous,
            } => {
                if let Err(err) = actor.set_active_texture(texture) {
                    result.push(Command::Debug {
                        message: err.to_string(),
                    });
                }

                let Some(name) = animation else {
                    return Ok(result.flow(idle));
                };
                if metadata.animation(name).is_none() {
                    tracing::info!(animation = %name, "动画未注册，跳过");
                    return Ok(result.flow(idle));
                }

                if *asynchronous {
                    result.push(Command::AnimateActor {
                        actor: element.name.clone(),
                        animation: name.clone(),
                        ticket: None,
                    });
                    return Ok(result.flow(Flow::Chain));
                }
                if element.has_dialogue() {
                    result.push(Command::AnimateActor {
                        actor: element.name.clone(),
                        animation: name.clone(),
                        ticket: None,
                    });
                    return Ok(result.flow(Flow::Yield));
                }
                let ticket = self.issue_ticket();
                result.push(Command::AnimateActor {
                    actor: element.name.clone(),
                    animation: name.clone(),
                    ticket: Some(ticket),
                });
                return Ok(result.flow(Flow::Wait(ticket)));
            }
        }

        Ok(result.flow(idle))
    }

    /// 对画面上所有角色生效的回合
    fn all_turn(
        &mut self,
        element: &ScriptElement,
        emote: Option<&str>,
        session: &mut SceneSession,
        metadata: &Metadata,
    ) -> Result<ExecuteResult, RuntimeError> {
        let mut result = ExecuteResult::new();
        self.begin_turn(element, session, &mut result);
        // all 不是角色，不显示名字
        session.name_label = None;
        session.faction_label = None;

        let mut played = None;
        if let Some(name) = emote {
            if metadata.emote(name).is_none() {
                return Err(RuntimeError::UnknownEmote {
                    name: name.to_string(),
                });
            }
            match session.resources.emote(name) {
                Some(sprite) if !session.stage.is_empty() => {
                    for actor in &session.stage {
                        result.push(Command::StartEmote {
                            actor: actor.clone(),
                            emote: name.to_string(),
                            with_sound: false,
                        });
                    }
                    if session.resources.sounds.contains(name) {
                        result.push(Command::PlaySfx {
                            key: name.to_string(),
                        });
                    }
                    played = Some(sprite.total_duration());
                }
                Some(_) => tracing::debug!(emote = %name, "画面上没有角色"),
                None => result.push(Command::Debug {
                    message: format!("表情 '{}' 未加载", name),
                }),
            }
        }

        if element.has_dialogue() {
            return Ok(result.flow(Flow::Yield));
        }
        match played {
            Some(after) => {
                let ticket = self.issue_ticket();
                result.push(Command::ScheduleSignal { after, ticket });
                Ok(result.flow(Flow::Wait(ticket)))
            }
            None => Ok(result),
        }
    }
}

/// 剪影开关：开启时颜色变为黑色，关闭时按暗化状态恢复
fn apply_silhouette(actor: &Actor, on: bool) {
    actor.set_silhouette(on);
    if on {
        actor.set_color([SILHOUETTE_COLOR; 3]);
    } else if actor.is_faded() {
        actor.set_color([FADED_COLOR; 3]);
    } else {
        actor.set_color([1.0; 3]);
    }
}
