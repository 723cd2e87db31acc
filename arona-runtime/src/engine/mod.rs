//! # Engine 模块
//!
//! 场景回合状态机。
//!
//! ## 执行模型
//!
//! ```text
//! advance()              -> Vec<Command>   点击 / 自动推进
//! handle_signal(signal)  -> Vec<Command>   异步工作完成
//! confirm_reply(index)                     回复确认
//! ```
//!
//! 1. 释放仍在显示的回复选项
//! 2. 游标前进一格，越过末尾则进入 `Done`
//! 3. 执行元素；同步元素在同一次调用内继续处理下一个（循环而非递归）
//! 4. 遇到需要等待的元素时停下，记录等待凭据
//!
//! 引擎本身不做任何 IO，也不持有计时器；所有时间相关的效果都以 Command 交给 Host，
//! 完成后由 Host 回传带凭据的 [`Signal`]。凭据不匹配的信号被视为过期并忽略。

mod executor;

#[cfg(test)]
mod tests;

pub use executor::{ExecuteResult, Executor, Flow};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::command::Command;
use crate::error::RuntimeError;
use crate::input::{Signal, Ticket};
use crate::metadata::Metadata;
use crate::reply::ReplyLayout;
use crate::script::Script;
use crate::session::{SceneSession, SessionDefaults};
use crate::state::TurnState;

/// 引擎配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 对白显示完成后自动推进的等待时间
    pub auto_advance_delay: Duration,
    /// 单选项回复出现后自动确认的等待时间
    pub reply_confirm_delay: Duration,
    pub reply_layout: ReplyLayout,
    pub session: SessionDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            auto_advance_delay: Duration::from_secs(1),
            reply_confirm_delay: Duration::from_secs(2),
            reply_layout: ReplyLayout::default(),
            session: SessionDefaults::default(),
        }
    }
}

/// 正在等待的信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pending {
    /// 当前回合的动画或计时器
    Turn(Ticket),
    /// 对白显示完成后的自动推进
    AutoAdvance(Ticket),
    /// 单选项回复的自动确认
    Confirm(Ticket),
}

impl Pending {
    fn ticket(&self) -> Ticket {
        match self {
            Self::Turn(t) | Self::AutoAdvance(t) | Self::Confirm(t) => *t,
        }
    }
}

/// 场景引擎
pub struct Engine {
    script: Script,
    metadata: Metadata,
    config: EngineConfig,
    session: SceneSession,
    state: TurnState,
    executor: Executor,
    pending: Option<Pending>,
    /// 当前对白的逐字显示凭据
    reveal: Option<Ticket>,
}

impl Engine {
    /// 创建引擎，初始状态为 `Loading`
    pub fn new(script: Script, metadata: Metadata, config: EngineConfig) -> Self {
        let session = SceneSession::new(config.session.clone());
        Self {
            script,
            metadata,
            config,
            session,
            state: TurnState::Loading,
            executor: Executor::new(),
            pending: None,
            reveal: None,
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> &SceneSession {
        &self.session
    }

    /// 会话的可变引用；加载阶段用它注册资源与角色
    pub fn session_mut(&mut self) -> &mut SceneSession {
        &mut self.session
    }

    /// 加载阶段同时读取元数据并写入会话
    pub fn loading_parts(&mut self) -> (&Metadata, &mut SceneSession) {
        (&self.metadata, &mut self.session)
    }

    pub fn is_finished(&self) -> bool {
        self.state == TurnState::Done
    }

    /// 加载完成，进入 `Idle` 并处理第一个回合
    pub fn finish_loading(&mut self) -> Result<Vec<Command>, RuntimeError> {
        if self.state != TurnState::Loading {
            return Err(RuntimeError::StateMismatch {
                expected: TurnState::Loading.to_string(),
                actual: self.state.to_string(),
            });
        }
        tracing::info!(
            script = %self.script.id,
            elements = self.script.len(),
            actors = self.session.actors.len(),
            "场景加载完成"
        );
        self.state = TurnState::Idle;
        self.advance()
    }

    /// 用新的脚本与元数据重新开始，回到 `Loading`
    ///
    /// 凭据计数器不重置，重载前发出的信号一律过期。
    pub fn reload(&mut self, script: Script, metadata: Metadata) {
        tracing::info!(script = %script.id, "重新加载场景");
        self.script = script;
        self.metadata = metadata;
        self.session.reset();
        self.state = TurnState::Loading;
        self.pending = None;
        self.reveal = None;
    }

    /// 推进到下一个需要等待的元素
    pub fn advance(&mut self) -> Result<Vec<Command>, RuntimeError> {
        if self.state.blocks_advance() {
            tracing::debug!(state = %self.state, "当前状态忽略 advance");
            return Ok(Vec::new());
        }

        let mut commands = Vec::new();
        self.state = TurnState::Advancing;
        self.pending = None;
        self.reveal = None;

        loop {
            self.release_replies(&mut commands);

            let next = self.session.cursor.map_or(0, |c| c + 1);
            let Some(element) = self.script.get(next).cloned() else {
                self.session.cursor = Some(self.script.len());
                self.state = TurnState::Done;
                tracing::info!(script = %self.script.id, "脚本已结束");
                return Ok(commands);
            };
            self.session.cursor = Some(next);
            tracing::debug!(index = next, element = %element, "处理元素");

            let result = match self.executor.execute(
                &element,
                &mut self.session,
                &self.metadata,
                &self.config,
            ) {
                Ok(result) => result,
                Err(err) => {
                    self.state = TurnState::Idle;
                    return Err(err);
                }
            };
            commands.extend(result.commands);
            if result.reveal.is_some() {
                self.reveal = result.reveal;
            }

            match result.flow {
                Flow::Chain => continue,
                Flow::Yield => {
                    self.state = TurnState::Idle;
                }
                Flow::Wait(ticket) => {
                    self.pending = Some(Pending::Turn(ticket));
                    self.state = TurnState::Idle;
                }
                Flow::Confirm(ticket) => {
                    self.pending = ticket.map(Pending::Confirm);
                    self.state = TurnState::WaitingConfirmation;
                }
            }
            return Ok(commands);
        }
    }

    /// 处理 Host 回传的信号
    pub fn handle_signal(&mut self, signal: Signal) -> Result<Vec<Command>, RuntimeError> {
        match signal {
            Signal::RevealFinished(ticket) => {
                if self.reveal != Some(ticket) {
                    tracing::trace!(ticket = %ticket, "过期的显示完成信号");
                    return Ok(Vec::new());
                }
                Ok(self.schedule_auto_advance().into_iter().collect())
            }

            Signal::Completed(ticket) => {
                let Some(pending) = self.pending.filter(|p| p.ticket() == ticket) else {
                    tracing::trace!(ticket = %ticket, "过期的完成信号");
                    return Ok(Vec::new());
                };
                self.pending = None;

                match pending {
                    Pending::Turn(_) => self.advance(),
                    Pending::AutoAdvance(_) => {
                        if self.session.auto_advance {
                            self.advance()
                        } else {
                            Ok(Vec::new())
                        }
                    }
                    Pending::Confirm(_) => {
                        self.confirm_reply(0)?;
                        self.advance()
                    }
                }
            }
        }
    }

    /// 确认回复选项，回到 `Idle`
    ///
    /// 调用方随后调用 [`Engine::advance`] 继续。
    pub fn confirm_reply(&mut self, index: usize) -> Result<(), RuntimeError> {
        if self.state != TurnState::WaitingConfirmation {
            return Err(RuntimeError::StateMismatch {
                expected: TurnState::WaitingConfirmation.to_string(),
                actual: self.state.to_string(),
            });
        }
        let max = self.session.replies.len();
        if index >= max {
            return Err(RuntimeError::InvalidReplyIndex { index, max });
        }

        tracing::debug!(index, text = %self.session.replies[index].text, "确认回复");
        self.session.chosen_reply = Some(index);
        self.pending = None;
        self.state = TurnState::Idle;
        Ok(())
    }

    /// 切换自动推进
    ///
    /// 打开时若当前对白已经显示完毕，立即安排自动推进。
    pub fn set_auto_advance(&mut self, enabled: bool) -> Vec<Command> {
        self.session.auto_advance = enabled;
        tracing::info!(enabled, "自动推进");
        if !enabled {
            if matches!(self.pending, Some(Pending::AutoAdvance(_))) {
                self.pending = None;
            }
            return Vec::new();
        }
        let revealed = self
            .session
            .dialogue
            .as_ref()
            .is_some_and(|d| d.is_complete());
        if revealed && self.reveal.is_some() {
            self.schedule_auto_advance().into_iter().collect()
        } else {
            Vec::new()
        }
    }

    /// 对白显示完成后安排自动推进
    fn schedule_auto_advance(&mut self) -> Option<Command> {
        if !self.session.auto_advance || self.state != TurnState::Idle || self.pending.is_some() {
            return None;
        }
        let ticket = self.executor.issue_ticket();
        self.pending = Some(Pending::AutoAdvance(ticket));
        Some(Command::ScheduleSignal {
            after: self.config.auto_advance_delay,
            ticket,
        })
    }

    /// 把显示中的回复移入消失列表
    fn release_replies(&mut self, commands: &mut Vec<Command>) {
        if self.session.replies.is_empty() {
            return;
        }
        let released = std::mem::take(&mut self.session.replies);
        tracing::trace!(count = released.len(), "释放回复选项");
        self.session.dismissed_replies = released
            .into_iter()
            .map(|mut reply| {
                reply.active = false;
                reply
            })
            .collect();
        commands.push(Command::DismissReplies);
    }
}
