//! # Arona Runtime
//!
//! 脚本驱动的对白与动画编排核心。
//!
//! ## 架构概述
//!
//! `arona-runtime` 是纯逻辑核心，不做 IO，也不依赖异步运行时。
//! 它通过 **命令驱动模式** 与宿主层（Host）通信：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── advance() / confirm_reply ──►│
//!   │──── handle_signal(Signal) ──────►│
//!   │                                   │
//!   │◄─── Vec<Command> ────────────────│
//!   │                                   │
//!   │  读取 SceneSession 与共享句柄绘制    │
//! ```
//!
//! 时间相关的效果（淡入淡出、位移、表情、音量渐变、打字机）由 [`motion`] 中的
//! 步进器描述，Host 的计时器逐 tick 驱动它们，完成后回传带 [`Ticket`] 的 [`Signal`]。
//!
//! ## 模块结构
//!
//! - [`script`]：行式脚本解析与指令归类
//! - [`metadata`]：元数据模型与旧格式迁移
//! - [`actor`]：角色状态
//! - [`animation`] / [`sprite`]：多帧表情动画
//! - [`motion`] / [`typewriter`]：逐 tick 步进器
//! - [`reply`]：分支回复选项
//! - [`session`]：场景会话
//! - [`engine`]：回合状态机
//! - [`diagnostic`]：脚本静态检查

pub mod actor;
pub mod animatable;
pub mod animation;
pub mod command;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod input;
pub mod metadata;
pub mod motion;
pub mod reply;
pub mod script;
pub mod session;
pub mod sprite;
pub mod state;
pub mod typewriter;

// 重导出核心类型
pub use actor::{Actor, ActorSnapshot, EmoteSnapshot};
pub use animatable::{Animatable, SharedValue};
pub use animation::Animation;
pub use command::Command;
pub use diagnostic::{
    Diagnostic, DiagnosticLevel, DiagnosticResult, ResourceKind, ResourceReference,
    analyze_script, extract_resource_references,
};
pub use engine::{Engine, EngineConfig};
pub use error::{ActorError, MetadataError, ParseError, RuntimeError};
pub use geometry::{Rect, Vec2};
pub use input::{Signal, Ticket};
pub use metadata::{
    ActorMetadata, AnimationMetadata, EmoteKind, EmoteMetadata, FrameMetadata, Metadata,
    MigrationReport,
};
pub use motion::{ColorFade, Motion, PropertyRamp, ScriptedMotion, Tick};
pub use reply::{Reply, ReplyLayout};
pub use script::{Directive, Parser, Script, ScriptElement, StageAction};
pub use session::{ResourceRegistry, SceneSession, SessionDefaults};
pub use sprite::{AnimatedSprite, FrameDisposal, SpriteFrame, Texture};
pub use state::TurnState;
pub use typewriter::TextReveal;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        let script = Parser::new().parse("main", "[mika - 01 - _]\nHello.");
        let engine = Engine::new(script, Metadata::default(), EngineConfig::default());
        assert_eq!(engine.state(), TurnState::Loading);

        let _signal = Signal::Completed(Ticket(1));
        let _cmd = Command::ShowBackground {
            key: "sunset".to_string(),
        };
    }
}
