//! # Command 模块
//!
//! Runtime 向 Host 发出的指令。
//!
//! Runtime 只修改场景会话中的数据（说话人、对白、立绘 key 等），
//! 凡是需要时间推进、音频或资源的效果都以 Command 的形式交给 Host 执行。
//! 带 [`Ticket`] 的指令在完成时必须回传 [`Signal`](crate::input::Signal)。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::input::Ticket;
use crate::script::{BgmAction, FadeColor, FadeDirection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// 切换背景
    ShowBackground { key: String },

    /// 播放一次音效
    PlaySfx { key: String },

    /// 背景音乐控制
    Bgm { key: String, action: BgmAction },

    /// 全屏遮罩淡入淡出，完成后回传 `Completed(ticket)`
    SceneFade {
        direction: FadeDirection,
        color: FadeColor,
        ticket: Ticket,
    },

    /// 开始逐字显示会话中的当前对白，完成后回传 `RevealFinished(ticket)`
    RevealDialogue { ticket: Ticket },

    /// 会话中的回复选项出现
    PresentReplies,

    /// 被释放的回复选项消失
    DismissReplies,

    /// 角色播放表情
    StartEmote {
        actor: String,
        emote: String,
        with_sound: bool,
    },

    /// 角色颜色渐变
    FadeActor {
        actor: String,
        direction: FadeDirection,
    },

    /// 角色位移动画；`ticket` 存在时完成后回传
    AnimateActor {
        actor: String,
        animation: String,
        ticket: Option<Ticket>,
    },

    /// 一段时间后回传 `Completed(ticket)`
    ScheduleSignal { after: Duration, ticket: Ticket },

    /// 画面临时状态已清空
    ClearStage,

    /// 调试信息（显示在调试叠加层）
    Debug { message: String },
}
