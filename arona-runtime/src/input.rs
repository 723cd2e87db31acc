//! # Input 模块
//!
//! Host 向 Runtime 回传的信号。
//!
//! 所有异步工作（淡入淡出、位移动画、计时器、打字机）完成后只通过信号通知 Runtime，
//! 信号携带的 [`Ticket`] 用于匹配正在等待的回合；过期的信号会被忽略。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 等待凭据
///
/// 由 Runtime 在发出需要回传完成信号的 Command 时分配，单调递增，重载后也不会重复。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Host 回传的完成信号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Signal {
    /// 动画、计时器或淡入淡出完成
    Completed(Ticket),
    /// 对白逐字显示完成
    RevealFinished(Ticket),
}

impl Signal {
    pub fn ticket(&self) -> Ticket {
        match self {
            Self::Completed(t) | Self::RevealFinished(t) => *t,
        }
    }
}
