//! # State 模块
//!
//! 回合状态机的状态。
//!
//! ```text
//! Loading ──finish_loading──► Idle ──advance──► Advancing ──┬──► Idle
//!                              ▲                             ├──► WaitingConfirmation ──confirm──► Idle
//!                              └──────── signal ─────────────┘
//!                                                            └──► Done（游标越过末尾）
//! ```
//!
//! `Loading` 与 `WaitingConfirmation` 期间调用 `advance` 不产生任何效果。

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnState {
    /// 资源加载中
    Loading,
    /// 等待推进
    Idle,
    /// 正在处理元素
    Advancing,
    /// 等待回复确认
    WaitingConfirmation,
    /// 脚本已结束
    Done,
}

impl TurnState {
    /// 此状态下 `advance` 是否被忽略
    pub fn blocks_advance(&self) -> bool {
        matches!(
            self,
            Self::Loading | Self::WaitingConfirmation | Self::Done
        )
    }
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Loading => "Loading",
            Self::Idle => "Idle",
            Self::Advancing => "Advancing",
            Self::WaitingConfirmation => "WaitingConfirmation",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}
