//! # Status 模块
//!
//! 动画任务回传给主循环的状态消息。
//!
//! 计时任务运行在 tokio 上，不能直接修改引擎；它们通过这里的通道
//! 回传带凭据的状态码，主循环在下一帧把它们转换成 [`Signal`] 交给引擎。
//! 调试文本走单独的通道，直接追加到调试叠加层。

use arona_runtime::{Signal, Ticket};
use tokio::sync::mpsc;

/// 状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum StatusCode {
    /// 动画或计时器完成
    Completed = 1,
    /// 对白逐字显示完成
    RevealFinished = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusMessage {
    pub code: StatusCode,
    pub ticket: Ticket,
}

impl StatusMessage {
    pub fn completed(ticket: Ticket) -> Self {
        Self {
            code: StatusCode::Completed,
            ticket,
        }
    }

    pub fn reveal_finished(ticket: Ticket) -> Self {
        Self {
            code: StatusCode::RevealFinished,
            ticket,
        }
    }
}

impl From<StatusMessage> for Signal {
    fn from(message: StatusMessage) -> Self {
        match message.code {
            StatusCode::Completed => Signal::Completed(message.ticket),
            StatusCode::RevealFinished => Signal::RevealFinished(message.ticket),
        }
    }
}

/// 发送端，可克隆到任意任务中
#[derive(Debug, Clone)]
pub struct StatusSender {
    status: mpsc::UnboundedSender<StatusMessage>,
    debug: mpsc::UnboundedSender<String>,
}

impl StatusSender {
    /// 发送状态；接收端已关闭（场景已重载）时静默丢弃
    pub fn send(&self, message: StatusMessage) {
        if self.status.send(message).is_err() {
            tracing::trace!(ticket = %message.ticket, "状态通道已关闭，丢弃消息");
        }
    }

    pub fn debug(&self, message: impl Into<String>) {
        let _ = self.debug.send(message.into());
    }
}

/// 接收端，归主循环所有
#[derive(Debug)]
pub struct StatusReceiver {
    pub status: mpsc::UnboundedReceiver<StatusMessage>,
    pub debug: mpsc::UnboundedReceiver<String>,
}

/// 创建一对新的状态通道
pub fn channels() -> (StatusSender, StatusReceiver) {
    let (status_tx, status_rx) = mpsc::unbounded_channel();
    let (debug_tx, debug_rx) = mpsc::unbounded_channel();
    (
        StatusSender {
            status: status_tx,
            debug: debug_tx,
        },
        StatusReceiver {
            status: status_rx,
            debug: debug_rx,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_converts_to_signal() {
        let (tx, mut rx) = channels();
        tx.send(StatusMessage::reveal_finished(Ticket(3)));
        tx.debug("hello");

        let message = rx.status.try_recv().unwrap();
        assert_eq!(Signal::from(message), Signal::RevealFinished(Ticket(3)));
        assert_eq!(rx.debug.try_recv().unwrap(), "hello");
        assert_eq!(StatusCode::Completed as u8, 1);
    }

    #[test]
    fn test_send_after_receiver_dropped_is_silent() {
        let (tx, rx) = channels();
        drop(rx);
        tx.send(StatusMessage::completed(Ticket(1)));
        tx.debug("ignored");
    }
}
