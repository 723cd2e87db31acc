//! # Clock 模块
//!
//! 动画计时器：一个 tokio 任务按间隔驱动一个 [`Motion`]。
//!
//! - `Tick::Continue` 保持间隔
//! - `Tick::Reschedule(d)` 之后使用新的间隔
//! - `Tick::Finish` 结束并调用一次完成回调
//!
//! [`AnimationClock::stop`] 直接中止任务，不调用完成回调。

use std::time::Duration;

use arona_runtime::{Motion, Tick};
use tokio::task::JoinHandle;

#[derive(Debug)]
pub struct AnimationClock {
    handle: JoinHandle<()>,
}

impl AnimationClock {
    /// 启动计时器，第一次 tick 发生在 `interval` 之后
    ///
    /// 必须在 tokio 运行时内调用。
    pub fn start<M, F>(interval: Duration, mut motion: M, on_complete: F) -> Self
    where
        M: Motion,
        F: FnOnce() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut interval = interval;
            loop {
                tokio::time::sleep(interval).await;
                match motion.tick() {
                    Tick::Continue => {}
                    Tick::Reschedule(next) => interval = next,
                    Tick::Finish => break,
                }
            }
            on_complete();
        });
        Self { handle }
    }

    /// 中止计时器（不触发完成回调）
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
