//! # Input 模块
//!
//! 把窗口层的原始输入转换为舞台事件。
//!
//! ## 设计说明
//!
//! - 窗口层只需要把鼠标与按键转换为 [`RawInput`]
//! - [`InputMapper`] 负责按键映射与点击防抖
//! - 命令行宿主使用 [`parse_command`] 从文本行得到同样的事件

use std::time::Duration;

use tokio::time::Instant;

/// 点击防抖间隔
const CLICK_DEBOUNCE: Duration = Duration::from_millis(150);

/// 舞台能处理的输入事件
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// 主键点击（屏幕像素）
    Click { x: f32, y: f32 },
    ToggleAuto,
    ToggleDebug,
    VolumeUp,
    VolumeDown,
    /// 重新加载脚本与元数据
    Reset,
    Quit,
}

/// 按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Space,
    Enter,
    A,
    D,
    R,
    Up,
    Down,
    Escape,
    Other,
}

/// 窗口层的原始输入
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    MouseDown { x: f32, y: f32 },
    KeyDown(Key),
    CloseRequested,
}

/// 输入映射器
#[derive(Debug, Default)]
pub struct InputMapper {
    last_click: Option<Instant>,
    /// 最近一次鼠标位置，键盘推进时作为点击位置
    cursor: (f32, f32),
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// 转换一个原始输入；被防抖过滤或无映射时返回 `None`
    pub fn map(&mut self, raw: RawInput) -> Option<InputEvent> {
        match raw {
            RawInput::MouseDown { x, y } => {
                self.cursor = (x, y);
                self.click()
            }
            RawInput::KeyDown(Key::Space | Key::Enter) => self.click(),
            RawInput::KeyDown(Key::A) => Some(InputEvent::ToggleAuto),
            RawInput::KeyDown(Key::D) => Some(InputEvent::ToggleDebug),
            RawInput::KeyDown(Key::R) => Some(InputEvent::Reset),
            RawInput::KeyDown(Key::Up) => Some(InputEvent::VolumeUp),
            RawInput::KeyDown(Key::Down) => Some(InputEvent::VolumeDown),
            RawInput::KeyDown(Key::Escape) | RawInput::CloseRequested => Some(InputEvent::Quit),
            RawInput::KeyDown(Key::Other) => None,
        }
    }

    fn click(&mut self) -> Option<InputEvent> {
        let now = Instant::now();
        if self
            .last_click
            .is_some_and(|last| now.duration_since(last) < CLICK_DEBOUNCE)
        {
            tracing::trace!("点击防抖，忽略");
            return None;
        }
        self.last_click = Some(now);
        let (x, y) = self.cursor;
        Some(InputEvent::Click { x, y })
    }
}

/// 解析一行文本命令
///
/// ```text
/// click <x> <y> | next | auto | debug | up | down | reset | quit
/// ```
pub fn parse_command(line: &str) -> Option<InputEvent> {
    let mut parts = line.split_whitespace();
    let event = match parts.next()?.to_ascii_lowercase().as_str() {
        "click" => {
            let x = parts.next()?.parse().ok()?;
            let y = parts.next()?.parse().ok()?;
            InputEvent::Click { x, y }
        }
        "next" | "n" => InputEvent::Click { x: -1.0, y: -1.0 },
        "auto" => InputEvent::ToggleAuto,
        "debug" => InputEvent::ToggleDebug,
        "up" => InputEvent::VolumeUp,
        "down" => InputEvent::VolumeDown,
        "reset" => InputEvent::Reset,
        "quit" | "q" | "exit" => InputEvent::Quit,
        _ => return None,
    };
    Some(event)
}
