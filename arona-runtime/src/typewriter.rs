//! # Typewriter 模块
//!
//! 对白的打字机效果：文本在创建时按 79 列自动换行，之后每个 tick 显示一个字符。
//! [`TextReveal`] 是共享句柄，计时任务推进显示进度，主循环读取可见文本绘制。

use std::sync::{Arc, Mutex};

use crate::animatable::lock;
use crate::motion::{Motion, Tick};

/// 自动换行宽度（字符数）
pub const WRAP_COLUMNS: usize = 79;

#[derive(Debug)]
struct RevealState {
    chars: Vec<char>,
    visible: usize,
}

/// 逐字显示的对白
#[derive(Debug, Clone)]
pub struct TextReveal {
    inner: Arc<Mutex<RevealState>>,
}

impl TextReveal {
    /// 创建（文本会先换行）
    pub fn new(text: &str) -> Self {
        let wrapped = wrap_text(text, WRAP_COLUMNS);
        Self {
            inner: Arc::new(Mutex::new(RevealState {
                chars: wrapped.chars().collect(),
                visible: 0,
            })),
        }
    }

    /// 完整文本
    pub fn full_text(&self) -> String {
        lock(&self.inner).chars.iter().collect()
    }

    /// 当前可见文本
    pub fn visible_text(&self) -> String {
        let state = lock(&self.inner);
        state.chars[..state.visible].iter().collect()
    }

    pub fn is_complete(&self) -> bool {
        let state = lock(&self.inner);
        state.visible >= state.chars.len()
    }

    /// 立即显示全部文本
    pub fn complete(&self) {
        let mut state = lock(&self.inner);
        state.visible = state.chars.len();
    }

    /// 显示下一个字符；换行符不单独占用一个 tick
    pub fn reveal_next(&self) -> Tick {
        let mut state = lock(&self.inner);
        if state.visible >= state.chars.len() {
            return Tick::Finish;
        }
        state.visible += 1;
        while state.visible < state.chars.len() && state.chars[state.visible] == '\n' {
            state.visible += 1;
        }
        if state.visible >= state.chars.len() {
            Tick::Finish
        } else {
            Tick::Continue
        }
    }

    pub fn ptr_eq(&self, other: &TextReveal) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Motion for TextReveal {
    fn tick(&mut self) -> Tick {
        self.reveal_next()
    }
}

/// 在空白处换行，使每行不超过 `limit` 个字符
///
/// 超长单词不会被截断。原有换行保留。
pub fn wrap_text(text: &str, limit: usize) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, paragraph) in text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let mut width = 0;
        for word in paragraph.split_whitespace() {
            let len = word.chars().count();
            if width > 0 && width + 1 + len > limit {
                out.push('\n');
                width = 0;
            } else if width > 0 {
                out.push(' ');
                width += 1;
            }
            out.push_str(word);
            width += len;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("aaa bbb ccc", 7), "aaa bbb\nccc");
        assert_eq!(wrap_text("short", 79), "short");
        assert_eq!(wrap_text("line one\nline two", 79), "line one\nline two");
        assert_eq!(wrap_text("supercalifragilistic yes", 5), "supercalifragilistic\nyes");
    }

    #[test]
    fn test_reveal_one_char_per_tick() {
        let reveal = TextReveal::new("Hi!");
        assert_eq!(reveal.visible_text(), "");
        assert_eq!(reveal.reveal_next(), Tick::Continue);
        assert_eq!(reveal.visible_text(), "H");
        assert_eq!(reveal.reveal_next(), Tick::Continue);
        assert_eq!(reveal.reveal_next(), Tick::Finish);
        assert!(reveal.is_complete());
        assert_eq!(reveal.visible_text(), "Hi!");
        assert_eq!(reveal.reveal_next(), Tick::Finish);
    }

    #[test]
    fn test_complete_skips_reveal() {
        let reveal = TextReveal::new("Hello.\nSecond.");
        let shared = reveal.clone();
        shared.complete();
        assert!(reveal.is_complete());
        assert_eq!(reveal.visible_text(), "Hello.\nSecond.");
    }

    #[test]
    fn test_newline_does_not_cost_a_tick() {
        let reveal = TextReveal::new("a\nb");
        reveal.reveal_next();
        assert_eq!(reveal.visible_text(), "a\n");
        assert_eq!(reveal.reveal_next(), Tick::Finish);
    }

    #[test]
    fn test_empty_text_finishes_immediately() {
        let reveal = TextReveal::new("");
        assert!(reveal.is_complete());
        assert_eq!(reveal.reveal_next(), Tick::Finish);
    }
}
