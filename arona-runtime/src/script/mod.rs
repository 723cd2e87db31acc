//! # Script 模块
//!
//! 行式脚本的解析（手写，无 regex 依赖）。
//!
//! ## 格式
//!
//! ```text
//! [bg - sunset - _]
//! [mika - 01 - enter_left]
//! 早上好，老师。
//! 今天也要一起喝茶吗？
//! ```
//!
//! 标记行开启一个新元素，其余行原样作为对白追加到最近的元素（包括空行）。
//! 行首尾的空格会被去掉。
//!
//! ## 容错
//!
//! - 格式不正确的行按对白处理，不会导致解析失败
//! - 第一个标记之前的文本被丢弃，并记录警告；之前的空行直接忽略
//! - 标记之后的空行也算对白，该回合会等待点击

mod directive;
mod element;
mod marker;


pub use directive::{
    ASYNC_SUFFIX, BgmAction, DEFAULT_DELAY_SECS, Directive, FadeColor, FadeDirection, FontSize,
    OFF_SCREEN, PLACEHOLDER, StageAction,
};
pub use element::ScriptElement;
pub use marker::{Marker, parse_marker};

use crate::diagnostic::Diagnostic;
use crate::error::ParseError;

/// 已解析的脚本
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    /// 脚本标识（通常是文件名）
    pub id: String,
    /// 有序的脚本元素
    pub elements: Vec<ScriptElement>,
}

impl Script {
    /// 按下标获取元素
    pub fn get(&self, index: usize) -> Option<&ScriptElement> {
        self.elements.get(index)
    }

    /// 元素数量
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// 脚本中出现过的所有说话人（不含控制标签），按首次出现顺序
    pub fn speakers(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for element in &self.elements {
            if matches!(element.directive, Directive::Speaker(_))
                && !seen.contains(&element.name.as_str())
            {
                seen.push(&element.name);
            }
        }
        seen
    }
}

/// 脚本解析器
#[derive(Debug, Default)]
pub struct Parser {
    warnings: Vec<Diagnostic>,
}

impl Parser {
    /// 创建新的解析器
    pub fn new() -> Self {
        Self::default()
    }

    /// 解析脚本文本
    ///
    /// 解析本身不会失败；可疑内容记录在 [`Parser::warnings`] 中。
    pub fn parse(&mut self, script_id: &str, text: &str) -> Script {
        self.warnings.clear();

        let mut elements: Vec<ScriptElement> = Vec::new();
        for (i, raw) in text.lines().enumerate() {
            let line_number = i + 1;
            let row = raw.trim_matches(' ');

            if let Some(marker) = parse_marker(row) {
                let element = ScriptElement::new(
                    elements.len(),
                    line_number,
                    marker.subject,
                    marker.category,
                    marker.action,
                );
                if let Directive::Invalid(err) = &element.directive {
                    self.warnings
                        .push(Diagnostic::error(script_id, err.to_string()).with_line(line_number));
                }
                elements.push(element);
                continue;
            }

            match elements.last_mut() {
                Some(element) => element.push_line(row),
                None if row.is_empty() => {}
                None => {
                    let err = ParseError::OrphanText { line: line_number };
                    self.warnings.push(
                        Diagnostic::warn(script_id, err.to_string())
                            .with_line(line_number)
                            .with_detail(row),
                    );
                }
            }
        }

        tracing::debug!(script = script_id, elements = elements.len(), "脚本解析完成");

        Script {
            id: script_id.to_string(),
            elements,
        }
    }

    /// 获取解析过程中的警告
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }
}
