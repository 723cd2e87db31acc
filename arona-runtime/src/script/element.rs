//! # ScriptElement
//!
//! 脚本的基本单元：一个标记行及其后的对白文本。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::directive::Directive;

/// 脚本元素
///
/// 加载后不可变，通过游标下标访问。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptElement {
    /// 在脚本中的序号（从 0 开始）
    pub index: usize,
    /// 标记所在的源码行号（从 1 开始）
    pub line_number: usize,
    /// 说话人或控制标签（小写）
    pub name: String,
    /// 表情/子标签（小写）
    pub mood: String,
    /// 动作参数（defect 时保留原文大小写）
    pub action: String,
    /// 拼接后的对白
    pub line: String,
    /// 每个源码行一条对白
    pub lines: Vec<String>,
    /// 加载时归类的指令
    pub directive: Directive,
}

impl ScriptElement {
    /// 由标记字段创建元素，完成大小写处理与指令归类
    pub fn new(
        index: usize,
        line_number: usize,
        subject: &str,
        category: &str,
        action: &str,
    ) -> Self {
        let name = subject.to_lowercase();
        let mood = category.to_lowercase();
        let action = if name == "defect" || mood == "defect" {
            action.to_string()
        } else {
            action.to_lowercase()
        };
        let directive = Directive::classify(line_number, &name, &mood, &action);

        Self {
            index,
            line_number,
            name,
            mood,
            action,
            line: String::new(),
            lines: Vec::new(),
            directive,
        }
    }

    /// 追加一行对白
    pub fn push_line(&mut self, row: &str) {
        self.line.push_str(row);
        self.lines.push(row.to_string());
    }

    /// 是否带有可显示的对白
    pub fn has_dialogue(&self) -> bool {
        !self.line.is_empty() || !self.lines.is_empty()
    }

    /// 用于显示的对白文本（多行之间保留换行）
    pub fn display_text(&self) -> String {
        self.lines.join("\n")
    }
}

impl fmt::Display for ScriptElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} - {} - {}]: {}",
            self.name, self.mood, self.action, self.line
        )
    }
}
