//! # 标记行识别
//!
//! 手写的 `[subject - category - action]` 识别函数，无正则依赖。
//!
//! - subject：字母、数字、`_`、`?`
//! - category：字母、数字、`_`
//! - action：字母、数字、空白以及 `_ - * ' " . ? !`
//!
//! 分隔符为两侧带空白的 `-`，空白数量不限。

/// 标记行的三个字段（未做大小写处理）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    pub subject: &'a str,
    pub category: &'a str,
    pub action: &'a str,
}

fn is_subject_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '?'
}

fn is_category_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_action_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c.is_whitespace() || "_-*'\".?!".contains(c)
}

/// 读取一段满足 `pred` 的非空前缀，返回 (前缀, 剩余)
fn take_while(s: &str, pred: impl Fn(char) -> bool) -> Option<(&str, &str)> {
    let end = s.find(|c: char| !pred(c)).unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some((&s[..end], &s[end..]))
}

/// 读取 `\s+-\s+` 分隔符，返回剩余部分
fn take_separator(s: &str) -> Option<&str> {
    let trimmed = s.trim_start();
    if trimmed.len() == s.len() {
        return None;
    }
    let rest = trimmed.strip_prefix('-')?;
    let after = rest.trim_start();
    if after.len() == rest.len() {
        return None;
    }
    Some(after)
}

/// 识别一行是否为标记行
///
/// 输入应已去掉首尾空格。不匹配时返回 `None`，调用方将其视为对白。
pub fn parse_marker(row: &str) -> Option<Marker<'_>> {
    let inner = row.strip_prefix('[')?.strip_suffix(']')?;

    let (subject, rest) = take_while(inner, is_subject_char)?;
    let rest = take_separator(rest)?;
    let (category, rest) = take_while(rest, is_category_char)?;
    let action = take_separator(rest)?;

    if action.is_empty() || !action.chars().all(is_action_char) {
        return None;
    }

    Some(Marker {
        subject,
        category,
        action: action.trim_end(),
    })
}
