//! # Reply 模块
//!
//! 分支回复选项（sensei 标签）。每个选项一行文本，最多两个。
//! 只有一个选项时不可点击，由计时器自动确认。

use serde::{Deserialize, Serialize};

use crate::animatable::SharedValue;
use crate::geometry::Rect;

/// 单选项使用的底图
pub const REPLY_SPRITE: &str = "text_option_single";

/// 回复选项的屏幕布局（像素）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyLayout {
    pub screen_width: f32,
    /// 选项组中心的 y 坐标
    pub center_y: f32,
    /// 相邻选项的间距
    pub spacing: f32,
    /// 点击区域
    pub width: f32,
    pub height: f32,
    /// 文本相对中心的水平修正
    pub text_nudge_x: f32,
}

impl Default for ReplyLayout {
    fn default() -> Self {
        Self {
            screen_width: 1280.0,
            center_y: 280.0,
            spacing: 100.0,
            width: 640.0,
            height: 72.0,
            text_nudge_x: 25.0,
        }
    }
}

/// 回复选项
#[derive(Debug, Clone)]
pub struct Reply {
    pub index: usize,
    pub text: String,
    /// 选项中心（屏幕像素）
    pub center_x: f32,
    pub center_y: f32,
    pub region: Rect,
    pub active: bool,
    /// 是否接受点击
    pub interactive: bool,
    pub sprite: String,
    /// 出现/消失过渡使用的透明度
    pub opacity: SharedValue,
}

impl Reply {
    /// 按行创建选项；超过两行时只取前两行
    pub fn layout(lines: &[String], layout: &ReplyLayout) -> Vec<Reply> {
        let lines = &lines[..lines.len().min(2)];
        let total = lines.len();
        let center_x = layout.screen_width / 2.0;

        lines
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let offset = index as f32 - (total as f32 - 1.0) / 2.0;
                let center_y = layout.center_y + offset * layout.spacing;
                Reply {
                    index,
                    text: text.clone(),
                    center_x,
                    center_y,
                    region: Rect::centered(center_x, center_y, layout.width, layout.height),
                    active: true,
                    interactive: total > 1,
                    sprite: REPLY_SPRITE.to_string(),
                    opacity: SharedValue::new(0.0),
                }
            })
            .collect()
    }

    /// 命中测试
    pub fn contains(&self, x: f32, y: f32) -> bool {
        self.active && self.interactive && self.region.contains(x, y)
    }
}

/// 查找被点击的选项
pub fn hit_test(replies: &[Reply], x: f32, y: f32) -> Option<usize> {
    replies.iter().position(|r| r.contains(x, y))
}
