//! # Directive 模块
//!
//! 脚本元素在加载时被归类为封闭的 [`Directive`] 枚举。
//! 控制标签的参数在这里校验，无效参数会变成 [`Directive::Invalid`]，
//! 由诊断在加载阶段报告，运行时直接跳过。

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// `delay` 参数无法解析时的回退时长（秒）
pub const DEFAULT_DELAY_SECS: f32 = 0.5;

/// 表示“无参数”的占位符
pub const PLACEHOLDER: &str = "_";

/// 表示“角色不在画面内”的 mood
pub const OFF_SCREEN: &str = "_";

/// 异步动作后缀
pub const ASYNC_SUFFIX: &str = "_async";

/// 场景淡入淡出方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FadeDirection {
    /// 遮罩逐渐消失，场景显现
    In,
    /// 遮罩逐渐覆盖，场景消失
    Out,
}

/// 淡入淡出遮罩颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FadeColor {
    #[default]
    Black,
    White,
}

/// BGM 控制动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BgmAction {
    /// 播放（切换曲目时关闭上一首）
    Play,
    Pause,
    Resume,
    FadeIn,
    FadeOut,
    Stop,
}

/// 字号设置
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FontSize {
    Scale(f32),
    Reset,
}

/// 角色回合中的动作
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StageAction {
    /// 角色不在画面内，仅显示对白
    OffScreen,
    /// 播放表情
    Emote(String),
    /// 取消暗化
    Full,
    /// 颜色渐变（Out 变暗，In 恢复）
    Fade(FadeDirection),
    /// 剪影开关
    Silhouette(bool),
    /// 替换阵营文字，`None` 表示清除
    Defect(Option<String>),
    /// 修改显示名
    Rename(String),
    /// 切换立绘，并可选地播放位移动画
    Pose {
        texture: String,
        animation: Option<String>,
        asynchronous: bool,
    },
}

/// 脚本元素的指令分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// 延迟一段时间后继续
    Delay(Duration),
    /// 替换已注册角色的阵营文字
    Defect { actor: String, text: String },
    /// 清空画面上的临时状态
    Clear,
    Background(String),
    Bgm { key: String, action: BgmAction },
    Sfx(String),
    SceneFade {
        direction: FadeDirection,
        color: FadeColor,
    },
    FontSize(FontSize),
    /// 分支回复（sensei）
    Branch,
    /// 释放当前对白
    None,
    /// 复制一个已注册角色
    Clone { source: String, target: String },
    /// 对画面上所有角色生效
    All { emote: Option<String> },
    /// 普通角色回合
    Speaker(StageAction),
    /// 参数无效的控制标签
    Invalid(ParseError),
}

impl Directive {
    /// 根据元素的三个字段归类指令
    ///
    /// `name`/`mood` 已经小写，`action` 是否小写取决于是否为 defect。
    pub fn classify(line: usize, name: &str, mood: &str, action: &str) -> Self {
        let invalid = |message: String| {
            Directive::Invalid(ParseError::InvalidDirective {
                line,
                tag: name.to_string(),
                message,
            })
        };

        match name {
            "delay" => Directive::Delay(parse_delay(mood, action)),
            "defect" => Directive::Defect {
                actor: mood.to_string(),
                text: action.to_string(),
            },
            "clear" => Directive::Clear,
            "bg" => Directive::Background(mood.to_string()),
            "sfx" => Directive::Sfx(mood.to_string()),
            "bgm" => match parse_bgm_action(action) {
                Some(bgm) => Directive::Bgm {
                    key: mood.to_string(),
                    action: bgm,
                },
                None => invalid(format!("未知的 BGM 动作 '{}'", action)),
            },
            "fade" => {
                let direction = match mood {
                    "in" => FadeDirection::In,
                    "out" => FadeDirection::Out,
                    other => return invalid(format!("淡入淡出方向必须是 in/out，实际 '{}'", other)),
                };
                let color = match action {
                    PLACEHOLDER | "black" => FadeColor::Black,
                    "white" => FadeColor::White,
                    other => return invalid(format!("未知的遮罩颜色 '{}'", other)),
                };
                Directive::SceneFade { direction, color }
            }
            "font" => {
                if mood != "size" {
                    return invalid(format!("仅支持 'font - size'，实际 '{}'", mood));
                }
                if action == "reset" {
                    return Directive::FontSize(FontSize::Reset);
                }
                match action.parse::<f32>() {
                    Ok(scale) if scale > 0.0 => Directive::FontSize(FontSize::Scale(scale)),
                    _ => invalid(format!("字号 '{}' 不是正数", action)),
                }
            }
            "sensei" => Directive::Branch,
            "none" => Directive::None,
            "clone" => {
                if mood == PLACEHOLDER || action == PLACEHOLDER {
                    return invalid("clone 需要源角色和新角色名".to_string());
                }
                Directive::Clone {
                    source: mood.to_string(),
                    target: action.to_string(),
                }
            }
            "all" => Directive::All {
                emote: emote_of(mood, action),
            },
            _ => Directive::Speaker(classify_stage_action(mood, action)),
        }
    }

    /// 是否是需要报告的无效指令
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }
}

/// 解析 delay 秒数：优先 action，其次 mood，均失败时回退到 0.5 秒
fn parse_delay(mood: &str, action: &str) -> Duration {
    let secs = [action, mood]
        .iter()
        .find_map(|s| s.parse::<f32>().ok().filter(|v| v.is_finite() && *v >= 0.0))
        .unwrap_or(DEFAULT_DELAY_SECS);
    Duration::from_secs_f32(secs)
}

fn parse_bgm_action(action: &str) -> Option<BgmAction> {
    match action {
        PLACEHOLDER | "play" => Some(BgmAction::Play),
        "pause" => Some(BgmAction::Pause),
        "resume" => Some(BgmAction::Resume),
        "fade_in" => Some(BgmAction::FadeIn),
        "fade_out" => Some(BgmAction::FadeOut),
        "stop" => Some(BgmAction::Stop),
        _ => None,
    }
}

/// 提取表情名，兼容旧写法 `[x - heart - emote]`
fn emote_of(mood: &str, action: &str) -> Option<String> {
    if action == "emote" {
        Some(mood.to_string())
    } else if mood == "emote" {
        Some(action.to_string())
    } else {
        None
    }
}

fn classify_stage_action(mood: &str, action: &str) -> StageAction {
    // 旧写法：action 为 emote 时 mood/action 互换
    let (mood, action) = if action == "emote" {
        (action, mood)
    } else {
        (mood, action)
    };

    match mood {
        OFF_SCREEN => StageAction::OffScreen,
        "emote" => StageAction::Emote(action.to_string()),
        "full" => StageAction::Full,
        "fade" => StageAction::Fade(if action == "in" {
            FadeDirection::In
        } else {
            FadeDirection::Out
        }),
        "silhouette" => StageAction::Silhouette(action != "off"),
        "defect" => {
            if action == PLACEHOLDER || action.eq_ignore_ascii_case("clear") {
                StageAction::Defect(None)
            } else {
                StageAction::Defect(Some(action.to_string()))
            }
        }
        "rename" => StageAction::Rename(action.to_string()),
        texture => {
            let (name, asynchronous) = match action.strip_suffix(ASYNC_SUFFIX) {
                Some(stripped) => (stripped, true),
                None => (action, false),
            };
            let animation = match name {
                "" | PLACEHOLDER | "none" => None,
                other => Some(other.to_string()),
            };
            StageAction::Pose {
                texture: texture.to_string(),
                animation,
                asynchronous,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_prefers_action_then_mood() {
        assert_eq!(
            Directive::classify(1, "delay", "_", "2"),
            Directive::Delay(Duration::from_secs(2))
        );
        assert_eq!(
            Directive::classify(1, "delay", "1.5", "_"),
            Directive::Delay(Duration::from_secs_f32(1.5))
        );
        assert_eq!(
            Directive::classify(1, "delay", "soon", "later"),
            Directive::Delay(Duration::from_secs_f32(0.5))
        );
    }

    #[test]
    fn test_fade_directive() {
        assert_eq!(
            Directive::classify(3, "fade", "out", "white"),
            Directive::SceneFade {
                direction: FadeDirection::Out,
                color: FadeColor::White,
            }
        );
        assert_eq!(
            Directive::classify(3, "fade", "in", "_"),
            Directive::SceneFade {
                direction: FadeDirection::In,
                color: FadeColor::Black,
            }
        );
        assert!(Directive::classify(3, "fade", "sideways", "_").is_invalid());
    }

    #[test]
    fn test_bgm_and_font() {
        assert_eq!(
            Directive::classify(1, "bgm", "52", "fade_out"),
            Directive::Bgm {
                key: "52".to_string(),
                action: BgmAction::FadeOut,
            }
        );
        assert!(Directive::classify(1, "bgm", "52", "rewind").is_invalid());
        assert_eq!(
            Directive::classify(1, "font", "size", "reset"),
            Directive::FontSize(FontSize::Reset)
        );
        assert_eq!(
            Directive::classify(1, "font", "size", "1.2"),
            Directive::FontSize(FontSize::Scale(1.2))
        );
        assert!(Directive::classify(1, "font", "weight", "bold").is_invalid());
        assert!(Directive::classify(1, "font", "size", "-1").is_invalid());
    }

    #[test]
    fn test_legacy_emote_swap() {
        assert_eq!(
            Directive::classify(1, "mika", "heart", "emote"),
            Directive::Speaker(StageAction::Emote("heart".to_string()))
        );
        assert_eq!(
            Directive::classify(1, "mika", "emote", "heart"),
            Directive::Speaker(StageAction::Emote("heart".to_string()))
        );
        assert_eq!(
            Directive::classify(1, "all", "sweat", "emote"),
            Directive::All {
                emote: Some("sweat".to_string())
            }
        );
        assert_eq!(
            Directive::classify(1, "all", "_", "_"),
            Directive::All { emote: None }
        );
    }

    #[test]
    fn test_pose_with_async_animation() {
        assert_eq!(
            Directive::classify(1, "mika", "03", "enter_left_async"),
            Directive::Speaker(StageAction::Pose {
                texture: "03".to_string(),
                animation: Some("enter_left".to_string()),
                asynchronous: true,
            })
        );
        assert_eq!(
            Directive::classify(1, "mika", "01", "_"),
            Directive::Speaker(StageAction::Pose {
                texture: "01".to_string(),
                animation: None,
                asynchronous: false,
            })
        );
    }

    #[test]
    fn test_special_moods() {
        assert_eq!(
            Directive::classify(1, "mika", "_", "enter_left"),
            Directive::Speaker(StageAction::OffScreen)
        );
        assert_eq!(
            Directive::classify(1, "mika", "silhouette", "off"),
            Directive::Speaker(StageAction::Silhouette(false))
        );
        assert_eq!(
            Directive::classify(1, "mika", "defect", "Tea Party"),
            Directive::Speaker(StageAction::Defect(Some("Tea Party".to_string())))
        );
        assert_eq!(
            Directive::classify(1, "mika", "defect", "clear"),
            Directive::Speaker(StageAction::Defect(None))
        );
        assert_eq!(
            Directive::classify(1, "mika", "fade", "in"),
            Directive::Speaker(StageAction::Fade(FadeDirection::In))
        );
    }

    #[test]
    fn test_clone_requires_both_names() {
        assert_eq!(
            Directive::classify(1, "clone", "mika", "mika_past"),
            Directive::Clone {
                source: "mika".to_string(),
                target: "mika_past".to_string(),
            }
        );
        assert!(Directive::classify(1, "clone", "mika", "_").is_invalid());
    }
}
