//! # 路径模块
//!
//! 资源目录布局与逻辑路径规范化。
//!
//! ## 目录布局
//!
//! ```text
//! actor/{name}/{name}-{mood}.png
//! bg/{key}.jpeg
//! bgm/Theme_{key}.mp3
//! sfx/{key}.mp3
//! emote/{name}.gif
//! ui/text_overlay.png
//! ui/text_option_single.png
//! ui/loading.gif
//! ```
//!
//! 程序内部统一使用**相对于 assets_root 的逻辑路径**，以 `/` 分隔。

/// 对白框底图
pub const TEXT_OVERLAY: &str = "text_overlay";
/// 加载动画
pub const LOADING_SPINNER: &str = "loading";

pub fn actor_texture(name: &str, mood: &str) -> String {
    format!("actor/{name}/{name}-{mood}.png")
}

pub fn background(key: &str) -> String {
    format!("bg/{key}.jpeg")
}

pub fn bgm(key: &str) -> String {
    format!("bgm/Theme_{key}.mp3")
}

pub fn sfx(key: &str) -> String {
    format!("sfx/{key}.mp3")
}

pub fn emote(name: &str) -> String {
    format!("emote/{name}.gif")
}

pub fn ui_texture(key: &str) -> String {
    format!("ui/{key}.png")
}

pub fn ui_animation(key: &str) -> String {
    format!("ui/{key}.gif")
}

/// 规范化逻辑路径
///
/// - 统一使用 `/` 分隔符
/// - 处理 `.` 与 `..` 组件
/// - 移除 `assets/` 前缀（如果存在）
pub fn normalize_logical_path(path: &str) -> String {
    let normalized = path.replace('\\', "/");

    let mut components = Vec::new();
    for component in normalized.split('/') {
        match component {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            _ => components.push(component),
        }
    }

    let result = components.join("/");
    match result.strip_prefix("assets/") {
        Some(stripped) => stripped.to_string(),
        None => result,
    }
}
