//! # Render 模块
//!
//! 绘制流程。实际的像素输出由 [`Renderer`] 实现，这里只决定
//! 每一帧画什么、画在哪里、以什么顺序。
//!
//! ## 坐标
//!
//! 角色位置使用场景坐标：x 与 y 都在 `[-1, 1]`，原点在画面中心，y 向上。
//! 回复选项、对白框等界面元素直接使用屏幕像素坐标（y 向下）。
//!
//! ## 绘制顺序
//!
//! 1. 背景
//! 2. 画面上的角色（立绘，然后表情叠加层）
//! 3. 对白框、名字、阵营、逐字显示的对白
//! 4. 回复选项（包括正在消失的）
//! 5. 全屏淡入淡出遮罩
//! 6. 加载动画
//! 7. 调试叠加层

mod headless;

pub use headless::HeadlessRenderer;

use arona_runtime::reply::ReplyLayout;
use arona_runtime::script::FadeColor;
use arona_runtime::{ActorSnapshot, Engine, Rect, Reply, SceneSession, Texture, TurnState, Vec2};

use crate::animator::SpinnerHandle;
use crate::resources::path::TEXT_OVERLAY;

/// 白色，不透明
pub const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

/// 带纹理的矩形（屏幕像素）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub center: Vec2,
    pub width: f32,
    pub height: f32,
    /// 颜色叠加 + 透明度
    pub tint: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
}

/// 文本框：起点与最大宽度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub origin: Vec2,
    pub max_width: f32,
    pub align: TextAlign,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: [f32; 4],
}

/// 渲染后端
pub trait Renderer {
    fn begin_frame(&mut self, _width: f32, _height: f32) {}

    fn draw_quad(&mut self, quad: &Quad, texture: &Texture);

    /// 纯色填充
    fn fill(&mut self, rect: Rect, color: [f32; 4]);

    fn draw_text(&mut self, text_box: TextBox, text: &str, style: &TextStyle);

    /// 文本占用的矩形（起点为原点）
    fn text_bounds(&self, text: &str, style: &TextStyle) -> Rect;

    fn end_frame(&mut self) {}
}

/// 界面布局（像素）
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    pub width: f32,
    pub height: f32,
    pub dialogue_box: Rect,
    pub name_origin: Vec2,
    /// 阵营文字与名字的间距
    pub faction_gap: f32,
    pub text_origin: Vec2,
    /// 字号缩放为 1 时的对白字号
    pub text_size: f32,
    pub name_size: f32,
    pub reply_text_size: f32,
    pub spinner_center: Vec2,
    pub debug_size: f32,
}

impl FrameLayout {
    pub fn new(width: f32, height: f32) -> Self {
        let box_height = height * 0.3;
        Self {
            width,
            height,
            dialogue_box: Rect::new(0.0, height - box_height, width, box_height),
            name_origin: Vec2::new(width * 0.09, height - box_height + 30.0),
            faction_gap: 15.0,
            text_origin: Vec2::new(width * 0.09, height - box_height + 90.0),
            text_size: 36.0,
            name_size: 34.0,
            reply_text_size: 28.0,
            spinner_center: Vec2::new(width - 80.0, height - 80.0),
            debug_size: 18.0,
        }
    }

    /// 场景坐标转屏幕像素
    pub fn to_screen(&self, position: Vec2) -> Vec2 {
        Vec2::new(
            (position.x + 1.0) / 2.0 * self.width,
            (1.0 - position.y) / 2.0 * self.height,
        )
    }

    fn full_screen(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }
}

/// 绘制一帧
pub fn draw_frame(
    renderer: &mut dyn Renderer,
    engine: &Engine,
    spinner: Option<&SpinnerHandle>,
    layout: &FrameLayout,
) {
    let session = engine.session();
    renderer.begin_frame(layout.width, layout.height);

    draw_background(renderer, session, layout);
    draw_actors(renderer, session, layout);
    draw_dialogue(renderer, session, layout);
    draw_replies(renderer, session, &engine.config().reply_layout, layout);
    draw_fade(renderer, session, layout);
    if engine.state() == TurnState::Loading {
        draw_spinner(renderer, spinner, layout);
    }
    if session.debug_overlay {
        draw_debug(renderer, session, layout);
    }

    renderer.end_frame();
}

fn draw_background(renderer: &mut dyn Renderer, session: &SceneSession, layout: &FrameLayout) {
    let Some(texture) = session
        .background
        .as_ref()
        .and_then(|key| session.resources.backgrounds.get(key))
    else {
        return;
    };
    let quad = Quad {
        center: Vec2::new(layout.width / 2.0, layout.height / 2.0),
        width: layout.width,
        height: layout.height,
        tint: WHITE,
    };
    renderer.draw_quad(&quad, texture);
}

/// 立绘的屏幕矩形
pub fn actor_quad(snapshot: &ActorSnapshot, texture: &Texture, layout: &FrameLayout) -> Quad {
    let [r, g, b] = snapshot.color;
    Quad {
        center: layout.to_screen(snapshot.position),
        width: texture.width as f32 * snapshot.scale,
        height: texture.height as f32 * snapshot.scale,
        tint: [r, g, b, snapshot.alpha],
    }
}

fn draw_actors(renderer: &mut dyn Renderer, session: &SceneSession, layout: &FrameLayout) {
    for actor in session.stage_actors() {
        let snapshot = actor.snapshot();
        if let Some(texture) = &snapshot.texture {
            renderer.draw_quad(&actor_quad(&snapshot, texture, layout), texture);
        }

        let Some(emote) = &snapshot.emote else {
            continue;
        };
        let center = layout.to_screen(snapshot.position + emote.offset);
        for texture in &emote.layers {
            let quad = Quad {
                center,
                width: texture.width as f32 * emote.scale,
                height: texture.height as f32 * emote.scale,
                tint: WHITE,
            };
            renderer.draw_quad(&quad, texture);
        }
    }
}

fn draw_dialogue(renderer: &mut dyn Renderer, session: &SceneSession, layout: &FrameLayout) {
    let Some(dialogue) = &session.dialogue else {
        return;
    };

    if let Some(texture) = session.resources.ui.get(TEXT_OVERLAY) {
        let rect = layout.dialogue_box;
        let quad = Quad {
            center: Vec2::new(rect.x + rect.width / 2.0, rect.y + rect.height / 2.0),
            width: rect.width,
            height: rect.height,
            tint: WHITE,
        };
        renderer.draw_quad(&quad, texture);
    }

    let max_width = layout.width - layout.name_origin.x * 2.0;
    if let Some(name) = &session.name_label {
        let style = TextStyle {
            size: layout.name_size,
            color: WHITE,
        };
        renderer.draw_text(
            TextBox {
                origin: layout.name_origin,
                max_width,
                align: TextAlign::Left,
            },
            name,
            &style,
        );

        if let Some(faction) = &session.faction_label {
            let name_width = renderer.text_bounds(name, &style).width;
            let faction_style = TextStyle {
                size: layout.name_size * 0.7,
                color: [0.4, 0.75, 0.95, 1.0],
            };
            let origin = Vec2::new(
                layout.name_origin.x + name_width + layout.faction_gap,
                layout.name_origin.y + layout.name_size * 0.3,
            );
            renderer.draw_text(
                TextBox {
                    origin,
                    max_width,
                    align: TextAlign::Left,
                },
                faction,
                &faction_style,
            );
        }
    }

    renderer.draw_text(
        TextBox {
            origin: layout.text_origin,
            max_width,
            align: TextAlign::Left,
        },
        &dialogue.visible_text(),
        &TextStyle {
            size: layout.text_size * session.font_scale,
            color: WHITE,
        },
    );
}

fn draw_reply(
    renderer: &mut dyn Renderer,
    session: &SceneSession,
    reply: &Reply,
    reply_layout: &ReplyLayout,
    layout: &FrameLayout,
) {
    let opacity = reply.opacity.get();
    if opacity <= 0.0 {
        return;
    }
    if let Some(texture) = session.resources.ui.get(&reply.sprite) {
        let quad = Quad {
            center: Vec2::new(reply.center_x, reply.center_y),
            width: reply.region.width,
            height: reply.region.height,
            tint: [1.0, 1.0, 1.0, opacity],
        };
        renderer.draw_quad(&quad, texture);
    }
    renderer.draw_text(
        TextBox {
            origin: Vec2::new(
                reply.center_x + reply_layout.text_nudge_x,
                reply.center_y - layout.reply_text_size / 2.0,
            ),
            max_width: reply.region.width,
            align: TextAlign::Center,
        },
        &reply.text,
        &TextStyle {
            size: layout.reply_text_size,
            color: [0.2, 0.25, 0.3, opacity],
        },
    );
}

fn draw_replies(
    renderer: &mut dyn Renderer,
    session: &SceneSession,
    reply_layout: &ReplyLayout,
    layout: &FrameLayout,
) {
    for reply in session.replies.iter().chain(&session.dismissed_replies) {
        draw_reply(renderer, session, reply, reply_layout, layout);
    }
}

fn draw_fade(renderer: &mut dyn Renderer, session: &SceneSession, layout: &FrameLayout) {
    let opacity = session.fade.opacity.get();
    if opacity <= 0.0 {
        return;
    }
    let color = match session.fade.color {
        FadeColor::Black => [0.0, 0.0, 0.0, opacity],
        FadeColor::White => [1.0, 1.0, 1.0, opacity],
    };
    renderer.fill(layout.full_screen(), color);
}

fn draw_spinner(renderer: &mut dyn Renderer, spinner: Option<&SpinnerHandle>, layout: &FrameLayout) {
    let Some(spinner) = spinner else {
        return;
    };
    let animation = spinner.animation();
    let scale = animation.sprite().scale;
    if let Some(frame) = animation.current_frame() {
        let quad = Quad {
            center: layout.spinner_center,
            width: frame.texture.width as f32 * scale,
            height: frame.texture.height as f32 * scale,
            tint: WHITE,
        };
        renderer.draw_quad(&quad, &frame.texture);
    }
}

fn draw_debug(renderer: &mut dyn Renderer, session: &SceneSession, layout: &FrameLayout) {
    let style = TextStyle {
        size: layout.debug_size,
        color: [1.0, 0.3, 0.3, 1.0],
    };
    for (i, message) in session.debug_messages.iter().enumerate() {
        renderer.draw_text(
            TextBox {
                origin: Vec2::new(10.0, 10.0 + i as f32 * (layout.debug_size + 4.0)),
                max_width: layout.width - 20.0,
                align: TextAlign::Left,
            },
            message,
            &style,
        );
    }
}
