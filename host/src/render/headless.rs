//! 无窗口渲染器：只记录每帧的绘制数量，用于命令行运行与测试。

use arona_runtime::{Rect, Texture};

use super::{Quad, Renderer, TextBox, TextStyle};

#[derive(Debug, Default, Clone)]
pub struct HeadlessRenderer {
    pub frames: u64,
    pub quads: usize,
    pub fills: usize,
    /// 本帧绘制的文本
    pub texts: Vec<String>,
}

impl Renderer for HeadlessRenderer {
    fn begin_frame(&mut self, _width: f32, _height: f32) {
        self.frames += 1;
        self.quads = 0;
        self.fills = 0;
        self.texts.clear();
    }

    fn draw_quad(&mut self, _quad: &Quad, _texture: &Texture) {
        self.quads += 1;
    }

    fn fill(&mut self, _rect: Rect, _color: [f32; 4]) {
        self.fills += 1;
    }

    fn draw_text(&mut self, _text_box: TextBox, text: &str, _style: &TextStyle) {
        self.texts.push(text.to_string());
    }

    fn text_bounds(&self, text: &str, style: &TextStyle) -> Rect {
        let lines = text.lines().count().max(1);
        let longest = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        Rect::new(
            0.0,
            0.0,
            longest as f32 * style.size * 0.5,
            lines as f32 * style.size,
        )
    }
}
