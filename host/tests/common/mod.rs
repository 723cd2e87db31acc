//! 集成测试共用的内存资源、记录渲染器与舞台构造

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use arona_runtime::{AnimatedSprite, FrameDisposal, Rect, SpriteFrame, Texture};
use host::{
    AppConfig, AssetError, AssetSource, FontFace, Quad, Renderer, SilentDevice, SoundClip, Stage,
    TextBox, TextStyle,
};

pub const FONT: &str = "fonts/NotoSans-Medium.ttf";
pub const TICK: Duration = Duration::from_millis(16);

/// 内存中的资源来源：只记录哪些逻辑路径存在
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    files: BTreeSet<String>,
}

impl MemoryAssets {
    pub fn with(files: &[&str]) -> Self {
        let mut files: BTreeSet<String> = files.iter().map(|f| f.to_string()).collect();
        files.insert(FONT.to_string());
        files.insert("ui/text_overlay.png".to_string());
        files.insert("ui/text_option_single.png".to_string());
        Self { files }
    }

    fn check(&self, path: &str) -> Result<(), AssetError> {
        if self.files.contains(path) {
            Ok(())
        } else {
            Err(AssetError::NotFound {
                path: path.to_string(),
            })
        }
    }
}

impl AssetSource for MemoryAssets {
    fn load_texture(&self, path: &str) -> Result<Texture, AssetError> {
        self.check(path)?;
        Ok(Texture::new(path, 100, 200))
    }

    fn load_animated(&self, name: &str, path: &str) -> Result<AnimatedSprite, AssetError> {
        self.check(path)?;
        let frames = (0..2)
            .map(|i| SpriteFrame {
                texture: Texture::new(format!("{path}#{i}"), 32, 32),
                delay: Duration::from_millis(50),
                disposal: FrameDisposal::Replace,
            })
            .collect();
        Ok(AnimatedSprite::new(name, frames))
    }

    fn load_sound(&self, path: &str) -> Result<SoundClip, AssetError> {
        self.check(path)?;
        Ok(SoundClip {
            path: path.to_string(),
            bytes: Arc::from(&b"ID3"[..]),
        })
    }

    fn load_font(&self, path: &str) -> Result<FontFace, AssetError> {
        self.check(path)?;
        Ok(FontFace {
            path: path.to_string(),
            bytes: Arc::from(&b"\0\x01\0\0"[..]),
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains(path)
    }
}

/// 记录每帧绘制内容的渲染器
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub textures: Vec<String>,
    pub texts: Vec<String>,
    pub fills: Vec<[f32; 4]>,
}

impl Renderer for RecordingRenderer {
    fn begin_frame(&mut self, _width: f32, _height: f32) {
        self.textures.clear();
        self.texts.clear();
        self.fills.clear();
    }

    fn draw_quad(&mut self, _quad: &Quad, texture: &Texture) {
        self.textures.push(texture.path.clone());
    }

    fn fill(&mut self, _rect: Rect, color: [f32; 4]) {
        self.fills.push(color);
    }

    fn draw_text(&mut self, _text_box: TextBox, text: &str, _style: &TextStyle) {
        self.texts.push(text.to_string());
    }

    fn text_bounds(&self, text: &str, style: &TextStyle) -> Rect {
        Rect::new(0.0, 0.0, text.chars().count() as f32 * style.size * 0.5, style.size)
    }
}

/// 写入脚本与元数据，返回指向该目录的配置
pub fn write_scene(dir: &Path, script: &str, metadata: &str) -> AppConfig {
    std::fs::write(dir.join("script.txt"), script).unwrap();
    std::fs::write(dir.join("settings.json"), metadata).unwrap();
    let mut config = AppConfig::default();
    config.assets_root = dir.to_path_buf();
    config
}

pub fn stage(config: AppConfig, assets: MemoryAssets) -> Stage<RecordingRenderer> {
    Stage::new(
        config,
        RecordingRenderer::default(),
        Box::new(SilentDevice::default()),
        Box::new(assets),
    )
    .unwrap()
}

/// 逐帧推进直到加载完成，返回用掉的帧数
pub async fn finish_loading(stage: &mut Stage<RecordingRenderer>) -> usize {
    let mut frames = 0;
    while stage.is_loading() {
        tokio::time::sleep(TICK).await;
        stage.frame().unwrap();
        frames += 1;
        assert!(frames < 1000, "加载没有结束");
    }
    frames
}

/// 推进一段时间，期间处理回传状态并绘制
pub async fn run_for(stage: &mut Stage<RecordingRenderer>, duration: Duration) {
    let steps = (duration.as_millis() / TICK.as_millis()).max(1);
    for _ in 0..steps {
        tokio::time::sleep(TICK).await;
        stage.poll_status().unwrap();
        stage.frame().unwrap();
    }
}
