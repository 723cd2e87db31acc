//! # Asset Source 模块
//!
//! 资源来源抽象层。加载器只通过 [`AssetSource`] 读取资源，
//! 像素与音频数据的解码交给渲染器与音频设备，这里只负责
//! 读出尺寸、帧序列与原始字节。
//!
//! ## 路径约定
//!
//! 所有路径参数都是**逻辑路径**（相对于 assets_root，`/` 分隔）。

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arona_runtime::{AnimatedSprite, FrameDisposal, SpriteFrame, Texture};
use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;

use super::AssetError;
use super::path::normalize_logical_path;

/// 已加载的音频
#[derive(Debug, Clone, PartialEq)]
pub struct SoundClip {
    pub path: String,
    pub bytes: Arc<[u8]>,
}

/// 已加载的字体
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    pub path: String,
    pub bytes: Arc<[u8]>,
}

/// 资源来源 trait
pub trait AssetSource: Send + Sync {
    /// 加载静态纹理（读取尺寸）
    fn load_texture(&self, path: &str) -> Result<Texture, AssetError>;

    /// 加载多帧动画（GIF）
    fn load_animated(&self, name: &str, path: &str) -> Result<AnimatedSprite, AssetError>;

    /// 加载音频字节
    fn load_sound(&self, path: &str) -> Result<SoundClip, AssetError>;

    /// 加载字体字节
    fn load_font(&self, path: &str) -> Result<FontFace, AssetError>;

    /// 检查资源是否存在
    fn exists(&self, path: &str) -> bool;
}

/// 文件系统资源来源
#[derive(Debug, Clone)]
pub struct FsAssets {
    /// 资源根目录
    base_path: PathBuf,
}

impl FsAssets {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// 解析逻辑路径到完整文件系统路径
    fn resolve(&self, logical_path: &str) -> PathBuf {
        self.base_path.join(normalize_logical_path(logical_path))
    }

    fn read(&self, path: &str, kind: &str) -> Result<Arc<[u8]>, AssetError> {
        let full_path = self.resolve(path);
        if !full_path.exists() {
            return Err(AssetError::NotFound {
                path: path.to_string(),
            });
        }
        std::fs::read(&full_path)
            .map(Arc::from)
            .map_err(|e| AssetError::load_failed(path, kind, e))
    }
}

impl AssetSource for FsAssets {
    fn load_texture(&self, path: &str) -> Result<Texture, AssetError> {
        let full_path = self.resolve(path);
        if !full_path.exists() {
            return Err(AssetError::NotFound {
                path: path.to_string(),
            });
        }
        let (width, height) =
            image::image_dimensions(&full_path).map_err(|e| AssetError::InvalidFormat {
                path: path.to_string(),
                message: e.to_string(),
            })?;
        tracing::trace!(path, width, height, "纹理已加载");
        Ok(Texture::new(normalize_logical_path(path), width, height))
    }

    fn load_animated(&self, name: &str, path: &str) -> Result<AnimatedSprite, AssetError> {
        let full_path = self.resolve(path);
        let file = File::open(&full_path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => AssetError::NotFound {
                path: path.to_string(),
            },
            _ => AssetError::load_failed(path, "animation", e),
        })?;

        let invalid = |e: image::ImageError| AssetError::InvalidFormat {
            path: path.to_string(),
            message: e.to_string(),
        };
        let decoder = GifDecoder::new(BufReader::new(file)).map_err(invalid)?;
        let frames = decoder.into_frames().collect_frames().map_err(invalid)?;
        if frames.is_empty() {
            return Err(AssetError::InvalidFormat {
                path: path.to_string(),
                message: "GIF 没有任何帧".to_string(),
            });
        }

        let logical = normalize_logical_path(path);
        // 解码器输出的是合成后的完整画面，每帧都按替换处理
        let frames = frames
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                let (numer, denom) = frame.delay().numer_denom_ms();
                let delay_ms = if denom == 0 { 0 } else { numer / denom };
                let (width, height) = frame.buffer().dimensions();
                SpriteFrame {
                    texture: Texture::new(format!("{}#{}", logical, i), width, height),
                    delay: Duration::from_millis(u64::from(delay_ms)),
                    disposal: FrameDisposal::Replace,
                }
            })
            .collect::<Vec<_>>();

        tracing::trace!(name, frames = frames.len(), "动画已加载");
        Ok(AnimatedSprite::new(name, frames))
    }

    fn load_sound(&self, path: &str) -> Result<SoundClip, AssetError> {
        Ok(SoundClip {
            path: normalize_logical_path(path),
            bytes: self.read(path, "sound")?,
        })
    }

    fn load_font(&self, path: &str) -> Result<FontFace, AssetError> {
        Ok(FontFace {
            path: normalize_logical_path(path),
            bytes: self.read(path, "font")?,
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_load_texture_reads_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bg")).unwrap();
        RgbaImage::from_pixel(8, 4, Rgba([0, 0, 0, 255]))
            .save(dir.path().join("bg/night.png"))
            .unwrap();

        let source = FsAssets::new(dir.path());
        let texture = source.load_texture("bg/night.png").unwrap();
        assert_eq!((texture.width, texture.height), (8, 4));
        assert_eq!(texture.path, "bg/night.png");
    }

    #[test]
    fn test_missing_files_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = FsAssets::new(dir.path());
        assert!(matches!(
            source.load_texture("bg/none.jpeg"),
            Err(AssetError::NotFound { .. })
        ));
        assert!(matches!(
            source.load_sound("sfx/none.mp3"),
            Err(AssetError::NotFound { .. })
        ));
        assert!(matches!(
            source.load_animated("none", "emote/none.gif"),
            Err(AssetError::NotFound { .. })
        ));
        assert!(!source.exists("sfx/none.mp3"));
    }

    #[test]
    fn test_load_sound_keeps_bytes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sfx")).unwrap();
        std::fs::write(dir.path().join("sfx/bell.mp3"), b"ID3").unwrap();

        let clip = FsAssets::new(dir.path()).load_sound("sfx/bell.mp3").unwrap();
        assert_eq!(&*clip.bytes, b"ID3");
    }

    #[test]
    fn test_invalid_image_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("bg")).unwrap();
        std::fs::write(dir.path().join("bg/bad.jpeg"), b"not an image").unwrap();

        let err = FsAssets::new(dir.path())
            .load_texture("bg/bad.jpeg")
            .unwrap_err();
        assert!(matches!(err, AssetError::InvalidFormat { .. }));
    }
}
