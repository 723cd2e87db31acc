//! Arona 命令行宿主
//!
//! 无窗口运行一个场景：从 stdin 读取文本命令（见 [`host::parse_command`]），
//! 默认打开自动推进，脚本结束后退出。

use std::io::BufRead;

use anyhow::Context;
use host::{AppConfig, FsAssets, HeadlessRenderer, SilentDevice, Stage, parse_command};
use tokio::sync::mpsc;

const CONFIG_PATH: &str = "config.json";

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(CONFIG_PATH);
    host::logging::init(&config.debug.log_level);
    config.validate().context("配置无效")?;

    let source = FsAssets::new(config.assets_root.clone());
    let mut stage = Stage::new(
        config,
        HeadlessRenderer::default(),
        Box::new(SilentDevice::default()),
        Box::new(source),
    )
    .context("场景初始化失败")?;
    stage.handle_input(host::InputEvent::ToggleAuto)?;

    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                None => tracing::warn!(line = %line, "无法识别的命令"),
            }
        }
    });

    stage.run(rx, true).await?;
    tracing::info!(frames = stage.renderer().frames, "运行结束");
    Ok(())
}
