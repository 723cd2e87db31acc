//! # Stage 模块
//!
//! 舞台主循环：持有引擎、渲染器、音频、资源来源与动画任务，
//! 把 Runtime 的命令落地，并把任务回传的状态交还给引擎。
//!
//! ## 主循环
//!
//! ```text
//! select! {
//!     frame tick   => 加载一个资源 / 同步音量 / 绘制
//!     status       => engine.handle_signal()
//!     debug        => 追加到调试叠加层
//!     input        => 点击、切换、音量、重载、退出
//! }
//! ```
//!
//! 所有对引擎与会话的修改都发生在这个循环里；动画任务只写共享句柄。

use std::time::Duration;

use arona_runtime::reply::hit_test;
use arona_runtime::script::FadeDirection;
use arona_runtime::{Command, Engine, RuntimeError, TurnState};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::animator::{Animator, SpinnerHandle};
use crate::audio::{AudioController, AudioDevice};
use crate::config::AppConfig;
use crate::error::{HostError, HostResult};
use crate::input::InputEvent;
use crate::render::{FrameLayout, Renderer, draw_frame};
use crate::resources::{AssetSource, FontFace, LoadProgress, LoadQueue, path};
use crate::script_loader::{load_metadata, load_script};
use crate::status::{StatusMessage, StatusReceiver, channels};

/// 主循环的一次唤醒
enum StageEvent {
    Frame,
    Status(StatusMessage),
    Debug(String),
    Input(InputEvent),
    InputClosed,
}

pub struct Stage<R: Renderer> {
    config: AppConfig,
    engine: Engine,
    renderer: R,
    audio: AudioController,
    source: Box<dyn AssetSource>,
    animator: Animator,
    status: StatusReceiver,
    loader: Option<LoadQueue>,
    spinner: Option<SpinnerHandle>,
    font: FontFace,
    layout: FrameLayout,
    /// 加载前的脚本检查结果，加载完成后与资源错误一起显示
    diagnostics: Vec<String>,
}

impl<R: Renderer> Stage<R> {
    /// 创建舞台并开始加载场景
    ///
    /// 字体与脚本是必需的，缺失时返回错误。必须在 tokio 运行时内调用。
    pub fn new(
        config: AppConfig,
        renderer: R,
        device: Box<dyn AudioDevice>,
        source: Box<dyn AssetSource>,
    ) -> HostResult<Self> {
        let font = source
            .load_font(&config.default_font)
            .map_err(HostError::Font)?;
        tracing::info!(path = %font.path, "字体已加载");

        let script = load_script(&config.script_path())?;
        let loaded = load_metadata(&config.metadata_path(), &config.migrated_metadata_path())?;
        let engine = Engine::new(script, loaded.metadata, config.engine_config());

        let mut diagnostics = Vec::new();
        if let Some(err) = loaded.report.duplicates_error() {
            diagnostics.push(err.to_string());
        }

        let (tx, rx) = channels();
        let layout = FrameLayout::new(config.window.width as f32, config.window.height as f32);
        let audio = AudioController::new(device, config.audio.volume_floor, config.audio.volume_step);
        let animator = Animator::new(config.animation.clone(), tx);

        let mut stage = Self {
            config,
            engine,
            renderer,
            audio,
            source,
            animator,
            status: rx,
            loader: None,
            spinner: None,
            font,
            layout,
            diagnostics,
        };
        stage.start_loading();
        Ok(stage)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn audio(&self) -> &AudioController {
        &self.audio
    }

    pub fn font(&self) -> &FontFace {
        &self.font
    }

    pub fn is_loading(&self) -> bool {
        self.loader.is_some()
    }

    /// 正在运行的动画任务数
    pub fn running_tasks(&self) -> usize {
        self.animator.running()
    }

    /// 启动加载动画与加载队列
    fn start_loading(&mut self) {
        if self.config.debug.script_check {
            let result = self.engine.metadata().validate(self.engine.script());
            for diagnostic in &result.diagnostics {
                tracing::warn!(%diagnostic, "脚本检查");
                self.diagnostics.push(diagnostic.to_string());
            }
            if result.has_errors() {
                tracing::warn!(errors = result.error_count(), "脚本检查发现错误");
            }
        }

        match self
            .source
            .load_animated(path::LOADING_SPINNER, &path::ui_animation(path::LOADING_SPINNER))
        {
            Ok(sprite) => {
                let sprite = std::sync::Arc::new(sprite);
                self.engine.session_mut().resources.spinner = Some(sprite.clone());
                self.spinner = self.animator.spinner(sprite);
            }
            Err(err) => tracing::warn!(error = %err, "加载动画不可用"),
        }

        self.loader = Some(LoadQueue::start(self.engine.script(), self.engine.metadata()));
    }

    /// 处理一帧：加载至多一个资源，同步音量，绘制
    pub fn frame(&mut self) -> HostResult<()> {
        if let Some(loader) = self.loader.as_mut() {
            let (metadata, session) = self.engine.loading_parts();
            let progress = loader.step(
                self.source.as_ref(),
                metadata,
                session,
                self.audio.bank_mut(),
            );
            if let LoadProgress::Finished { errors } = progress {
                self.finish_loading(errors.iter().map(ToString::to_string).collect())?;
            }
        }

        self.audio.sync();
        self.engine
            .session_mut()
            .dismissed_replies
            .retain(|r| r.opacity.get() > 0.0);

        draw_frame(
            &mut self.renderer,
            &self.engine,
            self.spinner.as_ref(),
            &self.layout,
        );
        Ok(())
    }

    fn finish_loading(&mut self, errors: Vec<String>) -> HostResult<()> {
        self.loader = None;
        if let Some(spinner) = self.spinner.take() {
            spinner.animation().halt();
        }

        let mut messages = std::mem::take(&mut self.diagnostics);
        messages.extend(errors);
        self.engine.session_mut().replace_debug(messages);

        let result = self.engine.finish_loading();
        self.apply(result)
    }

    /// 处理引擎调用的结果
    ///
    /// 未声明的表情是致命错误，其余运行时错误显示在调试叠加层。
    fn apply(&mut self, result: Result<Vec<Command>, RuntimeError>) -> HostResult<()> {
        match result {
            Ok(commands) => {
                self.execute(commands);
                Ok(())
            }
            Err(err @ RuntimeError::UnknownEmote { .. }) => {
                tracing::error!(error = %err, "脚本使用了未声明的表情");
                Err(err.into())
            }
            Err(err) => {
                tracing::warn!(error = %err, "运行时错误");
                self.engine.session_mut().push_debug(err.to_string());
                Ok(())
            }
        }
    }

    /// 执行 Runtime 发出的命令
    pub fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            tracing::trace!(?command, "执行命令");
            self.execute_one(command);
        }
    }

    fn execute_one(&mut self, command: Command) {
        let session = self.engine.session();
        match command {
            Command::ShowBackground { key } => {
                tracing::debug!(key = %key, "切换背景");
            }

            Command::PlaySfx { key } => {
                let level = session.sfx_volume;
                self.audio.play_sfx(&key, level);
            }

            Command::Bgm { key, action } => {
                let level = session.bgm_volume;
                if let Some(ramp) = self.audio.bgm(&key, action, level) {
                    self.animator.ramp_volume(ramp);
                }
            }

            Command::SceneFade {
                direction,
                color,
                ticket,
            } => {
                let opacity = session.fade.opacity.clone();
                self.engine.session_mut().fade.color = color;
                self.animator.fade_scene(&opacity, direction, ticket);
            }

            Command::RevealDialogue { ticket } => {
                if let Some(dialogue) = &session.dialogue {
                    self.animator.reveal(dialogue, ticket);
                }
            }

            Command::PresentReplies => {
                self.animator.fade_replies(&session.replies, FadeDirection::In);
            }

            Command::DismissReplies => {
                self.animator
                    .fade_replies(&session.dismissed_replies, FadeDirection::Out);
            }

            Command::StartEmote {
                actor,
                emote,
                with_sound,
            } => {
                let (Some(target), Some(sprite)) =
                    (session.actor(&actor), session.resources.emote(&emote))
                else {
                    tracing::debug!(actor = %actor, emote = %emote, "表情或角色不可用");
                    return;
                };
                let started = self.animator.animate_emote(target, sprite.clone());
                if started && with_sound {
                    let level = session.sfx_volume;
                    self.audio.play_sfx(&emote, level);
                }
            }

            Command::FadeActor { actor, direction } => {
                if let Some(target) = session.actor(&actor) {
                    self.animator.fade_actor(target, direction);
                }
            }

            Command::AnimateActor {
                actor,
                animation,
                ticket,
            } => {
                let target = session.actor(&actor);
                let meta = self.engine.metadata().animation(&animation);
                match (target, meta) {
                    (Some(target), Some(meta)) => {
                        self.animator.animate_actor(target, meta, ticket);
                    }
                    _ => {
                        tracing::warn!(actor = %actor, animation = %animation, "无法执行动画");
                        if let Some(ticket) = ticket {
                            self.animator.schedule(Duration::ZERO, ticket);
                        }
                    }
                }
            }

            Command::ScheduleSignal { after, ticket } => {
                self.animator.schedule(after, ticket);
            }

            Command::ClearStage => {
                tracing::debug!("画面已清空");
            }

            Command::Debug { message } => {
                tracing::warn!(message = %message, "内容错误");
                self.engine.session_mut().push_debug(message);
            }
        }
    }

    /// 处理动画任务回传的状态
    pub fn handle_status(&mut self, message: StatusMessage) -> HostResult<()> {
        let result = self.engine.handle_signal(message.into());
        self.apply(result)
    }

    /// 处理通道中已到达的全部状态与调试消息
    pub fn poll_status(&mut self) -> HostResult<usize> {
        let mut handled = 0;
        while let Ok(message) = self.status.debug.try_recv() {
            self.engine.session_mut().push_debug(message);
        }
        while let Ok(message) = self.status.status.try_recv() {
            self.handle_status(message)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// 处理输入；返回 `false` 表示退出
    pub fn handle_input(&mut self, event: InputEvent) -> HostResult<bool> {
        match event {
            InputEvent::Click { x, y } => self.click(x, y)?,

            InputEvent::ToggleAuto => {
                let enabled = !self.engine.session().auto_advance;
                let commands = self.engine.set_auto_advance(enabled);
                self.execute(commands);
            }

            InputEvent::ToggleDebug => {
                let session = self.engine.session_mut();
                session.debug_overlay = !session.debug_overlay;
            }

            InputEvent::VolumeUp | InputEvent::VolumeDown => {
                let up = event == InputEvent::VolumeUp;
                let session = self.engine.session_mut();
                session.bgm_volume = self.audio.step_level(session.bgm_volume, up);
                session.sfx_volume = self.audio.step_level(session.sfx_volume, up);
                let level = session.bgm_volume;
                tracing::info!(level, "音量");
                self.audio.set_bgm_level(level);
            }

            InputEvent::Reset => self.reload()?,

            InputEvent::Quit => return Ok(false),
        }
        Ok(true)
    }

    fn click(&mut self, x: f32, y: f32) -> HostResult<()> {
        match self.engine.state() {
            TurnState::Loading | TurnState::Done => Ok(()),

            TurnState::WaitingConfirmation => {
                let Some(index) = hit_test(&self.engine.session().replies, x, y) else {
                    return Ok(());
                };
                if let Err(err) = self.engine.confirm_reply(index) {
                    return self.apply(Err(err));
                }
                let result = self.engine.advance();
                self.apply(result)
            }

            // 等待中的淡入淡出、位移或延时也可以被点击跳过，其完成信号随之过期
            TurnState::Idle | TurnState::Advancing => {
                let revealing = self
                    .engine
                    .session()
                    .dialogue
                    .as_ref()
                    .filter(|d| !d.is_complete());
                if let Some(dialogue) = revealing {
                    dialogue.complete();
                    return Ok(());
                }
                let result = self.engine.advance();
                self.apply(result)
            }
        }
    }

    /// 重新读取脚本与元数据，从头开始
    ///
    /// 中止所有在途任务并换用新的状态通道，重载前的任务不会再影响新场景。
    pub fn reload(&mut self) -> HostResult<()> {
        tracing::info!("重新加载场景");
        self.animator.abort_all();
        self.loader = None;
        self.spinner = None;
        self.audio.reset();
        self.diagnostics.clear();

        let (tx, rx) = channels();
        self.animator.set_status(tx);
        self.status = rx;

        let script = load_script(&self.config.script_path())?;
        let loaded = load_metadata(
            &self.config.metadata_path(),
            &self.config.migrated_metadata_path(),
        )?;
        if let Some(err) = loaded.report.duplicates_error() {
            self.diagnostics.push(err.to_string());
        }
        self.engine.reload(script, loaded.metadata);
        self.start_loading();
        Ok(())
    }

    /// 运行主循环
    ///
    /// `exit_when_done` 为真时脚本结束即返回；否则直到收到退出输入。
    pub async fn run(
        &mut self,
        mut input: mpsc::UnboundedReceiver<InputEvent>,
        exit_when_done: bool,
    ) -> HostResult<()> {
        let mut ticker = tokio::time::interval(self.config.animation.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut input_open = true;

        loop {
            let event = tokio::select! {
                _ = ticker.tick() => StageEvent::Frame,
                Some(message) = self.status.status.recv() => StageEvent::Status(message),
                Some(message) = self.status.debug.recv() => StageEvent::Debug(message),
                received = input.recv(), if input_open => match received {
                    Some(event) => StageEvent::Input(event),
                    None => StageEvent::InputClosed,
                },
            };

            match event {
                StageEvent::Frame => self.frame()?,
                StageEvent::Status(message) => self.handle_status(message)?,
                StageEvent::Debug(message) => self.engine.session_mut().push_debug(message),
                StageEvent::Input(event) => {
                    if !self.handle_input(event)? {
                        tracing::info!("收到退出输入");
                        break;
                    }
                }
                StageEvent::InputClosed => {
                    input_open = false;
                    if !exit_when_done {
                        tracing::info!("输入已关闭，退出");
                        break;
                    }
                }
            }

            if exit_when_done && self.engine.is_finished() {
                tracing::info!("脚本已结束，退出");
                break;
            }
            // 没有输入时无法确认回复
            if !input_open && self.engine.state() == TurnState::WaitingConfirmation {
                tracing::warn!("输入已关闭，无法确认回复，退出");
                break;
            }
        }
        self.animator.abort_all();
        Ok(())
    }
}
