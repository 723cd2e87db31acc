//! # 诊断模块
//!
//! 提供脚本静态检查和诊断 API，不依赖 IO 或引擎。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行
//! - 诊断分级：Error（必须修复）、Warn（建议修复）
//! - 复用 parser 的指令归类结果，不重复解析逻辑

use std::collections::BTreeSet;

use crate::metadata::Metadata;
use crate::script::{Directive, Script, StageAction};

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 来源（脚本 ID 或资源路径）
    pub context: String,
    /// 行号（如果可定位，从 1 开始）
    pub line: Option<usize>,
    /// 诊断消息
    pub message: String,
    /// 诊断详情（可选，如原始行内容）
    pub detail: Option<String>,
}

impl Diagnostic {
    fn with_level(level: DiagnosticLevel, context: String, message: String) -> Self {
        Self {
            level,
            context,
            line: None,
            message,
            detail: None,
        }
    }

    /// 创建错误诊断
    pub fn error(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Error, context.into(), message.into())
    }

    /// 创建警告诊断
    pub fn warn(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::with_level(DiagnosticLevel::Warn, context.into(), message.into())
    }

    /// 设置行号
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// 设置详情
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.level, self.context)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        write!(f, ": {}", self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, "\n  | {}", detail)?;
        }
        Ok(())
    }
}

/// 诊断结果
#[derive(Debug, Clone, Default)]
pub struct DiagnosticResult {
    /// 诊断条目列表
    pub diagnostics: Vec<Diagnostic>,
}

impl DiagnosticResult {
    /// 创建空结果
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加诊断
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// 获取错误数量
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .count()
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

//=============================================================================
// 资源引用
//=============================================================================

/// 资源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// 背景图片
    Background,
    /// 背景音乐
    Bgm,
    /// 音效
    Sfx,
    /// 角色（按说话人）
    Actor,
    /// 角色立绘（按说话人 + 表情）
    ActorTexture,
    /// 表情动画
    Emote,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Background => write!(f, "背景"),
            Self::Bgm => write!(f, "BGM"),
            Self::Sfx => write!(f, "音效"),
            Self::Actor => write!(f, "角色"),
            Self::ActorTexture => write!(f, "立绘"),
            Self::Emote => write!(f, "表情"),
        }
    }
}

/// 脚本引用的资源
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceReference {
    pub kind: ResourceKind,
    /// 主键：背景/音频/表情名，或角色名
    pub key: String,
    /// 次键：立绘的表情 key
    pub variant: Option<String>,
}

impl ResourceReference {
    fn new(kind: ResourceKind, key: &str) -> Self {
        Self {
            kind,
            key: key.to_string(),
            variant: None,
        }
    }
}

/// 提取脚本引用的全部资源（去重，按类型排序）
pub fn extract_resource_references(script: &Script) -> Vec<ResourceReference> {
    let mut refs = BTreeSet::new();
    for element in &script.elements {
        match &element.directive {
            Directive::Background(key) => {
                refs.insert(ResourceReference::new(ResourceKind::Background, key));
            }
            Directive::Bgm { key, .. } => {
                refs.insert(ResourceReference::new(ResourceKind::Bgm, key));
            }
            Directive::Sfx(key) => {
                refs.insert(ResourceReference::new(ResourceKind::Sfx, key));
            }
            Directive::All { emote: Some(name) } => {
                refs.insert(ResourceReference::new(ResourceKind::Emote, name));
            }
            Directive::Speaker(action) => {
                refs.insert(ResourceReference::new(ResourceKind::Actor, &element.name));
                match action {
                    StageAction::Emote(name) => {
                        refs.insert(ResourceReference::new(ResourceKind::Emote, name));
                    }
                    StageAction::Pose { texture, .. } => {
                        refs.insert(ResourceReference {
                            kind: ResourceKind::ActorTexture,
                            key: element.name.clone(),
                            variant: Some(texture.clone()),
                        });
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }
    refs.into_iter().collect()
}

//=============================================================================
// 脚本分析 API
//=============================================================================

/// 对照元数据检查脚本
///
/// 执行以下检查：
/// - 控制标签参数无效（Error）
/// - 表情未在元数据中声明（Error，运行时会中止）
/// - 位移动画未在元数据中声明（Warn，运行时跳过）
/// - clone 的源角色从未出现（Warn）
pub fn analyze_script(script: &Script, metadata: &Metadata) -> DiagnosticResult {
    let mut result = DiagnosticResult::new();
    let speakers = script.speakers();

    for element in &script.elements {
        let at = |d: Diagnostic| d.with_line(element.line_number);
        match &element.directive {
            Directive::Invalid(err) => {
                result.push(at(Diagnostic::error(&script.id, err.to_string())));
            }
            Directive::All { emote: Some(name) }
            | Directive::Speaker(StageAction::Emote(name)) => {
                if metadata.emote(name).is_none() {
                    result.push(at(Diagnostic::error(
                        &script.id,
                        format!("表情 '{}' 未在元数据中声明", name),
                    )));
                }
            }
            Directive::Speaker(StageAction::Pose {
                animation: Some(name),
                ..
            }) => {
                if metadata.animation(name).is_none() {
                    result.push(at(Diagnostic::warn(
                        &script.id,
                        format!("动画 '{}' 未在元数据中声明，将被跳过", name),
                    )));
                }
            }
            Directive::Clone { source, .. } => {
                if !speakers.contains(&source.as_str()) {
                    result.push(at(Diagnostic::warn(
                        &script.id,
                        format!("clone 的源角色 '{}' 从未出现", source),
                    )));
                }
            }
            _ => {}
        }
    }

    result
}
