//! 脚本与元数据加载

use std::fs;
use std::path::Path;

use arona_runtime::{Metadata, MetadataError, MigrationReport, Parser, Script};

use crate::error::{HostError, HostResult};

/// 读取并解析脚本
///
/// 脚本缺失是致命错误；解析警告只记录日志。
pub fn load_script(path: &Path) -> HostResult<Script> {
    let text = fs::read_to_string(path).map_err(|source| HostError::Script {
        path: path.display().to_string(),
        source,
    })?;
    let script_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "script".to_string());

    let mut parser = Parser::new();
    let script = parser.parse(&script_id, &text);
    for warning in parser.warnings() {
        tracing::warn!(%warning, "脚本解析警告");
    }
    tracing::info!(
        path = %path.display(),
        elements = script.len(),
        "脚本加载完成"
    );
    Ok(script)
}

/// 元数据加载结果
#[derive(Debug, Clone)]
pub struct LoadedMetadata {
    pub metadata: Metadata,
    pub report: MigrationReport,
    /// 迁移结果写入的位置
    pub written_to: Option<String>,
}

/// 读取元数据，遇到旧格式时迁移并另存
///
/// 文件缺失时使用空元数据；迁移结果写入失败不影响本次运行，
/// 错误以 [`MetadataError::Persist`] 记录在日志中。
pub fn load_metadata(path: &Path, migrated_path: &Path) -> HostResult<LoadedMetadata> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "元数据文件不存在，使用空元数据");
        return Ok(LoadedMetadata {
            metadata: Metadata::default(),
            report: MigrationReport::default(),
            written_to: None,
        });
    }

    let text = fs::read_to_string(path).map_err(|e| MetadataError::Json(e.to_string()))?;
    let mut metadata = Metadata::from_json(&text)?;
    let report = metadata.migrate();

    if let Some(err) = report.duplicates_error() {
        tracing::warn!(error = %err, "元数据存在重复条目");
    }

    let written_to = if report.migrated {
        match persist(&metadata, migrated_path) {
            Ok(()) => {
                tracing::info!(path = %migrated_path.display(), "迁移后的元数据已保存");
                Some(migrated_path.display().to_string())
            }
            Err(err) => {
                tracing::warn!(error = %err, "迁移后的元数据保存失败");
                None
            }
        }
    } else {
        None
    };

    Ok(LoadedMetadata {
        metadata,
        report,
        written_to,
    })
}

fn persist(metadata: &Metadata, path: &Path) -> Result<(), MetadataError> {
    let json = metadata.to_json_pretty()?;
    fs::write(path, json).map_err(|e| MetadataError::Persist {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
