// 该文件是 Shanhuo （山火）项目的一部分。
// src/catalog.rs - 模型工件目录
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use clap::ValueEnum;
use thiserror::Error;
use tracing::debug;

use crate::model::labels::LabelTable;

/// 模型工件扩展名
pub const ARTIFACT_EXTENSION: &str = "onnx";

/// 模型类别，决定模型目录与类别表
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModelCategory {
  /// 野火检测模型
  FireDetection,
  /// 通用检测模型
  General,
}

impl ModelCategory {
  /// 类别对应的模型目录名
  pub fn models_dir(&self) -> &'static str {
    match self {
      ModelCategory::FireDetection => "fire-models",
      ModelCategory::General => "general-models",
    }
  }

  /// 类别对应的类别表
  pub fn label_table(&self) -> LabelTable {
    match self {
      ModelCategory::FireDetection => LabelTable::fire(),
      ModelCategory::General => LabelTable::coco(),
    }
  }
}

#[derive(Error, Debug)]
pub enum CatalogError {
  #[error("模型目录不存在: {0}")]
  MissingDirectory(PathBuf),
  #[error("模型目录 {0} 中没有任何 .onnx 模型文件")]
  NoArtifacts(PathBuf),
  #[error("模型文件不存在: {0}")]
  ArtifactMissing(PathBuf),
  #[error("读取模型目录失败: {0}")]
  Io(#[from] std::io::Error),
}

/// 扫描模型目录，返回不含扩展名的模型名列表，按名称排序。
/// 目录缺失或没有任何模型文件都在推理开始前作为配置错误上报。
pub fn list_artifacts(dir: &Path) -> Result<Vec<String>, CatalogError> {
  if !dir.is_dir() {
    return Err(CatalogError::MissingDirectory(dir.to_path_buf()));
  }

  let mut names = Vec::new();
  for entry in std::fs::read_dir(dir)? {
    let path = entry?.path();
    if path.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
      && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
    {
      names.push(stem.to_string());
    }
  }

  if names.is_empty() {
    return Err(CatalogError::NoArtifacts(dir.to_path_buf()));
  }

  names.sort();
  debug!("在 {} 中找到 {} 个模型: {:?}", dir.display(), names.len(), names);
  Ok(names)
}

/// 将模型名解析为完整文件路径，文件缺失时报配置错误
pub fn resolve_artifact(dir: &Path, name: &str) -> Result<PathBuf, CatalogError> {
  let path = dir.join(format!("{}.{}", name, ARTIFACT_EXTENSION));
  if !path.is_file() {
    return Err(CatalogError::ArtifactMissing(path));
  }
  Ok(path)
}
