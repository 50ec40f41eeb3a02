// 该文件是 Shanhuo （山火）项目的一部分。
// src/cache.rs - 进程级模型缓存
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::model::labels::LabelTable;
use crate::model::{ModelError, ModelHandle};

/// 进程级模型缓存：按模型文件路径加载一次、多次复用。
/// 模型工件在进程生命周期内视为不变，因此没有淘汰策略；
/// 单线程顺序处理请求，不需要加锁。
#[derive(Default)]
pub struct ModelCache {
  loaded: HashMap<PathBuf, Arc<ModelHandle>>,
}

impl ModelCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// 返回已加载的模型句柄，必要时先加载并放入缓存
  pub fn get_or_load(
    &mut self,
    path: &Path,
    labels: LabelTable,
  ) -> Result<Arc<ModelHandle>, ModelError> {
    if let Some(handle) = self.loaded.get(path) {
      debug!("模型缓存命中: {}", path.display());
      return Ok(handle.clone());
    }

    info!("加载模型: {}", path.display());
    let handle = Arc::new(ModelHandle::load(path, labels)?);
    self.loaded.insert(path.to_path_buf(), handle.clone());
    Ok(handle)
  }

  /// 直接放入已构造的句柄（自定义后端场景）
  pub fn insert(&mut self, path: impl Into<PathBuf>, handle: ModelHandle) -> Arc<ModelHandle> {
    let handle = Arc::new(handle);
    self.loaded.insert(path.into(), handle.clone());
    handle
  }

  pub fn len(&self) -> usize {
    self.loaded.len()
  }

  pub fn is_empty(&self) -> bool {
    self.loaded.is_empty()
  }
}
