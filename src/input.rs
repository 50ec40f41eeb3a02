// 该文件是 Shanhuo （山火）项目的一部分。
// src/input.rs - 图片来源
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use image::RgbImage;
use thiserror::Error;
use url::Url;

pub mod image_file;

#[cfg(feature = "remote_image")]
pub mod remote;

#[derive(Error, Debug)]
pub enum AcquireError {
  #[error("无法读取图片文件: {0}")]
  Io(#[from] std::io::Error),
  #[error("无法解码图片: {0}")]
  Decode(#[from] image::ImageError),
  #[cfg(feature = "remote_image")]
  #[error("图片下载失败: {0}")]
  Http(#[from] reqwest::Error),
  #[error("不支持的 URL 方案: {0}")]
  UnsupportedScheme(String),
  #[error("无效的图片来源: {0}")]
  InvalidSource(String),
}

/// 图片来源：本地路径或远程 URL
#[derive(Debug, Clone)]
pub enum ImageSource {
  File(PathBuf),
  Url(Url),
}

impl ImageSource {
  /// 解析图片来源字符串。
  /// 支持本地路径、百分号编码的 file:// URL 与 http(s) URL。
  pub fn parse(source: &str) -> Result<Self, AcquireError> {
    if let Ok(url) = Url::parse(source) {
      match url.scheme() {
        "http" | "https" => return Ok(ImageSource::Url(url)),
        "file" => {
          let path = urlencoding::decode(url.path())
            .map_err(|_| AcquireError::InvalidSource(source.to_string()))?;
          return Ok(ImageSource::File(PathBuf::from(path.into_owned())));
        }
        _ if source.contains("://") => {
          return Err(AcquireError::UnsupportedScheme(url.scheme().to_string()));
        }
        // 形如盘符的短方案按本地路径处理
        _ => {}
      }
    }

    Ok(ImageSource::File(PathBuf::from(source)))
  }

  /// 获取并解码图片
  pub fn acquire(&self) -> Result<RgbImage, AcquireError> {
    match self {
      ImageSource::File(path) => image_file::load_image_file(path),
      #[cfg(feature = "remote_image")]
      ImageSource::Url(url) => remote::fetch_image_url(url),
      #[cfg(not(feature = "remote_image"))]
      ImageSource::Url(url) => Err(AcquireError::UnsupportedScheme(url.scheme().to_string())),
    }
  }
}
