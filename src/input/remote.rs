// 该文件是 Shanhuo （山火）项目的一部分。
// src/input/remote.rs - 远程图片获取
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;
use tracing::{debug, info};
use url::Url;

use super::{AcquireError, image_file};

/// 以阻塞方式下载远程图片并解码。
/// 非 2xx 响应与网络错误都作为图片获取失败上报，不再向下游传递图片。
pub fn fetch_image_url(url: &Url) -> Result<RgbImage, AcquireError> {
  info!("下载远程图片: {}", url);

  let response = reqwest::blocking::get(url.clone())?.error_for_status()?;
  let bytes = response.bytes()?;
  debug!("下载完成: {} 字节", bytes.len());

  image_file::decode_image_bytes(&bytes)
}
