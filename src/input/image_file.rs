// 该文件是 Shanhuo （山火）项目的一部分。
// src/input/image_file.rs - 图像文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::io::Cursor;
use std::path::Path;

use image::{ImageReader, RgbImage};
use tracing::debug;

use super::AcquireError;

/// 读取并解码本地图片文件
pub fn load_image_file(path: &Path) -> Result<RgbImage, AcquireError> {
  let image = ImageReader::open(path)?.decode()?.to_rgb8();
  debug!(
    "读取图片 {}: {}x{}",
    path.display(),
    image.width(),
    image.height()
  );
  Ok(image)
}

/// 解码内存中的图片字节（本地上传场景）
pub fn decode_image_bytes(bytes: &[u8]) -> Result<RgbImage, AcquireError> {
  let image = ImageReader::new(Cursor::new(bytes))
    .with_guessed_format()?
    .decode()?
    .to_rgb8();
  Ok(image)
}
