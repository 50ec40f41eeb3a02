// 该文件是 Shanhuo （山火）项目的一部分。
// src/output/render.rs - 结果渲染
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

use std::io::Cursor;
use std::path::Path;

use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use tracing::debug;

use super::RenderError;
use crate::model::Overlay;

/// 将 BGR 叠加图转换为 RGB 图像。
/// 通道交换必须精确：颠倒的通道序是正确性错误，不是显示瑕疵。
pub fn to_rgb(overlay: &Overlay) -> RgbImage {
  let width = overlay.width();
  let height = overlay.height();
  let data = overlay.as_bgr();

  ImageBuffer::from_fn(width, height, |x, y| {
    let idx = ((y * width + x) * 3) as usize;
    let b = data[idx];
    let g = data[idx + 1];
    let r = data[idx + 2];
    Rgb([r, g, b])
  })
}

/// 将图像编码为 PNG 字节流。
/// 只在需要下载产物时调用，内存中的像素缓冲才是规范中间形态。
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, RenderError> {
  let mut buffer = Vec::new();
  image.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
  debug!("PNG 编码完成: {} 字节", buffer.len());
  Ok(buffer)
}

/// 保存 PNG 到文件，必要时创建父目录
pub fn save_png(image: &RgbImage, path: &Path) -> Result<(), RenderError> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }

  image.save_with_format(path, ImageFormat::Png)?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn to_rgb_swaps_channels_back() {
    let mut image = RgbImage::new(2, 2);
    image.put_pixel(0, 0, Rgb([255, 0, 0]));
    image.put_pixel(1, 1, Rgb([10, 20, 30]));

    let overlay = Overlay::from_rgb(&image);
    let restored = to_rgb(&overlay);

    assert_eq!(restored.get_pixel(0, 0), &Rgb([255, 0, 0]));
    assert_eq!(restored.get_pixel(1, 1), &Rgb([10, 20, 30]));
    assert_eq!(restored, image);
  }

  #[test]
  fn encode_png_produces_png_signature() {
    let image = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
    let bytes = encode_png(&image).unwrap();
    assert_eq!(&bytes[0..4], &[0x89, b'P', b'N', b'G']);
  }

  #[test]
  fn save_png_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/out/prediction.png");

    let image = RgbImage::new(4, 4);
    save_png(&image, &path).unwrap();

    assert!(path.is_file());
  }
}
