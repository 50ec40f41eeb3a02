// 该文件是 Shanhuo （山火）项目的一部分。
// src/model/visualizer.rs - 叠加图绘制
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use tracing::warn;

use super::{Detection, Overlay};

/// 运行时字体搜索路径
const FONT_PATHS: [&str; 3] = [
  "assets/DejaVuSans.ttf",
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// 调色板大小，取 COCO 类别数
const PALETTE_SIZE: usize = 80;

/// 叠加图绘制工具
pub struct Visualizer {
  /// 字体，缺失时只绘制边界框
  font: Option<FontArc>,
  /// 字体大小
  font_scale: PxScale,
  /// 边界框颜色映射
  colors: Vec<Rgb<u8>>,
}

impl Default for Visualizer {
  fn default() -> Self {
    Self::new()
  }
}

impl Visualizer {
  /// 创建一个新的可视化工具
  pub fn new() -> Self {
    let font = Self::load_font();
    if font.is_none() {
      warn!("未找到可用字体，叠加图将只绘制边界框");
    }

    // 按色相均分生成类别颜色
    let colors: Vec<Rgb<u8>> = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        Self::hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Self {
      font,
      font_scale: PxScale::from(16.0),
      colors,
    }
  }

  fn load_font() -> Option<FontArc> {
    for path in FONT_PATHS {
      if let Ok(data) = std::fs::read(path)
        && let Ok(font) = FontArc::try_from_vec(data)
      {
        return Some(font);
      }
    }
    None
  }

  /// HSV 转 RGB
  fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
      (c, x, 0.0)
    } else if h < 120.0 {
      (x, c, 0.0)
    } else if h < 180.0 {
      (0.0, c, x)
    } else if h < 240.0 {
      (0.0, x, c)
    } else if h < 300.0 {
      (x, 0.0, c)
    } else {
      (c, 0.0, x)
    };

    Rgb([
      ((r + m) * 255.0) as u8,
      ((g + m) * 255.0) as u8,
      ((b + m) * 255.0) as u8,
    ])
  }

  /// 在输入图像副本上绘制检测结果，输出 BGR 叠加图
  pub fn plot(&self, image: &RgbImage, detections: &[Detection]) -> Overlay {
    let mut canvas = image.clone();
    self.draw_detections(&mut canvas, detections);
    Overlay::from_rgb(&canvas)
  }

  /// 在图像上绘制检测框与标签，bbox 为归一化坐标
  fn draw_detections(&self, image: &mut RgbImage, detections: &[Detection]) {
    let (w, h) = (image.width() as f32, image.height() as f32);

    for detection in detections {
      let color = self.colors[detection.class_id % self.colors.len()];

      let x_min = ((detection.bbox[0] * w).floor() as i32).clamp(0, w as i32 - 1);
      let y_min = ((detection.bbox[1] * h).floor() as i32).clamp(0, h as i32 - 1);
      let x_max = ((detection.bbox[2] * w).ceil() as i32).clamp(0, w as i32 - 1);
      let y_max = ((detection.bbox[3] * h).ceil() as i32).clamp(0, h as i32 - 1);

      if x_min >= x_max || y_min >= y_max {
        continue;
      }

      let width = (x_max - x_min) as u32;
      let height = (y_max - y_min) as u32;

      let rect = Rect::at(x_min, y_min).of_size(width, height);
      draw_hollow_rect_mut(image, rect, color);

      // 绘制第二个边框以增加可见度
      if width > 2 && height > 2 {
        let inner = Rect::at(x_min + 1, y_min + 1).of_size(width - 2, height - 2);
        draw_hollow_rect_mut(image, inner, color);
      }

      if let Some(font) = &self.font {
        let label = format!("{}: {:.2}", detection.class_name, detection.confidence);
        let text_y = (y_min - 20).max(0);
        draw_text_mut(image, color, x_min, text_y, self.font_scale, font, &label);
      }
    }
  }
}
