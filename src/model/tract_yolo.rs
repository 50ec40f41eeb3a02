// 该文件是 Shanhuo （山火）项目的一部分。
// src/model/tract_yolo.rs - tract ONNX 推理后端
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;
use std::time::Instant;

use image::RgbImage;
use tract_onnx::prelude::tract_ndarray::{Array4, ArrayViewD};
use tract_onnx::prelude::*;
use tracing::{debug, info};

use super::{Backend, ModelError, RawDetection, RawOutput, SpeedBreakdown};

/// 模型输入边长
const INPUT_SIZE: u32 = 640;

/// 基于 tract 的 YOLO ONNX 推理后端，仅在 CPU 上执行
pub struct TractYolo {
  model: RunnableModel<TypedFact, Box<dyn TypedOp>, TypedModel>,
  num_classes: usize,
}

impl TractYolo {
  /// 加载并优化 ONNX 模型
  pub fn load(path: &Path, num_classes: usize) -> Result<Self, ModelError> {
    info!("加载模型文件: {}", path.display());

    let size = INPUT_SIZE as usize;
    let model = tract_onnx::onnx()
      .model_for_path(path)
      .map_err(|e| ModelError::Load(e.to_string()))?
      .with_input_fact(
        0,
        InferenceFact::dt_shape(f32::datum_type(), tvec![1, 3, size, size]),
      )
      .map_err(|e| ModelError::Load(e.to_string()))?
      .into_optimized()
      .map_err(|e| ModelError::Load(e.to_string()))?
      .into_runnable()
      .map_err(|e| ModelError::Load(e.to_string()))?;

    info!("模型加载完成");

    Ok(Self { model, num_classes })
  }

  /// 预处理：缩放到模型输入尺寸并归一化为 NCHW 张量
  fn preprocess(&self, image: &RgbImage) -> Tensor {
    let resized = image::imageops::resize(
      image,
      INPUT_SIZE,
      INPUT_SIZE,
      image::imageops::FilterType::Triangle,
    );

    let size = INPUT_SIZE as usize;
    let mut input = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in resized.enumerate_pixels() {
      input[(0, 0, y as usize, x as usize)] = pixel[0] as f32 / 255.0;
      input[(0, 1, y as usize, x as usize)] = pixel[1] as f32 / 255.0;
      input[(0, 2, y as usize, x as usize)] = pixel[2] as f32 / 255.0;
    }

    input.into_tensor()
  }

  /// 后处理：解码 [1, 4 + 类别数, N] 输出并执行 NMS
  fn postprocess(
    &self,
    view: &ArrayViewD<f32>,
    conf_threshold: f32,
    iou_threshold: f32,
  ) -> Result<Vec<RawDetection>, ModelError> {
    let shape = view.shape().to_vec();
    if shape.len() != 3 || shape[0] != 1 || shape[1] != 4 + self.num_classes {
      return Err(ModelError::OutputShape(shape));
    }

    let num_anchors = shape[2];
    let size = INPUT_SIZE as f32;
    let mut items = Vec::new();

    for i in 0..num_anchors {
      // 找到最高类别分数
      let mut best_score = 0.0f32;
      let mut best_class = 0usize;
      for c in 0..self.num_classes {
        let score = view[[0, 4 + c, i]];
        if score > best_score {
          best_score = score;
          best_class = c;
        }
      }

      if best_score < conf_threshold {
        continue;
      }

      // 中心坐标转角点坐标并归一化
      let cx = view[[0, 0, i]];
      let cy = view[[0, 1, i]];
      let bw = view[[0, 2, i]];
      let bh = view[[0, 3, i]];

      let x_min = ((cx - bw / 2.0) / size).clamp(0.0, 1.0);
      let y_min = ((cy - bh / 2.0) / size).clamp(0.0, 1.0);
      let x_max = ((cx + bw / 2.0) / size).clamp(0.0, 1.0);
      let y_max = ((cy + bh / 2.0) / size).clamp(0.0, 1.0);

      items.push(RawDetection {
        class_id: best_class,
        score: best_score,
        bbox: [x_min, y_min, x_max, y_max],
      });
    }

    Ok(nms(items, iou_threshold))
  }
}

impl Backend for TractYolo {
  fn detect(
    &self,
    image: &RgbImage,
    conf_threshold: f32,
    iou_threshold: f32,
  ) -> Result<RawOutput, ModelError> {
    let mut speed = SpeedBreakdown::default();

    let now = Instant::now();
    let tensor = self.preprocess(image);
    speed.preprocess_ms = now.elapsed().as_secs_f64() * 1000.0;

    let now = Instant::now();
    let outputs = self
      .model
      .run(tvec![tensor.into()])
      .map_err(|e| ModelError::Inference(e.into()))?;
    speed.inference_ms = now.elapsed().as_secs_f64() * 1000.0;

    let now = Instant::now();
    let view = outputs[0]
      .to_array_view::<f32>()
      .map_err(|e| ModelError::Inference(e.into()))?;
    let items = self.postprocess(&view, conf_threshold, iou_threshold)?;
    speed.postprocess_ms = now.elapsed().as_secs_f64() * 1000.0;

    debug!("检测到 {} 个目标", items.len());

    Ok(RawOutput { items, speed })
  }
}

/// 非极大值抑制，同类别之间按 IoU 去重，结果按置信度降序
fn nms(mut items: Vec<RawDetection>, iou_threshold: f32) -> Vec<RawDetection> {
  items.sort_by(|a, b| {
    b.score
      .partial_cmp(&a.score)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  let mut result = Vec::new();
  while !items.is_empty() {
    let best = items.remove(0);
    items.retain(|item| item.class_id != best.class_id || iou(&best.bbox, &item.bbox) < iou_threshold);
    result.push(best);
  }

  result
}

/// 计算两个边界框的 IoU，bbox 为 [x_min, y_min, x_max, y_max]
fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let x1 = a[0].max(b[0]);
  let y1 = a[1].max(b[1]);
  let x2 = a[2].min(b[2]);
  let y2 = a[3].min(b[3]);

  let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  let union = area_a + area_b - intersection;

  if union > 0.0 { intersection / union } else { 0.0 }
}
