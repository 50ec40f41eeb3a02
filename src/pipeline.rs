// 该文件是 Shanhuo （山火）项目的一部分。
// src/pipeline.rs - 推理编排
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::CatalogError;
use crate::input::{AcquireError, ImageSource};
use crate::model::{Detection, ModelError, ModelHandle, SpeedBreakdown};
use crate::output::{RenderError, render};
use crate::summary;

/// 单次请求的调用配置，每次请求单独提供，不做持久化。
/// 推理固定在 CPU 上执行。
#[derive(Debug, Clone, Copy)]
pub struct InferenceConfig {
  /// 置信度阈值 [0, 1]
  pub confidence_threshold: f32,
  /// IOU 阈值 [0, 1]
  pub iou_threshold: f32,
}

impl Default for InferenceConfig {
  fn default() -> Self {
    Self {
      confidence_threshold: 0.20,
      iou_threshold: 0.50,
    }
  }
}

/// 推理结果：标注图像与摘要文本。
/// 返回后归调用方所有，调用之间不共享任何可变状态。
#[derive(Debug)]
pub struct InferenceResult {
  pub annotated_image: RgbImage,
  pub summary_text: String,
  pub detections: Vec<Detection>,
  pub speed: SpeedBreakdown,
}

impl InferenceResult {
  /// 按需编码下载产物（PNG 字节流）
  pub fn to_png_bytes(&self) -> Result<Vec<u8>, RenderError> {
    render::encode_png(&self.annotated_image)
  }
}

/// 推理流程中的失败，所有阶段错误都在此处换成带原因的类型化错误
#[derive(Error, Debug)]
pub enum PredictError {
  #[error("配置错误: {0}")]
  Configuration(#[from] CatalogError),
  #[error("图片获取失败: {0}")]
  ImageAcquisition(#[from] AcquireError),
  #[error("推理失败: {0}")]
  Inference(#[from] ModelError),
  #[error("渲染失败: {0}")]
  Render(#[from] RenderError),
}

/// 运行完整推理流程：推理 → 聚合 → 渲染 → 摘要
pub fn run(
  model: &ModelHandle,
  image: &RgbImage,
  config: &InferenceConfig,
) -> Result<InferenceResult, PredictError> {
  let prediction = model.infer(image, config.confidence_threshold, config.iou_threshold)?;

  let counts = summary::aggregate(&prediction.detections);
  debug!("聚合得到 {} 个类别", counts.len());

  let annotated_image = render::to_rgb(&prediction.overlay);

  // 延迟只在至少有一个检测时计算
  let summary_text = if counts.is_empty() {
    summary::format_summary(&counts, 0.0)
  } else {
    summary::format_summary(&counts, summary::latency_seconds(&prediction.speed))
  };

  info!("推理完成: {}", summary_text);

  Ok(InferenceResult {
    annotated_image,
    summary_text,
    detections: prediction.detections,
    speed: prediction.speed,
  })
}

/// 从图片来源完成一次完整请求：获取图片后进入推理流程
pub fn run_request(
  model: &ModelHandle,
  source: &ImageSource,
  config: &InferenceConfig,
) -> Result<InferenceResult, PredictError> {
  let image = source.acquire()?;
  run(model, &image, config)
}
