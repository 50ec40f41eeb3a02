// 该文件是 Shanhuo （山火）项目的一部分。
// src/model.rs - 模型句柄与检测类型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use image::RgbImage;
use thiserror::Error;
use tracing::{debug, error};

use self::labels::LabelTable;
use self::visualizer::Visualizer;

pub mod labels;
pub mod visualizer;

#[cfg(feature = "backend-tract")]
pub mod tract_yolo;

/// 单个检测结果
#[derive(Debug, Clone)]
pub struct Detection {
  /// 类别索引
  pub class_id: usize,
  /// 类别名称
  pub class_name: String,
  /// 置信度
  pub confidence: f32,
  /// 归一化边界框 [x_min, y_min, x_max, y_max]
  pub bbox: [f32; 4],
}

/// 推理各阶段耗时（毫秒）
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedBreakdown {
  pub preprocess_ms: f64,
  pub inference_ms: f64,
  pub postprocess_ms: f64,
}

impl SpeedBreakdown {
  /// 各阶段耗时之和（毫秒）
  pub fn total_ms(&self) -> f64 {
    self.preprocess_ms + self.inference_ms + self.postprocess_ms
  }
}

/// 模型绘制的叠加图，像素为 BGR 通道序（HWC 排列）
#[derive(Debug, Clone)]
pub struct Overlay {
  width: u32,
  height: u32,
  data: Box<[u8]>,
}

impl Overlay {
  /// 由 RGB 图像构造叠加图，通道序转为 BGR
  pub fn from_rgb(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let mut data = vec![0u8; (width as usize) * (height as usize) * 3];

    for y in 0..height {
      for x in 0..width {
        let pixel = image.get_pixel(x, y);
        let idx = ((y * width + x) * 3) as usize;
        data[idx] = pixel[2];
        data[idx + 1] = pixel[1];
        data[idx + 2] = pixel[0];
      }
    }

    Self {
      width,
      height,
      data: data.into_boxed_slice(),
    }
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// BGR 字节数据
  pub fn as_bgr(&self) -> &[u8] {
    &self.data
  }
}

/// 后端输出的原始检测条目，类别名称尚未映射
#[derive(Debug, Clone)]
pub struct RawDetection {
  pub class_id: usize,
  pub score: f32,
  pub bbox: [f32; 4],
}

/// 后端一次推理的完整输出
#[derive(Debug, Clone, Default)]
pub struct RawOutput {
  pub items: Vec<RawDetection>,
  pub speed: SpeedBreakdown,
}

#[derive(Error, Debug)]
pub enum ModelError {
  #[error("模型文件不存在: {0}")]
  ArtifactMissing(std::path::PathBuf),
  #[error("模型加载失败: {0}")]
  Load(String),
  #[error("推理失败: {0}")]
  Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("模型输出形状不符: {0:?}")]
  OutputShape(Vec<usize>),
  #[error("类别索引越界: {class_id}（共 {num_classes} 类）")]
  ClassIndexOutOfRange { class_id: usize, num_classes: usize },
  #[error("未启用任何推理后端")]
  NoBackend,
}

/// 推理后端接口，任何检测引擎实现该接口即可接入
pub trait Backend {
  fn detect(
    &self,
    image: &RgbImage,
    conf_threshold: f32,
    iou_threshold: f32,
  ) -> Result<RawOutput, ModelError>;
}

/// 一次推理的结果：检测列表、各阶段耗时与叠加图
#[derive(Debug, Clone)]
pub struct Prediction {
  pub detections: Vec<Detection>,
  pub speed: SpeedBreakdown,
  pub overlay: Overlay,
}

/// 模型句柄：已加载的检测器与加载时固定的类别表
pub struct ModelHandle {
  backend: Box<dyn Backend>,
  labels: LabelTable,
  visualizer: Visualizer,
}

impl std::fmt::Debug for ModelHandle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ModelHandle")
      .field("labels", &self.labels)
      .finish_non_exhaustive()
  }
}

impl ModelHandle {
  /// 从模型文件加载，类别表在加载时固定
  #[cfg(feature = "backend-tract")]
  pub fn load(path: &Path, labels: LabelTable) -> Result<Self, ModelError> {
    if !path.is_file() {
      return Err(ModelError::ArtifactMissing(path.to_path_buf()));
    }

    let backend = tract_yolo::TractYolo::load(path, labels.len())?;
    Ok(Self::with_backend(Box::new(backend), labels))
  }

  #[cfg(not(feature = "backend-tract"))]
  pub fn load(path: &Path, _labels: LabelTable) -> Result<Self, ModelError> {
    if !path.is_file() {
      return Err(ModelError::ArtifactMissing(path.to_path_buf()));
    }

    Err(ModelError::NoBackend)
  }

  /// 用自定义后端构造模型句柄
  pub fn with_backend(backend: Box<dyn Backend>, labels: LabelTable) -> Self {
    Self {
      backend,
      labels,
      visualizer: Visualizer::new(),
    }
  }

  /// 按索引查询类别名称，越界视为模型工件损坏
  pub fn class_name(&self, class_id: usize) -> Result<&str, ModelError> {
    self.labels.name(class_id).ok_or_else(|| {
      error!(
        "类别索引 {} 超出类别表范围（共 {} 类），模型工件可能已损坏",
        class_id,
        self.labels.len()
      );
      ModelError::ClassIndexOutOfRange {
        class_id,
        num_classes: self.labels.len(),
      }
    })
  }

  /// 运行推理，阈值超出 [0, 1] 时收敛到边界值
  pub fn infer(
    &self,
    image: &RgbImage,
    conf_threshold: f32,
    iou_threshold: f32,
  ) -> Result<Prediction, ModelError> {
    let conf = conf_threshold.clamp(0.0, 1.0);
    let iou = iou_threshold.clamp(0.0, 1.0);

    let raw = self.backend.detect(image, conf, iou)?;
    debug!("后端返回 {} 个检测", raw.items.len());

    let mut detections = Vec::with_capacity(raw.items.len());
    for item in &raw.items {
      let class_name = self.class_name(item.class_id)?.to_string();
      detections.push(Detection {
        class_id: item.class_id,
        class_name,
        confidence: item.score,
        bbox: item.bbox,
      });
    }

    let overlay = self.visualizer.plot(image, &detections);

    Ok(Prediction {
      detections,
      speed: raw.speed,
      overlay,
    })
  }
}
