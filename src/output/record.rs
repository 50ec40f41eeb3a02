// 该文件是 Shanhuo （山火）项目的一部分。
// src/output/record.rs - 检测记录输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use chrono::Utc;
use serde_json::json;
use tracing::info;

use crate::model::{Detection, SpeedBreakdown};

/// 在输出图片旁写出 JSON 检测记录（同名文件，扩展名改为 .json）
pub fn write_record(
  output_path: &Path,
  detections: &[Detection],
  summary_text: &str,
  speed: &SpeedBreakdown,
) -> Result<(), std::io::Error> {
  let rows: Vec<serde_json::Value> = detections
    .iter()
    .map(|detection| {
      json!({
        "class_id": detection.class_id,
        "class_name": detection.class_name,
        "confidence": detection.confidence,
        "bbox": detection.bbox,
      })
    })
    .collect();

  let record = json!({
    "time": Utc::now().to_rfc3339(),
    "summary": summary_text,
    "speed_ms": {
      "preprocess": speed.preprocess_ms,
      "inference": speed.inference_ms,
      "postprocess": speed.postprocess_ms,
    },
    "detections": rows,
  });

  let path = output_path.with_extension("json");
  let body = serde_json::to_string_pretty(&record).map_err(std::io::Error::other)?;
  std::fs::write(&path, body)?;
  info!("检测记录已写入: {}", path.display());

  Ok(())
}
