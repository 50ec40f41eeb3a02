// 该文件是 Shanhuo （山火）项目的一部分。
// src/summary.rs - 检测结果聚合与摘要文本
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

use crate::model::{Detection, SpeedBreakdown};

/// 单个类别的检测计数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCount {
  pub class_name: String,
  pub count: usize,
}

/// 聚合检测结果：按类别计数，计数降序排列。
/// 计数相同的类别保持在输入中首次出现的顺序，不按字母序。
pub fn aggregate(detections: &[Detection]) -> Vec<ClassCount> {
  let mut counts: Vec<ClassCount> = Vec::new();

  for detection in detections {
    match counts
      .iter_mut()
      .find(|entry| entry.class_name == detection.class_name)
    {
      Some(entry) => entry.count += 1,
      None => counts.push(ClassCount {
        class_name: detection.class_name.clone(),
        count: 1,
      }),
    }
  }

  // 稳定排序：相同计数保持首次出现顺序
  counts.sort_by(|a, b| b.count.cmp(&a.count));
  counts
}

/// 由各阶段耗时计算展示用延迟：毫秒求和、换算为秒、保留两位小数
pub fn latency_seconds(speed: &SpeedBreakdown) -> f64 {
  (speed.total_ms() / 1000.0 * 100.0).round() / 100.0
}

/// 生成摘要句子。
/// 无检测时固定返回 "No objects detected"，不带延迟后缀；
/// 其余情形逐类别生成短语后用分隔符连接，避免事后裁剪尾部分隔符。
pub fn format_summary(counts: &[ClassCount], latency_seconds: f64) -> String {
  if counts.is_empty() {
    return "No objects detected".to_string();
  }

  let phrases: Vec<String> = counts
    .iter()
    .map(|entry| {
      let plural = if entry.count > 1 { "s" } else { "" };
      format!("{} {}{}", entry.count, entry.class_name, plural)
    })
    .collect();

  format!(
    "Predicted {} in {} seconds.",
    phrases.join(", "),
    latency_seconds
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  fn detection(class_id: usize, class_name: &str) -> Detection {
    Detection {
      class_id,
      class_name: class_name.to_string(),
      confidence: 0.9,
      bbox: [0.1, 0.1, 0.5, 0.5],
    }
  }

  #[test]
  fn empty_input_aggregates_to_empty_output() {
    assert!(aggregate(&[]).is_empty());
  }

  #[test]
  fn aggregate_sorts_by_count_descending() {
    let detections = vec![
      detection(0, "smoke"),
      detection(1, "fire"),
      detection(1, "fire"),
      detection(1, "fire"),
      detection(0, "smoke"),
    ];

    let counts = aggregate(&detections);
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].class_name, "fire");
    assert_eq!(counts[0].count, 3);
    assert_eq!(counts[1].class_name, "smoke");
    assert_eq!(counts[1].count, 2);
  }

  #[test]
  fn equal_counts_keep_first_seen_order() {
    let detections = vec![
      detection(1, "fire"),
      detection(0, "smoke"),
      detection(1, "fire"),
      detection(0, "smoke"),
      detection(1, "fire"),
      detection(0, "smoke"),
    ];

    let counts = aggregate(&detections);
    assert_eq!(counts[0].class_name, "fire");
    assert_eq!(counts[1].class_name, "smoke");
  }

  #[test]
  fn no_objects_detected_has_no_latency_suffix() {
    assert_eq!(format_summary(&[], 0.6), "No objects detected");
  }

  #[test]
  fn single_detection_is_not_pluralized() {
    let counts = vec![ClassCount {
      class_name: "fire".to_string(),
      count: 1,
    }];
    assert_eq!(
      format_summary(&counts, 0.05),
      "Predicted 1 fire in 0.05 seconds."
    );
  }

  #[test]
  fn tie_sentence_preserves_first_seen_order() {
    let counts = vec![
      ClassCount {
        class_name: "fire".to_string(),
        count: 3,
      },
      ClassCount {
        class_name: "smoke".to_string(),
        count: 3,
      },
    ];
    assert_eq!(
      format_summary(&counts, 0.6),
      "Predicted 3 fires, 3 smokes in 0.6 seconds."
    );
  }

  #[test]
  fn latency_sums_stages_and_rounds_to_two_decimals() {
    let speed = SpeedBreakdown {
      preprocess_ms: 123.4,
      inference_ms: 456.7,
      postprocess_ms: 19.9,
    };
    let latency = latency_seconds(&speed);
    assert_eq!(latency, 0.6);

    let counts = vec![ClassCount {
      class_name: "fire".to_string(),
      count: 2,
    }];
    assert_eq!(
      format_summary(&counts, latency),
      "Predicted 2 fires in 0.6 seconds."
    );
  }

  #[test]
  fn latency_rounding_keeps_two_decimals() {
    let speed = SpeedBreakdown {
      preprocess_ms: 12.0,
      inference_ms: 30.0,
      postprocess_ms: 3.4,
    };
    assert_eq!(latency_seconds(&speed), 0.05);
  }
}
