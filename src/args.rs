// 该文件是 Shanhuo （山火）项目的一部分。
// src/args.rs - 项目参数配置
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use clap::Parser;

use shanhuo::catalog::ModelCategory;

/// Shanhuo 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型类别（野火检测或通用检测）
  #[arg(long, value_enum, default_value = "fire-detection")]
  pub category: ModelCategory,

  /// 模型目录根路径，其下包含 fire-models/ 与 general-models/
  #[arg(long, value_name = "DIR", default_value = ".")]
  pub models_root: PathBuf,

  /// 模型名称（模型目录内不含扩展名的文件名，缺省取排序后的第一个）
  #[arg(long, value_name = "NAME")]
  pub model: Option<String>,

  /// 输入图片（本地路径或 http(s) URL）
  #[arg(long, value_name = "SOURCE")]
  pub input: String,

  /// 置信度阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.20", value_name = "THRESHOLD")]
  pub confidence: f32,

  /// IOU 阈值 (0.0 - 1.0)
  #[arg(long, default_value = "0.50", value_name = "THRESHOLD")]
  pub iou_threshold: f32,

  /// 输出图片路径
  #[arg(long, value_name = "OUTPUT", default_value = "prediction.png")]
  pub output: PathBuf,

  /// 同时写出 JSON 检测记录
  #[arg(long)]
  pub record: bool,
}
