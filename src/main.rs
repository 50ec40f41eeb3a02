// 该文件是 Shanhuo （山火）项目的一部分。
// src/main.rs - 项目主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shanhuo::cache::ModelCache;
use shanhuo::catalog;
use shanhuo::input::ImageSource;
use shanhuo::output::{record, render};
use shanhuo::pipeline::{self, InferenceConfig};

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = args::Args::parse();

  // 模型目录与工件发现
  let models_dir = args.models_root.join(args.category.models_dir());
  info!("在 {} 中查找模型", models_dir.display());

  let artifacts = catalog::list_artifacts(&models_dir)?;
  println!("找到模型: {}", artifacts.join(", "));

  let model_name = match &args.model {
    Some(name) => name.clone(),
    None => artifacts[0].clone(),
  };
  let model_path = catalog::resolve_artifact(&models_dir, &model_name)?;
  info!("使用模型: {}", model_path.display());

  // 模型加载一次后缓存复用
  let mut cache = ModelCache::new();
  let model = cache.get_or_load(&model_path, args.category.label_table())?;

  // 获取输入图片
  let source = ImageSource::parse(&args.input)?;
  let image = source.acquire()?;
  info!("输入图片: {}x{}", image.width(), image.height());

  let config = InferenceConfig {
    confidence_threshold: args.confidence,
    iou_threshold: args.iou_threshold,
  };

  let result = pipeline::run(&model, &image, &config)?;

  println!("{}", result.summary_text);

  render::save_png(&result.annotated_image, &args.output)
    .with_context(|| format!("无法保存标注图片: {}", args.output.display()))?;
  println!("标注图片已保存: {}", args.output.display());

  if args.record {
    record::write_record(&args.output, &result.detections, &result.summary_text, &result.speed)
      .context("无法写出检测记录")?;
  }

  Ok(())
}
