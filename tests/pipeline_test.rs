// 该文件是 Shanhuo （山火）项目的一部分。
// tests/pipeline_test.rs - 推理流程集成测试
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::RgbImage;

use shanhuo::model::labels::LabelTable;
use shanhuo::model::{
  Backend, ModelError, ModelHandle, RawDetection, RawOutput, SpeedBreakdown,
};
use shanhuo::pipeline::{self, InferenceConfig, PredictError};
use shanhuo::summary;

/// 返回固定检测结果的确定性后端
struct FixedBackend {
  items: Vec<RawDetection>,
  speed: SpeedBreakdown,
}

impl Backend for FixedBackend {
  fn detect(
    &self,
    _image: &RgbImage,
    _conf_threshold: f32,
    _iou_threshold: f32,
  ) -> Result<RawOutput, ModelError> {
    Ok(RawOutput {
      items: self.items.clone(),
      speed: self.speed,
    })
  }
}

fn raw(class_id: usize, score: f32, bbox: [f32; 4]) -> RawDetection {
  RawDetection {
    class_id,
    score,
    bbox,
  }
}

fn fire_handle(items: Vec<RawDetection>, speed: SpeedBreakdown) -> ModelHandle {
  ModelHandle::with_backend(Box::new(FixedBackend { items, speed }), LabelTable::fire())
}

fn stage_speed(preprocess_ms: f64, inference_ms: f64, postprocess_ms: f64) -> SpeedBreakdown {
  SpeedBreakdown {
    preprocess_ms,
    inference_ms,
    postprocess_ms,
  }
}

#[test]
fn single_fire_detection_summary() {
  let handle = fire_handle(
    vec![raw(1, 0.92, [0.2, 0.2, 0.6, 0.6])],
    stage_speed(123.4, 456.7, 19.9),
  );
  let image = RgbImage::new(64, 64);

  let result = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap();

  assert_eq!(result.summary_text, "Predicted 1 fire in 0.6 seconds.");
}

#[test]
fn no_detections_summary_has_no_latency_suffix() {
  let handle = fire_handle(vec![], stage_speed(123.4, 456.7, 19.9));
  let image = RgbImage::new(64, 64);

  let result = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap();

  assert_eq!(result.summary_text, "No objects detected");
}

#[test]
fn tie_summary_preserves_first_seen_order() {
  let handle = fire_handle(
    vec![
      raw(1, 0.9, [0.10, 0.10, 0.20, 0.20]),
      raw(0, 0.8, [0.30, 0.30, 0.40, 0.40]),
      raw(1, 0.7, [0.50, 0.50, 0.60, 0.60]),
      raw(0, 0.6, [0.70, 0.70, 0.80, 0.80]),
      raw(1, 0.5, [0.15, 0.55, 0.25, 0.65]),
      raw(0, 0.4, [0.55, 0.15, 0.65, 0.25]),
    ],
    stage_speed(200.0, 380.0, 20.0),
  );
  let image = RgbImage::new(64, 64);

  let result = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap();

  assert_eq!(
    result.summary_text,
    "Predicted 3 fires, 3 smokes in 0.6 seconds."
  );
}

#[test]
fn annotated_image_matches_input_dimensions() {
  let handle = fire_handle(
    vec![raw(1, 0.9, [0.2, 0.2, 0.6, 0.6])],
    stage_speed(1.0, 2.0, 3.0),
  );
  let image = RgbImage::new(48, 36);

  let result = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap();

  assert_eq!(result.annotated_image.dimensions(), (48, 36));
}

#[test]
fn png_bytes_are_encoded_lazily_with_signature() {
  let handle = fire_handle(
    vec![raw(0, 0.8, [0.1, 0.1, 0.3, 0.3])],
    stage_speed(1.0, 2.0, 3.0),
  );
  let image = RgbImage::new(16, 16);

  let result = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap();
  let bytes = result.to_png_bytes().unwrap();

  assert_eq!(&bytes[0..4], &[0x89, b'P', b'N', b'G']);
}

#[test]
fn orchestrator_is_idempotent_for_deterministic_model() {
  let items = vec![
    raw(1, 0.9, [0.2, 0.2, 0.6, 0.6]),
    raw(0, 0.7, [0.1, 0.1, 0.3, 0.3]),
  ];
  let speed = stage_speed(100.0, 200.0, 50.0);
  let handle = fire_handle(items, speed);
  let image = RgbImage::new(32, 32);
  let config = InferenceConfig::default();

  let first = pipeline::run(&handle, &image, &config).unwrap();
  let second = pipeline::run(&handle, &image, &config).unwrap();

  assert_eq!(first.summary_text, second.summary_text);
  assert_eq!(
    summary::aggregate(&first.detections),
    summary::aggregate(&second.detections)
  );
}

#[test]
fn out_of_range_class_index_fails_the_request() {
  let handle = fire_handle(
    vec![raw(7, 0.9, [0.2, 0.2, 0.6, 0.6])],
    stage_speed(1.0, 2.0, 3.0),
  );
  let image = RgbImage::new(16, 16);

  let err = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap_err();

  assert!(matches!(
    err,
    PredictError::Inference(ModelError::ClassIndexOutOfRange { .. })
  ));
}

#[test]
fn backend_failure_is_reported_as_inference_error() {
  struct FailingBackend;

  impl Backend for FailingBackend {
    fn detect(
      &self,
      _image: &RgbImage,
      _conf_threshold: f32,
      _iou_threshold: f32,
    ) -> Result<RawOutput, ModelError> {
      Err(ModelError::Inference("张量形状不兼容".into()))
    }
  }

  let handle = ModelHandle::with_backend(Box::new(FailingBackend), LabelTable::fire());
  let image = RgbImage::new(16, 16);

  let err = pipeline::run(&handle, &image, &InferenceConfig::default()).unwrap_err();
  assert!(matches!(err, PredictError::Inference(_)));
}

#[cfg(feature = "remote_image")]
mod remote {
  use std::io::{Read, Write};
  use std::net::TcpListener;

  use shanhuo::input::{AcquireError, ImageSource};
  use shanhuo::pipeline::{self, InferenceConfig, PredictError};

  use super::{fire_handle, stage_speed};

  /// 起一个只回一次 404 的本地监听
  fn spawn_404_server() -> (std::thread::JoinHandle<()>, std::net::SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = std::thread::spawn(move || {
      let (mut stream, _) = listener.accept().unwrap();
      let mut buf = [0u8; 2048];
      let _ = stream.read(&mut buf);
      let _ = stream.write_all(
        b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
      );
    });

    (handle, addr)
  }

  #[test]
  fn http_404_is_an_acquisition_error() {
    let (server, addr) = spawn_404_server();

    let source = ImageSource::parse(&format!("http://{}/missing.png", addr)).unwrap();
    let err = source.acquire().unwrap_err();

    assert!(matches!(err, AcquireError::Http(_)));
    server.join().unwrap();
  }

  #[test]
  fn failed_fetch_never_reaches_the_model() {
    let (server, addr) = spawn_404_server();

    let handle = fire_handle(vec![], stage_speed(1.0, 2.0, 3.0));
    let source = ImageSource::parse(&format!("http://{}/missing.png", addr)).unwrap();

    let err =
      pipeline::run_request(&handle, &source, &InferenceConfig::default()).unwrap_err();

    assert!(matches!(err, PredictError::ImageAcquisition(_)));
    server.join().unwrap();
  }
}
