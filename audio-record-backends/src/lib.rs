//! # audio-record-backends
//!
//! Concrete collaborators for audio-record-core.
//!
//! Provides:
//! - `ReqwestTransport`: HTTP client for the sign, PUT and inline upload requests (feature `http`, default)
//! - `CpalMicCapture`: microphone capture with the requested processing stages applied (feature `cpal`)
//! - `LameEncoderFactory`: MP3 bitstream encoding through LAME (feature `lame`)
//!
//! ## Usage
//! ```ignore
//! use std::sync::Arc;
//! use audio_record_backends::{CpalMicCapture, LameEncoderFactory, ReqwestTransport};
//! use audio_record_core::{Recorder, RecorderSettings, SystemClock};
//!
//! let settings = RecorderSettings::from_json_file("recorder.json".as_ref())?;
//! let recorder = Recorder::new(
//!     settings,
//!     CpalMicCapture::default_device(),
//!     media,
//!     ReqwestTransport::new(Some("https://app.example")),
//!     Arc::new(LameEncoderFactory::new()),
//!     Arc::new(SystemClock::new()?),
//! )?;
//! recorder.start_wait();
//! ```

#[cfg(feature = "cpal")]
pub mod cpal_mic;
#[cfg(feature = "http")]
pub mod http_transport;
#[cfg(feature = "lame")]
pub mod lame_encoder;

#[cfg(feature = "cpal")]
pub use cpal_mic::{list_input_devices, CpalMicCapture};
#[cfg(feature = "http")]
pub use http_transport::ReqwestTransport;
#[cfg(feature = "lame")]
pub use lame_encoder::LameEncoderFactory;
