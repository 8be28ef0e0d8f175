pub mod capture_delegate;
pub mod capture_provider;
pub mod clock;
pub mod frame_encoder;
pub mod media_backend;
pub mod upload_transport;
