use thiserror::Error;

/// Errors raised while preparing resources or driving the GPU.
///
/// Nothing inside the shading stages can fail; everything here happens
/// before a draw (resource validation, device setup) or after it (readback).
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no usable texture format")]
    UnsupportedSurface,

    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),

    #[error("invalid scalar field: {0}")]
    InvalidField(String),

    #[error("invalid gradient: {0}")]
    InvalidGradient(String),

    #[error("buffer readback failed: {0}")]
    Readback(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),

    #[error("failed to create window: {0}")]
    CreateWindow(#[from] winit::error::OsError),

    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_and_adapter_failures_are_distinct() {
        let surface = RenderError::UnsupportedSurface.to_string();
        assert!(surface.contains("surface"));
        assert_ne!(surface, RenderError::NoAdapter.to_string());
    }
}
