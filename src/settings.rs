use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::colormap::Colors;
use crate::error::Result;
use crate::texture::{AddressMode, FilterMode, SamplerSettings};

/// Global rendering settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Ramp used when no gradient is supplied, and the starting point when
    /// cycling ramps in the viewer
    pub colormap: Colors,
    /// Number of texels the built-in ramps are baked into
    pub gradient_resolution: usize,
    /// Sampler for the scalar field. `Linear` needs `FLOAT32_FILTERABLE`
    /// and falls back to `Nearest` without it
    pub field_sampler: SamplerSettings,
    pub gradient_sampler: SamplerSettings,
    /// Clear color, visible only where the quad does not cover the target
    pub background: [f64; 4],
    /// Only redraw when the window asks for it
    pub lazy_draw: bool,
    /// Render offscreen to this PNG and exit instead of opening a window
    pub output: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            title: "logramp".into(),
            width: 800,
            height: 800,
            colormap: Colors::default(),
            gradient_resolution: 256,
            field_sampler: SamplerSettings::new(AddressMode::ClampToEdge, FilterMode::Nearest),
            gradient_sampler: SamplerSettings::new(AddressMode::ClampToEdge, FilterMode::Linear),
            background: [0., 0., 0., 1.],
            lazy_draw: true,
            output: None,
        }
    }
}

impl Settings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("loading settings from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub(crate) fn clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.background;
        wgpu::Color { r, g, b, a }
    }
}
