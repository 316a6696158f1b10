use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};
use crate::fragment::{ColorSource, GradientSource};

/// Wrap behaviour for coordinates outside `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    Nearest,
    Linear,
}

impl From<AddressMode> for wgpu::AddressMode {
    fn from(mode: AddressMode) -> Self {
        match mode {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

impl From<FilterMode> for wgpu::FilterMode {
    fn from(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerSettings {
    pub address_mode: AddressMode,
    pub filter: FilterMode,
}

impl SamplerSettings {
    pub const fn new(address_mode: AddressMode, filter: FilterMode) -> Self {
        Self {
            address_mode,
            filter,
        }
    }

    fn descriptor(&self, label: &'static str) -> wgpu::SamplerDescriptor<'static> {
        let address_mode = self.address_mode.into();
        let filter = self.filter.into();
        wgpu::SamplerDescriptor {
            label: Some(label),
            address_mode_u: address_mode,
            address_mode_v: address_mode,
            address_mode_w: address_mode,
            mag_filter: filter,
            min_filter: filter,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        }
    }

    /// Resolves a texel index that may lie outside `0..size`.
    fn address(&self, index: i64, size: usize) -> usize {
        let size = size as i64;
        let index = match self.address_mode {
            AddressMode::ClampToEdge => index.clamp(0, size - 1),
            AddressMode::Repeat => index.rem_euclid(size),
            AddressMode::MirrorRepeat => {
                let period = index.rem_euclid(2 * size);
                if period < size {
                    period
                } else {
                    2 * size - 1 - period
                }
            }
        };
        index as usize
    }

    /// Texels and weights contributing to normalized coordinate `u` on an
    /// axis of `size` texels.
    fn taps(&self, u: f32, size: usize) -> [(usize, f32); 2] {
        // NaN and infinities have no texel; pin them to the low edge so
        // every mode still returns something deterministic.
        let u = if u.is_finite() { u } else if u > 0. { 1. } else { 0. };
        let scaled = u as f64 * size as f64;
        match self.filter {
            FilterMode::Nearest => {
                let index = self.address(scaled.floor() as i64, size);
                [(index, 1.), (index, 0.)]
            }
            FilterMode::Linear => {
                let centred = scaled - 0.5;
                let low = centred.floor();
                let t = (centred - low) as f32;
                [
                    (self.address(low as i64, size), 1. - t),
                    (self.address((low as i64).saturating_add(1), size), t),
                ]
            }
        }
    }
}

fn blend(acc: &mut [f32; 4], texel: [f32; 4], weight: f32) {
    if weight == 0. {
        return;
    }
    for (a, t) in acc.iter_mut().zip(texel) {
        *a += t * weight;
    }
}

/// Scalar values laid out row-major. Row 0 is sampled at `v = 0`, which
/// [`crate::vertex::SCREEN_QUAD`] places at the bottom of the screen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl ScalarField {
    pub fn new(width: u32, height: u32, values: Vec<f32>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidField(format!(
                "dimensions must be non-zero, got {width}x{height}"
            )));
        }
        let expected = width as usize * height as usize;
        if values.len() != expected {
            return Err(RenderError::InvalidField(format!(
                "expected {expected} values for {width}x{height}, got {}",
                values.len()
            )));
        }
        Ok(Self {
            width,
            height,
            values,
        })
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> f32) -> Result<Self> {
        let values = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, values)
    }

    /// Builds a density histogram: each point inside `min..max` adds one to
    /// the cell it falls in. `min` lands in row 0, column 0.
    pub fn accumulate(
        width: u32,
        height: u32,
        min: [f32; 2],
        max: [f32; 2],
        points: impl IntoIterator<Item = [f32; 2]>,
    ) -> Result<Self> {
        let mut field = Self::new(width, height, vec![0.; width as usize * height as usize])?;
        let extent = [max[0] - min[0], max[1] - min[1]];
        if !(extent[0] > 0. && extent[1] > 0.) {
            return Err(RenderError::InvalidField(format!(
                "empty accumulation bounds {min:?}..{max:?}"
            )));
        }
        for [x, y] in points {
            let u = (x - min[0]) / extent[0];
            let v = (y - min[1]) / extent[1];
            if !(0. ..1.).contains(&u) || !(0. ..1.).contains(&v) {
                continue;
            }
            let column = ((u * width as f32) as usize).min(width as usize - 1);
            let row = ((v * height as f32) as usize).min(height as usize - 1);
            let index = row * width as usize + column;
            field.values[index] += 1.;
        }
        Ok(field)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Fails when the field is larger than a 2-D texture may be on a device
    /// with `limits`.
    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<()> {
        let max = limits.max_texture_dimension_2d;
        if self.width > max || self.height > max {
            return Err(RenderError::InvalidField(format!(
                "{}x{} exceeds the device limit of {max} texels per side",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn sampled(&self, sampler: SamplerSettings) -> SampledField<'_> {
        SampledField {
            field: self,
            sampler,
        }
    }
}

/// A color ramp, texel 0 at coordinate 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    texels: Vec<[f32; 4]>,
}

impl Gradient {
    pub fn new(texels: Vec<[f32; 4]>) -> Result<Self> {
        if texels.is_empty() {
            return Err(RenderError::InvalidGradient("no texels".into()));
        }
        Ok(Self { texels })
    }

    /// Piecewise-linear ramp through `(position, color)` stops, resampled
    /// to `resolution` texels spanning the first to the last stop.
    pub fn from_stops(stops: &[(f32, [f32; 4])], resolution: usize) -> Result<Self> {
        if stops.len() < 2 {
            return Err(RenderError::InvalidGradient(
                "at least two stops are required".into(),
            ));
        }
        if resolution == 0 {
            return Err(RenderError::InvalidGradient("resolution must be non-zero".into()));
        }
        if stops.iter().any(|(position, _)| !position.is_finite()) {
            return Err(RenderError::InvalidGradient(
                "stop positions must be finite".into(),
            ));
        }
        let mut stops = stops.to_vec();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        let first = stops[0].0;
        let last = stops[stops.len() - 1].0;
        if last <= first {
            return Err(RenderError::InvalidGradient(
                "stops must span a non-empty range".into(),
            ));
        }

        let texels = (0..resolution)
            .map(|i| {
                let t = if resolution == 1 {
                    0.
                } else {
                    i as f32 / (resolution - 1) as f32
                };
                let position = first + t * (last - first);
                let upper = stops
                    .iter()
                    .position(|(p, _)| *p >= position)
                    .unwrap_or(stops.len() - 1)
                    .max(1);
                let (p0, c0) = stops[upper - 1];
                let (p1, c1) = stops[upper];
                let w = if p1 > p0 { (position - p0) / (p1 - p0) } else { 0. };
                std::array::from_fn(|k| c0[k] + (c1[k] - c0[k]) * w)
            })
            .collect();
        Self::new(texels)
    }

    pub fn len(&self) -> usize {
        self.texels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    pub fn texels(&self) -> &[[f32; 4]] {
        &self.texels
    }

    pub fn to_rgba8(&self) -> Vec<[u8; 4]> {
        self.texels
            .iter()
            .map(|texel| texel.map(|c| (c.clamp(0., 1.) * 255.).round() as u8))
            .collect()
    }

    pub fn check_limits(&self, limits: &wgpu::Limits) -> Result<()> {
        let max = limits.max_texture_dimension_1d as usize;
        if self.texels.len() > max {
            return Err(RenderError::InvalidGradient(format!(
                "{} texels exceed the device limit of {max}",
                self.texels.len()
            )));
        }
        Ok(())
    }

    pub fn sampled(&self, sampler: SamplerSettings) -> SampledGradient<'_> {
        SampledGradient {
            gradient: self,
            sampler,
        }
    }
}

/// A scalar field read through a sampler; texels come back as `(v, 0, 0, 1)`
/// like an `R32Float` texture.
pub struct SampledField<'a> {
    field: &'a ScalarField,
    sampler: SamplerSettings,
}

impl ColorSource for SampledField<'_> {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4] {
        let width = self.field.width as usize;
        let columns = self.sampler.taps(uv[0], width);
        let rows = self.sampler.taps(uv[1], self.field.height as usize);
        let mut out = [0.; 4];
        for (row, wy) in rows {
            for (column, wx) in columns {
                let value = self.field.values[row * width + column];
                blend(&mut out, [value, 0., 0., 1.], wx * wy);
            }
        }
        out
    }
}

pub struct SampledGradient<'a> {
    gradient: &'a Gradient,
    sampler: SamplerSettings,
}

impl GradientSource for SampledGradient<'_> {
    fn sample(&self, coordinate: f32) -> [f32; 4] {
        let mut out = [0.; 4];
        for (index, weight) in self.sampler.taps(coordinate, self.gradient.len()) {
            blend(&mut out, self.gradient.texels[index], weight);
        }
        out
    }
}

/// The scalar field on the GPU: `R32Float`, bound at group 0.
pub struct FieldTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: wgpu::Extent3d,
}

impl FieldTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        field: &ScalarField,
        sampler: SamplerSettings,
    ) -> Result<Self> {
        field.check_limits(&device.limits())?;
        let size = wgpu::Extent3d {
            width: field.width,
            height: field.height,
            depth_or_array_layers: 1,
        };
        log::debug!("creating {}x{} field texture", size.width, size.height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("field_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&sampler.descriptor("field_sampler"));
        let res = Self {
            texture,
            view,
            sampler,
            size,
        };
        res.write(queue, field);
        Ok(res)
    }

    pub fn fits(&self, field: &ScalarField) -> bool {
        self.size.width == field.width && self.size.height == field.height
    }

    /// Uploads new values; `field` must have the texture's dimensions.
    pub fn write(&self, queue: &wgpu::Queue, field: &ScalarField) {
        debug_assert!(self.fits(field));
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&field.values),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * field.width),
                rows_per_image: Some(field.height),
            },
            self.size,
        );
    }
}

/// The gradient on the GPU: 1-D `Rgba8Unorm`, bound at group 1.
pub struct GradientTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl GradientTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        gradient: &Gradient,
        sampler: SamplerSettings,
    ) -> Result<Self> {
        gradient.check_limits(&device.limits())?;
        let size = wgpu::Extent3d {
            width: gradient.len() as u32,
            height: 1,
            depth_or_array_layers: 1,
        };
        log::debug!("creating gradient texture with {} texels", size.width);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gradient_texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D1,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let texels = gradient.to_rgba8();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(&texels),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * size.width),
                rows_per_image: None,
            },
            size,
        );
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("gradient_view"),
            dimension: Some(wgpu::TextureViewDimension::D1),
            ..Default::default()
        });
        let sampler = device.create_sampler(&sampler.descriptor("gradient_sampler"));
        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEAREST_CLAMP: SamplerSettings =
        SamplerSettings::new(AddressMode::ClampToEdge, FilterMode::Nearest);
    const LINEAR_CLAMP: SamplerSettings =
        SamplerSettings::new(AddressMode::ClampToEdge, FilterMode::Linear);

    fn ramp() -> Gradient {
        Gradient::new(vec![
            [0., 0., 0., 1.],
            [1., 0., 0., 1.],
            [0., 1., 0., 1.],
            [0., 0., 1., 1.],
        ])
        .unwrap()
    }

    #[test]
    fn field_rejects_bad_shapes() {
        assert!(matches!(
            ScalarField::new(0, 3, vec![]),
            Err(RenderError::InvalidField(_))
        ));
        assert!(matches!(
            ScalarField::new(2, 2, vec![1.; 3]),
            Err(RenderError::InvalidField(_))
        ));
        assert!(ScalarField::new(2, 2, vec![1.; 4]).is_ok());
    }

    #[test]
    fn from_fn_is_row_major() {
        let field = ScalarField::from_fn(3, 2, |x, y| (10 * y + x) as f32).unwrap();
        assert_eq!(field.values(), &[0., 1., 2., 10., 11., 12.]);
        assert_eq!(field.get(2, 1), Some(12.));
        assert_eq!(field.get(3, 0), None);
    }

    #[test]
    fn accumulate_counts_points_inside_bounds() {
        let points = [[0.1, 0.1], [0.1, 0.1], [0.9, 0.9], [2.0, 0.5], [f32::NAN, 0.5]];
        let field = ScalarField::accumulate(2, 2, [0., 0.], [1., 1.], points).unwrap();
        assert_eq!(field.get(0, 0), Some(2.));
        assert_eq!(field.get(1, 1), Some(1.));
        assert_eq!(field.values().iter().sum::<f32>(), 3.);
    }

    #[test]
    fn nearest_clamp_hits_edges() {
        let gradient = ramp();
        let sampled = gradient.sampled(NEAREST_CLAMP);
        assert_eq!(sampled.sample(0.0), [0., 0., 0., 1.]);
        assert_eq!(sampled.sample(0.3), [1., 0., 0., 1.]);
        assert_eq!(sampled.sample(1.0), [0., 0., 1., 1.]);
        assert_eq!(sampled.sample(-1.26), [0., 0., 0., 1.]);
        assert_eq!(sampled.sample(7.0), [0., 0., 1., 1.]);
        assert_eq!(sampled.sample(f32::NAN), [0., 0., 0., 1.]);
        assert_eq!(sampled.sample(f32::INFINITY), [0., 0., 1., 1.]);
    }

    #[test]
    fn repeat_and_mirror_wrap() {
        let gradient = ramp();
        let repeat =
            gradient.sampled(SamplerSettings::new(AddressMode::Repeat, FilterMode::Nearest));
        assert_eq!(repeat.sample(1.3), repeat.sample(0.3));
        assert_eq!(repeat.sample(-0.2), repeat.sample(0.8));
        let mirror =
            gradient.sampled(SamplerSettings::new(AddressMode::MirrorRepeat, FilterMode::Nearest));
        assert_eq!(mirror.sample(1.1), mirror.sample(0.9));
        assert_eq!(mirror.sample(-0.1), mirror.sample(0.1));
    }

    #[test]
    fn linear_blends_neighbouring_texels() {
        let gradient = ramp();
        let linear = gradient.sampled(LINEAR_CLAMP);
        // texel centres are at (i + 0.5) / 4
        assert_eq!(linear.sample(0.125), [0., 0., 0., 1.]);
        let halfway = linear.sample(0.25);
        assert!((halfway[0] - 0.5).abs() < 1e-6);
        assert!((halfway[3] - 1.).abs() < 1e-6);
        assert_eq!(linear.sample(0.0), [0., 0., 0., 1.]);
        assert_eq!(linear.sample(1.0), [0., 0., 1., 1.]);
    }

    #[test]
    fn field_sampling_reads_red_only() {
        let field = ScalarField::new(2, 1, vec![4., 16.]).unwrap();
        let sampled = field.sampled(NEAREST_CLAMP);
        assert_eq!(sampled.sample([0.2, 0.5]), [4., 0., 0., 1.]);
        assert_eq!(sampled.sample([0.8, 0.5]), [16., 0., 0., 1.]);
        let linear = field.sampled(LINEAR_CLAMP);
        assert_eq!(linear.sample([0.5, 0.5]), [10., 0., 0., 1.]);
    }

    #[test]
    fn far_coordinates_stay_in_range() {
        let field = ScalarField::new(2, 1, vec![4., 16.]).unwrap();
        for address_mode in [
            AddressMode::ClampToEdge,
            AddressMode::Repeat,
            AddressMode::MirrorRepeat,
        ] {
            for filter in [FilterMode::Nearest, FilterMode::Linear] {
                let sampled = field.sampled(SamplerSettings::new(address_mode, filter));
                for uv in [[1e30, 0.5], [-1e30, 0.5], [0.5, 1e30], [f32::MAX, f32::MIN]] {
                    let texel = sampled.sample(uv);
                    assert!((4. ..=16.).contains(&texel[0]), "{address_mode:?} {filter:?} {uv:?}");
                    assert_eq!(texel[3], 1.);
                }
            }
        }
        let clamped = field.sampled(LINEAR_CLAMP);
        assert_eq!(clamped.sample([1e30, 0.5]), [16., 0., 0., 1.]);
        assert_eq!(clamped.sample([-1e30, 0.5]), [4., 0., 0., 1.]);
    }

    #[test]
    fn sizes_are_checked_against_device_limits() {
        let limits = wgpu::Limits::downlevel_defaults();
        let max = limits.max_texture_dimension_2d;
        let tall = ScalarField::new(1, max + 1, vec![1.; max as usize + 1]).unwrap();
        assert!(matches!(
            tall.check_limits(&limits),
            Err(RenderError::InvalidField(_))
        ));
        let edge = ScalarField::new(max, 1, vec![1.; max as usize]).unwrap();
        assert!(edge.check_limits(&limits).is_ok());

        let texels = limits.max_texture_dimension_1d as usize;
        let long = Gradient::new(vec![[0.; 4]; texels + 1]).unwrap();
        assert!(matches!(
            long.check_limits(&limits),
            Err(RenderError::InvalidGradient(_))
        ));
        assert!(Gradient::new(vec![[0.; 4]; texels])
            .unwrap()
            .check_limits(&limits)
            .is_ok());
    }

    #[test]
    fn stops_are_sorted_and_interpolated() {
        let gradient = Gradient::from_stops(
            &[(1.0, [1., 1., 1., 1.]), (0.0, [0., 0., 0., 1.])],
            5,
        )
        .unwrap();
        assert_eq!(gradient.len(), 5);
        assert_eq!(gradient.texels()[0], [0., 0., 0., 1.]);
        assert_eq!(gradient.texels()[2], [0.5, 0.5, 0.5, 1.]);
        assert_eq!(gradient.texels()[4], [1., 1., 1., 1.]);
        assert_eq!(gradient.to_rgba8()[2], [128, 128, 128, 255]);
    }

    #[test]
    fn stops_validation() {
        assert!(Gradient::from_stops(&[(0.0, [0.; 4])], 4).is_err());
        assert!(Gradient::from_stops(&[(0.0, [0.; 4]), (0.0, [1.; 4])], 4).is_err());
        assert!(Gradient::from_stops(&[(0.0, [0.; 4]), (f32::NAN, [1.; 4])], 4).is_err());
        assert!(Gradient::from_stops(&[(0.0, [0.; 4]), (1.0, [1.; 4])], 0).is_err());
        assert!(Gradient::new(vec![]).is_err());
    }
}
