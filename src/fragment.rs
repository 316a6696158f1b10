//! CPU mirror of the fragment stage.
//!
//! Textures and samplers come in through [`Bindings`], the same slots the
//! WGSL declares at group 0 and group 1, so tests can swap in mocks.

use crate::vertex::{vertex_stage, VertexOutput, SCREEN_QUAD};

/// Number of octaves spread over the `[0, 1]` gradient domain.
pub const LOG_RANGE: f32 = 100.0;

/// Smallest scalar fed to `log2`. Anything not strictly above it (zero,
/// negatives, subnormals, NaN) is replaced by it, giving the coordinate
/// `-126 / LOG_RANGE`.
pub const MIN_SCALAR: f32 = f32::MIN_POSITIVE;

/// Group 0: the scalar field texture and its sampler.
pub trait ColorSource {
    fn sample(&self, uv: [f32; 2]) -> [f32; 4];
}

/// Group 1: the 1-D gradient texture and its sampler.
pub trait GradientSource {
    fn sample(&self, coordinate: f32) -> [f32; 4];
}

/// Resources bound for one draw.
pub struct Bindings<'a, C: ?Sized, G: ?Sized> {
    pub color: &'a C,
    pub gradient: &'a G,
}

impl<'a, C: ?Sized, G: ?Sized> Bindings<'a, C, G> {
    pub fn new(color: &'a C, gradient: &'a G) -> Self {
        Self { color, gradient }
    }
}

// Not derived: that would require `C: Clone` and `G: Clone`.
impl<C: ?Sized, G: ?Sized> Clone for Bindings<'_, C, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized, G: ?Sized> Copy for Bindings<'_, C, G> {}

/// Maps a scalar to its (unclamped) gradient coordinate.
pub fn gradient_coordinate(value: f32) -> f32 {
    let value = if value > MIN_SCALAR { value } else { MIN_SCALAR };
    value.log2() / LOG_RANGE
}

pub fn fragment_stage<C, G>(bindings: &Bindings<'_, C, G>, input: &VertexOutput) -> [f32; 4]
where
    C: ColorSource + ?Sized,
    G: GradientSource + ?Sized,
{
    let tex = bindings.color.sample(input.texture_coordinate);
    bindings.gradient.sample(gradient_coordinate(tex[0]))
}

/// Shades every pixel centre of a `width` x `height` target covered by
/// [`SCREEN_QUAD`], top row first, the way the GPU pass lays out its
/// color attachment.
pub fn shade_screen<C, G>(width: u32, height: u32, bindings: &Bindings<'_, C, G>) -> Vec<[f32; 4]>
where
    C: ColorSource + ?Sized,
    G: GradientSource + ?Sized,
{
    // Corners of the quad after the vertex stage; the quad is axis aligned so
    // interpolation reduces to a linear map per axis.
    let low = vertex_stage(SCREEN_QUAD[0]);
    let high = vertex_stage(SCREEN_QUAD[2]);
    let lerp = |t: f32, axis: usize| {
        low.texture_coordinate[axis]
            + (high.texture_coordinate[axis] - low.texture_coordinate[axis]) * t
    };

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for row in 0..height {
        // framebuffer row 0 is NDC y = +1
        let ty = 1.0 - (row as f32 + 0.5) / height as f32;
        for column in 0..width {
            let tx = (column as f32 + 0.5) / width as f32;
            let varyings = VertexOutput {
                clip_position: [tx * 2.0 - 1.0, ty * 2.0 - 1.0, 0.0, 1.0],
                texture_coordinate: [lerp(tx, 0), lerp(ty, 1)],
            };
            pixels.push(fragment_stage(bindings, &varyings));
        }
    }
    pixels
}
