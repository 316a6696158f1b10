use crate::fragment::{LOG_RANGE, MIN_SCALAR};

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

macro_rules! SHADER { () => {"
@group(0) @binding(0)
var r_color: texture_2d<f32>;
@group(0) @binding(1)
var r_sampler: sampler;

@group(1) @binding(0)
var r_gradient: texture_1d<f32>;
@group(1) @binding(1)
var r_gradient_sampler: sampler;

const LOG_RANGE: f32 = {:?};
const MIN_SCALAR: f32 = {:?};

struct VertexInput {{
    @location(0) position: vec2<f32>,
    @location(1) tex_coords: vec2<f32>,
}}

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) tex_coords: vec2<f32>,
}}

@vertex
fn vs_main(
    model: VertexInput,
) -> VertexOutput {{
    var out: VertexOutput;
    out.tex_coords = model.tex_coords;
    out.clip_position = vec4<f32>(model.position, 0.0, 1.0);
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let tex = textureSample(r_color, r_sampler, in.tex_coords);
    // comparison is false for NaN, so non-positive and NaN both take MIN_SCALAR
    let v = select(MIN_SCALAR, tex.x, tex.x > MIN_SCALAR);
    let coord = log2(v) / LOG_RANGE;
    return textureSample(r_gradient, r_gradient_sampler, coord);
}}
"};}

/// WGSL for both stages, with the numeric constants shared with
/// [`crate::fragment::fragment_stage`].
pub fn get_shader() -> String {
    format!(SHADER!(), LOG_RANGE, MIN_SCALAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_inlined_as_float_literals() {
        let source = get_shader();
        assert!(source.contains("const LOG_RANGE: f32 = 100.0;"));
        assert!(source.contains("const MIN_SCALAR: f32 = 1.1754944e-38;"));
    }

    #[test]
    fn declares_both_entry_points() {
        let source = get_shader();
        assert!(source.contains(&format!("fn {VERTEX_ENTRY}(")));
        assert!(source.contains(&format!("fn {FRAGMENT_ENTRY}(")));
    }
}
