//! Renders on whatever adapter is available and compares against the CPU
//! mirror of the fragment stage. Skipped when the machine has no adapter.

use logramp::texture::{AddressMode, FilterMode, SamplerSettings};
use logramp::{
    shade_screen, Bindings, Colors, Gradient, Offscreen, RenderError, ScalarField, Settings,
};

const SIZE: u32 = 16;
// Gradient texels are stored as 8-bit, and so is the target.
const TOLERANCE: i32 = 4;

fn settings() -> Settings {
    Settings {
        width: SIZE,
        height: SIZE,
        field_sampler: SamplerSettings::new(AddressMode::ClampToEdge, FilterMode::Nearest),
        gradient_sampler: SamplerSettings::new(AddressMode::ClampToEdge, FilterMode::Linear),
        // magenta, so an undrawn frame never passes for a ramp color
        background: [1., 0., 1., 1.],
        ..Settings::default()
    }
}

/// Spans roughly 2^-3 to 2^99, with a column of zeros.
fn field() -> ScalarField {
    ScalarField::from_fn(SIZE, SIZE, |x, y| {
        if x == 0 {
            0.
        } else {
            ((x + SIZE * y) as f32 * 0.4 - 3.).exp2()
        }
    })
    .unwrap()
}

fn offscreen(settings: &Settings, field: &ScalarField, gradient: &Gradient) -> Option<Offscreen> {
    match pollster::block_on(Offscreen::new(settings, field, gradient)) {
        Ok(offscreen) => Some(offscreen),
        Err(RenderError::NoAdapter | RenderError::RequestDevice(_)) => {
            eprintln!("no usable adapter, skipping");
            None
        }
        Err(e) => panic!("{e}"),
    }
}

fn assert_close(image: &image::RgbaImage, expected: impl Fn(u32, u32) -> [u8; 4]) {
    assert_eq!(image.dimensions(), (SIZE, SIZE));
    for (x, y, pixel) in image.enumerate_pixels() {
        let want = expected(x, y);
        for (got, want) in pixel.0.iter().zip(want) {
            assert!(
                (*got as i32 - want as i32).abs() <= TOLERANCE,
                "pixel ({x}, {y}): got {:?}, expected {want:?}",
                pixel.0
            );
        }
    }
}

#[test]
fn gpu_matches_cpu_mirror() {
    let settings = settings();
    let field = field();
    let gradient = Colors::Viridis.gradient(settings.gradient_resolution).unwrap();
    let Some(offscreen) = offscreen(&settings, &field, &gradient) else {
        return;
    };
    let image = offscreen.render().unwrap();

    let color = field.sampled(offscreen.field_sampler());
    let ramp = gradient.sampled(settings.gradient_sampler);
    let expected = shade_screen(SIZE, SIZE, &Bindings::new(&color, &ramp));
    assert_close(&image, |x, y| {
        expected[(y * SIZE + x) as usize].map(|c| (c.clamp(0., 1.) * 255.).round() as u8)
    });
}

#[test]
fn unit_field_shows_first_texel() {
    let settings = settings();
    let gradient = Gradient::new(vec![[0.2, 0.4, 0.6, 1.0], [1.0, 1.0, 0.0, 1.0]]).unwrap();
    let Some(mut offscreen) = offscreen(&settings, &field(), &gradient) else {
        return;
    };
    let ones = ScalarField::new(SIZE, SIZE, vec![1.; (SIZE * SIZE) as usize]).unwrap();
    offscreen.set_field(&ones).unwrap();
    assert_close(&offscreen.render().unwrap(), |_, _| [51, 102, 153, 255]);
}

#[test]
fn set_gradient_replaces_colors() {
    let settings = settings();
    let gradient = Colors::Magma.gradient(settings.gradient_resolution).unwrap();
    let Some(mut offscreen) = offscreen(&settings, &field(), &gradient) else {
        return;
    };
    let flat = Gradient::new(vec![[0.2, 0.4, 0.6, 1.0]; 4]).unwrap();
    offscreen.set_gradient(&flat).unwrap();
    assert_close(&offscreen.render().unwrap(), |_, _| [51, 102, 153, 255]);
}

#[test]
fn resized_field_is_reuploaded() {
    let settings = settings();
    let gradient = Colors::Plasma.gradient(settings.gradient_resolution).unwrap();
    let Some(mut offscreen) = offscreen(&settings, &field(), &gradient) else {
        return;
    };
    // 2^100 everywhere lands on the last texel, whatever the field size
    let bright = ScalarField::new(4, 2, vec![2f32.powi(100); 8]).unwrap();
    offscreen.set_field(&bright).unwrap();
    let last = gradient.to_rgba8()[gradient.len() - 1];
    assert_close(&offscreen.render().unwrap(), |_, _| last);
}

#[test]
fn oversized_resources_are_rejected() {
    let settings = settings();
    let gradient = Colors::Turbo.gradient(settings.gradient_resolution).unwrap();
    let Some(mut offscreen) = offscreen(&settings, &field(), &gradient) else {
        return;
    };
    let long = Gradient::new(vec![[1., 1., 1., 1.]; 1 << 20]).unwrap();
    assert!(matches!(
        offscreen.set_gradient(&long),
        Err(RenderError::InvalidGradient(_))
    ));
    assert!(matches!(
        pollster::block_on(Offscreen::new(&settings, &field(), &long)),
        Err(RenderError::InvalidGradient(_))
    ));
    let wide = ScalarField::new(1 << 20, 1, vec![1.; 1 << 20]).unwrap();
    assert!(matches!(
        offscreen.set_field(&wide),
        Err(RenderError::InvalidField(_))
    ));

    // the previous resources stay bound
    let image = offscreen.render().unwrap();
    let ramp = gradient.sampled(settings.gradient_sampler);
    let field = field();
    let color = field.sampled(offscreen.field_sampler());
    let expected = shade_screen(SIZE, SIZE, &Bindings::new(&color, &ramp));
    assert_close(&image, |x, y| {
        expected[(y * SIZE + x) as usize].map(|c| (c.clamp(0., 1.) * 255.).round() as u8)
    });
}
