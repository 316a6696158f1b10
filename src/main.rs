use anyhow::Context;
use rand::Rng;

use logramp::{Gradient, ScalarField, Settings};

const FIELD_SIZE: u32 = 512;
const ITERATIONS: usize = 4_000_000;

/// Barnsley fern affine maps `(a, b, c, d, e, f)` and their probabilities.
const FERN: [([f32; 6], f32); 4] = [
    ([0.0, 0.0, 0.0, 0.16, 0.0, 0.0], 0.01),
    ([0.85, 0.04, -0.04, 0.85, 0.0, 1.6], 0.85),
    ([0.2, -0.26, 0.23, 0.22, 0.0, 1.6], 0.07),
    ([-0.15, 0.28, 0.26, 0.24, 0.0, 0.44], 0.07),
];

/// Runs the chaos game and accumulates visited points into a density field.
fn fern_density(rng: &mut impl Rng) -> anyhow::Result<ScalarField> {
    let mut point = [0f32, 0.];
    let points = (0..ITERATIONS).map(|_| {
        let mut pick: f32 = rng.gen();
        let (m, _) = FERN
            .iter()
            .find(|(_, p)| {
                pick -= p;
                pick < 0.
            })
            .unwrap_or(&FERN[1]);
        let [x, y] = point;
        point = [m[0] * x + m[1] * y + m[4], m[2] * x + m[3] * y + m[5]];
        point
    });
    let density = ScalarField::accumulate(FIELD_SIZE, FIELD_SIZE, [-3., -0.5], [3., 10.5], points)?;

    // Spread the densest cell over the full 100 octaves of the ramp:
    // value = (1 + count)^exposure, so empty cells stay at 1.
    let max = density.values().iter().copied().fold(0., f32::max);
    let exposure = 100. / (1. + max).log2().max(1.);
    let values = density
        .values()
        .iter()
        .map(|&count| ((1. + count).log2() * exposure).exp2())
        .collect();
    Ok(ScalarField::new(FIELD_SIZE, FIELD_SIZE, values)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let settings = match std::env::args().nth(1) {
        Some(path) => Settings::load(&path).with_context(|| format!("reading {path}"))?,
        None => Settings::default(),
    };

    let field = fern_density(&mut rand::thread_rng())?;
    let gradient: Gradient = settings.colormap.gradient(settings.gradient_resolution)?;

    match &settings.output {
        Some(output) => {
            let image =
                pollster::block_on(logramp::render_offscreen(&settings, &field, &gradient))?;
            image
                .save(output)
                .with_context(|| format!("writing {}", output.display()))?;
            log::info!("wrote {}", output.display());
        }
        None => logramp::run(settings, field, gradient)?,
    }
    Ok(())
}
