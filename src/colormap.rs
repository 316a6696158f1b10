use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::texture::Gradient;

/// Built-in ramps, each a 7th degree polynomial fit per channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Colors {
    Turbo,
    Viridis,
    #[default]
    Inferno,
    Magma,
    Plasma,
}

/// Polynomial coefficients, lowest degree first, for red, green and blue.
type Coefficients = [[f32; 8]; 3];

// https://gist.github.com/mikhailov-work/0d177465a8151eb6ede1768d51d476c7
const TURBO: Coefficients = [
    [0.13572138, 4.6153926, -42.66032258, 132.13108234, -152.94239396, 59.28637943, 0., 0.],
    [0.09140261, 2.19418839, 4.84296658, -14.18503333, 4.27729857, 2.829566004, 0., 0.],
    [0.1066733, 12.64194608, -60.58204836, 110.36276771, -89.90310912, 27.34824973, 0., 0.],
];

const VIRIDIS: Coefficients = [
    [0.25664562, 1.1613264, -14.784454, 76.28986, -217.01733, 326.72885, -238.12221, 66.48359],
    [0.0039559007, 1.5036448, -1.2557336, 2.469486, -8.550757, 18.999912, -19.025986, 6.762205],
    [0.32293624, 1.9620758, -7.801855, 24.8746, -65.22319, 110.47881, -100.77647, 36.299873],
];

const INFERNO: Coefficients = [
    [
        -0.00016338378, -0.073518544, 14.817125, -61.378624, 133.81487, -154.57034, 85.55296,
        -17.174284,
    ],
    [0.00032205507, 1.491896, -18.942537, 105.34187, -280.27472, 391.42755, -272.43903, 74.39492],
    [0.015863627, 0.21556938, 38.829773, -265.4191, 773.58936, -1158.4982, 864.58246, -252.67209],
];

const MAGMA: Coefficients = [
    [0.00021596998, -0.5137123, 20.579655, -99.91494, 256.9034, -350.63345, 237.50842, -62.941208],
    [-8.404814e-5, 2.0975368, -27.284979, 155.73149, -429.42642, 616.1145, -438.69254, 122.452614],
    [0.014895931, 0.71660554, 25.154245, -151.14711, 386.30112, -525.287, 370.7574, -105.76203],
];

const PLASMA: Coefficients = [
    [0.05102612, 2.7417765, -10.374987, 47.75827, -122.86391, 167.50691, -115.23589, 31.357975],
    [0.031248435, 0.56726646, -14.215471, 85.1849, -208.33847, 259.38776, -162.15656, 40.515724],
    [0.5295401, 0.6883895, 4.760893, -39.355995, 92.17261, -102.47303, 54.79296, -10.985884],
];

impl Colors {
    pub const ALL: [Colors; 5] = [
        Colors::Turbo,
        Colors::Viridis,
        Colors::Inferno,
        Colors::Magma,
        Colors::Plasma,
    ];

    fn coefficients(&self) -> Coefficients {
        match self {
            Colors::Turbo => TURBO,
            Colors::Viridis => VIRIDIS,
            Colors::Inferno => INFERNO,
            Colors::Magma => MAGMA,
            Colors::Plasma => PLASMA,
        }
    }

    pub fn get_name(&self) -> &'static str {
        match self {
            Colors::Turbo => "Turbo",
            Colors::Viridis => "Viridis",
            Colors::Inferno => "Inferno",
            Colors::Magma => "Magma",
            Colors::Plasma => "Plasma",
        }
    }

    /// The ramp after this one, wrapping around.
    pub fn next(&self) -> Colors {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// RGB at `x` in `[0, 1]`, clamped to the displayable range.
    pub fn compute_color(&self, x: f32) -> [f32; 3] {
        let x = x.clamp(0., 1.);
        self.coefficients().map(|channel| {
            channel
                .iter()
                .rev()
                .fold(0f32, |acc, c| acc * x + c)
                .clamp(0., 1.)
        })
    }

    /// Bakes the ramp into `resolution` opaque texels, first and last texel
    /// at `x = 0` and `x = 1`.
    pub fn gradient(&self, resolution: usize) -> Result<Gradient> {
        let last = resolution.saturating_sub(1).max(1) as f32;
        Gradient::new(
            (0..resolution)
                .map(|i| {
                    let [r, g, b] = self.compute_color(i as f32 / last);
                    [r, g, b, 1.]
                })
                .collect(),
        )
    }
}
