//! European option pricing with the Black-Scholes closed form, in `f32`.

use serde::{Deserialize, Serialize};

use crate::errors::HarnessResult;
use crate::kernel::{Dataset, Kernel, KernelArgs, ParallelKernel};
use crate::registry::KernelRegistry;

const INV_SQRT_2PI: f32 = 0.398_942_3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    Call,
    Put,
}

/// Parameters of one option contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionParams {
    pub spot: f32,
    pub strike: f32,
    pub rate: f32,
    pub volatility: f32,
    /// Time to expiry in years.
    pub time: f32,
    pub kind: OptionKind,
}

/// Cumulative standard normal distribution, Abramowitz-Stegun polynomial
/// approximation.
pub fn cndf(x: f32) -> f32 {
    let negative = x < 0.0;
    let x = x.abs();

    let n_prime = (-0.5 * x * x).exp() * INV_SQRT_2PI;
    let k = 1.0 / (1.0 + 0.231_641_9 * x);
    let poly = k
        * (0.319_381_53
            + k * (-0.356_563_78 + k * (1.781_477_9 + k * (-1.821_256 + k * 1.330_274_4))));
    let value = 1.0 - n_prime * poly;

    if negative { 1.0 - value } else { value }
}

/// Price of one option.
pub fn price(option: &OptionParams) -> f32 {
    let sqrt_time = option.time.sqrt();
    let vol_sqrt_time = option.volatility * sqrt_time;
    let d1 = ((option.spot / option.strike).ln()
        + (option.rate + 0.5 * option.volatility * option.volatility) * option.time)
        / vol_sqrt_time;
    let d2 = d1 - vol_sqrt_time;
    let discounted_strike = option.strike * (-option.rate * option.time).exp();

    match option.kind {
        OptionKind::Call => option.spot * cndf(d1) - discounted_strike * cndf(d2),
        OptionKind::Put => discounted_strike * (1.0 - cndf(d2)) - option.spot * (1.0 - cndf(d1)),
    }
}

/// A book of options and their reference prices.
#[derive(Debug, Clone)]
pub struct BlackScholesDataset {
    options: Vec<OptionParams>,
    reference: Vec<f32>,
}

impl BlackScholesDataset {
    /// `len` options with market-like parameters drawn from `seed`.
    pub fn generate(len: usize, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let options = (0..len)
            .map(|_| {
                let spot = 10.0 + 190.0 * rng.f32();
                OptionParams {
                    spot,
                    strike: spot * (0.5 + rng.f32()),
                    rate: 0.01 + 0.09 * rng.f32(),
                    volatility: 0.05 + 0.6 * rng.f32(),
                    time: 0.05 + 1.95 * rng.f32(),
                    kind: if rng.bool() {
                        OptionKind::Call
                    } else {
                        OptionKind::Put
                    },
                }
            })
            .collect();
        Self::from_options(options)
    }

    pub fn from_options(options: Vec<OptionParams>) -> Self {
        let reference = options.iter().map(price).collect();
        Self { options, reference }
    }

    pub fn options(&self) -> &[OptionParams] {
        &self.options
    }
}

impl Dataset for BlackScholesDataset {
    type Output = f32;

    fn len(&self) -> usize {
        self.options.len()
    }

    fn reference(&self) -> &[f32] {
        &self.reference
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarBlackScholes;

impl Kernel<BlackScholesDataset> for ScalarBlackScholes {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn label(&self) -> &'static str {
        "scalar"
    }

    fn run(&self, mut args: KernelArgs<'_, BlackScholesDataset>) -> HarnessResult<()> {
        let options = &args.inputs.options[args.range()];
        for (out, option) in args.output.iter_mut().zip(options) {
            *out = price(option);
        }
        Ok(())
    }
}

/// Registry of every Black-Scholes implementation, in reporting order.
pub fn kernels() -> KernelRegistry<BlackScholesDataset> {
    KernelRegistry::new()
        .with(ScalarBlackScholes)
        .with(ParallelKernel::new(ScalarBlackScholes, "para", "parallelized"))
}
