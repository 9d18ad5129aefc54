//! Random draw adapter over `rand`/`rand_distr`
//!
//! Every stochastic step in the model draws through these helpers with an
//! explicit generator handle; nothing touches a global RNG. The helpers
//! guard the degenerate parameter ranges the model actually produces
//! (zero rates, empty compartments) so distribution construction cannot
//! fail at runtime, and they keep one natural `(n, p)` argument order.
//!
//! The negative binomial is deliberately a Poisson-Gamma mixture rather
//! than a direct library draw: shipment-size call sites depend on this
//! exact construction being used whatever the underlying library offers.

use rand::Rng;
use rand_distr::{Binomial, Distribution, Gamma, Poisson};

/// Uniform draw in [0, 1)
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.gen()
}

/// Draw from Binomial(n, p)
pub fn binomial<R: Rng + ?Sized>(rng: &mut R, n: u64, p: f64) -> u64 {
    if n == 0 || p <= 0.0 {
        return 0;
    }
    if p >= 1.0 {
        return n;
    }
    Binomial::new(n, p)
        .expect("binomial parameters already range-checked")
        .sample(rng)
}

/// Draw from Poisson(lambda)
pub fn poisson<R: Rng + ?Sized>(rng: &mut R, lambda: f64) -> u64 {
    if lambda <= 0.0 {
        return 0;
    }
    let draw: f64 = Poisson::new(lambda)
        .expect("poisson rate already range-checked")
        .sample(rng);
    draw as u64
}

/// Poisson draw clamped to the whole-animal floor of a real-valued count.
///
/// Compartments are stored as reals but updated in whole animals; the
/// clamp keeps every compartment non-negative.
pub fn poisson_capped<R: Rng + ?Sized>(rng: &mut R, lambda: f64, count: f64) -> f64 {
    poisson(rng, lambda).min(count as u64) as f64
}

/// Draw from Gamma(shape, scale)
pub fn gamma<R: Rng + ?Sized>(rng: &mut R, shape: f64, scale: f64) -> f64 {
    if shape <= 0.0 || scale <= 0.0 {
        return 0.0;
    }
    Gamma::new(shape, scale)
        .expect("gamma parameters already range-checked")
        .sample(rng)
}

/// Draw from NegativeBinomial(k, p) via the Poisson-Gamma mixture:
/// `g ~ Gamma(k, p / (1 - p))`, then `Poisson(g)`.
pub fn neg_binomial<R: Rng + ?Sized>(rng: &mut R, k: f64, p: f64) -> u64 {
    assert!(p < 1.0, "negative binomial requires p < 1, got {}", p);
    if p <= 0.0 {
        return 0;
    }
    let g = gamma(rng, k, p / (1.0 - p));
    poisson(rng, g)
}

/// Poisson PMF: P(X = x) for X ~ Poisson(lambda)
pub fn poisson_pmf(x: usize, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return if x == 0 { 1.0 } else { 0.0 };
    }
    let mut term = (-lambda).exp();
    for k in 1..=x {
        term *= lambda / k as f64;
    }
    term
}

/// Poisson CDF: P(X <= x) for X ~ Poisson(lambda)
pub fn poisson_cdf(x: usize, lambda: f64) -> f64 {
    if lambda <= 0.0 {
        return 1.0;
    }
    let mut term = (-lambda).exp();
    let mut total = term;
    for k in 1..=x {
        term *= lambda / k as f64;
        total += term;
    }
    total.min(1.0)
}

/// Poisson survival: P(X > x) for X ~ Poisson(lambda)
pub fn poisson_sf(x: usize, lambda: f64) -> f64 {
    (1.0 - poisson_cdf(x, lambda)).max(0.0)
}
