//! Monte Carlo risk view: random regions and jittered competitor prices at a fixed discount.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::PredictionClient;
use super::{DashboardError, ProductSelection};
use crate::catalog::default_competitor_price;
use crate::prediction::PriceAlert;

pub const DEFAULT_DISCOUNT_PCT: f64 = 15.0;
pub const DEFAULT_TRIALS: usize = 150;
pub const DEFAULT_VOLATILITY_PCT: f64 = 10.0;
pub const HISTOGRAM_BINS: usize = 20;
/// Sampled competitor prices are clamped to at least this value.
pub const MIN_COMPETITOR_PRICE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSettings {
    pub discount_pct: f64,
    pub trials: usize,
    /// Standard deviation of the competitor price, as a percentage of the baseline.
    pub volatility_pct: f64,
    /// Fixed seed for reproducible runs; entropy-seeded when absent.
    pub seed: Option<u64>,
}

impl Default for MonteCarloSettings {
    fn default() -> Self {
        Self {
            discount_pct: DEFAULT_DISCOUNT_PCT,
            trials: DEFAULT_TRIALS,
            volatility_pct: DEFAULT_VOLATILITY_PCT,
            seed: None,
        }
    }
}

impl MonteCarloSettings {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if self.trials == 0 {
            return Err(DashboardError::InvalidSettings(
                "trials must be at least 1".to_string(),
            ));
        }
        if !self.volatility_pct.is_finite() || self.volatility_pct < 0.0 {
            return Err(DashboardError::InvalidSettings(format!(
                "volatility must be a non-negative percentage (got {})",
                self.volatility_pct
            )));
        }
        if !self.discount_pct.is_finite() || !(0.0..=100.0).contains(&self.discount_pct) {
            return Err(DashboardError::InvalidSettings(format!(
                "discount must be within [0, 100] (got {})",
                self.discount_pct
            )));
        }
        Ok(())
    }

    fn rng(&self) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSample {
    pub sim_id: usize,
    pub region: String,
    pub competitor_price: f64,
    pub predicted_profit: f64,
    pub predicted_units_sold: f64,
    pub our_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_alert: Option<PriceAlert>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionProfit {
    pub region: String,
    pub mean_profit: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlertCount {
    pub alert: PriceAlert,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub trials: usize,
    pub mean_profit: f64,
    pub mean_units_sold: f64,
    pub max_profit: f64,
    pub min_profit: f64,
    /// Share of trials with negative profit.
    pub loss_probability: f64,
    pub histogram: Vec<HistogramBin>,
    /// Sorted by mean profit, highest first.
    pub region_profit: Vec<RegionProfit>,
    pub alert_counts: Vec<AlertCount>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationRun {
    pub generated_at: DateTime<Utc>,
    pub selection: ProductSelection,
    pub settings: MonteCarloSettings,
    pub competitor_baseline: f64,
    pub samples: Vec<SimulationSample>,
    pub summary: SimulationSummary,
}

/// Equal-width bins spanning `[min, max]`; the last bin is closed on the right.
/// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut counts = vec![0usize; bins];
    for value in values {
        let index = (((value - min) / width) as usize).min(bins - 1);
        counts[index] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(index, count)| HistogramBin {
            lower: min + width * index as f64,
            upper: if index + 1 == bins {
                max
            } else {
                min + width * (index + 1) as f64
            },
            count,
        })
        .collect()
}

pub fn summarize(samples: &[SimulationSample]) -> Option<SimulationSummary> {
    if samples.is_empty() {
        return None;
    }

    let trials = samples.len();
    let profits: Vec<f64> = samples.iter().map(|s| s.predicted_profit).collect();
    let mean_profit = profits.iter().sum::<f64>() / trials as f64;
    let mean_units_sold =
        samples.iter().map(|s| s.predicted_units_sold).sum::<f64>() / trials as f64;
    let max_profit = profits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min_profit = profits.iter().copied().fold(f64::INFINITY, f64::min);
    let losses = profits.iter().filter(|profit| **profit < 0.0).count();

    let mut by_region: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for sample in samples {
        let entry = by_region.entry(sample.region.as_str()).or_default();
        entry.0 += sample.predicted_profit;
        entry.1 += 1;
    }
    let mut region_profit: Vec<RegionProfit> = by_region
        .into_iter()
        .map(|(region, (total, count))| RegionProfit {
            region: region.to_string(),
            mean_profit: total / count as f64,
            samples: count,
        })
        .collect();
    region_profit.sort_by(|a, b| b.mean_profit.total_cmp(&a.mean_profit));

    let alert_counts = [
        PriceAlert::Expensive,
        PriceAlert::Competitive,
        PriceAlert::Equal,
    ]
    .into_iter()
    .filter_map(|alert| {
        let count = samples
            .iter()
            .filter(|sample| sample.price_alert == Some(alert))
            .count();
        (count > 0).then_some(AlertCount { alert, count })
    })
    .collect();

    Some(SimulationSummary {
        trials,
        mean_profit,
        mean_units_sold,
        max_profit,
        min_profit,
        loss_probability: losses as f64 / trials as f64,
        histogram: histogram(&profits, HISTOGRAM_BINS),
        region_profit,
        alert_counts,
    })
}

/// Runs `settings.trials` sequential predictions. The competitor baseline is the
/// selection's price, or 98% of our discounted price when none was given.
pub async fn run_simulation<C>(
    client: &C,
    selection: ProductSelection,
    regions: &[String],
    settings: MonteCarloSettings,
) -> Result<SimulationRun, DashboardError>
where
    C: PredictionClient + ?Sized,
{
    settings.validate()?;
    if regions.is_empty() {
        return Err(DashboardError::NoRegions);
    }

    let competitor_baseline = selection.competitor_price.unwrap_or_else(|| {
        default_competitor_price(selection.product.base_price, settings.discount_pct)
    });
    let spread = Normal::new(
        competitor_baseline,
        competitor_baseline * settings.volatility_pct / 100.0,
    )
    .map_err(|err| DashboardError::InvalidSettings(err.to_string()))?;

    let mut rng = settings.rng();
    let mut samples = Vec::with_capacity(settings.trials);
    for sim_id in 1..=settings.trials {
        let region = regions.choose(&mut rng).ok_or(DashboardError::NoRegions)?;
        let competitor_price = sample_competitor_price(&spread, &mut rng);
        let response = client
            .predict(&selection.request_with_competitor(
                region,
                settings.discount_pct,
                Some(competitor_price),
            ))
            .await?;
        debug!(sim_id, region = %region, competitor_price, "simulation trial");
        samples.push(SimulationSample {
            sim_id,
            region: region.clone(),
            competitor_price,
            predicted_profit: response.predicted_profit,
            predicted_units_sold: response.predicted_units_sold,
            our_price: response.our_price,
            price_alert: response.price_alert,
        });
    }

    let summary = summarize(&samples).ok_or_else(|| {
        DashboardError::InvalidSettings("simulation produced no samples".to_string())
    })?;

    info!(
        product = %selection.product.name,
        trials = summary.trials,
        mean_profit = summary.mean_profit,
        loss_probability = summary.loss_probability,
        "monte carlo simulation finished"
    );

    Ok(SimulationRun {
        generated_at: Utc::now(),
        selection,
        settings,
        competitor_baseline,
        samples,
        summary,
    })
}

fn sample_competitor_price<R: Rng + ?Sized>(spread: &Normal<f64>, rng: &mut R) -> f64 {
    spread.sample(rng).max(MIN_COMPETITOR_PRICE)
}
