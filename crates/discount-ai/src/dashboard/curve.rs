use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use super::client::PredictionClient;
use super::{DashboardError, ProductSelection};
use crate::prediction::PriceAlert;

/// Discounts swept by the curve and recommendation dashboards: 0, 5, ..., 50.
pub fn standard_discount_range() -> Vec<f64> {
    (0..=50).step_by(5).map(f64::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionPrediction {
    pub region: String,
    pub predicted_profit: f64,
    pub predicted_units_sold: f64,
    pub our_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_alert: Option<PriceAlert>,
}

/// Mean of a metric pair across regions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegionAverage {
    pub predicted_profit: f64,
    pub predicted_units_sold: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub discount_pct: f64,
    pub predicted_profit: f64,
    pub predicted_units_sold: f64,
}

/// Region-averaged predictions ordered by discount.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiscountCurve {
    points: Vec<CurvePoint>,
}

impl DiscountCurve {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First point holding the highest averaged profit.
    pub fn best_by_profit(&self) -> Option<&CurvePoint> {
        self.points.iter().fold(None, |best, point| match best {
            Some(current) if current.predicted_profit >= point.predicted_profit => Some(current),
            _ => Some(point),
        })
    }
}

/// One prediction per region at a fixed discount.
pub async fn region_breakdown<C>(
    client: &C,
    selection: &ProductSelection,
    regions: &[String],
    discount_pct: f64,
) -> Result<Vec<RegionPrediction>, DashboardError>
where
    C: PredictionClient + ?Sized,
{
    if regions.is_empty() {
        return Err(DashboardError::NoRegions);
    }

    let mut breakdown = Vec::with_capacity(regions.len());
    for region in regions {
        let response = client
            .predict(&selection.request(region, discount_pct))
            .await?;
        breakdown.push(RegionPrediction {
            region: region.clone(),
            predicted_profit: response.predicted_profit,
            predicted_units_sold: response.predicted_units_sold,
            our_price: response.our_price,
            price_alert: response.price_alert,
        });
    }
    Ok(breakdown)
}

pub fn region_average(breakdown: &[RegionPrediction]) -> Option<RegionAverage> {
    if breakdown.is_empty() {
        return None;
    }
    let count = breakdown.len() as f64;
    let profit: f64 = breakdown.iter().map(|row| row.predicted_profit).sum();
    let units: f64 = breakdown.iter().map(|row| row.predicted_units_sold).sum();
    Some(RegionAverage {
        predicted_profit: profit / count,
        predicted_units_sold: units / count,
    })
}

/// Averages the per-region predictions at every discount, in the order given.
pub async fn discount_curve<C>(
    client: &C,
    selection: &ProductSelection,
    regions: &[String],
    discounts: &[f64],
) -> Result<DiscountCurve, DashboardError>
where
    C: PredictionClient + ?Sized,
{
    if discounts.is_empty() {
        return Err(DashboardError::NoDiscounts);
    }

    let mut points = Vec::with_capacity(discounts.len());
    for &discount_pct in discounts {
        let breakdown = region_breakdown(client, selection, regions, discount_pct).await?;
        let average = region_average(&breakdown).ok_or(DashboardError::NoRegions)?;
        points.push(CurvePoint {
            discount_pct,
            predicted_profit: average.predicted_profit,
            predicted_units_sold: average.predicted_units_sold,
        });
    }
    Ok(DiscountCurve::new(points))
}

/// Output of the curve explorer: snapshot at one discount plus the full sweep.
#[derive(Debug, Clone, Serialize)]
pub struct CurveDashboard {
    pub generated_at: DateTime<Utc>,
    pub selection: ProductSelection,
    pub discount_pct: f64,
    pub average: RegionAverage,
    pub regions: Vec<RegionPrediction>,
    pub curve: DiscountCurve,
    pub best_discount: Option<CurvePoint>,
}

pub async fn run_curve_dashboard<C>(
    client: &C,
    selection: ProductSelection,
    regions: &[String],
    discount_pct: f64,
) -> Result<CurveDashboard, DashboardError>
where
    C: PredictionClient + ?Sized,
{
    let breakdown = region_breakdown(client, &selection, regions, discount_pct).await?;
    let average = region_average(&breakdown).ok_or(DashboardError::NoRegions)?;
    let curve = discount_curve(client, &selection, regions, &standard_discount_range()).await?;
    let best_discount = curve.best_by_profit().copied();

    info!(
        product = %selection.product.name,
        discount_pct,
        best_discount = best_discount.map(|point| point.discount_pct),
        "curve dashboard computed"
    );

    Ok(CurveDashboard {
        generated_at: Utc::now(),
        selection,
        discount_pct,
        average,
        regions: breakdown,
        curve,
        best_discount,
    })
}
