use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::client::PredictionClient;
use super::curve::{
    discount_curve, region_breakdown, standard_discount_range, CurvePoint, DiscountCurve,
    RegionPrediction,
};
use super::{DashboardError, ProductSelection};
use crate::catalog::default_competitor_price;
use crate::prediction::PredictionResponse;

/// Keeps min-max normalization finite when every value is equal.
pub const NORMALIZATION_EPSILON: f64 = 1e-9;
pub const DEFAULT_BALANCE_WEIGHT: f64 = 0.6;
/// Region queried once for the price-competitiveness insight on the recommended discount.
pub const PRICING_INSIGHT_REGION: &str = "South";
/// Discount used to pre-fill a missing competitor price.
pub const PREVIEW_DISCOUNT_PCT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    MaxProfit,
    MaxSales,
    Balanced,
}

impl Objective {
    pub fn label(&self) -> &'static str {
        match self {
            Objective::MaxProfit => "Max Profit",
            Objective::MaxSales => "Max Sales",
            Objective::Balanced => "Balanced",
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized: String = raw
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match normalized.as_str() {
            "maxprofit" | "profit" => Ok(Self::MaxProfit),
            "maxsales" | "sales" | "units" => Ok(Self::MaxSales),
            "balanced" => Ok(Self::Balanced),
            _ => Err(format!(
                "unknown objective '{raw}' (expected max-profit, max-sales or balanced)"
            )),
        }
    }
}

/// Business rules a discount must satisfy to be recommended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BusinessConstraints {
    pub max_discount_allowed: f64,
    pub min_profit_required: f64,
    pub min_units_required: f64,
}

impl Default for BusinessConstraints {
    fn default() -> Self {
        Self {
            max_discount_allowed: 30.0,
            min_profit_required: 0.0,
            min_units_required: 1.0,
        }
    }
}

impl BusinessConstraints {
    pub fn admits(&self, point: &CurvePoint) -> bool {
        point.discount_pct <= self.max_discount_allowed
            && point.predicted_profit >= self.min_profit_required
            && point.predicted_units_sold >= self.min_units_required
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSettings {
    pub objective: Objective,
    /// Profit weight for the balanced objective; units get the remainder.
    pub balance_weight: f64,
    pub constraints: BusinessConstraints,
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        Self {
            objective: Objective::MaxProfit,
            balance_weight: DEFAULT_BALANCE_WEIGHT,
            constraints: BusinessConstraints::default(),
        }
    }
}

impl RecommendationSettings {
    pub fn validate(&self) -> Result<(), DashboardError> {
        if !self.balance_weight.is_finite() || !(0.0..=1.0).contains(&self.balance_weight) {
            return Err(DashboardError::InvalidSettings(format!(
                "balance weight must be within [0, 1] (got {})",
                self.balance_weight
            )));
        }
        Ok(())
    }
}

/// Curve point annotated with normalized metrics, feasibility, and objective score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredRow {
    pub discount_pct: f64,
    pub predicted_profit: f64,
    pub predicted_units_sold: f64,
    pub profit_norm: f64,
    pub units_norm: f64,
    pub feasible: bool,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Recommendation {
    Discount(ScoredRow),
    NoFeasibleDiscount,
}

impl Recommendation {
    pub fn row(&self) -> Option<&ScoredRow> {
        match self {
            Recommendation::Discount(row) => Some(row),
            Recommendation::NoFeasibleDiscount => None,
        }
    }
}

/// `(v - min) / (max - min + ε)` over the whole column.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|value| (value - min) / (max - min + NORMALIZATION_EPSILON))
        .collect()
}

pub fn score_curve(
    curve: &DiscountCurve,
    settings: &RecommendationSettings,
) -> Result<Vec<ScoredRow>, DashboardError> {
    settings.validate()?;

    let points = curve.points();
    let profits: Vec<f64> = points.iter().map(|point| point.predicted_profit).collect();
    let units: Vec<f64> = points.iter().map(|point| point.predicted_units_sold).collect();
    let profit_norms = normalize(&profits);
    let units_norms = normalize(&units);

    let rows = points
        .iter()
        .zip(profit_norms)
        .zip(units_norms)
        .map(|((point, profit_norm), units_norm)| {
            let score = match settings.objective {
                Objective::MaxProfit => point.predicted_profit,
                Objective::MaxSales => point.predicted_units_sold,
                Objective::Balanced => {
                    settings.balance_weight * profit_norm
                        + (1.0 - settings.balance_weight) * units_norm
                }
            };
            ScoredRow {
                discount_pct: point.discount_pct,
                predicted_profit: point.predicted_profit,
                predicted_units_sold: point.predicted_units_sold,
                profit_norm,
                units_norm,
                feasible: settings.constraints.admits(point),
                score,
            }
        })
        .collect();

    Ok(rows)
}

/// Highest-scoring feasible row; on ties the earliest row in curve order wins.
pub fn recommend(rows: &[ScoredRow]) -> Recommendation {
    rows.iter()
        .filter(|row| row.feasible)
        .fold(None, |best: Option<&ScoredRow>, row| match best {
            Some(current) if current.score >= row.score => Some(current),
            _ => Some(row),
        })
        .map_or(Recommendation::NoFeasibleDiscount, |row| {
            Recommendation::Discount(*row)
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationDashboard {
    pub generated_at: DateTime<Utc>,
    pub selection: ProductSelection,
    pub settings: RecommendationSettings,
    pub rows: Vec<ScoredRow>,
    pub feasible_count: usize,
    pub recommendation: Recommendation,
    /// Pricing insight for the recommended discount in a representative region.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight: Option<PredictionResponse>,
    pub region_discount_pct: f64,
    pub regions: Vec<RegionPrediction>,
}

/// Every request carries a competitor price; a missing one is pre-filled from the
/// preview discount.
pub async fn run_recommendation_dashboard<C>(
    client: &C,
    mut selection: ProductSelection,
    regions: &[String],
    settings: RecommendationSettings,
) -> Result<RecommendationDashboard, DashboardError>
where
    C: PredictionClient + ?Sized,
{
    settings.validate()?;
    if selection.competitor_price.is_none() {
        selection.competitor_price = Some(default_competitor_price(
            selection.product.base_price,
            PREVIEW_DISCOUNT_PCT,
        ));
    }

    let curve = discount_curve(client, &selection, regions, &standard_discount_range()).await?;
    let rows = score_curve(&curve, &settings)?;
    let feasible_count = rows.iter().filter(|row| row.feasible).count();
    let recommendation = recommend(&rows);

    let insight = match recommendation.row() {
        Some(row) => {
            let region = regions
                .iter()
                .find(|region| region.as_str() == PRICING_INSIGHT_REGION)
                .or_else(|| regions.first())
                .ok_or(DashboardError::NoRegions)?;
            Some(client.predict(&selection.request(region, row.discount_pct)).await?)
        }
        None => {
            warn!(
                product = %selection.product.name,
                "no feasible discount under the configured constraints"
            );
            None
        }
    };

    let region_discount_pct = recommendation
        .row()
        .map(|row| row.discount_pct)
        .or_else(|| rows.first().map(|row| row.discount_pct))
        .ok_or(DashboardError::NoDiscounts)?;
    let region_rows = region_breakdown(client, &selection, regions, region_discount_pct).await?;

    info!(
        product = %selection.product.name,
        objective = %settings.objective,
        feasible = feasible_count,
        recommended = recommendation.row().map(|row| row.discount_pct),
        "recommendation dashboard computed"
    );

    Ok(RecommendationDashboard {
        generated_at: Utc::now(),
        selection,
        settings,
        rows,
        feasible_count,
        recommendation,
        insight,
        region_discount_pct,
        regions: region_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::testing::{laptop_selection, regions, ScriptedClient};
    use crate::prediction::PriceAlert;

    fn point(discount_pct: f64, profit: f64, units: f64) -> CurvePoint {
        CurvePoint {
            discount_pct,
            predicted_profit: profit,
            predicted_units_sold: units,
        }
    }

    fn sample_curve() -> DiscountCurve {
        DiscountCurve::new(vec![
            point(0.0, 100.0, 10.0),
            point(10.0, 200.0, 30.0),
            point(20.0, 300.0, 20.0),
        ])
    }

    fn settings(objective: Objective, balance_weight: f64) -> RecommendationSettings {
        RecommendationSettings {
            objective,
            balance_weight,
            constraints: BusinessConstraints {
                max_discount_allowed: 50.0,
                min_profit_required: f64::NEG_INFINITY,
                min_units_required: 0.0,
            },
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-6,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn normalization_maps_extremes_to_unit_interval() {
        let norms = normalize(&[100.0, 200.0, 300.0]);
        assert_close(norms[0], 0.0);
        assert_close(norms[1], 0.5);
        assert_close(norms[2], 1.0);
    }

    #[test]
    fn constant_column_normalizes_to_zero() {
        let norms = normalize(&[7.0, 7.0, 7.0]);
        assert!(norms.iter().all(|value| *value == 0.0));
    }

    #[test]
    fn balanced_score_is_convex_combination() {
        let curve = sample_curve();
        let profit_only = score_curve(&curve, &settings(Objective::Balanced, 1.0)).expect("scores");
        let units_only = score_curve(&curve, &settings(Objective::Balanced, 0.0)).expect("scores");

        for (profit_row, units_row) in profit_only.iter().zip(&units_only) {
            assert_eq!(profit_row.score, profit_row.profit_norm);
            assert_eq!(units_row.score, units_row.units_norm);
        }
    }

    #[test]
    fn objectives_pick_different_discounts() {
        let curve = sample_curve();
        let by_profit = score_curve(&curve, &settings(Objective::MaxProfit, 0.6)).expect("scores");
        let by_sales = score_curve(&curve, &settings(Objective::MaxSales, 0.6)).expect("scores");

        assert_eq!(recommend(&by_profit).row().map(|r| r.discount_pct), Some(20.0));
        assert_eq!(recommend(&by_sales).row().map(|r| r.discount_pct), Some(10.0));
    }

    #[test]
    fn constraints_filter_rows() {
        let curve = sample_curve();
        let mut constrained = settings(Objective::MaxProfit, 0.6);
        constrained.constraints.max_discount_allowed = 15.0;
        let rows = score_curve(&curve, &constrained).expect("scores");

        assert_eq!(
            rows.iter().map(|row| row.feasible).collect::<Vec<_>>(),
            vec![true, true, false]
        );
        assert_eq!(recommend(&rows).row().map(|r| r.discount_pct), Some(10.0));
    }

    #[test]
    fn loosening_a_constraint_never_shrinks_the_feasible_set() {
        let curve = sample_curve();
        let base = BusinessConstraints {
            max_discount_allowed: 10.0,
            min_profit_required: 150.0,
            min_units_required: 15.0,
        };
        let loosened = [
            BusinessConstraints {
                max_discount_allowed: 20.0,
                ..base
            },
            BusinessConstraints {
                min_profit_required: 50.0,
                ..base
            },
            BusinessConstraints {
                min_units_required: 5.0,
                ..base
            },
        ];

        let feasible = |constraints: BusinessConstraints| -> Vec<bool> {
            curve
                .points()
                .iter()
                .map(|point| constraints.admits(point))
                .collect()
        };
        let before = feasible(base);
        for constraints in loosened {
            let after = feasible(constraints);
            for (was, now) in before.iter().zip(&after) {
                assert!(!was || *now, "loosening dropped a feasible row");
            }
        }
    }

    #[test]
    fn empty_feasible_set_is_signalled() {
        let curve = sample_curve();
        let mut strict = settings(Objective::MaxProfit, 0.6);
        strict.constraints.min_profit_required = 1_000.0;
        let rows = score_curve(&curve, &strict).expect("scores");
        assert_eq!(recommend(&rows), Recommendation::NoFeasibleDiscount);
    }

    #[test]
    fn ties_keep_the_lowest_discount() {
        let curve = DiscountCurve::new(vec![
            point(0.0, 50.0, 1.0),
            point(5.0, 80.0, 1.0),
            point(10.0, 80.0, 1.0),
        ]);
        let rows = score_curve(&curve, &settings(Objective::MaxProfit, 0.6)).expect("scores");
        assert_eq!(recommend(&rows).row().map(|r| r.discount_pct), Some(5.0));
    }

    #[test]
    fn rejects_out_of_range_weight() {
        let err = score_curve(&sample_curve(), &settings(Objective::Balanced, 1.5))
            .expect_err("weight above one");
        assert!(matches!(err, DashboardError::InvalidSettings(_)));
    }

    #[test]
    fn parses_objective_names() {
        assert_eq!("max-profit".parse::<Objective>(), Ok(Objective::MaxProfit));
        assert_eq!("Max Sales".parse::<Objective>(), Ok(Objective::MaxSales));
        assert_eq!("balanced".parse::<Objective>(), Ok(Objective::Balanced));
        assert!("cheapest".parse::<Objective>().is_err());
    }

    #[tokio::test]
    async fn dashboard_recommends_within_constraints() {
        let client = ScriptedClient::default();
        let settings = RecommendationSettings {
            objective: Objective::MaxSales,
            balance_weight: DEFAULT_BALANCE_WEIGHT,
            constraints: BusinessConstraints::default(),
        };

        let dashboard =
            run_recommendation_dashboard(&client, laptop_selection(), &regions(), settings)
                .await
                .expect("dashboard runs");

        // units rise with discount, so the cap at 30% binds
        assert_eq!(
            dashboard.recommendation.row().map(|row| row.discount_pct),
            Some(30.0)
        );
        assert_eq!(dashboard.feasible_count, 7);
        let insight = dashboard.insight.expect("insight fetched");
        assert_eq!(insight.our_price, 35_000.0);
        assert_eq!(insight.price_alert, Some(PriceAlert::Competitive));
        assert_eq!(dashboard.region_discount_pct, 30.0);
        assert_eq!(dashboard.regions.len(), 5);
        assert_eq!(client.calls(), 55 + 1 + 5);
    }

    #[tokio::test]
    async fn missing_competitor_price_is_prefilled() {
        let client = ScriptedClient::default();
        let mut selection = laptop_selection();
        selection.competitor_price = None;

        let dashboard = run_recommendation_dashboard(
            &client,
            selection,
            &regions(),
            RecommendationSettings::default(),
        )
        .await
        .expect("dashboard runs");

        // 50000 at 10% is 45000, shaved by 2%
        assert_eq!(dashboard.selection.competitor_price, Some(44_100.0));
        let insight = dashboard.insight.expect("insight fetched");
        assert!(insight.price_alert.is_some());
        assert!(dashboard
            .regions
            .iter()
            .all(|row| row.price_alert.is_some()));
    }

    #[tokio::test]
    async fn dashboard_reports_no_feasible_discount() {
        let client = ScriptedClient::default();
        let settings = RecommendationSettings {
            constraints: BusinessConstraints {
                min_profit_required: 1_000_000.0,
                ..BusinessConstraints::default()
            },
            ..RecommendationSettings::default()
        };

        let dashboard =
            run_recommendation_dashboard(&client, laptop_selection(), &regions(), settings)
                .await
                .expect("dashboard runs");

        assert_eq!(dashboard.recommendation, Recommendation::NoFeasibleDiscount);
        assert!(dashboard.insight.is_none());
        assert_eq!(dashboard.feasible_count, 0);
        assert_eq!(dashboard.region_discount_pct, 0.0);
        assert_eq!(client.calls(), 55 + 5);
    }
}
