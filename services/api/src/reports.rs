use crate::cli::{CurveArgs, PredictArgs, ProductArgs, RecommendArgs, SimulateArgs, SourceArgs};
use crate::infra::prediction_client;
use discount_ai::catalog::Catalog;
use discount_ai::config::AppConfig;
use discount_ai::dashboard::{
    run_curve_dashboard, run_recommendation_dashboard, run_simulation, BusinessConstraints,
    CurveDashboard, MonteCarloSettings, PredictionClient, ProductSelection, Recommendation,
    RecommendationDashboard, RecommendationSettings, RegionPrediction, SimulationRun,
};
use discount_ai::error::AppError;
use discount_ai::prediction::{PredictionRequest, PredictionResponse, PriceAlert};
use discount_ai::telemetry;
use serde::Serialize;
use std::fmt::Write;
use std::sync::Arc;

struct Session {
    client: Arc<dyn PredictionClient>,
    catalog: Catalog,
}

fn open_session(source: &SourceArgs) -> Result<Session, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_stderr(&config.telemetry)?;
    let catalog = Catalog::load(config.catalog.products_csv.as_deref())?;
    let client = prediction_client(source, &config)?;
    Ok(Session { client, catalog })
}

fn select(catalog: &Catalog, args: &ProductArgs) -> Result<ProductSelection, AppError> {
    let entry = catalog.product(&args.product)?.clone();
    Ok(ProductSelection::new(entry, args.competitor_price))
}

fn emit<T: Serialize>(
    report: &T,
    json: bool,
    render: impl FnOnce(&T) -> String,
) -> Result<(), AppError> {
    if json {
        let payload = serde_json::to_string_pretty(report).map_err(std::io::Error::from)?;
        println!("{payload}");
    } else {
        print!("{}", render(report));
    }
    Ok(())
}

#[derive(Serialize)]
struct PredictionReport {
    request: PredictionRequest,
    response: PredictionResponse,
}

pub(crate) async fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let session = open_session(&args.source)?;
    let selection = select(&session.catalog, &args.product)?;
    let request = selection.request(&args.region, args.discount);
    let response = session.client.predict(&request).await?;
    emit(
        &PredictionReport { request, response },
        args.source.json,
        render_prediction,
    )
}

pub(crate) async fn run_curve(args: CurveArgs) -> Result<(), AppError> {
    let session = open_session(&args.source)?;
    let selection = select(&session.catalog, &args.product)?;
    let dashboard = run_curve_dashboard(
        session.client.as_ref(),
        selection,
        session.catalog.regions(),
        args.discount,
    )
    .await?;
    emit(&dashboard, args.source.json, render_curve)
}

pub(crate) async fn run_recommend(args: RecommendArgs) -> Result<(), AppError> {
    let session = open_session(&args.source)?;
    let selection = select(&session.catalog, &args.product)?;
    let settings = RecommendationSettings {
        objective: args.objective,
        balance_weight: args.alpha,
        constraints: BusinessConstraints {
            max_discount_allowed: args.max_discount,
            min_profit_required: args.min_profit,
            min_units_required: args.min_units,
        },
    };
    let dashboard = run_recommendation_dashboard(
        session.client.as_ref(),
        selection,
        session.catalog.regions(),
        settings,
    )
    .await?;
    emit(&dashboard, args.source.json, render_recommendation)
}

pub(crate) async fn run_simulate(args: SimulateArgs) -> Result<(), AppError> {
    let session = open_session(&args.source)?;
    let selection = select(&session.catalog, &args.product)?;
    let settings = MonteCarloSettings {
        discount_pct: args.discount,
        trials: args.trials,
        volatility_pct: args.volatility,
        seed: args.seed,
    };
    let run = run_simulation(
        session.client.as_ref(),
        selection,
        session.catalog.regions(),
        settings,
    )
    .await?;
    emit(&run, args.source.json, render_simulation)
}

fn alert_line(alert: Option<PriceAlert>) -> String {
    match alert {
        Some(alert) => format!("{} ({})", alert.label(), alert.advice()),
        None => "n/a (no competitor price)".to_string(),
    }
}

fn write_regions(out: &mut String, regions: &[RegionPrediction]) {
    for row in regions {
        let _ = writeln!(
            out,
            "  - {:<8} profit {:>12.2} | units {:>8.2} | price {:>10.2}{}",
            row.region,
            row.predicted_profit,
            row.predicted_units_sold,
            row.our_price,
            row.price_alert
                .map(|alert| format!(" | {}", alert.label()))
                .unwrap_or_default()
        );
    }
}

fn render_prediction(report: &PredictionReport) -> String {
    let PredictionReport { request, response } = report;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Prediction for {} ({}) in {} at {}% discount",
        request.product, request.category, request.region, request.discount_pct
    );
    let _ = writeln!(out, "- Our price: {:.2}", response.our_price);
    let _ = writeln!(out, "- Predicted profit: {:.2}", response.predicted_profit);
    let _ = writeln!(out, "- Predicted units sold: {:.2}", response.predicted_units_sold);
    let _ = writeln!(out, "- Price alert: {}", alert_line(response.price_alert));
    out
}

fn render_curve(dashboard: &CurveDashboard) -> String {
    let mut out = String::new();
    let product = &dashboard.selection.product;
    let _ = writeln!(
        out,
        "Discount curve for {} ({}, base price {:.2})",
        product.name, product.category, product.base_price
    );
    let _ = writeln!(
        out,
        "Snapshot at {}% discount: avg profit {:.2} | avg units {:.2}",
        dashboard.discount_pct,
        dashboard.average.predicted_profit,
        dashboard.average.predicted_units_sold
    );
    write_regions(&mut out, &dashboard.regions);
    let _ = writeln!(out, "\nAverage across regions by discount:");
    for point in dashboard.curve.points() {
        let _ = writeln!(
            out,
            "  {:>5.1}% profit {:>12.2} | units {:>8.2}",
            point.discount_pct, point.predicted_profit, point.predicted_units_sold
        );
    }
    if let Some(best) = dashboard.best_discount {
        let _ = writeln!(
            out,
            "Best discount for profit: {}% (avg profit {:.2})",
            best.discount_pct, best.predicted_profit
        );
    }
    out
}

fn render_recommendation(dashboard: &RecommendationDashboard) -> String {
    let mut out = String::new();
    let settings = &dashboard.settings;
    let _ = writeln!(
        out,
        "Discount recommendation for {} | objective {}",
        dashboard.selection.product.name, settings.objective
    );
    let _ = writeln!(
        out,
        "Constraints: discount <= {}% | profit >= {:.2} | units >= {:.2}",
        settings.constraints.max_discount_allowed,
        settings.constraints.min_profit_required,
        settings.constraints.min_units_required
    );
    let _ = writeln!(out, "\nScored discounts ({} feasible):", dashboard.feasible_count);
    for row in &dashboard.rows {
        let _ = writeln!(
            out,
            "  {:>5.1}% profit {:>12.2} | units {:>8.2} | score {:>12.4} | {}",
            row.discount_pct,
            row.predicted_profit,
            row.predicted_units_sold,
            row.score,
            if row.feasible { "feasible" } else { "excluded" }
        );
    }

    match &dashboard.recommendation {
        Recommendation::Discount(row) => {
            let _ = writeln!(
                out,
                "\nRecommended discount: {}% (avg profit {:.2}, avg units {:.2})",
                row.discount_pct, row.predicted_profit, row.predicted_units_sold
            );
            if let Some(insight) = &dashboard.insight {
                let _ = writeln!(
                    out,
                    "Our price {:.2} | {}",
                    insight.our_price,
                    alert_line(insight.price_alert)
                );
            }
        }
        Recommendation::NoFeasibleDiscount => {
            let _ = writeln!(
                out,
                "\nNo discount satisfies the constraints. Relax the limits and try again."
            );
        }
    }

    let _ = writeln!(
        out,
        "\nRegional breakdown at {}% discount:",
        dashboard.region_discount_pct
    );
    write_regions(&mut out, &dashboard.regions);
    out
}

fn render_simulation(run: &SimulationRun) -> String {
    let mut out = String::new();
    let summary = &run.summary;
    let _ = writeln!(
        out,
        "Monte Carlo simulation for {} at {}% discount ({} trials, competitor {:.2} +/- {}%)",
        run.selection.product.name,
        run.settings.discount_pct,
        summary.trials,
        run.competitor_baseline,
        run.settings.volatility_pct
    );
    let _ = writeln!(out, "- Mean profit: {:.2}", summary.mean_profit);
    let _ = writeln!(out, "- Mean units sold: {:.2}", summary.mean_units_sold);
    let _ = writeln!(
        out,
        "- Profit range: {:.2} .. {:.2}",
        summary.min_profit, summary.max_profit
    );
    let _ = writeln!(
        out,
        "- Loss probability: {:.1}%",
        summary.loss_probability * 100.0
    );

    let _ = writeln!(out, "\nProfit distribution:");
    let peak = summary
        .histogram
        .iter()
        .map(|bin| bin.count)
        .max()
        .unwrap_or_default()
        .max(1);
    for bin in &summary.histogram {
        let bar = "#".repeat(bin.count * 40 / peak);
        let _ = writeln!(
            out,
            "  {:>12.2} .. {:>12.2} {:>5} {}",
            bin.lower, bin.upper, bin.count, bar
        );
    }

    let _ = writeln!(out, "\nMean profit by region:");
    for region in &summary.region_profit {
        let _ = writeln!(
            out,
            "  - {:<8} {:>12.2} ({} trials)",
            region.region, region.mean_profit, region.samples
        );
    }

    let _ = writeln!(out, "\nPrice alerts:");
    for entry in &summary.alert_counts {
        let _ = writeln!(out, "  - {}: {}", entry.alert.label(), entry.count);
    }
    out
}
