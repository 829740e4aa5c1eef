use crate::reports::{run_curve, run_predict, run_recommend, run_simulate};
use crate::server;
use clap::{Args, Parser, Subcommand};
use discount_ai::dashboard::simulation::{
    DEFAULT_DISCOUNT_PCT, DEFAULT_TRIALS, DEFAULT_VOLATILITY_PCT,
};
use discount_ai::dashboard::Objective;
use discount_ai::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Discount Optimization",
    about = "Serve the discount prediction API and run pricing dashboards from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Predict profit and units for one product, region and discount
    Predict(PredictArgs),
    /// Show regional predictions and the profit/units curve across discounts
    Curve(CurveArgs),
    /// Recommend a discount for an objective under business constraints
    Recommend(RecommendArgs),
    /// Run a Monte Carlo simulation of competitor prices and regions
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

/// Where predictions come from and how reports are printed.
#[derive(Args, Debug, Default)]
pub(crate) struct SourceArgs {
    /// Call a running prediction API at this URL instead of training in-process
    #[arg(long)]
    pub(crate) api_url: Option<String>,
    /// Call the prediction API configured by DISCOUNT_API_URL
    #[arg(long)]
    pub(crate) remote: bool,
    /// Print the report as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ProductArgs {
    /// Catalog product name (case-insensitive)
    #[arg(long, default_value = "Laptop")]
    pub(crate) product: String,
    /// Competitor price; without it `predict` and `curve` report no price alert
    #[arg(long)]
    pub(crate) competitor_price: Option<f64>,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    #[command(flatten)]
    pub(crate) product: ProductArgs,
    #[arg(long, default_value = "North")]
    pub(crate) region: String,
    /// Discount percentage in [0, 100]
    #[arg(long, default_value_t = 10.0)]
    pub(crate) discount: f64,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Args, Debug)]
pub(crate) struct CurveArgs {
    #[command(flatten)]
    pub(crate) product: ProductArgs,
    /// Discount used for the regional snapshot
    #[arg(long, default_value_t = 10.0)]
    pub(crate) discount: f64,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Args, Debug)]
pub(crate) struct RecommendArgs {
    #[command(flatten)]
    pub(crate) product: ProductArgs,
    /// max-profit, max-sales or balanced
    #[arg(long, default_value = "max-profit")]
    pub(crate) objective: Objective,
    /// Profit weight for the balanced objective
    #[arg(long, default_value_t = 0.6)]
    pub(crate) alpha: f64,
    #[arg(long, default_value_t = 30.0)]
    pub(crate) max_discount: f64,
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub(crate) min_profit: f64,
    #[arg(long, default_value_t = 1.0)]
    pub(crate) min_units: f64,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

#[derive(Args, Debug)]
pub(crate) struct SimulateArgs {
    #[command(flatten)]
    pub(crate) product: ProductArgs,
    #[arg(long, default_value_t = DEFAULT_DISCOUNT_PCT)]
    pub(crate) discount: f64,
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    pub(crate) trials: usize,
    /// Competitor price volatility as a percentage of the baseline
    #[arg(long, default_value_t = DEFAULT_VOLATILITY_PCT)]
    pub(crate) volatility: f64,
    /// Seed for a reproducible run
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args).await,
        Command::Curve(args) => run_curve(args).await,
        Command::Recommend(args) => run_recommend(args).await,
        Command::Simulate(args) => run_simulate(args).await,
    }
}
