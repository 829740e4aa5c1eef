use std::io::Read;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Deserializer};
use tracing::info;

use super::encoder::FeatureEncoder;
use super::forest::{ForestError, ForestParams, RandomForestRegressor};
use crate::prediction::{our_price, ModelError, ModelEstimate, SalesFeatures, SalesModel};

/// One historical sale used for training.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub features: SalesFeatures,
    pub profit: f64,
    pub units_sold: f64,
}

#[derive(Debug, Deserialize)]
struct SalesRow {
    product: String,
    category: String,
    region: String,
    base_price: f64,
    discount_pct: f64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    competitor_price: Option<f64>,
    profit: f64,
    units_sold: f64,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse::<f64>().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Historical sales table loaded once at start-up.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesHistory {
    records: Vec<SalesRecord>,
}

impl SalesHistory {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TrainingError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|source| TrainingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Parses `product,category,region,base_price,discount_pct,[competitor_price,]profit,units_sold`.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TrainingError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<SalesRow>().enumerate() {
            let row = row?;
            // header is line 1
            let line = index + 2;
            let numbers = [
                ("base_price", row.base_price),
                ("discount_pct", row.discount_pct),
                ("profit", row.profit),
                ("units_sold", row.units_sold),
            ];
            if let Some((column, _)) = numbers.iter().find(|(_, value)| !value.is_finite()) {
                return Err(TrainingError::InvalidValue {
                    line,
                    column: *column,
                });
            }

            let competitor_price = row
                .competitor_price
                .unwrap_or_else(|| our_price(row.base_price, row.discount_pct));
            if !competitor_price.is_finite() {
                return Err(TrainingError::InvalidValue {
                    line,
                    column: "competitor_price",
                });
            }

            records.push(SalesRecord {
                features: SalesFeatures {
                    product: row.product,
                    category: row.category,
                    region: row.region,
                    base_price: row.base_price,
                    discount_pct: row.discount_pct,
                    competitor_price,
                },
                profit: row.profit,
                units_sold: row.units_sold,
            });
        }

        if records.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Encoder plus forest for a single target column.
#[derive(Debug, Clone, PartialEq)]
pub struct RegressionPipeline {
    encoder: FeatureEncoder,
    forest: RandomForestRegressor,
}

impl RegressionPipeline {
    pub fn fit<F>(
        history: &SalesHistory,
        target: F,
        params: &ForestParams,
    ) -> Result<Self, TrainingError>
    where
        F: Fn(&SalesRecord) -> f64,
    {
        let encoder = FeatureEncoder::fit(history.records().iter().map(|record| &record.features));
        let features: Vec<Vec<f64>> = history
            .records()
            .iter()
            .map(|record| encoder.encode(&record.features))
            .collect();
        let targets: Vec<f64> = history.records().iter().map(target).collect();
        let forest = RandomForestRegressor::fit(&features, &targets, params)?;
        Ok(Self { encoder, forest })
    }

    pub fn predict(&self, features: &SalesFeatures) -> f64 {
        self.forest.predict(&self.encoder.encode(features))
    }
}

/// Profit and units pipelines trained on the same history. Immutable after training.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedSalesModel {
    profit: RegressionPipeline,
    units: RegressionPipeline,
    trained_rows: usize,
}

impl TrainedSalesModel {
    pub fn train(history: &SalesHistory, params: &ForestParams) -> Result<Self, TrainingError> {
        if history.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let started = Instant::now();
        let profit = RegressionPipeline::fit(history, |record| record.profit, params)?;
        let units = RegressionPipeline::fit(history, |record| record.units_sold, params)?;

        info!(
            rows = history.len(),
            trees = params.trees,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "profit and units models trained"
        );

        Ok(Self {
            profit,
            units,
            trained_rows: history.len(),
        })
    }

    pub fn trained_rows(&self) -> usize {
        self.trained_rows
    }
}

impl SalesModel for TrainedSalesModel {
    fn estimate(&self, features: &SalesFeatures) -> Result<ModelEstimate, ModelError> {
        let profit = self.profit.predict(features);
        if !profit.is_finite() {
            return Err(ModelError::NonFinite { target: "profit" });
        }
        let units_sold = self.units.predict(features);
        if !units_sold.is_finite() {
            return Err(ModelError::NonFinite {
                target: "units_sold",
            });
        }
        Ok(ModelEstimate { profit, units_sold })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("failed to read training data {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid training CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("training data line {line}: {column} must be a finite number")]
    InvalidValue { line: usize, column: &'static str },
    #[error("training data contains no rows")]
    EmptyDataset,
    #[error(transparent)]
    Forest(#[from] ForestError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const CSV: &str = "\
product,category,region,base_price,discount_pct,competitor_price,profit,units_sold
Laptop,Electronics,North,50000,0,49000,9000,10
Laptop,Electronics,North,50000,20,49000,3000,18
Laptop,Electronics,South,50000,0,49000,8800,11
Laptop,Electronics,South,50000,20,49000,2600,19
Mouse,Accessories,North,1200,0,1150,300,40
Mouse,Accessories,North,1200,20,1150,80,70
";

    fn params() -> ForestParams {
        ForestParams {
            trees: 15,
            ..ForestParams::default()
        }
    }

    #[test]
    fn parses_full_schema() {
        let history = SalesHistory::from_reader(Cursor::new(CSV)).expect("csv parses");
        assert_eq!(history.len(), 6);
        let first = &history.records()[0];
        assert_eq!(first.features.product, "Laptop");
        assert_eq!(first.features.competitor_price, 49_000.0);
        assert_eq!(first.units_sold, 10.0);
    }

    #[test]
    fn competitor_column_is_optional() {
        let csv = "product,category,region,base_price,discount_pct,profit,units_sold\n\
                   Mobile,Electronics,East,20000,10,1500,25\n";
        let history = SalesHistory::from_reader(Cursor::new(csv)).expect("csv parses");
        assert_eq!(history.records()[0].features.competitor_price, 18_000.0);
    }

    #[test]
    fn blank_competitor_falls_back_to_sale_price() {
        let csv = "product,category,region,base_price,discount_pct,competitor_price,profit,units_sold\n\
                   Mobile,Electronics,East,20000,50, ,1500,25\n";
        let history = SalesHistory::from_reader(Cursor::new(csv)).expect("csv parses");
        assert_eq!(history.records()[0].features.competitor_price, 10_000.0);
    }

    #[test]
    fn rejects_empty_and_malformed_input() {
        let header_only = "product,category,region,base_price,discount_pct,profit,units_sold\n";
        assert!(matches!(
            SalesHistory::from_reader(Cursor::new(header_only)),
            Err(TrainingError::EmptyDataset)
        ));

        let malformed = "product,category,region,base_price,discount_pct,profit,units_sold\n\
                         Mobile,Electronics,East,cheap,10,1500,25\n";
        assert!(matches!(
            SalesHistory::from_reader(Cursor::new(malformed)),
            Err(TrainingError::Csv(_))
        ));

        let infinite = "product,category,region,base_price,discount_pct,profit,units_sold\n\
                        Mobile,Electronics,East,20000,10,inf,25\n";
        assert!(matches!(
            SalesHistory::from_reader(Cursor::new(infinite)),
            Err(TrainingError::InvalidValue {
                line: 2,
                column: "profit"
            })
        ));
    }

    #[test]
    fn trained_model_tracks_discount_effect() {
        let history = SalesHistory::from_reader(Cursor::new(CSV)).expect("csv parses");
        let model = TrainedSalesModel::train(&history, &params()).expect("model trains");
        assert_eq!(model.trained_rows(), 6);

        let mut features = history.records()[0].features.clone();
        let shallow = model.estimate(&features).expect("estimate");
        features.discount_pct = 20.0;
        let deep = model.estimate(&features).expect("estimate");

        assert!(shallow.profit > deep.profit);
        assert!(shallow.units_sold < deep.units_sold);
    }

    #[test]
    fn unknown_product_still_predicts() {
        let history = SalesHistory::from_reader(Cursor::new(CSV)).expect("csv parses");
        let model = TrainedSalesModel::train(&history, &params()).expect("model trains");
        let features = SalesFeatures {
            product: "Hoverboard".to_string(),
            category: "Toys".to_string(),
            region: "Central".to_string(),
            base_price: 9000.0,
            discount_pct: 5.0,
            competitor_price: 8500.0,
        };
        let estimate = model.estimate(&features).expect("estimate");
        assert!(estimate.profit.is_finite());
    }
}
