//! Load the incidence tables, fit or load the regressor, run the recursive
//! forecast and write the submission file.
//!
//! Usage: `flu_forecast [config.json]` (log level via `RUST_LOG`)

use flu_forecast::training::weeks_of;
use flu_forecast::{
    build_training_set, DataLoader, ForecastConfig, LinearRegressor, RecursiveForecaster,
    Regressor, SeasonalTransform,
};
use std::env;
use std::error::Error;
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn load_or_fit_model(
    config: &ForecastConfig,
    transform: &SeasonalTransform,
    history: &[flu_forecast::Observation],
) -> Result<LinearRegressor, Box<dyn Error>> {
    if let Some(path) = config.model_path.as_ref().filter(|path| path.exists()) {
        info!(path = %path.display(), "Loading saved model");
        return Ok(LinearRegressor::from_json_file(path)?);
    }

    let training = build_training_set(transform, history, config.missing_policy)?;
    println!("Training rows: {}", training.len());

    let (train, holdout) = training.holdout_last_year()?;
    if !train.is_empty() && !holdout.is_empty() {
        let model = LinearRegressor::fit(&train.features, &train.targets, config.ridge)?;
        let predicted: Vec<f64> = model.predict(&holdout.features)?
            .into_iter()
            .map(|value| value.max(0.0))
            .collect();
        let rmse = flu_math::rmse(&holdout.targets, &predicted)?;
        println!("Holdout RMSE (last year, one step ahead): {:.2}", rmse);
    }

    let model = LinearRegressor::fit(&training.features, &training.targets, config.ridge)?;
    if let Some(path) = &config.model_path {
        model.to_json_file(path)?;
        info!(path = %path.display(), "Saved fitted model");
    }
    Ok(model)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match env::args().nth(1) {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };
    config.validate()?;

    println!("Recursive influenza forecast ({})", config.version);
    println!("==================================");

    let loader = DataLoader::new(config.columns.clone());
    let history = loader.load_observations(&config.train_csv)?;
    let horizon = loader.load_horizon(&config.test_csv)?;
    println!("History: {} rows", history.len());
    println!("Horizon: {} rows", horizon.len());
    if horizon.is_empty() {
        warn!("Forecast horizon is empty, the submission will only hold its header");
    }

    // The rolling statistics must not see the horizon
    let first_horizon_week = horizon.iter().map(|row| row.week).min();
    if let (Some(last_seen), Some(first)) = (weeks_of(&history).last(), first_horizon_week) {
        if *last_seen >= first {
            warn!(
                last_history_week = %last_seen,
                first_horizon_week = %first,
                "History overlaps the forecast horizon"
            );
        }
    }

    let transform = SeasonalTransform::new(config.feature_set)
        .with_flu_season(config.flu_season)
        .with_policy(config.missing_policy);
    let model = load_or_fit_model(&config, &transform, &history)?;

    let forecast = RecursiveForecaster::new(&transform, &model)
        .with_policy(config.missing_policy)
        .forecast(&history, &horizon)?;

    fs::create_dir_all(&config.submission_dir)?;
    let path = config.submission_path();
    flu_forecast::submission::write_submission(&path, &forecast, &config.columns.incidence)?;

    if let Some(summary) = forecast.summary() {
        println!("\n{}", summary);
    }
    if forecast.fallbacks() > 0 {
        println!("Rows using the unseen-region fallback: {}", forecast.fallbacks());
    }

    println!("\nFeature importance:");
    for (name, coefficient) in model.importance() {
        println!("  {:<15} {:>10.4}", name, coefficient);
    }

    println!("Submission written to {}", path.display());

    Ok(())
}
