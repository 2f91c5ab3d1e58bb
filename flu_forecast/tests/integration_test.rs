use flu_forecast::submission::{write_submission, write_submission_to};
use flu_forecast::{
    build_training_set, DataLoader, FeatureSet, ForecastConfig, ForecastError, HorizonRow,
    LinearRegressor, Observation, RecursiveForecaster, Regressor, SeasonalTransform, Week,
    MIN_RIDGE,
};
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

// Two regions over two seasons, plus a horizon that adds an unseen region
fn create_train_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Id,week,region_code,TauxGrippe,google_grippe_filtered").unwrap();

    let mut id = 1;
    for year in [2014, 2015] {
        for number in 1..=52u32 {
            for (region, scale) in [("11", 1.0), ("24", 1.5)] {
                let peak = if number <= 10 || number >= 48 { 150.0 } else { 20.0 };
                let rate = scale * (peak + (number % 5) as f64 * 3.0);
                let google = if number % 7 == 0 {
                    String::new()
                } else {
                    format!("{:.1}", rate / 40.0)
                };
                writeln!(file, "{},{}{:02},{},{},{}", id, year, number, region, rate, google)
                    .unwrap();
                id += 1;
            }
        }
    }

    file
}

fn create_test_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "Id,week,region_code,google_grippe_filtered").unwrap();

    // Rows deliberately out of chronological order
    let mut id = 9000;
    for number in [3u32, 1, 2, 4] {
        for region in ["24", "11", "31"] {
            writeln!(file, "{},2016{:02},{},{:.1}", id, number, region, 2.5).unwrap();
            id += 1;
        }
    }

    file
}

#[test]
fn test_full_forecast_workflow() {
    // 1. Load both tables
    let train_file = create_train_file();
    let test_file = create_test_file();
    let loader = DataLoader::default();
    let history = loader.load_observations(train_file.path()).unwrap();
    let horizon = loader.load_horizon(test_file.path()).unwrap();
    assert_eq!(history.len(), 208);
    assert_eq!(horizon.len(), 12);

    // 2. Fit on the history
    let transform = SeasonalTransform::new(FeatureSet::Compact);
    let training = build_training_set(&transform, &history, Default::default()).unwrap();
    assert_eq!(training.len(), history.len());
    let model = LinearRegressor::fit(&training.features, &training.targets, 1.0).unwrap();
    assert_eq!(model.feature_names(), transform_columns(&transform).as_slice());

    // 3. Forecast recursively
    let forecast = RecursiveForecaster::new(&transform, &model)
        .forecast(&history, &horizon)
        .unwrap();
    assert_eq!(forecast.len(), 12);
    assert_eq!(forecast.weeks(), 4);
    assert_eq!(forecast.fallbacks(), 1);
    assert!(forecast.values().iter().all(|v| *v >= 0.0 && v.is_finite()));

    // 4. Write the submission
    let dir = tempdir().unwrap();
    let path = dir.path().join("submission_test.csv");
    write_submission(&path, &forecast, "TauxGrippe").unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "Id,TauxGrippe");
    assert_eq!(lines.len(), 13);

    let ids: Vec<u64> = lines[1..]
        .iter()
        .map(|line| line.split(',').next().unwrap().parse().unwrap())
        .collect();
    assert_eq!(ids, (9000..9012).collect::<Vec<u64>>());
}

fn transform_columns(transform: &SeasonalTransform) -> Vec<String> {
    use flu_forecast::FeatureTransform;
    transform.columns()
}

#[test]
fn test_saved_model_gives_same_forecast() {
    let history = DataLoader::default()
        .load_observations(create_train_file().path())
        .unwrap();
    let horizon = DataLoader::default()
        .load_horizon(create_test_file().path())
        .unwrap();

    let transform = SeasonalTransform::new(FeatureSet::Extended);
    let training = build_training_set(&transform, &history, Default::default()).unwrap();
    let model = LinearRegressor::fit(&training.features, &training.targets, 0.5).unwrap();

    let dir = tempdir().unwrap();
    let model_path = dir.path().join("model.json");
    model.to_json_file(&model_path).unwrap();
    let loaded = LinearRegressor::from_json_file(&model_path).unwrap();

    let fresh = RecursiveForecaster::new(&transform, &model)
        .forecast(&history, &horizon)
        .unwrap();
    let restored = RecursiveForecaster::new(&transform, &loaded)
        .forecast(&history, &horizon)
        .unwrap();
    assert_eq!(fresh.values_by_id(), restored.values_by_id());
}

#[test]
fn test_both_feature_sets_fit_at_smallest_ridge() {
    let history = DataLoader::default()
        .load_observations(create_train_file().path())
        .unwrap();

    for feature_set in [FeatureSet::Compact, FeatureSet::Extended] {
        let transform = SeasonalTransform::new(feature_set);
        let training = build_training_set(&transform, &history, Default::default()).unwrap();

        // taux_diff1 = taux_lag1 - taux_lag2 leaves no unpenalised solution
        let err = LinearRegressor::fit(&training.features, &training.targets, 0.0).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(_)));

        let model = LinearRegressor::fit(&training.features, &training.targets, MIN_RIDGE).unwrap();
        assert_eq!(model.coefficients().len(), training.features.columns().len());
        assert!(model.coefficients().iter().all(|c| c.is_finite()));
        assert!(model
            .predict(&training.features)
            .unwrap()
            .iter()
            .all(|p| p.is_finite()));
    }
}

#[test]
fn test_empty_horizon_gives_empty_forecast() {
    let transform = SeasonalTransform::new(FeatureSet::Compact);
    let model = LinearRegressor::new(vec!["taux_lag1".to_string()], vec![1.0], 0.0).unwrap();
    let history = vec![Observation::new("A", Week::new(2015, 52).unwrap(), 10.0)];

    let forecast = RecursiveForecaster::new(&transform, &model)
        .forecast(&history, &[])
        .unwrap();
    assert!(forecast.is_empty());
    assert!(forecast.summary().is_none());

    let mut buffer = Vec::new();
    write_submission_to(&mut buffer, &forecast, "TauxGrippe").unwrap();
    assert_eq!(String::from_utf8(buffer).unwrap(), "Id,TauxGrippe\n");
}

#[test]
fn test_submission_written_in_id_order() {
    let transform = SeasonalTransform::new(FeatureSet::Compact);
    let model = LinearRegressor::new(vec!["taux_lag1".to_string()], vec![0.5], 1.0).unwrap();

    let week = |number| Week::new(2016, number).unwrap();
    let history = vec![
        Observation::new("A", Week::new(2015, 52).unwrap(), 10.0),
        Observation::new("B", Week::new(2015, 52).unwrap(), 4.0),
    ];
    let horizon = vec![
        HorizonRow::new(30, "B", week(2)),
        HorizonRow::new(7, "A", week(2)),
        HorizonRow::new(12, "B", week(1)),
        HorizonRow::new(3, "A", week(1)),
    ];

    let forecast = RecursiveForecaster::new(&transform, &model)
        .forecast(&history, &horizon)
        .unwrap();

    let mut buffer = Vec::new();
    write_submission_to(&mut buffer, &forecast, "TauxGrippe").unwrap();
    let text = String::from_utf8(buffer).unwrap();

    // A: 10 -> 6 -> 4, B: 4 -> 3 -> 2.5
    assert_eq!(text, "Id,TauxGrippe\n3,6\n7,4\n12,3\n30,2.5\n");
}

#[test]
fn test_config_file_drives_paths() {
    let dir = tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    fs::write(
        &config_path,
        r#"{ "submission_dir": "out", "version": "v12", "feature_set": "extended",
             "missing_policy": { "kind": "constant", "value": 0.0 } }"#,
    )
    .unwrap();

    let config = ForecastConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.feature_set, FeatureSet::Extended);
    assert_eq!(
        config.submission_path(),
        std::path::PathBuf::from("out").join("submission_v12.csv")
    );
    assert_eq!(config.columns.incidence, "TauxGrippe");
}
