use trading_common::backtest::{CrossoverMode, StrategyKind, StrategyParameters};
use trading_common::EngineError;
use trading_core::service::{JsonParameterStore, ParameterStore, ServiceError};

#[tokio::test]
async fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonParameterStore::new(dir.path().join("settings.json"));

    let params = store.load_parameters().await.unwrap();
    assert_eq!(params, StrategyParameters::default());
    assert_eq!(params.strategy, StrategyKind::MaRsiCombo);
    assert_eq!(params.ma_rsi_combo.slow_window, 20);
}

#[tokio::test]
async fn legacy_flat_layout_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{
            "strategy": "bollinger_rsi",
            "fast_ma": 3,
            "slow_ma": 12,
            "rsi_period": 10,
            "rsi_buy": 25,
            "bollinger_window": 18,
            "bollinger_std_dev": 2.5,
            "pairs": { "symbols": ["KO", "PEP"], "lookback_days": 20, "entry_zscore": 2.2, "exit_zscore": 0.4 }
        }"#,
    )
    .unwrap();

    let params = JsonParameterStore::new(&path).load_parameters().await.unwrap();
    assert_eq!(params.strategy, StrategyKind::BollingerRsi);
    assert_eq!(params.ma_rsi_combo.fast_window, 3);
    assert_eq!(params.ma_rsi_combo.slow_window, 12);
    assert_eq!(params.ma_rsi_combo.rsi_period, 10);
    assert_eq!(params.ma_rsi_combo.rsi_buy_threshold, 25.0);
    assert_eq!(params.ma_rsi_combo.rsi_sell_threshold, 70.0);
    assert_eq!(params.bollinger_rsi.window, 18);
    assert_eq!(params.bollinger_rsi.rsi_period, 10);
    assert_eq!(params.bollinger_rsi.rsi_threshold, 35.0);
    assert_eq!(
        params.pairs_zscore.symbol_pair,
        ("KO".to_string(), "PEP".to_string())
    );
    assert_eq!(params.pairs_zscore.lookback_window, 20);
}

#[tokio::test]
async fn legacy_file_with_unordered_ma_settings_loads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "fast_ma": 15, "slow_ma": 10, "rsi_buy": 50, "rsi_sell": 50 }"#,
    )
    .unwrap();

    let params = JsonParameterStore::new(&path).load_parameters().await.unwrap();
    assert_eq!(params.ma_rsi_combo.fast_window, 15);
    assert_eq!(params.ma_rsi_combo.slow_window, 10);
    assert_eq!(params.ma_rsi_combo.rsi_buy_threshold, 50.0);
    assert_eq!(params.ma_rsi_combo.rsi_sell_threshold, 50.0);
}

#[tokio::test]
async fn exit_above_entry_fails_at_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(
        &path,
        r#"{ "pairs_zscore": { "symbol_pair": ["A", "B"], "lookback_window": 15, "entry_zscore": 2.0, "exit_zscore": 3.0 } }"#,
    )
    .unwrap();

    let err = JsonParameterStore::new(&path).load_parameters().await.unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Engine(EngineError::InvalidParameters(_))
    ));
}

#[tokio::test]
async fn saved_parameters_load_back() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonParameterStore::new(dir.path().join("nested").join("settings.json"));

    let mut params = StrategyParameters::default().with_strategy(StrategyKind::PairsZscore);
    params.ma_rsi_combo.crossover = CrossoverMode::CrossEvent;
    params.pairs_zscore.entry_zscore = 1.5;
    store.save_parameters(&params).await.unwrap();

    let contents = std::fs::read_to_string(store.path()).unwrap();
    assert!(contents.contains("\"pairs_zscore\""));
    assert_eq!(store.load_parameters().await.unwrap(), params);
}

#[tokio::test]
async fn invalid_parameters_are_not_saved() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonParameterStore::new(dir.path().join("settings.json"));

    let mut params = StrategyParameters::default();
    params.ma_rsi_combo.fast_window = 0;
    assert!(store.save_parameters(&params).await.is_err());
    assert!(!store.path().exists());
}
