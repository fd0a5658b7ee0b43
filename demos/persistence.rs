//! Fit a model, save it as JSON, load it back and check the predictions match.
//!
//! Run with: cargo run --release --example persistence

use weasel_rs::{FittedModel, WeaselConfig};

fn main() {
    let length = 96;
    let series: Vec<Vec<f64>> = (0..30)
        .map(|i| {
            let freq = if i % 2 == 0 { 0.1 } else { 0.6 };
            (0..length)
                .map(|t| (t as f64 * freq + i as f64 * 0.4).sin() + 0.05 * ((t * 13 + i) % 7) as f64)
                .collect()
        })
        .collect();
    let labels: Vec<usize> = (0..30).map(|i| i % 2).collect();

    let config = WeaselConfig::new(20)
        .with_max_feature_count(2_000)
        .with_random_state(3);
    let model = weasel_rs::fit_model(&series, &labels, &config, None, |stage| {
        println!("stage: {stage}");
    })
    .expect("fit failed");

    let path = std::env::temp_dir().join("weasel_demo_model.json");
    model.save(&path).expect("save failed");
    let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
    println!("\nSaved model to {} ({size} bytes)", path.display());
    println!("Feature count: {}", model.feature_count());

    let loaded: FittedModel = FittedModel::load(&path).expect("load failed");
    let before = model.predict(&series).expect("predict failed");
    let after = loaded.predict(&series).expect("predict failed");
    println!("Predictions identical after reload: {}", before == after);

    let per_config = loaded.vocabulary().words_per_configuration();
    let busiest = per_config
        .iter()
        .enumerate()
        .max_by_key(|(_, &n)| n)
        .map(|(id, &n)| (id, n))
        .unwrap_or_default();
    let cfg = &loaded.configurations()[busiest.0].configuration;
    println!(
        "Most features from configuration {} ({} words): window {}, dilation {}, word length {}",
        busiest.0, busiest.1, cfg.window_length, cfg.dilation, cfg.word_length
    );
    std::fs::remove_file(&path).ok();
}
