mod app;
mod artifacts;
mod color;
mod data;
mod state;
mod stats;
mod ui;

use std::path::PathBuf;

use app::DemandDashApp;
use data::model::PeriodFamily;
use eframe::egui;
use state::AppState;

/// Look for `demand_10.*` / `demand_30.*` in the data directory
/// (`DEMAND_DATA_DIR`, default `data/`) and load whatever is present.
/// A missing file is fine; datasets can be loaded later via File → Load.
/// A present-but-malformed file surfaces in the status line.
fn autoload(state: &mut AppState) {
    let dir = std::env::var("DEMAND_DATA_DIR").unwrap_or_else(|_| "data".to_string());
    let dir = PathBuf::from(dir);

    for family in PeriodFamily::ALL {
        let stem = format!("demand_{}", family.id());
        let Some(path) = ["parquet", "json", "csv"]
            .iter()
            .map(|ext| dir.join(format!("{stem}.{ext}")))
            .find(|p| p.exists())
        else {
            log::warn!("No {stem}.* found in {}", dir.display());
            continue;
        };

        match data::loader::load_file(&path) {
            Ok(dataset) => {
                log::info!(
                    "Loaded {} demand records for {} from {}",
                    dataset.len(),
                    family.label(),
                    path.display()
                );
                state.set_dataset(family, dataset);
            }
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", path.display());
                state.status_message = Some(format!("Error loading {}: {e:#}", path.display()));
            }
        }
    }
}

fn main() -> eframe::Result {
    env_logger::init();

    let mut state = AppState::default();
    autoload(&mut state);

    // Optional startup override for the trend metric, validated against the
    // closed column set; anything unknown is rejected here.
    if let Ok(name) = std::env::var("DEMAND_METRIC") {
        match data::model::Metric::from_column(&name) {
            Some(metric) => state.set_metric(metric),
            None => log::warn!("DEMAND_METRIC '{name}' is not a known metric column"),
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Demand Dash – Course Demand Analytics",
        options,
        Box::new(move |_cc| Ok(Box::new(DemandDashApp::new(state)))),
    )
}
