use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::filter::FilteredView;
use crate::data::model::{Metric, PeriodFamily};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – dashboard controls
// ---------------------------------------------------------------------------

/// Render the control panel: period family, metric column, period range.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Controls");
    ui.separator();

    // ---- Period family ----
    ui.strong("Period");
    let mut pending_family = None;
    for family in PeriodFamily::ALL {
        if ui
            .radio(state.controls.family == family, family.label())
            .clicked()
        {
            pending_family = Some(family);
        }
    }
    if let Some(family) = pending_family {
        state.set_family(family);
    }
    ui.separator();

    // ---- Metric selector ----
    ui.strong("Variable");
    let current = state.controls.metric;
    let mut pending_metric = None;
    egui::ComboBox::from_id_salt("metric_select")
        .selected_text(current.label())
        .width(ui.available_width() - 8.0)
        .show_ui(ui, |ui: &mut Ui| {
            for metric in Metric::ALL {
                if ui
                    .selectable_label(current == metric, metric.label())
                    .clicked()
                {
                    pending_metric = Some(metric);
                }
            }
        });
    if let Some(metric) = pending_metric {
        state.set_metric(metric);
    }
    ui.separator();

    // ---- Period range ----
    ui.strong("Period range");
    let (min, max) = state.range_limits();
    let (mut lo, mut hi) = state.controls.range;

    ui.add(
        egui::Slider::new(&mut lo, min..=max)
            .step_by(100.0)
            .text("from"),
    );
    ui.add(
        egui::Slider::new(&mut hi, min..=max)
            .step_by(100.0)
            .text("to"),
    );
    // Inverted bounds are allowed and render as an empty dashboard.
    if (lo, hi) != state.controls.range {
        state.set_range(lo, hi);
    }

    ui.add_space(8.0);
    let dataset = state.store.dataset(state.controls.family);
    let departments: std::collections::BTreeSet<&str> = dataset
        .records
        .iter()
        .map(|r| r.department.as_str())
        .collect();
    let peek: Vec<String> = dataset
        .records
        .iter()
        .take(8)
        .map(|r| format!("{} ({}) — {}", r.title, r.department, r.period))
        .collect();
    ui.label(
        RichText::new(format!(
            "{} record(s), {} department(s)",
            dataset.len(),
            departments.len()
        ))
        .weak(),
    )
    .on_hover_text(peek.join("\n"));
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            for family in PeriodFamily::ALL {
                if ui.button(format!("Load {}…", family.label())).clicked() {
                    open_file_dialog(state, family);
                    ui.close_menu();
                }
            }
        });

        ui.separator();

        let (lo, hi) = state.controls.range;
        ui.label(format!(
            "{} | {} rows in {lo}..={hi}",
            state.controls.family.label(),
            row_count(state),
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

fn row_count(state: &AppState) -> usize {
    let (lo, hi) = state.controls.range;
    FilteredView::new(state.store.dataset(state.controls.family), lo, hi).len()
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState, family: PeriodFamily) {
    let file = rfd::FileDialog::new()
        .set_title(format!("Open demand data ({})", family.label()))
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        match crate::data::loader::load_file(&path) {
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
                log::error!("Failed to load file: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
