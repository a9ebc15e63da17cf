use eframe::egui::{self, Color32, Pos2, RichText, Stroke, Ui, Vec2};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Line, Plot, PlotPoints, Points};

use crate::artifacts::{Artifact, ArtifactBatch, ArtifactError, ArtifactSlot, PieSlice, TrendLine};
use crate::color;
use crate::stats::{Bin, BoxStats};

const CHART_HEIGHT: f32 = 260.0;
const ACCENT: Color32 = Color32::from_rgb(52, 134, 235);

// ---------------------------------------------------------------------------
// Dashboard – render one artifact batch (central panel)
// ---------------------------------------------------------------------------

/// Render the twelve batch slots: tables and the trend full-width, the
/// remaining charts in two-column rows.
pub fn dashboard(ui: &mut Ui, batch: &ArtifactBatch) {
    let slots = &batch.artifacts;
    let head = slots.len().min(4);

    for slot in &slots[..head] {
        render_slot(ui, slot);
        ui.add_space(16.0);
    }

    for pair in slots[head..].chunks(2) {
        ui.columns(2, |cols| {
            for (col, slot) in cols.iter_mut().zip(pair) {
                render_slot(col, slot);
            }
        });
        ui.add_space(16.0);
    }
}

fn render_slot(ui: &mut Ui, slot: &ArtifactSlot) {
    ui.push_id(slot.id, |ui: &mut Ui| match &slot.result {
        Ok(artifact) => render_artifact(ui, slot.id, artifact),
        Err(e) => render_error(ui, slot.id, e),
    });
}

/// A failing builder degrades to a titled placeholder; the remaining slots
/// render normally around it.
fn render_error(ui: &mut Ui, id: &str, error: &ArtifactError) {
    ui.group(|ui: &mut Ui| {
        ui.strong(id);
        ui.label(RichText::new(format!("Unavailable: {error}")).color(Color32::RED));
    });
}

fn render_artifact(ui: &mut Ui, id: &str, artifact: &Artifact) {
    ui.strong(artifact.title());
    match artifact {
        Artifact::SummaryTable {
            columns,
            row_labels,
            rows,
            ..
        } => summary_table(ui, columns, row_labels, rows),
        Artifact::LineSeries {
            y_label, points, ..
        } => line_series(ui, id, y_label, points),
        Artifact::Scatter {
            x_label,
            y_label,
            points,
            trend,
            ..
        } => scatter(ui, id, x_label, y_label, points, trend.as_ref()),
        Artifact::Pie { slices, .. } => pie(ui, slices),
        Artifact::BoxPlot { label, stats, .. } => box_plot(ui, id, label, stats.as_ref()),
        Artifact::Histogram { label, bins, .. } => histogram(ui, id, label, bins),
        Artifact::Heatmap { labels, matrix, .. } => heatmap(ui, labels, matrix),
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn fmt_cell(v: f64) -> String {
    if v.is_nan() {
        "–".to_string()
    } else {
        format!("{v:.2}")
    }
}

fn summary_table(ui: &mut Ui, columns: &[String], row_labels: &[String], rows: &[Vec<f64>]) {
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::auto().at_least(48.0))
        .columns(Column::remainder().at_least(70.0), columns.len())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.label("");
            });
            for col in columns {
                header.col(|ui| {
                    ui.label(RichText::new(col).small().strong());
                });
            }
        })
        .body(|mut body| {
            for (label, values) in row_labels.iter().zip(rows.iter()) {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(label).strong());
                    });
                    for &v in values {
                        row.col(|ui| {
                            ui.label(fmt_cell(v));
                        });
                    }
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Line / scatter charts
// ---------------------------------------------------------------------------

fn line_series(ui: &mut Ui, id: &str, y_label: &str, points: &[[f64; 2]]) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label("Row")
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            let series: PlotPoints = points.iter().copied().collect();
            plot_ui.line(Line::new(series).name(y_label).color(ACCENT).width(1.5));
        });
}

fn scatter(
    ui: &mut Ui,
    id: &str,
    x_label: &str,
    y_label: &str,
    points: &[[f64; 2]],
    trend: Option<&TrendLine>,
) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(x_label)
        .y_axis_label(y_label)
        .show(ui, |plot_ui| {
            let series: PlotPoints = points.iter().copied().collect();
            plot_ui.points(Points::new(series).name("courses").color(ACCENT).radius(2.5));

            if let Some(t) = trend {
                let line: PlotPoints = vec![
                    [t.x_min, t.slope * t.x_min + t.intercept],
                    [t.x_max, t.slope * t.x_max + t.intercept],
                ]
                .into_iter()
                .collect();
                plot_ui.line(
                    Line::new(line)
                        .name("OLS trend")
                        .color(Color32::LIGHT_RED)
                        .width(2.0),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Donut
// ---------------------------------------------------------------------------

fn pie(ui: &mut Ui, slices: &[PieSlice]) {
    let total: usize = slices.iter().map(|s| s.count).sum();
    if total == 0 {
        ui.label(RichText::new("No observations in range").weak());
        return;
    }

    let colors = color::generate_palette(slices.len());

    let desired = Vec2::new(ui.available_width(), CHART_HEIGHT);
    let (rect, _) = ui.allocate_exact_size(desired, egui::Sense::hover());
    let painter = ui.painter_at(rect);

    let center = rect.center();
    let radius = rect.height().min(rect.width()) * 0.45;
    let hole = radius * 0.3;

    // The ring is tessellated into small convex quads per slice.
    let mut angle = -std::f32::consts::FRAC_PI_2;
    for (slice, &fill) in slices.iter().zip(colors.iter()) {
        let sweep = slice.count as f32 / total as f32 * std::f32::consts::TAU;
        let steps = ((sweep / 0.05).ceil() as usize).max(1);
        for s in 0..steps {
            let a0 = angle + sweep * s as f32 / steps as f32;
            let a1 = angle + sweep * (s + 1) as f32 / steps as f32;
            painter.add(egui::Shape::convex_polygon(
                vec![
                    arc_point(center, hole, a0),
                    arc_point(center, radius, a0),
                    arc_point(center, radius, a1),
                    arc_point(center, hole, a1),
                ],
                fill,
                Stroke::NONE,
            ));
        }
        angle += sweep;
    }

    ui.horizontal(|ui: &mut Ui| {
        for (slice, &fill) in slices.iter().zip(colors.iter()) {
            let share = 100.0 * slice.count as f64 / total as f64;
            ui.label(
                RichText::new(format!("■ {} — {} ({share:.1}%)", slice.label, slice.count))
                    .color(fill),
            );
        }
    });
}

fn arc_point(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    Pos2::new(
        center.x + radius * angle.cos(),
        center.y + radius * angle.sin(),
    )
}

// ---------------------------------------------------------------------------
// Box plot / histogram
// ---------------------------------------------------------------------------

fn box_plot(ui: &mut Ui, id: &str, label: &str, stats: Option<&BoxStats>) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label(label)
        .show_x(false)
        .show(ui, |plot_ui| {
            let Some(b) = stats else {
                return;
            };
            let elem = BoxElem::new(
                0.5,
                BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
            )
            .box_width(0.4)
            .fill(ACCENT.gamma_multiply(0.4))
            .stroke(Stroke::new(1.5, ACCENT));
            plot_ui.box_plot(BoxPlot::new(vec![elem]).name(label));

            if !b.outliers.is_empty() {
                let pts: PlotPoints = b.outliers.iter().map(|&y| [0.5, y]).collect();
                plot_ui.points(Points::new(pts).name("outliers").color(Color32::LIGHT_RED));
            }
        });
}

fn histogram(ui: &mut Ui, id: &str, label: &str, bins: &[Bin]) {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(label)
        .y_axis_label("Count")
        .show(ui, |plot_ui| {
            if bins.is_empty() {
                return;
            }
            let bars: Vec<Bar> = bins
                .iter()
                .map(|b| {
                    Bar::new((b.start + b.end) / 2.0, b.count as f64)
                        .width((b.end - b.start).max(f64::EPSILON) * 0.95)
                })
                .collect();
            plot_ui.bar_chart(BarChart::new(bars).name(label).color(ACCENT));
        });
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

fn heatmap(ui: &mut Ui, labels: &[String], matrix: &[Vec<f64>]) {
    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        egui::Grid::new("heatmap")
            .min_col_width(52.0)
            .show(ui, |ui: &mut Ui| {
                ui.label("");
                for label in labels {
                    ui.label(RichText::new(label).small());
                }
                ui.end_row();

                for (label, row) in labels.iter().zip(matrix.iter()) {
                    ui.label(RichText::new(label).small());
                    for &r in row {
                        let fill = color::correlation_color(r);
                        let text = if r.is_nan() {
                            "–".to_string()
                        } else {
                            format!("{r:.2}")
                        };
                        let fg = if r.is_nan() || r < 0.1 {
                            Color32::WHITE
                        } else {
                            Color32::BLACK
                        };
                        ui.label(RichText::new(text).background_color(fill).color(fg));
                    }
                    ui.end_row();
                }
            });
    });
}
