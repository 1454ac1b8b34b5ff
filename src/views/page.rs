//! Dashboard page

use std::fmt::Write;

use super::escape;
use super::gauge::render_gauge;
use super::panels::{batch_table, importance_chart, outage_panel, severity_panel};
use crate::constants::APP_NAME;
use crate::logic::batch::BatchRecord;
use crate::logic::features::{FeatureVector, FeatureWeighting, FEATURES};
use crate::logic::importance::FeatureImportance;
use crate::logic::model::PredictionResult;

/// Controls per column on the input panel
const CONTROLS_PER_COLUMN: usize = 5;

/// Everything one render needs; built fresh per request
pub struct DashboardView<'a> {
    pub inputs: &'a FeatureVector,
    pub single: Option<&'a PredictionResult>,
    pub batch: Option<&'a [BatchRecord]>,
    pub importance: &'a [FeatureImportance],
    pub error: Option<&'a str>,
    pub weighting: FeatureWeighting,
}

const STYLE: &str = r#"
body { background-color: #0A1F44; color: white; font-family: system-ui, sans-serif; margin: 0; }
main { max-width: 1280px; margin: 0 auto; padding: 2rem; }
h1 { margin-bottom: 0.2rem; }
.subtitle { opacity: 0.8; margin-top: 0; }
.grid { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1.5rem; }
.control { display: flex; flex-direction: column; margin-bottom: 1rem; }
.control label { font-weight: 500; margin-bottom: 0.3rem; }
.control output { font-variant-numeric: tabular-nums; }
.actions { display: flex; justify-content: center; margin: 1rem 0 2rem; }
button { background-color: #002B5B; color: white; border-radius: 8px; height: 3em; font-weight: bold; border: none; width: 50%; cursor: pointer; }
button:active { background-color: #001B3A; }
.panel { padding: 20px; border-radius: 10px; text-align: center; font-weight: bold; color: white; }
.severity { font-size: 20px; }
.outage { background-color: #001F3F; font-size: 18px; }
.gauge { width: 100%; max-width: 360px; }
.gauge-value { fill: white; font-size: 28px; font-weight: bold; }
.gauge-title { fill: white; font-size: 16px; }
.error { background-color: #8B0000; padding: 1rem; border-radius: 8px; margin-bottom: 1rem; }
.success { background-color: #1E5631; padding: 0.8rem; border-radius: 8px; margin-top: 1rem; }
.table-wrap { overflow-x: auto; }
table.batch { border-collapse: collapse; width: 100%; font-size: 13px; }
table.batch th, table.batch td { border: 1px solid #34507a; padding: 4px 6px; text-align: right; }
.chart { max-width: 720px; }
.bar-row { display: grid; grid-template-columns: 140px 1fr 60px; align-items: center; gap: 0.5rem; margin: 4px 0; }
.bar-track { background: #13305f; border-radius: 4px; height: 18px; }
.bar { background: #4FC3F7; height: 18px; border-radius: 4px; }
.hint { opacity: 0.75; font-size: 0.9rem; }
a { color: #4FC3F7; }
"#;

fn input_panel(html: &mut String, inputs: &FeatureVector) {
    html.push_str(r#"<h2>Operational KPI Controls</h2><form method="post" action="/predict"><div class="grid">"#);

    for column in FEATURES.chunks(CONTROLS_PER_COLUMN) {
        html.push_str("<div>");
        for spec in column {
            let value = inputs.get_by_name(spec.name).unwrap_or(spec.default);
            let _ = write!(
                html,
                r#"<div class="control"><label for="{name}">{label}</label><input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="{step}" value="{value}" oninput="this.nextElementSibling.value=this.value"><output>{value}</output></div>"#,
                name = spec.name,
                label = escape(spec.label),
                min = spec.min,
                max = spec.max,
                step = spec.step,
            );
        }
        html.push_str("</div>");
    }

    html.push_str(r#"</div><div class="actions"><button type="submit">Run AI Prediction</button></div></form>"#);
}

fn results(html: &mut String, result: &PredictionResult) {
    html.push_str(r#"<h2>Prediction Results</h2><div class="grid">"#);
    let _ = write!(html, "<div>{}</div>", render_gauge(result.risk_score));
    let _ = write!(html, "<div>{}</div>", severity_panel(result));
    let _ = write!(html, "<div>{}</div>", outage_panel(result));
    html.push_str(r#"</div><div class="success">AI Prediction Completed Successfully</div>"#);
}

fn batch_section(html: &mut String, batch: Option<&[BatchRecord]>) {
    html.push_str(
        r#"<h2>Batch Prediction</h2><form method="post" action="/batch" enctype="multipart/form-data"><input type="file" name="file" accept=".csv,text/csv" required> <button type="submit" style="width:auto;padding:0 2em">Upload &amp; Predict</button></form><p class="hint">Upload a CSV (typically 10&ndash;15 rows) whose header is exactly the 15 column names in order. <a href="/api/v1/template.csv">Download template</a>.</p>"#,
    );

    if let Some(records) = batch {
        let _ = write!(html, "<p>{} rows processed</p>", records.len());
        html.push_str(&batch_table(records));
    }
}

pub fn render_dashboard(view: &DashboardView<'_>) -> String {
    let mut html = String::with_capacity(16 * 1024);

    let _ = write!(
        html,
        r#"<!DOCTYPE html><html lang="en"><head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1"><title>{title}</title><style>{STYLE}</style></head><body><main>"#,
        title = escape(APP_NAME),
    );
    html.push_str(
        "<h1>AI-Based System Outage Intelligence</h1><p class=\"subtitle\">Maritime | Offshore | Gas Pipeline Predictive Risk Dashboard</p>",
    );

    if let Some(error) = view.error {
        let _ = write!(html, r#"<div class="error">{}</div>"#, escape(error));
    }

    input_panel(&mut html, view.inputs);

    if let Some(result) = view.single {
        results(&mut html, result);
    }

    batch_section(&mut html, view.batch);

    html.push_str("<h2>Top Feature Importance</h2>");
    html.push_str(&importance_chart(view.importance));

    if view.weighting == FeatureWeighting::Legacy {
        html.push_str(
            r#"<p class="hint">Legacy weighting active: Maintenance Overdue ×2.3, Equipment Age ×2.0 before scaling.</p>"#,
        );
    }

    html.push_str("</main></body></html>");
    html
}
