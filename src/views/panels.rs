//! Result panels - severity, outage type, batch table, importance chart

use std::fmt::Write;

use super::escape;
use crate::logic::batch::{output_columns, BatchRecord};
use crate::logic::importance::FeatureImportance;
use crate::logic::model::PredictionResult;

pub fn severity_panel(result: &PredictionResult) -> String {
    let severity = result.severity;
    format!(
        r#"<div class="panel severity" style="background-color:{bg}">{icon} SEVERITY: {label}</div>"#,
        bg = severity.color(),
        icon = severity.icon(),
        label = escape(&result.severity_label),
    )
}

pub fn outage_panel(result: &PredictionResult) -> String {
    format!(
        r#"<div class="panel outage">Predicted Outage Type<br><br>{}</div>"#,
        escape(&result.outage_type)
    )
}

/// Augmented batch table, severity cell coloured per row
pub fn batch_table(records: &[BatchRecord]) -> String {
    let mut html = String::from(r#"<div class="table-wrap"><table class="batch"><thead><tr>"#);
    for column in output_columns() {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr></thead><tbody>");

    for record in records {
        html.push_str("<tr>");
        for value in record.values {
            let _ = write!(html, "<td>{}</td>", value);
        }
        let p = &record.prediction;
        let _ = write!(
            html,
            r#"<td>{:.2}</td><td style="background-color:{};color:white;font-weight:bold">{} {}</td><td>{}</td>"#,
            p.risk_score,
            p.severity.color(),
            p.severity.icon(),
            escape(&p.severity_label),
            escape(&p.outage_type),
        );
        html.push_str("</tr>");
    }

    html.push_str("</tbody></table></div>");
    html
}

/// Horizontal bars scaled to the largest importance
pub fn importance_chart(features: &[FeatureImportance]) -> String {
    let max = features
        .iter()
        .map(|f| f.importance)
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);

    let mut html = String::from(r#"<div class="chart">"#);
    for feature in features {
        let width = if max > 0.0 && feature.importance.is_finite() {
            (feature.importance / max * 100.0).max(0.0)
        } else {
            0.0
        };
        let _ = write!(
            html,
            r#"<div class="bar-row"><span class="bar-label">{name}</span><div class="bar-track"><div class="bar" style="width:{width:.1}%"></div></div><span class="bar-value">{value:.3}</span></div>"#,
            name = escape(&feature.name),
            value = feature.importance,
        );
    }
    html.push_str("</div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::severity::Severity;

    fn result(label: &str, outage: &str) -> PredictionResult {
        PredictionResult {
            risk_score: 61.5,
            raw_risk_score: 61.5,
            severity: Severity::from_label(label),
            severity_label: label.to_string(),
            outage_type: outage.to_string(),
        }
    }

    #[test]
    fn test_severity_panel_uses_lookup() {
        let html = severity_panel(&result("HIGH", "Pipeline Leak"));
        assert!(html.contains("#FF4B4B"));
        assert!(html.contains("SEVERITY: HIGH"));

        let html = severity_panel(&result("Catastrophic", "Pipeline Leak"));
        assert!(html.contains("#1E90FF"));
    }

    #[test]
    fn test_panel_background_per_severity() {
        let table = [
            (["HIGH", "high", "High"], "#FF4B4B"),
            (["MEDIUM", "medium", "Medium"], "#FFA500"),
            (["LOW", "low", "Low"], "#E6C200"),
            (["NORMAL", "normal", "Normal"], "#2E8B57"),
        ];
        for (labels, hex) in table {
            for label in labels {
                let expected = format!("background-color:{hex}");
                assert!(severity_panel(&result(label, "Pipeline Leak")).contains(&expected));

                let record = BatchRecord {
                    values: [0.0; 15],
                    prediction: result(label, "Pipeline Leak"),
                };
                assert!(batch_table(&[record]).contains(&expected));
            }
        }
    }

    #[test]
    fn test_labels_are_escaped() {
        let html = outage_panel(&result("Low", "<script>x</script>"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_batch_table_rows() {
        let records = vec![
            BatchRecord {
                values: [1.0; 15],
                prediction: result("Medium", "Electrical Fault"),
            };
            3
        ];
        let html = batch_table(&records);
        assert_eq!(html.matches("<tr>").count(), 4);
        assert!(html.contains("<th>Outage_Type</th>"));
        assert!(html.contains("#FFA500"));
    }

    #[test]
    fn test_chart_scales_to_max() {
        let features = vec![
            FeatureImportance { name: "GasLeak".to_string(), importance: 0.4 },
            FeatureImportance { name: "Age".to_string(), importance: 0.1 },
        ];
        let html = importance_chart(&features);
        assert!(html.contains("width:100.0%"));
        assert!(html.contains("width:25.0%"));
    }
}
