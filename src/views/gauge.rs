//! Risk gauge - 0..100 semicircle with four fixed bands

use std::fmt::Write;

use crate::logic::model::inference::{RISK_MAX, RISK_MIN};

/// (from, to, colour)
pub const GAUGE_BANDS: [(f64, f64, &str); 4] = [
    (0.0, 25.0, "green"),
    (25.0, 50.0, "yellow"),
    (50.0, 75.0, "orange"),
    (75.0, 100.0, "red"),
];

const CX: f64 = 150.0;
const CY: f64 = 150.0;
const RADIUS: f64 = 110.0;

fn point(value: f64, radius: f64) -> (f64, f64) {
    let fraction = (value.clamp(RISK_MIN, RISK_MAX) - RISK_MIN) / (RISK_MAX - RISK_MIN);
    let angle = std::f64::consts::PI * (1.0 - fraction);
    (CX + radius * angle.cos(), CY - radius * angle.sin())
}

pub fn render_gauge(score: f64) -> String {
    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg class="gauge" viewBox="0 0 300 180" role="img" aria-label="Risk score {score:.1}">"#
    );

    for (from, to, color) in GAUGE_BANDS {
        let (x0, y0) = point(from, RADIUS);
        let (x1, y1) = point(to, RADIUS);
        let _ = write!(
            svg,
            r#"<path d="M {x0:.2} {y0:.2} A {RADIUS} {RADIUS} 0 0 1 {x1:.2} {y1:.2}" stroke="{color}" stroke-width="28" fill="none"/>"#
        );
    }

    let (nx, ny) = point(score, RADIUS - 22.0);
    let _ = write!(
        svg,
        r#"<line x1="{CX}" y1="{CY}" x2="{nx:.2}" y2="{ny:.2}" stroke="white" stroke-width="4" stroke-linecap="round"/>"#
    );
    let _ = write!(
        svg,
        r#"<circle cx="{CX}" cy="{CY}" r="7" fill="white"/><text x="{CX}" y="{ty}" text-anchor="middle" class="gauge-value">{score:.1}</text><text x="{CX}" y="20" text-anchor="middle" class="gauge-title">Risk Score</text></svg>"#,
        ty = CY + 28.0
    );

    svg
}
