//! Standalone SVG rendering for [`Chart`] values.

use std::f64::consts::PI;

use crate::chart::{Chart, ChartKind};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 72.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 76.0;
const GRID_LINES: usize = 5;

const PALETTE: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

pub fn render_svg(chart: &Chart) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {WIDTH} {HEIGHT}" width="{WIDTH}" height="{HEIGHT}" font-family="sans-serif" font-size="11">"#
    );
    svg.push_str(&format!(
        r#"<text x="{}" y="24" text-anchor="middle" font-size="15" font-weight="bold">{}</text>"#,
        WIDTH / 2.0,
        escape_xml(&chart.title)
    ));

    match chart.kind {
        ChartKind::Line | ChartKind::Bar => render_axes_chart(chart, &mut svg),
        ChartKind::Pie { start_angle_deg } => render_pie(chart, start_angle_deg, &mut svg),
    }

    svg.push_str("</svg>");
    svg
}

struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    fn for_chart(chart: &Chart) -> Self {
        let values = chart.points.iter().filter_map(|point| point.value);
        let (min, max) = values.fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
        if (max - min).abs() < f64::EPSILON {
            Self { min, max: min + 1.0 }
        } else {
            Self { min, max }
        }
    }

    fn y(&self, value: f64) -> f64 {
        let plot_height = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        MARGIN_TOP + plot_height * (self.max - value) / (self.max - self.min)
    }
}

fn render_axes_chart(chart: &Chart, svg: &mut String) {
    let scale = Scale::for_chart(chart);
    let plot_width = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let bottom = HEIGHT - MARGIN_BOTTOM;
    let slots = chart.points.len().max(1) as f64;
    let slot_width = plot_width / slots;
    let x_center = |idx: usize| MARGIN_LEFT + slot_width * (idx as f64 + 0.5);

    for step in 0..=GRID_LINES {
        let value = scale.min + (scale.max - scale.min) * step as f64 / GRID_LINES as f64;
        let y = scale.y(value);
        svg.push_str(&format!(
            r##"<line x1="{MARGIN_LEFT}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#e0e0e0"/>"##,
            WIDTH - MARGIN_RIGHT
        ));
        svg.push_str(&format!(
            r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0,
            format_tick(value)
        ));
    }

    svg.push_str(&format!(
        r##"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{bottom}" stroke="#333"/>"##
    ));
    let zero = scale.y(0.0);
    svg.push_str(&format!(
        r##"<line x1="{MARGIN_LEFT}" y1="{zero:.1}" x2="{:.1}" y2="{zero:.1}" stroke="#333"/>"##,
        WIDTH - MARGIN_RIGHT
    ));

    match chart.kind {
        ChartKind::Bar => {
            let bar_width = slot_width * 0.7;
            for (idx, point) in chart.points.iter().enumerate() {
                let Some(value) = point.value else { continue };
                let top = scale.y(value.max(0.0));
                let height = (scale.y(value.min(0.0)) - top).max(0.0);
                svg.push_str(&format!(
                    r#"<rect x="{:.1}" y="{top:.1}" width="{bar_width:.1}" height="{height:.1}" fill="{}"><title>{}: {}</title></rect>"#,
                    x_center(idx) - bar_width / 2.0,
                    PALETTE[0],
                    escape_xml(&point.label),
                    format_tick(value)
                ));
            }
        }
        _ => {
            let coords: Vec<(f64, f64)> = chart
                .points
                .iter()
                .enumerate()
                .filter_map(|(idx, point)| point.value.map(|v| (x_center(idx), scale.y(v))))
                .collect();
            let path: Vec<String> = coords
                .iter()
                .map(|(x, y)| format!("{x:.1},{y:.1}"))
                .collect();
            svg.push_str(&format!(
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                path.join(" "),
                PALETTE[0]
            ));
            for (x, y) in coords {
                svg.push_str(&format!(
                    r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="{}"/>"#,
                    PALETTE[0]
                ));
            }
        }
    }

    let rotate = chart.points.len() > 6;
    for (idx, point) in chart.points.iter().enumerate() {
        let x = x_center(idx);
        let y = bottom + 16.0;
        if rotate {
            svg.push_str(&format!(
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="end" transform="rotate(-35 {x:.1} {y:.1})">{}</text>"#,
                escape_xml(&point.label)
            ));
        } else {
            svg.push_str(&format!(
                r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle">{}</text>"#,
                escape_xml(&point.label)
            ));
        }
    }

    svg.push_str(&format!(
        r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="12">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        HEIGHT - 8.0,
        escape_xml(&chart.x_label)
    ));
    svg.push_str(&format!(
        r#"<text x="16" y="{:.1}" text-anchor="middle" font-size="12" transform="rotate(-90 16 {:.1})">{}</text>"#,
        MARGIN_TOP + (bottom - MARGIN_TOP) / 2.0,
        MARGIN_TOP + (bottom - MARGIN_TOP) / 2.0,
        escape_xml(&chart.y_label)
    ));
}

fn render_pie(chart: &Chart, start_angle_deg: f64, svg: &mut String) {
    let cx = WIDTH / 2.0;
    let cy = HEIGHT / 2.0 + 12.0;
    let radius = 120.0;
    let point_at = |angle: f64, r: f64| (cx + r * angle.cos(), cy - r * angle.sin());

    let mut angle = start_angle_deg.to_radians();
    for (idx, share) in chart.shares().iter().enumerate() {
        let color = PALETTE[idx % PALETTE.len()];
        let sweep = share.fraction * 2.0 * PI;
        let end = angle + sweep;

        if share.fraction >= 0.9999 {
            svg.push_str(&format!(
                r#"<circle cx="{cx:.1}" cy="{cy:.1}" r="{radius:.1}" fill="{color}"/>"#
            ));
        } else if share.fraction > 0.0 {
            let (x0, y0) = point_at(angle, radius);
            let (x1, y1) = point_at(end, radius);
            let large_arc = u8::from(sweep > PI);
            svg.push_str(&format!(
                r#"<path d="M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {radius} {radius} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{color}" stroke="white"/>"#
            ));
        }

        let middle = angle + sweep / 2.0;
        let (px, py) = point_at(middle, radius * 0.6);
        svg.push_str(&format!(
            r#"<text x="{px:.1}" y="{py:.1}" text-anchor="middle" fill="white">{}</text>"#,
            share.percent_label
        ));
        let (lx, ly) = point_at(middle, radius * 1.15);
        let anchor = if middle.cos() < 0.0 { "end" } else { "start" };
        svg.push_str(&format!(
            r#"<text x="{lx:.1}" y="{ly:.1}" text-anchor="{anchor}">{}</text>"#,
            escape_xml(&share.label)
        ));

        angle = end;
    }
}

fn format_tick(value: f64) -> String {
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{:.1}k", value / 1_000.0)
    } else {
        format!("{value:.0}")
    }
}

pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}
