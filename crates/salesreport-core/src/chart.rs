use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartKind {
    Line,
    Bar,
    /// Wedges run counter-clockwise from `start_angle_deg` (0° = three o'clock).
    Pie { start_angle_deg: f64 },
}

/// One category on a chart. A `None` value keeps the slot but draws nothing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Option<f64>,
}

impl ChartPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value: Some(value),
        }
    }

    pub fn empty(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieShare {
    pub label: String,
    pub value: f64,
    pub fraction: f64,
    pub percent_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub points: Vec<ChartPoint>,
}

impl Chart {
    pub fn line(title: &str, x_label: &str, y_label: &str, points: Vec<ChartPoint>) -> Self {
        Self {
            kind: ChartKind::Line,
            title: title.to_string(),
            x_label: x_label.to_string(),
            y_label: y_label.to_string(),
            points,
        }
    }

    pub fn bar(title: &str, x_label: &str, y_label: &str, points: Vec<ChartPoint>) -> Self {
        Self {
            kind: ChartKind::Bar,
            ..Self::line(title, x_label, y_label, points)
        }
    }

    pub fn pie(title: &str, start_angle_deg: f64, points: Vec<ChartPoint>) -> Self {
        Self {
            kind: ChartKind::Pie { start_angle_deg },
            ..Self::line(title, "", "", points)
        }
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|point| point.label.as_str()).collect()
    }

    pub fn value_of(&self, label: &str) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.label == label)
            .and_then(|point| point.value)
    }

    /// Each point's share of the total, labelled with one decimal (`33.3%`).
    pub fn shares(&self) -> Vec<PieShare> {
        let total: f64 = self.points.iter().filter_map(|point| point.value).sum();
        self.points
            .iter()
            .filter_map(|point| point.value.map(|value| (point, value)))
            .map(|(point, value)| {
                let fraction = if total > 0.0 { value / total } else { 0.0 };
                PieShare {
                    label: point.label.clone(),
                    value,
                    fraction,
                    percent_label: format!("{:.1}%", fraction * 100.0),
                }
            })
            .collect()
    }
}
