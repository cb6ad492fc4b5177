use std::collections::BTreeMap;
use std::f32::consts::TAU;

use egui::epaint::PathShape;
use egui::{pos2, vec2, Color32, FontId, Pos2, Rect, Sense, Stroke, Ui};

use crate::layers::feature::Business;

/// Palette reused across both chart kinds, cycled when there are more
/// buckets than colors.
const COLORS: [Color32; 8] = [
    Color32::from_rgb(0x4c, 0xaf, 0x50),
    Color32::from_rgb(0x21, 0x96, 0xf3),
    Color32::from_rgb(0xff, 0xc1, 0x07),
    Color32::from_rgb(0xff, 0x57, 0x22),
    Color32::from_rgb(0x9c, 0x27, 0xb0),
    Color32::from_rgb(0x60, 0x7d, 0x8b),
    Color32::from_rgb(0x00, 0xbc, 0xd4),
    Color32::from_rgb(0x8b, 0xc3, 0x4a),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ChartKind {
    Pie,
    Bar,
}

impl ChartKind {
    pub fn toggled(self) -> Self {
        match self {
            ChartKind::Pie => ChartKind::Bar,
            ChartKind::Bar => ChartKind::Pie,
        }
    }

    /// Label for the toggle button, naming the kind you would switch to.
    pub fn toggle_label(self) -> &'static str {
        match self {
            ChartKind::Pie => "Switch to bar chart",
            ChartKind::Bar => "Switch to pie chart",
        }
    }
}

/// Count rendered businesses per lowercased kind; records without a kind go
/// into the `default` bucket. BTreeMap keeps bucket order stable between
/// repaints.
pub fn count_by_kind(businesses: &[Business]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for business in businesses {
        let bucket = business
            .kind
            .clone()
            .unwrap_or_else(|| "default".to_string());
        *counts.entry(bucket).or_insert(0) += 1;
    }
    counts
}

/// Tooltip percentage: `round(count / total * 100)`.
pub fn percentage(count: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (count as f64 / total as f64 * 100.0).round() as u32
    }
}

/// Human bucket label: first letter capitalised, underscores to spaces.
pub fn bucket_label(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().replace('_', " "),
        None => String::new(),
    }
}

fn tooltip_text(label: &str, count: usize, total: usize) -> String {
    format!("{label}: {count} ({}%)", percentage(count, total))
}

/// Draw the chart for the current counts. Immediate mode: the whole chart is
/// rebuilt from `counts` every frame, so no stale chart instance can leak.
pub fn draw(ui: &mut Ui, kind: ChartKind, counts: &BTreeMap<String, usize>) {
    let total: usize = counts.values().sum();
    if total == 0 {
        ui.weak("No businesses to chart");
        return;
    }
    match kind {
        ChartKind::Pie => draw_pie(ui, counts, total),
        ChartKind::Bar => draw_bars(ui, counts, total),
    }
}

fn draw_pie(ui: &mut Ui, counts: &BTreeMap<String, usize>, total: usize) {
    let (rect, response) = ui.allocate_exact_size(vec2(ui.available_width(), 170.0), Sense::hover());
    let painter = ui.painter_at(rect);

    let radius = (rect.height() / 2.0 - 8.0).min(rect.width() / 3.0);
    let center = pos2(rect.left() + radius + 8.0, rect.center().y);

    let mut start_angle = 0.0f32;
    let mut legend_y = rect.top() + 4.0;
    let hover = response.hover_pos();

    for (i, (bucket, &count)) in counts.iter().enumerate() {
        let sweep = count as f32 / total as f32 * TAU;
        let color = COLORS[i % COLORS.len()];
        let label = bucket_label(bucket);

        let steps = (sweep / 0.1).ceil().max(2.0) as usize;
        let mut points: Vec<Pos2> = vec![center];
        for step in 0..=steps {
            let angle = start_angle + sweep * step as f32 / steps as f32;
            points.push(center + vec2(angle.cos(), angle.sin()) * radius);
        }
        painter.add(PathShape::convex_polygon(
            points,
            color,
            Stroke::new(1.0, ui.visuals().window_fill),
        ));

        // Legend on the right, pie-only in the original.
        let swatch = Rect::from_min_size(pos2(center.x + radius + 14.0, legend_y), vec2(10.0, 10.0));
        painter.rect_filled(swatch, 2.0, color);
        painter.text(
            pos2(swatch.right() + 4.0, swatch.center().y),
            egui::Align2::LEFT_CENTER,
            format!("{label} ({count})"),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
        legend_y += 16.0;

        if let Some(pos) = hover {
            let offset = pos - center;
            let dist = offset.length();
            let mut angle = offset.y.atan2(offset.x);
            if angle < 0.0 {
                angle += TAU;
            }
            if dist <= radius && angle >= start_angle && angle < start_angle + sweep {
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    response.id.with(i),
                    |ui| {
                        ui.label(tooltip_text(&label, count, total));
                    },
                );
            }
        }

        start_angle += sweep;
    }
}

fn draw_bars(ui: &mut Ui, counts: &BTreeMap<String, usize>, total: usize) {
    let row_height = 20.0;
    let height = counts.len() as f32 * row_height + 8.0;
    let (rect, response) = ui.allocate_exact_size(vec2(ui.available_width(), height), Sense::hover());
    let painter = ui.painter_at(rect);

    let max_count = counts.values().copied().max().unwrap_or(1) as f32;
    let label_width = 90.0;
    let bar_span = (rect.width() - label_width - 30.0).max(10.0);
    let hover = response.hover_pos();

    for (i, (bucket, &count)) in counts.iter().enumerate() {
        let color = COLORS[i % COLORS.len()];
        let label = bucket_label(bucket);
        let top = rect.top() + 4.0 + i as f32 * row_height;
        let bar = Rect::from_min_size(
            pos2(rect.left() + label_width, top + 3.0),
            vec2(bar_span * count as f32 / max_count, row_height - 6.0),
        );

        painter.text(
            pos2(rect.left() + label_width - 6.0, bar.center().y),
            egui::Align2::RIGHT_CENTER,
            &label,
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );
        painter.rect_filled(bar, 2.0, color);
        painter.text(
            pos2(bar.right() + 4.0, bar.center().y),
            egui::Align2::LEFT_CENTER,
            count.to_string(),
            FontId::proportional(12.0),
            ui.visuals().text_color(),
        );

        if let Some(pos) = hover {
            let row = Rect::from_min_size(
                pos2(rect.left(), top),
                vec2(rect.width(), row_height),
            );
            if row.contains(pos) {
                egui::show_tooltip_at_pointer(
                    ui.ctx(),
                    ui.layer_id(),
                    response.id.with(i),
                    |ui| {
                        ui.label(tooltip_text(&label, count, total));
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Point;

    fn business(id: i64, kind: Option<&str>) -> Business {
        Business {
            id,
            name: format!("b{id}"),
            kind: kind.map(|k| k.to_string()),
            location: Point::new(-79.417, 43.7803),
        }
    }

    #[test]
    fn counts_sum_to_feature_count() {
        let businesses = vec![
            business(1, Some("bank")),
            business(2, Some("bank")),
            business(3, Some("store")),
            business(4, None),
        ];
        let counts = count_by_kind(&businesses);
        assert_eq!(counts.values().sum::<usize>(), businesses.len());
        assert_eq!(counts.get("bank"), Some(&2));
        assert_eq!(counts.get("store"), Some(&1));
        assert_eq!(counts.get("default"), Some(&1));
    }

    #[test]
    fn filtered_bank_scenario() {
        // Filter admits only "bank": the cafe never reaches the rendered
        // layer, so the chart shows a single bucket with count 2.
        use crate::layers::feature::{parse_businesses, tests::business_collection};
        use std::collections::HashSet;

        let collection = business_collection(&[
            (1, "First National", Some("bank"), -79.41, 43.78),
            (2, "Second National", Some("bank"), -79.42, 43.78),
            (3, "Corner Cafe", Some("cafe"), -79.43, 43.78),
        ]);
        let filter: HashSet<String> = ["bank".to_string()].into_iter().collect();
        let rendered = parse_businesses(collection, &filter);
        let counts = count_by_kind(&rendered);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts.get("bank"), Some(&2));
        assert_eq!(bucket_label("bank"), "Bank");
    }

    #[test]
    fn percentages_round_and_roughly_sum_to_hundred() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(0, 0), 0);
        let total: u32 = [1, 1, 1].iter().map(|&c| percentage(c, 3)).sum();
        assert!((99..=101).contains(&total));
    }

    #[test]
    fn bucket_labels() {
        assert_eq!(bucket_label("print_shop"), "Print shop");
        assert_eq!(bucket_label("bank"), "Bank");
        assert_eq!(bucket_label(""), "");
    }

    #[test]
    fn chart_kind_toggles() {
        assert_eq!(ChartKind::Pie.toggled(), ChartKind::Bar);
        assert_eq!(ChartKind::Bar.toggled(), ChartKind::Pie);
    }
}
