//! Chart rendering for `POST /visualize`.
//!
//! [`ChartRenderer`] turns validated [`ChartData`] into encoded image bytes.
//! The bundled [`SvgRenderer`] writes self-contained SVG documents.

use std::f64::consts::PI;
use std::fmt::Write as _;

use sfmcp_core::error::CoreError;
use sfmcp_core::visualization::{ChartData, FORMAT_SVG};

/// Structured chart data in, encoded image out.
pub trait ChartRenderer: Send + Sync {
    /// Output format tag, e.g. `"svg"`.
    fn format(&self) -> &'static str;

    fn render(&self, chart: &ChartData) -> Result<Vec<u8>, CoreError>;
}

const DEFAULT_WIDTH: f64 = 800.0;
const DEFAULT_HEIGHT: f64 = 600.0;
const MARGIN: f64 = 60.0;

const PALETTE: [&str; 8] = [
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
];

pub struct SvgRenderer {
    width: f64,
    height: f64,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl Default for SvgRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for SvgRenderer {
    fn format(&self) -> &'static str {
        FORMAT_SVG
    }

    fn render(&self, chart: &ChartData) -> Result<Vec<u8>, CoreError> {
        let mut svg = String::new();
        let w = self.width;
        let h = self.height;
        write!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif" font-size="12">"#
        )
        .map_err(fmt_err)?;
        write!(svg, r##"<rect width="100%" height="100%" fill="#ffffff"/>"##).map_err(fmt_err)?;

        match chart {
            ChartData::Network { nodes, edges } => self.network(&mut svg, nodes, edges)?,
            ChartData::Temporal { events } => self.temporal(&mut svg, events)?,
            ChartData::Comparative { series } => self.comparative(&mut svg, series)?,
        }

        svg.push_str("</svg>");
        Ok(svg.into_bytes())
    }
}

fn fmt_err(e: std::fmt::Error) -> CoreError {
    CoreError::Internal(format!("SVG rendering failed: {e}"))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

impl SvgRenderer {
    /// Nodes on a circle, edges as straight lines, colour by group.
    fn network(
        &self,
        svg: &mut String,
        nodes: &[sfmcp_core::visualization::NetworkNode],
        edges: &[sfmcp_core::visualization::NetworkEdge],
    ) -> Result<(), CoreError> {
        let cx = self.width / 2.0;
        let cy = self.height / 2.0;
        let radius = (self.width.min(self.height) / 2.0) - MARGIN;

        let mut groups: Vec<&str> = Vec::new();
        let positions: Vec<(&str, f64, f64)> = nodes
            .iter()
            .enumerate()
            .map(|(i, n)| {
                let angle = 2.0 * PI * i as f64 / nodes.len() as f64;
                (n.id.as_str(), cx + radius * angle.cos(), cy + radius * angle.sin())
            })
            .collect();
        let position = |id: &str| positions.iter().find(|(n, _, _)| *n == id).map(|(_, x, y)| (*x, *y));

        for edge in edges {
            if let (Some((x1, y1)), Some((x2, y2))) = (position(&edge.source), position(&edge.target)) {
                let stroke = edge.weight.unwrap_or(1.0).clamp(0.5, 8.0);
                write!(
                    svg,
                    r##"<line x1="{x1:.1}" y1="{y1:.1}" x2="{x2:.1}" y2="{y2:.1}" stroke="#999999" stroke-width="{stroke:.1}"/>"##
                )
                .map_err(fmt_err)?;
            }
        }

        for (node, (_, x, y)) in nodes.iter().zip(&positions) {
            let group = node.group.as_deref().unwrap_or("");
            let index = match groups.iter().position(|g| *g == group) {
                Some(i) => i,
                None => {
                    groups.push(group);
                    groups.len() - 1
                }
            };
            let fill = PALETTE[index % PALETTE.len()];
            let label = escape(node.label.as_deref().unwrap_or(&node.id));
            write!(
                svg,
                r#"<circle cx="{x:.1}" cy="{y:.1}" r="12" fill="{fill}"/><text x="{x:.1}" y="{ty:.1}" text-anchor="middle">{label}</text>"#,
                ty = y - 16.0
            )
            .map_err(fmt_err)?;
        }
        Ok(())
    }

    /// Events along a year axis; `value` sets the marker height.
    fn temporal(
        &self,
        svg: &mut String,
        events: &[sfmcp_core::visualization::TimelineEvent],
    ) -> Result<(), CoreError> {
        let mut sorted: Vec<_> = events.iter().collect();
        sorted.sort_by_key(|e| e.year);

        let first = sorted.first().map(|e| f64::from(e.year)).unwrap_or(0.0);
        let last = sorted.last().map(|e| f64::from(e.year)).unwrap_or(0.0);
        let span = (last - first).max(1.0);
        let max_value = sorted
            .iter()
            .filter_map(|e| e.value)
            .fold(1.0_f64, f64::max);

        let axis_y = self.height - MARGIN;
        let plot_w = self.width - 2.0 * MARGIN;
        let plot_h = self.height - 2.0 * MARGIN;

        write!(
            svg,
            r##"<line x1="{MARGIN}" y1="{axis_y}" x2="{x2}" y2="{axis_y}" stroke="#333333"/>"##,
            x2 = self.width - MARGIN
        )
        .map_err(fmt_err)?;

        for (i, event) in sorted.iter().enumerate() {
            let x = MARGIN + plot_w * (f64::from(event.year) - first) / span;
            let height = event.value.map(|v| plot_h * v / max_value).unwrap_or(plot_h / 4.0);
            let fill = PALETTE[i % PALETTE.len()];
            write!(
                svg,
                r#"<line x1="{x:.1}" y1="{axis_y}" x2="{x:.1}" y2="{top:.1}" stroke="{fill}" stroke-width="3"/><circle cx="{x:.1}" cy="{top:.1}" r="5" fill="{fill}"/><text x="{x:.1}" y="{label_y:.1}" text-anchor="middle">{label}</text><text x="{x:.1}" y="{year_y:.1}" text-anchor="middle">{year}</text>"#,
                top = axis_y - height,
                label_y = axis_y - height - 10.0,
                year_y = axis_y + 18.0,
                label = escape(&event.label),
                year = event.year,
            )
            .map_err(fmt_err)?;
        }
        Ok(())
    }

    /// Horizontal bars, one per series entry.
    fn comparative(
        &self,
        svg: &mut String,
        series: &[sfmcp_core::visualization::SeriesEntry],
    ) -> Result<(), CoreError> {
        let max_value = series.iter().map(|s| s.value.abs()).fold(0.0_f64, f64::max);
        let max_value = if max_value > 0.0 { max_value } else { 1.0 };
        let label_w = 160.0;
        let plot_w = self.width - 2.0 * MARGIN - label_w;
        let row_h = ((self.height - 2.0 * MARGIN) / series.len() as f64).min(40.0);

        for (i, entry) in series.iter().enumerate() {
            let y = MARGIN + row_h * i as f64;
            let bar_w = plot_w * entry.value.abs() / max_value;
            let fill = PALETTE[i % PALETTE.len()];
            write!(
                svg,
                r#"<text x="{tx:.1}" y="{ty:.1}" text-anchor="end">{name}</text><rect x="{bx:.1}" y="{y:.1}" width="{bar_w:.1}" height="{bh:.1}" fill="{fill}"/><text x="{vx:.1}" y="{ty:.1}">{value}</text>"#,
                tx = MARGIN + label_w - 8.0,
                ty = y + row_h * 0.6,
                bx = MARGIN + label_w,
                bh = row_h * 0.8,
                vx = MARGIN + label_w + bar_w + 6.0,
                name = escape(&entry.name),
                value = entry.value,
            )
            .map_err(fmt_err)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sfmcp_core::visualization::{NetworkEdge, NetworkNode, SeriesEntry, TimelineEvent};

    fn render(chart: ChartData) -> String {
        String::from_utf8(SvgRenderer::new().render(&chart).unwrap()).unwrap()
    }

    #[test]
    fn network_draws_nodes_and_edges() {
        let svg = render(ChartData::Network {
            nodes: vec![
                NetworkNode { id: "paul".into(), label: Some("Paul".into()), group: None },
                NetworkNode { id: "jessica".into(), label: None, group: Some("bg".into()) },
            ],
            edges: vec![NetworkEdge { source: "paul".into(), target: "jessica".into(), weight: Some(2.0) }],
        });
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<circle").count(), 2);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains(">Paul<"));
        assert!(svg.contains(">jessica<"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = render(ChartData::Comparative {
            series: vec![SeriesEntry { name: "Tom & <Jerry>".into(), value: 3.0 }],
        });
        assert!(svg.contains("Tom &amp; &lt;Jerry&gt;"));
    }

    #[test]
    fn temporal_orders_events_by_year() {
        let svg = render(ChartData::Temporal {
            events: vec![
                TimelineEvent { year: 1984, label: "Neuromancer".into(), value: None },
                TimelineEvent { year: 1965, label: "Dune".into(), value: Some(5.0) },
            ],
        });
        let dune = svg.find(">Dune<").unwrap();
        let neuromancer = svg.find(">Neuromancer<").unwrap();
        assert!(dune < neuromancer);
    }

    #[test]
    fn temporal_handles_full_year_range() {
        let svg = render(ChartData::Temporal {
            events: vec![
                TimelineEvent { year: i32::MIN, label: "Big Bang".into(), value: None },
                TimelineEvent { year: i32::MAX, label: "Heat death".into(), value: None },
            ],
        });
        assert!(svg.contains(r#"<circle cx="60.0""#));
        assert!(svg.contains(&format!(">{}<", i32::MAX)));
        assert!(!svg.contains("NaN"));
    }
}
