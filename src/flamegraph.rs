//! Flame graph SVG painter.
//!
//! Paints the bars of a [`Session`] into a standalone SVG document with a
//! dark theme. Labels are clipped to their bar and every bar carries a
//! native `<title>` tooltip.
//!
//! # Example
//!
//! ```
//! use flamelevel::collapsed::{parse_collapsed, stacks_to_tree};
//! use flamelevel::config::{LayoutConfig, RenderConfig};
//! use flamelevel::flamegraph::generate_flamegraph;
//! use flamelevel::levels::flatten;
//! use flamelevel::session::Session;
//!
//! let stacks = parse_collapsed("main;foo;bar 100\nmain;foo;baz 50\n").unwrap();
//! let levels = flatten(&stacks_to_tree(&stacks).unwrap()).unwrap();
//! let session = Session::new(levels, None, LayoutConfig::default());
//!
//! let svg = generate_flamegraph(&session, &RenderConfig::default(), None);
//! assert!(svg.contains("foo"));
//! ```

use crate::config::RenderConfig;
use crate::layout::RenderedBar;
use crate::session::Session;
use crate::units::{TooltipData, format_samples};

const HEADER_HEIGHT: f64 = 52.0;

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Generate a flame graph SVG document for the session's current viewport
/// and query.
pub fn generate_flamegraph(session: &Session, config: &RenderConfig, subtitle: Option<&str>) -> String {
    let width = config.width;
    let bars = session.render(width);

    if bars.is_empty() {
        return generate_error_svg("No valid stack data provided", width);
    }

    let height = HEADER_HEIGHT + session.canvas_height();
    let total = session.levels().total();
    let mut svg = String::with_capacity(bars.len() * 320 + 2048);

    svg.push_str(&format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">
<style>
text {{ font-family: 'Roboto Mono', monospace; }}
.title {{ font-size: 18px; font-weight: 600; fill: #f1f5f9; }}
.subtitle {{ font-size: 12px; fill: #64748b; }}
.stat {{ font-size: 12px; fill: #94a3b8; }}
.label {{ font-size: {font_size}px; fill: #000000; dominant-baseline: middle; }}
.bar {{ stroke: #ffffff; stroke-width: 0.5; }}
.collapsed {{ stroke: none; }}
</style>
<rect width="100%" height="100%" fill="#0c0f1a"/>
<text class="title" x="8" y="22">{title}</text>
"##,
        font_size = config.font_size,
        title = escape_html(&config.title),
    ));

    if let Some(subtitle) = subtitle {
        svg.push_str(&format!(
            "<text class=\"subtitle\" x=\"8\" y=\"40\">{}</text>\n",
            escape_html(subtitle)
        ));
    }

    let viewport = session.viewport();
    let mut stat = format!("{} samples", format_samples(total));
    if viewport.is_zoomed() {
        stat.push_str(&format!(
            " | zoom {:.2}%-{:.2}%",
            viewport.range_min * 100.0,
            viewport.range_max * 100.0
        ));
    }
    if !session.query().is_empty() {
        stat.push_str(&format!(" | search \"{}\"", session.query()));
    }
    svg.push_str(&format!(
        "<text class=\"stat\" x=\"{}\" y=\"22\" text-anchor=\"end\">{}</text>\n",
        width - 8.0,
        escape_html(&stat)
    ));

    svg.push_str(&format!("<g transform=\"translate(0,{HEADER_HEIGHT})\">\n"));
    for (n, bar) in bars.iter().enumerate() {
        write_bar(&mut svg, n, bar, session);
    }
    svg.push_str("</g>\n</svg>\n");

    svg
}

fn write_bar(svg: &mut String, n: usize, bar: &RenderedBar<'_>, session: &Session) {
    let (r, g, b) = bar.color.to_rgb();
    let title = match bar.label {
        Some(label) => TooltipData::new(label, bar.value, session.levels().total(), session.unit()).to_string(),
        None => format!("{} frames collapsed ({} samples)", bar.bar_count, format_samples(bar.value)),
    };
    let class = if bar.collapsed { "bar collapsed" } else { "bar" };

    svg.push_str(&format!(
        "<g><title>{}</title><rect class=\"{class}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"rgb({r},{g},{b})\"/>",
        escape_html(&title),
        bar.x,
        bar.y,
        bar.width,
        bar.height,
    ));

    if let (true, Some(label)) = (bar.show_label, bar.label) {
        svg.push_str(&format!(
            "<clipPath id=\"c{n}\"><rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\"/></clipPath>\
             <text class=\"label\" x=\"{:.2}\" y=\"{:.2}\" clip-path=\"url(#c{n})\">{}</text>",
            bar.x,
            bar.y,
            bar.width,
            bar.height,
            bar.label_x,
            bar.y + bar.height / 2.0,
            escape_html(label),
        ));
    }
    svg.push_str("</g>\n");
}

fn generate_error_svg(message: &str, width: f64) -> String {
    format!(
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="120" viewBox="0 0 {width} 120">
<rect width="100%" height="100%" fill="#0c0f1a"/>
<text x="50%" y="50" text-anchor="middle" font-size="20" fill="#f87171">Error</text>
<text x="50%" y="80" text-anchor="middle" font-size="14" fill="#94a3b8">{}</text>
</svg>
"##,
        escape_html(message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collapsed::{parse_collapsed, stacks_to_tree};
    use crate::config::LayoutConfig;
    use crate::levels::{Levels, flatten};

    fn session(text: &str) -> Session {
        let stacks = parse_collapsed(text).unwrap();
        let levels = flatten(&stacks_to_tree(&stacks).unwrap()).unwrap();
        Session::new(levels, None, LayoutConfig::default())
    }

    fn render_config(title: &str) -> RenderConfig {
        RenderConfig {
            title: title.to_string(),
            ..RenderConfig::default()
        }
    }

    #[test]
    fn test_basic_generation() {
        let session = session("main;foo;bar 100\nmain;foo;baz 50\nmain;qux 25\n");
        let svg = generate_flamegraph(&session, &render_config("Test Graph"), None);

        assert!(svg.starts_with("<?xml"));
        assert!(svg.contains("Test Graph"));
        assert!(svg.contains(">main</text>"));
        assert!(svg.contains(">foo</text>"));
        assert!(svg.contains(">bar</text>"));
        assert!(svg.contains("175 samples"));
        assert!(svg.contains("clip-path=\"url(#c0)\""));
    }

    #[test]
    fn test_with_subtitle() {
        let session = session("a;b 10\n");
        let svg = generate_flamegraph(&session, &render_config("Title"), Some("My Subtitle"));

        assert!(svg.contains("My Subtitle"));
    }

    #[test]
    fn test_empty_profile() {
        let session = Session::new(Levels::default(), None, LayoutConfig::default());
        let svg = generate_flamegraph(&session, &render_config("Empty"), None);

        assert!(svg.contains("Error"));
        assert!(svg.contains("No valid stack data"));
    }

    #[test]
    fn test_html_escaping() {
        let session = session("main;<script>alert('xss')</script> 10\n");
        let svg = generate_flamegraph(&session, &render_config("Test <XSS>"), None);

        assert!(!svg.contains("<script>alert"));
        assert!(svg.contains("&lt;script&gt;"));
        assert!(svg.contains("Test &lt;XSS&gt;"));
    }

    #[test]
    fn test_query_dims_non_matching() {
        let mut session = session("main;malloc 10\nmain;free 10\n");
        session.set_query("alloc");
        let svg = generate_flamegraph(&session, &render_config("Search"), None);

        assert!(svg.contains("rgb(176,176,176)"));
        assert!(svg.contains("search &quot;alloc&quot;"));
    }

    #[test]
    fn test_zoom_is_reported() {
        let mut session = session("main;foo 30\nmain;bar 10\n");
        session.click(600.0, 50.0, 1200.0).unwrap();
        let svg = generate_flamegraph(&session, &render_config("Zoomed"), None);

        assert!(svg.contains("zoom 25.00%-100.00%"));
        assert!(!svg.contains(">bar</text>"));
    }
}
