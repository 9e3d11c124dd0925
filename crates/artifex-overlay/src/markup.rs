//! SVG synthesis for text annotations.

use std::fmt::Write;

use crate::config::OverlayConfig;
use crate::geometry::TextLayout;

/// Build an SVG document exactly the size of the annotation box.
///
/// The document covers only the backing box, so rasterising it can never
/// touch pixels outside the computed rectangle.
pub fn text_svg(layout: &TextLayout, text: &str, config: &OverlayConfig) -> String {
    let w = layout.rect.width;
    let h = layout.rect.height;
    let mut svg = String::with_capacity(256 + text.len());
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#
    );
    let _ = write!(
        svg,
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}" fill-opacity="{}"/>"#,
        escape(&config.backing_color),
        config.backing_opacity,
    );
    let _ = write!(
        svg,
        r#"<text x="{}" y="{}" font-family="{}" font-size="{}" fill="{}" xml:space="preserve">{}</text>"#,
        layout.baseline_x,
        layout.baseline_y,
        escape(&config.font_family),
        layout.font_size,
        escape(&config.text_color),
        escape(text),
    );
    svg.push_str("</svg>");
    svg
}

/// Escape text for use in XML content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not valid XML.
            c if c.is_control() && c != '\t' && c != '\n' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::text_layout;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &apos;Jerry&apos;&lt;/b&gt;"
        );
        assert_eq!(escape("a\u{0}b"), "a b");
    }

    #[test]
    fn svg_matches_box_size() {
        let layout = text_layout(50, 50, "Hi", 24.0, 10.0);
        let svg = text_svg(&layout, "Hi", &OverlayConfig::default());
        assert!(svg.starts_with(r#"<svg xmlns="http://www.w3.org/2000/svg" width="27" height="34""#));
        assert!(svg.contains(r#"<rect x="0" y="0" width="27" height="34" fill="black" fill-opacity="0.6"/>"#));
        assert!(svg.contains(">Hi</text>"));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn injected_markup_stays_text() {
        let text = r#"</text><image href="file:///etc/passwd"/>"#;
        let layout = text_layout(0, 40, text, 24.0, 10.0);
        let svg = text_svg(&layout, text, &OverlayConfig::default());
        assert!(!svg.contains("<image"));
        assert_eq!(svg.matches("</text>").count(), 1);
    }
}
