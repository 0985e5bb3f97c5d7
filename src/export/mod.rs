use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use log::info;

use crate::error::{Error, Result};
use crate::figure::Figure;

pub mod svg;

pub use self::svg::{export_svg, render_svg};

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    /// plotly.js figure JSON (`{"data": [...], "layout": {...}}`).
    Json,
    /// Standalone page rendering the figure with plotly.js.
    Html,
    /// Static vector rendering without interactivity.
    Svg,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Json => write!(f, "json"),
            ExportFormat::Html => write!(f, "html"),
            ExportFormat::Svg => write!(f, "svg"),
        }
    }
}

/// Guess the format from the file extension.
pub fn infer_format(path: &Path) -> Option<ExportFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "json" => Some(ExportFormat::Json),
        "html" | "htm" => Some(ExportFormat::Html),
        "svg" => Some(ExportFormat::Svg),
        _ => None,
    }
}

pub fn render_html(figure: &Figure) -> Result<String> {
    let title = html_escape(figure.title());
    let json = serde_json::to_string(figure)?;
    // `</` would close the script element early.
    let json = json.replace("</", "<\\/");
    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="figure" style="width:100%;height:100vh;"></div>
<script>
const figure = {json};
Plotly.newPlot("figure", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#
    ))
}

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

pub fn export_figure(figure: &Figure, format: ExportFormat, path: &Path) -> Result<()> {
    info!("Exporting figure to {} as {format}", path.display());
    match format {
        ExportFormat::Json => {
            fs::write(path, figure.to_json()?).map_err(|err| Error::io(path, err))
        }
        ExportFormat::Html => {
            fs::write(path, render_html(figure)?).map_err(|err| Error::io(path, err))
        }
        ExportFormat::Svg => export_svg(figure, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::{Layout, Title};

    fn titled(title: &str) -> Figure {
        Figure::new(
            Vec::new(),
            Layout {
                title: Some(Title::new(title)),
                ..Layout::default()
            },
        )
    }

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(infer_format(Path::new("out.JSON")), Some(ExportFormat::Json));
        assert_eq!(infer_format(Path::new("a/b.htm")), Some(ExportFormat::Html));
        assert_eq!(infer_format(Path::new("figure.svg")), Some(ExportFormat::Svg));
        assert_eq!(infer_format(Path::new("figure.png")), None);
        assert_eq!(infer_format(Path::new("figure")), None);
    }

    #[test]
    fn html_embeds_figure_and_plotly() {
        let html = render_html(&titled("Tree & map")).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("<title>Tree &amp; map</title>"));
        assert!(html.contains(r#""title":{"text":"Tree & map"}"#));
    }

    #[test]
    fn html_cannot_break_out_of_script() {
        let html = render_html(&titled("</script>")).unwrap();
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("figure.json");
        export_figure(&titled("Overview"), ExportFormat::Json, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["layout"]["title"]["text"], "Overview");
        assert_eq!(value["data"], serde_json::json!([]));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("figure.html");
        let err = export_figure(&titled("x"), ExportFormat::Html, &path).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
