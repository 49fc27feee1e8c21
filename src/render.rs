use std::path::Path;
use std::sync::LazyLock;

use eyre::{Result, WrapErr, bail};
use log::debug;
use regex::{Captures, Regex};

const EMBEDDED_TEMPLATE: &str = include_str!("../templates/index.html");

const KNOWN_NAMES: [&str; 4] = ["summary", "error_message", "video_url_input", "full_transcript"];

static IF_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{%\s*if\s+(\w+)\s*%\}(.*?)\{%\s*endif\s*%\}").expect("if block pattern is valid"));

static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("variable pattern is valid"));

/// Values shown on the page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub summary: Option<String>,
    pub error_message: Option<String>,
    pub video_url_input: String,
    pub full_transcript: Option<String>,
}

impl Page {
    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "summary" => self.summary.as_deref(),
            "error_message" => self.error_message.as_deref(),
            "video_url_input" => Some(self.video_url_input.as_str()),
            "full_transcript" => self.full_transcript.as_deref(),
            _ => None,
        }
    }
}

/// Turns page values into an HTML document
pub trait Render: Send + Sync {
    fn render(&self, page: &Page) -> Result<String>;
}

/// A page template with `{{ name }}` substitutions and `{% if name %}...{% endif %}` blocks.
///
/// Substituted values are HTML-escaped. A block is kept when its value is present and
/// non-empty. Blocks do not nest.
#[derive(Debug, Clone)]
pub struct HtmlTemplate {
    source: String,
}

impl HtmlTemplate {
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let names = IF_BLOCK
            .captures_iter(&source)
            .chain(VARIABLE.captures_iter(&source))
            .map(|caps| caps[1].to_string());
        for name in names {
            if !KNOWN_NAMES.contains(&name.as_str()) {
                bail!("unknown template variable: {name}");
            }
        }
        Ok(Self { source })
    }

    /// The template bundled with the binary
    pub fn embedded() -> Result<Self> {
        Self::new(EMBEDDED_TEMPLATE)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading template from {}", path.display());
        let source =
            std::fs::read_to_string(path).wrap_err_with(|| format!("failed to read template {}", path.display()))?;
        Self::new(source).wrap_err_with(|| format!("invalid template {}", path.display()))
    }
}

impl Render for HtmlTemplate {
    fn render(&self, page: &Page) -> Result<String> {
        let present = |name: &str| page.value(name).is_some_and(|v| !v.is_empty());

        let expanded = IF_BLOCK.replace_all(&self.source, |caps: &Captures| {
            if present(&caps[1]) {
                caps[2].to_string()
            } else {
                String::new()
            }
        });

        let rendered = VARIABLE.replace_all(&expanded, |caps: &Captures| {
            html_escape::encode_safe(page.value(&caps[1]).unwrap_or_default()).into_owned()
        });

        Ok(rendered.into_owned())
    }
}
