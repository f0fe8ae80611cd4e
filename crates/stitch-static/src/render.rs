//! Template rendering against the aggregated context.

use handlebars::Handlebars;
use serde_json::Value;

/// Error produced when a template fails to render.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Template render error: {0}")]
pub struct RenderError(pub String);

/// A templating engine: template text plus context in, text out.
pub trait Renderer: Send + Sync {
    /// Render `template` against `context`.
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

/// Mustache-style renderer backed by handlebars.
///
/// Interpolated values escape exactly `<`, `>`, `"` and `/`, the entities
/// [`unescape_html`] reverses after the final pass.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_escape_fn(escape_html);
        Self { registry }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HandlebarsRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        self.registry
            .render_template(template, context)
            .map_err(|e| RenderError(e.to_string()))
    }
}

fn escape_html(data: &str) -> String {
    let mut escaped = String::with_capacity(data.len());
    for c in data.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '/' => escaped.push_str("&#x2F;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Reverse the renderer's entity substitutions.
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#x2F;", "/")
        .replace("&quot;", "\"")
}

/// Render twice, then unescape.
///
/// The second pass resolves template syntax that only appears in the output
/// of the first (for instance context values that themselves hold tags).
pub fn render_twice(
    renderer: &dyn Renderer,
    template: &str,
    context: &Value,
) -> Result<String, RenderError> {
    let first = renderer.render(template, context)?;
    let second = renderer.render(&first, context)?;
    Ok(unescape_html(&second))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn interpolates_values() {
        let renderer = HandlebarsRenderer::new();
        let html = renderer
            .render("<h1>{{title}}</h1>", &json!({"title": "Hi"}))
            .unwrap();

        assert_eq!(html, "<h1>Hi</h1>");
    }

    #[test]
    fn iterates_sequences() {
        let renderer = HandlebarsRenderer::new();
        let context = json!({"posts": [{"name": "a"}, {"name": "b"}]});

        let out = renderer
            .render("{{#each posts}}[{{name}}]{{/each}}", &context)
            .unwrap();

        assert_eq!(out, "[a][b]");
    }

    #[test]
    fn escapes_only_four_characters() {
        let renderer = HandlebarsRenderer::new();
        let out = renderer
            .render("{{v}}", &json!({"v": "<a href=\"/x\">'&'</a>"}))
            .unwrap();

        assert_eq!(out, "&lt;a href=&quot;&#x2F;x&quot;&gt;'&'&lt;&#x2F;a&gt;");
    }

    #[test]
    fn missing_values_render_empty() {
        let renderer = HandlebarsRenderer::new();
        assert_eq!(renderer.render("[{{nope}}]", &json!({})).unwrap(), "[]");
    }

    #[test]
    fn reports_malformed_templates() {
        let renderer = HandlebarsRenderer::new();
        assert!(renderer.render("{{#if x}}never closed", &json!({})).is_err());
    }

    #[test]
    fn double_render_round_trips_markup() {
        let renderer = HandlebarsRenderer::new();
        let context = json!({"body": "<p>Some <strong>bold</strong></p>"});

        let out = render_twice(&renderer, "<div>{{body}}</div>", &context).unwrap();

        assert_eq!(out, "<div><p>Some <strong>bold</strong></p></div>");
    }

    #[test]
    fn second_pass_resolves_emitted_syntax() {
        let renderer = HandlebarsRenderer::new();
        let context = json!({"greeting": "{{name}}", "name": "World"});

        let out = render_twice(&renderer, "Hello {{greeting}}", &context).unwrap();

        assert_eq!(out, "Hello World");
    }
}
