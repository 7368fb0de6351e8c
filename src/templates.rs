//! Named template registry.
//!
//! Rendering a page is the caller's business — a view returns finished
//! text — but the session offers the same convenience the Flask lineage
//! does: templates registered by name, invoked with a bag of named
//! bindings. A template here is a plain function over a [`Context`];
//! HTML-producing templates are typically written with `maud`, which keeps
//! them compile-checked instead of stringly parsed.
//!
//! Looking up an unregistered name fails with
//! [`RenderError::UnknownTemplate`] rather than rendering anything.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Named bindings handed to a template.
pub type Context = BTreeMap<String, serde_json::Value>;

/// A registered template: bindings in, rendered text out.
pub type TemplateFn = Box<dyn Fn(&Context) -> String>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("unknown template '{0}'")]
    UnknownTemplate(String),
}

/// Registry of template functions, keyed by name.
#[derive(Default)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, TemplateFn>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. Re-registering a name replaces the previous
    /// template, mirroring loader-override semantics.
    pub fn insert<F>(&mut self, name: &str, template: F)
    where
        F: Fn(&Context) -> String + 'static,
    {
        self.templates.insert(name.to_string(), Box::new(template));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    /// Render `name` with the given bindings.
    pub fn render(&self, name: &str, context: &Context) -> Result<String, RenderError> {
        let template = self
            .templates
            .get(name)
            .ok_or_else(|| RenderError::UnknownTemplate(name.to_string()))?;
        Ok(template(context))
    }
}

impl fmt::Debug for TemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateRegistry")
            .field("templates", &self.templates.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_registered_template_with_bindings() {
        let mut registry = TemplateRegistry::new();
        registry.insert("page.html", |ctx: &Context| {
            format!(
                "<h1>{}</h1>",
                ctx.get("title").and_then(|v| v.as_str()).unwrap_or("")
            )
        });
        let mut ctx = Context::new();
        ctx.insert("title".into(), json!("Hello"));
        assert_eq!(
            registry.render("page.html", &ctx).unwrap(),
            "<h1>Hello</h1>"
        );
    }

    #[test]
    fn unknown_template_fails_distinguishably() {
        let registry = TemplateRegistry::new();
        let err = registry.render("nope.html", &Context::new()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownTemplate(name) if name == "nope.html"));
    }

    #[test]
    fn reregistering_replaces() {
        let mut registry = TemplateRegistry::new();
        registry.insert("t", |_: &Context| "one".to_string());
        registry.insert("t", |_: &Context| "two".to_string());
        assert_eq!(registry.render("t", &Context::new()).unwrap(), "two");
    }
}
