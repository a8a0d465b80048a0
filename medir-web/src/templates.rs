//! Embedded page templates

use axum::response::Html;
use std::sync::Arc;
use tera::{Context, Tera};

use crate::error::WebResult;

// Embedded at compile time so the binary is self-contained
const TPL_BASE: &str = include_str!("../templates/base.html");
const TPL_INDEX: &str = include_str!("../templates/index.html");
const TPL_LOGIN: &str = include_str!("../templates/login.html");
const TPL_MANAGEMENT: &str = include_str!("../templates/management.html");
const TPL_SPECIALTIES: &str = include_str!("../templates/specialties.html");
const TPL_SEARCH_RESULTS: &str = include_str!("../templates/search_results.html");
const TPL_QUERY: &str = include_str!("../templates/query.html");
const TPL_STANDALONE: &str = include_str!("../templates/standalone.html");

/// Compiled template set, cheap to clone
#[derive(Clone)]
pub struct Templates {
    tera: Arc<Tera>,
}

impl Templates {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", TPL_BASE),
            ("index.html", TPL_INDEX),
            ("login.html", TPL_LOGIN),
            ("management.html", TPL_MANAGEMENT),
            ("specialties.html", TPL_SPECIALTIES),
            ("search_results.html", TPL_SEARCH_RESULTS),
            ("query.html", TPL_QUERY),
            ("standalone.html", TPL_STANDALONE),
        ])?;

        Ok(Self {
            tera: Arc::new(tera),
        })
    }

    pub fn render(&self, name: &str, context: &Context) -> WebResult<Html<String>> {
        Ok(Html(self.tera.render(name, context)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_compile() {
        assert!(Templates::new().is_ok());
    }

    #[test]
    fn test_nav_renders_without_page() {
        let templates = Templates::new().unwrap();

        let Html(page) = templates.render("index.html", &Context::new()).unwrap();
        assert!(page.contains("href=\"/query_page\""));
        assert!(!page.contains("class=\"active\""));
    }

    #[test]
    fn test_render_escapes_html() {
        let templates = Templates::new().unwrap();
        let mut context = Context::new();
        context.insert("error", "<script>alert(1)</script>");

        let Html(page) = templates.render("login.html", &context).unwrap();
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>alert(1)"));
    }
}
