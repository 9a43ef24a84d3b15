use anyhow::Result;
use handlebars::{Handlebars, RenderError};

use super::models::HelloPage;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");
const HELLO_TEMPLATE: &str = include_str!("../../templates/hello.html");

/// HTML pages, compiled once at startup. Values are HTML-escaped on render.
pub struct Pages {
    handlebars: Handlebars<'static>,
}

impl Pages {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.register_template_string("index", INDEX_TEMPLATE)?;
        handlebars.register_template_string("hello", HELLO_TEMPLATE)?;
        Ok(Self { handlebars })
    }

    pub fn index(&self) -> Result<String, RenderError> {
        self.handlebars.render("index", &serde_json::json!({}))
    }

    pub fn hello(&self, answer: &str) -> Result<String, RenderError> {
        self.handlebars.render("hello", &HelloPage { answer })
    }
}
