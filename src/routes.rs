//! Named-route registry for reverse URL generation
//!
//! axum has no notion of named routes, so the adaptors keep their own
//! name -> path-template association here. The OAuth adaptor registers its
//! request path under the configured route name and the view engine's
//! `url()` template function resolves against the same map.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared registry mapping route names to path templates like
/// `/oauth/{provider}`.
#[derive(Clone, Default)]
pub struct RouteMap {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a named route.
    pub fn register(&self, name: &str, template: &str) {
        self.inner
            .write()
            .insert(name.to_string(), template.to_string());
    }

    /// Build a URL for a named route, filling `{param}` segments with the
    /// given values in order. Returns `None` for unregistered names.
    pub fn url(&self, name: &str, params: &[&str]) -> Option<String> {
        let template = self.inner.read().get(name)?.clone();
        Some(fill_template(&template, params))
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

/// Replace `{param}` segments with values, left to right. Surplus values
/// are ignored; unfilled segments stay verbatim.
fn fill_template(template: &str, params: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut values = params.iter();

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(offset) => {
                match values.next() {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + offset + 1]),
                }
                rest = &rest[start + offset + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
