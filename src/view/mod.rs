//! Template-engine adaptor
//!
//! Wraps minijinja with the conveniences a host application expects from a
//! view layer: directory loading by extension, templates embedded in the
//! binary, custom filters and shared globals, a `url()` function for
//! reverse routing, and a debug mode that reloads templates and surfaces
//! verbose render errors.

use crate::error::TemplateError;
use crate::routes::RouteMap;
use crate::{PorticoError, Result};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::value::{FunctionArgs, FunctionResult, Rest};
use minijinja::{AutoEscape, Environment, ErrorKind};
use parking_lot::RwLock;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// View engine rendering minijinja templates for an axum application
pub struct ViewEngine {
    directory: PathBuf,
    extension: String,
    env: RwLock<Environment<'static>>,
    debug: bool,
}

impl ViewEngine {
    /// Create a view engine for a template directory and file extension,
    /// e.g. `ViewEngine::new("templates", ".html")`.
    ///
    /// Output is HTML-escaped regardless of extension.
    pub fn new<P: AsRef<Path>>(directory: P, extension: &str) -> Self {
        let mut env = Environment::new();
        env.set_auto_escape_callback(|_| AutoEscape::Html);

        Self {
            directory: directory.as_ref().to_path_buf(),
            extension: extension.to_string(),
            env: RwLock::new(env),
            debug: false,
        }
    }

    /// Enable template debugging: templates reload on every render and
    /// render errors appear verbatim in the response instead of a quiet
    /// error code.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Install a `url(route_name, params...)` template function resolving
    /// against the given route registry.
    pub fn with_routes(self, routes: RouteMap) -> Self {
        self.env.write().add_function(
            "url",
            move |name: String, rest: Rest<String>| -> std::result::Result<String, minijinja::Error> {
                let params: Vec<&str> = rest.0.iter().map(|s| s.as_str()).collect();
                routes.url(&name, &params).ok_or_else(|| {
                    minijinja::Error::new(
                        ErrorKind::InvalidOperation,
                        format!("unknown route name: {name}"),
                    )
                })
            },
        );
        self
    }

    /// Load every template under the directory whose name ends with the
    /// configured extension. Template names are directory-relative paths,
    /// extension included. Returns how many templates were registered.
    pub fn load(&self) -> Result<usize> {
        let mut sources = Vec::new();
        collect_templates(&self.directory, &self.directory, &self.extension, &mut sources)?;

        let mut env = self.env.write();
        let count = sources.len();
        for (name, source) in sources {
            env.add_template_owned(name, source)
                .map_err(TemplateError::Render)?;
        }
        Ok(count)
    }

    /// Register a template compiled into the binary, e.g. via
    /// `include_str!`.
    pub fn embedded(&self, name: &str, source: &str) -> Result<()> {
        self.env
            .write()
            .add_template_owned(name.to_string(), source.to_string())
            .map_err(TemplateError::Render)?;
        Ok(())
    }

    /// Register a custom filter.
    pub fn filter<F, Rv, Args>(&self, name: &str, f: F) -> &Self
    where
        F: minijinja::filters::Filter<Rv, Args>
            + for<'a> minijinja::filters::Filter<Rv, <Args as FunctionArgs<'a>>::Output>,
        Rv: FunctionResult,
        Args: for<'a> FunctionArgs<'a>,
    {
        self.env
            .write()
            .add_filter::<_, F, Rv, Args>(name.to_string(), f);
        self
    }

    /// Share a context value with every template.
    pub fn global<V: Serialize>(&self, name: &str, value: V) -> &Self {
        self.env
            .write()
            .add_global(name.to_string(), minijinja::Value::from_serialize(&value));
        self
    }

    /// Render a template to a string.
    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String> {
        if self.debug && self.directory.exists() {
            self.load()?;
        }

        let env = self.env.read();
        let template = env.get_template(name).map_err(|e| {
            if matches!(e.kind(), ErrorKind::TemplateNotFound) {
                PorticoError::Template(TemplateError::NotFound(name.to_string()))
            } else {
                PorticoError::Template(TemplateError::Render(e))
            }
        })?;

        template
            .render(ctx)
            .map_err(|e| PorticoError::Template(TemplateError::Render(e)))
    }

    /// Render a template as an HTML response. Render failures answer 500;
    /// with debug enabled the error text is the body.
    pub fn html<S: Serialize>(&self, name: &str, ctx: S) -> Response {
        match self.render(name, ctx) {
            Ok(body) => Html(body).into_response(),
            Err(err) => {
                tracing::error!("view render failed for '{name}': {err}");
                if self.debug {
                    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR.into_response()
                }
            }
        }
    }
}

fn collect_templates(
    root: &Path,
    dir: &Path,
    extension: &str,
    out: &mut Vec<(String, String)>,
) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_templates(root, &path, extension, out)?;
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(extension))
        {
            let name = path
                .strip_prefix(root)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            out.push((name, fs::read_to_string(&path)?));
        }
    }
    Ok(())
}
