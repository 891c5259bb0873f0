//! Template renderer.

use super::{DEFECT_ISSUE_TEMPLATE, LOCK_PR_TEMPLATE, PROPAGATION_PR_TEMPLATE};
use crate::config::{ConfigError, LockInfo};
use handlebars::{no_escape, Context, Handlebars, Helper, HelperResult, Output, RenderContext};
use serde_json::{json, Value};
use std::path::PathBuf;

/// Creates a configured Handlebars registry with custom helpers.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
/// - `eq` helper for equality comparisons
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();

    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs.register_helper("eq", Box::new(eq_helper));

    hbs
}

/// Helper function for equality comparison in templates.
///
/// Usage: `{{#if (eq variable "value")}}...{{/if}}`
fn eq_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param1 = h.param(0).and_then(|v| v.value().as_str());
    let param2 = h.param(1).and_then(|v| v.value().as_str());

    let result = match (param1, param2) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };

    out.write(if result { "true" } else { "" })?;
    Ok(())
}

/// Inputs of a propagation pull request body.
#[derive(Debug, Clone)]
pub struct PropagationPrData<'a> {
    /// Source commit message without its subject line.
    pub body: &'a str,

    /// Web URL of the source commit.
    pub source_link: &'a str,

    /// Source repository in "owner/name" form.
    pub source_repo: &'a str,

    /// Source commit hash.
    pub source_commit: &'a str,

    /// Destination paths cleared before copying.
    pub removed: &'a [PathBuf],
}

/// Template renderer for pull request and issue bodies.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a new template renderer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlebars: create_handlebars_registry(),
        }
    }

    /// Renders the body of a propagation pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_propagation_pr(
        &self,
        data: &PropagationPrData<'_>,
    ) -> Result<String, super::TemplateError> {
        let removed: Vec<String> = data
            .removed
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        let data = json!({
            "body": data.body.trim(),
            "source_link": data.source_link,
            "source_repo": data.source_repo,
            "source_commit": data.source_commit,
            "removed": removed,
        });

        self.render_template("propagation pull request", PROPAGATION_PR_TEMPLATE, &data)
    }

    /// Renders the body of an issue reporting a configuration defect.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_defect_issue(&self, error: &ConfigError) -> Result<String, super::TemplateError> {
        let (kind, path) = match error {
            ConfigError::MissingFile { path } => ("missing", path),
            ConfigError::IoError { path, .. }
            | ConfigError::YamlError { path, .. }
            | ConfigError::ValidationError { path, .. } => ("invalid", path),
        };
        let data = json!({
            "kind": kind,
            "path": path,
            "error": error.to_string(),
        });

        self.render_template("defect issue", DEFECT_ISSUE_TEMPLATE, &data)
    }

    /// Renders the body of a lock-update pull request.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_lock_pr(
        &self,
        lock: &LockInfo,
        previous: Option<&LockInfo>,
    ) -> Result<String, super::TemplateError> {
        let data = json!({
            "image": lock.image,
            "digest": lock.digest,
            "previous_digest": previous.map_or("", |p| p.digest.as_str()),
        });

        self.render_template("lock pull request", LOCK_PR_TEMPLATE, &data)
    }

    /// Renders a template with the given data.
    fn render_template(
        &self,
        name: &'static str,
        template: &str,
        data: &Value,
    ) -> Result<String, super::TemplateError> {
        self.handlebars
            .render_template(template, data)
            .map_err(|source| super::TemplateError::Render {
                template: name,
                source,
            })
    }
}
