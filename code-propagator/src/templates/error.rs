//! Errors raised while rendering pull request and issue bodies.

/// Rendering the propagation pull request, defect issue or lock pull request
/// body failed.
///
/// Templates render in strict mode, so a field missing from the data is an
/// error rather than an empty string.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Handlebars rendering error.
    #[error("Failed to render template '{template}': {source}")]
    Render {
        /// Which body was being rendered.
        template: &'static str,
        #[source]
        source: handlebars::RenderError,
    },
}
