//! Collaborators shared by every operation of a run.

use crate::git::GitExecutor;
use crate::host::{CodeHost, RemoteHost};
use crate::store::ConfigStore;
use crate::templates::TemplateRenderer;

/// Borrowed handles to the collaborators an operation acts through.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    /// Version control.
    pub git: &'a dyn GitExecutor,

    /// Code host API.
    pub host: &'a dyn CodeHost,

    /// Per-repository configuration store.
    pub store: &'a dyn ConfigStore,

    /// Clone and web URLs.
    pub remote: &'a RemoteHost,

    /// Pull request and issue bodies.
    pub renderer: &'a TemplateRenderer,
}
