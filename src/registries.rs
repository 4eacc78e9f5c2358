//! Explicit registry bootstrap.
//!
//! All family schemes are plain values constructed here and threaded
//! through call sites by the host application. Nothing registers itself
//! at link time and there is no global mutable registry; plugin
//! installation produces a new layered access scheme instead of
//! mutating a shared one.

use crate::access::{default_access_scheme, AccessContext, AccessSpecScheme};
use crate::config::{default_config_scheme, ConfigContext, ConfigSpecScheme};
use crate::plugin::{install_plugin, InstalledPlugin, PluginDescriptor, PluginError};
use crate::repository::{default_repository_scheme, RepositoryContext, RepositorySpecScheme};
use std::sync::Arc;

/// The process-wide set of type registries, built once during
/// application bootstrap.
#[derive(Debug, Clone)]
pub struct Registries {
    repository_types: Arc<RepositorySpecScheme>,
    access_types: Arc<AccessSpecScheme>,
    config_types: Arc<ConfigSpecScheme>,
}

impl Registries {
    /// Registries with every built-in type and unknown fallbacks.
    pub fn bootstrap() -> Self {
        Registries {
            repository_types: default_repository_scheme(),
            access_types: default_access_scheme(),
            config_types: default_config_scheme(),
        }
    }

    pub fn repository_types(&self) -> &Arc<RepositorySpecScheme> {
        &self.repository_types
    }

    pub fn access_types(&self) -> &Arc<AccessSpecScheme> {
        &self.access_types
    }

    pub fn config_types(&self) -> &Arc<ConfigSpecScheme> {
        &self.config_types
    }

    pub fn repository_context(&self) -> RepositoryContext {
        RepositoryContext::new(Arc::clone(&self.repository_types))
    }

    pub fn access_context(&self) -> AccessContext {
        AccessContext::new(Arc::clone(&self.access_types))
    }

    pub fn config_context(&self) -> ConfigContext {
        ConfigContext::new(Arc::clone(&self.config_types))
    }

    /// Installs a plugin and adopts its layered access scheme as the
    /// effective one. Later lookups see the plugin's types first.
    pub fn install_plugin(
        &mut self,
        descriptor: PluginDescriptor,
    ) -> Result<InstalledPlugin, PluginError> {
        let installed = install_plugin(descriptor, Arc::clone(&self.access_types))?;
        self.access_types = Arc::clone(&installed.access_types);
        Ok(installed)
    }
}

impl Default for Registries {
    fn default() -> Self {
        Registries::bootstrap()
    }
}
