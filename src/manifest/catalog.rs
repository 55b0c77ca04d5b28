use ahash::AHashMap;
use itertools::Itertools;
use tracing::{debug, warn};

use super::{CommandSpec, CommandSpecParser, PluginManifest};

#[derive(Debug, Clone)]
struct CatalogEntry {
    manifest: PluginManifest,
    commands: Vec<CommandSpec>,
}

/// Lookup table of parsed command specs, keyed by plugin id.
///
/// The node-configuration UI queries this when the user picks a command for
/// a plugin-backed node; the (out-of-scope) discovery layer feeds manifests
/// in whenever it fetches them.
pub struct CommandCatalog {
    parser: CommandSpecParser,
    plugins: AHashMap<String, CatalogEntry>,
}

impl Default for CommandCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandCatalog {
    pub fn new() -> Self {
        Self {
            parser: CommandSpecParser::new(),
            plugins: AHashMap::new(),
        }
    }

    /// Parses and files a batch of manifests. Re-ingesting a plugin id
    /// replaces its previous entry. Returns how many plugins were filed.
    pub fn ingest(&mut self, manifests: &[PluginManifest]) -> usize {
        let mut ingested = 0;
        for manifest in manifests {
            let key = manifest.key().to_string();
            if key.is_empty() {
                warn!("manifest without id or name skipped");
                continue;
            }
            let commands = self.parser.parse_manifest(manifest);
            debug!(plugin = %key, commands = commands.len(), "plugin filed in catalog");
            self.plugins.insert(
                key,
                CatalogEntry {
                    manifest: manifest.clone(),
                    commands,
                },
            );
            ingested += 1;
        }
        ingested
    }

    pub fn plugin(&self, plugin_id: &str) -> Option<&PluginManifest> {
        self.plugins.get(plugin_id).map(|entry| &entry.manifest)
    }

    /// Every command a plugin documents, in manifest order.
    pub fn commands(&self, plugin_id: &str) -> Option<&[CommandSpec]> {
        self.plugins
            .get(plugin_id)
            .map(|entry| entry.commands.as_slice())
    }

    /// Resolves a command by its id or its wire command string.
    pub fn command(&self, plugin_id: &str, command_id: &str) -> Option<&CommandSpec> {
        let entry = self.plugins.get(plugin_id)?;
        let found = entry
            .commands
            .iter()
            .find(|spec| spec.id == command_id || spec.command == command_id);
        if found.is_none() {
            warn!(plugin = plugin_id, command = command_id, "command not found");
        }
        found
    }

    /// Case-insensitive substring search over plugin names and descriptions,
    /// ordered by plugin key.
    pub fn search(&self, query: &str) -> Vec<&PluginManifest> {
        let query = query.to_lowercase();
        self.plugins
            .values()
            .filter(|entry| {
                let manifest = &entry.manifest;
                manifest.name.to_lowercase().contains(&query)
                    || manifest.label().to_lowercase().contains(&query)
                    || manifest.description.to_lowercase().contains(&query)
            })
            .map(|entry| &entry.manifest)
            .sorted_by(|a, b| a.key().cmp(b.key()))
            .collect()
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }

    pub fn clear(&mut self) {
        self.plugins.clear();
    }
}
