use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One documented way of invoking a plugin, as shipped in its manifest.
///
/// `description` and `example` are free text written for language models,
/// not machines; the parser treats them as semi-structured documentation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InvocationCommand {
    pub command: Option<String>,
    pub name: Option<String>,
    pub description: String,
    pub example: String,
}

/// Capability block of a plugin manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Capabilities {
    pub invocation_commands: Vec<InvocationCommand>,
}

/// A plugin descriptor as supplied by the (out-of-scope) discovery layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginManifest {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub description: String,
    pub version: Option<String>,
    pub inputs: Option<Vec<String>>,
    pub outputs: Option<Vec<String>>,
    pub capabilities: Capabilities,
}

impl PluginManifest {
    /// The id the catalog files this plugin under.
    pub fn key(&self) -> &str {
        if !self.id.is_empty() { &self.id } else { &self.name }
    }

    /// Human-facing label.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Parameter value type inferred from documentation text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
}

/// What the node-configuration form needs to render one parameter input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParamSchema {
    #[serde(rename = "type")]
    pub param_type: ParamType,
    pub required: bool,
    pub description: String,
    pub default_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

/// A structured command extracted from a plugin's invocation documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub id: String,
    pub name: String,
    /// Command discriminator sent at execution time.
    pub command: String,
    /// `true` iff the documentation block carried an explicit `command` key,
    /// i.e. the plugin multiplexes several commands and execution must pick
    /// one. Single-command plugins run with their implicit command.
    pub needs_command: bool,
    pub inputs: Vec<String>,
    pub outputs: Vec<String>,
    /// Keyed by parameter name; BTreeMap keeps the form layout deterministic.
    pub params: BTreeMap<String, ParamSchema>,
}
