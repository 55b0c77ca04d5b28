use ahash::AHashMap;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

use super::{CommandSpec, InvocationCommand, ParamSchema, ParamType, PluginManifest};

const FALLBACK_COMMAND_ID: &str = "default";
const DEFAULT_INPUTS: &[&str] = &["trigger"];
const DEFAULT_OUTPUTS: &[&str] = &["result", "error"];

/// Parameter documentation scraped from a bullet line of the form
/// `- name (typeinfo): description`.
#[derive(Debug, Clone, Default)]
struct ParamDoc {
    param_type: ParamType,
    required: bool,
    description: String,
    default_value: String,
}

/// Best-effort extractor of structured command schemas from the free-text
/// invocation documentation plugins ship.
///
/// The source format is informal prose aimed at language models, so this is
/// a heuristic pattern scan, not a grammar. Anything it cannot recognize
/// degrades to permissive defaults (`string`, not required, no options)
/// rather than failing; a manifest can never abort plugin load from here.
pub struct CommandSpecParser {
    block_re: Regex,
    pair_re: Regex,
    doc_line_re: Regex,
    required_re: Regex,
    number_re: Regex,
    boolean_re: Regex,
    array_re: Regex,
    default_re: Regex,
    fullwidth_quote_re: Regex,
    double_quote_re: Regex,
    single_quote_re: Regex,
}

impl Default for CommandSpecParser {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandSpecParser {
    pub fn new() -> Self {
        Self {
            // Tool-request sentinel block; values may span lines.
            block_re: Regex::new(r"(?s)<<<\[TOOL_REQUEST\]>>>(.*?)<<<\[END_TOOL_REQUEST\]>>>")
                .expect("valid block pattern"),
            // `key: 「始」value「末」` — the fullwidth brackets quote values
            // tolerant of embedded newlines and punctuation.
            pair_re: Regex::new(r"(?s)([A-Za-z0-9_-]+)\s*[:：]\s*「始」(.*?)「末」")
                .expect("valid pair pattern"),
            // `- name (typeinfo): description` bullet lines.
            doc_line_re: Regex::new(r"(?m)^[-*]\s*([A-Za-z0-9_-]+)\s*\(([^)]+)\)\s*[:：]\s*(.+)$")
                .expect("valid doc-line pattern"),
            required_re: Regex::new(r"(?i)(必需|必填|required)").expect("valid required pattern"),
            number_re: Regex::new(r"(?i)(整数|数字|int|number)").expect("valid number pattern"),
            boolean_re: Regex::new(r"(?i)(布尔|boolean)").expect("valid boolean pattern"),
            array_re: Regex::new(r"(?i)(数组|array)").expect("valid array pattern"),
            default_re: Regex::new(r#"默认['"]?([^'"，。\n]+)['"]?"#)
                .expect("valid default pattern"),
            fullwidth_quote_re: Regex::new(r"「([^」]+)」").expect("valid fullwidth pattern"),
            double_quote_re: Regex::new(r#""([^"]+)""#).expect("valid double-quote pattern"),
            single_quote_re: Regex::new(r"'([^']+)'").expect("valid single-quote pattern"),
        }
    }

    /// Parses every invocation command a manifest documents.
    pub fn parse_manifest(&self, manifest: &PluginManifest) -> Vec<CommandSpec> {
        let commands: Vec<CommandSpec> = manifest
            .capabilities
            .invocation_commands
            .iter()
            .map(|entry| self.parse_command(manifest, entry))
            .collect();
        debug!(
            plugin = manifest.key(),
            commands = commands.len(),
            "invocation commands parsed"
        );
        commands
    }

    /// Parses a single invocation command entry.
    pub fn parse_command(&self, manifest: &PluginManifest, entry: &InvocationCommand) -> CommandSpec {
        let command_id = entry
            .command
            .clone()
            .or_else(|| entry.name.clone())
            .unwrap_or_else(|| FALLBACK_COMMAND_ID.to_string());

        let description = entry.description.as_str();
        let text = format!("{}\n{}", description, entry.example);
        let block = self
            .block_re
            .captures(&text)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str())
            .unwrap_or(&text);

        let doc_map = self.param_doc_map(description);

        let mut explicit_command = None;
        let mut params = BTreeMap::new();

        for captures in self.pair_re.captures_iter(block) {
            let key = &captures[1];
            let example_value = captures[2].trim();
            let lowered = key.to_ascii_lowercase();

            // Framework plumbing, not user parameters.
            if lowered == "tool_name" || lowered == "maid" {
                continue;
            }
            if lowered == "command" {
                explicit_command = Some(example_value.to_string());
                continue;
            }

            let doc = doc_map.get(key);
            let default_value = match doc.map(|d| d.default_value.as_str()) {
                Some(default) if !default.is_empty() => default.to_string(),
                // The example value doubles as the default when the docs
                // named none.
                _ => example_value.to_string(),
            };
            params.insert(
                key.to_string(),
                ParamSchema {
                    param_type: doc.map(|d| d.param_type).unwrap_or_default(),
                    required: doc.map(|d| d.required).unwrap_or(false),
                    description: doc.map(|d| d.description.clone()).unwrap_or_default(),
                    default_value,
                    options: self.extract_enum_options(description, key),
                },
            );
        }

        // An explicit `command` key means the plugin multiplexes commands
        // and execution must pass the discriminator along.
        let needs_command = explicit_command.is_some();
        let command = explicit_command.unwrap_or_else(|| command_id.clone());

        CommandSpec {
            id: command_id.clone(),
            name: entry.name.clone().unwrap_or_else(|| command_id.clone()),
            command,
            needs_command,
            inputs: manifest
                .inputs
                .clone()
                .unwrap_or_else(|| DEFAULT_INPUTS.iter().map(|s| s.to_string()).collect()),
            outputs: manifest
                .outputs
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUTS.iter().map(|s| s.to_string()).collect()),
            params,
        }
    }

    /// Scans the description for `- name (typeinfo): text` bullet lines.
    fn param_doc_map(&self, description: &str) -> AHashMap<String, ParamDoc> {
        let mut map = AHashMap::new();
        for captures in self.doc_line_re.captures_iter(description) {
            let name = captures[1].to_string();
            let type_info = &captures[2];
            let doc_text = captures[3].trim().to_string();
            let default_value = self
                .default_re
                .captures(&doc_text)
                .map(|c| c[1].trim().to_string())
                .unwrap_or_default();
            map.insert(
                name,
                ParamDoc {
                    param_type: self.infer_type(type_info),
                    required: self.required_re.is_match(type_info),
                    description: doc_text,
                    default_value,
                },
            );
        }
        map
    }

    fn infer_type(&self, text: &str) -> ParamType {
        if self.number_re.is_match(text) {
            ParamType::Number
        } else if self.boolean_re.is_match(text) {
            ParamType::Boolean
        } else if self.array_re.is_match(text) {
            ParamType::Array
        } else {
            ParamType::String
        }
    }

    /// Pulls an enumerated option set out of lines like
    /// `paramName 可选值: 「a」、「b」`. Token syntaxes are tried in priority
    /// order: fullwidth brackets, double quotes, single quotes, then plain
    /// separator-split; the first non-empty extraction wins.
    fn extract_enum_options(&self, description: &str, param_name: &str) -> Vec<String> {
        let escaped = regex::escape(param_name);
        let line_patterns = [
            format!(r"(?i){escaped}.*?可选值[:：]([^\n]+)"),
            format!(r"(?i){escaped}.*?可选[:：]\s*([^\n]+)"),
        ];

        for pattern in &line_patterns {
            let Ok(line_re) = Regex::new(pattern) else {
                continue;
            };
            let Some(captures) = line_re.captures(description) else {
                continue;
            };
            let options_text = &captures[1];

            for quote_re in [
                &self.fullwidth_quote_re,
                &self.double_quote_re,
                &self.single_quote_re,
            ] {
                let quoted: Vec<String> = quote_re
                    .captures_iter(options_text)
                    .map(|c| c[1].to_string())
                    .collect();
                if !quoted.is_empty() {
                    return quoted;
                }
            }

            let split: Vec<String> = options_text
                .split([',', '，', '、', '|'])
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .collect();
            if split.len() > 1 {
                return split;
            }
        }

        Vec::new()
    }
}
