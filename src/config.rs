//! Mention configuration and its validation.
//!
//! Mention records arrive from the host application's settings layer in a
//! loosely filled-in shape and are validated when the extension is built,
//! before any document is parsed. Malformed configuration aborts
//! conversion up front; malformed *markup* never does.

use regex::Regex;
use thiserror::Error;

use crate::limits;
use crate::tree::MentionData;

/// Produces the URL for a recognized mention.
///
/// `generate` may fill in `mention.url` (and adjust the identifier if it
/// wants to). Returning `false`, or returning `true` without setting a
/// URL, leaves the matched text as plain text.
pub trait MentionGenerator: Send + Sync {
    fn generate(&self, mention: &mut MentionData) -> bool;
}

impl<F> MentionGenerator for F
where
    F: Fn(&mut MentionData) -> bool + Send + Sync,
{
    fn generate(&self, mention: &mut MentionData) -> bool {
        self(mention)
    }
}

/// The generator slot of a mention record: a URL template string, a
/// callback, or a generator object.
pub enum GeneratorSpec {
    /// URL template; `%s` is replaced with the matched identifier.
    Template(String),
    /// Callback taking the mention; `false` suppresses replacement.
    Callback(Box<dyn Fn(&mut MentionData) -> bool + Send + Sync>),
    /// An object implementing [`MentionGenerator`].
    Object(Box<dyn MentionGenerator>),
}

impl std::fmt::Debug for GeneratorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorSpec::Template(t) => f.debug_tuple("Template").field(t).finish(),
            GeneratorSpec::Callback(_) => f.write_str("Callback(..)"),
            GeneratorSpec::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl From<&str> for GeneratorSpec {
    fn from(template: &str) -> Self {
        GeneratorSpec::Template(template.to_string())
    }
}

impl From<String> for GeneratorSpec {
    fn from(template: String) -> Self {
        GeneratorSpec::Template(template)
    }
}

/// One raw mention record, as merged from host configuration. Validated
/// by [`MentionConfig::validate`] when the extension is built.
#[derive(Debug, Default)]
pub struct MentionConfig {
    /// Leading symbol, e.g. `"@"`.
    pub prefix: Option<String>,
    /// Regex *fragment* matching the identifier after the prefix — no
    /// delimiters, no flags; anchoring is applied internally.
    pub pattern: Option<String>,
    pub generator: Option<GeneratorSpec>,
    /// Retired alias for `prefix`; rejected during validation so stale
    /// host configuration fails loudly instead of silently not matching.
    pub symbol: Option<String>,
}

/// A configuration problem, reported before any parsing happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("mention `{name}`: the `symbol` option was retired; use `prefix` instead")]
    RetiredOption { name: String },

    #[error("mention `{name}`: missing required option `{option}`")]
    MissingOption { name: String, option: &'static str },

    #[error(
        "mention `{name}`: `pattern` must be a bare regex fragment, without delimiters or flags"
    )]
    DelimitedPattern { name: String },

    #[error("mention `{name}`: invalid `pattern`: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: Box<regex::Error>,
    },

    #[error("mention `{name}`: generator template must contain the `%s` placeholder")]
    MissingPlaceholder { name: String },
}

/// A validated, ready-to-run mention definition.
pub(crate) struct CompiledMention {
    pub prefix: String,
    pub pattern: Regex,
    pub generator: Box<dyn MentionGenerator>,
}

impl std::fmt::Debug for CompiledMention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledMention")
            .field("prefix", &self.prefix)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl MentionConfig {
    pub(crate) fn validate(self, name: &str) -> Result<CompiledMention, ConfigError> {
        let name_owned = || name.to_string();

        if self.symbol.is_some() {
            return Err(ConfigError::RetiredOption { name: name_owned() });
        }
        let prefix = self.prefix.filter(|p| !p.is_empty()).ok_or_else(|| {
            ConfigError::MissingOption {
                name: name_owned(),
                option: "prefix",
            }
        })?;
        let pattern = self.pattern.ok_or_else(|| ConfigError::MissingOption {
            name: name_owned(),
            option: "pattern",
        })?;
        let generator = self.generator.ok_or_else(|| ConfigError::MissingOption {
            name: name_owned(),
            option: "generator",
        })?;

        if looks_delimited(&pattern) {
            return Err(ConfigError::DelimitedPattern { name: name_owned() });
        }

        // Anchor at the match site; the handler feeds it the text right
        // after the prefix.
        let pattern =
            Regex::new(&format!("\\A(?:{pattern})")).map_err(|e| ConfigError::InvalidPattern {
                name: name_owned(),
                source: Box::new(e),
            })?;

        let generator: Box<dyn MentionGenerator> = match generator {
            GeneratorSpec::Template(template) => {
                if !template.contains("%s") {
                    return Err(ConfigError::MissingPlaceholder { name: name_owned() });
                }
                Box::new(TemplateGenerator { template })
            }
            GeneratorSpec::Callback(f) => Box::new(f),
            GeneratorSpec::Object(o) => o,
        };

        Ok(CompiledMention {
            prefix,
            pattern,
            generator,
        })
    }
}

/// `/.../i`-style input is a whole delimited expression, not a fragment.
fn looks_delimited(pattern: &str) -> bool {
    if pattern.len() < 2 || !pattern.starts_with('/') {
        return false;
    }
    match pattern.rfind('/') {
        Some(0) => false,
        Some(last) => pattern[last + 1..].chars().all(|c| c.is_ascii_alphabetic()),
        None => false,
    }
}

struct TemplateGenerator {
    template: String,
}

impl MentionGenerator for TemplateGenerator {
    fn generate(&self, mention: &mut MentionData) -> bool {
        if mention.identifier.len() > limits::MAX_MENTION_LENGTH {
            return false;
        }
        mention.url = Some(self.template.replace("%s", &mention.identifier));
        true
    }
}
