//! Mention autolinking (`@handle` and similar).
//!
//! Each configured mention contributes a trigger on the first byte of its
//! prefix. A match becomes a Mention node wrapping its source text once
//! the generator supplies a URL; if the generator declines, the matched
//! text is consumed as plain text.

use std::sync::Arc;

use super::extension::{Environment, Extension, InlineHandler};
use super::InlineParser;
use crate::config::{CompiledMention, ConfigError, MentionConfig};
use crate::limits;
use crate::tree::{MentionData, NodeKind};

/// The mentions extension: a set of validated mention definitions.
#[derive(Debug)]
pub struct Mentions {
    compiled: Vec<Arc<CompiledMention>>,
}

impl Mentions {
    pub fn builder() -> MentionsBuilder {
        MentionsBuilder::default()
    }

    /// Validate and build a single mention definition.
    pub fn single(name: &str, config: MentionConfig) -> Result<Self, ConfigError> {
        Self::builder().mention(name, config).build()
    }
}

/// Collects raw mention records; validation runs in [`build`], before any
/// document is parsed.
///
/// [`build`]: MentionsBuilder::build
#[derive(Debug, Default)]
pub struct MentionsBuilder {
    configs: Vec<(String, MentionConfig)>,
}

impl MentionsBuilder {
    pub fn mention(mut self, name: impl Into<String>, config: MentionConfig) -> Self {
        self.configs.push((name.into(), config));
        self
    }

    pub fn build(self) -> Result<Mentions, ConfigError> {
        let mut compiled = Vec::with_capacity(self.configs.len());
        for (name, config) in self.configs {
            compiled.push(Arc::new(config.validate(&name)?));
        }
        Ok(Mentions { compiled })
    }
}

impl Extension for Mentions {
    fn extend(&self, env: &mut Environment) {
        for mention in &self.compiled {
            let Some(&trigger) = mention.prefix.as_bytes().first() else {
                continue;
            };
            env.add_handler(
                trigger,
                Box::new(MentionHandler {
                    mention: Arc::clone(mention),
                }),
            );
        }
    }
}

struct MentionHandler {
    mention: Arc<CompiledMention>,
}

impl InlineHandler for MentionHandler {
    fn parse(&self, parser: &mut InlineParser<'_>) -> bool {
        let start = parser.cursor().offset();

        // A prefix glued to the end of a word is not a mention.
        if parser.cursor().char_before(start).is_alphanumeric() {
            return false;
        }

        let rest = &parser.input()[start..];
        let Some(after_prefix) = rest.strip_prefix(self.mention.prefix.as_str()) else {
            return false;
        };
        let Some(matched) = self.mention.pattern.find(after_prefix) else {
            return false;
        };
        if matched.is_empty() || matched.len() > limits::MAX_MENTION_LENGTH {
            return false;
        }

        let mut data = MentionData {
            prefix: self.mention.prefix.clone(),
            identifier: matched.as_str().to_string(),
            url: None,
        };
        let generated = self.mention.generator.generate(&mut data);

        parser
            .cursor_mut()
            .advance(self.mention.prefix.len() + matched.end());

        let literal = data.literal();
        if generated && data.url.is_some() {
            let node = parser.append(NodeKind::Mention(data));
            let text = parser.tree_mut().new_node(NodeKind::Text(literal));
            parser.tree_mut().append(node, text);
        } else {
            // No replacement: the recognized text stays plain.
            parser.append_text(literal);
        }
        true
    }
}
