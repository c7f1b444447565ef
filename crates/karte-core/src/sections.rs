//! Output section parsing and cleanup.
//!
//! Model output is free text with headings such as `治療経過:` or `【備考】`.
//! [`SectionParser`] folds it into a [`SectionMap`] keyed by the canonical
//! section names; [`format_output`] strips markdown decoration.

use karte_types::config::SectionConfig;
use karte_types::section::{DEFAULT_SECTION_ALIASES, DEFAULT_SECTION_NAMES, SectionMap};

/// Splits generated text into canonical sections.
///
/// Labels are scanned in one ordered list: canonical names first, each
/// mapping to itself, then aliases. The first label found in a line wins.
#[derive(Debug, Clone)]
pub struct SectionParser {
    sections: Vec<String>,
    labels: Vec<(String, String)>,
}

impl SectionParser {
    /// Build a parser from canonical names and `(alias, canonical)` pairs.
    pub fn new<N, A>(sections: N, aliases: A) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        A: IntoIterator<Item = (String, String)>,
    {
        let sections: Vec<String> = sections.into_iter().map(Into::into).collect();
        let labels = sections
            .iter()
            .map(|name| (name.clone(), name.clone()))
            .chain(aliases)
            .filter(|(label, _)| !label.is_empty())
            .collect();

        Self { sections, labels }
    }

    pub fn from_config(config: &SectionConfig) -> Self {
        Self::new(
            config.names.iter().cloned(),
            config
                .aliases
                .iter()
                .map(|a| (a.alias.clone(), a.section.clone())),
        )
    }

    /// Parse `text` into a map holding exactly the canonical sections.
    ///
    /// A heading line switches the active section; if text remains on the
    /// heading line after removing the label and colons, it replaces the
    /// section's content. Other lines append to the active section. Lines
    /// before the first heading are dropped.
    pub fn parse(&self, text: &str) -> SectionMap {
        let mut map = SectionMap::with_keys(self.sections.iter().cloned());
        let mut current: Option<&str> = None;

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some((label, section)) = self.match_label(line) {
                current = Some(section);
                let residual = line
                    .replace(label, "")
                    .replace([':', '：'], "");
                let residual = residual.trim();
                if !residual.is_empty() {
                    if let Some(slot) = map.get_mut(section) {
                        *slot = residual.to_string();
                    }
                }
                continue;
            }

            if let Some(slot) = current.and_then(|section| map.get_mut(section)) {
                if !slot.is_empty() {
                    slot.push('\n');
                }
                slot.push_str(line);
            }
        }

        map
    }

    fn match_label(&self, line: &str) -> Option<(&str, &str)> {
        self.labels
            .iter()
            .find(|(label, _)| line.contains(label.as_str()))
            .map(|(label, section)| (label.as_str(), section.as_str()))
    }
}

impl Default for SectionParser {
    fn default() -> Self {
        Self::new(
            DEFAULT_SECTION_NAMES,
            DEFAULT_SECTION_ALIASES
                .iter()
                .map(|(alias, section)| (alias.to_string(), section.to_string())),
        )
    }
}

/// Remove markdown decoration and spacing from generated text.
///
/// Strips `*`, `＊`, `#` and every whitespace character except line breaks.
/// Keeping `\n` and `\r` is intentional: formatted text must still split into
/// sections.
pub fn format_output(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '*' | '＊' | '#'))
        .filter(|c| *c == '\n' || *c == '\r' || !c.is_whitespace())
        .collect()
}

/// Parse `text` with the default canonical sections and aliases.
pub fn parse_sections(text: &str) -> SectionMap {
    SectionParser::default().parse(text)
}
