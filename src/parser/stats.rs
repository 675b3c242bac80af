//! Formatting statistics gathered while parsing

use crate::document::{NameFormatting, Properties, ProtectCasing, StringDelimiter};
use crate::model::{CommentContext, Element};
use ahash::AHashMap;

/// Counters collected during one import
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub curly_brackets: usize,
    pub quotation_marks: usize,
    pub protected_titles: usize,
    pub unprotected_titles: usize,
    pub last_first_names: usize,
    pub first_last_names: usize,
    pub comment_contexts: AHashMap<CommentContext, usize>,
    pub comment_prefixes: AHashMap<String, usize>,
    pub list_separator: Option<String>,
}

impl Statistics {
    /// Record a braced or quoted title
    pub fn record_title(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if text.starts_with('{') && text.ends_with('}') {
            self.protected_titles += 1;
        } else {
            self.unprotected_titles += 1;
        }
    }

    /// Record a comment and its prefix, if any
    pub fn record_comment(&mut self, context: CommentContext, prefix: &str) {
        *self.comment_contexts.entry(context).or_default() += 1;
        if context == CommentContext::Prefix {
            *self.comment_prefixes.entry(prefix.to_string()).or_default() += 1;
        }
    }

    fn comment_count(&self, context: CommentContext) -> usize {
        self.comment_contexts.get(&context).copied().unwrap_or(0)
    }

    fn string_delimiter(&self) -> StringDelimiter {
        if self.quotation_marks > self.curly_brackets {
            StringDelimiter::Quotes
        } else {
            StringDelimiter::Braces
        }
    }

    fn name_formatting(&self) -> NameFormatting {
        if self.first_last_names > self.last_first_names {
            NameFormatting::FirstLast
        } else {
            NameFormatting::LastFirst
        }
    }

    fn protect_casing(&self) -> ProtectCasing {
        if self.protected_titles > 4 * self.unprotected_titles {
            ProtectCasing::Checked
        } else if 4 * self.protected_titles < self.unprotected_titles {
            ProtectCasing::Unchecked
        } else {
            ProtectCasing::Partial
        }
    }

    fn comment_context(&self) -> CommentContext {
        let total: usize = self.comment_contexts.values().sum();
        [CommentContext::Command, CommentContext::Verbatim]
            .into_iter()
            .find(|context| 2 * self.comment_count(*context) > total)
            .unwrap_or(CommentContext::Prefix)
    }

    fn comment_prefix(&self) -> Option<String> {
        let mut prefixes: Vec<(&String, &usize)> = self.comment_prefixes.iter().collect();
        prefixes.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        prefixes.first().map(|(prefix, _)| (*prefix).clone())
    }

    /// Derive document properties from the counters and the parsed elements
    #[must_use]
    pub fn into_properties(self, encoding: String, elements: &[Element]) -> Properties {
        let defaults = Properties::default();
        Properties {
            encoding,
            string_delimiter: self.string_delimiter(),
            name_formatting: self.name_formatting(),
            protect_casing: self.protect_casing(),
            comment_context: self.comment_context(),
            comment_prefix: self.comment_prefix().unwrap_or(defaults.comment_prefix),
            list_separator: self.list_separator.clone(),
            sorted_by_id: sorted_by_id(elements),
        }
    }
}

/// At least two entries, in non-decreasing case-insensitive id order
fn sorted_by_id(elements: &[Element]) -> bool {
    let ids: Vec<String> = elements
        .iter()
        .filter_map(|e| match e {
            Element::Entry(entry) => Some(entry.id.to_lowercase()),
            _ => None,
        })
        .collect();
    ids.len() >= 2 && ids.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Entry;

    fn entries(ids: &[&str]) -> Vec<Element> {
        ids.iter()
            .map(|id| Element::Entry(Entry::new("article", *id)))
            .collect()
    }

    #[test]
    fn test_protect_casing() {
        let mut stats = Statistics {
            protected_titles: 9,
            unprotected_titles: 1,
            ..Statistics::default()
        };
        assert_eq!(stats.protect_casing(), ProtectCasing::Checked);

        stats.protected_titles = 5;
        stats.unprotected_titles = 5;
        assert_eq!(stats.protect_casing(), ProtectCasing::Partial);

        stats.protected_titles = 1;
        stats.unprotected_titles = 9;
        assert_eq!(stats.protect_casing(), ProtectCasing::Unchecked);

        assert_eq!(Statistics::default().protect_casing(), ProtectCasing::Partial);
    }

    #[test]
    fn test_record_title() {
        let mut stats = Statistics::default();
        stats.record_title("{Protected Title}");
        stats.record_title("Plain {DNA} title");
        stats.record_title("");
        assert_eq!(stats.protected_titles, 1);
        assert_eq!(stats.unprotected_titles, 1);
    }

    #[test]
    fn test_delimiter_and_names() {
        let stats = Statistics {
            quotation_marks: 3,
            curly_brackets: 2,
            first_last_names: 1,
            last_first_names: 1,
            ..Statistics::default()
        };
        assert_eq!(stats.string_delimiter(), StringDelimiter::Quotes);
        assert_eq!(stats.name_formatting(), NameFormatting::LastFirst);
    }

    #[test]
    fn test_comment_statistics() {
        let mut stats = Statistics::default();
        assert_eq!(stats.comment_context(), CommentContext::Prefix);

        stats.record_comment(CommentContext::Command, "");
        stats.record_comment(CommentContext::Command, "");
        stats.record_comment(CommentContext::Prefix, "%% ");
        assert_eq!(stats.comment_context(), CommentContext::Command);

        stats.record_comment(CommentContext::Prefix, "% ");
        stats.record_comment(CommentContext::Prefix, "%% ");
        assert_eq!(stats.comment_context(), CommentContext::Prefix);
        assert_eq!(stats.comment_prefix().as_deref(), Some("%% "));
    }

    #[test]
    fn test_sorted_by_id() {
        assert!(sorted_by_id(&entries(&["alpha", "Beta", "gamma"])));
        assert!(!sorted_by_id(&entries(&["beta", "alpha"])));
        assert!(!sorted_by_id(&entries(&["single"])));

        let properties = Statistics::default().into_properties("UTF-8".into(), &entries(&["a", "b"]));
        assert!(properties.sorted_by_id);
        assert_eq!(properties.comment_prefix, "% ");
    }
}
