//! Rules — independent line predicates evaluated in a fixed order.
//!
//! Each rule sees one [`LineRecord`] (the raw line plus the provenance of the
//! text it came from) and nothing else, so a line's decision never depends
//! on the lines around it.

use grep_matcher::Matcher;
use grep_regex::{RegexMatcher, RegexMatcherBuilder};
use serde::Serialize;

use super::FilterError;
use crate::conf::FilterConfig;

/// Which rule admitted a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Keyword,
    Identifier,
    StateDump,
    Connectivity,
}

/// Where the text under inspection came from.
#[derive(Debug, Clone)]
pub struct Provenance {
    source_name: String,
    connectivity: bool,
}

impl Provenance {
    /// `hints` are lower-case fragments; a source whose name contains any of
    /// them is treated as connectivity-dedicated.
    pub fn new(source_name: impl Into<String>, hints: &[String]) -> Self {
        let source_name = source_name.into();
        let lower = source_name.to_lowercase();
        let connectivity = hints
            .iter()
            .any(|hint| !hint.is_empty() && lower.contains(&hint.to_lowercase()));
        Self {
            source_name,
            connectivity,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn is_connectivity(&self) -> bool {
        self.connectivity
    }
}

pub struct LineRecord<'a> {
    pub text: &'a str,
    pub provenance: &'a Provenance,
}

impl<'a> LineRecord<'a> {
    pub fn new(text: &'a str, provenance: &'a Provenance) -> Self {
        Self { text, provenance }
    }

    #[inline]
    fn bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }
}

pub trait LineRule: Send + Sync {
    fn rule(&self) -> MatchRule;
    fn matches(&self, line: &LineRecord<'_>) -> bool;
}

/// A compiled alternation of plain literals.
#[derive(Debug, Clone)]
pub struct LiteralSet {
    matcher: RegexMatcher,
}

impl LiteralSet {
    pub fn new(literals: &[String], case_sensitive: bool, name: &'static str) -> Result<Self, FilterError> {
        if literals.is_empty() {
            return Err(FilterError::EmptyVocabulary(name));
        }
        let matcher = RegexMatcherBuilder::new()
            .case_insensitive(!case_sensitive)
            .multi_line(false)
            .fixed_strings(true)
            .build_literals(literals)
            .map_err(|e| FilterError::InvalidVocabulary(format!("{}: {}", name, e)))?;
        Ok(Self { matcher })
    }

    #[inline]
    pub fn is_match(&self, haystack: &[u8]) -> bool {
        self.matcher.is_match(haystack).unwrap_or(false)
    }
}

/// Rule 1: names of the accessory, case-insensitive.
pub struct KeywordRule {
    keywords: LiteralSet,
}

impl LineRule for KeywordRule {
    fn rule(&self) -> MatchRule {
        MatchRule::Keyword
    }

    fn matches(&self, line: &LineRecord<'_>) -> bool {
        self.keywords.is_match(line.bytes())
    }
}

/// Rule 2: hardware model codes, case-sensitive.
pub struct IdentifierRule {
    identifiers: LiteralSet,
}

impl LineRule for IdentifierRule {
    fn rule(&self) -> MatchRule {
        MatchRule::Identifier
    }

    fn matches(&self, line: &LineRecord<'_>) -> bool {
        self.identifiers.is_match(line.bytes())
    }
}

/// Rule 3: a state-dump or last-seen marker corroborated by a keyword,
/// an identifier, or a device-name field.
pub struct StateDumpRule {
    markers: LiteralSet,
    keywords: LiteralSet,
    identifiers: LiteralSet,
    device_names: LiteralSet,
}

impl LineRule for StateDumpRule {
    fn rule(&self) -> MatchRule {
        MatchRule::StateDump
    }

    fn matches(&self, line: &LineRecord<'_>) -> bool {
        let bytes = line.bytes();
        self.markers.is_match(bytes)
            && (self.keywords.is_match(bytes)
                || self.identifiers.is_match(bytes)
                || self.device_names.is_match(bytes))
    }
}

/// Rule 4: generic link events, only inside connectivity-dedicated sources.
pub struct ConnectivityRule {
    devices: LiteralSet,
    signals: LiteralSet,
    link_events: LiteralSet,
}

impl LineRule for ConnectivityRule {
    fn rule(&self) -> MatchRule {
        MatchRule::Connectivity
    }

    fn matches(&self, line: &LineRecord<'_>) -> bool {
        if !line.provenance.is_connectivity() {
            return false;
        }
        let bytes = line.bytes();
        (self.devices.is_match(bytes) && self.signals.is_match(bytes)) || self.link_events.is_match(bytes)
    }
}

/// Ordered rule list evaluated with short-circuit OR.
pub struct RuleSet {
    rules: Vec<Box<dyn LineRule>>,
}

impl RuleSet {
    pub fn new(rules: Vec<Box<dyn LineRule>>) -> Self {
        Self { rules }
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self, FilterError> {
        let keywords = LiteralSet::new(&config.keywords, false, "keywords")?;
        let identifiers = LiteralSet::new(&config.identifiers, true, "identifiers")?;

        let rules: Vec<Box<dyn LineRule>> = vec![
            // Order matters! Cheapest, strongest signals first
            Box::new(KeywordRule {
                keywords: keywords.clone(),
            }),
            Box::new(IdentifierRule {
                identifiers: identifiers.clone(),
            }),
            Box::new(StateDumpRule {
                markers: LiteralSet::new(&config.state_dump_markers, false, "state_dump_markers")?,
                keywords,
                identifiers,
                device_names: LiteralSet::new(&config.device_name_markers, false, "device_name_markers")?,
            }),
            Box::new(ConnectivityRule {
                devices: LiteralSet::new(&config.device_markers, true, "device_markers")?,
                signals: LiteralSet::new(&config.signal_markers, true, "signal_markers")?,
                link_events: LiteralSet::new(&config.link_event_markers, true, "link_event_markers")?,
            }),
        ];

        Ok(Self::new(rules))
    }

    /// First rule that admits the line, if any.
    #[inline]
    pub fn classify(&self, line: &LineRecord<'_>) -> Option<MatchRule> {
        self.rules
            .iter()
            .find(|rule| rule.matches(line))
            .map(|rule| rule.rule())
    }

    pub fn order(&self) -> Vec<MatchRule> {
        self.rules.iter().map(|rule| rule.rule()).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::from_config(&FilterConfig::default()).expect("default rules compile")
    }

    fn generic() -> Provenance {
        Provenance::new("combined_logs.txt", &["bluetooth".to_string()])
    }

    fn bluetooth() -> Provenance {
        Provenance::new("Bluetooth_status.log", &["bluetooth".to_string()])
    }

    fn classify(line: &str, provenance: &Provenance) -> Option<MatchRule> {
        rules().classify(&LineRecord::new(line, provenance))
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            rules().order(),
            vec![
                MatchRule::Keyword,
                MatchRule::Identifier,
                MatchRule::StateDump,
                MatchRule::Connectivity
            ]
        );
    }

    #[test]
    fn test_provenance_hint_is_case_insensitive() {
        assert!(bluetooth().is_connectivity());
        assert!(!generic().is_connectivity());
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let p = generic();
        assert_eq!(classify("APPLE PENCIL battery 40%", &p), Some(MatchRule::Keyword));
        assert_eq!(classify("stylus hover began", &p), Some(MatchRule::Keyword));
        assert_eq!(classify("Pencil attached", &p), Some(MatchRule::Keyword));
    }

    #[test]
    fn test_identifier_case_sensitive() {
        let p = generic();
        assert_eq!(classify("accessory model A2538 paired", &p), Some(MatchRule::Identifier));
        assert_eq!(classify("accessory model a2538 paired", &p), None);
    }

    #[test]
    fn test_state_dump_with_gap_name() {
        let p = generic();
        let line = r#"statedump: ... -> ... GAPName: "Apple Pencil Pro", LastSeen: 25946174, LastConn: 314488"#;
        // The keyword rule wins the short-circuit; the line is kept either way.
        assert_eq!(classify(line, &p), Some(MatchRule::Keyword));

        let bare = "statedump: device 7F GAPName: \"Unknown\", LastSeen: 25946174";
        assert_eq!(classify(bare, &p), Some(MatchRule::StateDump));
    }

    #[test]
    fn test_state_dump_requires_corroboration() {
        let p = generic();
        assert_eq!(classify("statedump: heap usage 41MB", &p), None);
        assert_eq!(classify("LastSeen: 2134 for beacon 09", &p), None);
    }

    #[test]
    fn test_connectivity_rule_only_in_bluetooth_sources() {
        assert_eq!(classify("Device 04:12 RSSI -62", &bluetooth()), Some(MatchRule::Connectivity));
        assert_eq!(classify("Device 04:12 RSSI -62", &generic()), None);
    }

    #[test]
    fn test_connectivity_link_events() {
        let p = bluetooth();
        assert_eq!(classify("Connected to AirPods", &p), Some(MatchRule::Connectivity));
        assert_eq!(classify("remote requested disconnect", &p), Some(MatchRule::Connectivity));
        assert_eq!(classify("connection idle", &p), None);
        assert_eq!(classify("Device battery 80%", &p), None);
    }

    #[test]
    fn test_unrelated_accessory_excluded() {
        let p = generic();
        assert_eq!(classify("Connected to Magic Keyboard, RSSI -48 Device 3C:22", &p), None);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let set = rules();
        let p = bluetooth();
        let lines = ["Device 1 RSSI -70", "nothing here", "stylus", "A2051"];
        let first: Vec<_> = lines.iter().map(|l| set.classify(&LineRecord::new(l, &p))).collect();
        let second: Vec<_> = lines.iter().map(|l| set.classify(&LineRecord::new(l, &p))).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let cfg = FilterConfig {
            keywords: vec![],
            ..FilterConfig::default()
        };
        assert!(matches!(
            RuleSet::from_config(&cfg),
            Err(FilterError::EmptyVocabulary("keywords"))
        ));
    }

    #[test]
    fn test_custom_rule_list() {
        struct Always;
        impl LineRule for Always {
            fn rule(&self) -> MatchRule {
                MatchRule::Keyword
            }
            fn matches(&self, _line: &LineRecord<'_>) -> bool {
                true
            }
        }
        let set = RuleSet::new(vec![Box::new(Always)]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.classify(&LineRecord::new("", &generic())), Some(MatchRule::Keyword));
    }

    #[test]
    fn test_literals_are_not_regex() {
        let set = LiteralSet::new(&["a.c".to_string()], true, "test").expect("compile");
        assert!(set.is_match(b"xa.cx"));
        assert!(!set.is_match(b"abc"));
    }

    #[test]
    fn test_metacharacters_in_vocabulary_compile() {
        let set = LiteralSet::new(&["A2051 (rev".to_string(), "c++".to_string()], false, "test")
            .expect("compile");
        assert!(set.is_match(b"accessory a2051 (rev b)"));
        assert!(set.is_match(b"built with C++"));
        assert!(!set.is_match(b"A2051 rev"));
    }
}
