//! Vocab — the built-in literal vocabularies behind each line rule.

/// Default literals for the relevance rules.
pub struct Vocabulary;

impl Vocabulary {
    /// Names of the tracked accessory and generic synonyms (case-insensitive).
    pub const KEYWORDS: &'static [&'static str] = &["apple pencil", "applepencil", "pencil", "stylus"];

    /// Known stylus hardware model codes (case-sensitive).
    pub const MODEL_IDENTIFIERS: &'static [&'static str] = &["A1603", "A2051", "A2538", "A2539", "A2633"];

    /// Tokens that open a structured device-state snapshot or carry a
    /// last-detection tick (case-insensitive).
    pub const STATE_DUMP_MARKERS: &'static [&'static str] = &["statedump", "lastseen"];

    /// Field name that carries the advertised device name (case-insensitive).
    pub const DEVICE_NAME_MARKERS: &'static [&'static str] = &["gapname"];

    /// Source-name fragments marking a connectivity-dedicated log (case-insensitive).
    pub const CONNECTIVITY_SOURCES: &'static [&'static str] = &["bluetooth"];

    pub const DEVICE_MARKERS: &'static [&'static str] = &["Device"];

    pub const SIGNAL_MARKERS: &'static [&'static str] = &["RSSI"];

    /// Link up/down events. `Connect` is capitalised on purpose, matching
    /// "Connected"/"Connection" but not "disconnect".
    pub const LINK_EVENT_MARKERS: &'static [&'static str] = &["Connect", "disconnect"];
}
