//! Prompt marker detection over the tail of accumulated output.

use regex::bytes::Regex;

/// How many trailing bytes of the buffer are scanned for markers.
///
/// Prompts sit at the very end of a response, so a short tail scan
/// keeps detection cheap even for multi-megabyte outputs.
pub const MARKER_WINDOW: usize = 50;

/// Marker literals covering common network operating systems.
const DEFAULT_MARKERS: [&str; 4] = ["#", ">", "Switch", "Router"];

/// Detects prompt markers in the tail of accumulated output.
///
/// Marker literals are compiled into a single alternation so the tail
/// is scanned once per check regardless of how many markers are
/// registered.
///
/// The default set is a heuristic tuned to Cisco-style prompts. A
/// marker that happens to appear inside regular output ends the read
/// early, and a device with a different prompt convention never
/// triggers the fast path, leaving reads to the idle gap or the
/// ceiling. Supply a custom set for such devices.
#[derive(Debug, Clone)]
pub struct PromptMarkers {
    pattern: Option<Regex>,
}

impl PromptMarkers {
    /// Compile a marker set from literal strings.
    ///
    /// An empty set never matches, which leaves reads to end on the
    /// idle gap or the ceiling instead.
    pub fn from_literals<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let escaped: Vec<String> = markers
            .into_iter()
            .map(|m| regex::escape(m.as_ref()))
            .collect();

        let pattern = if escaped.is_empty() {
            None
        } else {
            // Escaped literals always compile
            Some(Regex::new(&escaped.join("|")).unwrap())
        };

        Self { pattern }
    }

    /// Check whether any marker appears in the trailing
    /// [`MARKER_WINDOW`] bytes of `data`.
    pub fn seen_in_tail(&self, data: &[u8]) -> bool {
        let start = data.len().saturating_sub(MARKER_WINDOW);
        let tail = &data[start..];
        self.pattern.as_ref().is_some_and(|p| p.is_match(tail))
    }
}

impl Default for PromptMarkers {
    fn default() -> Self {
        Self::from_literals(DEFAULT_MARKERS)
    }
}
