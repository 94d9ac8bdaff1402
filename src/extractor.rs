//! Target coordinate extraction from plain text lines
//!
//! This module pairs each `Target<N>` marker with the next
//! `Center: <x> m; <y> m; <z> m` line in a single forward pass.
//! Coordinates are kept as the exact substrings found in the document.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static TARGET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Target(\d+)").unwrap());

static CENTER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Center\s*:\s*([\d.\-]+)\s*m;\s*([\d.\-]+)\s*m;\s*([\d.\-]+)\s*m").unwrap()
});

/// One extracted row: a target id paired with its center coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRecord {
    /// `Target<N>`, with the digits as written in the marker
    #[serde(rename = "target")]
    pub target_id: String,
    /// Normalized display form `"<x> m; <y> m; <z> m"`
    #[serde(rename = "center")]
    pub center_text: String,
    pub x: String,
    pub y: String,
    pub z: String,
}

impl TargetRecord {
    pub fn new(target_id: String, x: &str, y: &str, z: &str) -> Self {
        Self {
            target_id,
            center_text: format!("{} m; {} m; {} m", x, y, z),
            x: x.to_string(),
            y: y.to_string(),
            z: z.to_string(),
        }
    }
}

/// Scanner state between lines
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// No target marker waiting for a center line
    #[default]
    Idle,
    /// The most recent target marker, not yet paired
    Pending(String),
}

/// Counters collected during one pass
///
/// These are diagnostics only; they never influence which records are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Number of lines fed to the scanner
    pub lines_scanned: usize,
    /// Lines containing a target marker
    pub target_markers: usize,
    /// Lines containing a well-formed center marker
    pub center_markers: usize,
    /// Records emitted
    pub records: usize,
    /// Center lines seen while no target was pending
    pub orphaned_centers: usize,
    /// Pending targets replaced by a later marker before being paired
    pub superseded_targets: usize,
    /// A target was still pending when input ended
    pub unpaired_target: bool,
}

/// Records plus the statistics of the pass that produced them
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub records: Vec<TargetRecord>,
    pub stats: ScanStats,
}

/// Line-at-a-time target/center pairing
///
/// Transitions:
/// - `Idle` + target marker -> `Pending(id)`
/// - `Pending(_)` + target marker -> `Pending(new_id)` (last marker wins)
/// - `Pending(id)` + center marker -> `Idle`, emitting a record
/// - `Idle` + center marker -> `Idle`, nothing emitted
///
/// Both markers are tested on every line, target first, so a line holding
/// both pairs with its own target.
#[derive(Debug, Default)]
pub struct TargetScanner {
    state: ScanState,
    stats: ScanStats,
}

impl TargetScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ScanState {
        &self.state
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// Scan one line, returning a record if it completed a pairing
    pub fn feed(&mut self, line: &str) -> Option<TargetRecord> {
        let line = line.trim();
        self.stats.lines_scanned += 1;

        if let Some(caps) = TARGET_RE.captures(line) {
            self.stats.target_markers += 1;
            let target_id = format!("Target{}", &caps[1]);
            if let ScanState::Pending(previous) = &self.state {
                log::debug!("{} replaced by {} before a center line", previous, target_id);
                self.stats.superseded_targets += 1;
            }
            self.state = ScanState::Pending(target_id);
        }

        let caps = CENTER_RE.captures(line)?;
        self.stats.center_markers += 1;

        match std::mem::take(&mut self.state) {
            ScanState::Pending(target_id) => {
                self.stats.records += 1;
                Some(TargetRecord::new(target_id, &caps[1], &caps[2], &caps[3]))
            }
            ScanState::Idle => {
                log::debug!("center line without a pending target: {:?}", line);
                self.stats.orphaned_centers += 1;
                None
            }
        }
    }

    /// End the pass and return its statistics
    pub fn finish(mut self) -> ScanStats {
        if let ScanState::Pending(target_id) = &self.state {
            log::debug!("{} has no center line before end of input", target_id);
            self.stats.unpaired_target = true;
        }
        self.stats
    }
}

/// Extract target records from a sequence of lines
pub fn extract_targets<I, S>(lines: I) -> Vec<TargetRecord>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extract_targets_with_stats(lines).records
}

/// Extract target records and the statistics of the pass
pub fn extract_targets_with_stats<I, S>(lines: I) -> Extraction
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = TargetScanner::new();
    let records: Vec<TargetRecord> = lines
        .into_iter()
        .filter_map(|line| scanner.feed(line.as_ref()))
        .collect();
    let stats = scanner.finish();

    log::debug!(
        "scanned {} lines: {} target markers, {} center markers, {} records",
        stats.lines_scanned,
        stats.target_markers,
        stats.center_markers,
        stats.records
    );

    Extraction { records, stats }
}

/// Extract target records from a text blob, splitting it into lines first
pub fn extract_from_text(text: &str) -> Extraction {
    extract_targets_with_stats(split_lines(text))
}

/// Whether a line contains a target marker
pub fn is_target_marker(line: &str) -> bool {
    TARGET_RE.is_match(line.trim())
}

/// Whether a line contains a well-formed center marker
pub fn is_center_marker(line: &str) -> bool {
    CENTER_RE.is_match(line.trim())
}

fn is_line_boundary(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split text on universal line boundaries
///
/// `\r\n` counts as one boundary and a trailing boundary does not yield an
/// extra empty line.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_line_boundary(c) {
            continue;
        }
        lines.push(&text[start..i]);
        let mut end = i + c.len_utf8();
        if c == '\r' {
            if let Some(&(j, '\n')) = chars.peek() {
                chars.next();
                end = j + 1;
            }
        }
        start = end;
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}
