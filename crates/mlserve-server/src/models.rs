//! Demo prediction models
//!
//! Rule-based keyword matching over transcripts and raw text. These stand in
//! for real inference models; the marshalling core only sees them as opaque
//! prediction functions.

use std::path::Path;

use mlserve_core::TimedSegment;

const DEFAULT_KEYWORDS: &[&str] = &[
    "attack", "bomb", "explosive", "hostage", "threat", "weapon",
];

/// Flags text that mentions any of a configured set of threat keywords.
#[derive(Debug, Clone)]
pub struct ThreatScanner {
    keywords: Vec<String>,
}

impl Default for ThreatScanner {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl ThreatScanner {
    pub fn with_keywords(keywords: impl IntoIterator<Item = String>) -> Self {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.to_ascii_lowercase())
                .collect(),
        }
    }

    /// Keywords present in `text`, case-insensitive.
    pub fn matches<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let lowered = text.to_ascii_lowercase();
        self.keywords
            .iter()
            .filter(|keyword| lowered.contains(keyword.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// One-line report for a single text, suitable for a TEXT output route.
    pub fn report(&self, text: &str) -> String {
        let hits = self.matches(text);
        if hits.is_empty() {
            "no threats detected".to_string()
        } else {
            format!("threats detected: {}", hits.join(", "))
        }
    }

    /// Read a timestamped transcript file and return the segments that
    /// mention a threat keyword, in transcript order.
    ///
    /// Each non-empty line is `start end text` with offsets in seconds,
    /// e.g. `3.5 7.25 they planted a bomb`.
    pub fn scan_transcript(&self, path: &Path) -> anyhow::Result<Vec<TimedSegment>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading transcript `{}`: {e}", path.display()))?;

        let mut flagged = Vec::new();
        for (lineno, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let segment = parse_segment(line).map_err(|e| {
                anyhow::anyhow!("transcript `{}` line {}: {e}", path.display(), lineno + 1)
            })?;
            if !self.matches(&segment.text).is_empty() {
                flagged.push(segment);
            }
        }
        Ok(flagged)
    }
}

fn parse_segment(line: &str) -> anyhow::Result<TimedSegment> {
    let mut parts = line.splitn(3, ' ');
    let start = parts
        .next()
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| anyhow::anyhow!("expected `start end text`, got `{line}`"))?;
    let end = parts
        .next()
        .and_then(|raw| raw.parse::<f64>().ok())
        .ok_or_else(|| anyhow::anyhow!("expected `start end text`, got `{line}`"))?;
    let text = parts.next().unwrap_or("").trim().to_string();
    Ok(TimedSegment { start, end, text })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_is_case_insensitive() {
        let scanner = ThreatScanner::default();
        assert_eq!(scanner.matches("a Bomb in the basement"), ["bomb"]);
        assert!(scanner.matches("a calm afternoon").is_empty());
    }

    #[test]
    fn report_names_every_hit() {
        let scanner = ThreatScanner::default();
        let report = scanner.report("an attack with a weapon");
        assert_eq!(report, "threats detected: attack, weapon");
    }

    #[test]
    fn transcript_scan_keeps_only_flagged_segments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("call.txt");
        std::fs::write(
            &path,
            "0.0 3.5 good morning everyone\n3.5 7.25 they planted a bomb\n7.25 9.0 see you later\n",
        )
        .unwrap();

        let scanner = ThreatScanner::default();
        let flagged = scanner.scan_transcript(&path).unwrap();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].start, 3.5);
        assert_eq!(flagged[0].text, "they planted a bomb");
    }

    #[test]
    fn malformed_transcript_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.txt");
        std::fs::write(&path, "not a transcript line\n").unwrap();

        let err = ThreatScanner::default().scan_transcript(&path).unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }
}
