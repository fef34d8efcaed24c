//! Best-effort line numbers for extracted declarations.
//!
//! Neither `hcl-rs` nor `serde_json` expose spans, so declarations are
//! located by scanning the raw text. A line is handed out once, so
//! repeated declarations of the same name get distinct lines.

use regex::Regex;
use std::collections::HashSet;

pub(crate) struct LineLocator<'a> {
    lines: Vec<&'a str>,
    claimed: HashSet<usize>,
}

impl<'a> LineLocator<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            claimed: HashSet::new(),
        }
    }

    /// 1-based numbers of every line matching `re`.
    pub(crate) fn all(&self, re: &Regex) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, line)| re.is_match(line))
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// Claim the first unclaimed line at or after `from` (1-based) that
    /// matches `re`. Returns 0 when there is none.
    pub(crate) fn claim(&mut self, re: &Regex, from: usize) -> usize {
        let start = from.saturating_sub(1);
        let found = self
            .lines
            .iter()
            .enumerate()
            .skip(start)
            .find(|(i, line)| !self.claimed.contains(i) && re.is_match(line))
            .map(|(i, _)| i);

        match found {
            Some(i) => {
                self.claimed.insert(i);
                i + 1
            }
            None => 0,
        }
    }

    /// Claim the line declaring `key`, written as `key = ` (HCL) or
    /// `"key": ` (JSON), quoted or not.
    pub(crate) fn claim_key(&mut self, key: &str, from: usize) -> usize {
        let pattern = format!(r#"^\s*"?{}"?\s*[=:]"#, regex::escape(key));
        match Regex::new(&pattern) {
            Ok(re) => self.claim(&re, from),
            Err(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "terraform {\n  required_providers {\n    aws = \">= 4.0\"\n    aws = \"~> 5.0\"\n  }\n}\n";

    #[test]
    fn test_claim_key_hands_out_distinct_lines() {
        let mut locator = LineLocator::new(TEXT);
        assert_eq!(locator.claim_key("aws", 1), 3);
        assert_eq!(locator.claim_key("aws", 1), 4);
        assert_eq!(locator.claim_key("aws", 1), 0);
    }

    #[test]
    fn test_claim_respects_start_line() {
        let mut locator = LineLocator::new(TEXT);
        assert_eq!(locator.claim_key("aws", 4), 4);
    }

    #[test]
    fn test_all_lists_headers() {
        let locator = LineLocator::new(TEXT);
        let re = Regex::new(r"^\s*required_providers\b").unwrap();
        assert_eq!(locator.all(&re), vec![2]);
    }

    #[test]
    fn test_key_is_escaped() {
        let mut locator = LineLocator::new("  \"a.b\": \"1.0\"\n");
        assert_eq!(locator.claim_key("a.b", 1), 1);
        assert_eq!(locator.claim_key("a+b", 1), 0);
    }
}
