//! Ahead/behind cells of the fork table
//!
//! A cell keeps the commit count and one detail line per commit. The HTML
//! rendering is what a table widget sorts and shows in its popover; the
//! plain text is for terminals.

use chrono::{DateTime, Utc};
use forks_client::types::single_line;
use forks_client::CommitDigest;

/// Longest detail line, in characters
pub const DETAIL_LINE_LIMIT: usize = 150;

/// Direction of a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSign {
    /// Commits in the fork that the origin lacks
    Ahead,
    /// Commits in the origin that the fork lacks
    Behind,
}

impl DiffSign {
    pub fn symbol(&self) -> char {
        match self {
            DiffSign::Ahead => '+',
            DiffSign::Behind => '-',
        }
    }
}

/// One commit in a cell's detail block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitLine {
    pub sha: String,
    /// Link to the commit in the fork
    pub url: String,
    text: String,
}

impl CommitLine {
    fn new(commit: &CommitDigest, repo_url: &str) -> Self {
        let date = commit
            .date
            .as_ref()
            .map(format_date)
            .unwrap_or_else(|| "-".to_string());
        let author = commit.author_login.as_deref().unwrap_or("-");
        let text = single_line(
            &format!("{} {} {} - {}", commit.sha, date, author, commit.message),
            DETAIL_LINE_LIMIT,
        );

        Self {
            sha: commit.sha.clone(),
            url: format!("{}/commit/{}", repo_url, commit.sha),
            text,
        }
    }

    /// `sha date author - message`, at most `DETAIL_LINE_LIMIT` characters
    pub fn text(&self) -> &str {
        &self.text
    }

    fn html(&self) -> String {
        let rest = self.text.strip_prefix(self.sha.as_str()).unwrap_or(&self.text);
        format!("<a href=\"{}\">{}</a>{}", self.url, self.sha, rest)
    }
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Result of one comparison direction for one fork
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffCell {
    count: usize,
    label: String,
    lines: Vec<CommitLine>,
}

impl DiffCell {
    /// The cell of a branch compared with itself
    pub fn zero() -> Self {
        Self {
            count: 0,
            label: "0".to_string(),
            lines: Vec::new(),
        }
    }

    /// Build a cell from the commits of one comparison
    ///
    /// `repo_url` is the web URL of the fork the commit links point into.
    pub fn from_commits(sign: DiffSign, commits: &[CommitDigest], repo_url: &str) -> Self {
        if commits.is_empty() {
            return Self::zero();
        }

        Self {
            count: commits.len(),
            label: format!("{}{}", sign.symbol(), commits.len()),
            lines: commits.iter().map(|c| CommitLine::new(c, repo_url)).collect(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0
    }

    /// `"0"`, `"+N"` or `"-N"`
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn lines(&self) -> &[CommitLine] {
        &self.lines
    }

    /// Hidden marker that makes the rendered cell sort by count
    pub fn sort_marker(&self) -> String {
        format!("<!--{:04}-->", self.count % 10_000)
    }

    /// Detail lines as plain text, one commit per line
    pub fn detail_text(&self) -> String {
        self.lines
            .iter()
            .map(CommitLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// HTML-escaped `<pre>` block with the detail lines, `None` for zero
    pub fn detail_html(&self) -> Option<String> {
        if self.is_zero() {
            return None;
        }

        let body = self
            .lines
            .iter()
            .map(CommitLine::html)
            .collect::<Vec<_>>()
            .join("\n");
        Some(format!("<pre>{}</pre>", escape_html(&body)))
    }

    /// Table cell markup: marker, label and the detail popover
    pub fn to_html(&self) -> String {
        match self.detail_html() {
            None => self.label.clone(),
            Some(details) => format!(
                "{}<a tabindex=\"0\" data-toggle=\"popover\" data-trigger=\"focus\" \
                 data-html=\"true\" title=\"Commits\" data-content=\"{}\">{}</a>",
                self.sort_marker(),
                details,
                self.label
            ),
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const FORK_URL: &str = "https://github.com/alice/project";

    fn commit(sha: &str, login: Option<&str>, message: &str) -> CommitDigest {
        CommitDigest {
            sha: sha.to_string(),
            author_login: login.map(str::to_string),
            date: Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 0).single(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_empty_comparison_is_zero() {
        let cell = DiffCell::from_commits(DiffSign::Ahead, &[], FORK_URL);
        assert_eq!(cell, DiffCell::zero());
        assert_eq!(cell.label(), "0");
        assert_eq!(cell.detail_html(), None);
        assert_eq!(cell.to_html(), "0");
    }

    #[test]
    fn test_labels_carry_the_sign() {
        let commits = vec![commit("abc123", Some("alice"), "one"), commit("def456", None, "two")];

        let ahead = DiffCell::from_commits(DiffSign::Ahead, &commits, FORK_URL);
        let behind = DiffCell::from_commits(DiffSign::Behind, &commits, FORK_URL);

        assert_eq!(ahead.label(), "+2");
        assert_eq!(behind.label(), "-2");
        assert_eq!(ahead.count(), 2);
    }

    #[test]
    fn test_sort_marker_is_zero_padded() {
        let commits = vec![commit("abc123", None, "x"); 7];
        let cell = DiffCell::from_commits(DiffSign::Behind, &commits, FORK_URL);
        assert_eq!(cell.sort_marker(), "<!--0007-->");
        assert!(cell.to_html().starts_with("<!--0007--><a "));
        assert!(cell.to_html().ends_with(">-7</a>"));
    }

    #[test]
    fn test_detail_text() {
        let commits = vec![
            commit("abc123", Some("alice"), "Fix parser"),
            commit("def456", None, "Bump deps"),
        ];
        let cell = DiffCell::from_commits(DiffSign::Ahead, &commits, FORK_URL);

        assert_eq!(
            cell.detail_text(),
            "abc123 2024-03-09 alice - Fix parser\ndef456 2024-03-09 - - Bump deps"
        );
        assert_eq!(
            cell.lines()[0].url,
            "https://github.com/alice/project/commit/abc123"
        );
    }

    #[test]
    fn test_detail_lines_are_cut() {
        let long = "y".repeat(300);
        let cell = DiffCell::from_commits(DiffSign::Ahead, &[commit("abc123", None, &long)], FORK_URL);
        assert_eq!(cell.lines()[0].text().chars().count(), DETAIL_LINE_LIMIT);
    }

    #[test]
    fn test_detail_html_is_escaped() {
        let cell = DiffCell::from_commits(
            DiffSign::Ahead,
            &[commit("abc123", Some("bob"), "Use <T> & \"quotes\"")],
            FORK_URL,
        );

        let html = cell.detail_html().unwrap();
        assert!(html.starts_with("<pre>&lt;a href=&quot;https://github.com/alice/project/commit/abc123&quot;&gt;abc123&lt;/a&gt;"));
        assert!(html.contains("Use &lt;T&gt; &amp; &quot;quotes&quot;"));
        assert!(html.ends_with("</pre>"));
    }
}
