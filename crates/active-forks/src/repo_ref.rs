//! Repository identifier parsing

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// The input is not an "owner/name" repository identifier
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Invalid GitHub repository! Format is <username>/<repo>")]
pub struct InputError {
    /// The rejected input, after normalization
    pub input: String,
}

/// A repository, identified by owner and name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryRef {
    owner: String,
    name: String,
}

impl RepositoryRef {
    /// Parse free-form input such as `owner/repo`,
    /// `https://github.com/owner/repo` or `owner/repo.git`
    pub fn parse(input: &str) -> Result<Self, InputError> {
        Self::parse_with_web_base(input, GITHUB_WEB)
    }

    /// Like [`RepositoryRef::parse`], also accepting URLs on `web_base`
    /// (a GitHub Enterprise host, for example)
    pub fn parse_with_web_base(input: &str, web_base: &str) -> Result<Self, InputError> {
        static REPO_REGEX: OnceLock<Regex> = OnceLock::new();

        // ASCII only, GitHub logins and repository names never contain other letters
        let re = REPO_REGEX.get_or_init(|| {
            Regex::new(r"^([-_A-Za-z0-9]+)/([-_.A-Za-z0-9]+)$")
                .expect("repository pattern is valid")
        });

        let normalized = normalize(input, web_base);
        let captures = re.captures(&normalized).ok_or_else(|| InputError {
            input: normalized.clone(),
        })?;

        Ok(Self {
            owner: captures[1].to_string(),
            name: captures[2].to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

const GITHUB_WEB: &str = "https://github.com";

/// Host part of a web base URL, without scheme or trailing slash
fn web_host(web_base: &str) -> &str {
    let base = web_base.trim().trim_end_matches('/');
    base.split_once("://").map_or(base, |(_, host)| host)
}

fn strip_host<'a>(input: &'a str, host: &str) -> Option<&'a str> {
    ["https://", "http://"].iter().find_map(|scheme| {
        input
            .strip_prefix(scheme)?
            .strip_prefix(host)?
            .strip_prefix('/')
    })
}

fn normalize(input: &str, web_base: &str) -> String {
    let trimmed = input.trim().trim_end_matches('/');
    let without_host = strip_host(trimmed, web_host(GITHUB_WEB))
        .or_else(|| strip_host(trimmed, web_host(web_base)))
        .unwrap_or(trimmed);
    without_host
        .strip_suffix(".git")
        .unwrap_or(without_host)
        .to_string()
}

impl FromStr for RepositoryRef {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
