//! Token resolution
//!
//! Finds a pre-obtained token; it never runs an authentication flow.

use log::debug;

/// Resolves the GitHub token for a run
///
/// Tries multiple sources in order:
/// 1. A token passed explicitly (command line)
/// 2. The token remembered from the last run
/// 3. `GITHUB_TOKEN` or `GH_TOKEN`
/// 4. `gh auth token`
///
/// No token at all is fine: requests are then sent anonymously.
#[derive(Debug, Clone, Default)]
pub struct TokenResolver {
    explicit: Option<String>,
    remembered: Option<String>,
    use_gh_cli: bool,
}

impl TokenResolver {
    pub fn new() -> Self {
        Self {
            explicit: None,
            remembered: None,
            use_gh_cli: true,
        }
    }

    pub fn with_explicit(mut self, token: Option<String>) -> Self {
        self.explicit = non_empty(token);
        self
    }

    pub fn with_remembered(mut self, token: Option<String>) -> Self {
        self.remembered = non_empty(token);
        self
    }

    /// Whether to ask the `gh` CLI as a last resort
    pub fn with_gh_cli(mut self, enabled: bool) -> Self {
        self.use_gh_cli = enabled;
        self
    }

    /// Resolve a token without consulting the environment or `gh`
    pub fn resolve_configured(&self) -> Option<String> {
        if let Some(token) = &self.explicit {
            debug!("Using token given on the command line");
            return Some(token.clone());
        }
        if let Some(token) = &self.remembered {
            debug!("Using remembered token");
            return Some(token.clone());
        }
        None
    }

    pub async fn resolve(&self) -> Option<String> {
        if let Some(token) = self.resolve_configured() {
            return Some(token);
        }

        let from_env = non_empty(
            std::env::var("GITHUB_TOKEN")
                .or_else(|_| std::env::var("GH_TOKEN"))
                .ok(),
        );
        if from_env.is_some() {
            debug!("Using token from GITHUB_TOKEN/GH_TOKEN");
            return from_env;
        }

        if self.use_gh_cli {
            return gh_auth_token().await;
        }

        debug!("No token found, requests will be anonymous");
        None
    }
}

async fn gh_auth_token() -> Option<String> {
    debug!("Trying gh auth token");
    let output = match tokio::process::Command::new("gh")
        .args(["auth", "token"])
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            debug!("Failed to run 'gh auth token': {}", e);
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    let token = non_empty(String::from_utf8(output.stdout).ok());
    if token.is_some() {
        debug!("Using token from gh CLI");
    }
    token
}

fn non_empty(token: Option<String>) -> Option<String> {
    token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}
