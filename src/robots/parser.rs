//! robots.txt rules parser
//!
//! Consumes the simple `directive: value` grammar: `User-agent` lines
//! group rules, `Disallow` values are path prefixes, blank lines and `#`
//! comments are skipped, unknown directives are ignored.

/// Parsed crawl rules for one origin
#[derive(Debug, Clone)]
pub struct RobotsRules {
    disallow: Vec<String>,
    allow_all: bool,
}

impl RobotsRules {
    /// Permissive rules used when robots.txt is missing or unreadable
    pub fn allow_all() -> Self {
        Self {
            disallow: Vec::new(),
            allow_all: true,
        }
    }

    /// Parses robots.txt content against a user agent
    ///
    /// A group matches when its `User-agent` value is `*` or a
    /// case-insensitive substring of the agent's product token (the part
    /// before `/`). Consecutive `User-agent` lines form one group; within
    /// matching groups every non-empty `Disallow` value is collected as a
    /// path prefix.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let product = user_agent
            .split('/')
            .next()
            .unwrap_or_default()
            .to_lowercase();

        let mut disallow = Vec::new();
        let mut group_matches = false;
        let mut in_agent_run = false;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((directive, value)) = line.split_once(':') else {
                continue;
            };
            let directive = directive.trim().to_lowercase();
            let value = value.trim();

            match directive.as_str() {
                "user-agent" => {
                    let matches =
                        value == "*" || (!value.is_empty() && product.contains(&value.to_lowercase()));
                    if in_agent_run {
                        group_matches = group_matches || matches;
                    } else {
                        group_matches = matches;
                    }
                    in_agent_run = true;
                }
                "disallow" => {
                    if group_matches && !value.is_empty() {
                        disallow.push(value.to_string());
                    }
                    in_agent_run = false;
                }
                _ => {
                    in_agent_run = false;
                }
            }
        }

        Self {
            disallow,
            allow_all: false,
        }
    }

    /// True when the path starts with no disallowed prefix
    pub fn is_allowed(&self, path: &str) -> bool {
        if self.allow_all {
            return true;
        }
        !self.disallow.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// The collected disallowed path prefixes
    pub fn disallowed_prefixes(&self) -> &[String] {
        &self.disallow
    }
}
