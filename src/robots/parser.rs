//! Robots.txt parsing with substring matching

/// One `User-agent` block with its `Disallow` paths
#[derive(Debug, Clone)]
struct Group {
    agent: String,
    disallows: Vec<String>,
}

/// Parsed robots.txt policy
///
/// An empty policy (no groups) allows everything, which is also the
/// permissive default when robots.txt cannot be fetched.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    groups: Vec<Group>,
}

impl RobotsPolicy {
    /// Parses raw robots.txt content into user-agent groups
    ///
    /// Each `User-agent` line starts a new group; `Disallow` lines attach to
    /// the most recent group. Comments, `Allow` lines, and anything else are
    /// ignored.
    pub fn parse(content: &str) -> Self {
        let mut groups: Vec<Group> = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let value = value.trim();

            match key.trim().to_lowercase().as_str() {
                "user-agent" => {
                    groups.push(Group {
                        agent: value.to_string(),
                        disallows: Vec::new(),
                    });
                }
                "disallow" => {
                    if !value.is_empty() {
                        if let Some(group) = groups.last_mut() {
                            group.disallows.push(value.to_string());
                        }
                    }
                }
                _ => {}
            }
        }

        Self { groups }
    }

    /// Creates a permissive policy that allows everything
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks whether a URL may be fetched by a crawler using the given
    /// user-agent pool
    ///
    /// A group applies when its agent is `*` or its agent value occurs as a
    /// substring of any configured user agent. A URL is disallowed when it
    /// ends with or contains one of an applicable group's disallowed paths.
    pub fn is_allowed(&self, url: &str, user_agents: &[String]) -> bool {
        for group in &self.groups {
            let applies = group.agent == "*"
                || user_agents.iter().any(|ua| ua.contains(group.agent.as_str()));
            if !applies {
                continue;
            }

            for path in &group.disallows {
                if url.ends_with(path.as_str()) || url.contains(path.as_str()) {
                    return false;
                }
            }
        }

        true
    }
}
