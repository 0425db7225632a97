//! Robots.txt parser implementation
//!
//! A line-oriented state machine builds the per-agent rule table, sitemap
//! list and crawl-delay. Permission checks are delegated to the robotstxt
//! crate's matcher over the retained raw content.

use robotstxt::DefaultMatcher;
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a rule allows or disallows its path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Directive {
    Allow,
    Disallow,
}

/// One Allow/Disallow line attached to a user agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RobotsRule {
    pub directive: Directive,
    pub path: String,
}

/// Parsed robots.txt content
#[derive(Debug, Clone, Default, Serialize)]
pub struct ParsedRobots {
    /// Rules keyed by lower-cased user agent (`*` for the wildcard group)
    pub rules_by_agent: BTreeMap<String, Vec<RobotsRule>>,

    /// Absolute URLs from `Sitemap:` lines, in file order
    pub sitemap_urls: Vec<String>,

    /// Crawl-delay for the wildcard group, or the first delay seen otherwise
    pub crawl_delay_seconds: Option<f64>,

    #[serde(skip)]
    content: String,
}

/// Parser state: the agents of the group currently being read
#[derive(Debug, Default)]
struct RobotsParser {
    current_agents: Vec<String>,
    /// True once a rule has been attached to `current_agents`; the next
    /// `User-agent:` line then starts a new group
    group_has_rules: bool,
    rules_by_agent: BTreeMap<String, Vec<RobotsRule>>,
    sitemap_urls: Vec<String>,
    wildcard_delay: Option<f64>,
    first_delay: Option<f64>,
}

impl RobotsParser {
    fn feed(&mut self, raw_line: &str) {
        let line = match raw_line.find('#') {
            Some(idx) => &raw_line[..idx],
            None => raw_line,
        }
        .trim();

        if line.is_empty() {
            return;
        }

        let Some((key, value)) = line.split_once(':') else {
            tracing::trace!("Ignoring robots.txt line without directive: {}", line);
            return;
        };
        let value = value.trim();

        match key.trim().to_lowercase().as_str() {
            "user-agent" => self.start_agent(value),
            "allow" => self.add_rule(Directive::Allow, value),
            "disallow" => self.add_rule(Directive::Disallow, value),
            "sitemap" => {
                if !value.is_empty() {
                    self.sitemap_urls.push(value.to_string());
                }
            }
            "crawl-delay" => self.set_delay(value),
            other => tracing::trace!("Ignoring unknown robots.txt directive: {}", other),
        }
    }

    fn start_agent(&mut self, agent: &str) {
        if self.group_has_rules {
            self.current_agents.clear();
            self.group_has_rules = false;
        }
        let agent = agent.to_lowercase();
        self.rules_by_agent.entry(agent.clone()).or_default();
        self.current_agents.push(agent);
    }

    fn add_rule(&mut self, directive: Directive, path: &str) {
        self.group_has_rules = true;

        // An empty Disallow means "allow everything" and carries no rule
        if path.is_empty() {
            return;
        }

        for agent in &self.current_agents {
            self.rules_by_agent
                .entry(agent.clone())
                .or_default()
                .push(RobotsRule {
                    directive,
                    path: path.to_string(),
                });
        }
    }

    fn set_delay(&mut self, value: &str) {
        self.group_has_rules = true;

        let Ok(delay) = value.parse::<f64>() else {
            return;
        };
        if !delay.is_finite() || delay < 0.0 {
            return;
        }

        if self.current_agents.iter().any(|a| a == "*") {
            self.wildcard_delay = Some(delay);
        }
        if self.first_delay.is_none() && !self.current_agents.is_empty() {
            self.first_delay = Some(delay);
        }
    }

    fn finish(self, content: &str) -> ParsedRobots {
        ParsedRobots {
            rules_by_agent: self.rules_by_agent,
            sitemap_urls: self.sitemap_urls,
            crawl_delay_seconds: self.wildcard_delay.or(self.first_delay),
            content: content.to_string(),
        }
    }
}

impl ParsedRobots {
    /// Parses raw robots.txt content
    ///
    /// Directive names are matched case-insensitively; unknown lines and
    /// rules that appear before any `User-agent:` are ignored.
    pub fn from_content(content: &str) -> Self {
        let mut parser = RobotsParser::default();
        for line in content.lines() {
            parser.feed(line);
        }
        parser.finish(content)
    }

    /// Returns the raw robots.txt content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Rules recorded for an exact (lower-cased) agent token
    pub fn rules_for(&self, agent: &str) -> &[RobotsRule] {
        self.rules_by_agent
            .get(&agent.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when the wildcard group disallows the whole site
    pub fn blocks_all(&self) -> bool {
        self.rules_for("*")
            .iter()
            .any(|r| r.directive == Directive::Disallow && r.path == "/")
    }

    /// Checks if a URL is allowed for the given user agent
    ///
    /// `url` should be absolute; empty content allows everything.
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }
}
