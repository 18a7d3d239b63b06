//! Tile URL templates.
//!
//! Templates use the placeholders common to slippy-map tile layers:
//!
//! | Placeholder | Value |
//! |---|---|
//! | `{x}` | tile column |
//! | `{y}` | tile row |
//! | `{z}` | zoom level |
//! | `{s}` | subdomain, rotated by `(x + y) % subdomains.len()` |

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use super::types::ProviderError;
use crate::coord::TileCoord;

/// Subdomains substituted for `{s}` unless configured otherwise.
pub const DEFAULT_SUBDOMAINS: &[&str] = &["a", "b", "c"];

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([^{}]*)\}").expect("placeholder regex is valid"))
}

/// Validated URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    template: String,
    subdomains: Vec<String>,
}

impl UrlTemplate {
    /// Parses a template using the default subdomains.
    pub fn new(template: impl Into<String>) -> Result<Self, ProviderError> {
        let subdomains = DEFAULT_SUBDOMAINS.iter().map(|s| s.to_string()).collect();
        Self::with_subdomains(template, subdomains)
    }

    /// Parses a template with explicit subdomains for `{s}`.
    pub fn with_subdomains(
        template: impl Into<String>,
        subdomains: Vec<String>,
    ) -> Result<Self, ProviderError> {
        let template = template.into();
        let invalid = |reason: String| ProviderError::InvalidTemplate {
            template: template.clone(),
            reason,
        };

        let mut seen_s = false;
        let mut seen = [false; 3];
        for caps in placeholder_regex().captures_iter(&template) {
            match &caps[1] {
                "x" => seen[0] = true,
                "y" => seen[1] = true,
                "z" => seen[2] = true,
                "s" => seen_s = true,
                other => return Err(invalid(format!("unknown placeholder {{{}}}", other))),
            }
        }

        if let Some(missing) = ["{x}", "{y}", "{z}"]
            .iter()
            .zip(seen)
            .find(|(_, present)| !present)
            .map(|(name, _)| *name)
        {
            return Err(invalid(format!("missing {}", missing)));
        }
        if seen_s && subdomains.is_empty() {
            return Err(invalid("uses {s} but no subdomains are configured".to_string()));
        }

        Ok(Self {
            template,
            subdomains,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    /// Expands the template for a tile.
    pub fn url_for(&self, coord: TileCoord) -> String {
        placeholder_regex()
            .replace_all(&self.template, |caps: &regex::Captures<'_>| match &caps[1] {
                "x" => coord.x.to_string(),
                "y" => coord.y.to_string(),
                "z" => coord.z.to_string(),
                "s" => self.subdomain_for(coord).to_string(),
                _ => String::new(),
            })
            .into_owned()
    }

    fn subdomain_for(&self, coord: TileCoord) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let n = self.subdomains.len() as i64;
        let index = (coord.x + coord.y).rem_euclid(n) as usize;
        &self.subdomains[index]
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
