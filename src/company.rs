use reqwest::Url;
use serde::{Deserialize, Serialize};

const SEARCH_BASE: &str = "https://www.google.com/search";
const NEWS_BASE: &str = "https://news.google.com/search";
const PEOPLE_BASE: &str = "https://google.com/search";
const REPORT_BASE: &str = "http://localhost/report";

/// One entry of the directory dataset.
///
/// `url` is the stable identity (bookmarks are keyed by it). `id` is only a
/// display position, reassigned on every load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blog: Option<String>,
    #[serde(default, skip_deserializing)]
    pub id: u32,
}

/// Outbound links rendered on a company card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLinks {
    pub jobs: String,
    pub blog: Option<String>,
    pub search: String,
    pub news: String,
    pub people: String,
}

impl Company {
    pub fn links(&self) -> CardLinks {
        CardLinks {
            jobs: self.url.clone(),
            blog: self.blog.clone().filter(|b| !b.is_empty()),
            search: with_query(SEARCH_BASE, &[("q", self.name.as_str())]),
            news: with_query(NEWS_BASE, &[("q", self.name.as_str())]),
            people: with_query(
                PEOPLE_BASE,
                &[("q", format!("site:theorg.com {}", self.name).as_str()), ("btnI", "I")],
            ),
        }
    }

    /// Path of the cached logo, keyed by the full hostname of the careers url.
    pub fn logo_path(&self) -> Option<String> {
        let url = Url::parse(&self.url).ok()?;
        url.host_str().map(|h| format!("/logo-cache/{}.webp", h))
    }

    /// Avatar fallback: first letter of each word, uppercased.
    pub fn initials(&self) -> String {
        self.name
            .split(' ')
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    /// Relative link to the report form, prefilled with this company.
    pub fn report_path(&self) -> String {
        let url = with_query(REPORT_BASE, &[("sitename", self.name.as_str())]);
        match Url::parse(&url) {
            Ok(u) => match u.query() {
                Some(q) => format!("{}?{}", u.path(), q),
                None => u.path().to_string(),
            },
            Err(_) => "/report".to_string(),
        }
    }
}

fn with_query(base: &str, params: &[(&str, &str)]) -> String {
    Url::parse_with_params(base, params)
        .map(String::from)
        .unwrap_or_else(|_| base.to_string())
}
