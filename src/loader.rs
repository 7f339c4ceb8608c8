use std::cmp::Ordering;
use std::path::PathBuf;

use tracing::{debug, info, warn};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::company::Company;
use crate::error::LoadError;

/// Where the dataset comes from: a served static file or a local copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
}

impl DataSource {
    pub fn parse(raw: &str) -> Self {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            DataSource::Url(raw.to_string())
        } else {
            DataSource::File(PathBuf::from(raw))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Url(u) => write!(f, "{}", u),
            DataSource::File(p) => write!(f, "{}", p.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompaniesState {
    pub companies: Vec<Company>,
    pub loading: bool,
    pub error: Option<String>,
}

impl Default for CompaniesState {
    fn default() -> Self {
        Self {
            companies: Vec::new(),
            loading: true,
            error: None,
        }
    }
}

#[derive(Debug)]
pub enum CompaniesAction {
    FetchStart,
    FetchSuccess(Vec<Company>),
    FetchError(String),
}

impl CompaniesState {
    pub fn reduce(&mut self, action: CompaniesAction) {
        match action {
            CompaniesAction::FetchStart => self.loading = true,
            CompaniesAction::FetchSuccess(companies) => {
                self.companies = companies;
                self.loading = false;
                self.error = None;
            }
            CompaniesAction::FetchError(message) => {
                self.companies.clear();
                self.loading = false;
                self.error = Some(message);
            }
        }
    }
}

/// Collation-style name order: letters with accents and case folded away
/// first, then unaccented before accented, then lowercase before uppercase,
/// then raw bytes.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let base = |s: &str| {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect::<Vec<_>>()
    };
    let accents = |s: &str| s.nfd().flat_map(char::to_lowercase).collect::<Vec<_>>();
    let case = |s: &str| s.nfd().map(char::is_uppercase).collect::<Vec<_>>();

    base(a)
        .cmp(&base(b))
        .then_with(|| accents(a).cmp(&accents(b)))
        .then_with(|| case(a).cmp(&case(b)))
        .then_with(|| a.cmp(b))
}

/// Sort by name and assign 1-based display ids in sorted order.
pub fn prepare(mut companies: Vec<Company>) -> Vec<Company> {
    companies.sort_by(|a, b| compare_names(&a.name, &b.name));
    for (i, c) in companies.iter_mut().enumerate() {
        c.id = i as u32 + 1;
    }
    companies
}

/// Fetch and decode the raw dataset. No retry.
pub async fn fetch(source: &DataSource) -> Result<Vec<Company>, LoadError> {
    let body = match source {
        DataSource::Url(url) => {
            reqwest::get(url)
                .await?
                .error_for_status()?
                .text()
                .await?
        }
        DataSource::File(path) => tokio::fs::read_to_string(path).await?,
    };
    Ok(serde_json::from_str(&body)?)
}

/// Identifies one in-flight load. Results carrying an outdated ticket are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

pub struct DatasetLoader {
    source: DataSource,
    state: CompaniesState,
    generation: u64,
}

impl DatasetLoader {
    pub fn new(source: DataSource) -> Self {
        Self {
            source,
            state: CompaniesState::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &CompaniesState {
        &self.state
    }

    pub fn source(&self) -> &DataSource {
        &self.source
    }

    pub fn begin(&mut self) -> Ticket {
        self.generation += 1;
        self.state.reduce(CompaniesAction::FetchStart);
        Ticket(self.generation)
    }

    /// Consumer went away; any pending result is stale from now on.
    pub fn detach(&mut self) {
        self.generation += 1;
    }

    /// Publish a finished fetch. Returns false when the ticket is stale.
    pub fn complete(&mut self, ticket: Ticket, result: Result<Vec<Company>, String>) -> bool {
        if ticket.0 != self.generation {
            debug!("Discarding stale dataset result (ticket {})", ticket.0);
            return false;
        }
        match result {
            Ok(raw) => {
                let companies = prepare(raw);
                info!("Loaded {} companies from {}", companies.len(), self.source);
                self.state.reduce(CompaniesAction::FetchSuccess(companies));
            }
            Err(message) => {
                warn!("Error loading companies: {}", message);
                self.state.reduce(CompaniesAction::FetchError(message));
            }
        }
        true
    }

    /// Single fetch of the dataset. A failure is terminal for this loader.
    pub async fn load(&mut self) -> Result<&[Company], LoadError> {
        let ticket = self.begin();
        match fetch(&self.source).await {
            Ok(raw) => {
                self.complete(ticket, Ok(raw));
                Ok(&self.state.companies)
            }
            Err(e) => {
                self.complete(ticket, Err(e.to_string()));
                Err(e)
            }
        }
    }
}
