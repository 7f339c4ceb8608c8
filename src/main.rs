use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use career_pages::bookmarks::{BookmarkStore, NoticeFlag};
use career_pages::company::Company;
use career_pages::db::SqliteStorage;
use career_pages::directory::Directory;
use career_pages::loader::{DataSource, DatasetLoader};
use career_pages::report::{Report, ReportClient, ReportKind};
use career_pages::settings::Settings;

#[derive(Parser)]
#[command(name = "career_pages", about = "Browse company career pages and keep bookmarks")]
struct Cli {
    /// Dataset file or url (overrides CAREER_DATA_SOURCE)
    #[arg(short, long, global = true)]
    data: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List one page of companies
    List {
        /// Case-insensitive name filter
        #[arg(short, long, default_value = "")]
        search: String,
        /// Page number (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// Suggest company names for a partial term
    Suggest { term: String },
    /// Show the card of one company
    Show { name: String },
    /// Change the saved status of a company url
    Bookmark {
        #[command(subcommand)]
        action: BookmarkAction,
    },
    /// List saved companies
    Bookmarks,
    /// Rewrite legacy numeric bookmarks to company urls
    Migrate,
    /// Report an issue or send feedback about a company
    Report {
        #[arg(short, long, value_enum, default_value = "issue")]
        kind: ReportKind,
        #[arg(short, long)]
        site: String,
        #[arg(short, long)]
        issue: String,
        #[arg(short, long, default_value = "")]
        contact: String,
    },
    /// Show or dismiss the saved-jobs notice
    Notice {
        #[arg(long)]
        dismiss: bool,
    },
}

#[derive(Subcommand)]
enum BookmarkAction {
    Add { url: String },
    Remove { url: String },
    Toggle { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load().context("Invalid CAREER_* configuration")?;
    let source = DataSource::parse(cli.data.as_deref().unwrap_or(&settings.data_source));

    let result = match cli.command {
        Commands::List { search, page } => {
            let mut dir = Directory::new(load_companies(source).await?);
            dir.set_search_term(&search);
            dir.go_to_page(page);

            println!("Showing results from {} Companies", dir.total_companies());
            if dir.total_pages() == 0 {
                println!("No companies match {:?}.", search);
                return Ok(());
            }

            let store = open_bookmarks(&settings)?;
            println!(
                "{:>4} | {:<28} | {:<40} | {:<5}",
                "#", "Company", "Jobs", "Saved"
            );
            println!("{}", "-".repeat(86));
            for c in dir.page() {
                let saved = if store.contains(&c.url) { "*" } else { "" };
                println!(
                    "{:>4} | {:<28} | {:<40} | {:<5}",
                    c.id,
                    truncate(&c.name, 28),
                    truncate(&c.url, 40),
                    saved
                );
            }
            println!(
                "\n{}page {} of {}{}",
                if dir.has_prev() { "< " } else { "  " },
                dir.current_page(),
                dir.total_pages(),
                if dir.has_next() { " >" } else { "" }
            );
            Ok(())
        }
        Commands::Suggest { term } => {
            let mut dir = Directory::new(load_companies(source).await?);
            dir.set_search_term(&term);
            let suggestions = dir.suggestions();
            if suggestions.is_empty() {
                println!("No suggestions.");
            }
            for s in suggestions {
                println!("{}", s);
            }
            Ok(())
        }
        Commands::Show { name } => {
            let companies = load_companies(source).await?;
            let Some(company) = find_company(&companies, &name) else {
                println!("No company named {:?}.", name);
                return Ok(());
            };
            let store = open_bookmarks(&settings)?;
            print_card(company, store.contains(&company.url));
            Ok(())
        }
        Commands::Bookmark { action } => {
            let companies = load_companies(source).await?;
            let mut store = open_bookmarks(&settings)?;
            store.migrate_legacy_keys(&companies)?;
            match action {
                BookmarkAction::Add { url } => {
                    if store.add(&url)? {
                        println!("Saved {}", url);
                    } else {
                        println!("Already saved: {}", url);
                    }
                }
                BookmarkAction::Remove { url } => {
                    if store.remove(&url)? {
                        println!("Removed {}", url);
                    } else {
                        println!("Not saved: {}", url);
                    }
                }
                BookmarkAction::Toggle { url } => {
                    let saved = store.toggle(&url)?;
                    println!("{} {}", if saved { "Saved" } else { "Removed" }, url);
                }
            }
            Ok(())
        }
        Commands::Bookmarks => {
            let companies = load_companies(source).await?;
            let mut store = open_bookmarks(&settings)?;
            store.migrate_legacy_keys(&companies)?;

            if !NoticeFlag::is_dismissed(store.storage()) {
                println!("Saved jobs now follow the company url. Dismiss with `notice --dismiss`.\n");
            }
            if store.is_empty() {
                println!("No saved companies.");
                return Ok(());
            }
            let saved = store.saved_companies(&companies);
            for c in &saved {
                println!("{:>4} | {:<28} | {}", c.id, truncate(&c.name, 28), c.url);
            }
            let unknown: Vec<_> = store
                .list()
                .iter()
                .filter(|k| !companies.iter().any(|c| &c.url == *k))
                .collect();
            if !unknown.is_empty() {
                println!("\n--- Not in dataset ---");
                for k in &unknown {
                    println!("  {}", k);
                }
            }
            println!("\n{} saved", store.len());
            Ok(())
        }
        Commands::Migrate => {
            let companies = load_companies(source).await?;
            let mut store = open_bookmarks(&settings)?;
            if !store.needs_migration() {
                println!("Nothing to migrate.");
                return Ok(());
            }
            let report = store.migrate_legacy_keys(&companies)?;
            println!(
                "Migrated {} bookmarks, kept {} unmatched.",
                report.migrated,
                report.unmatched.len()
            );
            for k in &report.unmatched {
                println!("  unmatched: {}", k);
            }
            Ok(())
        }
        Commands::Report {
            kind,
            site,
            issue,
            contact,
        } => {
            let report = Report {
                report_type: kind,
                issue,
                site_name: site,
                contact_info: contact,
            };
            send_report(&settings.report_endpoint, &report).await?;
            println!("Report submitted successfully!");
            Ok(())
        }
        Commands::Notice { dismiss } => {
            let mut storage = SqliteStorage::open(&settings.db_path)?;
            if dismiss {
                NoticeFlag::dismiss(&mut storage)?;
                println!("Notice dismissed.");
            } else if NoticeFlag::is_dismissed(&storage) {
                println!("Notice already dismissed.");
            } else {
                println!("Notice is showing.");
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn load_companies(source: DataSource) -> anyhow::Result<Vec<Company>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Loading companies...");
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut loader = DatasetLoader::new(source);
    let loaded = loader.load().await.map(|c| c.to_vec());
    pb.finish_and_clear();

    loaded.with_context(|| {
        format!(
            "Error loading data from {}. Please try again later",
            loader.source()
        )
    })
}

async fn send_report(endpoint: &str, report: &Report) -> anyhow::Result<()> {
    ReportClient::new(endpoint)
        .submit(report)
        .await
        .context("Failed to submit report")
}

fn open_bookmarks(settings: &Settings) -> anyhow::Result<BookmarkStore<SqliteStorage>> {
    let storage = SqliteStorage::open(&settings.db_path)
        .with_context(|| format!("Failed to open {}", settings.db_path))?;
    Ok(BookmarkStore::open(storage))
}

fn find_company<'a>(companies: &'a [Company], name: &str) -> Option<&'a Company> {
    companies
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name))
        .or_else(|| {
            let needle = name.to_lowercase();
            companies.iter().find(|c| c.name.to_lowercase().contains(&needle))
        })
}

fn print_card(c: &Company, saved: bool) {
    let links = c.links();
    println!("[{}] {}{}", c.initials(), c.name, if saved { "  (saved)" } else { "" });
    println!("{}", "-".repeat(60));
    println!("  Jobs:    {}", links.jobs);
    if let Some(blog) = &links.blog {
        println!("  Blog:    {}", blog);
    }
    println!("  Search:  {}", links.search);
    println!("  News:    {}", links.news);
    println!("  People:  {}", links.people);
    if let Some(logo) = c.logo_path() {
        println!("  Logo:    {}", logo);
    }
    println!("  Report:  {}", c.report_path());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(issue: &str) -> Report {
        Report {
            report_type: ReportKind::Feedback,
            issue: issue.into(),
            site_name: "Acme".into(),
            contact_info: String::new(),
        }
    }

    #[tokio::test]
    async fn failed_report_is_an_error() {
        let err = send_report("http://127.0.0.1:9/api/report", &report(" "))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to submit report"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_an_error() {
        let result = send_report("http://127.0.0.1:9/api/report", &report("Link is dead")).await;
        assert!(result.is_err());
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Stripe", 10), "Stripe");
        assert_eq!(truncate("Acme Rocket Works", 10), "Acme Ro...");
    }
}
