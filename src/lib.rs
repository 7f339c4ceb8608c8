pub mod bookmarks;
pub mod company;
pub mod db;
pub mod directory;
pub mod error;
pub mod loader;
pub mod report;
pub mod settings;
pub mod storage;

pub use bookmarks::{BookmarkStore, MigrationReport, NoticeFlag};
pub use company::Company;
pub use directory::{Directory, PAGE_SIZE};
pub use loader::{CompaniesState, DataSource, DatasetLoader};
pub use storage::{KeyValueStorage, MemoryStorage};
