pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod filter;
pub mod format;
pub mod models;
pub mod pagination;
pub mod saved;
pub mod selection;
pub mod similarity;
pub mod storage;

// Re-export commonly used types
pub use catalog::{Catalog, CatalogError, BUILTIN_CATALOG};
pub use config::{get_config_dir, get_config_path, get_data_dir, AppConfig};
pub use dashboard::{Action, AnchorRule, Dashboard, DashboardState, DashboardView};
pub use db::{create_backend, migrate_selections, BackendType, SelectionBackend};
pub use filter::{filter_projects, DateRange, FilterDefaults, FilterSpec, NumericRange};
pub use format::{
    format_area, format_cost, format_currency, format_date, format_month, format_number, UnitSystem,
};
pub use models::{
    BadgeColor, CostMilestone, DataAvailability, DataCategory, DataLevel, DateMode, ProjectEntry,
    ProjectRecord, ProjectStatus, ScopeTags, TagCategory, Vocabulary, WcType,
};
pub use pagination::{sort_projects, PageConfig, Pager};
pub use saved::{SavedSelection, SavedSelections, SelectionError};
pub use selection::SelectionState;
pub use similarity::{explain, rank, Exclusion, NoDataReason, Ranking, SimilarProject, Strategy};
pub use storage::Storage;
