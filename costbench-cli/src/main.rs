mod cli;
mod prompts;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use colored::{ColoredString, Colorize};
use std::path::{Path, PathBuf};

use costbench_core::similarity::{availability, reception_difference_percent};
use costbench_core::{
    create_backend, explain, format_area, format_cost, format_currency, format_date,
    format_month, get_config_path, migrate_selections, Action, AppConfig, BackendType, BadgeColor,
    Catalog, Dashboard, DashboardState, DataCategory, DateMode, FilterSpec, NumericRange,
    ProjectRecord, ProjectStatus, SelectionBackend, Strategy, TagCategory, UnitSystem,
};

use crate::cli::{
    Cli, Command, ConfigCommand, DisplayArgs, FilterArgs, SelectionArgs, SelectionCommand,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };
    let config = AppConfig::load_or_create(&config_path)?;

    if let Command::Config(cmd) = &cli.command {
        return config_command(cmd, &config_path, &config);
    }

    let catalog_path = cli.catalog.clone().or_else(|| config.catalog_path.clone());
    let catalog = match &catalog_path {
        Some(path) => Catalog::load(path, &config.vocabulary)?,
        None => Catalog::builtin(&config.vocabulary)?,
    };
    log::debug!("Loaded {} projects", catalog.len());

    let store = StoreLocation {
        path: match &cli.store {
            Some(path) => path.clone(),
            None => config.resolved_store_path()?,
        },
        backend: config.store_backend,
    };
    let dashboard = Dashboard::new(catalog, config, Local::now().date_naive());

    match &cli.command {
        Command::List {
            filters,
            selection,
            display,
            more,
        } => {
            list_projects(&dashboard, &store, filters, selection, display, *more)?;
        }
        Command::Show { id, display } => {
            show_project(&dashboard, id, display)?;
        }
        Command::Similar {
            primary,
            strategy,
            all,
            explain,
            accept,
            save,
            select,
            load,
            display,
        } => {
            let selection = SelectionArgs {
                select: select.clone(),
                primary: Some(primary.clone()),
                load: load.clone(),
            };
            let strategies: Vec<Strategy> = if *all {
                Strategy::ALL.to_vec()
            } else {
                vec![*strategy]
            };
            similar_projects(
                &dashboard,
                &store,
                &selection,
                &strategies,
                *explain,
                accept,
                save.as_deref(),
                display,
            )?;
        }
        Command::Filters { filters } => {
            show_filters(&dashboard, filters)?;
        }
        Command::Selection(cmd) => {
            let store = store.open()?;
            selection_command(&dashboard, store.as_ref(), cmd)?;
        }
        Command::Config(_) => {}
    }

    Ok(())
}

/// Where saved selections live
///
/// Only commands that read or write saved selections open the store, so a
/// damaged store never blocks browsing.
struct StoreLocation {
    path: PathBuf,
    backend: Option<BackendType>,
}

impl StoreLocation {
    fn open(&self) -> Result<Box<dyn SelectionBackend>> {
        create_backend(&self.path, self.backend)
    }
}

fn config_command(cmd: &ConfigCommand, path: &Path, config: &AppConfig) -> Result<()> {
    match cmd {
        ConfigCommand::Path => println!("{}", path.display()),
        ConfigCommand::Show => {
            println!("{}: {}", "Config".blue(), path.display());
            println!("{}", serde_yaml::to_string(config)?);
        }
    }
    Ok(())
}

fn resolve_project<'a>(dashboard: &'a Dashboard, key: &str) -> Result<&'a ProjectRecord> {
    dashboard
        .catalog()
        .lookup(key)
        .with_context(|| format!("Project not found: {}", key))
}

/// Applies display flags to a state
fn apply_display(
    dashboard: &Dashboard,
    state: DashboardState,
    display: &DisplayArgs,
) -> DashboardState {
    let units = if display.metric {
        UnitSystem::Metric
    } else {
        UnitSystem::Imperial
    };
    let mode = if display.base_date {
        DateMode::BaseDate
    } else {
        DateMode::Current
    };
    let state = dashboard.apply(state, Action::SetUnits(units));
    let state = dashboard.apply(state, Action::SetDateMode(mode));
    dashboard.apply(state, Action::SetConfidential(display.confidential))
}

/// Builds the filter spec from flags, starting from the configured defaults
fn build_filters(dashboard: &Dashboard, args: &FilterArgs) -> FilterSpec {
    let mut spec = dashboard.default_filters();
    let vocabulary = &dashboard.config().vocabulary;

    for (category, tags) in [
        (TagCategory::Sector, &args.sector),
        (TagCategory::Scope, &args.scope),
        (TagCategory::Location, &args.location),
    ] {
        for tag in tags {
            if vocabulary.classify(tag) != Some(category) {
                eprintln!(
                    "{} '{}' is not a known {:?} tag and will match nothing",
                    "Warning:".yellow(),
                    tag,
                    category
                );
            }
        }
    }

    spec.sectors.extend(args.sector.iter().cloned());
    spec.scopes.extend(args.scope.iter().cloned());
    spec.locations.extend(args.location.iter().cloned());
    spec.clients.extend(args.client.iter().cloned());
    spec.wc_types.extend(args.wc_type.iter().copied());
    spec.latest_data.extend(args.latest_data.iter().copied());

    let narrow = |range: NumericRange, min: Option<f64>, max: Option<f64>| {
        NumericRange::new(min.unwrap_or(range.min), max.unwrap_or(range.max))
    };
    spec.cost = narrow(spec.cost, args.cost_min, args.cost_max);
    spec.size = narrow(spec.size, args.size_min, args.size_max);
    spec.reception = narrow(spec.reception, args.reception_min, args.reception_max);
    spec.wc = narrow(spec.wc, args.wc_min, args.wc_max);

    if let Some(from) = args.from {
        spec.date_range.from = from;
    }
    if let Some(to) = args.to {
        spec.date_range.to = to;
    }
    spec
}

/// Builds the selection from flags; the store is opened only for `--load`
fn build_selection(
    dashboard: &Dashboard,
    store: &StoreLocation,
    state: DashboardState,
    args: &SelectionArgs,
) -> Result<DashboardState> {
    let loaded = match &args.load {
        Some(key) => Some(store.open()?.get_selection(key)?.project_ids),
        None => None,
    };
    apply_selection(dashboard, state, loaded, args)
}

/// Applies a saved selection, extra picks and the primary, in that order
fn apply_selection(
    dashboard: &Dashboard,
    mut state: DashboardState,
    loaded: Option<Vec<String>>,
    args: &SelectionArgs,
) -> Result<DashboardState> {
    if let Some(ids) = loaded {
        state = dashboard.apply(state, Action::LoadSelection(ids));
    }
    for key in &args.select {
        let project = resolve_project(dashboard, key)?;
        if !state.selection.is_selected(&project.id) {
            state = dashboard.apply(state, Action::Toggle(project.id.clone()));
        }
    }
    if let Some(key) = &args.primary {
        let project = resolve_project(dashboard, key)?;
        state = dashboard.apply(state, Action::SetPrimary(Some(project.id.clone())));
    }
    Ok(state)
}

fn status_badge(status: &ProjectStatus) -> ColoredString {
    let label = status.to_string();
    match status.badge_color() {
        BadgeColor::Emerald => label.green(),
        BadgeColor::Red => label.red(),
        BadgeColor::Purple => label.magenta(),
        BadgeColor::Blue => label.blue(),
        BadgeColor::Amber => label.yellow(),
    }
}

fn selection_marker(state: &DashboardState, project: &ProjectRecord) -> ColoredString {
    if state.selection.primary() == Some(project.id.as_str()) {
        "★".yellow()
    } else if state.selection.is_selected(&project.id) {
        "●".green()
    } else {
        " ".normal()
    }
}

fn print_project_header(units: UnitSystem) {
    println!(
        "  {:<8} | {:<30} | {:<38} | {:>12} | {:>14} | {:<9} | {:<11}",
        "Number",
        "Name",
        "Scope",
        format!("Area ({})", units.area_unit()),
        format!("Cost/{}", units.area_unit()),
        "Status",
        "Base date"
    );
    println!("{}", "-".repeat(140));
}

fn print_project_row(state: &DashboardState, project: &ProjectRecord) {
    println!(
        "{} {:<8} | {:<30} | {:<38} | {:>12} | {:>14} | {:<9} | {:<11}",
        selection_marker(state, project),
        project.number,
        project.display_name(state.confidential),
        project.scope.label(),
        format_area(project.area, state.units),
        format_cost(project.cost(state.date_mode), state.units),
        status_badge(&project.status),
        format_month(project.base_date)
    );
}

fn list_projects(
    dashboard: &Dashboard,
    store: &StoreLocation,
    filters: &FilterArgs,
    selection: &SelectionArgs,
    display: &DisplayArgs,
    more: usize,
) -> Result<()> {
    let mut state = dashboard.initial_state();
    state = apply_display(dashboard, state, display);
    state = dashboard.apply(state, Action::SetFilters(build_filters(dashboard, filters)));
    if let Some(search) = &filters.search {
        state = dashboard.apply(state, Action::SetSearch(search.clone()));
    }
    state = build_selection(dashboard, store, state, selection)?;
    for _ in 0..more {
        state = dashboard.apply(state, Action::LoadMore);
    }

    let view = dashboard.view(&state);
    if view.total == 0 {
        println!("{}", "No projects match the current filters.".yellow());
        return Ok(());
    }

    print_project_header(state.units);
    for project in &view.visible {
        print_project_row(&state, project);
    }
    println!();
    println!(
        "Showing {} of {} projects",
        view.visible.len(),
        view.total
    );
    if view.has_more() {
        println!(
            "{}",
            format!("{} more (use --more {})", view.remaining, more + 1).dimmed()
        );
    }
    println!(
        "Selected: {} | Active filters: {}",
        view.selected_count.to_string().green(),
        view.active_filters
    );
    Ok(())
}

fn show_project(dashboard: &Dashboard, key: &str, display: &DisplayArgs) -> Result<()> {
    let project = resolve_project(dashboard, key)?;
    let state = apply_display(dashboard, dashboard.initial_state(), display);

    println!("{}: {}", "ID".blue(), project.id);
    println!("{}: {}", "Number".blue(), project.number);
    println!("{}: {}", "Name".blue(), project.display_name(state.confidential));
    println!("{}: {}", "Scope".blue(), project.scope.label());
    println!("{}: {}", "Status".blue(), status_badge(&project.status));
    println!("{}: {}", "Area".blue(), format_area(project.area, state.units));
    println!(
        "{}: {}",
        "Cost".blue(),
        format_cost(project.cost(state.date_mode), state.units)
    );
    println!("{}: {:.1}%", "Net/Gross".blue(), project.net_gross);
    println!("{}: {}", "Latest data".blue(), project.latest_data);
    println!("{}: {}", "Base date".blue(), format_month(project.base_date));
    if let Some(wc_type) = project.wc_type {
        println!("{}: {}", "WC type".blue(), wc_type);
    }
    if let Some(reception) = project.reception_cost {
        println!("{}: {}", "Reception cost".blue(), format_currency(reception));
    }
    if !project.scope.unclassified.is_empty() {
        println!(
            "{}: {}",
            "Unclassified tags".yellow(),
            project.scope.unclassified.join(", ")
        );
    }

    println!("\n{}:", "Data availability".blue());
    for category in DataCategory::ALL {
        let level = project.data_availability.level(category);
        println!("  {:<10} {}", category, level.tooltip());
    }

    println!("\n{}:", "Similarity strategies".blue());
    for (strategy, reason) in availability(project) {
        match reason {
            None => println!("  {:<10} {}", strategy, "available".green()),
            Some(reason) => println!("  {:<10} {}", strategy, reason.to_string().dimmed()),
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn similar_projects(
    dashboard: &Dashboard,
    store: &StoreLocation,
    selection: &SelectionArgs,
    strategies: &[Strategy],
    show_excluded: bool,
    accept: &[String],
    save: Option<&str>,
    display: &DisplayArgs,
) -> Result<()> {
    let state = apply_display(dashboard, dashboard.initial_state(), display);
    let mut state = build_selection(dashboard, store, state, selection)?;
    let primary = dashboard
        .primary(&state)
        .context("A primary project is required")?;

    println!(
        "{}: {} ({})",
        "Primary".blue(),
        primary.display_name(state.confidential),
        primary.scope.label()
    );

    for strategy in strategies {
        println!("\n{} {}", "Strategy:".blue(), strategy);
        println!("{}", strategy.description().dimmed());

        let Some(ranking) = dashboard.similar(&state, *strategy) else {
            continue;
        };
        if show_excluded {
            print_exclusions(dashboard, &state, primary, *strategy);
        }
        if let Some(reason) = ranking.unavailable {
            println!("{}", reason.to_string().yellow());
            continue;
        }
        if ranking.is_empty() {
            println!("{}", "No similar projects found.".yellow());
            continue;
        }

        for matched in &ranking.matches {
            let project = matched.project;
            let detail = match strategy {
                Strategy::Default => format_area(project.area, state.units),
                Strategy::Reception => {
                    let cost = project.reception_cost.map(format_currency).unwrap_or_default();
                    match reception_difference_percent(primary, project) {
                        Some(diff) => format!("{} ({:+}%)", cost, diff),
                        None => cost,
                    }
                }
                Strategy::Wc => format!(
                    "{} | {}",
                    project.wc_type.map(|t| t.to_string()).unwrap_or_default(),
                    format_cost(project.cost(state.date_mode), state.units)
                ),
            };
            println!(
                "{} {}% | {:<8} | {:<30} | {}",
                selection_marker(&state, project),
                format!("{:>3}", matched.score).bold(),
                project.number,
                project.display_name(state.confidential),
                detail
            );
        }
    }

    if accept.is_empty() && save.is_none() {
        return Ok(());
    }

    for key in accept {
        let project = resolve_project(dashboard, key)?;
        state = dashboard.apply(state, Action::AcceptCandidate(project.id.clone()));
    }

    let ids: Vec<&str> = state.selection.selected_ids().collect();
    println!("\n{}: {}", "Selection".blue(), ids.join(", "));

    if let Some(name) = save {
        let saved = store
            .open()?
            .add_selection(name, None, &state.selection, Utc::now())?;
        println!(
            "{}",
            format!("Saved selection '{}' ({} projects)", saved.name, saved.project_ids.len()).green()
        );
    }
    Ok(())
}

fn print_exclusions(
    dashboard: &Dashboard,
    state: &DashboardState,
    primary: &ProjectRecord,
    strategy: Strategy,
) {
    let excluded = explain(primary, dashboard.catalog().iter(), strategy, state.date_mode);
    if excluded.is_empty() {
        return;
    }
    println!("{}", format!("Excluded ({}):", excluded.len()).dimmed());
    for (project, reason) in excluded {
        println!(
            "  {:<8} | {:<30} | {}",
            project.number,
            project.display_name(state.confidential),
            reason.to_string().dimmed()
        );
    }
}

fn show_filters(dashboard: &Dashboard, args: &FilterArgs) -> Result<()> {
    let spec = build_filters(dashboard, args);
    let config = dashboard.config();
    let defaults = &config.filters;

    let list = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "any".dimmed().to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };

    println!("{}: {}", "Sectors".blue(), list(&spec.sectors));
    println!("{}: {}", "Scopes".blue(), list(&spec.scopes));
    println!("{}: {}", "Locations".blue(), list(&spec.locations));
    println!("{}: {}", "Clients".blue(), list(&spec.clients));
    println!(
        "{}: {} to {}",
        "Cost/ft²".blue(),
        format_currency(spec.cost.min),
        format_currency(spec.cost.max)
    );
    println!(
        "{}: {} to {}",
        "Size".blue(),
        format_area(spec.size.min, UnitSystem::Imperial),
        format_area(spec.size.max, UnitSystem::Imperial)
    );
    println!(
        "{}: {} to {}",
        "Reception".blue(),
        format_currency(spec.reception.min),
        format_currency(spec.reception.max)
    );
    println!(
        "{}: {} to {}",
        "WC cost".blue(),
        format_currency(spec.wc.min),
        format_currency(spec.wc.max)
    );
    let wc_types: Vec<String> = spec.wc_types.iter().map(|t| t.to_string()).collect();
    println!(
        "{}: {}",
        "WC types".blue(),
        if wc_types.is_empty() { "any".to_string() } else { wc_types.join(", ") }
    );
    let milestones: Vec<String> = spec.latest_data.iter().map(|m| m.to_string()).collect();
    println!(
        "{}: {}",
        "Latest data".blue(),
        if milestones.is_empty() { "any".to_string() } else { milestones.join(", ") }
    );
    println!(
        "{}: {} to {}",
        "Base date".blue(),
        format_date(spec.date_range.from),
        format_date(spec.date_range.to)
    );
    println!(
        "\n{}: {}",
        "Active filters".blue(),
        spec.active_count(defaults, dashboard.today())
    );

    println!("\n{}:", "Available tags".blue());
    println!("  Sectors:   {}", config.vocabulary.sectors.join(", "));
    println!("  Scopes:    {}", config.vocabulary.scopes.join(", "));
    println!("  Locations: {}", config.vocabulary.locations.join(", "));
    Ok(())
}

fn selection_command(
    dashboard: &Dashboard,
    store: &dyn SelectionBackend,
    cmd: &SelectionCommand,
) -> Result<()> {
    match cmd {
        SelectionCommand::Save {
            name,
            description,
            selection,
        } => {
            let loaded = match &selection.load {
                Some(key) => Some(store.get_selection(key)?.project_ids),
                None => None,
            };
            let state = apply_selection(dashboard, dashboard.initial_state(), loaded, selection)?;
            let (name, description) = match name {
                Some(name) => (name.clone(), description.clone()),
                None => {
                    let existing = store.load_or_empty();
                    let name = prompts::prompt_selection_name(&existing)?;
                    let description = match description {
                        Some(d) => Some(d.clone()),
                        None => prompts::prompt_description()?,
                    };
                    (name, description)
                }
            };

            let saved =
                store.add_selection(&name, description.as_deref(), &state.selection, Utc::now())?;
            println!(
                "{}",
                format!("Saved selection '{}' ({} projects)", saved.name, saved.project_ids.len())
                    .green()
            );
        }
        SelectionCommand::List => {
            let selections = store.load_or_empty();
            if selections.is_empty() {
                println!("{}", "No saved selections found.".yellow());
                return Ok(());
            }
            for saved in selections.iter() {
                println!(
                    "{} {}",
                    saved.name.bold(),
                    format!("({})", saved.id).dimmed()
                );
                println!(
                    "  Saved on {} • {} projects",
                    saved.date.with_timezone(&Local).format("%d %b %Y %H:%M"),
                    saved.project_ids.len()
                );
                if let Some(description) = &saved.description {
                    println!("  {}", description);
                }
                println!("  {}", saved.project_ids.join(", ").dimmed());
            }
        }
        SelectionCommand::Load { key, display } => {
            let saved = store.get_selection(key)?;
            let state = apply_display(dashboard, dashboard.initial_state(), display);
            let state = dashboard.apply(state, Action::LoadSelection(saved.project_ids.clone()));

            println!("{}: {}", "Selection".blue(), saved.name);
            let projects: Vec<&ProjectRecord> = dashboard
                .catalog()
                .iter()
                .filter(|p| state.selection.is_selected(&p.id))
                .collect();
            print_project_header(state.units);
            for project in &projects {
                print_project_row(&state, project);
            }

            let missing = state.selection.count() - projects.len();
            if missing > 0 {
                println!(
                    "{}",
                    format!("{} saved ids are no longer in the catalog", missing).yellow()
                );
            }
        }
        SelectionCommand::Delete { key, yes } => {
            let saved = store.get_selection(key)?;
            if !yes {
                println!(
                    "About to delete '{}' ({} projects)",
                    saved.name,
                    saved.project_ids.len()
                );
                if !prompts::confirm("Are you sure you want to delete this selection?")? {
                    println!("{}", "Deletion cancelled.".yellow());
                    return Ok(());
                }
            }
            let removed = store.delete_selection(&saved.id)?;
            println!("{}", format!("Deleted selection '{}'", removed.name).green());
        }
        SelectionCommand::Migrate { to, backend } => {
            let target = create_backend(to, *backend)?;
            let count = migrate_selections(store, target.as_ref())?;
            println!(
                "{}",
                format!(
                    "Copied {} selections from {} store to {} store at {}",
                    count,
                    store.backend_type(),
                    target.backend_type(),
                    to.display()
                )
                .green()
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use costbench_core::{SelectionState, Vocabulary};
    use std::fs;
    use tempfile::TempDir;

    fn dashboard() -> Dashboard {
        let catalog = Catalog::builtin(&Vocabulary::default()).unwrap();
        Dashboard::new(
            catalog,
            AppConfig::default(),
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        )
    }

    /// A store whose parent directory is a plain file, so opening it fails
    fn unopenable_store(dir: &TempDir) -> StoreLocation {
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        StoreLocation {
            path: blocker.join("selections.db"),
            backend: None,
        }
    }

    #[test]
    fn test_selection_without_load_never_opens_store() {
        let dir = TempDir::new().unwrap();
        let store = unopenable_store(&dir);
        assert!(store.open().is_err());

        let dash = dashboard();
        let args = SelectionArgs {
            select: vec!["3".to_string()],
            primary: Some("2".to_string()),
            load: None,
        };
        let state = build_selection(&dash, &store, dash.initial_state(), &args).unwrap();
        assert_eq!(state.selection.primary(), Some("2"));
        assert!(state.selection.is_selected("3"));
    }

    #[test]
    fn test_selection_with_load_reports_store_error() {
        let dir = TempDir::new().unwrap();
        let store = unopenable_store(&dir);
        let dash = dashboard();
        let args = SelectionArgs {
            load: Some("Alpha".to_string()),
            ..Default::default()
        };
        assert!(build_selection(&dash, &store, dash.initial_state(), &args).is_err());
    }

    #[test]
    fn test_corrupt_sqlite_store_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("selections.db");
        fs::write(&path, "this is not a database\n".repeat(512)).unwrap();
        let store = StoreLocation {
            path,
            backend: None,
        };

        let opened = store.open().unwrap();
        assert!(opened.load_or_empty().is_empty());

        let dash = dashboard();
        let args = SelectionArgs {
            load: Some("Alpha".to_string()),
            ..Default::default()
        };
        let err = build_selection(&dash, &store, dash.initial_state(), &args).unwrap_err();
        assert!(err.to_string().contains("Alpha"));

        let fresh = SelectionState::default().toggle("2");
        assert!(opened
            .add_selection("Alpha", None, &fresh, Utc::now())
            .is_err());
    }
}
