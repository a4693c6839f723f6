use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Separator between the sector, scope and location tags of a scope string
pub const SCOPE_DELIMITER: &str = " • ";

/// Which cost figure drives comparisons and display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateMode {
    /// Inflation-adjusted cost at today's rates
    #[default]
    Current,
    /// Cost as recorded at the project's base date
    BaseDate,
}

/// Represents the lifecycle status of a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProjectStatus {
    Live,
    Dead,
    Bid,
    Complete,
    Dormant,
    /// Unrecognised status, kept verbatim
    Other(String),
}

/// Colour family used when rendering a status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeColor {
    Emerald,
    Red,
    Purple,
    Blue,
    Amber,
}

impl ProjectStatus {
    /// Parse a status case-insensitively; unknown values become `Other`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "live" => ProjectStatus::Live,
            "dead" => ProjectStatus::Dead,
            "bid" => ProjectStatus::Bid,
            "complete" => ProjectStatus::Complete,
            "dormant" => ProjectStatus::Dormant,
            _ => ProjectStatus::Other(s.to_string()),
        }
    }

    /// Badge colour for this status. Unknown statuses render like `Live`.
    pub fn badge_color(&self) -> BadgeColor {
        match self {
            ProjectStatus::Live | ProjectStatus::Other(_) => BadgeColor::Emerald,
            ProjectStatus::Dead => BadgeColor::Red,
            ProjectStatus::Bid => BadgeColor::Purple,
            ProjectStatus::Complete => BadgeColor::Blue,
            ProjectStatus::Dormant => BadgeColor::Amber,
        }
    }
}

impl From<String> for ProjectStatus {
    fn from(s: String) -> Self {
        ProjectStatus::parse(&s)
    }
}

impl From<ProjectStatus> for String {
    fn from(status: ProjectStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::Live => write!(f, "Live"),
            ProjectStatus::Dead => write!(f, "Dead"),
            ProjectStatus::Bid => write!(f, "Bid"),
            ProjectStatus::Complete => write!(f, "Complete"),
            ProjectStatus::Dormant => write!(f, "Dormant"),
            ProjectStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// Most recent cost-data milestone reached by a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CostMilestone {
    #[serde(rename = "Cost Model 1")]
    CostModel1,
    #[serde(rename = "Cost Model 2")]
    CostModel2,
    #[serde(rename = "Cost Model 3")]
    CostModel3,
    #[serde(rename = "Cost Model 4")]
    CostModel4,
    #[serde(rename = "Final Account")]
    FinalAccount,
    #[serde(rename = "Contract Sum")]
    ContractSum,
}

impl CostMilestone {
    pub const ALL: [CostMilestone; 6] = [
        CostMilestone::CostModel1,
        CostMilestone::CostModel2,
        CostMilestone::CostModel3,
        CostMilestone::CostModel4,
        CostMilestone::FinalAccount,
        CostMilestone::ContractSum,
    ];
}

impl fmt::Display for CostMilestone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CostMilestone::CostModel1 => write!(f, "Cost Model 1"),
            CostMilestone::CostModel2 => write!(f, "Cost Model 2"),
            CostMilestone::CostModel3 => write!(f, "Cost Model 3"),
            CostMilestone::CostModel4 => write!(f, "Cost Model 4"),
            CostMilestone::FinalAccount => write!(f, "Final Account"),
            CostMilestone::ContractSum => write!(f, "Contract Sum"),
        }
    }
}

impl FromStr for CostMilestone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        CostMilestone::ALL
            .into_iter()
            .find(|m| normalize_label(&m.to_string()) == wanted)
            .ok_or_else(|| format!("Unknown cost milestone: {}", s))
    }
}

/// WC provision recorded for a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WcType {
    #[serde(rename = "Superloo Only")]
    SuperlooOnly,
    #[serde(rename = "Cubicle Only")]
    CubicleOnly,
    #[serde(rename = "Combined")]
    Combined,
}

impl WcType {
    pub const ALL: [WcType; 3] = [WcType::SuperlooOnly, WcType::CubicleOnly, WcType::Combined];
}

impl fmt::Display for WcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WcType::SuperlooOnly => write!(f, "Superloo Only"),
            WcType::CubicleOnly => write!(f, "Cubicle Only"),
            WcType::Combined => write!(f, "Combined"),
        }
    }
}

impl FromStr for WcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_label(s);
        WcType::ALL
            .into_iter()
            .find(|t| normalize_label(&t.to_string()) == wanted)
            .ok_or_else(|| format!("Unknown WC type: {}", s))
    }
}

/// Lowercase and strip separators so "final-account" parses as "Final Account"
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Data categories tracked for completeness
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataCategory {
    Areas,
    Cost,
    Programme,
    #[serde(rename = "WC")]
    Wc,
    Reception,
}

impl DataCategory {
    pub const ALL: [DataCategory; 5] = [
        DataCategory::Areas,
        DataCategory::Cost,
        DataCategory::Programme,
        DataCategory::Wc,
        DataCategory::Reception,
    ];
}

impl fmt::Display for DataCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataCategory::Areas => write!(f, "Areas"),
            DataCategory::Cost => write!(f, "Cost"),
            DataCategory::Programme => write!(f, "Programme"),
            DataCategory::Wc => write!(f, "WC"),
            DataCategory::Reception => write!(f, "Reception"),
        }
    }
}

/// How complete a project's data is for one category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataLevel {
    Complete,
    Partial,
    #[default]
    None,
}

impl DataLevel {
    /// Tooltip text shown next to the availability indicator
    pub fn tooltip(&self) -> &'static str {
        match self {
            DataLevel::Complete => "Detailed data",
            DataLevel::Partial => "High Level data",
            DataLevel::None => "No data",
        }
    }
}

/// Per-category completeness; categories without an entry read as `None`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DataAvailability(BTreeMap<DataCategory, DataLevel>);

impl DataAvailability {
    pub fn level(&self, category: DataCategory) -> DataLevel {
        self.0.get(&category).copied().unwrap_or_default()
    }

    pub fn set(&mut self, category: DataCategory, level: DataLevel) {
        self.0.insert(category, level);
    }
}

/// Controlled vocabularies for the three scope categories
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub sectors: Vec<String>,
    pub scopes: Vec<String>,
    pub locations: Vec<String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        fn owned(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }
        Self {
            sectors: owned(&["Offices", "Mixed Use", "Retail", "Commercial"]),
            scopes: owned(&["New Build", "Refurbishment", "Extension", "Renovation", "Retrofit"]),
            locations: owned(&[
                "Liverpool St",
                "Moorgate",
                "Bank",
                "Spitalfields",
                "Euston",
                "City",
                "Shoreditch",
            ]),
        }
    }
}

/// Tag category of a scope string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagCategory {
    Sector,
    Scope,
    Location,
}

impl Vocabulary {
    /// Which category a tag belongs to, if any
    pub fn classify(&self, tag: &str) -> Option<TagCategory> {
        if self.sectors.iter().any(|s| s == tag) {
            Some(TagCategory::Sector)
        } else if self.scopes.iter().any(|s| s == tag) {
            Some(TagCategory::Scope)
        } else if self.locations.iter().any(|s| s == tag) {
            Some(TagCategory::Location)
        } else {
            None
        }
    }
}

/// A scope string parsed into its three tag categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeTags {
    pub sectors: Vec<String>,
    pub scopes: Vec<String>,
    pub locations: Vec<String>,
    /// Tokens found in no vocabulary
    pub unclassified: Vec<String>,
}

impl ScopeTags {
    /// Splits `raw` on the scope delimiter and sorts tokens into categories
    pub fn parse(raw: &str, vocabulary: &Vocabulary) -> Self {
        let mut tags = ScopeTags::default();
        for token in raw.split(SCOPE_DELIMITER).map(str::trim).filter(|t| !t.is_empty()) {
            let bucket = match vocabulary.classify(token) {
                Some(TagCategory::Sector) => &mut tags.sectors,
                Some(TagCategory::Scope) => &mut tags.scopes,
                Some(TagCategory::Location) => &mut tags.locations,
                None => &mut tags.unclassified,
            };
            if !bucket.iter().any(|t| t == token) {
                bucket.push(token.to_string());
            }
        }
        tags
    }

    pub fn in_category(&self, category: TagCategory) -> &[String] {
        match category {
            TagCategory::Sector => &self.sectors,
            TagCategory::Scope => &self.scopes,
            TagCategory::Location => &self.locations,
        }
    }

    /// True if any category holds `tag`
    pub fn contains(&self, tag: &str) -> bool {
        self.sectors
            .iter()
            .chain(&self.scopes)
            .chain(&self.locations)
            .any(|t| t == tag)
    }

    /// Display label in sector • scope • location order
    pub fn label(&self) -> String {
        self.sectors
            .iter()
            .chain(&self.scopes)
            .chain(&self.locations)
            .chain(&self.unclassified)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(SCOPE_DELIMITER)
    }
}

/// A project as it appears in a catalog file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectEntry {
    pub id: String,
    pub number: String,
    pub name: String,
    pub scope: String,
    pub area: f64,
    pub cost_per_sqft: f64,
    pub base_cost_per_sqft: f64,
    pub net_gross: f64,
    pub latest_data: CostMilestone,
    pub status: ProjectStatus,
    pub base_date: NaiveDate,
    #[serde(default)]
    pub data_availability: DataAvailability,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wc_type: Option<WcType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reception_cost: Option<f64>,
}

/// A loaded project record. Immutable once the catalog is built.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectRecord {
    pub id: String,
    pub number: String,
    pub name: String,
    pub scope: ScopeTags,
    /// Floor area in square feet
    pub area: f64,
    pub cost_per_sqft: f64,
    pub base_cost_per_sqft: f64,
    pub net_gross: f64,
    pub latest_data: CostMilestone,
    pub status: ProjectStatus,
    pub base_date: NaiveDate,
    pub data_availability: DataAvailability,
    pub wc_type: Option<WcType>,
    pub reception_cost: Option<f64>,
    /// Position in the catalog; the stable sort key
    pub seq: usize,
}

impl ProjectRecord {
    /// Builds a record from a catalog entry, parsing its scope string once
    pub fn from_entry(entry: ProjectEntry, seq: usize, vocabulary: &Vocabulary) -> Self {
        Self {
            scope: ScopeTags::parse(&entry.scope, vocabulary),
            id: entry.id,
            number: entry.number,
            name: entry.name,
            area: entry.area,
            cost_per_sqft: entry.cost_per_sqft,
            base_cost_per_sqft: entry.base_cost_per_sqft,
            net_gross: entry.net_gross,
            latest_data: entry.latest_data,
            status: entry.status,
            base_date: entry.base_date,
            data_availability: entry.data_availability,
            wc_type: entry.wc_type,
            reception_cost: entry.reception_cost,
            seq,
        }
    }

    /// Cost per ft² under the given date mode
    pub fn cost(&self, mode: DateMode) -> f64 {
        match mode {
            DateMode::Current => self.cost_per_sqft,
            DateMode::BaseDate => self.base_cost_per_sqft,
        }
    }

    /// Name to show; confidential mode substitutes the project number
    pub fn display_name(&self, confidential: bool) -> &str {
        if confidential {
            &self.number
        } else {
            &self.name
        }
    }
}
