//! Similar-project recommender
//!
//! Scores catalog candidates against a primary project under one of three
//! strategies and ranks them 0-100. Every function here is pure: the same
//! primary, candidates, strategy and date mode always give the same ranking.
//!
//! Scoring:
//! - Default: 40 × sector overlap + 40 × scope overlap + 20 × area closeness.
//!   Candidates must share a sector and a scope tag and be at most twice the
//!   primary's area.
//! - Reception: 100 × reception-cost closeness, zero at a 50% difference.
//! - WC: 50 for a matching WC type + 25 × area closeness + 25 × cost
//!   closeness (zero at a 50% difference).
//!
//! Scores round half away from zero.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::{DateMode, ProjectRecord};

const SECTOR_WEIGHT: f64 = 40.0;
const SCOPE_WEIGHT: f64 = 40.0;
const SIZE_WEIGHT: f64 = 20.0;
const RECEPTION_WEIGHT: f64 = 100.0;
const WC_MATCH_BONUS: f64 = 50.0;
const WC_SIZE_WEIGHT: f64 = 25.0;
const WC_COST_WEIGHT: f64 = 25.0;

/// Relative difference at which area closeness reaches zero
const AREA_TOLERANCE: f64 = 1.0;
/// Relative difference at which cost closeness reaches zero
const COST_TOLERANCE: f64 = 0.5;
/// Largest candidate area, as a multiple of the primary's, for the default strategy
const MAX_AREA_FACTOR: f64 = 2.0;

/// How candidates are compared with the primary project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Sector, scope and size
    #[default]
    Default,
    /// Reception cost per ft²
    Reception,
    /// WC type, size and cost
    Wc,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Default, Strategy::Reception, Strategy::Wc];

    pub fn description(&self) -> &'static str {
        match self {
            Strategy::Default => {
                "Similarity score is based on matching sector (40%), scope (40%), and area size (20%). \
                 Only projects with the same sector and scope that are within 100% of the primary \
                 project's area are shown."
            }
            Strategy::Reception => {
                "Similarity score is based on matching reception cost per ft² (100%)."
            }
            Strategy::Wc => {
                "Similarity score is based on matching WC type (50%), area size (25%), and cost per ft² (25%)."
            }
        }
    }

    /// Checks the primary carries the data this strategy needs
    pub fn check_primary(&self, primary: &ProjectRecord) -> Result<(), NoDataReason> {
        match self {
            Strategy::Default => Ok(()),
            Strategy::Reception if primary.reception_cost.is_none() => {
                Err(NoDataReason::MissingReceptionCost)
            }
            Strategy::Wc if primary.wc_type.is_none() => Err(NoDataReason::MissingWcType),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Default => write!(f, "default"),
            Strategy::Reception => write!(f, "reception"),
            Strategy::Wc => write!(f, "wc"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" | "sector" => Ok(Strategy::Default),
            "reception" => Ok(Strategy::Reception),
            "wc" => Ok(Strategy::Wc),
            _ => Err(format!("Unknown similarity strategy: {}", s)),
        }
    }
}

/// Why a strategy cannot run for the chosen primary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    MissingReceptionCost,
    MissingWcType,
}

impl fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoDataReason::MissingReceptionCost => write!(
                f,
                "The primary project has no reception cost data, so reception similarity is unavailable."
            ),
            NoDataReason::MissingWcType => write!(
                f,
                "The primary project has no WC type data, so WC similarity is unavailable."
            ),
        }
    }
}

/// Why a candidate was left out of a ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    IsPrimary,
    Unavailable(NoDataReason),
    NoSharedSector,
    NoSharedScope,
    AreaOutOfRange,
    MissingReceptionCost,
    MissingWcType,
    DifferentWcType,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::IsPrimary => write!(f, "primary project"),
            Exclusion::Unavailable(reason) => write!(f, "{}", reason),
            Exclusion::NoSharedSector => write!(f, "no shared sector"),
            Exclusion::NoSharedScope => write!(f, "no shared scope"),
            Exclusion::AreaOutOfRange => write!(f, "area more than twice the primary's"),
            Exclusion::MissingReceptionCost => write!(f, "no reception cost data"),
            Exclusion::MissingWcType => write!(f, "no WC type data"),
            Exclusion::DifferentWcType => write!(f, "different WC type"),
        }
    }
}

/// A ranked candidate
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarProject<'a> {
    pub project: &'a ProjectRecord,
    pub score: u8,
}

/// Result of ranking candidates under one strategy
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking<'a> {
    pub strategy: Strategy,
    /// Descending by score, ties in catalog order
    pub matches: Vec<SimilarProject<'a>>,
    /// Set when the primary lacks the data the strategy needs
    pub unavailable: Option<NoDataReason>,
}

impl Ranking<'_> {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// Scores one candidate, or explains why it is excluded
pub fn evaluate(
    primary: &ProjectRecord,
    candidate: &ProjectRecord,
    strategy: Strategy,
    mode: DateMode,
) -> Result<u8, Exclusion> {
    strategy.check_primary(primary).map_err(Exclusion::Unavailable)?;
    if candidate.id == primary.id {
        return Err(Exclusion::IsPrimary);
    }

    let raw = match strategy {
        Strategy::Default => score_default(primary, candidate)?,
        Strategy::Reception => score_reception(primary, candidate)?,
        Strategy::Wc => score_wc(primary, candidate, mode)?,
    };
    Ok(round_score(raw))
}

/// Ranks every eligible candidate, best first
pub fn rank<'a, I>(
    primary: &ProjectRecord,
    candidates: I,
    strategy: Strategy,
    mode: DateMode,
) -> Ranking<'a>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    if let Err(reason) = strategy.check_primary(primary) {
        log::debug!("{} similarity unavailable for {}: {:?}", strategy, primary.id, reason);
        return Ranking {
            strategy,
            matches: Vec::new(),
            unavailable: Some(reason),
        };
    }

    let mut matches: Vec<SimilarProject<'a>> = candidates
        .into_iter()
        .filter_map(|candidate| {
            evaluate(primary, candidate, strategy, mode)
                .ok()
                .map(|score| SimilarProject {
                    project: candidate,
                    score,
                })
        })
        .collect();

    matches.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.project.seq.cmp(&b.project.seq))
    });

    Ranking {
        strategy,
        matches,
        unavailable: None,
    }
}

/// Candidates a ranking leaves out and why, in catalog order
///
/// The primary itself is skipped. Empty when the strategy is unavailable for
/// the primary, since [`Ranking::unavailable`] already covers that case.
pub fn explain<'a, I>(
    primary: &ProjectRecord,
    candidates: I,
    strategy: Strategy,
    mode: DateMode,
) -> Vec<(&'a ProjectRecord, Exclusion)>
where
    I: IntoIterator<Item = &'a ProjectRecord>,
{
    if strategy.check_primary(primary).is_err() {
        return Vec::new();
    }
    candidates
        .into_iter()
        .filter_map(|candidate| match evaluate(primary, candidate, strategy, mode) {
            Err(Exclusion::IsPrimary) | Ok(_) => None,
            Err(exclusion) => Some((candidate, exclusion)),
        })
        .collect()
}

/// Which strategies the primary supports
pub fn availability(primary: &ProjectRecord) -> Vec<(Strategy, Option<NoDataReason>)> {
    Strategy::ALL
        .into_iter()
        .map(|s| (s, s.check_primary(primary).err()))
        .collect()
}

/// Signed percentage difference of the candidate's reception cost from the
/// primary's, rounded. `None` if either lacks the figure.
pub fn reception_difference_percent(
    primary: &ProjectRecord,
    candidate: &ProjectRecord,
) -> Option<i64> {
    let reference = primary.reception_cost?;
    let value = candidate.reception_cost?;
    if reference == 0.0 {
        return None;
    }
    Some(((value / reference - 1.0) * 100.0).round() as i64)
}

fn score_default(primary: &ProjectRecord, candidate: &ProjectRecord) -> Result<f64, Exclusion> {
    let p = &primary.scope;
    let c = &candidate.scope;

    if !p.sectors.iter().any(|s| c.sectors.contains(s)) {
        return Err(Exclusion::NoSharedSector);
    }
    if !p.scopes.iter().any(|s| c.scopes.contains(s)) {
        return Err(Exclusion::NoSharedScope);
    }
    if candidate.area < 0.0 || candidate.area > primary.area * MAX_AREA_FACTOR {
        return Err(Exclusion::AreaOutOfRange);
    }

    Ok(SECTOR_WEIGHT * tag_overlap(&p.sectors, &c.sectors)
        + SCOPE_WEIGHT * tag_overlap(&p.scopes, &c.scopes)
        + SIZE_WEIGHT * closeness(candidate.area, primary.area, AREA_TOLERANCE))
}

fn score_reception(primary: &ProjectRecord, candidate: &ProjectRecord) -> Result<f64, Exclusion> {
    let reference = primary
        .reception_cost
        .ok_or(Exclusion::Unavailable(NoDataReason::MissingReceptionCost))?;
    let value = candidate
        .reception_cost
        .ok_or(Exclusion::MissingReceptionCost)?;

    Ok(RECEPTION_WEIGHT * closeness(value, reference, COST_TOLERANCE))
}

fn score_wc(
    primary: &ProjectRecord,
    candidate: &ProjectRecord,
    mode: DateMode,
) -> Result<f64, Exclusion> {
    let wanted = primary
        .wc_type
        .ok_or(Exclusion::Unavailable(NoDataReason::MissingWcType))?;
    match candidate.wc_type {
        None => return Err(Exclusion::MissingWcType),
        Some(t) if t != wanted => return Err(Exclusion::DifferentWcType),
        Some(_) => {}
    }

    Ok(WC_MATCH_BONUS
        + WC_SIZE_WEIGHT * closeness(candidate.area, primary.area, AREA_TOLERANCE)
        + WC_COST_WEIGHT * closeness(candidate.cost(mode), primary.cost(mode), COST_TOLERANCE))
}

/// Shared tags over the larger tag count; 0 when both are empty
fn tag_overlap(a: &[String], b: &[String]) -> f64 {
    let larger = a.len().max(b.len());
    if larger == 0 {
        return 0.0;
    }
    let shared = a.iter().filter(|t| b.contains(t)).count();
    shared as f64 / larger as f64
}

/// `max(0, 1 - (|value - reference| / reference) / tolerance)`; 0 for a zero reference
fn closeness(value: f64, reference: f64, tolerance: f64) -> f64 {
    if reference == 0.0 || tolerance == 0.0 {
        return 0.0;
    }
    let relative = (value - reference).abs() / reference.abs();
    (1.0 - relative / tolerance).max(0.0)
}

/// Round half away from zero into 0..=100
fn round_score(raw: f64) -> u8 {
    raw.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::models::{ScopeTags, Vocabulary, WcType};

    fn catalog() -> Catalog {
        Catalog::builtin(&Vocabulary::default()).unwrap()
    }

    fn scored(ranking: &Ranking) -> Vec<(String, u8)> {
        ranking
            .matches
            .iter()
            .map(|m| (m.project.id.clone(), m.score))
            .collect()
    }

    fn pair(id: &str, score: u8) -> (String, u8) {
        (id.to_string(), score)
    }

    #[test]
    fn test_default_scenario_rounds_half_away_from_zero() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let candidate = catalog.get("9").unwrap();
        // 40 + 40 + 20 × (1 − 3450/95750) = 99.279
        assert_eq!(evaluate(primary, candidate, Strategy::Default, DateMode::Current), Ok(99));
    }

    #[test]
    fn test_default_ranking() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let ranking = rank(primary, catalog.iter(), Strategy::Default, DateMode::Current);
        assert_eq!(ranking.unavailable, None);
        assert_eq!(scored(&ranking), vec![pair("11", 100), pair("9", 99)]);
    }

    #[test]
    fn test_default_exclusions() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let check = |id: &str| evaluate(primary, catalog.get(id).unwrap(), Strategy::Default, DateMode::Current);
        assert_eq!(check("2"), Err(Exclusion::IsPrimary));
        assert_eq!(check("10"), Err(Exclusion::NoSharedSector));
        assert_eq!(check("7"), Err(Exclusion::NoSharedScope));

        let mut huge = catalog.get("9").unwrap().clone();
        huge.id = "huge".to_string();
        huge.area = primary.area * 2.0 + 1.0;
        assert_eq!(
            evaluate(primary, &huge, Strategy::Default, DateMode::Current),
            Err(Exclusion::AreaOutOfRange)
        );
        huge.area = primary.area * 2.0;
        assert_eq!(evaluate(primary, &huge, Strategy::Default, DateMode::Current), Ok(80));
    }

    #[test]
    fn test_default_score_non_increasing_with_area_difference() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let mut candidate = catalog.get("9").unwrap().clone();

        let mut last = u8::MAX;
        for step in 0..=40 {
            let factor = 1.0 + step as f64 / 40.0;
            candidate.area = primary.area * factor;
            let score = evaluate(primary, &candidate, Strategy::Default, DateMode::Current).unwrap();
            assert!(score <= last, "score rose at factor {}", factor);
            last = score;
        }
        assert_eq!(last, 80);
    }

    #[test]
    fn test_default_partial_tag_overlap() {
        let vocab = Vocabulary::default();
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let mut candidate = catalog.get("9").unwrap().clone();
        candidate.scope = ScopeTags::parse("Mixed Use • Offices • Refurbishment • Moorgate", &vocab);
        candidate.area = primary.area;
        // 40 × 1/2 + 40 + 20
        assert_eq!(evaluate(primary, &candidate, Strategy::Default, DateMode::Current), Ok(80));
    }

    #[test]
    fn test_zero_denominators_are_guarded() {
        let catalog = catalog();
        let mut primary = catalog.get("2").unwrap().clone();
        primary.area = 0.0;
        let mut candidate = catalog.get("9").unwrap().clone();
        candidate.area = 0.0;
        assert_eq!(evaluate(&primary, &candidate, Strategy::Default, DateMode::Current), Ok(80));

        assert_eq!(tag_overlap(&[], &[]), 0.0);
        assert_eq!(closeness(10.0, 0.0, 0.5), 0.0);

        primary.reception_cost = Some(0.0);
        assert_eq!(evaluate(&primary, &candidate, Strategy::Reception, DateMode::Current), Ok(0));
    }

    #[test]
    fn test_reception_ranking() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let ranking = rank(primary, catalog.iter(), Strategy::Reception, DateMode::Current);
        assert_eq!(scored(&ranking), vec![pair("11", 98), pair("9", 95), pair("10", 94)]);
    }

    #[test]
    fn test_reception_floor_at_half_difference() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let mut candidate = catalog.get("9").unwrap().clone();
        candidate.reception_cost = Some(975.0);
        assert_eq!(evaluate(primary, &candidate, Strategy::Reception, DateMode::Current), Ok(0));
        candidate.reception_cost = Some(2000.0);
        assert_eq!(evaluate(primary, &candidate, Strategy::Reception, DateMode::Current), Ok(0));
    }

    #[test]
    fn test_reception_empty_without_primary_data() {
        let catalog = catalog();
        let primary = catalog.get("1").unwrap();
        let ranking = rank(primary, catalog.iter(), Strategy::Reception, DateMode::Current);
        assert!(ranking.is_empty());
        assert_eq!(ranking.unavailable, Some(NoDataReason::MissingReceptionCost));

        let empty = rank(primary, std::iter::empty(), Strategy::Reception, DateMode::Current);
        assert_eq!(empty.unavailable, Some(NoDataReason::MissingReceptionCost));
    }

    #[test]
    fn test_wc_ranking_ties_keep_catalog_order() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let ranking = rank(primary, catalog.iter(), Strategy::Wc, DateMode::Current);
        assert_eq!(
            scored(&ranking),
            vec![pair("9", 99), pair("11", 99), pair("10", 97), pair("bunker-1", 93)]
        );

        let reversed: Vec<&ProjectRecord> = catalog.iter().rev().collect();
        let ranking = rank(primary, reversed, Strategy::Wc, DateMode::Current);
        assert_eq!(ranking.matches[0].project.id, "9");
        assert_eq!(ranking.matches[1].project.id, "11");
    }

    #[test]
    fn test_wc_cost_follows_date_mode() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let candidate = catalog.get("10").unwrap();
        assert_eq!(evaluate(primary, candidate, Strategy::Wc, DateMode::Current), Ok(97));
        assert_eq!(evaluate(primary, candidate, Strategy::Wc, DateMode::BaseDate), Ok(98));
    }

    #[test]
    fn test_wc_exclusions() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        assert_eq!(
            evaluate(primary, catalog.get("1").unwrap(), Strategy::Wc, DateMode::Current),
            Err(Exclusion::MissingWcType)
        );
        let mut other = catalog.get("9").unwrap().clone();
        other.wc_type = Some(WcType::Combined);
        assert_eq!(
            evaluate(primary, &other, Strategy::Wc, DateMode::Current),
            Err(Exclusion::DifferentWcType)
        );

        let no_wc = catalog.get("1").unwrap();
        let ranking = rank(no_wc, catalog.iter(), Strategy::Wc, DateMode::Current);
        assert!(ranking.is_empty());
        assert_eq!(ranking.unavailable, Some(NoDataReason::MissingWcType));
    }

    #[test]
    fn test_explain_lists_every_excluded_candidate() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        let excluded = explain(primary, catalog.iter(), Strategy::Default, DateMode::Current);
        let ranking = rank(primary, catalog.iter(), Strategy::Default, DateMode::Current);

        assert_eq!(excluded.len() + ranking.matches.len(), catalog.len() - 1);
        assert!(excluded.iter().all(|(p, _)| p.id != "2"));
        let reason = |id: &str| excluded.iter().find(|(p, _)| p.id == id).map(|(_, e)| *e);
        assert_eq!(reason("10"), Some(Exclusion::NoSharedSector));
        assert_eq!(reason("7"), Some(Exclusion::NoSharedScope));
        assert_eq!(reason("11"), None);

        let seqs: Vec<usize> = excluded.iter().map(|(p, _)| p.seq).collect();
        let mut ordered = seqs.clone();
        ordered.sort();
        assert_eq!(seqs, ordered);
    }

    #[test]
    fn test_explain_is_empty_when_strategy_unavailable() {
        let catalog = catalog();
        let no_wc = catalog.get("1").unwrap();
        assert!(explain(no_wc, catalog.iter(), Strategy::Wc, DateMode::Current).is_empty());
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let catalog = catalog();
        let primary = catalog.get("2").unwrap();
        for strategy in Strategy::ALL {
            let first = rank(primary, catalog.iter(), strategy, DateMode::Current);
            let second = rank(primary, catalog.iter(), strategy, DateMode::Current);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_availability_and_reception_difference() {
        let catalog = catalog();
        let with_data = catalog.get("2").unwrap();
        assert!(availability(with_data).iter().all(|(_, reason)| reason.is_none()));

        let without = catalog.get("1").unwrap();
        let flags = availability(without);
        assert_eq!(flags[0], (Strategy::Default, None));
        assert_eq!(flags[1], (Strategy::Reception, Some(NoDataReason::MissingReceptionCost)));
        assert_eq!(flags[2], (Strategy::Wc, Some(NoDataReason::MissingWcType)));

        let moorgate = catalog.get("10").unwrap();
        assert_eq!(reception_difference_percent(with_data, moorgate), Some(3));
        assert_eq!(reception_difference_percent(with_data, without), None);
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("WC".parse::<Strategy>(), Ok(Strategy::Wc));
        assert_eq!("reception".parse::<Strategy>(), Ok(Strategy::Reception));
        assert!("colour".parse::<Strategy>().is_err());
    }
}
