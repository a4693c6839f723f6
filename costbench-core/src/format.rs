//! Display formatting for areas, costs and dates

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Square metres in one square foot
pub const SQM_PER_SQFT: f64 = 0.092903;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    pub fn area_unit(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "ft²",
            UnitSystem::Metric => "m²",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Imperial => write!(f, "imperial"),
            UnitSystem::Metric => write!(f, "metric"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imperial" | "ft" | "sqft" => Ok(UnitSystem::Imperial),
            "metric" | "m" | "sqm" => Ok(UnitSystem::Metric),
            _ => Err(format!("Unknown unit system: {}", s)),
        }
    }
}

/// Groups the integer part in thousands: `1234567.5` becomes `1,234,567.5`
pub fn format_number(value: f64) -> String {
    let text = value.to_string();
    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.as_str()),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

/// Area in square feet rendered in the chosen unit system. Metric areas are
/// rounded to whole square metres.
pub fn format_area(sqft: f64, units: UnitSystem) -> String {
    match units {
        UnitSystem::Imperial => format!("{} ft²", format_number(sqft)),
        UnitSystem::Metric => format!("{} m²", format_number((sqft * SQM_PER_SQFT).round())),
    }
}

/// Cost per square foot rendered per unit area of the chosen system
pub fn format_cost(per_sqft: f64, units: UnitSystem) -> String {
    match units {
        UnitSystem::Imperial => format!("£{:.2}/ft²", per_sqft),
        UnitSystem::Metric => format!("£{:.2}/m²", per_sqft / SQM_PER_SQFT),
    }
}

pub fn format_currency(value: f64) -> String {
    format!("£{}", format_number(value))
}

/// `2024-03-15` as `15 Mar 2024`; used for filter range bounds
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}

/// `2024-03-15` as `Mar 2024`; project base dates carry no day
pub fn format_month(date: NaiveDate) -> String {
    date.format("%b %Y").to_string()
}
