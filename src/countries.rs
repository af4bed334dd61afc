//! The fixed reference set of target countries and the per-source identifier
//! maps that resolve source spellings onto it.
//!
//! Every source names countries its own way: the World Bank reports
//! "Russian Federation" and "Kyrgyz Republic", the Heritage ranking uses
//! short names, and the API is queried by ISO code. All of that aliasing lives
//! here as constant tables so it can be checked in one place.

use crate::models::{Country, CountryRecord};
use std::collections::HashMap;
use std::fmt;

/// Reference countries in display order.
pub const REFERENCE_COUNTRIES: [CountryRecord; 15] = [
    CountryRecord { country: Country::Russia, name: "Russia", iso2: "RU", iso3: "RUS" },
    CountryRecord { country: Country::Ukraine, name: "Ukraine", iso2: "UA", iso3: "UKR" },
    CountryRecord { country: Country::Georgia, name: "Georgia", iso2: "GE", iso3: "GEO" },
    CountryRecord { country: Country::Kazakhstan, name: "Kazakhstan", iso2: "KZ", iso3: "KAZ" },
    CountryRecord { country: Country::Belarus, name: "Belarus", iso2: "BY", iso3: "BLR" },
    CountryRecord { country: Country::Armenia, name: "Armenia", iso2: "AM", iso3: "ARM" },
    CountryRecord { country: Country::Azerbaijan, name: "Azerbaijan", iso2: "AZ", iso3: "AZE" },
    CountryRecord { country: Country::Moldova, name: "Moldova", iso2: "MD", iso3: "MDA" },
    CountryRecord { country: Country::Uzbekistan, name: "Uzbekistan", iso2: "UZ", iso3: "UZB" },
    CountryRecord { country: Country::Turkmenistan, name: "Turkmenistan", iso2: "TM", iso3: "TKM" },
    CountryRecord { country: Country::Kyrgyzstan, name: "Kyrgyzstan", iso2: "KG", iso3: "KGZ" },
    CountryRecord { country: Country::Tajikistan, name: "Tajikistan", iso2: "TJ", iso3: "TJK" },
    CountryRecord { country: Country::Estonia, name: "Estonia", iso2: "EE", iso3: "EST" },
    CountryRecord { country: Country::Latvia, name: "Latvia", iso2: "LV", iso3: "LVA" },
    CountryRecord { country: Country::Lithuania, name: "Lithuania", iso2: "LT", iso3: "LTU" },
];

/// Long-form names used by statistics providers (World Bank, UN style).
pub const OFFICIAL_NAMES: &[(&str, Country)] = &[
    ("Russian Federation", Country::Russia),
    ("Kyrgyz Republic", Country::Kyrgyzstan),
    ("Republic of Moldova", Country::Moldova),
    ("Moldova, Republic of", Country::Moldova),
    ("Republic of Belarus", Country::Belarus),
    ("Republic of Turkmenistan", Country::Turkmenistan),
    ("Republic of Tajikistan", Country::Tajikistan),
    ("Republic of Uzbekistan", Country::Uzbekistan),
    ("Republic of Kazakhstan", Country::Kazakhstan),
    ("Republic of Armenia", Country::Armenia),
    ("Republic of Azerbaijan", Country::Azerbaijan),
    ("Republic of Georgia", Country::Georgia),
    ("Republic of Estonia", Country::Estonia),
    ("Republic of Latvia", Country::Latvia),
    ("Republic of Lithuania", Country::Lithuania),
];

/// Short and historical spellings seen on ranking pages.
pub const COLLOQUIAL_NAMES: &[(&str, Country)] = &[
    ("Kyrgyz Republic", Country::Kyrgyzstan),
    ("Kirghizia", Country::Kyrgyzstan),
    ("Russian Federation", Country::Russia),
    ("the Ukraine", Country::Ukraine),
    ("Byelorussia", Country::Belarus),
    ("Moldavia", Country::Moldova),
];

/// Spellings that different sources use for the same country, as
/// (colloquial spelling, official spelling, country).
#[cfg(test)]
pub(crate) const KNOWN_ALIAS_PAIRS: &[(&str, &str, Country)] = &[
    ("Kyrgyzstan", "Kyrgyz Republic", Country::Kyrgyzstan),
    ("Russia", "Russian Federation", Country::Russia),
    ("Moldova", "Republic of Moldova", Country::Moldova),
    ("Belarus", "Republic of Belarus", Country::Belarus),
    ("Turkmenistan", "Republic of Turkmenistan", Country::Turkmenistan),
    ("Tajikistan", "Republic of Tajikistan", Country::Tajikistan),
    ("Uzbekistan", "Republic of Uzbekistan", Country::Uzbekistan),
    ("Kazakhstan", "Republic of Kazakhstan", Country::Kazakhstan),
    ("Armenia", "Republic of Armenia", Country::Armenia),
    ("Azerbaijan", "Republic of Azerbaijan", Country::Azerbaijan),
    ("Georgia", "Republic of Georgia", Country::Georgia),
    ("Estonia", "Republic of Estonia", Country::Estonia),
    ("Latvia", "Republic of Latvia", Country::Latvia),
    ("Lithuania", "Republic of Lithuania", Country::Lithuania),
    ("the Ukraine", "Ukraine", Country::Ukraine),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Iso2,
    Iso3,
    OfficialName,
    ColloquialName,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Iso2 => "ISO alpha-2",
            Self::Iso3 => "ISO alpha-3",
            Self::OfficialName => "official name",
            Self::ColloquialName => "colloquial name",
        };
        f.write_str(s)
    }
}

/// Lookup from one kind of source identifier to a reference [`Country`].
///
/// Keys are compared case-insensitively with whitespace collapsed, so
/// `" kyrgyz  Republic"` and `"Kyrgyz Republic"` are the same identifier.
#[derive(Debug, Clone)]
pub struct IdentifierMap {
    kind: IdentifierKind,
    entries: HashMap<String, Country>,
}

impl IdentifierMap {
    /// Build the map for `kind` from the constant tables above.
    ///
    /// Name maps always include the canonical names, so the mapping is total
    /// over the reference set for every kind.
    pub fn for_kind(kind: IdentifierKind) -> Self {
        let mut map = Self {
            kind,
            entries: HashMap::new(),
        };
        for record in &REFERENCE_COUNTRIES {
            match kind {
                IdentifierKind::Iso2 => map.insert(record.iso2, record.country),
                IdentifierKind::Iso3 => map.insert(record.iso3, record.country),
                IdentifierKind::OfficialName | IdentifierKind::ColloquialName => {
                    map.insert(record.name, record.country)
                }
            }
        }
        let aliases = match kind {
            IdentifierKind::OfficialName => OFFICIAL_NAMES,
            IdentifierKind::ColloquialName => COLLOQUIAL_NAMES,
            _ => &[],
        };
        for (alias, country) in aliases {
            map.insert(alias, *country);
        }
        map
    }

    fn insert(&mut self, identifier: &str, country: Country) {
        let previous = self.entries.insert(normalize_key(identifier), country);
        debug_assert!(
            previous.is_none_or(|p| p == country),
            "identifier '{identifier}' maps to two countries"
        );
    }

    pub fn kind(&self) -> IdentifierKind {
        self.kind
    }

    pub fn resolve(&self, identifier: &str) -> Option<Country> {
        self.entries.get(&normalize_key(identifier)).copied()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.resolve(identifier).is_some()
    }
}

fn normalize_key(identifier: &str) -> String {
    identifier
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
