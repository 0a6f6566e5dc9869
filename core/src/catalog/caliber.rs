use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Marker radius used when a caliber name is not in the catalog.
pub const DEFAULT_RADIUS_MM: f64 = 3.0;

/// Training calibers offered for marker sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum Caliber {
    #[default]
    Lr22,
    Rem223,
    X545x39,
    Nato556x45,
    X762x39,
    X58x42,
    Grendel65,
    Spc68,
    Kurz792x33,
    Blackout300,
    Wt762x40,
    X9x39,
    Win308,
    X762x54R,
    Springfield3006,
    Creedmoor65,
    Swedish65x55,
    Rem260,
    WinNormaMag300,
    LapuaMag338,
    NormaMag338,
    CheyTac375,
    CheyTac408,
    Bmg50,
}

/// Catalog row pairing a caliber with its marker radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaliberSpec {
    pub caliber: Caliber,
    pub radius_mm: f64,
}

impl Caliber {
    pub const ALL: [Caliber; 24] = [
        Caliber::Lr22,
        Caliber::Rem223,
        Caliber::X545x39,
        Caliber::Nato556x45,
        Caliber::X762x39,
        Caliber::X58x42,
        Caliber::Grendel65,
        Caliber::Spc68,
        Caliber::Kurz792x33,
        Caliber::Blackout300,
        Caliber::Wt762x40,
        Caliber::X9x39,
        Caliber::Win308,
        Caliber::X762x54R,
        Caliber::Springfield3006,
        Caliber::Creedmoor65,
        Caliber::Swedish65x55,
        Caliber::Rem260,
        Caliber::WinNormaMag300,
        Caliber::LapuaMag338,
        Caliber::NormaMag338,
        Caliber::CheyTac375,
        Caliber::CheyTac408,
        Caliber::Bmg50,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Caliber::Lr22 => ".22 LR",
            Caliber::Rem223 => ".223 Rem",
            Caliber::X545x39 => "5.45x39",
            Caliber::Nato556x45 => "5.56x45 NATO",
            Caliber::X762x39 => "7.62x39",
            Caliber::X58x42 => "5.8x42",
            Caliber::Grendel65 => "6.5 Grendel",
            Caliber::Spc68 => "6.8 SPC",
            Caliber::Kurz792x33 => "7.92x33 Kurz",
            Caliber::Blackout300 => ".300 AAC Blackout",
            Caliber::Wt762x40 => "7.62x40 WT",
            Caliber::X9x39 => "9x39",
            Caliber::Win308 => ".308 Win",
            Caliber::X762x54R => "7.62x54R",
            Caliber::Springfield3006 => ".30-06 Sprg",
            Caliber::Creedmoor65 => "6.5 Creedmoor",
            Caliber::Swedish65x55 => "6.5x55 Swedish",
            Caliber::Rem260 => ".260 Rem",
            Caliber::WinNormaMag300 => ".300 Win-Norma Mag",
            Caliber::LapuaMag338 => ".338 Lapua Mag",
            Caliber::NormaMag338 => ".338 Norma Mag",
            Caliber::CheyTac375 => ".375 CheyTac",
            Caliber::CheyTac408 => ".408 CheyTac",
            Caliber::Bmg50 => ".50 BMG",
        }
    }

    /// Marker radius on the sheet. Small-bore rounds share a 4 mm floor so
    /// they stay visible.
    pub fn radius_mm(self) -> f64 {
        match self {
            Caliber::X762x39 | Caliber::X762x54R => 3.96,
            Caliber::Kurz792x33 => 4.11,
            Caliber::Blackout300 => 3.90,
            Caliber::Wt762x40 | Caliber::Win308 | Caliber::Springfield3006 => 3.91,
            Caliber::X9x39 => 4.62,
            Caliber::WinNormaMag300 => 3.92,
            Caliber::LapuaMag338 | Caliber::NormaMag338 => 4.30,
            Caliber::CheyTac375 => 4.76,
            Caliber::CheyTac408 => 5.18,
            Caliber::Bmg50 => 6.49,
            _ => 4.0,
        }
    }

    pub fn spec(self) -> CaliberSpec {
        CaliberSpec {
            caliber: self,
            radius_mm: self.radius_mm(),
        }
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        Self::ALL.iter().map(|c| c.name())
    }
}

/// Radius for a caliber given by name, [`DEFAULT_RADIUS_MM`] when unknown.
pub fn radius_for_name(name: &str) -> f64 {
    name.parse::<Caliber>()
        .map(Caliber::radius_mm)
        .unwrap_or(DEFAULT_RADIUS_MM)
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown caliber {0:?}")]
pub struct UnknownCaliber(pub String);

impl FromStr for Caliber {
    type Err = UnknownCaliber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| UnknownCaliber(s.to_string()))
    }
}

impl TryFrom<String> for Caliber {
    type Error = UnknownCaliber;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Caliber> for &'static str {
    fn from(value: Caliber) -> Self {
        value.name()
    }
}

impl fmt::Display for Caliber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for caliber in Caliber::ALL {
            assert_eq!(caliber.name().parse::<Caliber>(), Ok(caliber));
        }
    }

    #[test]
    fn unknown_name_uses_fallback_radius() {
        assert_eq!(radius_for_name(".45 ACP"), DEFAULT_RADIUS_MM);
        assert_eq!(radius_for_name(".50 BMG"), 6.49);
        assert!(".45 ACP".parse::<Caliber>().is_err());
        assert!(" .308 Win".parse::<Caliber>().is_err());
    }

    #[test]
    fn default_is_first_catalog_entry() {
        assert_eq!(Caliber::default(), Caliber::ALL[0]);
        assert_eq!(Caliber::default().radius_mm(), 4.0);
        assert_eq!(Caliber::names().count(), 24);
    }

    #[test]
    fn serializes_as_display_name() {
        let json = serde_json::to_string(&Caliber::Win308).unwrap();
        assert_eq!(json, "\".308 Win\"");
        let back: Caliber = serde_json::from_str("\"9x39\"").unwrap();
        assert_eq!(back, Caliber::X9x39);
    }
}
