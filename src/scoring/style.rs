use anyhow::{bail, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// How a configured event is scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringStyle {
    FaultsThenTime,
    Faults100ThenTime,
    Faults200ThenTime,
    OpenCloseScoreThenTime,
    ScoreThenTime,
    TimePlusFaults,
    SpeedOnly,
    PassFail,
}

/// Coarse evaluation category derived from a [`ScoringStyle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringType {
    ByTime,
    ByOpenClose,
    ByPoints,
    BySpeed,
    ByPass,
    Unknown,
}

pub const ALL_STYLES: [ScoringStyle; 8] = [
    ScoringStyle::FaultsThenTime,
    ScoringStyle::Faults100ThenTime,
    ScoringStyle::Faults200ThenTime,
    ScoringStyle::OpenCloseScoreThenTime,
    ScoringStyle::ScoreThenTime,
    ScoringStyle::TimePlusFaults,
    ScoringStyle::SpeedOnly,
    ScoringStyle::PassFail,
];

pub fn classify(style: ScoringStyle) -> ScoringType {
    match style {
        ScoringStyle::FaultsThenTime
        | ScoringStyle::Faults100ThenTime
        | ScoringStyle::Faults200ThenTime
        | ScoringStyle::TimePlusFaults => ScoringType::ByTime,
        ScoringStyle::OpenCloseScoreThenTime => ScoringType::ByOpenClose,
        ScoringStyle::ScoreThenTime => ScoringType::ByPoints,
        ScoringStyle::SpeedOnly => ScoringType::BySpeed,
        ScoringStyle::PassFail => ScoringType::ByPass,
    }
}

/// Classify a style that may have failed to load.
pub fn classify_opt(style: Option<ScoringStyle>) -> ScoringType {
    style.map(classify).unwrap_or(ScoringType::Unknown)
}

/// Styles that only ever penalize finishing over SCT.
pub fn is_time_only_family(style: ScoringStyle) -> bool {
    matches!(
        style,
        ScoringStyle::FaultsThenTime
            | ScoringStyle::Faults100ThenTime
            | ScoringStyle::Faults200ThenTime
            | ScoringStyle::TimePlusFaults
    )
}

impl ScoringStyle {
    /// Parse a style name as written in venue files.
    ///
    /// Accepts the historical file names (`OCScoreThenTime`, `TimeNoPlaces`)
    /// as well as the variant names.
    pub fn parse(s: &str) -> Result<Self> {
        let style = match s.trim() {
            "FaultsThenTime" => ScoringStyle::FaultsThenTime,
            "Faults100ThenTime" => ScoringStyle::Faults100ThenTime,
            "Faults200ThenTime" => ScoringStyle::Faults200ThenTime,
            "OCScoreThenTime" | "OpenCloseScoreThenTime" => ScoringStyle::OpenCloseScoreThenTime,
            "ScoreThenTime" => ScoringStyle::ScoreThenTime,
            "TimePlusFaults" => ScoringStyle::TimePlusFaults,
            "TimeNoPlaces" | "SpeedOnly" => ScoringStyle::SpeedOnly,
            "PassFail" => ScoringStyle::PassFail,
            other => bail!("Unknown scoring style: {}", other),
        };
        Ok(style)
    }

    /// Name written back to venue files.
    pub fn file_name(&self) -> &'static str {
        match self {
            ScoringStyle::FaultsThenTime => "FaultsThenTime",
            ScoringStyle::Faults100ThenTime => "Faults100ThenTime",
            ScoringStyle::Faults200ThenTime => "Faults200ThenTime",
            ScoringStyle::OpenCloseScoreThenTime => "OCScoreThenTime",
            ScoringStyle::ScoreThenTime => "ScoreThenTime",
            ScoringStyle::TimePlusFaults => "TimePlusFaults",
            ScoringStyle::SpeedOnly => "TimeNoPlaces",
            ScoringStyle::PassFail => "PassFail",
        }
    }

    /// Human readable label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            ScoringStyle::FaultsThenTime => "Faults, then Time",
            ScoringStyle::Faults100ThenTime => "100 minus Faults, then Time",
            ScoringStyle::Faults200ThenTime => "200 minus Faults, then Time",
            ScoringStyle::OpenCloseScoreThenTime => "Opening/Closing Points, then Time",
            ScoringStyle::ScoreThenTime => "Points, then Time",
            ScoringStyle::TimePlusFaults => "Time plus Faults",
            ScoringStyle::SpeedOnly => "Time, no placements",
            ScoringStyle::PassFail => "Pass/Fail",
        }
    }

    pub fn scoring_type(&self) -> ScoringType {
        classify(*self)
    }
}

impl fmt::Display for ScoringStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl Serialize for ScoringStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.file_name())
    }
}

impl<'de> Deserialize<'de> for ScoringStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ScoringStyle::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for rule styles: an unrecognized name loads as `None`
/// (an unknown style) instead of failing the whole venue file.
pub(crate) mod lenient {
    use super::ScoringStyle;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        style: &Option<ScoringStyle>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match style {
            Some(style) => serializer.serialize_str(style.file_name()),
            None => serializer.serialize_str("Unknown"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<ScoringStyle>, D::Error> {
        let s = String::deserialize(deserializer)?;
        match ScoringStyle::parse(&s) {
            Ok(style) => Ok(Some(style)),
            Err(_) => {
                tracing::warn!(style = %s, "unrecognized scoring style, rule will not evaluate");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_total() {
        for style in ALL_STYLES {
            assert_ne!(classify(style), ScoringType::Unknown);
        }
    }

    #[test]
    fn test_classify_mapping() {
        assert_eq!(classify(ScoringStyle::FaultsThenTime), ScoringType::ByTime);
        assert_eq!(classify(ScoringStyle::Faults100ThenTime), ScoringType::ByTime);
        assert_eq!(classify(ScoringStyle::Faults200ThenTime), ScoringType::ByTime);
        assert_eq!(classify(ScoringStyle::TimePlusFaults), ScoringType::ByTime);
        assert_eq!(
            classify(ScoringStyle::OpenCloseScoreThenTime),
            ScoringType::ByOpenClose
        );
        assert_eq!(classify(ScoringStyle::ScoreThenTime), ScoringType::ByPoints);
        assert_eq!(classify(ScoringStyle::SpeedOnly), ScoringType::BySpeed);
        assert_eq!(classify(ScoringStyle::PassFail), ScoringType::ByPass);
    }

    #[test]
    fn test_classify_missing_style_is_unknown() {
        assert_eq!(classify_opt(None), ScoringType::Unknown);
        assert_eq!(
            classify_opt(Some(ScoringStyle::PassFail)),
            ScoringType::ByPass
        );
    }

    #[test]
    fn test_time_only_family() {
        let family: Vec<_> = ALL_STYLES
            .iter()
            .filter(|s| is_time_only_family(**s))
            .collect();
        assert_eq!(family.len(), 4);
        assert!(family.iter().all(|s| classify(**s) == ScoringType::ByTime));
    }

    #[test]
    fn test_parse_historical_names() {
        assert_eq!(
            ScoringStyle::parse("OCScoreThenTime").unwrap(),
            ScoringStyle::OpenCloseScoreThenTime
        );
        assert_eq!(
            ScoringStyle::parse("TimeNoPlaces").unwrap(),
            ScoringStyle::SpeedOnly
        );
        assert_eq!(
            ScoringStyle::parse(" SpeedOnly ").unwrap(),
            ScoringStyle::SpeedOnly
        );
        assert!(ScoringStyle::parse("Jumpers").is_err());
    }

    #[test]
    fn test_file_name_parses_back() {
        for style in ALL_STYLES {
            assert_eq!(ScoringStyle::parse(style.file_name()).unwrap(), style);
        }
    }
}
