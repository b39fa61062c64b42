//! Fulfillment hubs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseEnumError;

/// A fixed shipping location that shippers are assigned to and orders are routed through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hub {
    #[serde(rename = "Ho Chi Minh")]
    HoChiMinh,
    #[serde(rename = "Hanoi")]
    Hanoi,
    #[serde(rename = "Da Nang")]
    DaNang,
}

impl Hub {
    pub const ALL: [Hub; 3] = [Hub::HoChiMinh, Hub::Hanoi, Hub::DaNang];

    pub fn as_str(&self) -> &'static str {
        match self {
            Hub::HoChiMinh => "Ho Chi Minh",
            Hub::Hanoi => "Hanoi",
            Hub::DaNang => "Da Nang",
        }
    }
}

impl fmt::Display for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Hub {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hub::ALL
            .into_iter()
            .find(|hub| hub.as_str() == s.trim())
            .ok_or_else(|| ParseEnumError::new("hub", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_hub_name() {
        for hub in Hub::ALL {
            assert_eq!(hub.as_str().parse::<Hub>(), Ok(hub));
        }
        assert_eq!(" Hanoi ".parse::<Hub>(), Ok(Hub::Hanoi));
    }

    #[test]
    fn rejects_unknown_hub() {
        let err = "Hue".parse::<Hub>().unwrap_err();
        assert_eq!(err.kind, "hub");
        assert_eq!(err.value, "Hue");
    }

    #[test]
    fn serializes_with_display_names() {
        let json = serde_json::to_string(&Hub::HoChiMinh).unwrap();
        assert_eq!(json, "\"Ho Chi Minh\"");
        let hub: Hub = serde_json::from_str("\"Da Nang\"").unwrap();
        assert_eq!(hub, Hub::DaNang);
    }
}
