use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum GoogleCalendarAccessRole {
    Owner,
    Writer,
    Reader,
    FreeBusyReader,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarListEntry {
    pub id: String,
    pub access_role: GoogleCalendarAccessRole,
    pub summary: String,
    pub summary_override: Option<String>,
    pub description: Option<String>,
    pub time_zone: Option<String>,
    pub color_id: Option<String>,
    pub background_color: Option<String>,
    pub hidden: Option<bool>,
    pub selected: Option<bool>,
    pub primary: Option<bool>,
    pub deleted: Option<bool>,
}

/// The fixed Google event palette. Google events carry a `colorId` into this
/// table, the canonical store keeps hex colors.
/// https://developers.google.com/calendar/api/v3/reference/colors
const EVENT_COLORS: [(&str, &str); 11] = [
    ("1", "#a4bdfc"),
    ("2", "#7ae7bf"),
    ("3", "#dbadff"),
    ("4", "#ff887c"),
    ("5", "#fbd75b"),
    ("6", "#ffb878"),
    ("7", "#46d6db"),
    ("8", "#e1e1e1"),
    ("9", "#5484ed"),
    ("10", "#51b749"),
    ("11", "#dc2127"),
];

pub fn color_id_to_hex(color_id: &str) -> Option<&'static str> {
    EVENT_COLORS
        .iter()
        .find(|(id, _)| *id == color_id)
        .map(|(_, hex)| *hex)
}

pub fn hex_to_color_id(hex: &str) -> Option<&'static str> {
    let hex = hex.to_lowercase();
    EVENT_COLORS
        .iter()
        .find(|(_, h)| *h == hex)
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn maps_color_ids_both_ways() {
        for (id, hex) in EVENT_COLORS {
            assert_eq!(color_id_to_hex(id), Some(hex));
            assert_eq!(hex_to_color_id(hex), Some(id));
        }
    }

    #[test]
    fn hex_lookup_is_case_insensitive() {
        assert_eq!(hex_to_color_id("#A4BDFC"), Some("1"));
    }

    #[test]
    fn unknown_values_map_to_none() {
        assert_eq!(color_id_to_hex("12"), None);
        assert_eq!(hex_to_color_id("#000000"), None);
    }
}
