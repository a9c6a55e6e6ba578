//! The three views behind the menu and the router state that selects between them.
//!
//! Each view does its own round trip to the data store on every render; nothing is cached between
//! renders.

pub mod chart;
pub mod entry;
pub mod table;
pub mod trend;

use serde::{Deserialize, Serialize};

/// The menu entries, in menu order. The first is the default.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    /// The reading form.
    #[default]
    Entry,
    /// All stored readings as a grid.
    Table,
    /// The gas consumption chart.
    #[serde(rename = "plots")]
    Trend,
}

serde_plain::derive_display_from_serialize!(View);
serde_plain::derive_fromstr_from_deserialize!(View);

impl View {
    pub const ALL: [View; 3] = [View::Entry, View::Table, View::Trend];

    /// The menu label.
    pub fn label(&self) -> &'static str {
        match self {
            View::Entry => "Data entry usage",
            View::Table => "Data table",
            View::Trend => "Data plots",
        }
    }

    /// Resolves the `view` request parameter. A missing or unknown value selects the default.
    pub fn from_param(param: Option<&str>) -> Self {
        param
            .and_then(|s| s.parse::<View>().ok())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_first_menu_entry() {
        assert_eq!(View::default(), View::ALL[0]);
        assert_eq!(View::default(), View::Entry);
    }

    #[test]
    fn test_from_param() {
        assert_eq!(View::from_param(None), View::Entry);
        assert_eq!(View::from_param(Some("table")), View::Table);
        assert_eq!(View::from_param(Some("plots")), View::Trend);
        assert_eq!(View::from_param(Some("entry")), View::Entry);
        assert_eq!(View::from_param(Some("settings")), View::Entry);
    }

    #[test]
    fn test_display_round_trip() {
        for view in View::ALL {
            assert_eq!(View::from_param(Some(&view.to_string())), view);
        }
        assert_eq!(View::Trend.to_string(), "plots");
    }
}
