use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The fixed set of tables in the local store.
///
/// Declaration order is the canonical order used by exports and audits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Table {
    Customers,
    Products,
    Orders,
    Invoices,
    Payments,
    TrackSheets,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Customers,
        Table::Products,
        Table::Orders,
        Table::Invoices,
        Table::Payments,
        Table::TrackSheets,
    ];

    /// Name used as the snapshot key and in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Products => "products",
            Table::Orders => "orders",
            Table::Invoices => "invoices",
            Table::Payments => "payments",
            Table::TrackSheets => "trackSheets",
        }
    }

    /// Name of the backing SQL table.
    pub(crate) fn sql_name(&self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Products => "products",
            Table::Orders => "orders",
            Table::Invoices => "invoices",
            Table::Payments => "payments",
            Table::TrackSheets => "track_sheets",
        }
    }

    /// Looks up a table by its snapshot key, exactly as written.
    pub fn from_name(name: &str) -> Option<Self> {
        Table::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_lowercase();

        Table::ALL
            .into_iter()
            .find(|t| t.name().to_lowercase() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid table '{}'. Valid options: customers, products, orders, invoices, payments, trackSheets",
                    s
                )
            })
    }
}
