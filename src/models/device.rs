use serde::{Deserialize, Serialize};

use super::sample::Field;

// Raw export column positions:
// Time; Power_Grid; Power_Household; inverterPower; Power_PV;
// Power_Power Electronics; SOC_State of Charge; Status
pub const COL_TIME: usize = 0;
pub const COL_POWER_GRID: usize = 1;
pub const COL_POWER_HOUSEHOLD: usize = 2;
pub const COL_POWER_PV: usize = 4;
pub const COL_POWER_BATTERY: usize = 5;
pub const COL_STATE_OF_CHARGE: usize = 6;

// ---------------------------------------------------------------------------
// ColumnTarget / ColumnMapping — Where a raw column lands in a Sample
// ---------------------------------------------------------------------------

/// How one raw column is written into a [`crate::Sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnTarget {
    /// Signed reading split into a non-negative pair: positive values go to
    /// `positive`, the magnitude of negative values to `negative`, zero sets both to 0.
    Split { positive: Field, negative: Field },
    /// Power reading copied through as whole watts.
    Power(Field),
    /// Fractional reading copied through unchanged.
    Fraction(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub column: usize,
    pub target: ColumnTarget,
}

const PRIMARY_COLUMNS: &[ColumnMapping] = &[
    ColumnMapping {
        column: COL_POWER_GRID,
        target: ColumnTarget::Split {
            positive: Field::PowerFromGrid,
            negative: Field::PowerToGrid,
        },
    },
    ColumnMapping {
        column: COL_POWER_HOUSEHOLD,
        target: ColumnTarget::Power(Field::PowerHousehold),
    },
    ColumnMapping {
        column: COL_POWER_PV,
        target: ColumnTarget::Power(Field::PowerPv),
    },
    ColumnMapping {
        column: COL_POWER_BATTERY,
        target: ColumnTarget::Split {
            positive: Field::Battery1From,
            negative: Field::Battery1To,
        },
    },
    ColumnMapping {
        column: COL_STATE_OF_CHARGE,
        target: ColumnTarget::Fraction(Field::Battery1Soc),
    },
];

const SECONDARY_COLUMNS: &[ColumnMapping] = &[
    ColumnMapping {
        column: COL_POWER_BATTERY,
        target: ColumnTarget::Split {
            positive: Field::Battery2From,
            negative: Field::Battery2To,
        },
    },
    ColumnMapping {
        column: COL_STATE_OF_CHARGE,
        target: ColumnTarget::Fraction(Field::Battery2Soc),
    },
];

// ---------------------------------------------------------------------------
// DeviceRole
// ---------------------------------------------------------------------------

/// Which subset of the raw columns a device contributes to the unified record.
///
/// Both devices share one export layout; the primary unit also meters the
/// grid, household and PV, the secondary unit only reports its own battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceRole {
    Primary,
    Secondary,
}

impl DeviceRole {
    /// Column ownership table for this role.
    pub fn columns(self) -> &'static [ColumnMapping] {
        match self {
            DeviceRole::Primary => PRIMARY_COLUMNS,
            DeviceRole::Secondary => SECONDARY_COLUMNS,
        }
    }
}

// ---------------------------------------------------------------------------
// DevicePair — The two product ids whose exports form one dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePair {
    pub primary: String,
    pub secondary: String,
}

impl DevicePair {
    pub fn new(primary: impl Into<String>, secondary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Product id of the device in `role`.
    pub fn id(&self, role: DeviceRole) -> &str {
        match role {
            DeviceRole::Primary => &self.primary,
            DeviceRole::Secondary => &self.secondary,
        }
    }
}

// ---------------------------------------------------------------------------
// DeviceInfo — Product entry returned by the VoltStorage API
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub id: String,
    pub serial_number: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}
