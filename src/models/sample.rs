use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Field — Identifier of one numeric measurement of a Sample
// ---------------------------------------------------------------------------

/// Identifier of one numeric measurement carried by a [`Sample`].
///
/// [`Field::ALL`] lists the fields in the order used by the dataset codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    PowerFromGrid,
    PowerToGrid,
    PowerHousehold,
    PowerPv,
    Battery1To,
    Battery1From,
    Battery1Soc,
    Battery2To,
    Battery2From,
    Battery2Soc,
}

impl Field {
    pub const COUNT: usize = 10;

    pub const ALL: [Field; Field::COUNT] = [
        Field::PowerFromGrid,
        Field::PowerToGrid,
        Field::PowerHousehold,
        Field::PowerPv,
        Field::Battery1To,
        Field::Battery1From,
        Field::Battery1Soc,
        Field::Battery2To,
        Field::Battery2From,
        Field::Battery2Soc,
    ];

    /// Column name used in the encoded dataset header.
    pub fn name(self) -> &'static str {
        match self {
            Field::PowerFromGrid => "powerFromGrid",
            Field::PowerToGrid => "powerToGrid",
            Field::PowerHousehold => "powerHousehold",
            Field::PowerPv => "powerPV",
            Field::Battery1To => "battery1To",
            Field::Battery1From => "battery1From",
            Field::Battery1Soc => "battery1Soc",
            Field::Battery2To => "battery2To",
            Field::Battery2From => "battery2From",
            Field::Battery2Soc => "battery2Soc",
        }
    }

    /// State-of-charge fields hold fractions, every other field whole watts.
    pub fn is_soc(self) -> bool {
        matches!(self, Field::Battery1Soc | Field::Battery2Soc)
    }

    /// Position in [`Field::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Sample — One minute of unified telemetry
// ---------------------------------------------------------------------------

/// One observation of the unified telemetry stream.
///
/// Every measurement is optional: `None` means "no reading", which is kept
/// distinct from a measured `0` throughout decoding, resampling and encoding.
/// Power values are whole watts, SoC values are fractions in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub time: DateTime<Utc>,
    pub power_from_grid: Option<i64>,
    pub power_to_grid: Option<i64>,
    pub power_household: Option<i64>,
    #[serde(rename = "powerPV")]
    pub power_pv: Option<i64>,
    pub battery1_to: Option<i64>,
    pub battery1_from: Option<i64>,
    pub battery1_soc: Option<f64>,
    pub battery2_to: Option<i64>,
    pub battery2_from: Option<i64>,
    pub battery2_soc: Option<f64>,
}

/// An ordered sequence of samples.
pub type Dataset = Vec<Sample>;

impl Sample {
    /// A sample at `time` with no readings.
    pub fn new(time: DateTime<Utc>) -> Self {
        Self {
            time,
            power_from_grid: None,
            power_to_grid: None,
            power_household: None,
            power_pv: None,
            battery1_to: None,
            battery1_from: None,
            battery1_soc: None,
            battery2_to: None,
            battery2_from: None,
            battery2_soc: None,
        }
    }

    /// Read a field as a float, `None` when absent.
    pub fn get(&self, field: Field) -> Option<f64> {
        match field {
            Field::Battery1Soc => self.battery1_soc,
            Field::Battery2Soc => self.battery2_soc,
            _ => self.power_slot(field).map(|v| v as f64),
        }
    }

    /// Write a field. Power fields are rounded to whole watts.
    pub fn set(&mut self, field: Field, value: Option<f64>) {
        match field {
            Field::Battery1Soc => self.battery1_soc = value,
            Field::Battery2Soc => self.battery2_soc = value,
            _ => {
                let watts = value.map(|v| v.round() as i64);
                if let Some(slot) = self.power_slot_mut(field) {
                    *slot = watts;
                }
            }
        }
    }

    /// True if at least one field carries a reading.
    pub fn has_readings(&self) -> bool {
        Field::ALL.iter().any(|f| self.get(*f).is_some())
    }

    fn power_slot(&self, field: Field) -> Option<i64> {
        match field {
            Field::PowerFromGrid => self.power_from_grid,
            Field::PowerToGrid => self.power_to_grid,
            Field::PowerHousehold => self.power_household,
            Field::PowerPv => self.power_pv,
            Field::Battery1To => self.battery1_to,
            Field::Battery1From => self.battery1_from,
            Field::Battery2To => self.battery2_to,
            Field::Battery2From => self.battery2_from,
            Field::Battery1Soc | Field::Battery2Soc => None,
        }
    }

    fn power_slot_mut(&mut self, field: Field) -> Option<&mut Option<i64>> {
        match field {
            Field::PowerFromGrid => Some(&mut self.power_from_grid),
            Field::PowerToGrid => Some(&mut self.power_to_grid),
            Field::PowerHousehold => Some(&mut self.power_household),
            Field::PowerPv => Some(&mut self.power_pv),
            Field::Battery1To => Some(&mut self.battery1_to),
            Field::Battery1From => Some(&mut self.battery1_from),
            Field::Battery2To => Some(&mut self.battery2_to),
            Field::Battery2From => Some(&mut self.battery2_from),
            Field::Battery1Soc | Field::Battery2Soc => None,
        }
    }
}
