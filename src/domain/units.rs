//! Natural units (ħ = c = 1, energies in GeV).
//!
//! Quantities are stored internally in natural units. Tables on disk carry
//! conventional units, so exports divide by these factors and imports
//! multiply by them.

pub const GEV: f64 = 1.0;
pub const KEV: f64 = 1.0e-6 * GEV;

/// One centimetre in GeV⁻¹ (ħc = 1.973269804e-14 GeV·cm).
pub const CM: f64 = 1.0 / 1.973_269_804e-14;
pub const CM2: f64 = CM * CM;

pub const SECOND: f64 = 1.519_267_447e24;
pub const KM: f64 = 1.0e5 * CM;
pub const KM_PER_SEC: f64 = KM / SECOND;

/// Express `value` in multiples of `unit`.
pub fn in_units(value: f64, unit: f64) -> f64 {
    value / unit
}
