use super::{Amount, Rate};

/// The broad class of an auctioned security.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityKind {
    /// A discount instrument with no coupon
    Bill,
    /// A coupon-bearing instrument
    Bond,
}

impl SecurityKind {
    /// Stable string form, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityKind::Bill => "bill",
            SecurityKind::Bond => "bond",
        }
    }
}

/// The instrument a single auction offers.
///
/// A security is embedded in its auction rather than referenced: once an
/// auction is announced its terms never change, so copying the descriptive
/// fields gives us immutability for free.
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Security<DateTime> {
    /// The security identifier, e.g. an ISIN
    pub code: String,
    /// Bill or bond
    pub kind: SecurityKind,
    /// Tenor in days
    pub tenor_days: u32,
    /// Coupon rate in basis points; bonds only
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub coupon_rate: Option<Rate>,
    /// The minimum denomination; all quantities are multiples of this
    pub denomination: Amount,
    /// Maturity date of the instrument
    pub maturity_date: DateTime,
}
