/// A query type for paginating over datetime ranges.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "DateTime: serde::Serialize",
        deserialize = "DateTime: serde::Deserialize<'de>"
    ))
)]
pub struct DateTimeRangeQuery<DateTime> {
    /// Include only records strictly before this time
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub before: Option<DateTime>,
    /// Include only records at or after this time
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub after: Option<DateTime>,
}

impl<DateTime> Default for DateTimeRangeQuery<DateTime> {
    fn default() -> Self {
        Self {
            before: None,
            after: None,
        }
    }
}

/// The paginated response to a datetime range query.
#[derive(Debug)]
#[cfg_attr(feature = "schemars", derive(schemars::JsonSchema))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateTimeRangeResponse<T, DateTime> {
    /// The page of results
    pub results: Vec<T>,
    /// If more results exist, the query to retrieve the next page
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub more: Option<DateTimeRangeQuery<DateTime>>,
}
