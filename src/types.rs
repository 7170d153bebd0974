//! Shared types for the event analytics engine
//!
//! Defines the closed event-type enumeration, analytics timespans with their
//! bucketing rules, sort orders, and the value objects produced by the
//! aggregators (`TimeSeriesEntry` and `Distribution`).

use crate::pipeline::BucketGranularity;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Consumer platform events tracked by the analytics engine
///
/// The serialized identifiers are part of the public contract: adding new
/// event types must not change the representation of existing ones.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    ExploreSearch,
    UserGallerySearch,
    ReservationSearch,
    /// An action intended by a user to make a reservation at an establishment
    ReservationIntent,
    /// Fired when a user clicks through to a restaurant's website
    BusinessWebsiteClick,
    RestaurantClick,
    PostClick,
    MapPinClick,
    PostSourceLinkClick,
    ArticlePublicationClick,
    /// A view of a creator's map / post gallery
    UserGalleryView,
    PostView,
    RestaurantView,
    TasteProfileCreation,
    TasteProfileUpdate,
    TasteProfileDeletion,
    UserProfilePictureUpdate,
    PostCreation,
    PostUpdate,
    PostDeletion,
    SavedRestaurant,
    UnsavedRestaurant,
    Share,
}

impl EventType {
    /// Stable wire identifier for this event type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExploreSearch => "EXPLORE_SEARCH",
            Self::UserGallerySearch => "USER_GALLERY_SEARCH",
            Self::ReservationSearch => "RESERVATION_SEARCH",
            Self::ReservationIntent => "RESERVATION_INTENT",
            Self::BusinessWebsiteClick => "BUSINESS_WEBSITE_CLICK",
            Self::RestaurantClick => "RESTAURANT_CLICK",
            Self::PostClick => "POST_CLICK",
            Self::MapPinClick => "MAP_PIN_CLICK",
            Self::PostSourceLinkClick => "POST_SOURCE_LINK_CLICK",
            Self::ArticlePublicationClick => "ARTICLE_PUBLICATION_CLICK",
            Self::UserGalleryView => "USER_GALLERY_VIEW",
            Self::PostView => "POST_VIEW",
            Self::RestaurantView => "RESTAURANT_VIEW",
            Self::TasteProfileCreation => "TASTE_PROFILE_CREATION",
            Self::TasteProfileUpdate => "TASTE_PROFILE_UPDATE",
            Self::TasteProfileDeletion => "TASTE_PROFILE_DELETION",
            Self::UserProfilePictureUpdate => "USER_PROFILE_PICTURE_UPDATE",
            Self::PostCreation => "POST_CREATION",
            Self::PostUpdate => "POST_UPDATE",
            Self::PostDeletion => "POST_DELETION",
            Self::SavedRestaurant => "SAVED_RESTAURANT",
            Self::UnsavedRestaurant => "UNSAVED_RESTAURANT",
            Self::Share => "SHARE",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Analytics observation timespans
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Timespan {
    OneWeek,
    TwoWeeks,
    OneMonth,
    SixMonths,
    OneYear,
    TwoYears,
}

impl Timespan {
    /// Bucketing rules for this timespan
    ///
    /// Single source of truth for both pipeline construction (grouping
    /// precision and densify step) and post-processing (display labels),
    /// so the two can never drift apart.
    pub fn bucketing(&self) -> Bucketing {
        match self {
            Self::OneWeek => Bucketing {
                granularity: BucketGranularity::Day,
                label: LabelStyle::Weekday,
            },
            Self::TwoWeeks | Self::OneMonth => Bucketing {
                granularity: BucketGranularity::Day,
                label: LabelStyle::MonthDay,
            },
            Self::SixMonths | Self::OneYear | Self::TwoYears => Bucketing {
                granularity: BucketGranularity::Month,
                label: LabelStyle::MonthYear,
            },
        }
    }

    /// Computes the end of an observation window by offsetting its start
    /// date backwards by this timespan
    ///
    /// Week-scale spans subtract fixed day counts (7/14/30); month-scale
    /// spans subtract calendar months (6/12/24). Saturates at the datetime
    /// range floor if the offset would underflow.
    pub fn observation_end(&self, observation_start_date: DateTime<Utc>) -> DateTime<Utc> {
        let months = |n: u32| {
            observation_start_date
                .checked_sub_months(Months::new(n))
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
        };

        match self {
            Self::OneWeek => observation_start_date - Duration::days(7),
            Self::TwoWeeks => observation_start_date - Duration::days(14),
            Self::OneMonth => observation_start_date - Duration::days(30),
            Self::SixMonths => months(6),
            Self::OneYear => months(12),
            Self::TwoYears => months(24),
        }
    }
}

/// Bucketing rules derived from a [`Timespan`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketing {
    /// Grouping precision and densify step unit
    pub granularity: BucketGranularity,
    /// Display-label format for chart axes
    pub label: LabelStyle,
}

/// Display-label styles for time series buckets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    /// Weekday short name, e.g. "Mon"
    Weekday,
    /// Two-digit month/day, e.g. "04/15"
    MonthDay,
    /// Two-digit month with four-digit year, e.g. "04/2024"
    MonthYear,
}

impl LabelStyle {
    /// Formats a bucket timestamp into its display label
    pub fn format(&self, timestamp: DateTime<Utc>) -> String {
        match self {
            Self::Weekday => timestamp.format("%a").to_string(),
            Self::MonthDay => timestamp.format("%m/%d").to_string(),
            Self::MonthYear => timestamp.format("%m/%Y").to_string(),
        }
    }
}

/// Sort orders for aggregation pipelines
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    /// Wire value used by aggregation sort stages (1 / -1)
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }
}

/// Possible outcomes for reservation intents
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationIntentOutcome {
    /// Yes, the user made a reservation successfully
    Confirmed,
    /// Just looking, the user was browsing passively
    Passive,
    /// No, the user did not end up making a reservation
    Failed,
}

/// External reservation platforms
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReservationProvider {
    Resy,
}

/// Social platforms posts can be imported from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationProvider {
    Instagram,
    Tiktok,
    GoogleMaps,
}

/// Pages that can be shared from the application
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShareEventType {
    UserGallery,
    Restaurant,
    UserPost,
    Referral,
}

/// Destinations offered by the share sheet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ShareDestination {
    /// The user copied the link to their clipboard
    Clipboard,
    Reddit,
    Twitter,
    Facebook,
    WhatsApp,
    LinkedIn,
    /// Device share sheet triggered by the browser API
    System,
}

/// A geographic coordinate attached to search events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CoordinatePoint {
    pub lat: f64,
    pub lng: f64,
}

/// A gap-filled, chart-ready time series for a single category
///
/// `timestamps[i]` and `data[i]` are positionally paired display labels and
/// counts, ordered ascending by bucket time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeSeriesEntry {
    /// Category label, used when several series are combined into one chart
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Display labels for each bucket
    pub timestamps: Vec<String>,
    /// Event counts for each bucket
    pub data: Vec<u64>,
}

/// One row of a ranked event distribution
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Distribution {
    /// Display name of the grouped entity
    pub category: String,
    /// Total event occurrences attributed to the entity
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_type_stable_identifiers() {
        assert_eq!(
            serde_json::to_string(&EventType::RestaurantView).unwrap(),
            "\"RESTAURANT_VIEW\""
        );
        assert_eq!(EventType::ExploreSearch.as_str(), "EXPLORE_SEARCH");
        assert_eq!(EventType::PostSourceLinkClick.to_string(), "POST_SOURCE_LINK_CLICK");

        let parsed: EventType = serde_json::from_str("\"SAVED_RESTAURANT\"").unwrap();
        assert_eq!(parsed, EventType::SavedRestaurant);
    }

    #[test]
    fn test_timespan_serialization() {
        assert_eq!(
            serde_json::to_string(&Timespan::SixMonths).unwrap(),
            "\"SIX_MONTHS\""
        );
    }

    #[test]
    fn test_bucketing_table() {
        assert_eq!(
            Timespan::OneWeek.bucketing().granularity,
            BucketGranularity::Day
        );
        assert_eq!(Timespan::OneWeek.bucketing().label, LabelStyle::Weekday);
        assert_eq!(Timespan::OneMonth.bucketing().label, LabelStyle::MonthDay);
        assert_eq!(
            Timespan::TwoYears.bucketing().granularity,
            BucketGranularity::Month
        );
        assert_eq!(Timespan::OneYear.bucketing().label, LabelStyle::MonthYear);
    }

    #[test]
    fn test_observation_end_offsets() {
        let start = Utc.with_ymd_and_hms(2024, 4, 17, 15, 0, 0).unwrap();

        assert_eq!(
            Timespan::OneWeek.observation_end(start),
            Utc.with_ymd_and_hms(2024, 4, 10, 15, 0, 0).unwrap()
        );
        assert_eq!(
            Timespan::OneMonth.observation_end(start),
            Utc.with_ymd_and_hms(2024, 3, 18, 15, 0, 0).unwrap()
        );
        assert_eq!(
            Timespan::SixMonths.observation_end(start),
            Utc.with_ymd_and_hms(2023, 10, 17, 15, 0, 0).unwrap()
        );
        assert_eq!(
            Timespan::TwoYears.observation_end(start),
            Utc.with_ymd_and_hms(2022, 4, 17, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_label_formats() {
        // 2024-04-17 is a Wednesday
        let ts = Utc.with_ymd_and_hms(2024, 4, 17, 0, 0, 0).unwrap();
        assert_eq!(LabelStyle::Weekday.format(ts), "Wed");
        assert_eq!(LabelStyle::MonthDay.format(ts), "04/17");
        assert_eq!(LabelStyle::MonthYear.format(ts), "04/2024");
    }

    #[test]
    fn test_sort_order_wire_values() {
        assert_eq!(SortOrder::Ascending.as_i32(), 1);
        assert_eq!(SortOrder::Descending.as_i32(), -1);
        assert_eq!(SortOrder::default(), SortOrder::Descending);
    }
}
