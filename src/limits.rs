//! Observation limits for rate-limited event types
//!
//! Certain business-critical engagement metrics (post views, restaurant
//! views) are protected against inflation: one actor may only contribute a
//! fixed number of counted occurrences per subject within a rolling window.
//! The policy table is process-wide, read-only configuration.

use crate::event::{Event, EventPayload};
use crate::filter::EventFilter;
use crate::types::EventType;
use chrono::Duration;
use once_cell::sync::Lazy;

/// Rate-limit policy for one event type
#[derive(Debug, Clone)]
pub struct ObservationLimit {
    pub event_type: EventType,
    /// Maximum counted occurrences per actor+subject within the window
    pub maximum_event_frequency: u64,
    /// Rolling window the frequency is checked over
    pub observation_period: Duration,
}

/// The static observation limit table
///
/// Event types absent from this table are observable without limit.
static OBSERVATION_LIMITS: Lazy<Vec<ObservationLimit>> = Lazy::new(|| {
    vec![
        ObservationLimit {
            event_type: EventType::PostView,
            maximum_event_frequency: 5,
            observation_period: Duration::hours(24),
        },
        ObservationLimit {
            event_type: EventType::RestaurantView,
            maximum_event_frequency: 5,
            observation_period: Duration::hours(24),
        },
    ]
});

impl ObservationLimit {
    /// Looks up the limit for an event type, if one exists
    pub fn for_event_type(event_type: EventType) -> Option<&'static ObservationLimit> {
        OBSERVATION_LIMITS
            .iter()
            .find(|limit| limit.event_type == event_type)
    }
}

/// Builds the composite correlation filter for a rate-limited event: the
/// subject the limit applies to plus the acting user or session
///
/// Returns `None` for event types with no correlating subject.
pub fn correlation_filter(event: &Event) -> Option<EventFilter> {
    let subject = match &event.payload {
        EventPayload::PostView(payload) => ("postID", payload.post_id.clone()),
        EventPayload::RestaurantView(payload) => {
            ("fonciiRestaurantID", payload.foncii_restaurant_id.clone())
        }
        _ => return None,
    };

    let mut actors = Vec::new();
    if let Some(user_id) = &event.user_id {
        actors.push(EventFilter::new().eq("userID", user_id.clone()));
    }
    if let Some(session_id) = &event.session_id {
        actors.push(EventFilter::new().eq("sessionID", session_id.clone()));
    }

    Some(EventFilter::new().eq(subject.0, subject.1).any_of(actors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RestaurantViewPayload;
    use serde_json::json;

    fn restaurant_view(user_id: Option<&str>, session_id: Option<&str>) -> Event {
        Event::new(
            user_id.map(str::to_string),
            session_id.map(str::to_string),
            EventPayload::RestaurantView(RestaurantViewPayload {
                foncii_restaurant_id: "r1".to_string(),
                percent_match_score: None,
                quality_score: 0.8,
                share_event_id: None,
                referrer: None,
            }),
        )
    }

    #[test]
    fn test_limited_event_types() {
        let limit = ObservationLimit::for_event_type(EventType::RestaurantView).unwrap();
        assert_eq!(limit.maximum_event_frequency, 5);
        assert_eq!(limit.observation_period, Duration::hours(24));

        assert!(ObservationLimit::for_event_type(EventType::PostView).is_some());
        assert!(ObservationLimit::for_event_type(EventType::UserGalleryView).is_none());
        assert!(ObservationLimit::for_event_type(EventType::Share).is_none());
    }

    #[test]
    fn test_correlation_filter_matches_same_actor_and_subject() {
        let event = restaurant_view(Some("u1"), Some("s1"));
        let filter = correlation_filter(&event).unwrap();

        assert!(filter.matches(&json!({ "fonciiRestaurantID": "r1", "userID": "u1" })));
        assert!(filter.matches(&json!({ "fonciiRestaurantID": "r1", "sessionID": "s1" })));
        assert!(!filter.matches(&json!({ "fonciiRestaurantID": "r1", "userID": "u2" })));
        assert!(!filter.matches(&json!({ "fonciiRestaurantID": "r2", "userID": "u1" })));
    }

    #[test]
    fn test_correlation_filter_anonymous_session_only() {
        let event = restaurant_view(None, Some("s1"));
        let filter = correlation_filter(&event).unwrap();

        assert!(filter.matches(&json!({ "fonciiRestaurantID": "r1", "sessionID": "s1" })));
        // Other anonymous sessions do not correlate
        assert!(!filter.matches(&json!({ "fonciiRestaurantID": "r1", "sessionID": "s2" })));
    }

    #[test]
    fn test_unlimited_events_have_no_correlation_subject() {
        let event = Event::new(
            Some("u1".to_string()),
            None,
            EventPayload::PostCreation(crate::event::PostCreationPayload {}),
        );
        assert!(correlation_filter(&event).is_none());
    }
}
