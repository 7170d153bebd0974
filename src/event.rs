//! Event document model
//!
//! An [`Event`] is the atomic analytics fact: who did what, when, plus an
//! event-type-specific payload. Payloads are typed per event family and
//! serialize flattened into the stored document using the platform's wire
//! field names (`fonciiRestaurantID`, `percentMatchScore`, ...). Events are
//! written once and never mutated or deleted by this subsystem.

use crate::types::{
    CoordinatePoint, EventType, IntegrationProvider, ReservationIntentOutcome,
    ReservationProvider, ShareDestination, ShareEventType,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A tracked analytics event
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique identifier; randomly generated unless supplied up front
    pub id: String,
    /// Registered user the event is attributed to
    #[serde(rename = "userID", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Anonymous session the event is attributed to
    #[serde(rename = "sessionID", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Occurrence instant, defaults to now
    pub timestamp: DateTime<Utc>,
    pub event_type: EventType,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    /// Creates a new event with a random id and the current timestamp
    ///
    /// The event type is derived from the payload, so the two can never
    /// disagree. At least one of `user_id` / `session_id` should be present
    /// for the event to be recordable; actor-less events are discarded by
    /// the recorder.
    pub fn new(
        user_id: Option<String>,
        session_id: Option<String>,
        payload: EventPayload,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id,
            session_id,
            timestamp: Utc::now(),
            event_type: payload.event_type(),
            payload,
        }
    }

    /// Overrides the generated id with a caller-supplied one
    ///
    /// Used by search events so client-side follow-up actions (e.g. a click
    /// resulting from a search) can reference the same id before the search
    /// event is durably written.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Overrides the occurrence timestamp
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Whether the event can be attributed to a user or session
    pub fn has_actor(&self) -> bool {
        self.user_id.is_some() || self.session_id.is_some()
    }
}

impl<'de> Deserialize<'de> for Event {
    /// Reads a stored event document back into the typed model
    ///
    /// The payload is selected by the document's `eventType` field rather
    /// than by shape, so structurally-overlapping payload families (clicks
    /// and views share their required fields) can never be confused and the
    /// payload always agrees with `event_type`.
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Header {
            id: String,
            #[serde(rename = "userID", default)]
            user_id: Option<String>,
            #[serde(rename = "sessionID", default)]
            session_id: Option<String>,
            timestamp: DateTime<Utc>,
            event_type: EventType,
        }

        let document = Value::deserialize(deserializer)?;
        let header: Header =
            serde_json::from_value(document.clone()).map_err(D::Error::custom)?;
        let payload =
            EventPayload::from_document(header.event_type, document).map_err(D::Error::custom)?;

        Ok(Self {
            id: header.id,
            user_id: header.user_id,
            session_id: header.session_id,
            timestamp: header.timestamp,
            event_type: header.event_type,
            payload,
        })
    }
}

/// Event-type-specific payload data
///
/// Serialized untagged: the discriminant lives in the event's `eventType`
/// field, the payload contributes only its own fields to the document.
/// Payload shapes overlap structurally (several click and view families
/// share their required fields), so reading a document back dispatches on
/// the `eventType` field instead of shape matching; see
/// [`Event`]'s `Deserialize` impl.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum EventPayload {
    PostSourceLinkClick(PostSourceLinkClickPayload),
    ArticlePublicationClick(ArticlePublicationClickPayload),
    BusinessWebsiteClick(BusinessWebsiteClickPayload),
    ReservationIntent(ReservationIntentPayload),
    ExploreSearch(ExploreSearchPayload),
    UserGallerySearch(UserGallerySearchPayload),
    ReservationSearch(ReservationSearchPayload),
    PostView(PostViewPayload),
    PostClick(PostClickPayload),
    RestaurantClick(RestaurantClickPayload),
    MapPinClick(MapPinClickPayload),
    RestaurantView(RestaurantViewPayload),
    UserGalleryView(UserGalleryViewPayload),
    RestaurantSave(RestaurantSavePayload),
    Share(SharePayload),
    TasteProfileCreation(TasteProfileCreationPayload),
    TasteProfileUpdate(TasteProfileUpdatePayload),
    TasteProfileDeletion(TasteProfileDeletionPayload),
    UserProfilePictureUpdate(UserProfilePictureUpdatePayload),
    PostDeletion(PostDeletionPayload),
    PostCreation(PostCreationPayload),
    PostUpdate(PostUpdatePayload),
}

impl EventPayload {
    /// The event type this payload belongs to
    ///
    /// Restaurant saves map to two distinct event types depending on whether
    /// the restaurant was saved or unsaved.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::ExploreSearch(_) => EventType::ExploreSearch,
            Self::UserGallerySearch(_) => EventType::UserGallerySearch,
            Self::ReservationSearch(_) => EventType::ReservationSearch,
            Self::ReservationIntent(_) => EventType::ReservationIntent,
            Self::BusinessWebsiteClick(_) => EventType::BusinessWebsiteClick,
            Self::RestaurantClick(_) => EventType::RestaurantClick,
            Self::PostClick(_) => EventType::PostClick,
            Self::MapPinClick(_) => EventType::MapPinClick,
            Self::PostSourceLinkClick(_) => EventType::PostSourceLinkClick,
            Self::ArticlePublicationClick(_) => EventType::ArticlePublicationClick,
            Self::UserGalleryView(_) => EventType::UserGalleryView,
            Self::PostView(_) => EventType::PostView,
            Self::RestaurantView(_) => EventType::RestaurantView,
            Self::TasteProfileCreation(_) => EventType::TasteProfileCreation,
            Self::TasteProfileUpdate(_) => EventType::TasteProfileUpdate,
            Self::TasteProfileDeletion(_) => EventType::TasteProfileDeletion,
            Self::UserProfilePictureUpdate(_) => EventType::UserProfilePictureUpdate,
            Self::PostCreation(_) => EventType::PostCreation,
            Self::PostUpdate(_) => EventType::PostUpdate,
            Self::PostDeletion(_) => EventType::PostDeletion,
            Self::RestaurantSave(payload) => {
                if payload.saved {
                    EventType::SavedRestaurant
                } else {
                    EventType::UnsavedRestaurant
                }
            }
            Self::Share(_) => EventType::Share,
        }
    }

    /// Deserializes the payload variant belonging to an event type from a
    /// stored document
    ///
    /// Both save-direction event types carry the same payload shape; the
    /// `saved` flag in the document is the source of truth either way.
    fn from_document(event_type: EventType, document: Value) -> serde_json::Result<Self> {
        let payload = match event_type {
            EventType::ExploreSearch => Self::ExploreSearch(serde_json::from_value(document)?),
            EventType::UserGallerySearch => {
                Self::UserGallerySearch(serde_json::from_value(document)?)
            }
            EventType::ReservationSearch => {
                Self::ReservationSearch(serde_json::from_value(document)?)
            }
            EventType::ReservationIntent => {
                Self::ReservationIntent(serde_json::from_value(document)?)
            }
            EventType::BusinessWebsiteClick => {
                Self::BusinessWebsiteClick(serde_json::from_value(document)?)
            }
            EventType::RestaurantClick => Self::RestaurantClick(serde_json::from_value(document)?),
            EventType::PostClick => Self::PostClick(serde_json::from_value(document)?),
            EventType::MapPinClick => Self::MapPinClick(serde_json::from_value(document)?),
            EventType::PostSourceLinkClick => {
                Self::PostSourceLinkClick(serde_json::from_value(document)?)
            }
            EventType::ArticlePublicationClick => {
                Self::ArticlePublicationClick(serde_json::from_value(document)?)
            }
            EventType::UserGalleryView => Self::UserGalleryView(serde_json::from_value(document)?),
            EventType::PostView => Self::PostView(serde_json::from_value(document)?),
            EventType::RestaurantView => Self::RestaurantView(serde_json::from_value(document)?),
            EventType::TasteProfileCreation => {
                Self::TasteProfileCreation(serde_json::from_value(document)?)
            }
            EventType::TasteProfileUpdate => {
                Self::TasteProfileUpdate(serde_json::from_value(document)?)
            }
            EventType::TasteProfileDeletion => {
                Self::TasteProfileDeletion(serde_json::from_value(document)?)
            }
            EventType::UserProfilePictureUpdate => {
                Self::UserProfilePictureUpdate(serde_json::from_value(document)?)
            }
            EventType::PostCreation => Self::PostCreation(serde_json::from_value(document)?),
            EventType::PostUpdate => Self::PostUpdate(serde_json::from_value(document)?),
            EventType::PostDeletion => Self::PostDeletion(serde_json::from_value(document)?),
            EventType::SavedRestaurant | EventType::UnsavedRestaurant => {
                Self::RestaurantSave(serde_json::from_value(document)?)
            }
            EventType::Share => Self::Share(serde_json::from_value(document)?),
        };
        Ok(payload)
    }
}

/// Search performed on the explore map
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExploreSearchPayload {
    pub query: String,
    pub search_location: CoordinatePoint,
    pub zoom_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_location: Option<CoordinatePoint>,
    pub tags: Vec<String>,
    pub cuisines: Vec<String>,
    pub prices: Vec<u32>,
    pub is_manual_search: bool,
    pub party_size: u32,
    pub reservation_date: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "candidateIDs")]
    pub candidate_ids: Vec<String>,
    pub auto_complete_suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_percent_match_score: Option<f64>,
    pub average_quality_score: f64,
}

/// Search performed inside a creator's gallery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserGallerySearchPayload {
    #[serde(rename = "authorUID")]
    pub author_uid: String,
    pub query: String,
    pub search_location: CoordinatePoint,
    pub zoom_level: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_location: Option<CoordinatePoint>,
    pub tags: Vec<String>,
    pub cuisines: Vec<String>,
    pub prices: Vec<u32>,
    pub party_size: u32,
    pub reservation_date: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "candidateIDs")]
    pub candidate_ids: Vec<String>,
    pub auto_complete_suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_percent_match_score: Option<f64>,
    pub average_quality_score: f64,
}

/// Reservation availability search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSearchPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(rename = "authorID", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_location: Option<CoordinatePoint>,
    pub party_size: u32,
    pub reservation_date: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationIntentPayload {
    pub outcome: ReservationIntentOutcome,
    #[serde(rename = "venueID")]
    pub venue_id: String,
    #[serde(rename = "authorUID", skip_serializing_if = "Option::is_none")]
    pub author_uid: Option<String>,
    #[serde(rename = "postID", skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    pub time_slot: String,
    pub reservation_date: String,
    pub provider: ReservationProvider,
    #[serde(rename = "externalURL")]
    pub external_url: String,
}

/// View of a creator's map / post gallery (not observation limited)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserGalleryViewPayload {
    #[serde(rename = "authorUID")]
    pub author_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_similarity_score: Option<f64>,
    #[serde(rename = "shareEventID", skip_serializing_if = "Option::is_none")]
    pub share_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// View of a single post (observation limited)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostViewPayload {
    #[serde(rename = "postID")]
    pub post_id: String,
    #[serde(rename = "authorUID")]
    pub author_uid: String,
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "shareEventID", skip_serializing_if = "Option::is_none")]
    pub share_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// View of a restaurant detail page (observation limited)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantViewPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "shareEventID", skip_serializing_if = "Option::is_none")]
    pub share_event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostClickPayload {
    #[serde(rename = "postID")]
    pub post_id: String,
    #[serde(rename = "authorUID")]
    pub author_uid: String,
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "sourcePostID", skip_serializing_if = "Option::is_none")]
    pub source_post_id: Option<String>,
    #[serde(
        rename = "sourceFonciiRestaurantID",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_foncii_restaurant_id: Option<String>,
    #[serde(rename = "sourceURL", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_complete_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantClickPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "sourcePostID", skip_serializing_if = "Option::is_none")]
    pub source_post_id: Option<String>,
    #[serde(
        rename = "sourceFonciiRestaurantID",
        skip_serializing_if = "Option::is_none"
    )]
    pub source_foncii_restaurant_id: Option<String>,
    #[serde(rename = "sourceURL", skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_complete_query: Option<String>,
    #[serde(rename = "queryID", skip_serializing_if = "Option::is_none")]
    pub query_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapPinClickPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(rename = "postID", skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(rename = "authorUID", skip_serializing_if = "Option::is_none")]
    pub author_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

/// Click-through to the social media source of a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostSourceLinkClickPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(rename = "postID")]
    pub post_id: String,
    #[serde(rename = "authorUID")]
    pub author_uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "destinationURL")]
    pub destination_url: String,
    pub destination_platform: IntegrationProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePublicationClickPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(rename = "postID", skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(rename = "authorUID", skip_serializing_if = "Option::is_none")]
    pub author_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "destinationURL")]
    pub destination_url: String,
    pub publication: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BusinessWebsiteClickPayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    #[serde(rename = "postID", skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    #[serde(rename = "authorUID", skip_serializing_if = "Option::is_none")]
    pub author_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_match_score: Option<f64>,
    pub quality_score: f64,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
    #[serde(rename = "destinationURL")]
    pub destination_url: String,
}

/// Restaurant saved to or removed from a user's collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSavePayload {
    #[serde(rename = "fonciiRestaurantID")]
    pub foncii_restaurant_id: String,
    /// Set when the restaurant was saved via a user post
    #[serde(rename = "postID", skip_serializing_if = "Option::is_none")]
    pub post_id: Option<String>,
    pub saved: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SharePayload {
    #[serde(rename = "shareEventID")]
    pub share_event_id: String,
    pub share_event_type: ShareEventType,
    pub destination: ShareDestination,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}

/// Snapshot of a newly created taste profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TasteProfileCreationPayload {
    pub taste_profile_data: Value,
    pub auto_generated: bool,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TasteProfileUpdatePayload {
    pub taste_profile_data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TasteProfileDeletionPayload {
    pub taste_profile_data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfilePictureUpdatePayload {
    pub platform: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostCreationPayload {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PostUpdatePayload {}

/// Copy of the post data that was deleted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PostDeletionPayload {
    pub user_post_data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn restaurant_view_payload() -> EventPayload {
        EventPayload::RestaurantView(RestaurantViewPayload {
            foncii_restaurant_id: "r1".to_string(),
            percent_match_score: Some(92.5),
            quality_score: 0.8,
            share_event_id: None,
            referrer: None,
        })
    }

    #[test]
    fn test_event_creation_defaults() {
        let a = Event::new(Some("u1".to_string()), None, restaurant_view_payload());
        let b = Event::new(Some("u1".to_string()), None, restaurant_view_payload());

        assert_ne!(a.id, b.id);
        assert_eq!(a.event_type, EventType::RestaurantView);
        assert!(a.has_actor());
    }

    #[test]
    fn test_caller_supplied_id() {
        let payload = EventPayload::ExploreSearch(ExploreSearchPayload {
            query: "sushi".to_string(),
            search_location: CoordinatePoint { lat: 40.7, lng: -74.0 },
            zoom_level: 12.0,
            client_location: None,
            tags: vec![],
            cuisines: vec![],
            prices: vec![],
            is_manual_search: true,
            party_size: 2,
            reservation_date: "2024-04-20".to_string(),
            source_url: "https://foncii.com/explore".to_string(),
            candidate_ids: vec![],
            auto_complete_suggestions: vec![],
            average_percent_match_score: None,
            average_quality_score: 0.5,
        });

        let event = Event::new(None, Some("s1".to_string()), payload).with_id("query-123");
        assert_eq!(event.id, "query-123");
        assert_eq!(event.event_type, EventType::ExploreSearch);
    }

    #[test]
    fn test_actor_presence() {
        let event = Event::new(None, None, restaurant_view_payload());
        assert!(!event.has_actor());

        let event = Event::new(None, Some("s1".to_string()), restaurant_view_payload());
        assert!(event.has_actor());
    }

    #[test]
    fn test_save_events_split_by_direction() {
        let saved = EventPayload::RestaurantSave(RestaurantSavePayload {
            foncii_restaurant_id: "r1".to_string(),
            post_id: None,
            saved: true,
        });
        let unsaved = EventPayload::RestaurantSave(RestaurantSavePayload {
            foncii_restaurant_id: "r1".to_string(),
            post_id: None,
            saved: false,
        });

        assert_eq!(saved.event_type(), EventType::SavedRestaurant);
        assert_eq!(unsaved.event_type(), EventType::UnsavedRestaurant);
    }

    #[test]
    fn test_document_wire_format() {
        let event = Event::new(Some("u1".to_string()), None, restaurant_view_payload());
        let doc = serde_json::to_value(&event).unwrap();

        assert_eq!(doc["eventType"], "RESTAURANT_VIEW");
        assert_eq!(doc["userID"], "u1");
        assert_eq!(doc["fonciiRestaurantID"], "r1");
        assert_eq!(doc["percentMatchScore"], 92.5);
        assert_eq!(doc["qualityScore"], 0.8);
        // Absent optionals are omitted from the document entirely
        assert!(doc.get("sessionID").is_none());
        assert!(doc.get("shareEventID").is_none());
    }

    #[test]
    fn test_round_trip_keeps_payload_variant_and_fields() {
        // Restaurant views and restaurant clicks share their required
        // fields; only the eventType discriminant separates them
        let payload = EventPayload::RestaurantView(RestaurantViewPayload {
            foncii_restaurant_id: "r1".to_string(),
            percent_match_score: Some(92.5),
            quality_score: 0.8,
            share_event_id: Some("sh1".to_string()),
            referrer: Some("https://foncii.com/explore".to_string()),
        });
        let event = Event::new(Some("u1".to_string()), None, payload);

        let doc = serde_json::to_value(&event).unwrap();
        let parsed: Event = serde_json::from_value(doc).unwrap();

        assert!(matches!(parsed.payload, EventPayload::RestaurantView(_)));
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_click_documents_round_trip_as_clicks() {
        let payload = EventPayload::RestaurantClick(RestaurantClickPayload {
            foncii_restaurant_id: "r1".to_string(),
            percent_match_score: None,
            quality_score: 0.8,
            source_post_id: None,
            source_foncii_restaurant_id: None,
            source_url: None,
            auto_complete_query: None,
            query_id: Some("q1".to_string()),
        });
        let event = Event::new(None, Some("s1".to_string()), payload);

        let parsed: Event =
            serde_json::from_value(serde_json::to_value(&event).unwrap()).unwrap();

        assert!(matches!(parsed.payload, EventPayload::RestaurantClick(_)));
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_save_direction_round_trip() {
        let unsaved = Event::new(
            Some("u1".to_string()),
            None,
            EventPayload::RestaurantSave(RestaurantSavePayload {
                foncii_restaurant_id: "r1".to_string(),
                post_id: None,
                saved: false,
            }),
        );

        let parsed: Event =
            serde_json::from_value(serde_json::to_value(&unsaved).unwrap()).unwrap();

        assert_eq!(parsed.event_type, EventType::UnsavedRestaurant);
        assert_eq!(parsed, unsaved);
    }

    #[test]
    fn test_deserialization_rejects_mismatched_payload() {
        // A view document missing its required fields cannot masquerade as
        // some other payload shape
        let doc = serde_json::json!({
            "id": "e1",
            "userID": "u1",
            "timestamp": "2024-04-17T10:00:00Z",
            "eventType": "RESTAURANT_VIEW",
        });
        assert!(serde_json::from_value::<Event>(doc).is_err());
    }

    #[test]
    fn test_post_view_wire_format() {
        let payload = EventPayload::PostView(PostViewPayload {
            post_id: "p1".to_string(),
            author_uid: "a1".to_string(),
            foncii_restaurant_id: "r1".to_string(),
            percent_match_score: None,
            quality_score: 0.7,
            share_event_id: Some("sh1".to_string()),
            referrer: None,
        });
        let event = Event::new(None, Some("s9".to_string()), payload);
        let doc = serde_json::to_value(&event).unwrap();

        assert_eq!(doc["eventType"], "POST_VIEW");
        assert_eq!(doc["postID"], "p1");
        assert_eq!(doc["authorUID"], "a1");
        assert_eq!(doc["sessionID"], "s9");
        assert_eq!(doc["shareEventID"], "sh1");
    }
}
