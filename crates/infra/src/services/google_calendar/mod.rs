pub mod auth_provider;
mod calendar_api;

use crate::TempoContext;
pub use calendar_api::{
    GoogleCalendarEvent, GoogleCalendarEventAttributes, ListCalendarsResponse, ListEventsResponse,
};
use calendar_api::GoogleCalendarRestApi;
use tempo_domain::providers::google::GoogleCalendarAccessRole;
use tempo_domain::User;

// https://developers.google.com/calendar/v3/reference/events

pub struct GoogleCalendarProvider {
    api: GoogleCalendarRestApi,
}

impl GoogleCalendarProvider {
    pub async fn new(user: &mut User, ctx: &TempoContext) -> Result<Self, ()> {
        let access_token = match auth_provider::get_access_token(user, ctx).await {
            Some(token) => token,
            None => return Err(()),
        };
        Ok(Self {
            api: GoogleCalendarRestApi::new(access_token),
        })
    }

    pub async fn create_event(
        &self,
        calendar_id: String,
        event: GoogleCalendarEventAttributes,
    ) -> Result<GoogleCalendarEvent, ()> {
        self.api.insert(calendar_id, &event).await
    }

    pub async fn update_event(
        &self,
        calendar_id: String,
        event_id: String,
        event: GoogleCalendarEventAttributes,
    ) -> Result<GoogleCalendarEvent, ()> {
        self.api.update(calendar_id, event_id, &event).await
    }

    pub async fn delete_event(&self, calendar_id: String, event_id: String) -> Result<(), ()> {
        self.api.remove(calendar_id, event_id).await
    }

    pub async fn list(
        &self,
        min_access_role: GoogleCalendarAccessRole,
    ) -> Result<ListCalendarsResponse, ()> {
        self.api.list(min_access_role).await
    }

    /// Every event in the calendar whose start falls inside the window,
    /// timestamps in epoch millis.
    pub async fn list_events(
        &self,
        calendar_id: String,
        time_min: i64,
        time_max: i64,
    ) -> Result<ListEventsResponse, ()> {
        self.api.list_events(calendar_id, time_min, time_max).await
    }
}
