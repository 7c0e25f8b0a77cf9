use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tempo_domain::providers::google::{
    color_id_to_hex, hex_to_color_id, GoogleCalendarAccessRole, GoogleCalendarListEntry,
};
use tempo_domain::CalendarEvent;
use tracing::error;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleDateTime(String);

impl GoogleDateTime {
    pub fn from_timestamp_millis(timestamp: i64) -> Self {
        let datetime_str = Utc
            .timestamp_millis_opt(timestamp)
            .single()
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        Self(datetime_str)
    }

    pub fn get_timestamp_millis(&self) -> i64 {
        DateTime::parse_from_rfc3339(&self.0)
            .map(|dt| dt.timestamp_millis())
            .unwrap_or_default()
    }
}

/// Google event start/end. Timed events carry `dateTime`, all day events
/// carry `date` only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl GoogleCalendarEventDateTime {
    pub fn all_day(date: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            date_time: None,
            time_zone: None,
        }
    }

    pub fn timed(date: &str, time: &str) -> Self {
        Self {
            date: None,
            date_time: Some(format!("{}T{}:00Z", date, time)),
            time_zone: Some("UTC".to_string()),
        }
    }

    /// Calendar day part, `YYYY-MM-DD`.
    pub fn date_part(&self) -> Option<String> {
        if let Some(date) = &self.date {
            return Some(date.clone());
        }
        self.date_time
            .as_ref()
            .and_then(|dt| dt.split('T').next().map(|d| d.to_string()))
    }

    /// Clock part, `HH:MM`. None for all day events.
    pub fn time_part(&self) -> Option<String> {
        let date_time = self.date_time.as_ref()?;
        let time = date_time.split('T').nth(1)?;
        if time.len() < 5 {
            return None;
        }
        Some(time[..5].to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEvent {
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color_id: Option<String>,
    pub start: GoogleCalendarEventDateTime,
    #[serde(default)]
    pub end: Option<GoogleCalendarEventDateTime>,
    #[serde(default)]
    pub updated: Option<GoogleDateTime>,
    #[serde(default)]
    pub status: Option<String>,
}

impl GoogleCalendarEvent {
    pub fn updated_millis(&self) -> Option<i64> {
        self.updated.as_ref().map(|u| u.get_timestamp_millis())
    }

    pub fn color_hex(&self) -> Option<String> {
        self.color_id
            .as_deref()
            .and_then(color_id_to_hex)
            .map(|hex| hex.to_string())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status.as_deref(), Some("cancelled"))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleCalendarEventAttributes {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    pub start: GoogleCalendarEventDateTime,
    pub end: GoogleCalendarEventDateTime,
}

impl From<&CalendarEvent> for GoogleCalendarEventAttributes {
    fn from(e: &CalendarEvent) -> Self {
        let (start, end) = match &e.start_time {
            Some(start_time) => {
                let end_time = e.end_time.as_deref().unwrap_or(start_time);
                (
                    GoogleCalendarEventDateTime::timed(&e.date, start_time),
                    GoogleCalendarEventDateTime::timed(&e.date, end_time),
                )
            }
            None => (
                GoogleCalendarEventDateTime::all_day(&e.date),
                GoogleCalendarEventDateTime::all_day(&e.date),
            ),
        };
        Self {
            summary: e.title.clone(),
            description: e.description.clone(),
            color_id: e
                .color
                .as_deref()
                .and_then(hex_to_color_id)
                .map(|id| id.to_string()),
            start,
            end,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCalendarsResponse {
    #[serde(default)]
    pub items: Vec<GoogleCalendarListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsResponse {
    #[serde(default)]
    pub items: Vec<GoogleCalendarEvent>,
}

const GOOGLE_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

pub struct GoogleCalendarRestApi {
    client: Client,
    access_token: String,
}

impl GoogleCalendarRestApi {
    pub fn new(access_token: String) -> Self {
        let client = Client::new();

        Self {
            client,
            access_token,
        }
    }

    async fn put<T: for<'de> Deserialize<'de>>(
        &self,
        body: &impl Serialize,
        path: String,
    ) -> anyhow::Result<T> {
        match self
            .client
            .put(&format!("{}/{}", GOOGLE_API_BASE_URL, path))
            .header("authorization", format!("Bearer {}", self.access_token))
            .json(body)
            .send()
            .await
        {
            Ok(res) => res.json::<T>().await.map_err(|e| {
                error!(
                    "[Unexpected Response] Google Calendar API PUT error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!(
                    "[Network Error] Google Calendar API PUT error. Error message: {:?}",
                    e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        body: &impl Serialize,
        path: String,
    ) -> anyhow::Result<T> {
        match self
            .client
            .post(&format!("{}/{}", GOOGLE_API_BASE_URL, path))
            .header("authorization", format!("Bearer {}", self.access_token))
            .json(body)
            .send()
            .await
        {
            Ok(res) => res.json::<T>().await.map_err(|e| {
                error!(
                    "[Unexpected Response] Google Calendar API POST error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!(
                    "[Network Error] Google Calendar API POST error. Error message: {:?}",
                    e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: String) -> anyhow::Result<T> {
        match self
            .client
            .get(&format!("{}/{}", GOOGLE_API_BASE_URL, path))
            .header("authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
        {
            Ok(res) => res.json::<T>().await.map_err(|e| {
                error!(
                    "[Unexpected Response] Google Calendar API GET error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!(
                    "[Network Error] Google Calendar API GET error. Error message: {:?}",
                    e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }

    // Google returns an empty body on event delete, so only the status is checked
    async fn delete(&self, path: String) -> anyhow::Result<()> {
        match self
            .client
            .delete(&format!("{}/{}", GOOGLE_API_BASE_URL, path))
            .header("authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
        {
            Ok(res) => res.error_for_status().map(|_| ()).map_err(|e| {
                error!(
                    "[Unexpected Response] Google Calendar API DELETE error. Error message: {:?}",
                    e
                );
                anyhow::Error::new(e)
            }),
            Err(e) => {
                error!(
                    "[Network Error] Google Calendar API DELETE error. Error message: {:?}",
                    e
                );
                Err(anyhow::Error::new(e))
            }
        }
    }

    pub async fn insert(
        &self,
        calendar_id: String,
        body: &GoogleCalendarEventAttributes,
    ) -> Result<GoogleCalendarEvent, ()> {
        self.post(body, format!("calendars/{}/events", calendar_id))
            .await
            .map_err(|e| {
                error!("Failed to insert google calendar event to google calendar id: {} with body: {:?}. Error message: {:?}", calendar_id, body, e);
            })
    }

    pub async fn update(
        &self,
        calendar_id: String,
        event_id: String,
        body: &GoogleCalendarEventAttributes,
    ) -> Result<GoogleCalendarEvent, ()> {
        self.put(
            body,
            format!("calendars/{}/events/{}", calendar_id, event_id),
        )
        .await
        .map_err(|e| {
            error!("Failed to update google calendar event in google calendar id: {} and google event id: {} and with body: {:?}. Error message: {:?}", calendar_id, event_id, body, e);
        })
    }

    pub async fn remove(&self, calendar_id: String, event_id: String) -> Result<(), ()> {
        self.delete(format!("calendars/{}/events/{}", calendar_id, event_id))
            .await
            .map_err(|e| {
                error!("Failed to delete google calendar event with google calendar id: {} and google event id: {}. Error message: {:?}", calendar_id, event_id, e);
            })
    }

    pub async fn list(
        &self,
        min_access_role: GoogleCalendarAccessRole,
    ) -> Result<ListCalendarsResponse, ()> {
        self.get(format!(
            "users/me/calendarList?minAccessRole={:?}",
            min_access_role
        ))
        .await
        .map_err(|e| {
            error!(
                "Failed to list google calendars with access role: {:?}. Error message: {:?}",
                min_access_role, e
            );
        })
    }

    pub async fn list_events(
        &self,
        calendar_id: String,
        time_min: i64,
        time_max: i64,
    ) -> Result<ListEventsResponse, ()> {
        let GoogleDateTime(time_min) = GoogleDateTime::from_timestamp_millis(time_min);
        let GoogleDateTime(time_max) = GoogleDateTime::from_timestamp_millis(time_max);
        self.get(format!(
            "calendars/{}/events?timeMin={}&timeMax={}&singleEvents=true&maxResults=250",
            calendar_id, time_min, time_max
        ))
        .await
        .map_err(|e| {
            error!(
                "Failed to list google calendar events for google calendar id: {}. Error message: {:?}",
                calendar_id, e
            );
        })
    }
}
