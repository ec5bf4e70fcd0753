//! ICS feed parsing using the icalendar crate's parser.

use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::{debug, warn};

use crate::error::{IcalSyncError, IcalSyncResult};
use crate::event::{Attendee, EventTime, FieldValue, SourceEvent};

/// The one calendar carried by a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct Calendar {
    /// `X-WR-CALNAME`, when the feed names itself
    pub name: Option<String>,
    pub events: Vec<SourceEvent>,
}

/// Parse a whole ICS feed.
///
/// A feed must hold exactly one VCALENDAR. Every VEVENT in it becomes a
/// [`SourceEvent`], in document order.
pub fn parse_feed(content: &str) -> IcalSyncResult<Calendar> {
    let unfolded = unfold(content);

    match count_calendars(&unfolded) {
        0 => {
            return Err(IcalSyncError::IcsParse(
                "feed contains no VCALENDAR".to_string(),
            ));
        }
        1 => {}
        n => return Err(IcalSyncError::MultipleCalendars(n)),
    }

    let calendar = read_calendar(&unfolded).map_err(|e| IcalSyncError::IcsParse(e.to_string()))?;

    let name = calendar
        .properties
        .iter()
        .find(|p| p.name == "X-WR-CALNAME")
        .map(|p| p.val.to_string());

    let events = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .map(parse_event)
        .collect::<IcalSyncResult<Vec<_>>>()?;

    debug!(events = events.len(), name = ?name, "parsed feed");

    Ok(Calendar { name, events })
}

fn count_calendars(unfolded: &str) -> usize {
    unfolded
        .lines()
        .filter(|line| line.trim().eq_ignore_ascii_case("BEGIN:VCALENDAR"))
        .count()
}

fn parse_event(vevent: &Component) -> IcalSyncResult<SourceEvent> {
    let uid = match vevent.find_prop("UID") {
        Some(p) => p.val.to_string(),
        None => {
            warn!("VEVENT without UID, identity falls back to recurrence id and sequence");
            String::new()
        }
    };

    let start_prop = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| IcalSyncError::IcsParse(format!("event '{uid}' has no DTSTART")))?;
    let start = DatePerhapsTime::try_from(start_prop)
        .map(to_event_time)
        .map_err(|_| {
            IcalSyncError::IcsParse(format!(
                "event '{uid}' has an unreadable DTSTART: {}",
                start_prop.val.as_ref()
            ))
        })?;

    let end = match vevent.find_prop("DTEND") {
        Some(p) => match DatePerhapsTime::try_from(p) {
            Ok(dpt) => Some(to_event_time(dpt)),
            Err(_) => {
                warn!(uid = %uid, value = p.val.as_ref(), "ignoring unreadable DTEND");
                None
            }
        },
        None => None,
    };

    let sequence = match vevent.find_prop("SEQUENCE") {
        Some(p) => match p.val.as_ref().trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                warn!(uid = %uid, value = p.val.as_ref(), "ignoring non-numeric SEQUENCE");
                None
            }
        },
        None => None,
    };

    let attendees = vevent
        .properties
        .iter()
        .filter(|p| p.name == "ATTENDEE")
        .map(parse_attendee)
        .collect();

    Ok(SourceEvent {
        recurrence_id: vevent.find_prop("RECURRENCE-ID").map(|p| p.val.to_string()),
        sequence,
        summary: text_field(vevent, "SUMMARY"),
        description: text_field(vevent, "DESCRIPTION"),
        location: text_field(vevent, "LOCATION"),
        status: vevent.find_prop("STATUS").map(|p| p.val.to_string()),
        transparency: vevent.find_prop("TRANSP").map(|p| p.val.to_string()),
        start,
        end,
        attendees,
        uid,
    })
}

/// Collect every occurrence of a text property. Repeats become `Multiple`.
///
/// The parser has already undone TEXT escaping, so values are taken as they are.
fn text_field(vevent: &Component, name: &str) -> Option<FieldValue> {
    let mut values: Vec<String> = vevent
        .properties
        .iter()
        .filter(|p| p.name == name)
        .map(|p| p.val.to_string())
        .collect();

    match values.len() {
        0 => None,
        1 => values.pop().map(FieldValue::Single),
        _ => Some(FieldValue::Multiple(values)),
    }
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => EventTime::DateTimeZoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

fn parse_attendee(prop: &Property) -> Attendee {
    let value = prop.val.as_ref();
    let email = value
        .strip_prefix("mailto:")
        .or_else(|| value.strip_prefix("MAILTO:"))
        .unwrap_or(value)
        .to_string();

    let param = |key: &str| {
        prop.params
            .iter()
            .find(|p| p.key == key)
            .and_then(|p| p.val.as_ref().map(|v| v.to_string()))
    };

    Attendee {
        email,
        name: param("CN"),
        response_status: param("PARTSTAT"),
    }
}
