//! Drag-and-drop identifier codec.
//!
//! The rendering layer tags droppable cells and draggable cards with string
//! ids. The format is a wire contract with the UI and must stay bit-exact:
//!
//! | Element | Format |
//! |---|---|
//! | scheduled cell | `assignee-<assigneeId>-<YYYY-MM-DD>` |
//! | pool | `unassigned` |
//! | card | `<kind>-<itemId>` (kind is `reclamo`) |
//!
//! Decoding never panics. Anything that does not match yields
//! [`MalformedId`], which the controller treats as "not a move".

use chrono::NaiveDate;

use crate::error::MalformedId;
use crate::model::{ItemKind, MoveIntent, ScheduleSlot, WorkItemId};

pub const UNASSIGNED_ID: &str = "unassigned";
const ASSIGNEE_PREFIX: &str = "assignee-";

/// Encode a bucket as a droppable id.
#[must_use]
pub fn slot_dom_id(slot: &ScheduleSlot) -> String {
    match slot {
        ScheduleSlot::Unassigned => UNASSIGNED_ID.to_string(),
        ScheduleSlot::Scheduled { assignee, date } => {
            format!("{ASSIGNEE_PREFIX}{assignee}-{}", date.format("%Y-%m-%d"))
        }
    }
}

/// Encode a card as a draggable id.
#[must_use]
pub fn draggable_dom_id(kind: ItemKind, id: WorkItemId) -> String {
    format!("{kind}-{id}")
}

/// Decode the three ids reported at drag end into a [`MoveIntent`].
///
/// # Errors
///
/// [`MalformedId`] naming the first identifier that does not parse.
pub fn decode(
    source_id: &str,
    destination_id: &str,
    draggable_id: &str,
) -> Result<MoveIntent, MalformedId> {
    let (kind, work_item) = parse_draggable(draggable_id)?;
    let from = parse_slot(source_id).map_err(|reason| MalformedId {
        role: "source",
        raw: source_id.to_string(),
        reason,
    })?;
    let to = parse_slot(destination_id).map_err(|reason| MalformedId {
        role: "destination",
        raw: destination_id.to_string(),
        reason,
    })?;
    Ok(MoveIntent {
        kind,
        work_item,
        from,
        to,
    })
}

/// Parse a droppable id.
///
/// # Errors
///
/// A static reason string when `raw` is neither `unassigned` nor
/// `assignee-<int>-<YYYY-MM-DD>`.
pub fn parse_slot(raw: &str) -> Result<ScheduleSlot, &'static str> {
    if raw == UNASSIGNED_ID {
        return Ok(ScheduleSlot::Unassigned);
    }
    let rest = raw
        .strip_prefix(ASSIGNEE_PREFIX)
        .ok_or("expected 'unassigned' or 'assignee-' prefix")?;
    let (assignee, date) = rest
        .split_once('-')
        .ok_or("missing date after assignee id")?;
    let assignee = parse_int(assignee).ok_or("assignee id is not an unsigned integer")?;
    let date = parse_iso_date(date).ok_or("date is not YYYY-MM-DD")?;
    Ok(ScheduleSlot::Scheduled { assignee, date })
}

fn parse_draggable(raw: &str) -> Result<(ItemKind, WorkItemId), MalformedId> {
    let malformed = |reason| MalformedId {
        role: "draggable",
        raw: raw.to_string(),
        reason,
    };
    let (kind, id) = raw
        .rsplit_once('-')
        .ok_or_else(|| malformed("expected '<kind>-<id>'"))?;
    let kind = kind
        .parse::<ItemKind>()
        .map_err(|_| malformed("unknown item kind"))?;
    let id = parse_int(id).ok_or_else(|| malformed("item id is not an unsigned integer"))?;
    Ok((kind, id))
}

fn parse_int(raw: &str) -> Option<u64> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let bytes = raw.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}
