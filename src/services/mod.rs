//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own business logic and persistence concerns so route
//! handlers can stay focused on JSON translation and status mapping.

pub mod chat;
pub mod history;
pub mod image;

use uuid::Uuid;

/// Parse a required identifier field. Blank counts as absent.
pub(crate) fn parse_required_uuid(raw: Option<&str>) -> Option<Result<Uuid, String>> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    Some(Uuid::parse_str(raw).map_err(|_| raw.to_owned()))
}

/// Return the text if present and not blank.
pub(crate) fn required_text(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}
