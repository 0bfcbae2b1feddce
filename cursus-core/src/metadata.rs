//! The metadata codec: the single place that knows how course capacity
//! and participant blocks are laid out in the processor's flat
//! string-to-string metadata maps.
//!
//! Encoding is strict (only well-formed blocks are ever written);
//! decoding is defensive (missing or mangled keys degrade to a shorter
//! result instead of failing the whole read).

use std::collections::HashMap;

use serde::Serialize;

use crate::participant::Participant;

/// Hard cap on participants per purchase; also the default seat
/// capacity for courses that never had `max_plekken` filled in.
pub const MAX_PARTICIPANTS: u32 = 12;

pub const KEY_COURSE_ID: &str = "course_id";
pub const KEY_PARTICIPANT_COUNT: &str = "aantal_deelnemers";

const KEY_MAX_SPOTS: &str = "max_plekken";
const KEY_CURRENT_SPOTS: &str = "huidige_plekken";

const FIELD_SALUTATION: &str = "aanhef";
const FIELD_INITIALS: &str = "voorletters";
const FIELD_FIRST_NAME: &str = "voornaam";
const FIELD_INFIX: &str = "tussenvoegsel";
const FIELD_LAST_NAME: &str = "achternaam";
const FIELD_DATE_OF_BIRTH: &str = "geboortedatum";
const FIELD_PHONE: &str = "telefoon";
const FIELD_EMAIL: &str = "email";

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("seat quantity {0} is outside 1..={MAX_PARTICIPANTS}")]
    QuantityOutOfRange(u32),

    #[error("expected {expected} participants, got {actual}")]
    QuantityMismatch { expected: u32, actual: usize },

    #[error("participant {position} is missing required field '{field}'")]
    MissingField { position: u32, field: &'static str },
}

/// Seat capacity as stored on a course product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capacity {
    pub total: u32,
    pub booked: u32,
}

impl Capacity {
    /// Seats still open for sale. Never negative; an overbooked course
    /// simply shows zero.
    pub fn available(&self) -> u32 {
        self.total.saturating_sub(self.booked)
    }
}

fn participant_key(position: u32, field: &str) -> String {
    format!("deelnemer_{}_{}", position, field)
}

/// Flattens a participant list into session metadata.
///
/// Strict by contract: the caller has already validated the booking,
/// so any structural hole here is a programming error and is rejected
/// rather than written out half-formed.
pub fn encode_participants(
    course_id: &str,
    quantity: u32,
    participants: &[Participant],
) -> Result<HashMap<String, String>, CodecError> {
    if quantity == 0 || quantity > MAX_PARTICIPANTS {
        return Err(CodecError::QuantityOutOfRange(quantity));
    }
    if participants.len() != quantity as usize {
        return Err(CodecError::QuantityMismatch {
            expected: quantity,
            actual: participants.len(),
        });
    }

    let mut metadata = HashMap::new();
    metadata.insert(KEY_COURSE_ID.to_string(), course_id.to_string());
    metadata.insert(KEY_PARTICIPANT_COUNT.to_string(), quantity.to_string());

    for (index, participant) in participants.iter().enumerate() {
        let position = index as u32 + 1;
        if let Some(field) = participant.missing_required_field() {
            return Err(CodecError::MissingField { position, field });
        }

        metadata.insert(
            participant_key(position, FIELD_SALUTATION),
            participant.salutation.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_INITIALS),
            participant.initials.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_FIRST_NAME),
            participant.first_name.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_INFIX),
            participant.infix.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_LAST_NAME),
            participant.last_name.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_DATE_OF_BIRTH),
            participant.date_of_birth.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_PHONE),
            participant.phone.clone(),
        );
        metadata.insert(
            participant_key(position, FIELD_EMAIL),
            participant.email.clone(),
        );
    }

    Ok(metadata)
}

/// Reconstructs the participant list from session metadata.
///
/// When `aantal_deelnemers` is present, every declared position is
/// tried and positions with a missing first name are skipped, so one
/// mangled entry still yields the rest. When the count key is absent
/// (older encodings), positions are probed from 1 and the walk stops
/// at the first gap.
pub fn decode_participants(metadata: &HashMap<String, String>) -> Vec<Participant> {
    let declared = metadata
        .get(KEY_PARTICIPANT_COUNT)
        .and_then(|raw| raw.trim().parse::<u32>().ok());

    let mut participants = Vec::new();
    match declared {
        Some(count) => {
            for position in 1..=count.min(MAX_PARTICIPANTS) {
                if has_first_name(metadata, position) {
                    participants.push(decode_at(metadata, position));
                }
            }
        }
        None => {
            for position in 1..=MAX_PARTICIPANTS {
                if !has_first_name(metadata, position) {
                    break;
                }
                participants.push(decode_at(metadata, position));
            }
        }
    }
    participants
}

fn has_first_name(metadata: &HashMap<String, String>, position: u32) -> bool {
    metadata
        .get(&participant_key(position, FIELD_FIRST_NAME))
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false)
}

fn decode_at(metadata: &HashMap<String, String>, position: u32) -> Participant {
    let field = |name: &str| {
        metadata
            .get(&participant_key(position, name))
            .cloned()
            .unwrap_or_default()
    };
    Participant {
        salutation: field(FIELD_SALUTATION),
        initials: field(FIELD_INITIALS),
        first_name: field(FIELD_FIRST_NAME),
        infix: field(FIELD_INFIX),
        last_name: field(FIELD_LAST_NAME),
        date_of_birth: field(FIELD_DATE_OF_BIRTH),
        phone: field(FIELD_PHONE),
        email: field(FIELD_EMAIL),
    }
}

/// The course a session belongs to, if it was tagged at checkout.
pub fn decode_course_id(metadata: &HashMap<String, String>) -> Option<&str> {
    metadata
        .get(KEY_COURSE_ID)
        .map(|id| id.as_str())
        .filter(|id| !id.is_empty())
}

/// Reads seat capacity from course product metadata. Absent or
/// non-numeric values fall back to the defaults so a half-configured
/// course still renders.
pub fn decode_capacity(metadata: &HashMap<String, String>) -> Capacity {
    let read = |key: &str, default: u32| {
        metadata
            .get(key)
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(default)
    };
    Capacity {
        total: read(KEY_MAX_SPOTS, MAX_PARTICIPANTS),
        booked: read(KEY_CURRENT_SPOTS, 0),
    }
}

/// Returns the product metadata with the booked-seats counter replaced
/// and every other key preserved.
pub fn encode_booked_spots(
    metadata: &HashMap<String, String>,
    booked: u32,
) -> HashMap<String, String> {
    let mut updated = metadata.clone();
    updated.insert(KEY_CURRENT_SPOTS.to_string(), booked.to_string());
    updated
}

/// Copies a metadata map with surrounding whitespace stripped from the
/// keys. Course metadata is maintained by hand in the processor
/// dashboard and keys arrive with stray spaces.
pub fn trimmed_keys(metadata: &HashMap<String, String>) -> HashMap<String, String> {
    metadata
        .iter()
        .map(|(key, value)| (key.trim().to_string(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(first_name: &str) -> Participant {
        Participant {
            salutation: "Dhr.".to_string(),
            initials: "P.".to_string(),
            first_name: first_name.to_string(),
            infix: String::new(),
            last_name: "Jansen".to_string(),
            date_of_birth: "1992-02-17".to_string(),
            phone: "0611111111".to_string(),
            email: format!("{}@example.nl", first_name.to_lowercase()),
        }
    }

    #[test]
    fn round_trips_every_valid_list_length() {
        for quantity in 1..=MAX_PARTICIPANTS {
            let participants: Vec<Participant> = (1..=quantity)
                .map(|n| participant(&format!("Naam{}", n)))
                .collect();
            let metadata =
                encode_participants("prod_abc", quantity, &participants).unwrap();

            assert_eq!(metadata.get(KEY_COURSE_ID).unwrap(), "prod_abc");
            assert_eq!(
                metadata.get(KEY_PARTICIPANT_COUNT).unwrap(),
                &quantity.to_string()
            );
            assert_eq!(decode_participants(&metadata), participants);
        }
    }

    #[test]
    fn rejects_quantity_participant_mismatch() {
        let result = encode_participants("prod_abc", 2, &[participant("Piet")]);
        assert!(matches!(
            result,
            Err(CodecError::QuantityMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn rejects_zero_and_oversized_quantities() {
        assert!(matches!(
            encode_participants("prod_abc", 0, &[]),
            Err(CodecError::QuantityOutOfRange(0))
        ));
        let too_many: Vec<Participant> =
            (0..13).map(|n| participant(&format!("N{}", n))).collect();
        assert!(matches!(
            encode_participants("prod_abc", 13, &too_many),
            Err(CodecError::QuantityOutOfRange(13))
        ));
    }

    #[test]
    fn rejects_incomplete_participant() {
        let mut p = participant("Piet");
        p.phone = String::new();
        let result = encode_participants("prod_abc", 1, &[p]);
        assert!(matches!(
            result,
            Err(CodecError::MissingField { position: 1, field: "telefoon" })
        ));
    }

    #[test]
    fn declared_count_skips_gaps() {
        let participants = vec![
            participant("Een"),
            participant("Twee"),
            participant("Drie"),
            participant("Vier"),
        ];
        let mut metadata = encode_participants("prod_abc", 4, &participants).unwrap();
        metadata.remove(&participant_key(3, FIELD_FIRST_NAME));

        let decoded = decode_participants(&metadata);
        let names: Vec<&str> =
            decoded.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, vec!["Een", "Twee", "Vier"]);
    }

    #[test]
    fn probe_without_count_stops_at_first_gap() {
        let participants = vec![
            participant("Een"),
            participant("Twee"),
            participant("Drie"),
            participant("Vier"),
        ];
        let mut metadata = encode_participants("prod_abc", 4, &participants).unwrap();
        metadata.remove(KEY_PARTICIPANT_COUNT);
        metadata.remove(&participant_key(3, FIELD_FIRST_NAME));

        let decoded = decode_participants(&metadata);
        let names: Vec<&str> =
            decoded.iter().map(|p| p.first_name.as_str()).collect();
        assert_eq!(names, vec!["Een", "Twee"]);
    }

    #[test]
    fn declared_count_never_reads_past_the_cap() {
        let participants = vec![participant("Een")];
        let mut metadata = encode_participants("prod_abc", 1, &participants).unwrap();
        metadata.insert(KEY_PARTICIPANT_COUNT.to_string(), "9999".to_string());
        assert_eq!(decode_participants(&metadata).len(), 1);
    }

    #[test]
    fn capacity_reads_stored_values() {
        let mut metadata = HashMap::new();
        metadata.insert("max_plekken".to_string(), "12".to_string());
        metadata.insert("huidige_plekken".to_string(), "5".to_string());

        let capacity = decode_capacity(&metadata);
        assert_eq!(capacity, Capacity { total: 12, booked: 5 });
        assert_eq!(capacity.available(), 7);
    }

    #[test]
    fn capacity_defaults_on_empty_or_mangled_metadata() {
        let capacity = decode_capacity(&HashMap::new());
        assert_eq!(capacity, Capacity { total: 12, booked: 0 });
        assert_eq!(capacity.available(), 12);

        let mut metadata = HashMap::new();
        metadata.insert("max_plekken".to_string(), "veel".to_string());
        metadata.insert("huidige_plekken".to_string(), "-3".to_string());
        assert_eq!(decode_capacity(&metadata), Capacity { total: 12, booked: 0 });
    }

    #[test]
    fn overbooked_course_shows_zero_available() {
        let capacity = Capacity { total: 12, booked: 14 };
        assert_eq!(capacity.available(), 0);
    }

    #[test]
    fn booked_spots_update_preserves_other_keys() {
        let mut metadata = HashMap::new();
        metadata.insert("max_plekken".to_string(), "10".to_string());
        metadata.insert("locatie".to_string(), "Utrecht".to_string());

        let updated = encode_booked_spots(&metadata, 4);
        assert_eq!(updated.get("huidige_plekken").unwrap(), "4");
        assert_eq!(updated.get("locatie").unwrap(), "Utrecht");
        assert_eq!(updated.get("max_plekken").unwrap(), "10");
    }

    #[test]
    fn trims_hand_entered_keys() {
        let mut metadata = HashMap::new();
        metadata.insert(" datum".to_string(), "2026-05-12".to_string());
        metadata.insert("tijd ".to_string(), "09:00 - 17:00".to_string());

        let trimmed = trimmed_keys(&metadata);
        assert_eq!(trimmed.get("datum").unwrap(), "2026-05-12");
        assert_eq!(trimmed.get("tijd").unwrap(), "09:00 - 17:00");
    }
}
