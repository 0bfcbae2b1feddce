use serde::{Deserialize, Serialize};

/// A single course attendee as entered on the enrollment form.
///
/// Field names on the wire follow the Dutch form contract; everything
/// except the name infix is required at booking time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    #[serde(rename = "aanhef")]
    pub salutation: String,
    #[serde(rename = "voorletters")]
    pub initials: String,
    #[serde(rename = "voornaam")]
    pub first_name: String,
    #[serde(rename = "tussenvoegsel", default)]
    pub infix: String,
    #[serde(rename = "achternaam")]
    pub last_name: String,
    #[serde(rename = "geboortedatum")]
    pub date_of_birth: String,
    #[serde(rename = "telefoon")]
    pub phone: String,
    pub email: String,
}

impl Participant {
    /// Returns the wire name of the first required field that is empty,
    /// or `None` when the record is structurally complete.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        let required: [(&'static str, &str); 7] = [
            ("aanhef", &self.salutation),
            ("voorletters", &self.initials),
            ("voornaam", &self.first_name),
            ("achternaam", &self.last_name),
            ("geboortedatum", &self.date_of_birth),
            ("telefoon", &self.phone),
            ("email", &self.email),
        ];
        required
            .iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required_field().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> Participant {
        Participant {
            salutation: "Dhr.".to_string(),
            initials: "J.".to_string(),
            first_name: "Jan".to_string(),
            infix: "van".to_string(),
            last_name: "Berg".to_string(),
            date_of_birth: "1990-04-01".to_string(),
            phone: "0612345678".to_string(),
            email: "jan@example.nl".to_string(),
        }
    }

    #[test]
    fn complete_participant_passes() {
        assert!(filled().is_complete());
    }

    #[test]
    fn infix_is_optional() {
        let mut p = filled();
        p.infix = String::new();
        assert!(p.is_complete());
    }

    #[test]
    fn blank_email_is_reported_by_wire_name() {
        let mut p = filled();
        p.email = "   ".to_string();
        assert_eq!(p.missing_required_field(), Some("email"));
    }

    #[test]
    fn deserializes_dutch_form_fields() {
        let p: Participant = serde_json::from_str(
            r#"{
                "aanhef": "Mevr.",
                "voorletters": "A.B.",
                "voornaam": "Anna",
                "achternaam": "Smit",
                "geboortedatum": "1985-11-23",
                "telefoon": "0687654321",
                "email": "anna@example.nl"
            }"#,
        )
        .unwrap();
        assert_eq!(p.first_name, "Anna");
        assert_eq!(p.infix, "");
        assert!(p.is_complete());
    }
}
