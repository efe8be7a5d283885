use lazy_static::lazy_static;
use regex::Regex;
use time::{macros::format_description, Date};

use super::dto::{EmployeeDraft, Field, FieldErrors};

pub const REQUIRED: &str = "This field is required";
pub const INVALID_PHONE: &str = "Please enter a valid phone number";
pub const INVALID_NIN: &str = "NIN must be 11 digits";
pub const INVALID_DATE: &str = "Please enter a valid date";
pub const DOB_IN_FUTURE: &str = "Date of birth cannot be in the future";
pub const DOFA_IN_FUTURE: &str = "Date of first appointment cannot be in the future";
pub const DOFA_BEFORE_DOB: &str = "First appointment date cannot be before date of birth";

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9\s-]{10,}$").unwrap();
    static ref NIN_RE: Regex = Regex::new(r"^[0-9]{11}$").unwrap();
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

pub(crate) fn is_valid_nin(nin: &str) -> bool {
    NIN_RE.is_match(nin)
}

fn parse_date(value: &str) -> Option<Date> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]")).ok()
}

/// Run every rule against `draft` and collect all violations.
///
/// Rules are applied in order and a later rule replaces an earlier message
/// for the same field, so a blank-but-present phone reports the pattern
/// error rather than "required". Date rules only compare dates that parse.
pub fn validate(draft: &EmployeeDraft, today: Date) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    for field in Field::ALL {
        if draft.get(field).trim().is_empty() {
            errors.insert(field, REQUIRED.to_string());
        }
    }

    if !draft.phone.is_empty() && !is_valid_phone(&draft.phone) {
        errors.insert(Field::Phone, INVALID_PHONE.to_string());
    }

    if !draft.nin.is_empty() && !is_valid_nin(&draft.nin) {
        errors.insert(Field::Nin, INVALID_NIN.to_string());
    }

    let dob = date_field(draft, Field::Dob, &mut errors);
    let dofa = date_field(draft, Field::Dofa, &mut errors);

    if matches!(dob, Some(d) if d > today) {
        errors.insert(Field::Dob, DOB_IN_FUTURE.to_string());
    }
    if matches!(dofa, Some(d) if d > today) {
        errors.insert(Field::Dofa, DOFA_IN_FUTURE.to_string());
    }
    if let (Some(dob), Some(dofa)) = (dob, dofa) {
        if dofa < dob {
            errors.insert(Field::Dofa, DOFA_BEFORE_DOB.to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn date_field(draft: &EmployeeDraft, field: Field, errors: &mut FieldErrors) -> Option<Date> {
    let raw = draft.get(field);
    if raw.trim().is_empty() {
        return None;
    }
    let parsed = parse_date(raw);
    if parsed.is_none() {
        errors.insert(field, INVALID_DATE.to_string());
    }
    parsed
}
