use std::fmt::Write;

use chrono::NaiveDate;

use crate::catalog::InspectionField;
use crate::condition::{classify, Condition, Counts};
use crate::models::FieldValues;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FormError {
    #[error("{} is derived from the other counts and cannot be entered", .0.label())]
    DerivedField(InspectionField),
    #[error("All fields must be filled out correctly before submitting:{}", list_errors(.0))]
    Invalid(Vec<FieldError>),
}

fn list_errors(errors: &[FieldError]) -> String {
    let mut output = String::new();
    for error in errors {
        let _ = write!(output, "\n  - {}: {}", error.field, error.message);
    }
    output
}

/// A new inspection while it is being filled in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InspectionForm {
    pub school_id: String,
    pub school_name: String,
    pub inspection_date: String,
    values: FieldValues,
}

impl InspectionForm {
    pub fn new(school_id: &str, school_name: &str, inspection_date: &str) -> Self {
        Self {
            school_id: school_id.to_string(),
            school_name: school_name.to_string(),
            inspection_date: inspection_date.to_string(),
            values: FieldValues::new(),
        }
    }

    pub fn set(&mut self, field: InspectionField, value: &str) -> Result<(), FormError> {
        if field == InspectionField::Condition {
            return Err(FormError::DerivedField(field));
        }
        self.values.insert(field, value.trim().to_string());
        self.refresh_condition();
        Ok(())
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn condition(&self) -> Option<&str> {
        self.values
            .get(&InspectionField::Condition)
            .map(String::as_str)
    }

    pub fn is_complete(&self) -> bool {
        InspectionField::NUMERIC
            .iter()
            .all(|field| self.values.get(field).is_some_and(|value| !value.is_empty()))
    }

    fn refresh_condition(&mut self) {
        if self.is_complete() {
            let condition: Condition = classify(&Counts::parse(&self.values));
            self.values
                .insert(InspectionField::Condition, condition.to_string());
        } else {
            self.values.remove(&InspectionField::Condition);
        }
    }

    pub fn validate(&self) -> Result<(), FormError> {
        let mut errors = Vec::new();

        if self.school_id.trim().is_empty() {
            errors.push(FieldError {
                field: "school",
                message: "Please select a school".to_string(),
            });
        }

        if self.inspection_date.trim().is_empty() {
            errors.push(FieldError {
                field: "inspectionDate",
                message: "Inspection date is required".to_string(),
            });
        } else if NaiveDate::parse_from_str(self.inspection_date.trim(), "%Y-%m-%d").is_err() {
            errors.push(FieldError {
                field: "inspectionDate",
                message: "Inspection date must be written as YYYY-MM-DD".to_string(),
            });
        }

        for field in InspectionField::NUMERIC {
            let raw = self.values.get(&field).map(String::as_str).unwrap_or("");
            if let Some(message) = check_count(field, raw) {
                errors.push(FieldError {
                    field: field.key(),
                    message,
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(FormError::Invalid(errors))
        }
    }

    /// Drops everything entered after a successful submission.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn check_count(field: InspectionField, raw: &str) -> Option<String> {
    if raw.is_empty() {
        return Some(format!(
            "Please enter a value for {}",
            field.label().to_lowercase()
        ));
    }
    let trimmed = raw.trim();
    if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && !trimmed.starts_with('-') => {
            Some("Must be a whole number".to_string())
        }
        _ => Some("Must be a positive number".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_form() -> InspectionForm {
        let mut form = InspectionForm::new("ou1", "Jambalaya Primary", "2024-05-01");
        for (field, value) in [
            (InspectionField::SeatsForStudents, "60"),
            (InspectionField::NumberOfStudents, "50"),
            (InspectionField::NumberOfTextbooks, "60"),
            (InspectionField::NumberOfClassrooms, "1"),
            (InspectionField::NumberOfTeachers, "2"),
            (InspectionField::ToiletsForTeachers, "1"),
            (InspectionField::ToiletsForStudents, "3"),
        ] {
            form.set(field, value).unwrap();
        }
        form
    }

    #[test]
    fn condition_appears_once_all_counts_are_filled() {
        let mut form = InspectionForm::new("ou1", "Jambalaya Primary", "2024-05-01");
        form.set(InspectionField::NumberOfStudents, "50").unwrap();
        assert_eq!(form.condition(), None);

        let form = filled_form();
        assert_eq!(form.condition(), Some("Good"));
        assert!(form.validate().is_ok());
    }

    #[test]
    fn condition_follows_later_edits() {
        let mut form = filled_form();
        form.set(InspectionField::NumberOfStudents, "54").unwrap();
        assert_eq!(form.condition(), Some("Poor"));

        form.set(InspectionField::ToiletsForTeachers, "").unwrap();
        assert_eq!(form.condition(), None);
    }

    #[test]
    fn condition_cannot_be_typed_in() {
        let mut form = filled_form();
        let err = form.set(InspectionField::Condition, "Good").unwrap_err();
        assert_eq!(err, FormError::DerivedField(InspectionField::Condition));
    }

    #[test]
    fn validation_collects_every_problem() {
        let mut form = InspectionForm::default();
        form.set(InspectionField::NumberOfStudents, "-4").unwrap();
        form.set(InspectionField::NumberOfTeachers, "two").unwrap();
        form.set(InspectionField::NumberOfClassrooms, "2.5").unwrap();

        let Err(FormError::Invalid(errors)) = form.validate() else {
            panic!("expected validation errors");
        };
        let find = |field: &str| {
            errors
                .iter()
                .find(|error| error.field == field)
                .map(|error| error.message.as_str())
        };
        assert_eq!(find("school"), Some("Please select a school"));
        assert_eq!(find("inspectionDate"), Some("Inspection date is required"));
        assert_eq!(find("numberOfStudents"), Some("Must be a positive number"));
        assert_eq!(find("numberOfTeachers"), Some("Must be a positive number"));
        assert_eq!(find("numberOfClassrooms"), Some("Must be a whole number"));
        assert_eq!(
            find("seatsForStudents"),
            Some("Please enter a value for seats for students")
        );
    }

    #[test]
    fn counts_must_be_plain_digits() {
        let mut form = filled_form();
        form.set(InspectionField::NumberOfStudents, "1e3").unwrap();
        form.set(InspectionField::NumberOfClassrooms, ".5e1").unwrap();
        form.set(InspectionField::NumberOfTeachers, "-0").unwrap();
        form.set(InspectionField::ToiletsForStudents, "0x10").unwrap();
        form.set(InspectionField::SeatsForStudents, "+60").unwrap();

        let Err(FormError::Invalid(errors)) = form.validate() else {
            panic!("expected validation errors");
        };
        let fields: Vec<&str> = errors.iter().map(|error| error.field).collect();
        assert_eq!(
            fields,
            vec![
                "seatsForStudents",
                "numberOfStudents",
                "numberOfClassrooms",
                "numberOfTeachers",
                "toiletsForStudents"
            ]
        );

        form.set(InspectionField::SeatsForStudents, "60").unwrap();
        form.set(InspectionField::NumberOfStudents, "50").unwrap();
        form.set(InspectionField::NumberOfClassrooms, " 1 ").unwrap();
        form.set(InspectionField::NumberOfTeachers, "2").unwrap();
        form.set(InspectionField::ToiletsForStudents, "3").unwrap();
        assert!(form.validate().is_ok());
        assert_eq!(form.condition(), Some("Good"));
    }

    #[test]
    fn negative_zero_classrooms_keep_school_good() {
        let mut form = filled_form();
        form.set(InspectionField::NumberOfStudents, "10").unwrap();
        form.set(InspectionField::NumberOfClassrooms, "-0").unwrap();
        assert_eq!(form.condition(), Some("Good"));
    }

    #[test]
    fn malformed_date_is_rejected() {
        let mut form = filled_form();
        form.inspection_date = "05/01/2024".to_string();
        let err = form.validate().unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[test]
    fn reset_clears_entries() {
        let mut form = filled_form();
        form.reset();
        assert_eq!(form, InspectionForm::default());
    }
}
