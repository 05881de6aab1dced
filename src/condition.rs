use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::InspectionField;
use crate::models::FieldValues;

const CLASSROOM_RATIO_LIMIT: f64 = 53.0;
const TEACHER_RATIO_LIMIT: f64 = 45.0;
const TOILET_RATIO_LIMIT: f64 = 25.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum Condition {
    Good,
    Poor,
}

impl Condition {
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::Good => "Good",
            Condition::Poor => "Poor",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ClassifyError {
    #[error("{} must be a whole number, got {value:?}", .field.label())]
    InvalidInput {
        field: InspectionField,
        value: String,
    },
}

/// The six inputs the classifier reads. Unparseable entries stay NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Counts {
    pub students: f64,
    pub seats: f64,
    pub textbooks: f64,
    pub classrooms: f64,
    pub teachers: f64,
    pub student_toilets: f64,
}

impl Counts {
    pub fn parse(values: &FieldValues) -> Self {
        let read = |field: InspectionField| {
            values
                .get(&field)
                .map_or(f64::NAN, |raw| parse_count(raw))
        };
        Self {
            students: read(InspectionField::NumberOfStudents),
            seats: read(InspectionField::SeatsForStudents),
            textbooks: read(InspectionField::NumberOfTextbooks),
            classrooms: read(InspectionField::NumberOfClassrooms),
            teachers: read(InspectionField::NumberOfTeachers),
            student_toilets: read(InspectionField::ToiletsForStudents),
        }
    }

    pub fn parse_strict(values: &FieldValues) -> Result<Self, ClassifyError> {
        let read = |field: InspectionField| {
            let raw = values.get(&field).map(String::as_str).unwrap_or("");
            let value = parse_count(raw);
            if value.is_nan() {
                Err(ClassifyError::InvalidInput {
                    field,
                    value: raw.to_string(),
                })
            } else {
                Ok(value)
            }
        };
        Ok(Self {
            students: read(InspectionField::NumberOfStudents)?,
            seats: read(InspectionField::SeatsForStudents)?,
            textbooks: read(InspectionField::NumberOfTextbooks)?,
            classrooms: read(InspectionField::NumberOfClassrooms)?,
            teachers: read(InspectionField::NumberOfTeachers)?,
            student_toilets: read(InspectionField::ToiletsForStudents)?,
        })
    }
}

/// Reads the leading integer of `raw`: optional whitespace, an optional sign,
/// then decimal digits, or hex digits after a `0x` prefix. Anything without a
/// leading digit is NaN.
pub fn parse_count(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (-1.0, &trimmed[1..]),
        Some(b'+') => (1.0, &trimmed[1..]),
        _ => (1.0, trimmed),
    };
    let (radix, rest) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let len = rest
        .chars()
        .take_while(|c| c.is_digit(radix))
        .count();
    if len == 0 {
        return f64::NAN;
    }
    let value = rest[..len]
        .chars()
        .filter_map(|c| c.to_digit(radix))
        .fold(0.0, |acc, digit| acc * f64::from(radix) + f64::from(digit));
    sign * value
}

pub fn classify(counts: &Counts) -> Condition {
    let checks = [
        exceeds(counts.students, counts.seats),
        exceeds(counts.students, counts.textbooks),
        ratio_at_least(counts.students, counts.classrooms, CLASSROOM_RATIO_LIMIT),
        ratio_at_least(counts.students, counts.teachers, TEACHER_RATIO_LIMIT),
        ratio_at_least(counts.students, counts.student_toilets, TOILET_RATIO_LIMIT),
    ];

    if checks.iter().any(|failed| *failed) {
        Condition::Poor
    } else {
        Condition::Good
    }
}

pub fn try_classify(values: &FieldValues) -> Result<Condition, ClassifyError> {
    Ok(classify(&Counts::parse_strict(values)?))
}

fn exceeds(students: f64, capacity: f64) -> bool {
    if students.is_nan() || capacity.is_nan() {
        return false;
    }
    students > capacity
}

// A zero denominator is infinite for positive students, and 0/0 passes.
fn ratio_at_least(students: f64, per: f64, limit: f64) -> bool {
    if students.is_nan() || per.is_nan() {
        return false;
    }
    if per == 0.0 {
        // Only +0 turns positive students into +inf; -0 gives -inf.
        return per.is_sign_positive() && students > 0.0;
    }
    students / per >= limit
}
