use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InspectionField {
    SeatsForStudents,
    NumberOfStudents,
    NumberOfTextbooks,
    NumberOfClassrooms,
    NumberOfTeachers,
    ToiletsForTeachers,
    ToiletsForStudents,
    Condition,
}

impl InspectionField {
    /// Payload order.
    pub const ALL: [InspectionField; 8] = [
        InspectionField::SeatsForStudents,
        InspectionField::NumberOfStudents,
        InspectionField::NumberOfTextbooks,
        InspectionField::NumberOfClassrooms,
        InspectionField::NumberOfTeachers,
        InspectionField::ToiletsForTeachers,
        InspectionField::ToiletsForStudents,
        InspectionField::Condition,
    ];

    /// Every field an inspector enters by hand.
    pub const NUMERIC: [InspectionField; 7] = [
        InspectionField::SeatsForStudents,
        InspectionField::NumberOfStudents,
        InspectionField::NumberOfTextbooks,
        InspectionField::NumberOfClassrooms,
        InspectionField::NumberOfTeachers,
        InspectionField::ToiletsForTeachers,
        InspectionField::ToiletsForStudents,
    ];

    pub fn key(self) -> &'static str {
        match self {
            InspectionField::SeatsForStudents => "seatsForStudents",
            InspectionField::NumberOfStudents => "numberOfStudents",
            InspectionField::NumberOfTextbooks => "numberOfTextbooks",
            InspectionField::NumberOfClassrooms => "numberOfClassrooms",
            InspectionField::NumberOfTeachers => "numberOfTeachers",
            InspectionField::ToiletsForTeachers => "toiletsForTeachers",
            InspectionField::ToiletsForStudents => "toiletsForStudents",
            InspectionField::Condition => "condition",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            InspectionField::SeatsForStudents => "Seats for students",
            InspectionField::NumberOfStudents => "Number of students",
            InspectionField::NumberOfTextbooks => "Number of textbooks",
            InspectionField::NumberOfClassrooms => "Number of classrooms",
            InspectionField::NumberOfTeachers => "Number of teachers",
            InspectionField::ToiletsForTeachers => "Toilets for teachers",
            InspectionField::ToiletsForStudents => "Toilets for students",
            InspectionField::Condition => "School condition",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataElements {
    pub seats_for_students: String,
    pub number_of_students: String,
    pub number_of_textbooks: String,
    pub number_of_classrooms: String,
    pub number_of_teachers: String,
    pub toilets_for_teachers: String,
    pub toilets_for_students: String,
    pub condition: String,
}

/// Identifiers of the inspection program on the DHIS2 instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub program: String,
    pub program_stage: String,
    /// Organisation unit the listed schools hang under.
    pub school_parent: String,
    pub data_elements: DataElements,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            program: "UxK2o06ScIe".to_string(),
            program_stage: "eJiBjm9Rl7E".to_string(),
            school_parent: "Jj1IUjjPaWf".to_string(),
            data_elements: DataElements {
                seats_for_students: "txJa0dnZI04".to_string(),
                number_of_students: "CnukMdcvvZ2".to_string(),
                number_of_textbooks: "BqiFdo8xCZ9".to_string(),
                number_of_classrooms: "ya5SyA5hej4".to_string(),
                number_of_teachers: "NcXpc3aYUch".to_string(),
                toilets_for_teachers: "I13NTyLrHBm".to_string(),
                toilets_for_students: "gsXT75jgFE5".to_string(),
                condition: "MP1D4UZbbBE".to_string(),
            },
        }
    }
}

impl Catalog {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("catalog {} is not valid JSON", path.display()))
    }

    pub fn data_element(&self, field: InspectionField) -> &str {
        let elements = &self.data_elements;
        match field {
            InspectionField::SeatsForStudents => &elements.seats_for_students,
            InspectionField::NumberOfStudents => &elements.number_of_students,
            InspectionField::NumberOfTextbooks => &elements.number_of_textbooks,
            InspectionField::NumberOfClassrooms => &elements.number_of_classrooms,
            InspectionField::NumberOfTeachers => &elements.number_of_teachers,
            InspectionField::ToiletsForTeachers => &elements.toilets_for_teachers,
            InspectionField::ToiletsForStudents => &elements.toilets_for_students,
            InspectionField::Condition => &elements.condition,
        }
    }

    pub fn field_for(&self, data_element: &str) -> Option<InspectionField> {
        InspectionField::ALL
            .into_iter()
            .find(|field| self.data_element(*field) == data_element)
    }
}
