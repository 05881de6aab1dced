use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::catalog::InspectionField;
use crate::form::InspectionForm;

#[derive(Debug, Deserialize)]
struct CsvRow {
    school_id: String,
    #[serde(default)]
    school_name: Option<String>,
    inspection_date: String,
    seats_for_students: String,
    number_of_students: String,
    number_of_textbooks: String,
    number_of_classrooms: String,
    number_of_teachers: String,
    toilets_for_teachers: String,
    toilets_for_students: String,
}

impl CsvRow {
    fn into_form(self) -> anyhow::Result<InspectionForm> {
        let mut form = InspectionForm::new(
            &self.school_id,
            self.school_name.as_deref().unwrap_or(""),
            &self.inspection_date,
        );
        for (field, value) in [
            (InspectionField::SeatsForStudents, &self.seats_for_students),
            (InspectionField::NumberOfStudents, &self.number_of_students),
            (InspectionField::NumberOfTextbooks, &self.number_of_textbooks),
            (InspectionField::NumberOfClassrooms, &self.number_of_classrooms),
            (InspectionField::NumberOfTeachers, &self.number_of_teachers),
            (InspectionField::ToiletsForTeachers, &self.toilets_for_teachers),
            (InspectionField::ToiletsForStudents, &self.toilets_for_students),
        ] {
            form.set(field, value)?;
        }
        form.validate()?;
        Ok(form)
    }
}

pub fn read_inspections_csv(path: &Path) -> anyhow::Result<Vec<InspectionForm>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    read_inspections(file)
}

pub fn read_inspections<R: Read>(input: R) -> anyhow::Result<Vec<InspectionForm>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut forms = Vec::new();

    // Row 1 is the header.
    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        let row_number = index + 2;
        let row = result.with_context(|| format!("row {row_number} could not be read"))?;
        let form = row
            .into_form()
            .with_context(|| format!("row {row_number} is not a valid inspection"))?;
        forms.push(form);
    }

    Ok(forms)
}
