use serde::Serialize;

use crate::catalog::{Catalog, InspectionField};
use crate::form::InspectionForm;
use crate::models::{DataValue, FieldValues};

/// Which form entries count as present when building a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Presence {
    /// Empty strings and zero values are left out.
    #[default]
    Truthy,
    /// Only empty strings are left out.
    NonEmpty,
}

impl Presence {
    pub fn includes(self, raw: &str) -> bool {
        let value = raw.trim();
        match self {
            Presence::NonEmpty => !value.is_empty(),
            Presence::Truthy => {
                !value.is_empty() && value.parse::<f64>().map_or(true, |n| n != 0.0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub program: String,
    pub program_stage: String,
    pub org_unit: String,
    pub event_date: String,
    pub status: &'static str,
    pub data_values: Vec<DataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsPayload {
    pub events: Vec<EventPayload>,
}

pub fn build_data_values(
    values: &FieldValues,
    catalog: &Catalog,
    presence: Presence,
) -> Vec<DataValue> {
    InspectionField::ALL
        .into_iter()
        .filter_map(|field| {
            let raw = values.get(&field)?;
            presence.includes(raw).then(|| DataValue {
                data_element: catalog.data_element(field).to_string(),
                value: raw.trim().to_string(),
            })
        })
        .collect()
}

pub fn build_event_payload(
    form: &InspectionForm,
    catalog: &Catalog,
    presence: Presence,
) -> EventsPayload {
    EventsPayload {
        events: vec![EventPayload {
            program: catalog.program.clone(),
            program_stage: catalog.program_stage.clone(),
            org_unit: form.school_id.clone(),
            event_date: form.inspection_date.clone(),
            status: "COMPLETED",
            data_values: build_data_values(form.values(), catalog, presence),
        }],
    }
}
