use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, InspectionField};

/// Raw form entries keyed by field, exactly as typed.
pub type FieldValues = BTreeMap<InspectionField, String>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct School {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: String,
    pub value: String,
}

/// One inspection as the platform stores it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event: String,
    #[serde(default)]
    pub org_unit: String,
    #[serde(default)]
    pub org_unit_name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub event_date: String,
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub data_values: Vec<DataValue>,
}

impl Event {
    pub fn day(&self) -> Option<NaiveDate> {
        NaiveDateTime::parse_from_str(&self.event_date, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|stamp| stamp.date())
            .ok()
            .or_else(|| {
                self.event_date
                    .get(..10)
                    .and_then(|day| NaiveDate::parse_from_str(day, "%Y-%m-%d").ok())
            })
    }

    /// The date part of `event_date`, or the raw value when it is shorter.
    pub fn date_label(&self) -> &str {
        self.event_date.get(..10).unwrap_or(&self.event_date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagerInfo {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub page_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pager: PagerInfo,
}

/// An event flattened into the inspection fields it records.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectionRecord {
    pub id: String,
    pub school_name: String,
    pub date: String,
    pub status: String,
    pub values: FieldValues,
}

impl InspectionRecord {
    pub fn from_event(event: &Event, catalog: &Catalog) -> Self {
        let values = event
            .data_values
            .iter()
            .filter_map(|data_value| {
                catalog
                    .field_for(&data_value.data_element)
                    .map(|field| (field, data_value.value.clone()))
            })
            .collect();

        Self {
            id: event.event.clone(),
            school_name: event.org_unit_name.clone(),
            date: event.date_label().to_string(),
            status: event.status.clone(),
            values,
        }
    }

    pub fn condition(&self) -> Option<&str> {
        self.values
            .get(&InspectionField::Condition)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    pub fn condition_label(&self) -> &str {
        self.condition().unwrap_or("Not defined")
    }

    pub fn value(&self, field: InspectionField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Newest event by date. Events without a readable date never win.
pub fn latest_event(events: &[Event]) -> Option<&Event> {
    events
        .iter()
        .filter(|event| event.day().is_some())
        .max_by_key(|event| event.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, date: &str) -> Event {
        Event {
            event: id.to_string(),
            org_unit: "ou1".to_string(),
            org_unit_name: "Jambalaya Primary".to_string(),
            status: "COMPLETED".to_string(),
            event_date: date.to_string(),
            program: "UxK2o06ScIe".to_string(),
            data_values: vec![
                DataValue {
                    data_element: "CnukMdcvvZ2".to_string(),
                    value: "120".to_string(),
                },
                DataValue {
                    data_element: "MP1D4UZbbBE".to_string(),
                    value: "Poor".to_string(),
                },
                DataValue {
                    data_element: "notInCatalog".to_string(),
                    value: "x".to_string(),
                },
            ],
        }
    }

    #[test]
    fn decodes_platform_event_json() {
        let raw = r#"{
            "event": "ev1",
            "orgUnit": "ou1",
            "orgUnitName": "Jambalaya Primary",
            "status": "COMPLETED",
            "eventDate": "2024-03-05T00:00:00.000",
            "program": "UxK2o06ScIe",
            "dataValues": [{"dataElement": "MP1D4UZbbBE", "value": "Good"}]
        }"#;
        let decoded: Event = serde_json::from_str(raw).unwrap();
        assert_eq!(decoded.date_label(), "2024-03-05");
        assert_eq!(decoded.day(), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(decoded.data_values.len(), 1);
    }

    #[test]
    fn record_keeps_only_catalog_fields() {
        let record = InspectionRecord::from_event(
            &event("ev1", "2024-03-05T00:00:00.000"),
            &Catalog::default(),
        );
        assert_eq!(record.values.len(), 2);
        assert_eq!(record.value(InspectionField::NumberOfStudents), "120");
        assert_eq!(record.condition_label(), "Poor");
        assert_eq!(record.date, "2024-03-05");
    }

    #[test]
    fn missing_condition_reads_not_defined() {
        let mut bare = event("ev2", "2024-03-05");
        bare.data_values.clear();
        let record = InspectionRecord::from_event(&bare, &Catalog::default());
        assert_eq!(record.condition(), None);
        assert_eq!(record.condition_label(), "Not defined");
    }

    #[test]
    fn latest_event_picks_newest_date() {
        let events = vec![
            event("old", "2023-01-10T00:00:00.000"),
            event("new", "2024-06-01T08:30:00.000"),
            event("undated", ""),
            event("mid", "2024-02-01"),
        ];
        assert_eq!(latest_event(&events).map(|e| e.event.as_str()), Some("new"));
        assert_eq!(latest_event(&[]), None);
    }
}
