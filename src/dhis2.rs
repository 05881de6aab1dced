use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::models::{latest_event, Event, Page, PagerInfo, School};
use crate::pagination::DEFAULT_PAGE_SIZE;
use crate::payload::EventsPayload;
use crate::school::OrganisationUnitPayload;

const EVENT_FIELDS: &str =
    "orgUnit,orgUnitName,status,eventDate,program,dataValues[dataElement,value],event";
const LATEST_WINDOW: u32 = 5;

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("DHIS2 rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("could not reach DHIS2: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response from DHIS2: {0}")]
    Decode(#[from] serde_json::Error),
}

type Params = Vec<(&'static str, String)>;

fn page_size_param(page_size: u32) -> String {
    if page_size > 0 {
        page_size.to_string()
    } else {
        DEFAULT_PAGE_SIZE.to_string()
    }
}

pub fn school_query(catalog: &Catalog, search: Option<&str>, page: u32, page_size: u32) -> Params {
    let mut params = vec![
        ("fields", "name,id".to_string()),
        ("page", page.max(1).to_string()),
        ("pageSize", page_size_param(page_size)),
        ("paging", "true".to_string()),
        ("filter", format!("parent.id:eq:{}", catalog.school_parent)),
    ];
    if let Some(term) = search.map(str::trim).filter(|term| !term.is_empty()) {
        params.push(("filter", format!("name:ilike:{term}")));
    }
    params
}

pub fn inspection_query(catalog: &Catalog, org_unit: &str, page: u32, page_size: u32) -> Params {
    vec![
        ("fields", EVENT_FIELDS.to_string()),
        ("page", page.max(1).to_string()),
        ("pageSize", page_size_param(page_size)),
        ("orgUnit", org_unit.to_string()),
        ("program", catalog.program.clone()),
        ("totalPages", "true".to_string()),
    ]
}

fn latest_query(catalog: &Catalog, org_unit: &str) -> Params {
    vec![
        ("fields", EVENT_FIELDS.to_string()),
        ("pageSize", LATEST_WINDOW.to_string()),
        ("orgUnit", org_unit.to_string()),
        ("program", catalog.program.clone()),
        ("order", "eventDate:desc".to_string()),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrganisationUnitsResponse {
    #[serde(default)]
    pager: Option<PagerInfo>,
    #[serde(default)]
    organisation_units: Vec<School>,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    pager: Option<PagerInfo>,
    #[serde(default)]
    events: Vec<Event>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportEnvelope {
    response: Option<ImportSummaries>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImportSummaries {
    #[serde(default)]
    import_summaries: Vec<ImportSummary>,
}

#[derive(Debug, Deserialize)]
struct ImportSummary {
    status: String,
    reference: Option<String>,
    description: Option<String>,
    #[serde(default)]
    conflicts: Vec<ImportConflict>,
}

#[derive(Debug, Deserialize)]
struct ImportConflict {
    object: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct CreatedEnvelope {
    response: Option<CreatedObject>,
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    uid: Option<String>,
}

fn fallback_pager(pager: Option<PagerInfo>, found: usize) -> PagerInfo {
    pager.unwrap_or(PagerInfo {
        page: 1,
        page_count: Some(1),
        total: Some(found as u64),
        page_size: found as u32,
    })
}

pub fn decode_schools(body: &str) -> Result<Page<School>, ApiError> {
    let decoded: OrganisationUnitsResponse = serde_json::from_str(body)?;
    let pager = fallback_pager(decoded.pager, decoded.organisation_units.len());
    Ok(Page {
        items: decoded.organisation_units,
        pager,
    })
}

/// Events of other programs registered on the same school are dropped.
pub fn decode_events(body: &str, catalog: &Catalog) -> Result<Page<Event>, ApiError> {
    let decoded: EventsResponse = serde_json::from_str(body)?;
    let pager = fallback_pager(decoded.pager, decoded.events.len());
    let items = decoded
        .events
        .into_iter()
        .filter(|event| event.program == catalog.program)
        .collect();
    Ok(Page { items, pager })
}

/// References of the imported events, or the first rejected summary.
pub fn decode_import(body: &str) -> Result<Vec<String>, ApiError> {
    let envelope: ImportEnvelope = serde_json::from_str(body)?;
    let summaries = envelope
        .response
        .map(|response| response.import_summaries)
        .unwrap_or_default();

    let mut references = Vec::new();
    for summary in summaries {
        if summary.status != "SUCCESS" {
            let mut message = summary
                .description
                .unwrap_or_else(|| format!("import status {}", summary.status));
            for conflict in &summary.conflicts {
                message.push_str(&format!("; {}: {}", conflict.object, conflict.value));
            }
            return Err(ApiError::Rejected {
                status: 409,
                message,
            });
        }
        references.extend(summary.reference);
    }
    Ok(references)
}

pub fn decode_created_uid(body: &str) -> Result<Option<String>, ApiError> {
    let envelope: CreatedEnvelope = serde_json::from_str(body)?;
    Ok(envelope.response.and_then(|created| created.uid))
}

pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|error| error.message)
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "An unexpected error occurred. Please try again.".to_string()
            } else {
                trimmed.chars().take(300).collect()
            }
        })
}

/// Async client for the handful of DHIS2 resources the inspections need.
pub struct Dhis2Client {
    http: Client,
    base_url: String,
    username: String,
    password: String,
    catalog: Catalog,
}

impl Dhis2Client {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            catalog: config.catalog.clone(),
        })
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    async fn get(&self, path: &str, params: &Params) -> Result<String, ApiError> {
        debug!(path, ?params, "GET");
        let response = self
            .http
            .get(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .query(params)
            .send()
            .await?;
        read_body(response).await
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<String, ApiError> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .basic_auth(&self.username, Some(&self.password))
            .json(body)
            .send()
            .await?;
        read_body(response).await
    }

    pub async fn search_schools(
        &self,
        search: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<Page<School>, ApiError> {
        let params = school_query(&self.catalog, search, page, page_size);
        let body = self.get("organisationUnits", &params).await?;
        decode_schools(&body)
    }

    pub async fn list_inspections(
        &self,
        org_unit: &str,
        page: u32,
        page_size: u32,
    ) -> Result<Page<Event>, ApiError> {
        let params = inspection_query(&self.catalog, org_unit, page, page_size);
        let body = self.get("events", &params).await?;
        decode_events(&body, &self.catalog)
    }

    pub async fn latest_inspection(&self, org_unit: &str) -> Result<Option<Event>, ApiError> {
        let params = latest_query(&self.catalog, org_unit);
        let body = self.get("events", &params).await?;
        let page = decode_events(&body, &self.catalog)?;
        Ok(latest_event(&page.items).cloned())
    }

    pub async fn fetch_inspection(&self, event_id: &str) -> Result<Event, ApiError> {
        let params = vec![("fields", EVENT_FIELDS.to_string())];
        let body = self.get(&format!("events/{event_id}"), &params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn create_inspection(&self, payload: &EventsPayload) -> Result<Vec<String>, ApiError> {
        let body = self.post("events", payload).await?;
        let references = decode_import(&body)?;
        info!(events = references.len(), "inspection stored");
        Ok(references)
    }

    pub async fn create_school(
        &self,
        payload: &OrganisationUnitPayload,
    ) -> Result<Option<String>, ApiError> {
        let body = self.post("organisationUnits", payload).await?;
        let uid = decode_created_uid(&body)?;
        info!(name = %payload.name, uid = ?uid, "school registered");
        Ok(uid)
    }
}

async fn read_body(response: Response) -> Result<String, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: error_message(&body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values_for<'a>(params: &'a Params, key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(name, _)| *name == key)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    #[test]
    fn school_query_filters_by_cluster_and_name() {
        let params = school_query(&Catalog::default(), Some("bo "), 2, 0);
        assert_eq!(
            values_for(&params, "filter"),
            vec!["parent.id:eq:Jj1IUjjPaWf", "name:ilike:bo"]
        );
        assert_eq!(values_for(&params, "pageSize"), vec!["10"]);
        assert_eq!(values_for(&params, "page"), vec!["2"]);
    }

    #[test]
    fn blank_search_adds_no_name_filter() {
        let params = school_query(&Catalog::default(), Some("  "), 1, 30);
        assert_eq!(values_for(&params, "filter").len(), 1);
        assert_eq!(values_for(&params, "pageSize"), vec!["30"]);
    }

    #[test]
    fn inspection_query_targets_the_program() {
        let params = inspection_query(&Catalog::default(), "ou1", 0, 20);
        assert_eq!(values_for(&params, "program"), vec!["UxK2o06ScIe"]);
        assert_eq!(values_for(&params, "orgUnit"), vec!["ou1"]);
        assert_eq!(values_for(&params, "page"), vec!["1"]);
        assert_eq!(values_for(&params, "totalPages"), vec!["true"]);
    }

    #[test]
    fn decodes_school_page() {
        let body = r#"{
            "pager": {"page": 1, "pageCount": 3, "total": 27, "pageSize": 10},
            "organisationUnits": [
                {"id": "ou1", "name": "Jambalaya Primary"},
                {"id": "ou2", "name": "Bo Town School"}
            ]
        }"#;
        let page = decode_schools(body).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.pager.total, Some(27));
    }

    #[test]
    fn decode_events_drops_other_programs() {
        let body = r#"{
            "pager": {"page": 1, "pageSize": 10, "total": 2},
            "events": [
                {"event": "ev1", "program": "UxK2o06ScIe", "eventDate": "2024-01-01T00:00:00.000"},
                {"event": "ev2", "program": "otherProg01", "eventDate": "2024-02-01T00:00:00.000"}
            ]
        }"#;
        let page = decode_events(body, &Catalog::default()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].event, "ev1");
    }

    #[test]
    fn unpaged_response_gets_a_pager() {
        let page = decode_schools(r#"{"organisationUnits": [{"id": "a", "name": "A"}]}"#).unwrap();
        assert_eq!(page.pager.total, Some(1));
    }

    #[test]
    fn import_summary_yields_references() {
        let body = r#"{
            "httpStatus": "OK",
            "response": {
                "importSummaries": [{"status": "SUCCESS", "reference": "ev9"}]
            }
        }"#;
        assert_eq!(decode_import(body).unwrap(), vec!["ev9".to_string()]);
    }

    #[test]
    fn import_conflicts_become_rejections() {
        let body = r#"{
            "response": {
                "importSummaries": [{
                    "status": "ERROR",
                    "description": "Event.orgUnit does not point to a valid organisation unit",
                    "conflicts": [{"object": "orgUnit", "value": "missing"}]
                }]
            }
        }"#;
        let err = decode_import(body).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("valid organisation unit"));
        assert!(message.contains("orgUnit: missing"));
    }

    #[test]
    fn created_uid_is_read_from_response() {
        let body = r#"{"httpStatus": "Created", "response": {"uid": "NewOu00001"}}"#;
        assert_eq!(decode_created_uid(body).unwrap(), Some("NewOu00001".to_string()));
    }

    #[test]
    fn error_message_prefers_platform_text() {
        assert_eq!(
            error_message(r#"{"httpStatus": "Unauthorized", "message": "Bad credentials"}"#),
            "Bad credentials"
        );
        assert_eq!(error_message("<html>gateway</html>"), "<html>gateway</html>");
        assert!(error_message("").contains("unexpected error"));
    }
}
