//! Department-option lookups and page fetches for the batch categories.
//!
//! Three registrar services are involved:
//! - the course catalogue A–Z index (department → catalogue page URL),
//! - the prerequisite search form (listing term + department values),
//! - the schedule of classes search form (current term + department values).

use tracing::{debug, info, instrument};
use url::Url;

use regfetch_shared::{
    DepartmentOptions, EndpointsConfig, ExtractFailure, FetchConfig, RegfetchError, Result, Term,
};

use crate::form::FormBody;
use crate::options;
use crate::session::SessionClient;

/// Department dropdown name on the schedule search form.
const WEBSOC_DEPT_FIELD: &str = "Dept";
/// Term dropdown name on the schedule search form.
const WEBSOC_TERM_FIELD: &str = "YearTerm";
/// Department dropdown name on the prerequisite search form.
const PREREQ_DEPT_FIELD: &str = "dept";
/// Term field name on the prerequisite search form.
const PREREQ_TERM_FIELD: &str = "term";

/// Prerequisite search form contents.
#[derive(Debug, Clone)]
pub struct PrerequisiteListing {
    /// Opaque term value the prerequisite service expects back.
    pub term: String,
    pub departments: DepartmentOptions,
}

/// Schedule search form contents.
#[derive(Debug, Clone)]
pub struct ScheduleListing {
    /// Term the schedule service currently defaults to.
    pub term: Term,
    pub departments: DepartmentOptions,
}

/// Client for the registrar's public catalogue, prerequisite and schedule pages.
#[derive(Debug, Clone)]
pub struct Registrar {
    session: SessionClient,
    endpoints: EndpointsConfig,
}

impl Registrar {
    pub fn new(session: SessionClient, endpoints: EndpointsConfig) -> Self {
        Self { session, endpoints }
    }

    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        Ok(Self::new(
            SessionClient::new(config.timeout)?,
            config.endpoints.clone(),
        ))
    }

    // -----------------------------------------------------------------------
    // Catalogue
    // -----------------------------------------------------------------------

    /// Department code → catalogue page URL.
    #[instrument(skip_all)]
    pub async fn catalogue_departments(&self) -> Result<DepartmentOptions> {
        let url = &self.endpoints.catalogue_url;
        let base = Url::parse(url)
            .map_err(|e| RegfetchError::config(format!("catalogue_url `{url}`: {e}")))?;

        let html = self.session.get(url).await?.into_ok_body()?;
        let departments = non_empty(
            "catalogue departments",
            options::catalogue_index(&html, &base),
        )?;

        info!(count = departments.len(), "catalogue departments resolved");
        Ok(departments)
    }

    /// One department's catalogue page.
    pub async fn fetch_catalogue(&self, page_url: &str) -> Result<String> {
        self.session.get(page_url).await?.into_ok_body()
    }

    // -----------------------------------------------------------------------
    // Prerequisites
    // -----------------------------------------------------------------------

    /// Listing term and department values from the prerequisite search form.
    #[instrument(skip_all)]
    pub async fn prerequisite_departments(&self) -> Result<PrerequisiteListing> {
        let html = self
            .session
            .get(&self.endpoints.prereqs_url)
            .await?
            .into_ok_body()?;

        let term = options::selected_value(&html, PREREQ_TERM_FIELD).ok_or_else(|| {
            RegfetchError::extraction("prerequisite term", ExtractFailure::NoMatch)
        })?;
        let departments = non_empty(
            "prerequisite departments",
            options::department_select(&html, PREREQ_DEPT_FIELD),
        )?;

        info!(%term, count = departments.len(), "prerequisite departments resolved");
        Ok(PrerequisiteListing { term, departments })
    }

    /// One department's prerequisite page.
    pub async fn fetch_prerequisites(&self, term: &str, option: &str) -> Result<String> {
        let raw = &self.endpoints.prereqs_url;
        let mut url = Url::parse(raw)
            .map_err(|e| RegfetchError::config(format!("prereqs_url `{raw}`: {e}")))?;
        url.query_pairs_mut()
            .append_pair("term", term)
            .append_pair("dept", option)
            .append_pair("action", "view_by_term");

        self.session.get(url.as_str()).await?.into_ok_body()
    }

    // -----------------------------------------------------------------------
    // Schedules
    // -----------------------------------------------------------------------

    /// Current term and department values from the schedule search form.
    #[instrument(skip_all)]
    pub async fn schedule_departments(&self) -> Result<ScheduleListing> {
        let html = self
            .session
            .get(&self.endpoints.websoc_url)
            .await?
            .into_ok_body()?;

        let raw_term = options::selected_value(&html, WEBSOC_TERM_FIELD)
            .ok_or_else(|| RegfetchError::extraction("schedule term", ExtractFailure::NoMatch))?;
        let term: Term = raw_term.parse().map_err(|_| {
            RegfetchError::extraction(
                "schedule term",
                ExtractFailure::MalformedDocument(format!("unrecognised term code `{raw_term}`")),
            )
        })?;
        let departments = non_empty(
            "schedule departments",
            options::department_select(&html, WEBSOC_DEPT_FIELD),
        )?;

        info!(%term, count = departments.len(), "schedule departments resolved");
        Ok(ScheduleListing { term, departments })
    }

    /// One department's schedule of classes for `term`, as plain text.
    pub async fn fetch_schedule(&self, term: &Term, option: &str) -> Result<String> {
        debug!(%term, option, "requesting schedule text");
        let body = schedule_form(term, option);
        self.session
            .post_form(&self.endpoints.websoc_url, None, &body)
            .await?
            .into_ok_body()
    }
}

/// The text-results form of the schedule search page.
fn schedule_form(term: &Term, option: &str) -> FormBody {
    FormBody::new()
        .encoded("Submit", "Display Text Results")
        .field("YearTerm", term.code())
        .field("ShowComments", "on")
        .field("ShowFinals", "on")
        .field("Breadth", "ANY")
        .encoded("Dept", option)
        .field("CourseNum", "")
        .field("Division", "ANY")
        .field("CourseCodes", "")
        .field("InstrName", "")
        .field("CourseTitle", "")
        .field("ClassType", "ALL")
        .field("Units", "")
        .field("Days", "")
        .field("StartTime", "")
        .field("EndTime", "")
        .field("FullCourses", "ANY")
        .field("CancelledCourses", "Exclude")
}

fn non_empty(field: &str, departments: DepartmentOptions) -> Result<DepartmentOptions> {
    if departments.is_empty() {
        return Err(RegfetchError::extraction(field, ExtractFailure::NoMatch));
    }
    Ok(departments)
}
