//! Degree-audit retrieval: identity → program attributes → audit document.
//!
//! Each stage is one POST against the audit service with the caller's
//! session cookie, and each stage's request is built from fields scraped out
//! of the previous response. A stage whose response lacks a field fails
//! outright; later stages never run with partial input.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use regfetch_client::{FormBody, SessionClient};
use regfetch_extract::{FieldPattern, LookupTables};
use regfetch_shared::{
    CodedLabel, EndpointsConfig, FetchConfig, ProgramAttributes, Result, SessionCredential,
    StudentId, StudentRecord,
};

/// Hidden `STUID` input on the student-context page.
static STUDENT_ID: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "student_id",
        Regex::new(r#"<input type="hidden" name="STUID" value="(?P<student_id>\d*)">"#)
            .expect("student id regex"),
    )
});

/// Goal attributes and the major code inside the `<StudentData>` block.
static PROGRAM: LazyLock<FieldPattern> = LazyLock::new(|| {
    FieldPattern::new(
        "program_attributes",
        Regex::new(concat!(
            r#"(?s)<GoalDtl\b[^>]*?\bSchool="(?P<school>[^"]*)""#,
            r#"[^>]*?\bDegree="(?P<degree_code>[^"]*)""#,
            r#"[^>]*?\bStuLevel="(?P<student_level_code>[^"]*)""#,
            r#".*?<GoalDataDtl\b[^>]*?\bGoalCode="MAJOR"[^>]*?\bGoalValue="(?P<major_code>[^"]*)""#,
        ))
        .expect("program attributes regex"),
    )
});

const STUDENT_DATA_OPEN: &str = "<StudentData>";
const STUDENT_DATA_CLOSE: &str = "</StudentData>";

const LEVEL_TABLE: &str = "Level";
const DEGREE_TABLE: &str = "Degree";
const MAJOR_TABLE: &str = "Major";

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Extract the student id from the student-context page.
pub fn parse_student_id(body: &str) -> Result<StudentId> {
    let raw = STUDENT_ID.extract_one(body, "student_id")?;
    StudentId::parse(&raw)
}

/// Extract program codes from the student-details page and resolve their
/// labels through the page's picklists.
pub fn parse_program(body: &str) -> Result<ProgramAttributes> {
    let fields = PROGRAM.extract_within(body, STUDENT_DATA_OPEN, STUDENT_DATA_CLOSE)?;
    let tables = LookupTables::parse(body);

    let coded = |table: &str, group: &str| -> Result<CodedLabel> {
        let code = fields.require(group)?.trim();
        let label = tables.lookup(table, code)?;
        Ok(CodedLabel {
            code: code.to_string(),
            label: label.to_string(),
        })
    };

    Ok(ProgramAttributes {
        school: fields.require("school")?.trim().to_string(),
        degree: coded(DEGREE_TABLE, "degree_code")?,
        level: coded(LEVEL_TABLE, "student_level_code")?,
        major: coded(MAJOR_TABLE, "major_code")?,
    })
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

fn student_context_form() -> FormBody {
    FormBody::new()
        .field("SERVICE", "SCRIPTER")
        .field("SCRIPT", "SD2STUCON")
}

fn student_details_form(student_id: &StudentId) -> FormBody {
    FormBody::new()
        .field("SERVICE", "SCRIPTER")
        .field("SCRIPT", "SD2STUGID")
        .field("STUID", student_id.as_str())
        .field("DEBUG", "OFF")
}

/// The final audit request, built from a fully resolved [`StudentRecord`].
#[derive(Debug, Clone, Copy)]
pub struct AuditRequest<'a> {
    record: &'a StudentRecord,
}

impl<'a> AuditRequest<'a> {
    pub fn from_record(record: &'a StudentRecord) -> Self {
        Self { record }
    }

    /// The audit service's fixed-shape report form. Field order matters.
    pub fn to_form_body(&self) -> FormBody {
        let id = self.record.student_id.as_str();
        let program = &self.record.program;

        FormBody::new()
            .field("SERVICE", "SCRIPTER")
            .field("REPORT", "WEB31")
            .encoded("SCRIPT", "SD2GETAUD&ContentType=xml")
            .field("USERID", id)
            .field("USERCLASS", "STU")
            .field("BROWSER", "NOT-NAV4")
            .field("ACTION", "REVAUDIT")
            .flag("AUDITTYPE")
            .field("DEGREETERM", "ACTV")
            .flag("INTNOTES")
            .field("INPROGRESS", "N")
            .field("CUTOFFTERM", "ACTV")
            .field("REFRESHBRDG", "N")
            .flag("AUDITID")
            .field("JSERRORCALL", "SetError")
            .flag("NOTENUM")
            .flag("NOTETEXT")
            .flag("NOTEMODE")
            .flag("PENDING")
            .flag("INTERNAL")
            .field("RELOADSEP", "TRUE")
            .flag("PRELOADEDPLAN")
            .field("ContentType", "xml")
            .field("STUID", id)
            .field("SCHOOL", program.school.as_str())
            .field("STUSCH", program.school.as_str())
            .field("DEGREE", program.degree.code.as_str())
            .field("STUDEG", program.degree.code.as_str())
            .field("STUDEGLIT", program.degree.label.as_str())
            .flag("STUDI")
            .label("STULVL", &program.level.label)
            .label("STUMAJLIT", &program.major.label)
            .flag("STUCATYEAR")
            .flag("CLASSES")
            .field("DEBUG", "OFF")
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The audit document and the record it was requested for.
#[derive(Debug, Clone)]
pub struct AuditDocument {
    pub record: StudentRecord,
    /// Response body, verbatim.
    pub body: String,
}

/// Runs the audit stages against one audit-service endpoint with one credential.
#[derive(Debug, Clone)]
pub struct AuditPipeline {
    session: SessionClient,
    endpoint: String,
    credential: SessionCredential,
}

impl AuditPipeline {
    pub fn new(
        session: SessionClient,
        endpoints: &EndpointsConfig,
        credential: SessionCredential,
    ) -> Self {
        Self {
            session,
            endpoint: endpoints.degreeworks_url.clone(),
            credential,
        }
    }

    pub fn from_config(config: &FetchConfig, credential: SessionCredential) -> Result<Self> {
        Ok(Self::new(
            SessionClient::new(config.timeout)?,
            &config.endpoints,
            credential,
        ))
    }

    /// Stage 1: the student id bound to the session.
    pub async fn resolve_student_id(&self) -> Result<StudentId> {
        let body = self.post(&student_context_form()).await?;
        let student_id = parse_student_id(&body)?;
        debug!("student id resolved from session");
        Ok(student_id)
    }

    /// Stage 2: school, degree, level and major with their labels.
    pub async fn resolve_program(&self, student_id: &StudentId) -> Result<ProgramAttributes> {
        let body = self.post(&student_details_form(student_id)).await?;
        let program = parse_program(&body)?;
        debug!(
            school = %program.school,
            degree = %program.degree.code,
            level = %program.level.code,
            major = %program.major.code,
            "program attributes resolved"
        );
        Ok(program)
    }

    /// Stage 3: the audit document itself, verbatim.
    pub async fn fetch_audit(&self, record: &StudentRecord) -> Result<String> {
        let form = AuditRequest::from_record(record).to_form_body();
        self.post(&form).await
    }

    /// Run every stage. With `student_id` given, stage 1 is skipped.
    #[instrument(skip_all, fields(supplied_id = student_id.is_some()))]
    pub async fn retrieve(&self, student_id: Option<StudentId>) -> Result<AuditDocument> {
        let student_id = match student_id {
            Some(id) => id,
            None => self.resolve_student_id().await?,
        };
        let program = self.resolve_program(&student_id).await?;
        let record = StudentRecord {
            student_id,
            program,
        };

        let body = self.fetch_audit(&record).await?;
        info!(bytes = body.len(), "audit document retrieved");

        Ok(AuditDocument { record, body })
    }

    async fn post(&self, form: &FormBody) -> Result<String> {
        self.session
            .post_form(&self.endpoint, Some(&self.credential), form)
            .await?
            .into_ok_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use regfetch_shared::{ExtractFailure, RegfetchError};
    use wiremock::matchers::{body_string, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("../../../fixtures/html/{name}")).expect("fixture")
    }

    fn record() -> StudentRecord {
        StudentRecord {
            student_id: StudentId::parse("12345678").unwrap(),
            program: ProgramAttributes {
                school: "U".into(),
                degree: CodedLabel {
                    code: "BS".into(),
                    label: "Bachelor of Science".into(),
                },
                level: CodedLabel {
                    code: "3".into(),
                    label: "Junior".into(),
                },
                major: CodedLabel {
                    code: "0K5".into(),
                    label: "Computer Sci &amp; Engineering".into(),
                },
            },
        }
    }

    fn pipeline(server: &MockServer) -> AuditPipeline {
        let endpoints = EndpointsConfig {
            degreeworks_url: format!("{}/dgw/IRISLink.cgi", server.uri()),
            ..EndpointsConfig::default()
        };
        AuditPipeline::new(
            SessionClient::new(Duration::from_secs(5)).unwrap(),
            &endpoints,
            SessionCredential::new("NAME=value").unwrap(),
        )
    }

    #[test]
    fn student_id_from_context_page() {
        let id = parse_student_id(&fixture("student-context.html")).unwrap();
        assert_eq!(id.as_str(), "12345678");
    }

    #[test]
    fn empty_student_id_is_rejected() {
        let body = r#"<input type="hidden" name="STUID" value="">"#;
        let err = parse_student_id(body).unwrap_err();
        assert!(matches!(
            err,
            RegfetchError::Extraction { reason: ExtractFailure::EmptyCapture(_), .. }
        ));
    }

    #[test]
    fn program_from_details_page() {
        let program = parse_program(&fixture("student-details.html")).unwrap();
        assert_eq!(program.school, "U");
        assert_eq!(program.degree.code, "BS");
        assert_eq!(program.degree.label, "Bachelor of Science");
        assert_eq!(program.level.label, "Junior");
        assert_eq!(program.major.code, "0K5");
        assert_eq!(program.major.label, "Computer Sci &amp; Engineering");
    }

    #[test]
    fn program_without_student_data_is_no_match() {
        let err = parse_program("<html><GoalDtl School=\"U\"></GoalDtl></html>").unwrap_err();
        assert!(matches!(
            err,
            RegfetchError::Extraction { reason: ExtractFailure::NoMatch, .. }
        ));
    }

    #[test]
    fn truncated_student_data_is_malformed() {
        let body = fixture("student-details.html").replace("</StudentData>", "");
        let err = parse_program(&body).unwrap_err();
        assert!(matches!(
            err,
            RegfetchError::Extraction { reason: ExtractFailure::MalformedDocument(_), .. }
        ));
    }

    #[test]
    fn unknown_major_code_is_reported() {
        let body = fixture("student-details.html")
            .replace("GoalValue=\"0K5\"", "GoalValue=\"999\"");
        let RegfetchError::Extraction { reason, .. } = parse_program(&body).unwrap_err() else {
            panic!("expected an extraction failure");
        };
        assert_eq!(reason, ExtractFailure::UnknownCode("999".into()));
    }

    #[test]
    fn audit_form_shape() {
        let body = AuditRequest::from_record(&record()).to_form_body().to_string();
        assert!(body.starts_with(
            "SERVICE=SCRIPTER&REPORT=WEB31&SCRIPT=SD2GETAUD%26ContentType%3Dxml&USERID=12345678&"
        ));
        assert!(body.contains("&ACTION=REVAUDIT&AUDITTYPE&DEGREETERM=ACTV&INTNOTES&"));
        assert!(body.contains(
            "&STUID=12345678&SCHOOL=U&STUSCH=U&DEGREE=BS&STUDEG=BS&STUDEGLIT=Bachelor of Science&STUDI&"
        ));
        assert!(body.contains("&STULVL=Junior&STUMAJLIT=Computer+Sci+%26+Engineering&"));
        assert!(body.ends_with("&STUCATYEAR&CLASSES&DEBUG=OFF"));
    }

    #[tokio::test]
    async fn retrieve_runs_all_stages() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/dgw/IRISLink.cgi"))
            .and(header("cookie", "NAME=value"))
            .and(body_string("SERVICE=SCRIPTER&SCRIPT=SD2STUCON"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("student-context.html")),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/dgw/IRISLink.cgi"))
            .and(body_string("SERVICE=SCRIPTER&SCRIPT=SD2STUGID&STUID=12345678&DEBUG=OFF"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("student-details.html")),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/dgw/IRISLink.cgi"))
            .and(body_string_contains("REPORT=WEB31"))
            .and(body_string_contains("STUMAJLIT=Computer+Sci+%26+Engineering"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<Audit/>"))
            .expect(1)
            .mount(&server)
            .await;

        let document = pipeline(&server).retrieve(None).await.unwrap();
        assert_eq!(document.body, "<Audit/>");
        assert_eq!(document.record.student_id.as_str(), "12345678");
        assert_eq!(document.record.program.level.code, "3");
    }

    #[tokio::test]
    async fn supplied_id_skips_identity_stage() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string_contains("SCRIPT=SD2STUCON"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_string_contains("SCRIPT=SD2STUGID&STUID=87654321"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("student-details.html")),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_string_contains("REPORT=WEB31"))
            .and(body_string_contains("USERID=87654321"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<Audit/>"))
            .expect(1)
            .mount(&server)
            .await;

        let id = StudentId::parse("87654321").unwrap();
        let document = pipeline(&server).retrieve(Some(id)).await.unwrap();
        assert_eq!(document.body, "<Audit/>");
    }

    #[tokio::test]
    async fn missing_hidden_field_stops_pipeline() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_string("SERVICE=SCRIPTER&SCRIPT=SD2STUCON"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Please log in</html>"))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_string_contains("SCRIPT=SD2STUGID"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(body_string_contains("REPORT=WEB31"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = pipeline(&server).retrieve(None).await.unwrap_err();
        assert!(err.is_extraction());
    }

    #[tokio::test]
    async fn non_200_is_a_protocol_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(302))
            .mount(&server)
            .await;

        let err = pipeline(&server).resolve_student_id().await.unwrap_err();
        assert!(matches!(err, RegfetchError::Protocol { status: 302, .. }));
    }
}
