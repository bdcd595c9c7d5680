//! Expanding a batch request into an ordered list of department tasks.

use tracing::{debug, info, instrument};

use regfetch_client::{Registrar, ScheduleListing};
use regfetch_shared::term::{current_academic_year, is_academic_term_now, spring_term};
use regfetch_shared::{DepartmentOptions, DepartmentTask, Result, Term};

/// Which registrar service a batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Catalogue,
    Prerequisites,
    Schedules,
}

/// A batch request as given on the command line.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    pub kind: BatchKind,
    /// Department subset; empty means every department the service lists.
    pub departments: Vec<String>,
    /// Schedules only: also fetch historical terms.
    pub archive: bool,
    /// Academic years the archive walk spans.
    pub archive_years: u32,
}

/// How the scheduler fetches each task of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCategory {
    /// Task option is the department's catalogue page URL.
    Catalogue,
    /// Task option is the prerequisite form's department value.
    Prerequisites { term: String },
    /// Task option is the schedule form's department value; each task has a term.
    Schedules { archive: bool },
}

/// Tasks ready for the scheduler.
#[derive(Debug, Clone)]
pub struct FetchPlan {
    pub category: FetchCategory,
    pub tasks: Vec<DepartmentTask>,
}

/// Outcome of enumeration.
#[derive(Debug, Clone)]
pub enum Enumeration {
    Ready(FetchPlan),
    /// The schedule service's current term is not an in-session quarter.
    NotInSession(Term),
}

/// Resolve the department mapping for `request` and expand it into tasks.
#[instrument(skip_all, fields(kind = ?request.kind, archive = request.archive))]
pub async fn enumerate(registrar: &Registrar, request: &BatchRequest) -> Result<Enumeration> {
    let enumeration = match request.kind {
        BatchKind::Catalogue => {
            let options = registrar.catalogue_departments().await?;
            Enumeration::Ready(FetchPlan {
                category: FetchCategory::Catalogue,
                tasks: select_departments(&options, &request.departments, None),
            })
        }
        BatchKind::Prerequisites => {
            let listing = registrar.prerequisite_departments().await?;
            Enumeration::Ready(FetchPlan {
                tasks: select_departments(&listing.departments, &request.departments, None),
                category: FetchCategory::Prerequisites { term: listing.term },
            })
        }
        BatchKind::Schedules => {
            let listing = registrar.schedule_departments().await?;
            let archive_years = request.archive.then_some(request.archive_years);
            let in_session = is_academic_term_now(&listing.term);
            plan_schedules(
                &listing,
                &request.departments,
                archive_years,
                in_session,
                current_academic_year(),
            )
        }
    };

    if let Enumeration::Ready(plan) = &enumeration {
        info!(tasks = plan.tasks.len(), "work enumerated");
    }
    Ok(enumeration)
}

/// One task per selected department.
///
/// With an empty `filter` every department in `options` is selected, in code
/// order. Otherwise the filter's order is kept and codes the service does not
/// list are dropped.
pub fn select_departments(
    options: &DepartmentOptions,
    filter: &[String],
    term: Option<&Term>,
) -> Vec<DepartmentTask> {
    let task = |department: &str, option: &str| DepartmentTask {
        term: term.cloned(),
        department: department.to_string(),
        option: option.to_string(),
    };

    if filter.is_empty() {
        return options
            .iter()
            .map(|(dept, option)| task(dept.as_str(), option.as_str()))
            .collect();
    }

    filter
        .iter()
        .filter_map(|dept| match options.get(dept) {
            Some(option) => Some(task(dept.as_str(), option.as_str())),
            None => {
                debug!(department = %dept, "department not listed by the service, dropped");
                None
            }
        })
        .collect()
}

/// Historical terms for an archive fetch, newest first.
///
/// Walks back one quarter at a time from the Spring quarter closing
/// `academic_year`, for `years` academic years, keeping only terms at or
/// before `current`.
pub fn archive_terms(current: &Term, academic_year: i32, years: u32) -> Vec<Term> {
    let mut terms = Vec::new();
    let mut term = spring_term(academic_year);
    for _ in 0..years.saturating_mul(3) {
        if term <= *current {
            terms.push(term.clone());
        }
        term = term.previous();
    }
    terms
}

/// Schedule tasks for the service's current term, or for the archive walk.
///
/// `in_session` says whether the listed term is the quarter running now and
/// `academic_year` is the academic year in progress.
pub fn plan_schedules(
    listing: &ScheduleListing,
    filter: &[String],
    archive_years: Option<u32>,
    in_session: bool,
    academic_year: i32,
) -> Enumeration {
    let current = &listing.term;
    if !in_session {
        info!(term = %current, "current term is not in session");
        return Enumeration::NotInSession(current.clone());
    }

    let terms = match archive_years {
        Some(years) => archive_terms(current, academic_year, years),
        None => vec![current.clone()],
    };
    debug!(terms = terms.len(), "schedule terms selected");

    let tasks = terms
        .iter()
        .flat_map(|term| select_departments(&listing.departments, filter, Some(term)))
        .collect();

    Enumeration::Ready(FetchPlan {
        category: FetchCategory::Schedules {
            archive: archive_years.is_some(),
        },
        tasks,
    })
}
