use std::rc::Rc;
use tracing::{debug, info};

use crate::error::Result;
use crate::ids::{Clock, IdGenerator};
use crate::models::{
    Application, ApplicationStatus, Job, JobType, JobUpdate, NewApplication, NewJob,
};
use crate::seed::sample_jobs;
use crate::storage::{APPLICATIONS_KEY, JOBS_KEY, KeyValueStore, read_json, write_json};

/// Owns the job catalog and the application list.
pub struct JobBoard {
    jobs: Vec<Job>,
    applications: Vec<Application>,
    storage: Rc<dyn KeyValueStore>,
    ids: Rc<dyn IdGenerator>,
    clock: Rc<dyn Clock>,
}

impl JobBoard {
    /// Reads both collections once. A missing catalog is seeded with the sample
    /// jobs and written back immediately.
    pub fn load(
        storage: Rc<dyn KeyValueStore>,
        ids: Rc<dyn IdGenerator>,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        let jobs = match read_json::<Vec<Job>>(storage.as_ref(), JOBS_KEY)? {
            Some(jobs) => jobs,
            None => {
                let jobs = sample_jobs();
                write_json(storage.as_ref(), JOBS_KEY, &jobs)?;
                info!(count = jobs.len(), "seeded sample jobs");
                jobs
            }
        };
        let applications: Vec<Application> =
            read_json(storage.as_ref(), APPLICATIONS_KEY)?.unwrap_or_default();

        for id in jobs.iter().map(|j| &j.id).chain(applications.iter().map(|a| &a.id)) {
            ids.reserve(id);
        }
        debug!(jobs = jobs.len(), applications = applications.len(), "loaded job board");

        Ok(Self {
            jobs,
            applications,
            storage,
            ids,
            clock,
        })
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    // --- Job operations ---

    /// No field validation happens here; an empty title is accepted.
    pub fn add_job(&mut self, new_job: NewJob) -> Result<Job> {
        let job = new_job.into_job(self.ids.next_id(), self.clock.today());
        self.jobs.push(job.clone());
        self.save_jobs()?;
        info!(job_id = %job.id, employer_id = %job.employer_id, "added job");
        Ok(job)
    }

    /// Returns whether a job matched. The catalog is written either way.
    pub fn update_job(&mut self, id: &str, update: &JobUpdate) -> Result<bool> {
        let found = match self.jobs.iter_mut().find(|j| j.id == id) {
            Some(job) => {
                update.apply_to(job);
                true
            }
            None => false,
        };
        self.save_jobs()?;
        info!(job_id = id, found, "updated job");
        Ok(found)
    }

    /// Applications that reference the job are left in place.
    pub fn delete_job(&mut self, id: &str) -> Result<bool> {
        let before = self.jobs.len();
        self.jobs.retain(|j| j.id != id);
        let removed = self.jobs.len() != before;
        self.save_jobs()?;
        info!(job_id = id, removed, "deleted job");
        Ok(removed)
    }

    pub fn get_job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }

    pub fn jobs_by_employer(&self, employer_id: &str) -> Vec<&Job> {
        jobs_by_employer(&self.jobs, employer_id)
    }

    pub fn search_jobs(
        &self,
        query: &str,
        location: Option<&str>,
        job_type: Option<JobType>,
    ) -> Vec<&Job> {
        search_jobs(&self.jobs, query, location, job_type)
    }

    pub fn featured_jobs(&self, limit: usize) -> Vec<&Job> {
        featured_jobs(&self.jobs, limit)
    }

    // --- Application operations ---

    /// Always stored as pending; duplicates for the same job are allowed.
    pub fn add_application(&mut self, new_application: NewApplication) -> Result<Application> {
        let application = new_application.into_application(self.ids.next_id(), self.clock.today());
        self.applications.push(application.clone());
        self.save_applications()?;
        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            candidate_id = %application.candidate_id,
            "added application"
        );
        Ok(application)
    }

    pub fn update_application_status(
        &mut self,
        id: &str,
        status: ApplicationStatus,
    ) -> Result<bool> {
        let found = match self.applications.iter_mut().find(|a| a.id == id) {
            Some(application) => {
                application.status = status;
                true
            }
            None => false,
        };
        self.save_applications()?;
        info!(application_id = id, %status, found, "updated application status");
        Ok(found)
    }

    pub fn applications_by_candidate(&self, candidate_id: &str) -> Vec<&Application> {
        applications_by_candidate(&self.applications, candidate_id)
    }

    pub fn applications_by_job(&self, job_id: &str) -> Vec<&Application> {
        applications_by_job(&self.applications, job_id)
    }

    pub fn applied_jobs(&self, candidate_id: &str) -> Vec<&Job> {
        let mine = self.applications_by_candidate(candidate_id);
        self.jobs
            .iter()
            .filter(|job| mine.iter().any(|a| a.job_id == job.id))
            .collect()
    }

    /// Status of the candidate's first application to the job.
    pub fn application_status(
        &self,
        candidate_id: &str,
        job_id: &str,
    ) -> Option<ApplicationStatus> {
        self.applications
            .iter()
            .find(|a| a.candidate_id == candidate_id && a.job_id == job_id)
            .map(|a| a.status)
    }

    pub fn application_count_for_employer(&self, employer_id: &str) -> usize {
        self.jobs_by_employer(employer_id)
            .iter()
            .map(|job| self.applications_by_job(&job.id).len())
            .sum()
    }

    /// Applications whose job has since been deleted.
    pub fn orphaned_applications(&self) -> Vec<&Application> {
        self.applications
            .iter()
            .filter(|a| self.get_job(&a.job_id).is_none())
            .collect()
    }

    fn save_jobs(&self) -> Result<()> {
        write_json(self.storage.as_ref(), JOBS_KEY, &self.jobs)
    }

    fn save_applications(&self) -> Result<()> {
        write_json(self.storage.as_ref(), APPLICATIONS_KEY, &self.applications)
    }
}

// --- Queries over plain slices ---

pub fn jobs_by_employer<'a>(jobs: &'a [Job], employer_id: &str) -> Vec<&'a Job> {
    jobs.iter().filter(|j| j.employer_id == employer_id).collect()
}

pub fn applications_by_candidate<'a>(
    applications: &'a [Application],
    candidate_id: &str,
) -> Vec<&'a Application> {
    applications.iter().filter(|a| a.candidate_id == candidate_id).collect()
}

pub fn applications_by_job<'a>(
    applications: &'a [Application],
    job_id: &str,
) -> Vec<&'a Application> {
    applications.iter().filter(|a| a.job_id == job_id).collect()
}

/// All supplied criteria must hold. `query` is matched case-insensitively
/// against title, company and description; `location` case-insensitively
/// against location; `job_type` exactly. Empty strings match everything.
pub fn search_jobs<'a>(
    jobs: &'a [Job],
    query: &str,
    location: Option<&str>,
    job_type: Option<JobType>,
) -> Vec<&'a Job> {
    let query = query.to_lowercase();
    let location = location.map(str::to_lowercase).filter(|l| !l.is_empty());

    jobs.iter()
        .filter(|job| {
            query.is_empty()
                || job.title.to_lowercase().contains(&query)
                || job.company.to_lowercase().contains(&query)
                || job.description.to_lowercase().contains(&query)
        })
        .filter(|job| match &location {
            Some(loc) => job.location.to_lowercase().contains(loc),
            None => true,
        })
        .filter(|job| job_type.is_none_or(|t| job.job_type == t))
        .collect()
}

pub fn featured_jobs(jobs: &[Job], limit: usize) -> Vec<&Job> {
    jobs.iter().filter(|j| j.featured).take(limit).collect()
}

/// One page of a result list. Pages are numbered from 1.
#[derive(Debug, PartialEq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> Page<'_, T> {
    let per_page = per_page.max(1);
    let total_pages = items.len().div_ceil(per_page);
    let start = page.saturating_sub(1).saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    let items_on_page = if page == 0 { &items[..0] } else { &items[start..end] };
    Page {
        items: items_on_page,
        page,
        total_items: items.len(),
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::TimestampIds;
    use crate::ids::testing::{FixedClock, SequentialIds};
    use crate::storage::testing::RecordingStore;
    use chrono::NaiveDate;

    fn board() -> (Rc<RecordingStore>, JobBoard) {
        let storage = Rc::new(RecordingStore::default());
        let board = JobBoard::load(
            storage.clone(),
            Rc::new(SequentialIds::default()),
            Rc::new(FixedClock::default()),
        )
        .unwrap();
        (storage, board)
    }

    fn new_job(title: &str, employer_id: &str) -> NewJob {
        NewJob {
            title: title.to_string(),
            company: "Acme".to_string(),
            location: "Berlin, DE".to_string(),
            job_type: JobType::Contract,
            salary: "negotiable".to_string(),
            description: "Keep the lights on".to_string(),
            requirements: vec!["Rust".to_string()],
            benefits: vec![],
            employer_id: employer_id.to_string(),
            featured: false,
        }
    }

    fn new_application(job_id: &str, candidate_id: &str) -> NewApplication {
        NewApplication {
            job_id: job_id.to_string(),
            candidate_id: candidate_id.to_string(),
            candidate_name: "Ada".to_string(),
            candidate_email: "ada@example.com".to_string(),
            resume: "ada.pdf".to_string(),
            cover_letter: "Hello".to_string(),
        }
    }

    fn titles(jobs: &[&Job]) -> Vec<String> {
        jobs.iter().map(|j| j.title.clone()).collect()
    }

    #[test]
    fn test_first_load_seeds_and_persists_sample_jobs() {
        let (storage, board) = board();
        assert_eq!(board.jobs().len(), 3);
        assert!(board.applications().is_empty());
        assert!(storage.raw(JOBS_KEY).unwrap().contains("Senior Frontend Developer"));
        assert!(storage.raw(APPLICATIONS_KEY).is_none());
    }

    #[test]
    fn test_existing_catalog_is_not_reseeded() {
        let storage = Rc::new(RecordingStore::default());
        storage.put(JOBS_KEY, "[]");
        let board = JobBoard::load(
            storage.clone(),
            Rc::new(SequentialIds::default()),
            Rc::new(FixedClock::default()),
        )
        .unwrap();
        assert!(board.jobs().is_empty());
        assert!(storage.writes.borrow().is_empty());
    }

    #[test]
    fn test_add_job_assigns_id_and_date() {
        let (_, mut board) = board();
        let job = board.add_job(new_job("", "e9")).unwrap();
        assert_eq!(job.id, "100");
        assert_eq!(job.posted_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(job.title, "");

        let mine = board.jobs_by_employer("e9");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].id, job.id);

        assert!(board.delete_job(&job.id).unwrap());
        assert!(board.jobs_by_employer("e9").is_empty());
    }

    #[test]
    fn test_update_job_merges_fields() {
        let (storage, mut board) = board();
        let update = JobUpdate {
            salary: Some("$200,000".to_string()),
            featured: Some(false),
            ..Default::default()
        };
        assert!(board.update_job("1", &update).unwrap());
        let job = board.get_job("1").unwrap();
        assert_eq!(job.salary, "$200,000");
        assert!(!job.featured);
        assert_eq!(job.title, "Senior Frontend Developer");
        assert!(storage.raw(JOBS_KEY).unwrap().contains("$200,000"));
    }

    #[test]
    fn test_missing_ids_are_silent_noops_that_still_persist() {
        let (storage, mut board) = board();
        storage.writes.borrow_mut().clear();

        assert!(!board.update_job("nope", &JobUpdate::default()).unwrap());
        assert!(!board.delete_job("nope").unwrap());
        assert!(!board.update_application_status("nope", ApplicationStatus::Hired).unwrap());
        assert_eq!(board.jobs().len(), 3);
        assert_eq!(*storage.writes.borrow(), vec!["jobs", "jobs", "applications"]);
    }

    #[test]
    fn test_search_by_query_matches_title_case_insensitively() {
        let (_, board) = board();
        let results = board.search_jobs("frontend", Some(""), None);
        assert_eq!(titles(&results), vec!["Senior Frontend Developer"]);
    }

    #[test]
    fn test_search_by_location() {
        let (_, board) = board();
        let results = board.search_jobs("", Some("Remote"), None);
        assert_eq!(titles(&results), vec!["Full Stack Developer"]);

        let results = board.search_jobs("", Some("new york"), None);
        assert_eq!(titles(&results), vec!["UI/UX Designer"]);
    }

    #[test]
    fn test_search_combines_criteria() {
        let (_, board) = board();
        assert_eq!(board.search_jobs("", None, None).len(), 3);

        // company and description also match the query
        assert_eq!(
            titles(&board.search_jobs("startupxyz", None, None)),
            vec!["Full Stack Developer"]
        );
        assert_eq!(titles(&board.search_jobs("INTUITIVE", None, None)), vec!["UI/UX Designer"]);

        let full_time = board.search_jobs("", None, Some(JobType::FullTime));
        assert_eq!(titles(&full_time), vec!["Senior Frontend Developer", "UI/UX Designer"]);

        assert!(board.search_jobs("developer", Some("New York"), None).is_empty());
        assert!(board.search_jobs("designer", None, Some(JobType::Remote)).is_empty());
    }

    #[test]
    fn test_featured_jobs_respects_limit_and_order() {
        let (_, mut board) = board();
        let mut featured = new_job("Late Featured", "e1");
        featured.featured = true;
        board.add_job(featured).unwrap();

        assert_eq!(
            titles(&board.featured_jobs(3)),
            vec![
                "Senior Frontend Developer",
                "Full Stack Developer",
                "Late Featured",
            ]
        );
        assert_eq!(board.featured_jobs(1).len(), 1);
    }

    #[test]
    fn test_application_starts_pending_and_status_updates() {
        let (_, mut board) = board();
        let application = board.add_application(new_application("2", "c1")).unwrap();
        assert_eq!(application.status, ApplicationStatus::Pending);
        assert_eq!(application.applied_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        assert!(
            board
                .update_application_status(&application.id, ApplicationStatus::Hired)
                .unwrap()
        );
        let mine = board.applications_by_candidate("c1");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].status, ApplicationStatus::Hired);
        assert_eq!(board.application_status("c1", "2"), Some(ApplicationStatus::Hired));
        assert_eq!(board.application_status("c1", "3"), None);
    }

    #[test]
    fn test_duplicate_applications_are_allowed() {
        let (_, mut board) = board();
        let first = board.add_application(new_application("1", "c1")).unwrap();
        let second = board.add_application(new_application("1", "c1")).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(board.applications_by_job("1").len(), 2);
        assert_eq!(titles(&board.applied_jobs("c1")), vec!["Senior Frontend Developer"]);
    }

    #[test]
    fn test_delete_job_leaves_orphaned_applications() {
        let (storage, mut board) = board();
        let application = board.add_application(new_application("3", "c1")).unwrap();

        assert!(board.delete_job("3").unwrap());

        let mine = board.applications_by_candidate("c1");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].job_id, "3");
        assert_eq!(board.orphaned_applications()[0].id, application.id);
        assert!(board.applied_jobs("c1").is_empty());
        assert!(storage.raw(APPLICATIONS_KEY).unwrap().contains(r#""jobId":"3""#));
    }

    #[test]
    fn test_application_count_for_employer() {
        let (_, mut board) = board();
        board.add_application(new_application("1", "c1")).unwrap();
        board.add_application(new_application("1", "c2")).unwrap();
        board.add_application(new_application("2", "c1")).unwrap();

        assert_eq!(board.application_count_for_employer("1"), 2);
        assert_eq!(board.application_count_for_employer("2"), 1);
        assert_eq!(board.application_count_for_employer("3"), 0);
    }

    #[test]
    fn test_collections_are_read_once() {
        let (storage, mut board) = board();
        board.add_job(new_job("Ops", "e1")).unwrap();
        board.add_application(new_application("1", "c1")).unwrap();
        board.search_jobs("ops", None, None);
        assert_eq!(*storage.reads.borrow(), vec!["jobs", "applications"]);
    }

    #[test]
    fn test_state_survives_reload() {
        let (storage, mut board) = board();
        let job = board.add_job(new_job("Ops", "e1")).unwrap();
        board.add_application(new_application(&job.id, "c1")).unwrap();

        let reloaded = JobBoard::load(
            storage.clone(),
            Rc::new(SequentialIds::default()),
            Rc::new(FixedClock::default()),
        )
        .unwrap();
        assert_eq!(reloaded.jobs().len(), 4);
        assert_eq!(reloaded.applications_by_job(&job.id).len(), 1);
    }

    #[test]
    fn test_largest_stored_id_still_allows_new_records() {
        let mut jobs = sample_jobs();
        jobs[0].id = i64::MAX.to_string();
        let storage = Rc::new(RecordingStore::default());
        storage.put(JOBS_KEY, &serde_json::to_string(&jobs).unwrap());

        let mut board = JobBoard::load(
            storage.clone(),
            Rc::new(TimestampIds::new()),
            Rc::new(FixedClock::default()),
        )
        .unwrap();
        let job = board.add_job(new_job("Ops", "e1")).unwrap();
        let application = board.add_application(new_application(&job.id, "c1")).unwrap();

        assert_eq!(job.id, "9223372036854775808");
        assert_eq!(application.id, "9223372036854775809");
    }

    #[test]
    fn test_paginate() {
        let items: Vec<u32> = (1..=20).collect();

        let first = paginate(&items, 1, 9);
        assert_eq!(first.items, &items[0..9]);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_items, 20);

        let last = paginate(&items, 3, 9);
        assert_eq!(last.items, &[19, 20]);

        assert!(paginate(&items, 4, 9).items.is_empty());
        assert!(paginate(&items, 0, 9).items.is_empty());

        let empty: Vec<u32> = vec![];
        assert_eq!(paginate(&empty, 1, 9).total_pages, 0);
    }
}
