use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employer,
    Candidate,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employer => "employer",
            Role::Candidate => "candidate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "employer" => Ok(Role::Employer),
            "candidate" => Ok(Role::Candidate),
            other => Err(format!("unknown role '{}' (expected employer or candidate)", other)),
        }
    }
}

/// The password-free view of a registered user. This is what the session holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resume: Option<String>,
}

/// Registry entry: the user plus their (plain text) password.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisteredUser {
    #[serde(flatten)]
    pub user: User,
    pub password: String,
}

/// Everything `register` needs; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub company: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub resume: Option<String>,
}

impl NewUser {
    pub fn into_registered(self, id: String) -> RegisteredUser {
        RegisteredUser {
            user: User {
                id,
                email: self.email,
                name: self.name,
                role: self.role,
                company: self.company,
                title: self.title,
                bio: self.bio,
                skills: self.skills,
                experience: self.experience,
                education: self.education,
                resume: self.resume,
            },
            password: self.password,
        }
    }
}

/// Partial profile edit. `id` and `role` have no field here, so they can never
/// be overwritten; `from_json` rejects patches that try.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub education: Option<String>,
    pub resume: Option<String>,
}

impl ProfileUpdate {
    const IMMUTABLE: &'static [&'static str] = &["id", "role", "password"];

    pub fn from_json(patch: &str) -> Result<Self> {
        parse_patch(patch, Self::IMMUTABLE)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name = name.clone();
        }
        if let Some(email) = &self.email {
            user.email = email.clone();
        }
        merge(&mut user.company, &self.company);
        merge(&mut user.title, &self.title);
        merge(&mut user.bio, &self.bio);
        merge(&mut user.skills, &self.skills);
        merge(&mut user.experience, &self.experience);
        merge(&mut user.education, &self.education);
        merge(&mut user.resume, &self.resume);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Remote,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "full-time",
            JobType::PartTime => "part-time",
            JobType::Contract => "contract",
            JobType::Remote => "remote",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "remote" => Ok(JobType::Remote),
            other => Err(format!(
                "unknown job type '{}' (expected full-time, part-time, contract, remote)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub salary: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub employer_id: String,
    pub posted_date: NaiveDate,
    pub featured: bool,
}

/// A job as submitted by an employer, before id and posting date are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub location: String,
    pub job_type: JobType,
    pub salary: String,
    pub description: String,
    pub requirements: Vec<String>,
    pub benefits: Vec<String>,
    pub employer_id: String,
    pub featured: bool,
}

impl NewJob {
    pub fn into_job(self, id: String, posted_date: NaiveDate) -> Job {
        Job {
            id,
            title: self.title,
            company: self.company,
            location: self.location,
            job_type: self.job_type,
            salary: self.salary,
            description: self.description,
            requirements: self.requirements,
            benefits: self.benefits,
            employer_id: self.employer_id,
            posted_date,
            featured: self.featured,
        }
    }
}

/// Partial job edit. Ownership and identity (`id`, `employerId`, `postedDate`)
/// are not editable.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub job_type: Option<JobType>,
    pub salary: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub benefits: Option<Vec<String>>,
    pub featured: Option<bool>,
}

impl JobUpdate {
    const IMMUTABLE: &'static [&'static str] = &["id", "employerId", "postedDate"];

    pub fn from_json(patch: &str) -> Result<Self> {
        parse_patch(patch, Self::IMMUTABLE)
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, job: &mut Job) {
        set(&mut job.title, &self.title);
        set(&mut job.company, &self.company);
        set(&mut job.location, &self.location);
        set(&mut job.job_type, &self.job_type);
        set(&mut job.salary, &self.salary);
        set(&mut job.description, &self.description);
        set(&mut job.requirements, &self.requirements);
        set(&mut job.benefits, &self.benefits);
        set(&mut job.featured, &self.featured);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Interviewed,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "hired" => Ok(ApplicationStatus::Hired),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,
    pub job_id: String,
    pub candidate_id: String,
    pub candidate_name: String, // snapshot at submission
    pub candidate_email: String,
    pub resume: String, // filename only
    pub cover_letter: String,
    pub applied_date: NaiveDate,
    pub status: ApplicationStatus,
}

/// Submission payload. Any `status` a caller sends is ignored: new
/// applications always start out pending.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub job_id: String,
    pub candidate_id: String,
    pub candidate_name: String,
    pub candidate_email: String,
    #[serde(default)]
    pub resume: String,
    #[serde(default)]
    pub cover_letter: String,
}

impl NewApplication {
    pub fn into_application(self, id: String, applied_date: NaiveDate) -> Application {
        Application {
            id,
            job_id: self.job_id,
            candidate_id: self.candidate_id,
            candidate_name: self.candidate_name,
            candidate_email: self.candidate_email,
            resume: self.resume,
            cover_letter: self.cover_letter,
            applied_date,
            status: ApplicationStatus::Pending,
        }
    }
}

fn parse_patch<T: serde::de::DeserializeOwned>(patch: &str, immutable: &[&str]) -> Result<T> {
    let fields: Map<String, Value> = serde_json::from_str(patch)?;
    if let Some(field) = immutable.iter().find(|f| fields.contains_key(**f)) {
        return Err(StoreError::ImmutableField(field.to_string()));
    }
    Ok(serde_json::from_value(Value::Object(fields))?)
}

fn merge<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}
