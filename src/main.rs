mod auth;
mod board;
mod config;
mod db;
mod error;
mod ids;
mod models;
mod seed;
mod storage;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

use auth::AuthStore;
use board::{JobBoard, paginate};
use config::Config;
use db::Database;
use ids::{IdGenerator, SystemClock, TimestampIds};
use models::{
    Application, ApplicationStatus, Job, JobType, JobUpdate, NewApplication, NewJob, NewUser,
    ProfileUpdate, Role, User,
};
use storage::KeyValueStore;

#[derive(Parser)]
#[command(name = "jobboard")]
#[command(about = "Job board - post jobs, search listings, and track applications")]
struct Cli {
    /// Path to the database file (overrides JOBBOARD_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account and log in as it
    Register {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        name: String,

        /// employer or candidate
        #[arg(long)]
        role: Role,

        #[command(flatten)]
        profile: ProfileArgs,
    },

    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Edit the logged-in user's profile
    Profile {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[command(flatten)]
        profile: ProfileArgs,

        /// JSON patch, e.g. '{"bio": "..."}' (id and role cannot be changed)
        #[arg(long)]
        json: Option<String>,
    },

    /// Browse and manage job postings
    Jobs {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Apply to a job as the logged-in candidate
    Apply {
        /// Job ID
        job_id: String,

        /// Resume file (only the file name is recorded)
        #[arg(short, long)]
        resume: Option<PathBuf>,

        #[arg(short, long)]
        cover_letter: String,
    },

    /// Review applications
    Applications {
        #[command(subcommand)]
        command: ApplicationCommands,
    },

    /// Erase all stored users, jobs, and applications
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },

    /// Show where data is stored
    Path,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    company: Option<String>,

    #[arg(long)]
    title: Option<String>,

    #[arg(long)]
    bio: Option<String>,

    /// Comma-separated, e.g. "Rust, SQL"
    #[arg(long)]
    skills: Option<String>,

    #[arg(long)]
    experience: Option<String>,

    #[arg(long)]
    education: Option<String>,

    /// Resume file name
    #[arg(long)]
    resume: Option<String>,
}

#[derive(Subcommand)]
enum JobCommands {
    /// List all jobs
    List {
        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Search jobs by keyword, location, and type
    Search {
        /// Matches title, company, or description
        #[arg(default_value = "")]
        query: String,

        #[arg(short, long)]
        location: Option<String>,

        /// full-time, part-time, contract, or remote
        #[arg(short = 't', long = "type")]
        job_type: Option<String>,

        #[arg(short, long, default_value = "1")]
        page: usize,
    },

    /// Show featured jobs
    Featured,

    /// Show job details
    Show {
        /// Job ID
        id: String,
    },

    /// Post a job as the logged-in employer
    Add {
        #[arg(long)]
        title: String,

        /// Defaults to the company on your profile
        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        location: String,

        #[arg(short = 't', long = "type", default_value = "full-time")]
        job_type: JobType,

        /// Free text, e.g. "$120k - $150k"
        #[arg(long)]
        salary: String,

        #[arg(long)]
        description: String,

        /// Repeat for each requirement
        #[arg(long = "requirement", required = true)]
        requirements: Vec<String>,

        /// Repeat for each benefit
        #[arg(long = "benefit", required = true)]
        benefits: Vec<String>,

        #[arg(long)]
        featured: bool,
    },

    /// Edit one of your job postings
    Update {
        /// Job ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        company: Option<String>,

        #[arg(long)]
        location: Option<String>,

        #[arg(short = 't', long = "type")]
        job_type: Option<JobType>,

        #[arg(long)]
        salary: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Replaces the requirement list; repeat for each entry
        #[arg(long = "requirement")]
        requirements: Vec<String>,

        /// Replaces the benefit list; repeat for each entry
        #[arg(long = "benefit")]
        benefits: Vec<String>,

        #[arg(long)]
        featured: Option<bool>,

        /// JSON patch instead of flags
        #[arg(long)]
        json: Option<String>,
    },

    /// Delete one of your job postings
    Delete {
        /// Job ID
        id: String,
    },

    /// List your job postings with application counts
    Mine,
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// Applications you have submitted
    Mine,

    /// Applications received for one of your jobs
    ForJob {
        /// Job ID
        job_id: String,
    },

    /// Move an application to a new status
    Status {
        /// Application ID
        id: String,

        /// pending, reviewed, interviewed, hired, or rejected
        status: ApplicationStatus,
    },

    /// Applications whose job has been deleted
    Orphans,
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::resolve(cli.db)?;
    let db = Rc::new(Database::open(&config.db_path)?);

    // These work even when the stored data no longer parses.
    match cli.command {
        Commands::Reset { yes } => reset_storage(&db, &config, yes),
        Commands::Path => show_storage(&db, &config),
        command => {
            let storage: Rc<dyn KeyValueStore> = db;
            let ids: Rc<dyn IdGenerator> = Rc::new(TimestampIds::new());
            let mut auth = AuthStore::load(storage.clone(), ids.clone())
                .context("Failed to load users (run 'jobboard reset' if the data is corrupt)")?;
            let mut board = JobBoard::load(storage, ids, Rc::new(SystemClock))
                .context("Failed to load jobs (run 'jobboard reset' if the data is corrupt)")?;
            run(command, &config, &mut auth, &mut board)
        }
    }
}

fn reset_storage(db: &Database, config: &Config, yes: bool) -> Result<()> {
    if !yes {
        println!("This erases every user, job, and application in {}.", config.db_path.display());
        println!("Run again with --yes to confirm.");
    } else {
        db.clear()?;
        println!("All data erased. Sample jobs will be restored on next use.");
    }
    Ok(())
}

fn show_storage(db: &Database, config: &Config) -> Result<()> {
    let path = db.path().unwrap_or(config.db_path.as_path());
    println!("Database: {}", path.display());
    let keys = db.keys()?;
    if keys.is_empty() {
        println!("Stored keys: (none)");
    } else {
        println!("Stored keys: {}", keys.join(", "));
    }
    Ok(())
}

fn run(
    command: Commands,
    config: &Config,
    auth: &mut AuthStore,
    board: &mut JobBoard,
) -> Result<()> {
    match command {
        Commands::Register {
            email,
            password,
            name,
            role,
            profile,
        } => {
            ensure_email(&email)?;
            let profile = profile.into_update(None, None);
            let new_user = NewUser {
                email: email.clone(),
                password,
                name,
                role,
                company: profile.company,
                title: profile.title,
                bio: profile.bio,
                skills: profile.skills,
                experience: profile.experience,
                education: profile.education,
                resume: profile.resume,
            };
            if auth.register(new_user)? {
                println!("Registered {} as {} and logged in.", email, role);
            } else {
                bail!("An account with email {} already exists", email);
            }
        }

        Commands::Login { email, password } => {
            if auth.login(&email, &password)? {
                let user = session_user(auth)?;
                println!("Logged in as {} ({}).", user.name, user.role);
            } else {
                bail!("Invalid email or password");
            }
        }

        Commands::Logout => {
            auth.logout()?;
            println!("Logged out.");
        }

        Commands::Whoami => match auth.current_user() {
            Some(user) => print_user(user, board),
            None => println!("Not logged in."),
        },

        Commands::Profile {
            name,
            email,
            profile,
            json,
        } => {
            let from_flags = profile.into_update(name, email);
            let update = match json {
                Some(_) if !from_flags.is_empty() => {
                    bail!("Use either --json or field flags, not both")
                }
                Some(patch) => ProfileUpdate::from_json(&patch)?,
                None => from_flags,
            };
            if update.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            if let Some(email) = &update.email {
                ensure_email(email)?;
            }
            if !auth.update_profile(&update)? {
                bail!("Log in first");
            }
            println!("Profile updated.");
        }

        Commands::Jobs { command } => run_jobs(command, config, auth, board)?,

        Commands::Apply {
            job_id,
            resume,
            cover_letter,
        } => {
            let user = require_role(auth, Role::Candidate)?;
            let job = board
                .get_job(&job_id)
                .ok_or_else(|| anyhow!("Job #{} not found", job_id))?;
            ensure_filled("Cover letter", &cover_letter)?;
            let title = job.title.clone();
            let application = board.add_application(NewApplication {
                job_id,
                candidate_id: user.id.clone(),
                candidate_name: user.name.clone(),
                candidate_email: user.email.clone(),
                resume: resume_file_name(resume.as_deref()),
                cover_letter,
            })?;
            println!("Applied to '{}' (application #{}).", title, application.id);
        }

        Commands::Applications { command } => run_applications(command, auth, board)?,

        Commands::Reset { .. } | Commands::Path => {
            bail!("This command runs before any data is loaded")
        }
    }

    Ok(())
}

fn run_jobs(
    command: JobCommands,
    config: &Config,
    auth: &AuthStore,
    board: &mut JobBoard,
) -> Result<()> {
    match command {
        JobCommands::List { page } => {
            let jobs: Vec<&Job> = board.jobs().iter().collect();
            print_job_page(&jobs, page, config.page_size);
        }

        JobCommands::Search {
            query,
            location,
            job_type,
            page,
        } => {
            let job_type = parse_job_type_filter(job_type.as_deref())?;
            let jobs = board.search_jobs(&query, location.as_deref(), job_type);
            print_job_page(&jobs, page, config.page_size);
        }

        JobCommands::Featured => {
            let jobs = board.featured_jobs(config.featured_limit);
            if jobs.is_empty() {
                println!("No featured jobs.");
            } else {
                print_job_table(&jobs);
            }
        }

        JobCommands::Show { id } => match board.get_job(&id) {
            Some(job) => {
                print_job(job);
                if let Some(employer) = auth.find_user(&job.employer_id) {
                    println!("Posted by: {}", employer.name);
                }
                if let Some(user) = auth.current_user() {
                    if user.role == Role::Candidate {
                        match board.application_status(&user.id, &job.id) {
                            Some(status) => println!("\nYou applied: {}", status),
                            None => println!("\nApply with: jobboard apply {}", job.id),
                        }
                    }
                }
            }
            None => println!("Job #{} not found.", id),
        },

        JobCommands::Add {
            title,
            company,
            location,
            job_type,
            salary,
            description,
            requirements,
            benefits,
            featured,
        } => {
            let user = require_role(auth, Role::Employer)?;
            let new_job = NewJob {
                title,
                company: company.or_else(|| user.company.clone()).unwrap_or_default(),
                location,
                job_type,
                salary,
                description,
                requirements: clean_entries(requirements),
                benefits: clean_entries(benefits),
                employer_id: user.id.clone(),
                featured,
            };
            ensure_job_fields(&new_job)?;
            let job = board.add_job(new_job)?;
            println!("Added job #{}", job.id);
        }

        JobCommands::Update {
            id,
            title,
            company,
            location,
            job_type,
            salary,
            description,
            requirements,
            benefits,
            featured,
            json,
        } => {
            let user = require_role(auth, Role::Employer)?;
            require_own_job(board, user, &id)?;

            let from_flags = JobUpdate {
                title,
                company,
                location,
                job_type,
                salary,
                description,
                requirements: non_empty(clean_entries(requirements)),
                benefits: non_empty(clean_entries(benefits)),
                featured,
            };
            let update = match json {
                Some(_) if !from_flags.is_empty() => {
                    bail!("Use either --json or field flags, not both")
                }
                Some(patch) => JobUpdate::from_json(&patch)?,
                None => from_flags,
            };
            if update.is_empty() {
                bail!("Nothing to update; pass at least one field");
            }
            ensure_job_update(&update)?;
            board.update_job(&id, &update)?;
            println!("Updated job #{}", id);
        }

        JobCommands::Delete { id } => {
            let user = require_role(auth, Role::Employer)?;
            require_own_job(board, user, &id)?;
            board.delete_job(&id)?;
            println!("Deleted job #{}", id);
        }

        JobCommands::Mine => {
            let user = require_role(auth, Role::Employer)?;
            let jobs = board.jobs_by_employer(&user.id);
            if jobs.is_empty() {
                println!("You have not posted any jobs.");
            } else {
                println!("{:<15} {:<30} {:<11} {:>12}", "ID", "TITLE", "POSTED", "APPLICANTS");
                println!("{}", "-".repeat(71));
                for job in &jobs {
                    println!(
                        "{:<15} {:<30} {:<11} {:>12}",
                        job.id,
                        truncate(&job.title, 28),
                        job.posted_date.to_string(),
                        board.applications_by_job(&job.id).len()
                    );
                }
                println!(
                    "\n{} job(s), {} application(s) total",
                    jobs.len(),
                    board.application_count_for_employer(&user.id)
                );
            }
        }
    }

    Ok(())
}

fn run_applications(
    command: ApplicationCommands,
    auth: &AuthStore,
    board: &mut JobBoard,
) -> Result<()> {
    match command {
        ApplicationCommands::Mine => {
            let user = require_role(auth, Role::Candidate)?;
            let applications = board.applications_by_candidate(&user.id);
            if applications.is_empty() {
                println!("You have not applied to any jobs.");
            } else {
                println!("{:<15} {:<30} {:<12} {:<11}", "ID", "JOB", "STATUS", "APPLIED");
                println!("{}", "-".repeat(71));
                for application in applications {
                    println!(
                        "{:<15} {:<30} {:<12} {:<11}",
                        application.id,
                        truncate(applied_job_title(board, application), 28),
                        application.status,
                        application.applied_date.to_string()
                    );
                }
            }
        }

        ApplicationCommands::ForJob { job_id } => {
            let user = require_role(auth, Role::Employer)?;
            require_own_job(board, user, &job_id)?;
            let applications = board.applications_by_job(&job_id);
            if applications.is_empty() {
                println!("No applications for job #{}.", job_id);
            } else {
                println!(
                    "{:<15} {:<20} {:<26} {:<12} {:<11}",
                    "ID", "CANDIDATE", "EMAIL", "STATUS", "APPLIED"
                );
                println!("{}", "-".repeat(88));
                for application in applications {
                    println!(
                        "{:<15} {:<20} {:<26} {:<12} {:<11}",
                        application.id,
                        truncate(&application.candidate_name, 18),
                        truncate(&application.candidate_email, 24),
                        application.status,
                        application.applied_date.to_string()
                    );
                    println!("      resume: {}", application.resume);
                    if !application.cover_letter.is_empty() {
                        let letter = textwrap::fill(&application.cover_letter, 70);
                        println!("{}", textwrap::indent(&letter, "      "));
                    }
                }
            }
        }

        ApplicationCommands::Status { id, status } => {
            let user = require_role(auth, Role::Employer)?;
            let job_id = board
                .applications()
                .iter()
                .find(|a| a.id == id)
                .map(|a| a.job_id.clone())
                .ok_or_else(|| anyhow!("Application #{} not found", id))?;
            require_own_job(board, user, &job_id)?;
            board.update_application_status(&id, status)?;
            println!("Application #{} is now {}.", id, status);
        }

        ApplicationCommands::Orphans => {
            let orphans = board.orphaned_applications();
            if orphans.is_empty() {
                println!("No orphaned applications.");
            } else {
                println!("{:<15} {:<15} {:<20} {:<12}", "ID", "JOB", "CANDIDATE", "STATUS");
                println!("{}", "-".repeat(65));
                for application in orphans {
                    println!(
                        "{:<15} {:<15} {:<20} {:<12}",
                        application.id,
                        application.job_id,
                        truncate(&application.candidate_name, 18),
                        application.status
                    );
                }
            }
        }
    }

    Ok(())
}

impl ProfileArgs {
    fn into_update(self, name: Option<String>, email: Option<String>) -> ProfileUpdate {
        ProfileUpdate {
            name,
            email,
            company: self.company,
            title: self.title,
            bio: self.bio,
            skills: self.skills.as_deref().map(split_skills),
            experience: self.experience,
            education: self.education,
            resume: self.resume,
        }
    }
}

// --- Session guards ---

fn session_user(auth: &AuthStore) -> Result<&User> {
    auth.current_user().ok_or_else(|| anyhow!("Log in first"))
}

fn require_role(auth: &AuthStore, role: Role) -> Result<&User> {
    let user = session_user(auth)?;
    if user.role != role {
        bail!("This requires a {} account; you are logged in as a {}", role, user.role);
    }
    Ok(user)
}

fn require_own_job(board: &JobBoard, user: &User, job_id: &str) -> Result<()> {
    let job = board
        .get_job(job_id)
        .ok_or_else(|| anyhow!("Job #{} not found", job_id))?;
    if job.employer_id != user.id {
        bail!("Job #{} belongs to another employer", job_id);
    }
    Ok(())
}

// --- Input helpers ---

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

fn ensure_email(email: &str) -> Result<()> {
    if !EMAIL_RE.is_match(email) {
        bail!("'{}' is not a valid email address", email);
    }
    Ok(())
}

/// Empty means "any type".
fn parse_job_type_filter(raw: Option<&str>) -> Result<Option<JobType>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<JobType>().map(Some).map_err(|e| anyhow!(e)),
    }
}

fn ensure_filled(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{} cannot be blank", field);
    }
    Ok(())
}

fn ensure_listed(field: &str, entries: &[String]) -> Result<()> {
    if entries.is_empty() {
        bail!("Add at least one {}", field);
    }
    Ok(())
}

/// The posting form requires every field except company and type.
fn ensure_job_fields(job: &NewJob) -> Result<()> {
    ensure_filled("Title", &job.title)?;
    ensure_filled("Location", &job.location)?;
    ensure_filled("Salary", &job.salary)?;
    ensure_filled("Description", &job.description)?;
    ensure_listed("requirement", &job.requirements)?;
    ensure_listed("benefit", &job.benefits)
}

/// An edit may leave fields out, but may not blank a required one.
fn ensure_job_update(update: &JobUpdate) -> Result<()> {
    let text_fields = [
        ("Title", &update.title),
        ("Location", &update.location),
        ("Salary", &update.salary),
        ("Description", &update.description),
    ];
    for (field, value) in text_fields {
        if let Some(value) = value {
            ensure_filled(field, value)?;
        }
    }
    if let Some(requirements) = &update.requirements {
        ensure_listed("requirement", requirements)?;
    }
    if let Some(benefits) = &update.benefits {
        ensure_listed("benefit", benefits)?;
    }
    Ok(())
}

fn split_skills(raw: &str) -> Vec<String> {
    clean_entries(raw.split(',').map(str::to_string).collect())
}

fn clean_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

fn non_empty(entries: Vec<String>) -> Option<Vec<String>> {
    if entries.is_empty() { None } else { Some(entries) }
}

/// Only the file name is kept; nothing is read from disk.
fn resume_file_name(path: Option<&Path>) -> String {
    path.and_then(|p| p.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Resume uploaded".to_string())
}

// --- Output ---

fn applied_job_title<'a>(board: &'a JobBoard, application: &Application) -> &'a str {
    board
        .get_job(&application.job_id)
        .map(|j| j.title.as_str())
        .unwrap_or("(job removed)")
}

fn print_job_page(jobs: &[&Job], page: usize, page_size: usize) {
    let page = paginate(jobs, page, page_size);
    if page.total_items == 0 {
        println!("No jobs found. Try adjusting your search filters.");
        return;
    }
    if page.items.is_empty() {
        println!("Page {} is empty; there are {} page(s).", page.page, page.total_pages);
        return;
    }
    print_job_table(page.items);
    let first = (page.page - 1) * page_size + 1;
    println!(
        "\nShowing {}-{} of {} jobs (page {}/{})",
        first,
        first + page.items.len() - 1,
        page.total_items,
        page.page,
        page.total_pages
    );
}

fn print_job_table(jobs: &[&Job]) {
    println!(
        "{:<15} {:<28} {:<18} {:<20} {:<10}",
        "ID", "TITLE", "COMPANY", "LOCATION", "TYPE"
    );
    println!("{}", "-".repeat(95));
    for job in jobs {
        let title = if job.featured {
            format!("* {}", job.title)
        } else {
            job.title.clone()
        };
        println!(
            "{:<15} {:<28} {:<18} {:<20} {:<10}",
            job.id,
            truncate(&title, 26),
            truncate(&job.company, 16),
            truncate(&job.location, 18),
            job.job_type
        );
    }
}

fn print_job(job: &Job) {
    println!("Job #{}", job.id);
    println!("Title: {}{}", job.title, if job.featured { " (featured)" } else { "" });
    println!("Company: {}", job.company);
    println!("Location: {}", job.location);
    println!("Type: {}", job.job_type);
    if !job.salary.is_empty() {
        println!("Salary: {}", job.salary);
    }
    println!("Posted: {}", job.posted_date);
    if !job.description.is_empty() {
        println!("\n{}", textwrap::fill(&job.description, 78));
    }
    if !job.requirements.is_empty() {
        println!("\nRequirements:");
        for requirement in &job.requirements {
            println!("  - {}", requirement);
        }
    }
    if !job.benefits.is_empty() {
        println!("\nBenefits:");
        for benefit in &job.benefits {
            println!("  - {}", benefit);
        }
    }
}

fn print_user(user: &User, board: &JobBoard) {
    println!("{} <{}>", user.name, user.email);
    println!("Role: {}", user.role);
    if let Some(company) = &user.company {
        println!("Company: {}", company);
    }
    if let Some(title) = &user.title {
        println!("Title: {}", title);
    }
    if let Some(skills) = user.skills.as_ref().filter(|s| !s.is_empty()) {
        println!("Skills: {}", skills.join(", "));
    }
    if let Some(experience) = &user.experience {
        println!("Experience: {}", experience);
    }
    if let Some(education) = &user.education {
        println!("Education: {}", education);
    }
    if let Some(resume) = &user.resume {
        println!("Resume: {}", resume);
    }
    if let Some(bio) = &user.bio {
        println!("\n{}", textwrap::fill(bio, 78));
    }
    match user.role {
        Role::Employer => println!(
            "\nActive jobs: {}  Applications: {}",
            board.jobs_by_employer(&user.id).len(),
            board.application_count_for_employer(&user.id)
        ),
        Role::Candidate => println!(
            "\nApplications: {}  Jobs applied to: {}",
            board.applications_by_candidate(&user.id).len(),
            board.applied_jobs(&user.id).len()
        ),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
