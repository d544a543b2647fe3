use chrono::NaiveDate;

use crate::models::{Job, JobType};

struct SampleJob {
    id: &'static str,
    title: &'static str,
    company: &'static str,
    location: &'static str,
    job_type: JobType,
    salary: &'static str,
    description: &'static str,
    requirements: &'static [&'static str],
    benefits: &'static [&'static str],
    employer_id: &'static str,
    posted: (i32, u32, u32),
    featured: bool,
}

const SAMPLE_JOBS: &[SampleJob] = &[
    SampleJob {
        id: "1",
        title: "Senior Frontend Developer",
        company: "TechCorp Inc.",
        location: "San Francisco, CA",
        job_type: JobType::FullTime,
        salary: "$120,000 - $150,000",
        description: "We are looking for a skilled Frontend Developer to join our team and help build amazing user experiences.",
        requirements: &["React", "TypeScript", "CSS", "5+ years experience"],
        benefits: &[
            "Health Insurance",
            "Dental Insurance",
            "Retirement Plan",
            "Flexible Schedule",
        ],
        employer_id: "1",
        posted: (2024, 1, 15),
        featured: true,
    },
    SampleJob {
        id: "2",
        title: "Full Stack Developer",
        company: "StartupXYZ",
        location: "Remote",
        job_type: JobType::Remote,
        salary: "$90,000 - $120,000",
        description: "Join our fast-growing startup as a Full Stack Developer and help shape the future of our platform.",
        requirements: &["Node.js", "React", "MongoDB", "3+ years experience"],
        benefits: &[
            "Stock Options",
            "Health Insurance",
            "Remote Work",
            "Professional Development",
        ],
        employer_id: "2",
        posted: (2024, 1, 14),
        featured: true,
    },
    SampleJob {
        id: "3",
        title: "UI/UX Designer",
        company: "Design Studio",
        location: "New York, NY",
        job_type: JobType::FullTime,
        salary: "$80,000 - $100,000",
        description: "Create beautiful and intuitive user interfaces and experiences for our clients.",
        requirements: &[
            "Figma",
            "Adobe Creative Suite",
            "User Research",
            "4+ years experience",
        ],
        benefits: &[
            "Creative Environment",
            "Health Insurance",
            "Flexible Hours",
            "Conference Budget",
        ],
        employer_id: "3",
        posted: (2024, 1, 13),
        featured: false,
    },
];

/// The catalog a fresh board starts with.
pub fn sample_jobs() -> Vec<Job> {
    SAMPLE_JOBS
        .iter()
        .map(|s| {
            let (y, m, d) = s.posted;
            Job {
                id: s.id.to_string(),
                title: s.title.to_string(),
                company: s.company.to_string(),
                location: s.location.to_string(),
                job_type: s.job_type,
                salary: s.salary.to_string(),
                description: s.description.to_string(),
                requirements: s.requirements.iter().map(|r| r.to_string()).collect(),
                benefits: s.benefits.iter().map(|b| b.to_string()).collect(),
                employer_id: s.employer_id.to_string(),
                posted_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
                featured: s.featured,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_jobs() {
        let jobs = sample_jobs();
        assert_eq!(jobs.len(), 3);
        assert_eq!(jobs[0].posted_date.to_string(), "2024-01-15");
        assert_eq!(jobs.iter().filter(|j| j.featured).count(), 2);
        assert_eq!(jobs[1].job_type, JobType::Remote);
    }
}
