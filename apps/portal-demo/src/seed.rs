//! Fixture data for the scripted demo run.

use anyhow::{Context, Result};
use chrono::Utc;

use portal_core::contract::model::{
    Actor, CourseRecord, EnrollmentRecord, EnrollmentStatus, RecordId, Role, UserRecord,
};
use portal_core::domain::repo::CollectionStore;
use portal_core::infra::storage::memory_store::InMemoryStore;

pub const TUTOR_ID: &str = "tutor-1";
pub const COURSE_ID: &str = "intro-cs";

fn id(raw: &str) -> Result<RecordId> {
    RecordId::parse(raw).with_context(|| format!("invalid fixture id '{raw}'"))
}

fn user(raw_id: &str, name: &str, role: Role) -> Result<UserRecord> {
    Ok(UserRecord {
        id: id(raw_id)?,
        display_name: name.to_string(),
        role,
        email: format!("{raw_id}@university.example"),
        photo_url: None,
    })
}

pub fn tutor() -> Result<Actor> {
    Ok(Actor {
        id: id(TUTOR_ID)?,
        display_name: "Dr. Ada Byron".to_string(),
    })
}

/// Populate an empty store with one tutor, two students, one course and
/// a pending application from each student.
pub async fn populate(store: &InMemoryStore) -> Result<()> {
    for record in [
        user(TUTOR_ID, "Dr. Ada Byron", Role::Tutor)?,
        user("student-1", "Grace Hopper", Role::Student)?,
        user("student-2", "Alan Turing", Role::Student)?,
    ] {
        store.users.insert(record).await?;
    }

    store
        .courses
        .insert(CourseRecord {
            id: id(COURSE_ID)?,
            title: "Introduction to Computer Science".to_string(),
            department: "Computer Science".to_string(),
            tutor_id: id(TUTOR_ID)?,
            content: String::new(),
            updated_at: Utc::now(),
        })
        .await?;

    for (enrollment, student) in [("enr-1", "student-1"), ("enr-2", "student-2")] {
        store
            .enrollments
            .insert(EnrollmentRecord {
                id: id(enrollment)?,
                student_id: id(student)?,
                course_id: id(COURSE_ID)?,
                status: EnrollmentStatus::PendingReview,
                applied_at: Utc::now(),
            })
            .await?;
    }
    Ok(())
}
