//! Student service: roster membership, parent links and progress markers.

use chrono::Utc;
use hifz_common::{AppError, AppResult, IdGenerator};
use hifz_db::{
    LiveStream, Store,
    entities::{Role, account, student},
    repositories::{AccountRepository, StudentRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Position assigned to a student enrolled through a join request.
pub const STARTING_JUZ: i32 = 30;
pub const STARTING_SURAH: &str = "An-Naba";
pub const STARTING_VERSE: i32 = 1;

/// Number of juz in the Quran.
const JUZ_COUNT: i32 = 30;

/// Rejects text that is empty once trimmed.
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

/// Input for a teacher adding a student directly.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStudentInput {
    #[validate(length(min = 1, max = 100), custom(function = "not_blank"))]
    pub name: String,
    #[validate(range(min = 3, max = 100))]
    pub age: i32,
    pub parent_id: Option<String>,
    #[validate(range(min = 1, max = 30))]
    pub juz_number: i32,
    #[validate(length(min = 1, max = 64))]
    pub surah_name: String,
    #[validate(range(min = 1))]
    pub verse_number: i32,
    pub notes: Option<String>,
}

/// Student service.
#[derive(Clone)]
pub struct StudentService {
    student_repo: StudentRepository,
    account_repo: AccountRepository,
    id_gen: IdGenerator,
}

impl StudentService {
    /// Create a new student service.
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self {
            student_repo: StudentRepository::new(store.clone()),
            account_repo: AccountRepository::new(store),
            id_gen: IdGenerator::new(),
        }
    }

    async fn require_role(&self, account_id: &str, role: Role) -> AppResult<account::Model> {
        let account = self
            .account_repo
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account not found: {account_id}")))?;

        if account.role != role {
            return Err(AppError::BadRequest(format!(
                "Account {account_id} is a {}, not a {role}",
                account.role
            )));
        }
        Ok(account)
    }

    /// Add a student to a teacher's roster.
    pub async fn create_student(
        &self,
        teacher_id: &str,
        input: CreateStudentInput,
    ) -> AppResult<student::Model> {
        input
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let teacher = self.require_role(teacher_id, Role::Teacher).await?;
        if !teacher.is_approved {
            return Err(AppError::Forbidden(
                "Only approved teachers can add students".to_string(),
            ));
        }
        if let Some(parent_id) = input.parent_id.as_deref() {
            self.require_role(parent_id, Role::Parent).await?;
        }

        let model = student::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name.trim().to_string()),
            age: Set(input.age),
            parent_id: Set(input.parent_id),
            teacher_id: Set(Some(teacher.id)),
            account_id: Set(None),
            juz_number: Set(input.juz_number),
            surah_name: Set(input.surah_name),
            verse_number: Set(input.verse_number),
            notes: Set(input.notes),
            enrolled_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };

        let student = self.student_repo.create(model).await?;
        tracing::info!(student_id = %student.id, teacher_id = %teacher_id, "Student added");
        Ok(student)
    }

    /// Get a student by ID.
    pub async fn get(&self, student_id: &str) -> AppResult<student::Model> {
        self.student_repo.get_by_id(student_id).await
    }

    /// Move a student's position marker.
    pub async fn update_progress(
        &self,
        student_id: &str,
        juz_number: i32,
        surah_name: &str,
        verse_number: i32,
    ) -> AppResult<student::Model> {
        if !(1..=JUZ_COUNT).contains(&juz_number) {
            return Err(AppError::Validation(format!(
                "juz_number: must be between 1 and {JUZ_COUNT}"
            )));
        }
        if verse_number < 1 {
            return Err(AppError::Validation(
                "verse_number: must be at least 1".to_string(),
            ));
        }
        let surah_name = surah_name.trim();
        if surah_name.is_empty() {
            return Err(AppError::Validation(
                "surah_name: must not be empty".to_string(),
            ));
        }

        let student = self.student_repo.get_by_id(student_id).await?;
        let mut model: student::ActiveModel = student.into();
        model.juz_number = Set(juz_number);
        model.surah_name = Set(surah_name.to_string());
        model.verse_number = Set(verse_number);
        model.updated_at = Set(Some(Utc::now().into()));

        self.student_repo.update(model).await
    }

    /// Replace a student's notes. Blank notes clear them.
    pub async fn update_notes(
        &self,
        student_id: &str,
        notes: Option<&str>,
    ) -> AppResult<student::Model> {
        let notes = notes.map(str::trim).filter(|n| !n.is_empty());

        let student = self.student_repo.get_by_id(student_id).await?;
        let mut model: student::ActiveModel = student.into();
        model.notes = Set(notes.map(String::from));
        model.updated_at = Set(Some(Utc::now().into()));

        self.student_repo.update(model).await
    }

    /// Link a student to a parent account.
    pub async fn assign_parent(
        &self,
        student_id: &str,
        parent_id: &str,
    ) -> AppResult<student::Model> {
        self.require_role(parent_id, Role::Parent).await?;

        let student = self.student_repo.get_by_id(student_id).await?;
        let mut model: student::ActiveModel = student.into();
        model.parent_id = Set(Some(parent_id.to_string()));
        model.updated_at = Set(Some(Utc::now().into()));

        self.student_repo.update(model).await
    }

    /// Clear a student's parent link.
    pub async fn unassign_parent(&self, student_id: &str) -> AppResult<student::Model> {
        let student = self.student_repo.get_by_id(student_id).await?;
        let mut model: student::ActiveModel = student.into();
        model.parent_id = Set(None);
        model.updated_at = Set(Some(Utc::now().into()));

        self.student_repo.update(model).await
    }

    /// A teacher's roster, by name.
    pub async fn list_for_teacher(&self, teacher_id: &str) -> AppResult<Vec<student::Model>> {
        self.student_repo.find_by_teacher(teacher_id).await
    }

    /// A parent's children, by name.
    pub async fn list_for_parent(&self, parent_id: &str) -> AppResult<Vec<student::Model>> {
        self.student_repo.find_by_parent(parent_id).await
    }

    /// The student entity behind a student-role account.
    pub async fn find_for_account(&self, account_id: &str) -> AppResult<Option<student::Model>> {
        self.student_repo.find_by_account(account_id).await
    }

    /// Live roster of a teacher.
    #[must_use]
    pub fn watch_for_teacher(&self, teacher_id: &str) -> LiveStream<Vec<student::Model>> {
        self.student_repo.watch_by_teacher(teacher_id)
    }
}
