//! Daily record service.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use futures::stream::{self, StreamExt};
use hifz_common::{AppError, AppResult, IdGenerator};
use hifz_db::{
    LiveStream, Store,
    codes::{Attendance, CodedCategory, Listener, Performance},
    entities::daily_record,
    repositories::{DailyRecordRepository, StudentRepository},
};
use sea_orm::Set;
use std::time::Duration;

/// A recited passage, from one surah/verse to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseRange {
    pub from_surah: String,
    pub from_verse: i32,
    pub to_surah: String,
    pub to_verse: i32,
    pub mistakes: i32,
}

impl VerseRange {
    fn check(&self, label: &str) -> AppResult<()> {
        if self.from_surah.trim().is_empty() || self.to_surah.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "{label}: both the start and end surah are required"
            )));
        }
        if self.from_verse < 1 || self.to_verse < 1 {
            return Err(AppError::Validation(format!(
                "{label}: verses start at 1"
            )));
        }
        if self.mistakes < 0 {
            return Err(AppError::Validation(format!(
                "{label}: mistakes cannot be negative"
            )));
        }
        Ok(())
    }
}

/// Input for recording one day.
#[derive(Debug, Clone)]
pub struct SubmitRecordInput {
    pub student_id: String,
    pub attendance: Attendance,
    pub memorization: Option<VerseRange>,
    pub review: Option<VerseRange>,
    pub performance: Option<Performance>,
    pub listener: Option<Listener>,
    pub listener_id: Option<String>,
    pub notes: Option<String>,
    /// Defaults to today.
    pub record_date: Option<NaiveDate>,
}

impl SubmitRecordInput {
    /// A present day with nothing else filled in.
    #[must_use]
    pub fn present(student_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            attendance: Attendance::Present,
            memorization: None,
            review: None,
            performance: None,
            listener: None,
            listener_id: None,
            notes: None,
            record_date: None,
        }
    }

    /// An absence.
    #[must_use]
    pub fn absent(student_id: impl Into<String>, attendance: Attendance) -> Self {
        Self {
            attendance,
            ..Self::present(student_id)
        }
    }

    fn check(&self) -> AppResult<()> {
        if !self.attendance.is_present()
            && (self.memorization.is_some()
                || self.review.is_some()
                || self.performance.is_some()
                || self.listener.is_some())
        {
            return Err(AppError::Validation(
                "An absent day cannot carry recitation data".to_string(),
            ));
        }
        if let Some(range) = &self.memorization {
            range.check("memorization")?;
        }
        if let Some(range) = &self.review {
            range.check("review")?;
        }
        Ok(())
    }
}

/// The calendar day `now` falls on in `tz`.
#[must_use]
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Time left until the next local midnight in `tz`.
///
/// A midnight skipped by a DST change falls back to a minute from now.
fn until_next_midnight(now: DateTime<Utc>, tz: Tz) -> Duration {
    now.with_timezone(&tz)
        .date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .and_then(|midnight| (midnight.with_timezone(&Utc) - now).to_std().ok())
        .unwrap_or(Duration::from_secs(60))
}

/// The current day in `tz`: today on subscription, then each new day as
/// local midnight passes.
#[must_use]
pub fn watch_today(tz: Tz) -> LiveStream<NaiveDate> {
    stream::unfold(None, move |previous: Option<NaiveDate>| async move {
        let mut today = today_in(tz);
        if let Some(previous) = previous {
            while today <= previous {
                tokio::time::sleep(until_next_midnight(Utc::now(), tz)).await;
                today = today_in(tz);
            }
        }
        Some((Ok(today), Some(today)))
    })
    .boxed()
}

/// Daily record service.
#[derive(Clone)]
pub struct DailyRecordService {
    record_repo: DailyRecordRepository,
    student_repo: StudentRepository,
    id_gen: IdGenerator,
    tz: Tz,
}

impl DailyRecordService {
    /// Create a new daily record service.
    #[must_use]
    pub fn new(store: Store, tz: Tz) -> Self {
        Self {
            record_repo: DailyRecordRepository::new(store.clone()),
            student_repo: StudentRepository::new(store),
            id_gen: IdGenerator::new(),
            tz,
        }
    }

    /// Today in the configured timezone.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        today_in(self.tz)
    }

    /// Record a day for a student.
    ///
    /// A student gets at most one record per calendar day; a second one is
    /// a [`AppError::Conflict`].
    pub async fn submit_record(
        &self,
        created_by: &str,
        input: SubmitRecordInput,
    ) -> AppResult<daily_record::Model> {
        input.check()?;

        let student = self.student_repo.get_by_id(&input.student_id).await?;
        let record_date = input.record_date.unwrap_or_else(|| self.today());

        if self
            .record_repo
            .exists_for_student_on(&student.id, record_date)
            .await?
        {
            return Err(AppError::Conflict(format!(
                "A record for {} on {record_date} already exists",
                student.name
            )));
        }

        let (memorization, review) = (input.memorization, input.review);
        let model = daily_record::ActiveModel {
            id: Set(self.id_gen.generate()),
            student_id: Set(student.id),
            record_date: Set(record_date),
            attendance: Set(input.attendance.code()),
            memorization_from_surah: Set(memorization.as_ref().map(|r| r.from_surah.clone())),
            memorization_from_verse: Set(memorization.as_ref().map(|r| r.from_verse)),
            memorization_to_surah: Set(memorization.as_ref().map(|r| r.to_surah.clone())),
            memorization_to_verse: Set(memorization.as_ref().map(|r| r.to_verse)),
            memorization_mistakes: Set(memorization.as_ref().map(|r| r.mistakes)),
            review_from_surah: Set(review.as_ref().map(|r| r.from_surah.clone())),
            review_from_verse: Set(review.as_ref().map(|r| r.from_verse)),
            review_to_surah: Set(review.as_ref().map(|r| r.to_surah.clone())),
            review_to_verse: Set(review.as_ref().map(|r| r.to_verse)),
            review_mistakes: Set(review.as_ref().map(|r| r.mistakes)),
            performance: Set(input.performance.map(Performance::code)),
            listener: Set(input.listener.map(Listener::code)),
            listener_id: Set(input.listener_id),
            notes: Set(input.notes.filter(|n| !n.trim().is_empty())),
            created_by: Set(Some(created_by.to_string())),
            created_at: Set(Utc::now().into()),
        };

        // The unique (student, day) index settles concurrent submissions.
        let record = self.record_repo.create(model).await.map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict(format!(
                "A record for {} on {record_date} already exists",
                student.name
            )),
            other => other,
        })?;
        tracing::debug!(record_id = %record.id, student_id = %record.student_id, "Daily record saved");
        Ok(record)
    }

    /// A student's history, newest day first.
    pub async fn records_for_student(
        &self,
        student_id: &str,
    ) -> AppResult<Vec<daily_record::Model>> {
        self.record_repo.find_by_student(student_id).await
    }

    /// Records dated within `from..=to`.
    pub async fn records_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        student_id: Option<&str>,
    ) -> AppResult<Vec<daily_record::Model>> {
        if from > to {
            return Err(AppError::BadRequest(format!(
                "Empty date range: {from} is after {to}"
            )));
        }
        self.record_repo.find_between(from, to, student_id).await
    }

    /// Today's record for a student, if any.
    pub async fn today_record(&self, student_id: &str) -> AppResult<Option<daily_record::Model>> {
        Ok(self
            .record_repo
            .find_for_student_on(student_id, self.today())
            .await?
            .into_iter()
            .next())
    }
}
