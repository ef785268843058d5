//! Live view models composed from several live queries.

use crate::services::daily_record::watch_today;
use crate::streams::{combine_latest2, combine_latest_all, switch_map};
use chrono::NaiveDate;
use chrono_tz::Tz;
use futures::StreamExt;
use hifz_db::{
    LiveStream, Store,
    entities::{Role, account, daily_record, message, student},
    repositories::{AccountRepository, DailyRecordRepository, MessageRepository, StudentRepository},
};
use sea_orm::prelude::DateTimeWithTimeZone;
use std::collections::HashMap;

/// A student with the record of the day being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub student: student::Model,
    pub record: Option<daily_record::Model>,
}

/// A parent with each linked child's record for today.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentOverview {
    pub parent: account::Model,
    pub children: Vec<RosterEntry>,
}

/// Summary of the messages exchanged with one counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub partner_id: String,
    pub partner_name: String,
    pub partner_role: Role,
    pub last_message: String,
    pub last_message_time: DateTimeWithTimeZone,
    pub last_message_id: String,
    /// Messages from the partner not yet read.
    pub unread_count: usize,
}

/// The most recently created of `records`; ties go to the larger id.
fn latest_record<'a>(
    records: impl IntoIterator<Item = &'a daily_record::Model>,
) -> Option<&'a daily_record::Model> {
    records
        .into_iter()
        .max_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)))
}

/// Pair every student with their record dated `day`, keeping roster order.
#[must_use]
pub fn join_roster_with_records(
    roster: Vec<student::Model>,
    records: &[daily_record::Model],
    day: NaiveDate,
) -> Vec<RosterEntry> {
    roster
        .into_iter()
        .map(|student| {
            let record = latest_record(
                records
                    .iter()
                    .filter(|r| r.student_id == student.id && r.record_date == day),
            )
            .cloned();
            RosterEntry { student, record }
        })
        .collect()
}

/// Group `messages` by counterpart as seen by `me`, newest conversation first.
///
/// Counterparts missing from `directory` are dropped. Messages with equal
/// timestamps are ordered by id.
#[must_use]
pub fn derive_conversations(
    me: &str,
    messages: &[message::Model],
    directory: &[account::Model],
) -> Vec<Conversation> {
    let accounts: HashMap<&str, &account::Model> =
        directory.iter().map(|a| (a.id.as_str(), a)).collect();

    let mut groups: HashMap<&str, (&message::Model, usize)> = HashMap::new();
    for message in messages {
        if message.sender_id != me && message.receiver_id != me {
            continue;
        }
        let partner = message.counterpart_of(me);
        if partner == me {
            continue;
        }

        let unread = usize::from(message.receiver_id == me && !message.is_read);
        groups
            .entry(partner)
            .and_modify(|(latest, count)| {
                if (message.created_at, &message.id) > (latest.created_at, &latest.id) {
                    *latest = message;
                }
                *count += unread;
            })
            .or_insert((message, unread));
    }

    let mut conversations: Vec<Conversation> = groups
        .into_iter()
        .filter_map(|(partner_id, (latest, unread_count))| {
            let partner = accounts.get(partner_id)?;
            Some(Conversation {
                partner_id: partner_id.to_string(),
                partner_name: partner.name.clone(),
                partner_role: partner.role,
                last_message: latest.content.clone(),
                last_message_time: latest.created_at,
                last_message_id: latest.id.clone(),
                unread_count,
            })
        })
        .collect();

    conversations.sort_by(|a, b| {
        (b.last_message_time, &b.last_message_id).cmp(&(a.last_message_time, &a.last_message_id))
    });
    conversations
}

/// Follow each child's record for `day`, re-subscribing whenever the set of
/// children changes.
fn children_on(
    children: LiveStream<Vec<student::Model>>,
    record_repo: DailyRecordRepository,
    day: NaiveDate,
) -> LiveStream<Vec<RosterEntry>> {
    switch_map(children, move |children: Vec<student::Model>| {
        let per_child = children
            .into_iter()
            .map(|child| {
                record_repo
                    .watch_for_student_on(&child.id, day)
                    .map(move |item| {
                        item.map(|records| RosterEntry {
                            record: latest_record(&records).cloned(),
                            student: child.clone(),
                        })
                    })
                    .boxed()
            })
            .collect();
        combine_latest_all(per_child)
    })
}

/// Live view service.
///
/// Views keyed on "today" follow the calendar: at local midnight their
/// record subscriptions are rebuilt for the new day.
#[derive(Clone)]
pub struct LiveViewService {
    account_repo: AccountRepository,
    student_repo: StudentRepository,
    record_repo: DailyRecordRepository,
    message_repo: MessageRepository,
    tz: Tz,
}

impl LiveViewService {
    /// Create a new live view service.
    #[must_use]
    pub fn new(store: Store, tz: Tz) -> Self {
        Self {
            account_repo: AccountRepository::new(store.clone()),
            student_repo: StudentRepository::new(store.clone()),
            record_repo: DailyRecordRepository::new(store.clone()),
            message_repo: MessageRepository::new(store),
            tz,
        }
    }

    /// A teacher's roster with each student's record for today.
    #[must_use]
    pub fn watch_roster_today(&self, teacher_id: &str) -> LiveStream<Vec<RosterEntry>> {
        let student_repo = self.student_repo.clone();
        let record_repo = self.record_repo.clone();
        let teacher_id = teacher_id.to_string();

        switch_map(watch_today(self.tz), move |day: NaiveDate| {
            combine_latest2(
                student_repo.watch_by_teacher(&teacher_id),
                record_repo.watch_on_date(day),
            )
            .map(move |item| {
                item.map(|(roster, records)| join_roster_with_records(roster, &records, day))
            })
            .boxed()
        })
    }

    /// A parent's children with each child's record for today.
    #[must_use]
    pub fn watch_children_today(&self, parent_id: &str) -> LiveStream<Vec<RosterEntry>> {
        let student_repo = self.student_repo.clone();
        let record_repo = self.record_repo.clone();
        let parent_id = parent_id.to_string();

        switch_map(watch_today(self.tz), move |day: NaiveDate| {
            children_on(
                student_repo.watch_by_parent(&parent_id),
                record_repo.clone(),
                day,
            )
        })
    }

    /// Every parent with their children's records for today.
    #[must_use]
    pub fn watch_parents_overview(&self) -> LiveStream<Vec<ParentOverview>> {
        let account_repo = self.account_repo.clone();
        let student_repo = self.student_repo.clone();
        let record_repo = self.record_repo.clone();

        switch_map(watch_today(self.tz), move |day: NaiveDate| {
            let student_repo = student_repo.clone();
            let record_repo = record_repo.clone();
            switch_map(
                account_repo.watch_by_role(Role::Parent),
                move |parents: Vec<account::Model>| {
                    let per_parent = parents
                        .into_iter()
                        .map(|parent| {
                            children_on(
                                student_repo.watch_by_parent(&parent.id),
                                record_repo.clone(),
                                day,
                            )
                            .map(move |item| {
                                item.map(|children| ParentOverview {
                                    parent: parent.clone(),
                                    children,
                                })
                            })
                            .boxed()
                        })
                        .collect();
                    combine_latest_all(per_parent)
                },
            )
        })
    }

    /// Conversation list of an account.
    #[must_use]
    pub fn watch_conversations(&self, account_id: &str) -> LiveStream<Vec<Conversation>> {
        let me = account_id.to_string();
        combine_latest2(
            self.message_repo.watch_involving(account_id),
            self.account_repo.watch_all(),
        )
        .map(move |item| item.map(|(messages, accounts)| derive_conversations(&me, &messages, &accounts)))
        .boxed()
    }
}
