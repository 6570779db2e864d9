//! Model operations against a real database.
//!
//! Each test gets a fresh database with the migrations applied. Run them with
//! `DATABASE_URL` pointing at a PostgreSQL server and `--ignored`.

use phoenix::config::{Config, ProfilePolicy};
use phoenix::error::CenterError;
use phoenix::models::account::{LoginForm, UserAccount};
use phoenix::models::attendance::{Attendance, AttendanceMark};
use phoenix::models::fee::{CashEntry, CashPeriod, StudentGroupFee, ValidPayment};
use phoenix::models::group::{Group, NewGroup};
use phoenix::models::membership::Membership;
use phoenix::models::note::{StudentNote, ValidNote};
use phoenix::models::report::StudentReport;
use phoenix::models::room::Room;
use phoenix::models::schedule::{ScheduleBatch, ScheduleEdit, ScheduleSlot};
use phoenix::models::student::{NewStudent, Student};
use phoenix::models::teacher::{NewTeacher, Teacher};
use phoenix::util::LooseNumber;
use serde_json::json;
use sqlx::PgPool;
use time::macros::{date, datetime};
use time::PrimitiveDateTime;

const TABLES: [&str; 10] = [
    "grades",
    "teachers",
    "users",
    "students",
    "study_groups",
    "group_students",
    "schedule",
    "attendance",
    "student_notes",
    "student_group_fees",
];

async fn new_grade(name: &str, pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO grades (name) VALUES ($1) RETURNING grade_id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn new_room(name: &str, pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>("INSERT INTO rooms (name) VALUES ($1) RETURNING room_id")
        .bind(name)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn new_teacher(first_name: &str, pool: &PgPool) -> i64 {
    let new_teacher = NewTeacher {
        first_name: Some(first_name.to_owned()),
        last_name: Some("Hassan".to_owned()),
        phone_number: Some("+20 100 555 0101".to_owned()),
        ..NewTeacher::default()
    };

    Teacher::create(new_teacher, &Config::default(), pool)
        .await
        .unwrap()
        .teacher
        .teacher_id
}

async fn new_student(name: &str, grade_id: i64, pool: &PgPool) -> i64 {
    let new_student = NewStudent {
        name: Some(name.to_owned()),
        grade_id: Some(LooseNumber::Number(grade_id)),
        ..NewStudent::default()
    };

    Student::create(new_student, pool).await.unwrap().student_id
}

fn group_fields(name: &str, grade_id: i64, teacher_id: i64) -> NewGroup {
    NewGroup {
        name: Some(name.to_owned()),
        grade_id: Some(LooseNumber::Number(grade_id)),
        teacher_id: Some(LooseNumber::Number(teacher_id)),
    }
}

async fn new_group(name: &str, grade_id: i64, teacher_id: i64, pool: &PgPool) -> i64 {
    Group::create(group_fields(name, grade_id, teacher_id), pool)
        .await
        .unwrap()
        .group_id
}

async fn new_slot(group_id: i64, room_id: i64, pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO schedule (group_id, room_id, class_date, start_time, end_time, day)
         VALUES ($1, $2, '2026-10-17', '2026-01-01 09:00:00', '2026-01-01 10:30:00', 'Saturday')
         RETURNING schedule_id",
    )
    .bind(group_id)
    .bind(room_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

async fn count(sql: &str, id: i64, pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn table_sizes(pool: &PgPool) -> Vec<i64> {
    let mut sizes = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let size = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap();
        sizes.push(size);
    }

    sizes
}

fn note(student_id: i64, schedule_id: i64, text: &str, rating: Option<i32>) -> ValidNote {
    ValidNote {
        student_id,
        schedule_id,
        date: date!(2026 - 10 - 17),
        text: text.to_owned(),
        rating,
    }
}

fn payment(
    student_id: i64,
    group_id: i64,
    month: i32,
    amount_paid: i32,
    is_paid: bool,
    created_at: PrimitiveDateTime,
) -> ValidPayment {
    ValidPayment {
        student_id,
        group_id,
        year: 2026,
        month,
        amount_paid,
        is_paid,
        created_at,
    }
}

fn cash_total(entries: &[CashEntry]) -> i32 {
    entries.iter().map(|entry| entry.amount_paid).sum()
}

fn mark(schedule_id: i64, student_id: i64, status: &str) -> AttendanceMark {
    AttendanceMark {
        schedule_id: Some(LooseNumber::Number(schedule_id)),
        student_id: Some(LooseNumber::Number(student_id)),
        status: Some(status.to_owned()),
        attendance_date: Some("2026-10-17".to_owned()),
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn marking_attendance_twice_keeps_one_row(pool: PgPool) {
    let grade = new_grade("Grade 10", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Physics A", grade, teacher, &pool).await;
    let student = new_student("Mona Ali", grade, &pool).await;
    let slot = new_slot(group, new_room("Room 1", &pool).await, &pool).await;

    Attendance::record(mark(slot, student, "present").validate().unwrap(), &pool)
        .await
        .unwrap();
    Attendance::record(mark(slot, student, "late").validate().unwrap(), &pool)
        .await
        .unwrap();

    let entries = Attendance::for_slot_on(slot, date!(2026 - 10 - 17), &pool)
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].student_id, student);
    assert_eq!(entries[0].status, "late");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn deleting_a_teacher_removes_everything_under_them(pool: PgPool) {
    let grade = new_grade("Grade 11", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let other_teacher = new_teacher("Salma", &pool).await;
    let group = new_group("Chemistry", grade, teacher, &pool).await;
    let kept_group = new_group("Biology", grade, other_teacher, &pool).await;
    let student = new_student("Youssef", grade, &pool).await;
    Membership::add(group, student, &pool).await.unwrap();
    Membership::add(kept_group, student, &pool).await.unwrap();
    let slot = new_slot(group, new_room("Lab", &pool).await, &pool).await;
    Attendance::record(mark(slot, student, "absent").validate().unwrap(), &pool)
        .await
        .unwrap();
    StudentNote::record(note(student, slot, "Missed the lab", Some(2)), &pool)
        .await
        .unwrap();
    let paid_at = datetime!(2026-10-05 10:00);
    StudentGroupFee::record(payment(student, group, 10, 300, true, paid_at), &pool)
        .await
        .unwrap();
    StudentGroupFee::record(payment(student, kept_group, 10, 250, true, paid_at), &pool)
        .await
        .unwrap();

    Teacher::delete(teacher, &pool).await.unwrap();

    assert!(Teacher::with_id_opt(teacher, &pool).await.unwrap().is_none());
    assert!(Group::with_id_opt(group, &pool).await.unwrap().is_none());
    assert_eq!(
        count("SELECT COUNT(*) FROM users WHERE teacher_id = $1", teacher, &pool).await,
        0
    );
    assert_eq!(
        count("SELECT COUNT(*) FROM attendance WHERE student_id = $1", student, &pool).await,
        0
    );
    assert_eq!(
        count("SELECT COUNT(*) FROM student_notes WHERE student_id = $1", student, &pool).await,
        0
    );
    assert_eq!(
        count("SELECT COUNT(*) FROM student_group_fees WHERE group_id = $1", group, &pool).await,
        0
    );
    assert_eq!(
        count("SELECT COUNT(*) FROM schedule WHERE group_id = $1", group, &pool).await,
        0
    );
    assert_eq!(
        count("SELECT COUNT(*) FROM student_group_fees WHERE group_id = $1", kept_group, &pool)
            .await,
        1
    );
    assert_eq!(Membership::members(kept_group, &pool).await.unwrap().len(), 1);
    assert!(Student::with_id_opt(student, &pool).await.unwrap().is_some());

    let before = table_sizes(&pool).await;
    assert!(matches!(
        Teacher::delete(teacher, &pool).await,
        Err(CenterError::NotFound(_))
    ));
    assert_eq!(table_sizes(&pool).await, before);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn deleting_a_student_removes_their_records(pool: PgPool) {
    let grade = new_grade("Grade 10", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Physics A", grade, teacher, &pool).await;
    let student = new_student("Mona Ali", grade, &pool).await;
    let classmate = new_student("Hana", grade, &pool).await;
    Membership::add(group, student, &pool).await.unwrap();
    Membership::add(group, classmate, &pool).await.unwrap();
    let slot = new_slot(group, new_room("Room 1", &pool).await, &pool).await;
    for who in [student, classmate] {
        Attendance::record(mark(slot, who, "present").validate().unwrap(), &pool)
            .await
            .unwrap();
        StudentNote::record(note(who, slot, "Good work", Some(4)), &pool)
            .await
            .unwrap();
        StudentGroupFee::record(
            payment(who, group, 10, 300, true, datetime!(2026-10-05 10:00)),
            &pool,
        )
        .await
        .unwrap();
    }

    Student::delete(student, &pool).await.unwrap();

    assert!(Student::with_id_opt(student, &pool).await.unwrap().is_none());
    for table in ["attendance", "student_notes", "student_group_fees", "group_students"] {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE student_id = $1", table);
        assert_eq!(count(&sql, student, &pool).await, 0, "{} kept rows", table);
        assert_eq!(count(&sql, classmate, &pool).await, 1, "{} lost rows", table);
    }
    assert!(Group::with_id_opt(group, &pool).await.unwrap().is_some());

    let before = table_sizes(&pool).await;
    assert!(matches!(
        Student::delete(student, &pool).await,
        Err(CenterError::NotFound(_))
    ));
    assert_eq!(table_sizes(&pool).await, before);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn deleting_a_group_removes_its_slots_and_records(pool: PgPool) {
    let grade = new_grade("Grade 12", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("History", grade, teacher, &pool).await;
    let kept_group = new_group("Geography", grade, teacher, &pool).await;
    let student = new_student("Ziad", grade, &pool).await;
    Membership::add(group, student, &pool).await.unwrap();
    Membership::add(kept_group, student, &pool).await.unwrap();
    let room = new_room("Room 4", &pool).await;
    let slot = new_slot(group, room, &pool).await;
    let kept_slot = new_slot(kept_group, room, &pool).await;
    for (group_id, slot_id) in [(group, slot), (kept_group, kept_slot)] {
        Attendance::record(mark(slot_id, student, "late").validate().unwrap(), &pool)
            .await
            .unwrap();
        StudentNote::record(note(student, slot_id, "Late again", Some(3)), &pool)
            .await
            .unwrap();
        StudentGroupFee::record(
            payment(student, group_id, 9, 200, true, datetime!(2026-09-03 18:00)),
            &pool,
        )
        .await
        .unwrap();
    }

    Group::delete(group, &pool).await.unwrap();

    assert!(Group::with_id_opt(group, &pool).await.unwrap().is_none());
    for sql in [
        "SELECT COUNT(*) FROM attendance WHERE schedule_id = $1",
        "SELECT COUNT(*) FROM student_notes WHERE schedule_id = $1",
    ] {
        assert_eq!(count(sql, slot, &pool).await, 0);
        assert_eq!(count(sql, kept_slot, &pool).await, 1);
    }
    for sql in [
        "SELECT COUNT(*) FROM student_group_fees WHERE group_id = $1",
        "SELECT COUNT(*) FROM group_students WHERE group_id = $1",
        "SELECT COUNT(*) FROM schedule WHERE group_id = $1",
    ] {
        assert_eq!(count(sql, group, &pool).await, 0);
        assert_eq!(count(sql, kept_group, &pool).await, 1);
    }
    assert!(Student::with_id_opt(student, &pool).await.unwrap().is_some());

    let before = table_sizes(&pool).await;
    assert!(matches!(
        Group::delete(group, &pool).await,
        Err(CenterError::NotFound(_))
    ));
    assert_eq!(table_sizes(&pool).await, before);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn students_only_join_groups_of_their_grade(pool: PgPool) {
    let grade_10 = new_grade("Grade 10", &pool).await;
    let grade_11 = new_grade("Grade 11", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Math 10", grade_10, teacher, &pool).await;
    let student = new_student("Karim", grade_11, &pool).await;

    let result = Membership::add(group, student, &pool).await;

    assert!(matches!(result, Err(CenterError::Conflict(_))));
    assert!(Membership::members(group, &pool).await.unwrap().is_empty());
    assert!(Membership::eligible(group, &pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn only_a_grade_change_drops_group_members(pool: PgPool) {
    let grade_10 = new_grade("Grade 10", &pool).await;
    let grade_11 = new_grade("Grade 11", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let other_teacher = new_teacher("Salma", &pool).await;
    let group = new_group("English 10", grade_10, teacher, &pool).await;
    let student = new_student("Nour", grade_10, &pool).await;
    Membership::add(group, student, &pool).await.unwrap();

    let updated = Group::update(group, group_fields("English 10", grade_10, other_teacher), &pool)
        .await
        .unwrap();

    assert_eq!(updated.teacher_id, other_teacher);
    assert_eq!(Membership::members(group, &pool).await.unwrap().len(), 1);

    Group::update(group, group_fields("English 10", grade_11, other_teacher), &pool)
        .await
        .unwrap();

    assert!(Membership::members(group, &pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn group_names_are_unique(pool: PgPool) {
    let grade = new_grade("Grade 12", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let first = new_group("Arabic", grade, teacher, &pool).await;

    let duplicate = Group::create(group_fields("Arabic", grade, teacher), &pool).await;

    assert!(matches!(duplicate, Err(CenterError::Conflict(_))));
    let kept = Group::with_id(first, &pool).await.unwrap();
    assert_eq!(kept.name, "Arabic");
    assert_eq!(kept.teacher_id, teacher);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn schedule_batches_apply_valid_rows_and_skip_the_rest(pool: PgPool) {
    let grade = new_grade("Grade 9", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Science 9", grade, teacher, &pool).await;
    let room = new_room("Room 2", &pool).await;
    let doomed = new_slot(group, room, &pool).await;

    let new_row = ScheduleEdit {
        group_id: Some(LooseNumber::Number(group)),
        room_id: Some(LooseNumber::Text(room.to_string())),
        class_date: Some("2026-10-19".to_owned()),
        start_time: Some("16:00".to_owned()),
        end_time: Some("17:30".to_owned()),
        state: Some("new".to_owned()),
        ..ScheduleEdit::default()
    };
    let missing_start = ScheduleEdit {
        start_time: None,
        ..new_row.clone()
    };
    let delete_row = ScheduleEdit {
        schedule_id: Some(LooseNumber::Number(doomed)),
        start_time: Some("09:00".to_owned()),
        state: Some("deleted".to_owned()),
        ..ScheduleEdit::default()
    };

    let outcome = ScheduleBatch::prepare(&[new_row, missing_start, delete_row])
        .apply(&pool)
        .await
        .unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.applied, 2);
    assert_eq!(outcome.skipped, 1);

    let slots = ScheduleSlot::all(&pool).await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].day, "Monday");
    assert_eq!(slots[0].class_date, date!(2026 - 10 - 19));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn mistyped_batch_rows_are_skipped_and_the_rest_applied(pool: PgPool) {
    let grade = new_grade("Grade 9", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Science 9", grade, teacher, &pool).await;
    let doomed = new_slot(group, new_room("Room 2", &pool).await, &pool).await;

    let batch = ScheduleBatch::from_json(vec![
        json!({ "schedule_id": doomed, "start_time": 900, "_state": "deleted" }),
        json!({ "schedule_id": doomed, "start_time": "09:00", "_state": "deleted" }),
    ]);
    let outcome = batch.apply(&pool).await.unwrap();

    assert_eq!(outcome.applied, 1);
    assert_eq!(outcome.skipped, 1);
    assert!(ScheduleSlot::all(&pool).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn failed_batches_leave_the_timetable_untouched(pool: PgPool) {
    let grade = new_grade("Grade 9", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Science 9", grade, teacher, &pool).await;
    let room = new_room("Room 2", &pool).await;
    let kept = new_slot(group, room, &pool).await;

    let delete_row = ScheduleEdit {
        schedule_id: Some(LooseNumber::Number(kept)),
        start_time: Some("09:00".to_owned()),
        state: Some("deleted".to_owned()),
        ..ScheduleEdit::default()
    };
    let unknown_group = ScheduleEdit {
        group_id: Some(LooseNumber::Number(9999)),
        room_id: Some(LooseNumber::Number(room)),
        class_date: Some("2026-10-19".to_owned()),
        start_time: Some("16:00".to_owned()),
        end_time: Some("17:30".to_owned()),
        state: Some("new".to_owned()),
        ..ScheduleEdit::default()
    };

    let result = ScheduleBatch::prepare(&[delete_row, unknown_group])
        .apply(&pool)
        .await;

    assert!(matches!(result, Err(CenterError::Conflict(_))));
    let slots = ScheduleSlot::all(&pool).await.unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].schedule_id, kept);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn noting_a_student_twice_keeps_one_note(pool: PgPool) {
    let grade = new_grade("Grade 10", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Physics A", grade, teacher, &pool).await;
    let student = new_student("Mona Ali", grade, &pool).await;
    let slot = new_slot(group, new_room("Room 1", &pool).await, &pool).await;

    StudentNote::record(note(student, slot, "Distracted", Some(2)), &pool)
        .await
        .unwrap();
    StudentNote::record(note(student, slot, "Caught up after the break", Some(4)), &pool)
        .await
        .unwrap();

    let notes = StudentNote::for_slot(slot, &pool).await.unwrap();

    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].student_id, student);
    assert_eq!(notes[0].note_text, "Caught up after the break");
    assert_eq!(notes[0].rating, Some(4));
    assert_eq!(notes[0].note_date, date!(2026 - 10 - 17));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn paying_a_month_twice_keeps_one_fee(pool: PgPool) {
    let grade = new_grade("Grade 10", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Physics A", grade, teacher, &pool).await;
    let student = new_student("Mona Ali", grade, &pool).await;
    Membership::add(group, student, &pool).await.unwrap();

    StudentGroupFee::record(
        payment(student, group, 10, 150, false, datetime!(2026-10-01 09:00)),
        &pool,
    )
    .await
    .unwrap();
    StudentGroupFee::record(
        payment(student, group, 10, 300, true, datetime!(2026-10-04 17:15)),
        &pool,
    )
    .await
    .unwrap();

    let fees = StudentGroupFee::for_student(student, 2026, &pool).await.unwrap();

    assert_eq!(fees.len(), 1);
    assert_eq!(fees[0].fee_month, Some(10));
    assert_eq!(fees[0].amount_paid, 300);
    assert!(fees[0].is_paid);
    assert_eq!(
        count("SELECT COUNT(*) FROM student_group_fees WHERE student_id = $1", student, &pool).await,
        1
    );
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn cash_reports_total_paid_fees_in_the_period(pool: PgPool) {
    let grade = new_grade("Grade 11", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Chemistry", grade, teacher, &pool).await;
    let student = new_student("Youssef", grade, &pool).await;

    for (month, amount, paid, created_at) in [
        (9, 200, true, datetime!(2026-09-28 11:00)),
        (10, 300, true, datetime!(2026-10-04 10:00)),
        (11, 350, true, datetime!(2026-10-04 16:30)),
        (12, 400, false, datetime!(2026-10-04 17:00)),
        (1, 500, true, datetime!(2025-12-30 12:00)),
    ] {
        StudentGroupFee::record(payment(student, group, month, amount, paid, created_at), &pool)
            .await
            .unwrap();
    }

    let day = StudentGroupFee::cash_report(CashPeriod::Day(date!(2026 - 10 - 04)), &pool)
        .await
        .unwrap();
    assert_eq!(day.len(), 2);
    assert_eq!(cash_total(&day), 650);
    assert_eq!(day[0].fee_month, 11);
    assert_eq!(day[0].student_name, "Youssef");
    assert_eq!(day[0].group_name, "Chemistry");

    let month = StudentGroupFee::cash_report(CashPeriod::Month { year: 2026, month: 9 }, &pool)
        .await
        .unwrap();
    assert_eq!(month.len(), 1);
    assert_eq!(cash_total(&month), 200);

    let year = StudentGroupFee::cash_report(CashPeriod::Year(2026), &pool)
        .await
        .unwrap();
    assert_eq!(year.len(), 3);
    assert_eq!(cash_total(&year), 850);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn reports_cover_recent_notes_and_attendance(pool: PgPool) {
    let grade = new_grade("Grade 10", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Physics B", grade, teacher, &pool).await;
    let student = new_student("Laila", grade, &pool).await;
    let slot = new_slot(group, new_room("Room 3", &pool).await, &pool).await;

    for (days_ago, text, rating) in [
        (1, "Solved every problem", 5),
        (2, "تقييم سريع", 3),
        (60, "Too old to count", 1),
    ] {
        sqlx::query(
            "INSERT INTO student_notes (student_id, schedule_id, note_date, note_text, rating)
             VALUES ($1, $2, CURRENT_DATE - $3, $4, $5)",
        )
        .bind(student)
        .bind(slot)
        .bind(days_ago)
        .bind(text)
        .bind(rating)
        .execute(&pool)
        .await
        .unwrap();
    }
    sqlx::query(
        "INSERT INTO attendance (schedule_id, student_id, attendance_date, status)
         VALUES ($1, $2, CURRENT_DATE - 1, 'present')",
    )
    .bind(slot)
    .bind(student)
    .execute(&pool)
    .await
    .unwrap();

    let report = StudentReport::for_student(student, &pool).await.unwrap();

    assert_eq!(report.groups.len(), 1);
    let physics = &report.groups[0];
    assert_eq!(physics.ratings_count, 2);
    assert_eq!(physics.avg_rating, Some(4.0));
    assert_eq!(physics.present_count, 1);
    assert!(physics.notes.ends_with(" : Solved every problem"));
    assert!(!physics.notes.contains("Too old"));
    assert_eq!(report.overall_rating, 4.0);

    let summary = StudentReport::summary(student, &pool).await.unwrap();
    assert_eq!(summary.name, "Laila");
    assert_eq!(summary.presence_days, 1);
    assert_eq!(summary.total_notes, 3);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn login_profile_depends_on_the_policy(pool: PgPool) {
    let teacher = new_teacher("Omar", &pool).await;
    let pass_hash = bcrypt::hash("Assist4nt!", 4).unwrap();
    sqlx::query(
        "INSERT INTO users (username, password, role, teacher_id)
         VALUES ('front_desk', $1, 'assistant', $2)",
    )
    .bind(pass_hash)
    .bind(teacher)
    .execute(&pool)
    .await
    .unwrap();

    let form = || LoginForm {
        username: Some("front_desk".to_owned()),
        password: Some("Assist4nt!".to_owned()),
    };

    let enriched = UserAccount::login(form(), ProfilePolicy::AllLogins, &pool)
        .await
        .unwrap();
    let plain = UserAccount::login(form(), ProfilePolicy::TeacherAndAdmin, &pool)
        .await
        .unwrap();

    assert_eq!(enriched.teacher.unwrap().first_name, "Omar");
    assert!(plain.teacher.is_none());
    assert_eq!(plain.teacher_id, Some(teacher));

    let wrong = UserAccount::login(
        LoginForm {
            password: Some("nope".to_owned()),
            ..form()
        },
        ProfilePolicy::AllLogins,
        &pool,
    )
    .await;
    assert!(matches!(wrong, Err(CenterError::Auth(_))));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs a PostgreSQL DATABASE_URL"]
async fn rooms_in_use_right_now_are_occupied(pool: PgPool) {
    let grade = new_grade("Grade 8", &pool).await;
    let teacher = new_teacher("Omar", &pool).await;
    let group = new_group("Math 8", grade, teacher, &pool).await;
    let busy = new_room("Busy", &pool).await;
    let free = new_room("Free", &pool).await;
    let timezone = Config::default().civil_timezone;

    sqlx::query(
        "INSERT INTO schedule (group_id, room_id, class_date, start_time, end_time, day)
         VALUES ($1, $2, CURRENT_DATE, '2026-01-01 00:00:00', '2026-01-01 23:59:59',
                 to_char(now() AT TIME ZONE $3, 'FMDay'))",
    )
    .bind(group)
    .bind(busy)
    .bind(&timezone)
    .execute(&pool)
    .await
    .unwrap();

    let rooms = Room::all_with_occupancy(&timezone, &pool).await.unwrap();
    let occupied = |id: i64| rooms.iter().find(|room| room.room_id == id).unwrap().is_occupied;

    assert!(occupied(busy));
    assert!(!occupied(free));
}
