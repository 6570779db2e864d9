//! All routes for the API.
//!
//! | Method | Path | Handler |
//! |---|---|---|
//! | GET | /health | [health](misc_routes::health) |
//! | POST | /api/login | [login](auth_routes::login) |
//! | POST | /api/change-password | [change_password](auth_routes::change_password) |
//! | GET | /api/teachers | [get_teachers](teacher_routes::get_teachers) |
//! | POST | /api/admin/teachers | [new_teacher](teacher_routes::new_teacher) |
//! | GET, PUT, DELETE | /api/admin/teachers/:id | [teacher_routes] |
//! | POST | /api/change-teacher-image | [change_teacher_image](teacher_routes::change_teacher_image) |
//! | GET | /api/teacher/schedule?teacherId= | [teacher_schedule](teacher_routes::teacher_schedule) |
//! | GET | /api/teacher/:id/day-summary?date= | [day_summary](teacher_routes::day_summary) |
//! | GET | /api/teacher/:id/students | [student_count](teacher_routes::student_count) |
//! | GET | /api/Grads, /api/grades | [get_grades](misc_routes::get_grades) |
//! | GET | /api/students | [get_students](student_routes::get_students) |
//! | GET | /api/students/search?name= | [search_students](student_routes::search_students) |
//! | GET, POST | /api/admin/students | [student_routes] |
//! | PUT, DELETE | /api/admin/students/:id | [student_routes] |
//! | GET, POST | /api/admin/groups | [group_routes] |
//! | PUT, DELETE | /api/admin/groups/:id | [group_routes] |
//! | GET, POST | /api/admin/groups/:id/students | [group_routes] |
//! | GET | /api/admin/groups/:id/eligible-students | [eligible_students](group_routes::eligible_students) |
//! | DELETE | /api/admin/groups/:id/students/:studentId | [remove_member](group_routes::remove_member) |
//! | GET | /api/Rooms | [get_rooms](misc_routes::get_rooms) |
//! | GET, POST | /api/schedules | [schedule_routes] |
//! | GET | /api/schedule/:id/students | [slot_students](schedule_routes::slot_students) |
//! | GET | /api/schedule/:id/notes | [slot_notes](schedule_routes::slot_notes) |
//! | GET, POST | /api/attendance | [attendance_routes] |
//! | POST | /api/student/:id/note | [record_note](attendance_routes::record_note) |
//! | GET | /api/student/:id/report | [student_report](attendance_routes::student_report) |
//! | GET | /api/student/:id/report/summary | [report_summary](attendance_routes::report_summary) |
//! | GET | /api/student/:id/report/attendance-summary | [attendance_summary](attendance_routes::attendance_summary) |
//! | GET | /api/studentfinance?STUDENT_ID=&YEAR= | [student_finance](finance_routes::student_finance) |
//! | POST | /api/studentfinance/update | [update_finance](finance_routes::update_finance) |
//! | GET | /api/cash-report?type= | [cash_report](finance_routes::cash_report) |

pub mod attendance_routes;
pub mod auth_routes;
pub mod finance_routes;
pub mod group_routes;
pub mod misc_routes;
pub mod schedule_routes;
pub mod student_routes;
pub mod teacher_routes;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{Extension, Router};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;

/// The main entry-point for the whole crate.
///
/// Every handler gets the pool and the configuration through
/// [Extension]s and answers with JSON. Errors are rendered by
/// [CenterError](crate::error::CenterError).
pub fn router(pool: PgPool, config: Config) -> Router {
    Router::new()
        .route("/health", get(misc_routes::health))
        .route("/api/login", post(auth_routes::login))
        .route("/api/change-password", post(auth_routes::change_password))
        .route("/api/teachers", get(teacher_routes::get_teachers))
        .route("/api/admin/teachers", post(teacher_routes::new_teacher))
        .route(
            "/api/admin/teachers/:id",
            get(teacher_routes::get_teacher)
                .put(teacher_routes::update_teacher)
                .delete(teacher_routes::delete_teacher),
        )
        .route(
            "/api/change-teacher-image",
            post(teacher_routes::change_teacher_image),
        )
        .route("/api/teacher/:id", get(teacher_routes::teacher_schedule))
        .route(
            "/api/teacher/:id/day-summary",
            get(teacher_routes::day_summary),
        )
        .route("/api/teacher/:id/students", get(teacher_routes::student_count))
        .route("/api/Grads", get(misc_routes::get_grades))
        .route("/api/grades", get(misc_routes::get_grades))
        .route("/api/students", get(student_routes::get_students))
        .route("/api/students/search", get(student_routes::search_students))
        .route(
            "/api/admin/students",
            get(student_routes::get_students).post(student_routes::new_student),
        )
        .route(
            "/api/admin/students/:id",
            put(student_routes::update_student).delete(student_routes::delete_student),
        )
        .route(
            "/api/admin/groups",
            get(group_routes::get_groups).post(group_routes::new_group),
        )
        .route(
            "/api/admin/groups/:id",
            put(group_routes::update_group).delete(group_routes::delete_group),
        )
        .route(
            "/api/admin/groups/:id/students",
            get(group_routes::group_members).post(group_routes::add_member),
        )
        .route(
            "/api/admin/groups/:id/eligible-students",
            get(group_routes::eligible_students),
        )
        .route(
            "/api/admin/groups/:id/students/:student_id",
            delete(group_routes::remove_member),
        )
        .route("/api/Rooms", get(misc_routes::get_rooms))
        .route(
            "/api/schedules",
            get(schedule_routes::get_schedules).post(schedule_routes::save_schedules),
        )
        .route(
            "/api/schedule/:id/students",
            get(schedule_routes::slot_students),
        )
        .route("/api/schedule/:id/notes", get(schedule_routes::slot_notes))
        .route(
            "/api/attendance",
            get(attendance_routes::get_attendance).post(attendance_routes::mark_attendance),
        )
        .route(
            "/api/student/:id/note",
            post(attendance_routes::record_note),
        )
        .route(
            "/api/student/:id/report",
            get(attendance_routes::student_report),
        )
        .route(
            "/api/student/:id/report/summary",
            get(attendance_routes::report_summary),
        )
        .route(
            "/api/student/:id/report/attendance-summary",
            get(attendance_routes::attendance_summary),
        )
        .route(
            "/api/studentfinance",
            get(finance_routes::student_finance),
        )
        .route(
            "/api/studentfinance/update",
            post(finance_routes::update_finance),
        )
        .route("/api/cash-report", get(finance_routes::cash_report))
        .layer(Extension(pool))
        .layer(Extension(Arc::new(config)))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub fn basic_success() -> Value {
    json!({ "success": true })
}
