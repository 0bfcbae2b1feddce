use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use rust_xlsxwriter::{Workbook, XlsxError};
use serde_json::{json, Value};

use cursus_ledger::{CourseSummary, RosterExport};

use crate::error::AppError;
use crate::state::AppState;

const SHEET_NAME: &str = "Deelnemers";
const COLUMNS: [(&str, f64); 8] = [
    ("Aanhef", 10.0),
    ("Voornaam", 20.0),
    ("Tussenvoegsel", 15.0),
    ("Achternaam", 25.0),
    ("Email", 35.0),
    ("Telefoon", 18.0),
    ("Geboortedatum", 18.0),
    ("Betaaldatum", 15.0),
];

/// GET /api/webmaster/courses
/// Booking totals per course for the dashboard; courses without paid
/// participants are excluded.
pub async fn webmaster_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let summaries = state
        .roster
        .courses_with_bookings()
        .await
        .map_err(AppError::from_ledger)?;
    Ok(Json(summaries))
}

/// GET /api/webmaster/export/{course_id}
/// The participant roster of one course as a downloadable spreadsheet.
pub async fn export_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Response, AppError> {
    let export = state
        .roster
        .export_roster(&course_id)
        .await
        .map_err(AppError::from_ledger)?;
    let buffer = write_workbook(&export)?;

    let filename = format!("deelnemers-{}.xlsx", hyphenated(&export.course_title));
    Response::builder()
        .status(StatusCode::OK)
        .header(
            header::CONTENT_TYPE,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        )
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(buffer))
        .map_err(|e| AppError::Anyhow(e.into()))
}

/// POST /api/webmaster/recount/{course_id}
/// Rewrites the course's booked-seats counter from the paid
/// transaction history.
pub async fn recount_course(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booked = state
        .reconciler
        .recount_course(&course_id)
        .await
        .map_err(AppError::from_ledger)?;
    Ok(Json(json!({
        "courseId": course_id,
        "bookedSpots": booked,
    })))
}

fn write_workbook(export: &RosterExport) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;

    for (index, (title, width)) in COLUMNS.iter().enumerate() {
        let col = index as u16;
        worksheet.write(0, col, *title)?;
        worksheet.set_column_width(col, *width)?;
    }

    for (index, row) in export.rows.iter().enumerate() {
        let r = index as u32 + 1;
        worksheet.write(r, 0, row.salutation.as_str())?;
        worksheet.write(r, 1, row.first_name.as_str())?;
        worksheet.write(r, 2, row.infix.as_str())?;
        worksheet.write(r, 3, row.last_name.as_str())?;
        worksheet.write(r, 4, row.email.as_str())?;
        worksheet.write(r, 5, row.phone.as_str())?;
        worksheet.write(r, 6, row.date_of_birth.as_str())?;
        worksheet.write(r, 7, row.payment_date.as_str())?;
    }

    workbook.save_to_buffer()
}

fn hyphenated(title: &str) -> String {
    title.split_whitespace().collect::<Vec<_>>().join("-")
}
