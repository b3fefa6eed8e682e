use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;
use tracing::info;

use super::connection;
use crate::api::error::{ApiError, ApiResult};
use crate::api::extract::Admin;
use crate::api::server::AppState;
use crate::auth::token::attendee_link;
use crate::db::{read_ops, write_ops};
use crate::domain::registration::{check_host, default_email};
use crate::mail::Envelope;
use crate::models::forms::{AttendeeForm, MailForm, Validate};
use crate::models::tables::Person;
use crate::models::views::{Created, MailReport, PersonView};

const CSV_HEADER: &str =
    "id,name,username,email,address,arrival,departure,host,shirt_size,dietary_needs";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn host_names(people: &[Person]) -> HashMap<i64, String> {
    people.iter().map(|p| (p.id, p.name.clone())).collect()
}

/// Attendee list as CSV, one row per person, hosts by name.
pub fn attendees_csv(people: &[Person]) -> String {
    let hosts = host_names(people);
    let mut out = String::from(CSV_HEADER);
    out.push_str("\r\n");

    for p in people {
        let host = p.host_id.and_then(|id| hosts.get(&id)).map(String::as_str);
        let arrival = p.arrival.map(|d| d.to_string());
        let departure = p.departure.map(|d| d.to_string());

        let row = [
            p.id.to_string(),
            csv_field(&p.name),
            csv_field(p.username.as_deref().unwrap_or("")),
            csv_field(p.email.as_deref().unwrap_or("")),
            csv_field(&p.address),
            arrival.unwrap_or_default(),
            departure.unwrap_or_default(),
            csv_field(host.unwrap_or("")),
            csv_field(&p.shirt_size),
            csv_field(p.dietary_needs.as_deref().unwrap_or("")),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }
    out
}

/// `Name <address>` per line for everyone with an email address.
pub fn email_list(people: &[Person]) -> String {
    people
        .iter()
        .filter_map(|p| p.email.as_deref().map(|email| format!("{} <{}>\n", p.name, email)))
        .collect()
}

fn emails(people: &[Person]) -> Vec<String> {
    people.iter().filter_map(|p| p.email.clone()).collect()
}

/// GET /org/attendees/
#[tracing::instrument(skip_all)]
pub async fn list_handler(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PersonView>>> {
    let people = read_ops::list_people(&state.pool).await?;
    let hosts = host_names(&people);

    let views = people
        .into_iter()
        .map(|person| PersonView {
            host_name: person.host_id.and_then(|id| hosts.get(&id).cloned()),
            auth: state.tokens.person_token(person.id),
            link: attendee_link(&state.settings.site_url, &state.tokens, person.id),
            person,
        })
        .collect();

    Ok(Json(views))
}

/// POST /org/attendees/
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn create_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<AttendeeForm>,
) -> ApiResult<(StatusCode, Json<Created>)> {
    form.validate()?;

    let email = default_email(&form, &state.settings.member_email_domain);
    let mut conn = connection(&state.pool).await?;
    check_host(&mut *conn, form.host).await?;
    let id = write_ops::insert_person(&mut *conn, &form, email.as_deref()).await?;

    info!(person_id = id, "Organizer added attendee");
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// PUT /org/attendees/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn update_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(form): Json<AttendeeForm>,
) -> ApiResult<StatusCode> {
    form.validate()?;

    if form.host == Some(id) {
        return Err(ApiError::Validation(
            "Problem with 'host': People cannot host themselves".to_string(),
        ));
    }

    let mut conn = connection(&state.pool).await?;
    check_host(&mut *conn, form.host).await?;
    write_ops::update_person(&mut *conn, id, &form).await?;

    info!("Organizer updated attendee");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /org/attendees/{id}
#[tracing::instrument(skip_all, fields(organizer = admin.id, id = id))]
pub async fn delete_handler(
    Admin(admin): Admin,
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> ApiResult<StatusCode> {
    let mut conn = connection(&state.pool).await?;
    write_ops::delete_person(&mut *conn, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /org/attendees/attendees.csv
#[tracing::instrument(skip_all)]
pub async fn csv_handler(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let people = read_ops::list_people(&state.pool).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"attendees.csv\""),
        ],
        attendees_csv(&people),
    ))
}

/// GET /org/attendees/email
#[tracing::instrument(skip_all)]
pub async fn email_list_handler(
    Admin(_): Admin,
    State(state): State<AppState>,
) -> ApiResult<impl IntoResponse> {
    let people = read_ops::list_people(&state.pool).await?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        email_list(&people),
    ))
}

/// POST /org/attendees/mail-all
#[tracing::instrument(skip_all, fields(organizer = admin.id))]
pub async fn mail_all_handler(
    Admin(admin): Admin,
    State(state): State<AppState>,
    Json(form): Json<MailForm>,
) -> ApiResult<Json<MailReport>> {
    form.validate()?;

    let people = read_ops::list_people(&state.pool).await?;
    let recipients = emails(&people);
    let subject = format!("[{}] {}", state.settings.site_title, form.subject.trim());

    let envelope = Envelope::compose(
        &state.settings.mail_from,
        &state.settings.mail_reply_to,
        &recipients,
        subject.clone(),
        form.body,
    )?;
    state.mailer.send(&envelope).await?;

    info!(recipients = recipients.len(), "Mailed all attendees");
    Ok(Json(MailReport {
        subject,
        recipients: recipients.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn person(id: i64, name: &str, email: Option<&str>, host_id: Option<i64>) -> Person {
        Person {
            id,
            name: name.to_string(),
            username: None,
            email: email.map(str::to_string),
            address: "Cambridge, UK".to_string(),
            administrator: false,
            arrival: NaiveDate::from_ymd_opt(2018, 6, 4),
            departure: None,
            host_id,
            shirt_size: "M".to_string(),
            dietary_needs: None,
        }
    }

    #[test]
    fn test_attendees_csv_quotes_and_hosts() {
        let people = vec![
            person(1, "Host", Some("host@FreeBSD.org"), None),
            person(2, "Guest \"G\"", None, Some(1)),
        ];

        let csv = attendees_csv(&people);
        let lines: Vec<&str> = csv.split("\r\n").collect();

        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "1,Host,,host@FreeBSD.org,\"Cambridge, UK\",2018-06-04,,,M,");
        assert_eq!(lines[2], "2,\"Guest \"\"G\"\"\",,,\"Cambridge, UK\",2018-06-04,,Host,M,");
        assert_eq!(lines[3], "");
    }

    #[test]
    fn test_email_list_skips_missing_addresses() {
        let people = vec![
            person(1, "Ada", Some("ada@example.org"), None),
            person(2, "Bob", None, Some(1)),
            person(3, "Cy", Some("cy@example.org"), None),
        ];

        assert_eq!(email_list(&people), "Ada <ada@example.org>\nCy <cy@example.org>\n");
        assert_eq!(emails(&people), vec!["ada@example.org", "cy@example.org"]);
    }
}
