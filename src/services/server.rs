use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::{Value, json};
use warp::Filter;
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};

use crate::services::forecast::simulate;
use crate::services::input_parser::parse_inputs;
use crate::services::project_store::{ProjectStore, ProjectStoreError};

/// Builds the full route tree over a shared project store:
/// `POST /generate_forecast`, `POST /create_project`, `GET /get_projects`
/// and `GET /get_project/<id>`. Every response is a JSON envelope with a
/// `success` flag and a `message`.
pub fn routes(
    store: Arc<ProjectStore>,
) -> impl Filter<Extract = (WithStatus<Json>,), Error = warp::Rejection> + Clone {
    let generate = warp::path("generate_forecast")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: Value| generate_forecast(&body));

    let create_store = store.clone();
    let create = warp::path("create_project")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .map(move |body: Value| create_project(&create_store, &body));

    let list_store = store.clone();
    let list = warp::path("get_projects")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || get_projects(&list_store));

    let fetch = warp::path!("get_project" / u64)
        .and(warp::get())
        .map(move |id| get_project(&store, id));

    generate.or(create).unify().or(list).unify().or(fetch).unify()
}

fn generate_forecast(body: &Value) -> WithStatus<Json> {
    let Some(inputs_value) = body.get("inputs") else {
        return failure(StatusCode::BAD_REQUEST, "No inputs provided");
    };
    let inputs = match parse_inputs(inputs_value) {
        Ok(inputs) => inputs,
        Err(error) => return failure(StatusCode::BAD_REQUEST, &error.to_string()),
    };
    match simulate(&inputs) {
        Ok(result) => success(json!({
            "success": true,
            "message": "Forecast generated successfully",
            "forecast": result,
        })),
        Err(error) => {
            let status = if error.is_invalid_input() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            failure(status, &error.to_string())
        }
    }
}

fn create_project(store: &ProjectStore, body: &Value) -> WithStatus<Json> {
    let name = body
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if name.trim().is_empty() {
        return failure(StatusCode::BAD_REQUEST, "Project name is required");
    }
    let Some(inputs_value) = body.get("inputs") else {
        return failure(StatusCode::BAD_REQUEST, "No inputs provided");
    };
    let inputs = match parse_inputs(inputs_value) {
        Ok(inputs) => inputs,
        Err(error) => return failure(StatusCode::BAD_REQUEST, &error.to_string()),
    };
    let start_date = match body.get("start_date").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => {
            match NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    return failure(
                        StatusCode::BAD_REQUEST,
                        &format!("invalid start date: {text}"),
                    );
                }
            }
        }
        _ => None,
    };

    match store.create(name, start_date, inputs) {
        Ok(project) => success(json!({
            "success": true,
            "message": "Project created successfully",
            "project_id": project.id,
            "project_name": project.name,
        })),
        Err(error) => store_failure(&error),
    }
}

fn get_projects(store: &ProjectStore) -> WithStatus<Json> {
    match store.list() {
        Ok(projects) => success(json!({
            "success": true,
            "projects": projects,
        })),
        Err(error) => store_failure(&error),
    }
}

fn get_project(store: &ProjectStore, id: u64) -> WithStatus<Json> {
    match store.fetch(id) {
        Ok(project) => success(json!({
            "success": true,
            "project": project,
        })),
        Err(error) => store_failure(&error),
    }
}

fn store_failure(error: &ProjectStoreError) -> WithStatus<Json> {
    match error {
        ProjectStoreError::NotFound(_) => {
            failure(StatusCode::NOT_FOUND, "Project not found")
        }
        _ => {
            log::error!("project store failure: {error}");
            failure(StatusCode::INTERNAL_SERVER_ERROR, &error.to_string())
        }
    }
}

fn success(body: Value) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(&body), StatusCode::OK)
}

fn failure(status: StatusCode, message: &str) -> WithStatus<Json> {
    let body = json!({
        "success": false,
        "message": message,
    });
    warp::reply::with_status(warp::reply::json(&body), status)
}
