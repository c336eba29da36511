// HTTP plumbing shared by every Canvas call.
use crate::{CanvasCredentials, GraderError};
use reqwest::blocking::{Client, Response};
use serde_json::Value;

/// Number of records requested per page on paginated endpoints.
pub const PAGE_SIZE: u32 = 100;

/// Enumeration representing the types of HTTP request methods.
///
/// `Put` carries its JSON body. Only the verbs the grader needs are listed.
#[derive(Clone, Debug)]
pub enum HttpMethod {
    Get,
    Put(Value),
}

/// Sends a single authenticated request to the Canvas API.
///
/// There is no retry loop: a transport error or a non-success status is
/// turned into `GraderError::NetworkFailure` and handed back to the caller,
/// which reports it and stops that student's pipeline.
pub fn send_http_request(
    client: &Client,
    method: HttpMethod,
    url: &str,
    credentials: &CanvasCredentials,
    params: &[(String, String)],
) -> Result<Response, GraderError> {
    let request_builder = match &method {
        HttpMethod::Get => client
            .get(url)
            .bearer_auth(&credentials.token_canvas)
            .query(params),
        HttpMethod::Put(body) => client
            .put(url)
            .bearer_auth(&credentials.token_canvas)
            .json(body),
    };

    log::debug!("{} {}", method_name(&method), url);
    match request_builder.send() {
        Ok(response) if response.status().is_success() => Ok(response),
        Ok(response) => Err(GraderError::network(
            url,
            format!("HTTP status {}", response.status()),
        )),
        Err(e) => Err(GraderError::network(url, e)),
    }
}

/// Fetches a JSON document with a GET request.
pub fn get_json(
    client: &Client,
    url: &str,
    credentials: &CanvasCredentials,
    params: &[(String, String)],
) -> Result<Value, GraderError> {
    let response = send_http_request(client, HttpMethod::Get, url, credentials, params)?;
    response.json().map_err(|e| GraderError::network(url, e))
}

/// Walks a paginated Canvas collection until an empty page comes back.
///
/// `params` are sent with every page; `page` and `per_page` are appended here.
pub fn fetch_paginated(
    client: &Client,
    url: &str,
    credentials: &CanvasCredentials,
    params: &[(String, String)],
) -> Result<Vec<Value>, GraderError> {
    let mut all_items = Vec::new();
    let mut page = 1;
    loop {
        let mut page_params = params.to_vec();
        page_params.push(("page".to_string(), page.to_string()));
        page_params.push(("per_page".to_string(), PAGE_SIZE.to_string()));

        let items: Vec<Value> = match get_json(client, url, credentials, &page_params)? {
            Value::Array(items) => items,
            other => {
                return Err(GraderError::network(
                    url,
                    format!("expected a JSON array, got {}", json_kind(&other)),
                ))
            }
        };
        if items.is_empty() {
            break;
        }
        all_items.extend(items);
        page += 1;
    }
    Ok(all_items)
}

fn method_name(method: &HttpMethod) -> &'static str {
    match method {
        HttpMethod::Get => "GET",
        HttpMethod::Put(_) => "PUT",
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
