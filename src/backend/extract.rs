// src/backend/extract.rs
use axum::extract::{FromRequest, FromRequestParts};

use crate::backend::error::ApiError;

/* axum's own extractors answer bad input with a plain-text body.
These wrappers run the same extraction but reject with an `ApiError`, so
clients get the usual JSON error body. */

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct PathParam<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct QueryParams<T>(pub T);
