use axum::{
    Form,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde::Serialize;

use crate::{
    error::AppError,
    models::{MovieForm, MovieInput},
};

pub const EARLIEST_RELEASE_YEAR: i32 = 1888;
const MAX_TEXT_LEN: usize = 255;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Params,
    Body,
}

/// One rejected input, serialized in the `{type, value, msg, path, location}`
/// shape clients of the JSON error body expect.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldError {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub value: String,
    pub msg: String,
    pub path: &'static str,
    pub location: Location,
}

impl FieldError {
    fn new(location: Location, path: &'static str, value: &str, msg: impl Into<String>) -> Self {
        Self { kind: "field", value: value.to_string(), msg: msg.into(), path, location }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Integer `{id}` path segment. Rejects with a 400 before the handler runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MovieId(pub i32);

impl<S> FromRequestParts<S> for MovieId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(anyhow::Error::new)?;
        Ok(Self(parse_id(&raw)?))
    }
}

/// Optional sign, then digits without leading zeros.
pub fn parse_id(raw: &str) -> Result<i32, ValidationErrors> {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    let canonical = !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && (digits == "0" || !digits.starts_with('0'));

    match raw.parse::<i32>() {
        Ok(id) if canonical => Ok(id),
        _ => {
            let mut errors = ValidationErrors::default();
            errors.push(FieldError::new(Location::Params, "id", raw, "Id must be an integer"));
            Err(errors)
        },
    }
}

/// A body that is not a readable urlencoded form is reported like any other
/// field error instead of axum's plain-text rejection.
impl<S> FromRequest<S> for MovieForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(form) = Form::<MovieForm>::from_request(req, state).await.map_err(|rejection| {
            let mut errors = ValidationErrors::default();
            errors.push(FieldError::new(Location::Body, "body", "", rejection.body_text()));
            errors
        })?;
        Ok(form)
    }
}

impl MovieForm {
    pub fn validate(self, current_year: i32) -> Result<MovieInput, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.push(FieldError::new(Location::Body, "title", &self.title, "Title is required"));
        } else {
            check_len(&mut errors, "title", title, "Title");
        }

        let tagline = self.tagline.trim();
        check_len(&mut errors, "tagline", tagline, "Tagline");

        let director = self.director.trim();
        check_len(&mut errors, "director", director, "Director");

        let latest = current_year + 10;
        let release_year = match self.year.trim().parse::<i32>() {
            Ok(year) if (EARLIEST_RELEASE_YEAR..=latest).contains(&year) => Some(year),
            Ok(_) => {
                errors.push(FieldError::new(
                    Location::Body,
                    "year",
                    &self.year,
                    format!("Year must be between {EARLIEST_RELEASE_YEAR} and {latest}"),
                ));
                None
            },
            Err(_) => {
                errors.push(FieldError::new(
                    Location::Body,
                    "year",
                    &self.year,
                    "Year must be an integer",
                ));
                None
            },
        };

        let imdb_score = match self.imdb_score.trim().parse::<f64>() {
            Ok(score) if (0.0..=10.0).contains(&score) => Some(score),
            Ok(_) => {
                errors.push(FieldError::new(
                    Location::Body,
                    "imdb_score",
                    &self.imdb_score,
                    "IMDb score must be between 0 and 10",
                ));
                None
            },
            Err(_) => {
                errors.push(FieldError::new(
                    Location::Body,
                    "imdb_score",
                    &self.imdb_score,
                    "IMDb score must be a number",
                ));
                None
            },
        };

        match (release_year, imdb_score) {
            (Some(release_year), Some(imdb_score)) if errors.is_empty() => Ok(MovieInput {
                title: title.to_string(),
                tagline: tagline.to_string(),
                release_year,
                imdb_score,
                director: (!director.is_empty()).then(|| director.to_string()),
            }),
            _ => Err(errors),
        }
    }
}

fn check_len(errors: &mut ValidationErrors, path: &'static str, value: &str, label: &str) {
    if value.chars().count() > MAX_TEXT_LEN {
        errors.push(FieldError::new(
            Location::Body,
            path,
            value,
            format!("{label} must be at most {MAX_TEXT_LEN} characters"),
        ));
    }
}
