use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GenreTag {
    pub id: i32,
    pub genre: String,
}

/// A movie as shown in the list and detail views.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MovieDetails {
    pub id: i32,
    pub title: String,
    pub tagline: String,
    pub release_year: i32,
    pub imdb_score: f64,
    pub director: Option<String>,
    pub genres: Vec<GenreTag>,
}

/// Raw create/update form body. Every field is read as text so that a bad
/// value becomes a field error instead of an extractor rejection.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct MovieForm {
    pub title: String,
    pub tagline: String,
    pub year: String,
    pub imdb_score: String,
    pub director: String,
}

/// A validated movie write.
#[derive(Clone, Debug, PartialEq)]
pub struct MovieInput {
    pub title: String,
    pub tagline: String,
    pub release_year: i32,
    pub imdb_score: f64,
    pub director: Option<String>,
}
