use std::collections::HashMap;

use sea_orm::{
    ActiveValue::{NotSet, Set},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info};

use crate::{
    entities::{director, genre, movie, movie_genre},
    error::AppResult,
    models::{GenreTag, MovieDetails, MovieInput},
};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// All movies, best score first, with director name and genres.
    pub async fn list(&self) -> AppResult<Vec<MovieDetails>> {
        let rows = movie::Entity::find()
            .find_also_related(director::Entity)
            .order_by_desc(movie::Column::ImdbScore)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;

        let ids: Vec<i32> = rows.iter().map(|(m, _)| m.id).collect();
        let mut genres = genres_by_movie(&self.db, &ids).await?;

        debug!(movies = rows.len(), "listed movies");

        Ok(rows
            .into_iter()
            .map(|(m, d)| {
                let tags = genres.remove(&m.id).unwrap_or_default();
                into_details(m, d, tags)
            })
            .collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<Option<MovieDetails>> {
        let Some((m, d)) = movie::Entity::find_by_id(id)
            .find_also_related(director::Entity)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let tags = genres_by_movie(&self.db, &[m.id]).await?.remove(&m.id).unwrap_or_default();
        Ok(Some(into_details(m, d, tags)))
    }

    /// Inserts a movie and returns its id. The director upsert and the movie
    /// insert share one transaction.
    pub async fn create(&self, input: &MovieInput) -> AppResult<i32> {
        let txn = self.db.begin().await?;

        let director_id = match input.director.as_deref() {
            Some(name) => Some(find_or_insert_director(&txn, name).await?),
            None => None,
        };

        let model = movie::ActiveModel {
            id: NotSet,
            title: Set(input.title.clone()),
            tagline: Set(input.tagline.clone()),
            release_year: Set(input.release_year),
            imdb_score: Set(input.imdb_score),
            director_id: Set(director_id),
        };
        let res = movie::Entity::insert(model).exec(&txn).await?;

        txn.commit().await?;

        info!(movie_id = res.last_insert_id, ?director_id, "movie created");
        Ok(res.last_insert_id)
    }

    /// Overwrites every editable column of movie `id`, director included.
    /// Returns false when there is no such movie; nothing is written then.
    ///
    /// Nothing in the transaction may read before the first write.
    pub async fn update(&self, id: i32, input: &MovieInput) -> AppResult<bool> {
        let txn = self.db.begin().await?;

        let res = movie::Entity::update_many()
            .col_expr(movie::Column::Title, Expr::value(input.title.clone()))
            .col_expr(movie::Column::Tagline, Expr::value(input.tagline.clone()))
            .col_expr(movie::Column::ReleaseYear, Expr::value(input.release_year))
            .col_expr(movie::Column::ImdbScore, Expr::value(input.imdb_score))
            .filter(movie::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        if res.rows_affected == 0 {
            txn.rollback().await?;
            debug!(movie_id = id, "update of missing movie");
            return Ok(false);
        }

        let director_id = match input.director.as_deref() {
            Some(name) => Some(find_or_insert_director(&txn, name).await?),
            None => None,
        };

        movie::Entity::update_many()
            .col_expr(movie::Column::DirectorId, Expr::value(director_id))
            .filter(movie::Column::Id.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        info!(movie_id = id, ?director_id, "movie updated");
        Ok(true)
    }

    pub async fn delete(&self, id: i32) -> AppResult<bool> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected > 0 {
            info!(movie_id = id, "movie deleted");
        }
        Ok(res.rows_affected > 0)
    }
}

/// Returns the id of the director called `name`, inserting the row if it is
/// missing. The insert goes first and a name clash on the unique index is
/// ignored, so inside a transaction the write lock is taken before the
/// lookup and concurrent callers all read back the same row.
pub async fn find_or_insert_director<C>(conn: &C, name: &str) -> Result<i32, DbErr>
where
    C: ConnectionTrait,
{
    let model = director::ActiveModel { id: NotSet, name: Set(name.to_string()) };
    let inserted = director::Entity::insert(model)
        .on_conflict(OnConflict::column(director::Column::Name).do_nothing().to_owned())
        .exec_without_returning(conn)
        .await?;

    let director = find_director(conn, name)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("director {name:?}")))?;

    debug!(director = %name, director_id = director.id, inserted, "director resolved");
    Ok(director.id)
}

async fn find_director<C>(conn: &C, name: &str) -> Result<Option<director::Model>, DbErr>
where
    C: ConnectionTrait,
{
    director::Entity::find().filter(director::Column::Name.eq(name)).one(conn).await
}

async fn genres_by_movie<C>(conn: &C, ids: &[i32]) -> Result<HashMap<i32, Vec<GenreTag>>, DbErr>
where
    C: ConnectionTrait,
{
    let mut out: HashMap<i32, Vec<GenreTag>> = HashMap::new();
    if ids.is_empty() {
        return Ok(out);
    }

    let rows = movie_genre::Entity::find()
        .find_also_related(genre::Entity)
        .filter(movie_genre::Column::MovieId.is_in(ids.iter().copied()))
        .order_by_desc(genre::Column::Name)
        .all(conn)
        .await?;

    for (link, g) in rows {
        let Some(g) = g else {
            continue;
        };
        out.entry(link.movie_id).or_default().push(GenreTag { id: g.id, genre: g.name });
    }

    Ok(out)
}

fn into_details(m: movie::Model, d: Option<director::Model>, genres: Vec<GenreTag>) -> MovieDetails {
    MovieDetails {
        id: m.id,
        title: m.title,
        tagline: m.tagline,
        release_year: m.release_year,
        imdb_score: m.imdb_score,
        director: d.map(|d| d.name),
        genres,
    }
}
