// III-IV
// Copyright 2023 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Database abstraction in terms of the operations needed by the server.

use crate::model::*;
use bookstore_core::db::sqlite::{map_sqlx_error, run_schema};
use bookstore_core::db::{DbError, DbResult};
use futures::TryStreamExt;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use url::Url;


/// Schema to use to initialize the database.
const SCHEMA: &str = include_str!("sqlite.sql");

/// Columns that hold the contents of a book, in the order used by `INSERT` and `UPDATE`.
const BOOK_COLUMNS: &str = "title, isbn_13, isbn_10, author, year_of_publication, nb_of_pages, \
    rank, price, small_image_url, medium_image_url, description";

/// Initializes the database schema.
pub(crate) async fn init_schema(ex: &mut SqliteConnection) -> DbResult<()> {
    run_schema(ex, SCHEMA).await
}

/// Parses an optional URL read from the database.
fn parse_url(column: &str, raw: Option<String>) -> DbResult<Option<Url>> {
    match raw {
        None => Ok(None),
        Some(raw) => match Url::parse(&raw) {
            Ok(url) => Ok(Some(url)),
            Err(e) => {
                Err(DbError::DataIntegrityError(format!("Invalid {} {}: {}", column, raw, e)))
            }
        },
    }
}

/// Converts a row of the `books` table into a `Book`.
fn book_from_row(row: SqliteRow) -> DbResult<Book> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let title: String = row.try_get("title").map_err(map_sqlx_error)?;
    let isbn_13: Option<String> = row.try_get("isbn_13").map_err(map_sqlx_error)?;
    let isbn_10: Option<String> = row.try_get("isbn_10").map_err(map_sqlx_error)?;
    let author: Option<String> = row.try_get("author").map_err(map_sqlx_error)?;
    let year_of_publication: Option<i32> =
        row.try_get("year_of_publication").map_err(map_sqlx_error)?;
    let nb_of_pages: Option<i32> = row.try_get("nb_of_pages").map_err(map_sqlx_error)?;
    let rank: Option<i32> = row.try_get("rank").map_err(map_sqlx_error)?;
    let price: Option<f64> = row.try_get("price").map_err(map_sqlx_error)?;
    let small_image_url: Option<String> = row.try_get("small_image_url").map_err(map_sqlx_error)?;
    let medium_image_url: Option<String> =
        row.try_get("medium_image_url").map_err(map_sqlx_error)?;
    let description: Option<String> = row.try_get("description").map_err(map_sqlx_error)?;

    let mut book = Book::new(title)?.with_id(BookId::new(id)?).with_image_urls(
        parse_url("small_image_url", small_image_url)?,
        parse_url("medium_image_url", medium_image_url)?,
    );
    match (isbn_10, isbn_13) {
        (Some(isbn_10), Some(isbn_13)) => book = book.with_isbns(isbn_10, isbn_13),
        (None, None) => (),
        _ => {
            return Err(DbError::DataIntegrityError(format!(
                "Book {} has only one of its ISBN codes",
                id
            )));
        }
    }
    if let Some(author) = author {
        book = book.with_author(author);
    }
    if let Some(year) = year_of_publication {
        book = book.with_year_of_publication(year);
    }
    if let Some(nb_of_pages) = nb_of_pages {
        book = book.with_nb_of_pages(nb_of_pages);
    }
    if let Some(rank) = rank {
        book = book.with_rank(rank);
    }
    if let Some(price) = price {
        book = book.with_price(price);
    }
    if let Some(description) = description {
        book = book.with_description(description);
    }
    book.validate()?;
    Ok(book)
}

/// Binds the contents of `book` to `query` in the order of `BOOK_COLUMNS`.
fn bind_book<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    book: &'q Book,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(book.title().as_str())
        .bind(book.isbn_13().as_deref())
        .bind(book.isbn_10().as_deref())
        .bind(book.author().as_deref())
        .bind(*book.year_of_publication())
        .bind(*book.nb_of_pages())
        .bind(*book.rank())
        .bind(*book.price())
        .bind(book.small_image_url().as_ref().map(Url::as_str))
        .bind(book.medium_image_url().as_ref().map(Url::as_str))
        .bind(book.description().as_deref())
}

/// Stores a new `book` and returns the identifier assigned to it.
///
/// The identifier in `book`, if any, is ignored.
pub(crate) async fn create_book(ex: &mut SqliteConnection, book: &Book) -> DbResult<BookId> {
    let query_str = format!(
        "INSERT INTO books ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
        BOOK_COLUMNS
    );
    let row =
        bind_book(sqlx::query(&query_str), book).fetch_one(ex).await.map_err(map_sqlx_error)?;
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    Ok(BookId::new(id)?)
}

/// Gets the book identified by `id`.
pub(crate) async fn get_book(ex: &mut SqliteConnection, id: BookId) -> DbResult<Book> {
    let query_str = "SELECT * FROM books WHERE id = ?";
    let row = sqlx::query(query_str)
        .bind(id.as_i64())
        .fetch_one(ex)
        .await
        .map_err(map_sqlx_error)?;
    book_from_row(row)
}

/// Gets all books ordered by identifier.
pub(crate) async fn get_books(ex: &mut SqliteConnection) -> DbResult<Vec<Book>> {
    let query_str = "SELECT * FROM books ORDER BY id";
    let mut rows = sqlx::query(query_str).fetch(ex);

    let mut books = vec![];
    while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
        books.push(book_from_row(row)?);
    }
    Ok(books)
}

/// Gets the identifiers of all books ordered by identifier.
pub(crate) async fn get_book_ids(ex: &mut SqliteConnection) -> DbResult<Vec<BookId>> {
    let query_str = "SELECT id FROM books ORDER BY id";
    let mut rows = sqlx::query(query_str).fetch(ex);

    let mut ids = vec![];
    while let Some(row) = rows.try_next().await.map_err(map_sqlx_error)? {
        let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
        ids.push(BookId::new(id)?);
    }
    Ok(ids)
}

/// Counts the stored books.
pub(crate) async fn count_books(ex: &mut SqliteConnection) -> DbResult<u64> {
    let query_str = "SELECT COUNT(*) AS count FROM books";
    let row = sqlx::query(query_str).fetch_one(ex).await.map_err(map_sqlx_error)?;
    let count: i64 = row.try_get("count").map_err(map_sqlx_error)?;
    u64::try_from(count)
        .map_err(|e| DbError::DataIntegrityError(format!("Invalid book count {}: {}", count, e)))
}

/// Replaces all the contents of the book identified by `id` with those of `book`.
///
/// The identifier in `book`, if any, is ignored.
pub(crate) async fn update_book(
    ex: &mut SqliteConnection,
    id: BookId,
    book: &Book,
) -> DbResult<()> {
    let query_str = "
        UPDATE books
        SET title = ?, isbn_13 = ?, isbn_10 = ?, author = ?, year_of_publication = ?,
            nb_of_pages = ?, rank = ?, price = ?, small_image_url = ?, medium_image_url = ?,
            description = ?
        WHERE id = ?
    ";
    let done = bind_book(sqlx::query(query_str), book)
        .bind(id.as_i64())
        .execute(ex)
        .await
        .map_err(map_sqlx_error)?;
    if done.rows_affected() == 0 {
        return Err(DbError::NotFound);
    } else if done.rows_affected() != 1 {
        return Err(DbError::BackendError("Update affected more than one row".to_owned()));
    }
    Ok(())
}

/// Deletes the book identified by `id`.
pub(crate) async fn delete_book(ex: &mut SqliteConnection, id: BookId) -> DbResult<()> {
    let query_str = "DELETE FROM books WHERE id = ?";
    let done =
        sqlx::query(query_str).bind(id.as_i64()).execute(ex).await.map_err(map_sqlx_error)?;
    if done.rows_affected() == 0 {
        return Err(DbError::NotFound);
    } else if done.rows_affected() != 1 {
        return Err(DbError::BackendError("Deletion affected more than one row".to_owned()));
    }
    Ok(())
}
