//! Blocking flavour of [`crate::client::BookCatalogClient`].
//!
//! Every call blocks the calling thread until the response is handled. The
//! client drives its own current-thread runtime, so it must not be used from
//! within an async context.

use std::num::NonZeroU32;

use anyhow::Context;

use crate::api::{Book, BookId};
use crate::client;
use crate::client_config::ClientConfig;
use crate::error::BookCatalogError;

pub struct BookCatalogClient {
    inner: client::BookCatalogClient,
    runtime: tokio::runtime::Runtime,
}

impl BookCatalogClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        Self::with_inner(client::BookCatalogClient::new(url)?)
    }

    pub fn with_default_url() -> anyhow::Result<Self> {
        Self::with_inner(client::BookCatalogClient::with_default_url()?)
    }

    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        Self::with_inner(client::BookCatalogClient::from_config(config)?)
    }

    fn with_inner(inner: client::BookCatalogClient) -> anyhow::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build tokio runtime")?;
        Ok(Self { inner, runtime })
    }

    pub fn books_url(&self) -> String {
        self.inner.books_url()
    }

    pub fn list_books(&self) -> Result<Vec<Book>, BookCatalogError> {
        self.runtime.block_on(self.inner.list_books())
    }

    pub fn list_books_with_retries(
        &self,
        max_attempts: NonZeroU32,
    ) -> Result<Vec<Book>, BookCatalogError> {
        self.runtime
            .block_on(self.inner.list_books_with_retries(max_attempts))
    }

    pub fn get_book(&self, book_id: BookId) -> Result<Option<Book>, BookCatalogError> {
        self.runtime.block_on(self.inner.get_book(book_id))
    }

    pub fn add_book(&self, book: &Book) -> Result<Book, BookCatalogError> {
        self.runtime.block_on(self.inner.add_book(book))
    }

    pub fn update_book(&self, book_id: BookId, book: &Book) -> Result<Book, BookCatalogError> {
        self.runtime.block_on(self.inner.update_book(book_id, book))
    }

    pub fn delete_book(&self, book_id: BookId) -> Result<(), BookCatalogError> {
        self.runtime.block_on(self.inner.delete_book(book_id))
    }

    pub fn search_books_by_author(&self, author: &str) -> Result<Vec<Book>, BookCatalogError> {
        self.runtime
            .block_on(self.inner.search_books_by_author(author))
    }
}

#[cfg(test)]
mod blocking_client_tests {
    use std::num::NonZeroU32;
    use std::sync::Arc;

    use serde_json::json;

    use crate::api::Book;
    use crate::blocking::BookCatalogClient;

    fn given_books() -> Vec<Book> {
        vec![
            Book {
                id: Some(1),
                ..Book::new("Was auch immer.", "Hubert Meier", "345435435")
            },
            Book {
                id: Some(2),
                ..Book::new("Testen für Anfänger.", "Dagmar Huber", "786778676")
            },
        ]
    }

    #[test]
    fn test_list_books_with_retries_succeeds_after_transient_errors() {
        let mut server = mockito::Server::new();
        let _transient: Vec<_> = (0..2)
            .map(|_| {
                server
                    .mock("GET", "/api/books")
                    .with_status(503)
                    .with_body("Temporary server error.")
                    .expect(1)
                    .create()
            })
            .collect();
        let ok = server
            .mock("GET", "/api/books")
            .with_status(200)
            .with_body(json!(given_books()).to_string())
            .expect(1)
            .create();
        let client = BookCatalogClient::new(&server.url()).unwrap();

        let books = client
            .list_books_with_retries(NonZeroU32::new(3).unwrap())
            .unwrap();

        ok.assert();
        assert_eq!(books, given_books());
    }

    #[test]
    fn test_list_books_internal_server_error() {
        let mut server = mockito::Server::new();
        let _m = server.mock("GET", "/api/books").with_status(500).create();
        let client = BookCatalogClient::new(&server.url()).unwrap();

        let err = client.list_books().unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "Http request to {}/api/books failed with status code 500",
                server.url()
            )
        );
    }

    #[test]
    /// Creates a book, then reads it back by the id the server assigned
    fn test_add_then_get_round_trip() {
        let mut server = mockito::Server::new();
        let new_book = Book::new("Was auch immer.", "Hubert Meier", "345435435");
        let created = Book {
            id: Some(11),
            ..new_book.clone()
        };
        let _post = server
            .mock("POST", "/api/books")
            .with_status(201)
            .with_body(json!(created).to_string())
            .create();
        let _get = server
            .mock("GET", "/api/books/11")
            .with_status(200)
            .with_body(json!(created).to_string())
            .create();
        let _get_missing = server
            .mock("GET", "/api/books/12")
            .with_status(404)
            .create();
        let client = BookCatalogClient::new(&server.url()).unwrap();

        let returned = client.add_book(&new_book).unwrap();
        let book_id = returned.id.expect("Server did not assign an id");

        assert_eq!(client.get_book(book_id).unwrap(), Some(returned));
        assert_eq!(client.get_book(12).unwrap(), None);
    }

    #[test]
    fn test_update_delete_and_search() {
        let mut server = mockito::Server::new();
        let updated = Book {
            id: Some(4),
            ..Book::new(">Updated book title<", "Dagmar Huber", "786778676")
        };
        let _put = server
            .mock("PUT", "/api/books/4")
            .with_status(200)
            .with_body(json!(updated).to_string())
            .create();
        let delete = server
            .mock("DELETE", "/api/books/4")
            .with_status(500)
            .create();
        let _search = server
            .mock("GET", "/api/books/search?author=Dagmar+Huber")
            .with_status(200)
            .with_body(json!([updated]).to_string())
            .create();
        let client = BookCatalogClient::new(&server.url()).unwrap();

        assert_eq!(client.update_book(4, &updated).unwrap(), updated);
        assert_eq!(
            client.search_books_by_author("Dagmar Huber").unwrap(),
            vec![updated]
        );
        client.delete_book(4).unwrap();
        delete.assert();
    }

    #[test]
    fn test_client_is_shared_between_threads() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/api/books")
            .with_status(200)
            .with_body(json!(given_books()).to_string())
            .expect(4)
            .create();
        let client = Arc::new(BookCatalogClient::new(&server.url()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let client = client.clone();
                std::thread::spawn(move || client.list_books())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), given_books());
        }
        mock.assert();
    }
}
