//! Catalog management service: authors, books, genres and languages

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{Author, AuthorForm, AuthorRef},
        book::{display_genre, Book, BookDetail, BookForm, BookSummary},
        book_instance::{CopyEntry, LoanStatus},
        form::{FormErrors, Submission},
        genre::{Genre, Language, NameForm},
        pagination::{Page, PageRequest, PAGE_SIZE},
    },
    repository::Repository,
};

/// Record counts shown on the home page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogCounts {
    pub num_books: i64,
    pub num_instances: i64,
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    pub num_book_title_with_word: i64,
}

/// Author page: the author and their books
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetail {
    pub author: Author,
    pub books: Vec<BookSummary>,
}

/// Choices offered by the book form
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookChoices {
    pub authors: Vec<AuthorRef>,
    pub languages: Vec<Language>,
    pub genres: Vec<Genre>,
}

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Cheap round trip to the database
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.genres.count().await.map(|_| ())
    }

    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count().await?,
            num_instances_available: self
                .repository
                .book_instances
                .count_with_status(LoanStatus::Available)
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
            num_book_title_with_word: self.repository.books.count_titles_with_word().await?,
        })
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, page: Option<&str>) -> AppResult<Page<Author>> {
        let total = self.repository.authors.count().await?;
        let request = PageRequest::resolve(page, total, PAGE_SIZE)?;
        let authors = self
            .repository
            .authors
            .list(request.limit(), request.offset())
            .await?;
        Ok(Page::new(authors, &request))
    }

    pub async fn get_author(&self, id: i32) -> AppResult<Author> {
        self.repository.authors.get_by_id(id).await
    }

    pub async fn author_detail(&self, id: i32) -> AppResult<AuthorDetail> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.books.list_by_author(id).await?;
        Ok(AuthorDetail { author, books })
    }

    pub async fn create_author(&self, form: &AuthorForm) -> AppResult<Submission<Author>> {
        if let Err(errors) = form.check() {
            return Ok(Err(errors));
        }
        let author = self.repository.authors.create(form).await?;
        tracing::info!("Created author {} ({})", author.id, author);
        Ok(Ok(author))
    }

    pub async fn update_author(&self, id: i32, form: &AuthorForm) -> AppResult<Submission<Author>> {
        self.repository.authors.get_by_id(id).await?;
        if let Err(errors) = form.check() {
            return Ok(Err(errors));
        }
        let author = self.repository.authors.update(id, form).await?;
        tracing::info!("Updated author {}", id);
        Ok(Ok(author))
    }

    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        self.repository.authors.delete(id).await?;
        tracing::info!("Deleted author {}; their books keep no author", id);
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, page: Option<&str>) -> AppResult<Page<BookSummary>> {
        let total = self.repository.books.count().await?;
        let request = PageRequest::resolve(page, total, PAGE_SIZE)?;
        let books = self
            .repository
            .books
            .list(request.limit(), request.offset())
            .await?;
        Ok(Page::new(books, &request))
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.repository.books.get_by_id(id).await
    }

    /// Book form prefilled from the stored record, genres in assignment order
    pub async fn book_form(&self, id: i32) -> AppResult<BookForm> {
        let book = self.repository.books.get_by_id(id).await?;
        let genre = self
            .repository
            .books
            .genres_of(id)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        Ok(BookForm {
            title: book.title,
            author: book.author_id,
            summary: book.summary,
            isbn: book.isbn,
            language: book.language_id,
            genre,
        })
    }

    pub async fn book_detail(&self, id: i32, today: NaiveDate) -> AppResult<BookDetail> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(AuthorRef::from(&self.repository.authors.get_by_id(author_id).await?)),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => self.repository.languages.find_by_id(language_id).await?,
            None => None,
        };
        let genres = self.repository.books.genres_of(id).await?;
        let copies = self
            .repository
            .book_instances
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|copy| CopyEntry::new(copy, today))
            .collect();

        let names: Vec<&str> = genres.iter().map(|g| g.name.as_str()).collect();
        Ok(BookDetail {
            display_genre: display_genre(&names),
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres,
            copies,
        })
    }

    pub async fn book_choices(&self) -> AppResult<BookChoices> {
        let authors = self
            .repository
            .authors
            .list_all()
            .await?
            .iter()
            .map(AuthorRef::from)
            .collect();
        Ok(BookChoices {
            authors,
            languages: self.repository.languages.list_all().await?,
            genres: self.repository.genres.list_all().await?,
        })
    }

    pub async fn create_book(&self, form: &BookForm) -> AppResult<Submission<Book>> {
        if let Err(errors) = self.check_book_form(form, None).await? {
            return Ok(Err(errors));
        }
        let book = self.repository.books.create(form).await?;
        tracing::info!("Created book {} '{}' (ISBN {})", book.id, book.title, book.isbn);
        Ok(Ok(book))
    }

    pub async fn update_book(&self, id: i32, form: &BookForm) -> AppResult<Submission<Book>> {
        self.repository.books.get_by_id(id).await?;
        if let Err(errors) = self.check_book_form(form, Some(id)).await? {
            return Ok(Err(errors));
        }
        let book = self.repository.books.update(id, form).await?;
        tracing::info!("Updated book {}", id);
        Ok(Ok(book))
    }

    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        self.repository.books.delete(id).await?;
        tracing::info!("Deleted book {}", id);
        Ok(())
    }

    /// Field rules plus the references the form points at
    async fn check_book_form(&self, form: &BookForm, editing: Option<i32>) -> AppResult<Result<(), FormErrors>> {
        let mut errors = match form.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => FormErrors::from(e),
        };

        if let Some(author_id) = form.author {
            match self.repository.authors.get_by_id(author_id).await {
                Ok(_) => {}
                Err(AppError::NotFound(_)) => errors.add("author", "Select a valid author"),
                Err(e) => return Err(e),
            }
        }

        if let Some(language_id) = form.language {
            if self.repository.languages.find_by_id(language_id).await?.is_none() {
                errors.add("language", "Select a valid language");
            }
        }

        let genre_ids = form.genre_ids();
        if !genre_ids.is_empty() {
            let known = self.repository.genres.list_all().await?;
            for id in genre_ids {
                if !known.iter().any(|g| g.id == id) {
                    errors.add("genre", format!("{} is not one of the available genres", id));
                }
            }
        }

        if errors.field("isbn").is_empty() {
            if let Some(existing) = self.repository.books.find_by_isbn(&form.isbn).await? {
                if Some(existing.id) != editing {
                    errors.add("isbn", "Book with this ISBN already exists");
                }
            }
        }

        Ok(errors.into_result())
    }

    // =========================================================================
    // GENRES & LANGUAGES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list_all().await
    }

    pub async fn create_genre(&self, form: &NameForm) -> AppResult<Submission<Genre>> {
        let form = match form.cleaned() {
            Ok(form) => form,
            Err(errors) => return Ok(Err(errors)),
        };
        match self.repository.genres.create(&form.name).await {
            Ok(genre) => Ok(Ok(genre)),
            Err(AppError::Conflict(msg)) => Ok(Err(FormErrors::single("name", msg))),
            Err(e) => Err(e),
        }
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list_all().await
    }

    pub async fn create_language(&self, form: &NameForm) -> AppResult<Submission<Language>> {
        let form = match form.cleaned() {
            Ok(form) => form,
            Err(errors) => return Ok(Err(errors)),
        };
        match self.repository.languages.create(&form.name).await {
            Ok(language) => Ok(Ok(language)),
            Err(AppError::Conflict(msg)) => Ok(Err(FormErrors::single("name", msg))),
            Err(e) => Err(e),
        }
    }
}
