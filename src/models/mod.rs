//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod form;
pub mod genre;
pub mod pagination;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorForm, AuthorInput, AuthorRef};
pub use book::{Book, BookDetail, BookForm, BookInput, BookSummary};
pub use book_instance::{BookInstance, BookInstanceRow, CopyEntry, CopyForm, CopyInput, LoanEntry, LoanStatus, RenewForm};
pub use form::{FormErrors, Submission};
pub use genre::{Genre, Language, NameForm};
pub use pagination::{Page, PageQuery, PageRequest, PAGE_SIZE};
pub use user::{Capability, LoginForm, User};
