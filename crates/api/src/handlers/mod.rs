pub mod books;
pub mod genres;
