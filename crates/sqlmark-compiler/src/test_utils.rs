//! Shared fixtures: a small bookstore schema and an annotated module over it.

use indoc::indoc;
use sqlmark_core::SchemaCatalog;

use crate::diagnostics::Diagnostics;
use crate::parser::{ParsedQuery, parse_module};
use crate::source_map::{SourceId, SourceMap};

pub const BOOKSTORE_SCHEMA: &str = r#"{
    "relations": {
        "Author": [
            { "name": "Id", "type": "int4", "nullable": false },
            { "name": "Name", "type": "text", "nullable": false },
            { "name": "Country", "type": "text", "nullable": false }
        ],
        "Book": [
            { "name": "Id", "type": "int4", "nullable": false },
            { "name": "Title", "type": "text", "nullable": false }
        ],
        "BookAuthor": [
            { "name": "AuthorId", "type": "int4", "nullable": false },
            { "name": "BookId", "type": "int4", "nullable": false }
        ],
        "custom_table": [
            { "name": "col1", "type": "custom_composite" },
            { "name": "col2", "type": "spongebob_character" }
        ]
    },
    "composites": {
        "custom_composite": [
            { "name": "wow", "type": "text" },
            { "name": "such_cool", "type": "int4" },
            { "name": "nice", "type": "spongebob_character" }
        ]
    },
    "enums": {
        "spongebob_character": ["Bob", "Patrick", "Squidward"]
    }
}"#;

pub const BOOKSTORE_MODULE: &str = indoc! {"
    --! authors
    SELECT * FROM Author;

    --! authors_stream
    SELECT * FROM Author;

    --! books
    SELECT Title FROM Book;

    --! books_from_author_id(id)
    SELECT Book.Title
    FROM BookAuthor
    INNER JOIN Author ON Author.Id = BookAuthor.AuthorId
    INNER JOIN Book ON Book.Id = BookAuthor.BookId
    WHERE Author.Id = :id;

    --! author_name_by_id ?{}
    SELECT Author.Name FROM Author WHERE Author.Id = $1;

    --! authors_by_name ?{name}
    SELECT Id, Name FROM Author WHERE Name = (:name)::varchar;

    --! select_everything
    SELECT * FROM custom_table;

    --! select_composite_field
    SELECT (col1).wow, (col1).nice FROM custom_table;

    --! insert_book(title)
    INSERT INTO Book (Title) VALUES (:title);

    --! author_by_id !{}
    SELECT Id, Name, Country FROM Author WHERE Id = :id;
"};

pub fn bookstore_schema() -> SchemaCatalog {
    SchemaCatalog::from_json(BOOKSTORE_SCHEMA).expect("fixture schema is valid")
}

/// Parse the first source of `sources`.
pub fn parse_one_liner(sources: &SourceMap) -> (SourceId, Vec<ParsedQuery<'_>>, Diagnostics) {
    let id = sources.iter().next().expect("one source").id;
    let mut diagnostics = Diagnostics::new();
    let queries = parse_module(id, sources.content(id), "_stream", &mut diagnostics);
    (id, queries, diagnostics)
}
