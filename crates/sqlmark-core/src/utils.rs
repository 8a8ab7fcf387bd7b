/// Convert a SQL identifier to PascalCase for generated type names.
///
/// Words are split on `_`, `-`, `.` and spaces. A word that mixes upper and
/// lower case keeps its inner casing; otherwise it is lowercased after the
/// first letter.
///
/// # Examples
/// ```
/// use sqlmark_core::utils::to_pascal_case;
/// assert_eq!(to_pascal_case("books_from_author_id"), "BooksFromAuthorId");
/// assert_eq!(to_pascal_case("AUTHOR_NAME"), "AuthorName");
/// assert_eq!(to_pascal_case("BookAuthor"), "BookAuthor");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for word in s.split(['_', '-', '.', ' ']).filter(|w| !w.is_empty()) {
        let mixed = word.chars().any(|c| c.is_ascii_uppercase())
            && word.chars().any(|c| c.is_ascii_lowercase());
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            result.push(first.to_ascii_uppercase());
        }
        if mixed {
            result.extend(chars);
        } else {
            result.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    result
}
