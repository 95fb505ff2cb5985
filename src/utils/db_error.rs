//! Classification of database errors.

/// Name of the foreign key `e` violated, if it is a foreign-key violation.
pub fn violated_foreign_key(e: &sqlx::Error) -> Option<&str> {
    let db_err = e.as_database_error()?;

    if !db_err.is_foreign_key_violation() {
        return None;
    }

    db_err.constraint()
}

/// A question was deleted while tag rows still reference it.
pub fn is_dangling_tag_association(e: &sqlx::Error) -> bool {
    violated_foreign_key(e) == Some("question_tag_question_id_fkey")
}

/// A token was issued for a user id that does not exist.
pub fn is_unknown_token_owner(e: &sqlx::Error) -> bool {
    violated_foreign_key(e) == Some("api_tokens_user_id_fkey")
}
