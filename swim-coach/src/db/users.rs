//! User account persistence

use chrono::Utc;
use sqlx::SqlitePool;
use swim_common::auth::hash_password;
use swim_common::db::{Role, User};
use swim_common::{Error, Result};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, email, name, role, coach_id, phone, bio, password_hash, created_at";

/// Fields of a new account; the password is hashed before storage
pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password: &'a str,
    pub role: Role,
    pub coach_id: Option<Uuid>,
    pub phone: Option<&'a str>,
}

/// Editable profile fields; `None` leaves the stored value alone
#[derive(Debug, Default)]
pub struct ProfileUpdate<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub bio: Option<&'a str>,
}

/// Insert a user; a duplicate email yields `Error::InvalidInput`
///
/// Uniqueness is left to the `users.email` constraint so two concurrent
/// registrations of one address cannot both pass a lookup.
pub async fn create_user(pool: &SqlitePool, new_user: &NewUser<'_>) -> Result<User> {
    let email = normalize_email(new_user.email);
    let user = User {
        id: Uuid::new_v4(),
        email,
        name: new_user.name.trim().to_string(),
        role: new_user.role,
        coach_id: new_user.coach_id,
        phone: new_user.phone.map(str::to_string),
        bio: None,
        password_hash: hash_password(new_user.password)?,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, role, coach_id, phone, password_hash, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.name)
    .bind(user.role.as_str())
    .bind(user.coach_id.map(|id| id.to_string()))
    .bind(&user.phone)
    .bind(&user.password_hash)
    .bind(user.created_at.to_rfc3339())
    .execute(pool)
    .await
    .map_err(|e| duplicate_email_or(e, &user.email))?;

    Ok(user)
}

/// Apply a profile update and return the stored user
///
/// Blank names are rejected; a blank phone or bio clears the field.
pub async fn update_profile(pool: &SqlitePool, user_id: Uuid, update: &ProfileUpdate<'_>) -> Result<User> {
    let name = update.name.map(str::trim);
    if name == Some("") {
        return Err(Error::InvalidInput("Name must not be empty".to_string()));
    }
    let email = update.email.map(normalize_email);
    if email.as_deref() == Some("") {
        return Err(Error::InvalidInput("Email must not be empty".to_string()));
    }

    let result = sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            email = COALESCE(?, email),
            phone = CASE WHEN ? THEN NULLIF(TRIM(?), '') ELSE phone END,
            bio = CASE WHEN ? THEN NULLIF(TRIM(?), '') ELSE bio END
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(email.as_deref())
    .bind(update.phone.is_some())
    .bind(update.phone)
    .bind(update.bio.is_some())
    .bind(update.bio)
    .bind(user_id.to_string())
    .execute(pool)
    .await
    .map_err(|e| match &email {
        Some(email) => duplicate_email_or(e, email),
        None => e.into(),
    })?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("User {}", user_id)));
    }

    find_user(pool, user_id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("User {}", user_id)))
}

pub async fn find_user(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(User::from_row).transpose()
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query(&format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS))
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(User::from_row).transpose()
}

/// Coach with the fewest pupils (ties broken by oldest account)
pub async fn coach_with_fewest_pupils(pool: &SqlitePool) -> Result<Option<User>> {
    let row = sqlx::query(
        r#"
        SELECT u.id, u.email, u.name, u.role, u.coach_id, u.phone, u.bio,
               u.password_hash, u.created_at
        FROM users u
        LEFT JOIN pupils p ON p.coach_id = u.id
        WHERE u.role = 'COACH'
        GROUP BY u.id
        ORDER BY COUNT(p.id) ASC, u.created_at ASC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(User::from_row).transpose()
}

/// Parents assigned to a coach, by name
pub async fn list_parents_of_coach(pool: &SqlitePool, coach_id: Uuid) -> Result<Vec<User>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM users WHERE role = 'PARENT' AND coach_id = ? ORDER BY name",
        USER_COLUMNS
    ))
    .bind(coach_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(User::from_row).collect()
}

/// A parent account, only if it belongs to `coach_id`
pub async fn find_parent_of_coach(pool: &SqlitePool, coach_id: Uuid, parent_id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM users WHERE id = ? AND role = 'PARENT' AND coach_id = ?",
        USER_COLUMNS
    ))
    .bind(parent_id.to_string())
    .bind(coach_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(User::from_row).transpose()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn duplicate_email_or(err: sqlx::Error, email: &str) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::InvalidInput(format!("Email already registered: {}", email))
        }
        _ => err.into(),
    }
}
