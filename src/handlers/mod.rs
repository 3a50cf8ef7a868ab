//! Request handlers module

pub mod department;
pub mod employee;
pub mod position;
pub mod position_department;
pub mod position_position;
pub mod settings;
pub mod tree;

use sea_orm::{DatabaseConnection, EntityTrait};

use crate::entity::{department as department_entity, position as position_entity};
use crate::error::{AppError, AppResult, OptionExt};

/// Trim a display name and check its length
pub(crate) fn require_name(field: &str, value: &str, max_chars: usize) -> AppResult<String> {
    let name = value.trim();
    if name.is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    if name.chars().count() > max_chars {
        return Err(AppError::Validation(format!(
            "{} must not exceed {} characters",
            field, max_chars
        )));
    }
    Ok(name.to_string())
}

/// Fetch a department that exists and is not soft-deleted
pub(crate) async fn find_department(
    db: &DatabaseConnection,
    department_id: i64,
) -> AppResult<department_entity::Model> {
    department_entity::Entity::find_by_id(department_id)
        .one(db)
        .await?
        .filter(|d| !d.deleted)
        .ok_or_not_found(format!("department {} not found", department_id))
}

/// Fetch a position that exists and is not soft-deleted
pub(crate) async fn find_position(
    db: &DatabaseConnection,
    position_id: i64,
) -> AppResult<position_entity::Model> {
    position_entity::Entity::find_by_id(position_id)
        .one(db)
        .await?
        .filter(|p| !p.deleted)
        .ok_or_not_found(format!("position {} not found", position_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_name() {
        assert_eq!(require_name("name", "  Sales ", 32).unwrap(), "Sales");
        assert!(matches!(require_name("name", "   ", 32), Err(AppError::Validation(_))));
        assert!(matches!(
            require_name("name", &"x".repeat(33), 32),
            Err(AppError::Validation(_))
        ));
    }
}
