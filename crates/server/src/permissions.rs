//! Membership/ownership gate. Loaders have already established that the
//! target exists (404 wins over 403), so these helpers only decide between
//! access and a forbidden response.

use db::models::{project::Project, user::User};

use crate::error::ApiError;

pub fn require_member(project: &Project, user: &User, action: &str) -> Result<(), ApiError> {
    if project.is_member(user.id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("Not authorized to {action}")))
    }
}

pub fn require_owner(project: &Project, user: &User, action: &str) -> Result<(), ApiError> {
    if project.is_owner(user.id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden(format!("Not authorized to {action}")))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{name}@example.com"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn project_of(owner: User, members: Vec<User>) -> Project {
        Project {
            id: Uuid::new_v4(),
            name: "Apollo".to_string(),
            description: String::new(),
            color: "#3b82f6".to_string(),
            owner,
            members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn members_pass_the_member_gate_but_not_the_owner_gate() {
        let owner = user("ada");
        let member = user("grace");
        let project = project_of(owner.clone(), vec![owner.clone(), member.clone()]);

        assert!(require_member(&project, &member, "access this project").is_ok());
        assert!(matches!(
            require_owner(&project, &member, "update this project"),
            Err(ApiError::Forbidden(_))
        ));
        assert!(require_owner(&project, &owner, "update this project").is_ok());
    }

    #[test]
    fn outsiders_are_forbidden() {
        let owner = user("ada");
        let outsider = user("mallory");
        let project = project_of(owner.clone(), vec![owner]);

        let err = require_member(&project, &outsider, "access this project").unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }
}
