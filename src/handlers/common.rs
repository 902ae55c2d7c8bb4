use crate::{auth::AuthUser, ApiResponse};
use axum::{http::StatusCode, Json};

/// Status plus enveloped body, the shape every JSON handler returns
pub type Enveloped<T> = (StatusCode, Json<ApiResponse<T>>);

/// Standard success response
pub fn success_response<T>(data: T) -> Enveloped<T> {
    (StatusCode::OK, Json(ApiResponse::success(data)))
}

/// Standard created response
pub fn created_response<T>(data: T) -> Enveloped<T> {
    (StatusCode::CREATED, Json(ApiResponse::success(data)))
}

/// Standard no content response
pub fn no_content_response() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Admins may read any user's records; everyone else only their own
pub fn owner_scope(user: &AuthUser) -> Option<i32> {
    if user.is_admin() {
        None
    } else {
        Some(user.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::{ROLE_ADMIN, ROLE_USER};

    fn user(roles: &[&str]) -> AuthUser {
        AuthUser {
            user_id: 7,
            name: None,
            email: None,
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn admins_are_not_scoped() {
        assert_eq!(owner_scope(&user(&[ROLE_ADMIN])), None);
        assert_eq!(owner_scope(&user(&[ROLE_USER])), Some(7));
    }

    #[test]
    fn created_response_uses_201() {
        let (status, Json(body)) = created_response(vec![1, 2]);
        assert_eq!(status, StatusCode::CREATED);
        assert!(body.success);
        assert_eq!(body.data, Some(vec![1, 2]));
    }
}
