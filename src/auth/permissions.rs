// Role-based permission checks and route gating

use super::session::Session;
use crate::models::{User, UserRole};

/// What a protected screen should do for the current session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Session still bootstrapping; show a loader
    Loading,
    RedirectToLogin,
    Render,
}

pub const LOGIN_ROUTE: &str = "/login";

pub fn route_guard(session: &Session) -> RouteDecision {
    if session.is_loading() {
        RouteDecision::Loading
    } else if session.user.is_none() {
        RouteDecision::RedirectToLogin
    } else {
        RouteDecision::Render
    }
}

pub fn has_any_role(user: Option<&User>, roles: &[UserRole]) -> bool {
    user.is_some_and(|u| roles.contains(&u.role))
}

pub fn can_edit_users(user: Option<&User>) -> bool {
    has_any_role(user, &[UserRole::CompanyAdmin])
}

pub fn can_edit_cars(user: Option<&User>) -> bool {
    has_any_role(user, &[UserRole::CompanyAdmin, UserRole::Dispatcher])
}

pub fn can_view_reports(user: Option<&User>) -> bool {
    has_any_role(
        user,
        &[
            UserRole::CompanyAdmin,
            UserRole::Dispatcher,
            UserRole::Accountant,
        ],
    )
}
