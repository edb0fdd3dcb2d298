// Typed resource clients
// Each module issues its requests through `ApiClient` and never touches tokens

pub mod auth;
pub mod cars;
pub mod fuel;
pub mod inspections;
pub mod insurances;
pub mod reports;
pub mod users;

/// Path of a single resource: `collection/{id}/`
pub(crate) fn detail_path(collection: &str, id: crate::models::Id) -> String {
    format!("{}/{}/", collection.trim_end_matches('/'), id)
}
