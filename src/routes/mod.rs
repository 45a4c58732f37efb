/// Router Module Index
///
/// Routes are grouped by who may reach them. Access control is applied as a
/// layer on the group, so a handler cannot be exposed by accident.

/// Routes open to everyone: health, locale and the localized content API.
pub mod public;

/// Login and logout. Open to everyone; they issue and clear the session cookies.
pub mod session;

/// Routes behind the admin gate. Denied requests are redirected, not errored.
pub mod admin;
