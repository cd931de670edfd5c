pub mod extract;
pub mod password;
pub mod policy;
pub mod token;

pub use extract::{CurrentUser, TOKEN_COOKIE};
pub use policy::{Operation, Role, Tier, authorize, authorize_subject, can_perform};
pub use token::{Claims, TokenService};
