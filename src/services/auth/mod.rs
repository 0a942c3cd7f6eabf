pub mod context;
pub mod factory;
pub mod policy;
pub mod principal;
pub mod token;

pub use context::SecurityContext;
pub use principal::{Principal, PrincipalResolver, Role};
pub use token::{Claims, TokenService};
