//! JWT claims, claim building and compact serialization.

pub mod builder;
pub mod claims;
pub mod serializer;

pub use builder::ClaimsBuilder;
pub use claims::{is_reserved, Claims, RESERVED_CLAIMS};
pub use serializer::JwtSerializer;
