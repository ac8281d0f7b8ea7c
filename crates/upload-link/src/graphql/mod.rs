//! GraphQL operation and result types.

mod operation;
mod path;
mod response;

pub use operation::{Context, ContextData, Operation, OperationRequest};
pub use path::{PathSegment, object_path};
pub use response::{GraphQLError, GraphQLLocation, GraphQLResponse};
