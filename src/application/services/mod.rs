//! Application services.
//!
//! - `PostService` - create and list posts, toggle comments, threaded reads
//! - `CommentService` - create comments and replies, notify live subscribers
//! - `UserService` - login-or-register

mod comment_service;
mod post_service;
mod user_service;

pub use comment_service::{CommentService, CreateCommentCommand};
pub use post_service::{CreatePostCommand, PostService};
pub use user_service::UserService;
