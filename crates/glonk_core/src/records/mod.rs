mod note;
mod post;
mod user;

pub use note::Note;
pub use post::Post;
pub use user::User;
