pub mod question;
pub mod react;
