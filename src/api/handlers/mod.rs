//! Handlers for everything served locally: the two auth forms, health and
//! the landing text.

pub mod form;
pub mod health;
pub mod root;
pub mod sign_in;
pub mod sign_up;
