//! Terminal commands besides `serve`.

pub mod assess;
pub mod check;
pub mod install;
