//! Command handlers organized by category.
//!
//! | Module | Commands | Primitive |
//! |--------|----------|-----------|
//! | `auth` | 4 | SessionService, UserRegistry |
//! | `user` | 4 | UserRegistry (admin only) |
//! | `data` | 4 | DataStore |

pub mod auth;
pub mod data;
pub mod user;
