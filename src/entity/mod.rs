//! Entity module - SeaORM entity definitions
//!
//! One file per table of the organization schema

pub mod department;
pub mod employee;
pub mod position;
pub mod position_department;
pub mod position_position;
pub mod setting;
