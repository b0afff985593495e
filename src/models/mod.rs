// src/models/mod.rs

pub mod activity;
pub mod exam;
pub mod exam_record;
pub mod flashcard;
pub mod note;
pub mod question;
pub mod user;
